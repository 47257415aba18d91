//! End-to-end ingestion against real zip archives on disk.

use block_catalog::{
    BlockKey, CatalogConfig, CatalogError, CatalogService, CatalogStore, VariantKind, VariantSpec,
};
use rusqlite::Connection;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\ndoor-front";

const DOOR_STATES: &str = r#"{
    "variants": {
        "facing=north,open=false": { "model": "m1:block/door" },
        "facing=south,open=true": { "model": "m1:block/door" }
    }
}"#;

const DOOR_MODEL: &str = r#"{ "textures": { "front": "block/door_front" } }"#;

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    let bytes = writer.finish().unwrap().into_inner();
    std::fs::write(path, bytes).unwrap();
}

fn door_entries<'a>() -> Vec<(&'a str, &'a [u8])> {
    vec![
        ("assets/m1/blockstates/door.json", DOOR_STATES.as_bytes()),
        ("assets/m1/models/block/door.json", DOOR_MODEL.as_bytes()),
        ("assets/m1/textures/block/door_front.png", PNG),
    ]
}

fn service() -> CatalogService {
    CatalogService::open(CatalogConfig::in_memory()).unwrap()
}

#[test]
fn test_door_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_zip(&dir.path().join("m1-door-1.0.jar"), &door_entries());

    let service = service();
    let report = service.ingest_directory(dir.path()).unwrap();
    assert_eq!(report.committed, 1);
    assert_eq!(report.indexed, 1);
    assert_eq!(report.skip_count(), 0);

    let door = service.get_block("door").unwrap().expect("door should be catalogued");
    assert_eq!(door.mod_id, "m1");
    assert_eq!(door.jar_slug, "m1-door-1.0");
    assert_eq!(door.entry_name, "assets/m1/blockstates/door.json");
    assert_eq!(door.block_name, None);
    assert!(door.texture64.is_some());
    assert_eq!(
        door.variants,
        vec![
            VariantSpec::string("facing", vec!["north".to_string(), "south".to_string()]),
            VariantSpec::boolean("open"),
        ]
    );

    let by_key = service.get_block_by_key(&BlockKey::new("door", "m1")).unwrap();
    assert_eq!(by_key, Some(door.clone()));

    let hits = service.search_blocks("door").unwrap();
    assert_eq!(hits, vec![door]);
}

#[test]
fn test_loader_model_has_no_texture() {
    let dir = tempfile::tempdir().unwrap();
    write_zip(
        &dir.path().join("m1.jar"),
        &[
            ("assets/m1/blockstates/door.json", DOOR_STATES.as_bytes()),
            (
                "assets/m1/models/block/door.json",
                br#"{ "loader": "custom:obj", "model": "m1:models/block/door.obj" }"#,
            ),
        ],
    );

    let service = service();
    let report = service.ingest_directory(dir.path()).unwrap();
    assert_eq!(report.committed, 1);
    assert_eq!(report.indexed, 0);
    assert_eq!(report.texture_outcomes.get("custom_loader"), Some(&1));

    let door = service.get_block("door").unwrap().unwrap();
    assert_eq!(door.texture64, None);
    assert_eq!(door.variants.len(), 2);

    // Untextured blocks are out of fuzzy search but still found by prefix
    assert!(service.search_blocks("door").unwrap().is_empty());
    assert_eq!(service.search_blocks("@do").unwrap().len(), 1);
}

#[test]
fn test_lang_names_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries = door_entries();
    entries.push(("assets/m1/lang/en_us.json", br#"{ "block.m1.door": "Wooden Door" }"#));
    write_zip(&dir.path().join("m1.jar"), &entries);

    let service = service();
    service.ingest_directory(dir.path()).unwrap();

    let door = service.get_block("door").unwrap().unwrap();
    assert_eq!(door.block_name.as_deref(), Some("Wooden Door"));

    let hits = service.search_blocks("wooden").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].block_id, "door");
}

#[test]
fn test_default_state_has_no_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    write_zip(
        &dir.path().join("m1.jar"),
        &[
            (
                "assets/m1/blockstates/lamp.json",
                br#"{ "variants": { "lit=true": { "model": "block/lamp_on" }, "": { "model": "block/lamp" } } }"#,
            ),
            (
                "assets/m1/models/block/lamp.json",
                br#"{ "textures": { "side": "block/lamp_side", "all": "block/lamp" } }"#,
            ),
            ("assets/m1/textures/block/lamp.png", PNG),
        ],
    );

    let service = service();
    service.ingest_directory(dir.path()).unwrap();

    let lamp = service.get_block("lamp").unwrap().unwrap();
    assert!(lamp.variants.is_empty());
    assert!(lamp.texture64.is_some());
}

#[test]
fn test_numeric_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    write_zip(
        &dir.path().join("m1.jar"),
        &[(
            "assets/m1/blockstates/crop.json",
            br#"{ "variants": {
                "age=0": { "model": "block/crop_0" },
                "age=1": { "model": "block/crop_1" },
                "age=2": [ { "model": "block/crop_2" }, { "model": "block/crop_2b" } ]
            } }"#,
        )],
    );

    let service = service();
    service.ingest_directory(dir.path()).unwrap();

    let crop = service.get_block("crop").unwrap().unwrap();
    assert_eq!(crop.variants.len(), 1);
    assert_eq!(
        crop.variants[0].kind,
        VariantKind::Number {
            values: vec![0.0, 1.0, 2.0]
        }
    );
}

#[test]
fn test_skips_are_reported_and_batch_continues() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries = door_entries();
    entries.push(("assets/m1/blockstates/broken.json", b"{ \"variants\": "));
    entries.push(("assets/m1/blockstates/wall.json", br#"{ "multipart": [ { "apply": { "model": "block/wall" } } ] }"#));
    entries.push(("assets/m1/blockstates/odd.json", br#"{ "variants": { "": { "model": 7 } } }"#));
    write_zip(&dir.path().join("a_good.jar"), &entries);
    std::fs::write(dir.path().join("b_corrupt.jar"), b"PK\x03\x04 truncated").unwrap();
    std::fs::write(dir.path().join("readme.txt"), b"not an archive").unwrap();

    let service = service();
    let report = service.ingest_directory(dir.path()).unwrap();

    assert_eq!(report.archives_scanned, 1);
    assert_eq!(report.failed_archives.len(), 1);
    assert_eq!(report.failed_archives[0].slug, "b_corrupt");
    assert_eq!(report.committed, 1);
    assert_eq!(report.skip_count(), 3);

    let summary = report.skip_summary();
    assert_eq!(summary.get("json"), Some(&1));
    assert_eq!(summary.get("no_variants"), Some(&1));
    assert_eq!(summary.get("schema"), Some(&1));
}

#[test]
fn test_last_archive_wins() {
    let dir = tempfile::tempdir().unwrap();
    write_zip(&dir.path().join("a_first.jar"), &door_entries());
    write_zip(
        &dir.path().join("b_second.zip"),
        &[(
            "assets/m2/blockstates/door.json",
            br#"{ "variants": { "": { "model": "m2:block/door" } } }"#,
        )],
    );

    let service = service();
    let report = service.ingest_directory(dir.path()).unwrap();
    assert_eq!(report.committed, 1);
    assert_eq!(report.overwritten, 1);

    let door = service.get_block("door").unwrap().unwrap();
    assert_eq!(door.mod_id, "m2");
    assert_eq!(door.jar_slug, "b_second");
}

#[test]
fn test_ingestion_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries = door_entries();
    entries.push(("assets/m1/blockstates/lamp.json", br#"{ "variants": { "": { "model": "block/lamp" } } }"#));
    write_zip(&dir.path().join("m1.jar"), &entries);

    let service = service();
    service.ingest_directory(dir.path()).unwrap();
    let first = service.search_blocks("@").unwrap();

    service.ingest_directory(dir.path()).unwrap();
    let second = service.search_blocks("@").unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(service.count().unwrap(), 2);
}

#[test]
fn test_failed_commit_leaves_catalog_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mods = dir.path().join("mods");
    std::fs::create_dir(&mods).unwrap();
    write_zip(&mods.join("m1.jar"), &door_entries());

    let database = dir.path().join("catalog.sqlite");
    let config = CatalogConfig::default().with_database_path(&database);
    let service = CatalogService::open(config).unwrap();
    service.ingest_directory(&mods).unwrap();
    service.close().unwrap();

    let mut store = CatalogStore::open(&database).unwrap();
    let before = store.all().unwrap();
    assert_eq!(before.len(), 1);

    let mut duplicate = before[0].clone();
    duplicate.block_name = Some("Replacement".to_string());
    let result = store.replace_all(&[before[0].clone(), duplicate], 1);
    assert!(matches!(result, Err(CatalogError::Persistence(_))));

    assert_eq!(store.all().unwrap(), before);
}

fn file_service(dir: &Path) -> (CatalogService, std::path::PathBuf) {
    let database = dir.join("catalog.sqlite");
    let config = CatalogConfig::default().with_database_path(&database);
    (CatalogService::open(config).unwrap(), database)
}

#[test]
fn test_index_rebuild_failure_after_commit() {
    let dir = tempfile::tempdir().unwrap();
    let mods = dir.path().join("mods");
    std::fs::create_dir(&mods).unwrap();
    write_zip(&mods.join("m1.jar"), &door_entries());

    let (service, database) = file_service(dir.path());

    // Committed rows come back undecodable when the index reads them
    Connection::open(&database)
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER corrupt_variants AFTER INSERT ON blocks BEGIN
                UPDATE blocks SET variants = 'x' WHERE rowid = NEW.rowid;
            END;",
        )
        .unwrap();

    match service.ingest_directory(&mods) {
        Err(CatalogError::IndexSync { committed, .. }) => assert_eq!(committed, 1),
        other => panic!("expected IndexSync, got {:?}", other),
    }
    assert_eq!(service.count().unwrap(), 1);
    assert!(matches!(
        service.search_blocks("door"),
        Err(CatalogError::IndexStale)
    ));
}

#[test]
fn test_rejected_batch_keeps_catalog_and_index() {
    let dir = tempfile::tempdir().unwrap();
    let mods = dir.path().join("mods");
    std::fs::create_dir(&mods).unwrap();
    write_zip(&mods.join("m1.jar"), &door_entries());

    let (service, database) = file_service(dir.path());
    service.ingest_directory(&mods).unwrap();
    let before = service.get_block("door").unwrap().unwrap();

    write_zip(
        &mods.join("m2.jar"),
        &[(
            "assets/m2/blockstates/lamp.json",
            br#"{ "variants": { "": { "model": "m2:block/lamp" } } }"#,
        )],
    );
    Connection::open(&database)
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER reject_inserts BEFORE INSERT ON blocks BEGIN
                SELECT RAISE(ABORT, 'rejected');
            END;",
        )
        .unwrap();

    assert!(matches!(
        service.ingest_directory(&mods),
        Err(CatalogError::Persistence(_))
    ));

    assert_eq!(service.count().unwrap(), 1);
    assert_eq!(service.get_block("door").unwrap().unwrap(), before);
    assert!(service.get_block("lamp").unwrap().is_none());
    let hits = service.search_blocks("door").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].block_id, "door");
}

#[test]
fn test_search_modes() {
    let dir = tempfile::tempdir().unwrap();
    let mut owned: Vec<(String, Vec<u8>)> = Vec::new();
    for (i, id) in ["oak_log", "oak_planks", "birch_log"].iter().enumerate() {
        owned.push((
            format!("assets/m1/blockstates/{}.json", id),
            format!(r#"{{ "variants": {{ "": {{ "model": "block/{}" }} }} }}"#, id).into_bytes(),
        ));
        owned.push((
            format!("assets/m1/models/block/{}.json", id),
            format!(r#"{{ "textures": {{ "all": "block/{}" }} }}"#, id).into_bytes(),
        ));
        // The birch log has no texture file
        if i < 2 {
            owned.push((format!("assets/m1/textures/block/{}.png", id), PNG.to_vec()));
        }
    }
    let mut entries = door_entries();
    entries.extend(owned.iter().map(|(name, data)| (name.as_str(), data.as_slice())));
    write_zip(&dir.path().join("m1.jar"), &entries);

    let config = CatalogConfig::in_memory()
        .with_search_limit(2)
        .with_prefix_marker('#');
    let service = CatalogService::open(config).unwrap();
    service.ingest_directory(dir.path()).unwrap();

    // Empty query: textured records only, capped at the limit
    let listed = service.search_blocks("").unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|r| r.texture64.is_some()));

    // Prefix lookup includes untextured records and honors the custom marker
    let prefixed: Vec<_> = service
        .search_blocks("#birch")
        .unwrap()
        .into_iter()
        .map(|r| r.block_id)
        .collect();
    assert_eq!(prefixed, ["birch_log"]);

    let prefixed: Vec<_> = service
        .search_blocks("#OAK")
        .unwrap()
        .into_iter()
        .map(|r| r.block_id)
        .collect();
    assert_eq!(prefixed, ["oak_log", "oak_planks"]);

    // Fuzzy search skips the untextured birch log
    let fuzzy: Vec<_> = service
        .search_blocks("log")
        .unwrap()
        .into_iter()
        .map(|r| r.block_id)
        .collect();
    assert_eq!(fuzzy, ["oak_log"]);
}

#[test]
fn test_concurrent_batch_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_zip(&dir.path().join("m1.jar"), &door_entries());

    let service = service();
    let guard = service.begin_batch().unwrap();

    let result = std::thread::scope(|s| {
        s.spawn(|| service.ingest_directory(dir.path()))
            .join()
            .unwrap()
    });
    assert!(matches!(result, Err(CatalogError::BatchInProgress)));
    assert_eq!(service.count().unwrap(), 0);

    drop(guard);
    assert_eq!(service.ingest_directory(dir.path()).unwrap().committed, 1);
}

#[test]
fn test_block_details_reads_source_archive() {
    let dir = tempfile::tempdir().unwrap();
    write_zip(&dir.path().join("m1.jar"), &door_entries());

    let service = service();
    service.ingest_directory(dir.path()).unwrap();

    let details = service.block_details(dir.path(), "door").unwrap().unwrap();
    assert!(!details.multipart);
    let states: Vec<_> = details.states.iter().map(|s| s.state.as_str()).collect();
    assert_eq!(states, ["facing=north,open=false", "facing=south,open=true"]);
    assert_eq!(details.states[0].models[0].model, "m1:block/door");
    assert_eq!(details.states[0].models[0].weight, 1.0);

    assert!(service.block_details(dir.path(), "window").unwrap().is_none());

    std::fs::remove_file(dir.path().join("m1.jar")).unwrap();
    assert!(service.block_details(dir.path(), "door").unwrap().is_none());
}

#[test]
fn test_archive_slugs() {
    let dir = tempfile::tempdir().unwrap();
    write_zip(&dir.path().join("create-0.5.jar"), &door_entries());
    write_zip(&dir.path().join("abc.zip"), &door_entries());
    std::fs::write(dir.path().join("notes.md"), b"").unwrap();

    let service = service();
    assert_eq!(service.archive_slugs(dir.path()).unwrap(), ["abc", "create-0.5"]);
    assert_eq!(
        block_catalog::list_archive_slugs(dir.path()).unwrap(),
        ["abc", "create-0.5"]
    );
}
