//! Persisted catalog and its derived search index.

pub mod search;
pub mod store;

pub use search::{SearchHit, SearchIndex};
pub use store::CatalogStore;
