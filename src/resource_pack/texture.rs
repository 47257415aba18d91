//! Texture payloads.
//!
//! The PNG bytes are carried through as base64 so a viewer can use them
//! directly as a data URL. Images are only decoded to report their size.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Encode raw texture bytes as standard (padded) base64.
pub fn encode_texture(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode a stored texture back to bytes.
pub fn decode_texture(texture64: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(texture64)
}

/// Whether the bytes start with the PNG signature.
pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

/// Size and animation layout of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    /// Animated textures stack square frames vertically.
    pub frame_count: u32,
}

impl TextureInfo {
    pub fn is_animated(&self) -> bool {
        self.frame_count > 1
    }
}

/// Read the dimensions of texture bytes.
pub fn texture_info(data: &[u8]) -> Result<TextureInfo, image::ImageError> {
    let img = image::load_from_memory(data)?;
    let (width, height) = (img.width(), img.height());

    // Taller than wide with a whole number of square frames
    let is_animated = width > 0 && height > width && height % width == 0;
    let frame_count = if is_animated { height / width } else { 1 };

    Ok(TextureInfo {
        width,
        height,
        frame_count,
    })
}
