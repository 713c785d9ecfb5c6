//! # Texture Source
//!
//! Contract of the image-loading collaborator the texture cache pulls
//! pixel data from on a miss. Where the data comes from (a WAD lump, a
//! pack file, a procedural generator) is not this stack's concern.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::types::TextureId;

/// How the bytes of a [`TextureData`] are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureEncoding {
    /// Raw texel rows, ready for upload
    Raw,
    /// LZSS-compressed texel rows, see [`crate::lzss`]
    Lzss,
}

/// Texel data handed out by a [`TextureSource`]
#[derive(Debug, Clone, Copy)]
pub struct TextureData<'a> {
    /// Width in texels
    pub width: u16,
    /// Height in texels
    pub height: u16,
    /// Texel rows, tightly packed to whole 16-bit words per row
    pub bytes: &'a [u8],
    /// Encoding of `bytes`
    pub encoding: TextureEncoding,
}

impl<'a> TextureData<'a> {
    /// Uncompressed texel data
    pub const fn raw(width: u16, height: u16, bytes: &'a [u8]) -> Self {
        Self {
            width,
            height,
            bytes,
            encoding: TextureEncoding::Raw,
        }
    }

    /// LZSS-compressed texel data
    pub const fn compressed(width: u16, height: u16, bytes: &'a [u8]) -> Self {
        Self {
            width,
            height,
            bytes,
            encoding: TextureEncoding::Lzss,
        }
    }

    /// Whether the bytes can be uploaded without decompression
    #[inline]
    pub const fn is_pre_decompressed(&self) -> bool {
        matches!(self.encoding, TextureEncoding::Raw)
    }
}

/// Image-loading collaborator
pub trait TextureSource {
    /// Fetch the texel data for `id`
    fn decode(&mut self, id: TextureId) -> Result<TextureData<'_>>;
}

impl<S: TextureSource + ?Sized> TextureSource for &mut S {
    fn decode(&mut self, id: TextureId) -> Result<TextureData<'_>> {
        (**self).decode(id)
    }
}

// =============================================================================
// IN-MEMORY SOURCE
// =============================================================================

#[derive(Debug, Clone)]
struct StoredTexture {
    width: u16,
    height: u16,
    bytes: Vec<u8>,
    encoding: TextureEncoding,
}

/// Texture source over images already held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    textures: BTreeMap<TextureId, StoredTexture>,
    decodes: u64,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add raw texel rows for `id`
    pub fn insert_raw(&mut self, id: TextureId, width: u16, height: u16, bytes: Vec<u8>) {
        self.insert(id, width, height, bytes, TextureEncoding::Raw);
    }

    /// Add LZSS-compressed texel rows for `id`
    pub fn insert_compressed(&mut self, id: TextureId, width: u16, height: u16, bytes: Vec<u8>) {
        self.insert(id, width, height, bytes, TextureEncoding::Lzss);
    }

    /// Add an image whose every byte is `fill`, sized for 8 bpp texels
    pub fn insert_solid(&mut self, id: TextureId, width: u16, height: u16, fill: u8) {
        let row_bytes = width.div_ceil(2) as usize * 2;
        self.insert_raw(id, width, height, vec![fill; row_bytes * height as usize]);
    }

    fn insert(
        &mut self,
        id: TextureId,
        width: u16,
        height: u16,
        bytes: Vec<u8>,
        encoding: TextureEncoding,
    ) {
        self.textures.insert(
            id,
            StoredTexture {
                width,
                height,
                bytes,
                encoding,
            },
        );
    }

    /// Number of `decode` calls served
    pub fn decode_count(&self) -> u64 {
        self.decodes
    }
}

impl TextureSource for MemorySource {
    fn decode(&mut self, id: TextureId) -> Result<TextureData<'_>> {
        let stored = self.textures.get(&id).ok_or(Error::NotResident(id))?;
        self.decodes += 1;
        Ok(TextureData {
            width: stored.width,
            height: stored.height,
            bytes: &stored.bytes,
            encoding: stored.encoding,
        })
    }
}
