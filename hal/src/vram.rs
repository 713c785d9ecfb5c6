//! # VRAM
//!
//! The upload path the texture cache copies pixels through, and a plain
//! in-memory VRAM that implements it.
//!
//! VRAM is addressed in 16-bit words. Indexed textures pack several texels
//! per word (two at 8 bpp), so a 64-texel-wide 8 bpp image occupies a
//! 32-word-wide rectangle.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::types::VramRect;

/// Width of the reference VRAM in 16-bit words
pub const VRAM_WIDTH: u16 = 1024;

/// Height of the reference VRAM in rows
pub const VRAM_HEIGHT: u16 = 512;

// =============================================================================
// UPLOAD TRAIT
// =============================================================================

/// Destination for texture uploads
///
/// This is the GPU-facing image upload path. It is separate from the
/// primitive ring: uploads land in VRAM before any primitive that samples
/// them is drained.
pub trait VramUpload {
    /// Copy `words` (row-major, `rect.w` words per row) into `rect`
    fn load_image(&mut self, rect: VramRect, words: &[u16]) -> Result<()>;
}

impl<U: VramUpload + ?Sized> VramUpload for &mut U {
    fn load_image(&mut self, rect: VramRect, words: &[u16]) -> Result<()> {
        (**self).load_image(rect, words)
    }
}

// =============================================================================
// IN-MEMORY VRAM
// =============================================================================

/// Software VRAM backing store
#[derive(Debug, Clone)]
pub struct Vram {
    width: u16,
    height: u16,
    words: Vec<u16>,
    uploads: u64,
}

impl Vram {
    /// Create a zero-filled VRAM of the given size
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            words: vec![0; width as usize * height as usize],
            uploads: 0,
        }
    }

    /// Create a VRAM with the reference 1024x512 geometry
    pub fn psx() -> Self {
        Self::new(VRAM_WIDTH, VRAM_HEIGHT)
    }

    /// Width in words
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height in rows
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Number of successful uploads
    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    /// Read one word
    pub fn word(&self, x: u16, y: u16) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.words.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// Copy a rectangle out of VRAM
    pub fn read_rect(&self, rect: VramRect) -> Result<Vec<u16>> {
        self.check_bounds(rect)?;

        let mut out = Vec::with_capacity(rect.word_count());
        for row in 0..rect.h as usize {
            let start = (rect.y as usize + row) * self.width as usize + rect.x as usize;
            out.extend_from_slice(&self.words[start..start + rect.w as usize]);
        }
        Ok(out)
    }

    fn check_bounds(&self, rect: VramRect) -> Result<()> {
        if rect.right() > self.width as u32 || rect.bottom() > self.height as u32 {
            return Err(Error::VramOutOfBounds);
        }
        Ok(())
    }
}

impl VramUpload for Vram {
    fn load_image(&mut self, rect: VramRect, words: &[u16]) -> Result<()> {
        self.check_bounds(rect)?;
        if words.len() < rect.word_count() {
            return Err(Error::InvalidParameter);
        }

        let row_words = rect.w as usize;
        for (row, src) in words.chunks_exact(row_words.max(1)).take(rect.h as usize).enumerate() {
            let start = (rect.y as usize + row) * self.width as usize + rect.x as usize;
            self.words[start..start + row_words].copy_from_slice(src);
        }

        self.uploads += 1;
        log::trace!("VRAM upload {:?}", rect);
        Ok(())
    }
}
