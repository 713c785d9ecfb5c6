//! # Tessera Core Types
//!
//! Fundamental type definitions used across the residency/submission stack.
//!
//! These types provide:
//! - Strong typing for texture identities
//! - VRAM coordinates in 16-bit word units (not texels)
//! - Packed colour and screen coordinates for primitives

use core::fmt;

// =============================================================================
// TEXTURE ID
// =============================================================================

/// Identity of a texture image as known to the texture source
///
/// Typically the lump number of the image in the level's resource file.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TextureId(u32);

impl TextureId {
    /// Create a new texture id
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw value
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextureId({})", self.0)
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture #{}", self.0)
    }
}

// =============================================================================
// VRAM COORDINATES
// =============================================================================

/// A position in VRAM, in 16-bit word units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VramPoint {
    /// Column (16-bit words)
    pub x: u16,
    /// Row
    pub y: u16,
}

impl VramPoint {
    /// Create a new VRAM point
    #[inline]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// A rectangle in VRAM, in 16-bit word units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VramRect {
    /// Left column
    pub x: u16,
    /// Top row
    pub y: u16,
    /// Width in words
    pub w: u16,
    /// Height in rows
    pub h: u16,
}

impl VramRect {
    /// Create a new VRAM rectangle
    #[inline]
    pub const fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    /// Number of 16-bit words covered
    #[inline]
    pub const fn word_count(&self) -> usize {
        self.w as usize * self.h as usize
    }

    /// Whether the rectangle covers nothing
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Right edge (exclusive)
    #[inline]
    pub const fn right(&self) -> u32 {
        self.x as u32 + self.w as u32
    }

    /// Bottom edge (exclusive)
    #[inline]
    pub const fn bottom(&self) -> u32 {
        self.y as u32 + self.h as u32
    }

    /// Whether the two rectangles share at least one word
    pub const fn intersects(&self, other: &VramRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && (self.x as u32) < other.right()
            && (other.x as u32) < self.right()
            && (self.y as u32) < other.bottom()
            && (other.y as u32) < self.bottom()
    }
}

// =============================================================================
// SCREEN / COLOUR
// =============================================================================

/// A draw-area position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScreenPoint {
    /// X (signed, 11 bits used by the rasterizer)
    pub x: i16,
    /// Y (signed, 11 bits used by the rasterizer)
    pub y: i16,
}

impl ScreenPoint {
    /// Create a new screen point
    #[inline]
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Packed `yyyyxxxx` vertex word
    #[inline]
    pub const fn packed(self) -> u32 {
        ((self.y as u16 as u32) << 16) | (self.x as u16 as u32)
    }
}

/// 24-bit colour as carried in the low bits of a command word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Rgb {
    /// Neutral modulation colour (texels drawn unmodified)
    pub const NEUTRAL: Self = Self::new(128, 128, 128);

    /// Create a new colour
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packed `00bbggrr` word
    #[inline]
    pub const fn packed(self) -> u32 {
        ((self.b as u32) << 16) | ((self.g as u32) << 8) | (self.r as u32)
    }
}

// =============================================================================
// STATIC ASSERTIONS
// =============================================================================

static_assertions::assert_impl_all!(TextureId: Send, Sync, Copy);
static_assertions::assert_impl_all!(VramRect: Send, Sync, Copy);
static_assertions::assert_eq_size!(TextureId, u32);
