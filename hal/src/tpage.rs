//! # Texture Page and CLUT Ids
//!
//! Packed id words the rasterizer uses to locate texels and palettes.

use core::fmt;

use crate::types::VramPoint;

// =============================================================================
// TEXEL DEPTH
// =============================================================================

/// Texel storage format of a texture page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TexDepth {
    /// 4 bits per texel, indexed through a 16-entry CLUT
    Indexed4 = 0,
    /// 8 bits per texel, indexed through a 256-entry CLUT
    #[default]
    Indexed8 = 1,
    /// 15-bit direct colour
    Direct15 = 2,
}

impl TexDepth {
    /// How many texels share one 16-bit VRAM word
    #[inline]
    pub const fn texels_per_word(self) -> u16 {
        match self {
            Self::Indexed4 => 4,
            Self::Indexed8 => 2,
            Self::Direct15 => 1,
        }
    }

    /// Bits per texel
    #[inline]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Indexed4 => 4,
            Self::Indexed8 => 8,
            Self::Direct15 => 15,
        }
    }

    /// Parse a bit depth (4, 8 or 15/16)
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            4 => Some(Self::Indexed4),
            8 => Some(Self::Indexed8),
            15 | 16 => Some(Self::Direct15),
            _ => None,
        }
    }
}

// =============================================================================
// BLEND MODE
// =============================================================================

/// Semi-transparency rate encoded in the texture page word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum BlendMode {
    /// 0.5 * dst + 0.5 * src
    #[default]
    Average = 0,
    /// dst + src
    Additive = 1,
    /// dst - src
    Subtractive = 2,
    /// dst + 0.25 * src
    AddQuarter = 3,
}

// =============================================================================
// TEXTURE PAGE ID
// =============================================================================

/// Packed texture page id
///
/// Layout: `x >> 6` in bits 0-3, `y & 0x100` in bit 4, blend mode in bits
/// 5-6, texel depth in bits 7-8 and `y & 0x200` in bit 11.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct TexPageId(u16);

impl TexPageId {
    /// Encode a page id for a texture page whose origin is `origin`
    ///
    /// `origin.x` must be a multiple of 64 words and `origin.y` a multiple
    /// of 256 rows; lower bits are discarded.
    pub const fn encode(depth: TexDepth, blend: BlendMode, origin: VramPoint) -> Self {
        let x = origin.x;
        let y = origin.y;
        Self(
            (((depth as u16) & 0x3) << 7)
                | (((blend as u16) & 0x3) << 5)
                | ((y & 0x100) >> 4)
                | ((x & 0x3FF) >> 6)
                | ((y & 0x200) << 2),
        )
    }

    /// Wrap a raw id word
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Raw id word
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Page origin this id refers to
    pub const fn origin(self) -> VramPoint {
        let x = (self.0 & 0xF) << 6;
        let y = ((self.0 & 0x10) << 4) | ((self.0 & 0x800) >> 2);
        VramPoint::new(x, y)
    }

    /// Same page with a different blend mode
    pub const fn with_blend(self, blend: BlendMode) -> Self {
        Self((self.0 & !0x60) | (((blend as u16) & 0x3) << 5))
    }
}

impl fmt::Debug for TexPageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TexPageId({:#06x})", self.0)
    }
}

// =============================================================================
// CLUT ID
// =============================================================================

/// Packed colour lookup table id
///
/// CLUTs live at x positions that are multiples of 16 words.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct ClutId(u16);

impl ClutId {
    /// Encode the id of a CLUT uploaded at `pos`
    pub const fn encode(pos: VramPoint) -> Self {
        Self((pos.y << 6) | ((pos.x >> 4) & 0x3F))
    }

    /// Raw id word
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// VRAM position of the CLUT
    pub const fn position(self) -> VramPoint {
        VramPoint::new((self.0 & 0x3F) << 4, self.0 >> 6)
    }
}

impl fmt::Debug for ClutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClutId({:#06x})", self.0)
    }
}
