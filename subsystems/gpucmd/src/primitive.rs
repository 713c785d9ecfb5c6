//! # Primitive Records
//!
//! Draw primitives as the rasterizer consumes them: a run of up to
//! [`MAX_PRIM_WORDS`] data words. In the ring each primitive is preceded
//! by a tag word linking to the next one.
//!
//! ```text
//!  31        24 23                                   0
//! ┌────────────┬──────────────────────────────────────┐
//! │ data words │   word offset of the next tag        │   tag
//! └────────────┴──────────────────────────────────────┘
//! ```

use core::fmt;

use arrayvec::ArrayVec;
use tessera_hal::{ClutId, Error, Result, Rgb, ScreenPoint, TexPageId};

/// Most data words a primitive can carry
pub const MAX_PRIM_WORDS: usize = 16;

/// Tag marking the end of a submitted chain
pub const TERMINATOR_TAG: u32 = 0x00FF_FFFF;

const LINK_MASK: u32 = 0x00FF_FFFF;

// Command codes (top byte of the first data word)
const CMD_LINE_FLAT: u32 = 0x40;
const CMD_TILE: u32 = 0x60;
const CMD_SPRITE: u32 = 0x64;
const CMD_DRAW_MODE: u32 = 0xE1;
const CMD_TEXTURE_WINDOW: u32 = 0xE2;

/// Semi-transparency bit of a command code
const SEMI_TRANSPARENT: u32 = 0x02;

// =============================================================================
// TAG
// =============================================================================

/// Header word preceding every primitive in the ring
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct PrimTag(u32);

impl PrimTag {
    /// End of chain
    pub const TERMINATOR: Self = Self(TERMINATOR_TAG);

    /// Tag for `data_words` words followed by the tag at `next`
    #[inline]
    pub const fn new(data_words: u8, next: u32) -> Self {
        Self(((data_words as u32) << 24) | (next & LINK_MASK))
    }

    /// Zero-word tag sending the consumer back to the ring start
    #[inline]
    pub const fn wrap() -> Self {
        Self::new(0, 0)
    }

    /// Reinterpret a raw word
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw word
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Data words after this tag
    #[inline]
    pub const fn data_words(self) -> usize {
        (self.0 >> 24) as usize
    }

    /// Word offset of the next tag
    #[inline]
    pub const fn next(self) -> u32 {
        self.0 & LINK_MASK
    }

    /// Whether this tag ends the chain
    #[inline]
    pub const fn is_terminator(self) -> bool {
        self.0 == TERMINATOR_TAG
    }

    /// Whether this tag carries no data and only links onward
    #[inline]
    pub const fn is_link_only(self) -> bool {
        self.data_words() == 0 && !self.is_terminator()
    }
}

impl fmt::Debug for PrimTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminator() {
            return write!(f, "PrimTag(end)");
        }
        write!(f, "PrimTag({} words -> {:#x})", self.data_words(), self.next())
    }
}

// =============================================================================
// PRIMITIVE
// =============================================================================

/// One draw primitive, without its tag
#[derive(Clone, PartialEq, Eq)]
pub struct Primitive {
    words: ArrayVec<u32, MAX_PRIM_WORDS>,
}

impl Primitive {
    /// Build from raw data words
    pub fn from_words(words: &[u32]) -> Result<Self> {
        if words.is_empty() {
            return Err(Error::InvalidParameter);
        }
        let words = ArrayVec::try_from(words).map_err(|_| Error::PrimitiveTooLarge(words.len()))?;
        Ok(Self { words })
    }

    fn build<const N: usize>(words: [u32; N]) -> Self {
        Self {
            words: words.into_iter().collect(),
        }
    }

    /// Draw-mode setting: select `tpage` for following textured primitives
    pub fn draw_mode(tpage: TexPageId) -> Self {
        Self::build([
            (CMD_DRAW_MODE << 24) | (tpage.raw() as u32 & 0x9FF),
            CMD_TEXTURE_WINDOW << 24,
        ])
    }

    /// Textured sprite sampling `(u, v)` of the current texture page
    pub fn sprite(
        pos: ScreenPoint,
        width: u16,
        height: u16,
        uv: (u8, u8),
        clut: ClutId,
        color: Rgb,
    ) -> Self {
        Self::build([
            (CMD_SPRITE << 24) | color.packed(),
            pos.packed(),
            ((clut.raw() as u32) << 16) | ((uv.1 as u32) << 8) | uv.0 as u32,
            ((height as u32) << 16) | width as u32,
        ])
    }

    /// Flat-coloured rectangle
    pub fn tile(pos: ScreenPoint, width: u16, height: u16, color: Rgb) -> Self {
        Self::build([
            (CMD_TILE << 24) | color.packed(),
            pos.packed(),
            ((height as u32) << 16) | width as u32,
        ])
    }

    /// Flat-coloured line
    pub fn line(from: ScreenPoint, to: ScreenPoint, color: Rgb) -> Self {
        Self::build([
            (CMD_LINE_FLAT << 24) | color.packed(),
            from.packed(),
            to.packed(),
        ])
    }

    /// Same primitive with the semi-transparency bit set
    pub fn semi_transparent(mut self) -> Self {
        self.words[0] |= SEMI_TRANSPARENT << 24;
        self
    }

    /// Data words
    #[inline]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Number of data words
    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always false; a primitive has at least one word
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Ring words taken, tag included
    #[inline]
    pub fn ring_words(&self) -> usize {
        self.words.len() + 1
    }

    /// Command code of the first word
    #[inline]
    pub fn command(&self) -> u8 {
        (self.words[0] >> 24) as u8
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Primitive({:#04x}, {:08x?})", self.command(), &self.words[..])
    }
}

static_assertions::const_assert!(MAX_PRIM_WORDS < 256);
static_assertions::assert_impl_all!(Primitive: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_hal::{BlendMode, TexDepth, VramPoint};

    #[test]
    fn test_tag_layout() {
        let tag = PrimTag::new(4, 0x0123_4567);
        assert_eq!(tag.raw(), 0x0423_4567);
        assert_eq!(tag.data_words(), 4);
        assert_eq!(tag.next(), 0x23_4567);
        assert!(!tag.is_terminator());

        assert!(PrimTag::wrap().is_link_only());
        assert_eq!(PrimTag::wrap().next(), 0);
        assert!(PrimTag::TERMINATOR.is_terminator());
        assert!(!PrimTag::TERMINATOR.is_link_only());
    }

    #[test]
    fn test_sprite_words() {
        let prim = Primitive::sprite(
            ScreenPoint::new(10, 20),
            64,
            32,
            (16, 48),
            ClutId::encode(VramPoint::new(0, 480)),
            Rgb::NEUTRAL,
        );
        let clut = ClutId::encode(VramPoint::new(0, 480)).raw() as u32;
        assert_eq!(
            prim.words(),
            &[
                0x6480_8080,
                (20 << 16) | 10,
                (clut << 16) | (48 << 8) | 16,
                (32 << 16) | 64,
            ]
        );
        assert_eq!(prim.ring_words(), 5);
        assert_eq!(prim.command(), 0x64);
    }

    #[test]
    fn test_draw_mode_masks_tpage() {
        let tpage = TexPageId::encode(TexDepth::Indexed8, BlendMode::Average, VramPoint::new(512, 0));
        let prim = Primitive::draw_mode(tpage);
        assert_eq!(prim.words(), &[0xE100_0088, 0xE200_0000]);
    }

    #[test]
    fn test_line_and_tile() {
        let red = Rgb::new(255, 0, 0);
        let line = Primitive::line(ScreenPoint::new(0, 0), ScreenPoint::new(5, 7), red);
        assert_eq!(line.words(), &[0x4000_00FF, 0, (7 << 16) | 5]);

        let tile = Primitive::tile(ScreenPoint::new(1, 2), 3, 4, red).semi_transparent();
        assert_eq!(tile.command(), 0x62);
        assert_eq!(tile.len(), 3);
    }

    #[test]
    fn test_from_words_limits() {
        assert!(Primitive::from_words(&[1, 2, 3]).is_ok());
        assert_eq!(
            Primitive::from_words(&[]).unwrap_err(),
            Error::InvalidParameter
        );
        assert_eq!(
            Primitive::from_words(&[0; 17]).unwrap_err(),
            Error::PrimitiveTooLarge(17)
        );
    }
}
