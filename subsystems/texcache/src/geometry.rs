//! # Page Grid
//!
//! Static description of the cache's share of VRAM: a fixed number of
//! texture pages, each overlaid with a uniform grid of square cells.

use core::fmt;

use tessera_hal::vram::{VRAM_HEIGHT, VRAM_WIDTH};
use tessera_hal::{BlendMode, Error, Result, TexDepth, TexPageId, VramPoint, VramRect};

/// Most pages a [`LockedPages`] mask can describe
pub const MAX_PAGES: usize = 32;

/// Cache page origins of the reference hardware, in 16-bit VRAM words
///
/// The first four hardware pages hold the two framebuffers; the cache
/// occupies the next eleven.
pub const PSX_PAGE_ORIGINS: [VramPoint; 11] = [
    VramPoint::new(512, 0),
    VramPoint::new(640, 0),
    VramPoint::new(768, 0),
    VramPoint::new(896, 0),
    VramPoint::new(0, 256),
    VramPoint::new(128, 256),
    VramPoint::new(256, 256),
    VramPoint::new(384, 256),
    VramPoint::new(512, 256),
    VramPoint::new(640, 256),
    VramPoint::new(768, 256),
];

// =============================================================================
// PAGE INDEX / CELL POSITION
// =============================================================================

/// Index of a cache page, `0..page_count`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct PageIndex(pub u16);

impl PageIndex {
    /// Raw index as `usize`
    #[inline]
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {}", self.0)
    }
}

/// Cell coordinates within a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellPos {
    /// Column
    pub x: u16,
    /// Row
    pub y: u16,
}

impl CellPos {
    /// Create a new cell position
    #[inline]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// LOCKED PAGE MASK
// =============================================================================

/// Pages reserved for static content
///
/// A set bit excludes the page from allocation, eviction and reset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct LockedPages(u32);

impl LockedPages {
    /// No page locked
    pub const NONE: Self = Self(0);

    /// Build from a raw bit mask
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bit mask
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether `page` is locked
    #[inline]
    pub const fn contains(self, page: PageIndex) -> bool {
        page.0 < MAX_PAGES as u16 && (self.0 >> page.0) & 1 != 0
    }

    /// Mask with `page` added
    #[inline]
    pub const fn with(self, page: PageIndex) -> Self {
        if page.0 >= MAX_PAGES as u16 {
            return self;
        }
        Self(self.0 | (1 << page.0))
    }

    /// Mask with `page` removed
    #[inline]
    pub const fn without(self, page: PageIndex) -> Self {
        if page.0 >= MAX_PAGES as u16 {
            return self;
        }
        Self(self.0 & !(1 << page.0))
    }

    /// Whether every one of the first `page_count` pages is locked
    pub const fn covers_all(self, page_count: usize) -> bool {
        let all = if page_count >= MAX_PAGES {
            u32::MAX
        } else {
            (1u32 << page_count) - 1
        };
        self.0 & all == all
    }
}

impl fmt::Debug for LockedPages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LockedPages({:#b})", self.0)
    }
}

// =============================================================================
// VRAM LAYOUT
// =============================================================================

/// Geometry of the cache pages
#[derive(Debug, Clone)]
pub struct VramLayout {
    /// VRAM origin of every cache page, in words
    pub page_origins: &'static [VramPoint],
    /// Cells per page row
    pub cells_x: u16,
    /// Cell rows per page
    pub cells_y: u16,
    /// Cell edge length in texels
    pub cell_size: u16,
    /// Texel format of cached images
    pub depth: TexDepth,
    /// Pages excluded from allocation
    pub locked: LockedPages,
}

impl Default for VramLayout {
    fn default() -> Self {
        Self::psx()
    }
}

impl VramLayout {
    /// Reference layout: 11 pages of 256x256 8 bpp texels in 16x16 cells
    pub const fn psx() -> Self {
        Self {
            page_origins: &PSX_PAGE_ORIGINS,
            cells_x: 16,
            cells_y: 16,
            cell_size: 16,
            depth: TexDepth::Indexed8,
            locked: LockedPages::NONE,
        }
    }

    /// Number of cache pages
    #[inline]
    pub fn page_count(&self) -> usize {
        self.page_origins.len()
    }

    /// Cells per page
    #[inline]
    pub fn cells_per_page(&self) -> usize {
        self.cells_x as usize * self.cells_y as usize
    }

    /// Bytes of texel data one page holds
    pub fn page_bytes(&self) -> usize {
        let row_words = (self.cells_x * self.cell_size / self.depth.texels_per_word()) as usize;
        row_words * 2 * (self.cells_y as usize * self.cell_size as usize)
    }

    /// Check the layout is usable
    pub fn validate(&self) -> Result<()> {
        let tpw = self.depth.texels_per_word();
        if self.page_origins.is_empty()
            || self.page_origins.len() > MAX_PAGES
            || self.cells_x == 0
            || self.cells_y == 0
            || self.cell_size == 0
            || self.cell_size % tpw != 0
        {
            return Err(Error::InvalidParameter);
        }
        // Page texel coordinates must fit the u16 fields of residencies
        if self.cells_x as u32 * self.cell_size as u32 > u16::MAX as u32
            || self.cells_y as u32 * self.cell_size as u32 > u16::MAX as u32
        {
            return Err(Error::InvalidParameter);
        }

        // Pages must lie inside VRAM and never share a word, at this depth
        let count = self.page_count() as u16;
        for a in 0..count {
            let rect = self.page_rect(PageIndex(a))?;
            if rect.right() > VRAM_WIDTH as u32 || rect.bottom() > VRAM_HEIGHT as u32 {
                log::error!("texture cache: page {} at {:?} is outside VRAM", a, rect);
                return Err(Error::VramOutOfBounds);
            }
            for b in a + 1..count {
                if rect.intersects(&self.page_rect(PageIndex(b))?) {
                    log::error!(
                        "texture cache: pages {} and {} overlap at {}-bit depth",
                        a,
                        b,
                        self.depth.bits()
                    );
                    return Err(Error::InvalidParameter);
                }
            }
        }
        Ok(())
    }

    /// Footprint of a texture in cells, rounding partial cells up
    pub fn footprint(&self, width_px: u16, height_px: u16) -> (u16, u16) {
        (
            width_px.div_ceil(self.cell_size),
            height_px.div_ceil(self.cell_size),
        )
    }

    /// VRAM origin of `page`
    pub fn page_origin(&self, page: PageIndex) -> Result<VramPoint> {
        self.page_origins
            .get(page.get())
            .copied()
            .ok_or(Error::InvalidPage(page.0))
    }

    /// VRAM rectangle covered by `page`
    pub fn page_rect(&self, page: PageIndex) -> Result<VramRect> {
        let origin = self.page_origin(page)?;
        let tpw = self.depth.texels_per_word();
        Ok(VramRect::new(
            origin.x,
            origin.y,
            self.cells_x * self.cell_size / tpw,
            self.cells_y * self.cell_size,
        ))
    }

    /// Texture page id of `page`
    pub fn tpage(&self, page: PageIndex) -> Result<TexPageId> {
        let origin = self.page_origin(page)?;
        Ok(TexPageId::encode(self.depth, BlendMode::Average, origin))
    }

    /// Page-relative texel coordinates of a cell
    #[inline]
    pub fn cell_texel(&self, cell: CellPos) -> (u16, u16) {
        (cell.x * self.cell_size, cell.y * self.cell_size)
    }

    /// VRAM rectangle an image of the given texel size occupies at `cell`
    pub fn upload_rect(
        &self,
        page: PageIndex,
        cell: CellPos,
        width_px: u16,
        height_px: u16,
    ) -> Result<VramRect> {
        let origin = self.page_origin(page)?;
        let tpw = self.depth.texels_per_word();
        let (u, v) = self.cell_texel(cell);
        Ok(VramRect::new(
            origin.x + u / tpw,
            origin.y + v,
            width_px.div_ceil(tpw),
            height_px,
        ))
    }

    /// First unlocked page after `page`, wrapping around
    ///
    /// Returns `None` when every page is locked.
    pub fn next_unlocked(&self, page: PageIndex) -> Option<PageIndex> {
        let count = self.page_count() as u16;
        (1..=count)
            .map(|step| PageIndex((page.0 + step) % count))
            .find(|&candidate| !self.locked.contains(candidate))
    }

    /// First unlocked page, counting from page 0
    pub fn first_unlocked(&self) -> Option<PageIndex> {
        (0..self.page_count() as u16)
            .map(PageIndex)
            .find(|&page| !self.locked.contains(page))
    }
}

static_assertions::const_assert!(PSX_PAGE_ORIGINS.len() <= MAX_PAGES);
static_assertions::assert_impl_all!(LockedPages: Send, Sync, Copy);
