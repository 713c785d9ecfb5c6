//! # Residency Allocator
//!
//! Places texture images into cache pages and evicts stale ones.
//!
//! ```text
//!  page 0                         page 1
//! ┌──────┬────┬───────────┐      ┌──────────────────────┐
//! │ A(3) │B(3)│  C(3)     │      │                      │
//! │      ├────┘           │      │                      │
//! ├──────┤      ┌─────────┤      │      ...             │
//! │ D(2) │ ▶    │ E(1)    │      │                      │
//! └──────┴──────┴─────────┘      └──────────────────────┘
//!          ▲ fill cursor; (n) = frame last referenced
//! ```
//!
//! A miss scans the footprint at the cursor. Stale occupants (frame older
//! than the current one) are evicted; a live occupant pushes the cursor
//! past its right edge and raises the current row height so the next row
//! clears it. Running off the bottom of a page moves to the next unlocked
//! page; returning to the page the search started on is an overflow.

use alloc::vec::Vec;

use hashbrown::HashMap;
use tessera_hal::lzss::{self, LzssError};
use tessera_hal::{
    Error, MalformedReason, Result, TexPageId, TextureEncoding, TextureId, TextureSource,
    VramRect, VramUpload,
};

use crate::entry::{CacheEntry, EntryArena, EntryId};
use crate::frame::FrameNumber;
use crate::geometry::{CellPos, LockedPages, PageIndex, VramLayout};
use crate::table::CellTable;
use crate::view::PageView;

// =============================================================================
// RESIDENCY
// =============================================================================

/// Where a resident texture can be sampled from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Residency {
    /// Texture held
    pub texture: TextureId,
    /// Arena handle of the entry
    pub entry: EntryId,
    /// Page holding it
    pub page: PageIndex,
    /// Top-left cell of the footprint
    pub cell: CellPos,
    /// Page-relative texel column of the image's top-left corner
    pub u: u16,
    /// Page-relative texel row of the image's top-left corner
    pub v: u16,
    /// Image width in texels
    pub width: u16,
    /// Image height in texels
    pub height: u16,
    /// VRAM words the image occupies
    pub vram: VramRect,
    /// Texture page id to put in primitives
    pub tpage: TexPageId,
    /// Frame of the most recent reference
    pub last_used: FrameNumber,
}

impl Residency {
    fn of(id: EntryId, entry: &CacheEntry, layout: &VramLayout) -> Self {
        let (u, v) = layout.cell_texel(entry.cell);
        Self {
            texture: entry.texture,
            entry: id,
            page: entry.page,
            cell: entry.cell,
            u,
            v,
            width: entry.width,
            height: entry.height,
            vram: entry.vram,
            tpage: entry.tpage,
            last_used: entry.last_used,
        }
    }
}

// =============================================================================
// FILL CURSOR / STATISTICS
// =============================================================================

/// Position the next placement attempt starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillCursor {
    /// Page being filled
    pub page: PageIndex,
    /// Next candidate cell
    pub cell: CellPos,
    /// Tallest footprint on the current row, in cells
    pub row_height: u16,
}

impl FillCursor {
    fn at_page(page: PageIndex) -> Self {
        Self {
            page,
            cell: CellPos::new(0, 0),
            row_height: 0,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// References served by an already resident image
    pub hits: u64,
    /// References that required an upload
    pub misses: u64,
    /// Images evicted to make room or by request
    pub evictions: u64,
    /// Images uploaded to VRAM
    pub uploads: u64,
    /// Cache resets
    pub resets: u64,
    /// Placements that failed for lack of space
    pub overflows: u64,
}

impl CacheStats {
    /// Fraction of references served without an upload
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f32 / total as f32
    }
}

// =============================================================================
// TEXTURE CACHE
// =============================================================================

/// VRAM texture residency manager
#[derive(Debug)]
pub struct TextureCache {
    layout: VramLayout,
    cells: CellTable,
    entries: EntryArena,
    resident: HashMap<TextureId, EntryId>,
    cursor: FillCursor,
    /// Decompression output, reused across misses
    scratch: Vec<u8>,
    /// Upload words, reused across misses
    staging: Vec<u16>,
    stats: CacheStats,
}

impl TextureCache {
    /// Create an empty cache over `layout`
    pub fn new(layout: VramLayout) -> Result<Self> {
        layout.validate()?;

        let cursor = FillCursor::at_page(layout.first_unlocked().unwrap_or_default());
        log::info!(
            "texture cache: {} pages of {}x{} cells, locked {:?}",
            layout.page_count(),
            layout.cells_x,
            layout.cells_y,
            layout.locked
        );

        Ok(Self {
            cells: CellTable::new(&layout),
            entries: EntryArena::with_capacity(layout.page_count() * 8),
            resident: HashMap::new(),
            cursor,
            scratch: Vec::new(),
            staging: Vec::new(),
            stats: CacheStats::default(),
            layout,
        })
    }

    /// Page geometry
    #[inline]
    pub fn layout(&self) -> &VramLayout {
        &self.layout
    }

    /// Currently locked pages
    #[inline]
    pub fn locked_pages(&self) -> LockedPages {
        self.layout.locked
    }

    /// Where the next placement starts
    #[inline]
    pub fn cursor(&self) -> FillCursor {
        self.cursor
    }

    /// Get statistics
    #[inline]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of resident images
    #[inline]
    pub fn resident_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether `texture` is resident
    pub fn is_resident(&self, texture: TextureId) -> bool {
        self.resident.contains_key(&texture)
    }

    /// Entry of a resident texture
    pub fn entry(&self, texture: TextureId) -> Option<&CacheEntry> {
        self.resident
            .get(&texture)
            .and_then(|&id| self.entries.get(id))
    }

    /// Residency of a resident texture, without touching it
    pub fn residency(&self, texture: TextureId) -> Option<Residency> {
        let id = *self.resident.get(&texture)?;
        self.entries
            .get(id)
            .map(|entry| Residency::of(id, entry, &self.layout))
    }

    /// Iterate over resident entries
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> + '_ {
        self.entries.iter().map(|(_, entry)| entry)
    }

    /// Entry whose footprint covers `cell` on `page`
    pub fn owner_of(&self, page: PageIndex, cell: CellPos) -> Option<&CacheEntry> {
        self.cells
            .get(page, cell)
            .and_then(|id| self.entries.get(id))
    }

    /// Snapshot of one page's occupancy
    pub fn page_view(&self, page: PageIndex) -> Result<PageView> {
        PageView::capture(page, &self.layout, &self.cells, &self.entries)
    }

    // -------------------------------------------------------------------------
    // Residency
    // -------------------------------------------------------------------------

    /// Make `texture` resident and mark it referenced during `frame`
    ///
    /// On a hit only the usage stamp changes. On a miss the image is pulled
    /// from `source`, placed at the fill cursor (evicting stale occupants)
    /// and copied to VRAM through `vram`.
    pub fn ensure_resident<S, U>(
        &mut self,
        texture: TextureId,
        width: u16,
        height: u16,
        frame: FrameNumber,
        source: &mut S,
        vram: &mut U,
    ) -> Result<Residency>
    where
        S: TextureSource + ?Sized,
        U: VramUpload + ?Sized,
    {
        if let Some(&id) = self.resident.get(&texture) {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.touch(frame);
                self.stats.hits += 1;
                return Ok(Residency::of(id, entry, &self.layout));
            }
            self.resident.remove(&texture);
        }
        self.stats.misses += 1;

        if width == 0 || height == 0 {
            log::error!("texture cache: {} has zero size", texture);
            return Err(Error::malformed(texture, MalformedReason::ZeroSize));
        }

        let (width_cells, height_cells) = self.layout.footprint(width, height);
        if width_cells > self.layout.cells_x || height_cells > self.layout.cells_y {
            self.stats.overflows += 1;
            log::error!(
                "texture cache: {} ({}x{}) is larger than a page",
                texture,
                width,
                height
            );
            return Err(Error::CacheOverflow {
                texture,
                width_cells,
                height_cells,
            });
        }

        if self.layout.locked.covers_all(self.layout.page_count()) {
            return Err(Error::AllPagesLocked);
        }

        self.stage(texture, width, height, source)?;
        let (page, cell) = self.find_space(texture, width_cells, height_cells, frame)?;

        let rect = self.layout.upload_rect(page, cell, width, height)?;
        vram.load_image(rect, &self.staging)?;
        self.stats.uploads += 1;
        log::trace!(
            "texture cache: uploaded {} to {} cell ({}, {})",
            texture,
            page,
            cell.x,
            cell.y
        );

        let entry = CacheEntry {
            texture,
            page,
            cell,
            width_cells,
            height_cells,
            width,
            height,
            vram: rect,
            tpage: self.layout.tpage(page)?,
            last_used: frame,
        };
        let residency_entry = entry.clone();
        let id = self.entries.insert(entry);
        self.cells
            .fill(page, cell, width_cells, height_cells, Some(id));
        self.resident.insert(texture, id);

        self.cursor.cell.x += width_cells;
        self.cursor.row_height = self.cursor.row_height.max(height_cells);

        Ok(Residency::of(id, &residency_entry, &self.layout))
    }

    /// Decode `texture` into the staging words
    fn stage<S>(&mut self, texture: TextureId, width: u16, height: u16, source: &mut S) -> Result<()>
    where
        S: TextureSource + ?Sized,
    {
        let data = source.decode(texture)?;
        if data.width != width || data.height != height {
            log::error!(
                "texture cache: {} decoded as {}x{}, referenced as {}x{}",
                texture,
                data.width,
                data.height,
                width,
                height
            );
            return Err(Error::malformed(texture, MalformedReason::DimensionMismatch));
        }

        let row_words = width.div_ceil(self.layout.depth.texels_per_word()) as usize;
        let needed = row_words * 2 * height as usize;

        let bytes = match data.encoding {
            TextureEncoding::Raw => data.bytes,
            TextureEncoding::Lzss => {
                lzss::decode_into(data.bytes, &mut self.scratch, self.layout.page_bytes())
                    .map_err(|err| {
                        log::error!("texture cache: {} stream is corrupt: {:?}", texture, err);
                        let reason = match err {
                            LzssError::OutputTooLarge => MalformedReason::TooLarge,
                            _ => MalformedReason::CorruptStream,
                        };
                        Error::malformed(texture, reason)
                    })?;
                &self.scratch[..]
            },
        };

        let Some(texels) = bytes.get(..needed) else {
            log::error!(
                "texture cache: {} has {} of {} texel bytes",
                texture,
                bytes.len(),
                needed
            );
            return Err(Error::malformed(texture, MalformedReason::TruncatedPixels));
        };

        self.staging.clear();
        self.staging.extend(
            texels
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]])),
        );
        Ok(())
    }

    /// Walk the fill cursor until a `w` x `h` footprint is free
    fn find_space(
        &mut self,
        texture: TextureId,
        w: u16,
        h: u16,
        frame: FrameNumber,
    ) -> Result<(PageIndex, CellPos)> {
        let start_page = self.cursor.page;

        loop {
            if self.cursor.cell.x + w > self.layout.cells_x {
                self.cursor.cell.x = 0;
                self.cursor.cell.y += self.cursor.row_height;
                self.cursor.row_height = 0;
            }

            if self.cursor.cell.y + h > self.layout.cells_y {
                let next = self
                    .layout
                    .next_unlocked(self.cursor.page)
                    .ok_or(Error::AllPagesLocked)?;
                self.cursor = FillCursor::at_page(next);

                if next == start_page {
                    self.stats.overflows += 1;
                    log::error!(
                        "Texture Cache Overflow: no room for {} ({}x{} cells) in frame {}",
                        texture,
                        w,
                        h,
                        frame.raw()
                    );
                    return Err(Error::CacheOverflow {
                        texture,
                        width_cells: w,
                        height_cells: h,
                    });
                }
                log::debug!("texture cache: fill moved to {}", next);
            }

            match self.clear_footprint(w, h, frame) {
                None => return Ok((self.cursor.page, self.cursor.cell)),
                Some((right, bottom)) => {
                    self.cursor.cell.x = right;
                    self.cursor.row_height =
                        self.cursor.row_height.max(bottom - self.cursor.cell.y);
                },
            }
        }
    }

    /// Evict stale occupants of the footprint at the cursor
    ///
    /// Stops at the first live occupant and returns its right edge and
    /// bottom edge in cells.
    fn clear_footprint(&mut self, w: u16, h: u16, frame: FrameNumber) -> Option<(u16, u16)> {
        let page = self.cursor.page;
        let origin = self.cursor.cell;

        for y in origin.y..origin.y + h {
            for x in origin.x..origin.x + w {
                let cell = CellPos::new(x, y);
                let Some(id) = self.cells.get(page, cell) else {
                    continue;
                };

                let occupant = self.entries.get(id).map(|entry| {
                    (
                        entry.is_live(frame),
                        entry.cell.x + entry.width_cells,
                        entry.cell.y + entry.height_cells,
                    )
                });
                match occupant {
                    Some((true, right, bottom)) => return Some((right, bottom)),
                    Some((false, _, _)) => {
                        self.evict_entry(id);
                    },
                    None => self.cells.clear(page, cell, 1, 1),
                }
            }
        }
        None
    }

    fn evict_entry(&mut self, id: EntryId) -> Option<CacheEntry> {
        let entry = self.entries.remove(id)?;
        self.cells
            .clear(entry.page, entry.cell, entry.width_cells, entry.height_cells);
        self.resident.remove(&entry.texture);
        self.stats.evictions += 1;
        log::debug!(
            "texture cache: evicted {} from {} cell ({}, {}), last used in frame {}",
            entry.texture,
            entry.page,
            entry.cell.x,
            entry.cell.y,
            entry.last_used.raw()
        );
        Some(entry)
    }

    // -------------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------------

    /// Drop `texture` from the cache
    pub fn evict(&mut self, texture: TextureId) -> Result<CacheEntry> {
        let id = *self
            .resident
            .get(&texture)
            .ok_or(Error::NotResident(texture))?;
        self.evict_entry(id).ok_or(Error::NotResident(texture))
    }

    /// Evict everything on unlocked pages and restart filling
    ///
    /// Locked pages and their contents are left alone.
    pub fn reset(&mut self) {
        let locked = self.layout.locked;
        let doomed: Vec<EntryId> = self
            .entries
            .iter()
            .filter(|(_, entry)| !locked.contains(entry.page))
            .map(|(id, _)| id)
            .collect();

        let evicted = doomed.len();
        for id in doomed {
            self.evict_entry(id);
        }
        for page in 0..self.layout.page_count() as u16 {
            if !locked.contains(PageIndex(page)) {
                self.cells.clear_page(PageIndex(page));
            }
        }

        self.cursor = FillCursor::at_page(self.layout.first_unlocked().unwrap_or_default());
        self.stats.resets += 1;
        log::info!(
            "texture cache: reset, {} evicted, {} kept on locked pages, hit rate {:.2}",
            evicted,
            self.entries.len(),
            self.stats.hit_rate()
        );
    }

    /// Replace the locked page mask, then reset
    pub fn set_locked_pages(&mut self, locked: LockedPages) {
        log::info!("texture cache: locked pages {:?} -> {:?}", self.layout.locked, locked);
        self.layout.locked = locked;
        self.reset();
    }
}

static_assertions::assert_impl_all!(TextureCache: Send, Sync);
static_assertions::assert_impl_all!(Residency: Send, Sync, Copy);
