//! # Cache Entries
//!
//! Resident texture records and the dense arena that owns them.
//!
//! Cells refer to entries by [`EntryId`] (slot index plus generation), so
//! releasing an entry invalidates every outstanding id without any cell
//! needing to own or borrow the record.

use alloc::vec::Vec;

use tessera_hal::{TexPageId, TextureId, VramRect};

use crate::frame::FrameNumber;
use crate::geometry::{CellPos, PageIndex};

// =============================================================================
// ENTRY ID
// =============================================================================

/// Handle of a slot in an [`EntryArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId {
    index: u32,
    generation: u32,
}

impl EntryId {
    /// Slot index
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation the id was issued for
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

// =============================================================================
// CACHE ENTRY
// =============================================================================

/// One resident texture image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Texture held
    pub texture: TextureId,
    /// Page holding it
    pub page: PageIndex,
    /// Top-left cell of the footprint
    pub cell: CellPos,
    /// Footprint width in cells
    pub width_cells: u16,
    /// Footprint height in cells
    pub height_cells: u16,
    /// Image width in texels
    pub width: u16,
    /// Image height in texels
    pub height: u16,
    /// Where the texels were uploaded
    pub vram: VramRect,
    /// Texture page id for primitives sampling this image
    pub tpage: TexPageId,
    /// Frame of the most recent reference
    pub last_used: FrameNumber,
}

impl CacheEntry {
    /// Stamp a reference made during `frame`
    ///
    /// Stamps never move backwards; an older `frame` is ignored.
    #[inline]
    pub fn touch(&mut self, frame: FrameNumber) {
        if frame > self.last_used {
            self.last_used = frame;
        }
    }

    /// Whether the entry was referenced during `frame`
    #[inline]
    pub fn is_live(&self, frame: FrameNumber) -> bool {
        self.last_used == frame
    }

    /// Whether the footprint covers `cell` on `page`
    pub fn covers(&self, page: PageIndex, cell: CellPos) -> bool {
        self.page == page
            && cell.x >= self.cell.x
            && cell.x < self.cell.x + self.width_cells
            && cell.y >= self.cell.y
            && cell.y < self.cell.y + self.height_cells
    }

    /// Whether two footprints share any cell
    pub fn overlaps(&self, other: &CacheEntry) -> bool {
        self.page == other.page
            && self.cell.x < other.cell.x + other.width_cells
            && other.cell.x < self.cell.x + self.width_cells
            && self.cell.y < other.cell.y + other.height_cells
            && other.cell.y < self.cell.y + self.height_cells
    }
}

// =============================================================================
// ENTRY ARENA
// =============================================================================

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entry: Option<CacheEntry>,
}

/// Dense storage for cache entries
#[derive(Debug, Clone, Default)]
pub struct EntryArena {
    slots: Vec<Slot>,
    /// Free slot indices (stack for O(1) insert/remove)
    free_stack: Vec<u32>,
    live: usize,
}

impl EntryArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena with room for `capacity` entries before growing
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_stack: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    /// Store an entry
    pub fn insert(&mut self, entry: CacheEntry) -> EntryId {
        self.live += 1;

        if let Some(index) = self.free_stack.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return EntryId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        EntryId {
            index,
            generation: 0,
        }
    }

    /// Release an entry, invalidating its id
    pub fn remove(&mut self, id: EntryId) -> Option<CacheEntry> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }

        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_stack.push(id.index);
        self.live -= 1;
        Some(entry)
    }

    /// Look up an entry
    pub fn get(&self, id: EntryId) -> Option<&CacheEntry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    /// Look up an entry mutably
    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut CacheEntry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    /// Number of live entries
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no entry is live
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate over live entries
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &CacheEntry)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry.as_ref().map(|entry| {
                (
                    EntryId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    entry,
                )
            })
        })
    }
}
