//! # Page View
//!
//! Read-only snapshot of one cache page, for debug overlays.

use alloc::vec::Vec;

use tessera_hal::{Result, VramRect};

use crate::entry::{CacheEntry, EntryArena};
use crate::geometry::{PageIndex, VramLayout};
use crate::table::CellTable;

/// Occupancy of one cache page
#[derive(Debug, Clone)]
pub struct PageView {
    /// Page described
    pub page: PageIndex,
    /// VRAM words the page covers
    pub vram: VramRect,
    /// Whether the page is locked
    pub locked: bool,
    /// Entries resident on the page, in row-major order of their top-left cell
    pub entries: Vec<CacheEntry>,
    /// Cells covered by some entry
    pub occupied_cells: usize,
    /// Cells on the page
    pub total_cells: usize,
}

impl PageView {
    pub(crate) fn capture(
        page: PageIndex,
        layout: &VramLayout,
        cells: &CellTable,
        arena: &EntryArena,
    ) -> Result<Self> {
        let vram = layout.page_rect(page)?;

        let mut entries: Vec<CacheEntry> = arena
            .iter()
            .filter(|(_, entry)| entry.page == page)
            .map(|(_, entry)| entry.clone())
            .collect();
        entries.sort_by_key(|entry| (entry.cell.y, entry.cell.x));

        Ok(Self {
            page,
            vram,
            locked: layout.locked.contains(page),
            entries,
            occupied_cells: cells.occupied_count(page),
            total_cells: layout.cells_per_page(),
        })
    }

    /// Fraction of the page's cells in use
    pub fn fill_ratio(&self) -> f32 {
        if self.total_cells == 0 {
            return 0.0;
        }
        self.occupied_cells as f32 / self.total_cells as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::tests::entry;

    #[test]
    fn test_capture_lists_page_entries() {
        let layout = VramLayout::psx();
        let mut cells = CellTable::new(&layout);
        let mut arena = EntryArena::new();

        let a = arena.insert(entry(1, 3, 4, 2, 2, 2));
        let b = arena.insert(entry(2, 3, 0, 0, 4, 1));
        let c = arena.insert(entry(3, 5, 0, 0, 1, 1));
        cells.fill(PageIndex(3), crate::geometry::CellPos::new(4, 2), 2, 2, Some(a));
        cells.fill(PageIndex(3), crate::geometry::CellPos::new(0, 0), 4, 1, Some(b));
        cells.fill(PageIndex(5), crate::geometry::CellPos::new(0, 0), 1, 1, Some(c));

        let view = PageView::capture(PageIndex(3), &layout, &cells, &arena).unwrap();
        assert_eq!(view.vram, VramRect::new(896, 0, 128, 256));
        assert!(!view.locked);
        assert_eq!(view.occupied_cells, 8);
        assert_eq!(view.total_cells, 256);

        let textures: Vec<u32> = view.entries.iter().map(|e| e.texture.raw()).collect();
        assert_eq!(textures, [2, 1]);
        assert!((view.fill_ratio() - 8.0 / 256.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_capture_rejects_bad_page() {
        let layout = VramLayout::psx();
        let cells = CellTable::new(&layout);
        let arena = EntryArena::new();
        assert!(PageView::capture(PageIndex(11), &layout, &cells, &arena).is_err());
    }
}
