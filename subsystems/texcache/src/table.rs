//! # Cell Table
//!
//! One slot per cell across all cache pages. An occupied slot names the
//! entry whose footprint covers the cell; it never owns it.

use alloc::vec;
use alloc::vec::Vec;

use crate::entry::EntryId;
use crate::geometry::{CellPos, PageIndex, VramLayout};

/// Cell → owning entry map for every page
#[derive(Debug, Clone)]
pub struct CellTable {
    cells_x: u16,
    cells_y: u16,
    pages: usize,
    cells: Vec<Option<EntryId>>,
}

impl CellTable {
    /// Create an empty table sized for `layout`
    pub fn new(layout: &VramLayout) -> Self {
        Self {
            cells_x: layout.cells_x,
            cells_y: layout.cells_y,
            pages: layout.page_count(),
            cells: vec![None; layout.page_count() * layout.cells_per_page()],
        }
    }

    #[inline]
    fn index(&self, page: PageIndex, cell: CellPos) -> Option<usize> {
        if page.get() >= self.pages || cell.x >= self.cells_x || cell.y >= self.cells_y {
            return None;
        }
        let per_page = self.cells_x as usize * self.cells_y as usize;
        Some(page.get() * per_page + cell.y as usize * self.cells_x as usize + cell.x as usize)
    }

    /// Entry occupying `cell`, if any
    pub fn get(&self, page: PageIndex, cell: CellPos) -> Option<EntryId> {
        self.index(page, cell).and_then(|i| self.cells[i])
    }

    /// Point every cell of the `w` x `h` footprint at `cell` to `owner`
    ///
    /// Cells falling outside the page are ignored.
    pub fn fill(&mut self, page: PageIndex, cell: CellPos, w: u16, h: u16, owner: Option<EntryId>) {
        for y in cell.y..cell.y.saturating_add(h) {
            for x in cell.x..cell.x.saturating_add(w) {
                if let Some(i) = self.index(page, CellPos::new(x, y)) {
                    self.cells[i] = owner;
                }
            }
        }
    }

    /// Empty every cell of the footprint
    #[inline]
    pub fn clear(&mut self, page: PageIndex, cell: CellPos, w: u16, h: u16) {
        self.fill(page, cell, w, h, None);
    }

    /// Empty every cell of `page`
    pub fn clear_page(&mut self, page: PageIndex) {
        let per_page = self.cells_x as usize * self.cells_y as usize;
        let start = page.get() * per_page;
        if let Some(cells) = self.cells.get_mut(start..start + per_page) {
            cells.fill(None);
        }
    }

    /// Occupied cells of `page`, row-major
    pub fn occupied(&self, page: PageIndex) -> impl Iterator<Item = (CellPos, EntryId)> + '_ {
        let per_page = self.cells_x as usize * self.cells_y as usize;
        let start = page.get().min(self.pages) * per_page;
        let end = (start + per_page).min(self.cells.len());
        let cells_x = self.cells_x as usize;
        self.cells[start..end]
            .iter()
            .enumerate()
            .filter_map(move |(i, owner)| {
                owner.map(|id| (CellPos::new((i % cells_x) as u16, (i / cells_x) as u16), id))
            })
    }

    /// Number of occupied cells on `page`
    pub fn occupied_count(&self, page: PageIndex) -> usize {
        self.occupied(page).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::tests::entry;
    use crate::entry::EntryArena;

    fn small_layout() -> VramLayout {
        VramLayout {
            cells_x: 4,
            cells_y: 4,
            ..VramLayout::psx()
        }
    }

    #[test]
    fn test_fill_and_clear() {
        let layout = small_layout();
        let mut table = CellTable::new(&layout);
        let mut arena = EntryArena::new();
        let id = arena.insert(entry(1, 2, 1, 1, 2, 2));

        table.fill(PageIndex(2), CellPos::new(1, 1), 2, 2, Some(id));
        assert_eq!(table.get(PageIndex(2), CellPos::new(2, 2)), Some(id));
        assert_eq!(table.get(PageIndex(2), CellPos::new(0, 0)), None);
        assert_eq!(table.get(PageIndex(1), CellPos::new(1, 1)), None);
        assert_eq!(table.occupied_count(PageIndex(2)), 4);

        table.clear(PageIndex(2), CellPos::new(1, 1), 2, 2);
        assert_eq!(table.occupied_count(PageIndex(2)), 0);
    }

    #[test]
    fn test_out_of_range_is_empty() {
        let layout = small_layout();
        let table = CellTable::new(&layout);
        assert_eq!(table.get(PageIndex(11), CellPos::new(0, 0)), None);
        assert_eq!(table.get(PageIndex(0), CellPos::new(4, 0)), None);
        assert_eq!(table.occupied_count(PageIndex(40)), 0);
    }

    #[test]
    fn test_occupied_positions() {
        let layout = small_layout();
        let mut table = CellTable::new(&layout);
        let mut arena = EntryArena::new();
        let id = arena.insert(entry(1, 0, 3, 2, 1, 1));
        table.fill(PageIndex(0), CellPos::new(3, 2), 1, 1, Some(id));

        let cells: Vec<_> = table.occupied(PageIndex(0)).collect();
        assert_eq!(cells, vec![(CellPos::new(3, 2), id)]);

        table.clear_page(PageIndex(0));
        assert_eq!(table.occupied_count(PageIndex(0)), 0);
    }
}
