//! # Tessera Texture Cache
//!
//! Decides where decoded texture images live in a small, page-organized
//! VRAM and when previously cached images are evicted to make room.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Texture Cache                              │
//! │                                                                 │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                 TextureCache (allocator)                  │  │
//! │  │      fill cursor · eviction policy · upload staging       │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │            │                    │                     │         │
//! │  ┌─────────┴───────┐  ┌─────────┴────────┐  ┌─────────┴──────┐  │
//! │  │    CellTable    │  │    EntryArena    │  │  FrameTracker  │  │
//! │  │ (cell → entry)  │  │ (resident imgs)  │  │ (usage stamps) │  │
//! │  └─────────────────┘  └──────────────────┘  └────────────────┘  │
//! │            │                                                    │
//! │  ┌─────────┴─────────────────────────────────────────────────┐  │
//! │  │        Page grid: N pages × cells_x × cells_y cells       │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Placement
//!
//! Textures are packed left to right, top to bottom, page after page,
//! starting wherever the last texture was placed. Anything in the way that
//! was not referenced during the current frame is evicted; anything that
//! was is stepped around. Coming back around to the starting page means
//! the current frame alone needs more VRAM than exists: a fatal overflow.

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod allocator;
pub mod entry;
pub mod frame;
pub mod geometry;
pub mod table;
pub mod view;

// Re-exports
pub use allocator::{CacheStats, FillCursor, Residency, TextureCache};
pub use entry::{CacheEntry, EntryArena, EntryId};
pub use frame::{FrameNumber, FrameTracker};
pub use geometry::{CellPos, LockedPages, PageIndex, VramLayout};
pub use table::CellTable;
pub use view::PageView;
