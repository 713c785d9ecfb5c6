//! # Tessera Command System
//!
//! Draw primitive records and the ring that carries them to the
//! rasterizer.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                    Primitive Submission Pipeline                  │
//! │                                                                   │
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────────┐     │
//! │  │  Renderer    │    │   Command    │    │    GpuPort       │     │
//! │  │ (Primitive   │───▶│    Ring      │───▶│  (rasterizer or  │     │
//! │  │ constructors)│    │ (tag chain)  │    │    SoftGpu)      │     │
//! │  └──────────────┘    └──────────────┘    └──────────────────┘     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submission Flow
//!
//! 1. The renderer builds a [`Primitive`] and appends it to the ring
//! 2. If the ring is full, the oldest primitives are handed to the port,
//!    waiting while it reports busy
//! 3. At the end of the frame the chain is terminated and drained in full

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod primitive;
pub mod ring;

// Re-exports
pub use primitive::{PrimTag, Primitive, MAX_PRIM_WORDS, TERMINATOR_TAG};
pub use ring::{CommandRing, Pending, PrimLocation, RingConfig, RingStats};
