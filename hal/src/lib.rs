//! # Tessera HAL
//!
//! Hardware-facing foundations shared by every Tessera crate.
//!
//! This crate owns the vocabulary the texture cache and the command ring
//! speak: strongly typed VRAM coordinates, the rasterizer port the ring
//! drains into, the upload path the cache copies pixels through, and the
//! packed id words (texture page, CLUT) that draw primitives carry.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       tessera-hal                           │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │   Ports     │  │   Types     │  │      Error          │  │
//! │  │ (GpuPort,   │  │ (VramRect,  │  │     Handling        │  │
//! │  │ VramUpload) │  │  TextureId) │  │                     │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  TPage/CLUT │  │ LZSS codec  │  │  SoftGpu (software  │  │
//! │  │  encoding   │  │             │  │   rasterizer model) │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod error;
pub mod gpu;
pub mod lzss;
pub mod soft;
pub mod source;
pub mod tpage;
pub mod types;
pub mod vram;

// Re-exports for convenience
pub use error::{Error, MalformedReason, Result};
pub use gpu::{GpuPort, GpuStatus};
pub use source::{MemorySource, TextureData, TextureEncoding, TextureSource};
pub use tpage::{BlendMode, ClutId, TexDepth, TexPageId};
pub use types::*;
pub use vram::{Vram, VramUpload};
