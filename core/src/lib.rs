//! # Tessera Renderer Core
//!
//! The thin orchestration layer above the texture cache and the command
//! ring. It owns both, plus the frame counter that decides which cache
//! entries are live, and runs the present/drain step at the end of every
//! frame.
//!
//! ## Components
//!
//! - **Renderer**: residency, submission and draw helpers
//! - **RendererConfig**: layout and ring configuration, command line overrides
//!
//! ## Frame Lifecycle
//!
//! ```text
//!  ┌──────────────┐   draw calls    ┌──────────────┐   present   ┌──────────────┐
//!  │  frame N     │ ──────────────▶ │ ring filled, │ ──────────▶ │  frame N+1   │
//!  │  (stamp N)   │  ensure_resident│ entries live │  flush +    │  (stamp N+1) │
//!  └──────────────┘  + append       └──────────────┘  advance    └──────────────┘
//! ```
//!
//! ## Failure
//!
//! Cache overflow, consumer stalls and malformed textures come back as
//! [`Error`]s for which [`Error::is_fatal`] holds. Nothing here retries
//! them; stopping is the caller's call.

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod config;
pub mod renderer;

#[cfg(test)]
mod tests;

pub use config::RendererConfig;
pub use renderer::Renderer;
pub use tessera_hal::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
