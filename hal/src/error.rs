//! # Tessera Error Handling
//!
//! One error type for the whole residency/submission stack.
//!
//! Error handling in Tessera follows these principles:
//! - Errors are typed and categorized
//! - No panics in production code paths
//! - Errors carry the texture or ring state needed to report them
//! - Errors are `no_std` compatible and `Copy`

use core::fmt;

use crate::types::TextureId;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// Tessera Result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// Tessera unified error type
///
/// `CacheOverflow`, `RingStall` and `MalformedTexture` are fatal for the
/// frame being built: nothing inside the stack retries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Invalid parameter provided
    InvalidParameter,

    // =========================================================================
    // Texture Cache Errors
    // =========================================================================
    /// No unlocked page can hold the texture, even after evicting everything
    /// that was not referenced this frame
    CacheOverflow {
        /// Texture that could not be placed
        texture: TextureId,
        /// Requested footprint width in cells
        width_cells: u16,
        /// Requested footprint height in cells
        height_cells: u16,
    },
    /// Every cache page is locked, there is nowhere to allocate
    AllPagesLocked,
    /// The texture is not resident in the cache
    NotResident(TextureId),
    /// Page index outside the configured page grid
    InvalidPage(u16),
    /// The texture source returned data that cannot be uploaded
    MalformedTexture {
        /// Texture being decoded
        texture: TextureId,
        /// What was wrong with it
        reason: MalformedReason,
    },
    /// Upload rectangle falls outside VRAM
    VramOutOfBounds,

    // =========================================================================
    // Command Ring Errors
    // =========================================================================
    /// The consumer stayed busy for the configured number of polls
    RingStall {
        /// Consecutive busy polls observed
        polls: u64,
    },
    /// Primitive has more data words than a tag can describe
    PrimitiveTooLarge(usize),
    /// Primitive cannot fit in the ring even when it is empty
    RingTooSmall,
    /// A ring location was already drained by the consumer
    StaleLocation(u32),
}

/// Why a texture was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Decoded size differs from the requested size
    DimensionMismatch,
    /// Width or height is zero
    ZeroSize,
    /// Width or height exceeds what a cache page can address
    TooLarge,
    /// Fewer pixel bytes than the dimensions require
    TruncatedPixels,
    /// Compressed stream is corrupt
    CorruptStream,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Generic
            Self::InvalidParameter => write!(f, "invalid parameter"),

            // Texture cache
            Self::CacheOverflow {
                texture,
                width_cells,
                height_cells,
            } => write!(
                f,
                "texture cache overflow placing {} ({}x{} cells)",
                texture, width_cells, height_cells
            ),
            Self::AllPagesLocked => write!(f, "all texture cache pages are locked"),
            Self::NotResident(texture) => write!(f, "{} is not resident", texture),
            Self::InvalidPage(page) => write!(f, "invalid texture cache page {}", page),
            Self::MalformedTexture { texture, reason } => {
                write!(f, "malformed texture {}: {}", texture, reason)
            },
            Self::VramOutOfBounds => write!(f, "upload rectangle outside VRAM"),

            // Command ring
            Self::RingStall { polls } => {
                write!(f, "GPU consumer stalled ({} busy polls)", polls)
            },
            Self::PrimitiveTooLarge(words) => {
                write!(f, "primitive too large ({} data words)", words)
            },
            Self::RingTooSmall => write!(f, "primitive does not fit in command ring"),
            Self::StaleLocation(offset) => {
                write!(f, "ring location {:#x} already drained", offset)
            },
        }
    }
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch => write!(f, "inconsistent dimensions"),
            Self::ZeroSize => write!(f, "zero-sized"),
            Self::TooLarge => write!(f, "larger than a texture page"),
            Self::TruncatedPixels => write!(f, "truncated pixel data"),
            Self::CorruptStream => write!(f, "corrupt compressed stream"),
        }
    }
}

impl Error {
    /// Shorthand for building a `MalformedTexture` error
    pub const fn malformed(texture: TextureId, reason: MalformedReason) -> Self {
        Self::MalformedTexture { texture, reason }
    }

    /// Whether the error stops the current frame from being rendered
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::CacheOverflow { .. }
                | Self::AllPagesLocked
                | Self::RingStall { .. }
                | Self::MalformedTexture { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_display_names_texture() {
        let err = Error::CacheOverflow {
            texture: TextureId::new(7),
            width_cells: 4,
            height_cells: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("overflow"));
        assert!(msg.contains("#7"));
        assert!(msg.contains("4x8"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::RingStall { polls: 10 }.is_fatal());
        assert!(Error::malformed(TextureId::new(1), MalformedReason::ZeroSize).is_fatal());
        assert!(!Error::NotResident(TextureId::new(1)).is_fatal());
        assert!(!Error::StaleLocation(4).is_fatal());
    }
}
