//! # Frame Usage Tracker
//!
//! A per-frame counter stamped onto every cache entry a frame references.
//! An entry stamped with the current frame is live and must not be evicted;
//! any older stamp marks it stale.

use core::fmt;

/// A frame number
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct FrameNumber(u64);

impl FrameNumber {
    /// Wrap a raw frame count
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw frame count
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}

/// Monotonic frame counter
///
/// Advanced exactly once per presented frame, before the next frame makes
/// any cache reference.
#[derive(Debug, Clone, Default)]
pub struct FrameTracker {
    current: FrameNumber,
}

impl FrameTracker {
    /// Start counting at frame 0
    pub const fn new() -> Self {
        Self {
            current: FrameNumber(0),
        }
    }

    /// Start counting at an externally supplied frame index
    pub const fn starting_at(frame: FrameNumber) -> Self {
        Self { current: frame }
    }

    /// Frame currently being built
    #[inline]
    pub const fn current(&self) -> FrameNumber {
        self.current
    }

    /// Move on to the next frame and return it
    pub fn advance(&mut self) -> FrameNumber {
        self.current = FrameNumber(self.current.0.wrapping_add(1));
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_is_monotonic() {
        let mut tracker = FrameTracker::new();
        let first = tracker.current();
        let second = tracker.advance();
        assert!(second > first);
        assert_eq!(tracker.current(), second);
        assert_eq!(second.raw(), 1);
    }

    #[test]
    fn test_starting_at() {
        let tracker = FrameTracker::starting_at(FrameNumber::new(41));
        assert_eq!(tracker.current().raw(), 41);
    }
}
