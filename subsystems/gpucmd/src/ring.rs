//! # Command Ring
//!
//! Circular buffer of tagged primitives between the renderer (producer)
//! and the rasterizer (consumer).
//!
//! ```text
//!            begin                      end
//!              ▼                         ▼
//! ┌────────────┬─────┬──────┬──────┬─────┬──────────────┐
//! │   free     │ tag │ data │ tag  │data │     free     │
//! └────────────┴─────┴──────┴──────┴─────┴──────────────┘
//!                 └──────────▲ └─────────▲
//! ```
//!
//! `begin == end` means empty. A primitive is only written where a strictly
//! positive gap remains after it, so the two never meet while anything is
//! pending and there is always a word left for a wrap marker or the chain
//! terminator. When the producer runs out of room it hands primitives to
//! the consumer one at a time, waiting while the consumer reports busy.

use alloc::vec;
use alloc::vec::Vec;

use tessera_hal::{Error, GpuPort, Result};

use crate::primitive::{PrimTag, Primitive, TERMINATOR_TAG};

/// Largest ring a 24-bit tag link can address, in words
pub const MAX_RING_WORDS: usize = 1 << 24;

// =============================================================================
// RING CONFIGURATION
// =============================================================================

/// Command ring configuration
#[derive(Debug, Clone)]
pub struct RingConfig {
    /// Ring size in 32-bit words
    pub capacity_words: usize,
    /// Consecutive busy polls tolerated before giving up; `None` waits forever
    pub stall_limit: Option<u64>,
    /// Hand primitives to an idle consumer right after each append
    pub eager_drain: bool,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self::psx()
    }
}

impl RingConfig {
    /// Reference configuration: 64 KiB, no stall limit, lazy draining
    pub const fn psx() -> Self {
        Self::with_capacity_bytes(64 * 1024)
    }

    /// Ring of `bytes` bytes, rounded down to whole words
    pub const fn with_capacity_bytes(bytes: usize) -> Self {
        Self {
            capacity_words: bytes / 4,
            stall_limit: None,
            eager_drain: false,
        }
    }

    /// Ring size in bytes
    #[inline]
    pub const fn capacity_bytes(&self) -> usize {
        self.capacity_words * 4
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.capacity_words < 2 || self.capacity_words > MAX_RING_WORDS {
            return Err(Error::InvalidParameter);
        }
        if self.stall_limit == Some(0) {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }
}

// =============================================================================
// PRIMITIVE LOCATION
// =============================================================================

/// Where an appended primitive sits in the ring
///
/// Only meaningful until the consumer drains the primitive; the serial
/// number tells a live location from a reused offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimLocation {
    offset: u32,
    serial: u64,
}

impl PrimLocation {
    /// Word offset of the primitive's tag
    #[inline]
    pub const fn offset(self) -> u32 {
        self.offset
    }

    /// Append sequence number
    #[inline]
    pub const fn serial(self) -> u64 {
        self.serial
    }
}

// =============================================================================
// COMMAND RING
// =============================================================================

/// Ring statistics
#[derive(Debug, Clone, Default)]
pub struct RingStats {
    /// Primitives appended
    pub appends: u64,
    /// Words written, tags included
    pub words_written: u64,
    /// Wrap markers written
    pub wraps: u64,
    /// Status polls that found the consumer busy
    pub busy_polls: u64,
    /// Primitives handed to the consumer
    pub drained: u64,
    /// Frame flushes
    pub flushes: u64,
    /// Most words pending at once
    pub peak_used_words: usize,
}

/// Primitive ring buffer
#[derive(Debug)]
pub struct CommandRing {
    /// Ring configuration
    config: RingConfig,
    buffer: Vec<u32>,
    /// Oldest pending tag (consumer side)
    begin: usize,
    /// Next free word (producer side)
    end: usize,
    /// Serial of the next primitive appended
    appended: u64,
    /// Serial of the next primitive to drain
    consumed: u64,
    /// Statistics
    stats: RingStats,
}

impl CommandRing {
    /// Create an empty ring
    pub fn new(config: RingConfig) -> Result<Self> {
        config.validate()?;
        log::info!(
            "command ring: {} bytes, stall limit {:?}, eager drain {}",
            config.capacity_bytes(),
            config.stall_limit,
            config.eager_drain
        );

        Ok(Self {
            buffer: vec![0; config.capacity_words],
            config,
            begin: 0,
            end: 0,
            appended: 0,
            consumed: 0,
            stats: RingStats::default(),
        })
    }

    /// Ring configuration
    #[inline]
    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Ring capacity in words
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing is pending
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Words between `begin` and `end`, wrap markers included
    pub fn used_words(&self) -> usize {
        if self.begin <= self.end {
            self.end - self.begin
        } else {
            self.capacity() - self.begin + self.end
        }
    }

    /// Primitives appended but not yet drained
    #[inline]
    pub fn pending_count(&self) -> u64 {
        self.appended - self.consumed
    }

    /// Consumer and producer positions, in words
    #[inline]
    pub fn positions(&self) -> (usize, usize) {
        (self.begin, self.end)
    }

    /// Get ring statistics
    #[inline]
    pub fn stats(&self) -> &RingStats {
        &self.stats
    }

    /// Pending primitives in consumer order, wrap markers skipped
    pub fn pending(&self) -> Pending<'_> {
        Pending {
            ring: self,
            at: self.begin,
        }
    }

    // -------------------------------------------------------------------------
    // Producer
    // -------------------------------------------------------------------------

    /// Copy `prim` into the ring, draining to `port` while there is no room
    pub fn append<P>(&mut self, prim: &Primitive, port: &mut P) -> Result<PrimLocation>
    where
        P: GpuPort + ?Sized,
    {
        let size = prim.ring_words();
        if size >= self.capacity() {
            return Err(Error::RingTooSmall);
        }
        if self.is_empty() {
            // Nothing unconsumed, so restart at the front instead of wrapping
            self.begin = 0;
            self.end = 0;
        }

        loop {
            if self.begin <= self.end {
                if self.end + size < self.capacity() {
                    break;
                }
                if self.begin == 0 {
                    // Wrapping now would make end meet begin
                    self.service_one(port)?;
                    continue;
                }
                self.buffer[self.end] = PrimTag::wrap().raw();
                self.end = 0;
                self.stats.wraps += 1;
                log::trace!("command ring: wrapped");
            }

            if self.end + size < self.begin {
                break;
            }
            self.service_one(port)?;
        }

        let offset = self.end;
        let next = offset + size;
        self.buffer[offset] = PrimTag::new(prim.len() as u8, next as u32).raw();
        self.buffer[offset + 1..next].copy_from_slice(prim.words());
        self.end = next;

        let location = PrimLocation {
            offset: offset as u32,
            serial: self.appended,
        };
        self.appended += 1;
        self.stats.appends += 1;
        self.stats.words_written += size as u64;
        self.stats.peak_used_words = self.stats.peak_used_words.max(self.used_words());
        log::trace!("command ring: appended {:?} at {:#x}", prim, offset);

        if self.config.eager_drain {
            self.drain(port)?;
        }
        Ok(location)
    }

    /// Rewrite data word `word` of a primitive the consumer has not drained
    pub fn patch(&mut self, location: PrimLocation, word: usize, value: u32) -> Result<()> {
        if location.serial < self.consumed || location.serial >= self.appended {
            return Err(Error::StaleLocation(location.offset));
        }

        let offset = location.offset as usize;
        let tag = PrimTag::from_raw(self.buffer[offset]);
        if word >= tag.data_words() {
            return Err(Error::InvalidParameter);
        }
        self.buffer[offset + 1 + word] = value;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Consumer
    // -------------------------------------------------------------------------

    /// Hand pending primitives to `port` for as long as it reports idle
    ///
    /// Returns the number of primitives handed over.
    pub fn drain<P>(&mut self, port: &mut P) -> Result<usize>
    where
        P: GpuPort + ?Sized,
    {
        let mut handed = 0;
        while !self.is_empty() && !port.is_busy() {
            if self.submit_one(port)? {
                handed += 1;
            }
        }
        Ok(handed)
    }

    /// Terminate the chain, submit everything pending and empty the ring
    ///
    /// The chain is walked from `begin` along the tag links until the
    /// terminator, waiting on the consumer before every primitive. Each
    /// primitive is handed over as its own packet; [`GpuPort`] has no
    /// linked-list DMA entry point. Returns the number of primitives
    /// submitted.
    pub fn flush_frame<P>(&mut self, port: &mut P) -> Result<usize>
    where
        P: GpuPort + ?Sized,
    {
        let mut submitted = 0;
        if !self.is_empty() {
            self.buffer[self.end] = TERMINATOR_TAG;
            while !PrimTag::from_raw(self.buffer[self.begin]).is_terminator() {
                self.wait_ready(port)?;
                if self.submit_one(port)? {
                    submitted += 1;
                }
            }
        }

        self.begin = 0;
        self.end = 0;
        self.consumed = self.appended;
        self.stats.flushes += 1;
        log::debug!("command ring: flushed {} primitives", submitted);
        Ok(submitted)
    }

    /// Wait for the consumer, then hand it the oldest pending entry
    fn service_one<P>(&mut self, port: &mut P) -> Result<()>
    where
        P: GpuPort + ?Sized,
    {
        self.wait_ready(port)?;
        self.submit_one(port)?;
        Ok(())
    }

    fn wait_ready<P>(&mut self, port: &mut P) -> Result<()>
    where
        P: GpuPort + ?Sized,
    {
        let mut polls = 0u64;
        while port.is_busy() {
            polls += 1;
            self.stats.busy_polls += 1;
            if polls == 1 {
                log::warn!(
                    "command ring: waiting on busy consumer ({} words pending)",
                    self.used_words()
                );
            }
            if let Some(limit) = self.config.stall_limit {
                if polls >= limit {
                    log::error!("command ring: consumer stalled after {} polls", polls);
                    return Err(Error::RingStall { polls });
                }
            }
            core::hint::spin_loop();
        }
        Ok(())
    }

    /// Hand the entry at `begin` to `port` and step past it
    ///
    /// Wrap markers are followed without a submission; returns whether a
    /// primitive was submitted.
    fn submit_one<P>(&mut self, port: &mut P) -> Result<bool>
    where
        P: GpuPort + ?Sized,
    {
        let tag = PrimTag::from_raw(self.buffer[self.begin]);
        let next = tag.next() as usize;

        #[cfg(feature = "validation")]
        if next >= self.capacity() || (tag.is_link_only() && next != 0) {
            log::error!("command ring: bad link {:?} at {:#x}", tag, self.begin);
            return Err(Error::InvalidParameter);
        }

        let start = self.begin + 1;
        let words = self
            .buffer
            .get(start..start + tag.data_words())
            .ok_or(Error::InvalidParameter)?;
        if words.is_empty() {
            self.begin = next;
            return Ok(false);
        }

        port.write_packet(words);
        self.begin = next;
        self.consumed += 1;
        self.stats.drained += 1;
        Ok(true)
    }
}

static_assertions::assert_impl_all!(CommandRing: Send, Sync);
static_assertions::assert_impl_all!(PrimLocation: Send, Sync, Copy);

// =============================================================================
// PENDING ITERATOR
// =============================================================================

/// Iterator over pending primitive data, see [`CommandRing::pending`]
#[derive(Debug, Clone)]
pub struct Pending<'a> {
    ring: &'a CommandRing,
    at: usize,
}

impl<'a> Iterator for Pending<'a> {
    type Item = &'a [u32];

    fn next(&mut self) -> Option<Self::Item> {
        while self.at != self.ring.end {
            let tag = PrimTag::from_raw(*self.ring.buffer.get(self.at)?);
            let start = self.at + 1;
            self.at = tag.next() as usize;
            if tag.data_words() > 0 {
                return self.ring.buffer.get(start..start + tag.data_words());
            }
        }
        None
    }
}
