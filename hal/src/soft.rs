//! # Software GPU
//!
//! A deterministic rasterizer model: it records every packet it is handed,
//! keeps a software VRAM for uploads, and can be told to stay busy for a
//! fixed number of status polls after each packet. Used as the consumer
//! when no hardware is attached and as the fake in tests.

use alloc::vec::Vec;

use crate::error::Result;
use crate::gpu::{GpuPort, GpuStatus};
use crate::types::VramRect;
use crate::vram::{Vram, VramUpload};

/// Software rasterizer model
#[derive(Debug, Clone)]
pub struct SoftGpu {
    vram: Vram,
    /// Polls the device stays busy after accepting a packet
    latency: u32,
    /// Polls left before the device reports idle
    busy_polls_left: u32,
    /// Device never becomes idle
    hung: bool,
    /// Flattened packet words
    words: Vec<u32>,
    /// `(start, len)` of each packet in `words`
    packets: Vec<(usize, usize)>,
    polls: u64,
}

impl SoftGpu {
    /// Create an always-ready device with reference-sized VRAM
    pub fn new() -> Self {
        Self::with_vram(Vram::psx())
    }

    /// Create an always-ready device over the given VRAM
    pub fn with_vram(vram: Vram) -> Self {
        Self {
            vram,
            latency: 0,
            busy_polls_left: 0,
            hung: false,
            words: Vec::new(),
            packets: Vec::new(),
            polls: 0,
        }
    }

    /// Stay busy for `polls` status reads after each packet
    pub fn with_latency(mut self, polls: u32) -> Self {
        self.latency = polls;
        self
    }

    /// Make the device hang (never report idle) or recover
    pub fn set_hung(&mut self, hung: bool) {
        self.hung = hung;
    }

    /// Number of packets consumed
    pub fn packet_count(&self) -> usize {
        self.packets.len()
    }

    /// Data words of packet `index`, in consumption order
    pub fn packet(&self, index: usize) -> Option<&[u32]> {
        self.packets
            .get(index)
            .map(|&(start, len)| &self.words[start..start + len])
    }

    /// All consumed packets, in consumption order
    pub fn packets(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.packets
            .iter()
            .map(move |&(start, len)| &self.words[start..start + len])
    }

    /// Total status polls observed
    pub fn poll_count(&self) -> u64 {
        self.polls
    }

    /// Software VRAM
    pub fn vram(&self) -> &Vram {
        &self.vram
    }
}

impl GpuPort for SoftGpu {
    fn status(&self) -> GpuStatus {
        if self.hung || self.busy_polls_left > 0 {
            GpuStatus::READY_FOR_DMA
        } else {
            GpuStatus::IDLE
        }
    }

    fn is_busy(&mut self) -> bool {
        self.polls += 1;
        if self.hung {
            return true;
        }
        if self.busy_polls_left > 0 {
            self.busy_polls_left -= 1;
            return true;
        }
        false
    }

    fn write_packet(&mut self, words: &[u32]) {
        self.packets.push((self.words.len(), words.len()));
        self.words.extend_from_slice(words);
        self.busy_polls_left = self.latency;
    }
}

impl VramUpload for SoftGpu {
    fn load_image(&mut self, rect: VramRect, words: &[u16]) -> Result<()> {
        self.vram.load_image(rect, words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_packets_in_order() {
        let mut gpu = SoftGpu::new();
        gpu.write_packet(&[1, 2]);
        gpu.write_packet(&[3]);

        assert_eq!(gpu.packet_count(), 2);
        assert_eq!(gpu.packet(0), Some(&[1, 2][..]));
        assert_eq!(gpu.packet(1), Some(&[3][..]));
        assert_eq!(gpu.packets().count(), 2);
    }

    #[test]
    fn test_latency_counts_polls() {
        let mut gpu = SoftGpu::new().with_latency(2);
        assert!(!gpu.is_busy());
        gpu.write_packet(&[0]);
        assert!(gpu.is_busy());
        assert!(gpu.is_busy());
        assert!(!gpu.is_busy());
        assert_eq!(gpu.poll_count(), 4);
    }

    #[test]
    fn test_hung_device_never_idles() {
        let mut gpu = SoftGpu::new();
        gpu.set_hung(true);
        for _ in 0..100 {
            assert!(gpu.is_busy());
        }
        assert!(!gpu.status().contains(GpuStatus::READY_FOR_COMMAND));
    }
}
