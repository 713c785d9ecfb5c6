//! # Rasterizer Port
//!
//! The narrow interface the command ring drains primitives into.
//!
//! The rasterizer is modelled as a polled device rather than a separate
//! thread: the producer reads its status word and, whenever the device is
//! idle, hands it the next primitive. There is no interrupt and no
//! timeout at this level.
//!
//! ```text
//! ┌──────────────┐  status()   ┌──────────────────┐
//! │ CommandRing  │────────────▶│     GpuPort      │
//! │  (producer)  │  write_     │  (rasterizer /   │
//! │              │──packet()──▶│   SoftGpu fake)  │
//! └──────────────┘             └──────────────────┘
//! ```

bitflags::bitflags! {
    /// Rasterizer status word
    ///
    /// Bit positions follow the reference hardware's status register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GpuStatus: u32 {
        /// An interrupt request is pending
        const IRQ = 1 << 24;
        /// Ready to receive a command word
        const READY_FOR_COMMAND = 1 << 26;
        /// Ready to send VRAM contents back to the CPU
        const READY_FOR_VRAM_READ = 1 << 27;
        /// Ready to receive a DMA block
        const READY_FOR_DMA = 1 << 28;
    }
}

impl GpuStatus {
    /// Status of a device with nothing in flight
    pub const IDLE: Self = Self::READY_FOR_COMMAND
        .union(Self::READY_FOR_VRAM_READ)
        .union(Self::READY_FOR_DMA);
}

/// Rasterizer device port
///
/// Implementors must consume packets in the order they are written.
pub trait GpuPort {
    /// Read the device status word
    fn status(&self) -> GpuStatus;

    /// Whether the device is still working on the last packet
    ///
    /// Reading the status counts as one poll; implementations modelling
    /// latency advance their internal clock here.
    fn is_busy(&mut self) -> bool {
        !self.status().contains(GpuStatus::READY_FOR_COMMAND)
    }

    /// Hand one primitive's data words to the device
    ///
    /// Only called after `is_busy` reported idle.
    fn write_packet(&mut self, words: &[u32]);
}

impl<P: GpuPort + ?Sized> GpuPort for &mut P {
    fn status(&self) -> GpuStatus {
        (**self).status()
    }

    fn is_busy(&mut self) -> bool {
        (**self).is_busy()
    }

    fn write_packet(&mut self, words: &[u32]) {
        (**self).write_packet(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stuck;

    impl GpuPort for Stuck {
        fn status(&self) -> GpuStatus {
            GpuStatus::READY_FOR_DMA
        }

        fn write_packet(&mut self, _words: &[u32]) {}
    }

    #[test]
    fn test_busy_derived_from_status() {
        let mut port = Stuck;
        assert!(port.is_busy());
        assert!(GpuStatus::IDLE.contains(GpuStatus::READY_FOR_COMMAND));
        assert!(!GpuStatus::IDLE.contains(GpuStatus::IRQ));
    }

    #[test]
    fn test_status_bits() {
        assert_eq!(GpuStatus::READY_FOR_COMMAND.bits(), 0x0400_0000);
        assert_eq!(GpuStatus::IDLE.bits(), 0x1C00_0000);
    }
}
