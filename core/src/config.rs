//! # Renderer Configuration
//!
//! Aggregates the cache layout and ring configuration, with overrides
//! taken from a boot-style command line:
//!
//! | Key                  | Effect                                      |
//! |----------------------|---------------------------------------------|
//! | `tcache_locked=M`    | initial locked page mask (hex or decimal)   |
//! | `tcache_format=D`    | texel depth for uploads: `4`, `8` or `15`   |
//! | `ring_bytes=N`       | ring size in bytes, rounded down to words   |
//! | `ring_stall_limit=N` | busy polls before a stall is reported       |
//! | `ring_eager_drain`   | drain to an idle consumer after each append |
//!
//! Unknown keys are left for other consumers of the command line. The
//! result is validated as a whole: a texel depth whose pages would overlap
//! at the configured origins is rejected.

use tessera_gpucmd::RingConfig;
use tessera_hal::{Error, Result, TexDepth};
use tessera_texcache::{LockedPages, VramLayout};

/// Full renderer configuration
#[derive(Debug, Clone, Default)]
pub struct RendererConfig {
    /// Texture cache page geometry and locked pages
    pub layout: VramLayout,
    /// Command ring sizing and backpressure policy
    pub ring: RingConfig,
}

impl RendererConfig {
    /// Reference configuration
    pub const fn psx() -> Self {
        Self {
            layout: VramLayout::psx(),
            ring: RingConfig::psx(),
        }
    }

    /// Reference configuration with command line overrides applied
    pub fn from_cmdline(cmdline: &str) -> Result<Self> {
        let mut config = Self::psx();
        config.apply_cmdline(cmdline)?;
        Ok(config)
    }

    /// Apply command line overrides
    pub fn apply_cmdline(&mut self, cmdline: &str) -> Result<()> {
        for param in cmdline.split_whitespace() {
            let (key, value) = match param.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (param, None),
            };

            match (key, value) {
                ("tcache_locked", Some(value)) => {
                    let mask = u32::try_from(parse_number(key, value)?)
                        .map_err(|_| Error::InvalidParameter)?;
                    self.layout.locked = LockedPages::from_bits(mask);
                },
                ("tcache_format", Some(value)) => {
                    self.layout.depth = match value {
                        "4" => TexDepth::Indexed4,
                        "8" => TexDepth::Indexed8,
                        "15" | "16" => TexDepth::Direct15,
                        _ => return Err(rejected(key, value)),
                    };
                },
                ("ring_bytes", Some(value)) => {
                    let bytes = usize::try_from(parse_number(key, value)?)
                        .map_err(|_| Error::InvalidParameter)?;
                    self.ring.capacity_words = bytes / 4;
                },
                ("ring_stall_limit", Some(value)) => {
                    self.ring.stall_limit = Some(parse_number(key, value)?);
                },
                ("ring_eager_drain", None) => self.ring.eager_drain = true,
                _ => {},
            }
        }

        self.validate().map_err(|err| {
            log::warn!("config: overrides from `{}` rejected: {}", cmdline, err);
            err
        })
    }

    /// Check both halves are usable
    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.ring.validate()
    }
}

static_assertions::assert_impl_all!(RendererConfig: Send, Sync, Clone);

/// Parse a `0x`-prefixed hex or a decimal number
fn parse_number(key: &str, value: &str) -> Result<u64> {
    let parsed = if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)
    } else {
        value.parse()
    };
    parsed.map_err(|_| rejected(key, value))
}

fn rejected(key: &str, value: &str) -> Error {
    log::warn!("config: rejected {}={}", key, value);
    Error::InvalidParameter
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_texcache::PageIndex;

    #[test]
    fn test_defaults_are_reference_hardware() {
        let config = RendererConfig::default();
        assert_eq!(config.layout.page_count(), 11);
        assert_eq!(config.layout.depth, TexDepth::Indexed8);
        assert_eq!(config.ring.capacity_bytes(), 64 * 1024);
        assert_eq!(config.ring.stall_limit, None);
        assert!(!config.ring.eager_drain);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cmdline_overrides() {
        let config = RendererConfig::from_cmdline(
            "quiet tcache_locked=0x3 ring_bytes=4096 ring_stall_limit=1000 ring_eager_drain tcache_format=4",
        )
        .unwrap();

        assert!(config.layout.locked.contains(PageIndex(0)));
        assert!(config.layout.locked.contains(PageIndex(1)));
        assert!(!config.layout.locked.contains(PageIndex(2)));
        assert_eq!(config.layout.depth, TexDepth::Indexed4);
        assert_eq!(config.ring.capacity_words, 1024);
        assert_eq!(config.ring.stall_limit, Some(1000));
        assert!(config.ring.eager_drain);
    }

    #[test]
    fn test_decimal_mask_and_unaligned_bytes() {
        let config = RendererConfig::from_cmdline("tcache_locked=5 ring_bytes=1027").unwrap();
        assert_eq!(config.layout.locked.bits(), 5);
        assert_eq!(config.ring.capacity_words, 256);
    }

    #[test]
    fn test_bad_values_rejected() {
        assert_eq!(
            RendererConfig::from_cmdline("ring_bytes=lots").unwrap_err(),
            Error::InvalidParameter
        );
        assert_eq!(
            RendererConfig::from_cmdline("tcache_format=24").unwrap_err(),
            Error::InvalidParameter
        );
        assert_eq!(
            RendererConfig::from_cmdline("ring_bytes=4").unwrap_err(),
            Error::InvalidParameter
        );
        assert_eq!(
            RendererConfig::from_cmdline("ring_stall_limit=0").unwrap_err(),
            Error::InvalidParameter
        );
    }

    #[test]
    fn test_depth_must_fit_page_origins() {
        // 15-bit pages are twice as wide as the reference origins allow
        assert_eq!(
            RendererConfig::from_cmdline("tcache_format=15").unwrap_err(),
            Error::InvalidParameter
        );
        assert_eq!(
            RendererConfig::from_cmdline("tcache_format=16").unwrap_err(),
            Error::InvalidParameter
        );

        let mut config = RendererConfig::psx();
        assert!(config.apply_cmdline("tcache_format=15").is_err());
        assert!(config.apply_cmdline("tcache_format=8").is_ok());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = RendererConfig::from_cmdline("nokaslr console=ttyS0").unwrap();
        assert_eq!(config.ring.capacity_words, RingConfig::psx().capacity_words);
    }
}
