//! CPU capability snapshot.
//!
//! Detected once when a kernel context is built and passed down to kernels
//! that have an accelerated path. Nothing here is a process-wide global.

use serde::{Deserialize, Serialize};

use crate::config::KernelConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuCapabilities {
    /// 256-bit integer/float lanes (x86_64 AVX2).
    pub avx2: bool,
    /// 128-bit ARM NEON lanes.
    pub neon: bool,
}

impl CpuCapabilities {
    /// Query the host.
    pub fn detect() -> Self {
        Self {
            avx2: detect_avx2(),
            neon: cfg!(all(target_arch = "aarch64", target_feature = "neon")),
        }
    }

    /// Everything off; kernels take their portable paths.
    pub const fn portable() -> Self {
        Self {
            avx2: false,
            neon: false,
        }
    }

    /// Host capabilities, masked by `disable_simd`.
    pub fn from_config(cfg: &KernelConfig) -> Self {
        if cfg.disable_simd {
            Self::portable()
        } else {
            Self::detect()
        }
    }

    /// Whether a wide-SIMD code path may be selected.
    pub fn has_wide_simd(&self) -> bool {
        self.avx2 || self.neon
    }

    /// Fail if the configuration requires a feature this host lacks.
    pub fn require(&self, cfg: &KernelConfig) -> Result<()> {
        if cfg.require_avx2 && !self.avx2 {
            return Err(Error::Config(
                "AVX2 is required by configuration but not available on this host".into(),
            ));
        }
        if cfg.require_neon && !self.neon {
            return Err(Error::Config(
                "NEON is required by configuration but not available on this host".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(target_arch = "x86_64")]
fn detect_avx2() -> bool {
    std::arch::is_x86_feature_detected!("avx2")
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_avx2() -> bool {
    false
}
