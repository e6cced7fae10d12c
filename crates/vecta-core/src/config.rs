//! Kernel configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Hard memory cap (in bytes) for morsels produced by operators.
    pub mem_cap_bytes: usize,

    /// Preferred rows per morsel; the executor may ignore it.
    pub morsel_size_hint: usize,

    /// Refuse to start unless the host has AVX2.
    pub require_avx2: bool,

    /// Refuse to start unless the host has NEON.
    pub require_neon: bool,

    /// Force portable kernels even when SIMD is available.
    pub disable_simd: bool,

    /// Initial slot count for running distinct sets.
    pub distinct_initial_capacity: usize,

    /// Default bloom filter size in bits when a caller has no estimate.
    pub bloom_default_bits: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            mem_cap_bytes: 512 * 1024 * 1024, // 512 MiB default
            morsel_size_hint: 64 * 1024,
            require_avx2: false,
            require_neon: false,
            disable_simd: false,
            distinct_initial_capacity: 1024,
            bloom_default_bits: 1 << 20,
        }
    }
}

impl KernelConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `VECTA_MEM_CAP_BYTES`: memory cap in bytes
    /// - `VECTA_MORSEL_SIZE`: rows per morsel hint
    /// - `VECTA_REQUIRE_AVX2` / `VECTA_REQUIRE_NEON`: `1`/`true` to require
    /// - `VECTA_DISABLE_SIMD`: `1`/`true` to force portable kernels
    /// - `VECTA_DISTINCT_CAPACITY`: initial distinct-set capacity
    /// - `VECTA_BLOOM_BITS`: default bloom filter size
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("VECTA_MEM_CAP_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.mem_cap_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("VECTA_MORSEL_SIZE") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.morsel_size_hint = v;
            }
        }

        if let Ok(s) = std::env::var("VECTA_REQUIRE_AVX2") {
            cfg.require_avx2 = parse_flag(&s);
        }

        if let Ok(s) = std::env::var("VECTA_REQUIRE_NEON") {
            cfg.require_neon = parse_flag(&s);
        }

        if let Ok(s) = std::env::var("VECTA_DISABLE_SIMD") {
            cfg.disable_simd = parse_flag(&s);
        }

        if let Ok(s) = std::env::var("VECTA_DISTINCT_CAPACITY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.distinct_initial_capacity = v;
            }
        }

        if let Ok(s) = std::env::var("VECTA_BLOOM_BITS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.bloom_default_bits = v;
            }
        }

        cfg
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

fn parse_flag(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
