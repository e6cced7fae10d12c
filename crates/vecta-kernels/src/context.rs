//! Per-query kernel context.
//!
//! Built once at startup from a `KernelConfig`: detects CPU capabilities,
//! enforces the configured feature requirements, and holds the dispatch
//! registry and the memory budget that output morsels are charged to.

use std::sync::Arc;

use vecta_core::caps::CpuCapabilities;
use vecta_core::config::KernelConfig;
use vecta_core::Result;
use vecta_mem::MemoryBudgetImpl;
use vecta_vector::Morsel;

use crate::registry::Registry;

#[derive(Debug, Clone)]
pub struct KernelContext {
    config: KernelConfig,
    caps: CpuCapabilities,
    registry: Arc<Registry>,
    budget: MemoryBudgetImpl,
}

impl KernelContext {
    /// Fails when the config requires a CPU feature this host lacks.
    pub fn new(config: KernelConfig) -> Result<Self> {
        let caps = CpuCapabilities::from_config(&config);
        caps.require(&config)?;
        #[cfg(feature = "tracing")]
        tracing::info!(
            avx2 = caps.avx2,
            neon = caps.neon,
            mem_cap_bytes = config.mem_cap_bytes,
            "kernel context ready"
        );
        Ok(Self::with_caps(config, caps))
    }

    pub fn from_env() -> Result<Self> {
        Self::new(KernelConfig::from_env())
    }

    /// Default config with every accelerated path switched off.
    pub fn portable() -> Self {
        Self::with_caps(KernelConfig::default(), CpuCapabilities::portable())
    }

    fn with_caps(config: KernelConfig, caps: CpuCapabilities) -> Self {
        let budget = MemoryBudgetImpl::new(config.mem_cap_bytes);
        Self {
            config,
            caps,
            registry: Registry::shared(),
            budget,
        }
    }

    /// Replace the budget, e.g. to share one across several contexts.
    pub fn with_budget(mut self, budget: MemoryBudgetImpl) -> Self {
        self.budget = budget;
        self
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn caps(&self) -> &CpuCapabilities {
        &self.caps
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn budget(&self) -> &MemoryBudgetImpl {
        &self.budget
    }

    /// Charge `morsel`'s bytes to the budget; the charge lives as long as
    /// the morsel does.
    pub fn charge(&self, morsel: Morsel, tag: &'static str) -> Result<Morsel> {
        let guard = self.budget.reserve(morsel.memory_size(), tag)?;
        Ok(morsel.with_reservation(guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecta_core::Error;
    use vecta_vector::Vector;

    #[test]
    fn test_disable_simd_masks_capabilities() {
        let cfg = KernelConfig {
            disable_simd: true,
            ..KernelConfig::default()
        };
        let ctx = KernelContext::new(cfg).unwrap();
        assert!(!ctx.caps().has_wide_simd());
    }

    #[test]
    fn test_missing_required_feature_fails() {
        let cfg = KernelConfig {
            disable_simd: true,
            require_avx2: true,
            ..KernelConfig::default()
        };
        assert!(matches!(KernelContext::new(cfg), Err(Error::Config(_))));
    }

    #[test]
    fn test_charge_releases_on_drop() {
        let ctx = KernelContext::portable().with_budget(MemoryBudgetImpl::new(1 << 20));
        let morsel = Morsel::try_new(vec![("a".into(), Vector::int64(vec![1, 2, 3]).unwrap())]).unwrap();
        let charged = ctx.charge(morsel, "test").unwrap();
        assert_eq!(ctx.budget().used_bytes(), charged.reserved_bytes());
        assert!(charged.reserved_bytes() >= 24);
        drop(charged);
        assert_eq!(ctx.budget().used_bytes(), 0);
    }

    #[test]
    fn test_charge_over_cap_is_out_of_memory() {
        let ctx = KernelContext::portable().with_budget(MemoryBudgetImpl::new(8));
        let morsel = Morsel::try_new(vec![("a".into(), Vector::int64(vec![1, 2, 3]).unwrap())]).unwrap();
        let err = ctx.charge(morsel, "test").unwrap_err();
        assert!(err.is_fatal());
    }
}
