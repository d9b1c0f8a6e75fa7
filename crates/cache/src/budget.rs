//! The available-memory budget provider.

use remo_config::CacheConfig;
use std::sync::Mutex;
use sysinfo::System;

/// How many bytes of memory the cache may still grow into.
///
/// Queried fresh before every eviction round, because available memory moves
/// under us; the point of the cache is to use what is free *now*, not what
/// was free at startup.
pub trait MemoryBudget: Send + Sync {
    fn available_bytes(&self) -> u64;
}

/// A configured byte ceiling, for platforms without usable memory
/// introspection or for pinning the cache size in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedBudget(pub u64);

impl MemoryBudget for FixedBudget {
    fn available_bytes(&self) -> u64 {
        self.0
    }
}

/// Live OS memory via [`sysinfo`], refreshed on every query.
pub struct SysinfoBudget {
    // sysinfo wants `&mut` to refresh; the cache only holds `&self`.
    system: Mutex<System>,
}

impl SysinfoBudget {
    pub fn new() -> Self {
        Self { system: Mutex::new(System::new()) }
    }
}

impl Default for SysinfoBudget {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBudget for SysinfoBudget {
    fn available_bytes(&self) -> u64 {
        match self.system.lock() {
            Ok(mut system) => {
                system.refresh_memory();
                system.available_memory()
            },
            // A poisoned lock means a panic mid-refresh; treat the budget as
            // exhausted rather than guessing.
            Err(_) => 0,
        }
    }
}

/// Budget selection from the loaded configuration: a pinned ceiling when one
/// is configured, live introspection otherwise.
pub(crate) fn from_config(config: &CacheConfig) -> Box<dyn MemoryBudget> {
    match config.fixed_budget {
        Some(bytes) => Box::new(FixedBudget(bytes)),
        None => Box::new(SysinfoBudget::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_budget() {
        assert_eq!(FixedBudget(1024).available_bytes(), 1024);
    }

    #[test]
    fn test_sysinfo_budget_reports_something() {
        // Exact numbers are machine-dependent; a live system has memory.
        assert!(SysinfoBudget::new().available_bytes() > 0);
    }

    #[test]
    fn test_from_config() {
        let fixed = CacheConfig { fixed_budget: Some(512), ..CacheConfig::default() };
        assert_eq!(from_config(&fixed).available_bytes(), 512);
    }
}
