//! Engine configuration.

// ============================================================================
// EngineConfig
// ============================================================================

/// Knobs for [`MiningEngine`](crate::MiningEngine) construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Name given to the background mining thread.
    pub worker_thread_name: String,
    /// Caps the installed rule set at the first `n` rules (most general
    /// first). `None` installs everything the miner produces.
    pub max_rules: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_thread_name: "galena-miner".to_string(),
            max_rules: None,
        }
    }
}

impl EngineConfig {
    /// Sets the mining thread's name.
    pub fn with_worker_thread_name(mut self, name: impl Into<String>) -> Self {
        self.worker_thread_name = name.into();
        self
    }

    /// Caps the installed rule set.
    pub fn with_max_rules(mut self, max_rules: usize) -> Self {
        self.max_rules = Some(max_rules);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.worker_thread_name, "galena-miner");
        assert_eq!(config.max_rules, None);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_worker_thread_name("miner-0")
            .with_max_rules(16);
        assert_eq!(config.worker_thread_name, "miner-0");
        assert_eq!(config.max_rules, Some(16));
    }
}
