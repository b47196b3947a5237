//! Configuration for the inventory service

use serde::{Deserialize, Serialize};

/// Configuration for the inventory service's channels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Depth of the commit intake queue
    pub commit_queue_depth: usize,

    /// Depth of the subscription intake queue
    pub subscribe_queue_depth: usize,

    /// Depth of each subscriber's snapshot channel
    pub snapshot_queue_depth: usize,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            commit_queue_depth: 1,
            subscribe_queue_depth: 1,
            snapshot_queue_depth: 1,
        }
    }
}

impl InventoryConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the commit intake depth
    pub fn with_commit_queue_depth(mut self, depth: usize) -> Self {
        self.commit_queue_depth = depth;
        self
    }

    /// Set the subscription intake depth
    pub fn with_subscribe_queue_depth(mut self, depth: usize) -> Self {
        self.subscribe_queue_depth = depth;
        self
    }

    /// Set the per-subscriber snapshot channel depth
    pub fn with_snapshot_queue_depth(mut self, depth: usize) -> Self {
        self.snapshot_queue_depth = depth;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.commit_queue_depth == 0 {
            return Err("commit_queue_depth must be greater than zero".to_string());
        }

        if self.subscribe_queue_depth == 0 {
            return Err("subscribe_queue_depth must be greater than zero".to_string());
        }

        if self.snapshot_queue_depth == 0 {
            return Err("snapshot_queue_depth must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InventoryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.commit_queue_depth, 1);
        assert_eq!(config.snapshot_queue_depth, 1);
    }

    #[test]
    fn test_config_builder() {
        let config = InventoryConfig::new()
            .with_commit_queue_depth(4)
            .with_snapshot_queue_depth(8);

        assert_eq!(config.commit_queue_depth, 4);
        assert_eq!(config.snapshot_queue_depth, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = InventoryConfig::new().with_commit_queue_depth(0);
        assert!(config.validate().is_err());
    }
}
