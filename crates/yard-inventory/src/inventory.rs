//! The inventory value
//!
//! `Inventory` wraps a cluster snapshot. It is a plain value: duplicating it
//! with `Clone` yields an independent deep copy, and the placement engine
//! (`Inventory::adjust`) only ever mutates a working copy, writing it back on
//! full success.

use serde::{Deserialize, Serialize};
use yard_core::{Cluster, Metrics};

/// A value-typed view of cluster inventory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub(crate) cluster: Cluster,
}

impl Inventory {
    /// Create an inventory over the given snapshot
    pub fn new(cluster: Cluster) -> Self {
        Self { cluster }
    }

    /// A copy of the underlying snapshot
    pub fn snapshot(&self) -> Cluster {
        self.cluster.clone()
    }

    /// Derived metrics for the snapshot
    pub fn metrics(&self) -> Metrics {
        self.cluster.metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yard_core::{Node, NodeResources, ResourcePair};

    #[test]
    fn test_snapshot_is_a_copy() {
        let inventory = Inventory::new(Cluster::new(
            vec![Node::new(
                "node1",
                NodeResources {
                    cpu: ResourcePair::new(4000, 0),
                    ..NodeResources::default()
                },
            )],
            vec![],
        ));

        let mut snapshot = inventory.snapshot();
        snapshot.nodes[0].resources.cpu.sub_milli_nlz(1000);

        assert_eq!(inventory.snapshot().nodes[0].resources.cpu.allocated, 0);
    }

    #[test]
    fn test_metrics_delegate_to_snapshot() {
        let inventory = Inventory::new(Cluster::new(
            vec![Node::new(
                "node1",
                NodeResources {
                    cpu: ResourcePair::new(4000, 1000),
                    ..NodeResources::default()
                },
            )],
            vec![],
        ));

        let metrics = inventory.metrics();
        assert_eq!(metrics.total_available.cpu, 3000);
    }
}
