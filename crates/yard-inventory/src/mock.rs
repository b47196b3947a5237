//! Mock cluster fixtures for tests and dev harnesses

use yard_core::units::GIB;
use yard_core::{
    Cluster, GpuInfo, GpuResources, Node, NodeCapabilities, NodeResources, ResourcePair,
    StoragePool,
};

/// Per-node CPU capacity, in millicores
pub const MOCK_CPU_MILLIS: i64 = 5_000;

/// Per-node memory capacity
pub const MOCK_MEMORY: i64 = 32 * GIB;

/// Per-node ephemeral storage capacity
pub const MOCK_STORAGE: i64 = 512 * GIB;

/// GPUs on the solo node
pub const MOCK_GPUS: i64 = 2;

/// Class of the mock storage pool
pub const MOCK_STORAGE_CLASS: &str = "beta2";

const MOCK_CPU_SEED: i64 = 100;
const MOCK_MEMORY_SEED: i64 = GIB;
const MOCK_STORAGE_SEED: i64 = 10 * GIB;

fn mock_node(name: &str, gpus: i64) -> Node {
    let info = (0..gpus)
        .map(|_| GpuInfo::new("nvidia", "a100", "40Gi", "pcie"))
        .collect();

    Node::new(
        name,
        NodeResources {
            cpu: ResourcePair::new(MOCK_CPU_MILLIS, MOCK_CPU_SEED),
            gpu: GpuResources::new(ResourcePair::new(gpus, 0), info),
            memory: ResourcePair::new(MOCK_MEMORY, MOCK_MEMORY_SEED),
            ephemeral_storage: ResourcePair::new(MOCK_STORAGE, MOCK_STORAGE_SEED),
            ..NodeResources::default()
        },
    )
    .with_capabilities(NodeCapabilities::with_storage_classes(vec![
        MOCK_STORAGE_CLASS.to_string(),
    ]))
}

/// Build a mock cluster with one node per name.
///
/// Named nodes carry no GPUs. With no names, the cluster gets a single
/// `solo` node with two GPUs so GPU placement is exercisable out of the box.
/// One default `beta2` pool backs persistent storage, seeded with most of
/// its capacity already allocated.
pub fn mock_cluster(names: &[&str]) -> Cluster {
    let mut nodes: Vec<Node> = names.iter().map(|name| mock_node(name, 0)).collect();

    if nodes.is_empty() {
        nodes.push(mock_node("solo", MOCK_GPUS));
    }

    let storage = vec![StoragePool::new(
        MOCK_STORAGE_CLASS,
        ResourcePair::new(MOCK_STORAGE, MOCK_STORAGE - MOCK_STORAGE_SEED),
    )
    .default_pool()];

    Cluster::new(nodes, storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solo_cluster() {
        let cluster = mock_cluster(&[]);

        assert_eq!(cluster.nodes.len(), 1);
        assert_eq!(cluster.nodes[0].name, "solo");
        assert_eq!(cluster.nodes[0].resources.gpu.quantity.allocatable, 2);
        assert_eq!(cluster.nodes[0].resources.gpu.info.len(), 2);
        assert_eq!(cluster.default_storage_class(), Some(MOCK_STORAGE_CLASS));
    }

    #[test]
    fn test_named_nodes_have_no_gpus() {
        let cluster = mock_cluster(&["node1", "node2"]);

        assert_eq!(cluster.nodes.len(), 2);
        assert_eq!(cluster.nodes[0].name, "node1");
        assert_eq!(cluster.nodes[1].name, "node2");
        for node in &cluster.nodes {
            assert_eq!(node.resources.gpu.quantity.allocatable, 0);
            assert!(node.resources.gpu.info.is_empty());
            assert!(node.capabilities.supports_storage_class(MOCK_STORAGE_CLASS));
        }
    }

    #[test]
    fn test_pool_seed_leaves_headroom() {
        let cluster = mock_cluster(&[]);
        assert_eq!(cluster.storage[0].quantity.available(), MOCK_STORAGE_SEED);
    }
}
