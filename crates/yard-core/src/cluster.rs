//! Cluster snapshot model
//!
//! A `Cluster` is a value-typed snapshot of per-node resources plus the
//! cluster-wide storage pools. Snapshots are duplicated with `Clone`; every
//! copy is independent, so consumers may mutate their copy freely. Node order
//! is the caller-provided order and is significant: placement scans nodes in
//! this order.

use crate::attributes::STORAGE_CLASS_DEFAULT;
use crate::resources::ResourcePair;
use serde::{Deserialize, Serialize};

/// One physical GPU on a node.
///
/// The list position of an entry is its index within the node's GPU pair;
/// placement scans entries in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuInfo {
    /// Device vendor (e.g. "nvidia")
    pub vendor: String,

    /// Device model (e.g. "a100")
    pub model: String,

    /// Memory size label (e.g. "40Gi")
    pub memory_size: String,

    /// Interface label (e.g. "pcie")
    pub interface: String,
}

impl GpuInfo {
    /// Create a new GPU descriptor
    pub fn new(
        vendor: impl Into<String>,
        model: impl Into<String>,
        memory_size: impl Into<String>,
        interface: impl Into<String>,
    ) -> Self {
        Self {
            vendor: vendor.into(),
            model: model.into(),
            memory_size: memory_size.into(),
            interface: interface.into(),
        }
    }
}

/// A node's GPU capacity: the aggregate pair plus per-device descriptors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuResources {
    /// Aggregate device count
    pub quantity: ResourcePair,

    /// Per-device descriptors, in caller order
    pub info: Vec<GpuInfo>,
}

impl GpuResources {
    /// Create GPU capacity from a pair and device descriptors
    pub fn new(quantity: ResourcePair, info: Vec<GpuInfo>) -> Self {
        Self { quantity, info }
    }
}

/// Per-node resource capacity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResources {
    /// CPU capacity in millicores
    pub cpu: ResourcePair,

    /// GPU capacity
    pub gpu: GpuResources,

    /// Memory capacity in bytes
    pub memory: ResourcePair,

    /// Node-local ephemeral storage in bytes
    pub ephemeral_storage: ResourcePair,

    /// Volumes currently attached to the node
    pub volumes_attached: ResourcePair,

    /// Volumes currently mounted on the node
    pub volumes_mounted: ResourcePair,
}

/// Node capability flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCapabilities {
    /// Storage classes this node can mount
    pub storage_classes: Vec<String>,
}

impl NodeCapabilities {
    /// Create capabilities with the given storage classes
    pub fn with_storage_classes(classes: Vec<String>) -> Self {
        Self {
            storage_classes: classes,
        }
    }

    /// Whether the node can mount volumes of the given class
    pub fn supports_storage_class(&self, class: &str) -> bool {
        self.storage_classes.iter().any(|c| c == class)
    }
}

/// A single cluster node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node name, unique within the cluster
    pub name: String,

    /// Resource capacity
    pub resources: NodeResources,

    /// Capability flags
    pub capabilities: NodeCapabilities,
}

impl Node {
    /// Create a node with the given name and resources
    pub fn new(name: impl Into<String>, resources: NodeResources) -> Self {
        Self {
            name: name.into(),
            resources,
            capabilities: NodeCapabilities::default(),
        }
    }

    /// Attach capability flags
    pub fn with_capabilities(mut self, capabilities: NodeCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// A cluster-wide storage pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePool {
    /// Storage class served by this pool
    pub class: String,

    /// Pool capacity in bytes
    pub quantity: ResourcePair,

    /// Whether requests for the "default" class resolve to this pool
    pub is_default: bool,
}

impl StoragePool {
    /// Create a pool for the given class
    pub fn new(class: impl Into<String>, quantity: ResourcePair) -> Self {
        Self {
            class: class.into(),
            quantity,
            is_default: false,
        }
    }

    /// Mark this pool as the cluster default
    pub fn default_pool(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// A value-typed snapshot of cluster inventory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Nodes in placement order
    pub nodes: Vec<Node>,

    /// Cluster-wide storage pools
    pub storage: Vec<StoragePool>,
}

impl Cluster {
    /// Create a cluster snapshot from nodes and storage pools
    pub fn new(nodes: Vec<Node>, storage: Vec<StoragePool>) -> Self {
        Self { nodes, storage }
    }

    /// Class of the pool serving `"default"` requests, if any
    pub fn default_storage_class(&self) -> Option<&str> {
        self.storage
            .iter()
            .find(|pool| pool.is_default)
            .map(|pool| pool.class.as_str())
    }

    /// Resolve a requested class, mapping `"default"` to the default pool
    pub fn resolve_storage_class<'a>(&'a self, class: &'a str) -> Option<&'a str> {
        if class == STORAGE_CLASS_DEFAULT {
            self.default_storage_class()
        } else {
            Some(class)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::GIB;

    fn pool(class: &str, default: bool) -> StoragePool {
        let pool = StoragePool::new(class, ResourcePair::new(512 * GIB, 0));
        if default {
            pool.default_pool()
        } else {
            pool
        }
    }

    #[test]
    fn test_capability_lookup() {
        let caps = NodeCapabilities::with_storage_classes(vec!["beta2".to_string()]);
        assert!(caps.supports_storage_class("beta2"));
        assert!(!caps.supports_storage_class("beta3"));
    }

    #[test]
    fn test_default_storage_class() {
        let cluster = Cluster::new(vec![], vec![pool("beta2", false), pool("beta3", true)]);
        assert_eq!(cluster.default_storage_class(), Some("beta3"));
        assert_eq!(cluster.resolve_storage_class("default"), Some("beta3"));
        assert_eq!(cluster.resolve_storage_class("beta2"), Some("beta2"));
    }

    #[test]
    fn test_no_default_pool() {
        let cluster = Cluster::new(vec![], vec![pool("beta2", false)]);
        assert_eq!(cluster.resolve_storage_class("default"), None);
    }

    #[test]
    fn test_snapshot_copies_are_independent() {
        let node = Node::new(
            "node1",
            NodeResources {
                cpu: ResourcePair::new(5000, 0),
                ..NodeResources::default()
            },
        );
        let cluster = Cluster::new(vec![node], vec![pool("beta2", true)]);

        let mut copy = cluster.clone();
        copy.nodes[0].resources.cpu.sub_milli_nlz(1000);
        copy.storage[0].quantity.sub_nlz(GIB);

        assert_eq!(cluster.nodes[0].resources.cpu.allocated, 0);
        assert_eq!(cluster.storage[0].quantity.allocated, 0);
    }

    #[test]
    fn test_snapshot_serialization_round_trip() {
        let node = Node::new(
            "node1",
            NodeResources {
                cpu: ResourcePair::new(5000, 100),
                gpu: GpuResources::new(
                    ResourcePair::new(2, 0),
                    vec![GpuInfo::new("nvidia", "a100", "40Gi", "pcie")],
                ),
                memory: ResourcePair::new(32 * GIB, GIB),
                ephemeral_storage: ResourcePair::new(512 * GIB, 10 * GIB),
                ..NodeResources::default()
            },
        )
        .with_capabilities(NodeCapabilities::with_storage_classes(vec![
            "beta2".to_string()
        ]));
        let cluster = Cluster::new(vec![node], vec![pool("beta2", true)]);

        let encoded = serde_json::to_string(&cluster).unwrap();
        let decoded: Cluster = serde_json::from_str(&encoded).unwrap();
        assert_eq!(cluster, decoded);
    }
}
