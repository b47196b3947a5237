//! Derived cluster metrics
//!
//! Non-mutating rollups of a snapshot: per-node allocatable/available plus
//! cluster totals, with storage totals keyed by class. CPU is reported in
//! millicores, memory and storage in bytes, GPUs in whole devices; all values
//! clamp at zero.

use crate::cluster::Cluster;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One side (allocatable or available) of a node's resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesMetric {
    pub cpu: u64,
    pub gpu: u64,
    pub memory: u64,
    pub storage_ephemeral: u64,
}

/// Rollup for a single node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub name: String,
    pub allocatable: ResourcesMetric,
    pub available: ResourcesMetric,
}

/// Cluster-wide totals; storage is keyed by class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricTotal {
    pub cpu: u64,
    pub gpu: u64,
    pub memory: u64,
    pub storage_ephemeral: u64,
    pub storage: HashMap<String, u64>,
}

/// Derived metrics for a cluster snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub nodes: Vec<NodeMetrics>,
    pub total_allocatable: MetricTotal,
    pub total_available: MetricTotal,
}

fn clamp(value: i64) -> u64 {
    value.max(0) as u64
}

impl Cluster {
    /// Derive metrics without mutating the snapshot
    pub fn metrics(&self) -> Metrics {
        let mut metrics = Metrics {
            nodes: Vec::with_capacity(self.nodes.len()),
            ..Metrics::default()
        };

        for node in &self.nodes {
            let res = &node.resources;

            let node_metrics = NodeMetrics {
                name: node.name.clone(),
                allocatable: ResourcesMetric {
                    cpu: clamp(res.cpu.allocatable),
                    gpu: clamp(res.gpu.quantity.allocatable),
                    memory: clamp(res.memory.allocatable),
                    storage_ephemeral: clamp(res.ephemeral_storage.allocatable),
                },
                available: ResourcesMetric {
                    cpu: clamp(res.cpu.available()),
                    gpu: clamp(res.gpu.quantity.available()),
                    memory: clamp(res.memory.available()),
                    storage_ephemeral: clamp(res.ephemeral_storage.available()),
                },
            };

            let total = &mut metrics.total_allocatable;
            total.cpu += node_metrics.allocatable.cpu;
            total.gpu += node_metrics.allocatable.gpu;
            total.memory += node_metrics.allocatable.memory;
            total.storage_ephemeral += node_metrics.allocatable.storage_ephemeral;

            let avail = &mut metrics.total_available;
            avail.cpu += node_metrics.available.cpu;
            avail.gpu += node_metrics.available.gpu;
            avail.memory += node_metrics.available.memory;
            avail.storage_ephemeral += node_metrics.available.storage_ephemeral;

            metrics.nodes.push(node_metrics);
        }

        for pool in &self.storage {
            metrics
                .total_allocatable
                .storage
                .insert(pool.class.clone(), clamp(pool.quantity.allocatable));
            metrics
                .total_available
                .storage
                .insert(pool.class.clone(), clamp(pool.quantity.available()));
        }

        metrics
    }
}
