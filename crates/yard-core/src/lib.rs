//! # yard-core
//!
//! Core types for stockyard, a cluster inventory and admission-control
//! engine for compute marketplaces.
//!
//! This crate provides the value types shared by every consumer of the
//! inventory engine:
//!
//! - Resource pair arithmetic with never-cross-the-floor debits
//! - Decoders for storage and GPU attribute lists
//! - The value-typed cluster snapshot (nodes, GPUs, storage pools)
//! - The reservation model and the scheduler-params contract
//! - Derived per-node and cluster-wide metrics

pub mod attributes;
pub mod cluster;
pub mod error;
pub mod metrics;
pub mod reservation;
pub mod resources;
pub mod units;

// Re-export commonly used types at the crate root
pub use attributes::{
    Attribute, Attributes, GpuAttributes, GpuModelSpec, GpuModels, StorageAttributes,
    GPU_MODEL_WILDCARD, STORAGE_CLASS_DEFAULT, STORAGE_CLASS_RAM,
};
pub use cluster::{Cluster, GpuInfo, GpuResources, Node, NodeCapabilities, NodeResources, StoragePool};
pub use error::{Error, Result};
pub use metrics::{MetricTotal, Metrics, NodeMetrics, ResourcesMetric};
pub use reservation::{
    CpuRequest, GpuRequest, GpuScheduling, MemoryRequest, Reservation, ReservationClusterSettings,
    ResourceGroup, ResourceUnit, ResourceUnits, Resources, SchedulerParams, ScheduledResources,
    StorageRequest,
};
pub use resources::ResourcePair;
