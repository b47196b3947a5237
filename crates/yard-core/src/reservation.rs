//! Reservation model
//!
//! A reservation is a list of resource groups, each a resource shape with a
//! replica count. Placement consumes the groups, canonicalizes their GPU
//! attributes, and hands the allocated shapes plus per-group scheduler params
//! back through the `Reservation` trait.

use crate::attributes::Attributes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Requested CPU, in millicores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuRequest {
    pub units: i64,
}

impl CpuRequest {
    pub fn new(units: i64) -> Self {
        Self { units }
    }
}

/// Requested GPUs with vendor/model selectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuRequest {
    /// Number of devices
    pub units: i64,

    /// Vendor/model selectors; rewritten to the single winning selector when
    /// a replica is placed
    pub attributes: Attributes,
}

impl GpuRequest {
    pub fn new(units: i64, attributes: Attributes) -> Self {
        Self { units, attributes }
    }
}

/// Requested memory, in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRequest {
    pub quantity: i64,
}

impl MemoryRequest {
    pub fn new(quantity: i64) -> Self {
        Self { quantity }
    }
}

/// A single requested volume
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRequest {
    /// Volume size in bytes
    pub quantity: i64,

    /// Storage attributes (class, persistence)
    pub attributes: Attributes,
}

impl StorageRequest {
    pub fn new(quantity: i64, attributes: Attributes) -> Self {
        Self {
            quantity,
            attributes,
        }
    }
}

/// The resource shape of one replica
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// Stable id within the reservation; keys group-level scheduler params
    pub id: u32,

    pub cpu: CpuRequest,

    pub gpu: Option<GpuRequest>,

    pub memory: MemoryRequest,

    pub storage: Vec<StorageRequest>,
}

/// A resource shape with a replica count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUnit {
    pub resources: Resources,
    pub count: u32,
}

impl ResourceUnit {
    pub fn new(resources: Resources, count: u32) -> Self {
        Self { resources, count }
    }
}

/// The groups of a reservation, in caller order
pub type ResourceUnits = Vec<ResourceUnit>;

/// GPU placement outcome handed to the scheduler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuScheduling {
    /// Lowercased vendor of the matched device
    pub vendor: String,

    /// Model of the matched device
    pub model: String,
}

/// Per-resource scheduling hints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledResources {
    pub gpu: GpuScheduling,
}

/// Scheduling parameters produced for one group.
///
/// Equality is structural; the all-default value means "no hints" and the
/// engine stores it as `None`, so absent and all-default never diverge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerParams {
    pub resources: ScheduledResources,
}

impl SchedulerParams {
    /// Collapse the all-default value to `None`
    pub fn normalize(self) -> Option<Self> {
        if self == SchedulerParams::default() {
            None
        } else {
            Some(self)
        }
    }
}

/// Scheduler params per group id
pub type ReservationClusterSettings = HashMap<u32, Option<SchedulerParams>>;

/// Anything that exposes resource groups to commit or place
pub trait ResourceGroup {
    /// The groups, in caller order
    fn resource_units(&self) -> ResourceUnits;
}

impl ResourceGroup for ResourceUnits {
    fn resource_units(&self) -> ResourceUnits {
        self.clone()
    }
}

/// The consumer-side contract of placement: a reservation exposes its groups
/// and receives the allocated shapes and scheduler params on success
pub trait Reservation: ResourceGroup {
    /// Record the canonicalized per-group shapes
    fn set_allocated_resources(&mut self, units: ResourceUnits);

    /// Record the per-group scheduler params
    fn set_cluster_params(&mut self, params: ReservationClusterSettings);
}
