//! # yard-inventory
//!
//! Inventory engine for stockyard: decides whether a deployment reservation
//! fits on the cluster, commits accepted allocations, and fans the resulting
//! snapshots out to subscribers.
//!
//! This crate provides:
//!
//! - `Inventory`, the value-typed view of cluster state with `adjust`,
//!   `snapshot`, and `metrics`
//! - The placement engine: per-node first-fit with GPU attribute matching,
//!   storage-class routing, and an equal-shape guarantee across replicas
//! - `InventoryService`/`InventoryClient`, a single-writer actor that applies
//!   commits serially and multicasts post-commit snapshots with
//!   per-subscriber coalescing
//! - Mock cluster fixtures for tests and dev harnesses
//!
//! ## Example
//!
//! ```rust
//! use yard_inventory::{mock_cluster, AdjustOptions, Inventory};
//! use yard_core::{CpuRequest, MemoryRequest, Reservation, ResourceGroup,
//!     ReservationClusterSettings, ResourceUnit, ResourceUnits, Resources};
//!
//! struct Pending {
//!     units: ResourceUnits,
//!     allocated: Option<ResourceUnits>,
//!     params: Option<ReservationClusterSettings>,
//! }
//!
//! impl ResourceGroup for Pending {
//!     fn resource_units(&self) -> ResourceUnits {
//!         self.units.clone()
//!     }
//! }
//!
//! impl Reservation for Pending {
//!     fn set_allocated_resources(&mut self, units: ResourceUnits) {
//!         self.allocated = Some(units);
//!     }
//!
//!     fn set_cluster_params(&mut self, params: ReservationClusterSettings) {
//!         self.params = Some(params);
//!     }
//! }
//!
//! let mut inventory = Inventory::new(mock_cluster(&[]));
//! let mut reservation = Pending {
//!     units: vec![ResourceUnit::new(
//!         Resources {
//!             id: 1,
//!             cpu: CpuRequest::new(1000),
//!             memory: MemoryRequest::new(1 << 30),
//!             ..Resources::default()
//!         },
//!         1,
//!     )],
//!     allocated: None,
//!     params: None,
//! };
//!
//! inventory
//!     .adjust(&mut reservation, &AdjustOptions::new())
//!     .expect("reservation fits the mock cluster");
//! assert!(reservation.allocated.is_some());
//! ```

pub mod config;
pub mod inventory;
pub mod mock;
pub mod placement;
pub mod service;

// Re-export commonly used types
pub use config::InventoryConfig;
pub use inventory::Inventory;
pub use mock::mock_cluster;
pub use placement::AdjustOptions;
pub use service::{InventoryClient, InventoryService};
