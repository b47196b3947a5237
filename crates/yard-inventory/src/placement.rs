//! Placement engine
//!
//! `Inventory::adjust` fits a reservation's replica groups onto the cluster
//! under node-local and cluster-wide constraints. All work happens on a
//! duplicated inventory; the receiver is replaced only when every replica of
//! every group has been placed and the caller did not ask for a dry run.
//!
//! All replicas of one group must resolve to the same shape: the first
//! placed replica pins the group's canonical GPU selector and scheduler
//! params, and every replica placed on a later node re-derives its own
//! shape from the group's original selector and is checked against the
//! pinned one. Divergence disqualifies the reservation.

use crate::inventory::Inventory;
use tracing::debug;
use yard_core::{
    Attribute, Cluster, Error, GpuAttributes, GpuRequest, GpuResources, GpuScheduling,
    Reservation, ReservationClusterSettings, Resources, Result, SchedulerParams,
    StorageAttributes, STORAGE_CLASS_RAM,
};

/// Options for a single `adjust` call
#[derive(Debug, Clone, Copy, Default)]
pub struct AdjustOptions {
    /// Leave the receiver untouched on success; the reservation still
    /// receives its allocated resources and cluster params
    pub dry_run: bool,
}

impl AdjustOptions {
    /// Options for a committing adjust
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Outcome of fitting one replica onto one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fit {
    /// The replica fits; scheduler params are `None` when no hints were
    /// produced
    Placed(Option<SchedulerParams>),

    /// This node cannot hold the replica; the next node may
    NodeExhausted,

    /// A cluster-wide constraint failed; no node can help
    ClusterExhausted,
}

impl Inventory {
    /// Attempt to place every replica group of `reservation` on the cluster.
    ///
    /// On success the receiver is replaced with the debited working copy
    /// (unless `dry_run`), and the reservation receives the canonicalized
    /// per-group resources and scheduler params. On failure the receiver and
    /// the reservation are unchanged.
    pub fn adjust<R: Reservation>(
        &mut self,
        reservation: &mut R,
        opts: &AdjustOptions,
    ) -> Result<()> {
        let orig_resources = reservation.resource_units();
        let mut adjusted_resources = orig_resources.clone();

        // the scan list shrinks as groups complete; entries carry their index
        // into `adjusted_resources` so identity survives removals
        let mut pending: Vec<(usize, u32)> = orig_resources
            .iter()
            .enumerate()
            .map(|(idx, unit)| (idx, unit.count))
            .collect();

        let mut cparams = ReservationClusterSettings::new();
        let mut curr = self.clone();
        let mut mismatch = false;

        let mut node_idx = 0;
        'nodes: while node_idx < curr.cluster.nodes.len() {
            // scan groups from last to first so removal keeps earlier indices
            // stable
            let mut i = pending.len();
            while i > 0 {
                i -= 1;

                let group_idx = pending[i].0;
                let adjusted_group = orig_resources[group_idx].count != pending[i].1;

                // a group resuming on a later node re-derives its shape from
                // the original selector and must land on the pinned one
                let mut verify_copy = if adjusted_group {
                    Some(orig_resources[group_idx].resources.clone())
                } else {
                    None
                };

                while pending[i].1 > 0 {
                    let fit = match verify_copy.as_mut() {
                        Some(copy) => try_adjust(&mut curr.cluster, node_idx, copy),
                        None => try_adjust(
                            &mut curr.cluster,
                            node_idx,
                            &mut adjusted_resources[group_idx].resources,
                        ),
                    };

                    match fit {
                        Fit::ClusterExhausted => break 'nodes,
                        Fit::NodeExhausted => {
                            node_idx += 1;
                            continue 'nodes;
                        }
                        Fit::Placed(sparams) => {
                            pending[i].1 -= 1;

                            let id = adjusted_resources[group_idx].resources.id;
                            match &verify_copy {
                                Some(copy) => {
                                    let pinned = cparams.get(&id).cloned().unwrap_or(None);
                                    if *copy != adjusted_resources[group_idx].resources
                                        || sparams != pinned
                                    {
                                        mismatch = true;
                                        break 'nodes;
                                    }
                                }
                                None => {
                                    cparams.insert(id, sparams);
                                }
                            }
                        }
                    }
                }

                if pending[i].1 == 0 {
                    pending.remove(i);
                    // rescan the reduced list starting from this node
                    continue 'nodes;
                }
            }

            node_idx += 1;
        }

        if pending.is_empty() {
            if !opts.dry_run {
                *self = curr;
            }

            debug!(groups = adjusted_resources.len(), "reservation placed");

            reservation.set_allocated_resources(adjusted_resources);
            reservation.set_cluster_params(cparams);

            return Ok(());
        }

        if mismatch {
            debug!("reservation groups resolved to divergent shapes");
            return Err(Error::GroupResourceMismatch);
        }

        debug!(remaining = pending.len(), "reservation does not fit");
        Err(Error::InsufficientCapacity)
    }
}

/// Fit one replica of `res` onto node `node_idx`.
///
/// Works on a duplicated node and pool list; both are committed back only
/// when every requirement is satisfied, so a failed fit leaves the cluster
/// untouched. The GPU step may canonicalize `res`'s selector even when a
/// later step fails.
pub(crate) fn try_adjust(cluster: &mut Cluster, node_idx: usize, res: &mut Resources) -> Fit {
    let mut node = cluster.nodes[node_idx].clone();
    let mut sparams = SchedulerParams::default();

    if !node.resources.cpu.sub_milli_nlz(res.cpu.units) {
        return Fit::NodeExhausted;
    }

    if !try_adjust_gpu(&mut node.resources.gpu, res.gpu.as_mut(), &mut sparams) {
        return Fit::NodeExhausted;
    }

    if !node.resources.memory.sub_nlz(res.memory.quantity) {
        return Fit::NodeExhausted;
    }

    let mut pools = cluster.storage.clone();

    for storage in &res.storage {
        let attrs = match StorageAttributes::parse(&storage.attributes) {
            Ok(attrs) => attrs,
            // malformed reservation; no node can satisfy it
            Err(_) => return Fit::ClusterExhausted,
        };

        if !attrs.persistent {
            if attrs.class == STORAGE_CLASS_RAM {
                if !node.resources.memory.sub_nlz(storage.quantity) {
                    return Fit::NodeExhausted;
                }
            } else if !node.resources.ephemeral_storage.sub_nlz(storage.quantity) {
                return Fit::NodeExhausted;
            }

            continue;
        }

        // a "default" request needs a default pool to resolve against
        let Some(class) = cluster.resolve_storage_class(&attrs.class) else {
            return Fit::ClusterExhausted;
        };
        let class = class.to_string();

        if !node.capabilities.supports_storage_class(&class) {
            return Fit::NodeExhausted;
        }

        let Some(pool) = pools.iter_mut().find(|pool| pool.class == class) else {
            // requested class is not present in the cluster
            return Fit::ClusterExhausted;
        };

        if !pool.quantity.sub_nlz(storage.quantity) {
            // cluster pool is out of space
            return Fit::ClusterExhausted;
        }
    }

    cluster.nodes[node_idx] = node;
    cluster.storage = pools;

    Fit::Placed(sparams.normalize())
}

/// Fit a GPU request against a node's devices.
///
/// First-fit scan of the device list in caller order. On success the
/// aggregate pair is debited, `sparams` records the winning vendor/model,
/// and the request's attribute list is rewritten to the single selector key
/// that matched, pinning every later replica of the group to the same shape.
fn try_adjust_gpu(
    gpu: &mut GpuResources,
    req: Option<&mut GpuRequest>,
    sparams: &mut SchedulerParams,
) -> bool {
    let Some(req) = req else {
        return true;
    };

    let requested = req.units;
    if requested <= 0 {
        return true;
    }

    if gpu.quantity.available() == 0 {
        return false;
    }

    let attrs = match GpuAttributes::parse(&req.attributes) {
        Ok(attrs) => attrs,
        Err(_) => return false,
    };

    let mut remaining = requested;

    for info in &gpu.info {
        let Some(models) = attrs.vendor(&info.vendor) else {
            continue;
        };

        let Some(spec) = models.get_or_wildcard(&info.model) else {
            continue;
        };

        if let Some(ram) = &spec.ram {
            if *ram != info.memory_size {
                continue;
            }
        }

        if let Some(interface) = &spec.interface {
            if *interface != info.interface {
                continue;
            }
        }

        remaining -= 1;
        if remaining == 0 {
            if !gpu.quantity.sub_nlz(requested) {
                return false;
            }

            let vendor = info.vendor.to_lowercase();
            sparams.resources.gpu = GpuScheduling {
                vendor: vendor.clone(),
                model: info.model.clone(),
            };

            let key = spec.selector_key(&vendor, &info.model);
            req.attributes = vec![Attribute::new(key, "true")];

            return true;
        }
    }

    false
}
