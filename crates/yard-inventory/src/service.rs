//! Inventory service: the actor that owns cluster state
//!
//! A single task owns the authoritative `Inventory` and is its only writer.
//! Each loop iteration handles exactly one of: shutdown, a commit request, or
//! a subscription request. Commits are therefore totally ordered, and every
//! subscriber observes snapshots in that order.
//!
//! Subscribers are isolated from the actor by a per-subscriber forwarder
//! task: the actor pushes duplicated snapshots into an unbounded intake and
//! never waits on a slow reader; the forwarder queues snapshots and feeds
//! them to the subscriber's channel as it drains. Dropping the subscriber's
//! channel or signalling shutdown closes the stream.

use crate::config::InventoryConfig;
use crate::inventory::Inventory;
use crate::placement::AdjustOptions;
use std::collections::VecDeque;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use yard_core::{Cluster, Reservation, ReservationClusterSettings, ResourceGroup, ResourceUnits};

struct CommitRequest {
    units: ResourceUnits,
    resp: oneshot::Sender<bool>,
}

/// Handle for submitting commits and subscribing to snapshots
#[derive(Clone)]
pub struct InventoryClient {
    commit_tx: mpsc::Sender<CommitRequest>,
    subscribe_tx: mpsc::Sender<mpsc::Sender<Inventory>>,
    snapshot_queue_depth: usize,
}

impl InventoryClient {
    /// Debit the inventory for an accepted reservation.
    ///
    /// The commit is placed by the engine across the whole cluster; a
    /// reservation that no longer fits is rejected and leaves the inventory
    /// unchanged. Returns `true` once the actor has applied and acknowledged
    /// the commit, `false` if it was rejected or shutdown intervened.
    pub async fn commit<G: ResourceGroup + ?Sized>(&self, group: &G) -> bool {
        let (resp, ack) = oneshot::channel();
        let request = CommitRequest {
            units: group.resource_units(),
            resp,
        };

        if self.commit_tx.send(request).await.is_err() {
            return false;
        }

        ack.await.unwrap_or(false)
    }

    /// Subscribe to post-commit snapshots.
    ///
    /// The current snapshot is delivered first; the channel closes when the
    /// service shuts down.
    pub async fn result_chan(&self) -> mpsc::Receiver<Inventory> {
        let (tx, rx) = mpsc::channel(self.snapshot_queue_depth);

        // a failed registration drops tx, so the caller sees a closed stream
        let _ = self.subscribe_tx.send(tx).await;

        rx
    }
}

/// The actor owning the authoritative inventory
pub struct InventoryService {
    inventory: Inventory,
    commit_rx: mpsc::Receiver<CommitRequest>,
    subscribe_rx: mpsc::Receiver<mpsc::Sender<Inventory>>,
    shutdown: watch::Receiver<bool>,
}

impl InventoryService {
    /// Spawn the service over the given cluster and return its client handle
    pub fn spawn(
        cluster: Cluster,
        config: InventoryConfig,
        shutdown: watch::Receiver<bool>,
    ) -> InventoryClient {
        let (commit_tx, commit_rx) = mpsc::channel(config.commit_queue_depth);
        let (subscribe_tx, subscribe_rx) = mpsc::channel(config.subscribe_queue_depth);

        let service = Self {
            inventory: Inventory::new(cluster),
            commit_rx,
            subscribe_rx,
            shutdown,
        };

        tokio::spawn(service.run());

        InventoryClient {
            commit_tx,
            subscribe_tx,
            snapshot_queue_depth: config.snapshot_queue_depth,
        }
    }

    async fn run(mut self) {
        info!(
            nodes = self.inventory.cluster.nodes.len(),
            "inventory service started"
        );

        let mut subscribers: Vec<mpsc::UnboundedSender<Inventory>> = Vec::new();

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                request = self.commit_rx.recv() => {
                    let Some(request) = request else { break };

                    let accepted = self.apply_commit(request.units);
                    if accepted {
                        // drop subscribers whose forwarder has gone away
                        subscribers.retain(|sub| sub.send(self.inventory.clone()).is_ok());
                    }

                    let _ = request.resp.send(accepted);
                }
                subscription = self.subscribe_rx.recv() => {
                    let Some(out) = subscription else { break };

                    let (intake, forwarder_rx) = mpsc::unbounded_channel();
                    tokio::spawn(forward(forwarder_rx, out, self.shutdown.clone()));

                    // new subscribers immediately observe the current state
                    let _ = intake.send(self.inventory.clone());
                    subscribers.push(intake);

                    debug!(count = subscribers.len(), "subscriber registered");
                }
            }
        }

        info!("inventory service stopped");
    }

    fn apply_commit(&mut self, units: ResourceUnits) -> bool {
        let mut group = CommitGroup { units };

        match self.inventory.adjust(&mut group, &AdjustOptions::new()) {
            Ok(()) => {
                debug!("commit applied");
                true
            }
            Err(err) => {
                warn!(%err, "commit rejected");
                false
            }
        }
    }
}

/// The commit path runs reservations through the placement engine; the
/// allocation outputs are not needed here
struct CommitGroup {
    units: ResourceUnits,
}

impl ResourceGroup for CommitGroup {
    fn resource_units(&self) -> ResourceUnits {
        self.units.clone()
    }
}

impl Reservation for CommitGroup {
    fn set_allocated_resources(&mut self, _units: ResourceUnits) {}

    fn set_cluster_params(&mut self, _params: ReservationClusterSettings) {}
}

/// Per-subscriber forwarder.
///
/// Queues snapshots from the actor and feeds them to the subscriber as its
/// channel drains, so the actor never blocks on a slow reader. Exits, closing
/// the subscriber's stream, on shutdown or when either side goes away.
async fn forward(
    mut intake: mpsc::UnboundedReceiver<Inventory>,
    out: mpsc::Sender<Inventory>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut pending: VecDeque<Inventory> = VecDeque::new();

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            snapshot = intake.recv() => {
                let Some(snapshot) = snapshot else { break };
                pending.push_back(snapshot);
            }
            permit = out.reserve(), if !pending.is_empty() => {
                match permit {
                    Ok(permit) => {
                        if let Some(snapshot) = pending.pop_front() {
                            permit.send(snapshot);
                        }
                    }
                    // subscriber dropped its receiver
                    Err(_) => break,
                }
            }
        }
    }

    debug!("subscriber forwarder stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{mock_cluster, MOCK_STORAGE_CLASS};
    use yard_core::units::GIB;
    use yard_core::{
        Attribute, CpuRequest, MemoryRequest, ResourceUnit, Resources, StorageRequest,
    };

    fn cpu_group(cpu: i64, memory: i64, count: u32) -> ResourceUnits {
        vec![ResourceUnit::new(
            Resources {
                id: 1,
                cpu: CpuRequest::new(cpu),
                memory: MemoryRequest::new(memory),
                ..Resources::default()
            },
            count,
        )]
    }

    fn spawn_service() -> (InventoryClient, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let client = InventoryService::spawn(
            mock_cluster(&[]),
            InventoryConfig::default(),
            shutdown_rx,
        );
        (client, shutdown_tx)
    }

    #[tokio::test]
    async fn test_subscriber_receives_initial_snapshot() {
        let (client, _shutdown) = spawn_service();

        let mut stream = client.result_chan().await;
        let snapshot = stream.recv().await.unwrap();

        assert_eq!(snapshot.snapshot().nodes[0].name, "solo");
        assert_eq!(snapshot.snapshot().nodes[0].resources.cpu.allocated, 100);
    }

    #[tokio::test]
    async fn test_commit_debits_and_broadcasts() {
        let (client, _shutdown) = spawn_service();

        let mut stream = client.result_chan().await;
        let initial = stream.recv().await.unwrap();
        assert_eq!(initial.snapshot().nodes[0].resources.cpu.allocated, 100);

        assert!(client.commit(&cpu_group(1000, GIB, 1)).await);

        let updated = stream.recv().await.unwrap();
        assert_eq!(updated.snapshot().nodes[0].resources.cpu.allocated, 1100);
        assert_eq!(
            updated.snapshot().nodes[0].resources.memory.allocated,
            2 * GIB
        );
    }

    #[tokio::test]
    async fn test_commit_honors_replica_count() {
        let (client, _shutdown) = spawn_service();

        assert!(client.commit(&cpu_group(1000, GIB, 3)).await);

        let mut stream = client.result_chan().await;
        let snapshot = stream.recv().await.unwrap();
        assert_eq!(snapshot.snapshot().nodes[0].resources.cpu.allocated, 3100);
    }

    #[tokio::test]
    async fn test_commit_routes_persistent_storage_to_pool() {
        let (client, _shutdown) = spawn_service();

        let mut units = cpu_group(1000, GIB, 1);
        units[0].resources.storage.push(StorageRequest::new(
            GIB,
            vec![
                Attribute::new("persistent", "true"),
                Attribute::new("class", MOCK_STORAGE_CLASS),
            ],
        ));

        assert!(client.commit(&units).await);

        let mut stream = client.result_chan().await;
        let snapshot = stream.recv().await.unwrap().snapshot();
        // mock pool starts at 502Gi allocated
        assert_eq!(snapshot.storage[0].quantity.allocated, 503 * GIB);
    }

    #[tokio::test]
    async fn test_oversized_commit_is_rejected() {
        let (client, _shutdown) = spawn_service();

        let mut stream = client.result_chan().await;
        let _initial = stream.recv().await.unwrap();

        // the mock node has 4900m available
        assert!(!client.commit(&cpu_group(6000, GIB, 1)).await);

        // a rejected commit changes nothing and publishes nothing; the next
        // accepted commit's snapshot carries only its own debit
        assert!(client.commit(&cpu_group(1000, GIB, 1)).await);
        let snapshot = stream.recv().await.unwrap().snapshot();
        assert_eq!(snapshot.nodes[0].resources.cpu.allocated, 1100);
    }

    #[tokio::test]
    async fn test_snapshots_arrive_in_commit_order() {
        let (client, _shutdown) = spawn_service();

        let mut stream = client.result_chan().await;
        let _initial = stream.recv().await.unwrap();

        for _ in 0..4 {
            assert!(client.commit(&cpu_group(500, GIB, 1)).await);
        }

        let mut last = 100;
        for _ in 0..4 {
            let snapshot = stream.recv().await.unwrap().snapshot();
            let allocated = snapshot.nodes[0].resources.cpu.allocated;
            assert_eq!(allocated, last + 500);
            last = allocated;
        }
    }

    #[tokio::test]
    async fn test_slow_subscriber_does_not_block_commits() {
        let (client, _shutdown) = spawn_service();

        // register a subscriber, then stop reading while committing
        let mut slow = client.result_chan().await;
        let _initial = slow.recv().await.unwrap();

        for _ in 0..8 {
            assert!(client.commit(&cpu_group(500, GIB, 1)).await);
        }

        // the actor acked all commits without waiting on the reader, which
        // still gets the full sequence, ending in the final state
        let mut last = None;
        for _ in 0..8 {
            last = Some(slow.recv().await.unwrap());
        }
        assert_eq!(
            last.unwrap().snapshot().nodes[0].resources.cpu.allocated,
            100 + 8 * 500
        );
    }

    #[tokio::test]
    async fn test_subscribers_observe_consistent_order() {
        let (client, _shutdown) = spawn_service();

        let mut first = client.result_chan().await;
        let mut second = client.result_chan().await;
        assert_eq!(
            first.recv().await.unwrap().snapshot().nodes[0].resources.cpu.allocated,
            100
        );
        assert_eq!(
            second.recv().await.unwrap().snapshot().nodes[0].resources.cpu.allocated,
            100
        );

        for _ in 0..3 {
            assert!(client.commit(&cpu_group(500, GIB, 1)).await);
        }

        for _ in 0..3 {
            let a = first.recv().await.unwrap().snapshot();
            let b = second.recv().await.unwrap().snapshot();
            assert_eq!(
                a.nodes[0].resources.cpu.allocated,
                b.nodes[0].resources.cpu.allocated
            );
        }
    }

    #[tokio::test]
    async fn test_shutdown_closes_streams_and_fails_commits() {
        let (client, shutdown) = spawn_service();

        let mut stream = client.result_chan().await;
        let _initial = stream.recv().await.unwrap();

        shutdown.send(true).unwrap();

        // the forwarder drops the stream on shutdown
        while stream.recv().await.is_some() {}

        // once the actor has exited, commits fail fast
        while client.commit(&cpu_group(100, GIB, 1)).await {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_spawn_with_shutdown_already_signalled() {
        let (shutdown_tx, shutdown_rx) = watch::channel(true);
        let client = InventoryService::spawn(
            mock_cluster(&[]),
            InventoryConfig::default(),
            shutdown_rx,
        );
        drop(shutdown_tx);

        assert!(!client.commit(&cpu_group(100, GIB, 1)).await);
    }
}
