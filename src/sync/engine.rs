//! Last-write-wins reconciliation between the local store and the server.
//!
//! One pass walks six ordered phases:
//! 1. snapshot the remote and local sets
//! 2. propagate local tombstones to the server, then hard-delete them
//! 3. re-read the local state
//! 4. reconcile ids present on both sides by `updated_at`
//! 5. push local-only records
//! 6. pull remote-only records, skipping ids whose deletion phase 2 resolved
//!
//! Phases run strictly in order and each phase sees the local writes of
//! the ones before it. At most one pass runs at a time; a trigger that
//! arrives mid-pass is dropped, not queued.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::api::{ApiError, RemoteStore};
use crate::db::ItemRepository;
use crate::models::{RemoteShoppingItem, ShoppingItem};
use crate::sync::error::SyncError;

/// Quiet period after the last change signal before a pass starts.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(2);

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOutcome {
    /// Local records written to the server (created or updated)
    pub pushed: usize,
    /// Remote records absorbed into the local store
    pub pulled: usize,
    /// Tombstones resolved: remote delete attempted, local row removed
    pub deleted: usize,
    /// Item-level calls that failed and will retry on the next pass
    pub failed: usize,
}

/// Converges the local store and a remote store.
///
/// The remote side is injected, so tests run against an in-memory fake
/// and production against [`crate::api::HttpRemoteStore`].
pub struct SyncEngine<R: RemoteStore> {
    repo: ItemRepository,
    remote: R,
    in_flight: AtomicBool,
    debounce: Duration,
}

/// Clears the in-flight flag when the pass ends, on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<R: RemoteStore> SyncEngine<R> {
    pub fn new(repo: ItemRepository, remote: R) -> Self {
        Self {
            repo,
            remote,
            in_flight: AtomicBool::new(false),
            debounce: DEBOUNCE_WINDOW,
        }
    }

    /// Overrides the debounce window.
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    /// Runs one reconciliation pass, unless one is already in flight.
    ///
    /// A concurrent call is dropped, not queued. Failures are logged and
    /// the pass leaves state as far along as it got; calling again is
    /// always safe. Returns the pass counters when a pass ran.
    pub async fn run_sync(&self) -> Option<SyncOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Sync pass already in flight, dropping trigger");
            return None;
        }
        let _guard = InFlightGuard(&self.in_flight);

        match self.reconcile().await {
            Ok(outcome) => {
                tracing::info!(
                    "Sync pass complete: {} pushed, {} pulled, {} deleted, {} failed",
                    outcome.pushed,
                    outcome.pulled,
                    outcome.deleted,
                    outcome.failed
                );
                Some(outcome)
            }
            Err(e) => {
                tracing::warn!("Sync pass failed: {}", e);
                None
            }
        }
    }

    /// Subscribes to the store's change notifications. Each signal
    /// starts (or restarts) the debounce window; when the window elapses
    /// with no further signal, one pass runs.
    ///
    /// The engine's own writes signal too, which schedules one echo pass
    /// after a sync; that pass finds nothing dirty, writes nothing, and
    /// the loop settles.
    pub fn schedule_on_change(
        self: &Arc<Self>,
        mut changes: broadcast::Receiver<()>,
    ) -> JoinHandle<()>
    where
        R: 'static,
    {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }

                // Debounce: each further signal restarts the wait.
                loop {
                    match tokio::time::timeout(engine.debounce, changes.recv()).await {
                        Ok(Ok(())) | Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
                        Ok(Err(broadcast::error::RecvError::Closed)) => {
                            engine.run_sync().await;
                            return;
                        }
                        Err(_) => break,
                    }
                }

                engine.run_sync().await;
            }
        })
    }

    async fn reconcile(&self) -> Result<SyncOutcome, SyncError> {
        let mut outcome = SyncOutcome::default();

        // Phase 1: snapshot both stores. A remote fetch failure is fatal
        // to the pass; nothing is reconcilable without the snapshot.
        let remote_items = self
            .remote
            .fetch_all()
            .await
            .map_err(SyncError::RemoteFetch)?;
        let remote_by_id: HashMap<String, RemoteShoppingItem> = remote_items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        let local_items = self.repo.list_all(true).await?;

        // Phase 2: propagate tombstones. Success, remote not-found and
        // failure all resolve the tombstone; a local deletion is settled
        // in this pass, never retried.
        let mut resolved_deletions: HashSet<String> = HashSet::new();
        for item in local_items.iter().filter(|i| i.is_deleted_locally) {
            match self.remote.delete_item(&item.id).await {
                Ok(()) | Err(ApiError::NotFound) => {}
                Err(e) => {
                    tracing::warn!("Remote delete of {} failed: {}", item.id, e);
                    outcome.failed += 1;
                }
            }
            resolved_deletions.insert(item.id.clone());

            match self.repo.hard_delete(&item.id).await {
                Ok(()) => outcome.deleted += 1,
                Err(e) => {
                    tracing::warn!("Local hard delete of {} failed: {}", item.id, e);
                    outcome.failed += 1;
                }
            }
        }

        // Phase 3: re-read the non-deleted local state; phase 2 removed
        // rows from under the first snapshot.
        let local_items = self.repo.list_all(false).await?;
        let local_by_id: HashMap<String, ShoppingItem> = local_items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        // Phase 4: reconcile the intersection by updated_at.
        for (id, local) in &local_by_id {
            let Some(remote) = remote_by_id.get(id) else {
                continue;
            };

            if local.updated_at > remote.updated_at {
                match self.remote.update_item(&RemoteShoppingItem::from(local)).await {
                    Ok(_) => match self.repo.mark_synced(id).await {
                        Ok(()) => outcome.pushed += 1,
                        Err(e) => {
                            tracing::warn!("Failed to mark {} synced: {}", id, e);
                            outcome.failed += 1;
                        }
                    },
                    Err(e) => {
                        tracing::warn!("Push of {} failed: {}", id, e);
                        outcome.failed += 1;
                    }
                }
            } else if local.updated_at < remote.updated_at {
                match self.repo.apply_remote(remote).await {
                    Ok(()) => outcome.pulled += 1,
                    Err(e) => {
                        tracing::warn!("Absorbing remote {} failed: {}", id, e);
                        outcome.failed += 1;
                    }
                }
            } else if local.needs_sync {
                // Equal timestamps count as already consistent; only the
                // dirty flag needs to clear.
                if let Err(e) = self.repo.mark_synced(id).await {
                    tracing::warn!("Failed to mark {} synced: {}", id, e);
                    outcome.failed += 1;
                }
            }
        }

        // Phase 5: push local-only records.
        for (id, local) in &local_by_id {
            if remote_by_id.contains_key(id) {
                continue;
            }
            match self.remote.create_item(&RemoteShoppingItem::from(local)).await {
                Ok(_) => match self.repo.mark_synced(id).await {
                    Ok(()) => outcome.pushed += 1,
                    Err(e) => {
                        tracing::warn!("Failed to mark {} synced: {}", id, e);
                        outcome.failed += 1;
                    }
                },
                Err(e) => {
                    tracing::warn!("Create of {} failed: {}", id, e);
                    outcome.failed += 1;
                }
            }
        }

        // Phase 6: pull remote-only records. Re-read local ids so this
        // phase sees every write made above; ids whose deletion was just
        // resolved are skipped even if the remote delete failed.
        let current_ids: HashSet<String> = self
            .repo
            .list_all(true)
            .await?
            .into_iter()
            .map(|item| item.id)
            .collect();

        for (id, remote) in &remote_by_id {
            if current_ids.contains(id) || resolved_deletions.contains(id) {
                continue;
            }
            match self.repo.apply_remote(remote).await {
                Ok(()) => outcome.pulled += 1,
                Err(e) => {
                    tracing::warn!("Pull of {} failed: {}", id, e);
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}
