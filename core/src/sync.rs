use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::models::{CategoryFilter, MenuEntry, NewMenuEntry, SyncReport, SyncStatus};
use crate::remote::{self, MenuEndpoint, MenuSource};
use crate::store::LocalStore;

/// Replaces the local menu cache with the latest remote document.
///
/// Each call to [`SyncEngine::sync`] is one cycle: clear, fetch, dedupe,
/// transform, insert, read back. Cycles are numbered; when a newer cycle has
/// started, an older one finishing late writes nothing and reports
/// [`SyncStatus::Superseded`].
pub struct SyncEngine {
    store: LocalStore,
    source: Arc<dyn MenuSource>,
    endpoint: MenuEndpoint,
    latest_cycle: AtomicU64,
}

impl SyncEngine {
    pub fn new(store: LocalStore, source: Arc<dyn MenuSource>, endpoint: MenuEndpoint) -> Self {
        Self {
            store,
            source,
            endpoint,
            latest_cycle: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    #[must_use]
    pub fn endpoint(&self) -> &MenuEndpoint {
        &self.endpoint
    }

    fn is_current(&self, cycle: u64) -> bool {
        self.latest_cycle.load(Ordering::SeqCst) == cycle
    }

    /// Run one sync cycle. Never fails: every fault is logged and reported
    /// through the returned status.
    pub async fn sync(&self) -> SyncReport {
        let cycle = self.latest_cycle.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(cycle, "menu sync started");

        self.store.clear().await;
        self.store.ensure_schema().await;

        let document = match self.source.fetch_menu().await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(cycle, error = %format!("{e:#}"), "failed to fetch menu data");
                return report(cycle, SyncStatus::Failed, 0, 0, 0, Vec::new());
            }
        };

        let fetched = document.menu.len();
        let unique = remote::dedupe_first_wins(document.menu);
        let discarded_duplicates = fetched - unique.len();

        let mut entries: Vec<NewMenuEntry> = Vec::with_capacity(unique.len());
        let mut discarded_invalid = 0;
        for record in unique {
            let name = record.name.clone();
            if let Some(entry) = remote::record_to_entry(record, &self.endpoint) {
                entries.push(entry);
            } else {
                tracing::warn!(cycle, name = %name, "skipping menu record with empty name or bad price");
                discarded_invalid += 1;
            }
        }

        let landed = self
            .store
            .bulk_insert_if(&entries, || self.is_current(cycle))
            .await;

        if !self.is_current(cycle) {
            tracing::info!(cycle, "menu sync superseded by a newer cycle");
            return report(
                cycle,
                SyncStatus::Superseded,
                fetched,
                discarded_duplicates,
                discarded_invalid,
                Vec::new(),
            );
        }

        if !landed {
            return report(
                cycle,
                SyncStatus::Failed,
                fetched,
                discarded_duplicates,
                discarded_invalid,
                Vec::new(),
            );
        }

        let stored = self.store.query_by_category(&CategoryFilter::all()).await;

        if !self.is_current(cycle) {
            tracing::info!(cycle, "menu sync superseded by a newer cycle");
            return report(
                cycle,
                SyncStatus::Superseded,
                fetched,
                discarded_duplicates,
                discarded_invalid,
                Vec::new(),
            );
        }

        tracing::info!(
            cycle,
            fetched,
            stored = stored.len(),
            discarded_duplicates,
            discarded_invalid,
            "menu sync applied"
        );
        report(
            cycle,
            SyncStatus::Applied,
            fetched,
            discarded_duplicates,
            discarded_invalid,
            stored,
        )
    }
}

fn report(
    cycle: u64,
    status: SyncStatus,
    fetched: usize,
    discarded_duplicates: usize,
    discarded_invalid: usize,
    entries: Vec<MenuEntry>,
) -> SyncReport {
    SyncReport {
        cycle,
        status,
        entries,
        fetched,
        discarded_duplicates,
        discarded_invalid,
        completed_at: Utc::now().to_rfc3339(),
    }
}
