use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;

use crate::db::Database;
use crate::models::{CategoryFilter, DuplicateName, MenuEntry, NewMenuEntry};

/// Best-effort async handle over the menu cache.
///
/// Every storage fault is logged and turned into an empty result, `false`, or a
/// no-op. Callers cannot tell "empty" from "cache unavailable", and the process
/// never goes down because the cache did.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
}

impl LocalStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    fn lock(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the underlying database while holding the store lock.
    pub fn with_db<T>(&self, f: impl FnOnce(&Database) -> T) -> T {
        f(&self.lock())
    }

    pub async fn ensure_schema(&self) {
        if let Err(e) = self.lock().ensure_schema() {
            tracing::error!(error = %format!("{e:#}"), "failed to create menu table");
        }
    }

    pub async fn clear(&self) {
        match self.lock().clear_menu() {
            Ok(count) => tracing::debug!(count, "menu table cleared"),
            Err(e) => tracing::error!(error = %format!("{e:#}"), "failed to clear menu table"),
        }
    }

    /// Insert the batch, returning whether it landed.
    pub async fn bulk_insert(&self, entries: &[NewMenuEntry]) -> bool {
        self.bulk_insert_if(entries, || true).await
    }

    /// Insert the batch only if `still_wanted` holds once the store lock is taken.
    ///
    /// The check and the insert happen under the same lock, so no other store
    /// operation can run between them.
    pub async fn bulk_insert_if(
        &self,
        entries: &[NewMenuEntry],
        still_wanted: impl FnOnce() -> bool,
    ) -> bool {
        let db = self.lock();
        if !still_wanted() {
            return false;
        }
        match db.insert_menu_entries(entries) {
            Ok(count) => {
                tracing::debug!(count, "menu entries saved");
                true
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "failed to save menu entries");
                false
            }
        }
    }

    pub async fn query_by_category(&self, filter: &CategoryFilter) -> Vec<MenuEntry> {
        self.lock().menu_by_category(filter).unwrap_or_else(|e| {
            tracing::error!(error = %format!("{e:#}"), "failed to query menu by category");
            Vec::new()
        })
    }

    pub async fn search(&self, query: &str, filter: &CategoryFilter) -> Vec<MenuEntry> {
        self.lock().search_menu(query, filter).unwrap_or_else(|e| {
            tracing::error!(error = %format!("{e:#}"), "failed to search menu");
            Vec::new()
        })
    }

    pub async fn count(&self) -> i64 {
        self.lock().count_menu().unwrap_or_else(|e| {
            tracing::error!(error = %format!("{e:#}"), "failed to count menu rows");
            0
        })
    }

    pub async fn duplicate_names(&self) -> Vec<DuplicateName> {
        self.lock().duplicate_names().unwrap_or_else(|e| {
            tracing::error!(error = %format!("{e:#}"), "failed to check for duplicates");
            Vec::new()
        })
    }
}
