use anyhow::Result;

use crate::models::{CategoryFilter, MenuEntry, validate_category};
use crate::store::LocalStore;

/// The chips the user has toggled on. Starts empty, which means "show everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelection {
    selected: CategoryFilter,
}

impl CategorySelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tag` if absent, remove it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, tag: &str) -> Result<bool> {
        let tag = validate_category(tag)?;
        if self.selected.remove(&tag) {
            Ok(false)
        } else {
            self.selected.insert(tag);
            Ok(true)
        }
    }

    #[must_use]
    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected.contains(tag)
    }

    #[must_use]
    pub fn as_filter(&self) -> &CategoryFilter {
        &self.selected
    }
}

/// Cheapest first. Stable, so the store's tie order survives.
pub fn sort_by_price(entries: &mut [MenuEntry]) {
    entries.sort_by(|a, b| a.price.total_cmp(&b.price));
}

/// Store rows for `filter`, re-sorted by price.
pub async fn fetch_visible(store: &LocalStore, filter: &CategoryFilter) -> Vec<MenuEntry> {
    let mut entries = store.query_by_category(filter).await;
    sort_by_price(&mut entries);
    entries
}

/// Keeps the visible menu in step with the category selection.
///
/// Every selection change re-queries the store; the result is re-sorted by
/// price before it is published, whatever order the store returned.
pub struct MenuQuery {
    store: LocalStore,
    selection: CategorySelection,
    visible: Vec<MenuEntry>,
}

impl MenuQuery {
    #[must_use]
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            selection: CategorySelection::new(),
            visible: Vec::new(),
        }
    }

    #[must_use]
    pub fn selection(&self) -> &CategorySelection {
        &self.selection
    }

    #[must_use]
    pub fn visible(&self) -> &[MenuEntry] {
        &self.visible
    }

    /// Publish entries that were obtained elsewhere, e.g. a sync read-back.
    pub fn publish(&mut self, mut entries: Vec<MenuEntry>) {
        sort_by_price(&mut entries);
        self.visible = entries;
    }

    pub async fn refresh(&mut self) -> &[MenuEntry] {
        self.visible = fetch_visible(&self.store, self.selection.as_filter()).await;
        tracing::debug!(
            categories = ?self.selection.as_filter().tags().collect::<Vec<_>>(),
            count = self.visible.len(),
            "menu view refreshed"
        );
        &self.visible
    }

    pub async fn toggle(&mut self, tag: &str) -> Result<&[MenuEntry]> {
        self.selection.toggle(tag)?;
        Ok(self.refresh().await)
    }

    pub async fn set_selection(&mut self, selection: CategorySelection) -> &[MenuEntry] {
        self.selection = selection;
        self.refresh().await
    }
}
