use std::collections::BTreeSet;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Category tags the menu screen offers as filter chips.
pub const MENU_CATEGORIES: &[&str] = &["starters", "mains", "desserts"];

/// Filter value meaning "no category restriction".
pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMenuEntry {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub category: String,
}

impl From<MenuEntry> for NewMenuEntry {
    fn from(entry: MenuEntry) -> Self {
        Self {
            name: entry.name,
            price: entry.price,
            description: entry.description,
            image: entry.image,
            category: entry.category,
        }
    }
}

/// A set of category tags to filter the cached menu by.
///
/// An empty set and a set containing [`ALL_CATEGORIES`] both mean "every row".
/// Tags are kept ordered so the generated query is identical for identical input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    tags: BTreeSet<String>,
}

impl CategoryFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.tags.is_empty()
            || self
                .tags
                .iter()
                .any(|t| t.eq_ignore_ascii_case(ALL_CATEGORIES))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub(crate) fn insert(&mut self, tag: String) -> bool {
        self.tags.insert(tag)
    }

    pub(crate) fn remove(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }
}

pub fn validate_category(tag: &str) -> anyhow::Result<String> {
    let lower = tag.trim().to_lowercase();
    if MENU_CATEGORIES.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        bail!(
            "Invalid category '{tag}'. Must be one of: {}",
            MENU_CATEGORIES.join(", ")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// The cycle finished and its rows are the ones now in the store.
    Applied,
    /// Fetch or parse failed; the store was left as the cycle found it after clearing.
    Failed,
    /// A newer cycle started before this one finished; nothing was written.
    Superseded,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub cycle: u64,
    pub status: SyncStatus,
    pub entries: Vec<MenuEntry>,
    /// Records in the remote document before dedupe.
    pub fetched: usize,
    pub discarded_duplicates: usize,
    pub discarded_invalid: usize,
    pub completed_at: String,
}

impl SyncReport {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.status == SyncStatus::Applied
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateName {
    pub name: String,
    pub count: i64,
}

/// Header badge data: the avatar if one is set, otherwise initials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initials: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_empty_is_unfiltered() {
        assert!(CategoryFilter::all().is_unfiltered());
        assert!(CategoryFilter::from_tags(Vec::<String>::new()).is_unfiltered());
    }

    #[test]
    fn test_filter_with_sentinel_is_unfiltered() {
        assert!(CategoryFilter::from_tags(["All"]).is_unfiltered());
        assert!(CategoryFilter::from_tags(["mains", "All"]).is_unfiltered());
        assert!(CategoryFilter::from_tags(["all"]).is_unfiltered());
    }

    #[test]
    fn test_filter_with_tags_is_filtered() {
        let filter = CategoryFilter::from_tags(["mains", "desserts"]);
        assert!(!filter.is_unfiltered());
        assert_eq!(filter.tags().collect::<Vec<_>>(), vec!["desserts", "mains"]);
    }

    #[test]
    fn test_validate_category() {
        assert_eq!(validate_category("Mains").unwrap(), "mains");
        assert_eq!(validate_category(" starters ").unwrap(), "starters");
        assert!(validate_category("drinks").is_err());
        assert!(validate_category("").is_err());
    }
}
