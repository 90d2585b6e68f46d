use std::collections::HashSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, de};

use crate::models::NewMenuEntry;

pub const DEFAULT_MENU_URL: &str =
    "https://raw.githubusercontent.com/Meta-Mobile-Developer-PC/Working-With-Data-API/main/capstone.json";
pub const DEFAULT_IMAGE_BASE: &str =
    "https://github.com/Meta-Mobile-Developer-PC/Working-With-Data-API/blob/main/images/";
pub const DEFAULT_IMAGE_SUFFIX: &str = "?raw=true";

/// Where the menu document lives and how bare image filenames become URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEndpoint {
    pub menu_url: String,
    pub image_base: String,
    pub image_suffix: String,
}

impl Default for MenuEndpoint {
    fn default() -> Self {
        Self {
            menu_url: DEFAULT_MENU_URL.to_string(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            image_suffix: DEFAULT_IMAGE_SUFFIX.to_string(),
        }
    }
}

impl MenuEndpoint {
    #[must_use]
    pub fn image_url(&self, image: &str) -> String {
        format!("{}{image}{}", self.image_base, self.image_suffix)
    }
}

/// Remote source of the menu document.
///
/// The CLI implements this with reqwest; tests use an in-memory document.
#[async_trait]
pub trait MenuSource: Send + Sync {
    async fn fetch_menu(&self) -> Result<MenuDocument>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct MenuDocument {
    pub menu: Vec<RawMenuRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawMenuRecord {
    pub name: String,
    #[serde(deserialize_with = "price_from_number_or_string")]
    pub price: f64,
    #[serde(default)]
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub category: String,
}

fn price_from_number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(f64),
        Text(String),
    }

    match RawPrice::deserialize(deserializer)? {
        RawPrice::Number(n) => Ok(n),
        RawPrice::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid price '{s}'"))),
    }
}

pub fn parse_menu_document(body: &str) -> Result<MenuDocument> {
    serde_json::from_str(body).context("Failed to parse menu document")
}

/// Keep the first record seen for each name, in original order.
#[must_use]
pub fn dedupe_first_wins(records: Vec<RawMenuRecord>) -> Vec<RawMenuRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.name.clone()))
        .collect()
}

#[must_use]
pub fn record_to_entry(record: RawMenuRecord, endpoint: &MenuEndpoint) -> Option<NewMenuEntry> {
    if record.name.trim().is_empty() || !record.price.is_finite() || record.price < 0.0 {
        return None;
    }

    Some(NewMenuEntry {
        image: endpoint.image_url(&record.image),
        name: record.name,
        price: record.price,
        description: record.description,
        category: record.category,
    })
}
