use anyhow::{Context, Result};
use async_trait::async_trait;

use lemon_core::remote::{MenuDocument, MenuSource, parse_menu_document};

pub struct HttpMenuSource {
    client: reqwest::Client,
    url: String,
}

impl HttpMenuSource {
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "lemon-cli/{} (menu cache)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub async fn fetch_async(&self) -> Result<MenuDocument> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to reach menu endpoint")?
            .error_for_status()
            .context("Menu endpoint returned an error status")?;

        let body = resp
            .text()
            .await
            .context("Failed to read menu response body")?;

        parse_menu_document(&body)
    }
}

#[async_trait]
impl MenuSource for HttpMenuSource {
    async fn fetch_menu(&self) -> Result<MenuDocument> {
        self.fetch_async().await
    }
}
