use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::ItemError;
use crate::input::InputItem;
use crate::settings::{Settings, SET_PLACEHOLDER};

/// Raw pages for one set.
pub struct FetchedPages {
    pub catalog_html: String,
    pub price_html: String,
}

/// Sequential page fetcher for the catalog and price-guide sites.
pub struct Fetcher {
    client: reqwest::Client,
    catalog_url: String,
    price_guide_url: String,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Fetcher {
            client,
            catalog_url: settings.catalog_url.clone(),
            price_guide_url: settings.price_guide_url.clone(),
        })
    }

    pub fn catalog_url_for(&self, item: &InputItem) -> String {
        format!("{}{}", self.catalog_url, item)
    }

    pub fn price_guide_url_for(&self, item: &InputItem) -> String {
        self.price_guide_url.replace(SET_PLACEHOLDER, &item.to_string())
    }

    pub async fn fetch_pages(&self, item: &InputItem) -> Result<FetchedPages, ItemError> {
        let catalog_html = self.fetch_html(&self.catalog_url_for(item)).await?;
        let price_html = self.fetch_html(&self.price_guide_url_for(item)).await?;
        Ok(FetchedPages {
            catalog_html,
            price_html,
        })
    }

    async fn fetch_html(&self, url: &str) -> Result<String, ItemError> {
        let fetch_err = |source| ItemError::Fetch {
            url: url.to_string(),
            source,
        };

        let start = Instant::now();
        let response = self.client.get(url).send().await.map_err(fetch_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ItemError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(fetch_err)?;
        debug!(url, bytes = body.len(), ms = start.elapsed().as_millis() as u64, "fetched");
        Ok(body)
    }
}
