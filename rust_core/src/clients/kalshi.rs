//! Kalshi API client (unauthenticated read-only market data).

use crate::clients::ListingSource;
use crate::config::PipelineConfig;
use crate::types::{Platform, RawListing};
use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const KALSHI_API_PROD: &str = "https://api.elections.kalshi.com/trade-api/v2";
const PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct KalshiClient {
    client: Client,
    base_url: String,
    max_listings: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KalshiMarket {
    pub ticker: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub status: String,
    /// Last trade price in cents
    pub last_price: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct MarketsResponse {
    markets: Vec<KalshiMarket>,
    cursor: Option<String>,
}

impl KalshiClient {
    pub fn new(config: &PipelineConfig) -> Self {
        let base_url =
            env::var("KALSHI_BASE_URL").unwrap_or_else(|_| KALSHI_API_PROD.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url,
            max_listings: config.max_listings_per_site,
        }
    }

    /// Cursor-paginate through open markets, capped at `max_listings`.
    async fn fetch_markets(&self) -> Result<Vec<KalshiMarket>> {
        let url = format!("{}/markets", self.base_url);
        let mut all: Vec<KalshiMarket> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params = vec![
                ("limit", PAGE_SIZE.to_string()),
                ("status", "open".to_string()),
            ];
            if let Some(c) = &cursor {
                params.push(("cursor", c.clone()));
            }

            let resp = self.client.get(&url).query(&params).send().await?;

            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                error!("Kalshi API error: {} - {}", status, text);
                break;
            }

            let page: MarketsResponse = resp.json().await?;
            let count = page.markets.len();
            all.extend(page.markets);

            cursor = page.cursor.filter(|c| !c.is_empty());
            if count == 0 || cursor.is_none() || all.len() >= self.max_listings {
                break;
            }
        }

        all.truncate(self.max_listings);
        Ok(all)
    }

    /// Map one market to a listing. Markets that never traded carry no
    /// usable price and are skipped.
    fn to_listing(market: &KalshiMarket) -> Option<RawListing> {
        let cents = market.last_price.filter(|c| *c > 0)?;

        let name = match &market.subtitle {
            Some(sub) if !sub.trim().is_empty() => format!("{}: {}", market.title, sub),
            _ => market.title.clone(),
        };

        Some(RawListing {
            source: Platform::Kalshi,
            name,
            raw_price: format!("{}¢", cents),
            probability: Some(cents as f64),
        })
    }
}

#[async_trait]
impl ListingSource for KalshiClient {
    async fn fetch_listings(&self) -> Result<Vec<RawListing>> {
        let markets = self.fetch_markets().await?;

        let listings: Vec<RawListing> = markets.iter().filter_map(Self::to_listing).collect();

        debug!(
            "Kalshi: {} of {} markets had a last trade price",
            listings.len(),
            markets.len()
        );
        info!("Kalshi fetched {} listings", listings.len());
        Ok(listings)
    }

    fn platform(&self) -> Platform {
        Platform::Kalshi
    }
}
