use crate::clients::ListingSource;
use crate::config::PipelineConfig;
use crate::types::{Platform, RawListing};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const POLY_API: &str = "https://gamma-api.polymarket.com/markets";
const BATCH_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct PolymarketClient {
    client: Client,
    max_listings: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Market {
    pub id: String,
    pub question: String,
    pub outcomes: Option<Value>, // Can be array or JSON string
    #[serde(rename = "outcomePrices")]
    pub outcome_prices: Option<Value>, // Can be array or JSON string
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

impl PolymarketClient {
    pub fn new(config: &PipelineConfig) -> Self {
        let mut client_builder =
            Client::builder().timeout(std::time::Duration::from_secs(config.request_timeout_secs));

        // Check for proxy in environment
        if let Ok(proxy_url) = std::env::var("POLYMARKET_PROXY_URL") {
            if !proxy_url.is_empty() {
                if let Ok(proxy) = reqwest::Proxy::all(&proxy_url) {
                    client_builder = client_builder.proxy(proxy);
                    info!("Polymarket client using proxy: {}", proxy_url);
                }
            }
        }

        Self {
            client: client_builder.build().unwrap_or_else(|_| Client::new()),
            max_listings: config.max_listings_per_site,
        }
    }

    pub fn parse_json_string_or_array(v: &Value) -> Vec<String> {
        match v {
            Value::Array(arr) => arr
                .iter()
                .map(|item| item.as_str().unwrap_or_default().to_string())
                .collect(),
            Value::String(s) => {
                let parsed: Value = serde_json::from_str(s).unwrap_or(Value::Null);
                if let Value::Array(arr) = parsed {
                    arr.iter()
                        .map(|item| item.as_str().unwrap_or_default().to_string())
                        .collect()
                } else {
                    vec![]
                }
            }
            _ => vec![],
        }
    }

    /// Paginate through active markets ordered by volume, capped at
    /// `max_listings`.
    async fn fetch_markets(&self) -> Result<Vec<Market>> {
        let mut all: Vec<Market> = Vec::new();
        let mut offset: usize = 0;

        loop {
            let params = [
                ("limit", BATCH_SIZE.to_string()),
                ("offset", offset.to_string()),
                ("closed", "false".to_string()),
                ("active", "true".to_string()),
                ("order", "volume".to_string()),
                ("ascending", "false".to_string()),
            ];

            let resp = self.client.get(POLY_API).query(&params).send().await?;

            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                error!("Polymarket API error: {} - {}", status, text);
                break;
            }

            let batch: Vec<Market> = resp.json().await?;
            let count = batch.len();
            if count == 0 {
                break;
            }

            all.extend(batch);
            offset += count;

            if count < BATCH_SIZE || all.len() >= self.max_listings {
                break;
            }
        }

        all.truncate(self.max_listings);
        Ok(all)
    }

    /// Map one Gamma market to a listing. Markets with no quoted outcome
    /// price or already past their end date are skipped.
    fn to_listing(market: &Market, now: DateTime<Utc>) -> Option<RawListing> {
        if let Some(end) = &market.end_date {
            if let Ok(ts) = end.parse::<DateTime<Utc>>() {
                if ts < now {
                    return None;
                }
            }
        }

        let prices = market
            .outcome_prices
            .as_ref()
            .map(Self::parse_json_string_or_array)
            .unwrap_or_default();
        let raw_price = prices.into_iter().find(|p| !p.trim().is_empty())?;
        let probability = raw_price.trim().parse::<f64>().ok().map(|p| p * 100.0);

        Some(RawListing {
            source: Platform::Polymarket,
            name: market.question.clone(),
            raw_price,
            probability,
        })
    }
}

#[async_trait]
impl ListingSource for PolymarketClient {
    async fn fetch_listings(&self) -> Result<Vec<RawListing>> {
        let markets = self.fetch_markets().await?;
        let now = Utc::now();

        let listings: Vec<RawListing> = markets
            .iter()
            .filter_map(|m| Self::to_listing(m, now))
            .collect();

        debug!(
            "Polymarket: {} of {} markets had a usable price",
            listings.len(),
            markets.len()
        );
        info!("Polymarket fetched {} listings", listings.len());
        Ok(listings)
    }

    fn platform(&self) -> Platform {
        Platform::Polymarket
    }
}
