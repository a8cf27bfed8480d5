//! PredictIt public market data client.

use crate::clients::ListingSource;
use crate::config::PipelineConfig;
use crate::types::{Platform, RawListing};
use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PREDICTIT_API: &str = "https://www.predictit.org/api/marketdata/all/";

#[derive(Debug, Clone)]
pub struct PredictItClient {
    client: Client,
    max_listings: usize,
}

#[derive(Debug, Deserialize)]
struct MarketData {
    markets: Vec<PredictItMarket>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictItMarket {
    pub id: i64,
    pub name: String,
    pub contracts: Vec<PredictItContract>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictItContract {
    pub id: i64,
    pub name: String,
    #[serde(rename = "lastTradePrice")]
    pub last_trade_price: Option<f64>,
}

impl PredictItClient {
    pub fn new(config: &PipelineConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            max_listings: config.max_listings_per_site,
        }
    }

    /// One listing per traded contract. Contract names repeat the market
    /// question for binary markets, so only distinct names get joined.
    fn to_listings(market: &PredictItMarket) -> Vec<RawListing> {
        market
            .contracts
            .iter()
            .filter_map(|contract| {
                let price = contract.last_trade_price.filter(|p| *p > 0.0)?;

                let name = if market.contracts.len() == 1 || contract.name == market.name {
                    market.name.clone()
                } else {
                    format!("{}: {}", market.name, contract.name)
                };

                Some(RawListing {
                    source: Platform::PredictIt,
                    name,
                    raw_price: format!("${:.2}", price),
                    probability: Some(price * 100.0),
                })
            })
            .collect()
    }
}

#[async_trait]
impl ListingSource for PredictItClient {
    async fn fetch_listings(&self) -> Result<Vec<RawListing>> {
        let resp = self.client.get(PREDICTIT_API).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!("PredictIt API error: {} - {}", status, text);
            return Ok(Vec::new());
        }

        let data: MarketData = resp.json().await?;
        let market_count = data.markets.len();

        let mut listings: Vec<RawListing> = data
            .markets
            .iter()
            .flat_map(Self::to_listings)
            .collect();
        listings.truncate(self.max_listings);

        debug!(
            "PredictIt: {} listings from {} markets",
            listings.len(),
            market_count
        );
        info!("PredictIt fetched {} listings", listings.len());
        Ok(listings)
    }

    fn platform(&self) -> Platform {
        Platform::PredictIt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_listings_naming_and_prices() {
        let market = PredictItMarket {
            id: 1,
            name: "Who will win the 2026 Senate race?".to_string(),
            contracts: vec![
                PredictItContract {
                    id: 10,
                    name: "Smith".to_string(),
                    last_trade_price: Some(0.62),
                },
                PredictItContract {
                    id: 11,
                    name: "Jones".to_string(),
                    last_trade_price: Some(0.38),
                },
                PredictItContract {
                    id: 12,
                    name: "Never traded".to_string(),
                    last_trade_price: None,
                },
            ],
        };

        let listings = PredictItClient::to_listings(&market);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].name, "Who will win the 2026 Senate race?: Smith");
        assert_eq!(listings[0].raw_price, "$0.62");
        assert!((listings[0].probability.unwrap() - 62.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_listings_binary_market_keeps_question() {
        let market = PredictItMarket {
            id: 2,
            name: "Will the bill pass?".to_string(),
            contracts: vec![PredictItContract {
                id: 20,
                name: "Will the bill pass?".to_string(),
                last_trade_price: Some(0.15),
            }],
        };

        let listings = PredictItClient::to_listings(&market);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Will the bill pass?");
    }

    #[test]
    fn test_market_data_deserialization() {
        let body = r#"{
            "markets": [
                {"id": 7057, "name": "Balance of power after 2026?",
                 "contracts": [
                    {"id": 1, "name": "Republican", "lastTradePrice": 0.47}
                 ]}
            ]
        }"#;

        let data: MarketData = serde_json::from_str(body).unwrap();
        assert_eq!(data.markets.len(), 1);
        assert_eq!(data.markets[0].contracts[0].last_trade_price, Some(0.47));
    }
}
