//! Platform listing sources.
//!
//! Each client maps one platform's public market feed into `RawListing`
//! values. Scraping mechanics stay behind the `ListingSource` trait so the
//! rest of the pipeline never touches a concrete API.

use crate::config::PipelineConfig;
use crate::types::{Platform, RawListing};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub mod kalshi;
pub mod polymarket;
pub mod predictit;

pub use kalshi::KalshiClient;
pub use polymarket::PolymarketClient;
pub use predictit::PredictItClient;

/// A fetchable source of market listings.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch the platform's current listings.
    async fn fetch_listings(&self) -> Result<Vec<RawListing>>;

    /// Platform identity for logging and reporting.
    fn platform(&self) -> Platform;
}

/// Build the default set of sources, one per supported platform.
pub fn default_sources(config: &PipelineConfig) -> Vec<Arc<dyn ListingSource>> {
    vec![
        Arc::new(PolymarketClient::new(config)),
        Arc::new(KalshiClient::new(config)),
        Arc::new(PredictItClient::new(config)),
    ]
}
