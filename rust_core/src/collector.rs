//! Raw listing collection across platforms.

use crate::clients::ListingSource;
use crate::types::RawListing;
use futures_util::future::join_all;
use log::{info, warn};
use std::sync::Arc;

/// Fetch listings from every source concurrently and join the results into
/// one flat collection.
///
/// Sources run in parallel (bounded by the number of platforms) and share no
/// mutable state. A failing source degrades the run to partial data; it never
/// aborts it.
pub async fn collect_listings(sources: &[Arc<dyn ListingSource>]) -> Vec<RawListing> {
    let fetches = sources.iter().map(|source| {
        let source = Arc::clone(source);
        async move { (source.platform(), source.fetch_listings().await) }
    });

    let mut listings = Vec::new();
    for (platform, result) in join_all(fetches).await {
        match result {
            Ok(batch) => {
                info!("{}: collected {} listings", platform, batch.len());
                listings.extend(batch);
            }
            Err(e) => {
                warn!("{}: fetch failed, continuing with partial data: {}", platform, e);
            }
        }
    }

    listings
}
