use anyhow::Result;
use dotenv::dotenv;
use log::{info, warn};
use std::sync::Arc;
use unifier_rust_core::clients::default_sources;
use unifier_rust_core::llm::{Inference, OllamaClient};
use unifier_rust_core::{
    aggregate, collect_listings, write_report, PipelineConfig, ProductMatcher,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    info!("Starting Market Unifier...");

    let config = PipelineConfig::from_env();
    let sources = default_sources(&config);

    // 1. Collect raw listings from every platform (concurrent, degrades to
    //    partial data on per-site failure).
    let listings = collect_listings(&sources).await;
    if listings.is_empty() {
        warn!("No listings collected from any platform; the report will be empty");
    }
    info!(
        "Collected {} listings from {} platforms",
        listings.len(),
        sources.len()
    );

    // 2. Partition into unified products. LLM first, lexical fallback.
    let llm: Option<Arc<dyn Inference>> = if config.llm_enabled {
        Some(Arc::new(OllamaClient::new(&config)))
    } else {
        warn!("LLM disabled via environment, matching lexically only");
        None
    };
    let matcher = ProductMatcher::new(llm, config.matcher_config());
    let groups = matcher.partition(&listings).await;
    info!(
        "Matched {} listings into {} unified products",
        listings.len(),
        groups.len()
    );

    // 3. Aggregate statistics per group.
    let products = aggregate(groups);

    // 4. Write the report. Unlike every step above, a failure here is fatal.
    let summary = write_report(&products, &config.output_csv)?;

    info!(
        "Run complete: {} products, average confidence {:.2}%, {} high-confidence, {} multi-source -> {}",
        summary.total_products,
        summary.average_confidence,
        summary.high_confidence_products,
        summary.multi_source_products,
        config.output_csv.display()
    );

    Ok(())
}
