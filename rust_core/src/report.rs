//! CSV report emission.
//!
//! Output shape follows the unified report contract: a leading comment block
//! of summary statistics, then one fully-quoted row per unified product.

use crate::types::{Platform, UnifiedProduct};
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Column order of the unified report.
pub const CSV_HEADER: &[&str] = &[
    "unified_name",
    "source_products",
    "average_price",
    "price_variance",
    "confidence_level",
    "source_count",
    "sources",
    "category",
    "min_price",
    "max_price",
];

/// Aggregate counts shown in the leading comment block.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub total_products: usize,
    pub average_confidence: f64,
    pub high_confidence_products: usize,
    pub multi_source_products: usize,
}

impl ReportSummary {
    pub fn from_products(products: &[UnifiedProduct]) -> Self {
        let total = products.len();
        let average_confidence = if total == 0 {
            0.0
        } else {
            products.iter().map(|p| p.confidence_level).sum::<f64>() / total as f64
        };

        Self {
            total_products: total,
            average_confidence,
            high_confidence_products: products
                .iter()
                .filter(|p| p.confidence_level > 80.0)
                .count(),
            multi_source_products: products.iter().filter(|p| p.source_count > 1).count(),
        }
    }
}

/// Quote a field, doubling embedded quotes. Every field is quoted so commas
/// and semicolons inside values never break a row.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn format_row(product: &UnifiedProduct) -> String {
    let source_products = product.source_products().join("; ");
    let sources = product
        .sources()
        .iter()
        .map(Platform::as_str)
        .collect::<Vec<_>>()
        .join("; ");

    let fields = [
        product.unified_name.clone(),
        source_products,
        format!("{:.4}", product.average_price),
        format!("{:.4}", product.price_variance),
        format!("{:.1}", product.confidence_level),
        product.source_count.to_string(),
        sources,
        product.category.clone(),
        format!("{:.4}", product.min_price),
        format!("{:.4}", product.max_price),
    ];

    fields
        .iter()
        .map(|f| quote(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render the full report: summary comment block, header, rows.
pub fn render_csv(products: &[UnifiedProduct], summary: &ReportSummary) -> String {
    let mut out = String::new();

    out.push_str("# Summary Statistics\n");
    out.push_str(&format!("# Total Products: {}\n", summary.total_products));
    out.push_str(&format!(
        "# Average Confidence: {:.2}%\n",
        summary.average_confidence
    ));
    out.push_str(&format!(
        "# High Confidence Products (>80%): {}\n",
        summary.high_confidence_products
    ));
    out.push_str(&format!(
        "# Multi-source Products: {}\n",
        summary.multi_source_products
    ));
    out.push_str("#\n");

    out.push_str(&CSV_HEADER.join(","));
    out.push('\n');

    for product in products {
        out.push_str(&format_row(product));
        out.push('\n');
    }

    out
}

/// Write the unified report. An I/O failure here is fatal to the run; the
/// computed results must never be lost silently.
pub fn write_report(products: &[UnifiedProduct], path: &Path) -> Result<ReportSummary> {
    let summary = ReportSummary::from_products(products);

    std::fs::write(path, render_csv(products, &summary))
        .with_context(|| format!("failed to write report to {}", path.display()))?;

    info!("Wrote {} products to {}", products.len(), path.display());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Platform, RawListing};

    fn product(name: &str, confidence: f64, members: Vec<RawListing>) -> UnifiedProduct {
        let mut platforms = Vec::new();
        for m in &members {
            if !platforms.contains(&m.source) {
                platforms.push(m.source);
            }
        }
        UnifiedProduct {
            unified_name: name.to_string(),
            source_count: platforms.len(),
            members,
            average_price: 0.625,
            price_variance: 0.0707,
            confidence_level: confidence,
            category: "politics".to_string(),
            min_price: 0.575,
            max_price: 0.675,
        }
    }

    fn election_product() -> UnifiedProduct {
        product(
            "US Presidential Election",
            87.5,
            vec![
                RawListing::new(Platform::Polymarket, "Trump Victory Market", "57.5%"),
                RawListing::new(Platform::Kalshi, "Biden Win Probability", "67.5%"),
            ],
        )
    }

    #[test]
    fn test_summary_counts() {
        let products = vec![
            election_product(),
            product(
                "Lone market",
                100.0,
                vec![RawListing::new(Platform::Kalshi, "Lone market", "41¢")],
            ),
            product(
                "Weak merge",
                55.0,
                vec![
                    RawListing::new(Platform::Kalshi, "A", "41¢"),
                    RawListing::new(Platform::PredictIt, "B", "$0.40"),
                ],
            ),
        ];

        let summary = ReportSummary::from_products(&products);
        assert_eq!(summary.total_products, 3);
        assert!((summary.average_confidence - 80.8333333).abs() < 1e-6);
        assert_eq!(summary.high_confidence_products, 2);
        assert_eq!(summary.multi_source_products, 2);
    }

    #[test]
    fn test_summary_of_empty_report() {
        let summary = ReportSummary::from_products(&[]);
        assert_eq!(summary.total_products, 0);
        assert_eq!(summary.average_confidence, 0.0);
    }

    #[test]
    fn test_render_layout() {
        let products = vec![election_product()];
        let summary = ReportSummary::from_products(&products);
        let csv = render_csv(&products, &summary);

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "# Summary Statistics");
        assert_eq!(lines[1], "# Total Products: 1");
        assert_eq!(lines[2], "# Average Confidence: 87.50%");
        assert_eq!(lines[3], "# High Confidence Products (>80%): 1");
        assert_eq!(lines[4], "# Multi-source Products: 1");
        assert_eq!(lines[5], "#");
        assert_eq!(lines[6], CSV_HEADER.join(","));
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_row_formatting_and_quoting() {
        let products = vec![election_product()];
        let summary = ReportSummary::from_products(&products);
        let csv = render_csv(&products, &summary);

        let row = csv.lines().last().unwrap();
        assert_eq!(
            row,
            "\"US Presidential Election\",\
             \"Trump Victory Market; Biden Win Probability\",\
             \"0.6250\",\"0.0707\",\"87.5\",\"2\",\
             \"Polymarket; Kalshi\",\"politics\",\"0.5750\",\"0.6750\""
        );
    }

    #[test]
    fn test_embedded_commas_and_quotes_survive() {
        let p = product(
            "Winner: Smith, Jones, or \"Other\"?",
            90.0,
            vec![RawListing::new(
                Platform::PredictIt,
                "Winner: Smith, Jones, or \"Other\"?",
                "$0.47",
            )],
        );
        let summary = ReportSummary::from_products(std::slice::from_ref(&p));
        let csv = render_csv(std::slice::from_ref(&p), &summary);

        let row = csv.lines().last().unwrap();
        assert!(row.starts_with("\"Winner: Smith, Jones, or \"\"Other\"\"?\","));
    }

    #[test]
    fn test_write_report_roundtrip() {
        let dir = std::env::temp_dir();
        let path = dir.join("unifier_report_test.csv");

        let products = vec![election_product()];
        let summary = write_report(&products, &path).unwrap();
        assert_eq!(summary.total_products, 1);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("unified_name,source_products"));
        assert!(written.contains("\"0.6250\""));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_write_report_failure_is_fatal() {
        let products = vec![election_product()];
        let missing_dir = Path::new("/nonexistent-dir-for-test/report.csv");
        assert!(write_report(&products, missing_dir).is_err());
    }
}
