use crate::aggregator::AggregateDataset;
use crate::analyze::cross_scenario_stats;
use crate::frame::{CURRENT_PRICE, ETH_SPENT, TOKENS_RECEIVED};
use crate::model::CrossScenarioStats;
use anyhow::Context;
use polars::prelude::*;
use sale_model::{Scale, SummaryMetric};

pub const ETH_SPENT_IN_ETH: &str = "eth_spent_in_eth";
pub const TOKENS_IN_MILLIONS: &str = "tokens_in_millions";
pub const PRICE_IN_ETH: &str = "price_in_eth";
pub const TOKENS_PER_ETH: &str = "tokens_per_eth";

/// The raw tables with human-unit columns added, and the statistics across scenarios.
#[derive(Debug, Clone)]
pub struct EnrichedDataset {
    pub summary: DataFrame,
    pub purchases: DataFrame,
    pub stats: CrossScenarioStats,
}

/// Derive human-unit columns and cross-scenario statistics. The input dataset is left untouched.
pub fn enrich(dataset: &AggregateDataset) -> anyhow::Result<EnrichedDataset> {
    let summary = derive_summary(&dataset.summary).context("Derive summary columns")?;
    let purchases = derive_purchases(&dataset.purchases).context("Derive purchase columns")?;
    let stats = cross_scenario_stats(&summary).context("Cross-scenario stats")?;

    Ok(EnrichedDataset {
        summary,
        purchases,
        stats,
    })
}

fn scaled(column: &str, scale: Scale) -> Expr {
    col(column).cast(DataType::Float64) / lit(scale.divisor())
}

/// Add a human-unit column next to every scaled summary metric.
pub fn derive_summary(summary: &DataFrame) -> PolarsResult<DataFrame> {
    let derived = SummaryMetric::ALL
        .into_iter()
        .filter_map(|metric| {
            metric
                .human_column()
                .map(|human| scaled(metric.column(), metric.scale()).alias(human))
        })
        .collect::<Vec<_>>();

    summary.clone().lazy().with_columns(derived).collect()
}

/// Add human-unit columns and the tokens received per ETH to the purchase table.
///
/// A purchase that spent no ETH has no meaningful ratio, its `tokens_per_eth` is NaN.
pub fn derive_purchases(purchases: &DataFrame) -> PolarsResult<DataFrame> {
    let eth_spent = col(ETH_SPENT).cast(DataType::Float64);
    let tokens_received = col(TOKENS_RECEIVED).cast(DataType::Float64);

    purchases
        .clone()
        .lazy()
        .with_columns([
            scaled(ETH_SPENT, Scale::Wei).alias(ETH_SPENT_IN_ETH),
            scaled(TOKENS_RECEIVED, Scale::Millions).alias(TOKENS_IN_MILLIONS),
            scaled(CURRENT_PRICE, Scale::Wei).alias(PRICE_IN_ETH),
            when(eth_spent.clone().eq(lit(0.0)))
                .then(lit(f64::NAN))
                .otherwise(tokens_received / eth_spent)
                .alias(TOKENS_PER_ETH),
        ])
        .collect()
}
