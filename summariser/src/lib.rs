//! Runs bonding curve sale scenarios through an external test harness, extracts the sale summary
//! and purchase history from each run's output and reports on them side by side.

use anyhow::Context;
use sale_harness::Harness;
use sale_model::ScenarioSpec;
use std::path::PathBuf;

mod aggregator;
mod analyze;
pub mod cli;
pub mod curve;
mod derive;
mod frame;
pub mod model;
mod parse;
pub mod report;

pub use aggregator::{
    AggregateDataset, AggregateError, ScenarioAggregator, SkipReason, SkippedScenario,
};
pub use derive::{
    derive_purchases, derive_summary, enrich, EnrichedDataset, ETH_SPENT_IN_ETH, PRICE_IN_ETH,
    TOKENS_IN_MILLIONS, TOKENS_PER_ETH,
};
pub use frame::{CURRENT_PRICE, ETH_SPENT, PURCHASE_NUM, PURCHASE_SCENARIO, SCENARIO, TOKENS_RECEIVED};
pub use parse::{parse_output, OutputGrammar, ParsedOutput, SUMMARY_CLOSE, SUMMARY_OPEN};
pub use report::{ArtifactFailure, ReportEmitter, ReportOutcome};

/// Directory under the output directory that keeps raw harness output
pub const RAW_OUTPUT_DIR: &str = "raw_output";

/// Output directory used when none is configured
pub const DEFAULT_OUTPUT_DIR: &str = "./analysis_output";

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub output_dir: PathBuf,
    /// Keep each scenario's raw output under [RAW_OUTPUT_DIR]
    pub keep_raw_output: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            keep_raw_output: false,
        }
    }
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub dataset: AggregateDataset,
    pub enriched: EnrichedDataset,
    pub report: ReportOutcome,
}

/// Run, parse, aggregate, derive and report on a batch of scenarios.
///
/// Fails if no scenario produced a usable result. Artifacts that cannot be written are listed in
/// the returned [ReportOutcome] rather than failing the pipeline.
pub fn run_pipeline<H: Harness>(
    harness: H,
    scenarios: &[ScenarioSpec],
    options: &PipelineOptions,
) -> anyhow::Result<PipelineOutput> {
    let mut aggregator = ScenarioAggregator::new(harness);
    if options.keep_raw_output {
        aggregator = aggregator.with_raw_output_dir(options.output_dir.join(RAW_OUTPUT_DIR));
    }

    let dataset = aggregator.aggregate(scenarios)?;
    let enriched = enrich(&dataset).context("Derive metrics")?;
    let report = ReportEmitter::new(&options.output_dir).emit(&dataset, &enriched);

    Ok(PipelineOutput {
        dataset,
        enriched,
        report,
    })
}
