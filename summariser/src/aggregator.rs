use crate::frame::{purchase_frame, summary_frame};
use crate::parse::OutputGrammar;
use polars::prelude::{DataFrame, PolarsError};
use sale_harness::{Harness, RECORDING_EXTENSION};
use sale_model::{RawRunResult, ScenarioResult, ScenarioSpec};
use serde::Serialize;
use std::path::PathBuf;

/// Why a scenario contributed nothing to the aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum SkipReason {
    #[error("harness could not be run: {0}")]
    LaunchFailed(String),
    #[error("no sale summary in output (exit code: {exit_code:?})")]
    NoSummary { exit_code: Option<i32> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedScenario {
    pub scenario_name: String,
    pub reason: SkipReason,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("No scenario produced a usable result ({} skipped)", .skipped.len())]
    EmptyBatch { skipped: Vec<SkippedScenario> },
    #[error("Failed to build table: {0}")]
    Frame(#[from] PolarsError),
}

/// The raw tables for a batch.
///
/// Row order follows scenario declaration order. The tables are never modified after they are
/// built; derived values go into a separate frame.
#[derive(Debug, Clone)]
pub struct AggregateDataset {
    /// One row per scenario that produced a summary
    pub summary: DataFrame,
    /// One row per purchase, tagged with its scenario
    pub purchases: DataFrame,
    /// The parsed results the tables were built from
    pub results: Vec<ScenarioResult>,
    pub skipped: Vec<SkippedScenario>,
}

/// Runs a batch of scenarios one after another and collects what could be parsed.
pub struct ScenarioAggregator<H> {
    harness: H,
    grammar: OutputGrammar,
    raw_output_dir: Option<PathBuf>,
}

impl<H: Harness> ScenarioAggregator<H> {
    pub fn new(harness: H) -> Self {
        Self {
            harness,
            grammar: OutputGrammar::default(),
            raw_output_dir: None,
        }
    }

    /// Parse output with a different grammar
    pub fn with_grammar(mut self, grammar: OutputGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    /// Keep each scenario's raw output in this directory
    pub fn with_raw_output_dir(mut self, dir: PathBuf) -> Self {
        self.raw_output_dir = Some(dir);
        self
    }

    /// Run every scenario in order and tabulate the results.
    ///
    /// A scenario whose harness cannot be launched, or whose output has no summary, is skipped.
    /// The batch only fails if nothing at all could be used.
    pub fn aggregate(&self, specs: &[ScenarioSpec]) -> Result<AggregateDataset, AggregateError> {
        let mut results = Vec::with_capacity(specs.len());
        let mut skipped = Vec::new();

        for spec in specs {
            log::info!("Running scenario: {}", spec.name);
            match self.run_scenario(spec) {
                Ok(result) => results.push(result),
                Err(reason) => {
                    log::warn!("Skipping scenario '{}': {}", spec.name, reason);
                    skipped.push(SkippedScenario {
                        scenario_name: spec.name.clone(),
                        reason,
                    });
                }
            }
        }

        if results.is_empty() {
            return Err(AggregateError::EmptyBatch { skipped });
        }
        log::info!(
            "Parsed {} of {} scenarios",
            results.len(),
            specs.len()
        );

        Ok(AggregateDataset {
            summary: summary_frame(&results)?,
            purchases: purchase_frame(&results)?,
            results,
            skipped,
        })
    }

    fn run_scenario(&self, spec: &ScenarioSpec) -> Result<ScenarioResult, SkipReason> {
        let raw = self
            .harness
            .run(spec)
            .map_err(|e| SkipReason::LaunchFailed(e.to_string()))?;

        if let Some(dir) = &self.raw_output_dir {
            self.keep_raw_output(dir, spec, &raw);
        }

        let parsed = self
            .grammar
            .parse(&raw.raw_text)
            .ok_or(SkipReason::NoSummary {
                exit_code: raw.exit_code,
            })?;
        if !raw.success() {
            log::warn!(
                "Scenario '{}' exited with {:?} but its output was parsed",
                spec.name,
                raw.exit_code
            );
        }

        Ok(parsed.into_result(spec.name.clone()))
    }

    fn keep_raw_output(&self, dir: &std::path::Path, spec: &ScenarioSpec, raw: &RawRunResult) {
        let path = dir.join(format!("{}.{}", spec.artifact_stem(), RECORDING_EXTENSION));
        let written = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, &raw.raw_text));
        match written {
            Ok(()) => log::debug!("Kept raw output for '{}' at {}", spec.name, path.display()),
            Err(e) => log::warn!(
                "Failed to keep raw output for '{}' at {}: {e}",
                spec.name,
                path.display()
            ),
        }
    }
}
