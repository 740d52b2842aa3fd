//! Writes the artifacts of a batch into the output directory.
//!
//! Every artifact is written on its own. A failure is recorded and the remaining artifacts are
//! still attempted.

mod charts;
mod narrative;
mod table;

use crate::aggregator::{AggregateDataset, SkippedScenario};
use crate::derive::EnrichedDataset;
use crate::model::CrossScenarioStats;
use anyhow::Context;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use sale_model::{PurchaseOutcome, SummaryRecord};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub use charts::{chart_title, ChartRef, CHART_EXTENSION};
pub use narrative::PLAIN_TABLE_NOTE;
pub use table::plain_table;

pub const SUMMARY_CSV: &str = "scenario_summary.csv";
pub const PURCHASE_CSV: &str = "purchase_details.csv";
pub const NARRATIVE_MD: &str = "summary_report.md";
pub const REPORT_JSON: &str = "summary_report.json";

#[derive(Debug)]
pub struct ArtifactFailure {
    pub artifact: PathBuf,
    pub error: anyhow::Error,
}

/// What the emitter managed to write
#[derive(Debug, Default)]
pub struct ReportOutcome {
    pub written: Vec<PathBuf>,
    pub failures: Vec<ArtifactFailure>,
}

impl ReportOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Serialize)]
struct ScenarioReport<'a> {
    scenario_name: &'a str,
    summary: &'a SummaryRecord,
    purchase_outcome: PurchaseOutcome,
}

/// Machine-readable companion of the narrative
#[derive(Serialize)]
struct BatchReport<'a> {
    generated_at: String,
    scenarios: Vec<ScenarioReport<'a>>,
    skipped: &'a [SkippedScenario],
    stats: &'a CrossScenarioStats,
}

pub struct ReportEmitter {
    output_dir: PathBuf,
    generated_at: DateTime<Utc>,
}

impl ReportEmitter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            generated_at: Utc::now(),
        }
    }

    /// Stamp the report with a fixed time instead of the current time
    pub fn generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the tables, the JSON report and the narrative.
    pub fn emit(&self, dataset: &AggregateDataset, enriched: &EnrichedDataset) -> ReportOutcome {
        let mut outcome = ReportOutcome::default();

        if let Err(e) = std::fs::create_dir_all(&self.output_dir) {
            log::error!(
                "Failed to create output directory {}: {e}",
                self.output_dir.display()
            );
        }

        self.write_artifact(&mut outcome, SUMMARY_CSV, |file| {
            write_csv(file, &enriched.summary)
        });
        self.write_artifact(&mut outcome, PURCHASE_CSV, |file| {
            write_csv(file, &enriched.purchases)
        });
        self.write_artifact(&mut outcome, REPORT_JSON, |file| {
            let report = BatchReport {
                generated_at: self.generated_at.to_rfc3339(),
                scenarios: dataset
                    .results
                    .iter()
                    .map(|result| ScenarioReport {
                        scenario_name: &result.scenario_name,
                        summary: &result.summary,
                        purchase_outcome: result.purchase_outcome(),
                    })
                    .collect(),
                skipped: &dataset.skipped,
                stats: &enriched.stats,
            };
            serde_json::to_writer_pretty(file, &report)?;
            Ok(())
        });

        let charts = charts::discover_charts(&self.output_dir);
        self.write_artifact(&mut outcome, NARRATIVE_MD, |file| {
            let text = narrative::Narrative {
                summary: &enriched.summary,
                stats: &enriched.stats,
                results: &dataset.results,
                skipped: &dataset.skipped,
                charts: &charts,
                generated_at: self.generated_at,
            }
            .render()?;
            file.write_all(text.as_bytes())?;
            Ok(())
        });

        outcome
    }

    fn write_artifact<F>(&self, outcome: &mut ReportOutcome, name: &str, write: F)
    where
        F: FnOnce(&mut File) -> anyhow::Result<()>,
    {
        let path = self.output_dir.join(name);
        let result = File::create(&path)
            .with_context(|| format!("Create {}", path.display()))
            .and_then(|mut file| write(&mut file));

        match result {
            Ok(()) => {
                log::info!("Wrote {}", path.display());
                outcome.written.push(path);
            }
            Err(error) => {
                log::error!("Failed to write {}: {error:?}", path.display());
                outcome.failures.push(ArtifactFailure {
                    artifact: path,
                    error,
                });
            }
        }
    }
}

fn write_csv(file: &mut File, frame: &DataFrame) -> anyhow::Result<()> {
    let mut frame = frame.clone();
    CsvWriter::new(file)
        .include_header(true)
        .finish(&mut frame)?;
    Ok(())
}

/// Write a table to a CSV file, replacing any existing file.
pub fn write_csv_file(path: &Path, frame: &DataFrame) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Create {}", parent.display()))?;
    }
    let mut file = File::create(path).with_context(|| format!("Create {}", path.display()))?;
    write_csv(&mut file, frame).with_context(|| format!("Write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::SkipReason;
    use crate::derive::enrich;
    use crate::frame::{purchase_frame, summary_frame};
    use chrono::TimeZone;
    use sale_model::{PurchaseRecord, ScenarioResult};

    fn dataset() -> AggregateDataset {
        let results = vec![ScenarioResult {
            scenario_name: "Standard".to_string(),
            summary: [
                ("Starting price", 100_000_000_000_000u128),
                ("Final price", 400_000_000_000_000),
                ("Price increase (%)", 300),
                ("Tokens sold in sale", 1_000_000_000_000_000_000_000),
                ("Total ETH raised", 50_000_000_000_000_000_000),
                ("Effective avg price per token", 50),
            ]
            .into_iter()
            .collect(),
            purchases: vec![PurchaseRecord {
                purchase_num: 1,
                eth_spent: 1000,
                tokens_received: 20,
                current_price: 100,
            }],
            purchase_markers: 1,
        }];
        AggregateDataset {
            summary: summary_frame(&results).unwrap(),
            purchases: purchase_frame(&results).unwrap(),
            results,
            skipped: vec![SkippedScenario {
                scenario_name: "Broken".to_string(),
                reason: SkipReason::LaunchFailed("no such file".to_string()),
            }],
        }
    }

    fn emitter(dir: &Path) -> ReportEmitter {
        ReportEmitter::new(dir).generated_at(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn writes_every_artifact() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("analysis_output");
        let dataset = dataset();
        let enriched = enrich(&dataset)?;

        let outcome = emitter(&out).emit(&dataset, &enriched);

        assert!(outcome.is_complete(), "{:?}", outcome.failures);
        assert_eq!(4, outcome.written.len());

        let summary_csv = std::fs::read_to_string(out.join(SUMMARY_CSV))?;
        let header = summary_csv.lines().next().unwrap();
        assert!(header.starts_with("Scenario,Initial Price (wei),"));
        assert!(header.contains("ETH Raised (ETH)"));
        assert!(summary_csv.contains("Standard,100000000000000,400000000000000,300,"));

        let purchase_csv = std::fs::read_to_string(out.join(PURCHASE_CSV))?;
        assert!(purchase_csv.starts_with(
            "scenario,purchase_num,eth_spent,tokens_received,current_price,eth_spent_in_eth,"
        ));
        assert_eq!(2, purchase_csv.lines().count());

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join(REPORT_JSON))?)?;
        assert_eq!("Standard", report["scenarios"][0]["scenario_name"]);
        assert_eq!(300, report["scenarios"][0]["summary"]["Price increase (%)"]);
        assert_eq!("Broken", report["skipped"][0]["scenario_name"]);

        let narrative = std::fs::read_to_string(out.join(NARRATIVE_MD))?;
        assert!(narrative.contains("- Total ETH raised (average): 50.0000 ETH"));
        assert!(narrative.contains("- Broken: harness could not be run: no such file"));
        Ok(())
    }

    #[test]
    fn failed_artifact_does_not_stop_the_others() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        // A directory in the way of the summary table
        std::fs::create_dir(dir.path().join(SUMMARY_CSV))?;
        let dataset = dataset();
        let enriched = enrich(&dataset)?;

        let outcome = emitter(dir.path()).emit(&dataset, &enriched);

        assert_eq!(1, outcome.failures.len());
        assert_eq!(dir.path().join(SUMMARY_CSV), outcome.failures[0].artifact);
        assert_eq!(3, outcome.written.len());
        assert!(dir.path().join(NARRATIVE_MD).is_file());
        Ok(())
    }

    #[test]
    fn narrative_links_existing_charts() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("price_progression.png"), b"png")?;
        let dataset = dataset();
        let enriched = enrich(&dataset)?;

        emitter(dir.path()).emit(&dataset, &enriched);

        let narrative = std::fs::read_to_string(dir.path().join(NARRATIVE_MD))?;
        assert!(narrative.contains("![Price Progression](price_progression.png)"));
        Ok(())
    }

    #[test]
    fn emitting_twice_gives_identical_tables() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let dataset = dataset();
        let enriched = enrich(&dataset)?;

        emitter(dir.path()).emit(&dataset, &enriched);
        let first = std::fs::read(dir.path().join(SUMMARY_CSV))?;
        emitter(dir.path()).emit(&dataset, &enriched);
        let second = std::fs::read(dir.path().join(SUMMARY_CSV))?;

        assert_eq!(first, second);
        Ok(())
    }
}
