use super::charts::ChartRef;
use super::table::render_table;
use crate::aggregator::SkippedScenario;
use crate::model::{ColumnStats, CrossScenarioStats};
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use sale_model::{PurchaseOutcome, ScenarioResult, SummaryMetric};
use std::fmt::Write;

pub const TITLE: &str = "# Bonding Curve Sale Scenario Analysis";
pub const PLAIN_TABLE_NOTE: &str =
    "*Table displayed as plain text because markdown table rendering is not available*";

pub(crate) struct Narrative<'a> {
    pub summary: &'a DataFrame,
    pub stats: &'a CrossScenarioStats,
    pub results: &'a [ScenarioResult],
    pub skipped: &'a [SkippedScenario],
    pub charts: &'a [ChartRef],
    pub generated_at: DateTime<Utc>,
}

fn range(stats: Option<&ColumnStats>) -> String {
    match stats {
        Some(s) => format!("{:.6} ETH to {:.6} ETH", s.min, s.max),
        None => "n/a".to_string(),
    }
}

fn mean(stats: Option<&ColumnStats>, precision: usize) -> String {
    match stats {
        Some(s) => format!("{:.precision$}", s.mean),
        None => "n/a".to_string(),
    }
}

fn outcome_line(result: &ScenarioResult) -> String {
    let detail = match result.purchase_outcome() {
        PurchaseOutcome::NoneRecorded => "no purchases recorded".to_string(),
        PurchaseOutcome::Complete { count: 1 } => "1 purchase".to_string(),
        PurchaseOutcome::Complete { count } => format!("{count} purchases"),
        PurchaseOutcome::Incomplete { parsed, dropped } => {
            format!("{parsed} purchases parsed, {dropped} incomplete purchase blocks dropped")
        }
    };
    format!("- {}: {detail}", result.scenario_name)
}

impl Narrative<'_> {
    pub(crate) fn render(&self) -> anyhow::Result<String> {
        let mut out = String::new();

        writeln!(out, "{TITLE}\n")?;
        writeln!(
            out,
            "_Generated {}_\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;

        writeln!(out, "## Scenario Summary\n")?;
        let table = render_table(self.summary)?;
        out.push_str(&table.text);
        if table.plain_fallback {
            write!(out, "\n\n{PLAIN_TABLE_NOTE}")?;
        }

        writeln!(out, "\n\n## Key Metrics\n")?;
        let stats = self.stats;
        writeln!(out, "### Price Comparison\n")?;
        writeln!(
            out,
            "- Starting price range: {}",
            range(stats.metric(SummaryMetric::StartingPrice))
        )?;
        writeln!(
            out,
            "- Final price range: {}",
            range(stats.metric(SummaryMetric::FinalPrice))
        )?;
        writeln!(
            out,
            "- Average price increase: {}%\n",
            mean(stats.metric(SummaryMetric::PriceIncrease), 2)
        )?;

        writeln!(out, "### Sale Performance\n")?;
        writeln!(
            out,
            "- Total ETH raised (average): {} ETH",
            mean(stats.metric(SummaryMetric::EthRaised), 4)
        )?;
        writeln!(
            out,
            "- Tokens sold (average): {} million",
            mean(stats.metric(SummaryMetric::TokensSold), 6)
        )?;

        writeln!(out, "\n## Purchase Data\n")?;
        for result in self.results {
            writeln!(out, "{}", outcome_line(result))?;
        }

        if !self.skipped.is_empty() {
            writeln!(out, "\n## Skipped Scenarios\n")?;
            for skipped in self.skipped {
                writeln!(out, "- {}: {}", skipped.scenario_name, skipped.reason)?;
            }
        }

        if !self.charts.is_empty() {
            writeln!(out, "\n## Graphs\n")?;
            for chart in self.charts {
                writeln!(out, "### {}\n", chart.title)?;
                writeln!(out, "![{}]({})\n", chart.title, chart.file_name)?;
            }
        }

        Ok(out)
    }
}
