use crate::model::{ColumnStats, CrossScenarioStats};
use anyhow::Context;
use polars::prelude::*;
use sale_model::SummaryMetric;
use std::collections::BTreeMap;

pub(crate) fn column_stats(frame: &DataFrame, column: &str) -> anyhow::Result<ColumnStats> {
    let value_column = frame
        .column(column)?
        .cast(&DataType::Float64)
        .with_context(|| format!("Cast {column}"))?;
    let value_series = value_column.as_materialized_series();

    let mean = value_series.mean().context("Mean")?;
    let min = value_series
        .min::<f64>()
        .context("Min")?
        .context("Missing min")?;
    let max = value_series
        .max::<f64>()
        .context("Max")?
        .context("Missing max")?;

    Ok(ColumnStats { min, max, mean })
}

/// Min, max and mean of every human-unit summary column, plus the price increase.
///
/// Only rows present in the frame are considered.
pub(crate) fn cross_scenario_stats(summary: &DataFrame) -> anyhow::Result<CrossScenarioStats> {
    let mut columns = BTreeMap::new();
    for metric in SummaryMetric::ALL {
        let column = metric.human_column().unwrap_or(metric.column());
        let stats = column_stats(summary, column).with_context(|| format!("Stats for {column}"))?;
        columns.insert(column.to_string(), stats);
    }

    Ok(CrossScenarioStats {
        scenario_count: summary.height(),
        columns,
    })
}
