use sale_model::SummaryMetric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ColumnStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Statistics of the human-unit summary columns across the scenarios in a batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrossScenarioStats {
    /// Number of scenario rows the statistics were computed over
    pub scenario_count: usize,
    /// Keyed by summary table column name
    pub columns: BTreeMap<String, ColumnStats>,
}

impl CrossScenarioStats {
    pub fn get(&self, column: &str) -> Option<&ColumnStats> {
        self.columns.get(column)
    }

    /// Statistics for a metric, over its human-unit column where it has one
    pub fn metric(&self, metric: SummaryMetric) -> Option<&ColumnStats> {
        self.get(metric.human_column().unwrap_or(metric.column()))
    }
}
