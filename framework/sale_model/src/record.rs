use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output captured from one harness invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRunResult {
    /// The display name of the scenario that was run
    pub scenario_name: String,
    /// Everything the harness wrote to stdout
    pub raw_text: String,
    /// Everything the harness wrote to stderr
    ///
    /// Only used for diagnostics, never parsed.
    pub stderr: String,
    /// The exit code of the harness process
    ///
    /// `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl RawRunResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Fixed-point scale of a raw integer metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// 10^18 units per ETH
    Wei,
    /// Reported in millions of units
    Millions,
    /// Plain number, no conversion
    Unit,
}

impl Scale {
    pub fn divisor(self) -> f64 {
        match self {
            Scale::Wei => 1e18,
            Scale::Millions => 1e6,
            Scale::Unit => 1.0,
        }
    }
}

/// The summary metrics that the report knows how to tabulate.
///
/// The harness may print more labels than these, and any of them may be missing. Every summary
/// table has one column per metric regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SummaryMetric {
    StartingPrice,
    FinalPrice,
    PriceIncrease,
    TokensSold,
    EthRaised,
    AvgPricePerToken,
}

impl SummaryMetric {
    /// All metrics in summary table column order
    pub const ALL: [SummaryMetric; 6] = [
        SummaryMetric::StartingPrice,
        SummaryMetric::FinalPrice,
        SummaryMetric::PriceIncrease,
        SummaryMetric::TokensSold,
        SummaryMetric::EthRaised,
        SummaryMetric::AvgPricePerToken,
    ];

    /// The label the harness prints for this metric
    pub fn label(self) -> &'static str {
        match self {
            SummaryMetric::StartingPrice => "Starting price",
            SummaryMetric::FinalPrice => "Final price",
            SummaryMetric::PriceIncrease => "Price increase (%)",
            SummaryMetric::TokensSold => "Tokens sold in sale",
            SummaryMetric::EthRaised => "Total ETH raised",
            SummaryMetric::AvgPricePerToken => "Effective avg price per token",
        }
    }

    /// The summary table column holding the raw value
    pub fn column(self) -> &'static str {
        match self {
            SummaryMetric::StartingPrice => "Initial Price (wei)",
            SummaryMetric::FinalPrice => "Final Price (wei)",
            SummaryMetric::PriceIncrease => "Price Increase (%)",
            SummaryMetric::TokensSold => "Tokens Sold",
            SummaryMetric::EthRaised => "ETH Raised (wei)",
            SummaryMetric::AvgPricePerToken => "Avg Price Per Token (wei)",
        }
    }

    pub fn scale(self) -> Scale {
        match self {
            SummaryMetric::PriceIncrease => Scale::Unit,
            SummaryMetric::TokensSold => Scale::Millions,
            _ => Scale::Wei,
        }
    }

    /// The derived column holding the human-unit value, if the metric has one
    pub fn human_column(self) -> Option<&'static str> {
        match self {
            SummaryMetric::StartingPrice => Some("Initial Price (ETH)"),
            SummaryMetric::FinalPrice => Some("Final Price (ETH)"),
            SummaryMetric::PriceIncrease => None,
            SummaryMetric::TokensSold => Some("Tokens Sold (millions)"),
            SummaryMetric::EthRaised => Some("ETH Raised (ETH)"),
            SummaryMetric::AvgPricePerToken => Some("Avg Price Per Token (ETH)"),
        }
    }
}

/// Summary metrics found in one run, keyed by the label printed by the harness.
///
/// Labels that were not printed are absent. Nothing is defaulted here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryRecord(BTreeMap<String, u128>);

impl SummaryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a metric. A label that is already present is overwritten and the old value returned.
    pub fn insert(&mut self, label: impl Into<String>, value: u128) -> Option<u128> {
        self.0.insert(label.into(), value)
    }

    pub fn get(&self, label: &str) -> Option<u128> {
        self.0.get(label).copied()
    }

    pub fn metric(&self, metric: SummaryMetric) -> Option<u128> {
        self.get(metric.label())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u128)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, u128)> for SummaryRecord {
    fn from_iter<I: IntoIterator<Item = (K, u128)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (label, value) in iter {
            record.insert(label, value);
        }
        record
    }
}

/// One purchase made during a simulated sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// 1-based position of the purchase within its scenario
    pub purchase_num: u64,
    pub eth_spent: u128,
    pub tokens_received: u128,
    pub current_price: u128,
}

impl PurchaseRecord {
    /// Tokens received per unit of ETH spent, NaN for a purchase that spent nothing.
    pub fn tokens_per_eth(&self) -> f64 {
        if self.eth_spent == 0 {
            return f64::NAN;
        }
        self.tokens_received as f64 / self.eth_spent as f64
    }
}

/// What the purchase scan found in one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PurchaseOutcome {
    /// The output did not mention any purchase
    NoneRecorded,
    /// Every purchase mentioned in the output was parsed
    Complete { count: usize },
    /// Some purchase blocks were malformed and dropped
    Incomplete { parsed: usize, dropped: usize },
}

/// Everything extracted from one scenario run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub summary: SummaryRecord,
    /// Purchases in the order they appear in the output
    pub purchases: Vec<PurchaseRecord>,
    /// How many purchase blocks were started in the output, complete or not
    pub purchase_markers: usize,
}

impl ScenarioResult {
    pub fn purchase_outcome(&self) -> PurchaseOutcome {
        let parsed = self.purchases.len();
        if self.purchase_markers == 0 && parsed == 0 {
            PurchaseOutcome::NoneRecorded
        } else if self.purchase_markers <= parsed {
            PurchaseOutcome::Complete { count: parsed }
        } else {
            PurchaseOutcome::Incomplete {
                parsed,
                dropped: self.purchase_markers - parsed,
            }
        }
    }
}
