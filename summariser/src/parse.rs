use regex::Regex;
use sale_model::{PurchaseRecord, ScenarioResult, SummaryRecord};
use std::sync::LazyLock;

/// Opens the summary section of the harness output.
pub const SUMMARY_OPEN: &str = "------- TOKEN SALE SUMMARY -------";
/// Starts the section that follows the summary, which closes the summary.
pub const SUMMARY_CLOSE: &str = "------- BONDING CURVE INTEGRITY";

static V1: LazyLock<OutputGrammar> = LazyLock::new(OutputGrammar::v1);

/// What could be read from one run's output. The scenario name is attached by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOutput {
    pub summary: SummaryRecord,
    pub purchases: Vec<PurchaseRecord>,
    /// Number of `Purchase #:` markers seen, whether or not their block was complete
    pub purchase_markers: usize,
}

impl ParsedOutput {
    pub fn into_result(self, scenario_name: impl Into<String>) -> ScenarioResult {
        ScenarioResult {
            scenario_name: scenario_name.into(),
            summary: self.summary,
            purchases: self.purchases,
            purchase_markers: self.purchase_markers,
        }
    }
}

/// The text contract of the harness output.
///
/// - The summary is the text between the open marker and the close marker. Inside it, every
///   `label: integer` pair is a metric. A label is everything up to the colon, trimmed. A label
///   seen twice keeps its last value.
/// - A purchase is the sequence `Purchase #:`, `ETH spent:`, `Tokens received:`,
///   `Current price:`, each followed by an integer, with only whitespace between them. It may
///   appear anywhere in the output. Blocks missing a field are skipped.
#[derive(Debug, Clone)]
pub struct OutputGrammar {
    summary_block: Regex,
    metric: Regex,
    purchase_block: Regex,
    purchase_marker: Regex,
}

impl OutputGrammar {
    /// Build a grammar for the given summary markers
    pub fn new(summary_open: &str, summary_close: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            summary_block: Regex::new(&format!(
                r"(?s){}\s*(.*?){}",
                regex::escape(summary_open),
                regex::escape(summary_close)
            ))?,
            metric: Regex::new(r"([^:]+):\s*(\d+)")?,
            purchase_block: Regex::new(
                r"Purchase #:\s*(\d+)\s*ETH spent:\s*(\d+)\s*Tokens received:\s*(\d+)\s*Current price:\s*(\d+)",
            )?,
            purchase_marker: Regex::new(r"Purchase #:")?,
        })
    }

    /// The grammar of the current harness output
    pub fn v1() -> Self {
        Self::new(SUMMARY_OPEN, SUMMARY_CLOSE).expect("Built-in output grammar must compile")
    }

    /// Extract the summary and purchases from raw harness output.
    ///
    /// Returns `None` only if the summary section cannot be found. Output with a summary and no
    /// purchases is a valid result.
    pub fn parse(&self, raw_text: &str) -> Option<ParsedOutput> {
        let Some(block) = self
            .summary_block
            .captures(raw_text)
            .and_then(|captures| captures.get(1))
        else {
            log::debug!(
                "No summary section in {} bytes of output",
                raw_text.len()
            );
            return None;
        };

        let summary = self.parse_summary(block.as_str());
        let purchases = self.parse_purchases(raw_text);
        let purchase_markers = self.purchase_marker.find_iter(raw_text).count();
        log::debug!(
            "Found {} summary metrics and {} purchases ({} purchase markers)",
            summary.len(),
            purchases.len(),
            purchase_markers
        );

        Some(ParsedOutput {
            summary,
            purchases,
            purchase_markers,
        })
    }

    fn parse_summary(&self, block: &str) -> SummaryRecord {
        let mut summary = SummaryRecord::new();
        for captures in self.metric.captures_iter(block) {
            let label = captures[1].trim();
            match captures[2].parse::<u128>() {
                Ok(value) => {
                    if let Some(previous) = summary.insert(label, value) {
                        log::debug!("Summary label '{label}' repeated, {previous} replaced by {value}");
                    }
                }
                Err(e) => log::warn!("Skipping summary metric '{label}': {e}"),
            }
        }
        summary
    }

    fn parse_purchases(&self, raw_text: &str) -> Vec<PurchaseRecord> {
        self.purchase_block
            .captures_iter(raw_text)
            .filter_map(|captures| {
                let record = PurchaseRecord {
                    purchase_num: captures[1].parse().ok()?,
                    eth_spent: captures[2].parse().ok()?,
                    tokens_received: captures[3].parse().ok()?,
                    current_price: captures[4].parse().ok()?,
                };
                Some(record)
            })
            .collect()
    }
}

impl Default for OutputGrammar {
    fn default() -> Self {
        V1.clone()
    }
}

/// Parse harness output with the current grammar
pub fn parse_output(raw_text: &str) -> Option<ParsedOutput> {
    V1.parse(raw_text)
}
