use polars::prelude::*;
use sale_model::{ScenarioResult, SummaryMetric};

/// Scenario label column of the summary table
pub const SCENARIO: &str = "Scenario";

/// Scenario label column of the purchase table
pub const PURCHASE_SCENARIO: &str = "scenario";
pub const PURCHASE_NUM: &str = "purchase_num";
pub const ETH_SPENT: &str = "eth_spent";
pub const TOKENS_RECEIVED: &str = "tokens_received";
pub const CURRENT_PRICE: &str = "current_price";

/// Build the summary table, one row per scenario.
///
/// Every known metric gets a column. Raw values are wei-scale and do not fit in 64 bits, so they
/// are held as exact decimal strings. A metric the scenario did not report is filled with zero.
pub(crate) fn summary_frame(results: &[ScenarioResult]) -> PolarsResult<DataFrame> {
    let mut columns = Vec::with_capacity(SummaryMetric::ALL.len() + 1);
    columns.push(Column::new(
        SCENARIO.into(),
        results
            .iter()
            .map(|r| r.scenario_name.clone())
            .collect::<Vec<_>>(),
    ));

    for metric in SummaryMetric::ALL {
        let values = results
            .iter()
            .map(|r| r.summary.metric(metric).unwrap_or(0).to_string())
            .collect::<Vec<_>>();
        columns.push(Column::new(metric.column().into(), values));
    }

    DataFrame::new(columns)
}

/// Build the purchase table, one row per purchase, tagged with the scenario it belongs to.
pub(crate) fn purchase_frame(results: &[ScenarioResult]) -> PolarsResult<DataFrame> {
    let rows = results
        .iter()
        .flat_map(|r| r.purchases.iter().map(move |p| (r.scenario_name.as_str(), p)));

    let mut scenario = Vec::new();
    let mut purchase_num = Vec::new();
    let mut eth_spent = Vec::new();
    let mut tokens_received = Vec::new();
    let mut current_price = Vec::new();
    for (name, purchase) in rows {
        scenario.push(name.to_string());
        purchase_num.push(purchase.purchase_num);
        eth_spent.push(purchase.eth_spent.to_string());
        tokens_received.push(purchase.tokens_received.to_string());
        current_price.push(purchase.current_price.to_string());
    }

    DataFrame::new(vec![
        Column::new(PURCHASE_SCENARIO.into(), scenario),
        Column::new(PURCHASE_NUM.into(), purchase_num),
        Column::new(ETH_SPENT.into(), eth_spent),
        Column::new(TOKENS_RECEIVED.into(), tokens_received),
        Column::new(CURRENT_PRICE.into(), current_price),
    ])
}

/// Render a single cell for text output.
pub(crate) fn cell_text(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float64(v) if v.is_nan() => "NaN".to_string(),
        AnyValue::Float64(v) => format!("{v}"),
        v => v.to_string(),
    }
}
