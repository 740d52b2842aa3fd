//! Data model shared by the scenario harness and the sale summariser.
//!
//! A run starts from a list of [ScenarioSpec]s, each of which is handed to the external harness
//! once. The harness produces a [RawRunResult], which the summariser parses into a
//! [ScenarioResult] made of one [SummaryRecord] and any number of [PurchaseRecord]s.

mod record;
mod scenario;

pub use record::{
    PurchaseOutcome, PurchaseRecord, RawRunResult, Scale, ScenarioResult, SummaryMetric,
    SummaryRecord,
};
pub use scenario::{
    default_scenarios, load_scenario_file, parse_scenario_file, validate_scenarios, ParamValue,
    ScenarioFile, ScenarioFileError, ScenarioSpec, DEFAULT_TEST_NAME,
};
