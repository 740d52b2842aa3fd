use serde::{Deserialize, Serialize, Serializer};
use sha3::Digest;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// The harness test that runs a full token sale, used when a scenario does not name one.
pub const DEFAULT_TEST_NAME: &str = "test_Scenario_EndToEndTokenSale";

/// A single harness parameter.
///
/// Sale parameters are wei-scale fixed-point integers and regularly exceed 64 bits, so the value
/// is held as a `u128`. Configuration files can give it either as an integer literal or, for
/// values that the file format cannot represent, as a decimal string. It is always sent to the
/// harness as a plain JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "RawParamValue")]
pub struct ParamValue(u128);

impl ParamValue {
    pub fn new(value: u128) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u128 {
        self.0
    }
}

impl From<u128> for ParamValue {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self(value as u128)
    }
}

impl Serialize for ParamValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u128(self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawParamValue {
    Integer(u64),
    Decimal(String),
}

impl TryFrom<RawParamValue> for ParamValue {
    type Error = String;

    fn try_from(raw: RawParamValue) -> Result<Self, Self::Error> {
        match raw {
            RawParamValue::Integer(value) => Ok(Self(value as u128)),
            RawParamValue::Decimal(text) => text
                .trim()
                .replace('_', "")
                .parse::<u128>()
                .map(Self)
                .map_err(|e| format!("invalid parameter value {text:?}: {e}")),
        }
    }
}

/// Describes one scenario to run against the harness
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScenarioSpec {
    /// The display name of the scenario
    ///
    /// Used to label every row produced for this scenario. Must be unique within a batch.
    pub name: String,
    /// The harness-side test to run
    #[serde(default = "default_test_name")]
    pub test_name: String,
    /// Parameters handed to the harness
    ///
    /// These are opaque to the pipeline. They are encoded as a JSON object and passed on to the
    /// harness, which decides how to apply them to the simulated sale.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

fn default_test_name() -> String {
    DEFAULT_TEST_NAME.to_string()
}

impl ScenarioSpec {
    /// Create a scenario that runs the default sale test with no parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            test_name: default_test_name(),
            params: BTreeMap::new(),
        }
    }

    /// Run a different harness test for this scenario
    pub fn with_test_name(mut self, test_name: impl Into<String>) -> Self {
        self.test_name = test_name.into();
        self
    }

    /// Add a parameter, replacing any previous value for the same key
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// The transport encoding of the parameters, `None` if there are no parameters.
    pub fn params_json(&self) -> serde_json::Result<Option<String>> {
        if self.params.is_empty() {
            return Ok(None);
        }

        serde_json::to_string(&self.params).map(Some)
    }

    /// Compute a fingerprint for this scenario
    ///
    /// The fingerprint identifies the configuration used to run the scenario. It covers the
    ///     - Display name
    ///     - Harness test name
    ///     - Parameters, in key order
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.name.as_bytes());
        Digest::update(&mut hasher, self.test_name.as_bytes());
        self.params.iter().for_each(|(k, v)| {
            Digest::update(&mut hasher, k.as_bytes());
            Digest::update(&mut hasher, v.get().to_le_bytes());
        });

        format!("{:x}", hasher.finalize())
    }

    /// A file name stem for artifacts belonging to this scenario
    ///
    /// Made of a lowercase slug of the display name and the start of the fingerprint, so that
    /// scenarios whose names only differ in punctuation still get distinct files.
    pub fn artifact_stem(&self) -> String {
        let mut slug = String::with_capacity(self.name.len());
        for c in self.name.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('_') {
                slug.push('_');
            }
        }
        let slug = slug.trim_end_matches('_');

        format!("{}-{}", slug, &self.fingerprint()[..12])
    }
}

/// The on-disk list of scenarios for a run
///
/// ```toml
/// [[scenario]]
/// name = "Standard Sale"
///
/// [[scenario]]
/// name = "Higher Initial Supply"
/// params = { initial_tokens = "2000000000000000000000" }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScenarioFile {
    #[serde(rename = "scenario", default)]
    pub scenarios: Vec<ScenarioSpec>,
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid scenario file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("No scenarios declared")]
    Empty,
    #[error("Scenario at position {0} has an empty name")]
    EmptyName(usize),
    #[error("Duplicate scenario name: {0}")]
    DuplicateName(String),
}

/// Parse and validate a scenario list from TOML text
pub fn parse_scenario_file(content: &str) -> Result<Vec<ScenarioSpec>, ScenarioFileError> {
    let file: ScenarioFile = toml::from_str(content)?;
    validate_scenarios(&file.scenarios)?;
    Ok(file.scenarios)
}

/// Load and validate a scenario list from a TOML file
pub fn load_scenario_file(path: impl AsRef<Path>) -> Result<Vec<ScenarioSpec>, ScenarioFileError> {
    let content = std::fs::read_to_string(path)?;
    parse_scenario_file(&content)
}

/// Check that a batch can be run: it must not be empty and display names must be unique.
pub fn validate_scenarios(scenarios: &[ScenarioSpec]) -> Result<(), ScenarioFileError> {
    if scenarios.is_empty() {
        return Err(ScenarioFileError::Empty);
    }

    let mut seen = HashSet::with_capacity(scenarios.len());
    for (idx, scenario) in scenarios.iter().enumerate() {
        if scenario.name.trim().is_empty() {
            return Err(ScenarioFileError::EmptyName(idx));
        }
        if !seen.insert(scenario.name.as_str()) {
            return Err(ScenarioFileError::DuplicateName(scenario.name.clone()));
        }
    }

    Ok(())
}

/// The standard comparison batch: the base sale plus variations of reserve ratio, initial supply
/// and curve exponent.
pub fn default_scenarios() -> Vec<ScenarioSpec> {
    const ONE: u128 = 1_000_000_000_000_000_000;

    vec![
        ScenarioSpec::new("Standard Sale (0.01% Reserve)"),
        ScenarioSpec::new("Higher Reserve Ratio (0.1%)").with_param("reserve_ratio", 1000u64),
        ScenarioSpec::new("Lower Reserve Ratio (0.005%)").with_param("reserve_ratio", 50u64),
        ScenarioSpec::new("Higher Initial Supply").with_param("initial_tokens", 2000 * ONE),
        ScenarioSpec::new("Lower Initial Supply").with_param("initial_tokens", 500 * ONE),
        ScenarioSpec::new("Higher Exponent (Quadratic)").with_param("exponent", 2 * ONE),
    ]
}
