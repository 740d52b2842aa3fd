//! Runs sale scenarios against the external test harness.
//!
//! The harness is a black box: it is given a test name and an optional parameter payload and
//! answers with console text and an exit status. A non-zero exit status is reported as data on
//! the [RawRunResult] because the output may still be usable. Only a failure to launch the
//! process at all is an error.

pub mod config;
mod replay;

use sale_model::{RawRunResult, ScenarioSpec};
use std::path::PathBuf;
use std::process::Command;

pub use self::config::HarnessConfig;
pub use self::replay::{ReplayHarness, RECORDING_EXTENSION};

/// Environment variable that carries the JSON encoded scenario parameters to the harness.
pub const TEST_PARAMS_ENV: &str = "TEST_PARAMS";

/// Environment variable that selects the harness profile.
pub const PROFILE_ENV: &str = "FOUNDRY_PROFILE";

/// Something that can run a scenario and hand back its console output.
pub trait Harness {
    fn run(&self, spec: &ScenarioSpec) -> Result<RawRunResult, HarnessError>;
}

impl<H: Harness + ?Sized> Harness for &H {
    fn run(&self, spec: &ScenarioSpec) -> Result<RawRunResult, HarnessError> {
        (**self).run(spec)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Harness binary `{binary}` could not be found: {source}")]
    NotFound {
        binary: String,
        #[source]
        source: which::Error,
    },
    #[error("Failed to launch harness for scenario `{scenario}`: {source}")]
    Launch {
        scenario: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode parameters for scenario `{scenario}`: {source}")]
    Params {
        scenario: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("No recorded output for scenario `{scenario}` at {path}: {source}")]
    Replay {
        scenario: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An interface to `forge test`, run once per scenario.
pub struct ForgeHarness {
    /// The resolved path to the harness binary.
    binary: PathBuf,
    config: HarnessConfig,
}

impl ForgeHarness {
    /// Creates a new [`ForgeHarness`], resolving the configured binary on `PATH`.
    pub fn new(config: HarnessConfig) -> Result<Self, HarnessError> {
        let binary = which::which(&config.binary).map_err(|source| HarnessError::NotFound {
            binary: config.binary.clone(),
            source,
        })?;
        log::debug!("Using harness binary at {}", binary.display());

        Ok(ForgeHarness { binary, config })
    }

    fn command(&self, spec: &ScenarioSpec) -> Result<Command, HarnessError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("test")
            .arg("--match-test")
            .arg(&spec.test_name)
            .arg("-vvv")
            .args(&self.config.extra_args)
            .env(PROFILE_ENV, &self.config.profile);

        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let params = spec
            .params_json()
            .map_err(|source| HarnessError::Params {
                scenario: spec.name.clone(),
                source,
            })?;
        match params {
            Some(params) => {
                log::debug!("Passing parameters for {}: {params}", spec.name);
                command.env(TEST_PARAMS_ENV, params);
            }
            // Parameters from the parent environment must not leak into a scenario without any
            None => {
                command.env_remove(TEST_PARAMS_ENV);
            }
        }

        Ok(command)
    }
}

impl Harness for ForgeHarness {
    /// Runs the scenario and waits for the harness to exit.
    fn run(&self, spec: &ScenarioSpec) -> Result<RawRunResult, HarnessError> {
        let mut command = self.command(spec)?;
        log::info!(
            "Running scenario '{}' with {}={}: {:?}",
            spec.name,
            PROFILE_ENV,
            self.config.profile,
            command
        );

        let output = command.output().map_err(|source| HarnessError::Launch {
            scenario: spec.name.clone(),
            source,
        })?;

        let result = RawRunResult {
            scenario_name: spec.name.clone(),
            raw_text: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };

        log::debug!(
            "Harness finished for '{}' with status: {}, {} bytes of output",
            spec.name,
            output.status,
            result.raw_text.len()
        );
        if !result.success() {
            log::warn!(
                "Harness exited with {} for scenario '{}': {}",
                output.status,
                spec.name,
                result.stderr.trim()
            );
        }

        Ok(result)
    }
}
