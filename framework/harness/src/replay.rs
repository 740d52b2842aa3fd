use crate::{Harness, HarnessError};
use sale_model::{RawRunResult, ScenarioSpec};
use std::path::PathBuf;

/// File extension used for recorded harness output.
pub const RECORDING_EXTENSION: &str = "log";

/// Replays harness output recorded by an earlier run instead of invoking the harness.
///
/// Recordings are looked up as `<dir>/<artifact stem>.log`, the layout written when raw output
/// is kept for audit. A replayed run always reports a successful exit.
#[derive(Debug, Clone)]
pub struct ReplayHarness {
    dir: PathBuf,
}

impl ReplayHarness {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where the recording for a scenario is expected to be
    pub fn recording_path(&self, spec: &ScenarioSpec) -> PathBuf {
        self.dir
            .join(format!("{}.{}", spec.artifact_stem(), RECORDING_EXTENSION))
    }
}

impl Harness for ReplayHarness {
    fn run(&self, spec: &ScenarioSpec) -> Result<RawRunResult, HarnessError> {
        let path = self.recording_path(spec);
        log::info!(
            "Replaying scenario '{}' from {}",
            spec.name,
            path.display()
        );

        let raw_text = std::fs::read_to_string(&path).map_err(|source| HarnessError::Replay {
            scenario: spec.name.clone(),
            path: path.clone(),
            source,
        })?;

        Ok(RawRunResult {
            scenario_name: spec.name.clone(),
            raw_text,
            stderr: String::new(),
            exit_code: Some(0),
        })
    }
}
