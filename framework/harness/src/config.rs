use std::path::PathBuf;

/// Default harness binary.
pub const DEFAULT_BINARY: &str = "forge";

/// Default harness profile.
pub const DEFAULT_PROFILE: &str = "lifecycle";

/// Provides the parameters used to launch the harness for each scenario.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Name or path of the harness binary, resolved on `PATH`.
    pub binary: String,
    /// Profile forwarded to the harness through its environment.
    pub profile: String,
    /// Directory to run the harness in, the current directory if unset.
    pub working_dir: Option<PathBuf>,
    /// Extra arguments appended after the test selection.
    pub extra_args: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            working_dir: None,
            extra_args: Vec::new(),
        }
    }
}

impl HarnessConfig {
    /// Builds a [`HarnessConfig`] with the specified binary.
    pub fn binary(mut self, binary: String) -> Self {
        self.binary = binary;
        self
    }

    /// Builds a [`HarnessConfig`] with the specified profile.
    pub fn profile(mut self, profile: String) -> Self {
        self.profile = profile;
        self
    }

    /// Builds a [`HarnessConfig`] that runs the harness in the specified directory.
    pub fn working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Builds a [`HarnessConfig`] with extra harness arguments.
    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}
