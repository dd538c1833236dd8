//! The fixed set of GC test suites
//!
//! Each suite is one test project under `src/tests/GC`, built into a wrapper
//! script under the test binaries root which writes an xUnit report next to
//! itself.

use crate::config::LayoutConfig;
use crate::runcommand::EnvVar;
use std::path::{Path, PathBuf};

/// Environment variable that switches the GC tests into simulator mode
pub const SIMULATOR_ENV_VAR: &str = "RunningGCSimulatorTests";

/// Extension the test wrappers use for their result files
pub const TEST_RESULT_EXTENSION: &str = "testResults.xml";

/// One named suite of tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    /// Display name, e.g. `GC-features`
    pub name: String,
    /// Repository-relative path of the test project
    pub project: PathBuf,
    /// Repository-relative path of the wrapper script running the suite
    pub executable: PathBuf,
    /// Repository-relative path of the report written by the wrapper
    pub result_file: PathBuf,
    /// Whether the suite runs with simulator mode enabled
    pub simulator: bool,
}

impl Suite {
    /// Suite whose result file sits next to `executable`
    pub fn new(
        name: impl Into<String>,
        project: impl Into<PathBuf>,
        executable: impl Into<PathBuf>,
        simulator: bool,
    ) -> Self {
        let executable = executable.into();
        let result_file = result_file_for(&executable);
        Suite {
            name: name.into(),
            project: project.into(),
            executable,
            result_file,
            simulator,
        }
    }

    /// The simulator toggle every process run for this suite must see
    pub fn environment(&self) -> EnvVar {
        if self.simulator {
            EnvVar::set(SIMULATOR_ENV_VAR, "1")
        } else {
            EnvVar::remove(SIMULATOR_ENV_VAR)
        }
    }
}

/// Path of the report a wrapper script writes: `GC.cmd` -> `GC.testResults.xml`
pub fn result_file_for(executable: &Path) -> PathBuf {
    executable.with_extension(TEST_RESULT_EXTENSION)
}

/// Immutable table of suites, in execution order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteRegistry {
    suites: Vec<Suite>,
}

impl SuiteRegistry {
    pub fn new(suites: Vec<Suite>) -> Self {
        SuiteRegistry { suites }
    }

    /// The GC individual test suites for `layout`
    pub fn gc_individual_tests(layout: &LayoutConfig) -> Self {
        let binaries = layout.test_binaries_root();
        let ext = layout.script_extension();
        let projects = Path::new("src").join("tests").join("GC");

        SuiteRegistry::new(vec![
            Suite::new(
                "GC",
                projects.join("GC.csproj"),
                binaries.join("GC").join("GC").join(format!("GC.{}", ext)),
                false,
            ),
            Suite::new(
                "GC-features",
                projects.join("Features").join("GC-features.csproj"),
                binaries
                    .join("GC")
                    .join("Features")
                    .join("GC-features")
                    .join(format!("GC-features.{}", ext)),
                false,
            ),
            Suite::new(
                "GC-scenarios1",
                projects.join("Scenarios").join("GC-scenarios1.csproj"),
                binaries
                    .join("GC")
                    .join("Scenarios")
                    .join("GC-scenarios1")
                    .join(format!("GC-scenarios1.{}", ext)),
                false,
            ),
            Suite::new(
                "GC-simulator",
                projects.join("Scenarios").join("GC-simulator.csproj"),
                binaries
                    .join("GC")
                    .join("Scenarios")
                    .join("GC-simulator")
                    .join(format!("GC-simulator.{}", ext)),
                true,
            ),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Suite> {
        self.suites.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Suite> {
        self.suites.iter().find(|suite| suite.name == name)
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}
