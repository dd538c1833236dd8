//! Pipeline stages
//!
//! Each stage is a small struct implementing [`Stage`]. Stages get what they
//! need from a [`StageContext`] built once per run, and report progress to
//! the user through a [`UI`].

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::registry::SuiteRegistry;
use crate::runcommand::{CommandRunner, CommandSpec, EnvVar};
use crate::ui::UI;
use std::path::{Path, PathBuf};

pub mod build_libs;
pub mod rerun_failed;
pub mod run_tests;
pub mod summarize;
pub mod update;

pub use build_libs::BuildRuntimeLibsStage;
pub use build_tests::BuildIndividualTestsStage;
pub use rerun_failed::RerunFailedTestsStage;
pub use run_tests::{RunTestsStage, SuiteRun};
pub use summarize::SummarizeStage;
pub use update::UpdateStage;

/// Everything a stage may use, shared read-only across the run
pub struct StageContext<'a> {
    pub runner: &'a CommandRunner,
    pub layout: &'a LayoutConfig,
    pub registry: &'a SuiteRegistry,
    pub repo_root: &'a Path,
    pub verbose: bool,
}

impl StageContext<'_> {
    /// Core_Root passed to test wrappers via `-coreroot`
    pub fn core_root(&self) -> PathBuf {
        self.layout.core_root(self.repo_root)
    }

    /// Resolve a repository-relative path
    pub fn repo_path(&self, relative: &Path) -> PathBuf {
        self.repo_root.join(relative)
    }

    /// Wrapper script of a single test, as named in a result file
    pub fn test_binary(&self, test_name: &str) -> PathBuf {
        self.repo_root
            .join(self.layout.test_binaries_root())
            .join(test_name)
    }

    /// Run a single failed test again; returns true if it failed again.
    ///
    /// A test that cannot be started counts as failing again. Errors other
    /// than test failures are propagated.
    pub fn rerun_test(&self, test_name: &str, env: EnvVar) -> Result<bool> {
        let spec = CommandSpec::new([
            path_arg(&self.test_binary(test_name)),
            "-coreroot".to_string(),
            path_arg(&self.core_root()),
        ])
        .with_verbose(true)
        .with_env(env);

        match self.runner.run(&spec, None) {
            Ok(_) => Ok(false),
            Err(e) if e.is_test_failure() => {
                tracing::warn!("Re-run of {} failed: {}", test_name, e);
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }
}

/// Render a path as a command-line argument
pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// A step of the pipeline
pub trait Stage {
    /// Value produced by a successful run of the stage
    type Output;

    /// Execute the stage
    fn execute(&self, ctx: &StageContext<'_>, ui: &mut dyn UI) -> Result<Self::Output>;

    /// Get the stage name
    fn name(&self) -> &str;

    /// Get stage help text
    fn help(&self) -> &str;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the stage tests

    use super::*;
    use crate::runcommand::fake::{runner, FakeLauncher};
    use crate::runcommand::CommandSpec;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// A fake checkout with the default layout and a scripted runner
    pub struct Fixture {
        pub repo: TempDir,
        pub layout: LayoutConfig,
        pub registry: SuiteRegistry,
        pub runner: CommandRunner,
        pub calls: Rc<RefCell<Vec<CommandSpec>>>,
    }

    impl Fixture {
        pub fn new(launcher: FakeLauncher) -> Self {
            let repo = TempDir::new().unwrap();
            let layout = LayoutConfig {
                target_os: "linux".to_string(),
                target_arch: "x64".to_string(),
                ..Default::default()
            };
            let registry = SuiteRegistry::gc_individual_tests(&layout);
            let (runner, calls) = runner(launcher);
            Fixture {
                repo,
                layout,
                registry,
                runner,
                calls,
            }
        }

        pub fn context(&self) -> StageContext<'_> {
            StageContext {
                runner: &self.runner,
                layout: &self.layout,
                registry: &self.registry,
                repo_root: self.repo.path(),
                verbose: false,
            }
        }

        /// Write `xml` as the result file of suite `name`
        pub fn write_results(&self, name: &str, xml: &str) {
            let suite = self.registry.get(name).unwrap();
            let path = self.repo.path().join(&suite.result_file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, xml).unwrap();
        }

        /// Program names of every launched command, in order
        pub fn programs(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .map(|spec| spec.cmdline()[0].clone())
                .collect()
        }
    }

    /// Minimal report with the given failing test names
    pub fn report_with_failures(total: usize, failures: &[&str]) -> String {
        let mut xml = format!(
            "<assemblies><assembly total=\"{}\" passed=\"{}\" failed=\"{}\">",
            total,
            total - failures.len(),
            failures.len()
        );
        for name in failures {
            xml.push_str(&format!("<test name=\"{}\" result=\"Fail\" />", name));
        }
        xml.push_str("</assembly></assemblies>");
        xml
    }
}
