//! Run every registered suite and immediately re-run what failed

use crate::error::{Error, Result};
use crate::results::{parse_results, TestSuiteResult};
use crate::runcommand::CommandSpec;
use crate::stages::{path_arg, Stage, StageContext};
use crate::summary::RerunOutcome;
use crate::ui::UI;

/// Results of one suite together with the re-runs of its failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteRun {
    pub suite: String,
    pub result: TestSuiteResult,
    pub reruns: Vec<RerunOutcome>,
}

pub struct RunTestsStage;

impl RunTestsStage {
    pub fn new() -> Self {
        RunTestsStage
    }
}

impl Default for RunTestsStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for RunTestsStage {
    type Output = Vec<SuiteRun>;

    fn execute(&self, ctx: &StageContext<'_>, ui: &mut dyn UI) -> Result<Vec<SuiteRun>> {
        ui.output("Running the GC Individual Tests...")?;
        let core_root = path_arg(&ctx.core_root());
        let mut runs = Vec::new();

        for suite in ctx.registry.iter() {
            let spec = CommandSpec::new([
                path_arg(&ctx.repo_path(&suite.executable)),
                "-coreroot".to_string(),
                core_root.clone(),
            ])
            .with_verbose(true)
            .with_env(suite.environment());

            ui.output(&format!("Running test suite {}", suite.name))?;
            match ctx.runner.run(&spec, None) {
                Ok(_) => {}
                // The report is still written when tests fail
                Err(Error::ProcessFailed { exit_code, .. }) => {
                    ui.warning(&format!(
                        "Test suite {} exited with status {:?}",
                        suite.name, exit_code
                    ))?;
                }
                Err(e) => return Err(e),
            }

            ui.output("Analyzing the test results...")?;
            let result = parse_results(&ctx.repo_path(&suite.result_file))?;
            ui.output(&format!(
                "{}: {} total, {} passed, {} failed",
                suite.name, result.total, result.passed, result.failed
            ))?;

            let mut reruns = Vec::new();
            for failed_test in &result.failed_test_names {
                ui.output(&format!("Failed Test: {} in {}", failed_test, suite.name))?;
                let reproducible = ctx.rerun_test(failed_test, suite.environment())?;
                if reproducible {
                    ui.output(&format!("Failed to re-run test: {}", failed_test))?;
                } else {
                    ui.output(&format!("Successfully re-ran test: {}", failed_test))?;
                }
                reruns.push(RerunOutcome {
                    suite: Some(suite.name.clone()),
                    test_name: failed_test.clone(),
                    reproducible,
                });
            }

            runs.push(SuiteRun {
                suite: suite.name.clone(),
                result,
                reruns,
            });
        }

        Ok(runs)
    }

    fn name(&self) -> &str {
        "run-tests"
    }

    fn help(&self) -> &str {
        "Run every GC test suite and re-run each failure once"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SIMULATOR_ENV_VAR;
    use crate::runcommand::fake::{exited, FakeLauncher};
    use crate::runcommand::EnvVar;
    use crate::stages::testing::{report_with_failures, Fixture};
    use crate::ui::test_ui::TestUI;

    fn write_all_passing(fixture: &Fixture) {
        for name in ["GC", "GC-features", "GC-scenarios1", "GC-simulator"] {
            fixture.write_results(name, &report_with_failures(2, &[]));
        }
    }

    #[test]
    fn test_runs_every_suite_with_coreroot() {
        let fixture = Fixture::new(FakeLauncher::succeeding());
        write_all_passing(&fixture);
        let mut ui = TestUI::new();

        let runs = RunTestsStage::new()
            .execute(&fixture.context(), &mut ui)
            .unwrap();

        assert_eq!(runs.len(), 4);
        assert!(runs.iter().all(|run| run.reruns.is_empty()));
        let calls = fixture.calls.borrow();
        assert_eq!(calls.len(), 4);
        for spec in calls.iter() {
            assert_eq!(spec.cmdline()[1], "-coreroot");
            assert!(spec.cmdline()[2].ends_with(
                "artifacts/tests/coreclr/linux.x64.Checked/Tests/Core_Root"
            ));
        }
        assert!(calls[0].cmdline()[0].ends_with("GC/GC/GC.sh"));
    }

    #[test]
    fn test_simulator_toggle_is_scoped_per_suite() {
        let fixture = Fixture::new(FakeLauncher::succeeding());
        write_all_passing(&fixture);
        let mut ui = TestUI::new();

        RunTestsStage::new()
            .execute(&fixture.context(), &mut ui)
            .unwrap();

        let calls = fixture.calls.borrow();
        for spec in calls.iter() {
            let expected = if spec.cmdline()[0].ends_with("GC-simulator.sh") {
                EnvVar::set(SIMULATOR_ENV_VAR, "1")
            } else {
                EnvVar::remove(SIMULATOR_ENV_VAR)
            };
            assert_eq!(spec.env(), &[expected]);
        }
        assert!(std::env::var(SIMULATOR_ENV_VAR).is_err());
    }

    #[test]
    fn test_failures_are_rerun_individually() {
        let fixture = Fixture::new(FakeLauncher::new(|spec| {
            let program = &spec.cmdline()[0];
            if program.ends_with("GC/GC/GC.sh") || program.ends_with("T2.sh") {
                Ok(exited(1))
            } else {
                Ok(exited(0))
            }
        }));
        write_all_passing(&fixture);
        fixture.write_results(
            "GC",
            &report_with_failures(5, &["GC/T1/T1.sh", "GC/T2/T2.sh"]),
        );
        let mut ui = TestUI::new();

        let runs = RunTestsStage::new()
            .execute(&fixture.context(), &mut ui)
            .unwrap();

        let gc = &runs[0];
        assert_eq!(gc.result.failed, 2);
        assert_eq!(
            gc.reruns,
            vec![
                RerunOutcome {
                    suite: Some("GC".to_string()),
                    test_name: "GC/T1/T1.sh".to_string(),
                    reproducible: false,
                },
                RerunOutcome {
                    suite: Some("GC".to_string()),
                    test_name: "GC/T2/T2.sh".to_string(),
                    reproducible: true,
                },
            ]
        );

        let programs = fixture.programs();
        assert_eq!(programs.len(), 6);
        assert!(programs[1].ends_with("linux.x64.Release/GC/T1/T1.sh"));
        assert!(programs[2].ends_with("linux.x64.Release/GC/T2/T2.sh"));
        assert!(ui.errors.iter().any(|e| e.contains("Test suite GC exited")));
        assert!(ui.saw("Successfully re-ran test: GC/T1/T1.sh"));
        assert!(ui.saw("Failed to re-run test: GC/T2/T2.sh"));
    }

    #[test]
    fn test_missing_result_file_is_fatal() {
        let fixture = Fixture::new(FakeLauncher::succeeding());
        let mut ui = TestUI::new();

        let result = RunTestsStage::new().execute(&fixture.context(), &mut ui);

        assert!(matches!(result, Err(Error::MissingResultFile(_))));
        assert_eq!(fixture.calls.borrow().len(), 1);
    }
}
