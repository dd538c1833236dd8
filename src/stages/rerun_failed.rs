//! Re-run the failures of earlier test runs and record which reproduce

use crate::error::Result;
use crate::registry::{Suite, SIMULATOR_ENV_VAR};
use crate::results::parse_results;
use crate::runcommand::EnvVar;
use crate::stages::{Stage, StageContext};
use crate::summary::{RerunOutcome, RerunReport};
use crate::ui::UI;
use std::path::PathBuf;

pub struct RerunFailedTestsStage {
    result_file: Option<PathBuf>,
    report_path: PathBuf,
}

impl RerunFailedTestsStage {
    /// Re-run failures listed in `result_file`, or in every registered
    /// suite's result file when None, writing the table to `report_path`.
    pub fn new(result_file: Option<PathBuf>, report_path: PathBuf) -> Self {
        RerunFailedTestsStage {
            result_file,
            report_path,
        }
    }

    /// Result files to read, with the suite and environment they belong to
    fn sources(&self, ctx: &StageContext<'_>) -> Vec<(Option<String>, PathBuf, EnvVar)> {
        match &self.result_file {
            Some(path) => {
                let path = ctx.repo_path(path);
                // A registered suite's report keeps that suite's environment
                match ctx
                    .registry
                    .iter()
                    .find(|suite| ctx.repo_path(&suite.result_file) == path)
                {
                    Some(suite) => vec![source_for(ctx, suite)],
                    None => vec![(None, path, EnvVar::remove(SIMULATOR_ENV_VAR))],
                }
            }
            None => ctx
                .registry
                .iter()
                .map(|suite| source_for(ctx, suite))
                .collect(),
        }
    }
}

fn source_for(ctx: &StageContext<'_>, suite: &Suite) -> (Option<String>, PathBuf, EnvVar) {
    (
        Some(suite.name.clone()),
        ctx.repo_path(&suite.result_file),
        suite.environment(),
    )
}

impl Stage for RerunFailedTestsStage {
    type Output = RerunReport;

    fn execute(&self, ctx: &StageContext<'_>, ui: &mut dyn UI) -> Result<RerunReport> {
        let mut report = RerunReport::new();

        for (suite, path, env) in self.sources(ctx) {
            ui.output(&format!("Re-running failed tests from {}", path.display()))?;
            let result = parse_results(&path)?;

            for test_name in &result.failed_test_names {
                let reproducible = ctx.rerun_test(test_name, env.clone())?;
                let outcome = RerunOutcome {
                    suite: suite.clone(),
                    test_name: test_name.clone(),
                    reproducible,
                };
                ui.output(&format!("  {} reproducible: {}", test_name, outcome.marker()))?;
                report.push(outcome);
            }
        }

        report.write(&self.report_path)?;
        ui.output(&format!(
            "{} of {} failed test(s) reproduced; report written to {}",
            report.reproducible_count(),
            report.outcomes().len(),
            self.report_path.display()
        ))?;

        Ok(report)
    }

    fn name(&self) -> &str {
        "rerun-failed-tests"
    }

    fn help(&self) -> &str {
        "Re-run failed tests in isolation and record whether they reproduce"
    }
}
