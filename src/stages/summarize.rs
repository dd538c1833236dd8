//! Write the Markdown summary of the latest results of every suite

use crate::error::{Error, Result};
use crate::results::parse_results;
use crate::stages::update::current_commit;
use crate::stages::{Stage, StageContext};
use crate::summary::SummaryReport;
use crate::ui::UI;
use chrono::Local;
use std::path::PathBuf;

pub struct SummarizeStage {
    results_dir: PathBuf,
}

impl SummarizeStage {
    pub fn new(results_dir: PathBuf) -> Self {
        SummarizeStage { results_dir }
    }

    /// Collect the summary without writing it
    pub fn build_report(&self, ctx: &StageContext<'_>) -> Result<SummaryReport> {
        let commit = current_commit(ctx)?;
        let mut report = SummaryReport::new(commit, Local::now());

        for suite in ctx.registry.iter() {
            let path = ctx.repo_path(&suite.result_file);
            match parse_results(&path) {
                Ok(result) => report.add_suite(&suite.name, Some(result)),
                Err(e @ (Error::MissingResultFile(_) | Error::MalformedReport { .. })) => {
                    tracing::warn!("No results for {}: {}", suite.name, e);
                    report.add_suite(&suite.name, None);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }
}

impl Stage for SummarizeStage {
    type Output = PathBuf;

    fn execute(&self, ctx: &StageContext<'_>, ui: &mut dyn UI) -> Result<PathBuf> {
        let report = self.build_report(ctx)?;
        let path = report.write(&self.results_dir)?;
        ui.output(&format!("Test summary written to {}", path.display()))?;
        Ok(path)
    }

    fn name(&self) -> &str {
        "summarize"
    }

    fn help(&self) -> &str {
        "Write a Markdown summary of every suite's results"
    }
}
