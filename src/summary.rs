//! Markdown reports
//!
//! Two documents are produced: a per-run summary written to a fresh
//! timestamped file, and the re-run report written to a fixed path.

use crate::error::Result;
use crate::results::TestSuiteResult;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Marker used in the summary until a failure has been re-run
pub const REPRODUCIBLE_PLACEHOLDER: &str = "TBD";

/// File name of the re-run report inside the results directory
pub const RERUN_REPORT_FILE: &str = "rerun-failed-tests.md";

/// Value shown for counts of suites without a usable result file
const NOT_AVAILABLE: &str = "NA";

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn write_table_header(out: &mut String, columns: &[&str]) {
    let _ = writeln!(out, "| {} |", columns.join(" | "));
    let separators = vec!["---"; columns.len()];
    let _ = writeln!(out, "| {} |", separators.join(" | "));
}

/// Row of the summary for one suite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteSummary {
    pub name: String,
    /// None when the result file was missing or could not be parsed
    pub result: Option<TestSuiteResult>,
}

/// Summary of all registered suites for one checkout state
#[derive(Debug, Clone)]
pub struct SummaryReport {
    commit: String,
    generated: DateTime<Local>,
    suites: Vec<SuiteSummary>,
}

impl SummaryReport {
    pub fn new(commit: impl Into<String>, generated: DateTime<Local>) -> Self {
        SummaryReport {
            commit: commit.into(),
            generated,
            suites: Vec::new(),
        }
    }

    pub fn add_suite(&mut self, name: impl Into<String>, result: Option<TestSuiteResult>) {
        self.suites.push(SuiteSummary {
            name: name.into(),
            result,
        });
    }

    /// Render the summary document
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# GC Individual Tests Summary");
        let _ = writeln!(out);
        let _ = writeln!(out, "- Commit: `{}`", self.commit);
        let _ = writeln!(
            out,
            "- Generated: {}",
            self.generated.format("%Y/%m/%d %H:%M:%S")
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "## Test Suites");
        let _ = writeln!(out);
        write_table_header(&mut out, &["Test Suite", "Total", "Passed", "Failed"]);
        for suite in &self.suites {
            let name = escape_cell(&suite.name);
            match &suite.result {
                Some(result) => {
                    let _ = writeln!(
                        out,
                        "| {} | {} | {} | {} |",
                        name, result.total, result.passed, result.failed
                    );
                }
                None => {
                    let _ = writeln!(
                        out,
                        "| {} | {} | {} | {} |",
                        name, NOT_AVAILABLE, NOT_AVAILABLE, NOT_AVAILABLE
                    );
                }
            }
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "## Failed Tests");
        let _ = writeln!(out);
        let failures: Vec<(&str, &str)> = self
            .suites
            .iter()
            .filter_map(|suite| suite.result.as_ref().map(|r| (suite.name.as_str(), r)))
            .flat_map(|(name, result)| {
                result
                    .failed_test_names
                    .iter()
                    .map(move |test| (name, test.as_str()))
            })
            .collect();

        if failures.is_empty() {
            let _ = writeln!(out, "No failed tests.");
        } else {
            write_table_header(&mut out, &["Test Suite", "Test Name", "Reproducible"]);
            for (suite, test) in failures {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} |",
                    escape_cell(suite),
                    escape_cell(test),
                    REPRODUCIBLE_PLACEHOLDER
                );
            }
        }

        out
    }

    /// Write the summary to a new `<timestamp>-test-summary.md` in `dir`.
    ///
    /// Existing files are never replaced; a numeric suffix is added if a
    /// summary with the same timestamp already exists.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let stamp = self.generated.format("%Y%m%d%H%M%S").to_string();
        let content = self.to_markdown();

        let mut suffix = 0usize;
        loop {
            let file_name = if suffix == 0 {
                format!("{}-test-summary.md", stamp)
            } else {
                format!("{}-test-summary-{}.md", stamp, suffix)
            };
            let path = dir.join(file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(content.as_bytes())?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Outcome of re-running one failed test in isolation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerunOutcome {
    /// Suite the failure was reported by, when known
    pub suite: Option<String>,
    pub test_name: String,
    /// True when the test failed again
    pub reproducible: bool,
}

impl RerunOutcome {
    pub fn marker(&self) -> &'static str {
        if self.reproducible {
            "TRUE"
        } else {
            "FALSE"
        }
    }
}

/// Ordered table of re-run outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RerunReport {
    outcomes: Vec<RerunOutcome>,
}

impl RerunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: RerunOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[RerunOutcome] {
        &self.outcomes
    }

    pub fn reproducible_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.reproducible).count()
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Re-run of Failed Tests");
        let _ = writeln!(out);
        write_table_header(&mut out, &["Test Name", "Reproducible"]);
        for outcome in &self.outcomes {
            let _ = writeln!(
                out,
                "| {} | {} |",
                escape_cell(&outcome.test_name),
                outcome.marker()
            );
        }
        out
    }

    /// Write the report to `path`, replacing any previous report
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_markdown())?;
        Ok(())
    }
}
