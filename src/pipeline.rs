//! Stage sequencing
//!
//! A run walks a fixed state machine:
//!
//! ```text
//! Idle -> Updated -> LibsBuilt -> TestsBuilt -> TestsRun -> Summarized
//!   \
//!    -> RerunFailed
//! ```
//!
//! Stages that were not selected are skipped, the state only records the
//! last stage that completed. The first failing stage aborts the run.

use crate::config::{LayoutConfig, PipelineConfig};
use crate::dirscope::with_directory;
use crate::error::Result;
use crate::registry::SuiteRegistry;
use crate::runcommand::CommandRunner;
use crate::stages::{
    BuildIndividualTestsStage, BuildRuntimeLibsStage, RerunFailedTestsStage, RunTestsStage,
    Stage, StageContext, SuiteRun, SummarizeStage, UpdateStage,
};
use crate::summary::{RerunReport, RERUN_REPORT_FILE};
use crate::ui::UI;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Updated,
    LibsBuilt,
    TestsBuilt,
    TestsRun,
    Summarized,
    RerunFailed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Updated => "updated",
            PipelineState::LibsBuilt => "libs-built",
            PipelineState::TestsBuilt => "tests-built",
            PipelineState::TestsRun => "tests-run",
            PipelineState::Summarized => "summarized",
            PipelineState::RerunFailed => "rerun-failed",
        };
        f.write_str(name)
    }
}

/// One selectable step, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Update,
    BuildRuntimeLibs,
    BuildIndividualTests,
    RunTests,
    Summarize,
    RerunFailedTests,
}

impl StageKind {
    /// State reached once this stage has completed
    pub fn completes(self) -> PipelineState {
        match self {
            StageKind::Update => PipelineState::Updated,
            StageKind::BuildRuntimeLibs => PipelineState::LibsBuilt,
            StageKind::BuildIndividualTests => PipelineState::TestsBuilt,
            StageKind::RunTests => PipelineState::TestsRun,
            StageKind::Summarize => PipelineState::Summarized,
            StageKind::RerunFailedTests => PipelineState::RerunFailed,
        }
    }
}

/// Stages selected by `config`, in the order they run
pub fn planned_stages(config: &PipelineConfig) -> Vec<StageKind> {
    if config.rerun_failed_tests {
        return vec![StageKind::RerunFailedTests];
    }

    let mut stages = Vec::new();
    if config.update_repo {
        stages.push(StageKind::Update);
    }
    if config.build_clr_libs {
        stages.push(StageKind::BuildRuntimeLibs);
    }
    if config.build_tests {
        stages.push(StageKind::BuildIndividualTests);
    }
    if config.run_tests {
        stages.push(StageKind::RunTests);
    }
    if config.run_tests || config.summarize {
        stages.push(StageKind::Summarize);
    }
    stages
}

/// What a completed run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub state: PipelineState,
    /// Commit reported by the update stage
    pub commit: Option<String>,
    pub suite_runs: Vec<SuiteRun>,
    /// Path of the written summary
    pub summary: Option<PathBuf>,
    pub rerun_report: Option<RerunReport>,
}

impl PipelineReport {
    fn new() -> Self {
        PipelineReport {
            state: PipelineState::Idle,
            commit: None,
            suite_runs: Vec::new(),
            summary: None,
            rerun_report: None,
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    layout: LayoutConfig,
    registry: SuiteRegistry,
    runner: CommandRunner,
}

impl Pipeline {
    /// Pipeline for the checkout in `config`, with its layout loaded from
    /// the repository and real processes launched
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let layout = LayoutConfig::from_repo_root(&config.repo_root)?;
        let registry = SuiteRegistry::gc_individual_tests(&layout);
        Ok(Self::with_parts(
            config,
            layout,
            registry,
            CommandRunner::new(),
        ))
    }

    pub fn with_parts(
        config: PipelineConfig,
        layout: LayoutConfig,
        registry: SuiteRegistry,
        runner: CommandRunner,
    ) -> Self {
        Pipeline {
            config,
            layout,
            registry,
            runner,
        }
    }

    pub fn registry(&self) -> &SuiteRegistry {
        &self.registry
    }

    fn context(&self) -> StageContext<'_> {
        StageContext {
            runner: &self.runner,
            layout: &self.layout,
            registry: &self.registry,
            repo_root: &self.config.repo_root,
            verbose: self.config.verbose,
        }
    }

    /// Run every selected stage inside the repository root
    pub fn run(&self, ui: &mut dyn UI) -> Result<PipelineReport> {
        let stages = planned_stages(&self.config);
        tracing::info!("Planned stages: {:?}", stages);

        with_directory(Some(self.config.repo_root.as_path()), || {
            let ctx = self.context();
            let mut report = PipelineReport::new();

            for kind in stages {
                self.run_stage(kind, &ctx, ui, &mut report).map_err(|e| {
                    tracing::error!("Stage {:?} failed in state {}: {}", kind, report.state, e);
                    e
                })?;

                let next = kind.completes();
                tracing::info!("Pipeline state: {} -> {}", report.state, next);
                report.state = next;
            }

            Ok(report)
        })
    }

    fn run_stage(
        &self,
        kind: StageKind,
        ctx: &StageContext<'_>,
        ui: &mut dyn UI,
        report: &mut PipelineReport,
    ) -> Result<()> {
        match kind {
            StageKind::Update => {
                report.commit = Some(announce(&UpdateStage::new(), ctx, ui)?);
            }
            StageKind::BuildRuntimeLibs => announce(&BuildRuntimeLibsStage::new(), ctx, ui)?,
            StageKind::BuildIndividualTests => {
                announce(&BuildIndividualTestsStage::new(), ctx, ui)?
            }
            StageKind::RunTests => {
                report.suite_runs = announce(&RunTestsStage::new(), ctx, ui)?;
            }
            StageKind::Summarize => {
                let stage = SummarizeStage::new(self.config.results_dir());
                report.summary = Some(announce(&stage, ctx, ui)?);
            }
            StageKind::RerunFailedTests => {
                let stage = RerunFailedTestsStage::new(
                    self.config.result_file.clone(),
                    self.config.results_dir().join(RERUN_REPORT_FILE),
                );
                report.rerun_report = Some(announce(&stage, ctx, ui)?);
            }
        }
        Ok(())
    }
}

fn announce<S: Stage>(stage: &S, ctx: &StageContext<'_>, ui: &mut dyn UI) -> Result<S::Output> {
    tracing::info!("Starting stage {}: {}", stage.name(), stage.help());
    let output = stage.execute(ctx, ui)?;
    tracing::info!("Finished stage {}", stage.name());
    Ok(output)
}
