//! Command-line argument model

use crate::config::{ActionFlags, PipelineConfig};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gcit")]
#[command(
    about = "Update, build, run and summarize the GC individual tests of a runtime checkout",
    long_about = None
)]
pub struct Cli {
    /// Root of the runtime repository
    #[arg(short = 'r', long, env = "GCIT_REPO_ROOT")]
    pub repo_root: PathBuf,

    /// Capture and log the output of every command
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Pull the latest changes of the repository
    #[arg(short = 'u', long)]
    pub update_repo: bool,

    /// Build the runtime and libraries
    #[arg(short = 'b', long)]
    pub build_clr_libs: bool,

    /// Build the GC individual test projects
    #[arg(short = 't', long)]
    pub build_tests: bool,

    /// Run the GC individual tests and re-run their failures
    #[arg(short = 'R', long)]
    pub run_tests: bool,

    /// Write a summary of the latest results
    #[arg(long)]
    pub summarize: bool,

    /// Update, build the runtime, build the tests and run them
    #[arg(short = 'a', long)]
    pub all_actions: bool,

    /// Only re-run the failures of earlier runs; disables every other action
    #[arg(long)]
    pub rerun_failed_tests: bool,

    /// Result file to re-run failures from (defaults to every suite's)
    #[arg(long, requires = "rerun_failed_tests")]
    pub result_file: Option<PathBuf>,

    /// Directory receiving logs/ and test_results/
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

impl Cli {
    pub fn action_flags(&self) -> ActionFlags {
        ActionFlags {
            update_repo: self.update_repo,
            build_clr_libs: self.build_clr_libs,
            build_tests: self.build_tests,
            run_tests: self.run_tests,
            summarize: self.summarize,
            all_actions: self.all_actions,
            rerun_failed_tests: self.rerun_failed_tests,
        }
    }

    /// Validate the arguments into a pipeline configuration
    pub fn to_config(&self) -> Result<PipelineConfig> {
        PipelineConfig::new(
            &self.repo_root,
            &self.output_dir,
            self.verbose,
            self.action_flags(),
            self.result_file.clone(),
        )
    }
}
