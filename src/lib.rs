//! gc-individual-tests - Drive the GC individual tests of a runtime checkout
//!
//! # Overview
//!
//! The GC individual tests of a .NET runtime checkout need several long
//! manual steps: pull the repository, build the runtime and libraries,
//! build the test projects, run every test suite and work out which of the
//! failures are real. This crate automates that pipeline and writes the
//! outcome as Markdown.
//!
//! # Architecture
//!
//! - [`runcommand`]: Running external commands with retries, output capture and environment overlays
//! - [`dirscope`]: Scoped changes of the working directory
//! - [`results`]: Parsing xUnit XML result files
//! - [`stages`]: The individual pipeline stages
//! - [`pipeline`]: Stage selection and sequencing
//! - [`summary`]: Markdown summary and re-run reports
//! - [`registry`]: The fixed table of GC test suites
//! - [`config`]: Artifact layout (`.gcit.conf`) and stage selection
//! - [`cli`]: Command-line arguments
//! - [`logging`]: Console and file log sinks
//! - [`ui`]: User interface abstraction for output
//! - [`error`]: Error types and Result alias
//!
//! # Outputs
//!
//! Everything is written below the output directory:
//!
//! - `logs/<timestamp>-gcit-pid<pid>.log`: Full log of the run
//! - `test_results/<timestamp>-test-summary.md`: Per-suite counts and failures
//! - `test_results/rerun-failed-tests.md`: Reproducibility of re-run failures
//!
//! # Example
//!
//! ```no_run
//! use gc_individual_tests::config::{ActionFlags, PipelineConfig};
//! use gc_individual_tests::pipeline::Pipeline;
//! use gc_individual_tests::ui::CliUI;
//!
//! # fn main() -> gc_individual_tests::Result<()> {
//! let flags = ActionFlags {
//!     summarize: true,
//!     ..Default::default()
//! };
//! let config = PipelineConfig::new("/src/runtime", ".", false, flags, None)?;
//!
//! let report = Pipeline::new(config)?.run(&mut CliUI::new())?;
//! println!("Summary written to {:?}", report.summary);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod dirscope;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod results;
pub mod runcommand;
pub mod stages;
pub mod summary;
pub mod ui;

pub use error::{Error, Result};
