//! gcit - Command-line driver for the GC individual tests

use anyhow::Context;
use clap::Parser;
use gc_individual_tests::cli::Cli;
use gc_individual_tests::logging::LoggingContext;
use gc_individual_tests::pipeline::Pipeline;
use gc_individual_tests::ui::{CliUI, UI};

fn run(cli: &Cli, logging: &mut LoggingContext, ui: &mut dyn UI) -> anyhow::Result<()> {
    let config = cli.to_config().context("Invalid arguments")?;

    let log_file = logging
        .init(config.verbose, &config.log_dir())
        .context("Failed to initialise logging")?;
    tracing::info!("Arguments: {:?}", cli);

    if !config.has_actions() {
        ui.output("No actions selected. Use --all-actions or one of the stage flags; see --help.")?;
        return Ok(());
    }

    let pipeline = Pipeline::new(config).context("Failed to load the repository layout")?;
    let report = pipeline.run(ui)?;

    tracing::info!("Pipeline finished in state {}", report.state);
    ui.output(&format!("Log written to {}", log_file.display()))?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let mut ui = CliUI::new();
    let mut logging = LoggingContext::new();

    match run(&cli, &mut logging, &mut ui) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            if logging.is_initialized() {
                tracing::error!("{:#}", e);
            } else {
                let _ = ui.error(&format!("{:#}", e));
            }
            std::process::exit(1);
        }
    }
}
