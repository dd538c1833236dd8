//! Build the runtime and libraries, then generate the test layout

use crate::error::Result;
use crate::runcommand::CommandSpec;
use crate::stages::{path_arg, Stage, StageContext};
use crate::ui::UI;

pub struct BuildRuntimeLibsStage;

impl BuildRuntimeLibsStage {
    pub fn new() -> Self {
        BuildRuntimeLibsStage
    }

    /// The build invocations, in order
    pub fn commands(ctx: &StageContext<'_>) -> Vec<CommandSpec> {
        let layout = ctx.layout;
        vec![
            CommandSpec::new([
                path_arg(&layout.build_script(ctx.repo_root)),
                "-s".to_string(),
                "clr+libs".to_string(),
                "-c".to_string(),
                layout.libs_configuration.clone(),
                "-rc".to_string(),
                layout.clr_configuration.clone(),
            ]),
            CommandSpec::new([
                path_arg(&layout.tests_build_script(ctx.repo_root)),
                "generatelayoutonly".to_string(),
                layout.clr_configuration.clone(),
            ]),
        ]
    }
}

impl Default for BuildRuntimeLibsStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for BuildRuntimeLibsStage {
    type Output = ();

    fn execute(&self, ctx: &StageContext<'_>, ui: &mut dyn UI) -> Result<()> {
        ui.output(&format!(
            "Building the runtime in {}",
            ctx.repo_root.display()
        ))?;

        for spec in Self::commands(ctx) {
            let spec = spec.with_verbose(ctx.verbose);
            ctx.runner.run(&spec, Some(ctx.repo_root))?;
        }

        ui.output("Runtime and libraries built successfully.")?;
        Ok(())
    }

    fn name(&self) -> &str {
        "build-clr-libs"
    }

    fn help(&self) -> &str {
        "Build clr+libs and generate the Checked test layout"
    }
}
