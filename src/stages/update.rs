//! Update the runtime checkout and report the commit it is at

use crate::error::{Error, Result};
use crate::runcommand::CommandSpec;
use crate::stages::{Stage, StageContext};
use crate::ui::UI;
use regex::Regex;

pub struct UpdateStage;

impl UpdateStage {
    pub fn new() -> Self {
        UpdateStage
    }
}

impl Default for UpdateStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for UpdateStage {
    type Output = String;

    fn execute(&self, ctx: &StageContext<'_>, ui: &mut dyn UI) -> Result<String> {
        ui.output(&format!(
            "Updating the runtime repository in {}",
            ctx.repo_root.display()
        ))?;

        let pull = CommandSpec::new(["git", "pull"]).with_verbose(ctx.verbose);
        ctx.runner.run(&pull, Some(ctx.repo_root))?;

        let commit = current_commit(ctx)?;
        ui.output(&format!("Repository is at commit {}", commit))?;
        Ok(commit)
    }

    fn name(&self) -> &str {
        "update"
    }

    fn help(&self) -> &str {
        "Pull the runtime repository and report its commit"
    }
}

/// Hash of the commit currently checked out in the repository root
pub fn current_commit(ctx: &StageContext<'_>) -> Result<String> {
    let log = CommandSpec::new(["git", "log", "-1", "--pretty=format:%H"]).with_verbose(true);
    let result = ctx.runner.run(&log, Some(ctx.repo_root))?;
    extract_commit(&result.output)
}

/// Pick the commit hash out of captured `git log` output
pub fn extract_commit(output: &str) -> Result<String> {
    let re = Regex::new(r"\b[0-9a-f]{40}\b").map_err(|e| Error::Other(e.to_string()))?;
    if let Some(found) = re.find(output) {
        return Ok(found.as_str().to_string());
    }

    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Err(Error::Other(
            "git log produced no commit hash".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
