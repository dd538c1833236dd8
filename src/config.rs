//! Pipeline configuration
//!
//! Two pieces of configuration drive a run:
//!
//! - [`LayoutConfig`] describes the artifact layout of the runtime checkout
//!   (build configurations and target platform). It defaults to the host
//!   platform and can be overridden by a `.gcit.conf` INI file in the
//!   repository root with a `[DEFAULT]` section.
//! - [`PipelineConfig`] holds the stage selection made on the command line.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the optional layout override file in the repository root
pub const CONFIG_FILE_NAME: &str = ".gcit.conf";

/// Artifact layout of a runtime checkout
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Configuration the runtime (clr) is built in
    pub clr_configuration: String,

    /// Configuration the libraries and tests are built in
    pub libs_configuration: String,

    /// Target OS as it appears in artifact directory names (windows, linux, osx)
    pub target_os: String,

    /// Target architecture as it appears in artifact directory names (x64, arm64)
    pub target_arch: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            clr_configuration: "Checked".to_string(),
            libs_configuration: "Release".to_string(),
            target_os: host_os().to_string(),
            target_arch: host_arch().to_string(),
        }
    }
}

fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "osx",
        other => other,
    }
}

fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        other => other,
    }
}

impl LayoutConfig {
    /// Load the layout for a checkout, using `.gcit.conf` when present
    pub fn from_repo_root(repo_root: &Path) -> Result<Self> {
        let config_path = repo_root.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            tracing::info!("Loading layout configuration from {}", config_path.display());
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an INI file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        Self::parse(&contents)
    }

    /// Parse configuration from a string; keys not given keep their defaults
    pub fn parse(contents: &str) -> Result<Self> {
        let ini: HashMap<String, HashMap<String, String>> = serde_ini::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e)))?;

        let default = ini.get("DEFAULT").ok_or_else(|| {
            Error::Config(format!("No [DEFAULT] section in {}", CONFIG_FILE_NAME))
        })?;

        let mut config = LayoutConfig::default();
        for (key, slot) in [
            ("clr_configuration", &mut config.clr_configuration),
            ("libs_configuration", &mut config.libs_configuration),
            ("target_os", &mut config.target_os),
            ("target_arch", &mut config.target_arch),
        ] {
            if let Some(value) = default.get(key) {
                let value = value.trim();
                if value.is_empty() {
                    return Err(Error::Config(format!("{} cannot be empty", key)));
                }
                *slot = value.to_string();
            }
        }

        Ok(config)
    }

    fn platform_dir(&self, configuration: &str) -> String {
        format!("{}.{}.{}", self.target_os, self.target_arch, configuration)
    }

    fn is_windows(&self) -> bool {
        self.target_os == "windows"
    }

    /// Extension of the build and test wrapper scripts
    pub fn script_extension(&self) -> &'static str {
        if self.is_windows() {
            "cmd"
        } else {
            "sh"
        }
    }

    /// Repository-relative directory holding the built test wrappers
    pub fn test_binaries_root(&self) -> PathBuf {
        Path::new("artifacts")
            .join("tests")
            .join("coreclr")
            .join(self.platform_dir(&self.libs_configuration))
    }

    /// Repository-relative directory holding the runtime test layout
    pub fn clr_binaries_root(&self) -> PathBuf {
        Path::new("artifacts")
            .join("tests")
            .join("coreclr")
            .join(self.platform_dir(&self.clr_configuration))
    }

    /// Absolute Core_Root directory passed to every test wrapper
    pub fn core_root(&self, repo_root: &Path) -> PathBuf {
        repo_root
            .join(self.clr_binaries_root())
            .join("Tests")
            .join("Core_Root")
    }

    /// Top-level build script of the checkout
    pub fn build_script(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(format!("build.{}", self.script_extension()))
    }

    /// Test tree build script of the checkout
    pub fn tests_build_script(&self, repo_root: &Path) -> PathBuf {
        repo_root
            .join("src")
            .join("tests")
            .join(format!("build.{}", self.script_extension()))
    }

    /// The repo-local dotnet host used to build test projects
    pub fn dotnet(&self, repo_root: &Path) -> PathBuf {
        let name = if self.is_windows() {
            "dotnet.exe"
        } else {
            "dotnet"
        };
        repo_root.join(".dotnet").join(name)
    }
}

/// Stage selection as given on the command line, before normalisation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionFlags {
    pub update_repo: bool,
    pub build_clr_libs: bool,
    pub build_tests: bool,
    pub run_tests: bool,
    pub summarize: bool,
    pub all_actions: bool,
    pub rerun_failed_tests: bool,
}

/// Normalised configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Root of the runtime checkout
    pub repo_root: PathBuf,
    /// Directory receiving `logs/` and `test_results/`
    pub output_dir: PathBuf,
    pub verbose: bool,
    pub update_repo: bool,
    pub build_clr_libs: bool,
    pub build_tests: bool,
    pub run_tests: bool,
    pub summarize: bool,
    pub rerun_failed_tests: bool,
    /// Result file to re-run failures from; all registered suites when None
    pub result_file: Option<PathBuf>,
}

impl PipelineConfig {
    /// Build a configuration, applying the flag precedence rules.
    ///
    /// `all_actions` turns on update, build-libs, build-tests and run-tests.
    /// `rerun_failed_tests` turns every other stage off, `all_actions`
    /// included. The repository root must be an existing directory.
    pub fn new(
        repo_root: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        verbose: bool,
        flags: ActionFlags,
        result_file: Option<PathBuf>,
    ) -> Result<Self> {
        let repo_root = repo_root.into();
        if repo_root.as_os_str().is_empty() {
            return Err(Error::InvalidArgument(
                "Repository root cannot be empty".to_string(),
            ));
        }
        if !repo_root.is_dir() {
            return Err(Error::InvalidArgument(format!(
                "Repository root {} is not a directory",
                repo_root.display()
            )));
        }
        // Must not carry the Windows `\\?\` prefix; cmd.exe cannot run
        // scripts from such a directory.
        let repo_root = std::path::absolute(&repo_root)?;

        // Stages run inside the repository root, so relative paths are
        // anchored to the directory the tool was started from.
        let cwd = std::env::current_dir()?;
        let output_dir = cwd.join(output_dir.into());
        let result_file = result_file.map(|path| cwd.join(path));

        let mut config = PipelineConfig {
            repo_root,
            output_dir,
            verbose,
            update_repo: flags.update_repo,
            build_clr_libs: flags.build_clr_libs,
            build_tests: flags.build_tests,
            run_tests: flags.run_tests,
            summarize: flags.summarize,
            rerun_failed_tests: flags.rerun_failed_tests,
            result_file,
        };

        if flags.all_actions {
            config.update_repo = true;
            config.build_clr_libs = true;
            config.build_tests = true;
            config.run_tests = true;
        }

        if config.rerun_failed_tests {
            config.update_repo = false;
            config.build_clr_libs = false;
            config.build_tests = false;
            config.run_tests = false;
            config.summarize = false;
        }

        Ok(config)
    }

    /// Whether any stage was selected
    pub fn has_actions(&self) -> bool {
        self.update_repo
            || self.build_clr_libs
            || self.build_tests
            || self.run_tests
            || self.summarize
            || self.rerun_failed_tests
    }

    /// Directory receiving Markdown reports
    pub fn results_dir(&self) -> PathBuf {
        self.output_dir.join("test_results")
    }

    /// Directory receiving log files
    pub fn log_dir(&self) -> PathBuf {
        self.output_dir.join("logs")
    }
}
