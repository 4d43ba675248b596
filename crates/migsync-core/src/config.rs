//! Configuration: the optional `migsync.toml` file and the per-run settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::ProjectLayout;

/// Name of the config file looked up at the project root.
pub const CONFIG_FILE: &str = "migsync.toml";

/// Branch used when neither flag, environment nor config names one.
pub const DEFAULT_BRANCH: &str = "dev";

/// migsync configuration loaded from `migsync.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Django-specific settings.
    #[serde(default)]
    pub django: DjangoConfig,
}

impl Config {
    /// Load config from a TOML file.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns error if file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            file: path.to_path_buf(),
            message: e.message().to_string(),
        })
    }

    /// Load `migsync.toml` from a project root.
    ///
    /// # Errors
    /// Returns error if the file exists but can't be read or parsed.
    pub fn load_from_project(project_root: &Path) -> Result<Self> {
        Self::load(project_root.join(CONFIG_FILE))
    }

    /// Reference branch from config, falling back to `dev`.
    #[must_use]
    pub fn default_branch(&self) -> &str {
        self.general
            .default_branch
            .as_deref()
            .unwrap_or(DEFAULT_BRANCH)
    }
}

/// General settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Reference branch when `--branch` and `DEV_BRANCH` are absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

/// Django project settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DjangoConfig {
    /// Interpreter for `manage.py`, relative paths resolved from the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<PathBuf>,

    /// Extra directory names never searched for migrations.
    #[serde(default)]
    pub exclude_dirs: Vec<String>,

    /// Skip the `INSTALLED_APPS` probe and consider every app.
    #[serde(default)]
    pub all_apps: bool,
}

/// Which engine a run drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Discard local-only migrations and return to the reference branch.
    Reset,
    /// Report or regenerate feature-only migrations.
    Resequence,
}

/// Settings for one run, resolved once at start and never mutated.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunConfig {
    /// Reference branch.
    pub branch: String,
    /// Engine to run.
    pub mode: Mode,
    /// Print the plan without executing it.
    pub dry_run: bool,
    /// Reset: leave the current branch checked out.
    pub skip_checkout: bool,
    /// Resequence: delete and regenerate instead of reporting.
    pub apply: bool,
    /// Answer yes to every confirmation.
    pub auto_confirm: bool,
    /// Reset: run even when already on the reference branch.
    pub force: bool,
    /// Reset: roll each affected app back before deleting its files.
    pub unapply: bool,
    /// Apps named on the command line.
    pub apps: Vec<String>,
    /// Where the project and repository live.
    pub layout: ProjectLayout,
    /// Interpreter override for `manage.py`.
    pub python: Option<PathBuf>,
}

impl RunConfig {
    /// A reset-mode config with every flag off.
    #[must_use]
    pub fn new(branch: impl Into<String>, mode: Mode, layout: ProjectLayout) -> Self {
        Self {
            branch: branch.into(),
            mode,
            dry_run: false,
            skip_checkout: false,
            apply: false,
            auto_confirm: false,
            force: false,
            unapply: false,
            apps: Vec::new(),
            layout,
            python: None,
        }
    }
}
