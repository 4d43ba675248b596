use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use migsync_core::{AppFilter, Config, Error, Mode, ProjectLayout, RunConfig, find_project_root};
use migsync_django::{Interpreter, ManagePy, ManageTool};
use migsync_git::Repository;

use super::Cli;
use crate::output;

/// Everything a run needs, resolved once at startup.
pub struct RunContext {
    pub repo: Repository,
    pub tool: ManagePy,
    pub config: RunConfig,
    pub filter: AppFilter,
}

/// Locate the project, open the repository and resolve settings.
pub fn build_context(cli: &Cli, mode: Mode) -> Result<RunContext> {
    let project_root = resolve_project_root(cli.project_root.as_deref())?;
    tracing::debug!(root = %project_root.display(), "project root");

    let repo = Repository::open(&project_root).context("Not inside a git repository")?;
    let workdir = repo.workdir().context("Cannot run in bare repository")?;

    let file_config = Config::load_from_project(&project_root)?;
    let layout = ProjectLayout::new(&project_root, workdir)?
        .with_exclude_dirs(&file_config.django.exclude_dirs);

    let branch = cli
        .branch
        .clone()
        .unwrap_or_else(|| file_config.default_branch().to_string());

    let config = RunConfig {
        dry_run: cli.dry_run,
        skip_checkout: cli.skip_checkout,
        apply: cli.apply,
        auto_confirm: cli.yes,
        force: cli.force,
        unapply: cli.unapply,
        apps: cli.apps.clone(),
        python: file_config
            .django
            .python
            .as_ref()
            .map(|path| project_root.join(path)),
        ..RunConfig::new(branch, mode, layout)
    };

    let interpreter = Interpreter::discover(&project_root, config.python.as_deref());
    tracing::debug!(interpreter = ?interpreter, "python interpreter");
    let tool = ManagePy::new(&project_root, interpreter)?.with_stdout_to_stderr(cli.json);

    let filter = app_filter(&config, &file_config, &tool);

    Ok(RunContext {
        repo,
        tool,
        config,
        filter,
    })
}

/// The explicit root (which must contain `manage.py`) or the nearest
/// ancestor of the current directory that does.
fn resolve_project_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(root) = explicit {
        if !root.join("manage.py").is_file() {
            return Err(Error::ProjectNotFound(root.to_path_buf()).into());
        }
        // manage.py runs with the root as its working directory; keep paths absolute.
        return root
            .canonicalize()
            .map_err(|_| Error::ProjectNotFound(root.to_path_buf()).into());
    }

    let cwd = std::env::current_dir().context("Cannot read current directory")?;
    find_project_root(&cwd).ok_or_else(|| Error::ProjectNotFound(cwd).into())
}

fn app_filter<M: ManageTool>(config: &RunConfig, file_config: &Config, tool: &M) -> AppFilter {
    let filter = AppFilter::all().with_apps(&config.apps);
    if file_config.django.all_apps {
        return filter;
    }

    match tool.installed_apps() {
        Some(apps) => {
            tracing::debug!(count = apps.len(), "INSTALLED_APPS loaded");
            filter.with_installed_apps(&apps)
        }
        None => {
            output::warn("Could not load INSTALLED_APPS - including all apps in the repository");
            filter
        }
    }
}
