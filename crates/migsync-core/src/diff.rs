//! Branch diff: which migrations exist only locally or only on the
//! reference branch.

use std::collections::BTreeMap;

use migsync_git::GitOps;

use crate::error::{Error, Result};
use crate::filter::AppFilter;
use crate::layout::ProjectLayout;
use crate::migration::{AppMigrationSet, MIGRATIONS_DIR, MigrationFile, is_migration_file};

/// Difference for one app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppDiff {
    /// App (project-relative directory).
    pub app: String,
    /// In the working tree, not on the reference branch.
    pub local_only: Vec<MigrationFile>,
    /// On the reference branch, not in the working tree.
    pub remote_only: Vec<MigrationFile>,
}

impl AppDiff {
    /// Check if both sides agree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.local_only.is_empty() && self.remote_only.is_empty()
    }
}

/// Per-app differences between the working tree and a reference branch,
/// together with both snapshots.
#[derive(Debug, Clone)]
pub struct DiffResult {
    /// Reference branch the diff was computed against.
    pub branch: String,
    /// Working-tree snapshot.
    pub local: AppMigrationSet,
    /// Reference-branch snapshot.
    pub remote: AppMigrationSet,
    apps: BTreeMap<String, AppDiff>,
}

impl DiffResult {
    /// Compute the per-app set differences of two snapshots.
    ///
    /// Files are compared by project-relative path.
    #[must_use]
    pub fn from_snapshots(
        branch: impl Into<String>,
        local: AppMigrationSet,
        remote: AppMigrationSet,
    ) -> Self {
        let mut apps = BTreeMap::new();

        for app in local.apps().chain(remote.apps()) {
            if apps.contains_key(app) {
                continue;
            }

            let local_paths = local.paths(app);
            let remote_paths = remote.paths(app);

            let diff = AppDiff {
                app: app.to_string(),
                local_only: local
                    .files(app)
                    .iter()
                    .filter(|f| !remote_paths.contains(f.path.as_str()))
                    .cloned()
                    .collect(),
                remote_only: remote
                    .files(app)
                    .iter()
                    .filter(|f| !local_paths.contains(f.path.as_str()))
                    .cloned()
                    .collect(),
            };
            apps.insert(app.to_string(), diff);
        }

        Self {
            branch: branch.into(),
            local,
            remote,
            apps,
        }
    }

    /// Diff of one app.
    #[must_use]
    pub fn app(&self, app: &str) -> Option<&AppDiff> {
        self.apps.get(app)
    }

    /// All app diffs in app order, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = &AppDiff> {
        self.apps.values()
    }

    /// Number of local-only files across apps.
    #[must_use]
    pub fn local_only_count(&self) -> usize {
        self.apps.values().map(|d| d.local_only.len()).sum()
    }

    /// Check if no app differs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.values().all(AppDiff::is_empty)
    }
}

/// Snapshot the migrations recorded on `branch` without checking it out.
fn remote_snapshot<G: GitOps>(
    repo: &G,
    layout: &ProjectLayout,
    branch: &str,
) -> Result<AppMigrationSet> {
    let mut set = AppMigrationSet::new();

    for dir in repo.find_dirs_at(branch, layout.prefix(), MIGRATIONS_DIR)? {
        let Some(app) = layout.app_for_repo_dir(&dir) else {
            continue;
        };

        set.insert_app(&app);
        for name in repo.list_dir_at(branch, &dir)? {
            if is_migration_file(&name) {
                set.insert(MigrationFile::new(&app, &name));
            }
        }
    }

    Ok(set)
}

/// Compute the migration diff between the working tree and `branch`.
///
/// # Errors
/// Returns `RefNotFound` if the branch doesn't exist locally or on a
/// remote, or a git/IO error if either snapshot can't be read.
pub fn compute_diff<G: GitOps>(
    repo: &G,
    layout: &ProjectLayout,
    branch: &str,
    filter: &AppFilter,
) -> Result<DiffResult> {
    if !repo.ref_exists(branch) {
        return Err(Error::RefNotFound(branch.to_string()));
    }

    let local = layout.scan_local()?.filtered(filter);
    let remote = remote_snapshot(repo, layout, branch)?.filtered(filter);
    tracing::debug!(
        branch,
        local = local.len(),
        remote = remote.len(),
        "migration snapshots loaded"
    );

    Ok(DiffResult::from_snapshots(branch, local, remote))
}
