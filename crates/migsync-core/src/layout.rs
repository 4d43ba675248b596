//! Project location and working-tree migration discovery.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::migration::{AppMigrationSet, MIGRATIONS_DIR, MigrationFile, is_migration_file};

/// Directory names never searched for apps.
const DEFAULT_EXCLUDES: &[&str] = &[
    "__pycache__",
    "node_modules",
    "site-packages",
    "venv",
];

/// Walk up from `start` to the first directory containing `manage.py`.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("manage.py").is_file())
        .map(Path::to_path_buf)
}

/// Where the Django project sits inside the git working tree.
///
/// App names are project-relative directory paths; git trees are read with
/// repository-relative paths. This type converts between the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    project_root: PathBuf,
    repo_root: PathBuf,
    prefix: String,
    exclude_dirs: Vec<String>,
}

impl ProjectLayout {
    /// Describe a project at `project_root` inside the working tree at `repo_root`.
    ///
    /// # Errors
    /// Returns error if either path can't be resolved or the project is
    /// outside the working tree.
    pub fn new(project_root: &Path, repo_root: &Path) -> Result<Self> {
        let project_root = project_root.canonicalize()?;
        let repo_root = repo_root.canonicalize()?;

        let relative = project_root.strip_prefix(&repo_root).map_err(|_| {
            Error::ProjectOutsideRepository {
                project: project_root.clone(),
                repo: repo_root.clone(),
            }
        })?;

        let prefix = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");

        Ok(Self {
            project_root,
            repo_root,
            prefix,
            exclude_dirs: Vec::new(),
        })
    }

    /// Add directory names to skip during discovery.
    #[must_use]
    pub fn with_exclude_dirs(mut self, dirs: &[String]) -> Self {
        self.exclude_dirs.extend(dirs.iter().cloned());
        self
    }

    /// Absolute project root.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Absolute repository root.
    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Project directory relative to the repository root (`""` if equal).
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Absolute path of a project-relative `/`-separated path.
    #[must_use]
    pub fn absolute(&self, project_path: &str) -> PathBuf {
        project_path
            .split('/')
            .fold(self.project_root.clone(), |path, part| path.join(part))
    }

    /// Whether a directory name is skipped during discovery.
    fn is_excluded_name(&self, name: &str) -> bool {
        name.starts_with('.')
            || DEFAULT_EXCLUDES.contains(&name)
            || self.exclude_dirs.iter().any(|dir| dir == name)
    }

    /// The app owning a repository-relative migrations directory.
    ///
    /// Returns `None` for directories outside the project, at its root, or
    /// under an excluded directory.
    #[must_use]
    pub fn app_for_repo_dir(&self, repo_dir: &str) -> Option<String> {
        let project_dir = if self.prefix.is_empty() {
            repo_dir
        } else {
            repo_dir
                .strip_prefix(self.prefix.as_str())?
                .strip_prefix('/')?
        };

        let app = project_dir.strip_suffix(MIGRATIONS_DIR)?.strip_suffix('/')?;
        if app.is_empty() || app.split('/').any(|part| self.is_excluded_name(part)) {
            return None;
        }
        Some(app.to_string())
    }

    /// Snapshot the migrations present in the working tree.
    ///
    /// # Errors
    /// Returns error if a directory can't be read.
    pub fn scan_local(&self) -> Result<AppMigrationSet> {
        let mut set = AppMigrationSet::new();
        self.scan_dir(&self.project_root, "", &mut set)?;
        Ok(set)
    }

    fn scan_dir(&self, dir: &Path, relative: &str, set: &mut AppMigrationSet) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if self.is_excluded_name(&name) {
                continue;
            }

            if name == MIGRATIONS_DIR {
                if !relative.is_empty() {
                    Self::collect_migrations(&entry.path(), relative, set)?;
                }
                continue;
            }

            let child = if relative.is_empty() {
                name
            } else {
                format!("{relative}/{name}")
            };
            self.scan_dir(&entry.path(), &child, set)?;
        }
        Ok(())
    }

    fn collect_migrations(dir: &Path, app: &str, set: &mut AppMigrationSet) -> Result<()> {
        set.insert_app(app);
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().into_owned();
            if is_migration_file(&filename) {
                set.insert(MigrationFile::new(app, &filename));
            }
        }
        Ok(())
    }
}
