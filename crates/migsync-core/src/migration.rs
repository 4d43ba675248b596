//! Migration files and per-app migration sets.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::filter::AppFilter;

/// Directory name holding an app's migrations.
pub const MIGRATIONS_DIR: &str = "migrations";

/// Check whether a file name inside a migrations directory is a migration.
#[must_use]
pub fn is_migration_file(filename: &str) -> bool {
    filename.ends_with(".py") && filename != "__init__.py"
}

/// Parse the sequence number from a `NNNN_name.py` file name.
///
/// Returns `None` for names without a numeric prefix followed by `_` and a
/// non-empty remainder.
#[must_use]
pub fn parse_sequence(filename: &str) -> Option<u32> {
    let stem = filename.strip_suffix(".py")?;
    let (digits, rest) = stem.split_once('_')?;
    if digits.is_empty() || rest.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// The label `manage.py` knows an app by: its last path segment.
#[must_use]
pub fn app_label(app: &str) -> &str {
    app.rsplit('/').next().unwrap_or(app)
}

/// Format a sequence number the way Django names files.
#[must_use]
pub fn format_sequence(sequence: Option<u32>) -> String {
    sequence.map_or_else(|| "none".to_string(), |n| format!("{n:04}"))
}

/// A single migration file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MigrationFile {
    /// Owning app, as a project-relative directory path.
    pub app: String,
    /// Number parsed from the file name, if any.
    pub sequence: Option<u32>,
    /// Project-relative path with `/` separators.
    pub path: String,
    /// Raw file name.
    pub filename: String,
}

impl MigrationFile {
    /// Create a migration file entry for `filename` inside `app`.
    #[must_use]
    pub fn new(app: &str, filename: &str) -> Self {
        Self {
            app: app.to_string(),
            sequence: parse_sequence(filename),
            path: format!("{app}/{MIGRATIONS_DIR}/{filename}"),
            filename: filename.to_string(),
        }
    }

    /// Migration name as Django refers to it (file name without `.py`).
    #[must_use]
    pub fn name(&self) -> &str {
        self.filename
            .strip_suffix(".py")
            .unwrap_or(&self.filename)
    }

    /// Whether the file name carries a sequence number.
    #[must_use]
    pub const fn is_numbered(&self) -> bool {
        self.sequence.is_some()
    }
}

impl Ord for MigrationFile {
    // Numbered first by number, unnumbered last; ties broken by name.
    fn cmp(&self, other: &Self) -> Ordering {
        (self.sequence.is_none(), self.sequence, &self.filename, &self.app).cmp(&(
            other.sequence.is_none(),
            other.sequence,
            &other.filename,
            &other.app,
        ))
    }
}

impl PartialOrd for MigrationFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MigrationFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// Migrations grouped by app, each group ordered by sequence number.
///
/// A snapshot of one side (working tree or reference branch); never
/// mutated once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppMigrationSet {
    apps: BTreeMap<String, Vec<MigrationFile>>,
}

impl AppMigrationSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an app, even if it has no migrations.
    pub fn insert_app(&mut self, app: &str) {
        self.apps.entry(app.to_string()).or_default();
    }

    /// Add a migration file, keeping its app's files ordered.
    pub fn insert(&mut self, file: MigrationFile) {
        let files = self.apps.entry(file.app.clone()).or_default();
        let pos = files.binary_search(&file).unwrap_or_else(|pos| pos);
        files.insert(pos, file);
    }

    /// App names in order.
    pub fn apps(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    /// Check whether an app is present.
    #[must_use]
    pub fn contains_app(&self, app: &str) -> bool {
        self.apps.contains_key(app)
    }

    /// Ordered files of an app (empty if unknown).
    #[must_use]
    pub fn files(&self, app: &str) -> &[MigrationFile] {
        self.apps.get(app).map(Vec::as_slice).unwrap_or_default()
    }

    /// Paths of an app's files.
    #[must_use]
    pub fn paths(&self, app: &str) -> BTreeSet<&str> {
        self.files(app).iter().map(|f| f.path.as_str()).collect()
    }

    /// Highest sequence number of an app; unnumbered files never count.
    #[must_use]
    pub fn max_sequence(&self, app: &str) -> Option<u32> {
        self.files(app).iter().filter_map(|f| f.sequence).max()
    }

    /// The highest-numbered migration of an app.
    #[must_use]
    pub fn latest(&self, app: &str) -> Option<&MigrationFile> {
        self.files(app).iter().rev().find(|f| f.is_numbered())
    }

    /// Total number of files across apps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.apps.values().map(Vec::len).sum()
    }

    /// Check if the set holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only apps accepted by the filter.
    #[must_use]
    pub fn filtered(mut self, filter: &AppFilter) -> Self {
        self.apps.retain(|app, _| filter.matches(app));
        self
    }
}
