//! Error types for migsync-core.

use std::path::PathBuf;

use crate::plan::ExecutionFailure;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in migsync-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No `manage.py` found walking up from the start directory.
    #[error("could not find manage.py in {0} or any parent - run from a Django project")]
    ProjectNotFound(PathBuf),

    /// Not inside a Git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepository,

    /// The project root is not inside the repository's working tree.
    #[error("project root {project} is outside the repository at {repo}")]
    ProjectOutsideRepository { project: PathBuf, repo: PathBuf },

    /// Reference branch missing locally and on every remote.
    #[error("branch '{0}' does not exist")]
    RefNotFound(String),

    /// The reference resolves to a commit but cannot be checked out as a branch.
    #[error("'{0}' is not a branch - pass a branch name or use --skip-checkout")]
    NotABranch(String),

    /// `migrate` exited non-zero.
    #[error("migrate failed (exit code {code})")]
    MigrateFailed { code: String },

    /// `makemigrations` exited non-zero for an app.
    #[error("makemigrations failed for '{app}' (exit code {code})")]
    GenerationFailed { app: String, code: String },

    /// A migration file could not be removed.
    #[error("failed to delete {path}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The working tree lacks migrations the reference branch has.
    #[error(
        "'{app}' is missing {} migration(s) from the reference branch ({}) - rebase first",
        missing.len(),
        missing.join(", ")
    )]
    BehindReference { app: String, missing: Vec<String> },

    /// Config file parsing error.
    #[error("failed to parse {file}: {message}")]
    ConfigParse { file: PathBuf, message: String },

    /// A step of an execution plan failed.
    #[error(transparent)]
    Execution(Box<ExecutionFailure>),

    /// IO error.
    #[error("io error")]
    Io(#[from] std::io::Error),

    /// Git operation error.
    #[error("git error")]
    Git(#[source] migsync_git::Error),

    /// `manage.py` could not be run.
    #[error("manage.py error")]
    Tool(#[from] migsync_django::Error),
}

impl From<migsync_git::Error> for Error {
    fn from(err: migsync_git::Error) -> Self {
        match err {
            migsync_git::Error::RefNotFound(name) => Self::RefNotFound(name),
            migsync_git::Error::NotARepository => Self::NotARepository,
            other => Self::Git(other),
        }
    }
}

impl From<ExecutionFailure> for Error {
    fn from(failure: ExecutionFailure) -> Self {
        Self::Execution(Box::new(failure))
    }
}
