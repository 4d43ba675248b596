//! Error types for migsync-git.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not inside a git repository.
    #[error("not a git repository")]
    NotARepository,

    /// Repository has no working directory.
    #[error("repository is bare - a working tree is required")]
    BareRepository,

    /// Reference (branch, remote-tracking branch or revision) not found.
    #[error("reference not found: {0}")]
    RefNotFound(String),

    /// HEAD is detached (not on a branch).
    #[error("HEAD is detached - checkout a branch first")]
    DetachedHead,

    /// Checkout could not be completed.
    #[error("checkout of '{branch}' failed: {message}")]
    CheckoutFailed {
        /// Branch being checked out.
        branch: String,
        /// Underlying failure.
        message: String,
    },

    /// Underlying git2 error.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}
