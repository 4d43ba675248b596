//! Trait abstractions for git operations.
//!
//! This module defines the `GitOps` trait which abstracts the handful of
//! git operations migsync needs, enabling dependency injection and testability.

use std::path::Path;

use crate::Result;

/// Trait for git repository operations.
///
/// This trait abstracts git operations, allowing for:
/// - Dependency injection in the reset and resequence engines
/// - Mock implementations for testing
///
/// References passed to the tree-reading methods may name a local branch,
/// a remote-tracking branch (`dev` resolves `origin/dev` when no local
/// `dev` exists) or any revision git understands.
#[allow(clippy::missing_errors_doc)]
pub trait GitOps {
    // === Repository Info ===

    /// Get the working directory path.
    fn workdir(&self) -> Option<&Path>;

    /// Get the current branch name.
    ///
    /// Returns an error if HEAD is detached or not on a branch.
    fn current_branch(&self) -> Result<String>;

    // === References ===

    /// Check if a reference resolves to a commit.
    fn ref_exists(&self, reference: &str) -> bool;

    /// List the file names recorded directly inside `dir` on `reference`.
    ///
    /// `dir` is relative to the repository root with `/` separators.
    /// A directory missing on the reference yields an empty list.
    fn list_dir_at(&self, reference: &str, dir: &str) -> Result<Vec<String>>;

    /// Find every directory named `name` below `under` on `reference`.
    ///
    /// Returned paths are relative to the repository root. Matching
    /// directories are not searched further.
    fn find_dirs_at(&self, reference: &str, under: &str, name: &str) -> Result<Vec<String>>;

    // === Branch Operations ===

    /// Check if `branch` can be checked out: a local branch, or a
    /// remote-tracking `<remote>/<branch>` a local branch can be created from.
    ///
    /// Tags, commit ids and spelled-out remote refs like `origin/dev` resolve
    /// for reading but are not branches.
    fn can_checkout(&self, branch: &str) -> bool;

    /// Checkout a branch, creating it from its remote-tracking branch if
    /// only that exists.
    fn checkout(&self, branch: &str) -> Result<()>;
}
