//! Repository wrapper providing the git operations migsync needs.

use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{BranchType, ObjectType, TreeWalkMode, TreeWalkResult};

use crate::error::{Error, Result};
use crate::traits::GitOps;

/// High-level wrapper around a git repository.
pub struct Repository {
    inner: git2::Repository,
}

impl Repository {
    /// Open the repository containing the given path.
    ///
    /// # Errors
    /// Returns error if no repository found at path or any parent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = git2::Repository::discover(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                Error::NotARepository
            } else {
                Error::Git2(e)
            }
        })?;
        if inner.is_bare() {
            return Err(Error::BareRepository);
        }
        Ok(Self { inner })
    }

    /// Get the path to the repository root (workdir).
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.inner.workdir()
    }

    /// Get the path to the .git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    // === Branch operations ===

    /// Get the name of the current branch.
    ///
    /// # Errors
    /// Returns error if HEAD is detached.
    pub fn current_branch(&self) -> Result<String> {
        let head = self.inner.head()?;
        if !head.is_branch() {
            return Err(Error::DetachedHead);
        }

        head.shorthand()
            .map(String::from)
            .ok_or(Error::DetachedHead)
    }

    /// Check if a local branch exists.
    #[must_use]
    pub fn branch_exists(&self, name: &str) -> bool {
        self.inner.find_branch(name, BranchType::Local).is_ok()
    }

    /// Check if `name` is a local branch or has a remote-tracking branch
    /// to create one from.
    #[must_use]
    pub fn can_checkout(&self, name: &str) -> bool {
        self.branch_exists(name) || self.find_remote_branch(name).is_some()
    }

    /// Find `<remote>/<name>` among the remote-tracking branches.
    ///
    /// `origin` is tried before any other remote.
    fn find_remote_branch(&self, name: &str) -> Option<git2::Branch<'_>> {
        let remotes = self.inner.remotes().ok()?;
        let mut names: Vec<String> = remotes.iter().flatten().map(String::from).collect();
        names.sort_by_key(|remote| remote.as_str() != "origin");

        names.iter().find_map(|remote| {
            self.inner
                .find_branch(&format!("{remote}/{name}"), BranchType::Remote)
                .ok()
        })
    }

    /// Resolve a reference to a commit.
    ///
    /// # Errors
    /// Returns `RefNotFound` if the reference doesn't resolve to a commit.
    pub fn resolve_commit(&self, reference: &str) -> Result<git2::Commit<'_>> {
        if let Ok(branch) = self.inner.find_branch(reference, BranchType::Local) {
            return Ok(branch.get().peel_to_commit()?);
        }
        if let Some(branch) = self.find_remote_branch(reference) {
            return Ok(branch.get().peel_to_commit()?);
        }

        self.inner
            .revparse_single(reference)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| Error::RefNotFound(reference.into()))
    }

    /// Get the tree of `dir` on `reference`, if that directory exists there.
    fn tree_at(&self, reference: &str, dir: &str) -> Result<Option<git2::Tree<'_>>> {
        let tree = self.resolve_commit(reference)?.tree()?;
        let dir = dir.trim_matches('/');
        if dir.is_empty() {
            return Ok(Some(tree));
        }

        match tree.get_path(Path::new(dir)) {
            Ok(entry) if entry.kind() == Some(ObjectType::Tree) => {
                Ok(Some(self.inner.find_tree(entry.id())?))
            }
            Ok(_) => Ok(None),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List the blob names directly inside `dir` on `reference`.
    ///
    /// # Errors
    /// Returns `RefNotFound` if the reference doesn't exist.
    pub fn list_dir_at(&self, reference: &str, dir: &str) -> Result<Vec<String>> {
        let Some(tree) = self.tree_at(reference, dir)? else {
            return Ok(vec![]);
        };

        let names = tree
            .iter()
            .filter(|entry| entry.kind() == Some(ObjectType::Blob))
            .filter_map(|entry| entry.name().map(String::from))
            .collect();

        Ok(names)
    }

    /// Find directories named `name` below `under` on `reference`.
    ///
    /// # Errors
    /// Returns `RefNotFound` if the reference doesn't exist.
    pub fn find_dirs_at(&self, reference: &str, under: &str, name: &str) -> Result<Vec<String>> {
        let Some(tree) = self.tree_at(reference, under)? else {
            return Ok(vec![]);
        };

        let prefix = match under.trim_matches('/') {
            "" => String::new(),
            under => format!("{under}/"),
        };

        let mut found = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Tree) && entry.name() == Some(name) {
                found.push(format!("{prefix}{root}{name}"));
                return TreeWalkResult::Skip;
            }
            TreeWalkResult::Ok
        })?;

        Ok(found)
    }

    /// Create a local branch from `<remote>/<name>` and track it.
    fn create_tracking_branch(&self, name: &str) -> Result<git2::Branch<'_>> {
        let remote = self
            .find_remote_branch(name)
            .ok_or_else(|| Error::RefNotFound(name.into()))?;
        let commit = remote.get().peel_to_commit()?;
        let upstream = remote.name()?.map(String::from);

        let mut local = self.inner.branch(name, &commit, false)?;
        if let Some(upstream) = upstream {
            local.set_upstream(Some(&upstream))?;
        }
        tracing::debug!(branch = name, "created local branch from remote-tracking branch");

        Ok(local)
    }

    /// Checkout a branch.
    ///
    /// Uses a safe checkout: local modifications that would be overwritten
    /// make the checkout fail instead of being discarded.
    ///
    /// # Errors
    /// Returns error if the branch doesn't exist or checkout fails.
    pub fn checkout(&self, branch_name: &str) -> Result<()> {
        let branch = match self.inner.find_branch(branch_name, BranchType::Local) {
            Ok(branch) => branch,
            Err(_) => self.create_tracking_branch(branch_name)?,
        };

        let object = branch.get().peel(ObjectType::Commit)?;
        let mut options = CheckoutBuilder::new();
        options.safe();

        self.inner
            .checkout_tree(&object, Some(&mut options))
            .map_err(|e| Error::CheckoutFailed {
                branch: branch_name.into(),
                message: e.message().into(),
            })?;
        self.inner.set_head(&format!("refs/heads/{branch_name}"))?;

        Ok(())
    }
}

impl GitOps for Repository {
    fn workdir(&self) -> Option<&Path> {
        self.workdir()
    }

    fn current_branch(&self) -> Result<String> {
        self.current_branch()
    }

    fn ref_exists(&self, reference: &str) -> bool {
        self.resolve_commit(reference).is_ok()
    }

    fn list_dir_at(&self, reference: &str, dir: &str) -> Result<Vec<String>> {
        self.list_dir_at(reference, dir)
    }

    fn find_dirs_at(&self, reference: &str, under: &str, name: &str) -> Result<Vec<String>> {
        self.find_dirs_at(reference, under, name)
    }

    fn can_checkout(&self, branch: &str) -> bool {
        self.can_checkout(branch)
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        self.checkout(branch)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.git_dir())
            .finish()
    }
}
