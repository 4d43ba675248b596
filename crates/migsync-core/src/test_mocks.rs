//! Mock implementations for testing the engines.
//!
//! These mocks implement the traits from migsync-git, migsync-django and
//! the gate so engine logic can be tested without a real repository,
//! interpreter or terminal.

#![allow(clippy::unwrap_used)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;

use migsync_django::{ManageCommand, ManageTool, Result as ToolResult, ToolOutcome};
use migsync_git::{Error as GitError, GitOps, Result as GitResult};
use tempfile::TempDir;

use crate::gate::Prompter;
use crate::layout::ProjectLayout;

/// Create a project (which is also the repository root) holding
/// `manage.py` and the given files.
pub fn project_with(files: &[&str]) -> (TempDir, ProjectLayout) {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("manage.py"), "").unwrap();
    for file in files {
        let path = temp.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }
    let layout = ProjectLayout::new(temp.path(), temp.path()).unwrap();
    (temp, layout)
}

/// Mock implementation of `GitOps` serving branch trees from file lists.
pub struct MockGitOps {
    pub current_branch: RefCell<Option<String>>,
    pub branch_files: RefCell<HashMap<String, Vec<String>>>,
    pub revisions: RefCell<HashSet<String>>,
    pub checkouts: RefCell<Vec<String>>,
    pub checkout_should_fail: Cell<bool>,
}

impl Default for MockGitOps {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGitOps {
    pub fn new() -> Self {
        Self {
            current_branch: RefCell::new(Some("feature".to_string())),
            branch_files: RefCell::new(HashMap::new()),
            revisions: RefCell::new(HashSet::new()),
            checkouts: RefCell::new(Vec::new()),
            checkout_should_fail: Cell::new(false),
        }
    }

    /// Register a branch whose tree holds `files` (repository-relative).
    pub fn with_branch_files(self, branch: &str, files: &[&str]) -> Self {
        self.branch_files.borrow_mut().insert(
            branch.to_string(),
            files.iter().map(ToString::to_string).collect(),
        );
        self
    }

    /// Register a revision (tag, commit id, `origin/dev`) that resolves
    /// like a branch but cannot be checked out as one.
    pub fn with_revision_files(self, revision: &str, files: &[&str]) -> Self {
        self.revisions.borrow_mut().insert(revision.to_string());
        self.with_branch_files(revision, files)
    }

    pub fn with_checkout_failure(self) -> Self {
        self.checkout_should_fail.set(true);
        self
    }

    /// Branches checked out so far.
    pub fn checkouts(&self) -> Vec<String> {
        self.checkouts.borrow().clone()
    }

    fn files(&self, reference: &str) -> GitResult<Vec<String>> {
        self.branch_files
            .borrow()
            .get(reference)
            .cloned()
            .ok_or_else(|| GitError::RefNotFound(reference.to_string()))
    }
}

impl GitOps for MockGitOps {
    fn workdir(&self) -> Option<&Path> {
        None
    }

    fn current_branch(&self) -> GitResult<String> {
        self.current_branch
            .borrow()
            .clone()
            .ok_or(GitError::DetachedHead)
    }

    fn ref_exists(&self, reference: &str) -> bool {
        self.branch_files.borrow().contains_key(reference)
    }

    fn list_dir_at(&self, reference: &str, dir: &str) -> GitResult<Vec<String>> {
        let prefix = format!("{dir}/");
        Ok(self
            .files(reference)?
            .iter()
            .filter_map(|file| file.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(ToString::to_string)
            .collect())
    }

    fn find_dirs_at(&self, reference: &str, under: &str, name: &str) -> GitResult<Vec<String>> {
        let mut dirs = BTreeSet::new();
        for file in self.files(reference)? {
            let Some((dir, _)) = file.rsplit_once('/') else {
                continue;
            };
            if !under.is_empty() && !dir.starts_with(&format!("{under}/")) {
                continue;
            }
            if dir.rsplit('/').next() == Some(name) {
                dirs.insert(dir.to_string());
            }
        }
        Ok(dirs.into_iter().collect())
    }

    fn can_checkout(&self, branch: &str) -> bool {
        self.ref_exists(branch) && !self.revisions.borrow().contains(branch)
    }

    fn checkout(&self, branch: &str) -> GitResult<()> {
        if !self.can_checkout(branch) {
            return Err(GitError::RefNotFound(branch.to_string()));
        }
        if self.checkout_should_fail.get() {
            return Err(GitError::CheckoutFailed {
                branch: branch.to_string(),
                message: "local changes would be overwritten".to_string(),
            });
        }
        self.checkouts.borrow_mut().push(branch.to_string());
        *self.current_branch.borrow_mut() = Some(branch.to_string());
        Ok(())
    }
}

/// Mock implementation of `ManageTool` recording every command.
pub struct MockManageTool {
    pub calls: RefCell<Vec<ManageCommand>>,
    pub migrate_should_fail: Cell<bool>,
    pub failing_apps: RefCell<Vec<String>>,
}

impl Default for MockManageTool {
    fn default() -> Self {
        Self::new()
    }
}

impl MockManageTool {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            migrate_should_fail: Cell::new(false),
            failing_apps: RefCell::new(Vec::new()),
        }
    }

    /// Make every `migrate` invocation exit with status 1.
    pub fn failing_migrate(self) -> Self {
        self.migrate_should_fail.set(true);
        self
    }

    /// Make `makemigrations <label>` exit with status 1.
    pub fn failing_app(self, label: &str) -> Self {
        self.failing_apps.borrow_mut().push(label.to_string());
        self
    }

    /// Commands run so far.
    pub fn calls(&self) -> Vec<ManageCommand> {
        self.calls.borrow().clone()
    }
}

impl ManageTool for MockManageTool {
    fn run(&self, command: &ManageCommand) -> ToolResult<ToolOutcome> {
        self.calls.borrow_mut().push(command.clone());

        let fails = match command {
            ManageCommand::Migrate | ManageCommand::MigrateTo { .. } => {
                self.migrate_should_fail.get()
            }
            ManageCommand::MakeMigrations { app } => self.failing_apps.borrow().contains(app),
            ManageCommand::Shell { .. } => false,
        };

        Ok(ToolOutcome::exited(i32::from(fails)))
    }

    fn command_line(&self, command: &ManageCommand) -> String {
        format!("python manage.py {}", command.args().join(" "))
    }

    fn installed_apps(&self) -> Option<Vec<String>> {
        None
    }
}

/// Mock implementation of `Prompter` with a canned reply.
pub struct MockPrompter {
    pub reply: Option<String>,
    pub asked: Cell<usize>,
}

impl MockPrompter {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            asked: Cell::new(0),
        }
    }

    pub fn accepting() -> Self {
        Self::replying("y")
    }

    pub fn declining() -> Self {
        Self::replying("n")
    }

    /// Input closed before an answer.
    pub fn eof() -> Self {
        Self {
            reply: None,
            asked: Cell::new(0),
        }
    }

    /// Number of prompts shown.
    pub fn asked(&self) -> usize {
        self.asked.get()
    }
}

impl Prompter for MockPrompter {
    fn ask(&self, _prompt: &str) -> Option<String> {
        self.asked.set(self.asked.get() + 1);
        self.reply.clone()
    }
}
