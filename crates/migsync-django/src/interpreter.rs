//! Python interpreter discovery for running `manage.py`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Where the interpreter used for `manage.py` comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpreter {
    /// Explicitly configured path.
    Configured(PathBuf),

    /// The project's own `.venv`.
    ProjectVenv(PathBuf),

    /// The virtual environment named by `VIRTUAL_ENV`.
    ActiveVenv(PathBuf),

    /// Whatever `python3` (or `python` on Windows) resolves to on `PATH`.
    System,
}

impl Interpreter {
    /// Pick the first available interpreter.
    ///
    /// Tries in order: configured path, `<root>/.venv`, `VIRTUAL_ENV`, system.
    #[must_use]
    pub fn discover(project_root: &Path, configured: Option<&Path>) -> Self {
        Self::discover_with(
            project_root,
            configured,
            std::env::var_os("VIRTUAL_ENV"),
        )
    }

    /// Same as [`Interpreter::discover`] with the environment supplied.
    #[must_use]
    pub fn discover_with(
        project_root: &Path,
        configured: Option<&Path>,
        virtual_env: Option<OsString>,
    ) -> Self {
        if let Some(path) = configured {
            return Self::Configured(path.to_path_buf());
        }
        if let Some(python) = venv_python(&project_root.join(".venv")) {
            return Self::ProjectVenv(python);
        }
        if let Some(python) = virtual_env.and_then(|dir| venv_python(Path::new(&dir))) {
            return Self::ActiveVenv(python);
        }
        Self::System
    }

    /// The program to execute.
    #[must_use]
    pub fn program(&self) -> PathBuf {
        match self {
            Self::Configured(path) | Self::ProjectVenv(path) | Self::ActiveVenv(path) => {
                path.clone()
            }
            Self::System if cfg!(windows) => PathBuf::from("python"),
            Self::System => PathBuf::from("python3"),
        }
    }
}

/// Find the interpreter inside a virtual environment directory.
fn venv_python(venv: &Path) -> Option<PathBuf> {
    [
        venv.join("bin").join("python"),
        venv.join("Scripts").join("python.exe"),
    ]
    .into_iter()
    .find(|candidate| candidate.exists())
}
