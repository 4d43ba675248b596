//! App selection: explicit `--app` labels and `INSTALLED_APPS`.

use std::collections::BTreeSet;

use crate::migration::app_label;

/// Decides which apps take part in a run.
///
/// An app must pass both the explicit selection (if any) and the
/// installed-apps set (if it could be loaded).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppFilter {
    explicit: Vec<String>,
    installed: Option<BTreeSet<String>>,
}

impl AppFilter {
    /// Accept every app.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to apps named by path or label.
    #[must_use]
    pub fn with_apps(mut self, apps: &[String]) -> Self {
        self.explicit = apps.to_vec();
        self
    }

    /// Restrict to apps listed in `INSTALLED_APPS`.
    ///
    /// Entries are dotted module paths or `AppConfig` paths
    /// (`billing.apps.BillingConfig`). An app directory matches an entry if
    /// its path equals the entry's module path, or the entry's first or last
    /// segment.
    #[must_use]
    pub fn with_installed_apps(mut self, entries: &[String]) -> Self {
        let mut labels = BTreeSet::new();
        for entry in entries {
            let module = entry
                .split_once(".apps.")
                .map_or(entry.as_str(), |(module, _)| module);
            if module.is_empty() {
                continue;
            }

            labels.insert(module.replace('.', "/"));
            if let Some(first) = module.split('.').next() {
                labels.insert(first.to_string());
            }
            if let Some(last) = module.rsplit('.').next() {
                labels.insert(last.to_string());
            }
        }
        self.installed = Some(labels);
        self
    }

    /// Whether `INSTALLED_APPS` restricts this filter.
    #[must_use]
    pub const fn uses_installed_apps(&self) -> bool {
        self.installed.is_some()
    }

    /// Check whether an app (project-relative directory) takes part.
    #[must_use]
    pub fn matches(&self, app: &str) -> bool {
        let explicit_ok = self.explicit.is_empty()
            || self
                .explicit
                .iter()
                .any(|wanted| wanted == app || wanted == app_label(app));

        let installed_ok = self
            .installed
            .as_ref()
            .is_none_or(|labels| labels.contains(app));

        explicit_ok && installed_ok
    }
}
