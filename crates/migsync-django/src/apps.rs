//! `INSTALLED_APPS` probe.

use crate::Result;

/// Python code run through `manage.py shell -c` to print `INSTALLED_APPS`
/// as a JSON array on one line.
pub const PROBE_CODE: &str = "import json; from django.conf import settings; \
apps = [x if isinstance(x, str) else (getattr(x, 'label', None) or getattr(x, 'name', str(x))) \
for x in settings.INSTALLED_APPS]; print(json.dumps(apps))";

/// Extract the app list from probe output.
///
/// The shell may print banners or warnings around the JSON, so the first
/// line starting with `[` is parsed. Returns `Ok(None)` if no such line
/// exists or the list is empty.
///
/// # Errors
/// Returns error if the JSON line is malformed.
pub fn parse_probe_output(stdout: &str) -> Result<Option<Vec<String>>> {
    let Some(line) = stdout
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('['))
    else {
        return Ok(None);
    };

    let apps: Vec<String> = serde_json::from_str(line)?;
    let apps: Vec<String> = apps.into_iter().filter(|app| !app.is_empty()).collect();

    Ok((!apps.is_empty()).then_some(apps))
}
