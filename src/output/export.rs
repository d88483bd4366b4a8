//! JSON export of finished sessions

use crate::output::sink::SessionSnapshot;
use crate::WartaError;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes a snapshot as pretty-printed JSON, creating parent directories
///
/// # Errors
///
/// Returns `WartaError::Io` if the file cannot be written and
/// `WartaError::Json` if serialization fails.
pub fn write_session_json(snapshot: &SessionSnapshot, path: &Path) -> Result<(), WartaError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;

    tracing::info!(
        path = %path.display(),
        articles = snapshot.articles.len(),
        errors = snapshot.errors.len(),
        "Session exported"
    );
    Ok(())
}

/// Default export path: `{directory}/{site}_{date}.json`
pub fn default_export_path(directory: &Path, snapshot: &SessionSnapshot) -> PathBuf {
    let date = snapshot.metadata.date_filter.replace('/', "-");
    directory.join(format!("{}_{}.json", snapshot.metadata.site, date))
}
