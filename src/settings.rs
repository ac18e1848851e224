use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flowmark_config::WorkflowSettings;

/// `<config dir>/flowmark/settings.json`
pub fn default_settings_path() -> Option<PathBuf> {
  dirs::config_dir().map(|dir| dir.join("flowmark").join("settings.json"))
}

/// Load settings from an explicit path, or from the default location.
///
/// An explicit path must exist. A missing default file yields the default settings.
pub async fn load_settings(explicit: Option<&Path>) -> Result<WorkflowSettings> {
  match explicit {
    Some(path) => read_settings(path).await,
    None => match default_settings_path() {
      Some(path) if tokio::fs::try_exists(&path).await.unwrap_or(false) => read_settings(&path).await,
      _ => {
        tracing::debug!("no settings file found, using defaults");
        Ok(WorkflowSettings::default())
      }
    },
  }
}

async fn read_settings(path: &Path) -> Result<WorkflowSettings> {
  let content = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read settings file: {}", path.display()))?;

  WorkflowSettings::from_json(&content)
    .with_context(|| format!("failed to parse settings file: {}", path.display()))
}
