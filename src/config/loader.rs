use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "reqlab.json";

const DEFAULT_TIMEOUT_SECONDS: f64 = 30.0;
const DEFAULT_HISTORY_MAX_ITEMS: usize = 500;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "requestTimeoutSeconds")]
    pub request_timeout_seconds: f64,
    #[serde(rename = "dataFile")]
    pub data_file: PathBuf,
    #[serde(rename = "historyMaxItems")]
    pub history_max_items: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            data_file: PathBuf::from("data").join("reqlab.json"),
            history_max_items: DEFAULT_HISTORY_MAX_ITEMS,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_timeout_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECONDS))
    }
}

/// Loads settings for `target`, which is either a directory holding
/// `reqlab.json` or the path of a config file.
///
/// A `.env` next to the config is read first; `REQLAB_*` variables then
/// override file values. A relative `dataFile` resolves against the config
/// directory.
pub fn load_settings(target: &Path) -> Result<Settings> {
    let resolved = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()?.join(target)
    };

    let (file_path, dir) = if resolved.is_dir() {
        (resolved.join(CONFIG_FILE_NAME), resolved)
    } else {
        let dir = resolved
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (resolved, dir)
    };

    let dotenv_path = dir.join(".env");
    if dotenv_path.exists() {
        dotenvy::from_path(&dotenv_path)
            .with_context(|| format!("loading {}", dotenv_path.display()))?;
    }

    let mut settings = if file_path.exists() {
        let contents = fs::read_to_string(&file_path)
            .with_context(|| format!("reading config {}", file_path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing config {}", file_path.display()))?
    } else {
        Settings::default()
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;

    if settings.data_file.is_relative() {
        settings.data_file = dir.join(&settings.data_file);
    }

    tracing::debug!(
        config = %file_path.display(),
        data_file = %settings.data_file.display(),
        timeout_s = settings.request_timeout_seconds,
        "settings loaded"
    );

    Ok(settings)
}

fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(raw) = lookup("REQLAB_REQUEST_TIMEOUT_SECONDS") {
        settings.request_timeout_seconds = raw
            .trim()
            .parse()
            .with_context(|| format!("REQLAB_REQUEST_TIMEOUT_SECONDS is not a number: {raw}"))?;
    }
    if let Some(raw) = lookup("REQLAB_DATA_FILE") {
        settings.data_file = PathBuf::from(raw);
    }
    if let Some(raw) = lookup("REQLAB_HISTORY_MAX_ITEMS") {
        settings.history_max_items = raw
            .trim()
            .parse()
            .with_context(|| format!("REQLAB_HISTORY_MAX_ITEMS is not a number: {raw}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn defaults_when_config_missing() -> Result<()> {
        let temp = tempdir()?;
        let settings = load_settings(temp.path())?;
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.history_max_items, 500);
        assert_eq!(settings.data_file, temp.path().join("data").join("reqlab.json"));
        Ok(())
    }

    #[test]
    fn loads_config_from_directory() -> Result<()> {
        let temp = tempdir()?;
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            r#"{"requestTimeoutSeconds": 2.5, "dataFile": "store.json"}"#,
        )?;

        let settings = load_settings(temp.path())?;
        assert_eq!(settings.request_timeout(), Duration::from_millis(2500));
        assert_eq!(settings.data_file, temp.path().join("store.json"));
        assert_eq!(settings.history_max_items, 500);
        Ok(())
    }

    #[test]
    fn rejects_malformed_config() -> Result<()> {
        let temp = tempdir()?;
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "{not json")?;
        let err = load_settings(temp.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
        Ok(())
    }

    #[test]
    fn env_overrides_win() -> Result<()> {
        let vars: HashMap<&str, &str> = [
            ("REQLAB_REQUEST_TIMEOUT_SECONDS", "5"),
            ("REQLAB_DATA_FILE", "/tmp/other.json"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |key| vars.get(key).map(|v| v.to_string()))?;
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
        assert_eq!(settings.data_file, PathBuf::from("/tmp/other.json"));
        Ok(())
    }

    #[test]
    fn invalid_timeout_override_is_reported() {
        let mut settings = Settings::default();
        let err = apply_env_overrides(&mut settings, |key| {
            (key == "REQLAB_REQUEST_TIMEOUT_SECONDS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("not a number"));
    }
}
