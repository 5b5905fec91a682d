use std::{collections::HashMap, fs, path::Path};

use anyhow::{anyhow, Context};
use serde::Deserialize;
use shared::protocol::ANALYZE_PATH;
use url::Url;

pub const SETTINGS_FILE: &str = "analyzer.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub server_url: String,
    pub analyze_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            analyze_path: ANALYZE_PATH.into(),
        }
    }
}

impl Settings {
    /// Full endpoint URL. A base URL with a path prefix keeps it
    /// (`http://host/app` + `/analyze` -> `http://host/app/analyze`).
    pub fn analyze_url(&self) -> anyhow::Result<Url> {
        let base = self.server_url.trim();
        if base.is_empty() {
            return Err(anyhow!("server url is empty"));
        }
        let mut url =
            Url::parse(base).with_context(|| format!("invalid server url '{base}'"))?;
        if url.cannot_be_a_base() {
            return Err(anyhow!("server url '{base}' cannot carry a path"));
        }

        let prefix = url.path().trim_end_matches('/').to_string();
        let path = self.analyze_path.trim().trim_start_matches('/');
        url.set_path(&format!("{prefix}/{path}"));
        Ok(url)
    }
}

/// Defaults, then `analyzer.toml` in the working directory, then environment.
pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("server_url") {
                    settings.server_url = v.clone();
                }
                if let Some(v) = file_cfg.get("analyze_path") {
                    settings.analyze_path = v.clone();
                }
            }
            Err(err) => {
                tracing::warn!("ignoring malformed settings file '{}': {err}", path.display());
            }
        }
    }

    if let Ok(v) = std::env::var("ANALYZER_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Ok(v) = std::env::var("APP__ANALYZE_PATH") {
        settings.analyze_path = v;
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
