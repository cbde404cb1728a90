use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use url::Url;

pub const SETTINGS_FILE: &str = "acu.toml";
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/exec";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientSettings {
    pub fn endpoint_url(&self) -> anyhow::Result<Url> {
        normalize_endpoint(&self.endpoint)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Defaults, then `acu.toml` in the working directory, then environment.
pub fn load_settings() -> ClientSettings {
    load_settings_with(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match raw.parse::<toml::Table>() {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("endpoint").and_then(|v| v.as_str()) {
                    settings.endpoint = v.to_string();
                }
                if let Some(v) = file_cfg
                    .get("timeout_secs")
                    .and_then(|v| v.as_integer())
                    .and_then(|v| u64::try_from(v).ok())
                {
                    settings.timeout_secs = v;
                }
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "ignoring unreadable settings file");
            }
        }
    }

    if let Some(v) = env("ACU_ENDPOINT") {
        settings.endpoint = v;
    }
    if let Some(v) = env("APP__ENDPOINT") {
        settings.endpoint = v;
    }

    for key in ["ACU_TIMEOUT_SECS", "APP__TIMEOUT_SECS"] {
        if let Some(parsed) = env(key).and_then(|v| v.trim().parse::<u64>().ok()) {
            settings.timeout_secs = parsed;
        }
    }

    settings
}

/// Accepts bare `host:port`, a base URL, or a full endpoint URL. A missing
/// scheme becomes `http`, a missing path becomes `/exec`.
pub fn normalize_endpoint(raw_endpoint: &str) -> anyhow::Result<Url> {
    let raw_endpoint = raw_endpoint.trim();
    let raw_endpoint = if raw_endpoint.is_empty() {
        DEFAULT_ENDPOINT.to_string()
    } else if raw_endpoint.contains("://") {
        raw_endpoint.to_string()
    } else {
        format!("http://{raw_endpoint}")
    };

    let mut url = Url::parse(&raw_endpoint)
        .with_context(|| format!("invalid conversion endpoint '{raw_endpoint}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("unsupported endpoint scheme '{}'", url.scheme());
    }
    if url.path().is_empty() || url.path() == "/" {
        url.set_path("/exec");
    }
    Ok(url)
}
