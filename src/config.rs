//! Configuration.
//!
//! Two layers, kept separate on purpose:
//! - `Settings`: paths and tunables from `config.toml` in the platform
//!   config directory. Missing file means defaults; the store, backups,
//!   analytics, and exports never need anything else.
//! - `AiConfig`: endpoint credentials from the environment (`.env`
//!   supported). Validated in full at gateway construction so a broken
//!   setup fails once, with every problem listed, before the first request.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::backup::DEFAULT_KEEP_DAYS;
use crate::error::{Error, Result};

const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;
const MIN_KEY_LEN: usize = 20;

pub const ENV_ENDPOINT: &str = "SAPI_AI_ENDPOINT";
pub const ENV_KEY: &str = "SAPI_AI_KEY";
pub const ENV_API_VERSION: &str = "SAPI_AI_API_VERSION";
pub const ENV_DEPLOYMENT: &str = "SAPI_AI_DEPLOYMENT";
pub const ENV_TTS_DEPLOYMENT: &str = "SAPI_AI_TTS_DEPLOYMENT";
pub const ENV_STT_DEPLOYMENT: &str = "SAPI_AI_STT_DEPLOYMENT";

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub backup_keep_days: i64,
    pub prediction_min_records: usize,
    pub ai_timeout: Duration,
}

/// Shape of config.toml. Every field optional; absent means default.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    backup_keep_days: Option<i64>,
    prediction_min_records: Option<usize>,
    ai_timeout_secs: Option<u64>,
}

impl Settings {
    pub fn load() -> Result<Settings> {
        let dirs = directories::ProjectDirs::from("", "", "sapi").ok_or_else(|| {
            Error::Config(vec!["could not determine a home directory".to_string()])
        })?;

        let config_path = dirs.config_dir().join("config.toml");
        let file = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(vec![format!("{}: {e}", config_path.display())]))?
        } else {
            FileConfig::default()
        };

        Ok(Settings::from_file(file, dirs.data_dir().to_path_buf()))
    }

    fn from_file(file: FileConfig, default_data_dir: PathBuf) -> Settings {
        let data_dir = file.data_dir.unwrap_or(default_data_dir);
        let backup_dir = data_dir.join("backups");

        Settings {
            data_dir,
            backup_dir,
            backup_keep_days: file.backup_keep_days.unwrap_or(DEFAULT_KEEP_DAYS),
            prediction_min_records: file
                .prediction_min_records
                .unwrap_or(crate::analytics::MIN_RECORDS_FOR_PREDICTION),
            ai_timeout: Duration::from_secs(file.ai_timeout_secs.unwrap_or(DEFAULT_AI_TIMEOUT_SECS)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub deployment: String,
    pub timeout: Duration,
    /// Voice deployments are optional; only the commands that speak or
    /// transcribe require them.
    pub tts_deployment: Option<String>,
    pub stt_deployment: Option<String>,
}

impl AiConfig {
    /// Read and validate the AI environment. Collects every problem instead
    /// of stopping at the first so one failed run shows the whole fix.
    pub fn from_env(timeout: Duration) -> Result<AiConfig> {
        // load .env if present; a missing file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(timeout, |name| std::env::var(name).ok())
    }

    pub fn from_lookup(
        timeout: Duration,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<AiConfig> {
        let mut problems = Vec::new();

        let endpoint = required(&lookup, ENV_ENDPOINT, &mut problems);
        if let Some(endpoint) = &endpoint {
            if !endpoint.starts_with("https://") {
                problems.push(format!("{ENV_ENDPOINT}: must start with https://"));
            }
        }

        let api_key = required(&lookup, ENV_KEY, &mut problems);
        if let Some(key) = &api_key {
            if key.len() < MIN_KEY_LEN {
                problems.push(format!(
                    "{ENV_KEY}: suspiciously short ({} characters)",
                    key.len()
                ));
            }
        }

        let api_version = required(&lookup, ENV_API_VERSION, &mut problems);
        if let Some(version) = &api_version {
            if !version.starts_with("202") {
                problems.push(format!(
                    "{ENV_API_VERSION}: expected a date-form version like 2025-04-01-preview"
                ));
            }
        }

        let deployment = required(&lookup, ENV_DEPLOYMENT, &mut problems);

        match (endpoint, api_key, api_version, deployment) {
            (Some(endpoint), Some(api_key), Some(api_version), Some(deployment))
                if problems.is_empty() =>
            {
                Ok(AiConfig {
                    endpoint,
                    api_key,
                    api_version,
                    deployment,
                    timeout,
                    tts_deployment: lookup(ENV_TTS_DEPLOYMENT).filter(|v| !v.trim().is_empty()),
                    stt_deployment: lookup(ENV_STT_DEPLOYMENT).filter(|v| !v.trim().is_empty()),
                })
            }
            _ => Err(Error::Config(problems)),
        }
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    problems: &mut Vec<String>,
) -> Option<String> {
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        Some(value) => Some(value),
        None => {
            problems.push(format!("{name}: not set"));
            None
        }
    }
}
