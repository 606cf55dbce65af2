//! Process-level settings read once at startup

use std::path::PathBuf;
use std::time::Duration;

use crate::admin::ADMIN_EMAILS_ENV;
use crate::llm_config::env::EnvDefaults;
use crate::llm_engine::assembler::DEFAULT_REQUEST_TIMEOUT;
use crate::llm_engine::probe::DEFAULT_PROBE_TIMEOUT;

pub const DB_PATH_ENV: &str = "CHAT_LOCAL_DB_PATH";
pub const PROBE_TIMEOUT_ENV: &str = "OLLAMA_PROBE_TIMEOUT_SECS";
pub const REQUEST_TIMEOUT_ENV: &str = "OLLAMA_REQUEST_TIMEOUT_SECS";

const APP_DIR_NAME: &str = "chat-local";
const DB_FILE_NAME: &str = "chat-local.db";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// Server defaults used when nothing is stored
    pub env_defaults: EnvDefaults,
    /// Variable the admin gate re-reads on every check
    pub admin_emails_var: String,
    pub probe_timeout: Duration,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup(DB_PATH_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        Self {
            db_path,
            env_defaults: EnvDefaults::from_lookup(&lookup),
            admin_emails_var: ADMIN_EMAILS_ENV.to_string(),
            probe_timeout: timeout_secs(&lookup, PROBE_TIMEOUT_ENV, DEFAULT_PROBE_TIMEOUT),
            request_timeout: timeout_secs(&lookup, REQUEST_TIMEOUT_ENV, DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(DB_FILE_NAME)
}

fn timeout_secs<F>(lookup: &F, name: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => default,
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                log::warn!("Ignoring {}={:?}, using {}s", name, raw, default.as_secs());
                default
            }
        },
    }
}
