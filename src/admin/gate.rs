//! Admin authorization gate
//!
//! Admins are listed by email in a comma-separated allow-list. The list is
//! re-read on every check so edits to the environment apply immediately.

use crate::error::{ConfigError, ConfigResult};

/// Environment variable holding the allow-list
pub const ADMIN_EMAILS_ENV: &str = "ADMIN_EMAILS";

#[derive(Debug, Clone)]
enum AllowListSource {
    /// Read from this environment variable on every check
    Env(String),
    /// Fixed comma-separated list
    Static(String),
}

/// Split, trim and lowercase a comma-separated list, dropping blanks
pub fn parse_allow_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect()
}

#[derive(Debug, Clone)]
pub struct AdminGate {
    source: AllowListSource,
}

impl AdminGate {
    pub fn from_env_var(name: impl Into<String>) -> Self {
        Self {
            source: AllowListSource::Env(name.into()),
        }
    }

    pub fn with_allow_list(raw: impl Into<String>) -> Self {
        Self {
            source: AllowListSource::Static(raw.into()),
        }
    }

    fn admin_emails(&self) -> Vec<String> {
        let raw = match &self.source {
            AllowListSource::Env(name) => match std::env::var(name) {
                Ok(raw) => raw,
                Err(_) => {
                    log::warn!("{} is not set. No admins configured.", name);
                    return Vec::new();
                }
            },
            AllowListSource::Static(raw) => raw.clone(),
        };

        parse_allow_list(&raw)
    }

    /// Case- and whitespace-insensitive allow-list membership
    pub fn is_admin(&self, email: Option<&str>) -> bool {
        let Some(email) = email else {
            return false;
        };

        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() {
            return false;
        }

        let is_admin = self.admin_emails().contains(&normalized);
        log::debug!("Admin check for {}: {}", normalized, is_admin);
        is_admin
    }

    pub fn require_admin(&self, email: Option<&str>) -> ConfigResult<()> {
        if self.is_admin(email) {
            Ok(())
        } else {
            log::warn!("Unauthorized admin access attempt: {:?}", email);
            Err(ConfigError::Unauthorized)
        }
    }

    /// The allow-list itself, shown only to admins
    pub fn admin_list(&self, requestor: Option<&str>) -> ConfigResult<Vec<String>> {
        self.require_admin(requestor)?;
        Ok(self.admin_emails())
    }
}

impl Default for AdminGate {
    fn default() -> Self {
        Self::from_env_var(ADMIN_EMAILS_ENV)
    }
}
