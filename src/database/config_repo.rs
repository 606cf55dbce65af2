// Configuration repository for Chat-Local
// Key/value store for runtime configuration (base URL, API format, model list)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::models::ConfigEntry;
use super::DatabaseManager;

/// Persistence contract for named configuration values.
///
/// `set` is an upsert: the first write creates the row, later writes replace
/// `value` and `updated_at` in place. Errors from the backing store are
/// returned unchanged and never retried here.
pub trait SettingsStore: Send + Sync {
    /// Look up a value; `None` if the key was never written
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Insert or overwrite the value stored under `key`
    fn set(&self, key: &str, value: &serde_json::Value) -> Result<()>;
}

impl SettingsStore for DatabaseManager {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.get_config_entry(key)?.map(|entry| entry.value))
    }

    fn set(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        self.set_config_value(key, value)
    }
}

impl DatabaseManager {
    /// Get a full configuration row by key
    pub fn get_config_entry(&self, key: &str) -> Result<Option<ConfigEntry>> {
        self.with_connection(|conn| {
            get_config_entry_impl(conn, key)
        })
    }

    /// Upsert a configuration value
    pub fn set_config_value(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        self.with_connection(|conn| {
            set_config_value_impl(conn, key, value)
        })
    }

    /// Get all configuration rows ordered by key
    pub fn list_config_entries(&self) -> Result<Vec<ConfigEntry>> {
        self.with_connection(|conn| {
            list_config_entries_impl(conn)
        })
    }
}

fn get_config_entry_impl(conn: &Connection, key: &str) -> Result<Option<ConfigEntry>> {
    let mut stmt = conn.prepare(
        "SELECT key, value, updated_at FROM config WHERE key = ?"
    ).context("Failed to prepare get_config_entry query")?;

    let result = stmt.query_row(params![key], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    });

    match result {
        Ok(raw) => Ok(Some(decode_entry(raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context("Failed to get config entry"),
    }
}

fn set_config_value_impl(conn: &Connection, key: &str, value: &serde_json::Value) -> Result<()> {
    let encoded = serde_json::to_string(value)
        .context("Failed to encode config value")?;
    let now = Utc::now().to_rfc3339();

    conn.execute(
        r#"
        INSERT INTO config (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
        params![key, encoded, now],
    ).context("Failed to set config value")?;

    Ok(())
}

fn list_config_entries_impl(conn: &Connection) -> Result<Vec<ConfigEntry>> {
    let mut stmt = conn.prepare(
        "SELECT key, value, updated_at FROM config ORDER BY key"
    ).context("Failed to prepare list_config_entries query")?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    }).context("Failed to query config entries")?;

    let mut entries = Vec::new();
    for row in rows {
        let raw = row.context("Failed to read config row")?;
        entries.push(decode_entry(raw)?);
    }
    Ok(entries)
}

fn decode_entry((key, value, updated_at): (String, String, String)) -> Result<ConfigEntry> {
    let value = serde_json::from_str(&value)
        .with_context(|| format!("Stored value for '{}' is not valid JSON", key))?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .with_context(|| format!("Stored timestamp for '{}' is not RFC 3339", key))?
        .with_timezone(&Utc);

    Ok(ConfigEntry { key, value, updated_at })
}
