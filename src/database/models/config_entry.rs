// Database models - Runtime configuration entries
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single configuration row stored in the database.
///
/// `value` is an arbitrary JSON document; the table never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
