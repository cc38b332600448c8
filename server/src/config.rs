//! Application configuration
//!
//! Central location for validation boundaries, permission names and the
//! runtime settings loaded at startup.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

// ===== Field Limits =====

/// Maximum length of a monitoring name
pub const MONITORING_NAME_MAX_LENGTH: usize = 50;

/// Maximum length of an institution name
pub const INSTITUTION_NAME_MAX_LENGTH: usize = 250;

/// Maximum length of an institution's region
pub const INSTITUTION_REGION_MAX_LENGTH: usize = 250;

/// Maximum length of an institution's contact email
pub const EMAIL_MAX_LENGTH: usize = 254;

/// Maximum length of a question name
pub const QUESTION_NAME_MAX_LENGTH: usize = 250;

/// Maximum length of a choice key. Keys identify a choice within its question.
pub const CHOICE_KEY_MAX_LENGTH: usize = 50;

/// Maximum length of a choice display value
pub const CHOICE_VALUE_MAX_LENGTH: usize = 250;

/// Maximum length of a condition type tag
pub const CONDITION_TYPE_MAX_LENGTH: usize = 50;

/// Maximum length of a condition value
pub const CONDITION_VALUE_MAX_LENGTH: usize = 250;

/// Maximum length of an answer to a `short_text` question.
/// `long_text` answers are unbounded.
pub const SHORT_TEXT_ANSWER_MAX_LENGTH: usize = 250;

/// Maximum length of a generated slug, before any `-N` collision suffix
pub const SLUG_MAX_LENGTH: usize = 50;

// ===== Listing Limits =====

/// Default number of rows per listing page
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Maximum number of autocomplete suggestions
pub const AUTOCOMPLETE_LIMIT: i64 = 10;

// ===== Permissions =====

pub const PERM_ADD_MONITORING: &str = "monitorings.add_monitoring";
pub const PERM_CHANGE_MONITORING: &str = "monitorings.change_monitoring";
pub const PERM_DELETE_MONITORING: &str = "monitorings.delete_monitoring";
pub const PERM_CHANGE_INSTITUTION: &str = "institutions.change_institution";
pub const PERM_DELETE_INSTITUTION: &str = "institutions.delete_institution";

/// Every permission the server checks, for the admin CLI
pub const KNOWN_PERMISSIONS: &[&str] = &[
    PERM_ADD_MONITORING,
    PERM_CHANGE_MONITORING,
    PERM_DELETE_MONITORING,
    PERM_CHANGE_INSTITUTION,
    PERM_DELETE_INSTITUTION,
];

// ===== Runtime Settings =====

/// Server settings, read from an optional JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Address the HTTP listener binds to
    #[serde(default = "default_bind")]
    pub bind: String,
    /// SQLite database file
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// tracing filter used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_database() -> PathBuf {
    PathBuf::from("publikator.db")
}

fn default_log_filter() -> String {
    "publikator=debug,tower_http=info,info".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            database: default_database(),
            log_filter: default_log_filter(),
            page_size: default_page_size(),
        }
    }
}

impl Settings {
    /// Load settings from disk, falling back to defaults when the file is absent
    pub async fn load(path: &Path) -> Result<Settings> {
        if !path.exists() {
            tracing::info!("Settings file {:?} not found, using defaults", path);
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(path).await?;
        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        if settings.page_size == 0 {
            return Err(AppError::Generic(
                "Settings: page_size must be positive".to_string(),
            ));
        }

        Ok(settings)
    }
}
