//! Runtime configuration
//!
//! Everything is read from environment variables with sensible defaults.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::api::Session;
use crate::models::DEFAULT_SERVE_SIZE;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_USER: &str = "admin";
pub const DEFAULT_COA_LIST_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Recorded as `created_by` on saved formulations
    pub user_email: String,
    pub export_dir: PathBuf,
    pub default_serve_size: f64,
    pub coa_list_limit: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let default_serve_size = positive_or(
            "NUTRIEYEQ_DEFAULT_SERVE_SIZE",
            parse_or(
                "NUTRIEYEQ_DEFAULT_SERVE_SIZE",
                get("NUTRIEYEQ_DEFAULT_SERVE_SIZE"),
                DEFAULT_SERVE_SIZE,
            ),
            DEFAULT_SERVE_SIZE,
        );

        Self {
            api_url: get("NUTRIEYEQ_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            access_token: get("NUTRIEYEQ_ACCESS_TOKEN"),
            refresh_token: get("NUTRIEYEQ_REFRESH_TOKEN"),
            user_email: get("NUTRIEYEQ_USER_EMAIL").unwrap_or_else(|| DEFAULT_USER.to_string()),
            export_dir: get("NUTRIEYEQ_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_export_dir),
            default_serve_size,
            coa_list_limit: parse_or(
                "NUTRIEYEQ_COA_LIST_LIMIT",
                get("NUTRIEYEQ_COA_LIST_LIMIT"),
                DEFAULT_COA_LIST_LIMIT,
            ),
        }
    }

    /// Session seeded from the configured tokens
    pub fn session(&self) -> Session {
        Session {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            user_email: Some(self.user_email.clone()),
        }
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={}", key, raw);
            default
        }),
        None => default,
    }
}

/// Serve sizes divide nutrient totals, so only finite positive values are kept
fn positive_or(key: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        warn!("Ignoring non-positive {}={}", key, value);
        default
    }
}

/// `exports/` under the project root when running from target/, else next
/// to the executable
fn default_export_dir() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("exports");
    path
}
