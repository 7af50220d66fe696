use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::elasticity::{default_coefficients, ElasticityTable, DEFAULT_ELASTICITY};
use crate::error::{PricewiseError, Result};

pub const API_URL_ENV: &str = "PRICEWISE_API_URL";
pub const API_KEY_ENV: &str = "PRICEWISE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default = "default_sales_table")]
    pub sales_table: String,
    #[serde(default = "default_coefficients")]
    pub elasticity: BTreeMap<String, f64>,
    #[serde(default = "default_elasticity")]
    pub default_elasticity: f64,
}

fn default_sales_table() -> String {
    "sales".to_string()
}

fn default_elasticity() -> f64 {
    DEFAULT_ELASTICITY
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            user_name: String::new(),
            api_url: None,
            sales_table: default_sales_table(),
            elasticity: default_coefficients(),
            default_elasticity: DEFAULT_ELASTICITY,
        }
    }
}

impl Settings {
    pub fn elasticity_table(&self) -> ElasticityTable {
        ElasticityTable::with_overrides(&self.elasticity, self.default_elasticity)
    }

    /// API base URL, with the environment taking precedence over the file.
    pub fn resolved_api_url(&self) -> Option<String> {
        std::env::var(API_URL_ENV)
            .ok()
            .or_else(|| self.api_url.clone())
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("pricewise.db")
    }
}

/// API key from the environment (or `.env`). Never persisted.
pub fn api_key() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty())
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("pricewise")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("pricewise")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable settings, using defaults");
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| PricewiseError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test", "user_name": "Bob"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.user_name, "Bob");
        assert_eq!(s.sales_table, "sales");
        assert_eq!(s.default_elasticity, -1.0);
        assert_eq!(s.elasticity.get("Apparel"), Some(&-1.5));
        assert!(s.api_url.is_none());
    }

    #[test]
    fn test_roundtrip_keeps_elasticity_overrides() {
        let mut settings = Settings {
            data_dir: "/tmp/test".to_string(),
            api_url: Some("https://example.supabase.co".to_string()),
            ..Settings::default()
        };
        settings.elasticity.insert("Toys".to_string(), -0.4);
        let json = serde_json::to_string_pretty(&settings).unwrap();
        assert!(!json.contains("api_key"));
        let loaded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.elasticity_table().coefficient("Toys"), -0.4);
        assert_eq!(loaded.api_url.as_deref(), Some("https://example.supabase.co"));
    }

    #[test]
    fn test_db_path_inside_data_dir() {
        let s = Settings {
            data_dir: "/tmp/pw".to_string(),
            ..Settings::default()
        };
        assert_eq!(s.db_path(), PathBuf::from("/tmp/pw/pricewise.db"));
    }
}
