pub mod fixture;
pub mod remote;
pub mod upload;

use std::path::Path;

use clap::ValueEnum;

use crate::db::{fetch_sales, get_connection};
use crate::error::{PricewiseError, Result};
use crate::models::RawSalesRecord;
use crate::settings::Settings;

use fixture::fixture_records;
use remote::RemoteClient;
use upload::{load_file, UploadFormat};

/// Where sales data should come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SourceChoice {
    /// Remote table when an API URL is configured, otherwise the local store
    #[default]
    Auto,
    Remote,
    Local,
    Fixture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Remote,
    Local,
    Fixture,
    Upload,
}

impl DataOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Remote => "remote table",
            Self::Local => "local store",
            Self::Fixture => "bundled sample data",
            Self::Upload => "uploaded file",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub records: Vec<RawSalesRecord>,
    pub origin: DataOrigin,
    /// Set when the requested source failed or was empty and the fixture was used.
    pub fallback: bool,
    pub notice: Option<String>,
}

fn fetch_remote(settings: &Settings) -> Result<Vec<RawSalesRecord>> {
    RemoteClient::from_settings(settings)?.fetch_sales()
}

fn fetch_local(settings: &Settings) -> Result<Vec<RawSalesRecord>> {
    let path = settings.db_path();
    if !path.exists() {
        return Err(PricewiseError::Other(format!(
            "no local store at {} (run `pricewise init`)",
            path.display()
        )));
    }
    let conn = get_connection(&path)?;
    let rows = fetch_sales(&conn)?;
    tracing::info!(count = rows.len(), "loaded sales rows from local store");
    Ok(rows)
}

fn with_fallback(
    origin: DataOrigin,
    fetched: Result<Vec<RawSalesRecord>>,
) -> Result<LoadOutcome> {
    let reason = match fetched {
        Ok(records) if !records.is_empty() => {
            return Ok(LoadOutcome {
                records,
                origin,
                fallback: false,
                notice: None,
            })
        }
        Ok(_) => format!("{} returned no sales data", origin.label()),
        Err(e) => format!("{} unavailable: {e}", origin.label()),
    };
    tracing::warn!(reason = %reason, "falling back to bundled sample data");
    Ok(LoadOutcome {
        records: fixture_records()?,
        origin: DataOrigin::Fixture,
        fallback: true,
        notice: Some(format!("Using local data: {reason}")),
    })
}

/// Load raw sales records once for a command or dashboard session.
///
/// An uploaded file must parse in full; its errors are returned as-is. Remote
/// and local failures fall back to the bundled fixture without retrying.
pub fn load_records(
    choice: SourceChoice,
    file: Option<&Path>,
    format: Option<UploadFormat>,
    settings: &Settings,
) -> Result<LoadOutcome> {
    if let Some(path) = file {
        return Ok(LoadOutcome {
            records: load_file(path, format)?,
            origin: DataOrigin::Upload,
            fallback: false,
            notice: None,
        });
    }

    match choice {
        SourceChoice::Fixture => Ok(LoadOutcome {
            records: fixture_records()?,
            origin: DataOrigin::Fixture,
            fallback: false,
            notice: None,
        }),
        SourceChoice::Remote => with_fallback(DataOrigin::Remote, fetch_remote(settings)),
        SourceChoice::Local => with_fallback(DataOrigin::Local, fetch_local(settings)),
        SourceChoice::Auto => {
            if settings.resolved_api_url().is_some() {
                with_fallback(DataOrigin::Remote, fetch_remote(settings))
            } else {
                with_fallback(DataOrigin::Local, fetch_local(settings))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_db, insert_sale};
    use crate::models::SalesRecord;

    fn settings_in(dir: &tempfile::TempDir) -> Settings {
        Settings {
            data_dir: dir.path().to_string_lossy().to_string(),
            api_url: None,
            ..Settings::default()
        }
    }

    #[test]
    fn test_fixture_choice_is_not_a_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = load_records(SourceChoice::Fixture, None, None, &settings_in(&dir)).unwrap();
        assert_eq!(outcome.origin, DataOrigin::Fixture);
        assert!(!outcome.fallback);
        assert_eq!(outcome.records.len(), 24);
    }

    #[test]
    fn test_missing_local_store_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = load_records(SourceChoice::Local, None, None, &settings_in(&dir)).unwrap();
        assert!(outcome.fallback);
        assert_eq!(outcome.origin, DataOrigin::Fixture);
        assert!(outcome.notice.unwrap().starts_with("Using local data:"));
    }

    #[test]
    fn test_empty_local_store_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);
        let conn = get_connection(&settings.db_path()).unwrap();
        init_db(&conn).unwrap();
        let outcome = load_records(SourceChoice::Local, None, None, &settings).unwrap();
        assert!(outcome.fallback);
        assert!(outcome.notice.unwrap().contains("no sales data"));
    }

    #[test]
    fn test_local_store_rows() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);
        let conn = get_connection(&settings.db_path()).unwrap();
        init_db(&conn).unwrap();
        let sale = SalesRecord {
            id: "s1".into(),
            product: "Fitness Tracker".into(),
            category: "Wearables".into(),
            quantity: 4.0,
            unit_price: 89.99,
            region: "Florida".into(),
            date: "2023-08-01".into(),
            customer_type: "Regular".into(),
            margin: None,
        };
        insert_sale(&conn, &sale, None).unwrap();
        let outcome = load_records(SourceChoice::Local, None, None, &settings).unwrap();
        assert!(!outcome.fallback);
        assert_eq!(outcome.origin, DataOrigin::Local);
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn test_malformed_upload_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"not": "an array"}"#).unwrap();
        let err = load_records(SourceChoice::Auto, Some(&path), None, &settings_in(&dir)).unwrap_err();
        assert!(matches!(err, PricewiseError::InvalidUpload(_)));
    }
}
