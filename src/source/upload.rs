use std::path::Path;

use serde_json::Value;

use crate::error::{PricewiseError, Result};
use crate::export::read_csv;
use crate::models::RawSalesRecord;

// ---------------------------------------------------------------------------
// Upload formats, dispatched by enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Json,
    Csv,
}

impl UploadFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        [Self::Json, Self::Csv]
            .into_iter()
            .find(|f| f.key() == key.to_lowercase())
    }

    /// By extension, then by the first non-blank byte of the content.
    pub fn detect(file_path: &Path, content: &str) -> Self {
        match file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => match content.trim_start().chars().next() {
                Some('[') | Some('{') => Self::Json,
                _ => Self::Csv,
            },
        }
    }

    pub fn parse(&self, content: &str) -> Result<Vec<RawSalesRecord>> {
        match self {
            Self::Json => parse_json(content),
            Self::Csv => read_csv(content.as_bytes())
                .map_err(|e| PricewiseError::InvalidUpload(format!("could not read CSV: {e}"))),
        }
    }
}

/// Parse a JSON array of sales records in either shape.
pub fn parse_json(content: &str) -> Result<Vec<RawSalesRecord>> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| PricewiseError::InvalidUpload(format!("not valid JSON: {e}")))?;
    let Value::Array(items) = value else {
        return Err(PricewiseError::InvalidUpload(
            "Uploaded file must contain an array of sales data".into(),
        ));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(PricewiseError::InvalidUpload(format!(
                    "entry {i} is not an object"
                )));
            }
            RawSalesRecord::from_value(item)
                .map_err(|e| PricewiseError::InvalidUpload(format!("entry {i}: {e}")))
        })
        .collect()
}

/// Give every record without an id the id `{prefix}-{index}`.
pub fn assign_ids(records: &mut [RawSalesRecord], prefix: &str) {
    for (i, record) in records.iter_mut().enumerate() {
        if record.id().map_or(true, |id| id.trim().is_empty()) {
            record.set_id(format!("{prefix}-{i}"));
        }
    }
}

/// Parse a sales file without touching ids. Fails unless the whole file parses.
pub fn read_file(file_path: &Path, format: Option<UploadFormat>) -> Result<Vec<RawSalesRecord>> {
    let content = std::fs::read_to_string(file_path)?;
    let format = format.unwrap_or_else(|| UploadFormat::detect(file_path, &content));
    let records = format.parse(&content)?;
    tracing::debug!(file = %file_path.display(), format = format.key(), "parsed sales file");
    Ok(records)
}

/// Read an uploaded file; records without an id become `upload-{index}`.
pub fn load_file(file_path: &Path, format: Option<UploadFormat>) -> Result<Vec<RawSalesRecord>> {
    let mut records = read_file(file_path, format)?;
    assign_ids(&mut records, "upload");
    tracing::info!(
        file = %file_path.display(),
        count = records.len(),
        "loaded uploaded sales data"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_rejects_non_array() {
        let err = parse_json(r#"{"id": "1", "productName": "A"}"#).unwrap_err();
        assert!(matches!(err, PricewiseError::InvalidUpload(_)));
        assert!(err.to_string().contains("must contain an array"));
    }

    #[test]
    fn test_rejects_invalid_json() {
        let err = parse_json("[{").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_rejects_non_object_entries() {
        let err = parse_json(r#"[{"product": "A"}, 42]"#).unwrap_err();
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn test_mixed_shapes_and_generated_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "sales.json",
            r#"[
                {"productName": "A", "price": 100, "quantity": 5, "month": "April"},
                {"id": "keep-me", "product": "B", "unit_price": 2, "quantity": 3}
            ]"#,
        );
        let records = load_file(&path, None).unwrap();
        assert_eq!(records[0].id(), Some("upload-0"));
        assert_eq!(records[1].id(), Some("keep-me"));
        assert!(matches!(records[0], RawSalesRecord::Flat(_)));
        assert!(matches!(records[1], RawSalesRecord::Canonical(_)));
    }

    #[test]
    fn test_csv_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "sales.txt",
            "id,product,category,quantity,unit_price,total_sales,region,date,customer_type\n\
             ,Desk Lamp,Home,2,20,40,Ohio,2023-05-02,Regular\n",
        );
        let records = load_file(&path, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), Some("upload-0"));
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(UploadFormat::detect(Path::new("a.JSON"), ""), UploadFormat::Json);
        assert_eq!(UploadFormat::detect(Path::new("a.csv"), "[1]"), UploadFormat::Csv);
        assert_eq!(UploadFormat::detect(Path::new("a"), "  [ ]"), UploadFormat::Json);
        assert_eq!(UploadFormat::from_key("CSV"), Some(UploadFormat::Csv));
    }
}
