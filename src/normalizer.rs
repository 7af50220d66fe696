use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::{RawSalesRecord, SalesRecord};

/// Year used when a date has to be synthesized from a month name.
pub const REFERENCE_YEAR: i32 = 2023;

pub const DEFAULT_CATEGORY: &str = "Uncategorized";
pub const DEFAULT_REGION: &str = "Unknown";
pub const DEFAULT_CUSTOMER_TYPE: &str = "Regular";

const MONTHS: [(&str, &str, &str); 12] = [
    ("january", "jan", "01"),
    ("february", "feb", "02"),
    ("march", "mar", "03"),
    ("april", "apr", "04"),
    ("may", "may", "05"),
    ("june", "jun", "06"),
    ("july", "jul", "07"),
    ("august", "aug", "08"),
    ("september", "sep", "09"),
    ("october", "oct", "10"),
    ("november", "nov", "11"),
    ("december", "dec", "12"),
];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Two-digit month for a full or three-letter month name, case-insensitive.
pub fn month_number(name: &str) -> Option<&'static str> {
    let name = name.trim().to_lowercase();
    MONTHS
        .iter()
        .find(|(full, short, _)| name == *full || name == *short)
        .map(|(_, _, num)| *num)
}

/// `2023-MM-01` for a month name; unknown or missing months land on January.
pub fn date_from_month(month: Option<&str>) -> String {
    let mm = month.and_then(month_number).unwrap_or("01");
    format!("{REFERENCE_YEAR}-{mm}-01")
}

pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    None
}

fn text_or(value: Option<&str>, default: &str) -> String {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn non_negative(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0)
}

fn iso_date(date: Option<&str>, month: Option<&str>) -> String {
    date.and_then(parse_iso_date)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| date_from_month(month))
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Map either source shape onto the canonical record.
///
/// Missing or unusable numbers become 0 rather than an error, so a malformed
/// record turns into a zero-value entry. `quality_stats` reports how many
/// values were missing.
pub fn normalize_record(raw: &RawSalesRecord) -> SalesRecord {
    match raw {
        RawSalesRecord::Flat(r) => SalesRecord {
            id: r.id.clone().unwrap_or_default(),
            product: r.product_name.clone().unwrap_or_default(),
            category: text_or(r.category.as_deref(), DEFAULT_CATEGORY),
            quantity: non_negative(r.quantity),
            unit_price: non_negative(r.price),
            region: text_or(r.sales_location.as_deref(), DEFAULT_REGION),
            date: iso_date(r.date.as_deref(), r.month.as_deref()),
            customer_type: DEFAULT_CUSTOMER_TYPE.to_string(),
            margin: r.margin,
        },
        RawSalesRecord::Canonical(r) => SalesRecord {
            id: r.id.clone().unwrap_or_default(),
            product: r.product.clone().unwrap_or_default(),
            category: text_or(r.category.as_deref(), DEFAULT_CATEGORY),
            quantity: non_negative(r.quantity),
            unit_price: non_negative(r.unit_price),
            region: text_or(r.region.as_deref(), DEFAULT_REGION),
            date: iso_date(r.date.as_deref(), None),
            customer_type: text_or(r.customer_type.as_deref(), DEFAULT_CUSTOMER_TYPE),
            margin: r.margin,
        },
    }
}

pub fn normalize(raw: &[RawSalesRecord]) -> Vec<SalesRecord> {
    let records: Vec<SalesRecord> = raw.iter().map(normalize_record).collect();
    tracing::debug!(count = records.len(), "normalized sales records");
    records
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

fn raw_price(raw: &RawSalesRecord) -> Option<f64> {
    match raw {
        RawSalesRecord::Flat(r) => r.price,
        RawSalesRecord::Canonical(r) => r.unit_price,
    }
}

fn raw_quantity(raw: &RawSalesRecord) -> Option<f64> {
    match raw {
        RawSalesRecord::Flat(r) => r.quantity,
        RawSalesRecord::Canonical(r) => r.quantity,
    }
}

/// Normalize, then correct anomalies: negative prices flip sign and
/// non-positive quantities become 1.
pub fn clean_records(raw: &[RawSalesRecord]) -> Vec<SalesRecord> {
    raw.iter()
        .map(|r| {
            let mut rec = normalize_record(r);
            if let Some(price) = raw_price(r).filter(|p| *p < 0.0) {
                rec.unit_price = price.abs();
            }
            if raw_quantity(r).map_or(true, |q| q <= 0.0) {
                rec.quantity = 1.0;
            }
            rec
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Data quality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct QualityStats {
    pub total_records: usize,
    pub missing_values: usize,
    pub anomalies: usize,
    pub quality_score: u8,
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |s| s.trim().is_empty())
}

/// Missing product/category/quantity/price/region/date values and anomalies
/// (negative price, non-positive quantity) across the raw records.
pub fn quality_stats(raw: &[RawSalesRecord]) -> QualityStats {
    let mut missing_values = 0usize;
    let mut anomalies = 0usize;

    for r in raw {
        let (fields, price, quantity) = match r {
            RawSalesRecord::Flat(f) => (
                [
                    is_blank(f.product_name.as_deref()),
                    is_blank(f.category.as_deref()),
                    f.quantity.is_none(),
                    f.price.is_none(),
                    is_blank(f.sales_location.as_deref()),
                    is_blank(f.date.as_deref()) && is_blank(f.month.as_deref()),
                ],
                f.price,
                f.quantity,
            ),
            RawSalesRecord::Canonical(c) => (
                [
                    is_blank(c.product.as_deref()),
                    is_blank(c.category.as_deref()),
                    c.quantity.is_none(),
                    c.unit_price.is_none(),
                    is_blank(c.region.as_deref()),
                    is_blank(c.date.as_deref()),
                ],
                c.unit_price,
                c.quantity,
            ),
        };
        missing_values += fields.iter().filter(|m| **m).count();
        if price.is_some_and(|p| p < 0.0) || quantity.is_some_and(|q| q <= 0.0) {
            anomalies += 1;
        }
    }

    let total_records = raw.len();
    let quality_score = if total_records == 0 {
        100
    } else {
        let issues = (missing_values + anomalies) as f64;
        let score = 100.0 * (1.0 - issues / (total_records as f64 * 6.0));
        score.round().clamp(0.0, 100.0) as u8
    };

    QualityStats {
        total_records,
        missing_values,
        anomalies,
        quality_score,
    }
}
