use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::aggregator::Aggregate;

/// How `merge_series` fills a period that one series lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    #[default]
    ZeroFill,
    Absent,
}

/// One chart row: a label plus named numeric fields, in insertion order.
/// Serializes as a flat JSON object, e.g. `{"name": "Apr", "revenue": 12.0}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub label_field: String,
    pub label: String,
    pub fields: Vec<(String, Option<f64>)>,
}

impl ChartRow {
    pub fn get(&self, field: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, v)| *v)
    }
}

impl Serialize for ChartRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(&self.label_field, &self.label)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

pub fn to_rows(aggregates: &[Aggregate], label_field: &str, value_field: &str) -> Vec<ChartRow> {
    aggregates
        .iter()
        .map(|a| ChartRow {
            label_field: label_field.to_string(),
            label: a.key.clone(),
            fields: vec![(value_field.to_string(), Some(a.value))],
        })
        .collect()
}

/// Join several keyed series into one row per key. Keys keep the order in
/// which they first appear across the series.
pub fn merge_series(series: &[(&str, &[Aggregate])], policy: MissingPolicy) -> Vec<ChartRow> {
    let mut keys: Vec<&str> = Vec::new();
    for (_, points) in series {
        for p in points.iter() {
            if !keys.contains(&p.key.as_str()) {
                keys.push(&p.key);
            }
        }
    }

    keys.into_iter()
        .map(|key| {
            let fields = series
                .iter()
                .map(|(name, points)| {
                    let value = points.iter().find(|p| p.key == key).map(|p| p.value);
                    let value = match policy {
                        MissingPolicy::ZeroFill => Some(value.unwrap_or(0.0)),
                        MissingPolicy::Absent => value,
                    };
                    (name.to_string(), value)
                })
                .collect();
            ChartRow {
                label_field: "name".to_string(),
                label: key.to_string(),
                fields,
            }
        })
        .collect()
}

/// Rows ordered by label.
pub fn sorted(mut rows: Vec<ChartRow>) -> Vec<ChartRow> {
    rows.sort_by(|a, b| a.label.cmp(&b.label));
    rows
}

/// `(label, value)` pairs for a `BarChart`. Missing and negative values are 0.
pub fn bar_values(rows: &[ChartRow], field: &str) -> Vec<(String, u64)> {
    rows.iter()
        .map(|r| {
            let v = r.get(field).unwrap_or(0.0).max(0.0).round() as u64;
            (r.label.clone(), v)
        })
        .collect()
}

/// `(index, value)` points for a line `Dataset`, skipping absent values.
pub fn line_points(rows: &[ChartRow], field: &str) -> Vec<(f64, f64)> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, r)| r.get(field).map(|v| (i as f64, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_a() -> Vec<Aggregate> {
        vec![Aggregate::new("2023-01", 10.0), Aggregate::new("2023-02", 20.0)]
    }

    fn series_b() -> Vec<Aggregate> {
        vec![Aggregate::new("2023-02", 5.0), Aggregate::new("2023-03", 7.0)]
    }

    #[test]
    fn test_to_rows_preserves_order_and_serializes_as_object() {
        let rows = to_rows(&series_a(), "month", "revenue");
        assert_eq!(rows.len(), 2);
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json, serde_json::json!({"month": "2023-01", "revenue": 10.0}));
    }

    #[test]
    fn test_merge_zero_fill() {
        let a = series_a();
        let b = series_b();
        let rows = merge_series(&[("revenue", a.as_slice()), ("profit", b.as_slice())], MissingPolicy::ZeroFill);
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["2023-01", "2023-02", "2023-03"]);
        assert_eq!(rows[0].fields[1], ("profit".to_string(), Some(0.0)));
        assert_eq!(rows[2].get("revenue"), Some(0.0));
        assert_eq!(rows[1].get("profit"), Some(5.0));
    }

    #[test]
    fn test_merge_absent() {
        let a = series_a();
        let b = series_b();
        let rows = merge_series(&[("revenue", a.as_slice()), ("profit", b.as_slice())], MissingPolicy::Absent);
        assert_eq!(rows[0].fields[1], ("profit".to_string(), None));
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["profit"], serde_json::Value::Null);
    }

    #[test]
    fn test_sorted_rows() {
        let b = series_b();
        let a = series_a();
        let rows = sorted(merge_series(&[("x", b.as_slice()), ("y", a.as_slice())], MissingPolicy::ZeroFill));
        assert_eq!(rows[0].label, "2023-01");
    }

    #[test]
    fn test_bar_and_line_helpers() {
        let b = series_b();
        let a = series_a();
        let rows = merge_series(&[("x", a.as_slice()), ("y", b.as_slice())], MissingPolicy::Absent);
        assert_eq!(
            bar_values(&rows, "y"),
            vec![("2023-01".to_string(), 0), ("2023-02".to_string(), 5), ("2023-03".to_string(), 7)]
        );
        assert_eq!(line_points(&rows, "x"), vec![(0.0, 10.0), (1.0, 20.0)]);
    }
}
