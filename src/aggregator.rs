use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::{PricewiseError, Result};
use crate::models::SalesRecord;
use crate::normalizer::parse_iso_date;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub key: String,
    pub value: f64,
}

impl Aggregate {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Running total for one key. Lives only for the duration of a call.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationBucket {
    pub key: String,
    pub total: f64,
    pub count: usize,
}

fn bucket_index(buckets: &mut Vec<AggregationBucket>, key: String) -> usize {
    match buckets.iter().position(|b| b.key == key) {
        Some(i) => i,
        None => {
            buckets.push(AggregationBucket {
                key,
                total: 0.0,
                count: 0,
            });
            buckets.len() - 1
        }
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Sum `value` per `key`, keys in first-seen order.
pub fn sum_by<K, V>(records: &[SalesRecord], key: K, value: V) -> Vec<Aggregate>
where
    K: Fn(&SalesRecord) -> String,
    V: Fn(&SalesRecord) -> f64,
{
    let mut buckets = Vec::new();
    for r in records {
        let i = bucket_index(&mut buckets, key(r));
        buckets[i].total += value(r);
        buckets[i].count += 1;
    }
    buckets
        .into_iter()
        .map(|b| Aggregate::new(b.key, b.total))
        .collect()
}

/// `sum_by` over `total_sales`.
pub fn total_by<K>(records: &[SalesRecord], key: K) -> Vec<Aggregate>
where
    K: Fn(&SalesRecord) -> String,
{
    sum_by(records, key, SalesRecord::total_sales)
}

pub fn count_by<K>(records: &[SalesRecord], key: K) -> Vec<Aggregate>
where
    K: Fn(&SalesRecord) -> String,
{
    sum_by(records, key, |_| 1.0)
}

/// Mean of the `Some` values per key. A key whose records all yield `None`
/// has nothing to average and is reported as `EmptyGroup`.
pub fn average_by<K, V>(records: &[SalesRecord], key: K, value: V) -> Result<Vec<Aggregate>>
where
    K: Fn(&SalesRecord) -> String,
    V: Fn(&SalesRecord) -> Option<f64>,
{
    let mut buckets = Vec::new();
    for r in records {
        let i = bucket_index(&mut buckets, key(r));
        if let Some(v) = value(r) {
            buckets[i].total += v;
            buckets[i].count += 1;
        }
    }
    buckets
        .into_iter()
        .map(|b| {
            if b.count == 0 {
                Err(PricewiseError::EmptyGroup(b.key))
            } else {
                Ok(Aggregate::new(b.key, b.total / b.count as f64))
            }
        })
        .collect()
}

/// Descending by value. Stable, so equal values keep their order.
pub fn sort_desc(mut aggregates: Vec<Aggregate>) -> Vec<Aggregate> {
    aggregates.sort_by(|a, b| b.value.total_cmp(&a.value));
    aggregates
}

// ---------------------------------------------------------------------------
// Time bucketing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::Quarterly];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().find(|g| g.key() == key).copied()
    }

    pub fn next(&self) -> Self {
        match self {
            Self::Daily => Self::Weekly,
            Self::Weekly => Self::Monthly,
            Self::Monthly => Self::Quarterly,
            Self::Quarterly => Self::Daily,
        }
    }
}

/// Period key for a date.
///
/// Weekly keys count weeks within the month, with week 1 being the partial
/// week holding the 1st (weeks start on Sunday). This is not ISO-8601 week
/// numbering: `2023-04-30` is `2023-04-W6`.
pub fn bucket_key(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => date.format("%Y-%m-%d").to_string(),
        Granularity::Weekly => {
            let offset = date
                .with_day(1)
                .map_or(0, |first| first.weekday().num_days_from_sunday());
            let week = (date.day() + offset).div_ceil(7);
            format!("{}-W{week}", date.format("%Y-%m"))
        }
        Granularity::Monthly => date.format("%Y-%m").to_string(),
        Granularity::Quarterly => format!("{}-Q{}", date.year(), (date.month() - 1) / 3 + 1),
    }
}

/// Total sales per period, ascending by key. Undated records are skipped.
pub fn time_series(records: &[SalesRecord], granularity: Granularity) -> Vec<Aggregate> {
    let dated: Vec<(String, f64)> = records
        .iter()
        .filter_map(|r| {
            parse_iso_date(&r.date).map(|d| (bucket_key(d, granularity), r.total_sales()))
        })
        .collect();
    let mut series: Vec<Aggregate> = Vec::new();
    for (key, value) in dated {
        match series.iter_mut().find(|a| a.key == key) {
            Some(a) => a.value += value,
            None => series.push(Aggregate::new(key, value)),
        }
    }
    series.sort_by(|a, b| a.key.cmp(&b.key));
    series
}

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Total sales per calendar month across all years, all twelve months present.
pub fn seasonality(records: &[SalesRecord]) -> Vec<Aggregate> {
    let mut totals = [0.0f64; 12];
    for r in records {
        if let Some(d) = parse_iso_date(&r.date) {
            totals[d.month0() as usize] += r.total_sales();
        }
    }
    MONTH_LABELS
        .iter()
        .zip(totals)
        .map(|(label, v)| Aggregate::new(*label, v))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatMap {
    pub months: Vec<String>,
    pub regions: Vec<String>,
    /// `cells[month][region]`
    pub cells: Vec<Vec<f64>>,
}

impl HeatMap {
    pub fn max(&self) -> f64 {
        self.cells
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }
}

/// Month x region sales grid. Rows cover the twelve calendar months.
pub fn heat_map(records: &[SalesRecord]) -> HeatMap {
    let mut regions: Vec<String> = Vec::new();
    for r in records {
        if !regions.contains(&r.region) {
            regions.push(r.region.clone());
        }
    }
    let mut cells = vec![vec![0.0; regions.len()]; 12];
    for r in records {
        let Some(d) = parse_iso_date(&r.date) else {
            continue;
        };
        if let Some(col) = regions.iter().position(|reg| *reg == r.region) {
            cells[d.month0() as usize][col] += r.total_sales();
        }
    }
    HeatMap {
        months: MONTH_LABELS.iter().map(|m| m.to_string()).collect(),
        regions,
        cells,
    }
}

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

impl TrendDirection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trend {
    pub direction: TrendDirection,
    /// `None` when the first point is zero.
    pub percentage: Option<f64>,
}

/// Compare the last point of a series against the first.
pub fn trend(series: &[Aggregate]) -> Trend {
    let (first, last) = match series {
        [first, .., last] => (first, last),
        _ => {
            return Trend {
                direction: TrendDirection::Neutral,
                percentage: Some(0.0),
            }
        }
    };
    let direction = if last.value > first.value {
        TrendDirection::Up
    } else if last.value < first.value {
        TrendDirection::Down
    } else {
        TrendDirection::Neutral
    };
    let percentage = (first.value != 0.0).then(|| (last.value - first.value) / first.value * 100.0);
    Trend {
        direction,
        percentage,
    }
}
