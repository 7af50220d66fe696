use std::collections::HashSet;

use crate::aggregator::{
    average_by, count_by, sort_desc, sum_by, time_series, total_by, trend, Aggregate, Granularity,
    Trend,
};
use crate::chart::{merge_series, sorted, ChartRow, MissingPolicy};
use crate::elasticity::{
    current_metrics, optimal_price_change, revenue_change, simulate, CurrentMetrics,
    ElasticityTable, PriceSweep, RevenueChange, SimulationPoint,
};
use crate::error::Result;
use crate::models::SalesRecord;

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Record filters. `None` (or the literal "all") keeps everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    pub region: Option<String>,
    pub customer_type: Option<String>,
    pub category: Option<String>,
}

/// The filter value, unless it is unset, blank or "all".
pub fn active(filter: &Option<String>) -> Option<&str> {
    filter
        .as_deref()
        .filter(|f| !f.trim().is_empty() && !f.eq_ignore_ascii_case("all"))
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        active(&self.region).is_none()
            && active(&self.customer_type).is_none()
            && active(&self.category).is_none()
    }

    pub fn matches(&self, r: &SalesRecord) -> bool {
        active(&self.region).map_or(true, |v| r.region == v)
            && active(&self.customer_type).map_or(true, |v| r.customer_type == v)
            && active(&self.category).map_or(true, |v| r.category == v)
    }

    pub fn apply(&self, records: &[SalesRecord]) -> Vec<SalesRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Distinct values of a field, in first-seen order.
pub fn distinct<F>(records: &[SalesRecord], field: F) -> Vec<String>
where
    F: Fn(&SalesRecord) -> &str,
{
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| field(r))
        .filter(|v| seen.insert(v.to_string()))
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub records: usize,
    pub products: usize,
    pub categories: usize,
    pub units: f64,
    pub revenue: f64,
    /// Mean over records that carry a margin.
    pub average_margin: Option<f64>,
}

/// Headline numbers. Products are distinct by name: every source carries a
/// product name, while SKUs only come with the flat shape.
pub fn summary(records: &[SalesRecord]) -> SummaryStats {
    let margins: Vec<f64> = records.iter().filter_map(|r| r.margin).collect();
    let average_margin =
        (!margins.is_empty()).then(|| margins.iter().sum::<f64>() / margins.len() as f64);
    SummaryStats {
        records: records.len(),
        products: distinct(records, |r| r.product.as_str()).len(),
        categories: distinct(records, |r| r.category.as_str()).len(),
        units: records.iter().map(|r| r.quantity).sum(),
        revenue: records.iter().map(SalesRecord::total_sales).sum(),
        average_margin,
    }
}

// ---------------------------------------------------------------------------
// Category performance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPerformance {
    pub category: String,
    pub sales: f64,
    pub products: usize,
    pub average_margin: Option<f64>,
}

/// Sales, product count and mean margin per category, highest sales first.
pub fn category_performance(records: &[SalesRecord]) -> Result<Vec<CategoryPerformance>> {
    let with_margin: Vec<SalesRecord> = records
        .iter()
        .filter(|r| r.margin.is_some())
        .cloned()
        .collect();
    let margins = average_by(&with_margin, |r| r.category.clone(), |r| r.margin)?;

    Ok(sort_desc(total_by(records, |r| r.category.clone()))
        .into_iter()
        .map(|total| {
            let products = records
                .iter()
                .filter(|r| r.category == total.key)
                .map(|r| r.product.as_str())
                .collect::<HashSet<_>>()
                .len();
            CategoryPerformance {
                average_margin: margins.iter().find(|m| m.key == total.key).map(|m| m.value),
                category: total.key,
                sales: total.value,
                products,
            }
        })
        .collect())
}

/// Number of records per category.
pub fn records_by_category(records: &[SalesRecord]) -> Vec<Aggregate> {
    sort_desc(count_by(records, |r| r.category.clone()))
}

// ---------------------------------------------------------------------------
// Revenue and profit over time
// ---------------------------------------------------------------------------

fn month_key(r: &SalesRecord) -> String {
    r.date.get(..7).unwrap_or(&r.date).to_string()
}

/// Monthly revenue and profit rows, profit being revenue x margin / 100.
/// Records without a margin contribute revenue but no profit; a month with
/// no margin data at all has no profit value.
pub fn monthly_revenue_profit(records: &[SalesRecord]) -> Vec<ChartRow> {
    let revenue = time_series(records, Granularity::Monthly);
    let with_margin: Vec<SalesRecord> = records
        .iter()
        .filter(|r| r.margin.is_some())
        .cloned()
        .collect();
    let profit = sum_by(&with_margin, month_key, |r| {
        r.total_sales() * r.margin.unwrap_or(0.0) / 100.0
    });
    sorted(merge_series(
        &[("revenue", revenue.as_slice()), ("profit", profit.as_slice())],
        MissingPolicy::Absent,
    ))
}

pub fn top_regions(records: &[SalesRecord]) -> Vec<Aggregate> {
    sort_desc(total_by(records, |r| r.region.clone()))
}

pub fn customer_types(records: &[SalesRecord]) -> Vec<Aggregate> {
    sort_desc(total_by(records, |r| r.customer_type.clone()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendReport {
    pub granularity: Granularity,
    pub series: Vec<Aggregate>,
    pub trend: Trend,
}

pub fn trend_report(records: &[SalesRecord], granularity: Granularity) -> TrendReport {
    let series = time_series(records, granularity);
    let trend = trend(&series);
    TrendReport {
        granularity,
        series,
        trend,
    }
}

// ---------------------------------------------------------------------------
// Price simulation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub current: CurrentMetrics,
    pub points: Vec<SimulationPoint>,
    pub optimal: Option<SimulationPoint>,
    pub optimal_change: Option<RevenueChange>,
}

pub fn simulation_report(
    records: &[SalesRecord],
    table: &ElasticityTable,
    sweep: &PriceSweep,
) -> Result<SimulationReport> {
    let points = simulate(records, table, sweep)?;
    let optimal = optimal_price_change(&points).cloned();
    let optimal_change = optimal
        .as_ref()
        .and_then(|p| revenue_change(&points, p.revenue));
    Ok(SimulationReport {
        current: current_metrics(records),
        points,
        optimal,
        optimal_change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(product: &str, category: &str, region: &str, qty: f64, price: f64, date: &str, margin: Option<f64>) -> SalesRecord {
        SalesRecord {
            id: String::new(),
            product: product.into(),
            category: category.into(),
            quantity: qty,
            unit_price: price,
            region: region.into(),
            date: date.into(),
            customer_type: "Regular".into(),
            margin,
        }
    }

    fn sample() -> Vec<SalesRecord> {
        vec![
            rec("Earbuds", "Audio", "Texas", 2.0, 50.0, "2023-04-01", Some(30.0)),
            rec("Speaker", "Audio", "Ohio", 1.0, 100.0, "2023-04-09", Some(20.0)),
            rec("Jacket", "Apparel", "Texas", 3.0, 100.0, "2023-12-01", None),
            rec("Earbuds", "Audio", "Texas", 1.0, 50.0, "2023-06-01", Some(30.0)),
        ]
    }

    #[test]
    fn test_filters() {
        let all = Filters {
            region: Some("all".into()),
            ..Default::default()
        };
        assert!(all.is_empty());
        assert_eq!(all.apply(&sample()).len(), 4);
        let texas = Filters {
            region: Some("Texas".into()),
            category: Some("Audio".into()),
            ..Default::default()
        };
        assert_eq!(texas.apply(&sample()).len(), 2);
    }

    #[test]
    fn test_summary() {
        let s = summary(&sample());
        assert_eq!(s.records, 4);
        assert_eq!(s.products, 3);
        assert_eq!(s.categories, 2);
        assert_eq!(s.revenue, 550.0);
        assert_eq!(s.average_margin, Some(80.0 / 3.0));
        assert_eq!(summary(&[]).average_margin, None);
    }

    #[test]
    fn test_summary_counts_products_by_name() {
        let mut first = rec("Earbuds", "Audio", "Texas", 1.0, 50.0, "2023-04-01", None);
        first.id = "a".into();
        let mut second = first.clone();
        second.id = "b".into();
        let mut other = rec("Speaker", "Audio", "Ohio", 1.0, 100.0, "2023-04-02", None);
        other.id = "c".into();
        let s = summary(&[first, second, other]);
        assert_eq!(s.records, 3);
        assert_eq!(s.products, 2);
    }

    #[test]
    fn test_category_performance() {
        let perf = category_performance(&sample()).unwrap();
        assert_eq!(perf[0].category, "Apparel");
        assert_eq!(perf[0].sales, 300.0);
        assert_eq!(perf[0].average_margin, None);
        assert_eq!(perf[1].category, "Audio");
        assert_eq!(perf[1].products, 2);
        assert!((perf[1].average_margin.unwrap() - 80.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_revenue_profit() {
        let rows = monthly_revenue_profit(&sample());
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["2023-04", "2023-06", "2023-12"]);
        assert_eq!(rows[0].get("revenue"), Some(200.0));
        assert_eq!(rows[0].get("profit"), Some(50.0));
        assert_eq!(rows[2].get("revenue"), Some(300.0));
        assert_eq!(rows[2].get("profit"), None);
    }

    #[test]
    fn test_top_regions_sorted() {
        let regions = top_regions(&sample());
        assert_eq!(regions[0], Aggregate::new("Texas", 450.0));
        assert_eq!(regions[1], Aggregate::new("Ohio", 100.0));
    }

    #[test]
    fn test_simulation_report() {
        let report = simulation_report(&sample(), &ElasticityTable::default(), &PriceSweep::default()).unwrap();
        assert_eq!(report.points.len(), 9);
        assert_eq!(report.current.revenue, 550.0);
        assert!(report.optimal.is_some());
    }
}
