use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::aggregator::{Aggregate, HeatMap, TrendDirection};
use crate::chart::ChartRow;
use crate::fmt::{money, number, percent};
use crate::normalizer::QualityStats;
use crate::reports::{CategoryPerformance, SimulationReport, SummaryStats, TrendReport};

// ---------------------------------------------------------------------------
// Pure formatting functions (report data → String)
// ---------------------------------------------------------------------------

pub fn format_summary(stats: &SummaryStats) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("Records"), Cell::new(stats.records)]);
    table.add_row(vec![Cell::new("Products"), Cell::new(stats.products)]);
    table.add_row(vec![Cell::new("Categories"), Cell::new(stats.categories)]);
    table.add_row(vec![Cell::new("Units sold"), Cell::new(number(stats.units))]);
    table.add_row(vec![
        Cell::new("Total revenue".bold()),
        Cell::new(money(stats.revenue)),
    ]);
    table.add_row(vec![
        Cell::new("Average margin"),
        Cell::new(
            stats
                .average_margin
                .map_or_else(|| "n/a".to_string(), |m| format!("{m:.1}%")),
        ),
    ]);
    format!("Sales Summary\n{table}")
}

pub fn format_category_performance(rows: &[CategoryPerformance]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Sales", "Products", "Avg Margin"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.category),
            Cell::new(money(row.sales)),
            Cell::new(row.products),
            Cell::new(
                row.average_margin
                    .map_or_else(|| "n/a".to_string(), |m| format!("{m:.1}%")),
            ),
        ]);
    }
    format!("Category Performance\n{table}")
}

pub fn format_counts(rows: &[Aggregate]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Records"]);
    for row in rows {
        table.add_row(vec![Cell::new(&row.key), Cell::new(number(row.value))]);
    }
    format!("Records per Category\n{table}")
}

pub fn format_monthly(rows: &[ChartRow]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Month", "Revenue", "Profit"]);
    let mut revenue = 0.0;
    let mut profit = 0.0;
    for row in rows {
        let r = row.get("revenue").unwrap_or(0.0);
        revenue += r;
        let p = match row.get("profit") {
            Some(p) => {
                profit += p;
                money(p)
            }
            None => "n/a".to_string(),
        };
        table.add_row(vec![Cell::new(&row.label), Cell::new(money(r)), Cell::new(p)]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(revenue)),
        Cell::new(money(profit)),
    ]);
    format!("Monthly Revenue & Profit\n{table}")
}

/// Totals per key with each key's share of the grand total.
pub fn format_breakdown(title: &str, label: &str, rows: &[Aggregate]) -> String {
    let total: f64 = rows.iter().map(|a| a.value).sum();
    let mut table = Table::new();
    table.set_header(vec![label, "Sales", "%"]);
    for row in rows {
        let share = if total > 0.0 { row.value / total * 100.0 } else { 0.0 };
        table.add_row(vec![
            Cell::new(&row.key),
            Cell::new(money(row.value)),
            Cell::new(format!("{share:.1}%")),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(total)),
        Cell::new(""),
    ]);
    format!("{title}\n{table}")
}

pub fn format_trend(report: &TrendReport) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Period", "Sales"]);
    for point in &report.series {
        table.add_row(vec![Cell::new(&point.key), Cell::new(money(point.value))]);
    }

    let change = report
        .trend
        .percentage
        .map_or_else(|| "n/a".to_string(), percent);
    let label = report.trend.direction.label();
    let direction = match report.trend.direction {
        TrendDirection::Up => format!("\u{2191} {label} {change}").as_str().green(),
        TrendDirection::Down => format!("\u{2193} {label} {change}").as_str().red(),
        TrendDirection::Neutral => format!("\u{2192} {label} {change}").as_str().normal(),
    };
    format!(
        "Sales Trend ({})\n{table}\nTrend: {direction}",
        report.granularity.key()
    )
}

pub fn format_seasonality(months: &[Aggregate]) -> String {
    let peak = months.iter().map(|a| a.value).fold(0.0, f64::max);
    let mut table = Table::new();
    table.set_header(vec!["Month", "Sales", ""]);
    for month in months {
        let width = if peak > 0.0 {
            (month.value / peak * 30.0).round() as usize
        } else {
            0
        };
        table.add_row(vec![
            Cell::new(&month.key),
            Cell::new(money(month.value)),
            Cell::new("\u{2588}".repeat(width)),
        ]);
    }
    format!("Seasonality\n{table}")
}

pub fn format_heat_map(map: &HeatMap) -> String {
    let max = map.max();
    let mut table = Table::new();
    let mut header = vec!["Month".to_string()];
    header.extend(map.regions.iter().cloned());
    table.set_header(header);
    for (month, row) in map.months.iter().zip(&map.cells) {
        let mut cells = vec![Cell::new(month)];
        for &value in row {
            let text = if value == 0.0 { "-".to_string() } else { money(value) };
            // Top third of the range stands out.
            let text = if max > 0.0 && value / max >= 2.0 / 3.0 {
                text.as_str().bold().to_string()
            } else {
                text
            };
            cells.push(Cell::new(text));
        }
        table.add_row(cells);
    }
    format!("Sales Heat Map (month \u{00d7} region)\n{table}")
}

pub fn format_quality(stats: &QualityStats) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Check", "Value"]);
    table.add_row(vec![Cell::new("Records"), Cell::new(stats.total_records)]);
    table.add_row(vec![Cell::new("Missing values"), Cell::new(stats.missing_values)]);
    table.add_row(vec![Cell::new("Anomalies"), Cell::new(stats.anomalies)]);
    let score = format!("{}%", stats.quality_score);
    let score = match stats.quality_score {
        90..=100 => score.as_str().green(),
        70..=89 => score.as_str().yellow(),
        _ => score.as_str().red(),
    };
    table.add_row(vec![Cell::new("Quality score".bold()), Cell::new(score)]);
    format!("Data Quality\n{table}")
}

pub fn format_simulation(report: &SimulationReport) -> String {
    let mut current = Table::new();
    current.set_header(vec!["Current", "Value"]);
    current.add_row(vec![Cell::new("Units"), Cell::new(number(report.current.units))]);
    current.add_row(vec![Cell::new("Revenue"), Cell::new(money(report.current.revenue))]);
    current.add_row(vec![
        Cell::new("Average price"),
        Cell::new(report.current.average_price.map_or_else(|| "n/a".to_string(), money)),
    ]);

    let best = report.optimal.as_ref().map(|p| p.price_change);
    let mut table = Table::new();
    table.set_header(vec!["Price Change", "Quantity", "Revenue"]);
    for point in &report.points {
        let label = percent(point.price_change);
        let label = if Some(point.price_change) == best {
            label.as_str().green().bold().to_string()
        } else {
            label
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(number(point.quantity)),
            Cell::new(money(point.revenue)),
        ]);
    }

    let mut out = format!("Current Metrics\n{current}\n\nPrice Simulation\n{table}");
    if let Some(optimal) = &report.optimal {
        out.push_str(&format!(
            "\nOptimal price change: {} \u{2192} {}",
            percent(optimal.price_change),
            money(optimal.revenue)
        ));
        if let Some(change) = &report.optimal_change {
            out.push_str(&format!(
                " ({} / {} vs. current price)",
                money(change.absolute),
                percent(change.percent)
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{Granularity, Trend};
    use crate::elasticity::{CurrentMetrics, SimulationPoint};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_summary() {
        plain();
        let out = format_summary(&SummaryStats {
            records: 24,
            products: 12,
            categories: 4,
            units: 1500.0,
            revenue: 123456.5,
            average_margin: None,
        });
        assert!(out.starts_with("Sales Summary"));
        assert!(out.contains("$123,456.50"));
        assert!(out.contains("1,500"));
        assert!(out.contains("n/a"));
    }

    #[test]
    fn test_format_breakdown_shares() {
        plain();
        let out = format_breakdown(
            "Top Regions",
            "Region",
            &[Aggregate::new("Texas", 300.0), Aggregate::new("Ohio", 100.0)],
        );
        assert!(out.contains("75.0%"));
        assert!(out.contains("25.0%"));
        assert!(out.contains("$400.00"));
    }

    #[test]
    fn test_format_trend_without_baseline() {
        plain();
        let out = format_trend(&TrendReport {
            granularity: Granularity::Quarterly,
            series: vec![Aggregate::new("2023-Q1", 0.0), Aggregate::new("2023-Q2", 10.0)],
            trend: Trend {
                direction: TrendDirection::Up,
                percentage: None,
            },
        });
        assert!(out.starts_with("Sales Trend (quarterly)"));
        assert!(out.contains("Trend: \u{2191} up n/a"));
    }

    #[test]
    fn test_format_monthly_without_margin_data() {
        plain();
        let rows = vec![
            ChartRow {
                label_field: "name".into(),
                label: "2023-04".into(),
                fields: vec![("revenue".into(), Some(200.0)), ("profit".into(), Some(50.0))],
            },
            ChartRow {
                label_field: "name".into(),
                label: "2023-12".into(),
                fields: vec![("revenue".into(), Some(300.0)), ("profit".into(), None)],
            },
        ];
        let out = format_monthly(&rows);
        assert!(out.contains("n/a"));
        assert!(out.contains("$500.00"));
        assert!(out.contains("$50.00"));
    }

    #[test]
    fn test_format_heat_map_blank_cells() {
        plain();
        let map = HeatMap {
            months: vec!["Jan".into(), "Feb".into()],
            regions: vec!["Texas".into()],
            cells: vec![vec![0.0], vec![50.0]],
        };
        let out = format_heat_map(&map);
        assert!(out.contains("Texas"));
        assert!(out.contains("$50.00"));
        assert!(out.contains('-'));
    }

    #[test]
    fn test_format_simulation_marks_optimum() {
        plain();
        let points = vec![
            SimulationPoint { price_change: 0.0, quantity: 10.0, revenue: 100.0 },
            SimulationPoint { price_change: 5.0, quantity: 9.5, revenue: 99.75 },
        ];
        let out = format_simulation(&SimulationReport {
            current: CurrentMetrics { units: 10.0, revenue: 100.0, average_price: Some(10.0) },
            optimal: Some(points[0].clone()),
            optimal_change: None,
            points,
        });
        assert!(out.contains("Optimal price change: +0.0%"));
        assert!(out.contains("$99.75"));
    }

    #[test]
    fn test_format_quality() {
        plain();
        let out = format_quality(&QualityStats {
            total_records: 3,
            missing_values: 2,
            anomalies: 1,
            quality_score: 67,
        });
        assert!(out.contains("67%"));
        assert!(out.contains("Missing values"));
    }
}
