pub mod text;

use crate::aggregator::{heat_map, seasonality as monthly_totals, Granularity};
use crate::cli::{load_outcome, load_sales, SourceArgs};
use crate::error::Result;
use crate::normalizer::quality_stats;
use crate::reports::{self, Filters};
use crate::settings::load_settings;

pub fn summary(source: &SourceArgs, filters: &Filters) -> Result<()> {
    let records = load_sales(source, filters)?;
    println!("{}", text::format_summary(&reports::summary(&records)));
    Ok(())
}

pub fn categories(source: &SourceArgs, filters: &Filters) -> Result<()> {
    let records = load_sales(source, filters)?;
    let perf = reports::category_performance(&records)?;
    println!("{}", text::format_category_performance(&perf));
    println!();
    println!("{}", text::format_counts(&reports::records_by_category(&records)));
    Ok(())
}

pub fn monthly(source: &SourceArgs, filters: &Filters) -> Result<()> {
    let records = load_sales(source, filters)?;
    println!("{}", text::format_monthly(&reports::monthly_revenue_profit(&records)));
    Ok(())
}

pub fn regions(source: &SourceArgs, filters: &Filters) -> Result<()> {
    let records = load_sales(source, filters)?;
    println!(
        "{}",
        text::format_breakdown("Sales by Region", "Region", &reports::top_regions(&records))
    );
    Ok(())
}

pub fn customers(source: &SourceArgs, filters: &Filters) -> Result<()> {
    let records = load_sales(source, filters)?;
    println!(
        "{}",
        text::format_breakdown(
            "Sales by Customer Type",
            "Customer Type",
            &reports::customer_types(&records)
        )
    );
    Ok(())
}

pub fn trend(source: &SourceArgs, filters: &Filters, granularity: Granularity) -> Result<()> {
    let records = load_sales(source, filters)?;
    println!("{}", text::format_trend(&reports::trend_report(&records, granularity)));
    Ok(())
}

pub fn seasonality(source: &SourceArgs, filters: &Filters) -> Result<()> {
    let records = load_sales(source, filters)?;
    println!("{}", text::format_seasonality(&monthly_totals(&records)));
    Ok(())
}

pub fn heatmap(source: &SourceArgs, filters: &Filters) -> Result<()> {
    let records = load_sales(source, filters)?;
    println!("{}", text::format_heat_map(&heat_map(&records)));
    Ok(())
}

/// Quality of the raw records, before any normalization.
pub fn quality(source: &SourceArgs) -> Result<()> {
    let outcome = load_outcome(source, &load_settings())?;
    println!("{}", text::format_quality(&quality_stats(&outcome.records)));
    Ok(())
}
