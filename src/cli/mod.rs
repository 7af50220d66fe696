pub mod categories;
pub mod clean;
pub mod dashboard;
pub mod import;
pub mod init;
pub mod pricing;
pub mod products;
pub mod report;
pub mod simulate;
pub mod status;
pub mod strategies;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::aggregator::Granularity;
use crate::error::Result;
use crate::models::{PricingRuleType, SalesRecord};
use crate::normalizer::normalize;
use crate::reports::Filters;
use crate::settings::{load_settings, Settings};
use crate::source::upload::UploadFormat;
use crate::source::{load_records, LoadOutcome, SourceChoice};

fn parse_granularity(s: &str) -> std::result::Result<Granularity, String> {
    Granularity::from_key(s).ok_or_else(|| {
        format!("unknown granularity '{s}' (expected daily, weekly, monthly or quarterly)")
    })
}

fn parse_format(s: &str) -> std::result::Result<UploadFormat, String> {
    UploadFormat::from_key(s).ok_or_else(|| format!("unknown format '{s}' (expected json or csv)"))
}

fn parse_rule_type(s: &str) -> std::result::Result<PricingRuleType, String> {
    pricing::parse_rule_type(s).map_err(|e| e.to_string())
}

/// Where a command reads its sales data from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Data source: auto, remote, local or fixture
    #[arg(long, global = true, value_enum, default_value_t = SourceChoice::Auto)]
    pub source: SourceChoice,
    /// Read sales from a JSON or CSV file instead
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,
    /// Format of --file: json or csv (default: detect)
    #[arg(long, global = true, value_parser = parse_format)]
    pub format: Option<UploadFormat>,
}

/// Record filters; "all" disables a filter.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long, global = true)]
    pub region: Option<String>,
    #[arg(long = "customer-type", global = true)]
    pub customer_type: Option<String>,
    #[arg(long, global = true)]
    pub category: Option<String>,
}

impl From<FilterArgs> for Filters {
    fn from(args: FilterArgs) -> Self {
        Filters {
            region: args.region,
            customer_type: args.customer_type,
            category: args.category,
        }
    }
}

/// Load raw records once, reporting any fallback on stderr.
pub(crate) fn load_outcome(source: &SourceArgs, settings: &Settings) -> Result<LoadOutcome> {
    let outcome = load_records(
        source.source,
        source.file.as_deref(),
        source.format,
        settings,
    )?;
    if let Some(notice) = &outcome.notice {
        eprintln!("{notice}");
    }
    Ok(outcome)
}

/// Load, normalize and filter sales records for a read-only command.
pub(crate) fn load_sales(source: &SourceArgs, filters: &Filters) -> Result<Vec<SalesRecord>> {
    let outcome = load_outcome(source, &load_settings())?;
    let records = normalize(&outcome.records);
    Ok(filters.apply(&records))
}

#[derive(Parser)]
#[command(
    name = "pricewise",
    version,
    about = "Sales analytics and price simulation for product catalogues."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory and initialize the local store.
    Init {
        /// Path for pricewise data (default: ~/Documents/pricewise)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Show settings, data sources and local store counts.
    Status,
    /// Import a JSON or CSV sales file into the local store.
    Import {
        /// Path to the sales file
        file: PathBuf,
        /// Format: json or csv (default: detect)
        #[arg(long, value_parser = parse_format)]
        format: Option<UploadFormat>,
    },
    /// Clean sales data, export it to CSV and print a quality report.
    Clean {
        #[command(flatten)]
        source: SourceArgs,
        /// Output CSV path (default: <data_dir>/exports/cleaned_sales_data.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Analytics reports.
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Simulate revenue across a range of price changes.
    Simulate {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        /// First price change, in percent
        #[arg(long, default_value = "-20", allow_hyphen_values = true)]
        from: f64,
        /// Last price change, in percent
        #[arg(long, default_value = "20", allow_hyphen_values = true)]
        to: f64,
        /// Step between price changes, in percent
        #[arg(long, default_value = "5")]
        step: f64,
    },
    /// Manage the product catalogue.
    Products {
        #[command(subcommand)]
        command: ProductsCommands,
    },
    /// Manage product categories and their rules.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Manage pricing rules.
    Pricing {
        #[command(subcommand)]
        command: PricingCommands,
    },
    /// Show the pricing strategy board.
    Strategies {
        /// Print the board as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive sales dashboard.
    Dashboard {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Headline totals.
    Summary,
    /// Sales, products and margin per category.
    Categories,
    /// Monthly revenue and profit.
    Monthly,
    /// Sales by region.
    Regions,
    /// Sales by customer type.
    Customers,
    /// Sales over time with trend direction.
    Trend {
        /// Bucket size: daily, weekly, monthly or quarterly
        #[arg(long, default_value = "monthly", value_parser = parse_granularity)]
        granularity: Granularity,
    },
    /// Sales per calendar month.
    Seasonality,
    /// Sales by month and region.
    Heatmap,
    /// Missing values and anomalies in the raw data.
    Quality,
}

#[derive(Subcommand)]
pub enum ProductsCommands {
    /// Add a product.
    Add {
        name: String,
        #[arg(long)]
        sku: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        category: Option<String>,
        /// Demand level, e.g. high, medium, low
        #[arg(long)]
        demand: Option<String>,
        #[arg(long)]
        seasonality: Option<String>,
        /// Margin in percent
        #[arg(long)]
        margin: Option<f64>,
        #[arg(long)]
        trend: Option<String>,
        #[arg(long = "image-url")]
        image_url: Option<String>,
    },
    /// List all products.
    List,
    /// Update fields of a product.
    Update {
        /// Product ID (shown in `pricewise products list`)
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        sku: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        demand: Option<String>,
        #[arg(long)]
        seasonality: Option<String>,
        #[arg(long)]
        margin: Option<f64>,
        #[arg(long)]
        trend: Option<String>,
        #[arg(long = "image-url")]
        image_url: Option<String>,
    },
    /// Delete a product by ID.
    Delete {
        id: i64,
    },
    /// Assign categories to uncategorized products using category rules.
    Categorize,
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category.
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Display color, e.g. #3b82f6
        #[arg(long, default_value = "#64748b")]
        color: String,
        /// Attribute names, comma-separated
        #[arg(long, value_delimiter = ',')]
        attributes: Vec<String>,
    },
    /// List categories with their rules.
    List,
    /// Add an attribute rule to a category.
    AddRule {
        /// Category name
        category: String,
        /// Product attribute: name, sku, price, demand, seasonality, margin, trend
        #[arg(long)]
        attribute: String,
        /// Operator: equals, contains, greater_than, less_than, between, matches
        #[arg(long)]
        operator: String,
        #[arg(long)]
        value: String,
    },
}

#[derive(Subcommand)]
pub enum PricingCommands {
    /// Add a pricing rule.
    Add {
        name: String,
        /// Category name the rule applies to
        #[arg(long)]
        category: String,
        /// Rule type: fixed, percentage or margin-based
        #[arg(long = "type", value_parser = parse_rule_type)]
        rule_type: PricingRuleType,
        #[arg(long, allow_hyphen_values = true)]
        value: f64,
        /// Start date: YYYY-MM-DD
        #[arg(long = "from")]
        start_date: Option<String>,
        /// End date: YYYY-MM-DD
        #[arg(long = "to")]
        end_date: Option<String>,
        /// Priority from 1 to 10
        #[arg(long, default_value = "5")]
        priority: i64,
    },
    /// List pricing rules.
    List {
        /// Include inactive rules
        #[arg(long)]
        all: bool,
    },
    /// Update an existing pricing rule.
    Update {
        /// Rule ID (shown in `pricewise pricing list`)
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "type", value_parser = parse_rule_type)]
        rule_type: Option<PricingRuleType>,
        #[arg(long, allow_hyphen_values = true)]
        value: Option<f64>,
        #[arg(long = "from")]
        start_date: Option<String>,
        #[arg(long = "to")]
        end_date: Option<String>,
        #[arg(long)]
        priority: Option<i64>,
        /// Re-activate (true) or deactivate (false) the rule
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete (deactivate) a pricing rule by ID.
    Delete {
        id: i64,
    },
}
