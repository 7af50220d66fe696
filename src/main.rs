mod aggregator;
mod categorizer;
mod chart;
mod cli;
mod db;
mod elasticity;
mod error;
mod export;
mod fmt;
mod importer;
mod models;
mod normalizer;
mod reports;
mod settings;
mod source;
mod strategy;
mod tui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::products::{NewProduct, ProductUpdate};
use cli::pricing::PricingRuleUpdate;
use cli::{
    CategoriesCommands, Cli, Commands, PricingCommands, ProductsCommands, ReportCommands,
};
use elasticity::PriceSweep;
use models::PricingRule;

fn init_logging() {
    let filter = EnvFilter::try_from_env("PRICEWISE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Status => cli::status::run(),
        Commands::Import { file, format } => cli::import::run(&file, format),
        Commands::Clean { source, output } => cli::clean::run(&source, output),
        Commands::Report {
            source,
            filters,
            command,
        } => {
            let filters: reports::Filters = filters.into();
            match command {
                ReportCommands::Summary => cli::report::summary(&source, &filters),
                ReportCommands::Categories => cli::report::categories(&source, &filters),
                ReportCommands::Monthly => cli::report::monthly(&source, &filters),
                ReportCommands::Regions => cli::report::regions(&source, &filters),
                ReportCommands::Customers => cli::report::customers(&source, &filters),
                ReportCommands::Trend { granularity } => {
                    cli::report::trend(&source, &filters, granularity)
                }
                ReportCommands::Seasonality => cli::report::seasonality(&source, &filters),
                ReportCommands::Heatmap => cli::report::heatmap(&source, &filters),
                ReportCommands::Quality => cli::report::quality(&source),
            }
        }
        Commands::Simulate {
            source,
            filters,
            from,
            to,
            step,
        } => cli::simulate::run(&source, &filters.into(), PriceSweep { from, to, step }),
        Commands::Products { command } => match command {
            ProductsCommands::Add {
                name,
                sku,
                price,
                category,
                demand,
                seasonality,
                margin,
                trend,
                image_url,
            } => cli::products::add(NewProduct {
                name,
                sku,
                price,
                category,
                demand,
                seasonality,
                margin,
                trend,
                image_url,
            }),
            ProductsCommands::List => cli::products::list(),
            ProductsCommands::Update {
                id,
                name,
                sku,
                price,
                category,
                demand,
                seasonality,
                margin,
                trend,
                image_url,
            } => cli::products::update(
                id,
                ProductUpdate {
                    name,
                    sku,
                    price,
                    category,
                    demand,
                    seasonality,
                    margin,
                    trend,
                    image_url,
                },
            ),
            ProductsCommands::Delete { id } => cli::products::delete(id),
            ProductsCommands::Categorize => cli::products::categorize(),
        },
        Commands::Categories { command } => match command {
            CategoriesCommands::Add {
                name,
                description,
                color,
                attributes,
            } => cli::categories::add(&name, &description, &color, &attributes),
            CategoriesCommands::List => cli::categories::list(),
            CategoriesCommands::AddRule {
                category,
                attribute,
                operator,
                value,
            } => cli::categories::add_rule(&category, &attribute, &operator, &value),
        },
        Commands::Pricing { command } => match command {
            PricingCommands::Add {
                name,
                category,
                rule_type,
                value,
                start_date,
                end_date,
                priority,
            } => cli::pricing::add(PricingRule {
                id: None,
                name,
                category,
                rule_type,
                value,
                start_date,
                end_date,
                priority,
                is_active: true,
            }),
            PricingCommands::List { all } => cli::pricing::list(all),
            PricingCommands::Update {
                id,
                name,
                category,
                rule_type,
                value,
                start_date,
                end_date,
                priority,
                active,
            } => cli::pricing::update(
                id,
                PricingRuleUpdate {
                    name,
                    category,
                    rule_type,
                    value,
                    start_date,
                    end_date,
                    priority,
                    active,
                },
            ),
            PricingCommands::Delete { id } => cli::pricing::delete(id),
        },
        Commands::Strategies { json } => cli::strategies::run(json),
        Commands::Dashboard { source } => cli::dashboard::run(&source),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
