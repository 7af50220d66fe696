use crate::db::{get_connection, sales_count};
use crate::error::Result;
use crate::settings::{api_key, load_settings};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("User:       {}", if settings.user_name.is_empty() { "(not set)" } else { &settings.user_name });
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    match settings.resolved_api_url() {
        Some(url) => println!(
            "Remote:     {url} (table {}, key {})",
            settings.sales_table,
            if api_key().is_some() { "set" } else { "missing" }
        ),
        None => println!("Remote:     (not configured)"),
    }

    if db_path.exists() {
        let conn = get_connection(&db_path)?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?)
        };
        let uncategorized: i64 = conn.query_row(
            "SELECT count(*) FROM products WHERE category IS NULL",
            [],
            |r| r.get(0),
        )?;
        let active_rules: i64 = conn.query_row(
            "SELECT count(*) FROM pricing_rules WHERE is_active = 1",
            [],
            |r| r.get(0),
        )?;

        println!();
        println!("Sales:          {}", sales_count(&conn)?);
        println!("Imports:        {}", count("imports")?);
        println!("Products:       {} ({uncategorized} uncategorized)", count("products")?);
        println!("Categories:     {}", count("categories")?);
        println!("Pricing rules:  {active_rules} active");
    } else {
        println!();
        println!("Database not found. Run `pricewise init` to set up.");
    }

    Ok(())
}
