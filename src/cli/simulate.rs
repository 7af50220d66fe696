use crate::cli::report::text::format_simulation;
use crate::cli::{load_sales, SourceArgs};
use crate::elasticity::PriceSweep;
use crate::error::Result;
use crate::reports::{simulation_report, Filters};
use crate::settings::load_settings;

pub fn run(source: &SourceArgs, filters: &Filters, sweep: PriceSweep) -> Result<()> {
    let records = load_sales(source, filters)?;
    let table = load_settings().elasticity_table();
    let report = simulation_report(&records, &table, &sweep)?;
    println!("{}", format_simulation(&report));
    Ok(())
}
