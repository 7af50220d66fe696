use std::path::PathBuf;

use crate::cli::report::text::format_quality;
use crate::cli::{load_outcome, SourceArgs};
use crate::error::Result;
use crate::export::write_csv_file;
use crate::normalizer::{clean_records, quality_stats};
use crate::settings::load_settings;

pub fn run(source: &SourceArgs, output: Option<PathBuf>) -> Result<()> {
    let settings = load_settings();
    let outcome = load_outcome(source, &settings)?;

    let stats = quality_stats(&outcome.records);
    let cleaned = clean_records(&outcome.records);

    let output = output.unwrap_or_else(|| {
        PathBuf::from(&settings.data_dir)
            .join("exports")
            .join("cleaned_sales_data.csv")
    });
    write_csv_file(&output, &cleaned)?;
    tracing::info!(records = cleaned.len(), output = %output.display(), "wrote cleaned sales data");

    println!("{}", format_quality(&stats));
    println!();
    println!(
        "{} records from the {} written to {}",
        cleaned.len(),
        outcome.origin.label(),
        output.display()
    );
    Ok(())
}
