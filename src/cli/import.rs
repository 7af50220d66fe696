use std::path::Path;

use crate::db::get_connection;
use crate::error::Result;
use crate::importer::import_file;
use crate::settings::load_settings;
use crate::source::upload::UploadFormat;

pub fn run(file: &Path, format: Option<UploadFormat>) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;

    let result = import_file(&conn, file, format)?;

    if result.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }

    println!("{} imported, {} skipped (duplicates)", result.imported, result.skipped);
    Ok(())
}
