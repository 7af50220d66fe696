use std::path::Path;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::db::insert_sale;
use crate::error::Result;
use crate::normalizer::normalize;
use crate::source::upload::{assign_ids, read_file, UploadFormat};

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub duplicate_file: bool,
}

/// Load a sales file into the local store.
///
/// A file whose checksum was already imported is skipped whole. Rows whose id
/// already exists are skipped one by one. The file is parsed in full before
/// anything is written, so a malformed file leaves the store untouched.
pub fn import_file(
    conn: &Connection,
    file_path: &Path,
    format: Option<UploadFormat>,
) -> Result<ImportResult> {
    let checksum = compute_checksum(file_path)?;
    {
        let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        if stmt.exists([&checksum])? {
            return Ok(ImportResult {
                imported: 0,
                skipped: 0,
                duplicate_file: true,
            });
        }
    }

    let mut raw = read_file(file_path, format)?;
    // Generated ids carry the file checksum so id-less rows from different
    // files never collide.
    assign_ids(&mut raw, &format!("import-{}", &checksum[..12]));
    let records = normalize(&raw);

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO imports (filename, record_count, date_range_start, date_range_end, checksum) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            records.len() as i64,
            records.iter().map(|r| r.date.as_str()).min(),
            records.iter().map(|r| r.date.as_str()).max(),
            checksum,
        ],
    )?;
    let import_id = tx.last_insert_rowid();

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for record in &records {
        if insert_sale(&tx, record, Some(import_id))? {
            imported += 1;
        } else {
            skipped += 1;
        }
    }
    tx.commit()?;

    tracing::debug!(imported, skipped, file = %file_path.display(), "import finished");
    Ok(ImportResult {
        imported,
        skipped,
        duplicate_file: false,
    })
}
