use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::models::{CanonicalSalesRecord, RawSalesRecord, SalesRecord};

pub const COLUMNS: [&str; 9] = [
    "id",
    "product",
    "category",
    "quantity",
    "unit_price",
    "total_sales",
    "region",
    "date",
    "customer_type",
];

/// Write records in the fixed column order. `total_sales` is derived on the way out.
pub fn write_csv<W: Write>(writer: W, records: &[SalesRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(COLUMNS)?;
    for r in records {
        wtr.write_record([
            r.id.clone(),
            r.product.clone(),
            r.category.clone(),
            r.quantity.to_string(),
            r.unit_price.to_string(),
            r.total_sales().to_string(),
            r.region.clone(),
            r.date.clone(),
            r.customer_type.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(path: &Path, records: &[SalesRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv(std::io::BufWriter::new(file), records)
}

/// Read a CSV in the export layout back into raw canonical records.
/// Columns are matched by header name, so their order does not matter.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RawSalesRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let cols: Vec<Option<usize>> = COLUMNS.iter().map(|c| position(c)).collect();
    let margin_col = position("margin");

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let text = |col: Option<usize>| {
            col.and_then(|i| record.get(i))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let number = |col: Option<usize>| {
            text(col).and_then(|s| s.parse::<f64>().ok().filter(|v| v.is_finite()))
        };
        rows.push(RawSalesRecord::Canonical(CanonicalSalesRecord {
            id: text(cols[0]),
            product: text(cols[1]),
            category: text(cols[2]),
            quantity: number(cols[3]),
            unit_price: number(cols[4]),
            total_sales: number(cols[5]),
            region: text(cols[6]),
            date: text(cols[7]),
            customer_type: text(cols[8]),
            margin: number(margin_col),
        }));
    }
    Ok(rows)
}
