use crate::error::Result;
use crate::models::RawSalesRecord;
use crate::source::upload::parse_json;

const FIXTURE: &str = include_str!("../../data/product_sales_data.json");

/// Bundled product sales dataset (flat shape).
pub fn fixture_records() -> Result<Vec<RawSalesRecord>> {
    parse_json(FIXTURE)
}
