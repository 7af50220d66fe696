use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::{CanonicalSalesRecord, RawSalesRecord, SalesRecord};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT
);

CREATE TABLE IF NOT EXISTS sales (
    id TEXT PRIMARY KEY,
    product TEXT NOT NULL,
    category TEXT NOT NULL,
    quantity REAL NOT NULL,
    unit_price REAL NOT NULL,
    region TEXT NOT NULL,
    date TEXT NOT NULL,
    customer_type TEXT NOT NULL DEFAULT 'Regular',
    margin REAL,
    import_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    color TEXT NOT NULL DEFAULT '#e5e7eb',
    attributes TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS category_rules (
    id INTEGER PRIMARY KEY,
    category_id INTEGER NOT NULL,
    attribute TEXT NOT NULL,
    operator TEXT NOT NULL DEFAULT 'equals',
    value TEXT NOT NULL,
    FOREIGN KEY (category_id) REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    sku TEXT NOT NULL UNIQUE,
    price REAL NOT NULL,
    category TEXT,
    demand TEXT,
    seasonality TEXT,
    margin REAL,
    trend TEXT,
    image_url TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS pricing_rules (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    rule_type TEXT NOT NULL,
    value REAL NOT NULL,
    start_date TEXT,
    end_date TEXT,
    priority INTEGER DEFAULT 0,
    is_active INTEGER DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);
";

// (name, description, color, attributes, rules as (attribute, operator, value))
#[allow(clippy::type_complexity)]
const DEFAULT_CATEGORIES: &[(&str, &str, &str, &str, &[(&str, &str, &str)])] = &[
    (
        "Premium Products",
        "High-margin luxury items with premium pricing",
        "#dbeafe",
        "margin,demand",
        &[("margin", "greater_than", "30")],
    ),
    (
        "Seasonal",
        "Products with seasonal demand patterns",
        "#fed7aa",
        "seasonality",
        &[("seasonality", "equals", "summer")],
    ),
    (
        "High Demand",
        "Products with consistently high customer demand",
        "#dcfce7",
        "demand",
        &[("demand", "equals", "high")],
    ),
];

// (name, category, rule_type, value, start_date, end_date, priority)
#[allow(clippy::type_complexity)]
const DEFAULT_PRICING_RULES: &[(&str, &str, &str, f64, Option<&str>, Option<&str>, i64)] = &[
    ("Premium Product Markup", "Premium Products", "percentage", 15.0, None, None, 1),
    ("Summer Sale", "Seasonal", "percentage", -10.0, Some("2023-06-01"), Some("2023-08-31"), 2),
    ("High Demand Fixed Price Increase", "High Demand", "fixed", 5.0, None, None, 3),
];

// (name, sku, price, demand, seasonality, margin, trend)
#[allow(clippy::type_complexity)]
const DEFAULT_PRODUCTS: &[(&str, &str, f64, &str, Option<&str>, f64, &str)] = &[
    ("Premium Wireless Headphones", "WH-PRO-001", 299.99, "high", Some("Holiday"), 35.5, "up"),
    ("Summer Beach Sandals", "SBS-001", 49.99, "medium", Some("Summer"), 22.8, "up"),
    ("Smartphone Holder", "SH-001", 19.99, "high", None, 45.2, "stable"),
    ("Winter Thermal Jacket", "WTJ-001", 189.99, "medium", Some("Winter"), 28.7, "down"),
    ("Smart Watch Pro", "SWP-001", 349.99, "high", None, 38.2, "up"),
    ("Mini Portable Speaker", "MPS-001", 79.99, "high", None, 32.5, "up"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |row| row.get(0))?;
    if count == 0 {
        for (name, description, color, attributes, rules) in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO categories (name, description, color, attributes) VALUES (?1, ?2, ?3, ?4)",
                params![name, description, color, attributes],
            )?;
            let category_id = conn.last_insert_rowid();
            for (attribute, operator, value) in rules.iter() {
                conn.execute(
                    "INSERT INTO category_rules (category_id, attribute, operator, value) VALUES (?1, ?2, ?3, ?4)",
                    params![category_id, attribute, operator, value],
                )?;
            }
        }
    }

    let count: i64 = conn.query_row("SELECT count(*) FROM pricing_rules", [], |row| row.get(0))?;
    if count == 0 {
        for rule in DEFAULT_PRICING_RULES {
            conn.execute(
                "INSERT INTO pricing_rules (name, category, rule_type, value, start_date, end_date, priority) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![rule.0, rule.1, rule.2, rule.3, rule.4, rule.5, rule.6],
            )?;
        }
    }

    let count: i64 = conn.query_row("SELECT count(*) FROM products", [], |row| row.get(0))?;
    if count == 0 {
        for p in DEFAULT_PRODUCTS {
            conn.execute(
                "INSERT INTO products (name, sku, price, demand, seasonality, margin, trend) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![p.0, p.1, p.2, p.3, p.4, p.5, p.6],
            )?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

/// Stored sales rows, newest first, as raw canonical records.
pub fn fetch_sales(conn: &Connection) -> Result<Vec<RawSalesRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, product, category, quantity, unit_price, region, date, customer_type, margin
         FROM sales ORDER BY date DESC, id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RawSalesRecord::Canonical(CanonicalSalesRecord {
                id: Some(row.get(0)?),
                product: Some(row.get(1)?),
                category: Some(row.get(2)?),
                quantity: Some(row.get(3)?),
                unit_price: Some(row.get(4)?),
                total_sales: None,
                region: Some(row.get(5)?),
                date: Some(row.get(6)?),
                customer_type: Some(row.get(7)?),
                margin: row.get(8)?,
            }))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Insert unless a row with the same id exists. Returns whether it was new.
pub fn insert_sale(conn: &Connection, record: &SalesRecord, import_id: Option<i64>) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO sales (id, product, category, quantity, unit_price, region, date, customer_type, margin, import_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            record.id,
            record.product,
            record.category,
            record.quantity,
            record.unit_price,
            record.region,
            record.date,
            record.customer_type,
            record.margin,
            import_id,
        ],
    )?;
    Ok(changed > 0)
}

pub fn sales_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT count(*) FROM sales", [], |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn sale(id: &str, date: &str) -> SalesRecord {
        SalesRecord {
            id: id.into(),
            product: "Smart Watch Pro".into(),
            category: "Wearables".into(),
            quantity: 2.0,
            unit_price: 349.99,
            region: "California".into(),
            date: date.into(),
            customer_type: "Regular".into(),
            margin: Some(38.2),
        }
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["sales", "imports", "products", "categories", "category_rules", "pricing_rules"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_init_db_seeds_catalogue() {
        let (_dir, conn) = test_db();
        let rules: i64 = conn.query_row("SELECT count(*) FROM category_rules", [], |r| r.get(0)).unwrap();
        assert_eq!(rules, 3);
        let pricing: i64 = conn.query_row("SELECT count(*) FROM pricing_rules", [], |r| r.get(0)).unwrap();
        assert_eq!(pricing, 3);
        let products: i64 = conn.query_row("SELECT count(*) FROM products", [], |r| r.get(0)).unwrap();
        assert_eq!(products, 6);
    }

    #[test]
    fn test_sales_have_no_total_column() {
        let (_dir, conn) = test_db();
        let has_total = conn
            .prepare("SELECT total_sales FROM sales")
            .is_ok();
        assert!(!has_total);
    }

    #[test]
    fn test_insert_and_fetch_sales_newest_first() {
        let (_dir, conn) = test_db();
        assert!(insert_sale(&conn, &sale("a", "2023-02-01"), None).unwrap());
        assert!(insert_sale(&conn, &sale("b", "2023-06-01"), None).unwrap());
        assert!(!insert_sale(&conn, &sale("a", "2023-02-01"), None).unwrap());
        let rows = fetch_sales(&conn).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id(), Some("b"));
        assert_eq!(sales_count(&conn).unwrap(), 2);
    }
}
