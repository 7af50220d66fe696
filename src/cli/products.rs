use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::categorizer::categorize_products;
use crate::db::get_connection;
use crate::error::{PricewiseError, Result};
use crate::fmt::money;
use crate::models::Product;
use crate::settings::load_settings;

/// Fields for a new product, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub price: f64,
    pub category: Option<String>,
    pub demand: Option<String>,
    pub seasonality: Option<String>,
    pub margin: Option<f64>,
    pub trend: Option<String>,
    pub image_url: Option<String>,
}

/// Optional field changes for `products update`.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub demand: Option<String>,
    pub seasonality: Option<String>,
    pub margin: Option<f64>,
    pub trend: Option<String>,
    pub image_url: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().chars().count() < 2 {
            return Err(PricewiseError::Validation(
                "Product name must be at least 2 characters".into(),
            ));
        }
        if self.sku.trim().chars().count() < 3 {
            return Err(PricewiseError::Validation(
                "SKU must be at least 3 characters".into(),
            ));
        }
        if !(self.price.is_finite() && self.price > 0.0) {
            return Err(PricewiseError::Validation("Price must be positive".into()));
        }
        if let Some(margin) = self.margin {
            if !(margin.is_finite() && margin > 0.0) {
                return Err(PricewiseError::Validation("Margin must be positive".into()));
            }
        }
        if let Some(url) = &self.image_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(PricewiseError::Validation(format!(
                    "Image URL must be an http(s) URL: {url}"
                )));
            }
        }
        Ok(())
    }
}

pub fn add(product: NewProduct) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    let id = add_product(&conn, &product)?;
    println!("Added product {id}: {} ({})", product.name, product.sku);
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    let products = list_products(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "SKU", "Price", "Category", "Demand", "Season", "Margin", "Trend"]);
    for p in products {
        table.add_row(vec![
            Cell::new(p.id),
            Cell::new(p.name),
            Cell::new(p.sku),
            Cell::new(money(p.price)),
            Cell::new(p.category.unwrap_or_default()),
            Cell::new(p.demand.unwrap_or_default()),
            Cell::new(p.seasonality.unwrap_or_default()),
            Cell::new(p.margin.map(|m| format!("{m:.1}%")).unwrap_or_default()),
            Cell::new(p.trend.unwrap_or_default()),
        ]);
    }
    println!("Products\n{table}");
    Ok(())
}

pub fn update(id: i64, changes: ProductUpdate) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    let product = update_product(&conn, id, changes)?;
    println!("Updated product {id}: {} ({})", product.name, product.sku);
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    let name = delete_product(&conn, id)?;
    println!("Deleted product {id}: {name}");
    Ok(())
}

pub fn categorize() -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    let result = categorize_products(&conn)?;
    println!("Categorized: {}", result.categorized);
    println!("Unmatched: {}", result.unmatched);
    Ok(())
}

// ---------------------------------------------------------------------------
// Data layer
// ---------------------------------------------------------------------------

pub fn list_products(conn: &Connection) -> Result<Vec<Product>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, sku, price, category, demand, seasonality, margin, trend, image_url \
         FROM products ORDER BY id",
    )?;
    let products = stmt
        .query_map([], |row| {
            Ok(Product {
                id: row.get(0)?,
                name: row.get(1)?,
                sku: row.get(2)?,
                price: row.get(3)?,
                category: row.get(4)?,
                demand: row.get(5)?,
                seasonality: row.get(6)?,
                margin: row.get(7)?,
                trend: row.get(8)?,
                image_url: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(products)
}

pub fn get_product(conn: &Connection, id: i64) -> Result<Product> {
    list_products(conn)?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| PricewiseError::UnknownProduct(id.to_string()))
}

/// Validate a product against the catalogue. `own_id` is the product being
/// edited, whose current SKU does not count as taken.
fn check_product(conn: &Connection, product: &NewProduct, own_id: Option<i64>) -> Result<()> {
    product.validate()?;
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM products WHERE sku = ?1 AND id != ?2)",
        rusqlite::params![product.sku.trim(), own_id.unwrap_or(-1)],
        |row| row.get(0),
    )?;
    if exists {
        return Err(PricewiseError::Validation(format!(
            "SKU already exists: {}",
            product.sku
        )));
    }
    if let Some(category) = &product.category {
        crate::cli::categories::category_id(conn, category)?;
    }
    Ok(())
}

pub fn add_product(conn: &Connection, product: &NewProduct) -> Result<i64> {
    check_product(conn, product, None)?;
    conn.execute(
        "INSERT INTO products (name, sku, price, category, demand, seasonality, margin, trend, image_url) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            product.name.trim(),
            product.sku.trim(),
            product.price,
            product.category,
            product.demand,
            product.seasonality,
            product.margin,
            product.trend,
            product.image_url,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Apply field changes to a product. The merged product is validated as a
/// whole, so nothing is written when any field is rejected.
pub fn update_product(conn: &Connection, id: i64, changes: ProductUpdate) -> Result<Product> {
    let current = get_product(conn, id)?;
    let merged = NewProduct {
        name: changes.name.unwrap_or(current.name),
        sku: changes.sku.unwrap_or(current.sku),
        price: changes.price.unwrap_or(current.price),
        category: changes.category.or(current.category),
        demand: changes.demand.or(current.demand),
        seasonality: changes.seasonality.or(current.seasonality),
        margin: changes.margin.or(current.margin),
        trend: changes.trend.or(current.trend),
        image_url: changes.image_url.or(current.image_url),
    };
    check_product(conn, &merged, Some(id))?;
    conn.execute(
        "UPDATE products SET name = ?1, sku = ?2, price = ?3, category = ?4, demand = ?5, \
         seasonality = ?6, margin = ?7, trend = ?8, image_url = ?9 WHERE id = ?10",
        rusqlite::params![
            merged.name.trim(),
            merged.sku.trim(),
            merged.price,
            merged.category,
            merged.demand,
            merged.seasonality,
            merged.margin,
            merged.trend,
            merged.image_url,
            id,
        ],
    )?;
    get_product(conn, id)
}

/// Remove a product, returning its name.
pub fn delete_product(conn: &Connection, id: i64) -> Result<String> {
    let name: String = conn
        .query_row("SELECT name FROM products WHERE id = ?1", [id], |row| row.get(0))
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => PricewiseError::UnknownProduct(id.to_string()),
            other => PricewiseError::Db(other),
        })?;
    conn.execute("DELETE FROM products WHERE id = ?1", [id])?;
    Ok(name)
}
