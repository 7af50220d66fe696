use colored::Colorize;
use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{PricewiseError, Result};
use crate::models::{Category, CategoryRule, RuleOperator};
use crate::settings::load_settings;

pub fn add(name: &str, description: &str, color: &str, attributes: &[String]) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    add_category(&conn, name, description, color, attributes)?;
    println!("Added category: {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    let categories = list_categories(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Description", "Color", "Attributes", "Rules"]);
    for cat in categories {
        let rules: Vec<String> = cat
            .rules
            .iter()
            .map(|r| format!("{} {} {}", r.attribute, r.operator.key(), r.value))
            .collect();
        table.add_row(vec![
            Cell::new(cat.id),
            Cell::new(cat.name),
            Cell::new(cat.description),
            Cell::new(cat.color),
            Cell::new(cat.attributes.join(", ")),
            Cell::new(rules.join("\n")),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}

pub fn add_rule(category: &str, attribute: &str, operator: &str, value: &str) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    let op = RuleOperator::from_key(operator).ok_or_else(|| {
        let known: Vec<&str> = RuleOperator::ALL.iter().map(|o| o.key()).collect();
        PricewiseError::Validation(format!(
            "Unknown operator: {operator} (expected one of {})",
            known.join(", ")
        ))
    })?;
    add_category_rule(&conn, category, attribute, op, value)?;
    println!(
        "Added rule: {} {} {} {} {}",
        attribute,
        op.key(),
        value,
        "\u{2192}".dimmed(),
        category
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Data layer
// ---------------------------------------------------------------------------

pub fn category_id(conn: &Connection, name: &str) -> Result<i64> {
    conn.query_row("SELECT id FROM categories WHERE name = ?1", [name], |row| {
        row.get(0)
    })
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => PricewiseError::UnknownCategory(name.to_string()),
        other => PricewiseError::Db(other),
    })
}

/// All categories in id order, each with its rules.
pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, color, attributes FROM categories ORDER BY id",
    )?;
    let mut categories = stmt
        .query_map([], |row| {
            let attributes: String = row.get(4)?;
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                color: row.get(3)?,
                attributes: attributes
                    .split(',')
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .collect(),
                rules: Vec::new(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut rule_stmt = conn.prepare(
        "SELECT id, category_id, attribute, operator, value FROM category_rules ORDER BY id",
    )?;
    let rules: Vec<(i64, i64, String, String, String)> = rule_stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for (id, category_id, attribute, operator, value) in rules {
        let Some(operator) = RuleOperator::from_key(&operator) else {
            tracing::warn!(rule = id, operator = %operator, "skipping rule with unknown operator");
            continue;
        };
        if let Some(cat) = categories.iter_mut().find(|c| c.id == category_id) {
            cat.rules.push(CategoryRule {
                id: Some(id),
                attribute,
                operator,
                value,
            });
        }
    }
    Ok(categories)
}

pub fn add_category(
    conn: &Connection,
    name: &str,
    description: &str,
    color: &str,
    attributes: &[String],
) -> Result<i64> {
    if name.trim().len() < 2 {
        return Err(PricewiseError::Validation(
            "Category name must be at least 2 characters".into(),
        ));
    }
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )?;
    if exists {
        return Err(PricewiseError::Validation(format!(
            "Category name already exists: {name}"
        )));
    }
    conn.execute(
        "INSERT INTO categories (name, description, color, attributes) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![name.trim(), description, color, attributes.join(",")],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn add_category_rule(
    conn: &Connection,
    category: &str,
    attribute: &str,
    operator: RuleOperator,
    value: &str,
) -> Result<i64> {
    let id = category_id(conn, category)?;
    if attribute.trim().is_empty() {
        return Err(PricewiseError::Validation("Attribute is required".into()));
    }
    conn.execute(
        "INSERT INTO category_rules (category_id, attribute, operator, value) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![id, attribute.trim(), operator.key(), value],
    )?;
    Ok(conn.last_insert_rowid())
}
