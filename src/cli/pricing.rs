use colored::Colorize;
use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::cli::categories::category_id;
use crate::db::get_connection;
use crate::error::{PricewiseError, Result};
use crate::models::{PricingRule, PricingRuleType};
use crate::normalizer::parse_iso_date;
use crate::settings::load_settings;

/// Optional field changes for `pricing update`.
#[derive(Debug, Clone, Default)]
pub struct PricingRuleUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub rule_type: Option<PricingRuleType>,
    pub value: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub priority: Option<i64>,
    pub active: Option<bool>,
}

pub fn parse_rule_type(key: &str) -> Result<PricingRuleType> {
    PricingRuleType::from_key(key).ok_or_else(|| {
        PricewiseError::Validation(format!(
            "Unknown rule type: {key} (expected fixed, percentage or margin-based)"
        ))
    })
}

pub fn format_value(rule: &PricingRule) -> String {
    match rule.rule_type {
        PricingRuleType::Fixed => format!("${:.2}", rule.value),
        PricingRuleType::Percentage => format!("{}%", rule.value),
        PricingRuleType::MarginBased => format!("{:.2}x", rule.value),
    }
}

pub fn add(rule: PricingRule) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    let id = add_pricing_rule(&conn, &rule)?;
    println!("Added pricing rule {id}: {} \u{2192} {}", rule.name, rule.category);
    Ok(())
}

pub fn list(all: bool) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    let rules = list_pricing_rules(&conn, all)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Category", "Type", "Value", "Window", "Priority", "Status"]);
    for rule in rules {
        let window = match (&rule.start_date, &rule.end_date) {
            (None, None) => "always".to_string(),
            (start, end) => format!(
                "{} \u{2192} {}",
                start.as_deref().unwrap_or("…"),
                end.as_deref().unwrap_or("…")
            ),
        };
        let status = if !rule.is_active {
            "inactive".dimmed().to_string()
        } else if rule.in_effect_on(&today) {
            "in effect".green().to_string()
        } else {
            "scheduled".yellow().to_string()
        };
        table.add_row(vec![
            Cell::new(rule.id.unwrap_or_default()),
            Cell::new(&rule.name),
            Cell::new(&rule.category),
            Cell::new(rule.rule_type.key()),
            Cell::new(format_value(&rule)),
            Cell::new(window),
            Cell::new(rule.priority),
            Cell::new(status),
        ]);
    }
    println!("Pricing Rules\n{table}");
    Ok(())
}

pub fn update(id: i64, changes: PricingRuleUpdate) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    let rule = update_pricing_rule(&conn, id, changes)?;
    println!("Updated pricing rule {id}: {}", rule.name);
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    let rule = deactivate_pricing_rule(&conn, id)?;
    println!("Deleted pricing rule {id}: {}", rule.name);
    Ok(())
}

// ---------------------------------------------------------------------------
// Data layer
// ---------------------------------------------------------------------------

fn validate(conn: &Connection, rule: &PricingRule) -> Result<()> {
    if rule.name.trim().is_empty() {
        return Err(PricewiseError::Validation("Rule name is required".into()));
    }
    category_id(conn, &rule.category)?;
    if !rule.value.is_finite() {
        return Err(PricewiseError::Validation("Value must be a number".into()));
    }
    if !(1..=10).contains(&rule.priority) {
        return Err(PricewiseError::Validation(
            "Priority must be between 1 and 10".into(),
        ));
    }
    for date in [&rule.start_date, &rule.end_date].into_iter().flatten() {
        if parse_iso_date(date).is_none() {
            return Err(PricewiseError::Validation(format!(
                "Invalid date: {date} (expected YYYY-MM-DD)"
            )));
        }
    }
    if let (Some(start), Some(end)) = (&rule.start_date, &rule.end_date) {
        if start > end {
            return Err(PricewiseError::Validation(
                "Start date must not be after end date".into(),
            ));
        }
    }
    Ok(())
}

fn row_to_rule(row: &rusqlite::Row) -> rusqlite::Result<PricingRule> {
    let rule_type: String = row.get(3)?;
    Ok(PricingRule {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        category: row.get(2)?,
        rule_type: PricingRuleType::from_key(&rule_type).unwrap_or(PricingRuleType::Fixed),
        value: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        priority: row.get(7)?,
        is_active: row.get::<_, i64>(8)? != 0,
    })
}

const RULE_COLUMNS: &str =
    "id, name, category, rule_type, value, start_date, end_date, priority, is_active";

/// Rules by priority. Inactive rules only when `all` is set.
pub fn list_pricing_rules(conn: &Connection, all: bool) -> Result<Vec<PricingRule>> {
    let filter = if all { "" } else { "WHERE is_active = 1" };
    let mut stmt = conn.prepare(&format!(
        "SELECT {RULE_COLUMNS} FROM pricing_rules {filter} ORDER BY priority ASC, id ASC"
    ))?;
    let rules = stmt
        .query_map([], row_to_rule)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rules)
}

pub fn get_pricing_rule(conn: &Connection, id: i64) -> Result<PricingRule> {
    conn.query_row(
        &format!("SELECT {RULE_COLUMNS} FROM pricing_rules WHERE id = ?1"),
        [id],
        row_to_rule,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            PricewiseError::Other(format!("No pricing rule with ID {id}"))
        }
        other => PricewiseError::Db(other),
    })
}

pub fn add_pricing_rule(conn: &Connection, rule: &PricingRule) -> Result<i64> {
    validate(conn, rule)?;
    conn.execute(
        "INSERT INTO pricing_rules (name, category, rule_type, value, start_date, end_date, priority, is_active) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            rule.name.trim(),
            rule.category,
            rule.rule_type.key(),
            rule.value,
            rule.start_date,
            rule.end_date,
            rule.priority,
            rule.is_active as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_pricing_rule(
    conn: &Connection,
    id: i64,
    changes: PricingRuleUpdate,
) -> Result<PricingRule> {
    let current = get_pricing_rule(conn, id)?;
    let updated = PricingRule {
        id: Some(id),
        name: changes.name.unwrap_or(current.name),
        category: changes.category.unwrap_or(current.category),
        rule_type: changes.rule_type.unwrap_or(current.rule_type),
        value: changes.value.unwrap_or(current.value),
        start_date: changes.start_date.or(current.start_date),
        end_date: changes.end_date.or(current.end_date),
        priority: changes.priority.unwrap_or(current.priority),
        is_active: changes.active.unwrap_or(current.is_active),
    };
    validate(conn, &updated)?;
    conn.execute(
        "UPDATE pricing_rules SET name = ?1, category = ?2, rule_type = ?3, value = ?4, \
         start_date = ?5, end_date = ?6, priority = ?7, is_active = ?8 WHERE id = ?9",
        rusqlite::params![
            updated.name,
            updated.category,
            updated.rule_type.key(),
            updated.value,
            updated.start_date,
            updated.end_date,
            updated.priority,
            updated.is_active as i64,
            id,
        ],
    )?;
    Ok(updated)
}

pub fn deactivate_pricing_rule(conn: &Connection, id: i64) -> Result<PricingRule> {
    let rule = get_pricing_rule(conn, id)?;
    if !rule.is_active {
        return Err(PricewiseError::Other(format!(
            "Pricing rule {id} is already inactive"
        )));
    }
    conn.execute("UPDATE pricing_rules SET is_active = 0 WHERE id = ?1", [id])?;
    Ok(PricingRule {
        is_active: false,
        ..rule
    })
}
