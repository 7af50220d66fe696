use regex::Regex;
use rusqlite::Connection;

use crate::cli::categories::list_categories;
use crate::cli::products::list_products;
use crate::error::Result;
use crate::models::{Category, CategoryRule, Product, RuleOperator};

/// Attribute value of a product as text, for rule matching.
fn attribute(product: &Product, name: &str) -> Option<String> {
    match name {
        "name" => Some(product.name.clone()),
        "sku" => Some(product.sku.clone()),
        "price" => Some(product.price.to_string()),
        "category" => product.category.clone(),
        "demand" => product.demand.clone(),
        "seasonality" => product.seasonality.clone(),
        "margin" => product.margin.map(|m| m.to_string()),
        "trend" => product.trend.clone(),
        "image_url" | "imageUrl" => product.image_url.clone(),
        _ => None,
    }
}

fn number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

/// `"lo,hi"` or `"lo..hi"`, inclusive.
fn bounds(value: &str) -> Option<(f64, f64)> {
    let (lo, hi) = value.split_once("..").or_else(|| value.split_once(','))?;
    Some((number(lo)?, number(hi)?))
}

pub fn rule_matches(product: &Product, rule: &CategoryRule) -> bool {
    let Some(actual) = attribute(product, &rule.attribute) else {
        return false;
    };
    let actual_upper = actual.to_uppercase();
    let expected_upper = rule.value.to_uppercase();
    match rule.operator {
        RuleOperator::Equals => match (number(&actual), number(&rule.value)) {
            (Some(a), Some(b)) => a == b,
            _ => actual_upper.trim() == expected_upper.trim(),
        },
        RuleOperator::Contains => actual_upper.contains(&expected_upper),
        RuleOperator::GreaterThan => matches!((number(&actual), number(&rule.value)), (Some(a), Some(b)) if a > b),
        RuleOperator::LessThan => matches!((number(&actual), number(&rule.value)), (Some(a), Some(b)) if a < b),
        RuleOperator::Between => match (number(&actual), bounds(&rule.value)) {
            (Some(a), Some((lo, hi))) => a >= lo && a <= hi,
            _ => false,
        },
        RuleOperator::Matches => Regex::new(&rule.value)
            .map(|re| re.is_match(&actual))
            .unwrap_or(false),
    }
}

/// First category whose rules all match. A category without rules never does.
pub fn category_for<'a>(product: &Product, categories: &'a [Category]) -> Option<&'a Category> {
    categories
        .iter()
        .find(|c| !c.rules.is_empty() && c.rules.iter().all(|r| rule_matches(product, r)))
}

pub struct CategorizeResult {
    pub categorized: usize,
    pub unmatched: usize,
}

/// Assign a category to every product that has none.
pub fn categorize_products(conn: &Connection) -> Result<CategorizeResult> {
    let categories = list_categories(conn)?;
    let pending: Vec<Product> = list_products(conn)?
        .into_iter()
        .filter(|p| p.category.as_deref().map_or(true, |c| c.trim().is_empty()))
        .collect();

    let mut categorized = 0usize;
    let mut unmatched = 0usize;
    for product in &pending {
        match category_for(product, &categories) {
            Some(category) => {
                conn.execute(
                    "UPDATE products SET category = ?1 WHERE id = ?2",
                    rusqlite::params![category.name, product.id],
                )?;
                tracing::debug!(sku = %product.sku, category = %category.name, "categorized product");
                categorized += 1;
            }
            None => unmatched += 1,
        }
    }

    Ok(CategorizeResult {
        categorized,
        unmatched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn product() -> Product {
        Product {
            id: 1,
            name: "Summer Beach Sandals".into(),
            sku: "SBS-001".into(),
            price: 49.99,
            category: None,
            demand: Some("medium".into()),
            seasonality: Some("Summer".into()),
            margin: Some(22.8),
            trend: Some("up".into()),
            image_url: None,
        }
    }

    fn rule(attribute: &str, operator: RuleOperator, value: &str) -> CategoryRule {
        CategoryRule {
            id: None,
            attribute: attribute.into(),
            operator,
            value: value.into(),
        }
    }

    #[test]
    fn test_operators() {
        let p = product();
        assert!(rule_matches(&p, &rule("seasonality", RuleOperator::Equals, "summer")));
        assert!(rule_matches(&p, &rule("name", RuleOperator::Contains, "beach")));
        assert!(rule_matches(&p, &rule("margin", RuleOperator::GreaterThan, "20")));
        assert!(!rule_matches(&p, &rule("margin", RuleOperator::GreaterThan, "30")));
        assert!(rule_matches(&p, &rule("price", RuleOperator::LessThan, "50")));
        assert!(rule_matches(&p, &rule("price", RuleOperator::Between, "40,60")));
        assert!(rule_matches(&p, &rule("price", RuleOperator::Between, "40..60")));
        assert!(rule_matches(&p, &rule("sku", RuleOperator::Matches, r"^SBS-\d+$")));
        assert!(!rule_matches(&p, &rule("sku", RuleOperator::Matches, "[invalid")));
    }

    #[test]
    fn test_missing_attribute_never_matches() {
        let p = Product { margin: None, ..product() };
        assert!(!rule_matches(&p, &rule("margin", RuleOperator::LessThan, "100")));
        assert!(!rule_matches(&p, &rule("color", RuleOperator::Equals, "red")));
    }

    #[test]
    fn test_first_matching_category_wins() {
        let categories = vec![
            Category {
                id: 1,
                name: "Empty".into(),
                description: String::new(),
                color: String::new(),
                attributes: vec![],
                rules: vec![],
            },
            Category {
                id: 2,
                name: "Seasonal".into(),
                description: String::new(),
                color: String::new(),
                attributes: vec![],
                rules: vec![rule("seasonality", RuleOperator::Equals, "summer")],
            },
            Category {
                id: 3,
                name: "Cheap".into(),
                description: String::new(),
                color: String::new(),
                attributes: vec![],
                rules: vec![rule("price", RuleOperator::LessThan, "100")],
            },
        ];
        assert_eq!(category_for(&product(), &categories).unwrap().name, "Seasonal");
    }

    #[test]
    fn test_categorize_seeded_products() {
        let (_dir, conn) = test_db();
        let result = categorize_products(&conn).unwrap();
        assert_eq!(result.categorized, 5);
        assert_eq!(result.unmatched, 1);
        let category: Option<String> = conn
            .query_row("SELECT category FROM products WHERE sku = 'SBS-001'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(category.as_deref(), Some("Seasonal"));

        let again = categorize_products(&conn).unwrap();
        assert_eq!(again.categorized, 0);
        assert_eq!(again.unmatched, 1);
    }
}
