use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Sales records
// ---------------------------------------------------------------------------

/// Canonical sales record. Every aggregation works on this shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub id: String,
    pub product: String,
    pub category: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub region: String,
    pub date: String,
    pub customer_type: String,
    /// Percent margin, only known for records that came from the flat shape.
    pub margin: Option<f64>,
}

impl SalesRecord {
    /// Always derived from quantity and unit price, never stored.
    pub fn total_sales(&self) -> f64 {
        self.unit_price * self.quantity
    }
}

/// Flat record shape, as found in the bundled product sales file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatSalesRecord {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub sales_location: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub demand: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub margin: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub trend: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Row shape served by the hosted `sales` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSalesRecord {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub total_sales: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub customer_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub margin: Option<f64>,
}

/// A sales record as it arrives from a source, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawSalesRecord {
    Flat(FlatSalesRecord),
    Canonical(CanonicalSalesRecord),
}

impl RawSalesRecord {
    /// Detect the shape from the presence of a `productName` key.
    pub fn from_value(value: Value) -> std::result::Result<Self, serde_json::Error> {
        let is_flat = value
            .as_object()
            .is_some_and(|obj| obj.contains_key("productName"));
        if is_flat {
            Ok(Self::Flat(serde_json::from_value(value)?))
        } else {
            Ok(Self::Canonical(serde_json::from_value(value)?))
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Flat(r) => r.id.as_deref(),
            Self::Canonical(r) => r.id.as_deref(),
        }
    }

    pub fn set_id(&mut self, id: String) {
        match self {
            Self::Flat(r) => r.id = Some(id),
            Self::Canonical(r) => r.id = Some(id),
        }
    }
}

impl<'de> Deserialize<'de> for RawSalesRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl From<&SalesRecord> for RawSalesRecord {
    fn from(r: &SalesRecord) -> Self {
        Self::Canonical(CanonicalSalesRecord {
            id: Some(r.id.clone()),
            product: Some(r.product.clone()),
            category: Some(r.category.clone()),
            quantity: Some(r.quantity),
            unit_price: Some(r.unit_price),
            total_sales: Some(r.total_sales()),
            region: Some(r.region.clone()),
            date: Some(r.date.clone()),
            customer_type: Some(r.customer_type.clone()),
            margin: r.margin,
        })
    }
}

/// Numbers, numeric strings and anything else that parses become `Some`; the rest `None`.
pub fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOperator {
    Equals,
    Contains,
    GreaterThan,
    LessThan,
    Between,
    Matches,
}

impl RuleOperator {
    pub const ALL: [RuleOperator; 6] = [
        Self::Equals,
        Self::Contains,
        Self::GreaterThan,
        Self::LessThan,
        Self::Between,
        Self::Matches,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::Between => "between",
            Self::Matches => "matches",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().find(|op| op.key() == key).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRule {
    pub id: Option<i64>,
    pub attribute: String,
    pub operator: RuleOperator,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub color: String,
    pub attributes: Vec<String>,
    pub rules: Vec<CategoryRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingRuleType {
    Fixed,
    Percentage,
    MarginBased,
}

impl PricingRuleType {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Percentage => "percentage",
            Self::MarginBased => "margin-based",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        [Self::Fixed, Self::Percentage, Self::MarginBased]
            .into_iter()
            .find(|t| t.key() == key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingRule {
    pub id: Option<i64>,
    pub name: String,
    pub category: String,
    pub rule_type: PricingRuleType,
    pub value: f64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub priority: i64,
    pub is_active: bool,
}

impl PricingRule {
    /// Active and `date` (YYYY-MM-DD) falls inside the optional window.
    pub fn in_effect_on(&self, date: &str) -> bool {
        if !self.is_active {
            return false;
        }
        let after_start = self.start_date.as_deref().map_or(true, |s| date >= s);
        let before_end = self.end_date.as_deref().map_or(true, |e| date <= e);
        after_start && before_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_flat_shape_by_product_name_key() {
        let v = serde_json::json!({"id": "1", "productName": "A", "price": 10, "quantity": 2});
        let raw = RawSalesRecord::from_value(v).unwrap();
        assert!(matches!(raw, RawSalesRecord::Flat(_)));
    }

    #[test]
    fn test_detects_canonical_shape_without_product_name() {
        let v = serde_json::json!({"id": 7, "product": "A", "unit_price": "12.5"});
        let raw = RawSalesRecord::from_value(v).unwrap();
        match raw {
            RawSalesRecord::Canonical(r) => {
                assert_eq!(r.id.as_deref(), Some("7"));
                assert_eq!(r.unit_price, Some(12.5));
            }
            _ => panic!("expected canonical"),
        }
    }

    #[test]
    fn test_lenient_numbers_coerce_garbage_to_none() {
        let v = serde_json::json!({"productName": "A", "price": "n/a", "quantity": null, "margin": true});
        let raw = RawSalesRecord::from_value(v).unwrap();
        let RawSalesRecord::Flat(r) = raw else { panic!("expected flat") };
        assert_eq!(r.price, None);
        assert_eq!(r.quantity, None);
        assert_eq!(r.margin, None);
    }

    #[test]
    fn test_total_sales_is_derived() {
        let r = SalesRecord {
            id: "1".into(),
            product: "A".into(),
            category: "Audio".into(),
            quantity: 4.0,
            unit_price: 25.0,
            region: "Ohio".into(),
            date: "2023-04-01".into(),
            customer_type: "Regular".into(),
            margin: None,
        };
        assert_eq!(r.total_sales(), 100.0);
    }

    #[test]
    fn test_pricing_rule_window() {
        let rule = PricingRule {
            id: None,
            name: "Summer Sale".into(),
            category: "Seasonal".into(),
            rule_type: PricingRuleType::Percentage,
            value: -10.0,
            start_date: Some("2023-06-01".into()),
            end_date: Some("2023-08-31".into()),
            priority: 2,
            is_active: true,
        };
        assert!(rule.in_effect_on("2023-07-15"));
        assert!(rule.in_effect_on("2023-06-01"));
        assert!(!rule.in_effect_on("2023-09-01"));
        let inactive = PricingRule { is_active: false, ..rule };
        assert!(!inactive.in_effect_on("2023-07-15"));
    }

    #[test]
    fn test_rule_operator_keys_roundtrip() {
        for op in RuleOperator::ALL {
            assert_eq!(RuleOperator::from_key(op.key()), Some(op));
        }
        assert_eq!(RuleOperator::from_key("nope"), None);
        assert_eq!(PricingRuleType::from_key("margin-based"), Some(PricingRuleType::MarginBased));
    }
}
