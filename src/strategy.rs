use serde::Serialize;

use crate::error::{PricewiseError, Result};
use crate::normalizer::parse_iso_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyStatus {
    Proposed,
    Approved,
    Implemented,
    Rejected,
}

impl StrategyStatus {
    pub const ALL: [StrategyStatus; 4] = [
        Self::Proposed,
        Self::Approved,
        Self::Implemented,
        Self::Rejected,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Proposed => "Proposed",
            Self::Approved => "Approved",
            Self::Implemented => "Implemented",
            Self::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingStrategy {
    pub id: String,
    pub name: String,
    pub description: String,
    pub target_category: String,
    pub target_region: Option<String>,
    pub price_change: f64,
    pub change_type: ChangeType,
    pub expected_impact: f64,
    pub implementation_date: String,
    pub collaborators: Vec<String>,
    pub status: StrategyStatus,
}

impl PricingStrategy {
    pub fn change_label(&self) -> String {
        match self.change_type {
            ChangeType::Percentage => format!("{:+}%", self.price_change),
            ChangeType::Fixed => {
                let sign = if self.price_change < 0.0 { "-" } else { "+" };
                format!("{sign}${:.2}", self.price_change.abs())
            }
        }
    }
}

/// Strategy draft; `name`, `target_category` and `implementation_date` are required.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStrategy {
    pub name: String,
    pub description: String,
    pub target_category: String,
    pub target_region: Option<String>,
    pub price_change: f64,
    pub change_type: ChangeType,
    pub expected_impact: f64,
    pub implementation_date: String,
    pub collaborators: Vec<String>,
}

impl Default for NewStrategy {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            target_category: String::new(),
            target_region: None,
            price_change: 0.0,
            change_type: ChangeType::Percentage,
            expected_impact: 0.0,
            implementation_date: String::new(),
            collaborators: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyAction {
    Create(NewStrategy),
    SetStatus { id: String, status: StrategyStatus },
}

/// In-memory collection of pricing strategies. Never persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrategyBoard {
    pub strategies: Vec<PricingStrategy>,
}

impl StrategyBoard {
    pub fn seeded() -> Self {
        let seed = |id: &str,
                    name: &str,
                    description: &str,
                    category: &str,
                    region: Option<&str>,
                    change: f64,
                    change_type: ChangeType,
                    impact: f64,
                    date: &str,
                    collaborators: &[&str],
                    status: StrategyStatus| PricingStrategy {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            target_category: category.to_string(),
            target_region: region.map(str::to_string),
            price_change: change,
            change_type,
            expected_impact: impact,
            implementation_date: date.to_string(),
            collaborators: collaborators.iter().map(|c| c.to_string()).collect(),
            status,
        };
        Self {
            strategies: vec![
                seed(
                    "strategy-1",
                    "Premium Products Markup",
                    "Increase prices for high-margin products to maximize profitability",
                    "Electronics",
                    None,
                    10.0,
                    ChangeType::Percentage,
                    15.0,
                    "2023-11-01",
                    &["Product Manager", "Sales Director", "Marketing Manager"],
                    StrategyStatus::Implemented,
                ),
                seed(
                    "strategy-2",
                    "Seasonal Sales Promotion",
                    "Temporary discount for seasonal products to boost volume",
                    "Apparel",
                    Some("Minnesota"),
                    -15.0,
                    ChangeType::Percentage,
                    25.0,
                    "2023-12-01",
                    &["Marketing Manager", "Regional Manager", "Pricing Analyst"],
                    StrategyStatus::Approved,
                ),
                seed(
                    "strategy-3",
                    "Regional Price Adjustment",
                    "Adjust prices in high-demand regions to optimize margins",
                    "Audio",
                    Some("California"),
                    5.99,
                    ChangeType::Fixed,
                    8.0,
                    "2024-01-15",
                    &["Regional Sales Manager", "Pricing Analyst"],
                    StrategyStatus::Proposed,
                ),
            ],
        }
    }

    /// Apply an action, returning the next board. `self` is left untouched,
    /// so a rejected action leaves the caller's board as it was.
    pub fn reduce(&self, action: StrategyAction) -> Result<StrategyBoard> {
        let mut next = self.clone();
        match action {
            StrategyAction::Create(draft) => {
                validate(&draft)?;
                let id = next.next_id();
                next.strategies.push(PricingStrategy {
                    id,
                    name: draft.name.trim().to_string(),
                    description: draft.description,
                    target_category: draft.target_category.trim().to_string(),
                    target_region: draft.target_region.filter(|r| !r.trim().is_empty()),
                    price_change: draft.price_change,
                    change_type: draft.change_type,
                    expected_impact: draft.expected_impact,
                    implementation_date: draft.implementation_date,
                    collaborators: draft.collaborators,
                    status: StrategyStatus::Proposed,
                });
            }
            StrategyAction::SetStatus { id, status } => {
                let strategy = next
                    .strategies
                    .iter_mut()
                    .find(|s| s.id == id)
                    .ok_or(PricewiseError::UnknownStrategy(id))?;
                strategy.status = status;
            }
        }
        Ok(next)
    }

    pub fn by_status(&self, status: StrategyStatus) -> Vec<&PricingStrategy> {
        self.strategies.iter().filter(|s| s.status == status).collect()
    }

    /// `strategy-{n}` starting at one past the current count, skipping taken ids.
    fn next_id(&self) -> String {
        let mut n = self.strategies.len() + 1;
        loop {
            let id = format!("strategy-{n}");
            if !self.strategies.iter().any(|s| s.id == id) {
                return id;
            }
            n += 1;
        }
    }
}

fn validate(draft: &NewStrategy) -> Result<()> {
    let mut missing = Vec::new();
    if draft.name.trim().is_empty() {
        missing.push("name");
    }
    if draft.target_category.trim().is_empty() {
        missing.push("target category");
    }
    if draft.implementation_date.trim().is_empty() {
        missing.push("implementation date");
    }
    if !missing.is_empty() {
        return Err(PricewiseError::Validation(format!(
            "Missing required strategy fields: {}",
            missing.join(", ")
        )));
    }
    if parse_iso_date(&draft.implementation_date).is_none() {
        return Err(PricewiseError::Validation(format!(
            "Invalid implementation date: {}",
            draft.implementation_date
        )));
    }
    if !draft.price_change.is_finite() {
        return Err(PricewiseError::Validation("Price change must be a number".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewStrategy {
        NewStrategy {
            name: "Bundle Discount".into(),
            target_category: "Wearables".into(),
            price_change: -5.0,
            implementation_date: "2024-03-01".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_seeded_board() {
        let board = StrategyBoard::seeded();
        assert_eq!(board.strategies.len(), 3);
        assert_eq!(board.by_status(StrategyStatus::Implemented)[0].name, "Premium Products Markup");
        assert_eq!(board.by_status(StrategyStatus::Approved).len(), 1);
        assert_eq!(board.by_status(StrategyStatus::Rejected).len(), 0);
    }

    #[test]
    fn test_create_assigns_next_id_and_proposed() {
        let board = StrategyBoard::seeded();
        let next = board.reduce(StrategyAction::Create(draft())).unwrap();
        let created = next.strategies.last().unwrap();
        assert_eq!(created.id, "strategy-4");
        assert_eq!(created.status, StrategyStatus::Proposed);
        assert_eq!(board.strategies.len(), 3);
    }

    #[test]
    fn test_create_rejects_incomplete_draft() {
        let board = StrategyBoard::seeded();
        let incomplete = NewStrategy {
            target_category: String::new(),
            implementation_date: String::new(),
            ..draft()
        };
        let err = board.reduce(StrategyAction::Create(incomplete)).unwrap_err();
        assert!(err.to_string().contains("target category"));
        assert!(err.to_string().contains("implementation date"));
    }

    #[test]
    fn test_any_status_transition_allowed() {
        let board = StrategyBoard::seeded();
        let next = board
            .reduce(StrategyAction::SetStatus {
                id: "strategy-1".into(),
                status: StrategyStatus::Proposed,
            })
            .unwrap();
        assert_eq!(next.strategies[0].status, StrategyStatus::Proposed);
        let next = next
            .reduce(StrategyAction::SetStatus {
                id: "strategy-1".into(),
                status: StrategyStatus::Rejected,
            })
            .unwrap();
        assert_eq!(next.by_status(StrategyStatus::Rejected).len(), 1);
    }

    #[test]
    fn test_unknown_strategy() {
        let board = StrategyBoard::seeded();
        let err = board
            .reduce(StrategyAction::SetStatus {
                id: "strategy-99".into(),
                status: StrategyStatus::Approved,
            })
            .unwrap_err();
        assert!(matches!(err, PricewiseError::UnknownStrategy(_)));
    }

    #[test]
    fn test_id_skips_collisions() {
        let board = StrategyBoard::default()
            .reduce(StrategyAction::Create(draft()))
            .unwrap()
            .reduce(StrategyAction::Create(draft()))
            .unwrap();
        let ids: Vec<&str> = board.strategies.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["strategy-1", "strategy-2"]);
    }

    #[test]
    fn test_change_label() {
        let board = StrategyBoard::seeded();
        assert_eq!(board.strategies[0].change_label(), "+10%");
        assert_eq!(board.strategies[1].change_label(), "-15%");
        assert_eq!(board.strategies[2].change_label(), "+$5.99");
    }
}
