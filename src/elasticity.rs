use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{PricewiseError, Result};
use crate::models::SalesRecord;

pub const DEFAULT_ELASTICITY: f64 = -1.0;

/// Price elasticity of demand per category.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticityTable {
    pub coefficients: BTreeMap<String, f64>,
    pub default: f64,
}

pub fn default_coefficients() -> BTreeMap<String, f64> {
    [
        ("Electronics", -0.8),
        ("Audio", -1.2),
        ("Wearables", -1.0),
        ("Apparel", -1.5),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

impl Default for ElasticityTable {
    fn default() -> Self {
        Self {
            coefficients: default_coefficients(),
            default: DEFAULT_ELASTICITY,
        }
    }
}

impl ElasticityTable {
    /// Built-in coefficients with `overrides` layered on top.
    pub fn with_overrides(overrides: &BTreeMap<String, f64>, default: f64) -> Self {
        let mut coefficients = default_coefficients();
        coefficients.extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));
        Self {
            coefficients,
            default,
        }
    }

    pub fn coefficient(&self, category: &str) -> f64 {
        self.coefficients
            .get(category)
            .copied()
            .unwrap_or(self.default)
    }
}

/// Upper bound on the number of points one sweep may produce.
pub const MAX_SWEEP_POINTS: usize = 1000;

/// Price changes to simulate, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSweep {
    pub from: f64,
    pub to: f64,
    pub step: f64,
}

impl Default for PriceSweep {
    fn default() -> Self {
        Self {
            from: -20.0,
            to: 20.0,
            step: 5.0,
        }
    }
}

impl PriceSweep {
    pub fn values(&self) -> Result<Vec<f64>> {
        if !(self.from.is_finite() && self.to.is_finite() && self.step.is_finite()) {
            return Err(PricewiseError::InvalidSweep(
                "bounds and step must be finite".into(),
            ));
        }
        if self.step <= 0.0 {
            return Err(PricewiseError::InvalidSweep("step must be positive".into()));
        }
        if self.from > self.to {
            return Err(PricewiseError::InvalidSweep(format!(
                "start {} is above end {}",
                self.from, self.to
            )));
        }
        // Small tolerance so a step that lands on `to` is not lost to rounding.
        let steps = ((self.to - self.from) / self.step + 1e-9).floor();
        if !steps.is_finite() || steps >= MAX_SWEEP_POINTS as f64 {
            return Err(PricewiseError::InvalidSweep(format!(
                "more than {MAX_SWEEP_POINTS} price points"
            )));
        }
        let steps = steps as usize;
        Ok((0..=steps)
            .map(|i| self.from + i as f64 * self.step)
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationPoint {
    pub price_change: f64,
    pub quantity: f64,
    pub revenue: f64,
}

/// Project quantity and revenue under each price change in the sweep,
/// assuming linear demand with a uniform elasticity per category.
pub fn simulate(
    records: &[SalesRecord],
    table: &ElasticityTable,
    sweep: &PriceSweep,
) -> Result<Vec<SimulationPoint>> {
    let points = sweep
        .values()?
        .into_iter()
        .map(|p| {
            let mut quantity = 0.0;
            let mut revenue = 0.0;
            for r in records {
                let factor = table.coefficient(&r.category) * p / 100.0;
                let new_qty = r.quantity * (1.0 + factor);
                quantity += new_qty;
                revenue += r.unit_price * (1.0 + p / 100.0) * new_qty;
            }
            SimulationPoint {
                price_change: p,
                quantity,
                revenue,
            }
        })
        .collect::<Vec<_>>();
    tracing::debug!(points = points.len(), records = records.len(), "simulated price sweep");
    Ok(points)
}

/// Highest-revenue point. Ties keep the earliest, i.e. the lowest change.
pub fn optimal_price_change(points: &[SimulationPoint]) -> Option<&SimulationPoint> {
    let mut best: Option<&SimulationPoint> = None;
    for p in points {
        if best.map_or(true, |b| p.revenue > b.revenue) {
            best = Some(p);
        }
    }
    best
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevenueChange {
    pub absolute: f64,
    pub percent: f64,
}

/// Change of `revenue` against the unchanged-price point.
pub fn revenue_change(points: &[SimulationPoint], revenue: f64) -> Option<RevenueChange> {
    let baseline = points.iter().find(|p| p.price_change == 0.0)?.revenue;
    if baseline == 0.0 {
        return None;
    }
    let absolute = revenue - baseline;
    Some(RevenueChange {
        absolute,
        percent: absolute / baseline * 100.0,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentMetrics {
    pub units: f64,
    pub revenue: f64,
    pub average_price: Option<f64>,
}

pub fn current_metrics(records: &[SalesRecord]) -> CurrentMetrics {
    let units: f64 = records.iter().map(|r| r.quantity).sum();
    let revenue: f64 = records.iter().map(SalesRecord::total_sales).sum();
    CurrentMetrics {
        units,
        revenue,
        average_price: (units != 0.0).then(|| revenue / units),
    }
}
