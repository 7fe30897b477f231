use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Sparse origin -> destination -> quantity map for one route tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowMap(BTreeMap<String, BTreeMap<String, f64>>);

impl FlowMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from_id: &str, to_id: &str, quantity: f64) {
        self.0
            .entry(from_id.to_string())
            .or_default()
            .insert(to_id.to_string(), quantity);
    }

    pub fn get(&self, from_id: &str, to_id: &str) -> Option<f64> {
        self.0.get(from_id).and_then(|t| t.get(to_id)).copied()
    }

    /// Iterate `(from, to, quantity)` in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.0.iter().flat_map(|(from, targets)| {
            targets
                .iter()
                .map(move |(to, &qty)| (from.as_str(), to.as_str(), qty))
        })
    }

    pub fn outbound(&self, from_id: &str) -> f64 {
        self.0
            .get(from_id)
            .map(|t| t.values().fold(0.0, |acc, qty| acc + qty))
            .unwrap_or(0.0)
    }

    pub fn inbound(&self, to_id: &str) -> f64 {
        self.iter()
            .filter(|(_, to, _)| *to == to_id)
            .fold(0.0, |acc, (_, _, qty)| acc + qty)
    }

    pub fn total(&self) -> f64 {
        self.iter().fold(0.0, |acc, (_, _, qty)| acc + qty)
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Objective split by cost category (EUR)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub production: f64,
    pub transport_plant_dc: f64,
    pub transport_dc_market: f64,
    pub warehousing: f64,
    pub unmet_penalty: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.production
            + self.transport_plant_dc
            + self.transport_dc_market
            + self.warehousing
            + self.unmet_penalty
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum SolverStatus {
    Optimal,
}

/// Minimum-cost flow for one scenario. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub scenario: String,
    pub status: SolverStatus,
    pub objective_value: f64,
    /// Units produced per plant; every plant is listed
    pub production: BTreeMap<String, f64>,
    pub plant_to_dc_flows: FlowMap,
    pub dc_to_market_flows: FlowMap,
    /// Units of demand left unserved, material entries only
    pub unmet_demand: BTreeMap<String, f64>,
    pub cost_breakdown: CostBreakdown,
}

impl Solution {
    pub fn total_production(&self) -> f64 {
        // fold from +0.0: an empty f64 sum is -0.0
        self.production.values().fold(0.0, |acc, units| acc + units)
    }

    pub fn total_unmet(&self) -> f64 {
        self.unmet_demand.values().fold(0.0, |acc, units| acc + units)
    }

    pub fn unmet_for(&self, market_id: &str) -> f64 {
        self.unmet_demand.get(market_id).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_map_aggregates() {
        let mut flows = FlowMap::new();
        flows.insert("DC1", "M1", 10.0);
        flows.insert("DC1", "M2", 5.0);
        flows.insert("DC2", "M1", 2.5);

        assert_eq!(flows.len(), 3);
        assert_eq!(flows.outbound("DC1"), 15.0);
        assert_eq!(flows.outbound("DC3"), 0.0);
        assert_eq!(flows.inbound("M1"), 12.5);
        assert_eq!(flows.total(), 17.5);
        assert_eq!(flows.get("DC2", "M1"), Some(2.5));
        assert_eq!(flows.get("DC2", "M2"), None);
    }

    #[test]
    fn test_flow_map_serializes_as_nested_object() {
        let mut flows = FlowMap::new();
        flows.insert("P1", "DC1", 42.0);
        let json = serde_json::to_string(&flows).unwrap();
        assert_eq!(json, r#"{"P1":{"DC1":42.0}}"#);
    }

    #[test]
    fn test_empty_totals_are_positive_zero() {
        let solution = Solution {
            scenario: "baseline".to_string(),
            status: SolverStatus::Optimal,
            objective_value: 0.0,
            production: BTreeMap::new(),
            plant_to_dc_flows: FlowMap::new(),
            dc_to_market_flows: FlowMap::new(),
            unmet_demand: BTreeMap::new(),
            cost_breakdown: CostBreakdown::default(),
        };
        for total in [
            solution.total_unmet(),
            solution.total_production(),
            solution.dc_to_market_flows.total(),
            solution.dc_to_market_flows.inbound("M1"),
            solution.plant_to_dc_flows.outbound("P1"),
        ] {
            assert_eq!(total, 0.0);
            assert!(total.is_sign_positive());
        }
        assert_eq!(serde_json::to_string(&solution.total_unmet()).unwrap(), "0.0");
    }

    #[test]
    fn test_cost_breakdown_total() {
        let costs = CostBreakdown {
            production: 1.0,
            transport_plant_dc: 2.0,
            transport_dc_market: 3.0,
            warehousing: 4.0,
            unmet_penalty: 5.0,
        };
        assert_eq!(costs.total(), 15.0);
    }
}
