//! Volume-weighted metrics over a solved flow graph
//!
//! Every function is pure: it reads a [`Solution`] and looks routes and
//! nodes up in the [`Network`] it was solved against.

use serde::{Deserialize, Serialize};

use super::resilience::{active_distribution_centers, resilience_score};
use crate::domain::{FlowMap, Network, RouteTier, Solution};

/// Numeric summary of one scenario's solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionAnalytics {
    pub total_cost: f64,
    pub total_demand: f64,
    pub delivered_units: f64,
    pub unmet_units: f64,
    /// Fraction of demand served, 0..=1
    pub fill_rate: f64,
    pub cost_per_unit: f64,
    pub capacity_utilization: f64,
    pub weighted_lead_time_days: f64,
    pub total_emissions_kg: f64,
    pub total_revenue: f64,
    pub active_distribution_centers: usize,
    pub resilience_score: u8,
}

impl SolutionAnalytics {
    pub fn compute(solution: &Solution, network: &Network) -> Self {
        let delivered_units = solution.dc_to_market_flows.total();
        Self {
            total_cost: solution.objective_value,
            total_demand: network.total_demand(),
            delivered_units,
            unmet_units: solution.total_unmet(),
            fill_rate: fill_rate(solution, network),
            cost_per_unit: cost_per_unit(solution),
            capacity_utilization: capacity_utilization(solution, network),
            weighted_lead_time_days: weighted_lead_time(solution, network),
            total_emissions_kg: total_emissions(solution, network),
            total_revenue: total_revenue(solution, network),
            active_distribution_centers: active_distribution_centers(solution),
            resilience_score: resilience_score(solution, network),
        }
    }

    pub fn fill_rate_percent(&self) -> f64 {
        self.fill_rate * 100.0
    }
}

/// `sum(flow * lead_time) / sum(flow)` over DC -> market flows; 0 with no flow
pub fn weighted_lead_time(solution: &Solution, network: &Network) -> f64 {
    let (weighted, volume) = solution
        .dc_to_market_flows
        .iter()
        .filter(|(_, _, units)| *units > 0.0)
        .filter_map(|(from, to, units)| {
            network
                .route(from, to)
                .filter(|route| route.tier == RouteTier::DcToMarket)
                .map(|route| (units * route.lead_time_days, units))
        })
        .fold((0.0, 0.0), |(w, v), (dw, dv)| (w + dw, v + dv));

    if volume > 0.0 {
        weighted / volume
    } else {
        0.0
    }
}

/// Emissions over both route tiers
pub fn total_emissions(solution: &Solution, network: &Network) -> f64 {
    tier_emissions(&solution.plant_to_dc_flows, network) + tier_emissions(&solution.dc_to_market_flows, network)
}

fn tier_emissions(flows: &FlowMap, network: &Network) -> f64 {
    flows
        .iter()
        .filter_map(|(from, to, units)| network.route(from, to).map(|r| units * r.emissions_per_unit))
        .fold(0.0, |acc, kg| acc + kg)
}

/// `(demand - unmet) / demand`; a network without demand is fully served
pub fn fill_rate(solution: &Solution, network: &Network) -> f64 {
    let demand = network.total_demand();
    if demand > 0.0 {
        (demand - solution.total_unmet()) / demand
    } else {
        1.0
    }
}

pub fn cost_per_unit(solution: &Solution) -> f64 {
    let delivered = solution.dc_to_market_flows.total();
    if delivered > 0.0 {
        solution.objective_value / delivered
    } else {
        0.0
    }
}

/// Total production over total nameplate capacity
pub fn capacity_utilization(solution: &Solution, network: &Network) -> f64 {
    let capacity = network.total_capacity();
    if capacity > 0.0 {
        solution.total_production() / capacity
    } else {
        0.0
    }
}

pub fn total_revenue(solution: &Solution, network: &Network) -> f64 {
    network
        .markets()
        .iter()
        .map(|market| solution.dc_to_market_flows.inbound(&market.id) * market.revenue_per_unit)
        .fold(0.0, |acc, eur| acc + eur)
}
