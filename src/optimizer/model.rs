//! Flow Model Builder
//!
//! Translates the network tables plus a scenario's overrides into a
//! minimum-cost flow linear program over four variable families:
//!
//! - `production[plant]` in `[0, capacity]`, fixed to 0 when the plant is disabled
//! - `flow_plant_dc[route]` in `[0, inf)`
//! - `flow_dc_market[route]` in `[0, inf)`
//! - `unmet[market]` in `[0, demand]`, the slack that keeps every scenario feasible
//!
//! The objective is the sum of five cost terms (production, two transport
//! tiers, warehousing, unmet-demand penalty). Each term is kept as its own
//! expression so the extractor can report the breakdown from exactly the
//! quantities the solver minimised.
//!
//! Warehousing fixed cost is a constant: there is no "DC open" decision, so
//! it shifts the total uniformly and never influences routing.

use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use super::{Assignment, Bounds, LinearExpr, LinearProgram, Relation, ScenarioConstraints, VarId};
use crate::domain::{CostBreakdown, Network, RouteTier};
use crate::error::NetworkError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ModelParams {
    /// Penalty per unit of unserved demand (lost revenue + brand damage)
    #[validate(range(min = 0.0))]
    pub unmet_penalty_per_unit: f64,
    /// Multiplier turning monthly DC fixed cost into an annual figure
    #[validate(range(min = 1.0))]
    pub months_per_year: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            unmet_penalty_per_unit: 5.0,
            months_per_year: 12.0,
        }
    }
}

/// One route's flow variable
#[derive(Debug, Clone, PartialEq)]
pub struct FlowVar {
    pub from_id: String,
    pub to_id: String,
    pub var: VarId,
    pub cost_per_unit: f64,
}

/// The five objective components, each a separate expression
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostTerms {
    pub production: LinearExpr,
    pub transport_plant_dc: LinearExpr,
    pub transport_dc_market: LinearExpr,
    pub warehousing: LinearExpr,
    pub unmet_penalty: LinearExpr,
}

impl CostTerms {
    pub fn objective(&self) -> LinearExpr {
        self.production.clone()
            + self.transport_plant_dc.clone()
            + self.transport_dc_market.clone()
            + self.warehousing.clone()
            + self.unmet_penalty.clone()
    }

    pub fn evaluate(&self, assignment: &Assignment) -> CostBreakdown {
        CostBreakdown {
            production: self.production.eval(assignment),
            transport_plant_dc: self.transport_plant_dc.eval(assignment),
            transport_dc_market: self.transport_dc_market.eval(assignment),
            warehousing: self.warehousing.eval(assignment),
            unmet_penalty: self.unmet_penalty.eval(assignment),
        }
    }
}

/// Assembled program plus the handles needed to read a solution back
#[derive(Debug, Clone)]
pub struct FlowModel {
    program: LinearProgram,
    production: Vec<(String, VarId)>,
    plant_to_dc: Vec<FlowVar>,
    dc_to_market: Vec<FlowVar>,
    unmet: Vec<(String, VarId)>,
    costs: CostTerms,
}

impl FlowModel {
    /// Build the program for `network` under `constraints`.
    ///
    /// Fails with `DataIntegrity` before anything is solved if a route or a
    /// disabled plant references a node that does not exist.
    pub fn build(
        network: &Network,
        constraints: &ScenarioConstraints,
        params: &ModelParams,
    ) -> Result<Self, NetworkError> {
        network.validate()?;
        for plant_id in constraints.disabled_plants() {
            if network.plant(plant_id).is_none() {
                return Err(NetworkError::DataIntegrity(format!(
                    "scenario disables unknown plant `{plant_id}`"
                )));
            }
        }

        let mut program = LinearProgram::new("network_flow");

        let production: Vec<(String, VarId)> = network
            .plants()
            .iter()
            .map(|plant| {
                let bounds = if constraints.is_disabled(&plant.id) {
                    Bounds::fixed(0.0)
                } else {
                    Bounds::between(0.0, plant.capacity_units)
                };
                let var = program.add_variable(format!("production_{}", plant.id), bounds);
                (plant.id.clone(), var)
            })
            .collect();

        let plant_to_dc = flow_variables(&mut program, network, RouteTier::PlantToDc, "flow_P");
        let dc_to_market = flow_variables(&mut program, network, RouteTier::DcToMarket, "flow_DC");

        let unmet: Vec<(String, VarId)> = network
            .markets()
            .iter()
            .map(|market| {
                let var = program.add_variable(
                    format!("unmet_{}", market.id),
                    Bounds::between(0.0, market.annual_demand_units),
                );
                (market.id.clone(), var)
            })
            .collect();

        // Objective
        let mut costs = CostTerms::default();
        for (plant, (_, var)) in network.plants().iter().zip(&production) {
            costs.production.add_term(*var, plant.unit_cost);
        }
        for flow in &plant_to_dc {
            costs.transport_plant_dc.add_term(flow.var, flow.cost_per_unit);
        }
        for flow in &dc_to_market {
            costs.transport_dc_market.add_term(flow.var, flow.cost_per_unit);
        }
        for dc in network.distribution_centers() {
            costs
                .warehousing
                .add_constant(dc.fixed_cost_monthly * params.months_per_year);
            for flow in dc_to_market.iter().filter(|f| f.from_id == dc.id) {
                costs.warehousing.add_term(flow.var, dc.variable_cost_per_unit);
            }
        }
        for (_, var) in &unmet {
            costs.unmet_penalty.add_term(*var, params.unmet_penalty_per_unit);
        }
        program.set_objective(costs.objective());

        // Capacity / disabled plants
        for (plant, (_, var)) in network.plants().iter().zip(&production) {
            if constraints.is_disabled(&plant.id) {
                program.add_constraint(
                    format!("Disabled_{}", plant.id),
                    LinearExpr::term(*var, 1.0),
                    Relation::Eq,
                    0.0,
                );
            } else {
                program.add_constraint(
                    format!("Capacity_{}", plant.id),
                    LinearExpr::term(*var, 1.0),
                    Relation::Le,
                    plant.capacity_units,
                );
            }
        }

        // Plant balance: production == outbound
        for (plant_id, var) in &production {
            let mut expr = LinearExpr::term(*var, 1.0);
            for flow in plant_to_dc.iter().filter(|f| &f.from_id == plant_id) {
                expr.add_term(flow.var, -1.0);
            }
            program.add_constraint(format!("Plant_balance_{plant_id}"), expr, Relation::Eq, 0.0);
        }

        // DC balance: inbound == outbound
        for dc in network.distribution_centers() {
            let mut expr = LinearExpr::new();
            for flow in plant_to_dc.iter().filter(|f| f.to_id == dc.id) {
                expr.add_term(flow.var, 1.0);
            }
            for flow in dc_to_market.iter().filter(|f| f.from_id == dc.id) {
                expr.add_term(flow.var, -1.0);
            }
            if expr.is_constant() {
                continue;
            }
            program.add_constraint(format!("DC_balance_{}", dc.id), expr, Relation::Eq, 0.0);
        }

        // Demand: inbound + unmet == demand
        for (market, (_, unmet_var)) in network.markets().iter().zip(&unmet) {
            let mut expr = LinearExpr::term(*unmet_var, 1.0);
            for flow in dc_to_market.iter().filter(|f| f.to_id == market.id) {
                expr.add_term(flow.var, 1.0);
            }
            program.add_constraint(
                format!("Demand_{}", market.id),
                expr,
                Relation::Eq,
                market.annual_demand_units,
            );
        }

        if let Some(rate) = constraints.min_fill_rate() {
            let total_unmet: LinearExpr = unmet
                .iter()
                .map(|(_, var)| LinearExpr::term(*var, 1.0))
                .sum();
            program.add_constraint(
                "Min_fill_rate",
                total_unmet,
                Relation::Le,
                network.total_demand() * (1.0 - rate),
            );
        }

        debug!(
            variables = program.variables().len(),
            constraints = program.constraints().len(),
            disabled_plants = constraints.disabled_plants().len(),
            min_fill_rate = ?constraints.min_fill_rate(),
            "flow model built"
        );

        Ok(Self {
            program,
            production,
            plant_to_dc,
            dc_to_market,
            unmet,
            costs,
        })
    }

    pub fn program(&self) -> &LinearProgram {
        &self.program
    }

    pub fn production_vars(&self) -> &[(String, VarId)] {
        &self.production
    }

    pub fn plant_to_dc_vars(&self) -> &[FlowVar] {
        &self.plant_to_dc
    }

    pub fn dc_to_market_vars(&self) -> &[FlowVar] {
        &self.dc_to_market
    }

    pub fn unmet_vars(&self) -> &[(String, VarId)] {
        &self.unmet
    }

    pub fn costs(&self) -> &CostTerms {
        &self.costs
    }
}

fn flow_variables(
    program: &mut LinearProgram,
    network: &Network,
    tier: RouteTier,
    prefix: &str,
) -> Vec<FlowVar> {
    network
        .routes_in_tier(tier)
        .map(|route| {
            let bounds = match route.capacity_units {
                Some(capacity) => Bounds::between(0.0, capacity),
                None => Bounds::non_negative(),
            };
            let var = program.add_variable(
                format!("{prefix}_{}_to_{}", route.from_id, route.to_id),
                bounds,
            );
            FlowVar {
                from_id: route.from_id.clone(),
                to_id: route.to_id.clone(),
                var,
                cost_per_unit: route.cost_per_unit,
            }
        })
        .collect()
}
