use std::collections::BTreeMap;

use super::{Assignment, FlowModel, FlowVar, ScenarioId};
use crate::domain::{FlowMap, Solution, SolverStatus};

/// Flows at or below this many units are dropped from a solution
pub const DEFAULT_MATERIALITY_THRESHOLD: f64 = 0.1;

/// Turns a solver assignment into a domain [`Solution`]
#[derive(Debug, Clone, Copy)]
pub struct SolutionExtractor {
    materiality_threshold: f64,
}

impl Default for SolutionExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MATERIALITY_THRESHOLD)
    }
}

impl SolutionExtractor {
    pub fn new(materiality_threshold: f64) -> Self {
        Self {
            materiality_threshold,
        }
    }

    /// Production is reported for every plant. Flows and unmet demand keep
    /// only entries strictly above the materiality threshold. The cost
    /// breakdown is evaluated from the objective's own component expressions.
    pub fn extract(
        &self,
        scenario: ScenarioId,
        model: &FlowModel,
        objective_value: f64,
        assignment: &Assignment,
    ) -> Solution {
        let production = model
            .production_vars()
            .iter()
            .map(|(plant_id, var)| (plant_id.clone(), assignment.value(*var).max(0.0)))
            .collect();

        let unmet_demand = model
            .unmet_vars()
            .iter()
            .filter_map(|(market_id, var)| {
                let units = assignment.value(*var);
                (units > self.materiality_threshold).then(|| (market_id.clone(), units))
            })
            .collect::<BTreeMap<_, _>>();

        Solution {
            scenario: scenario.to_string(),
            status: SolverStatus::Optimal,
            objective_value,
            production,
            plant_to_dc_flows: self.material_flows(model.plant_to_dc_vars(), assignment),
            dc_to_market_flows: self.material_flows(model.dc_to_market_vars(), assignment),
            unmet_demand,
            cost_breakdown: model.costs().evaluate(assignment),
        }
    }

    fn material_flows(&self, vars: &[FlowVar], assignment: &Assignment) -> FlowMap {
        let mut flows = FlowMap::new();
        for flow in vars {
            let units = assignment.value(flow.var);
            if units > self.materiality_threshold {
                flows.insert(&flow.from_id, &flow.to_id, units);
            }
        }
        flows
    }
}
