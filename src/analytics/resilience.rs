//! Rule-based resilience score
//!
//! Starts at 100 and applies three independent deductions. Within a
//! category only the harshest matching rule applies.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::domain::{Network, Solution};

pub const MAX_SCORE: u8 = 100;

/// Distribution centers that must carry outbound flow to avoid the coverage deduction
pub const MIN_ACTIVE_DCS: usize = 8;

/// Inputs the score is derived from, extracted from a solved network
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResilienceInputs {
    /// Largest single-plant share of total production, `None` when nothing is produced
    pub max_plant_share: Option<f64>,
    pub active_distribution_centers: usize,
    /// Unmet demand over total demand, `None` when the network has no demand
    pub unmet_ratio: Option<f64>,
}

impl ResilienceInputs {
    pub fn from_solution(solution: &Solution, network: &Network) -> Self {
        let total_production = solution.total_production();
        let max_plant_share = (total_production > 0.0).then(|| {
            solution
                .production
                .values()
                .fold(0.0_f64, |max, units| max.max(units / total_production))
        });

        let total_demand = network.total_demand();
        let unmet_ratio = (total_demand > 0.0).then(|| solution.total_unmet() / total_demand);

        Self {
            max_plant_share,
            active_distribution_centers: active_distribution_centers(solution),
            unmet_ratio,
        }
    }

    pub fn score(&self) -> u8 {
        let mut score = i32::from(MAX_SCORE);

        match self.max_plant_share {
            Some(share) if share > 0.40 => score -= 20,
            Some(share) if share > 0.35 => score -= 10,
            _ => {}
        }

        if self.active_distribution_centers < MIN_ACTIVE_DCS {
            score -= 15;
        }

        match self.unmet_ratio {
            Some(ratio) if ratio > 0.10 => score -= 20,
            Some(ratio) if ratio > 0.05 => score -= 10,
            _ => {}
        }

        // clamp keeps the conversion infallible
        u8::try_from(score.clamp(0, i32::from(MAX_SCORE))).unwrap_or(0)
    }
}

/// Distinct DCs with non-zero outbound DC -> market flow. A DC serving
/// several markets counts once; this is not the number of flow entries.
pub fn active_distribution_centers(solution: &Solution) -> usize {
    solution
        .dc_to_market_flows
        .iter()
        .filter(|(_, _, units)| *units > 0.0)
        .map(|(dc_id, _, _)| dc_id)
        .unique()
        .count()
}

pub fn resilience_score(solution: &Solution, network: &Network) -> u8 {
    ResilienceInputs::from_solution(solution, network).score()
}
