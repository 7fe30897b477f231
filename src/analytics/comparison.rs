use serde::{Deserialize, Serialize};
use strum::Display;

use super::SolutionAnalytics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CostDirection {
    Savings,
    Increase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FillRateDirection {
    Improvement,
    Degradation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResilienceDirection {
    Stronger,
    Weaker,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostDelta {
    /// Scenario cost minus baseline cost (EUR)
    pub value: f64,
    /// `(scenario / baseline - 1) * 100`; 0 when the baseline cost is 0
    pub percent: f64,
    pub direction: CostDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillRateDelta {
    pub percentage_points: f64,
    pub direction: FillRateDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResilienceDelta {
    pub points: i16,
    pub direction: ResilienceDirection,
}

/// Deltas of a scenario against the retained baseline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub baseline_scenario: String,
    pub cost: CostDelta,
    pub fill_rate: FillRateDelta,
    pub resilience: ResilienceDelta,
}

impl Comparison {
    /// Ties are tagged `increase`, `degradation` and `weaker`.
    pub fn between(
        baseline_scenario: impl Into<String>,
        baseline: &SolutionAnalytics,
        scenario: &SolutionAnalytics,
    ) -> Self {
        let value = scenario.total_cost - baseline.total_cost;
        let percent = if baseline.total_cost != 0.0 {
            (scenario.total_cost / baseline.total_cost - 1.0) * 100.0
        } else {
            0.0
        };
        let cost = CostDelta {
            value,
            percent,
            direction: if value < 0.0 {
                CostDirection::Savings
            } else {
                CostDirection::Increase
            },
        };

        let percentage_points = scenario.fill_rate_percent() - baseline.fill_rate_percent();
        let fill_rate = FillRateDelta {
            percentage_points,
            direction: if percentage_points > 0.0 {
                FillRateDirection::Improvement
            } else {
                FillRateDirection::Degradation
            },
        };

        let points = i16::from(scenario.resilience_score) - i16::from(baseline.resilience_score);
        let resilience = ResilienceDelta {
            points,
            direction: if points > 0 {
                ResilienceDirection::Stronger
            } else {
                ResilienceDirection::Weaker
            },
        };

        Self {
            baseline_scenario: baseline_scenario.into(),
            cost,
            fill_rate,
            resilience,
        }
    }
}
