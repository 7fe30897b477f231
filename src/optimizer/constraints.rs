use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use validator::Validate;

use crate::error::NetworkError;

/// The closed set of scenarios the engine knows how to run
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScenarioId {
    /// Current network, no overrides
    Baseline,
    /// Cost minimisation under a minimum fill-rate floor
    CostOptimized,
    /// Designated plant offline
    Disruption,
}

impl ScenarioId {
    pub fn parse(raw: &str) -> Result<Self, NetworkError> {
        Self::from_str(raw.trim()).map_err(|_| NetworkError::UnknownScenario(raw.to_string()))
    }

    /// All scenarios, baseline first
    pub fn all() -> impl Iterator<Item = ScenarioId> {
        Self::iter()
    }

    pub fn is_baseline(self) -> bool {
        self == ScenarioId::Baseline
    }
}

/// Tunables for the scenario overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ScenarioSettings {
    /// Plant taken offline by the disruption scenario
    #[validate(length(min = 1))]
    pub disrupted_plant: String,
    /// Fill-rate floor applied by the cost-optimized scenario
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub cost_optimized_min_fill_rate: f64,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            disrupted_plant: "P1".to_string(),
            cost_optimized_min_fill_rate: 0.90,
        }
    }
}

/// Model overrides for a single scenario run. Never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConstraints {
    disabled_plants: BTreeSet<String>,
    min_fill_rate: Option<f64>,
}

impl ScenarioConstraints {
    pub fn new<I, S>(disabled_plants: I, min_fill_rate: Option<f64>) -> Result<Self, NetworkError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(rate) = min_fill_rate {
            if !rate.is_finite() || rate <= 0.0 || rate > 1.0 {
                return Err(NetworkError::InvalidConstraints(format!(
                    "min_fill_rate must be in (0, 1], got {rate}"
                )));
            }
        }

        Ok(Self {
            disabled_plants: disabled_plants.into_iter().map(Into::into).collect(),
            min_fill_rate,
        })
    }

    /// No disabled plants, no fill-rate floor
    pub fn unconstrained() -> Self {
        Self::default()
    }

    /// Map a scenario to its overrides. Pure: no side effects, no I/O.
    pub fn for_scenario(id: ScenarioId, settings: &ScenarioSettings) -> Result<Self, NetworkError> {
        match id {
            ScenarioId::Baseline => Ok(Self::unconstrained()),
            ScenarioId::CostOptimized => {
                Self::new(Vec::<String>::new(), Some(settings.cost_optimized_min_fill_rate))
            }
            ScenarioId::Disruption => Self::new([settings.disrupted_plant.as_str()], None),
        }
    }

    /// Resolve a raw scenario identifier, failing with `UnknownScenario`
    pub fn for_scenario_name(raw: &str, settings: &ScenarioSettings) -> Result<Self, NetworkError> {
        Self::for_scenario(ScenarioId::parse(raw)?, settings)
    }

    pub fn disabled_plants(&self) -> &BTreeSet<String> {
        &self.disabled_plants
    }

    pub fn is_disabled(&self, plant_id: &str) -> bool {
        self.disabled_plants.contains(plant_id)
    }

    pub fn min_fill_rate(&self) -> Option<f64> {
        self.min_fill_rate
    }
}
