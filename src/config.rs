use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::optimizer::{ModelParams, ScenarioSettings, DEFAULT_MATERIALITY_THRESHOLD};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub data: DataConfig,
    #[validate(nested)]
    pub solver: SolverConfig,
    #[validate(nested)]
    pub model: ModelConfig,
    #[validate(nested)]
    pub scenarios: ScenarioSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DataConfig {
    /// Directory holding the four input CSV tables
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SolverConfig {
    #[validate(range(min = 1))]
    pub time_limit_seconds: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_seconds: 30,
        }
    }
}

impl SolverConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_limit_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ModelConfig {
    #[validate(range(exclusive_min = 0.0))]
    pub unmet_penalty_per_unit: f64,
    #[validate(range(min = 1.0))]
    pub months_per_year: f64,
    #[validate(range(min = 0.0))]
    pub materiality_threshold: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let params = ModelParams::default();
        Self {
            unmet_penalty_per_unit: params.unmet_penalty_per_unit,
            months_per_year: params.months_per_year,
            materiality_threshold: DEFAULT_MATERIALITY_THRESHOLD,
        }
    }
}

impl ModelConfig {
    pub fn params(&self) -> ModelParams {
        ModelParams {
            unmet_penalty_per_unit: self.unmet_penalty_per_unit,
            months_per_year: self.months_per_year,
        }
    }
}

impl Config {
    /// Built-in defaults, then `config/default.toml`, then `extra` if given,
    /// then `NFO__`-prefixed environment variables.
    pub fn load(extra: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"));
        if let Some(path) = extra {
            figment = figment.merge(Toml::file(path));
        }
        Self::from_figment(figment.merge(Env::prefixed("NFO__").split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().context("failed to read configuration")?;
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}
