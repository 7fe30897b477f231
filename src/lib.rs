pub mod analytics;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod optimizer;
pub mod telemetry;

pub use config::Config;
pub use engine::{EngineOptions, RunState, ScenarioEngine, ScenarioReport};
pub use error::{NetworkError, ScenarioFailure};
pub use optimizer::ScenarioId;
