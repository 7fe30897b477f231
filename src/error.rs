use std::time::Duration;

use thiserror::Error;

/// Failure kinds raised while loading, modelling or solving a network.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Unknown scenario: {0} (expected baseline, cost_optimized or disruption)")]
    UnknownScenario(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Invalid scenario constraints: {0}")]
    InvalidConstraints(String),

    #[error("Solver reported the program infeasible")]
    SolverInfeasible,

    #[error("Solver reported the program unbounded")]
    SolverUnbounded,

    #[error("Solver found no certified optimum within {0:?}")]
    SolverTimeLimitReached(Duration),

    #[error("Solver backend failure: {0}")]
    Solver(String),

    #[error("Failed to load {table} table: {message}")]
    DataLoad { table: &'static str, message: String },
}

impl NetworkError {
    /// Short machine-readable tag for the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            NetworkError::UnknownScenario(_) => "UnknownScenario",
            NetworkError::DataIntegrity(_) => "DataIntegrityError",
            NetworkError::InvalidConstraints(_) => "InvalidConstraints",
            NetworkError::SolverInfeasible => "SolverInfeasible",
            NetworkError::SolverUnbounded => "SolverUnbounded",
            NetworkError::SolverTimeLimitReached(_) => "SolverTimeLimitReached",
            NetworkError::Solver(_) => "SolverError",
            NetworkError::DataLoad { .. } => "DataLoadError",
        }
    }
}

/// A failed scenario run, tagged with the scenario it was requested for.
#[derive(Debug, Error)]
#[error("scenario `{scenario}` failed ({}): {source}", .source.kind())]
pub struct ScenarioFailure {
    pub scenario: String,
    #[source]
    pub source: NetworkError,
}

impl ScenarioFailure {
    pub fn new(scenario: impl Into<String>, source: NetworkError) -> Self {
        Self {
            scenario: scenario.into(),
            source,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }
}
