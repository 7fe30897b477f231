use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{Assignment, LinearProgram};
use crate::error::NetworkError;

/// Normalized result of a solve attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SolverOutcome {
    Optimal {
        objective_value: f64,
        assignment: Assignment,
    },
    Infeasible,
    Unbounded,
    /// Budget elapsed before optimality was certified
    TimeLimitReached,
}

impl SolverOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            SolverOutcome::Optimal { .. } => "Optimal",
            SolverOutcome::Infeasible => "Infeasible",
            SolverOutcome::Unbounded => "Unbounded",
            SolverOutcome::TimeLimitReached => "TimeLimitReached",
        }
    }

    /// Accept only a certified optimum; every other status is fatal for the run.
    pub fn into_optimal(self, time_budget: Duration) -> Result<(f64, Assignment), NetworkError> {
        match self {
            SolverOutcome::Optimal {
                objective_value,
                assignment,
            } => Ok((objective_value, assignment)),
            SolverOutcome::Infeasible => Err(NetworkError::SolverInfeasible),
            SolverOutcome::Unbounded => Err(NetworkError::SolverUnbounded),
            SolverOutcome::TimeLimitReached => Err(NetworkError::SolverTimeLimitReached(time_budget)),
        }
    }
}

/// Injected LP solving capability.
///
/// Implementations must minimise `program.objective()` subject to the
/// variable bounds and constraints, and give up with
/// [`SolverOutcome::TimeLimitReached`] once `time_budget` has elapsed.
/// `Err` is reserved for backend failures that are not a solve status.
#[async_trait]
pub trait LpSolver: Send + Sync {
    fn name(&self) -> &'static str;

    async fn solve(
        &self,
        program: Arc<LinearProgram>,
        time_budget: Duration,
    ) -> Result<SolverOutcome, NetworkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_optimal_outcomes_are_errors() {
        let budget = Duration::from_secs(30);
        assert!(matches!(
            SolverOutcome::Infeasible.into_optimal(budget),
            Err(NetworkError::SolverInfeasible)
        ));
        assert!(matches!(
            SolverOutcome::Unbounded.into_optimal(budget),
            Err(NetworkError::SolverUnbounded)
        ));
        assert!(matches!(
            SolverOutcome::TimeLimitReached.into_optimal(budget),
            Err(NetworkError::SolverTimeLimitReached(d)) if d == budget
        ));

        let optimal = SolverOutcome::Optimal {
            objective_value: 3.0,
            assignment: Assignment::new(vec![1.0]),
        };
        assert_eq!(optimal.status(), "Optimal");
        let (objective, assignment) = optimal.into_optimal(budget).unwrap();
        assert_eq!(objective, 3.0);
        assert_eq!(assignment.len(), 1);
    }
}
