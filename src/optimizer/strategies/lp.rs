//! LP solver backed by `good_lp`
//!
//! Uses the pure-Rust minilp simplex backend, so no native solver library
//! is needed at build time. The assembled program is continuous (no integer
//! variables), which is all the flow model requires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use good_lp::solvers::minilp::minilp;
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};
use tracing::{debug, warn};

use crate::error::NetworkError;
use crate::optimizer::{Assignment, LinearExpr, LinearProgram, LpSolver, Relation, SolverOutcome};

/// `good_lp` + minilp implementation of [`LpSolver`]
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver;

impl GoodLpSolver {
    pub fn new() -> Self {
        Self
    }

    fn solve_blocking(program: &LinearProgram) -> Result<SolverOutcome, NetworkError> {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = program
            .variables()
            .iter()
            .map(|def| {
                let mut definition = variable().name(def.name.clone()).min(def.bounds.lower);
                if let Some(upper) = def.bounds.upper {
                    definition = definition.max(upper);
                }
                vars.add(definition)
            })
            .collect();

        // The objective's constant part is added back when evaluating below
        let objective = to_expression(program.objective(), &handles);
        let mut model = vars.minimise(objective).using(minilp);

        for row in program.constraints() {
            let lhs = to_expression(&row.expr, &handles);
            let rhs = row.normalized_rhs();
            let c = match row.relation {
                Relation::Eq => constraint::eq(lhs, rhs),
                Relation::Le => constraint::leq(lhs, rhs),
                Relation::Ge => constraint::geq(lhs, rhs),
            };
            model = model.with(c);
        }

        match model.solve() {
            Ok(solution) => {
                let raw = handles.iter().map(|handle| solution.value(*handle)).collect();
                Ok(certify(program, raw))
            }
            Err(ResolutionError::Infeasible) => Ok(SolverOutcome::Infeasible),
            Err(ResolutionError::Unbounded) => Ok(SolverOutcome::Unbounded),
            Err(other) => Err(NetworkError::Solver(other.to_string())),
        }
    }
}

/// Turn raw backend values into an outcome. A non-finite value or objective
/// means the backend walked off along an unbounded ray, which some minilp
/// releases return as a solution. Finite values are snapped back inside
/// their bounds.
fn certify(program: &LinearProgram, raw: Vec<f64>) -> SolverOutcome {
    // checked before clamping: NaN.max(lower) is lower
    if raw.iter().any(|v| !v.is_finite()) {
        return SolverOutcome::Unbounded;
    }
    let values: Vec<f64> = raw
        .into_iter()
        .zip(program.variables())
        .map(|(value, def)| def.bounds.clamp(value))
        .collect();
    let assignment = Assignment::new(values);
    let objective_value = program.objective().eval(&assignment);
    if !objective_value.is_finite() {
        return SolverOutcome::Unbounded;
    }
    SolverOutcome::Optimal {
        objective_value,
        assignment,
    }
}

fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    expr.terms()
        .iter()
        .map(|(var, coef)| handles[var.index()] * *coef)
        .sum()
}

#[async_trait]
impl LpSolver for GoodLpSolver {
    fn name(&self) -> &'static str {
        "good_lp/minilp"
    }

    async fn solve(
        &self,
        program: Arc<LinearProgram>,
        time_budget: Duration,
    ) -> Result<SolverOutcome, NetworkError> {
        let started = Instant::now();
        let variables = program.variables().len();
        let constraints = program.constraints().len();
        let name = program.name().to_string();

        // minilp cannot be interrupted: on timeout the blocking task runs to
        // completion in the background and its result is discarded.
        let task = tokio::task::spawn_blocking(move || Self::solve_blocking(&program));

        match tokio::time::timeout(time_budget, task).await {
            Ok(Ok(outcome)) => {
                let outcome = outcome?;
                debug!(
                    solver = self.name(),
                    program = %name,
                    variables,
                    constraints,
                    status = outcome.status(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "LP solved"
                );
                Ok(outcome)
            }
            Ok(Err(join_error)) => Err(NetworkError::Solver(format!(
                "solver task failed: {join_error}"
            ))),
            Err(_) => {
                warn!(
                    solver = self.name(),
                    program = %name,
                    variables,
                    constraints,
                    budget_secs = time_budget.as_secs_f64(),
                    "LP solve exceeded time budget"
                );
                Ok(SolverOutcome::TimeLimitReached)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::*;
    use crate::domain::{Network, RouteTier};
    use crate::optimizer::{Bounds, FlowModel, ModelParams, ScenarioConstraints};

    const BUDGET: Duration = Duration::from_secs(30);

    async fn solve_model(model: &FlowModel) -> (f64, Assignment) {
        let outcome = GoodLpSolver::new()
            .solve(Arc::new(model.program().clone()), BUDGET)
            .await
            .unwrap();
        outcome.into_optimal(BUDGET).unwrap()
    }

    #[tokio::test]
    async fn test_two_plants_cover_demand() {
        let network = two_plant_network();
        let model =
            FlowModel::build(&network, &ScenarioConstraints::unconstrained(), &ModelParams::default())
                .unwrap();

        let (objective, assignment) = solve_model(&model).await;
        assert!((objective - 120.0).abs() < 1e-6, "objective {objective}");

        let (_, unmet) = model.unmet_vars()[0];
        assert!(assignment.value(unmet).abs() < 1e-6);

        let produced: f64 = model
            .production_vars()
            .iter()
            .map(|(_, v)| assignment.value(*v))
            .sum();
        assert!((produced - 120.0).abs() < 1e-6);
        assert!(assignment.value(model.production_vars()[0].1) <= 100.0);
        assert!(assignment.value(model.production_vars()[1].1) <= 50.0);
    }

    #[tokio::test]
    async fn test_capacity_shortfall_goes_unmet() {
        let network = Network::new(
            vec![plant("P1", 50.0, 1.0)],
            vec![dc("DC1", 0.0, 0.0)],
            vec![market("M1", 120.0)],
            vec![
                route("P1", "DC1", RouteTier::PlantToDc, 0.0),
                route("DC1", "M1", RouteTier::DcToMarket, 0.0),
            ],
        );
        let model =
            FlowModel::build(&network, &ScenarioConstraints::unconstrained(), &ModelParams::default())
                .unwrap();

        let (objective, assignment) = solve_model(&model).await;
        assert!((assignment.value(model.production_vars()[0].1) - 50.0).abs() < 1e-6);
        assert!((assignment.value(model.unmet_vars()[0].1) - 70.0).abs() < 1e-6);
        assert!((objective - (50.0 * 1.0 + 70.0 * 5.0)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_fill_rate_floor_respected() {
        let network = Network::new(
            vec![plant("P1", 600.0, 0.5), plant("P2", 400.0, 0.7)],
            vec![dc("DC1", 100.0, 0.1)],
            vec![market("M1", 700.0), market("M2", 300.0)],
            vec![
                route("P1", "DC1", RouteTier::PlantToDc, 0.2),
                route("P2", "DC1", RouteTier::PlantToDc, 0.3),
                route("DC1", "M1", RouteTier::DcToMarket, 0.1),
                route("DC1", "M2", RouteTier::DcToMarket, 0.4),
            ],
        );
        let constraints = ScenarioConstraints::new(Vec::<String>::new(), Some(0.90)).unwrap();
        let model = FlowModel::build(&network, &constraints, &ModelParams::default()).unwrap();

        let (_, assignment) = solve_model(&model).await;
        let unmet: f64 = model.unmet_vars().iter().map(|(_, v)| assignment.value(*v)).sum();
        assert!(unmet <= 100.0 + 1e-6, "unmet {unmet}");
        for row in model.program().constraints() {
            assert!(row.is_satisfied(&assignment, 1e-6), "violated {}", row.name);
        }
    }

    #[tokio::test]
    async fn test_disabled_plant_produces_exactly_zero() {
        let network = two_plant_network();
        let constraints = ScenarioConstraints::new(["P1"], None).unwrap();
        let model = FlowModel::build(&network, &constraints, &ModelParams::default()).unwrap();

        let (objective, assignment) = solve_model(&model).await;
        assert_eq!(assignment.value(model.production_vars()[0].1), 0.0);
        // P2 covers 50, remaining 70 unmet at 5.0
        assert!((objective - (50.0 + 70.0 * 5.0)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_infeasible_program() {
        let mut program = LinearProgram::new("infeasible");
        let x = program.add_variable("x", Bounds::between(0.0, 1.0));
        program.set_objective(LinearExpr::term(x, 1.0));
        program.add_constraint("x_ge_2", LinearExpr::term(x, 1.0), Relation::Ge, 2.0);

        let outcome = GoodLpSolver::new()
            .solve(Arc::new(program), BUDGET)
            .await
            .unwrap();
        assert_eq!(outcome, SolverOutcome::Infeasible);
    }

    #[tokio::test]
    async fn test_unbounded_program() {
        let mut program = LinearProgram::new("unbounded");
        let x = program.add_variable("x", Bounds::non_negative());
        let y = program.add_variable("y", Bounds::non_negative());
        program.set_objective(LinearExpr::term(x, -1.0));
        let mut row = LinearExpr::term(x, 1.0);
        row.add_term(y, -1.0);
        program.add_constraint("x_le_y", row, Relation::Le, 0.0);

        let outcome = GoodLpSolver::new()
            .solve(Arc::new(program), BUDGET)
            .await
            .unwrap();
        assert_eq!(outcome, SolverOutcome::Unbounded);
    }

    #[test]
    fn test_non_finite_values_are_unbounded() {
        let mut program = LinearProgram::new("ray");
        let x = program.add_variable("x", Bounds::non_negative());
        let y = program.add_variable("y", Bounds::non_negative());
        program.set_objective(LinearExpr::term(x, -1.0));

        assert_eq!(certify(&program, vec![f64::INFINITY, f64::INFINITY]), SolverOutcome::Unbounded);
        assert_eq!(certify(&program, vec![f64::NAN, 0.0]), SolverOutcome::Unbounded);
        assert_eq!(certify(&program, vec![1.0, f64::NEG_INFINITY]), SolverOutcome::Unbounded);

        let outcome = certify(&program, vec![2.0, -1e-12]);
        let (objective, assignment) = outcome.into_optimal(BUDGET).unwrap();
        assert_eq!(objective, -2.0);
        assert_eq!(assignment.value(y), 0.0);
        assert_eq!(assignment.value(x), 2.0);
    }

    #[tokio::test]
    async fn test_objective_includes_constant_term() {
        let mut program = LinearProgram::new("constant");
        let x = program.add_variable("x", Bounds::between(0.0, 10.0));
        let mut objective = LinearExpr::term(x, 2.0);
        objective.add_constant(100.0);
        program.set_objective(objective);
        program.add_constraint("x_ge_3", LinearExpr::term(x, 1.0), Relation::Ge, 3.0);

        let outcome = GoodLpSolver::new()
            .solve(Arc::new(program), BUDGET)
            .await
            .unwrap();
        let (objective, assignment) = outcome.into_optimal(BUDGET).unwrap();
        assert!((assignment.value(x) - 3.0).abs() < 1e-9);
        assert!((objective - 106.0).abs() < 1e-9);
    }
}
