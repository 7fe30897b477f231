//! Scenario Orchestrator
//!
//! Runs scenarios through build -> solve -> extract -> analyze and memoizes
//! the solution per scenario. Each key is computed once under its own lock;
//! afterwards the cache is read without waiting on any solve.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::analytics::{Comparison, SolutionAnalytics};
use crate::config::Config;
use crate::data::load_network;
use crate::domain::{Network, Solution};
use crate::error::{NetworkError, ScenarioFailure};
use crate::optimizer::{
    FlowModel, GoodLpSolver, LpSolver, ModelParams, ScenarioConstraints, ScenarioId, ScenarioSettings,
    SolutionExtractor,
};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub scenarios: ScenarioSettings,
    pub model: ModelParams,
    pub materiality_threshold: f64,
    pub time_budget: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        let config = Config::default();
        Self::from(&config)
    }
}

impl From<&Config> for EngineOptions {
    fn from(config: &Config) -> Self {
        Self {
            scenarios: config.scenarios.clone(),
            model: config.model.params(),
            materiality_threshold: config.model.materiality_threshold,
            time_budget: config.solver.time_budget(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum RunState {
    Idle,
    Running,
    Cached,
}

/// Everything produced by one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub scenario: ScenarioId,
    pub solution: Solution,
    pub analytics: SolutionAnalytics,
    /// Present for non-baseline scenarios once a baseline has been run
    pub comparison: Option<Comparison>,
}

pub struct ScenarioEngine {
    network: Arc<Network>,
    solver: Arc<dyn LpSolver>,
    options: EngineOptions,
    extractor: SolutionExtractor,
    cache: RwLock<HashMap<ScenarioId, Arc<Solution>>>,
    key_locks: Mutex<HashMap<ScenarioId, Arc<tokio::sync::Mutex<()>>>>,
    baseline: RwLock<Option<Arc<Solution>>>,
}

impl ScenarioEngine {
    pub fn new(network: Network, solver: Arc<dyn LpSolver>, options: EngineOptions) -> Self {
        Self {
            network: Arc::new(network),
            solver,
            extractor: SolutionExtractor::new(options.materiality_threshold),
            options,
            cache: RwLock::new(HashMap::new()),
            key_locks: Mutex::new(HashMap::new()),
            baseline: RwLock::new(None),
        }
    }

    /// Load the network tables named by `config` and solve with `good_lp`
    pub fn from_config(config: &Config) -> Result<Self, NetworkError> {
        let network = load_network(&config.data.dir)?;
        network.validate()?;
        Ok(Self::new(
            network,
            Arc::new(GoodLpSolver::new()),
            EngineOptions::from(config),
        ))
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn state(&self, id: ScenarioId) -> RunState {
        if self.cache.read().contains_key(&id) {
            return RunState::Cached;
        }
        let lock = self.key_locks.lock().get(&id).cloned();
        match lock {
            Some(lock) if lock.try_lock().is_err() => RunState::Running,
            _ => RunState::Idle,
        }
    }

    /// Cached solution, if the scenario has completed successfully
    pub fn cached(&self, id: ScenarioId) -> Option<Arc<Solution>> {
        self.cache.read().get(&id).cloned()
    }

    pub fn baseline(&self) -> Option<Arc<Solution>> {
        self.baseline.read().clone()
    }

    /// Drop every cached solution and the retained baseline
    pub fn reset(&self) {
        self.cache.write().clear();
        *self.baseline.write() = None;
        info!("scenario cache cleared");
    }

    pub async fn run_named(&self, raw: &str) -> Result<ScenarioReport, ScenarioFailure> {
        let id = ScenarioId::parse(raw).map_err(|e| ScenarioFailure::new(raw.trim(), e))?;
        self.run(id).await
    }

    /// Run every scenario, baseline first so the others carry a comparison
    pub async fn run_all(&self) -> Vec<Result<ScenarioReport, ScenarioFailure>> {
        let mut reports = Vec::new();
        for id in ScenarioId::all() {
            reports.push(self.run(id).await);
        }
        reports
    }

    pub async fn run(&self, id: ScenarioId) -> Result<ScenarioReport, ScenarioFailure> {
        let solution = self.solution(id).await?;
        let analytics = SolutionAnalytics::compute(&solution, &self.network);
        let comparison = if id.is_baseline() {
            None
        } else {
            self.compare_to_baseline(&analytics)
        };

        Ok(ScenarioReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            scenario: id,
            solution: Solution::clone(&solution),
            analytics,
            comparison,
        })
    }

    /// Deltas against the retained baseline, `None` until a baseline has run
    pub fn compare_to_baseline(&self, analytics: &SolutionAnalytics) -> Option<Comparison> {
        let baseline = self.baseline()?;
        let baseline_analytics = SolutionAnalytics::compute(&baseline, &self.network);
        Some(Comparison::between(
            baseline.scenario.clone(),
            &baseline_analytics,
            analytics,
        ))
    }

    /// Solve `id` once; concurrent callers for the same key wait for the first
    pub async fn solution(&self, id: ScenarioId) -> Result<Arc<Solution>, ScenarioFailure> {
        if let Some(hit) = self.cached(id) {
            debug!(scenario = %id, "scenario cache hit");
            return Ok(hit);
        }

        let key_lock = self.key_locks.lock().entry(id).or_default().clone();
        let _guard = key_lock.lock().await;

        if let Some(hit) = self.cached(id) {
            debug!(scenario = %id, "scenario solved by concurrent caller");
            return Ok(hit);
        }

        let solution = match self.solve(id).await {
            Ok(solution) => Arc::new(solution),
            Err(source) => {
                error!(scenario = %id, kind = source.kind(), error = %source, "scenario run failed");
                return Err(ScenarioFailure::new(id.to_string(), source));
            }
        };

        self.cache.write().insert(id, Arc::clone(&solution));
        if id.is_baseline() {
            *self.baseline.write() = Some(Arc::clone(&solution));
        }
        Ok(solution)
    }

    async fn solve(&self, id: ScenarioId) -> Result<Solution, NetworkError> {
        let started = Instant::now();
        let constraints = ScenarioConstraints::for_scenario(id, &self.options.scenarios)?;
        let model = FlowModel::build(&self.network, &constraints, &self.options.model)?;

        let budget = self.options.time_budget;
        let outcome = self
            .solver
            .solve(Arc::new(model.program().clone()), budget)
            .await?;
        let (objective_value, assignment) = outcome.into_optimal(budget)?;
        let solution = self
            .extractor
            .extract(id, &model, objective_value, &assignment);

        info!(
            scenario = %id,
            solver = self.solver.name(),
            objective = solution.objective_value,
            unmet = solution.total_unmet(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scenario solved"
        );
        Ok(solution)
    }
}
