use std::path::PathBuf;
use std::sync::Arc;

use network_flow_optimizer::analytics::MAX_SCORE;
use network_flow_optimizer::data::load_network;
use network_flow_optimizer::domain::{DistributionCenter, Market, Network, Plant, Route, RouteTier, Solution, TransportMode};
use network_flow_optimizer::optimizer::GoodLpSolver;
use network_flow_optimizer::{Config, EngineOptions, ScenarioEngine, ScenarioId, ScenarioReport};

// Extraction drops flows of up to 0.1 units, and demo quantities are ~1e8
const ABS_TOL: f64 = 1.0;
const REL_TOL: f64 = 1e-7;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= ABS_TOL + REL_TOL * a.abs().max(b.abs())
}

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn demo_engine() -> ScenarioEngine {
    let network = load_network(&data_dir()).expect("demo data loads");
    ScenarioEngine::new(network, Arc::new(GoodLpSolver::new()), EngineOptions::default())
}

async fn run(engine: &ScenarioEngine, id: ScenarioId) -> ScenarioReport {
    engine
        .run(id)
        .await
        .unwrap_or_else(|e| panic!("{id} failed: {e}"))
}

fn assert_conserves_flow(solution: &Solution, network: &Network) {
    for plant in network.plants() {
        let produced = solution.production[&plant.id];
        let shipped = solution.plant_to_dc_flows.outbound(&plant.id);
        assert!(close(produced, shipped), "{}: plant {} produced {produced}, shipped {shipped}", solution.scenario, plant.id);
        assert!(produced >= 0.0);
        assert!(produced <= plant.capacity_units + ABS_TOL);
    }
    for dc in network.distribution_centers() {
        let inbound = solution.plant_to_dc_flows.inbound(&dc.id);
        let outbound = solution.dc_to_market_flows.outbound(&dc.id);
        assert!(close(inbound, outbound), "{}: dc {} in {inbound}, out {outbound}", solution.scenario, dc.id);
    }
    for market in network.markets() {
        let served = solution.dc_to_market_flows.inbound(&market.id) + solution.unmet_for(&market.id);
        assert!(
            close(served, market.annual_demand_units),
            "{}: market {} served {served}, demand {}",
            solution.scenario,
            market.id,
            market.annual_demand_units
        );
    }
    assert!(solution.plant_to_dc_flows.iter().all(|(_, _, q)| q > 0.0));
    assert!(solution.dc_to_market_flows.iter().all(|(_, _, q)| q > 0.0));
    assert!(solution.unmet_demand.values().all(|q| *q > 0.0));
}

#[test]
fn demo_dataset_loads() {
    let network = load_network(&data_dir()).unwrap();
    assert_eq!(network.plants().len(), 4);
    assert_eq!(network.distribution_centers().len(), 12);
    assert_eq!(network.markets().len(), 25);
    assert!(network.validate().is_ok());
    assert!(network.total_demand() > 1.0e9);
    assert!(network.total_capacity() > network.total_demand());
}

#[tokio::test]
async fn every_scenario_conserves_flow() {
    let engine = demo_engine();
    for report in engine.run_all().await {
        let report = report.unwrap();
        assert_conserves_flow(&report.solution, engine.network());
        assert!(close(report.solution.cost_breakdown.total(), report.solution.objective_value));
        assert!(report.analytics.resilience_score <= MAX_SCORE);
        assert!(report.analytics.weighted_lead_time_days >= 0.0);
        assert!(report.analytics.total_emissions_kg > 0.0);
    }
}

#[tokio::test]
async fn disruption_shuts_designated_plant() {
    let engine = demo_engine();
    let report = run(&engine, ScenarioId::Disruption).await;
    assert_eq!(report.solution.production["P1"], 0.0);
    assert!(report.solution.plant_to_dc_flows.outbound("P1") == 0.0);
}

#[tokio::test]
async fn cost_optimized_respects_fill_rate_floor() {
    let engine = demo_engine();
    let report = run(&engine, ScenarioId::CostOptimized).await;
    let allowed = engine.network().total_demand() * 0.10;
    assert!(report.solution.total_unmet() <= allowed + ABS_TOL);
    assert!(report.analytics.fill_rate >= 0.90 - 1e-6);
}

#[tokio::test]
async fn restriction_never_lowers_cost() {
    let engine = demo_engine();
    let baseline = run(&engine, ScenarioId::Baseline).await;
    let disruption = run(&engine, ScenarioId::Disruption).await;
    assert!(disruption.solution.objective_value + ABS_TOL >= baseline.solution.objective_value);

    let comparison = disruption.comparison.expect("baseline ran first");
    assert!(comparison.cost.value + ABS_TOL >= 0.0);
    assert!(comparison.fill_rate.percentage_points <= 1e-6);
}

#[tokio::test]
async fn reruns_are_deterministic() {
    let first = run(&demo_engine(), ScenarioId::Baseline).await.solution;
    let second = run(&demo_engine(), ScenarioId::Baseline).await.solution;

    assert!(close(first.objective_value, second.objective_value));
    let routes = |s: &Solution| -> Vec<(String, String)> {
        s.plant_to_dc_flows
            .iter()
            .chain(s.dc_to_market_flows.iter())
            .map(|(from, to, _)| (from.to_string(), to.to_string()))
            .collect()
    };
    assert_eq!(routes(&first), routes(&second));
    for (from, to, qty) in first.dc_to_market_flows.iter() {
        assert!(close(qty, second.dc_to_market_flows.get(from, to).unwrap_or(0.0)));
    }
}

#[tokio::test]
async fn engine_from_config() {
    let config = Config {
        data: network_flow_optimizer::config::DataConfig { dir: data_dir() },
        ..Config::default()
    };
    let engine = ScenarioEngine::from_config(&config).unwrap();
    let failure = engine.run_named("meteor_strike").await.unwrap_err();
    assert_eq!(failure.source.kind(), "UnknownScenario");
}

fn plant(id: &str, capacity: f64) -> Plant {
    Plant {
        id: id.to_string(),
        capacity_units: capacity,
        unit_cost: 0.5,
    }
}

fn route(from: &str, to: &str, tier: RouteTier, cost: f64) -> Route {
    Route {
        from_id: from.to_string(),
        to_id: to.to_string(),
        tier,
        distance_km: 500.0,
        mode: TransportMode::Rail,
        cost_per_unit: cost,
        lead_time_days: 2.0,
        emissions_per_unit: 0.03,
        capacity_units: None,
    }
}

#[tokio::test]
async fn fill_rate_floor_binds_when_serving_is_unprofitable() {
    // Shipping costs more than the unmet penalty, so only the floor forces service
    let network = Network::new(
        vec![plant("P1", 600.0), plant("P2", 400.0)],
        vec![DistributionCenter {
            id: "DC1".to_string(),
            storage_capacity_units: 1000.0,
            fixed_cost_monthly: 0.0,
            variable_cost_per_unit: 0.0,
        }],
        vec![
            Market {
                id: "M1".to_string(),
                annual_demand_units: 700.0,
                revenue_per_unit: 2.0,
            },
            Market {
                id: "M2".to_string(),
                annual_demand_units: 300.0,
                revenue_per_unit: 2.0,
            },
        ],
        vec![
            route("P1", "DC1", RouteTier::PlantToDc, 3.0),
            route("P2", "DC1", RouteTier::PlantToDc, 3.0),
            route("DC1", "M1", RouteTier::DcToMarket, 3.0),
            route("DC1", "M2", RouteTier::DcToMarket, 3.0),
        ],
    );
    let engine = ScenarioEngine::new(network, Arc::new(GoodLpSolver::new()), EngineOptions::default());

    let baseline = run(&engine, ScenarioId::Baseline).await;
    assert!(close(baseline.solution.total_unmet(), 1000.0));

    let floored = run(&engine, ScenarioId::CostOptimized).await;
    assert!(floored.solution.total_unmet() <= 100.0 + 1e-6);
    assert!(close(floored.solution.total_unmet(), 100.0));
    assert_conserves_flow(&floored.solution, engine.network());
}
