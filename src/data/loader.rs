//! CSV loading of the four network tables
//!
//! Quantities in the files are expressed in millions of units and are
//! converted to units here, so everything downstream works in units.

use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use crate::domain::{DistributionCenter, Market, Network, Plant, Route, RouteTier, TransportMode};
use crate::error::NetworkError;

pub const PLANTS_FILE: &str = "plants.csv";
pub const DISTRIBUTION_CENTERS_FILE: &str = "distribution_centers.csv";
pub const MARKETS_FILE: &str = "markets.csv";
pub const ROUTES_FILE: &str = "transportation.csv";

const UNITS_PER_MILLION: f64 = 1.0e6;

#[derive(Debug, Deserialize)]
struct PlantRecord {
    plant_id: String,
    capacity_annual_millions: f64,
    cost_per_unit_eur: f64,
}

#[derive(Debug, Deserialize)]
struct DistributionCenterRecord {
    dc_id: String,
    storage_capacity_millions: f64,
    fixed_cost_monthly_eur: f64,
    variable_cost_per_unit_eur: f64,
}

#[derive(Debug, Deserialize)]
struct MarketRecord {
    market_id: String,
    annual_demand_millions: f64,
    revenue_per_unit_eur: f64,
}

#[derive(Debug, Deserialize)]
struct RouteRecord {
    from_id: String,
    to_id: String,
    from_type: String,
    to_type: String,
    distance_km: f64,
    transport_mode: String,
    cost_per_unit_eur: f64,
    lead_time_days: f64,
    co2_per_unit_kg: f64,
    #[serde(default)]
    capacity_constraint: Option<String>,
}

/// Load `plants.csv`, `distribution_centers.csv`, `markets.csv` and
/// `transportation.csv` from `dir`.
///
/// Referential integrity is not checked here; the model builder validates
/// the network before any solve.
pub fn load_network(dir: &Path) -> Result<Network, NetworkError> {
    let plants = read_table::<PlantRecord>(&dir.join(PLANTS_FILE), "plants")?
        .into_iter()
        .map(|r| Plant {
            id: r.plant_id,
            capacity_units: r.capacity_annual_millions * UNITS_PER_MILLION,
            unit_cost: r.cost_per_unit_eur,
        })
        .collect::<Vec<_>>();

    let dcs = read_table::<DistributionCenterRecord>(
        &dir.join(DISTRIBUTION_CENTERS_FILE),
        "distribution_centers",
    )?
    .into_iter()
    .map(|r| DistributionCenter {
        id: r.dc_id,
        storage_capacity_units: r.storage_capacity_millions * UNITS_PER_MILLION,
        fixed_cost_monthly: r.fixed_cost_monthly_eur,
        variable_cost_per_unit: r.variable_cost_per_unit_eur,
    })
    .collect::<Vec<_>>();

    let markets = read_table::<MarketRecord>(&dir.join(MARKETS_FILE), "markets")?
        .into_iter()
        .map(|r| Market {
            id: r.market_id,
            annual_demand_units: r.annual_demand_millions * UNITS_PER_MILLION,
            revenue_per_unit: r.revenue_per_unit_eur,
        })
        .collect::<Vec<_>>();

    let routes = read_table::<RouteRecord>(&dir.join(ROUTES_FILE), "transportation")?
        .into_iter()
        .enumerate()
        .map(|(row, r)| route_from_record(row + 1, r))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        dir = %dir.display(),
        plants = plants.len(),
        distribution_centers = dcs.len(),
        markets = markets.len(),
        routes = routes.len(),
        "network data loaded"
    );

    Ok(Network::new(plants, dcs, markets, routes))
}

fn read_table<T: DeserializeOwned>(path: &Path, table: &'static str) -> Result<Vec<T>, NetworkError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| NetworkError::DataLoad {
            table,
            message: format!("{}: {e}", path.display()),
        })?;

    reader
        .deserialize()
        .enumerate()
        .map(|(row, record)| {
            record.map_err(|e| NetworkError::DataLoad {
                table,
                message: format!("row {}: {e}", row + 1),
            })
        })
        .collect()
}

fn route_from_record(row: usize, r: RouteRecord) -> Result<Route, NetworkError> {
    let tier = match (r.from_type.as_str(), r.to_type.as_str()) {
        ("plant", "dc") => RouteTier::PlantToDc,
        ("dc", "market") => RouteTier::DcToMarket,
        (from, to) => {
            return Err(NetworkError::DataLoad {
                table: "transportation",
                message: format!("row {row}: unsupported route tier {from} -> {to}"),
            })
        }
    };

    let mode = TransportMode::from_str(&r.transport_mode).map_err(|_| NetworkError::DataLoad {
        table: "transportation",
        message: format!("row {row}: unknown transport mode `{}`", r.transport_mode),
    })?;

    let capacity_units = match r.capacity_constraint.as_deref() {
        None | Some("") | Some("unlimited") => None,
        Some(raw) => Some(raw.parse::<f64>().map_err(|_| NetworkError::DataLoad {
            table: "transportation",
            message: format!("row {row}: invalid capacity `{raw}`"),
        })?),
    };

    Ok(Route {
        from_id: r.from_id,
        to_id: r.to_id,
        tier,
        distance_km: r.distance_km,
        mode,
        cost_per_unit: r.cost_per_unit_eur,
        lead_time_days: r.lead_time_days,
        emissions_per_unit: r.co2_per_unit_kg,
        capacity_units,
    })
}
