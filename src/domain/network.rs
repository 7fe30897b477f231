use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::NetworkError;

/// Production site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: String,
    /// Annual production capacity (units)
    pub capacity_units: f64,
    /// Production cost per unit (EUR)
    pub unit_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionCenter {
    pub id: String,
    /// Storage capacity (units); informational, not a model constraint
    pub storage_capacity_units: f64,
    pub fixed_cost_monthly: f64,
    pub variable_cost_per_unit: f64,
}

/// Demand region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    /// Annual demand (units)
    pub annual_demand_units: f64,
    /// Revenue per delivered unit; analytics only, never part of the objective
    pub revenue_per_unit: f64,
}

/// Echelon a route connects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RouteTier {
    PlantToDc,
    DcToMarket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TransportMode {
    Road,
    Rail,
    Sea,
    Air,
}

/// Directed edge between two echelons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub from_id: String,
    pub to_id: String,
    pub tier: RouteTier,
    pub distance_km: f64,
    pub mode: TransportMode,
    pub cost_per_unit: f64,
    pub lead_time_days: f64,
    /// CO2 per unit shipped (kg)
    pub emissions_per_unit: f64,
    /// `None` = unlimited
    pub capacity_units: Option<f64>,
}

/// Immutable three-tier network: plants -> distribution centers -> markets
#[derive(Debug, Clone)]
pub struct Network {
    plants: Vec<Plant>,
    distribution_centers: Vec<DistributionCenter>,
    markets: Vec<Market>,
    routes: Vec<Route>,
    route_index: HashMap<String, HashMap<String, usize>>,
}

impl Network {
    pub fn new(
        plants: Vec<Plant>,
        distribution_centers: Vec<DistributionCenter>,
        markets: Vec<Market>,
        routes: Vec<Route>,
    ) -> Self {
        let mut route_index: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for (idx, route) in routes.iter().enumerate() {
            route_index
                .entry(route.from_id.clone())
                .or_default()
                .entry(route.to_id.clone())
                .or_insert(idx);
        }

        Self {
            plants,
            distribution_centers,
            markets,
            routes,
            route_index,
        }
    }

    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    pub fn distribution_centers(&self) -> &[DistributionCenter] {
        &self.distribution_centers
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn routes_in_tier(&self, tier: RouteTier) -> impl Iterator<Item = &Route> {
        self.routes.iter().filter(move |r| r.tier == tier)
    }

    /// Look up the route from `from_id` to `to_id`
    pub fn route(&self, from_id: &str, to_id: &str) -> Option<&Route> {
        self.route_index
            .get(from_id)
            .and_then(|targets| targets.get(to_id))
            .map(|&idx| &self.routes[idx])
    }

    pub fn plant(&self, id: &str) -> Option<&Plant> {
        self.plants.iter().find(|p| p.id == id)
    }

    pub fn total_demand(&self) -> f64 {
        self.markets.iter().fold(0.0, |acc, m| acc + m.annual_demand_units)
    }

    pub fn total_capacity(&self) -> f64 {
        self.plants.iter().fold(0.0, |acc, p| acc + p.capacity_units)
    }

    /// Check referential integrity and numeric sanity of all tables.
    pub fn validate(&self) -> Result<(), NetworkError> {
        let plant_ids = unique_ids("plant", self.plants.iter().map(|p| p.id.as_str()))?;
        let dc_ids = unique_ids(
            "distribution center",
            self.distribution_centers.iter().map(|d| d.id.as_str()),
        )?;
        let market_ids = unique_ids("market", self.markets.iter().map(|m| m.id.as_str()))?;

        for plant in &self.plants {
            ensure_non_negative(&plant.id, "capacity", plant.capacity_units)?;
            ensure_non_negative(&plant.id, "unit cost", plant.unit_cost)?;
        }
        for dc in &self.distribution_centers {
            ensure_non_negative(&dc.id, "fixed monthly cost", dc.fixed_cost_monthly)?;
            ensure_non_negative(&dc.id, "variable cost", dc.variable_cost_per_unit)?;
        }
        for market in &self.markets {
            ensure_non_negative(&market.id, "annual demand", market.annual_demand_units)?;
        }

        let mut seen_routes = HashSet::new();
        for route in &self.routes {
            let (from_ids, from_kind, to_ids, to_kind) = match route.tier {
                RouteTier::PlantToDc => (&plant_ids, "plant", &dc_ids, "distribution center"),
                RouteTier::DcToMarket => (&dc_ids, "distribution center", &market_ids, "market"),
            };
            if !from_ids.contains(route.from_id.as_str()) {
                return Err(NetworkError::DataIntegrity(format!(
                    "route {} -> {} references unknown {} `{}`",
                    route.from_id, route.to_id, from_kind, route.from_id
                )));
            }
            if !to_ids.contains(route.to_id.as_str()) {
                return Err(NetworkError::DataIntegrity(format!(
                    "route {} -> {} references unknown {} `{}`",
                    route.from_id, route.to_id, to_kind, route.to_id
                )));
            }
            if !seen_routes.insert((route.from_id.as_str(), route.to_id.as_str())) {
                return Err(NetworkError::DataIntegrity(format!(
                    "duplicate route {} -> {}",
                    route.from_id, route.to_id
                )));
            }

            let label = format!("{}->{}", route.from_id, route.to_id);
            ensure_non_negative(&label, "cost per unit", route.cost_per_unit)?;
            ensure_non_negative(&label, "lead time", route.lead_time_days)?;
            ensure_non_negative(&label, "emissions per unit", route.emissions_per_unit)?;
            if let Some(capacity) = route.capacity_units {
                ensure_non_negative(&label, "capacity", capacity)?;
            }
        }

        Ok(())
    }
}

fn unique_ids<'a>(
    kind: &str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashSet<&'a str>, NetworkError> {
    let mut set = HashSet::new();
    for id in ids {
        if !set.insert(id) {
            return Err(NetworkError::DataIntegrity(format!("duplicate {kind} id `{id}`")));
        }
    }
    Ok(set)
}

fn ensure_non_negative(owner: &str, field: &str, value: f64) -> Result<(), NetworkError> {
    if !value.is_finite() || value < 0.0 {
        return Err(NetworkError::DataIntegrity(format!(
            "{owner}: {field} must be a finite non-negative number, got {value}"
        )));
    }
    Ok(())
}
