/*!

The typed configuration surface (spec.md §6, SPEC_FULL.md §A.1). spec.md
describes the configuration as "a flat dictionary whose recognized fields
include, minimally: ..."; spec.md §9 directs that this dynamic-typing
surface be replaced, in a real implementation, by a closed record that
rejects unrecognized fields rather than silently ignoring them. [`PlannerConfig`]
is that record.

Reading a config file from disk, parsing shapefiles/KML, and CLI argument
glue remain external collaborators (spec.md §1); this module only describes
the shape of the already-parsed configuration and how to validate and lower
it into the narrower, per-component configs the rest of the crate consumes.

*/

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::flow_analyzer::{FlowAnalyzerConfig, RoutingFilter};
use crate::geometry::Point2;
use crate::graph::builder::{BuilderConfig, DemandModel};
use crate::los::{LosConfig, LosModel};
use crate::milp::constraints::ConstraintConfig;
use crate::milp::variables::VariableConfig;

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all="SCREAMING_SNAKE_CASE")]
pub enum RedundancyLevel
{
	Low,
	Med,
	High,
}

impl RedundancyLevel
{
	///Per-site-class flow caps the redundancy phase enforces (spec.md §4.7:
	///"C_POP, C_DN, C_SINK per redundancy level"), in Gbps.
	pub fn capacities_gbps(&self) -> (f64,f64,f64)
	{
		match self
		{
			RedundancyLevel::Low => (2.0,1.0,0.5),
			RedundancyLevel::Med => (4.0,2.0,1.0),
			RedundancyLevel::High => (8.0,4.0,2.0),
		}
	}
}

///How demand sites are generated (spec.md §4.4 step 5), in a serde-friendly
///shape: [`DemandModel`] carries `geo`/internal point types unsuited to
///direct deserialization, so this mirrors it with plain coordinate pairs.
#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(tag="kind", rename_all="SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub enum DemandModelConfig
{
	Cn{ demand_per_cn_gbps: f64 },
	Uniform{ spacing_m: f64, demand_per_site_gbps: f64, connection_radius_m: f64, boundary: Vec<(f64,f64)> },
	Manual{ sites: Vec<(f64,f64,f64)>, connection_radius_m: f64 },
}

impl DemandModelConfig
{
	pub fn to_builder_model(&self) -> DemandModel
	{
		match self
		{
			DemandModelConfig::Cn{ demand_per_cn_gbps } => DemandModel::Cn{ demand_per_cn_gbps: *demand_per_cn_gbps },
			DemandModelConfig::Uniform{ spacing_m, demand_per_site_gbps, connection_radius_m, boundary } =>
				DemandModel::Uniform{
					spacing_m: *spacing_m,
					demand_per_site_gbps: *demand_per_site_gbps,
					connection_radius_m: *connection_radius_m,
					boundary: boundary.iter().map(|&(x,y)|Point2::new(x,y)).collect(),
				},
			DemandModelConfig::Manual{ sites, connection_radius_m } =>
				DemandModel::Manual{
					sites: sites.iter().map(|&(x,y,d)|(Point2::new(x,y),d)).collect(),
					connection_radius_m: *connection_radius_m,
				},
		}
	}
}

///Per-phase solver limits (spec.md §6: "per-phase {rel_gap, max_time_minutes}").
#[derive(Debug,Clone,Copy,Serialize,Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseSolveOptions
{
	pub rel_gap: f64,
	pub max_time_minutes: f64,
}

///The flat configuration dictionary of spec.md §6, as a closed record.
///`#[serde(deny_unknown_fields)]` realizes §9's "replace dynamic typing
///with validated records, rejecting unknown keys instead of ignoring them".
#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerConfig
{
	//--- LOS / geometry (spec.md §4.1, §4.2) ---
	pub los_model: LosModel,
	pub fresnel_radius_m: f64,
	pub confidence_threshold: f64,
	pub max_elevation_angle_deg: f64,
	pub min_distance_m: f64,
	pub max_distance_m: f64,

	//--- Radio model (spec.md §4.3) ---
	pub carrier_frequency_ghz: f64,
	pub noise_figure_db: f64,
	pub thermal_noise_power_dbm: f64,
	pub rain_specific_attenuation_db_per_km: f64,
	pub gaseous_attenuation_db_per_km: f64,
	///Percent of time a link must clear its rain margin (spec.md §6
	///"link availability %"); informational alongside the rain model rather
	///than a distinct computation, since this crate works from a single
	///design-rain-rate per spec.md §4.3's scope.
	pub link_availability_percent: f64,

	//--- Candidate graph builder (spec.md §4.4) ---
	pub automatic_site_detection: bool,
	pub corner_angle_threshold_deg: f64,
	///True when the caller supplied a precomputed base topology (spec.md §6
	///"Candidate or base topology"); mutually exclusive with
	///`automatic_site_detection` (spec.md §7 ConfigError: "contradictory
	///options").
	pub base_topology_supplied: bool,
	pub demand_model: DemandModelConfig,

	//--- Economics ---
	pub default_site_capex: f64,
	pub default_sector_capex: f64,
	pub budget: f64,

	//--- MILP / pipeline knobs (spec.md §4.5, §4.7) ---
	pub pop_capacity_gbps: f64,
	///Ratio applied on top of `pop_capacity_gbps` and the redundancy-level
	///site caps (spec.md §6 "OVERSUBSCRIPTION"): values above 1.0 allow a
	///site to commit more demand than its raw capacity, on the assumption
	///that not every attached CN peaks simultaneously.
	pub oversubscription: f64,
	pub number_of_extra_pops: u32,
	pub dn_dn_link_limit: u32,
	pub dn_total_link_limit: u32,
	pub diff_sector_angle_limit_deg: f64,
	pub near_far_length_ratio: f64,
	pub near_far_angle_limit_deg: f64,
	pub number_of_channels: u32,
	pub maximize_common_bandwidth: bool,
	pub always_active_pops: bool,
	pub enable_legacy_redundancy_method: bool,
	pub redundancy_level: RedundancyLevel,
	pub backhaul_link_redundancy_ratio: f64,

	//--- Solver (spec.md §4.6) ---
	pub solver_thread_count: u32,
	pub phase_solve_options: BTreeMap<String,PhaseSolveOptions>,

	//--- Flow Analyzer (spec.md §4.8) ---
	pub topology_routing: RoutingFilter,

	//--- Availability simulation (spec.md §6) ---
	pub availability_simulation_runs: u32,
	pub availability_simulation_seed: u64,
}

impl PlannerConfig
{
	///The ConfigError checks of spec.md §7: an unrecognized device SKU
	///referenced by a site, or a base topology supplied alongside automatic
	///site detection. Checks that a piece of data (as opposed to the
	///configuration) is missing belong to `DataError`, raised by the
	///component that first needs that data (spec.md §7).
	pub fn validate(&self, known_device_skus:&BTreeSet<String>, site_device_skus:&[Option<String>]) -> Result<(),ConfigError>
	{
		if self.automatic_site_detection && self.base_topology_supplied
		{
			return Err(ConfigError::Contradictory{
				left: "base topology".into(),
				right: "automatic site detection".into(),
			});
		}
		for sku in site_device_skus.iter().flatten()
		{
			if !known_device_skus.contains(sku)
			{
				return Err(ConfigError::UnknownDeviceSku{ sku: sku.clone() });
			}
		}
		Ok(())
	}

	///The POP capacity bound actually enforced, after applying
	///`oversubscription`.
	pub fn effective_pop_capacity_gbps(&self) -> f64
	{
		self.pop_capacity_gbps*self.oversubscription
	}

	pub fn to_los_config(&self, exclusion_polygons:Vec<geo::Polygon<f64>>) -> LosConfig
	{
		LosConfig{
			model: self.los_model,
			fresnel_radius_m: self.fresnel_radius_m,
			confidence_threshold: self.confidence_threshold,
			max_elevation_angle_deg: self.max_elevation_angle_deg,
			min_distance_m: self.min_distance_m,
			max_distance_m: self.max_distance_m,
			frequency_ghz: self.carrier_frequency_ghz,
			exclusion_polygons,
		}
	}

	pub fn to_builder_config(&self, exclusion_polygons:Vec<geo::Polygon<f64>>) -> BuilderConfig
	{
		BuilderConfig{
			los: self.to_los_config(exclusion_polygons),
			frequency_ghz: self.carrier_frequency_ghz,
			thermal_noise_power_dbm: self.thermal_noise_power_dbm,
			gal_attenuation_db_per_km: self.gaseous_attenuation_db_per_km,
			rain_specific_attenuation_db_per_km: self.rain_specific_attenuation_db_per_km,
			automatic_site_detection: self.automatic_site_detection,
			corner_angle_threshold_deg: self.corner_angle_threshold_deg,
			demand_model: self.demand_model.to_builder_model(),
		}
	}

	pub fn to_variable_config(&self) -> VariableConfig
	{
		VariableConfig{
			num_channels: self.number_of_channels,
			pop_capacity_gbps: self.effective_pop_capacity_gbps(),
		}
	}

	///`sinr_inverse_thresholds` and `big_m` are derived from the device MCS
	///tables and the graph's scale respectively, not from this flat
	///configuration, so callers supply them directly (spec.md §4.5).
	pub fn to_constraint_config(&self, big_m:f64, sinr_inverse_thresholds:BTreeMap<u32,f64>) -> ConstraintConfig
	{
		ConstraintConfig{
			num_channels: self.number_of_channels,
			pop_capacity_gbps: self.effective_pop_capacity_gbps(),
			big_m,
			dn_dn_link_limit: self.dn_dn_link_limit,
			dn_total_link_limit: self.dn_total_link_limit,
			diff_sector_angle_limit_deg: self.diff_sector_angle_limit_deg,
			near_far_angle_limit_deg: self.near_far_angle_limit_deg,
			near_far_length_ratio: self.near_far_length_ratio,
			sinr_inverse_thresholds,
			noise_power_mw: crate::radio::dbm_to_mw(self.thermal_noise_power_dbm+self.noise_figure_db),
		}
	}

	pub fn to_flow_analyzer_config(&self) -> FlowAnalyzerConfig
	{
		FlowAnalyzerConfig{
			routing_filter: self.topology_routing,
			pop_capacity_gbps: self.effective_pop_capacity_gbps(),
		}
	}

	///Solver limits for a named pipeline phase, falling back to a
	///conservative default when the caller did not list one explicitly.
	pub fn solve_options_for(&self, phase:&str) -> PhaseSolveOptions
	{
		self.phase_solve_options.get(phase).copied().unwrap_or(PhaseSolveOptions{ rel_gap: 0.01, max_time_minutes: 5.0 })
	}

	pub fn to_availability_config(&self) -> crate::availability::AvailabilityConfig
	{
		crate::availability::AvailabilityConfig{
			link_availability_percent: self.link_availability_percent,
			runs: self.availability_simulation_runs,
			seed: self.availability_simulation_seed,
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn minimal_config() -> PlannerConfig
	{
		PlannerConfig{
			los_model: LosModel::Cylindrical,
			fresnel_radius_m: 1.0,
			confidence_threshold: 0.9,
			max_elevation_angle_deg: 30.0,
			min_distance_m: 5.0,
			max_distance_m: 3000.0,
			carrier_frequency_ghz: 60.0,
			noise_figure_db: 6.0,
			thermal_noise_power_dbm: -174.0,
			rain_specific_attenuation_db_per_km: 0.0,
			gaseous_attenuation_db_per_km: 0.0,
			link_availability_percent: 99.9,
			automatic_site_detection: false,
			corner_angle_threshold_deg: 160.0,
			base_topology_supplied: false,
			demand_model: DemandModelConfig::Cn{ demand_per_cn_gbps: 0.2 },
			default_site_capex: 1000.0,
			default_sector_capex: 200.0,
			budget: f64::INFINITY,
			pop_capacity_gbps: 10.0,
			oversubscription: 1.0,
			number_of_extra_pops: 0,
			dn_dn_link_limit: 2,
			dn_total_link_limit: 4,
			diff_sector_angle_limit_deg: 15.0,
			near_far_length_ratio: 3.0,
			near_far_angle_limit_deg: 10.0,
			number_of_channels: 1,
			maximize_common_bandwidth: false,
			always_active_pops: true,
			enable_legacy_redundancy_method: false,
			redundancy_level: RedundancyLevel::Med,
			backhaul_link_redundancy_ratio: 0.0,
			solver_thread_count: 1,
			phase_solve_options: BTreeMap::new(),
			topology_routing: RoutingFilter::ShortestPath,
			availability_simulation_runs: 0,
			availability_simulation_seed: 0,
		}
	}

	#[test]
	fn base_topology_with_automatic_detection_is_contradictory()
	{
		let mut config = minimal_config();
		config.automatic_site_detection = true;
		config.base_topology_supplied = true;
		assert!(matches!(config.validate(&BTreeSet::new(),&[]), Err(ConfigError::Contradictory{..})));
	}

	#[test]
	fn unknown_device_sku_on_a_site_is_rejected()
	{
		let config = minimal_config();
		let known: BTreeSet<String> = ["DN-1".to_string()].into_iter().collect();
		let err = config.validate(&known,&[Some("DN-2".to_string())]);
		assert!(matches!(err, Err(ConfigError::UnknownDeviceSku{..})));
	}

	#[test]
	fn oversubscription_scales_the_effective_pop_capacity()
	{
		let mut config = minimal_config();
		config.oversubscription = 1.5;
		assert_eq!(config.effective_pop_capacity_gbps(), 15.0);
	}
}
