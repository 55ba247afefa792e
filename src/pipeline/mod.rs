/*!

The Optimization Pipeline (spec.md §4.7, component C7): the six-phase
sequence that turns a [`crate::graph::CandidateGraph`] into a final
[`crate::graph::TopologyState`], each phase consuming the previous phase's
topology and producing a refined one (spec.md §9: "a single mutable
Topology handed between phases by value").

Phase numbering follows spec.md §4.7 exactly:

1. POP proposal (optional) — [`phases::pop_proposal`]
2. Connected demand site optimization — [`phases::connected_demand`]
3. Minimum-cost base network — [`phases::min_cost_base_network`]
4. Redundancy (legacy or min-cost) — [`phases::redundancy`]
5. Interference minimization — [`phases::interference_minimization`]
6. Flow Analyzer — [`crate::flow_analyzer::analyze`]

This module also owns the heuristic pre-pruning of [`prune`] (spec.md §4.7,
§9: max-flow site-splitting and Delaunay triangulation), which phase 4's
min-cost-with-redundancy variant uses to cut down the candidate link set
before its two-phase LP.

*/

pub mod phases;
pub mod prune;

use std::collections::BTreeMap;

use crate::availability::{self, AvailabilityReport};
use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::flow_analyzer::{self, FlowAnalyzerReport};
use crate::graph::{CandidateGraph, Device, EntityId, SelectionFlag, TopologyState};
use crate::milp::VarKey;
use crate::solver::{SolveOptions, SolverBackend};

///Every variable family re-reads this per phase, so it is computed once up
///front from the devices table and handed down (spec.md §4.5 family 11:
///"υ_m: SINR⁻¹ upper envelope threshold for MCS class m").
pub fn sinr_inverse_thresholds(devices:&BTreeMap<String,Device>) -> BTreeMap<u32,f64>
{
	let mut out: BTreeMap<u32,f64> = BTreeMap::new();
	for device in devices.values()
	{
		for row in &device.sector_profile.mcs_table
		{
			let threshold = 1.0/10f64.powf(row.snr_threshold_db/10.0);
			out.entry(row.mcs_class)
				.and_modify(|existing| *existing = existing.min(threshold))
				.or_insert(threshold);
		}
	}
	out
}

///A conservative big-M, large enough to never bind any constraint it relaxes
///(spec.md §4.5 families 3 and 11 both use a big-M term). Derived from the
///candidate graph's own scale rather than hardcoded, so it adapts to whatever
///units the caller's demand/capacity figures use.
pub fn big_m_for(graph:&CandidateGraph) -> f64
{
	let total_capacity_gbps: f64 = graph.links.values().map(|l|l.best_capacity_mbps()/1000.0).sum();
	let total_demand_gbps: f64 = graph.demand_sites.values().map(|d|d.demand_gbps).sum();
	(total_capacity_gbps+total_demand_gbps).max(1.0)*10.0
}

///The one-time cost of deploying a site's device node, per spec.md §4.7
///step 3's objective `Σ(c_i + Σ_k c̃_{i,k})·s_i`: `c_i` is the site's own
///CAPEX (config default) plus its device's node CAPEX, and `c̃_{i,k}` is each
///of its sectors' CAPEX (config default, split evenly across the channels a
///sector can be active on — see DESIGN.md for why this crate doesn't charge
///a sector's cost once per node regardless of channel count).
pub fn site_cost(graph:&CandidateGraph, devices:&BTreeMap<String,Device>, config:&PlannerConfig, site_id:EntityId) -> f64
{
	let mut cost = config.default_site_capex;
	if let Some(site) = graph.sites.get(&site_id)
	{
		if let Some(sku) = &site.device_sku
		{
			if let Some(device) = devices.get(sku)
			{
				cost += device.node_capex;
			}
		}
	}
	cost
}

///Everything the final, solved [`TopologyState`] plus the Flow Analyzer's
///report, returned by [`run`] (spec.md §6 "Outputs": the topology file and
///per-site/per-link CSV reports draw directly from these two values).
#[derive(Debug,Clone)]
pub struct PlanResult
{
	pub topology: TopologyState,
	pub flow_report: FlowAnalyzerReport,
	///γ actually reached by the min-cost base network phase's relaxation
	///(spec.md §4.7 step 3, §9 open question on monotone relaxation).
	pub base_network_gamma: f64,
	pub warnings: Vec<crate::error::NumericalWarning>,
	///Seeded Monte Carlo link-availability simulation over the final topology
	///(spec.md §6 "availability simulation knobs"); disabled (all-zero) when
	///`config.availability_simulation_runs` is `0`.
	pub availability: AvailabilityReport,
}

///Runs every phase of spec.md §4.7 in order against `graph`, returning the
///final [`PlanResult`] or a [`PlannerError`] once every relaxation available
///to the phase that failed has been exhausted (spec.md §7).
pub fn run(
	graph:&CandidateGraph,
	devices:&BTreeMap<String,Device>,
	config:&PlannerConfig,
	solver:&dyn SolverBackend,
) -> Result<PlanResult, PlannerError>
{
	let big_m = big_m_for(graph);
	let thresholds = sinr_inverse_thresholds(devices);
	let mut warnings = Vec::new();

	let mut topology = TopologyState::new();
	for site in graph.sites.values()
	{
		topology.site_flags.insert(site.id, SelectionFlag::Candidate);
	}

	if config.number_of_extra_pops > 0
	{
		topology = phases::pop_proposal::run(graph, config, &thresholds, big_m, solver, topology)?;
	}

	let (topology_after_demand, connected_demand_ids) =
		phases::connected_demand::run(graph, config, &thresholds, big_m, solver, topology)?;
	let mut topology = topology_after_demand;

	let (topology_after_base, base_gamma) = phases::min_cost_base_network::run(
		graph, devices, config, &thresholds, big_m, solver, topology, &connected_demand_ids,
	)?;
	topology = topology_after_base;

	topology = phases::redundancy::run(graph, devices, config, &thresholds, big_m, solver, topology, &connected_demand_ids)?;

	topology = phases::interference_minimization::run(graph, devices, config, &thresholds, big_m, solver, topology)?;

	for link in graph.links.values()
	{
		if topology.link_mcs_class.contains_key(&link.id) && link.best_capacity_mbps() <= 0.0
		{
			warnings.push(crate::error::NumericalWarning{
				site_i: link.from.to_hex(),
				site_j: link.to.to_hex(),
				detail: "selected link has no achievable MCS class; SNR below table minimum".into(),
			});
		}
	}

	let flow_config = config.to_flow_analyzer_config();
	let flow_options = SolveOptions{
		rel_gap: config.solve_options_for("flow_analyzer").rel_gap,
		time_limit_minutes: config.solve_options_for("flow_analyzer").max_time_minutes,
		thread_count: config.solver_thread_count,
		debug_lp_path: None,
	};
	let flow_report = flow_analyzer::analyze(graph, &topology, &flow_config, solver, &flow_options);

	let availability_config = config.to_availability_config();
	let availability_report = availability::simulate(graph, &topology, &availability_config);

	Ok(PlanResult{ topology, flow_report, base_network_gamma: base_gamma, warnings, availability: availability_report })
}

///Copies every variable's solved value from `values` onto `topology`,
///per-family, for the subset of [`VarKey`]s a phase actually enumerated.
///Phases call this at their end so the next phase starts from a topology
///reflecting everything the solver just decided (spec.md §9: phases are
///"pure with respect to its input", i.e. this never mutates in place across
///a solve, only between solves).
pub(crate) fn apply_solution(
	graph:&CandidateGraph,
	values:&crate::solver::SolutionValues,
	vars:&crate::milp::VariableSet,
	topology:&mut TopologyState,
)
{
	for site in graph.sites.values()
	{
		if let Some(id) = vars.get(&VarKey::SiteSelected(site.id))
		{
			let selected = values.get(&id).copied().unwrap_or(0.0) > 0.5;
			topology.site_flags.insert(site.id, if selected { SelectionFlag::Proposed } else { SelectionFlag::Candidate });
		}
		if let Some(id) = vars.get(&VarKey::Polarity(site.id))
		{
			topology.site_polarity.insert(site.id, values.get(&id).copied().unwrap_or(0.0) > 0.5);
		}
	}

	for sector in graph.sectors.values()
	{
		for c in 0..config_channel_upper_bound()
		{
			if let Some(id) = vars.get(&VarKey::SectorActive(sector.id,c))
			{
				if values.get(&id).copied().unwrap_or(0.0) > 0.5
				{
					topology.sector_channel.insert(sector.id, c);
				}
			}
		}
	}

	for link in graph.links.values()
	{
		for c in 0..config_channel_upper_bound()
		{
			for &m in link.capacity_by_mcs.keys()
			{
				if let Some(id) = vars.get(&VarKey::McsClass(link.id,c,m))
				{
					if values.get(&id).copied().unwrap_or(0.0) > 0.5
					{
						topology.link_mcs_class.insert(link.id, m);
					}
				}
			}
			if let Some(id) = vars.get(&VarKey::TimeDivision(link.id,c))
			{
				let tau = values.get(&id).copied().unwrap_or(0.0);
				if tau > 0.0
				{
					topology.link_time_division.insert(link.id, tau);
				}
			}
		}
	}

	for demand in graph.demand_sites.values()
	{
		if let Some(id) = vars.get(&VarKey::Shortfall(demand.id))
		{
			topology.demand_shortfall.insert(demand.id, values.get(&id).copied().unwrap_or(0.0));
		}
	}
}

///Channels are enumerated `0..num_channels`, but [`apply_solution`] doesn't
///carry a `ConstraintConfig`/`VariableConfig` of its own; phases call it with
///the same graph/vars they built, and a variable that was never enumerated
///for a given `(entity,channel)` simply returns `None` from `vars.get`, so
///scanning a fixed generous upper bound is harmless and keeps this helper's
///signature small. 64 channels is far beyond any realistic deployment
///(spec.md §6 NUMBER_OF_CHANNELS).
fn config_channel_upper_bound() -> u32
{
	64
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::graph::{DeviceType, SectorProfile, SiteType};
	use crate::radio::{AngleLossTable, McsRow};

	fn device() -> Device
	{
		Device{
			sku: "DN-1".into(),
			device_type: DeviceType::Dn,
			node_capex: 500.0,
			max_nodes_per_site: 1,
			sector_profile: SectorProfile{
				scan_range_deg: 90.0,
				sectors_per_node: 4,
				boresight_gain_dbi: 30.0,
				tx_power_min_dbm: 10.0,
				tx_power_max_dbm: 23.0,
				rx_sensitivity_dbm: -70.0,
				diversity_gain_db: 0.0,
				misc_loss_db: 1.0,
				antenna_pattern: AngleLossTable::new(vec![(0.0,0.0),(90.0,30.0)]).expect("literal fixture is well formed"),
				scan_pattern: AngleLossTable::new(vec![(0.0,0.0),(90.0,30.0)]).expect("literal fixture is well formed"),
				mcs_table: vec![
					McsRow{ mcs_class:0, snr_threshold_db:-100.0, throughput_mbps:0.0, tx_backoff_db:0.0 },
					McsRow{ mcs_class:1, snr_threshold_db:10.0, throughput_mbps:1000.0, tx_backoff_db:0.0 },
					McsRow{ mcs_class:2, snr_threshold_db:18.0, throughput_mbps:1800.0, tx_backoff_db:3.0 },
				],
			},
		}
	}

	#[test]
	fn sinr_thresholds_descend_as_mcs_class_rises()
	{
		let devices: BTreeMap<String,Device> = [("DN-1".to_string(),device())].into_iter().collect();
		let thresholds = sinr_inverse_thresholds(&devices);
		assert!(thresholds[&2] < thresholds[&1]);
		assert!(thresholds[&1] < thresholds[&0]);
	}

	#[test]
	fn site_cost_adds_device_node_capex_to_the_site_default()
	{
		let mut graph = CandidateGraph::new();
		let id = crate::graph::Site::compute_id(0.0,0.0,0.0,SiteType::Dn,Some("DN-1"));
		graph.sites.insert(id, crate::graph::Site{
			id, position: crate::geometry::Point3::new(0.0,0.0,0.0), site_type: SiteType::Dn,
			building_id: None, device_sku: Some("DN-1".into()), number_of_subscribers: None,
		});
		let devices: BTreeMap<String,Device> = [("DN-1".to_string(),device())].into_iter().collect();
		let mut config = test_config();
		config.default_site_capex = 100.0;
		assert_eq!(site_cost(&graph,&devices,&config,id), 600.0);
	}

	pub(crate) fn test_config() -> PlannerConfig
	{
		use crate::flow_analyzer::RoutingFilter;
		use crate::los::LosModel;
		use crate::config::{DemandModelConfig, RedundancyLevel};

		PlannerConfig{
			los_model: LosModel::Cylindrical,
			fresnel_radius_m: 1.0,
			confidence_threshold: 0.3,
			max_elevation_angle_deg: 90.0,
			min_distance_m: 1.0,
			max_distance_m: 5000.0,
			carrier_frequency_ghz: 60.0,
			noise_figure_db: 6.0,
			thermal_noise_power_dbm: -75.0,
			rain_specific_attenuation_db_per_km: 0.0,
			gaseous_attenuation_db_per_km: 15.0,
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
			dn_total_link_limit: 15,
			diff_sector_angle_limit_deg: 15.0,
			near_far_length_ratio: 3.0,
			near_far_angle_limit_deg: 40.0,
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
}
