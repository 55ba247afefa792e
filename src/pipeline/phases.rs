/*!

The six pipeline phases of spec.md §4.7, one submodule each. Every phase
function takes the graph, the current [`TopologyState`], and whatever
per-phase configuration it needs, and returns the next `TopologyState` (plus,
where the spec calls for it, a side channel like the γ actually reached or
the set of demand sites judged connected).

A shared helper, [`new_problem`], builds a fresh [`Problem`] with every
variable family enumerated; each phase then calls only the constraint-family
functions from [`crate::milp::constraints`] it actually needs, exactly as
spec.md §4.7 describes for each phase.

*/

use std::collections::{BTreeMap, BTreeSet};

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::graph::{CandidateGraph, Device, EntityId, SelectionFlag, SiteType, TopologyState};
use crate::milp::constraints::{self, ConstraintConfig};
use crate::milp::variables::{self, VariableConfig, VariableSet};
use crate::milp::{LinExpr, Objective, ObjectiveSense, Problem, Sense, VarDef, VarDomain, VarId, VarKey};
use crate::solver::{SolveOptions, SolveOutcome, SolverBackend};

fn new_problem(graph:&CandidateGraph, num_channels:u32, pop_capacity_gbps:f64) -> (Problem, VariableSet)
{
	let var_config = VariableConfig{ num_channels, pop_capacity_gbps };
	let mut problem = Problem::new(Objective{ sense: ObjectiveSense::Minimize, expr: LinExpr::constant(0.0) });
	let vars = variables::enumerate_variables(graph,&var_config,&mut problem);
	(problem, vars)
}

fn solve_options(config:&PlannerConfig, phase:&str) -> SolveOptions
{
	let limits = config.solve_options_for(phase);
	SolveOptions{
		rel_gap: limits.rel_gap,
		time_limit_minutes: limits.max_time_minutes,
		thread_count: config.solver_thread_count,
		debug_lp_path: None,
	}
}

fn total_demand_gbps(graph:&CandidateGraph, restrict_to:Option<&BTreeSet<EntityId>>) -> f64
{
	graph.demand_sites.values()
		.filter(|d| restrict_to.map_or(true,|set|set.contains(&d.id)))
		.map(|d|d.demand_gbps)
		.sum()
}

///Phase 1: POP proposal (spec.md §4.7 step 1, optional). Picks the
///`NUMBER_OF_EXTRA_POPS` candidate POP sites with the widest immediate
///reach (most distinct one-hop neighbors in the candidate graph) and marks
///them Proposed. This is a simplification of the spec's "DN promoted to
///POP" language: candidate POP sites are already distinct, co-located
///candidates in this crate's data model rather than DN sites that get
///retyped at runtime (see DESIGN.md).
pub mod pop_proposal
{
	use super::*;

	pub fn run(
		graph:&CandidateGraph,
		config:&PlannerConfig,
		_thresholds:&BTreeMap<u32,f64>,
		_big_m:f64,
		_solver:&dyn SolverBackend,
		mut topology:TopologyState,
	) -> Result<TopologyState, PlannerError>
	{
		let mut candidates: Vec<(&EntityId,usize)> = graph.sites.values()
			.filter(|s|s.site_type==SiteType::Pop)
			.map(|s| (&s.id, graph.links_from(&s.id).map(|l|l.to).collect::<BTreeSet<_>>().len()))
			.collect();
		//Stable tie-break on EntityId, already guaranteed by sorting a Vec built
		//from a BTreeMap's values in id order; sort_by_key on score alone keeps
		//that relative order for ties (`sort_by_key` is stable).
		candidates.sort_by(|a,b| b.1.cmp(&a.1).then_with(||a.0.cmp(b.0)));

		for (id,_score) in candidates.into_iter().take(config.number_of_extra_pops as usize)
		{
			topology.site_flags.insert(*id, SelectionFlag::Proposed);
		}
		Ok(topology)
	}
}

///Phase 2: connected demand site optimization (spec.md §4.7 step 2):
///maximize the number of demand sites the candidate graph can reach at all,
///ignoring cost. Since demand sites carry only a `Shortfall` variable (no
///`SiteSelected` of their own), this minimizes total shortfall as an
///equivalent proxy and calls a demand site "connected" when its solved
///shortfall is strictly less than its full demand (see DESIGN.md).
pub mod connected_demand
{
	use super::*;

	pub fn run(
		graph:&CandidateGraph,
		config:&PlannerConfig,
		_thresholds:&BTreeMap<u32,f64>,
		_big_m:f64,
		solver:&dyn SolverBackend,
		mut topology:TopologyState,
	) -> Result<(TopologyState, BTreeSet<EntityId>), PlannerError>
	{
		let (mut problem, vars) = new_problem(graph, config.number_of_channels, config.effective_pop_capacity_gbps());

		let cconfig = ConstraintConfig{
			num_channels: config.number_of_channels,
			pop_capacity_gbps: config.effective_pop_capacity_gbps(),
			big_m: 0.0,
			dn_dn_link_limit: config.dn_dn_link_limit,
			dn_total_link_limit: config.dn_total_link_limit,
			diff_sector_angle_limit_deg: config.diff_sector_angle_limit_deg,
			near_far_angle_limit_deg: config.near_far_angle_limit_deg,
			near_far_length_ratio: config.near_far_length_ratio,
			sinr_inverse_thresholds: BTreeMap::new(),
			noise_power_mw: crate::radio::dbm_to_mw(config.thermal_noise_power_dbm+config.noise_figure_db),
		};

		constraints::flow_balance(graph,&vars,&cconfig,&mut problem);
		constraints::flow_site_gating(graph,&vars,&cconfig,&mut problem);
		constraints::p2mp(graph,&vars,&cconfig,&mut problem);
		constraints::co_location(graph,&vars,&mut problem);

		let mut objective = LinExpr::default();
		for demand in graph.demand_sites.values()
		{
			if let Some(phi) = vars.get(&VarKey::Shortfall(demand.id))
			{
				objective.add_term(phi,1.0);
			}
		}
		problem.objective = Objective{ sense: ObjectiveSense::Minimize, expr: objective };

		let options = solve_options(config,"connected_demand");
		let outcome = solver.solve(&problem,&options);
		let values = outcome.values().ok_or_else(||PlannerError::Infeasible{
			phase: "connected_demand".into(),
			detail: "no feasible assignment of any candidate site to any demand site".into(),
		})?.clone();

		super::super::apply_solution(graph,&values,&vars,&mut topology);

		let mut connected = BTreeSet::new();
		for demand in graph.demand_sites.values()
		{
			let phi = topology.demand_shortfall.get(&demand.id).copied().unwrap_or(demand.demand_gbps);
			if phi < demand.demand_gbps - 1e-6
			{
				connected.insert(demand.id);
			}
		}

		Ok((topology, connected))
	}
}

///Phase 3: minimum-cost base network (spec.md §4.7 step 3): minimize
///deployment cost subject to a coverage floor, relaxing the floor (γ) down
///from 1.0 via [`crate::policies::GammaSchedule`] until feasible. Coverage is
///expressed in the aggregate form `Σφ_i <= (1-γ)·Σd_i` over the demand sites
///phase 2 judged reachable (see DESIGN.md: the spec offers a per-demand
///alternative form as well, this crate uses the aggregate one).
pub mod min_cost_base_network
{
	use super::*;
	use crate::policies::{relax_gamma, GammaSchedule, RelaxationOutcome};

	pub fn run(
		graph:&CandidateGraph,
		devices:&BTreeMap<String,Device>,
		config:&PlannerConfig,
		thresholds:&BTreeMap<u32,f64>,
		big_m:f64,
		solver:&dyn SolverBackend,
		topology:TopologyState,
		connected_demand_ids:&BTreeSet<EntityId>,
	) -> Result<(TopologyState, f64), PlannerError>
	{
		let total_demand = total_demand_gbps(graph,Some(connected_demand_ids)).max(1e-9);
		let options = solve_options(config,"min_cost_base_network");

		let schedule = GammaSchedule{ start: 1.0, step: 0.1, floor: 0.0 };
		let outcome = relax_gamma(&schedule, |gamma|
		{
			let (mut problem, vars) = new_problem(graph, config.number_of_channels, config.effective_pop_capacity_gbps());
			let cconfig = ConstraintConfig{
				num_channels: config.number_of_channels,
				pop_capacity_gbps: config.effective_pop_capacity_gbps(),
				big_m,
				dn_dn_link_limit: config.dn_dn_link_limit,
				dn_total_link_limit: config.dn_total_link_limit,
				diff_sector_angle_limit_deg: config.diff_sector_angle_limit_deg,
				near_far_angle_limit_deg: config.near_far_angle_limit_deg,
				near_far_length_ratio: config.near_far_length_ratio,
				sinr_inverse_thresholds: thresholds.clone(),
				noise_power_mw: crate::radio::dbm_to_mw(config.thermal_noise_power_dbm+config.noise_figure_db),
			};

			constraints::flow_balance(graph,&vars,&cconfig,&mut problem);
			constraints::flow_capacity(graph,&vars,&cconfig,&mut problem);
			constraints::flow_site_gating(graph,&vars,&cconfig,&mut problem);
			constraints::polarity_gating(graph,&vars,&cconfig,true,&mut problem);
			constraints::time_division(graph,&vars,&cconfig,&mut problem);
			constraints::sector_node_coupling(graph,&vars,&cconfig,&mut problem);
			constraints::symmetric_backhaul(graph,&vars,&mut problem);
			constraints::p2mp(graph,&vars,&cconfig,&mut problem);
			constraints::deployment_geometry(graph,&vars,&cconfig,&mut problem);
			constraints::co_location(graph,&vars,&mut problem);

			let mut coverage = LinExpr::default();
			for demand in graph.demand_sites.values()
			{
				if let Some(phi) = vars.get(&VarKey::Shortfall(demand.id))
				{
					coverage.add_term(phi,1.0);
				}
			}
			problem.add_constraint(crate::milp::Constraint::new(coverage,Sense::Le,LinExpr::constant((1.0-gamma)*total_demand),"coverage_floor"));

			let mut cost = LinExpr::default();
			for site in graph.sites.values()
			{
				if let Some(s) = vars.get(&VarKey::SiteSelected(site.id))
				{
					cost.add_term(s,super::super::site_cost(graph,devices,config,site.id));
				}
			}
			for sector in graph.sectors.values()
			{
				for c in 0..config.number_of_channels.max(1)
				{
					if let Some(sigma) = vars.get(&VarKey::SectorActive(sector.id,c))
					{
						cost.add_term(sigma,config.default_sector_capex);
					}
				}
			}
			problem.objective = Objective{ sense: ObjectiveSense::Minimize, expr: cost };

			match solver.solve(&problem,&options)
			{
				SolveOutcome::Infeasible => None,
				other => other.values().map(|values|(values.clone(),vars)),
			}
		});

		match outcome
		{
			RelaxationOutcome::Resolved{ value: (values,vars), gamma } =>
			{
				let mut topology = topology;
				super::super::apply_solution(graph,&values,&vars,&mut topology);
				Ok((topology,gamma))
			}
			RelaxationOutcome::Exhausted => Err(PlannerError::Infeasible{
				phase: "min_cost_base_network".into(),
				detail: "no feasible base network even at gamma = 0".into(),
			}),
		}
	}
}

///Phase 4: redundancy (spec.md §4.7 step 4). `ENABLE_LEGACY_REDUNDANCY_METHOD`
///picks between a simple connectivity-based augmentation over the already
///selected topology, and a min-cost-with-redundancy two-phase LP that reuses
///the `Flow`/`Shortfall` variable families under the chosen
///[`crate::config::RedundancyLevel`]'s capacity caps rather than the spec's
///separate `f_{i,j,δ}` duplicate-path family (see DESIGN.md).
pub mod redundancy
{
	use super::*;
	use crate::policies::cap_from_shortage;

	pub fn run(
		graph:&CandidateGraph,
		devices:&BTreeMap<String,Device>,
		config:&PlannerConfig,
		thresholds:&BTreeMap<u32,f64>,
		big_m:f64,
		solver:&dyn SolverBackend,
		topology:TopologyState,
		connected_demand_ids:&BTreeSet<EntityId>,
	) -> Result<TopologyState, PlannerError>
	{
		if config.enable_legacy_redundancy_method
		{
			Ok(legacy_augmentation(graph,topology))
		}
		else
		{
			min_cost_with_redundancy(graph,devices,config,thresholds,big_m,solver,topology,connected_demand_ids)
		}
	}

	///For every DN with exactly one selected backhaul parent, attempts to add
	///one more candidate backhaul link to a distinct parent site, so a single
	///link failure ("adversarial link", spec.md GLOSSARY) cannot disconnect it.
	fn legacy_augmentation(graph:&CandidateGraph, mut topology:TopologyState) -> TopologyState
	{
		let selected_backhaul_parents: BTreeMap<EntityId,Vec<EntityId>> = {
			let mut m: BTreeMap<EntityId,Vec<EntityId>> = BTreeMap::new();
			for link in graph.links.values()
			{
				if link.kind==crate::graph::LinkKind::Backhaul && topology.link_mcs_class.contains_key(&link.id) && topology.is_selected(&link.to)
				{
					m.entry(link.to).or_default().push(link.from);
				}
			}
			m
		};

		for site in graph.sites.values()
		{
			if site.site_type != SiteType::Dn || !topology.is_selected(&site.id)
			{
				continue;
			}
			let parents = selected_backhaul_parents.get(&site.id).cloned().unwrap_or_default();
			if parents.len() != 1
			{
				continue;
			}
			let existing_parent = parents[0];
			let mut alternatives: Vec<&crate::graph::Link> = graph.links_to(&site.id)
				.filter(|l|l.kind==crate::graph::LinkKind::Backhaul && l.from != existing_parent && !topology.link_mcs_class.contains_key(&l.id))
				.collect();
			alternatives.sort_by(|a,b|a.distance_m.partial_cmp(&b.distance_m).unwrap_or(std::cmp::Ordering::Equal).then_with(||a.id.cmp(&b.id)));

			if let Some(link) = alternatives.into_iter().find(|l|l.best_capacity_mbps() > 0.0)
			{
				topology.site_flags.insert(link.from,SelectionFlag::Proposed);
				topology.link_mcs_class.insert(link.id, link.capacity_by_mcs.keys().copied().max().unwrap_or(0));
				topology.sector_channel.entry(link.from_sector).or_insert(0);
				topology.sector_channel.entry(link.to_sector).or_insert(0);
			}
		}
		topology
	}

	fn min_cost_with_redundancy(
		graph:&CandidateGraph,
		devices:&BTreeMap<String,Device>,
		config:&PlannerConfig,
		thresholds:&BTreeMap<u32,f64>,
		big_m:f64,
		solver:&dyn SolverBackend,
		topology:TopologyState,
		connected_demand_ids:&BTreeSet<EntityId>,
	) -> Result<TopologyState, PlannerError>
	{
		let keep = super::super::prune::prune_candidate_links(graph);
		let pruned = restrict_to_links(graph,&keep);

		let (pop_cap,_dn_cap,_sink_cap) = config.redundancy_level.capacities_gbps();
		let options = solve_options(config,"redundancy");

		let cconfig = |big_m:f64| ConstraintConfig{
			num_channels: config.number_of_channels,
			pop_capacity_gbps: pop_cap,
			big_m,
			dn_dn_link_limit: config.dn_dn_link_limit,
			dn_total_link_limit: config.dn_total_link_limit,
			diff_sector_angle_limit_deg: config.diff_sector_angle_limit_deg,
			near_far_angle_limit_deg: config.near_far_angle_limit_deg,
			near_far_length_ratio: config.near_far_length_ratio,
			sinr_inverse_thresholds: thresholds.clone(),
			noise_power_mw: crate::radio::dbm_to_mw(config.thermal_noise_power_dbm+config.noise_figure_db),
		};

		//First LP: minimize total shortfall alone under the redundancy caps.
		let (mut p1, v1) = new_problem(&pruned, config.number_of_channels, pop_cap);
		let c1 = cconfig(0.0);
		constraints::flow_balance(&pruned,&v1,&c1,&mut p1);
		constraints::flow_capacity(&pruned,&v1,&c1,&mut p1);
		constraints::flow_site_gating(&pruned,&v1,&c1,&mut p1);
		constraints::p2mp(&pruned,&v1,&c1,&mut p1);
		constraints::co_location(&pruned,&v1,&mut p1);
		let mut shortage_objective = LinExpr::default();
		for demand in pruned.demand_sites.values()
		{
			if let Some(phi) = v1.get(&VarKey::Shortfall(demand.id))
			{
				shortage_objective.add_term(phi,1.0);
			}
		}
		p1.objective = Objective{ sense: ObjectiveSense::Minimize, expr: shortage_objective };
		let outcome1 = solver.solve(&p1,&options);
		let values1 = outcome1.values().ok_or_else(||PlannerError::Infeasible{
			phase: "redundancy".into(),
			detail: "shortage-minimization stage found no feasible flow under the redundancy capacity caps".into(),
		})?;
		let mut interim = TopologyState::new();
		super::super::apply_solution(&pruned,values1,&v1,&mut interim);
		let cap = cap_from_shortage(&interim.demand_shortfall);

		//Second LP: minimize cost subject to that fixed shortage cap.
		let (mut p2, v2) = new_problem(&pruned, config.number_of_channels, pop_cap);
		let c2 = cconfig(big_m);
		constraints::flow_balance(&pruned,&v2,&c2,&mut p2);
		constraints::flow_capacity(&pruned,&v2,&c2,&mut p2);
		constraints::flow_site_gating(&pruned,&v2,&c2,&mut p2);
		constraints::polarity_gating(&pruned,&v2,&c2,true,&mut p2);
		constraints::time_division(&pruned,&v2,&c2,&mut p2);
		constraints::sector_node_coupling(&pruned,&v2,&c2,&mut p2);
		constraints::symmetric_backhaul(&pruned,&v2,&mut p2);
		constraints::p2mp(&pruned,&v2,&c2,&mut p2);
		constraints::deployment_geometry(&pruned,&v2,&c2,&mut p2);
		constraints::co_location(&pruned,&v2,&mut p2);

		let mut shortfall_expr = LinExpr::default();
		for demand in pruned.demand_sites.values()
		{
			if let Some(phi) = v2.get(&VarKey::Shortfall(demand.id))
			{
				shortfall_expr.add_term(phi,1.0);
			}
		}
		p2.add_constraint(crate::milp::Constraint::new(shortfall_expr,Sense::Le,LinExpr::constant(cap.total_shortfall_gbps+1e-6),"redundancy_shortage_cap"));

		let mut cost = LinExpr::default();
		for site in pruned.sites.values()
		{
			if let Some(s) = v2.get(&VarKey::SiteSelected(site.id))
			{
				cost.add_term(s,super::super::site_cost(&pruned,devices,config,site.id));
			}
		}
		p2.objective = Objective{ sense: ObjectiveSense::Minimize, expr: cost };

		let outcome2 = solver.solve(&p2,&options);
		let values2 = outcome2.values().ok_or_else(||PlannerError::Infeasible{
			phase: "redundancy".into(),
			detail: "cost-minimization stage found no feasible network honoring the fixed shortage cap".into(),
		})?.clone();

		let mut topology = topology;
		super::super::apply_solution(&pruned,&values2,&v2,&mut topology);
		Ok(topology)
	}

	fn restrict_to_links(graph:&CandidateGraph, keep:&BTreeSet<EntityId>) -> CandidateGraph
	{
		let mut out = graph.clone();
		out.links.retain(|id,_|keep.contains(id));
		out
	}
}

///Phase 5: interference minimization (spec.md §4.7 step 5), the final and
///most complete LP/MILP build: every constraint family, plus an objective
///that starts at max-min β when `MAXIMIZE_COMMON_BANDWIDTH` is set and falls
///back to weighted coverage, per [`crate::policies::InterferenceObjective`],
///if that first attempt is infeasible.
pub mod interference_minimization
{
	use super::*;
	use crate::policies::InterferenceObjective;

	pub fn run(
		graph:&CandidateGraph,
		_devices:&BTreeMap<String,Device>,
		config:&PlannerConfig,
		thresholds:&BTreeMap<u32,f64>,
		big_m:f64,
		solver:&dyn SolverBackend,
		mut topology:TopologyState,
	) -> Result<TopologyState, PlannerError>
	{
		let options = solve_options(config,"interference_minimization");
		let mut objective_kind = InterferenceObjective::initial(config.maximize_common_bandwidth);

		loop
		{
			let (mut problem, vars) = new_problem(graph, config.number_of_channels, config.effective_pop_capacity_gbps());
			let cconfig = ConstraintConfig{
				num_channels: config.number_of_channels,
				pop_capacity_gbps: config.effective_pop_capacity_gbps(),
				big_m,
				dn_dn_link_limit: config.dn_dn_link_limit,
				dn_total_link_limit: config.dn_total_link_limit,
				diff_sector_angle_limit_deg: config.diff_sector_angle_limit_deg,
				near_far_angle_limit_deg: config.near_far_angle_limit_deg,
				near_far_length_ratio: config.near_far_length_ratio,
				sinr_inverse_thresholds: thresholds.clone(),
				noise_power_mw: crate::radio::dbm_to_mw(config.thermal_noise_power_dbm+config.noise_figure_db),
			};

			constraints::flow_balance(graph,&vars,&cconfig,&mut problem);
			constraints::flow_capacity(graph,&vars,&cconfig,&mut problem);
			constraints::flow_site_gating(graph,&vars,&cconfig,&mut problem);
			constraints::polarity_gating(graph,&vars,&cconfig,true,&mut problem);
			constraints::time_division(graph,&vars,&cconfig,&mut problem);
			constraints::sector_node_coupling(graph,&vars,&cconfig,&mut problem);
			constraints::symmetric_backhaul(graph,&vars,&mut problem);
			constraints::p2mp(graph,&vars,&cconfig,&mut problem);
			constraints::deployment_geometry(graph,&vars,&cconfig,&mut problem);
			constraints::co_location(graph,&vars,&mut problem);
			constraints::sinr_mcs_classification(graph,&vars,&cconfig,&mut problem);
			constraints::chi_linearization(graph,&vars,&cconfig,&mut problem);

			match objective_kind
			{
				InterferenceObjective::MaxMinBandwidth =>
				{
					let beta_id = VarId(problem.variables.len());
					let upper_beta = graph.demand_sites.values().map(|d|d.demand_gbps).fold(0.0,f64::max).max(1e-6);
					problem.variables.push(VarDef{ key: VarKey::Beta, domain: VarDomain::continuous(0.0,upper_beta), name: "beta".into() });
					for demand in graph.demand_sites.values()
					{
						let Some(phi) = vars.get(&VarKey::Shortfall(demand.id)) else { continue };
						let guaranteed = LinExpr::constant(demand.demand_gbps) - LinExpr::term(phi,1.0);
						problem.add_constraint(crate::milp::Constraint::new(LinExpr::term(beta_id,1.0),Sense::Le,guaranteed,format!("beta_le_demand_{}",demand.id)));
					}
					problem.objective = Objective{ sense: ObjectiveSense::Maximize, expr: LinExpr::term(beta_id,1.0) };
				}
				InterferenceObjective::WeightedCoverage =>
				{
					let mut expr = LinExpr::default();
					for demand in graph.demand_sites.values()
					{
						if let Some(phi) = vars.get(&VarKey::Shortfall(demand.id))
						{
							expr = expr + (LinExpr::constant(demand.demand_gbps) - LinExpr::term(phi,1.0))*1000.0;
						}
					}
					for link in graph.links.values()
					{
						if let Some(l) = vars.get(&VarKey::LinkSelected(link.id))
						{
							let weight = 1.0/(1.0+link.distance_m/1000.0);
							expr = expr - LinExpr::term(l,weight);
						}
					}
					problem.objective = Objective{ sense: ObjectiveSense::Maximize, expr };
				}
			}

			match solver.solve(&problem,&options)
			{
				SolveOutcome::Infeasible =>
				{
					if objective_kind == InterferenceObjective::WeightedCoverage
					{
						return Err(PlannerError::Infeasible{
							phase: "interference_minimization".into(),
							detail: "infeasible even after dropping the max-min bandwidth guarantee".into(),
						});
					}
					objective_kind = objective_kind.fallback();
					continue;
				}
				outcome =>
				{
					let values = outcome.values().ok_or_else(||PlannerError::Infeasible{
						phase: "interference_minimization".into(),
						detail: "solver produced no usable solution".into(),
					})?.clone();
					super::super::apply_solution(graph,&values,&vars,&mut topology);
					return Ok(topology);
				}
			}
		}
	}
}
