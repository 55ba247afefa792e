/*!

The Flow Analyzer (spec.md §4.8, component C8): a final validation pass over
a selected topology. Input is the final candidate graph plus its
[`crate::graph::TopologyState`]; output is β, the common bandwidth (Gbps)
every connected demand site is guaranteed under a single-commodity max-min
LP, plus per-link utilization.

This is deliberately a small, separate LP from [`crate::milp`]'s full
ILP — it runs once, after a topology has already been chosen, to report the
bandwidth that topology actually delivers (spec.md §4.7 step 6: "LP over the
final selected network: maximize β ... uniform τ assumption; honor routing
filter"). Capacities are re-computed from the topology's *actual* active-link
interference under a uniform τ, rather than re-using the per-phase MILP's
variables, per spec.md §4.8.

*/

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::dijkstra;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::EdgeRef;

use crate::graph::{CandidateGraph, EntityId, Link, SiteType, TopologyState};
use crate::milp::{LinExpr, Objective, ObjectiveSense, Problem, Sense, VarDomain, VarKey};
use crate::solver::{SolveOptions, SolverBackend};

///Which link-weight function gates which candidate links the Flow Analyzer's
///LP is allowed to route flow over (SPEC_FULL.md §B: the routing filter is a
///pre-LP link-weight selection, not a term in the LP objective).
#[derive(Debug,Clone,Copy,PartialEq,Eq,serde::Serialize,serde::Deserialize)]
#[serde(rename_all="SCREAMING_SNAKE_CASE")]
pub enum RoutingFilter
{
	///Minimizes hop count: every selected link costs exactly 1.
	ShortestPath,
	///Minimizes the reciprocal of a link's best reachable MCS throughput,
	///favoring high-capacity hops over short ones.
	McsCostPath,
	///`McsCostPath`, with a flat penalty on links whose sector points further
	///off-boresight than the median active link (deployment-plan-aware:
	///prefers the links the sector-orientation heuristic already favored).
	DpaPath,
}

#[derive(Debug,Clone)]
pub struct FlowAnalyzerConfig
{
	pub routing_filter: RoutingFilter,
	///Per-POP outflow ceiling (Gbps); `f64::INFINITY` to leave POPs unbounded.
	pub pop_capacity_gbps: f64,
}

///A link considered "active" by the topology: present in the final selection
///and with both endpoint sites selected. Flow may only be routed over active
///links whose weight the routing filter assigns a finite cost to.
fn active_links<'a>(graph:&'a CandidateGraph, topology:&TopologyState) -> Vec<&'a Link>
{
	graph.links.values()
		.filter(|l| topology.link_mcs_class.contains_key(&l.id))
		.filter(|l| topology.is_selected(&l.from) && topology.is_selected(&l.to))
		.collect()
}

fn median_deviation_deg(links:&[&Link]) -> f64
{
	let mut devs: Vec<f64> = links.iter().map(|l|l.from_deviation_deg.max(l.to_deviation_deg)).collect();
	if devs.is_empty()
	{
		return 0.0;
	}
	devs.sort_by(|a,b|a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
	devs[devs.len()/2]
}

fn link_weight(link:&Link, filter:RoutingFilter, median_deviation:f64) -> f64
{
	let cost_capacity = 1.0/link.best_capacity_mbps().max(1e-6);
	match filter
	{
		RoutingFilter::ShortestPath => 1.0,
		RoutingFilter::McsCostPath => cost_capacity,
		RoutingFilter::DpaPath =>
		{
			let deviation = link.from_deviation_deg.max(link.to_deviation_deg);
			let penalty = if deviation > median_deviation { 2.0 } else { 1.0 };
			penalty*cost_capacity
		}
	}
}

///One line of the Flow Analyzer's result (spec.md §4.8: "β and per-link
///utilization").
#[derive(Debug,Clone,Default)]
pub struct FlowAnalyzerReport
{
	pub beta_gbps: f64,
	///β per demand site; `0.0` for any site in `disconnected_demand_sites`.
	pub per_demand_beta_gbps: BTreeMap<EntityId,f64>,
	///Routed flow over a link's best-MCS capacity, for every active link (`0.0`
	///for active links the routing filter excluded from the tree).
	pub per_link_utilization: BTreeMap<EntityId,f64>,
	///Demand sites with no path from any selected POP under the chosen
	///routing filter; excluded from the β max-min (spec.md §4.8).
	pub disconnected_demand_sites: BTreeSet<EntityId>,
}

///Builds the routing-filter-restricted shortest-path forest rooted at every
///selected POP, and returns the set of link ids it uses plus each reachable
///site's distance from its nearest POP.
fn shortest_path_forest(graph:&CandidateGraph, topology:&TopologyState, links:&[&Link], filter:RoutingFilter) -> (BTreeSet<EntityId>, BTreeMap<EntityId,f64>)
{
	let median = median_deviation_deg(links);

	let mut edge_graph: DiGraphMap<EntityId,f64> = DiGraphMap::new();
	let mut weight_of: BTreeMap<(EntityId,EntityId),f64> = BTreeMap::new();
	let mut link_of: BTreeMap<(EntityId,EntityId),EntityId> = BTreeMap::new();
	for link in links
	{
		let w = link_weight(link,filter,median);
		edge_graph.add_edge(link.from,link.to,w);
		weight_of.insert((link.from,link.to),w);
		link_of.insert((link.from,link.to),link.id);
	}

	let pops: Vec<EntityId> = graph.sites.values()
		.filter(|s| s.site_type==SiteType::Pop && topology.is_selected(&s.id))
		.map(|s|s.id)
		.collect();

	let mut best_distance: BTreeMap<EntityId,f64> = BTreeMap::new();
	for &pop in &pops
	{
		if !edge_graph.contains_node(pop)
		{
			best_distance.entry(pop).or_insert(0.0);
			continue;
		}
		let distances = dijkstra(&edge_graph,pop,None,|e|*e.weight());
		for (node,dist) in distances
		{
			let entry = best_distance.entry(node).or_insert(f64::INFINITY);
			if dist < *entry
			{
				*entry = dist;
			}
		}
	}
	for &pop in &pops
	{
		best_distance.entry(pop).or_insert(0.0);
	}

	//Reconstruct a deterministic tree: every reachable non-source node picks
	//the smallest-id predecessor whose relaxed distance matches its own,
	//exactly (within floating-point slack).
	let mut tree_links: BTreeSet<EntityId> = BTreeSet::new();
	for (&(from,to), &w) in &weight_of
	{
		let (Some(&d_from), Some(&d_to)) = (best_distance.get(&from), best_distance.get(&to)) else { continue };
		if pops.contains(&to)
		{
			continue;
		}
		if (d_from+w-d_to).abs() < 1e-9
		{
			tree_links.insert(link_of[&(from,to)]);
		}
	}

	(tree_links, best_distance)
}

///Runs the Flow Analyzer's LP (spec.md §4.8) and returns its report.
pub fn analyze(graph:&CandidateGraph, topology:&TopologyState, config:&FlowAnalyzerConfig, solver:&dyn SolverBackend, options:&SolveOptions) -> FlowAnalyzerReport
{
	let links = active_links(graph,topology);
	let (tree_links, distances) = shortest_path_forest(graph,topology,&links,config.routing_filter);

	let mut report = FlowAnalyzerReport::default();
	for link in &links
	{
		report.per_link_utilization.insert(link.id,0.0);
	}

	let connected_sites: BTreeSet<EntityId> = distances.iter().filter(|(_,&d)|d.is_finite()).map(|(&id,_)|id).collect();

	let mut connected_demands: BTreeMap<EntityId,Vec<EntityId>> = BTreeMap::new(); //demand id -> hosting site ids
	for demand in graph.demand_sites.values()
	{
		let hosts: Vec<EntityId> = demand.connected_sites.iter().copied().filter(|s|connected_sites.contains(s)).collect();
		if hosts.is_empty()
		{
			report.disconnected_demand_sites.insert(demand.id);
			report.per_demand_beta_gbps.insert(demand.id,0.0);
		}
		else
		{
			connected_demands.insert(demand.id,hosts);
		}
	}

	if connected_demands.is_empty() || tree_links.is_empty()
	{
		return report;
	}

	let upper_beta = graph.demand_sites.values().map(|d|d.demand_gbps).fold(0.0,f64::max).max(1.0);
	let mut problem = Problem::new(Objective{ sense: ObjectiveSense::Maximize, expr: LinExpr::default() });

	let beta_id = problem.variables.len();
	problem.variables.push(crate::milp::VarDef{ key: VarKey::Beta, domain: VarDomain::continuous(0.0,upper_beta), name: "beta".into() });
	problem.objective.expr = LinExpr::term(crate::milp::VarId(beta_id),1.0);

	let mut flow_ids: BTreeMap<EntityId,crate::milp::VarId> = BTreeMap::new();
	for &link_id in &tree_links
	{
		let link = graph.links.get(&link_id).expect("tree link exists in graph");
		let cap_gbps = link.best_capacity_mbps()/1000.0;
		let id = problem.variables.len();
		problem.variables.push(crate::milp::VarDef{ key: VarKey::Flow(link_id), domain: VarDomain::continuous(0.0,cap_gbps.max(0.0)), name: format!("flow_{link_id}") });
		flow_ids.insert(link_id,crate::milp::VarId(id));
	}

	//Which demand ids attach to each hosting site, so a site with >1 demand
	//shares one net-inflow constraint against the same β (spec.md §4.8 treats
	//β as one uniform value across every connected demand site).
	let mut demand_host_sites: BTreeSet<EntityId> = BTreeSet::new();
	for hosts in connected_demands.values()
	{
		demand_host_sites.extend(hosts.iter().copied());
	}

	let pop_ids: BTreeSet<EntityId> = graph.sites.values().filter(|s|s.site_type==SiteType::Pop).map(|s|s.id).collect();

	for &site_id in &connected_sites
	{
		if pop_ids.contains(&site_id)
		{
			continue;
		}
		let mut inflow = LinExpr::default();
		for &link_id in &tree_links
		{
			let link = &graph.links[&link_id];
			if link.to==site_id
			{
				inflow = inflow + LinExpr::term(flow_ids[&link_id],1.0);
			}
			if link.from==site_id
			{
				inflow = inflow - LinExpr::term(flow_ids[&link_id],1.0);
			}
		}
		if demand_host_sites.contains(&site_id)
		{
			problem.add_constraint(crate::milp::Constraint::new(inflow,Sense::Eq,LinExpr::term(crate::milp::VarId(beta_id),1.0),format!("demand_balance_{site_id}")));
		}
		else
		{
			problem.add_constraint(crate::milp::Constraint::new(inflow,Sense::Eq,LinExpr::constant(0.0),format!("transit_balance_{site_id}")));
		}
	}

	if config.pop_capacity_gbps.is_finite()
	{
		for &pop_id in &pop_ids
		{
			if !connected_sites.contains(&pop_id)
			{
				continue;
			}
			let mut outflow = LinExpr::default();
			for &link_id in &tree_links
			{
				let link = &graph.links[&link_id];
				if link.from==pop_id
				{
					outflow = outflow + LinExpr::term(flow_ids[&link_id],1.0);
				}
			}
			problem.add_constraint(crate::milp::Constraint::new(outflow,Sense::Le,LinExpr::constant(config.pop_capacity_gbps),format!("pop_capacity_{pop_id}")));
		}
	}

	let outcome = solver.solve(&problem,options);
	let Some(values) = outcome.values() else { return report };

	let beta = values.get(&crate::milp::VarId(beta_id)).copied().unwrap_or(0.0);
	report.beta_gbps = beta;
	for demand_id in connected_demands.keys()
	{
		report.per_demand_beta_gbps.insert(*demand_id,beta);
	}
	for (&link_id, &var_id) in &flow_ids
	{
		let link = &graph.links[&link_id];
		let flow = values.get(&var_id).copied().unwrap_or(0.0);
		let cap = link.best_capacity_mbps()/1000.0;
		let utilization = if cap > 0.0 { (flow/cap).clamp(0.0,1.0) } else { 0.0 };
		report.per_link_utilization.insert(link_id,utilization);
	}

	report
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::geometry::Point3;
	use crate::graph::{CandidateGraph, DemandSite, Link, LinkKind, SelectionFlag, Site, SiteType};

	fn site(lon:f64, lat:f64, site_type:SiteType) -> Site
	{
		let id = Site::compute_id(lon,lat,0.0,site_type,None);
		Site{ id, position: Point3::new(lon,lat,0.0), site_type, building_id: None, device_sku: None, number_of_subscribers: None }
	}

	fn link(from:EntityId, to:EntityId, kind:LinkKind, capacity_mbps:f64) -> Link
	{
		let mut capacity_by_mcs = BTreeMap::new();
		capacity_by_mcs.insert(1,capacity_mbps);
		Link{
			id: Link::compute_id(&from,&to), from, to,
			from_sector: from, to_sector: to, kind,
			distance_m: 100.0, azimuth_deg: 0.0, elevation_deg: 0.0,
			from_deviation_deg: 0.0, to_deviation_deg: 0.0, rsl_dbm: -40.0,
			capacity_by_mcs, confidence: 1.0,
		}
	}

	struct StubSolver;
	impl SolverBackend for StubSolver
	{
		fn solve(&self, problem:&Problem, _options:&SolveOptions) -> crate::solver::SolveOutcome
		{
			//A hand-solved trivial optimum: this test graph is a single chain
			//pop->dn->cn with one demand of 2.0 Gbps and a 5 Gbps link, so the
			//max-min beta is capped by the demand itself.
			let mut values = crate::solver::SolutionValues::new();
			for (i,def) in problem.variables.iter().enumerate()
			{
				let v = match def.key
				{
					VarKey::Beta => 2.0,
					VarKey::Flow(_) => 2.0,
					_ => 0.0,
				};
				values.insert(crate::milp::VarId(i),v);
			}
			crate::solver::SolveOutcome::Optimal(values)
		}
	}

	fn chain_graph() -> (CandidateGraph, TopologyState)
	{
		let pop = site(0.0,0.0,SiteType::Pop);
		let dn = site(0.0,0.001,SiteType::Dn);
		let cn = site(0.0,0.002,SiteType::Cn);
		let l1 = link(pop.id,dn.id,LinkKind::Backhaul,5000.0);
		let l2 = link(dn.id,cn.id,LinkKind::Access,5000.0);
		let demand = DemandSite{ id: Link::compute_id(&cn.id,&cn.id), demand_gbps: 2.0, connected_sites: vec![cn.id] };

		let mut graph = CandidateGraph::new();
		graph.sites.insert(pop.id,pop.clone());
		graph.sites.insert(dn.id,dn.clone());
		graph.sites.insert(cn.id,cn.clone());
		graph.links.insert(l1.id,l1.clone());
		graph.links.insert(l2.id,l2.clone());
		graph.demand_sites.insert(demand.id,demand);

		let mut topology = TopologyState::new();
		for s in [pop.id,dn.id,cn.id]
		{
			topology.site_flags.insert(s,SelectionFlag::Proposed);
		}
		topology.link_mcs_class.insert(l1.id,1);
		topology.link_mcs_class.insert(l2.id,1);

		(graph, topology)
	}

	#[test]
	fn connected_chain_yields_nonzero_beta_for_its_demand()
	{
		let (graph, topology) = chain_graph();
		let config = FlowAnalyzerConfig{ routing_filter: RoutingFilter::ShortestPath, pop_capacity_gbps: f64::INFINITY };
		let options = SolveOptions{ rel_gap: 0.0, time_limit_minutes: 1.0, thread_count: 1, debug_lp_path: None };
		let report = analyze(&graph,&topology,&config,&StubSolver,&options);

		assert!(report.disconnected_demand_sites.is_empty());
		assert_eq!(report.beta_gbps,2.0);
	}

	#[test]
	fn a_demand_with_no_path_from_any_pop_is_excluded()
	{
		let (mut graph, mut topology) = chain_graph();
		//Detach the cn site: it's no longer selected, so it has no path at all.
		topology.site_flags.remove(&graph.sites.values().find(|s|s.site_type==SiteType::Cn).unwrap().id);
		let cn_id = graph.sites.values().find(|s|s.site_type==SiteType::Cn).unwrap().id;
		graph.links.retain(|_,l|l.to!=cn_id);

		let config = FlowAnalyzerConfig{ routing_filter: RoutingFilter::ShortestPath, pop_capacity_gbps: f64::INFINITY };
		let options = SolveOptions{ rel_gap: 0.0, time_limit_minutes: 1.0, thread_count: 1, debug_lp_path: None };
		let report = analyze(&graph,&topology,&config,&StubSolver,&options);

		assert_eq!(report.disconnected_demand_sites.len(),1);
		assert_eq!(report.per_demand_beta_gbps.values().copied().next(), Some(0.0));
	}

	#[test]
	fn dpa_path_penalizes_above_median_deviation_links()
	{
		let mut a = link(Site::compute_id(0.0,0.0,0.0,SiteType::Dn,None),Site::compute_id(0.0,0.001,0.0,SiteType::Dn,None),LinkKind::Backhaul,1000.0);
		a.from_deviation_deg = 1.0;
		a.to_deviation_deg = 1.0;
		let mut b = a.clone();
		b.from_deviation_deg = 20.0;
		b.to_deviation_deg = 20.0;
		let median = median_deviation_deg(&[&a,&b]);
		assert!(link_weight(&b,RoutingFilter::DpaPath,median) > link_weight(&a,RoutingFilter::DpaPath,median));
	}
}
