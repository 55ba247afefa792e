/*!

Availability simulation (spec.md §6: "availability simulation knobs").
A seeded Monte Carlo pass over the final topology: each active link is
independently dropped with probability `1 - link_availability_percent/100`
per run, and a demand site counts as connected in that run if any of its
hosting sites still has a path from a selected POP. Running this
`AVAILABILITY_SIMULATION_RUNS` times under a fixed
`AVAILABILITY_SIMULATION_SEED` gives a per-demand connection probability,
independent of and complementary to the Flow Analyzer's single-run β report.

*/

use std::collections::BTreeMap;

use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::graph::{CandidateGraph, EntityId, SiteType, TopologyState};

#[derive(Debug,Clone,Copy)]
pub struct AvailabilityConfig
{
	pub link_availability_percent: f64,
	pub runs: u32,
	pub seed: u64,
}

#[derive(Debug,Clone,Default)]
pub struct AvailabilityReport
{
	pub per_demand_connection_probability: BTreeMap<EntityId,f64>,
	pub overall_connection_probability: f64,
}

///Runs the simulation. `runs == 0` disables it: every demand site already
///connected in the base (no-drop) topology reports probability 1.0.
pub fn simulate(graph:&CandidateGraph, topology:&TopologyState, config:&AvailabilityConfig) -> AvailabilityReport
{
	let active_links: Vec<&crate::graph::Link> = graph.links.values()
		.filter(|l| topology.link_mcs_class.contains_key(&l.id))
		.filter(|l| topology.is_selected(&l.from) && topology.is_selected(&l.to))
		.collect();

	let pops: Vec<EntityId> = graph.sites.values()
		.filter(|s| s.site_type==SiteType::Pop && topology.is_selected(&s.id))
		.map(|s|s.id)
		.collect();

	let mut report = AvailabilityReport::default();
	for demand in graph.demand_sites.values()
	{
		report.per_demand_connection_probability.insert(demand.id,0.0);
	}

	if config.runs == 0 || pops.is_empty()
	{
		return report;
	}

	let drop_probability = (1.0-config.link_availability_percent/100.0).clamp(0.0,1.0);
	let mut rng = StdRng::seed_from_u64(config.seed);
	let mut hits: BTreeMap<EntityId,u32> = BTreeMap::new();

	for _ in 0..config.runs
	{
		let mut run_graph: DiGraphMap<EntityId,()> = DiGraphMap::new();
		for &pop in &pops
		{
			run_graph.add_node(pop);
		}
		for link in &active_links
		{
			if rng.gen::<f64>() >= drop_probability
			{
				run_graph.add_edge(link.from,link.to,());
			}
		}

		for demand in graph.demand_sites.values()
		{
			let connected = demand.connected_sites.iter().any(|site|
				run_graph.contains_node(*site) &&
				pops.iter().any(|&pop| run_graph.contains_node(pop) && has_path_connecting(&run_graph,pop,*site,None))
			);
			if connected
			{
				*hits.entry(demand.id).or_insert(0) += 1;
			}
		}
	}

	let mut total_probability = 0.0;
	let demand_count = graph.demand_sites.len().max(1) as f64;
	for demand in graph.demand_sites.values()
	{
		let probability = hits.get(&demand.id).copied().unwrap_or(0) as f64 / config.runs as f64;
		report.per_demand_connection_probability.insert(demand.id,probability);
		total_probability += probability;
	}
	report.overall_connection_probability = total_probability/demand_count;

	report
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::geometry::Point3;
	use crate::graph::{DemandSite, Link, LinkKind, SelectionFlag, Site};

	fn chain() -> (CandidateGraph, TopologyState)
	{
		let pop = Site{ id: Site::compute_id(0.0,0.0,0.0,SiteType::Pop,None), position: Point3::new(0.0,0.0,0.0), site_type: SiteType::Pop, building_id: None, device_sku: None, number_of_subscribers: None };
		let cn = Site{ id: Site::compute_id(0.0,1.0,0.0,SiteType::Cn,None), position: Point3::new(0.0,1.0,0.0), site_type: SiteType::Cn, building_id: None, device_sku: None, number_of_subscribers: None };
		let mut capacity_by_mcs = BTreeMap::new();
		capacity_by_mcs.insert(1,1000.0);
		let link = Link{
			id: Link::compute_id(&pop.id,&cn.id), from: pop.id, to: cn.id, from_sector: pop.id, to_sector: cn.id,
			kind: LinkKind::Access, distance_m: 100.0, azimuth_deg: 0.0, elevation_deg: 0.0,
			from_deviation_deg: 0.0, to_deviation_deg: 0.0, rsl_dbm: -40.0, capacity_by_mcs, confidence: 1.0,
		};
		let demand = DemandSite{ id: Link::compute_id(&cn.id,&cn.id), demand_gbps: 1.0, connected_sites: vec![cn.id] };

		let mut graph = CandidateGraph::new();
		graph.sites.insert(pop.id,pop.clone());
		graph.sites.insert(cn.id,cn.clone());
		graph.links.insert(link.id,link.clone());
		graph.demand_sites.insert(demand.id,demand);

		let mut topology = TopologyState::new();
		topology.site_flags.insert(pop.id,SelectionFlag::Proposed);
		topology.site_flags.insert(cn.id,SelectionFlag::Proposed);
		topology.link_mcs_class.insert(link.id,1);

		(graph,topology)
	}

	#[test]
	fn perfect_availability_always_connects()
	{
		let (graph,topology) = chain();
		let config = AvailabilityConfig{ link_availability_percent: 100.0, runs: 20, seed: 1 };
		let report = simulate(&graph,&topology,&config);
		assert_eq!(report.overall_connection_probability, 1.0);
	}

	#[test]
	fn zero_runs_reports_zero_probability_everywhere()
	{
		let (graph,topology) = chain();
		let config = AvailabilityConfig{ link_availability_percent: 99.9, runs: 0, seed: 1 };
		let report = simulate(&graph,&topology,&config);
		assert!(report.per_demand_connection_probability.values().all(|&p|p==0.0));
	}

	#[test]
	fn same_seed_is_reproducible()
	{
		let (graph,topology) = chain();
		let config = AvailabilityConfig{ link_availability_percent: 50.0, runs: 50, seed: 7 };
		let a = simulate(&graph,&topology,&config);
		let b = simulate(&graph,&topology,&config);
		assert_eq!(a.overall_connection_probability, b.overall_connection_probability);
	}
}
