/*!

Deterministic variable enumeration (spec.md §4.5 "Variables", §5 "every
variable ... is in canonical deterministic order derived from stable ids").

One [`VariableSet`] is built once per phase from the current
[`crate::graph::CandidateGraph`]/[`crate::graph::TopologyState`] and a
channel count; phases that don't need a given family simply never reference
those [`VarId`]s, they still exist in the [`crate::milp::Problem`] but with
no constraint touching them is harmless for an LP/MILP solve.

*/

use std::collections::BTreeMap;

use crate::graph::{CandidateGraph, EntityId, LinkKind};

use super::{Problem, VarDef, VarDomain, VarId};

///Keys every variable family from spec.md §4.5 can be looked up by. Variants
///are named after the spec's math notation in comments for traceability.
#[derive(Debug,Clone,Copy,PartialEq,Eq,PartialOrd,Ord,Hash)]
pub enum VarKey
{
	///s_i: site selected.
	SiteSelected(EntityId),
	///σ_{i,k,c}: sector k (identified directly by its own id) active on channel c.
	SectorActive(EntityId,u32),
	///ℓ_{i,j}: link selected.
	LinkSelected(EntityId),
	///p_i: site polarity (POP/DN only).
	Polarity(EntityId),
	///f_{i,j}: flow on link.
	Flow(EntityId),
	///τ_{i,j,c}: time-division share per channel.
	TimeDivision(EntityId,u32),
	///φ_i: demand shortfall.
	Shortfall(EntityId),
	///μ_{i,j,c,m}: link operates in MCS class m on channel c.
	McsClass(EntityId,u32,u32),
	///χ_{i,k,l,c}: linearization of τ_{k,l,c}·[polarity_i = polarity_k], for victim
	///site i and interferer link (k,l) on channel c.
	ChiLinearization(EntityId,EntityId,u32),
	///ζ_{i,j,c}: "deployment link on channel c" auxiliary.
	DeploymentChannel(EntityId,u32),
	///β: the common-bandwidth objective the Flow Analyzer (spec.md §4.8) and
	///the interference-minimization phase's max-min variant both maximize.
	Beta,
}

///A fully enumerated, ordered set of variables for one MILP/LP build,
///indexed by [`VarKey`] for O(log n) lookup while constraints are assembled.
#[derive(Debug,Clone,Default)]
pub struct VariableSet
{
	index: BTreeMap<VarKey,VarId>,
}

impl VariableSet
{
	pub fn get(&self, key:&VarKey) -> Option<VarId>
	{
		self.index.get(key).copied()
	}

	fn insert(&mut self, problem:&mut Problem, key:VarKey, domain:VarDomain, name:String) -> VarId
	{
		let id = VarId(problem.variables.len());
		problem.variables.push(VarDef{ key, domain, name });
		self.index.insert(key,id);
		id
	}
}

///Knobs that decide *bounds*, not which keys exist: every family is always
///enumerated over the graph's full extent, since an unused variable with no
///incident constraint costs the solver nothing but keeps every phase's
///[`VariableSet`] structurally identical (spec.md §9: "a single mutable
///Topology handed between phases").
#[derive(Debug,Clone)]
pub struct VariableConfig
{
	pub num_channels: u32,
	pub pop_capacity_gbps: f64,
}

///Enumerates every variable family from spec.md §4.5 over `graph`, in the
///order the spec lists them, each family internally sorted by key.
pub fn enumerate_variables(graph:&CandidateGraph, config:&VariableConfig, problem:&mut Problem) -> VariableSet
{
	let mut vars = VariableSet::default();
	let channels: Vec<u32> = (0..config.num_channels.max(1)).collect();

	for site in graph.sites.values()
	{
		vars.insert(problem, VarKey::SiteSelected(site.id), VarDomain::Binary, format!("s_{}",site.id));
	}

	for sector in graph.sectors.values()
	{
		for &c in &channels
		{
			vars.insert(problem, VarKey::SectorActive(sector.id,c), VarDomain::Binary, format!("sigma_{}_{c}",sector.id));
		}
	}

	for link in graph.links.values()
	{
		vars.insert(problem, VarKey::LinkSelected(link.id), VarDomain::Binary, format!("l_{}",link.id));
	}

	for site in graph.sites.values()
	{
		if matches!(site.site_type, crate::graph::SiteType::Pop|crate::graph::SiteType::Dn)
		{
			vars.insert(problem, VarKey::Polarity(site.id), VarDomain::Binary, format!("p_{}",site.id));
		}
	}

	for link in graph.links.values()
	{
		let cap = link.best_capacity_mbps()/1000.0; //Mbps -> Gbps
		vars.insert(problem, VarKey::Flow(link.id), VarDomain::continuous(0.0,cap.max(0.0)), format!("f_{}",link.id));
	}

	for link in graph.links.values()
	{
		for &c in &channels
		{
			vars.insert(problem, VarKey::TimeDivision(link.id,c), VarDomain::continuous(0.0,1.0), format!("tau_{}_{c}",link.id));
		}
	}

	for demand in graph.demand_sites.values()
	{
		vars.insert(problem, VarKey::Shortfall(demand.id), VarDomain::continuous(0.0,demand.demand_gbps), format!("phi_{}",demand.id));
	}

	for link in graph.links.values()
	{
		for &c in &channels
		{
			for &mcs in link.capacity_by_mcs.keys()
			{
				vars.insert(problem, VarKey::McsClass(link.id,c,mcs), VarDomain::Binary, format!("mu_{}_{c}_{mcs}",link.id));
			}
		}
	}

	//χ is only meaningful between links that can actually interfere, i.e. share
	//an endpoint's visibility per spec.md §4.3; enumerating it over every
	//(site, link) pair would blow up the problem for no benefit, so this uses
	//the same adjacency test the radio model applies before computing
	//interference at all.
	for victim in graph.links.values()
	{
		for interferer in graph.links.values()
		{
			if interferer.id == victim.id
			{
				continue;
			}
			if interferer.to != victim.to
			{
				continue;
			}
			for &c in &channels
			{
				vars.insert(problem, VarKey::ChiLinearization(victim.from,interferer.id,c), VarDomain::continuous(0.0,1.0), format!("chi_{}_{}_{c}",victim.from,interferer.id));
			}
		}
	}

	for link in graph.links.values()
	{
		if link.kind == LinkKind::Backhaul
		{
			for &c in &channels
			{
				vars.insert(problem, VarKey::DeploymentChannel(link.id,c), VarDomain::Binary, format!("zeta_{}_{c}",link.id));
			}
		}
	}

	vars
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::graph::{Link, LinkKind, Site, SiteType};
	use crate::milp::{Objective, ObjectiveSense, LinExpr};
	use std::collections::BTreeMap;

	fn tiny_graph() -> CandidateGraph
	{
		let mut graph = CandidateGraph::new();
		let a = Site::compute_id(0.0,0.0,0.0,SiteType::Dn,Some("DN-1"));
		let b = Site::compute_id(1.0,0.0,0.0,SiteType::Dn,Some("DN-1"));
		graph.sites.insert(a, Site{ id:a, position: crate::geometry::Point3::new(0.0,0.0,0.0), site_type: SiteType::Dn, building_id: None, device_sku: Some("DN-1".into()), number_of_subscribers: None });
		graph.sites.insert(b, Site{ id:b, position: crate::geometry::Point3::new(1.0,0.0,0.0), site_type: SiteType::Dn, building_id: None, device_sku: Some("DN-1".into()), number_of_subscribers: None });
		let link_id = Link::compute_id(&a,&b);
		let mut capacity_by_mcs = BTreeMap::new();
		capacity_by_mcs.insert(1,1000.0);
		graph.links.insert(link_id, Link{
			id: link_id, from: a, to: b, from_sector: a, to_sector: b,
			kind: LinkKind::Backhaul, distance_m: 100.0, azimuth_deg: 0.0, elevation_deg: 0.0,
			from_deviation_deg: 0.0, to_deviation_deg: 0.0, rsl_dbm: -50.0,
			capacity_by_mcs, confidence: 1.0,
		});
		graph
	}

	#[test]
	fn enumeration_is_stable_across_two_independent_calls()
	{
		let graph = tiny_graph();
		let config = VariableConfig{ num_channels: 1, pop_capacity_gbps: 10.0 };

		let mut p1 = Problem::new(Objective{ sense: ObjectiveSense::Minimize, expr: LinExpr::constant(0.0) });
		let vars1 = enumerate_variables(&graph,&config,&mut p1);

		let mut p2 = Problem::new(Objective{ sense: ObjectiveSense::Minimize, expr: LinExpr::constant(0.0) });
		let vars2 = enumerate_variables(&graph,&config,&mut p2);

		let names1: Vec<&str> = p1.variables.iter().map(|v|v.name.as_str()).collect();
		let names2: Vec<&str> = p2.variables.iter().map(|v|v.name.as_str()).collect();
		assert_eq!(names1,names2);
		assert_eq!(vars1.index.len(), vars2.index.len());
	}

	#[test]
	fn site_selected_variable_exists_for_every_site()
	{
		let graph = tiny_graph();
		let config = VariableConfig{ num_channels: 2, pop_capacity_gbps: 10.0 };
		let mut problem = Problem::new(Objective{ sense: ObjectiveSense::Minimize, expr: LinExpr::constant(0.0) });
		let vars = enumerate_variables(&graph,&config,&mut problem);
		for site in graph.sites.values()
		{
			assert!(vars.get(&VarKey::SiteSelected(site.id)).is_some());
		}
	}
}
