/*!

The twelve constraint families of spec.md §4.5, each implemented as a
function that appends [`crate::milp::Constraint`]s to a [`crate::milp::Problem`]
given the current [`crate::graph::CandidateGraph`] and [`VariableSet`].

Every family is independent and phases opt into the subset they need (spec.md
§4.7: "each phase consuming/producing topology state"); a phase that never
references a given family's variables simply never calls its builder.

*/

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::{CandidateGraph, EntityId, LinkKind, SiteType};

use super::{Constraint, LinExpr, Problem, Sense, VarKey, VariableSet};

///Parameters shared by several constraint families; mirrors the planner-wide
///configuration surface of spec.md §6, narrowed to what constraint-emission
///needs.
#[derive(Debug,Clone)]
pub struct ConstraintConfig
{
	pub num_channels: u32,
	pub pop_capacity_gbps: f64,
	pub big_m: f64,
	///P_D, default 2: DN-to-DN/POP links per DN sector.
	pub dn_dn_link_limit: u32,
	///P_T, default 15: total links per DN sector.
	pub dn_total_link_limit: u32,
	///α: minimum angle between two links from different sectors on one site.
	pub diff_sector_angle_limit_deg: f64,
	///θ, ρ: the near/far exception to α (spec.md §4.5 family 9).
	pub near_far_angle_limit_deg: f64,
	pub near_far_length_ratio: f64,
	///υ_m: SINR⁻¹ upper envelope threshold for MCS class m, ascending by class.
	pub sinr_inverse_thresholds: BTreeMap<u32,f64>,
	///N_p: effective thermal noise power at the receiver, in mW (thermal noise
	///power plus receiver noise figure, spec.md §4.3's `SNR = RSL − N_p − NF`,
	///converted out of dBm so it can sit in the same linear SINR⁻¹ numerator
	///as the interference terms of family 11).
	pub noise_power_mw: f64,
}

fn channels(config_channels:u32) -> Vec<u32>
{
	(0..config_channels.max(1)).collect()
}

fn var(vars:&VariableSet, key:VarKey) -> Option<LinExpr>
{
	vars.get(&key).map(|id|LinExpr::term(id,1.0))
}

///Family 1: flow balance. Net flow is zero at POP/DN/CN, `d_i - phi_i` at
///demand sites, and the implicit super-source feeds up to `POP_CAPACITY`
///per POP.
pub fn flow_balance(graph:&CandidateGraph, vars:&VariableSet, config:&ConstraintConfig, problem:&mut Problem)
{
	for site in graph.sites.values()
	{
		if site.site_type == SiteType::Demand
		{
			continue;
		}
		let mut net = LinExpr::default();
		for link in graph.links_from(&site.id)
		{
			if let Some(f) = var(vars,VarKey::Flow(link.id))
			{
				net = net + f;
			}
		}
		for link in graph.links_to(&site.id)
		{
			if let Some(f) = var(vars,VarKey::Flow(link.id))
			{
				net = net - f;
			}
		}
		if site.site_type == SiteType::Pop
		{
			if let Some(s) = var(vars,VarKey::SiteSelected(site.id))
			{
				let bound = s*config.pop_capacity_gbps;
				problem.add_constraint(Constraint::new(net,Sense::Le,bound,format!("flow_balance_pop_{}",site.id)));
				continue;
			}
		}
		problem.add_constraint(Constraint::new(net,Sense::Eq,LinExpr::constant(0.0),format!("flow_balance_{}",site.id)));
	}

	for demand in graph.demand_sites.values()
	{
		let mut incoming = LinExpr::default();
		for site_id in &demand.connected_sites
		{
			if let Some(link) = graph.links.values().find(|l|&l.to==site_id)
			{
				if let Some(f) = var(vars,VarKey::Flow(link.id))
				{
					incoming = incoming + f;
				}
			}
		}
		if let Some(phi) = var(vars,VarKey::Shortfall(demand.id))
		{
			let target = LinExpr::constant(demand.demand_gbps) - phi;
			problem.add_constraint(Constraint::new(incoming,Sense::Eq,target,format!("flow_balance_demand_{}",demand.id)));
		}
	}
}

impl std::ops::Mul<f64> for LinExpr
{
	type Output = LinExpr;
	fn mul(self, rhs:f64) -> LinExpr
	{
		let mut out = LinExpr::default();
		for (var,coef) in self.coefficients
		{
			out.coefficients.insert(var,coef*rhs);
		}
		out.constant = self.constant*rhs;
		out
	}
}

///Family 2: flow capacity. `f_ij <= Σ_c τ_{i,j,c}·t_{i,j}` and
///`f_ij <= Σ_{c,m} μ_{i,j,c,m}·throughput_m`.
pub fn flow_capacity(graph:&CandidateGraph, vars:&VariableSet, config:&ConstraintConfig, problem:&mut Problem)
{
	for link in graph.links.values()
	{
		let Some(f) = var(vars,VarKey::Flow(link.id)) else { continue };
		let capacity_gbps = link.best_capacity_mbps()/1000.0;

		let mut tau_capacity = LinExpr::default();
		for c in channels(config.num_channels)
		{
			if let Some(tau) = var(vars,VarKey::TimeDivision(link.id,c))
			{
				tau_capacity = tau_capacity + tau*capacity_gbps;
			}
		}
		problem.add_constraint(Constraint::new(f.clone(),Sense::Le,tau_capacity,format!("flow_cap_tau_{}",link.id)));

		let mut mcs_capacity = LinExpr::default();
		for c in channels(config.num_channels)
		{
			for (&mcs_class,&throughput_mbps) in &link.capacity_by_mcs
			{
				if let Some(mu) = var(vars,VarKey::McsClass(link.id,c,mcs_class))
				{
					mcs_capacity = mcs_capacity + mu*(throughput_mbps/1000.0);
				}
			}
		}
		problem.add_constraint(Constraint::new(f,Sense::Le,mcs_capacity,format!("flow_cap_mcs_{}",link.id)));
	}
}

///Family 3: flow-site gating. Incoming flow at a site is bounded by
///`M·s_i`: a site with no incoming flow need not be selected, but a selected
///site's incoming flow can never exceed the big-M bound regardless.
pub fn flow_site_gating(graph:&CandidateGraph, vars:&VariableSet, config:&ConstraintConfig, problem:&mut Problem)
{
	for site in graph.sites.values()
	{
		let Some(s) = var(vars,VarKey::SiteSelected(site.id)) else { continue };
		let mut incoming = LinExpr::default();
		for link in graph.links_to(&site.id)
		{
			if let Some(f) = var(vars,VarKey::Flow(link.id))
			{
				incoming = incoming + f;
			}
		}
		problem.add_constraint(Constraint::new(incoming,Sense::Le,s*config.big_m,format!("flow_gate_{}",site.id)));
	}
}

///Family 4: polarity proxy/gating. `use_link_variable` selects between the
///site-selection-phase proxy (gating on τ, since ℓ doesn't exist yet) and the
///link-selection-phase version (gating ℓ directly), per spec.md §4.5 family 4.
pub fn polarity_gating(graph:&CandidateGraph, vars:&VariableSet, config:&ConstraintConfig, use_link_variable:bool, problem:&mut Problem)
{
	for link in graph.links.values()
	{
		if link.kind != LinkKind::Backhaul
		{
			continue;
		}
		let Some(p_i) = var(vars,VarKey::Polarity(link.from)) else { continue };
		let Some(p_j) = var(vars,VarKey::Polarity(link.to)) else { continue };

		let gated = if use_link_variable
		{
			var(vars,VarKey::LinkSelected(link.id))
		}
		else
		{
			channels(config.num_channels).into_iter()
				.filter_map(|c|var(vars,VarKey::TimeDivision(link.id,c)))
				.reduce(|a,b|a+b)
		};
		let Some(gated) = gated else { continue };

		problem.add_constraint(Constraint::new(gated.clone(),Sense::Le,p_i.clone()+p_j.clone(),format!("polarity_lo_{}",link.id)));
		problem.add_constraint(Constraint::new(gated,Sense::Le,LinExpr::constant(2.0)-p_i-p_j,format!("polarity_hi_{}",link.id)));
	}
}

///Family 5: time-division. Per sector+channel, `Σ τ` over incident links
///`<= σ_{i,k,c}`; per link, `Σ_c τ_{i,j,c} <= ℓ_{i,j}`.
pub fn time_division(graph:&CandidateGraph, vars:&VariableSet, config:&ConstraintConfig, problem:&mut Problem)
{
	for sector in graph.sectors.values()
	{
		for c in channels(config.num_channels)
		{
			let Some(sigma) = var(vars,VarKey::SectorActive(sector.id,c)) else { continue };
			let mut incident = LinExpr::default();
			for link in graph.links.values().filter(|l|l.from_sector==sector.id || l.to_sector==sector.id)
			{
				if let Some(tau) = var(vars,VarKey::TimeDivision(link.id,c))
				{
					incident = incident + tau;
				}
			}
			problem.add_constraint(Constraint::new(incident,Sense::Le,sigma,format!("tdma_sector_{}_{c}",sector.id)));
		}
	}

	for link in graph.links.values()
	{
		let Some(l) = var(vars,VarKey::LinkSelected(link.id)) else { continue };
		let mut sum_tau = LinExpr::default();
		for c in channels(config.num_channels)
		{
			if let Some(tau) = var(vars,VarKey::TimeDivision(link.id,c))
			{
				sum_tau = sum_tau + tau;
			}
		}
		problem.add_constraint(Constraint::new(sum_tau,Sense::Le,l,format!("tdma_link_{}",link.id)));
	}
}

///Family 6: sector-node coupling. Sectors on the same `(site, node_index)`
///are selected together; a link requires both endpoint sectors active.
pub fn sector_node_coupling(graph:&CandidateGraph, vars:&VariableSet, config:&ConstraintConfig, problem:&mut Problem)
{
	let mut nodes: BTreeMap<(EntityId,u32),Vec<EntityId>> = BTreeMap::new();
	for sector in graph.sectors.values()
	{
		nodes.entry((sector.site_id,sector.node_index)).or_default().push(sector.id);
	}
	for sectors in nodes.values()
	{
		if sectors.len() < 2
		{
			continue;
		}
		for c in channels(config.num_channels)
		{
			let Some(first) = var(vars,VarKey::SectorActive(sectors[0],c)) else { continue };
			for &other in &sectors[1..]
			{
				if let Some(other_var) = var(vars,VarKey::SectorActive(other,c))
				{
					problem.add_constraint(Constraint::new(first.clone(),Sense::Eq,other_var,format!("node_couple_{}_{}_{c}",sectors[0],other)));
				}
			}
		}
	}

	for link in graph.links.values()
	{
		let Some(l) = var(vars,VarKey::LinkSelected(link.id)) else { continue };
		let mut from_any = LinExpr::default();
		let mut to_any = LinExpr::default();
		for c in channels(config.num_channels)
		{
			if let Some(sigma) = var(vars,VarKey::SectorActive(link.from_sector,c))
			{
				from_any = from_any + sigma;
			}
			if let Some(sigma) = var(vars,VarKey::SectorActive(link.to_sector,c))
			{
				to_any = to_any + sigma;
			}
		}
		problem.add_constraint(Constraint::new(l.clone(),Sense::Le,from_any,format!("link_needs_from_sector_{}",link.id)));
		problem.add_constraint(Constraint::new(l,Sense::Le,to_any,format!("link_needs_to_sector_{}",link.id)));
	}
}

///Family 7: symmetric backhaul. `ℓ_{i,j} = ℓ_{j,i}`.
pub fn symmetric_backhaul(graph:&CandidateGraph, vars:&VariableSet, problem:&mut Problem)
{
	let mut seen: BTreeSet<(EntityId,EntityId)> = BTreeSet::new();
	for link in graph.links.values()
	{
		if link.kind != LinkKind::Backhaul
		{
			continue;
		}
		let key = if link.from < link.to { (link.from,link.to) } else { (link.to,link.from) };
		if !seen.insert(key)
		{
			continue;
		}
		let reverse_id = crate::graph::Link::compute_id(&link.to,&link.from);
		let (Some(forward),Some(reverse)) = (var(vars,VarKey::LinkSelected(link.id)),var(vars,VarKey::LinkSelected(reverse_id))) else { continue };
		problem.add_constraint(Constraint::new(forward,Sense::Eq,reverse,format!("symmetric_{}",link.id)));
	}
}

///Family 8: P2MP. Per DN sector, at most `P_D` DN/POP-directed links and
///`P_T` total; each CN has at most one incoming link.
pub fn p2mp(graph:&CandidateGraph, vars:&VariableSet, config:&ConstraintConfig, problem:&mut Problem)
{
	for sector in graph.sectors.values()
	{
		let site = graph.sites.get(&sector.site_id);
		if !matches!(site.map(|s|s.site_type), Some(SiteType::Dn))
		{
			continue;
		}
		let outgoing: Vec<&crate::graph::Link> = graph.links.values().filter(|l|l.from_sector==sector.id).collect();

		let mut dn_pop_sum = LinExpr::default();
		let mut total_sum = LinExpr::default();
		for link in &outgoing
		{
			let Some(l) = var(vars,VarKey::LinkSelected(link.id)) else { continue };
			let to_type = graph.sites.get(&link.to).map(|s|s.site_type);
			if matches!(to_type, Some(SiteType::Dn)|Some(SiteType::Pop))
			{
				dn_pop_sum = dn_pop_sum + l.clone();
			}
			total_sum = total_sum + l;
		}
		problem.add_constraint(Constraint::new(dn_pop_sum,Sense::Le,LinExpr::constant(config.dn_dn_link_limit as f64),format!("p2mp_dn_{}",sector.id)));
		problem.add_constraint(Constraint::new(total_sum,Sense::Le,LinExpr::constant(config.dn_total_link_limit as f64),format!("p2mp_total_{}",sector.id)));
	}

	for site in graph.sites.values()
	{
		if site.site_type != SiteType::Cn
		{
			continue;
		}
		let mut incoming = LinExpr::default();
		for link in graph.links_to(&site.id)
		{
			if let Some(l) = var(vars,VarKey::LinkSelected(link.id))
			{
				incoming = incoming + l;
			}
		}
		problem.add_constraint(Constraint::new(incoming,Sense::Le,LinExpr::constant(1.0),format!("cn_single_parent_{}",site.id)));
	}
}

///Family 9: deployment geometry. Two links leaving different sectors of the
///same site must diverge by at least `α`, or at least the looser `θ` when
///their length ratio exceeds `ρ`; violating pairs cannot both be selected.
///Multi-channel ζ-gating (spec.md §4.5: "under multi-channel this applies
///only when both links share a channel") is not modeled here: with a single
///deployment channel assumed this reduces to the unconditional exclusion
///below, and is documented as a scoped simplification in DESIGN.md.
pub fn deployment_geometry(graph:&CandidateGraph, vars:&VariableSet, config:&ConstraintConfig, problem:&mut Problem)
{
	let by_site: BTreeMap<EntityId,Vec<&crate::graph::Link>> = {
		let mut m: BTreeMap<EntityId,Vec<&crate::graph::Link>> = BTreeMap::new();
		for link in graph.links.values()
		{
			m.entry(link.from).or_default().push(link);
		}
		m
	};

	for links in by_site.values()
	{
		for i in 0..links.len()
		{
			for j in (i+1)..links.len()
			{
				let (a,b) = (links[i],links[j]);
				if a.from_sector == b.from_sector
				{
					continue;
				}
				let mut angle = (a.azimuth_deg - b.azimuth_deg).abs() % 360.0;
				if angle > 180.0
				{
					angle = 360.0 - angle;
				}
				let ratio = if a.distance_m>0.0 && b.distance_m>0.0 { (a.distance_m/b.distance_m).max(b.distance_m/a.distance_m) } else { 1.0 };
				let required = if ratio > config.near_far_length_ratio { config.near_far_angle_limit_deg } else { config.diff_sector_angle_limit_deg };
				if angle < required
				{
					let (Some(la),Some(lb)) = (var(vars,VarKey::LinkSelected(a.id)),var(vars,VarKey::LinkSelected(b.id))) else { continue };
					problem.add_constraint(Constraint::new(la+lb,Sense::Le,LinExpr::constant(1.0),format!("deploy_geom_{}_{}",a.id,b.id)));
				}
			}
		}
	}
}

///Family 10: co-location. At most one site selected per physical location
///(sites at the same location differing only by device are candidates, never
///co-deployed).
pub fn co_location(graph:&CandidateGraph, vars:&VariableSet, problem:&mut Problem)
{
	let mut by_location: BTreeMap<(i64,i64,i64),Vec<EntityId>> = BTreeMap::new();
	for site in graph.sites.values()
	{
		let key = (
			(site.position.x*1e6).round() as i64,
			(site.position.y*1e6).round() as i64,
			(site.position.z*1e3).round() as i64,
		);
		by_location.entry(key).or_default().push(site.id);
	}
	for (key,ids) in &by_location
	{
		if ids.len() < 2
		{
			continue;
		}
		let mut sum = LinExpr::default();
		for id in ids
		{
			if let Some(s) = var(vars,VarKey::SiteSelected(*id))
			{
				sum = sum + s;
			}
		}
		problem.add_constraint(Constraint::new(sum,Sense::Le,LinExpr::constant(1.0),format!("colocation_{}_{}_{}",key.0,key.1,key.2)));
	}
}

///Family 11: SINR/MCS classification. Exactly one MCS class active per
///selected link/channel; the interference-weighted SINR⁻¹ is bounded by the
///piecewise envelope `υ_m`, forcing μ to the coarsest feasible class.
pub fn sinr_mcs_classification(graph:&CandidateGraph, vars:&VariableSet, config:&ConstraintConfig, problem:&mut Problem)
{
	for link in graph.links.values()
	{
		for c in channels(config.num_channels)
		{
			let classes: Vec<u32> = link.capacity_by_mcs.keys().copied().collect();
			if classes.is_empty()
			{
				continue;
			}
			let mut sum_mu = LinExpr::default();
			for &m in &classes
			{
				if let Some(mu) = var(vars,VarKey::McsClass(link.id,c,m))
				{
					sum_mu = sum_mu + mu;
				}
			}
			let Some(l) = var(vars,VarKey::LinkSelected(link.id)) else { continue };
			problem.add_constraint(Constraint::new(sum_mu,Sense::Eq,l,format!("mcs_exactly_one_{}_{c}",link.id)));

			//S^-1_{i,j,c} = (N_p + sum chi*I) / RSL_{i,j}: the noise-only term is folded
			//into a constant since N_p/RSL is fixed per link; the interference term is
			//the sum over chi variables keyed to this link as victim.
			let noise_floor_term = config.noise_power_mw/10f64.powf(link.rsl_dbm/10.0);
			let mut sinr_inverse = LinExpr::constant(noise_floor_term);
			for interferer in graph.links.values()
			{
				if interferer.id == link.id || interferer.to != link.to
				{
					continue;
				}
				if let Some(chi) = var(vars,VarKey::ChiLinearization(link.from,interferer.id,c))
				{
					let interference_mw = crate::radio::dbm_to_mw(interferer.rsl_dbm);
					sinr_inverse = sinr_inverse + chi*(interference_mw/10f64.powf(link.rsl_dbm/10.0));
				}
			}

			for &m in &classes
			{
				let Some(threshold) = config.sinr_inverse_thresholds.get(&m) else { continue };
				let Some(mu) = var(vars,VarKey::McsClass(link.id,c,m)) else { continue };
				//When mu is 1 for class m, SINR^-1 must be <= threshold_m; relaxed by
				//big-M when mu is 0 (forces mu toward coarser classes as SINR worsens).
				let bound = LinExpr::constant(*threshold) + (LinExpr::constant(1.0)-mu)*config.big_m;
				problem.add_constraint(Constraint::new(sinr_inverse.clone(),Sense::Le,bound,format!("sinr_bound_{}_{c}_{m}",link.id)));
			}
		}
	}
}

///Family 12: linearization of χ. Standard McCormick-style linearization of
///`τ_{k,l,c}·[p_i = p_k]`.
pub fn chi_linearization(graph:&CandidateGraph, vars:&VariableSet, config:&ConstraintConfig, problem:&mut Problem)
{
	for victim in graph.links.values()
	{
		for interferer in graph.links.values()
		{
			if interferer.id == victim.id || interferer.to != victim.to
			{
				continue;
			}
			for c in channels(config.num_channels)
			{
				let Some(chi) = var(vars,VarKey::ChiLinearization(victim.from,interferer.id,c)) else { continue };
				let Some(tau) = var(vars,VarKey::TimeDivision(interferer.id,c)) else { continue };
				let Some(p_i) = var(vars,VarKey::Polarity(victim.from)) else { continue };
				let Some(p_k) = var(vars,VarKey::Polarity(interferer.from)) else { continue };

				problem.add_constraint(Constraint::new(chi.clone()+p_i.clone()-p_k.clone(),Sense::Le,LinExpr::constant(1.0),format!("chi_lin1_{}_{}_{c}",victim.from,interferer.id)));
				problem.add_constraint(Constraint::new(chi.clone()-p_i.clone()+p_k.clone(),Sense::Le,LinExpr::constant(1.0),format!("chi_lin2_{}_{}_{c}",victim.from,interferer.id)));
				problem.add_constraint(Constraint::new(chi.clone(),Sense::Le,tau.clone(),format!("chi_le_tau_{}_{}_{c}",victim.from,interferer.id)));
				problem.add_constraint(Constraint::new(chi.clone(),Sense::Ge,tau.clone()+p_i.clone()+p_k.clone()-LinExpr::constant(2.0),format!("chi_ge_lo_{}_{}_{c}",victim.from,interferer.id)));
				problem.add_constraint(Constraint::new(chi,Sense::Ge,tau-p_i-p_k,format!("chi_ge_hi_{}_{}_{c}",victim.from,interferer.id)));
			}
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::graph::{CandidateGraph, Link, LinkKind, Site, SiteType};
	use crate::milp::variables::{enumerate_variables, VariableConfig};
	use crate::milp::{LinExpr, Objective, ObjectiveSense, Problem};

	fn pair_graph() -> CandidateGraph
	{
		let mut graph = CandidateGraph::new();
		let a = Site::compute_id(0.0,0.0,0.0,SiteType::Pop,Some("DN-1"));
		let b = Site::compute_id(1.0,0.0,0.0,SiteType::Dn,Some("DN-1"));
		graph.sites.insert(a, Site{ id:a, position: crate::geometry::Point3::new(0.0,0.0,0.0), site_type: SiteType::Pop, building_id: None, device_sku: Some("DN-1".into()), number_of_subscribers: None });
		graph.sites.insert(b, Site{ id:b, position: crate::geometry::Point3::new(100.0,0.0,0.0), site_type: SiteType::Dn, building_id: None, device_sku: Some("DN-1".into()), number_of_subscribers: None });

		for (from,to) in [(a,b),(b,a)]
		{
			let link_id = Link::compute_id(&from,&to);
			let mut capacity_by_mcs = std::collections::BTreeMap::new();
			capacity_by_mcs.insert(1,1000.0);
			graph.links.insert(link_id, Link{
				id: link_id, from, to, from_sector: from, to_sector: to,
				kind: LinkKind::Backhaul, distance_m: 100.0, azimuth_deg: 0.0, elevation_deg: 0.0,
				from_deviation_deg: 0.0, to_deviation_deg: 0.0, rsl_dbm: -40.0,
				capacity_by_mcs, confidence: 1.0,
			});
		}
		graph
	}

	fn default_config() -> ConstraintConfig
	{
		ConstraintConfig{
			num_channels: 1,
			pop_capacity_gbps: 10.0,
			big_m: 1000.0,
			dn_dn_link_limit: 2,
			dn_total_link_limit: 15,
			diff_sector_angle_limit_deg: 20.0,
			near_far_angle_limit_deg: 40.0,
			near_far_length_ratio: 3.0,
			sinr_inverse_thresholds: [(0,1.0),(1,0.1)].into_iter().collect(),
			noise_power_mw: crate::radio::dbm_to_mw(-174.0+6.0),
		}
	}

	#[test]
	fn symmetric_backhaul_emits_one_constraint_per_pair()
	{
		let graph = pair_graph();
		let vconfig = VariableConfig{ num_channels: 1, pop_capacity_gbps: 10.0 };
		let mut problem = Problem::new(Objective{ sense: ObjectiveSense::Minimize, expr: LinExpr::constant(0.0) });
		let vars = enumerate_variables(&graph,&vconfig,&mut problem);
		symmetric_backhaul(&graph,&vars,&mut problem);
		let count = problem.constraints.iter().filter(|c|c.name.starts_with("symmetric_")).count();
		assert_eq!(count,1);
	}

	#[test]
	fn p2mp_emits_constraints_for_dn_sectors_only()
	{
		let graph = pair_graph();
		let config = default_config();
		let vconfig = VariableConfig{ num_channels: 1, pop_capacity_gbps: 10.0 };
		let mut problem = Problem::new(Objective{ sense: ObjectiveSense::Minimize, expr: LinExpr::constant(0.0) });
		let vars = enumerate_variables(&graph,&vconfig,&mut problem);
		p2mp(&graph,&vars,&config,&mut problem);
		assert!(problem.constraints.iter().any(|c|c.name.starts_with("p2mp_dn_")));
	}

	#[test]
	fn flow_balance_creates_a_constraint_per_non_demand_site()
	{
		let graph = pair_graph();
		let vconfig = VariableConfig{ num_channels: 1, pop_capacity_gbps: 10.0 };
		let config = default_config();
		let mut problem = Problem::new(Objective{ sense: ObjectiveSense::Minimize, expr: LinExpr::constant(0.0) });
		let vars = enumerate_variables(&graph,&vconfig,&mut problem);
		flow_balance(&graph,&vars,&config,&mut problem);
		assert!(problem.constraints.iter().any(|c|c.name.starts_with("flow_balance_")));
	}
}
