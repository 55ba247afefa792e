/*!

Output generation (spec.md §6 "Outputs"): a serializable topology file
(selected sites, sectors, links, polarities, channels, per-link MCS, per-link
capacity) plus per-site and per-link CSV reports (status, incoming/outgoing
flow, throughput, utilization). Debug LP file persistence is handled directly
by [`crate::solver`]'s `debug_lp_path`, not duplicated here.

*/

use std::io::Write;

use serde::Serialize;

use crate::flow_analyzer::FlowAnalyzerReport;
use crate::graph::{CandidateGraph, EntityId, SelectionFlag, SiteType, TopologyState};

#[derive(Debug,Clone,Serialize)]
pub struct TopologySiteRow
{
	pub site_id: String,
	pub site_type: &'static str,
	pub selected: bool,
	pub polarity: Option<bool>,
}

#[derive(Debug,Clone,Serialize)]
pub struct TopologySectorRow
{
	pub sector_id: String,
	pub site_id: String,
	pub channel: Option<u32>,
}

#[derive(Debug,Clone,Serialize)]
pub struct TopologyLinkRow
{
	pub link_id: String,
	pub from: String,
	pub to: String,
	pub kind: &'static str,
	pub selected: bool,
	pub mcs_class: Option<u32>,
	pub time_division: Option<f64>,
	pub capacity_mbps: f64,
}

///The full output topology (spec.md §6: "Topology file — selected sites,
///sectors, links, polarities, channels, per-link MCS, per-link capacity").
#[derive(Debug,Clone,Serialize)]
pub struct TopologyFile
{
	pub sites: Vec<TopologySiteRow>,
	pub sectors: Vec<TopologySectorRow>,
	pub links: Vec<TopologyLinkRow>,
}

fn site_type_tag(site_type:SiteType) -> &'static str
{
	match site_type
	{
		SiteType::Pop => "POP",
		SiteType::Dn => "DN",
		SiteType::Cn => "CN",
		SiteType::Demand => "DEMAND",
	}
}

fn link_kind_tag(kind:crate::graph::LinkKind) -> &'static str
{
	match kind
	{
		crate::graph::LinkKind::Backhaul => "BACKHAUL",
		crate::graph::LinkKind::Access => "ACCESS",
	}
}

pub fn build_topology_file(graph:&CandidateGraph, topology:&TopologyState) -> TopologyFile
{
	let sites = graph.sites.values().map(|site| TopologySiteRow{
		site_id: site.id.to_hex(),
		site_type: site_type_tag(site.site_type),
		selected: topology.is_selected(&site.id),
		polarity: topology.site_polarity.get(&site.id).copied(),
	}).collect();

	let sectors = graph.sectors.values().map(|sector| TopologySectorRow{
		sector_id: sector.id.to_hex(),
		site_id: sector.site_id.to_hex(),
		channel: topology.sector_channel.get(&sector.id).copied(),
	}).collect();

	let links = graph.links.values().map(|link|
	{
		let mcs_class = topology.link_mcs_class.get(&link.id).copied();
		let capacity_mbps = mcs_class.and_then(|m|link.capacity_by_mcs.get(&m).copied()).unwrap_or(0.0);
		TopologyLinkRow{
			link_id: link.id.to_hex(),
			from: link.from.to_hex(),
			to: link.to.to_hex(),
			kind: link_kind_tag(link.kind),
			selected: mcs_class.is_some() && topology.is_selected(&link.from) && topology.is_selected(&link.to),
			mcs_class,
			time_division: topology.link_time_division.get(&link.id).copied(),
			capacity_mbps,
		}
	}).collect();

	TopologyFile{ sites, sectors, links }
}

impl TopologyFile
{
	pub fn to_json(&self) -> serde_json::Result<String>
	{
		serde_json::to_string_pretty(self)
	}
}

#[derive(Debug,Clone,Serialize)]
struct SiteReportRow
{
	site_id: String,
	site_type: &'static str,
	status: &'static str,
	incoming_flow_mbps: f64,
	outgoing_flow_mbps: f64,
}

#[derive(Debug,Clone,Serialize)]
struct LinkReportRow
{
	link_id: String,
	from: String,
	to: String,
	status: &'static str,
	mcs_class: Option<u32>,
	throughput_mbps: f64,
	utilization: f64,
}

fn site_status(flag:Option<&SelectionFlag>) -> &'static str
{
	match flag
	{
		Some(SelectionFlag::Existing) => "EXISTING",
		Some(SelectionFlag::Proposed) => "PROPOSED",
		Some(SelectionFlag::Candidate) | None => "UNSELECTED",
	}
}

///Writes the per-site CSV report (spec.md §6: "status, incoming/outgoing
///flow, throughput, utilization"). Per-site flow is the sum of incident
///active links' utilization-weighted throughput from `flow_report`.
pub fn write_site_report<W:Write>(writer:W, graph:&CandidateGraph, topology:&TopologyState, flow_report:&FlowAnalyzerReport) -> csv::Result<()>
{
	let mut wtr = csv::Writer::from_writer(writer);
	for site in graph.sites.values()
	{
		let mut incoming = 0.0;
		let mut outgoing = 0.0;
		for link in graph.links.values()
		{
			let Some(utilization) = flow_report.per_link_utilization.get(&link.id) else { continue };
			let Some(&mcs) = topology.link_mcs_class.get(&link.id) else { continue };
			let capacity = link.capacity_by_mcs.get(&mcs).copied().unwrap_or(0.0);
			let flow = utilization*capacity;
			if link.to==site.id { incoming += flow; }
			if link.from==site.id { outgoing += flow; }
		}
		wtr.serialize(SiteReportRow{
			site_id: site.id.to_hex(),
			site_type: site_type_tag(site.site_type),
			status: site_status(topology.site_flags.get(&site.id)),
			incoming_flow_mbps: incoming,
			outgoing_flow_mbps: outgoing,
		})?;
	}
	wtr.flush()?;
	Ok(())
}

///Writes the per-link CSV report (spec.md §6: "status, incoming/outgoing
///flow, throughput, utilization").
pub fn write_link_report<W:Write>(writer:W, graph:&CandidateGraph, topology:&TopologyState, flow_report:&FlowAnalyzerReport) -> csv::Result<()>
{
	let mut wtr = csv::Writer::from_writer(writer);
	for link in graph.links.values()
	{
		let mcs_class = topology.link_mcs_class.get(&link.id).copied();
		let selected = mcs_class.is_some() && topology.is_selected(&link.from) && topology.is_selected(&link.to);
		let utilization = flow_report.per_link_utilization.get(&link.id).copied().unwrap_or(0.0);
		let throughput_mbps = mcs_class.and_then(|m|link.capacity_by_mcs.get(&m).copied()).unwrap_or(0.0)*utilization;
		wtr.serialize(LinkReportRow{
			link_id: link.id.to_hex(),
			from: link.from.to_hex(),
			to: link.to.to_hex(),
			status: if selected { "SELECTED" } else { "UNSELECTED" },
			mcs_class,
			throughput_mbps,
			utilization,
		})?;
	}
	wtr.flush()?;
	Ok(())
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::geometry::Point3;
	use crate::graph::{Link, LinkKind, Site};
	use std::collections::BTreeMap;

	fn sample() -> (CandidateGraph, TopologyState, FlowAnalyzerReport)
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

		let mut graph = CandidateGraph::new();
		graph.sites.insert(pop.id,pop.clone());
		graph.sites.insert(cn.id,cn.clone());
		graph.links.insert(link.id,link.clone());

		let mut topology = TopologyState::new();
		topology.site_flags.insert(pop.id,SelectionFlag::Existing);
		topology.site_flags.insert(cn.id,SelectionFlag::Proposed);
		topology.link_mcs_class.insert(link.id,1);

		let mut flow_report = FlowAnalyzerReport::default();
		flow_report.per_link_utilization.insert(link.id,0.5);

		(graph,topology,flow_report)
	}

	#[test]
	fn topology_file_marks_selected_sites_and_links()
	{
		let (graph,topology,_) = sample();
		let file = build_topology_file(&graph,&topology);
		assert_eq!(file.sites.len(),2);
		assert!(file.sites.iter().all(|s|s.selected));
		assert_eq!(file.links.len(),1);
		assert!(file.links[0].selected);
		assert_eq!(file.links[0].capacity_mbps,1000.0);
		assert!(file.to_json().is_ok());
	}

	#[test]
	fn site_report_sums_incident_link_flow()
	{
		let (graph,topology,flow_report) = sample();
		let mut buffer = Vec::new();
		write_site_report(&mut buffer,&graph,&topology,&flow_report).unwrap();
		let text = String::from_utf8(buffer).unwrap();
		assert!(text.contains("500")); //0.5 utilization * 1000 Mbps capacity
	}

	#[test]
	fn link_report_reflects_utilization()
	{
		let (graph,topology,flow_report) = sample();
		let mut buffer = Vec::new();
		write_link_report(&mut buffer,&graph,&topology,&flow_report).unwrap();
		let text = String::from_utf8(buffer).unwrap();
		assert!(text.contains("SELECTED"));
		assert!(text.contains("0.5"));
	}
}
