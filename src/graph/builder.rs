/*!

The deterministic Candidate Graph Builder (spec.md §4.4, component C4): the
five ordered steps from raw user input to a fully linked, sector-oriented
`CandidateGraph` with demand sites attached.

*/

use std::collections::BTreeMap;

use crate::error::DataError;
use crate::geometry::{Point2, Point3, Segment3};
use crate::los::{LosConfig, LosOutcome, LosSite, LosValidator};
use crate::radio::{self, PropagationLosses, RadioProfile};
use crate::raster::Dsm;

use super::{
	CandidateGraph, DemandSite, Device, DeviceType, EntityId, Link, LinkKind,
	Sector, Site, SiteType,
};

///A site as given by the external caller, before device expansion or
///automatic detection (spec.md §6 "Sites").
#[derive(Debug,Clone)]
pub struct RawSite
{
	pub position: Point3,
	pub site_type: SiteType,
	pub building_id: Option<String>,
	pub device_sku: Option<String>,
	pub number_of_subscribers: Option<u32>,
}

///A building outline used by automatic site detection and the same-building
///easy reject (spec.md §6 "Building outlines").
#[derive(Debug,Clone)]
pub struct BuildingOutline
{
	pub id: String,
	///Closed ring, first and last vertex need not coincide.
	pub ring: Vec<Point2>,
	pub height: Option<f64>,
}

///How demand sites are generated and attached (spec.md §4.4 step 5).
#[derive(Debug,Clone)]
pub enum DemandModel
{
	Cn{ demand_per_cn_gbps: f64 },
	Uniform{ spacing_m: f64, demand_per_site_gbps: f64, connection_radius_m: f64, boundary: Vec<Point2> },
	Manual{ sites: Vec<(Point2,f64)>, connection_radius_m: f64 },
}

///Builder-wide configuration not already folded into `LosConfig`.
#[derive(Debug,Clone)]
pub struct BuilderConfig
{
	pub los: LosConfig,
	pub frequency_ghz: f64,
	pub thermal_noise_power_dbm: f64,
	pub gal_attenuation_db_per_km: f64,
	pub rain_specific_attenuation_db_per_km: f64,
	pub automatic_site_detection: bool,
	pub corner_angle_threshold_deg: f64,
	pub demand_model: DemandModel,
}

///Builds a deterministic `CandidateGraph` from raw input, per spec.md §4.4's
///five steps. `devices` is keyed by SKU.
pub fn build_candidate_graph(
	raw_sites: &[RawSite],
	devices: &BTreeMap<String,Device>,
	building_outlines: &[BuildingOutline],
	dsm: &Dsm,
	config: &BuilderConfig,
) -> Result<CandidateGraph, DataError>
{
	if raw_sites.is_empty()
	{
		return Err(DataError::NoSites);
	}
	if devices.is_empty()
	{
		return Err(DataError::NoDevices);
	}

	//Step 1 (+ step 2 folded in, since detected sites go through the same
	//device-expansion and dedup logic): ingest, detect, expand, dedupe.
	let mut all_raw = raw_sites.to_vec();
	if config.automatic_site_detection
	{
		all_raw.extend(detect_sites(building_outlines, config.corner_angle_threshold_deg));
	}
	let mut sites = expand_and_dedupe(&all_raw, devices);

	//Step 3: LOS-driven link production, C2 + C3.
	let validator = LosValidator::new(config.los.clone());
	let raw_links = produce_links(&sites, &validator, dsm, config);

	//Step 4: sector boresight orientation, then finalize links against sectors.
	let mut sectors: BTreeMap<EntityId,Sector> = BTreeMap::new();
	orient_sectors(&sites, devices, &raw_links, &mut sectors);
	let links = finalize_links(&sites, &sectors, devices, raw_links, config);

	let mut graph = CandidateGraph::new();
	for site in sites.drain(..)
	{
		graph.sites.insert(site.id, site);
	}
	for (id,sector) in sectors
	{
		graph.sectors.insert(id,sector);
	}
	for link in links
	{
		graph.links.insert(link.id, link);
	}

	//Step 5: demand site attachment.
	attach_demand_sites(&mut graph, &config.demand_model);

	Ok(graph)
}

fn expand_and_dedupe(raw_sites:&[RawSite], devices:&BTreeMap<String,Device>) -> Vec<Site>
{
	let mut expanded = Vec::new();
	for raw in raw_sites
	{
		match &raw.device_sku
		{
			Some(sku) =>
			{
				let id = Site::compute_id(raw.position.x,raw.position.y,raw.position.z,raw.site_type,Some(sku));
				expanded.push(Site{
					id,
					position: raw.position,
					site_type: raw.site_type,
					building_id: raw.building_id.clone(),
					device_sku: Some(sku.clone()),
					number_of_subscribers: raw.number_of_subscribers,
				});
			}
			None =>
			{
				for (sku,device) in devices
				{
					if !device.is_compatible_with(raw.site_type)
					{
						continue;
					}
					let id = Site::compute_id(raw.position.x,raw.position.y,raw.position.z,raw.site_type,Some(sku));
					expanded.push(Site{
						id,
						position: raw.position,
						site_type: raw.site_type,
						building_id: raw.building_id.clone(),
						device_sku: Some(sku.clone()),
						number_of_subscribers: raw.number_of_subscribers,
					});
				}
			}
		}
	}
	//Co-located sites (same location+type+device) are forbidden after
	//dedup (spec.md §3 Site invariant); the id already encodes all three, so
	//deduping by id is exactly the invariant.
	let mut by_id: BTreeMap<EntityId,Site> = BTreeMap::new();
	for site in expanded
	{
		by_id.entry(site.id).or_insert(site);
	}
	by_id.into_values().collect()
}

///Automatic site detection (spec.md §4.4 step 2): one DN candidate at each
///building's highest point and centroid, plus one per qualifying corner
///(interior angle at or below `corner_angle_threshold_deg`).
fn detect_sites(outlines:&[BuildingOutline], corner_angle_threshold_deg:f64) -> Vec<RawSite>
{
	let mut out = Vec::new();
	for outline in outlines
	{
		if outline.ring.len() < 3
		{
			continue;
		}
		let height = outline.height.unwrap_or(0.0);
		let centroid = polygon_centroid(&outline.ring);
		out.push(RawSite{
			position: Point3::new(centroid.x,centroid.y,height/2.0),
			site_type: SiteType::Dn,
			building_id: Some(outline.id.clone()),
			device_sku: None,
			number_of_subscribers: None,
		});
		out.push(RawSite{
			position: Point3::new(centroid.x,centroid.y,height),
			site_type: SiteType::Dn,
			building_id: Some(outline.id.clone()),
			device_sku: None,
			number_of_subscribers: None,
		});
		let n = outline.ring.len();
		for i in 0..n
		{
			let prev = outline.ring[(i+n-1)%n];
			let here = outline.ring[i];
			let next = outline.ring[(i+1)%n];
			let angle = interior_angle_deg(prev,here,next);
			if angle <= corner_angle_threshold_deg
			{
				out.push(RawSite{
					position: Point3::new(here.x,here.y,height),
					site_type: SiteType::Dn,
					building_id: Some(outline.id.clone()),
					device_sku: None,
					number_of_subscribers: None,
				});
			}
		}
	}
	out
}

fn polygon_centroid(ring:&[Point2]) -> Point2
{
	let n = ring.len() as f64;
	let sx: f64 = ring.iter().map(|p|p.x).sum();
	let sy: f64 = ring.iter().map(|p|p.y).sum();
	Point2::new(sx/n, sy/n)
}

fn interior_angle_deg(prev:Point2, here:Point2, next:Point2) -> f64
{
	let v1 = (prev.x-here.x, prev.y-here.y);
	let v2 = (next.x-here.x, next.y-here.y);
	let dot = v1.0*v2.0 + v1.1*v2.1;
	let n1 = (v1.0*v1.0+v1.1*v1.1).sqrt();
	let n2 = (v2.0*v2.0+v2.1*v2.1).sqrt();
	if n1 <= 0.0 || n2 <= 0.0
	{
		return 180.0;
	}
	(dot/(n1*n2)).clamp(-1.0,1.0).acos().to_degrees()
}

///One accepted ordered pair, before sectors have been assigned.
struct RawLink
{
	from: EntityId,
	to: EntityId,
	segment: Segment3,
	azimuth_deg: f64,
	confidence: f64,
	kind: LinkKind,
}

fn produce_links(sites:&[Site], validator:&LosValidator, dsm:&Dsm, config:&BuilderConfig) -> Vec<RawLink>
{
	use rayon::prelude::*;

	let max_distance = config.los.max_distance_m;
	let los_sites: Vec<LosSite> = sites.iter()
		.map(|s|LosSite{ position: s.position, building_id: s.building_id.clone() })
		.collect();

	let pairs: Vec<(usize,usize)> = (0..sites.len())
		.flat_map(|i|(0..sites.len()).filter(move |&j|j!=i).map(move |j|(i,j)))
		.filter(|&(i,j)|sites[i].position.distance_to(&sites[j].position) <= max_distance)
		.collect();

	let mut accepted: Vec<RawLink> = pairs.par_iter()
		.filter_map(|&(i,j)|
		{
			let outcome = validator.validate(&los_sites[i],&los_sites[j],dsm);
			match outcome
			{
				LosOutcome::Accept{confidence} =>
				{
					let segment = Segment3::new(sites[i].position,sites[j].position);
					let kind = link_kind(sites[i].site_type,sites[j].site_type);
					Some(RawLink{
						from: sites[i].id,
						to: sites[j].id,
						segment,
						azimuth_deg: segment.azimuth().to_degrees().rem_euclid(360.0),
						confidence,
						kind,
					})
				}
				_ => None,
			}
		})
		.collect();

	//Deterministic merge by (from,to) (spec.md §5: "merged deterministically by
	//(site-id_i, site-id_j) ordering ... no link is produced twice").
	accepted.sort_by(|a,b|(a.from,a.to).cmp(&(b.from,b.to)));
	accepted
}

fn link_kind(a:SiteType, b:SiteType) -> LinkKind
{
	match (a,b)
	{
		(SiteType::Cn,_) | (_,SiteType::Cn) => LinkKind::Access,
		_ => LinkKind::Backhaul,
	}
}

///Orients DN sectors to minimize total weighted angular deviation of incident
///candidate links from boresights (spec.md §4.4 step 4). One node per site,
///`sectors_per_node` sectors evenly spaced around it; the whole node is
///rotated as a unit by a coarse grid search, since jointly optimizing sector
///orientation inside the MILP is explicitly out of scope (spec.md §1
///Non-goals).
fn orient_sectors(sites:&[Site], devices:&BTreeMap<String,Device>, raw_links:&[RawLink], sectors:&mut BTreeMap<EntityId,Sector>)
{
	for site in sites
	{
		let Some(sku) = &site.device_sku else { continue };
		let Some(device) = devices.get(sku) else { continue };
		let profile = &device.sector_profile;
		let sectors_per_node = profile.sectors_per_node.max(1);
		let half_width = (360.0/sectors_per_node as f64/2.0).min(profile.scan_range_deg/2.0);

		let incident: Vec<(&RawLink,f64)> = raw_links.iter()
			.filter(|l|l.from==site.id)
			.map(|l|(l, link_weight(l)))
			.collect();

		let best_rotation = if incident.is_empty()
		{
			0.0
		}
		else
		{
			(0..72)
				.map(|step|step as f64 * 5.0)
				.min_by(|a,b|
				{
					let cost_a = rotation_cost(*a,sectors_per_node,half_width,&incident);
					let cost_b = rotation_cost(*b,sectors_per_node,half_width,&incident);
					cost_a.partial_cmp(&cost_b).unwrap()
				})
				.unwrap_or(0.0)
		};

		for position in 0..sectors_per_node
		{
			let boresight = (best_rotation + position as f64 * 360.0/sectors_per_node as f64).rem_euclid(360.0);
			let id = Sector::compute_id(&site.id,0,position,device.device_type);
			sectors.insert(id, Sector{
				id,
				site_id: site.id,
				node_index: 0,
				position,
				boresight_deg: boresight,
				half_width_deg: half_width,
			});
		}
	}
}

fn link_weight(link:&RawLink) -> f64
{
	let distance_weight = 1.0 + link.segment.length()/1000.0;
	let backhaul_weight = match link.kind { LinkKind::Backhaul => 2.0, LinkKind::Access => 1.0 };
	distance_weight*backhaul_weight
}

fn rotation_cost(rotation:f64, sectors_per_node:u32, half_width:f64, incident:&[(&RawLink,f64)]) -> f64
{
	let arc = 360.0/sectors_per_node as f64;
	incident.iter().map(|(link,weight)|
	{
		let mut delta = (link.azimuth_deg - rotation).rem_euclid(arc);
		if delta > arc/2.0
		{
			delta = arc - delta;
		}
		weight*delta.min(half_width*2.0) //cap one outlier link's pull on the rest of the node
	}).sum()
}

fn finalize_links(sites:&[Site], sectors:&BTreeMap<EntityId,Sector>, devices:&BTreeMap<String,Device>, raw_links:Vec<RawLink>, config:&BuilderConfig) -> Vec<Link>
{
	let by_id: BTreeMap<EntityId,&Site> = sites.iter().map(|s|(s.id,s)).collect();
	let mut out = Vec::new();

	for raw in raw_links
	{
		let Some(from_site) = by_id.get(&raw.from) else { continue };
		let Some(to_site) = by_id.get(&raw.to) else { continue };
		let Some(from_sku) = &from_site.device_sku else { continue };
		let Some(to_sku) = &to_site.device_sku else { continue };
		let Some(from_device) = devices.get(from_sku) else { continue };
		let Some(to_device) = devices.get(to_sku) else { continue };

		let from_sector = best_matching_sector(sectors,&raw.from,raw.azimuth_deg);
		let reverse_azimuth = (raw.azimuth_deg+180.0).rem_euclid(360.0);
		let to_sector = best_matching_sector(sectors,&raw.to,reverse_azimuth);

		let (Some(from_sector),Some(to_sector)) = (from_sector,to_sector) else { continue };

		let distance_km = raw.segment.length()/1000.0;
		let losses = PropagationLosses{
			fspl_db: radio::free_space_path_loss_db(distance_km,config.frequency_ghz),
			gal_db: radio::gaseous_absorption_loss_db(distance_km,config.gal_attenuation_db_per_km),
			rain_db: radio::rain_loss_db(distance_km,config.rain_specific_attenuation_db_per_km),
		};
		let from_profile = device_radio_profile(from_device);
		let to_profile = device_radio_profile(to_device);
		let from_deviation = from_sector.angular_deviation(raw.azimuth_deg);
		let to_deviation = to_sector.angular_deviation(reverse_azimuth);
		let result = radio::evaluate_link(&from_profile,from_deviation,&to_profile,to_deviation,losses,config.thermal_noise_power_dbm);

		let mut capacity_by_mcs = BTreeMap::new();
		for row in &from_device.sector_profile.mcs_table
		{
			if row.snr_threshold_db <= result.snr_db
			{
				capacity_by_mcs.insert(row.mcs_class, row.throughput_mbps);
			}
		}

		let id = Link::compute_id(&raw.from,&raw.to);
		out.push(Link{
			id,
			from: raw.from,
			to: raw.to,
			from_sector: from_sector.id,
			to_sector: to_sector.id,
			kind: raw.kind,
			distance_m: raw.segment.length(),
			azimuth_deg: raw.azimuth_deg,
			elevation_deg: {
				let horiz = raw.segment.horizontal_length();
				let dz = raw.segment.b.z - raw.segment.a.z;
				dz.atan2(horiz).to_degrees()
			},
			from_deviation_deg: from_deviation,
			to_deviation_deg: to_deviation,
			rsl_dbm: result.rsl_dbm,
			capacity_by_mcs,
			confidence: raw.confidence,
		});
	}
	out
}

fn best_matching_sector<'a>(sectors:&'a BTreeMap<EntityId,Sector>, site_id:&EntityId, azimuth_deg:f64) -> Option<&'a Sector>
{
	sectors.values()
		.filter(|s|&s.site_id==site_id)
		.filter(|s|s.within_scan_range(azimuth_deg))
		.min_by(|a,b|a.angular_deviation(azimuth_deg).partial_cmp(&b.angular_deviation(azimuth_deg)).unwrap())
}

fn device_radio_profile(device:&Device) -> RadioProfile
{
	let p = &device.sector_profile;
	RadioProfile{
		tx_power_dbm: p.tx_power_max_dbm,
		tx_loss_db: p.misc_loss_db,
		rx_loss_db: p.misc_loss_db,
		boresight_gain_dbi: p.boresight_gain_dbi,
		antenna_pattern: p.antenna_pattern.clone(),
		noise_figure_db: 0.0,
		mcs_table: p.mcs_table.clone(),
	}
}

fn attach_demand_sites(graph:&mut CandidateGraph, model:&DemandModel)
{
	match model
	{
		DemandModel::Cn{ demand_per_cn_gbps } =>
		{
			let cn_ids: Vec<EntityId> = graph.sites.values()
				.filter(|s|s.site_type==SiteType::Cn)
				.map(|s|s.id)
				.collect();
			for cn_id in cn_ids
			{
				let site = &graph.sites[&cn_id];
				let multiplicity = site.number_of_subscribers.unwrap_or(1).max(1);
				let demand_id = EntityId::from_canonical(&[&cn_id.to_hex(),"demand"]);
				graph.demand_sites.insert(demand_id, DemandSite{
					id: demand_id,
					demand_gbps: demand_per_cn_gbps * multiplicity as f64,
					connected_sites: vec![cn_id],
				});
			}
		}
		DemandModel::Uniform{ spacing_m, demand_per_site_gbps, connection_radius_m, boundary } =>
		{
			for point in grid_over_boundary(boundary,*spacing_m)
			{
				let connected = connected_within_radius(graph,point,*connection_radius_m);
				if connected.is_empty()
				{
					continue;
				}
				let demand_id = EntityId::from_canonical(&[&format!("{:.3}",point.x),&format!("{:.3}",point.y),"uniform"]);
				graph.demand_sites.insert(demand_id, DemandSite{
					id: demand_id,
					demand_gbps: *demand_per_site_gbps,
					connected_sites: connected,
				});
			}
		}
		DemandModel::Manual{ sites, connection_radius_m } =>
		{
			for (point,demand_gbps) in sites
			{
				let connected = connected_within_radius(graph,*point,*connection_radius_m);
				let demand_id = EntityId::from_canonical(&[&format!("{:.3}",point.x),&format!("{:.3}",point.y),"manual"]);
				graph.demand_sites.insert(demand_id, DemandSite{
					id: demand_id,
					demand_gbps: *demand_gbps,
					connected_sites: connected,
				});
			}
		}
	}
}

fn connected_within_radius(graph:&CandidateGraph, point:Point2, radius_m:f64) -> Vec<EntityId>
{
	let mut out: Vec<EntityId> = graph.sites.values()
		.filter(|s|matches!(s.site_type,SiteType::Dn|SiteType::Cn))
		.filter(|s|s.position.horizontal().distance_to(&point) <= radius_m)
		.map(|s|s.id)
		.collect();
	out.sort();
	out
}

fn grid_over_boundary(boundary:&[Point2], spacing_m:f64) -> Vec<Point2>
{
	if boundary.len() < 3 || spacing_m <= 0.0
	{
		return Vec::new();
	}
	let min_x = boundary.iter().map(|p|p.x).fold(f64::INFINITY,f64::min);
	let max_x = boundary.iter().map(|p|p.x).fold(f64::NEG_INFINITY,f64::max);
	let min_y = boundary.iter().map(|p|p.y).fold(f64::INFINITY,f64::min);
	let max_y = boundary.iter().map(|p|p.y).fold(f64::NEG_INFINITY,f64::max);

	let mut out = Vec::new();
	let mut y = min_y;
	while y <= max_y
	{
		let mut x = min_x;
		while x <= max_x
		{
			let p = Point2::new(x,y);
			if point_in_polygon(&p,boundary)
			{
				out.push(p);
			}
			x += spacing_m;
		}
		y += spacing_m;
	}
	out
}

fn point_in_polygon(point:&Point2, ring:&[Point2]) -> bool
{
	let mut inside = false;
	let n = ring.len();
	let mut j = n-1;
	for i in 0..n
	{
		let (xi,yi) = (ring[i].x,ring[i].y);
		let (xj,yj) = (ring[j].x,ring[j].y);
		let intersects = ((yi>point.y) != (yj>point.y))
			&& (point.x < (xj-xi)*(point.y-yi)/(yj-yi) + xi);
		if intersects
		{
			inside = !inside;
		}
		j = i;
	}
	inside
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::los::LosModel;
	use crate::radio::{AngleLossTable, McsRow};

	fn flat_pattern() -> AngleLossTable
	{
		AngleLossTable::new(vec![(0.0,0.0),(90.0,30.0)]).expect("literal fixture is well formed")
	}

	fn dn_device() -> Device
	{
		Device{
			sku: "DN-1".into(),
			device_type: DeviceType::Dn,
			node_capex: 1000.0,
			max_nodes_per_site: 1,
			sector_profile: crate::graph::SectorProfile{
				scan_range_deg: 90.0,
				sectors_per_node: 4,
				boresight_gain_dbi: 30.0,
				tx_power_min_dbm: 10.0,
				tx_power_max_dbm: 23.0,
				rx_sensitivity_dbm: -70.0,
				diversity_gain_db: 0.0,
				misc_loss_db: 1.0,
				antenna_pattern: flat_pattern(),
				scan_pattern: flat_pattern(),
				mcs_table: vec![
					McsRow{ mcs_class:0, snr_threshold_db:-100.0, throughput_mbps:0.0, tx_backoff_db:0.0 },
					McsRow{ mcs_class:1, snr_threshold_db:10.0, throughput_mbps:1000.0, tx_backoff_db:0.0 },
				],
			},
		}
	}

	fn flat_dsm() -> Dsm
	{
		Dsm::new(-1000.0,-1000.0,10.0,200,200,vec![-500.0;200*200])
	}

	fn default_builder_config() -> BuilderConfig
	{
		BuilderConfig{
			los: LosConfig{
				model: LosModel::Cylindrical,
				fresnel_radius_m: 1.0,
				confidence_threshold: 0.3,
				max_elevation_angle_deg: 90.0,
				min_distance_m: 1.0,
				max_distance_m: 5000.0,
				frequency_ghz: 60.0,
				exclusion_polygons: vec![],
			},
			frequency_ghz: 60.0,
			thermal_noise_power_dbm: -75.0,
			gal_attenuation_db_per_km: 15.0,
			rain_specific_attenuation_db_per_km: 0.0,
			automatic_site_detection: false,
			corner_angle_threshold_deg: 90.0,
			demand_model: DemandModel::Cn{ demand_per_cn_gbps: 0.2 },
		}
	}

	#[test]
	fn two_dns_in_clear_view_get_a_symmetric_link_pair()
	{
		let devices: BTreeMap<String,Device> = [("DN-1".to_string(),dn_device())].into_iter().collect();
		let raw_sites = vec![
			RawSite{ position: Point3::new(0.0,0.0,30.0), site_type: SiteType::Dn, building_id: None, device_sku: Some("DN-1".into()), number_of_subscribers: None },
			RawSite{ position: Point3::new(100.0,0.0,30.0), site_type: SiteType::Dn, building_id: None, device_sku: Some("DN-1".into()), number_of_subscribers: None },
		];
		let dsm = flat_dsm();
		let config = default_builder_config();
		let graph = build_candidate_graph(&raw_sites,&devices,&[],&dsm,&config).unwrap();
		assert_eq!(graph.sites.len(),2);
		assert_eq!(graph.links.len(),2, "expected both directions of the backhaul pair");
	}

	#[test]
	fn empty_sites_is_a_data_error()
	{
		let devices: BTreeMap<String,Device> = [("DN-1".to_string(),dn_device())].into_iter().collect();
		let dsm = flat_dsm();
		let config = default_builder_config();
		let result = build_candidate_graph(&[],&devices,&[],&dsm,&config);
		assert_eq!(result.unwrap_err(), DataError::NoSites);
	}

	#[test]
	fn cn_demand_model_attaches_one_demand_site_per_cn()
	{
		let mut devices: BTreeMap<String,Device> = [("DN-1".to_string(),dn_device())].into_iter().collect();
		let mut cn = dn_device();
		cn.sku = "CN-1".into();
		cn.device_type = DeviceType::Cn;
		devices.insert("CN-1".into(),cn);

		let raw_sites = vec![
			RawSite{ position: Point3::new(0.0,0.0,30.0), site_type: SiteType::Dn, building_id: None, device_sku: Some("DN-1".into()), number_of_subscribers: None },
			RawSite{ position: Point3::new(50.0,0.0,10.0), site_type: SiteType::Cn, building_id: None, device_sku: Some("CN-1".into()), number_of_subscribers: Some(3) },
		];
		let dsm = flat_dsm();
		let config = default_builder_config();
		let graph = build_candidate_graph(&raw_sites,&devices,&[],&dsm,&config).unwrap();
		assert_eq!(graph.demand_sites.len(),1);
		let demand = graph.demand_sites.values().next().unwrap();
		assert!((demand.demand_gbps - 0.6).abs() < 1e-9);
	}

	#[test]
	fn interior_angle_of_a_right_angle_corner_is_ninety()
	{
		let prev = Point2::new(0.0,1.0);
		let here = Point2::new(0.0,0.0);
		let next = Point2::new(1.0,0.0);
		assert!((interior_angle_deg(prev,here,next)-90.0).abs() < 1e-6);
	}
}
