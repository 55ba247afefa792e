/*!

The Candidate Graph (spec.md §3, §4.4, component C4): sites, devices, sectors,
links and demand sites, plus the stable hash-derived ids that make every
downstream ordering deterministic (spec.md §5: "iteration over set-like
containers uses sorted order, never insertion order").

*/

pub mod builder;

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::geometry::Point3;
use crate::radio::{AngleLossTable, McsRow};

///A stable, order-independent identifier: the first 16 bytes of a SHA-256
///digest over a canonical encoding of an entity's defining attributes
///(spec.md §5: "a cryptographic-strength hash (MD5 or equivalent)"; this
///crate uses SHA-256 truncated to 16 bytes, see DESIGN.md). Implements `Ord`
///so containers keyed by `EntityId` sort into the canonical deterministic
///order spec.md §3/§5 require.
#[derive(Debug,Clone,Copy,PartialEq,Eq,PartialOrd,Ord,Hash)]
pub struct EntityId([u8;16]);

impl EntityId
{
	fn from_canonical(fields:&[&str]) -> EntityId
	{
		let mut hasher = Sha256::new();
		for (i,field) in fields.iter().enumerate()
		{
			if i>0
			{
				hasher.update(b"\x1f"); //unit separator: keeps "ab","c" distinct from "a","bc"
			}
			hasher.update(field.as_bytes());
		}
		let digest = hasher.finalize();
		let mut bytes = [0u8;16];
		bytes.copy_from_slice(&digest[..16]);
		EntityId(bytes)
	}

	pub fn as_bytes(&self) -> &[u8;16]
	{
		&self.0
	}

	pub fn to_hex(&self) -> String
	{
		self.0.iter().map(|b|format!("{b:02x}")).collect()
	}
}

impl std::fmt::Display for EntityId
{
	fn fmt(&self, f:&mut std::fmt::Formatter<'_>) -> std::fmt::Result
	{
		write!(f,"{}",self.to_hex())
	}
}

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub enum SiteType
{
	Pop,
	Dn,
	Cn,
	Demand,
}

impl SiteType
{
	fn canonical_tag(&self) -> &'static str
	{
		match self
		{
			SiteType::Pop => "POP",
			SiteType::Dn => "DN",
			SiteType::Cn => "CN",
			SiteType::Demand => "DEMAND",
		}
	}
}

///A geographic installation candidate (spec.md §3 "Site"). Position is carried
///in a local projected frame (the same frame the LOS/raster modules use);
///converting from WGS-84 longitude/latitude is an external collaborator's job
///per spec.md §1.
#[derive(Debug,Clone)]
pub struct Site
{
	pub id: EntityId,
	pub position: Point3,
	pub site_type: SiteType,
	pub building_id: Option<String>,
	pub device_sku: Option<String>,
	pub number_of_subscribers: Option<u32>,
}

impl Site
{
	///Computes this site's stable id from its defining attributes
	///(spec.md §5: hash of longitude, latitude, altitude, type, device-SKU).
	///`lon`/`lat` are the original WGS-84 coordinates the site was ingested
	///with; callers that only have the projected frame must carry the
	///original pair alongside it for id purposes.
	pub fn compute_id(lon:f64, lat:f64, alt:f64, site_type:SiteType, device_sku:Option<&str>) -> EntityId
	{
		let lon_s = format!("{lon:.9}");
		let lat_s = format!("{lat:.9}");
		let alt_s = format!("{alt:.3}");
		let type_s = site_type.canonical_tag();
		let sku_s = device_sku.unwrap_or("");
		EntityId::from_canonical(&[&lon_s,&lat_s,&alt_s,type_s,sku_s])
	}
}

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub enum DeviceType
{
	Dn,
	Cn,
}

///Hardware profile shared by every Sector a Device instantiates
///(spec.md §3 "Device").
#[derive(Debug,Clone)]
pub struct SectorProfile
{
	pub scan_range_deg: f64,
	pub sectors_per_node: u32,
	pub boresight_gain_dbi: f64,
	pub tx_power_min_dbm: f64,
	pub tx_power_max_dbm: f64,
	pub rx_sensitivity_dbm: f64,
	pub diversity_gain_db: f64,
	pub misc_loss_db: f64,
	pub antenna_pattern: AngleLossTable,
	pub scan_pattern: AngleLossTable,
	pub mcs_table: Vec<McsRow>,
}

///A hardware profile a Site may be instantiated with (spec.md §3 "Device").
///**Invariant:** CN devices always have exactly one node per site (enforced
///by the builder, which never instantiates more than one CN node).
#[derive(Debug,Clone)]
pub struct Device
{
	pub sku: String,
	pub device_type: DeviceType,
	pub node_capex: f64,
	pub max_nodes_per_site: u32,
	pub sector_profile: SectorProfile,
}

impl Device
{
	pub fn is_compatible_with(&self, site_type:SiteType) -> bool
	{
		match (self.device_type,site_type)
		{
			(DeviceType::Dn,SiteType::Pop) | (DeviceType::Dn,SiteType::Dn) => true,
			(DeviceType::Cn,SiteType::Cn) => true,
			_ => false,
		}
	}
}

///A realized radio aperture on a site (spec.md §3 "Sector"). **Invariant:**
///all sectors sharing a `node_index` on the same site are selected together
///(modeled, not stored, as an equality constraint in the ILP builder).
#[derive(Debug,Clone)]
pub struct Sector
{
	pub id: EntityId,
	pub site_id: EntityId,
	pub node_index: u32,
	///Index of this sector's arc among the node's sectors, in boresight order.
	pub position: u32,
	pub boresight_deg: f64,
	pub half_width_deg: f64,
}

impl Sector
{
	pub fn compute_id(site_id:&EntityId, node_index:u32, position:u32, device_type:DeviceType) -> EntityId
	{
		let type_s = match device_type { DeviceType::Dn => "DN", DeviceType::Cn => "CN" };
		EntityId::from_canonical(&[
			&site_id.to_hex(),
			&node_index.to_string(),
			&position.to_string(),
			type_s,
		])
	}

	///Whether a direction (degrees, same convention as `Segment3::azimuth`)
	///deviates from this sector's boresight by more than its half scan range.
	pub fn angular_deviation(&self, azimuth_deg:f64) -> f64
	{
		let mut delta = (azimuth_deg - self.boresight_deg) % 360.0;
		if delta > 180.0
		{
			delta -= 360.0;
		}
		if delta < -180.0
		{
			delta += 360.0;
		}
		delta.abs()
	}

	pub fn within_scan_range(&self, azimuth_deg:f64) -> bool
	{
		self.angular_deviation(azimuth_deg) <= self.half_width_deg
	}
}

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub enum LinkKind
{
	Backhaul,
	Access,
}

///A directed candidate link (spec.md §3 "Link"). Backhaul links always come
///in symmetric pairs (i,j) and (j,i); access links (DN→CN) are one-directional.
#[derive(Debug,Clone)]
pub struct Link
{
	pub id: EntityId,
	pub from: EntityId,
	pub to: EntityId,
	pub from_sector: EntityId,
	pub to_sector: EntityId,
	pub kind: LinkKind,
	pub distance_m: f64,
	pub azimuth_deg: f64,
	pub elevation_deg: f64,
	pub from_deviation_deg: f64,
	pub to_deviation_deg: f64,
	pub rsl_dbm: f64,
	///Throughput (Mbps) reachable at each MCS class, indexed by MCS class id.
	pub capacity_by_mcs: BTreeMap<u32,f64>,
	pub confidence: f64,
}

impl Link
{
	pub fn compute_id(from:&EntityId, to:&EntityId) -> EntityId
	{
		EntityId::from_canonical(&[&from.to_hex(),&to.to_hex()])
	}

	///Throughput at the highest MCS class this link can sustain, or `0.0` when
	///no class is reachable (spec.md §7 NumericalWarning: "link is marked
	///zero-capacity but retained for topology continuity").
	pub fn best_capacity_mbps(&self) -> f64
	{
		self.capacity_by_mcs.values().copied().fold(0.0,f64::max)
	}
}

///A synthetic demand sink attached to one or more CNs/DNs (spec.md §3
///"Demand Site"). Co-owned by the graph and by its connecting sites.
#[derive(Debug,Clone)]
pub struct DemandSite
{
	pub id: EntityId,
	pub demand_gbps: f64,
	pub connected_sites: Vec<EntityId>,
}

///Per-entity flags tracking the current selection state (spec.md §3
///"Topology State").
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub enum SelectionFlag
{
	Candidate,
	Proposed,
	Existing,
}

///A directed multigraph over sites, the implicit super-source, and demand
///sites (spec.md §3 "Candidate Graph"). `sites`/`sectors`/`links`/`demand_sites`
///are `BTreeMap`s keyed by `EntityId` so iteration is always in the canonical
///deterministic order (spec.md §5), never insertion order.
#[derive(Debug,Clone,Default)]
pub struct CandidateGraph
{
	pub sites: BTreeMap<EntityId,Site>,
	pub sectors: BTreeMap<EntityId,Sector>,
	pub links: BTreeMap<EntityId,Link>,
	pub demand_sites: BTreeMap<EntityId,DemandSite>,
}

impl CandidateGraph
{
	pub fn new() -> CandidateGraph
	{
		CandidateGraph::default()
	}

	///Sites in canonical sorted-id order (spec.md §3: "sites are sorted by a
	///stable identifier").
	pub fn sites_sorted(&self) -> impl Iterator<Item=&Site>
	{
		self.sites.values()
	}

	///Sectors belonging to a given site, in `(node_index, position)` order.
	pub fn sectors_of(&self, site_id:&EntityId) -> Vec<&Sector>
	{
		let mut out: Vec<&Sector> = self.sectors.values().filter(|s|&s.site_id==site_id).collect();
		out.sort_by_key(|s|(s.node_index,s.position));
		out
	}

	///Links with `from == site_id`, in sorted-by-id order (already guaranteed
	///by the underlying `BTreeMap` iteration).
	pub fn links_from(&self, site_id:&EntityId) -> impl Iterator<Item=&Link>
	{
		self.links.values().filter(move |l|&l.from==site_id)
	}

	pub fn links_to(&self, site_id:&EntityId) -> impl Iterator<Item=&Link>
	{
		self.links.values().filter(move |l|&l.to==site_id)
	}
}

///The mutable selection state handed between pipeline phases (spec.md §3
///"Topology State", §9 "the planner keeps ... a single mutable Topology handed
///between phases by value"). Each phase consumes one `TopologyState` and
///produces a new one; nothing here is mutated during a solve.
#[derive(Debug,Clone,Default)]
pub struct TopologyState
{
	pub site_flags: BTreeMap<EntityId,SelectionFlag>,
	pub sector_channel: BTreeMap<EntityId,u32>,
	pub link_mcs_class: BTreeMap<EntityId,u32>,
	pub link_time_division: BTreeMap<EntityId,f64>,
	pub site_polarity: BTreeMap<EntityId,bool>,
	pub demand_shortfall: BTreeMap<EntityId,f64>,
}

impl TopologyState
{
	pub fn new() -> TopologyState
	{
		TopologyState::default()
	}

	pub fn is_selected(&self, site_id:&EntityId) -> bool
	{
		matches!(self.site_flags.get(site_id), Some(SelectionFlag::Proposed) | Some(SelectionFlag::Existing))
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn site_id_is_stable_and_order_independent_of_construction()
	{
		let a = Site::compute_id(-122.1,37.4,10.0,SiteType::Dn,Some("SKU-1"));
		let b = Site::compute_id(-122.1,37.4,10.0,SiteType::Dn,Some("SKU-1"));
		assert_eq!(a,b);
	}

	#[test]
	fn site_id_changes_with_device_sku()
	{
		let a = Site::compute_id(-122.1,37.4,10.0,SiteType::Dn,Some("SKU-1"));
		let b = Site::compute_id(-122.1,37.4,10.0,SiteType::Dn,Some("SKU-2"));
		assert_ne!(a,b);
	}

	#[test]
	fn entity_ids_sort_deterministically()
	{
		let a = Site::compute_id(0.0,0.0,0.0,SiteType::Pop,None);
		let b = Site::compute_id(1.0,0.0,0.0,SiteType::Pop,None);
		let mut v = vec![b,a];
		v.sort();
		//Regardless of insertion order, the same pair sorts to the same order.
		let mut v2 = vec![a,b];
		v2.sort();
		assert_eq!(v,v2);
	}

	#[test]
	fn sector_angular_deviation_wraps_around_360()
	{
		let sector = Sector{
			id: Site::compute_id(0.0,0.0,0.0,SiteType::Dn,None),
			site_id: Site::compute_id(0.0,0.0,0.0,SiteType::Dn,None),
			node_index: 0,
			position: 0,
			boresight_deg: 350.0,
			half_width_deg: 30.0,
		};
		assert!((sector.angular_deviation(10.0)-20.0).abs() < 1e-9);
		assert!(sector.within_scan_range(10.0));
		assert!(!sector.within_scan_range(150.0));
	}
}
