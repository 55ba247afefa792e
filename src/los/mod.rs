/*!

The LOS Validator (spec.md §4.2, component C2). Given two site positions and a
raster DSM, decides REJECT or ACCEPT(confidence), first through a battery of
cheap, purely algebraic preconditions and then, only if none of those fire,
through one of two geometric obstruction models against the actual terrain.

Geometry never panics here: every degenerate configuration (coincident sites,
zero-length segments, points outside the raster) is caught by the easy-reject
preconditions or folds into "no obstruction from this cell", per spec.md §4.2's
failure semantics ("No exception is thrown for degenerate inputs").

*/

pub mod cylindrical;
pub mod ellipsoidal;

use geo::{Polygon, Contains, Intersects};
use geo::{Coord, Line};

use crate::geometry::{Point3, Segment3};
use crate::raster::Dsm;

///Which geometric obstruction model the validator uses once the easy-reject
///preconditions have all passed.
#[derive(Debug,Clone,Copy,PartialEq,Eq,serde::Serialize,serde::Deserialize)]
#[serde(rename_all="SCREAMING_SNAKE_CASE")]
pub enum LosModel
{
	Cylindrical,
	Ellipsoidal,
}

///The subset of a site's attributes the LOS validator needs. Deliberately not the
///full graph `Site`: the LOS engine must not depend on the candidate graph module.
#[derive(Debug,Clone,PartialEq)]
pub struct LosSite
{
	pub position: Point3,
	pub building_id: Option<String>,
}

///Configuration consumed by the validator; a narrowed view of the planner-wide
///configuration surface (spec.md §6).
#[derive(Debug,Clone)]
pub struct LosConfig
{
	pub model: LosModel,
	///First Fresnel zone search radius for the cylindrical model, meters.
	pub fresnel_radius_m: f64,
	///Minimum accepted confidence; also the monotone-confidence lever of spec.md §8 property 4.
	pub confidence_threshold: f64,
	///Maximum allowed |elevation angle|, degrees. 90 disables the check.
	pub max_elevation_angle_deg: f64,
	pub min_distance_m: f64,
	pub max_distance_m: f64,
	///Carrier frequency, used by the ellipsoidal model's Fresnel radius formula.
	pub frequency_ghz: f64,
	pub exclusion_polygons: Vec<Polygon<f64>>,
}

///Why an ordered pair was rejected before any DSM iteration occurred
///(spec.md §8 property 2, "easy-reject purity").
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum EasyReject
{
	ZeroHorizontalDistance,
	ElevationAngleExceeded,
	SameBuilding,
	DistanceOutOfRange,
	ExclusionPolygon,
}

#[derive(Debug,Clone,Copy,PartialEq)]
pub enum LosOutcome
{
	Reject(EasyReject),
	///Survived every easy-reject precondition but the terrain scan's confidence
	///fell below the user threshold (spec.md §4.2: "ACCEPT iff confidence >= user
	///threshold"). The confidence is kept for diagnostics and for the monotone
	///confidence property (spec.md §8 property 4).
	GeometricReject{ confidence: f64 },
	Accept{ confidence: f64 },
}

impl LosOutcome
{
	pub fn is_accept(&self) -> bool
	{
		matches!(self,LosOutcome::Accept{..})
	}
}

pub struct LosValidator
{
	config: LosConfig,
}

impl LosValidator
{
	pub fn new(config:LosConfig) -> LosValidator
	{
		LosValidator{ config }
	}

	///Evaluates the easy-reject preconditions, in the order given by spec.md §4.2.
	///Returns the first precondition that fires, or `None` if the pair survives to
	///the geometric stage.
	pub fn easy_reject(&self, a:&LosSite, b:&LosSite) -> Option<EasyReject>
	{
		if a.position.horizontal_distance_to(&b.position) == 0.0
		{
			return Some(EasyReject::ZeroHorizontalDistance);
		}
		if self.config.max_elevation_angle_deg < 90.0
		{
			let horiz = a.position.horizontal_distance_to(&b.position);
			let dz = b.position.z - a.position.z;
			let elevation_deg = dz.atan2(horiz).to_degrees();
			if elevation_deg.abs() > self.config.max_elevation_angle_deg
			{
				return Some(EasyReject::ElevationAngleExceeded);
			}
		}
		if let (Some(bid_a),Some(bid_b)) = (&a.building_id,&b.building_id)
		{
			if bid_a == bid_b
			{
				return Some(EasyReject::SameBuilding);
			}
		}
		let dist3 = a.position.distance_to(&b.position);
		if dist3 > self.config.max_distance_m || dist3 < self.config.min_distance_m
		{
			return Some(EasyReject::DistanceOutOfRange);
		}
		if !self.config.exclusion_polygons.is_empty()
		{
			let line = Line::new(
				Coord{ x: a.position.x, y: a.position.y },
				Coord{ x: b.position.x, y: b.position.y },
			);
			for polygon in &self.config.exclusion_polygons
			{
				if polygon.intersects(&line) || polygon.contains(&line.start) || polygon.contains(&line.end)
				{
					return Some(EasyReject::ExclusionPolygon);
				}
			}
		}
		None
	}

	///Full LOS decision for an ordered pair. `dsm` is consulted only once every
	///easy-reject precondition has passed (spec.md §8 property 2).
	pub fn validate(&self, a:&LosSite, b:&LosSite, dsm:&Dsm) -> LosOutcome
	{
		if let Some(reason) = self.easy_reject(a,b)
		{
			return LosOutcome::Reject(reason);
		}
		let segment = Segment3::new(a.position,b.position);
		let confidence = match self.config.model
		{
			LosModel::Cylindrical => cylindrical::confidence(&segment,self.config.fresnel_radius_m,dsm),
			LosModel::Ellipsoidal => ellipsoidal::confidence(&segment,self.config.frequency_ghz,dsm),
		};
		if confidence < self.config.confidence_threshold
		{
			LosOutcome::GeometricReject{ confidence }
		}
		else
		{
			LosOutcome::Accept{ confidence }
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::geometry::Point3;

	fn validator(model:LosModel) -> LosValidator
	{
		LosValidator::new(LosConfig{
			model,
			fresnel_radius_m: 1.0,
			confidence_threshold: 0.3,
			max_elevation_angle_deg: 25.0,
			min_distance_m: 10.0,
			max_distance_m: 10_000.0,
			frequency_ghz: 60.0,
			exclusion_polygons: vec![],
		})
	}

	#[test]
	fn zero_horizontal_distance_is_easy_rejected()
	{
		let v = validator(LosModel::Cylindrical);
		let a = LosSite{ position: Point3::new(0.0,0.0,10.0), building_id: None };
		let b = LosSite{ position: Point3::new(0.0,0.0,30.0), building_id: None };
		assert_eq!(v.easy_reject(&a,&b), Some(EasyReject::ZeroHorizontalDistance));
	}

	#[test]
	fn same_building_is_easy_rejected_regardless_of_geometry()
	{
		let v = validator(LosModel::Cylindrical);
		let a = LosSite{ position: Point3::new(0.0,0.0,50.0), building_id: Some("B1".into()) };
		let b = LosSite{ position: Point3::new(100.0,0.0,5.0), building_id: Some("B1".into()) };
		assert_eq!(v.easy_reject(&a,&b), Some(EasyReject::SameBuilding));
	}

	#[test]
	fn elevation_angle_limit_rejects_steep_pairs()
	{
		let v = validator(LosModel::Cylindrical);
		let a = LosSite{ position: Point3::new(0.0,0.0,0.0), building_id: None };
		//horizontal 10, vertical 100 -> elevation ~84 deg, exceeds 25 deg default
		let b = LosSite{ position: Point3::new(10.0,0.0,100.0), building_id: None };
		assert_eq!(v.easy_reject(&a,&b), Some(EasyReject::ElevationAngleExceeded));
	}

	#[test]
	fn distance_out_of_range_is_easy_rejected()
	{
		let v = validator(LosModel::Cylindrical);
		let a = LosSite{ position: Point3::new(0.0,0.0,0.0), building_id: None };
		let b = LosSite{ position: Point3::new(5.0,0.0,0.0), building_id: None }; //below min_distance_m
		assert_eq!(v.easy_reject(&a,&b), Some(EasyReject::DistanceOutOfRange));
	}
}
