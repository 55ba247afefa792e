/*!

2D/3D vector primitives and the rectangular-window raster-cell iterator used by the
LOS validator (component C1, "Geometry & Raster Index" in spec.md §4.1).

Everything here is pure geometry: no knowledge of sites, devices, or raster file
formats. The raster itself is defined in [`crate::raster`]; this module only needs
a cell size and a bounding box to decide which cells a search radius touches.

*/

pub mod window;

pub use window::{CellWindow, CellCoord};

///A point in the horizontal plane, meters or degrees depending on context.
///Used both for WGS-84 longitude/latitude pairs and for local projected coordinates;
///callers are responsible for keeping a single convention within one computation.
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Point2
{
	pub x: f64,
	pub y: f64,
}

impl Point2
{
	pub fn new(x:f64,y:f64) -> Point2
	{
		Point2{x,y}
	}
	pub fn distance_to(&self,other:&Point2) -> f64
	{
		((self.x-other.x).powi(2) + (self.y-other.y).powi(2)).sqrt()
	}
}

///A point in 3-space: horizontal plane plus altitude/elevation.
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Point3
{
	pub x: f64,
	pub y: f64,
	pub z: f64,
}

impl Point3
{
	pub fn new(x:f64,y:f64,z:f64) -> Point3
	{
		Point3{x,y,z}
	}
	pub fn horizontal(&self) -> Point2
	{
		Point2::new(self.x,self.y)
	}
	pub fn horizontal_distance_to(&self,other:&Point3) -> f64
	{
		self.horizontal().distance_to(&other.horizontal())
	}
	pub fn distance_to(&self,other:&Point3) -> f64
	{
		((self.x-other.x).powi(2) + (self.y-other.y).powi(2) + (self.z-other.z).powi(2)).sqrt()
	}
	pub fn sub(&self,other:&Point3) -> Vec3
	{
		Vec3{ x: self.x-other.x, y: self.y-other.y, z: self.z-other.z }
	}
	pub fn add(&self,v:&Vec3) -> Point3
	{
		Point3{ x: self.x+v.x, y: self.y+v.y, z: self.z+v.z }
	}
}

///A free vector, as opposed to [`Point3`] which denotes a location.
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Vec3
{
	pub x: f64,
	pub y: f64,
	pub z: f64,
}

impl Vec3
{
	pub fn dot(&self,other:&Vec3) -> f64
	{
		self.x*other.x + self.y*other.y + self.z*other.z
	}
	pub fn norm(&self) -> f64
	{
		self.dot(self).sqrt()
	}
	pub fn scale(&self,k:f64) -> Vec3
	{
		Vec3{ x: self.x*k, y: self.y*k, z: self.z*k }
	}
}

///A 3D line segment between two site locations, the axis of the LOS cylinder or the
///major axis of the LOS ellipsoid.
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Segment3
{
	pub a: Point3,
	pub b: Point3,
}

impl Segment3
{
	pub fn new(a:Point3,b:Point3) -> Segment3
	{
		Segment3{a,b}
	}
	///Direction vector from `a` to `b`. Zero length when the segment is degenerate.
	pub fn direction(&self) -> Vec3
	{
		self.b.sub(&self.a)
	}
	pub fn horizontal_length(&self) -> f64
	{
		self.a.horizontal_distance_to(&self.b)
	}
	pub fn length(&self) -> f64
	{
		self.a.distance_to(&self.b)
	}
	///Ground azimuth of the segment, radians, measured from the x axis (east) toward
	///the y axis (north); used to orient the ellipsoidal model's rotation.
	pub fn azimuth(&self) -> f64
	{
		let d = self.direction();
		d.y.atan2(d.x)
	}
	///Point at parameter `p` along the segment; `p=0` is `a`, `p=1` is `b`. Not
	///restricted to `[0,1]`, callers check the range themselves per spec.md §4.2.
	pub fn at(&self,p:f64) -> Point3
	{
		self.a.add(&self.direction().scale(p))
	}

	///Shortest distance from a query point, projected to the horizontal plane, to
	///the segment's horizontal projection, together with the projection parameter
	///`p` (spec.md §4.1: "distance from a grid cell center to the 3D link axis" and
	///"projection parameter p in [0,1]"). Both cylindrical and ellipsoidal models
	///reuse this for their easy 2D pre-filters.
	pub fn horizontal_projection(&self,query:Point2) -> (f64,f64)
	{
		let (ax,ay) = (self.a.x,self.a.y);
		let (bx,by) = (self.b.x,self.b.y);
		let (dx,dy) = (bx-ax,by-ay);
		let len2 = dx*dx+dy*dy;
		if len2 <= 0.0
		{
			return (query.distance_to(&Point2::new(ax,ay)), 0.0);
		}
		let p = ((query.x-ax)*dx + (query.y-ay)*dy) / len2;
		let proj = Point2::new(ax+p*dx, ay+p*dy);
		(query.distance_to(&proj), p)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn projection_parameter_midpoint()
	{
		let seg = Segment3::new(Point3::new(0.0,0.0,0.0),Point3::new(10.0,0.0,0.0));
		let (d,p) = seg.horizontal_projection(Point2::new(5.0,3.0));
		assert!((d-3.0).abs() < 1e-9);
		assert!((p-0.5).abs() < 1e-9);
	}

	#[test]
	fn projection_parameter_outside_segment()
	{
		let seg = Segment3::new(Point3::new(0.0,0.0,0.0),Point3::new(10.0,0.0,0.0));
		let (_d,p) = seg.horizontal_projection(Point2::new(-5.0,0.0));
		assert!(p < 0.0);
	}

	#[test]
	fn degenerate_segment_has_zero_horizontal_length()
	{
		let seg = Segment3::new(Point3::new(1.0,1.0,0.0),Point3::new(1.0,1.0,20.0));
		assert_eq!(seg.horizontal_length(),0.0);
	}
}
