/*!

The ellipsoidal LOS model (spec.md §4.2): a prolate spheroid whose foci are the
two sites and whose semi-minor axis is the first Fresnel radius `F1`. Terrain
that pokes through the spheroid's surface obstructs; confidence is how far the
terrain sits from the boundary, expressed as the semi-minor axis of the largest
confocal spheroid the terrain does not intrude into.

*/

use crate::geometry::{Point2, Point3, Segment3};
use crate::geometry::window::CellWindow;
use crate::raster::Dsm;

///First Fresnel zone radius, meters, for a link of length `distance_km` at
///`frequency_ghz` (GLOSSARY: `F1 = 8.656 * sqrt(D_km/f_GHz)`).
pub fn fresnel_radius_m(distance_km:f64, frequency_ghz:f64) -> f64
{
	8.656 * (distance_km/frequency_ghz).sqrt()
}

///Scans the raster for obstructions against the confocal-spheroid family and
///returns the ellipsoidal-model confidence in `[0,1]`.
pub fn confidence(segment:&Segment3, frequency_ghz:f64, dsm:&Dsm) -> f64
{
	let distance_m = segment.length();
	if distance_m <= 0.0
	{
		return 1.0;
	}
	let f1 = fresnel_radius_m(distance_m/1000.0,frequency_ghz);
	if f1 <= 0.0
	{
		return 1.0;
	}
	let azimuth = segment.azimuth();
	let midpoint = Point2::new((segment.a.x+segment.b.x)/2.0, (segment.a.y+segment.b.y)/2.0);
	let semi_major = distance_m/2.0;

	let mut min_ratio = 1.0f64;
	let window = CellWindow::for_segment(segment,f1,dsm.cell_size());
	for cell in window
	{
		let Some(surface_h) = dsm.height_at(cell) else { continue };
		let center = dsm.cell_center(cell);
		if !inside_2d_ellipse_prefilter(center,midpoint,azimuth,semi_major,f1)
		{
			continue;
		}
		if let Some(ratio) = obstruction_ratio(segment,azimuth,semi_major,f1,center,surface_h)
		{
			if ratio < min_ratio
			{
				min_ratio = ratio;
			}
		}
	}
	min_ratio.clamp(0.0,1.0)
}

///The cheap 2D ellipse pre-filter of spec.md §4.2 step 1: cells outside the
///ground projection of the spheroid cannot obstruct it at any height.
fn inside_2d_ellipse_prefilter(cell:Point2, midpoint:Point2, azimuth:f64, semi_major:f64, semi_minor:f64) -> bool
{
	let dx = cell.x - midpoint.x;
	let dy = cell.y - midpoint.y;
	let (sin_a,cos_a) = azimuth.sin_cos();
	let u = dx*cos_a + dy*sin_a;
	let v = dx*sin_a - dy*cos_a;
	(u/semi_major).powi(2) + (v/semi_minor).powi(2) <= 1.0
}

///For a cell inside the 2D pre-filter, solves for the largest confocal spheroid
///(same foci, hence the same `semi_major^2 - semi_minor^2`) whose surface the
///terrain does not cross, and returns that spheroid's semi-minor axis divided by
///`f1`. `None` when the cell's horizontal location is entirely outside the full
///spheroid (no real intersection at any height, spec.md §4.2 step 2: "if
///discriminant < 0, cell is outside the 3D ellipsoid").
fn obstruction_ratio(segment:&Segment3, azimuth:f64, semi_major:f64, f1:f64, cell:Point2, surface_h:f64) -> Option<f64>
{
	let midpoint = Point3::new(
		(segment.a.x+segment.b.x)/2.0,
		(segment.a.y+segment.b.y)/2.0,
		(segment.a.z+segment.b.z)/2.0,
	);
	let horiz_after_rotation = {
		//horizontal distance between the two foci once the ground azimuth rotation
		//has been applied, used to find the tilt angle B.
		segment.horizontal_length()
	};
	let dz = segment.b.z - segment.a.z;
	let tilt_b = dz.atan2(horiz_after_rotation);

	let dx = cell.x - midpoint.x;
	let dy = cell.y - midpoint.y;
	let dz_query = surface_h - midpoint.z;

	let (sin_a,cos_a) = azimuth.sin_cos();
	let vx1 = dx*cos_a + dy*sin_a;
	let vy1 = dx*sin_a - dy*cos_a;

	let (sin_b,cos_b) = tilt_b.sin_cos();
	//Local frame: vx2 is along the major axis, vy1/vz2 span the minor-axis plane.
	let vx2 = vx1*cos_b + dz_query*sin_b;
	let vz2 = -vx1*sin_b + dz_query*cos_b;
	let vy2 = vy1;

	let f2 = semi_major*semi_major - f1*f1; //squared focal half-distance, fixed across the confocal family
	let lx2 = vx2*vx2;
	let r2 = vy2*vy2 + vz2*vz2;

	//Solve u^2 + u*(f2 - lx2 - r2) - r2*f2 = 0 for u = semi_minor^2 of the confocal
	//spheroid whose surface passes through this exact point.
	let b_coeff = f2 - lx2 - r2;
	let c_coeff = -r2*f2;
	let discriminant = b_coeff*b_coeff - 4.0*c_coeff;
	if discriminant < 0.0
	{
		return None;
	}
	let sqrt_disc = discriminant.sqrt();
	let root1 = (-b_coeff + sqrt_disc)/2.0;
	let root2 = (-b_coeff - sqrt_disc)/2.0;
	let u = if root1 >= 0.0 { root1 } else { root2 };
	if u < 0.0
	{
		return None;
	}
	let semi_minor_at_surface = u.sqrt();
	Some(semi_minor_at_surface/f1)
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn fresnel_radius_matches_glossary_formula()
	{
		let f1 = fresnel_radius_m(1.0,60.0);
		assert!((f1 - 8.656/60.0f64.sqrt()).abs() < 1e-9);
	}

	fn flat_dsm(height:f64,half_extent:usize) -> Dsm
	{
		let n = half_extent*2+1;
		Dsm::new(-(half_extent as f64)-0.5,-(half_extent as f64)-0.5,1.0,n,n,vec![height;n*n])
	}

	#[test]
	fn clear_flat_terrain_gives_full_confidence()
	{
		let seg = Segment3::new(Point3::new(0.0,0.0,30.0),Point3::new(200.0,0.0,30.0));
		let dsm = flat_dsm(-500.0,150);
		let c = confidence(&seg,60.0,&dsm);
		assert_eq!(c,1.0);
	}

	#[test]
	fn terrain_breaking_the_spheroid_surface_reduces_confidence()
	{
		let seg = Segment3::new(Point3::new(0.0,0.0,30.0),Point3::new(200.0,0.0,30.0));
		let mut dsm = flat_dsm(-500.0,150);
		//Raise a bump at the midpoint, directly on the axis, to surface height 30:
		//this sits exactly at the path height, intruding deeply into the spheroid.
		let col = (150.0 + 100.0) as usize;
		let row = (150.0 + 0.0) as usize;
		let n = 301;
		let mut heights = (0..n*n).map(|_|-500.0).collect::<Vec<f64>>();
		heights[row*n+col] = 30.0;
		dsm = Dsm::new(-150.5,-150.5,1.0,n,n,heights);
		let c = confidence(&seg,60.0,&dsm);
		assert!(c < 1.0, "confidence was {c}");
	}
}
