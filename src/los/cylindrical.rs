/*!

The cylindrical LOS model (spec.md §4.2): a uniform-radius tube of radius `R`
around the segment joining two sites. Terrain inside the tube blocks the link;
terrain that only grazes it reduces confidence proportionally to how close the
nearest obstruction comes to the tube wall.

*/

use crate::geometry::{Point3, Segment3};
use crate::geometry::window::CellWindow;
use crate::raster::Dsm;

///Scans every raster cell within `radius` of `segment`'s horizontal footprint and
///returns the cylindrical-model confidence in `[0,1]`. A confidence of `0` means
///the tube is blocked outright; `1` means no candidate cell came anywhere close
///to the tube wall (or none fell inside the segment's span at all).
pub fn confidence(segment:&Segment3, radius:f64, dsm:&Dsm) -> f64
{
	let mut min_clearance = f64::INFINITY;
	let window = CellWindow::for_segment(segment,radius,dsm.cell_size());
	for cell in window
	{
		let Some(surface_h) = dsm.height_at(cell) else { continue };
		let center = dsm.cell_center(cell);
		if let Some(clearance) = obstruction_clearance(segment,center,surface_h)
		{
			if clearance < min_clearance
			{
				min_clearance = clearance;
			}
		}
	}
	if min_clearance.is_infinite()
	{
		1.0
	}
	else
	{
		(min_clearance/radius).clamp(0.0,1.0)
	}
}

///Implements spec.md §4.2 steps 1-3: the shortest distance between the oblique
///link axis and the vertical obstruction line at a cell, or `None` when the cell
///does not obstruct at all (outside the segment's span, or the terrain sits
///below the direct path with no valid projection).
fn obstruction_clearance(segment:&Segment3, cell_center:crate::geometry::Point2, surface_h:f64) -> Option<f64>
{
	let (horizontal_distance,p) = segment.horizontal_projection(cell_center);
	if !(0.0..=1.0).contains(&p)
	{
		return None;
	}
	let z_at_p = segment.a.z + p*(segment.b.z - segment.a.z);
	let q = surface_h - z_at_p;
	if q >= 0.0
	{
		//The direct path dips at or below the terrain at its horizontal foot: the
		//minimum distance between the oblique line and the vertical obstruction
		//line reduces to the horizontal point-to-line distance (spec.md §4.2 step 1).
		Some(horizontal_distance)
	}
	else
	{
		//The terrain sits below the direct path at this horizontal foot; fall back
		//to the true 3D point-to-line distance from the obstruction top to the
		//link axis (spec.md §4.2 step 2), re-checking that its own closest point
		//still lies within the segment.
		let top = Point3::new(cell_center.x,cell_center.y,surface_h);
		point_to_segment_axis_distance(segment,top)
	}
}

///3D distance from `point` to the infinite line through `segment`'s endpoints,
///evaluated at that line's true closest point; `None` when that closest point's
///parameter falls outside `[0,1]`.
fn point_to_segment_axis_distance(segment:&Segment3, point:Point3) -> Option<f64>
{
	let dir = segment.direction();
	let len2 = dir.dot(&dir);
	if len2 <= 0.0
	{
		return None;
	}
	let w = point.sub(&segment.a);
	let p = w.dot(&dir)/len2;
	if !(0.0..=1.0).contains(&p)
	{
		return None;
	}
	let closest = segment.a.add(&dir.scale(p));
	Some(point.distance_to(&closest))
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::geometry::Point3;

	fn flat_dsm(height:f64) -> Dsm
	{
		Dsm::new(-50.0,-50.0,1.0,200,200,vec![height;200*200])
	}

	#[test]
	fn clear_path_over_flat_low_terrain_gets_full_confidence()
	{
		let seg = Segment3::new(Point3::new(0.0,0.0,30.0),Point3::new(100.0,0.0,30.0));
		let dsm = flat_dsm(0.0);
		let c = confidence(&seg,1.0,&dsm);
		assert_eq!(c,1.0);
	}

	#[test]
	fn bump_half_a_radius_off_axis_gives_half_confidence()
	{
		//Direct path at height 10 along the whole span. A single obstruction cell
		//sits 0.5 m off to the side of the axis (perpendicular offset), tall enough
		//to reach the direct path's height there: the cylindrical formula falls
		//into its "terrain at or above the path" branch and the clearance is exactly
		//the 0.5 m horizontal offset, giving confidence 0.5 for radius 1.0
		//(spec.md §8 scenario C).
		let seg = Segment3::new(Point3::new(0.0,0.0,10.0),Point3::new(100.0,0.0,10.0));
		let mut heights = vec![-100.0f64;200*200];
		let col = ((50.5 - -50.0)/1.0) as usize;
		let row = ((0.5 - -50.0)/1.0) as usize;
		heights[row*200+col] = 11.0; //above the path height of 10.0 at that horizontal foot
		let dsm = Dsm::new(-50.0,-50.0,1.0,200,200,heights);
		let c = confidence(&seg,1.0,&dsm);
		assert!((c-0.5).abs() < 1e-6, "confidence was {c}");
	}

	#[test]
	fn obstruction_directly_on_axis_blocks_link()
	{
		//A grid whose cell centers land exactly on integer coordinates, so a cell
		//can sit precisely on the link's axis (horizontal offset zero).
		let seg = Segment3::new(Point3::new(0.0,0.0,10.0),Point3::new(100.0,0.0,10.0));
		let mut heights = vec![-100.0f64;110*3];
		let col = 50usize;
		let row = 1usize; //y = row - 1 = 0, exactly on the axis
		heights[row*110+col] = 50.0; //well above the path, fully blocking
		let dsm = Dsm::new(-0.5,-1.5,1.0,110,3,heights);
		let c = confidence(&seg,1.0,&dsm);
		assert_eq!(c,0.0);
	}
}
