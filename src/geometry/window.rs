/*!

The rectangular-window scan over raster cells touching a link's horizontal
footprint (spec.md §4.1, "cells touching a link").

The window is computed by taking the axis-aligned bounding box of the segment's
two endpoints expanded by the search radius in every direction, then snapping
that box to raster cell indices. The iterator itself performs no distance test;
callers (the cylindrical and ellipsoidal LOS models) filter by 2D distance to
the segment as they consume it, since the exact test differs between the two
geometric models.

*/

use crate::geometry::{Point2, Segment3};

///Integer coordinates of a raster cell.
#[derive(Debug,Clone,Copy,PartialEq,Eq,PartialOrd,Ord,Hash)]
pub struct CellCoord
{
	pub col: i64,
	pub row: i64,
}

///A lazy, deterministic scanline iterator over the raster cells inside the
///axis-aligned bounding window of a link's horizontal projection, expanded by a
///search radius. Row-major order, rows increasing then columns increasing within
///a row: this order is part of the determinism contract (spec.md §5, §8 property 1).
pub struct CellWindow
{
	min_col: i64,
	max_col: i64,
	min_row: i64,
	max_row: i64,
	col: i64,
	row: i64,
}

impl CellWindow
{
	///Builds the window for a segment's horizontal projection, a search radius, and
	///the raster's cell size. Returns an empty window when the segment is degenerate
	///and the radius is zero; a degenerate segment with positive radius still yields
	///the disc of cells around the single point, since the easy-reject for zero
	///horizontal distance is applied by the LOS validator before this is ever built,
	///not by this iterator.
	pub fn for_segment(segment:&Segment3, radius:f64, cell_size:f64) -> CellWindow
	{
		let a = segment.a.horizontal();
		let b = segment.b.horizontal();
		Self::for_bounds(a,b,radius,cell_size)
	}

	pub fn for_bounds(a:Point2, b:Point2, radius:f64, cell_size:f64) -> CellWindow
	{
		let min_x = a.x.min(b.x) - radius;
		let max_x = a.x.max(b.x) + radius;
		let min_y = a.y.min(b.y) - radius;
		let max_y = a.y.max(b.y) + radius;
		let min_col = (min_x/cell_size).floor() as i64;
		let max_col = (max_x/cell_size).ceil() as i64;
		let min_row = (min_y/cell_size).floor() as i64;
		let max_row = (max_y/cell_size).ceil() as i64;
		CellWindow
		{
			min_col, max_col, min_row, max_row,
			col: min_col,
			row: min_row,
		}
	}

	///Number of cells this window would yield if fully consumed. Used by the LOS
	///engine to size worker chunks without materializing the iterator.
	pub fn len_hint(&self) -> usize
	{
		let cols = (self.max_col-self.min_col+1).max(0) as usize;
		let rows = (self.max_row-self.min_row+1).max(0) as usize;
		cols*rows
	}
}

impl Iterator for CellWindow
{
	type Item = CellCoord;
	fn next(&mut self) -> Option<CellCoord>
	{
		if self.row > self.max_row
		{
			return None;
		}
		let item = CellCoord{ col: self.col, row: self.row };
		self.col += 1;
		if self.col > self.max_col
		{
			self.col = self.min_col;
			self.row += 1;
		}
		Some(item)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::geometry::Point3;
	use crate::geometry::Segment3;

	#[test]
	fn window_covers_expected_cells_in_scanline_order()
	{
		let seg = Segment3::new(Point3::new(0.0,0.0,0.0),Point3::new(2.0,0.0,0.0));
		let w = CellWindow::for_segment(&seg,0.5,1.0);
		let cells: Vec<_> = w.collect();
		//bounding box x in [-0.5,2.5], y in [-0.5,0.5] at cell_size 1 -> cols -1..=2, rows -1..=0
		assert_eq!(cells.first(),Some(&CellCoord{col:-1,row:-1}));
		assert_eq!(cells.last(),Some(&CellCoord{col:2,row:0}));
		// row-major: first row fully enumerated before the second
		assert_eq!(cells[4],CellCoord{col:-1,row:0});
	}

	#[test]
	fn zero_radius_zero_extent_window_is_single_cell()
	{
		let w = CellWindow::for_bounds(Point2::new(0.4,0.4),Point2::new(0.4,0.4),0.0,1.0);
		let cells: Vec<_> = w.collect();
		assert_eq!(cells.len(),1);
	}
}
