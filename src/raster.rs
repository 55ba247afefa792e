/*!

The digital surface model: a regular elevation grid owned read-only by the LOS
engine (spec.md §3, "Raster DSM"). Reading raster tiles from GeoTIFF/DSM/DTM/DHM
files is an external collaborator (spec.md §1); this module only holds the
already-loaded grid and answers "what is the surface height at this cell".

*/

use crate::geometry::window::CellCoord;

///A regular elevation grid: `height[row][col]` gives the surface elevation at the
///cell whose lower-left corner is `(origin_x + col*cell_size, origin_y + row*cell_size)`.
///DSM = DTM + DHM when supplied separately (spec.md §6); combining the two rasters
///is left to the caller, which hands this module only the combined surface.
#[derive(Debug,Clone)]
pub struct Dsm
{
	origin_x: f64,
	origin_y: f64,
	cell_size: f64,
	num_cols: usize,
	num_rows: usize,
	heights: Vec<f64>,
}

impl Dsm
{
	pub fn new(origin_x:f64, origin_y:f64, cell_size:f64, num_cols:usize, num_rows:usize, heights:Vec<f64>) -> Dsm
	{
		assert_eq!(heights.len(), num_cols*num_rows, "DSM height buffer does not match num_cols*num_rows");
		assert!(cell_size > 0.0, "DSM cell size must be positive");
		Dsm{ origin_x, origin_y, cell_size, num_cols, num_rows, heights }
	}

	pub fn cell_size(&self) -> f64
	{
		self.cell_size
	}

	///Horizontal center of a cell, in the same coordinate system as `origin_x/origin_y`.
	pub fn cell_center(&self, cell:CellCoord) -> crate::geometry::Point2
	{
		crate::geometry::Point2::new(
			self.origin_x + (cell.col as f64 + 0.5)*self.cell_size,
			self.origin_y + (cell.row as f64 + 0.5)*self.cell_size,
		)
	}

	///Surface elevation at a cell, or `None` when the cell lies outside the grid.
	///Cells outside the grid never obstruct: they contribute nothing to the LOS
	///obstruction scan, which is the correct behavior at the edges of a tile.
	pub fn height_at(&self, cell:CellCoord) -> Option<f64>
	{
		if cell.col < 0 || cell.row < 0
		{
			return None;
		}
		let (col,row) = (cell.col as usize, cell.row as usize);
		if col >= self.num_cols || row >= self.num_rows
		{
			return None;
		}
		Some(self.heights[row*self.num_cols+col])
	}

	pub fn num_cols(&self) -> usize
	{
		self.num_cols
	}
	pub fn num_rows(&self) -> usize
	{
		self.num_rows
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn flat(value:f64, cols:usize, rows:usize) -> Dsm
	{
		Dsm::new(0.0,0.0,1.0,cols,rows,vec![value;cols*rows])
	}

	#[test]
	fn out_of_bounds_cell_returns_none()
	{
		let dsm = flat(10.0,3,3);
		assert_eq!(dsm.height_at(CellCoord{col:-1,row:0}), None);
		assert_eq!(dsm.height_at(CellCoord{col:3,row:0}), None);
	}

	#[test]
	fn in_bounds_cell_returns_height()
	{
		let dsm = flat(12.5,3,3);
		assert_eq!(dsm.height_at(CellCoord{col:1,row:1}), Some(12.5));
	}
}
