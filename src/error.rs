/*!

Error kinds for the planner, per the error handling design: configuration and data
problems are surfaced immediately with full context; solver outcomes are typed
results, never exceptions; low level geometric degeneracies are recovered locally
inside the LOS validator and never reach this type.

*/

use thiserror::Error;

///Fatal before any work begins: the configuration itself is contradictory or
///references something that does not exist.
#[derive(Error,Debug,Clone,PartialEq)]
pub enum ConfigError
{
	#[error("site references unrecognized device SKU {sku:?}")]
	UnknownDeviceSku{ sku: String },
	#[error("required input is missing: {what}")]
	MissingInput{ what: String },
	#[error("contradictory options: {left} cannot be used together with {right}")]
	Contradictory{ left: String, right: String },
	#[error("unrecognized configuration field: {field}")]
	UnrecognizedField{ field: String },
}

///Fatal before any work begins: the supplied data (as opposed to the configuration
///that describes how to interpret it) is unusable.
#[derive(Error,Debug,Clone,PartialEq)]
pub enum DataError
{
	#[error("raster is unreadable or empty")]
	EmptyRaster,
	#[error("boundary polygon is empty")]
	EmptyBoundary,
	#[error("no devices were supplied")]
	NoDevices,
	#[error("no sites were supplied")]
	NoSites,
	#[error("angle loss table contains a NaN angle")]
	MalformedAngleTable,
}

///A numerical condition that does not abort the run: the link it concerns is kept
///in the topology for continuity but is marked zero-capacity.
#[derive(Debug,Clone,PartialEq)]
pub struct NumericalWarning
{
	pub site_i: String,
	pub site_j: String,
	pub detail: String,
}

///The top level error type returned by fallible planner entry points.
#[derive(Error,Debug,Clone,PartialEq)]
pub enum PlannerError
{
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),
	#[error("data error: {0}")]
	Data(#[from] DataError),
	///A phase could not satisfy its constraints and every relaxation available to
	///that phase has been exhausted.
	#[error("phase {phase} is infeasible after exhausting relaxation: {detail}")]
	Infeasible{ phase: String, detail: String },
	///The solver ran out of time. Carries the best known solution's objective
	///value, when one was found before the limit.
	#[error("solver timed out on phase {phase} (best objective so far: {best_objective:?})")]
	SolverTimeout{ phase: String, best_objective: Option<f64> },
}
