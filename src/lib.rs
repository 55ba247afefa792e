/*!

meshplan-lib
============

Core line-of-sight validation and network optimization engine for 60 GHz
mesh deployments: given a set of candidate sites, radio device profiles and
a digital surface model, this crate builds a candidate graph, validates
line-of-sight between every site pair, and runs a six-phase MILP pipeline
that selects sites, sectors, channels, polarities and per-link MCS classes
into a deployable topology.

# Scope

Reading raster tiles, shapefiles/KML and CLI/config-file glue are external
collaborators; this crate owns everything from an already-parsed
[`config::PlannerConfig`] and an already-loaded [`raster::Dsm`] through to a
final [`graph::TopologyState`] plus its Flow Analyzer and availability
reports.

# Pipeline

1. [`los`] — pairwise line-of-sight validation against the raster DSM.
2. [`radio`] — RSL/SNR/MCS classification and pairwise interference.
3. [`graph::builder`] — the deterministic candidate graph builder (site
   expansion, link enumeration, sector orientation, demand generation).
4. [`milp`] — the solver-agnostic ILP problem builder: variable families
   ([`milp::variables`]) and constraint families ([`milp::constraints`]).
5. [`solver`] — the backend-agnostic solve contract, concretely backed by
   `good_lp`'s `coin_cbc`.
6. [`pipeline`] — the six-phase optimization sequence itself, plus the
   heuristic pre-pruning ([`pipeline::prune`]) it uses to cut the candidate
   link set before the more expensive phases.
7. [`flow_analyzer`] — a final validation LP over the selected topology,
   reporting the common bandwidth every connected demand site is guaranteed.
8. [`availability`] — a seeded Monte Carlo link-availability simulation over
   the final topology.
9. [`report`] — topology file and per-site/per-link CSV report generation.

[`policies`] holds the feasibility-relaxation schedules shared across
pipeline phases; [`error`] is the crate-wide error taxonomy; [`geometry`]
and [`matrix`] are the small shared numeric primitives everything else is
built from.

*/

pub mod availability;
pub mod config;
pub mod error;
pub mod flow_analyzer;
pub mod geometry;
pub mod graph;
pub mod los;
pub mod matrix;
pub mod milp;
pub mod pipeline;
pub mod policies;
pub mod radio;
pub mod raster;
pub mod report;
pub mod solver;

pub use config::PlannerConfig;
pub use error::PlannerError;
pub use graph::{CandidateGraph, TopologyState};
pub use pipeline::PlanResult;
