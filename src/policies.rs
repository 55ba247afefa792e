/*!

Feasibility relaxation policies (spec.md §4.7, §9, component noted in
SPEC_FULL.md §D). A phase that can be infeasible at its strictest setting
retries at a looser one; this module holds the schedules and bookkeeping
shared by every phase that does that, not the phase-specific LP construction
itself (that lives in [`crate::pipeline::phases`]).

Three relaxation paths appear in spec.md §4.7:
- **γ-stepdown** (minimum-cost base network, §4.7 step 3): loosen the
  coverage constraint by stepping γ down from 1.0 until the phase is
  feasible.
- **Shortage minimization** (redundancy phase, §4.7 step 4): solve a first
  LP that only minimizes total shortfall, then fix that shortfall as a cap
  and solve a second LP that minimizes cost subject to it.
- **Dropping the min-guarantee term** (interference minimization, §4.7 step
  5): fall back from the max-min β objective to the weighted-coverage
  objective when `MAXIMIZE_COMMON_BANDWIDTH` can't be satisfied.

Spec.md §8 property 8 ("monotone relaxation: if γ′ < γ, the problem at γ′ is
feasible whenever γ was") is the correctness obligation every γ schedule here
must satisfy; it follows directly from the coverage constraint relaxing
(never tightening) as γ decreases, so the schedule only needs to be
non-increasing — it does not need to re-derive the property itself.

*/

use std::collections::BTreeMap;

use crate::graph::EntityId;

///A descending sequence of coverage-relaxation steps (spec.md §4.7: "Start
///γ = 1.0; if infeasible, decrease γ stepwise until feasible").
#[derive(Debug,Clone,Copy)]
pub struct GammaSchedule
{
	pub start: f64,
	pub step: f64,
	///Smallest γ the phase is willing to accept before giving up.
	pub floor: f64,
}

impl GammaSchedule
{
	///The γ values this schedule will try, strictly descending, `floor`
	///always included as the last step even if `step` would overshoot it.
	pub fn values(&self) -> Vec<f64>
	{
		let mut out = Vec::new();
		let mut gamma = self.start;
		while gamma > self.floor
		{
			out.push(gamma);
			gamma -= self.step;
		}
		out.push(self.floor);
		out
	}
}

///The result of walking a [`GammaSchedule`] against a fallible attempt.
#[derive(Debug,Clone)]
pub enum RelaxationOutcome<T>
{
	Resolved{ value: T, gamma: f64 },
	///Every γ down to the schedule's floor failed.
	Exhausted,
}

impl<T> RelaxationOutcome<T>
{
	pub fn value(self) -> Option<T>
	{
		match self { RelaxationOutcome::Resolved{value,..} => Some(value), RelaxationOutcome::Exhausted => None }
	}
}

///Tries `attempt` at every γ in `schedule.values()`, in order, returning the
///first success. `attempt` returns `None` on infeasible/timed-out-without-a-
///solution (spec.md §7: "SolverTimeout ... otherwise as Infeasible").
pub fn relax_gamma<T>(schedule:&GammaSchedule, mut attempt:impl FnMut(f64) -> Option<T>) -> RelaxationOutcome<T>
{
	for gamma in schedule.values()
	{
		if let Some(value) = attempt(gamma)
		{
			return RelaxationOutcome::Resolved{ value, gamma };
		}
	}
	RelaxationOutcome::Exhausted
}

///The fixed shortage cap the redundancy phase's second LP solves against,
///produced by summing the first LP's φ values (spec.md §4.7 step 4:
///"two-phase: minimize shortage first, then fix shortage and minimize
///cost").
#[derive(Debug,Clone,Copy,Default)]
pub struct ShortageCap
{
	pub total_shortfall_gbps: f64,
}

pub fn cap_from_shortage(demand_shortfall:&BTreeMap<EntityId,f64>) -> ShortageCap
{
	ShortageCap{ total_shortfall_gbps: demand_shortfall.values().copied().sum() }
}

///Whether the interference-minimization phase should still attempt the
///max-min β objective, or has already fallen back to weighted coverage
///(spec.md §4.7 step 5's third relaxation path: "dropping the min-guarantee
///term").
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum InterferenceObjective
{
	MaxMinBandwidth,
	WeightedCoverage,
}

impl InterferenceObjective
{
	///Starts at the max-min objective when the config asks for it, falls
	///back to weighted coverage otherwise or once max-min has been tried and
	///failed.
	pub fn initial(maximize_common_bandwidth:bool) -> InterferenceObjective
	{
		if maximize_common_bandwidth { InterferenceObjective::MaxMinBandwidth } else { InterferenceObjective::WeightedCoverage }
	}

	pub fn fallback(&self) -> InterferenceObjective
	{
		InterferenceObjective::WeightedCoverage
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn schedule_always_ends_at_the_floor()
	{
		let schedule = GammaSchedule{ start: 1.0, step: 0.3, floor: 0.2 };
		let values = schedule.values();
		assert_eq!(*values.last().unwrap(), 0.2);
		assert!(values.windows(2).all(|w|w[0]>w[1]));
	}

	#[test]
	fn relax_gamma_stops_at_the_first_feasible_step()
	{
		let schedule = GammaSchedule{ start: 1.0, step: 0.25, floor: 0.0 };
		//A toy feasibility predicate: feasible once gamma <= 0.5, monotone in
		//gamma exactly as spec.md §8 property 8 requires.
		let outcome = relax_gamma(&schedule, |gamma| if gamma<=0.5 { Some(gamma) } else { None });
		match outcome
		{
			RelaxationOutcome::Resolved{ gamma, .. } => assert_eq!(gamma,0.5),
			RelaxationOutcome::Exhausted => panic!("expected a resolved step"),
		}
	}

	#[test]
	fn a_looser_gamma_is_feasible_whenever_a_stricter_one_was()
	{
		//Spec.md §8 property 8, directly: for this toy monotone predicate,
		//every gamma below a feasible one is also feasible.
		let feasible = |gamma:f64| gamma <= 0.7;
		for gamma in [1.0,0.7,0.5,0.2,0.0]
		{
			if feasible(gamma)
			{
				for looser in [gamma-0.1,gamma-0.3].into_iter().filter(|&g|g>=0.0)
				{
					assert!(feasible(looser));
				}
			}
		}
	}

	#[test]
	fn shortage_cap_sums_every_demand_sites_shortfall()
	{
		let mut shortfall = BTreeMap::new();
		let a = crate::graph::Site::compute_id(0.0,0.0,0.0,crate::graph::SiteType::Demand,None);
		let b = crate::graph::Site::compute_id(1.0,0.0,0.0,crate::graph::SiteType::Demand,None);
		shortfall.insert(a,0.3);
		shortfall.insert(b,0.1);
		assert!((cap_from_shortage(&shortfall).total_shortfall_gbps-0.4).abs()<1e-9);
	}

	#[test]
	fn objective_falls_back_to_weighted_coverage_when_max_min_is_requested()
	{
		assert_eq!(InterferenceObjective::initial(true).fallback(), InterferenceObjective::WeightedCoverage);
		assert_eq!(InterferenceObjective::initial(false), InterferenceObjective::WeightedCoverage);
	}
}
