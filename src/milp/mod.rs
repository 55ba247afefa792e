/*!

The ILP Problem Builder (spec.md §4.5, component C5): a solver-agnostic
representation of variables, linear expressions, constraints and an
objective, plus the deterministic variable-enumeration order spec.md §5
requires ("every variable and constraint added to the solver is in canonical
deterministic order derived from stable ids").

This module never talks to a concrete MILP engine; [`crate::solver`] is the
only place that translates a [`Problem`] into calls against a real backend,
per spec.md §4.6's build/solve/extract contract.

*/

pub mod constraints;
pub mod variables;

use std::collections::BTreeMap;
use std::fmt;

pub use variables::{VarKey, VariableSet};

///A reference to one variable inside a [`Problem`], stable for the lifetime
///of that problem.
#[derive(Debug,Clone,Copy,PartialEq,Eq,PartialOrd,Ord,Hash)]
pub struct VarId(pub usize);

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum VarDomain
{
	Binary,
	Continuous{ lower: ordered_f64::F64Bits, upper: ordered_f64::F64Bits },
}

///Bit-for-bit comparable f64 wrapper so `VarDomain` can derive `Eq`; bounds are
///fixed numbers chosen by the builder, never NaN, so bit equality is exact
///equality in practice.
pub mod ordered_f64
{
	#[derive(Debug,Clone,Copy)]
	pub struct F64Bits(pub f64);
	impl PartialEq for F64Bits
	{
		fn eq(&self,other:&F64Bits) -> bool { self.0.to_bits()==other.0.to_bits() }
	}
	impl Eq for F64Bits {}
}

impl VarDomain
{
	pub fn continuous(lower:f64, upper:f64) -> VarDomain
	{
		VarDomain::Continuous{ lower: ordered_f64::F64Bits(lower), upper: ordered_f64::F64Bits(upper) }
	}
}

#[derive(Debug,Clone)]
pub struct VarDef
{
	pub key: VarKey,
	pub domain: VarDomain,
	///Human-readable name, used only for debug LP-file persistence (spec.md §4.6).
	pub name: String,
}

///A linear combination of variables plus a constant term.
#[derive(Debug,Clone,Default)]
pub struct LinExpr
{
	pub coefficients: BTreeMap<VarId,f64>,
	pub constant: f64,
}

impl LinExpr
{
	pub fn constant(c:f64) -> LinExpr
	{
		LinExpr{ coefficients: BTreeMap::new(), constant: c }
	}
	pub fn term(var:VarId, coef:f64) -> LinExpr
	{
		let mut e = LinExpr::default();
		e.coefficients.insert(var,coef);
		e
	}
	pub fn add_term(&mut self, var:VarId, coef:f64)
	{
		*self.coefficients.entry(var).or_insert(0.0) += coef;
	}
}

impl std::ops::Add for LinExpr
{
	type Output = LinExpr;
	fn add(mut self, rhs:LinExpr) -> LinExpr
	{
		for (var,coef) in rhs.coefficients
		{
			self.add_term(var,coef);
		}
		self.constant += rhs.constant;
		self
	}
}

impl std::ops::Sub for LinExpr
{
	type Output = LinExpr;
	fn sub(mut self, rhs:LinExpr) -> LinExpr
	{
		for (var,coef) in rhs.coefficients
		{
			self.add_term(var,-coef);
		}
		self.constant -= rhs.constant;
		self
	}
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Sense
{
	Le,
	Ge,
	Eq,
}

///A single linear constraint: `expr sense 0` after moving everything to the
///left-hand side, i.e. `lhs - rhs`.
#[derive(Debug,Clone)]
pub struct Constraint
{
	pub expr: LinExpr,
	pub sense: Sense,
	pub name: String,
}

impl Constraint
{
	pub fn new(lhs:LinExpr, sense:Sense, rhs:LinExpr, name:impl Into<String>) -> Constraint
	{
		Constraint{ expr: lhs-rhs, sense, name: name.into() }
	}
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ObjectiveSense
{
	Minimize,
	Maximize,
}

#[derive(Debug,Clone)]
pub struct Objective
{
	pub sense: ObjectiveSense,
	pub expr: LinExpr,
}

///A fully built MILP/LP, in deterministic variable/constraint order, ready to
///be handed to [`crate::solver`].
#[derive(Debug,Clone)]
pub struct Problem
{
	pub variables: Vec<VarDef>,
	pub constraints: Vec<Constraint>,
	pub objective: Objective,
}

impl Problem
{
	pub fn new(objective:Objective) -> Problem
	{
		Problem{ variables: Vec::new(), constraints: Vec::new(), objective }
	}

	pub fn add_constraint(&mut self, constraint:Constraint)
	{
		self.constraints.push(constraint);
	}
}

impl fmt::Display for Problem
{
	///A minimal, deterministic LP-format rendering, used for the debug-mode
	///problem-file persistence spec.md §4.6 calls the adapter's "only
	///permitted side effect".
	fn fmt(&self, f:&mut fmt::Formatter<'_>) -> fmt::Result
	{
		let obj_word = match self.objective.sense { ObjectiveSense::Minimize => "Minimize", ObjectiveSense::Maximize => "Maximize" };
		writeln!(f,"{obj_word}")?;
		write_expr(f,&self.objective.expr,&self.variables)?;
		writeln!(f)?;
		writeln!(f,"Subject To")?;
		for (i,c) in self.constraints.iter().enumerate()
		{
			write!(f,"c{i}_{}: ",c.name)?;
			write_expr(f,&c.expr,&self.variables)?;
			let sense = match c.sense { Sense::Le => "<=", Sense::Ge => ">=", Sense::Eq => "=" };
			writeln!(f," {sense} 0")?;
		}
		writeln!(f,"End")
	}
}

fn write_expr(f:&mut fmt::Formatter<'_>, expr:&LinExpr, variables:&[VarDef]) -> fmt::Result
{
	for (var,coef) in &expr.coefficients
	{
		write!(f," + {coef}*{}",variables[var.0].name)?;
	}
	if expr.constant != 0.0
	{
		write!(f," + {}",expr.constant)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn lin_expr_add_merges_coefficients_on_shared_variables()
	{
		let a = LinExpr::term(VarId(0),1.0);
		let b = LinExpr::term(VarId(0),2.0) + LinExpr::term(VarId(1),3.0);
		let sum = a + b;
		assert_eq!(sum.coefficients[&VarId(0)], 3.0);
		assert_eq!(sum.coefficients[&VarId(1)], 3.0);
	}

	#[test]
	fn constraint_moves_rhs_to_left_hand_side()
	{
		let lhs = LinExpr::term(VarId(0),1.0);
		let rhs = LinExpr::constant(5.0);
		let c = Constraint::new(lhs,Sense::Le,rhs,"test");
		assert_eq!(c.expr.constant, -5.0);
	}
}
