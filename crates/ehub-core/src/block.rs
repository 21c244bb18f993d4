//! Technology sub-models.
//!
//! A [`TechnologyBlock`] owns every variable and constraint generated for one
//! technology. The fixed decision variables are `size`, `input[t, c]` and
//! `output[t, c]`; engines add further variables (storage level, state
//! indicators, slot variables) through [`TechnologyBlock::add_series`] and
//! friends. Component slots are modelled as [`SubBlock`]s that share the
//! parent's variable arena.

use crate::constraint::LinearConstraint;
use crate::disjunction::Disjunction;
use crate::expr::{LinExpr, VarDomain, VarId};
use crate::time::{TimeIndex, TimeStep};
use crate::CarrierId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Definition of a decision variable
#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub domain: VarDomain,
    pub lower: f64,
    pub upper: f64,
}

impl VarDef {
    pub fn is_fixed(&self) -> bool {
        self.lower == self.upper
    }
}

/// Flat store of variable definitions; [`VarId`]s index into it.
#[derive(Debug, Clone, Default)]
pub struct VariableArena {
    defs: Vec<VarDef>,
}

impl VariableArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        domain: VarDomain,
        lower: f64,
        upper: f64,
    ) -> VarId {
        let (lower, upper) = match domain {
            VarDomain::Binary => (lower.max(0.0), upper.min(1.0)),
            _ => (lower, upper),
        };
        self.defs.push(VarDef {
            name: name.into(),
            domain,
            lower,
            upper,
        });
        VarId::new(self.defs.len() - 1)
    }

    pub fn get(&self, var: VarId) -> &VarDef {
        &self.defs[var.index()]
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &VarDef)> {
        self.defs.iter().enumerate().map(|(i, d)| (VarId::new(i), d))
    }

    /// Pin a variable to a value by collapsing its bounds.
    pub fn fix(&mut self, var: VarId, value: f64) {
        let def = &mut self.defs[var.index()];
        def.lower = value;
        def.upper = value;
    }
}

/// Bounds and integrality of the `size` variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBounds {
    pub min: f64,
    pub max: f64,
    pub integer: bool,
}

/// Upper bounds for a technology's flow variables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowBounds {
    pub input_max: f64,
    pub output_max: f64,
}

/// Group of constraints and disjunctions nested in a technology (e.g. a pump slot)
#[derive(Debug, Clone)]
pub struct SubBlock {
    pub name: String,
    pub constraints: Vec<LinearConstraint>,
    pub disjunctions: Vec<Disjunction>,
}

impl SubBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: Vec::new(),
            disjunctions: Vec::new(),
        }
    }
}

/// Counts describing a built block
#[derive(Debug, Clone, Default, Serialize)]
pub struct BlockSummary {
    pub variables: usize,
    pub integer_variables: usize,
    pub constraints: usize,
    pub disjunctions: usize,
    pub pending_disjunctions: usize,
    pub relaxed_constraints: usize,
    pub sub_blocks: usize,
}

#[derive(Debug, Clone)]
pub struct TechnologyBlock {
    pub name: String,
    time: TimeIndex,
    input_carriers: Vec<CarrierId>,
    output_carriers: Vec<CarrierId>,
    vars: VariableArena,
    size: VarId,
    input: Vec<Vec<VarId>>,
    output: Vec<Vec<VarId>>,
    series: BTreeMap<String, Vec<VarId>>,
    scalars: BTreeMap<String, VarId>,
    constraints: Vec<LinearConstraint>,
    disjunctions: Vec<Disjunction>,
    sub_blocks: Vec<SubBlock>,
}

impl TechnologyBlock {
    /// Create a block with `size`, `input[t, c]` and `output[t, c]` declared.
    pub fn new(
        name: impl Into<String>,
        time: TimeIndex,
        input_carriers: Vec<CarrierId>,
        output_carriers: Vec<CarrierId>,
        size: SizeBounds,
        flows: FlowBounds,
    ) -> Self {
        let mut vars = VariableArena::new();
        let domain = if size.integer {
            VarDomain::Integer
        } else {
            VarDomain::Continuous
        };
        let size_var = vars.add("size", domain, size.min, size.max);

        let mut input = Vec::with_capacity(time.len());
        let mut output = Vec::with_capacity(time.len());
        for t in time.steps() {
            input.push(
                input_carriers
                    .iter()
                    .map(|c| {
                        vars.add(
                            format!("input[{},{}]", t, c),
                            VarDomain::Continuous,
                            0.0,
                            flows.input_max,
                        )
                    })
                    .collect(),
            );
            output.push(
                output_carriers
                    .iter()
                    .map(|c| {
                        vars.add(
                            format!("output[{},{}]", t, c),
                            VarDomain::Continuous,
                            0.0,
                            flows.output_max,
                        )
                    })
                    .collect(),
            );
        }

        Self {
            name: name.into(),
            time,
            input_carriers,
            output_carriers,
            vars,
            size: size_var,
            input,
            output,
            series: BTreeMap::new(),
            scalars: BTreeMap::new(),
            constraints: Vec::new(),
            disjunctions: Vec::new(),
            sub_blocks: Vec::new(),
        }
    }

    pub fn time(&self) -> &TimeIndex {
        &self.time
    }

    pub fn input_carriers(&self) -> &[CarrierId] {
        &self.input_carriers
    }

    pub fn output_carriers(&self) -> &[CarrierId] {
        &self.output_carriers
    }

    pub fn size(&self) -> VarId {
        self.size
    }

    pub fn vars(&self) -> &VariableArena {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut VariableArena {
        &mut self.vars
    }

    pub fn input(&self, t: TimeStep, carrier: &CarrierId) -> Option<VarId> {
        let pos = self.input_carriers.iter().position(|c| c == carrier)?;
        Some(self.input[t.index()][pos])
    }

    pub fn output(&self, t: TimeStep, carrier: &CarrierId) -> Option<VarId> {
        let pos = self.output_carriers.iter().position(|c| c == carrier)?;
        Some(self.output[t.index()][pos])
    }

    pub fn inputs_at(&self, t: TimeStep) -> &[VarId] {
        &self.input[t.index()]
    }

    pub fn outputs_at(&self, t: TimeStep) -> &[VarId] {
        &self.output[t.index()]
    }

    /// `Σ_c input[t, c]`
    pub fn total_input(&self, t: TimeStep) -> LinExpr {
        self.inputs_at(t).iter().sum()
    }

    /// `Σ_c output[t, c]`
    pub fn total_output(&self, t: TimeStep) -> LinExpr {
        self.outputs_at(t).iter().sum()
    }

    /// Declare a time-indexed variable family `name[t]`.
    pub fn add_series(
        &mut self,
        name: &str,
        domain: VarDomain,
        lower: f64,
        upper: f64,
    ) -> Vec<VarId> {
        let vars: Vec<VarId> = self
            .time
            .steps()
            .map(|t| {
                self.vars
                    .add(format!("{}[{}]", name, t), domain, lower, upper)
            })
            .collect();
        self.series.insert(name.to_string(), vars.clone());
        vars
    }

    /// Declare a scalar variable `name`.
    pub fn add_scalar(&mut self, name: &str, domain: VarDomain, lower: f64, upper: f64) -> VarId {
        let var = self.vars.add(name, domain, lower, upper);
        self.scalars.insert(name.to_string(), var);
        var
    }

    pub fn series(&self, name: &str) -> Option<&[VarId]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn scalar(&self, name: &str) -> Option<VarId> {
        self.scalars.get(name).copied()
    }

    pub fn add_constraint(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    pub fn add_constraints(&mut self, constraints: impl IntoIterator<Item = LinearConstraint>) {
        self.constraints.extend(constraints);
    }

    pub fn add_disjunction(&mut self, disjunction: Disjunction) {
        self.disjunctions.push(disjunction);
    }

    pub fn add_sub_block(&mut self, sub_block: SubBlock) {
        self.sub_blocks.push(sub_block);
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn disjunctions(&self) -> &[Disjunction] {
        &self.disjunctions
    }

    pub fn sub_blocks(&self) -> &[SubBlock] {
        &self.sub_blocks
    }

    pub fn sub_block(&self, name: &str) -> Option<&SubBlock> {
        self.sub_blocks.iter().find(|b| b.name == name)
    }

    /// Every plain constraint, including those of sub-blocks.
    pub fn all_constraints(&self) -> impl Iterator<Item = &LinearConstraint> {
        self.constraints
            .iter()
            .chain(self.sub_blocks.iter().flat_map(|b| b.constraints.iter()))
    }

    /// Every disjunction, including those of sub-blocks.
    pub fn all_disjunctions(&self) -> impl Iterator<Item = &Disjunction> {
        self.disjunctions
            .iter()
            .chain(self.sub_blocks.iter().flat_map(|b| b.disjunctions.iter()))
    }

    /// Variable arena and every disjunction, borrowed together for relaxation.
    pub fn relaxation_parts(&mut self) -> (&mut VariableArena, Vec<&mut Disjunction>) {
        let disjunctions = self
            .disjunctions
            .iter_mut()
            .chain(
                self.sub_blocks
                    .iter_mut()
                    .flat_map(|b| b.disjunctions.iter_mut()),
            )
            .collect();
        (&mut self.vars, disjunctions)
    }

    /// All-zero assignment sized to the arena.
    pub fn zero_assignment(&self) -> Vec<f64> {
        vec![0.0; self.vars.len()]
    }

    /// Names of violated plain constraints and unsatisfied disjunctions
    /// (logical form) for the assignment.
    pub fn logical_violations(&self, values: &[f64], tolerance: f64) -> Vec<String> {
        let mut violated: Vec<String> = self
            .all_constraints()
            .filter(|c| !c.is_satisfied(values, tolerance))
            .map(|c| c.name.clone())
            .collect();
        violated.extend(
            self.all_disjunctions()
                .filter(|d| !d.is_satisfied(values, tolerance))
                .map(|d| d.name.clone()),
        );
        violated
    }

    /// Names of violated plain and big-M constraints for the assignment.
    pub fn relaxed_violations(&self, values: &[f64], tolerance: f64) -> Vec<String> {
        self.all_constraints()
            .chain(self.all_disjunctions().flat_map(|d| d.relaxed_constraints()))
            .filter(|c| !c.is_satisfied(values, tolerance))
            .map(|c| c.name.clone())
            .collect()
    }

    /// Variables whose value lies outside their bounds.
    pub fn bound_violations(&self, values: &[f64], tolerance: f64) -> Vec<String> {
        self.vars
            .iter()
            .filter(|(v, d)| {
                let x = values[v.index()];
                x < d.lower - tolerance || x > d.upper + tolerance
            })
            .map(|(_, d)| d.name.clone())
            .collect()
    }

    pub fn summary(&self) -> BlockSummary {
        BlockSummary {
            variables: self.vars.len(),
            integer_variables: self
                .vars
                .iter()
                .filter(|(_, d)| d.domain != VarDomain::Continuous)
                .count(),
            constraints: self.all_constraints().count(),
            disjunctions: self.all_disjunctions().count(),
            pending_disjunctions: self.all_disjunctions().filter(|d| d.is_pending()).count(),
            relaxed_constraints: self
                .all_disjunctions()
                .map(|d| d.relaxed_constraints().len())
                .sum(),
            sub_blocks: self.sub_blocks.len(),
        }
    }
}
