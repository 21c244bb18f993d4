//! Hand a relaxed technology block to `good_lp`.
//!
//! Every disjunction must already be relaxed; the export reads plain
//! constraints, big-M rows and variable bounds, nothing else. Fixed
//! variables become equality rows. With `relax_integrality` every integer
//! and binary variable is declared continuous, which is what the Clarabel
//! backend needs.

use ehub_core::{
    EhubError, EhubResult, LinExpr, LinearConstraint, Sense, TechnologyBlock, VarDomain, VarId,
};
use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};
use serde::Serialize;
use tracing::debug;

/// A block translated into `good_lp` variables and constraints
pub struct LpExport {
    variables: ProblemVariables,
    columns: Vec<Variable>,
    constraints: Vec<Constraint>,
    integer_columns: usize,
}

/// Variable values of a solved export, indexed like the block's arena
#[derive(Debug, Clone, Serialize)]
pub struct LpSolution {
    pub values: Vec<f64>,
    pub objective: f64,
}

impl LpSolution {
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }

    pub fn evaluate(&self, expr: &LinExpr) -> f64 {
        expr.evaluate(&self.values)
    }
}

impl LpExport {
    pub fn from_block(block: &TechnologyBlock, relax_integrality: bool) -> EhubResult<Self> {
        if let Some(pending) = block.all_disjunctions().find(|d| d.is_pending()) {
            return Err(EhubError::NotRelaxed(pending.name.clone()));
        }

        let mut variables = ProblemVariables::new();
        let mut columns = Vec::with_capacity(block.vars().len());
        let mut fixed = Vec::new();
        let mut integer_columns = 0;
        for (id, def) in block.vars().iter() {
            let mut definition = variable().name(def.name.clone());
            if def.lower.is_finite() {
                definition = definition.min(def.lower);
            }
            if def.upper.is_finite() {
                definition = definition.max(def.upper);
            }
            if def.domain != VarDomain::Continuous && !relax_integrality {
                definition = definition.integer();
                integer_columns += 1;
            }
            columns.push(variables.add(definition));
            if def.is_fixed() {
                fixed.push((id, def.lower));
            }
        }

        let mut export = Self {
            variables,
            columns,
            constraints: Vec::new(),
            integer_columns,
        };
        let rows: Vec<&LinearConstraint> = block
            .all_constraints()
            .chain(block.all_disjunctions().flat_map(|d| d.relaxed_constraints()))
            .collect();
        for row in rows {
            export.push(row);
        }
        for (id, value) in fixed {
            let column = export.column(id);
            export.constraints.push(constraint!(column == value));
        }
        debug!(
            technology = %block.name,
            columns = export.columns.len(),
            rows = export.constraints.len(),
            integer_columns = export.integer_columns,
            "exported block"
        );
        Ok(export)
    }

    /// Add a row over the block's variables, e.g. a demand to meet.
    pub fn with_constraint(mut self, row: &LinearConstraint) -> Self {
        self.push(row);
        self
    }

    pub fn column(&self, var: VarId) -> Variable {
        self.columns[var.index()]
    }

    pub fn row_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn integer_columns(&self) -> usize {
        self.integer_columns
    }

    pub fn expression(&self, expr: &LinExpr) -> Expression {
        let mut out = Expression::from(expr.constant_term());
        for (var, coef) in expr.terms() {
            out += coef * self.column(var);
        }
        out
    }

    fn push(&mut self, row: &LinearConstraint) {
        let e = self.expression(&row.expr);
        let c = match row.sense {
            Sense::Le => constraint!(e <= 0.0),
            Sense::Ge => constraint!(e >= 0.0),
            Sense::Eq => constraint!(e == 0.0),
        };
        self.constraints.push(c);
    }

    /// Minimise `objective` with Clarabel.
    ///
    /// Clarabel is a conic solver, so the export must have been built with
    /// `relax_integrality`.
    pub fn solve_clarabel(self, objective: &LinExpr) -> EhubResult<LpSolution> {
        use good_lp::solvers::clarabel::clarabel;
        use good_lp::{Solution, SolverModel};

        if self.integer_columns > 0 {
            return Err(EhubError::Solver(format!(
                "clarabel cannot handle {} integer columns; export with relax_integrality",
                self.integer_columns
            )));
        }
        let goal = self.expression(objective);
        let columns = self.columns;
        let mut model = self.variables.minimise(goal).using(clarabel);
        for c in self.constraints {
            model = model.with(c);
        }
        let solution = model
            .solve()
            .map_err(|e| EhubError::Solver(e.to_string()))?;
        let values: Vec<f64> = columns.iter().map(|v| solution.value(*v)).collect();
        let objective = objective.evaluate(&values);
        debug!(objective, "clarabel solve finished");
        Ok(LpSolution { values, objective })
    }
}
