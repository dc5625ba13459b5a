//! Backend-neutral mixed-integer linear program.
//!
//! The formulation is described once in these types and handed to a
//! [`MipBackend`](crate::solver::MipBackend), which translates it into its
//! engine's native API.

use std::fmt;

/// Handle to a variable inside a [`MipModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    /// Position of this variable in [`MipModel::variables`] and in every
    /// [`Assignment`] for the model.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Variable domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// Integer in {0, 1}.
    Binary,
    /// Real within `[lower, upper]`.
    Continuous,
}

/// A decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Diagnostic name, e.g. `x_0_3`.
    pub name: String,
    /// Domain.
    pub kind: VarKind,
    /// Lower bound.
    pub lower: f64,
    /// Upper bound, `None` for unbounded above.
    pub upper: Option<f64>,
}

/// A linear combination of variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
}

impl LinearExpr {
    /// Creates an empty expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of the given variables, each with coefficient 1.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
        }
    }

    /// Appends `coefficient · var`.
    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    /// Builder form of [`add_term`](Self::add_term).
    pub fn with_term(mut self, var: VarId, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    /// The `(variable, coefficient)` terms.
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// Value of the expression under `assignment`.
    pub fn evaluate(&self, assignment: &Assignment) -> f64 {
        self.terms
            .iter()
            .map(|&(v, c)| c * assignment.value(v))
            .sum()
    }
}

/// Constraint sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// `expr ≤ rhs`
    Le,
    /// `expr ≥ rhs`
    Ge,
    /// `expr = rhs`
    Eq,
}

/// `expr (≤ | ≥ | =) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// Diagnostic name, e.g. `flow_ub_2_5`.
    pub name: String,
    /// Left-hand side.
    pub expr: LinearExpr,
    /// Relation.
    pub sense: Sense,
    /// Right-hand side constant.
    pub rhs: f64,
}

impl LinearConstraint {
    /// Creates a constraint.
    pub fn new(name: impl Into<String>, expr: LinearExpr, sense: Sense, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            sense,
            rhs,
        }
    }

    /// Amount by which `assignment` violates the constraint (0 if satisfied).
    pub fn violation(&self, assignment: &Assignment) -> f64 {
        let lhs = self.expr.evaluate(assignment);
        match self.sense {
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
            Sense::Eq => (lhs - self.rhs).abs(),
        }
    }
}

impl fmt::Display for LinearConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.sense {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        };
        write!(f, "{}: ", self.name)?;
        for (k, (v, c)) in self.expr.terms().iter().enumerate() {
            if k > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{c}*v{}", v.index())?;
        }
        write!(f, " {op} {}", self.rhs)
    }
}

/// Values for every variable of a model, indexed by [`VarId::index`].
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    values: Vec<f64>,
}

impl Assignment {
    /// All-zero assignment for a model with `len` variables.
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    /// Wraps raw values.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Value of `var`.
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.0]
    }

    /// Sets the value of `var`.
    pub fn set(&mut self, var: VarId, value: f64) {
        self.values[var.0] = value;
    }

    /// Raw values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of variables covered.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` for an assignment over zero variables.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A minimization MILP: variables, linear constraints, linear objective.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MipModel {
    variables: Vec<Variable>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl MipModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binary variable.
    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.push(Variable {
            name: name.into(),
            kind: VarKind::Binary,
            lower: 0.0,
            upper: Some(1.0),
        })
    }

    /// Adds a continuous variable bounded by `[lower, upper]`.
    pub fn add_continuous(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: Option<f64>,
    ) -> VarId {
        self.push(Variable {
            name: name.into(),
            kind: VarKind::Continuous,
            lower,
            upper,
        })
    }

    fn push(&mut self, var: Variable) -> VarId {
        self.variables.push(var);
        VarId(self.variables.len() - 1)
    }

    /// Appends a constraint.
    pub fn add_constraint(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    /// Sets the expression to minimize.
    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    /// All variables in creation order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// All constraints in creation order.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// The objective expression.
    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Number of variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Objective value under `assignment`.
    pub fn objective_value(&self, assignment: &Assignment) -> f64 {
        self.objective.evaluate(assignment)
    }

    /// First constraint or bound that `assignment` violates by more than
    /// `tol`, or `None` if the assignment is feasible.
    ///
    /// Binary variables must be within `tol` of 0 or 1.
    pub fn first_violation(&self, assignment: &Assignment, tol: f64) -> Option<String> {
        if assignment.len() != self.variables.len() {
            return Some(format!(
                "assignment covers {} of {} variables",
                assignment.len(),
                self.variables.len()
            ));
        }
        for (k, var) in self.variables.iter().enumerate() {
            let v = assignment.values[k];
            if v < var.lower - tol || var.upper.is_some_and(|u| v > u + tol) {
                return Some(format!("{} = {v} is out of bounds", var.name));
            }
            if var.kind == VarKind::Binary && (v - v.round()).abs() > tol {
                return Some(format!("{} = {v} is not integral", var.name));
            }
        }
        self.constraints
            .iter()
            .find(|c| c.violation(assignment) > tol)
            .map(|c| format!("{} is violated", c.name))
    }
}
