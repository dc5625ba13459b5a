//! Cut types and the separation hook.

use serde::{Deserialize, Serialize};

use crate::formulation::{Assignment, LinearConstraint, LinearExpr, Sense, VarId};

/// Which rounded-capacity inequality a cut is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CutKind {
    /// `x(S) ≤ |S| − 1`
    Plain,
    /// `x(S) ≤ |S| − max(1, ⌈q(S)/Q⌉)`
    Strengthened,
}

/// Which cuts to emit when both inequalities are violated for one subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutPolicy {
    /// Emit only the tightest violated inequality per subset.
    #[default]
    StrongestOnly,
    /// Emit plain and strengthened cuts independently whenever each is
    /// violated.
    Both,
}

/// A violated inequality `Σ x[i,j] ≤ rhs` over the arcs inside a customer
/// subset.
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    /// Inequality family.
    pub kind: CutKind,
    /// Customer subset S, sorted ascending.
    pub subset: Vec<usize>,
    /// Arc variables `x[i,j]` for `i, j ∈ S`, `i ≠ j`.
    pub arcs: Vec<VarId>,
    /// Right-hand side.
    pub rhs: f64,
    /// Left-hand side under the separated assignment.
    pub lhs_value: f64,
}

impl Cut {
    /// Amount by which the separated assignment exceeds the right-hand side.
    pub fn violation(&self) -> f64 {
        self.lhs_value - self.rhs
    }

    /// Identity of the cut: two cuts with the same key are the same
    /// inequality.
    pub fn key(&self) -> (CutKind, Vec<usize>) {
        (self.kind, self.subset.clone())
    }

    /// The inequality as a model constraint.
    pub fn to_constraint(&self) -> LinearConstraint {
        let tag = match self.kind {
            CutKind::Plain => "rc",
            CutKind::Strengthened => "rcs",
        };
        let members: Vec<String> = self.subset.iter().map(|v| v.to_string()).collect();
        LinearConstraint::new(
            format!("{tag}_{}", members.join("_")),
            LinearExpr::sum(self.arcs.iter().copied()),
            Sense::Le,
            self.rhs,
        )
    }
}

/// Cut-generation hook invoked by the MIP search on relaxation and
/// incumbent points.
///
/// Implementations must hold no mutable state: the search may call
/// `separate` any number of times.
pub trait CutSeparator: Send + Sync {
    /// Returns every violated inequality found for `assignment`.
    fn separate(&self, assignment: &Assignment) -> Vec<Cut>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::MipModel;

    #[test]
    fn test_to_constraint() {
        let mut m = MipModel::new();
        let a = m.add_binary("x_2_3");
        let b = m.add_binary("x_3_2");
        let cut = Cut {
            kind: CutKind::Strengthened,
            subset: vec![2, 3],
            arcs: vec![a, b],
            rhs: 0.0,
            lhs_value: 2.0,
        };
        let c = cut.to_constraint();
        assert_eq!(c.name, "rcs_2_3");
        assert_eq!(c.sense, Sense::Le);
        assert_eq!(c.expr.terms(), &[(a, 1.0), (b, 1.0)]);
        assert_eq!(cut.violation(), 2.0);
        assert_eq!(cut.key(), (CutKind::Strengthened, vec![2, 3]));
    }

    #[test]
    fn test_policy_default() {
        assert_eq!(CutPolicy::default(), CutPolicy::StrongestOnly);
        let p: CutPolicy = serde_json::from_str("\"both\"").expect("decodes");
        assert_eq!(p, CutPolicy::Both);
    }
}
