//! Constraint-based type inference over partial structured types.
//!
//! The engine consumes a list of typing constraints over opaque type
//! variables and produces, per variable, a best inferred bound or a
//! structured error. Constraints are consolidated, checked for structural
//! recursion, and then driven to a fixed point by per-constraint
//! enforcers over a shared bound store. Atoms stay abstract: the caller
//! supplies their unification.

pub mod constraints;
pub mod enforce;
pub mod error;
pub mod recursion;
pub mod solve;
pub mod types;
pub mod unify;

pub mod prelude {
    pub use crate::constraints::{
        BoundConstraint, Constraint, Constraints, DifferenceConstraint, FormulationConstraint,
        FuncConstraint, InteractionConstraint, OrderedPair, Relation, RelationConstraint,
    };
    pub use crate::error::{AtomError, InferError, TypeError, TypeErrors};
    pub use crate::solve::{solve, Problem, Solution};
    pub use crate::types::*;
    pub use crate::unify::{AtomUnifier, Direction, Unifier};
}

#[cfg(test)]
pub(crate) mod testing {
    use std::fmt;

    use crate::error::AtomError;
    use crate::unify::AtomUnifier;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Var(pub u32);

    impl fmt::Display for Var {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "'t{}", self.0)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum Atom {
        Int,
        Bool,
    }

    impl fmt::Display for Atom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Int => write!(f, "int"),
                Self::Bool => write!(f, "bool"),
            }
        }
    }

    /// Atom unifier whose only relation is equality.
    pub struct StrictAtoms;

    impl AtomUnifier for StrictAtoms {
        type Atom = Atom;

        fn unify_eq(&self, lhs: &Atom, rhs: &Atom) -> Result<Atom, AtomError<Atom>> {
            if lhs == rhs {
                Ok(*lhs)
            } else {
                Err(AtomError {
                    expected: *lhs,
                    actual: *rhs,
                })
            }
        }
    }
}
