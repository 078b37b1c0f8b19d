use std::collections::BTreeSet;

use ilex_utils::Errors;
use thiserror::Error;

use crate::{
    constraints::Constraint,
    types::{Form, Type},
};

pub type TypeErrors<A, I> = Errors<TypeError<A, I>>;

/// A failure of two atoms to unify, reported by the atom unifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot unify atom `{expected}` with `{actual}`")]
pub struct AtomError<A> {
    pub expected: A,
    pub actual: A,
}

/// A unification failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError<A, I> {
    #[error("cannot unify `{expected}` with `{actual}`")]
    CannotUnify {
        expected: Type<A, I>,
        actual: Type<A, I>,
    },
    #[error("interaction `{interaction}` takes {expected} parameters but {actual} were given")]
    ParameterArity {
        interaction: I,
        expected: usize,
        actual: usize,
    },
    #[error("interaction `{interaction}` is required but not permitted by its row")]
    ForbiddenInteraction { interaction: I },
}

impl<A, I> From<AtomError<A>> for TypeError<A, I> {
    fn from(error: AtomError<A>) -> Self {
        Self::CannotUnify {
            expected: Type::Atom(error.expected),
            actual: Type::Atom(error.actual),
        }
    }
}

/// An inference failure. The first of these aborts solving; no partial
/// solution is handed out.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferError<V, A, I> {
    #[error("recursive type: the structural constraints admit no finite type")]
    RecursiveType,
    #[error("cannot satisfy `{constraint}`:\n{errors}")]
    Inference {
        constraint: Constraint<V, A, I>,
        errors: TypeErrors<A, I>,
    },
    #[error("`{var}` is constrained to the `{form}` shape but is bound to `{bound}`")]
    FormMismatch {
        var: V,
        form: Form,
        bound: Type<A, I>,
    },
    #[error("`{var}` must be a function but is bound to `{bound}`")]
    NotFunction { var: V, bound: Type<A, I> },
    #[error("`{var}` must be an interaction row but is bound to `{bound}`")]
    NotInteraction { var: V, bound: Type<A, I> },
    #[error("`{var}` cannot contain the subtracted interactions but is bound to `{bound}`")]
    InteractionCantContain {
        var: V,
        inters: BTreeSet<I>,
        bound: Type<A, I>,
    },
}
