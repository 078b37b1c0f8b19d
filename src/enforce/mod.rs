//! Per-constraint refinement rules.
//!
//! Each enforcer observes the bounds of the variables its constraint
//! mentions and proposes refined bounds for whichever side did not drive
//! the change. When nothing it reads has changed since its last visit it
//! proposes nothing, which is what lets the fixed point close.

pub use difference::difference;
pub use formulation::formulation;
pub use func::func;
pub use interaction::interaction;
pub use relation::relation;

mod difference;
mod formulation;
mod func;
mod interaction;
mod relation;

use ilex_utils::propagate::Change;

use crate::{
    error::TypeErrors,
    types::Bound,
    unify::{AtomUnifier, Unifier},
};

/// Enforce equality between two observations of the same value: unify
/// only when both sides moved, otherwise the side that moved wins. The
/// driver's merge reconciles whatever this shortcut leaves open.
pub(crate) fn enforce_eq<U, I>(
    unifier: &Unifier<'_, U>,
    lhs: (&Bound<U::Atom, I>, Change),
    rhs: (&Bound<U::Atom, I>, Change),
) -> Result<Bound<U::Atom, I>, TypeErrors<U::Atom, I>>
where
    U: AtomUnifier,
    I: Clone + Ord,
{
    match (lhs, rhs) {
        ((lhs, Change::Changed), (rhs, Change::Changed)) => unifier.unify_eq(lhs, rhs),
        ((bound, Change::Changed), (_, Change::Unchanged)) => Ok(bound.clone()),
        ((_, Change::Unchanged), (bound, _)) => Ok(bound.clone()),
    }
}
