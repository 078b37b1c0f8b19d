use ilex_utils::propagate::Query;

use crate::{
    constraints::FormulationConstraint,
    error::InferError,
    types::{Bound, Type},
    unify::{AtomUnifier, Unifier},
};

use super::enforce_eq;

/// Keeps a whole and its two components in shape: the whole splits into
/// component bounds, each is reconciled with its variable, and whichever
/// side did not drive the change is rewritten.
pub fn formulation<V, U, I>(
    unifier: &Unifier<'_, U>,
    constraint: &FormulationConstraint<V>,
    query: &mut Query<'_, V, Bound<U::Atom, I>>,
) -> Result<Vec<(V, Bound<U::Atom, I>)>, InferError<V, U::Atom, I>>
where
    V: Copy + Ord,
    U: AtomUnifier,
    U::Atom: Clone,
    I: Clone + Ord,
{
    let FormulationConstraint {
        whole,
        form,
        first,
        second,
    } = *constraint;

    let (whole_bound, whole_change) = query.get(&whole);
    let (first_bound, first_change) = query.get(&first);
    let (second_bound, second_change) = query.get(&second);

    if !whole_change.is_changed() && !first_change.is_changed() && !second_change.is_changed() {
        return Ok(Vec::new());
    }

    let (first_part, second_part) =
        Type::split_formulation(form, &whole_bound).map_err(|bound| InferError::FormMismatch {
            var: whole,
            form,
            bound,
        })?;

    let wrap = |errors| InferError::Inference {
        constraint: (*constraint).into(),
        errors,
    };

    let refined_first = enforce_eq(
        unifier,
        (&first_part, whole_change),
        (&first_bound, first_change),
    )
    .map_err(wrap)?;
    let refined_second = enforce_eq(
        unifier,
        (&second_part, whole_change),
        (&second_bound, second_change),
    )
    .map_err(wrap)?;

    let mut updates = Vec::new();

    if first_change.is_changed() || second_change.is_changed() {
        updates.push((
            whole,
            Some(Type::join_formulation(
                form,
                refined_first.clone(),
                refined_second.clone(),
            )),
        ));
    }
    if whole_change.is_changed() {
        updates.push((first, refined_first));
        updates.push((second, refined_second));
    }

    Ok(updates)
}
