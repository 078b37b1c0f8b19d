use ilex_utils::propagate::Query;

use crate::{
    constraints::FuncConstraint,
    error::InferError,
    types::{Bound, SpecialBounds, Type},
    unify::{AtomUnifier, Unifier},
};

use super::enforce_eq;

/// The three-component analogue of the formulation enforcer.
///
/// Largely redundant with formulation constraints today, but kept on its
/// own so function-specific refinement has somewhere to live once
/// interactions flow through applications.
pub fn func<V, U, I>(
    unifier: &Unifier<'_, U>,
    constraint: &FuncConstraint<V>,
    query: &mut Query<'_, V, Bound<U::Atom, I>>,
) -> Result<Vec<(V, Bound<U::Atom, I>)>, InferError<V, U::Atom, I>>
where
    V: Copy + Ord,
    U: AtomUnifier,
    U::Atom: Clone,
    I: Clone + Ord,
{
    let FuncConstraint {
        func,
        arg,
        inter,
        ret,
    } = *constraint;

    let (func_bound, func_change) = query.get(&func);
    let (arg_bound, arg_change) = query.get(&arg);
    let (inter_bound, inter_change) = query.get(&inter);
    let (ret_bound, ret_change) = query.get(&ret);

    if !func_change.is_changed()
        && !arg_change.is_changed()
        && !inter_change.is_changed()
        && !ret_change.is_changed()
    {
        return Ok(Vec::new());
    }

    let (arg_part, inter_part, ret_part) = Type::func_components(&func_bound)
        .map_err(|bound| InferError::NotFunction { var: func, bound })?;

    let wrap = |errors| InferError::Inference {
        constraint: (*constraint).into(),
        errors,
    };

    let refined_arg = enforce_eq(unifier, (&arg_part, func_change), (&arg_bound, arg_change))
        .map_err(wrap)?;
    let refined_inter = enforce_eq(
        unifier,
        (&inter_part, func_change),
        (&inter_bound, inter_change),
    )
    .map_err(wrap)?;
    let refined_ret = enforce_eq(unifier, (&ret_part, func_change), (&ret_bound, ret_change))
        .map_err(wrap)?;

    let mut updates = Vec::new();

    if arg_change.is_changed() || inter_change.is_changed() || ret_change.is_changed() {
        updates.push((
            func,
            Some(Type::func(
                SpecialBounds::NEUTRAL,
                refined_arg.clone(),
                refined_inter.clone(),
                refined_ret.clone(),
            )),
        ));
    }
    if func_change.is_changed() {
        updates.push((arg, refined_arg));
        updates.push((inter, refined_inter));
        updates.push((ret, refined_ret));
    }

    Ok(updates)
}
