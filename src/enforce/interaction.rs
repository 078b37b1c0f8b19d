use ilex_utils::propagate::Query;

use crate::{
    constraints::InteractionConstraint,
    error::InferError,
    types::{Bound, InteractionType, Type},
    unify::{AtomUnifier, Unifier},
};

/// Keeps an asserted interaction a lower bound of its row variable.
///
/// When only the parameters moved, the row's entry for the interaction is
/// rebuilt from their current bounds. When the row itself moved, the
/// synthetic single-interaction row is pushed below it and the refined
/// parameter bounds flow back out to the parameter variables.
pub fn interaction<V, U, I>(
    unifier: &Unifier<'_, U>,
    constraint: &InteractionConstraint<V, I>,
    query: &mut Query<'_, V, Bound<U::Atom, I>>,
) -> Result<Vec<(V, Bound<U::Atom, I>)>, InferError<V, U::Atom, I>>
where
    V: Copy + Ord,
    U: AtomUnifier,
    U::Atom: Clone,
    I: Clone + Ord,
{
    let (var_bound, var_change) = query.get(&constraint.var);

    let mut param_bounds = Vec::with_capacity(constraint.params.len());
    let mut params_changed = false;
    for param in &constraint.params {
        let (bound, change) = query.get(param);
        params_changed |= change.is_changed();
        param_bounds.push(bound);
    }

    if !var_change.is_changed() && !params_changed {
        return Ok(Vec::new());
    }

    let row = Type::interaction_components(&var_bound).map_err(|bound| {
        InferError::NotInteraction {
            var: constraint.var,
            bound,
        }
    })?;

    if !var_change.is_changed() {
        // Only parameters moved: overwrite our entry and re-emit the row.
        let mut row = row.unwrap_or_default();
        row.lo.insert(constraint.interaction.clone(), param_bounds);

        return Ok(vec![(constraint.var, Some(Type::interaction(row)))]);
    }

    let synthetic = InteractionType::single(constraint.interaction.clone(), param_bounds);
    let (_, refined) = unifier
        .unify_lte(&Some(Type::interaction(synthetic)), &var_bound)
        .map_err(|errors| InferError::Inference {
            constraint: constraint.clone().into(),
            errors,
        })?;

    let mut updates = Vec::new();

    if let Some(row) = refined.as_ref().and_then(Type::as_interaction) {
        if let Some(refined_params) = row.lo.get(&constraint.interaction) {
            for (&param, bound) in constraint.params.iter().zip(refined_params) {
                updates.push((param, bound.clone()));
            }
        }
    }
    updates.push((constraint.var, refined));

    Ok(updates)
}
