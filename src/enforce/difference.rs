use std::collections::BTreeSet;

use ilex_utils::{propagate::Query, ComplementSet};

use crate::{
    constraints::DifferenceConstraint,
    error::InferError,
    types::{Bound, InteractionType, Type},
    unify::{AtomUnifier, Unifier},
};

/// Keeps `rest` equal to `whole` without the subtracted interactions.
///
/// A whole-driven change recomputes the rest by subtraction. A rest-driven
/// change widens the whole: missing mandatory interactions are inserted,
/// permissions are unioned. When both moved, the subtracted whole and the
/// rest unify and the whole is rebuilt around the result. The rest must
/// never mention a subtracted interaction.
pub fn difference<V, U, I>(
    unifier: &Unifier<'_, U>,
    constraint: &DifferenceConstraint<V, I>,
    query: &mut Query<'_, V, Bound<U::Atom, I>>,
) -> Result<Vec<(V, Bound<U::Atom, I>)>, InferError<V, U::Atom, I>>
where
    V: Copy + Ord,
    U: AtomUnifier,
    U::Atom: Clone,
    I: Clone + Ord,
{
    let DifferenceConstraint { whole, inters, rest } = constraint;

    let (whole_bound, whole_change) = query.get(whole);
    let (rest_bound, rest_change) = query.get(rest);

    if !whole_change.is_changed() && !rest_change.is_changed() {
        return Ok(Vec::new());
    }

    let whole_row = Type::interaction_components(&whole_bound)
        .map_err(|bound| InferError::NotInteraction { var: *whole, bound })?;
    let rest_row = Type::interaction_components(&rest_bound)
        .map_err(|bound| InferError::NotInteraction { var: *rest, bound })?;

    match (whole_change.is_changed(), rest_change.is_changed()) {
        (true, false) => {
            let rest_new = whole_row.unwrap_or_default().subtract(inters);

            Ok(vec![(*rest, Some(Type::interaction(rest_new)))])
        }
        (false, _) => {
            let rest_row = rest_row.unwrap_or_default();
            check_disjoint(*rest, inters, &rest_row)?;

            let mut widened = whole_row.unwrap_or_default();
            for (interaction, params) in &rest_row.lo {
                widened
                    .lo
                    .entry(interaction.clone())
                    .or_insert_with(|| params.clone());
            }
            widened.hi = widened.hi.union(&rest_row.hi);

            Ok(vec![(*whole, Some(Type::interaction(widened)))])
        }
        (true, true) => {
            let whole_row = whole_row.unwrap_or_default();
            let whole_sub = whole_row.subtract(inters);

            let rest_unified = unifier
                .unify_eq(&Some(Type::interaction(whole_sub)), &rest_bound)
                .map_err(|errors| InferError::Inference {
                    constraint: constraint.clone().into(),
                    errors,
                })?;
            let rest_new = rest_unified
                .as_ref()
                .and_then(Type::as_interaction)
                .cloned()
                .unwrap_or_default();
            check_disjoint(*rest, inters, &rest_new)?;

            // The whole keeps everything it knew; interactions the rest
            // also tracks take the just-unified parameter lists.
            let mut rebuilt = whole_row.clone();
            for (interaction, params) in &rest_new.lo {
                rebuilt
                    .lo
                    .entry(interaction.clone())
                    .or_insert_with(|| params.clone());
            }
            rebuilt.transfer_values(&rest_new);
            rebuilt.hi = whole_row.hi.intersection(
                &ComplementSet::included(inters.iter().cloned()).union(&rest_new.hi),
            );

            Ok(vec![
                (*whole, Some(Type::interaction(rebuilt))),
                (*rest, rest_unified),
            ])
        }
    }
}

/// A rest row may neither demand a subtracted interaction nor positively
/// permit one.
pub(crate) fn check_disjoint<V, A, I>(
    var: V,
    inters: &BTreeSet<I>,
    row: &InteractionType<A, I>,
) -> Result<(), InferError<V, A, I>>
where
    A: Clone,
    I: Clone + Ord,
{
    let demands = inters.iter().any(|i| row.lo.contains_key(i));
    let permits = matches!(
        &row.hi,
        ComplementSet::Included(permitted) if permitted.iter().any(|p| inters.contains(p))
    );

    if demands || permits {
        Err(InferError::InteractionCantContain {
            var,
            inters: inters.clone(),
            bound: Type::interaction(row.clone()),
        })
    } else {
        Ok(())
    }
}
