use ilex_utils::propagate::Query;

use crate::{
    constraints::{OrderedPair, Relation, RelationConstraint},
    error::InferError,
    types::Bound,
    unify::{AtomUnifier, Direction, Unifier},
};

/// Keeps the bounds of a canonical pair of variables in the stored
/// relation: equal bounds flow both ways, inequalities refine the upper
/// from the lower and vice versa.
pub fn relation<V, U, I>(
    unifier: &Unifier<'_, U>,
    pair: OrderedPair<V>,
    relation: Relation,
    query: &mut Query<'_, V, Bound<U::Atom, I>>,
) -> Result<Vec<(V, Bound<U::Atom, I>)>, InferError<V, U::Atom, I>>
where
    V: Copy + Ord,
    U: AtomUnifier,
    U::Atom: Clone,
    I: Clone + Ord,
{
    let lhs = OrderedPair::min(&pair);
    let rhs = OrderedPair::max(&pair);

    let (lhs_bound, lhs_change) = query.get(&lhs);
    let (rhs_bound, rhs_change) = query.get(&rhs);

    if !lhs_change.is_changed() && !rhs_change.is_changed() {
        return Ok(Vec::new());
    }

    let wrap = |errors| InferError::Inference {
        constraint: RelationConstraint { lhs, relation, rhs }.into(),
        errors,
    };

    match relation {
        Relation::Equality => match (lhs_change.is_changed(), rhs_change.is_changed()) {
            (true, false) => Ok(vec![(rhs, lhs_bound)]),
            (false, _) => Ok(vec![(lhs, rhs_bound)]),
            (true, true) => {
                let unified = unifier.unify_eq(&lhs_bound, &rhs_bound).map_err(wrap)?;
                Ok(vec![(lhs, unified.clone()), (rhs, unified)])
            }
        },
        Relation::Inequality(dir) => {
            // Normalize to lower <= upper.
            let (lower, lower_bound, lower_change, upper, upper_bound, upper_change) = match dir {
                Direction::Lte => (lhs, lhs_bound, lhs_change, rhs, rhs_bound, rhs_change),
                Direction::Gte => (rhs, rhs_bound, rhs_change, lhs, lhs_bound, lhs_change),
            };

            match (lower_change.is_changed(), upper_change.is_changed()) {
                (true, false) => {
                    let refined = unifier
                        .unify_asym(Direction::Lte, &lower_bound, &upper_bound)
                        .map_err(wrap)?;
                    Ok(vec![(upper, refined)])
                }
                (false, _) => {
                    let refined = unifier
                        .unify_asym(Direction::Gte, &upper_bound, &lower_bound)
                        .map_err(wrap)?;
                    Ok(vec![(lower, refined)])
                }
                (true, true) => {
                    let (refined_lower, refined_upper) =
                        unifier.unify_lte(&lower_bound, &upper_bound).map_err(wrap)?;
                    Ok(vec![(lower, refined_lower), (upper, refined_upper)])
                }
            }
        }
    }
}
