use std::collections::BTreeMap;
use std::fmt;

use ilex_utils::propagate::Propagator;
use log::trace;

use crate::{
    constraints::{Constraint, Constraints, Relation, RelationConstraint},
    enforce,
    error::InferError,
    recursion::check_recursion,
    types::{Bound, Type},
    unify::{AtomUnifier, Unifier},
};

/// A complete inference problem: the constraints and the unifier for the
/// atom domain they speak about.
#[derive(Debug, Clone)]
pub struct Problem<V, A, I, U> {
    pub constraints: Vec<Constraint<V, A, I>>,
    pub atoms: U,
}

/// The inferred bound of every variable the problem mentioned. Variables
/// the problem never constrained beyond their existence stay unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution<V, A, I> {
    table: BTreeMap<V, Bound<A, I>>,
}

impl<V: Ord, A, I> Solution<V, A, I> {
    /// The inferred type of a variable, if one became known.
    pub fn get(&self, var: &V) -> Option<&Type<A, I>> {
        self.table.get(var).and_then(|bound| bound.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&V, Option<&Type<A, I>>)> {
        self.table.iter().map(|(var, bound)| (var, bound.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Infer a bound for every variable, or report the first conflict.
///
/// Consolidation folds duplicate constraints together, the recursion
/// check rejects constraint sets demanding infinite types, and the
/// remaining constraints run as rules over a shared bound store until
/// nothing refines any further. Conflicting updates to one variable merge
/// under equality, so rule order cannot change the result.
pub fn solve<V, A, I, U>(problem: Problem<V, A, I, U>) -> Result<Solution<V, A, I>, InferError<V, A, I>>
where
    V: Copy + Ord + fmt::Display,
    A: Clone + PartialEq + fmt::Display,
    I: Clone + Ord + fmt::Display,
    U: AtomUnifier<Atom = A>,
{
    let Problem { constraints, atoms } = problem;

    let unifier = Unifier::new(&atoms);
    let consolidated = Constraints::consolidate(constraints, &unifier)?;
    check_recursion(&consolidated)?;

    let unifier = &unifier;
    let mut propagator = Propagator::new(
        None,
        move |var: &V, current: &Bound<A, I>, update: Bound<A, I>| {
            unifier
                .unify_eq(current, &update)
                .map_err(|errors| InferError::Inference {
                    constraint: RelationConstraint {
                        lhs: *var,
                        relation: Relation::Equality,
                        rhs: *var,
                    }
                    .into(),
                    errors,
                })
        },
    );

    let vars = consolidated.vars();
    trace!("solving for {} variables", vars.len());

    for var in vars {
        propagator.declare(var);
    }
    for (&var, ty) in consolidated.bounds() {
        propagator.init(var, Some(ty.clone()));
    }

    for (&pair, &relation) in consolidated.relations() {
        propagator.rule(move |query| enforce::relation(unifier, pair, relation, query));
    }
    for &constraint in consolidated.formulations() {
        propagator.rule(move |query| enforce::formulation(unifier, &constraint, query));
    }
    for &constraint in consolidated.funcs() {
        propagator.rule(move |query| enforce::func(unifier, &constraint, query));
    }
    for constraint in consolidated.interactions() {
        let constraint = constraint.clone();
        propagator.rule(move |query| enforce::interaction(unifier, &constraint, query));
    }
    for constraint in consolidated.differences() {
        let constraint = constraint.clone();
        propagator.rule(move |query| enforce::difference(unifier, &constraint, query));
    }

    let table = propagator.run()?;

    Ok(Solution { table })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use ilex_utils::ComplementSet;

    use super::*;
    use crate::testing::{Atom, StrictAtoms, Var};
    use crate::types::{Form, InteractionType, SpecialBounds};
    use crate::unify::Direction;

    type C = Constraint<Var, Atom, &'static str>;
    type Ty = Type<Atom, &'static str>;

    fn int() -> Ty {
        Ty::Atom(Atom::Int)
    }

    fn bool_() -> Ty {
        Ty::Atom(Atom::Bool)
    }

    fn solve_strict(
        constraints: Vec<C>,
    ) -> Result<Solution<Var, Atom, &'static str>, InferError<Var, Atom, &'static str>> {
        solve(Problem {
            constraints,
            atoms: StrictAtoms,
        })
    }

    #[test]
    fn test_single_bound_is_projected() {
        let x = Var(0);

        let solution =
            solve_strict(vec![C::bound(x, Ty::app(Some(int()), Some(bool_())))]).unwrap();

        assert_eq!(solution.get(&x), Some(&Ty::app(Some(int()), Some(bool_()))));
    }

    #[test]
    fn test_equality_propagates_bounds() {
        let (x, y) = (Var(0), Var(1));

        let solution = solve_strict(vec![
            C::bound(x, int()),
            C::relation(x, Relation::Equality, y),
        ])
        .unwrap();

        assert_eq!(solution.get(&x), Some(&int()));
        assert_eq!(solution.get(&y), Some(&int()));
    }

    #[test]
    fn test_inequality_propagates_the_best_bound() {
        let (x, y) = (Var(0), Var(1));

        let solution = solve_strict(vec![
            C::bound(x, int()),
            C::relation(x, Relation::Inequality(Direction::Lte), y),
        ])
        .unwrap();

        assert_eq!(solution.get(&y), Some(&int()));
    }

    #[test]
    fn test_tuple_formulation_assembles_the_whole() {
        let (w, a, b) = (Var(0), Var(1), Var(2));

        let solution = solve_strict(vec![
            C::formulation(w, Form::Tuple, a, b),
            C::bound(a, int()),
            C::bound(b, bool_()),
        ])
        .unwrap();

        assert_eq!(
            solution.get(&w),
            Some(&Ty::tuple(
                SpecialBounds::NEUTRAL,
                Some(int()),
                Some(bool_())
            )),
        );
    }

    #[test]
    fn test_formulation_splits_the_whole() {
        let (w, a, b) = (Var(0), Var(1), Var(2));

        let solution = solve_strict(vec![
            C::bound(w, Ty::app(Some(int()), Some(bool_()))),
            C::formulation(w, Form::App, a, b),
        ])
        .unwrap();

        assert_eq!(solution.get(&a), Some(&int()));
        assert_eq!(solution.get(&b), Some(&bool_()));
    }

    #[test]
    fn test_func_constraint_distributes_components() {
        let (f, arg, inter, ret) = (Var(0), Var(1), Var(2), Var(3));

        let solution = solve_strict(vec![
            C::bound(
                f,
                Ty::func(SpecialBounds::NEUTRAL, Some(int()), None, Some(bool_())),
            ),
            C::func(f, arg, inter, ret),
        ])
        .unwrap();

        assert_eq!(solution.get(&arg), Some(&int()));
        assert_eq!(solution.get(&ret), Some(&bool_()));
        assert_eq!(
            solution.get(&inter),
            None,
            "an unknown interaction component stays unknown"
        );
    }

    #[test]
    fn test_interaction_becomes_a_row_lower_bound() {
        let (v, p) = (Var(0), Var(1));

        let solution = solve_strict(vec![
            C::interaction(v, "read", vec![p]),
            C::bound(p, int()),
        ])
        .unwrap();

        let row = solution.get(&v).and_then(Ty::as_interaction).unwrap();
        assert_eq!(row.lo.len(), 1);
        assert_eq!(row.lo["read"], vec![Some(int())]);
        assert!(row.hi.is_universe());
    }

    #[test]
    fn test_difference_splits_a_row() {
        let (w, p, q, r) = (Var(0), Var(1), Var(2), Var(3));

        let solution = solve_strict(vec![
            C::interaction(w, "read", vec![p]),
            C::interaction(w, "write", vec![q]),
            C::bound(p, int()),
            C::difference(w, BTreeSet::from(["read"]), r),
        ])
        .unwrap();

        let whole = solution.get(&w).and_then(Ty::as_interaction).unwrap();
        assert_eq!(whole.lo["read"], vec![Some(int())]);
        assert!(whole.lo.contains_key("write"));

        let rest = solution.get(&r).and_then(Ty::as_interaction).unwrap();
        assert!(!rest.lo.contains_key("read"));
        assert!(rest.lo.contains_key("write"));
        assert_eq!(
            rest.hi,
            ComplementSet::excluded(["read"]),
            "the rest may never regain the subtracted interaction"
        );
    }

    #[test]
    fn test_conflicting_bounds_name_the_offender() {
        let x = Var(0);
        let offender = C::bound(x, Ty::tuple(SpecialBounds::new(false, true), None, None));

        let err = solve_strict(vec![
            C::bound(x, Ty::app(Some(int()), None)),
            offender.clone(),
        ])
        .unwrap_err();

        assert!(matches!(err, InferError::Inference { constraint, .. } if constraint == offender));
    }

    #[test]
    fn test_self_application_is_rejected() {
        let (x, y) = (Var(0), Var(1));

        let err = solve_strict(vec![C::formulation(x, Form::App, x, y)]).unwrap_err();

        assert_eq!(err, InferError::RecursiveType);
    }

    #[test]
    fn test_form_mismatch_is_reported() {
        let (x, a, b) = (Var(0), Var(1), Var(2));

        let err = solve_strict(vec![
            C::bound(x, Ty::func(SpecialBounds::NEUTRAL, None, None, None)),
            C::formulation(x, Form::App, a, b),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            InferError::FormMismatch { var: Var(0), form: Form::App, .. }
        ));
    }

    #[test]
    fn test_non_function_is_reported() {
        let (f, arg, inter, ret) = (Var(0), Var(1), Var(2), Var(3));

        let err = solve_strict(vec![
            C::bound(f, int()),
            C::func(f, arg, inter, ret),
        ])
        .unwrap_err();

        assert!(matches!(err, InferError::NotFunction { var: Var(0), .. }));
    }

    #[test]
    fn test_non_interaction_is_reported() {
        let v = Var(0);

        let err = solve_strict(vec![
            C::bound(v, int()),
            C::interaction(v, "read", vec![]),
        ])
        .unwrap_err();

        assert!(matches!(err, InferError::NotInteraction { var: Var(0), .. }));
    }

    #[test]
    fn test_disagreeing_inequalities_act_as_equality() {
        let (x, y) = (Var(0), Var(1));

        let solution = solve_strict(vec![
            C::bound(y, int()),
            C::relation(x, Relation::Inequality(Direction::Lte), y),
            C::relation(x, Relation::Inequality(Direction::Gte), y),
        ])
        .unwrap();

        assert_eq!(solution.get(&x), Some(&int()));
    }

    #[test]
    fn test_added_constraints_only_refine() {
        let x = Var(0);
        let partial = vec![C::bound(x, Ty::app(Some(int()), None))];
        let mut extended = partial.clone();
        extended.push(C::bound(x, Ty::app(None, Some(bool_()))));

        let before = solve_strict(partial).unwrap();
        let after = solve_strict(extended).unwrap();

        assert_eq!(before.get(&x), Some(&Ty::app(Some(int()), None)));
        assert_eq!(after.get(&x), Some(&Ty::app(Some(int()), Some(bool_()))));
    }

    #[test]
    fn test_constraint_order_does_not_matter() {
        let (w, a, b, v, p) = (Var(0), Var(1), Var(2), Var(3), Var(4));
        let mut constraints = vec![
            C::formulation(w, Form::Tuple, a, b),
            C::bound(a, int()),
            C::bound(b, bool_()),
            C::interaction(v, "read", vec![p]),
            C::relation(p, Relation::Equality, a),
        ];

        let forward = solve_strict(constraints.clone()).unwrap();
        constraints.reverse();
        let backward = solve_strict(constraints).unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_solving_a_solution_is_stable() {
        let (w, a, b) = (Var(0), Var(1), Var(2));

        let solution = solve_strict(vec![
            C::formulation(w, Form::Tuple, a, b),
            C::bound(a, int()),
            C::bound(b, bool_()),
        ])
        .unwrap();

        let replay = solution
            .iter()
            .filter_map(|(&var, bound)| bound.map(|ty| C::bound(var, ty.clone())))
            .collect();

        assert_eq!(solve_strict(replay).unwrap(), solution);
    }

    #[test]
    fn test_lower_bound_outside_permissions_fails() {
        let (v, w) = (Var(0), Var(1));

        let err = solve_strict(vec![
            C::interaction(v, "read", vec![]),
            C::bound(
                w,
                Ty::interaction(InteractionType::new(
                    Default::default(),
                    ComplementSet::included(["write"]),
                )),
            ),
            C::relation(v, Relation::Inequality(Direction::Lte), w),
        ])
        .unwrap_err();

        // v demands read, w permits only write: the relation cannot hold.
        assert!(matches!(err, InferError::Inference { .. }));
    }
}
