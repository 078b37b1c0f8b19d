use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::trace;

use crate::{
    error::InferError,
    types::{Form, Type},
    unify::{AtomUnifier, Direction, Unifier},
};

/// Relation between two type variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relation {
    Equality,
    Inequality(Direction),
}

impl Relation {
    /// The same relation read from the other side.
    pub fn flip(self) -> Self {
        match self {
            Self::Equality => Self::Equality,
            Self::Inequality(dir) => Self::Inequality(dir.flip()),
        }
    }

    /// Conjunction of two relations on the same pair: agreeing relations
    /// keep, disagreeing ones tighten to equality.
    pub fn conjoin(self, other: Self) -> Self {
        if self == other {
            self
        } else {
            Self::Equality
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equality => write!(f, "="),
            Self::Inequality(dir) => dir.fmt(f),
        }
    }
}

/// An unordered pair of variables, keyed canonically so symmetric
/// relations collapse onto one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderedPair<V> {
    min: V,
    max: V,
}

impl<V: Ord> OrderedPair<V> {
    /// Canonicalize a pair. The flag reports whether the inputs swapped
    /// places, so direction-sensitive payloads can be adjusted.
    pub fn new(lhs: V, rhs: V) -> (Self, bool) {
        if rhs < lhs {
            (Self { min: rhs, max: lhs }, true)
        } else {
            (Self { min: lhs, max: rhs }, false)
        }
    }
}

impl<V: Copy> OrderedPair<V> {
    pub fn min(&self) -> V {
        self.min
    }

    pub fn max(&self) -> V {
        self.max
    }
}

/// `var` must have exactly the given type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundConstraint<V, A, I> {
    pub var: V,
    pub ty: Type<A, I>,
}

/// `lhs` and `rhs` stand in the given relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationConstraint<V> {
    pub lhs: V,
    pub relation: Relation,
    pub rhs: V,
}

/// `whole` is shaped `form(first, second)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulationConstraint<V> {
    pub whole: V,
    pub form: Form,
    pub first: V,
    pub second: V,
}

/// `func` is a function from `arg` to `ret` performing `inter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuncConstraint<V> {
    pub func: V,
    pub arg: V,
    pub inter: V,
    pub ret: V,
}

/// The given interaction, with the given parameter variables, is a lower
/// bound of `var`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionConstraint<V, I> {
    pub var: V,
    pub interaction: I,
    pub params: Vec<V>,
}

/// `rest` is `whole` with the given interactions taken out; `rest` must
/// stay disjoint from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifferenceConstraint<V, I> {
    pub whole: V,
    pub inters: BTreeSet<I>,
    pub rest: V,
}

/// A raw typing constraint handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint<V, A, I> {
    Bound(BoundConstraint<V, A, I>),
    Relation(RelationConstraint<V>),
    Formulation(FormulationConstraint<V>),
    Func(FuncConstraint<V>),
    Interaction(InteractionConstraint<V, I>),
    InteractionDifference(DifferenceConstraint<V, I>),
}

impl<V, A, I> Constraint<V, A, I> {
    pub fn bound(var: V, ty: Type<A, I>) -> Self {
        Self::Bound(BoundConstraint { var, ty })
    }

    pub fn relation(lhs: V, relation: Relation, rhs: V) -> Self {
        Self::Relation(RelationConstraint { lhs, relation, rhs })
    }

    pub fn formulation(whole: V, form: Form, first: V, second: V) -> Self {
        Self::Formulation(FormulationConstraint {
            whole,
            form,
            first,
            second,
        })
    }

    pub fn func(func: V, arg: V, inter: V, ret: V) -> Self {
        Self::Func(FuncConstraint {
            func,
            arg,
            inter,
            ret,
        })
    }

    pub fn interaction(var: V, interaction: I, params: Vec<V>) -> Self {
        Self::Interaction(InteractionConstraint {
            var,
            interaction,
            params,
        })
    }

    pub fn difference(whole: V, inters: BTreeSet<I>, rest: V) -> Self {
        Self::InteractionDifference(DifferenceConstraint { whole, inters, rest })
    }
}

impl<V, A, I> From<BoundConstraint<V, A, I>> for Constraint<V, A, I> {
    fn from(value: BoundConstraint<V, A, I>) -> Self {
        Self::Bound(value)
    }
}

impl<V, A, I> From<RelationConstraint<V>> for Constraint<V, A, I> {
    fn from(value: RelationConstraint<V>) -> Self {
        Self::Relation(value)
    }
}

impl<V, A, I> From<FormulationConstraint<V>> for Constraint<V, A, I> {
    fn from(value: FormulationConstraint<V>) -> Self {
        Self::Formulation(value)
    }
}

impl<V, A, I> From<FuncConstraint<V>> for Constraint<V, A, I> {
    fn from(value: FuncConstraint<V>) -> Self {
        Self::Func(value)
    }
}

impl<V, A, I> From<InteractionConstraint<V, I>> for Constraint<V, A, I> {
    fn from(value: InteractionConstraint<V, I>) -> Self {
        Self::Interaction(value)
    }
}

impl<V, A, I> From<DifferenceConstraint<V, I>> for Constraint<V, A, I> {
    fn from(value: DifferenceConstraint<V, I>) -> Self {
        Self::InteractionDifference(value)
    }
}

impl<V, A, I> fmt::Display for Constraint<V, A, I>
where
    V: fmt::Display,
    A: fmt::Display,
    I: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bound(c) => write!(f, "{} = {}", c.var, c.ty),
            Self::Relation(c) => write!(f, "{} {} {}", c.lhs, c.relation, c.rhs),
            Self::Formulation(c) => {
                write!(f, "{} = {}({}, {})", c.whole, c.form, c.first, c.second)
            }
            Self::Func(c) => write!(f, "{} = {} -> {} ~ {}", c.func, c.arg, c.ret, c.inter),
            Self::Interaction(c) => {
                write!(f, "{}(", c.interaction)?;
                for (i, param) in c.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") <= {}", c.var)
            }
            Self::InteractionDifference(c) => {
                write!(f, "{} = {} \\ {{", c.rest, c.whole)?;
                for (i, interaction) in c.inters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{interaction}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// The consolidated constraint set: bounds merged per variable, relations
/// merged per unordered pair, structural constraints bucketed per kind.
/// Structural buckets are not deduplicated; the enforcers are idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraints<V, A, I> {
    bounds: BTreeMap<V, Type<A, I>>,
    relations: BTreeMap<OrderedPair<V>, Relation>,
    formulations: Vec<FormulationConstraint<V>>,
    funcs: Vec<FuncConstraint<V>>,
    interactions: Vec<InteractionConstraint<V, I>>,
    differences: Vec<DifferenceConstraint<V, I>>,
}

impl<V, A, I> Constraints<V, A, I>
where
    V: Copy + Ord + fmt::Display,
    A: Clone + fmt::Display,
    I: Clone + Ord + fmt::Display,
{
    /// Normalize a raw constraint list. Conflicting bounds on the same
    /// variable surface here, labelled with the constraint that clashed.
    pub fn consolidate<U>(
        input: impl IntoIterator<Item = Constraint<V, A, I>>,
        unifier: &Unifier<'_, U>,
    ) -> Result<Self, InferError<V, A, I>>
    where
        U: AtomUnifier<Atom = A>,
    {
        let mut this = Self {
            bounds: BTreeMap::new(),
            relations: BTreeMap::new(),
            formulations: Vec::new(),
            funcs: Vec::new(),
            interactions: Vec::new(),
            differences: Vec::new(),
        };

        for constraint in input {
            trace!("consolidating {constraint}");

            match constraint {
                Constraint::Bound(bound) => this.insert_bound(bound, unifier)?,
                Constraint::Relation(relation) => this.insert_relation(relation),
                Constraint::Formulation(formulation) => this.formulations.push(formulation),
                Constraint::Func(func) => this.funcs.push(func),
                Constraint::Interaction(interaction) => this.interactions.push(interaction),
                Constraint::InteractionDifference(difference) => {
                    this.differences.push(difference)
                }
            }
        }

        Ok(this)
    }

    fn insert_bound<U>(
        &mut self,
        bound: BoundConstraint<V, A, I>,
        unifier: &Unifier<'_, U>,
    ) -> Result<(), InferError<V, A, I>>
    where
        U: AtomUnifier<Atom = A>,
    {
        match self.bounds.get_mut(&bound.var) {
            Some(known) => {
                let unified = unifier
                    .unify_eq(&Some(known.clone()), &Some(bound.ty.clone()))
                    .map_err(|errors| InferError::Inference {
                        constraint: bound.into(),
                        errors,
                    })?;

                if let Some(ty) = unified {
                    *known = ty;
                }
            }
            None => {
                self.bounds.insert(bound.var, bound.ty);
            }
        }

        Ok(())
    }

    fn insert_relation(&mut self, relation: RelationConstraint<V>) {
        let (pair, flipped) = OrderedPair::new(relation.lhs, relation.rhs);
        let relation = if flipped {
            relation.relation.flip()
        } else {
            relation.relation
        };

        self.relations
            .entry(pair)
            .and_modify(|known| *known = known.conjoin(relation))
            .or_insert(relation);
    }
}

impl<V: Copy + Ord, A, I> Constraints<V, A, I> {
    /// Every variable any constraint mentions.
    pub fn vars(&self) -> BTreeSet<V> {
        let mut vars = BTreeSet::new();

        vars.extend(self.bounds.keys().copied());
        for pair in self.relations.keys() {
            vars.insert(pair.min());
            vars.insert(pair.max());
        }
        for c in &self.formulations {
            vars.extend([c.whole, c.first, c.second]);
        }
        for c in &self.funcs {
            vars.extend([c.func, c.arg, c.inter, c.ret]);
        }
        for c in &self.interactions {
            vars.insert(c.var);
            vars.extend(c.params.iter().copied());
        }
        for c in &self.differences {
            vars.extend([c.whole, c.rest]);
        }

        vars
    }

    pub fn bounds(&self) -> &BTreeMap<V, Type<A, I>> {
        &self.bounds
    }

    pub fn relations(&self) -> &BTreeMap<OrderedPair<V>, Relation> {
        &self.relations
    }

    pub fn formulations(&self) -> &[FormulationConstraint<V>] {
        &self.formulations
    }

    pub fn funcs(&self) -> &[FuncConstraint<V>] {
        &self.funcs
    }

    pub fn interactions(&self) -> &[InteractionConstraint<V, I>] {
        &self.interactions
    }

    pub fn differences(&self) -> &[DifferenceConstraint<V, I>] {
        &self.differences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Atom, StrictAtoms, Var};
    use crate::unify::Unifier;

    type C = Constraint<Var, Atom, &'static str>;

    #[test]
    fn test_bounds_merge_under_equality() {
        let unifier = Unifier::new(&StrictAtoms);
        let x = Var(0);

        let consolidated = Constraints::consolidate(
            [
                C::bound(x, Type::app(Some(Type::Atom(Atom::Int)), None)),
                C::bound(x, Type::app(None, Some(Type::Atom(Atom::Bool)))),
            ],
            &unifier,
        )
        .unwrap();

        assert_eq!(
            consolidated.bounds()[&x],
            Type::app(Some(Type::Atom(Atom::Int)), Some(Type::Atom(Atom::Bool))),
        );
    }

    #[test]
    fn test_conflicting_bounds_fail_with_the_offender() {
        let unifier = Unifier::new(&StrictAtoms);
        let x = Var(0);
        let offender = C::bound(x, Type::Atom(Atom::Bool));

        let err = Constraints::consolidate(
            [C::bound(x, Type::Atom(Atom::Int)), offender.clone()],
            &unifier,
        )
        .unwrap_err();

        assert!(
            matches!(err, InferError::Inference { constraint, .. } if constraint == offender),
            "the error names the constraint that clashed"
        );
    }

    #[test]
    fn test_flipped_pairs_share_an_entry() {
        let unifier = Unifier::new(&StrictAtoms);
        let (a, b) = (Var(0), Var(1));

        let consolidated = Constraints::consolidate(
            [
                C::relation(b, Relation::Inequality(Direction::Lte), a),
                C::relation(a, Relation::Inequality(Direction::Gte), b),
            ],
            &unifier,
        )
        .unwrap();

        // b <= a arrives twice, spelled from both ends.
        let (pair, _) = OrderedPair::new(a, b);
        assert_eq!(consolidated.relations().len(), 1);
        assert_eq!(
            consolidated.relations()[&pair],
            Relation::Inequality(Direction::Gte),
        );
    }

    #[test]
    fn test_disagreeing_relations_collapse_to_equality() {
        let unifier = Unifier::new(&StrictAtoms);
        let (a, b) = (Var(0), Var(1));

        let consolidated = Constraints::consolidate(
            [
                C::relation(a, Relation::Inequality(Direction::Lte), b),
                C::relation(a, Relation::Inequality(Direction::Gte), b),
            ],
            &unifier,
        )
        .unwrap();

        let (pair, _) = OrderedPair::new(a, b);
        assert_eq!(consolidated.relations()[&pair], Relation::Equality);
    }

    #[test]
    fn test_vars_covers_every_mention() {
        let unifier = Unifier::new(&StrictAtoms);

        let consolidated = Constraints::consolidate(
            [
                C::formulation(Var(0), Form::Tuple, Var(1), Var(2)),
                C::interaction(Var(3), "read", vec![Var(4)]),
            ],
            &unifier,
        )
        .unwrap();

        let vars = consolidated.vars();
        assert_eq!(vars.len(), 5);
        assert!((0..5).all(|i| vars.contains(&Var(i))));
    }
}
