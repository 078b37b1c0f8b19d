use std::collections::BTreeMap;

use derive_more::Display;
use ilex_utils::ComplementSet;

use crate::{
    error::{AtomError, TypeError, TypeErrors},
    types::{Bound, InteractionType, Type},
};

/// Direction of an asymmetric unification.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    #[display("<=")]
    Lte,
    #[display(">=")]
    Gte,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Self::Lte => Self::Gte,
            Self::Gte => Self::Lte,
        }
    }
}

/// Unification of atomic leaf types, supplied by the caller.
///
/// `unify_eq` must be reflexive and symmetric; refinement must be
/// monotone. Domains without subtyping on their atoms only implement
/// `unify_eq`, the asymmetric modes collapse to it by default.
pub trait AtomUnifier {
    type Atom: Clone;

    /// A common bound of two atoms, or the mismatch.
    fn unify_eq(
        &self,
        lhs: &Self::Atom,
        rhs: &Self::Atom,
    ) -> Result<Self::Atom, AtomError<Self::Atom>>;

    /// Refine `target` knowing `source <dir> target` holds.
    fn unify_asym(
        &self,
        _dir: Direction,
        source: &Self::Atom,
        target: &Self::Atom,
    ) -> Result<Self::Atom, AtomError<Self::Atom>> {
        self.unify_eq(source, target)
    }

    /// Refine both sides of `lower <= upper`.
    fn unify_lte(
        &self,
        lower: &Self::Atom,
        upper: &Self::Atom,
    ) -> Result<(Self::Atom, Self::Atom), AtomError<Self::Atom>> {
        let unified = self.unify_eq(lower, upper)?;
        Ok((unified.clone(), unified))
    }
}

/// Lifts an atom unifier to partial structured types.
///
/// An unknown bound is the identity of every mode: it carries no
/// information, so the other side survives unchanged. Known bounds
/// recurse structurally; shapes that disagree fail.
pub struct Unifier<'u, U> {
    atoms: &'u U,
}

impl<'u, U> Unifier<'u, U>
where
    U: AtomUnifier,
{
    pub fn new(atoms: &'u U) -> Self {
        Self { atoms }
    }

    /// A common bound of two partial types.
    pub fn unify_eq<I>(
        &self,
        lhs: &Bound<U::Atom, I>,
        rhs: &Bound<U::Atom, I>,
    ) -> Result<Bound<U::Atom, I>, TypeErrors<U::Atom, I>>
    where
        I: Clone + Ord,
    {
        match (lhs, rhs) {
            (None, other) | (other, None) => Ok(other.clone()),
            (Some(lhs), Some(rhs)) => self.eq_type(lhs, rhs).map(Some),
        }
    }

    /// Refine `target` knowing that `source <dir> target` holds. An
    /// unknown target adopts the source, which is its best bound.
    pub fn unify_asym<I>(
        &self,
        dir: Direction,
        source: &Bound<U::Atom, I>,
        target: &Bound<U::Atom, I>,
    ) -> Result<Bound<U::Atom, I>, TypeErrors<U::Atom, I>>
    where
        I: Clone + Ord,
    {
        match (source, target) {
            (None, _) => Ok(target.clone()),
            (Some(_), None) => Ok(source.clone()),
            (Some(source), Some(target)) => self.asym_type(dir, source, target).map(Some),
        }
    }

    /// Refine both sides of `lower <= upper`.
    pub fn unify_lte<I>(
        &self,
        lower: &Bound<U::Atom, I>,
        upper: &Bound<U::Atom, I>,
    ) -> Result<(Bound<U::Atom, I>, Bound<U::Atom, I>), TypeErrors<U::Atom, I>>
    where
        I: Clone + Ord,
    {
        if let (Some(Type::Atom(lhs)), Some(Type::Atom(rhs))) = (lower, upper) {
            let (lo, hi) = self
                .atoms
                .unify_lte(lhs, rhs)
                .map_err(|e| TypeErrors::unit(e.into()))?;
            return Ok((Some(Type::Atom(lo)), Some(Type::Atom(hi))));
        }

        // One refinement step per side; the fixed-point loop closes any
        // remaining gap on the next visit.
        let refined_upper = self.unify_asym(Direction::Lte, lower, upper)?;
        let refined_lower = self.unify_asym(Direction::Gte, upper, lower)?;

        Ok((refined_lower, refined_upper))
    }

    fn eq_type<I>(
        &self,
        lhs: &Type<U::Atom, I>,
        rhs: &Type<U::Atom, I>,
    ) -> Result<Type<U::Atom, I>, TypeErrors<U::Atom, I>>
    where
        I: Clone + Ord,
    {
        match (lhs, rhs) {
            (Type::Atom(l), Type::Atom(r)) => self
                .atoms
                .unify_eq(l, r)
                .map(Type::Atom)
                .map_err(|e| TypeErrors::unit(e.into())),
            (Type::Never, Type::Never) => Ok(Type::Never),
            (Type::Never, other) | (other, Type::Never) => {
                if can_be_never(other) {
                    Ok(Type::Never)
                } else {
                    Err(cannot_unify(lhs, rhs))
                }
            }
            (Type::App(l), Type::App(r)) => {
                let head = self.unify_eq(&l.head, &r.head)?;
                let param = self.unify_eq(&l.param, &r.param)?;
                Ok(Type::app(head, param))
            }
            (Type::Tuple(l), Type::Tuple(r)) => {
                let fst = self.unify_eq(&l.fst, &r.fst)?;
                let snd = self.unify_eq(&l.snd, &r.snd)?;
                Ok(Type::tuple(l.bounds.meet(r.bounds), fst, snd))
            }
            (Type::Func(l), Type::Func(r)) => {
                let arg = self.unify_eq(&l.arg, &r.arg)?;
                let inter = self.unify_eq(&l.inter, &r.inter)?;
                let ret = self.unify_eq(&l.ret, &r.ret)?;
                Ok(Type::func(l.bounds.meet(r.bounds), arg, inter, ret))
            }
            (Type::Interaction(l), Type::Interaction(r)) => {
                self.eq_row(l, r).map(Type::interaction)
            }
            (l, r) => Err(cannot_unify(l, r)),
        }
    }

    fn asym_type<I>(
        &self,
        dir: Direction,
        source: &Type<U::Atom, I>,
        target: &Type<U::Atom, I>,
    ) -> Result<Type<U::Atom, I>, TypeErrors<U::Atom, I>>
    where
        I: Clone + Ord,
    {
        match (source, target) {
            (Type::Atom(s), Type::Atom(t)) => self
                .atoms
                .unify_asym(dir, s, t)
                .map(Type::Atom)
                .map_err(|e| TypeErrors::unit(e.into())),
            (Type::Never, Type::Never) => Ok(Type::Never),
            (Type::Never, other) => match dir {
                // `never <= target` carries no information.
                Direction::Lte => Ok(other.clone()),
                // `never >= target` forces the target down to `never`.
                Direction::Gte => {
                    if can_be_never(other) {
                        Ok(Type::Never)
                    } else {
                        Err(cannot_unify(source, target))
                    }
                }
            },
            (other, Type::Never) => match dir {
                // `source <= never` forces the source empty; the target
                // was already as low as it goes.
                Direction::Lte => {
                    if can_be_never(other) {
                        Ok(Type::Never)
                    } else {
                        Err(cannot_unify(source, target))
                    }
                }
                Direction::Gte => Ok(Type::Never),
            },
            (Type::App(s), Type::App(t)) => {
                let head = self.unify_asym(dir, &s.head, &t.head)?;
                let param = self.unify_asym(dir, &s.param, &t.param)?;
                Ok(Type::app(head, param))
            }
            (Type::Tuple(s), Type::Tuple(t)) => {
                let fst = self.unify_asym(dir, &s.fst, &t.fst)?;
                let snd = self.unify_asym(dir, &s.snd, &t.snd)?;
                Ok(Type::tuple(s.bounds.meet(t.bounds), fst, snd))
            }
            (Type::Func(s), Type::Func(t)) => {
                let arg = self.unify_asym(dir, &s.arg, &t.arg)?;
                let inter = self.unify_asym(dir, &s.inter, &t.inter)?;
                let ret = self.unify_asym(dir, &s.ret, &t.ret)?;
                Ok(Type::func(s.bounds.meet(t.bounds), arg, inter, ret))
            }
            (Type::Interaction(s), Type::Interaction(t)) => {
                self.asym_row(dir, s, t).map(Type::interaction)
            }
            (s, t) => Err(cannot_unify(s, t)),
        }
    }

    // Row equality merges the mandatory interactions of both sides,
    // unifying parameter lists pointwise, and intersects the permission
    // bounds. A mandatory interaction falling outside the merged
    // permissions is contradictory.
    fn eq_row<I>(
        &self,
        lhs: &InteractionType<U::Atom, I>,
        rhs: &InteractionType<U::Atom, I>,
    ) -> Result<InteractionType<U::Atom, I>, TypeErrors<U::Atom, I>>
    where
        I: Clone + Ord,
    {
        let mut errors = TypeErrors::new();
        let mut lo = lhs.lo.clone();

        for (interaction, params) in &rhs.lo {
            match lo.get_mut(interaction) {
                Some(known) => match self.eq_params(interaction, known, params) {
                    Ok(unified) => *known = unified,
                    Err(mut errs) => errors.append(&mut errs),
                },
                None => {
                    lo.insert(interaction.clone(), params.clone());
                }
            }
        }

        let hi = lhs.hi.intersection(&rhs.hi);
        check_permitted(&lo, &hi, &mut errors);

        if errors.has_errors() {
            Err(errors)
        } else {
            Ok(InteractionType::new(lo, hi))
        }
    }

    // Asymmetric rows: the lower row's mandatory interactions widen the
    // upper's `lo`, the upper row's permissions narrow the lower's `hi`.
    fn asym_row<I>(
        &self,
        dir: Direction,
        source: &InteractionType<U::Atom, I>,
        target: &InteractionType<U::Atom, I>,
    ) -> Result<InteractionType<U::Atom, I>, TypeErrors<U::Atom, I>>
    where
        I: Clone + Ord,
    {
        let mut errors = TypeErrors::new();
        let mut lo = target.lo.clone();

        match dir {
            // Refining the upper: it must carry every mandatory
            // interaction of the lower.
            Direction::Lte => {
                for (interaction, params) in &source.lo {
                    match lo.get_mut(interaction) {
                        Some(known) => match self.asym_params(dir, interaction, params, known) {
                            Ok(refined) => *known = refined,
                            Err(mut errs) => errors.append(&mut errs),
                        },
                        None => {
                            lo.insert(interaction.clone(), params.clone());
                        }
                    }
                }

                check_permitted(&lo, &target.hi, &mut errors);

                if errors.has_errors() {
                    Err(errors)
                } else {
                    Ok(InteractionType::new(lo, target.hi.clone()))
                }
            }
            // Refining the lower: it may only permit what the upper
            // permits; its own mandatory interactions merely refine.
            Direction::Gte => {
                for (interaction, params) in &source.lo {
                    if let Some(known) = lo.get_mut(interaction) {
                        match self.asym_params(dir, interaction, params, known) {
                            Ok(refined) => *known = refined,
                            Err(mut errs) => errors.append(&mut errs),
                        }
                    }
                }

                let hi = target.hi.intersection(&source.hi);
                check_permitted(&lo, &hi, &mut errors);

                if errors.has_errors() {
                    Err(errors)
                } else {
                    Ok(InteractionType::new(lo, hi))
                }
            }
        }
    }

    fn eq_params<I>(
        &self,
        interaction: &I,
        lhs: &[Bound<U::Atom, I>],
        rhs: &[Bound<U::Atom, I>],
    ) -> Result<Vec<Bound<U::Atom, I>>, TypeErrors<U::Atom, I>>
    where
        I: Clone + Ord,
    {
        check_arity(interaction, lhs, rhs)?;

        lhs.iter()
            .zip(rhs)
            .map(|(l, r)| self.unify_eq(l, r))
            .collect()
    }

    fn asym_params<I>(
        &self,
        dir: Direction,
        interaction: &I,
        source: &[Bound<U::Atom, I>],
        target: &[Bound<U::Atom, I>],
    ) -> Result<Vec<Bound<U::Atom, I>>, TypeErrors<U::Atom, I>>
    where
        I: Clone + Ord,
    {
        check_arity(interaction, source, target)?;

        source
            .iter()
            .zip(target)
            .map(|(s, t)| self.unify_asym(dir, s, t))
            .collect()
    }
}

fn can_be_never<A, I>(ty: &Type<A, I>) -> bool {
    match ty {
        Type::Tuple(tuple) => tuple.bounds.can_be_never,
        Type::Func(func) => func.bounds.can_be_never,
        _ => false,
    }
}

fn cannot_unify<A: Clone, I: Clone>(
    expected: &Type<A, I>,
    actual: &Type<A, I>,
) -> TypeErrors<A, I> {
    TypeErrors::unit(TypeError::CannotUnify {
        expected: expected.clone(),
        actual: actual.clone(),
    })
}

fn check_arity<A, I: Clone>(
    interaction: &I,
    lhs: &[Bound<A, I>],
    rhs: &[Bound<A, I>],
) -> Result<(), TypeErrors<A, I>> {
    if lhs.len() == rhs.len() {
        Ok(())
    } else {
        Err(TypeErrors::unit(TypeError::ParameterArity {
            interaction: interaction.clone(),
            expected: lhs.len(),
            actual: rhs.len(),
        }))
    }
}

fn check_permitted<A, I: Clone + Ord>(
    lo: &BTreeMap<I, Vec<Bound<A, I>>>,
    hi: &ComplementSet<I>,
    errors: &mut TypeErrors<A, I>,
) {
    for interaction in lo.keys() {
        if !hi.contains(interaction) {
            errors.push(TypeError::ForbiddenInteraction {
                interaction: interaction.clone(),
            });
        }
    }
}
