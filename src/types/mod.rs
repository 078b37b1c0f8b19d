use std::fmt;

use derive_more::Display;

pub use app::AppType;
pub use bounds::SpecialBounds;
pub use func::FuncType;
pub use interaction::InteractionType;
pub use tuple::TupleType;

mod app;
mod bounds;
mod func;
mod interaction;
mod tuple;

/// A partially known type. `None` means no bound is known yet.
pub type Bound<A, I> = Option<Type<A, I>>;

/// The shape a formulation constraint imposes on a variable.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Form {
    #[display("app")]
    App,
    #[display("tuple")]
    Tuple,
}

/// A type over atoms `A` and interaction names `I`.
///
/// Structured components are themselves partial, so a bound can describe
/// a shape whose pieces are still unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type<A, I> {
    /// Atomic leaf, unified by the caller-supplied atom unifier.
    Atom(A),
    /// The empty type.
    Never,
    App(Box<AppType<A, I>>),
    Tuple(Box<TupleType<A, I>>),
    Func(Box<FuncType<A, I>>),
    Interaction(Box<InteractionType<A, I>>),
}

impl<A, I> Type<A, I> {
    pub fn app(head: Bound<A, I>, param: Bound<A, I>) -> Self {
        Self::App(Box::new(AppType::new(head, param)))
    }

    pub fn tuple(bounds: SpecialBounds, fst: Bound<A, I>, snd: Bound<A, I>) -> Self {
        Self::Tuple(Box::new(TupleType::new(bounds, fst, snd)))
    }

    pub fn func(
        bounds: SpecialBounds,
        arg: Bound<A, I>,
        inter: Bound<A, I>,
        ret: Bound<A, I>,
    ) -> Self {
        Self::Func(Box::new(FuncType::new(bounds, arg, inter, ret)))
    }

    pub fn interaction(row: InteractionType<A, I>) -> Self {
        Self::Interaction(Box::new(row))
    }

    pub fn as_interaction(&self) -> Option<&InteractionType<A, I>> {
        match self {
            Self::Interaction(row) => Some(row),
            _ => None,
        }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }
}

impl<A: Clone, I: Clone + Ord> Type<A, I> {
    /// Project the two components `form` demands out of a partial bound.
    ///
    /// An unknown whole has unknown components. A `never` whole projects
    /// through an application as a `never` head (applying the empty type
    /// is the only way the application can be empty), while for a tuple
    /// either slot may be the empty one, so both stay unknown. Any other
    /// shape is handed back as the mismatch witness.
    pub fn split_formulation(
        form: Form,
        whole: &Bound<A, I>,
    ) -> Result<(Bound<A, I>, Bound<A, I>), Type<A, I>> {
        match (form, whole) {
            (_, None) => Ok((None, None)),
            (Form::App, Some(Type::App(app))) => Ok((app.head.clone(), app.param.clone())),
            (Form::App, Some(Type::Never)) => Ok((Some(Type::Never), None)),
            (Form::Tuple, Some(Type::Tuple(tuple))) => Ok((tuple.fst.clone(), tuple.snd.clone())),
            (Form::Tuple, Some(Type::Never)) => Ok((None, None)),
            (_, Some(other)) => Err(other.clone()),
        }
    }

    /// Rebuild a whole from its components. Tuples come back with neutral
    /// corner flags; merging restores whatever was known before.
    pub fn join_formulation(form: Form, first: Bound<A, I>, second: Bound<A, I>) -> Self {
        match form {
            Form::App => Self::app(first, second),
            Form::Tuple => Self::tuple(SpecialBounds::NEUTRAL, first, second),
        }
    }

    /// Project argument, interaction and result out of a function bound,
    /// or hand back the non-function shape.
    pub fn func_components(
        whole: &Bound<A, I>,
    ) -> Result<(Bound<A, I>, Bound<A, I>, Bound<A, I>), Type<A, I>> {
        match whole {
            None => Ok((None, None, None)),
            Some(Type::Func(func)) => Ok((func.arg.clone(), func.inter.clone(), func.ret.clone())),
            Some(other) => Err(other.clone()),
        }
    }

    /// View a bound as an interaction row, or hand back the offending
    /// shape. An unknown bound is an unknown row.
    pub fn interaction_components(
        whole: &Bound<A, I>,
    ) -> Result<Option<InteractionType<A, I>>, Type<A, I>> {
        match whole {
            None => Ok(None),
            Some(Type::Interaction(row)) => Ok(Some((**row).clone())),
            Some(other) => Err(other.clone()),
        }
    }
}

impl<A: fmt::Display, I: fmt::Display> fmt::Display for Type<A, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(atom) => atom.fmt(f),
            Self::Never => write!(f, "never"),
            Self::App(app) => app.fmt(f),
            Self::Tuple(tuple) => tuple.fmt(f),
            Self::Func(func) => func.fmt(f),
            Self::Interaction(row) => row.fmt(f),
        }
    }
}

impl<A, I> From<AppType<A, I>> for Type<A, I> {
    fn from(value: AppType<A, I>) -> Self {
        Self::App(Box::new(value))
    }
}

impl<A, I> From<TupleType<A, I>> for Type<A, I> {
    fn from(value: TupleType<A, I>) -> Self {
        Self::Tuple(Box::new(value))
    }
}

impl<A, I> From<FuncType<A, I>> for Type<A, I> {
    fn from(value: FuncType<A, I>) -> Self {
        Self::Func(Box::new(value))
    }
}

impl<A, I> From<InteractionType<A, I>> for Type<A, I> {
    fn from(value: InteractionType<A, I>) -> Self {
        Self::Interaction(Box::new(value))
    }
}

/// Displays a component bound, printing `_` for unknown.
pub(crate) struct Part<'t, A, I>(pub &'t Bound<A, I>);

impl<A: fmt::Display, I: fmt::Display> fmt::Display for Part<'_, A, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ty) => ty.fmt(f),
            None => write!(f, "_"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Ty = Type<&'static str, &'static str>;

    #[test]
    fn test_split_unknown_whole() {
        let (head, param) = Ty::split_formulation(Form::App, &None).unwrap();

        assert_eq!(head, None);
        assert_eq!(param, None);
    }

    #[test]
    fn test_split_never() {
        let never: Bound<_, _> = Some(Ty::Never);

        let (head, param) = Ty::split_formulation(Form::App, &never).unwrap();
        assert_eq!(head, Some(Ty::Never), "only an empty head empties an app");
        assert_eq!(param, None);

        let (fst, snd) = Ty::split_formulation(Form::Tuple, &never).unwrap();
        assert_eq!(fst, None, "either tuple slot may be the empty one");
        assert_eq!(snd, None);
    }

    #[test]
    fn test_split_rejects_other_shapes() {
        let bound = Some(Ty::tuple(SpecialBounds::NEUTRAL, None, None));

        let mismatch = Ty::split_formulation(Form::App, &bound).unwrap_err();

        assert!(matches!(mismatch, Type::Tuple(_)));
    }

    #[test]
    fn test_split_inverts_join() {
        let first = Some(Ty::Atom("int"));
        let second = Some(Ty::Atom("bool"));
        let whole = Some(Ty::join_formulation(Form::Tuple, first.clone(), second.clone()));

        let (fst, snd) = Ty::split_formulation(Form::Tuple, &whole).unwrap();

        assert_eq!(fst, first);
        assert_eq!(snd, second);
    }

    #[test]
    fn test_display() {
        let func = Ty::func(
            SpecialBounds::NEUTRAL,
            Some(Ty::Atom("int")),
            None,
            Some(Ty::Atom("bool")),
        );
        assert_eq!(func.to_string(), "int -> bool");

        let app = Ty::app(Some(Ty::Atom("list")), None);
        assert_eq!(app.to_string(), "(list _)");
    }
}
