use std::fmt;

use super::{Bound, Part, SpecialBounds};

/// A pair of component types with corner admissibility flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleType<A, I> {
    pub bounds: SpecialBounds,
    pub fst: Bound<A, I>,
    pub snd: Bound<A, I>,
}

impl<A, I> TupleType<A, I> {
    pub fn new(bounds: SpecialBounds, fst: Bound<A, I>, snd: Bound<A, I>) -> Self {
        Self { bounds, fst, snd }
    }
}

impl<A: fmt::Display, I: fmt::Display> fmt::Display for TupleType<A, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", Part(&self.fst), Part(&self.snd))
    }
}
