use std::fmt;

use super::{Bound, Part, SpecialBounds};

/// A function type with argument, interaction row and result components.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncType<A, I> {
    pub bounds: SpecialBounds,
    pub arg: Bound<A, I>,
    pub inter: Bound<A, I>,
    pub ret: Bound<A, I>,
}

impl<A, I> FuncType<A, I> {
    pub fn new(bounds: SpecialBounds, arg: Bound<A, I>, inter: Bound<A, I>, ret: Bound<A, I>) -> Self {
        Self {
            bounds,
            arg,
            inter,
            ret,
        }
    }
}

impl<A: fmt::Display, I: fmt::Display> fmt::Display for FuncType<A, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", Part(&self.arg), Part(&self.ret))?;

        if let Some(inter) = &self.inter {
            write!(f, " ~ {inter}")?;
        }

        Ok(())
    }
}
