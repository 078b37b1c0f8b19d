use std::fmt;

use super::{Bound, Part};

/// A type application, `head param`. Either component may be unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppType<A, I> {
    pub head: Bound<A, I>,
    pub param: Bound<A, I>,
}

impl<A, I> AppType<A, I> {
    pub fn new(head: Bound<A, I>, param: Bound<A, I>) -> Self {
        Self { head, param }
    }
}

impl<A: fmt::Display, I: fmt::Display> fmt::Display for AppType<A, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {})", Part(&self.head), Part(&self.param))
    }
}
