//! Sets closed under complement.

use std::collections::BTreeSet;
use std::fmt;

/// A set representation that is either exactly the given members or
/// everything except the given members. Closed under union and
/// intersection, which plain finite sets are not once complements enter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComplementSet<T> {
    /// Exactly the members of the given set.
    Included(BTreeSet<T>),
    /// Everything except the members of the given set.
    Excluded(BTreeSet<T>),
}

impl<T> ComplementSet<T> {
    /// The set containing everything.
    pub fn universe() -> Self {
        Self::Excluded(BTreeSet::new())
    }

    pub fn is_universe(&self) -> bool {
        match self {
            Self::Excluded(set) => set.is_empty(),
            Self::Included(_) => false,
        }
    }
}

impl<T: Ord> ComplementSet<T> {
    pub fn included(members: impl IntoIterator<Item = T>) -> Self {
        Self::Included(members.into_iter().collect())
    }

    pub fn excluded(members: impl IntoIterator<Item = T>) -> Self {
        Self::Excluded(members.into_iter().collect())
    }

    pub fn contains(&self, member: &T) -> bool {
        match self {
            Self::Included(set) => set.contains(member),
            Self::Excluded(set) => !set.contains(member),
        }
    }
}

impl<T: Ord + Clone> ComplementSet<T> {
    pub fn union(&self, other: &Self) -> Self {
        use ComplementSet::*;

        match (self, other) {
            (Included(lhs), Included(rhs)) => Included(lhs.union(rhs).cloned().collect()),
            (Included(lhs), Excluded(rhs)) => Excluded(rhs.difference(lhs).cloned().collect()),
            (Excluded(lhs), Included(rhs)) => Excluded(lhs.difference(rhs).cloned().collect()),
            (Excluded(lhs), Excluded(rhs)) => Excluded(lhs.intersection(rhs).cloned().collect()),
        }
    }

    pub fn intersection(&self, other: &Self) -> Self {
        use ComplementSet::*;

        match (self, other) {
            (Included(lhs), Included(rhs)) => Included(lhs.intersection(rhs).cloned().collect()),
            (Included(lhs), Excluded(rhs)) => Included(lhs.difference(rhs).cloned().collect()),
            (Excluded(lhs), Included(rhs)) => Included(rhs.difference(lhs).cloned().collect()),
            (Excluded(lhs), Excluded(rhs)) => Excluded(lhs.union(rhs).cloned().collect()),
        }
    }
}

impl<T: fmt::Display> fmt::Display for ComplementSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members = match self {
            Self::Included(set) => set,
            Self::Excluded(set) => {
                write!(f, "~")?;
                set
            }
        };

        write!(f, "{{")?;
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{member}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let included = ComplementSet::included(["read"]);
        let excluded = ComplementSet::excluded(["read"]);

        assert!(included.contains(&"read"));
        assert!(!included.contains(&"write"));
        assert!(!excluded.contains(&"read"));
        assert!(excluded.contains(&"write"));
    }

    #[test]
    fn test_union() {
        let a = ComplementSet::included(["read"]);
        let b = ComplementSet::included(["write"]);
        assert_eq!(a.union(&b), ComplementSet::included(["read", "write"]));

        let c = ComplementSet::excluded(["read", "io"]);
        assert_eq!(a.union(&c), ComplementSet::excluded(["io"]));

        let d = ComplementSet::excluded(["io", "write"]);
        assert_eq!(c.union(&d), ComplementSet::excluded(["io"]));
    }

    #[test]
    fn test_intersection() {
        let a = ComplementSet::included(["read", "write"]);
        let b = ComplementSet::included(["write", "io"]);
        assert_eq!(a.intersection(&b), ComplementSet::included(["write"]));

        let c = ComplementSet::excluded(["write"]);
        assert_eq!(a.intersection(&c), ComplementSet::included(["read"]));

        let d = ComplementSet::excluded(["io"]);
        assert_eq!(c.intersection(&d), ComplementSet::excluded(["write", "io"]));
    }

    #[test]
    fn test_universe_is_identity_for_intersection() {
        let a: ComplementSet<&str> = ComplementSet::included(["read"]);
        let universe = ComplementSet::universe();

        assert!(universe.is_universe());
        assert_eq!(a.intersection(&universe), a);
        assert_eq!(universe.union(&a), ComplementSet::universe());
    }
}
