use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ilex_utils::ComplementSet;

use super::{Bound, Part};

/// An interaction row.
///
/// `lo` lists the interactions a type must at least perform, together with
/// the bounds known for their parameters. `hi` bounds the interactions it
/// may perform at all. The row carrying no information has an empty `lo`
/// and a universal `hi`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InteractionType<A, I> {
    pub lo: BTreeMap<I, Vec<Bound<A, I>>>,
    pub hi: ComplementSet<I>,
}

impl<A, I> Default for InteractionType<A, I> {
    fn default() -> Self {
        Self {
            lo: BTreeMap::new(),
            hi: ComplementSet::universe(),
        }
    }
}

impl<A, I: Ord> InteractionType<A, I> {
    pub fn new(lo: BTreeMap<I, Vec<Bound<A, I>>>, hi: ComplementSet<I>) -> Self {
        Self { lo, hi }
    }

    /// A row demanding exactly one interaction and permitting anything.
    pub fn single(interaction: I, params: Vec<Bound<A, I>>) -> Self {
        let mut lo = BTreeMap::new();
        lo.insert(interaction, params);

        Self {
            lo,
            hi: ComplementSet::universe(),
        }
    }
}

impl<A: Clone, I: Clone + Ord> InteractionType<A, I> {
    /// The row left over when the given interactions are taken out: they
    /// disappear from `lo` and become forbidden in `hi`.
    pub fn subtract(&self, removed: &BTreeSet<I>) -> Self {
        let lo = self
            .lo
            .iter()
            .filter(|(interaction, _)| !removed.contains(interaction))
            .map(|(interaction, params)| (interaction.clone(), params.clone()))
            .collect();

        let hi = self
            .hi
            .intersection(&ComplementSet::excluded(removed.iter().cloned()));

        Self { lo, hi }
    }

    /// Copy parameter lists over from `src` for every interaction this row
    /// already tracks. Interactions only `src` knows are left alone.
    pub fn transfer_values(&mut self, src: &Self) {
        for (interaction, params) in &src.lo {
            if let Some(entry) = self.lo.get_mut(interaction) {
                *entry = params.clone();
            }
        }
    }
}

impl<A: fmt::Display, I: fmt::Display> fmt::Display for InteractionType<A, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;

        for (i, (interaction, params)) in self.lo.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{interaction}")?;

            if !params.is_empty() {
                write!(f, "(")?;
                for (j, param) in params.iter().enumerate() {
                    if j > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", Part(param))?;
                }
                write!(f, ")")?;
            }
        }

        write!(f, " | {}}}", self.hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Row = InteractionType<&'static str, &'static str>;

    #[test]
    fn test_subtract_removes_mandatory_and_forbids() {
        let mut lo = BTreeMap::new();
        lo.insert("read", vec![Some(crate::types::Type::Atom("int"))]);
        lo.insert("write", vec![]);
        let row = Row::new(lo, ComplementSet::universe());

        let rest = row.subtract(&BTreeSet::from(["read"]));

        assert!(!rest.lo.contains_key("read"));
        assert!(rest.lo.contains_key("write"));
        assert!(!rest.hi.contains(&"read"));
        assert!(rest.hi.contains(&"write"));
    }

    #[test]
    fn test_subtract_nothing_is_identity_on_lo() {
        let row = Row::single("read", vec![None]);

        let rest = row.subtract(&BTreeSet::new());

        assert_eq!(rest.lo, row.lo);
        assert!(rest.hi.is_universe());
    }

    #[test]
    fn test_transfer_values_only_touches_known_keys() {
        let mut dst = Row::single("read", vec![None]);
        let mut src_lo = BTreeMap::new();
        src_lo.insert("read", vec![Some(crate::types::Type::Atom("int"))]);
        src_lo.insert("write", vec![]);
        let src = Row::new(src_lo, ComplementSet::universe());

        dst.transfer_values(&src);

        assert_eq!(dst.lo["read"], vec![Some(crate::types::Type::Atom("int"))]);
        assert!(!dst.lo.contains_key("write"), "unknown keys are not copied");
    }
}
