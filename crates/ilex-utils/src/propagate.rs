//! Generic worklist fixed-point propagation.
//!
//! A [`Propagator`] owns a store of keyed values and a list of rules. Each
//! rule observes values through a [`Query`] and proposes updates; proposed
//! updates are merged into the store with a caller-supplied merge function.
//! Rules run round after round until a full round produces no effective
//! change. Termination is the caller's obligation: the merge function must
//! only ever refine values.

use std::collections::BTreeMap;

use log::trace;

/// Whether a value changed since the querying rule last observed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    Unchanged,
    Changed,
}

impl Change {
    pub fn is_changed(self) -> bool {
        matches!(self, Change::Changed)
    }
}

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    version: u64,
}

/// Read access to the store, scoped to a single rule invocation.
///
/// Change tracking is per rule: a value counts as [`Change::Changed`] if it
/// was updated after this rule last observed it, including on the very
/// first observation.
pub struct Query<'q, K, V> {
    slots: &'q BTreeMap<K, Slot<V>>,
    default: &'q V,
    seen: &'q mut BTreeMap<K, u64>,
}

impl<K, V> Query<'_, K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    /// Current value for `key` and whether it changed since this rule last
    /// looked. Keys never declared resolve to the default value.
    pub fn get(&mut self, key: &K) -> (V, Change) {
        match self.slots.get(key) {
            Some(slot) => {
                let last = self.seen.insert(key.clone(), slot.version).unwrap_or(0);
                let change = if slot.version > last {
                    Change::Changed
                } else {
                    Change::Unchanged
                };
                (slot.value.clone(), change)
            }
            None => {
                let first = self.seen.insert(key.clone(), 0).is_none();
                let change = if first {
                    Change::Changed
                } else {
                    Change::Unchanged
                };
                (self.default.clone(), change)
            }
        }
    }
}

type RuleFn<'r, K, V, E> = Box<dyn Fn(&mut Query<'_, K, V>) -> Result<Vec<(K, V)>, E> + 'r>;
type MergeFn<'r, K, V, E> = Box<dyn Fn(&K, &V, V) -> Result<V, E> + 'r>;

struct Rule<'r, K, V, E> {
    run: RuleFn<'r, K, V, E>,
    seen: BTreeMap<K, u64>,
}

/// Worklist solver driving a set of rules to a fixed point.
pub struct Propagator<'r, K, V, E> {
    slots: BTreeMap<K, Slot<V>>,
    default: V,
    clock: u64,
    rules: Vec<Rule<'r, K, V, E>>,
    merge: MergeFn<'r, K, V, E>,
}

impl<'r, K, V, E> Propagator<'r, K, V, E>
where
    K: Ord + Clone,
    V: Clone + PartialEq,
{
    /// A propagator with the given default value and update-merge function.
    pub fn new(default: V, merge: impl Fn(&K, &V, V) -> Result<V, E> + 'r) -> Self {
        Self {
            slots: BTreeMap::new(),
            default,
            clock: 1,
            rules: Vec::new(),
            merge: Box::new(merge),
        }
    }

    /// Declare a key, seeding it with the default value if absent.
    pub fn declare(&mut self, key: K) {
        let default = &self.default;
        self.slots.entry(key).or_insert_with(|| Slot {
            value: default.clone(),
            version: 1,
        });
    }

    /// Seed a key with an initial value.
    pub fn init(&mut self, key: K, value: V) {
        self.slots.insert(key, Slot { value, version: 1 });
    }

    /// Register a rule.
    pub fn rule(&mut self, rule: impl Fn(&mut Query<'_, K, V>) -> Result<Vec<(K, V)>, E> + 'r) {
        self.rules.push(Rule {
            run: Box::new(rule),
            seen: BTreeMap::new(),
        });
    }

    /// Run every rule until a whole round leaves the store untouched, then
    /// project the final values. The first rule or merge error aborts.
    pub fn run(self) -> Result<BTreeMap<K, V>, E> {
        let Self {
            mut slots,
            default,
            mut clock,
            mut rules,
            merge,
        } = self;

        let mut round = 0u64;
        loop {
            round += 1;
            let mut refined = 0usize;

            for rule in rules.iter_mut() {
                let updates = {
                    let mut query = Query {
                        slots: &slots,
                        default: &default,
                        seen: &mut rule.seen,
                    };
                    (rule.run)(&mut query)?
                };

                for (key, value) in updates {
                    let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                        value: default.clone(),
                        version: 0,
                    });
                    let merged = merge(&key, &slot.value, value)?;
                    if merged != slot.value {
                        clock += 1;
                        slot.value = merged;
                        slot.version = clock;
                        refined += 1;
                    }
                }
            }

            trace!("propagation round {round}: {refined} values refined");

            if refined == 0 {
                break;
            }
        }

        Ok(slots
            .into_iter()
            .map(|(key, slot)| (key, slot.value))
            .collect())
    }
}
