//! Module for tracking structural dependencies between nodes.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use thiserror::Error;

/// Error representing a dependency cycle
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("dependency cycle detected")]
pub struct CycleError<T>(Vec<T>);

impl<T> CycleError<T> {
    /// Create a new cycle error
    pub fn new(nodes: Vec<T>) -> Self {
        Self(nodes)
    }

    /// The nodes that could not be ordered, i.e. those on or behind a cycle.
    pub fn nodes(&self) -> &[T] {
        &self.0
    }
}

/// Graph of dependencies between nodes
#[derive(Debug, Clone)]
pub struct DependencyGraph<T> {
    /// Forward dependencies (node -> dependencies)
    forward: BTreeMap<T, BTreeSet<T>>,

    /// Reverse dependencies (node -> dependents)
    reverse: BTreeMap<T, BTreeSet<T>>,
}

impl<T> DependencyGraph<T> {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self {
            forward: BTreeMap::new(),
            reverse: BTreeMap::new(),
        }
    }
}

impl<T> Default for DependencyGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Copy> DependencyGraph<T> {
    /// Ensure a node is present, with or without dependencies.
    pub fn add_node(&mut self, node: T) {
        self.forward.entry(node).or_default();
        self.reverse.entry(node).or_default();
    }

    /// Add a dependency edge. Duplicate edges collapse into one.
    pub fn add_dependency(&mut self, from: T, to: T) {
        self.add_node(from);
        self.add_node(to);

        if self.forward.entry(from).or_default().insert(to) {
            self.reverse.entry(to).or_default().insert(from);
        }
    }

    /// Get dependencies of a node
    pub fn dependencies_of(&self, node: T) -> impl Iterator<Item = T> + '_ {
        self.forward.get(&node).into_iter().flatten().copied()
    }

    /// Get dependents of a node
    pub fn dependents_of(&self, node: T) -> impl Iterator<Item = T> + '_ {
        self.reverse.get(&node).into_iter().flatten().copied()
    }

    /// Perform a topological sort of the nodes, dependencies first.
    pub fn topological_sort(&self) -> Result<Vec<T>, CycleError<T>> {
        let mut pending: BTreeMap<T, usize> = self
            .forward
            .iter()
            .map(|(&node, deps)| (node, deps.len()))
            .collect();

        let mut ready: VecDeque<T> = pending
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&node, _)| node)
            .collect();

        let mut order = Vec::with_capacity(pending.len());

        while let Some(node) = ready.pop_front() {
            order.push(node);

            for dependent in self.dependents_of(node) {
                if let Some(count) = pending.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push_back(dependent);
                    }
                }
            }
        }

        if order.len() < pending.len() {
            // Whatever never reached a dependency count of zero sits on or
            // behind a cycle.
            let stuck = pending
                .into_iter()
                .filter(|&(_, count)| count > 0)
                .map(|(node, _)| node)
                .collect();
            Err(CycleError::new(stuck))
        } else {
            Ok(order)
        }
    }
}
