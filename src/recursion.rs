//! Rejection of constraint sets that demand infinite types.
//!
//! Structural constraints make a whole strictly larger than each of its
//! parts. If those larger-than edges close a cycle, no finite type can
//! satisfy them, so solving is refused before propagation starts.

use ilex_utils::dependency::DependencyGraph;

use crate::{constraints::Constraints, error::InferError};

pub fn check_recursion<V, A, I>(
    constraints: &Constraints<V, A, I>,
) -> Result<(), InferError<V, A, I>>
where
    V: Copy + Ord,
{
    let mut graph = DependencyGraph::new();

    for c in constraints.formulations() {
        graph.add_dependency(c.whole, c.first);
        graph.add_dependency(c.whole, c.second);
    }
    for c in constraints.funcs() {
        graph.add_dependency(c.func, c.arg);
        graph.add_dependency(c.func, c.inter);
        graph.add_dependency(c.func, c.ret);
    }
    for c in constraints.interactions() {
        for &param in &c.params {
            graph.add_dependency(c.var, param);
        }
    }
    for c in constraints.differences() {
        // An empty subtraction relates the same row to itself, which is
        // not a size relation.
        if !c.inters.is_empty() {
            graph.add_dependency(c.whole, c.rest);
        }
    }

    match graph.topological_sort() {
        Ok(_) => Ok(()),
        Err(_) => Err(InferError::RecursiveType),
    }
}
