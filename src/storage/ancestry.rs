//! Ancestor search over the commit graph.
//!
//! All walks follow the union of primary-parent and additional-parent edges
//! unless stated otherwise. Each walk keeps its own visited set, so no state
//! survives between calls.

use std::collections::HashSet;

use crate::history::HistoryQueue;
use crate::storage::commit::CommitGraph;
use crate::storage::error::StorageResult;
use crate::storage::types::CommitHandle;

/// Breadth-first walk from `start` over all parent edges.
///
/// `start` comes first; every reachable node appears exactly once, parents
/// in the order the node lists them (primary parent first).
pub fn breadth_first_collect(
    graph: &CommitGraph,
    start: CommitHandle,
) -> StorageResult<Vec<CommitHandle>> {
    graph.get(start)?;

    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = HistoryQueue::new();

    visited.insert(start);
    queue.enqueue(start);

    while !queue.is_empty() {
        let current = queue.dequeue()?;
        order.push(current);

        for parent in graph.get(current)?.parents() {
            if visited.insert(parent) {
                queue.enqueue(parent);
            }
        }
    }

    Ok(order)
}

/// `start` and everything reachable from it
pub fn ancestors(graph: &CommitGraph, start: CommitHandle) -> StorageResult<HashSet<CommitHandle>> {
    Ok(breadth_first_collect(graph, start)?.into_iter().collect())
}

/// check if `ancestor` is `descendant` itself or reachable from it
pub fn is_ancestor(
    graph: &CommitGraph,
    ancestor: CommitHandle,
    descendant: CommitHandle,
) -> StorageResult<bool> {
    graph.get(ancestor)?;
    Ok(breadth_first_collect(graph, descendant)?.contains(&ancestor))
}

/// Find the nearest common ancestor of `a` and `b`.
///
/// A node counts as its own ancestor, so `common_ancestor(n, n) == n` and an
/// ancestor of the other side is returned as-is. When several common
/// ancestors are equally near (criss-cross histories) the most recently
/// created one wins, which keeps the answer independent of argument order.
/// Returns `None` for disjoint histories.
pub fn common_ancestor(
    graph: &CommitGraph,
    a: CommitHandle,
    b: CommitHandle,
) -> StorageResult<Option<CommitHandle>> {
    let theirs = ancestors(graph, b)?;
    let common: Vec<CommitHandle> = breadth_first_collect(graph, a)?
        .into_iter()
        .filter(|h| theirs.contains(h))
        .collect();

    // the common set is closed under ancestry, so a common ancestor is
    // strictly older than another one exactly when it is some member's parent
    let mut older = HashSet::new();
    for handle in &common {
        older.extend(graph.get(*handle)?.parents());
    }

    Ok(common.into_iter().filter(|h| !older.contains(h)).max())
}

/// Primary-parent chain from `start` back to its root, `start` first.
pub fn first_parent_walk(
    graph: &CommitGraph,
    start: CommitHandle,
) -> StorageResult<Vec<CommitHandle>> {
    let mut chain = Vec::new();
    let mut cursor = Some(start);
    while let Some(current) = cursor {
        chain.push(current);
        cursor = graph.get(current)?.parent();
    }
    Ok(chain)
}

/// Nodes reachable from `tip` that are not ancestors of `base`, in
/// breadth-first order. `base` itself is excluded.
pub fn commits_since(
    graph: &CommitGraph,
    tip: CommitHandle,
    base: CommitHandle,
) -> StorageResult<Vec<CommitHandle>> {
    let known = ancestors(graph, base)?;
    Ok(breadth_first_collect(graph, tip)?
        .into_iter()
        .filter(|h| !known.contains(h))
        .collect())
}
