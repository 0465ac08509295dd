use std::collections::{HashMap, HashSet};

use crate::NodeId;

/// Decides whether adding the candidate edge `tail -> head` would close a
/// cycle, by depth-first searching the existing adjacency from `head` for
/// a path back to `tail`.
///
/// `visited` holds fully explored nodes and is never revisited; `on_path`
/// holds the current recursion stack and short-circuits back-edges (in the
/// symmetric adjacency this is what keeps the walk from bouncing straight
/// back along the edge it arrived on). Runs in O(V + E), terminates on any
/// finite graph including disconnected components, and never mutates the
/// adjacency.
pub fn would_create_cycle(
    adjacency: &HashMap<NodeId, HashSet<NodeId>>,
    tail: NodeId,
    head: NodeId,
) -> bool {
    let mut visited = HashSet::new();
    let mut on_path = HashSet::new();
    reaches(adjacency, head, tail, &mut visited, &mut on_path)
}

fn reaches(
    adjacency: &HashMap<NodeId, HashSet<NodeId>>,
    current: NodeId,
    target: NodeId,
    visited: &mut HashSet<NodeId>,
    on_path: &mut HashSet<NodeId>,
) -> bool {
    if current == target {
        return true;
    }

    visited.insert(current);
    on_path.insert(current);

    if let Some(neighbors) = adjacency.get(&current) {
        for &next in neighbors {
            if on_path.contains(&next) || visited.contains(&next) {
                continue;
            }
            if reaches(adjacency, next, target, visited, on_path) {
                return true;
            }
        }
    }

    on_path.remove(&current);
    false
}
