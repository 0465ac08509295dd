use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cycle::would_create_cycle;
use crate::*;

/// A validated link between two anchors on two distinct blocks. The (from,
/// to) order is kept for display purposes (arrowheads, labels); cycle
/// safety treats the pair as undirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from: AnchorId,
    pub to: AnchorId,
}

/// Result of a connect gesture. Rejections are ordinary outcomes the UI
/// turns into a transient error flash, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected(ConnectionId),
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    SelfLoop,
    CycleDetected,
}

impl RejectReason {
    pub fn message(self) -> &'static str {
        match self {
            RejectReason::SelfLoop => "a block cannot be connected to itself",
            RejectReason::CycleDetected => "connection rejected: it would close a loop",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Node-level adjacency plus the anchor-level connection records. The
/// adjacency must stay acyclic (treated as undirected) at all times: every
/// accepted edge preserves that, every rejected attempt leaves the graph
/// unchanged.
#[derive(Debug, Default)]
pub struct ConnectionGraph {
    adjacency: HashMap<NodeId, HashSet<NodeId>>,
    connections: Vec<Connection>,
    next_id: u64,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs an empty adjacency entry for a freshly created block.
    /// Idempotent; the session calls this alongside `Board::create_node`.
    pub fn register_node(&mut self, id: NodeId) {
        self.adjacency.entry(id).or_default();
    }

    /// The central operation: attempt to connect two anchors.
    ///
    /// Connecting two anchors on the same block rejects as a self-loop.
    /// Blocks that are already adjacent accept without re-running the
    /// detector (an existing relation between two blocks is never itself a
    /// new cycle) and the extra anchor-level line is recorded as a parallel
    /// connection. Everything else consults the cycle detector first and
    /// commits only on a clean answer.
    pub fn try_connect(
        &mut self,
        from: AnchorId,
        to: AnchorId,
    ) -> Result<ConnectOutcome, EditorError> {
        let tail = from.node;
        let head = to.node;

        if !self.adjacency.contains_key(&tail) {
            return Err(EditorError::UnknownAnchor(from));
        }
        if !self.adjacency.contains_key(&head) {
            return Err(EditorError::UnknownAnchor(to));
        }

        if tail == head {
            return Ok(ConnectOutcome::Rejected(RejectReason::SelfLoop));
        }

        let already_adjacent = self.adjacency[&tail].contains(&head);
        if !already_adjacent {
            if would_create_cycle(&self.adjacency, tail, head) {
                return Ok(ConnectOutcome::Rejected(RejectReason::CycleDetected));
            }
            self.adjacency.entry(tail).or_default().insert(head);
            self.adjacency.entry(head).or_default().insert(tail);
        }

        self.next_id += 1;
        let id = ConnectionId(self.next_id);
        self.connections.push(Connection { id, from, to });
        Ok(ConnectOutcome::Connected(id))
    }

    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency
            .get(&a)
            .map_or(false, |set| set.contains(&b))
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Connections in acceptance order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Connections incident to the block, as source or as target.
    pub fn connections_touching(&self, node: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(move |c| c.from.node == node || c.to.node == node)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub(crate) fn adjacency(&self) -> &HashMap<NodeId, HashSet<NodeId>> {
        &self.adjacency
    }
}
