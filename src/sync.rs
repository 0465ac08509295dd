use serde::{Deserialize, Serialize};

use crate::*;

/// Fresh endpoint coordinates for one rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineUpdate {
    pub connection: ConnectionId,
    pub from: Point,
    pub to: Point,
}

/// Recomputes both endpoints of every connection incident to the moved
/// block by re-deriving anchor positions from the board. Connections not
/// touching the block are omitted. Idempotent and safe to call for every
/// intermediate position of a drag; topology is never touched.
pub fn refresh_lines(
    board: &Board,
    graph: &ConnectionGraph,
    moved: NodeId,
) -> Result<Vec<LineUpdate>, EditorError> {
    let mut updates = Vec::new();
    for connection in graph.connections_touching(moved) {
        updates.push(LineUpdate {
            connection: connection.id,
            from: board.anchor_position(connection.from)?,
            to: board.anchor_position(connection.to)?,
        });
    }
    Ok(updates)
}
