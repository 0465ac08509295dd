use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sync::refresh_lines;
use crate::*;

/// How long the rendering collaborator should keep a rejection flash on
/// screen before auto-dismissing it. The core carries no timer; the
/// duration travels with the command.
pub const ERROR_FLASH_MS: u64 = 2000;

/// Semantic input events, as produced by the (external) pointer layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InputEvent {
    NodeDropped { label: String, position: Point },
    NodeDragged { node: NodeId, position: Point },
    AnchorClicked { node: NodeId, side: AnchorSide },
}

/// Instructions for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RenderCommand {
    RenderNode {
        node: NodeId,
        position: Point,
        label: String,
    },
    RenderLine {
        connection: ConnectionId,
        from: Point,
        to: Point,
    },
    UpdateLine {
        connection: ConnectionId,
        from: Point,
        to: Point,
    },
    ShowTransientError {
        message: String,
        duration_ms: u64,
    },
    HighlightAnchor {
        anchor: AnchorId,
        on: bool,
    },
}

/// The anchor-selection state machine behind the two-click connect
/// gesture. Node drags bypass it entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Idle,
    Armed(AnchorId),
}

/// One editing session: the board, the connection graph, and the current
/// selection, owned together so there is no global mutable state. Dropped
/// when the session ends.
#[derive(Debug)]
pub struct EditorSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    board: Board,
    graph: ConnectionGraph,
    selection: Selection,
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            board: Board::new(),
            graph: ConnectionGraph::new(),
            selection: Selection::Idle,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn graph(&self) -> &ConnectionGraph {
        &self.graph
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Uniform entry point used by the replay driver and the HTTP API.
    pub fn handle_event(&mut self, event: InputEvent) -> Result<Vec<RenderCommand>, EditorError> {
        match event {
            InputEvent::NodeDropped { label, position } => {
                let node = self.drop_node(&label, position);
                Ok(vec![RenderCommand::RenderNode {
                    node,
                    position,
                    label,
                }])
            }
            InputEvent::NodeDragged { node, position } => self.drag_node(node, position),
            InputEvent::AnchorClicked { node, side } => {
                self.click_anchor(AnchorId::new(node, side))
            }
        }
    }

    /// Creates the block in the registry and gives it an empty adjacency
    /// entry in the graph. Never fails.
    pub fn drop_node(&mut self, label: &str, position: Point) -> NodeId {
        let id = self.board.create_node(label, position);
        self.graph.register_node(id);
        id
    }

    /// Applies one intermediate drag position and reports fresh endpoint
    /// coordinates for every line touching the block.
    pub fn drag_node(
        &mut self,
        node: NodeId,
        position: Point,
    ) -> Result<Vec<RenderCommand>, EditorError> {
        self.board.move_node(node, position)?;
        let updates = refresh_lines(&self.board, &self.graph, node)?;
        Ok(updates
            .into_iter()
            .map(|update| RenderCommand::UpdateLine {
                connection: update.connection,
                from: update.from,
                to: update.to,
            })
            .collect())
    }

    /// One step of the two-click gesture. The first click arms the
    /// selection and highlights the anchor; the second always clears the
    /// highlight and returns to idle, whatever the connect attempt says.
    pub fn click_anchor(&mut self, anchor: AnchorId) -> Result<Vec<RenderCommand>, EditorError> {
        // Validate up front so a stale id cannot half-arm the gesture.
        self.board.anchor_position(anchor)?;

        match self.selection {
            Selection::Idle => {
                self.selection = Selection::Armed(anchor);
                Ok(vec![RenderCommand::HighlightAnchor { anchor, on: true }])
            }
            Selection::Armed(first) => {
                self.selection = Selection::Idle;
                let mut commands = vec![RenderCommand::HighlightAnchor {
                    anchor: first,
                    on: false,
                }];

                match self.graph.try_connect(first, anchor)? {
                    ConnectOutcome::Connected(connection) => {
                        commands.push(RenderCommand::RenderLine {
                            connection,
                            from: self.board.anchor_position(first)?,
                            to: self.board.anchor_position(anchor)?,
                        });
                    }
                    ConnectOutcome::Rejected(reason) => {
                        commands.push(RenderCommand::ShowTransientError {
                            message: reason.to_string(),
                            duration_ms: ERROR_FLASH_MS,
                        });
                    }
                }

                Ok(commands)
            }
        }
    }

    /// Full board state for the snapshot API and the replay report.
    pub fn snapshot(&self) -> Result<BoardSnapshot, EditorError> {
        let mut nodes = Vec::with_capacity(self.board.len());
        for node in self.board.iter() {
            let anchors = AnchorSide::ALL
                .iter()
                .map(|&side| AnchorSnapshot {
                    side,
                    position: node.anchor_point(side),
                })
                .collect();
            nodes.push(NodeSnapshot {
                id: node.id,
                label: node.label.clone(),
                position: node.position,
                anchors,
            });
        }

        let mut connections = Vec::with_capacity(self.graph.connection_count());
        for connection in self.graph.connections() {
            connections.push(ConnectionSnapshot {
                id: connection.id,
                from: connection.from,
                to: connection.to,
                from_point: self.board.anchor_position(connection.from)?,
                to_point: self.board.anchor_position(connection.to)?,
            });
        }

        Ok(BoardSnapshot {
            session: self.id,
            created_at: self.created_at,
            nodes,
            connections,
        })
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub session: Uuid,
    pub created_at: DateTime<Utc>,
    pub nodes: Vec<NodeSnapshot>,
    pub connections: Vec<ConnectionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub label: String,
    pub position: Point,
    pub anchors: Vec<AnchorSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorSnapshot {
    pub side: AnchorSide,
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSnapshot {
    pub id: ConnectionId,
    pub from: AnchorId,
    pub to: AnchorId,
    pub from_point: Point,
    pub to_point: Point,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_pair() -> (EditorSession, NodeId, NodeId) {
        let mut session = EditorSession::new();
        let a = session.drop_node("A", Point { x: 0.0, y: 0.0 });
        let b = session.drop_node("B", Point { x: 300.0, y: 0.0 });
        (session, a, b)
    }

    #[test]
    fn drop_emits_render_node() {
        let mut session = EditorSession::new();
        let commands = session
            .handle_event(InputEvent::NodeDropped {
                label: "Firewall".to_string(),
                position: Point { x: 40.0, y: 60.0 },
            })
            .unwrap();
        assert_eq!(
            commands,
            vec![RenderCommand::RenderNode {
                node: NodeId(1),
                position: Point { x: 40.0, y: 60.0 },
                label: "Firewall".to_string(),
            }]
        );
        assert!(session.board().contains(NodeId(1)));
    }

    #[test]
    fn first_click_arms_and_highlights() {
        let (mut session, a, _) = session_with_pair();
        let anchor = AnchorId::new(a, AnchorSide::Right);
        let commands = session.click_anchor(anchor).unwrap();
        assert_eq!(
            commands,
            vec![RenderCommand::HighlightAnchor { anchor, on: true }]
        );
        assert_eq!(session.selection(), Selection::Armed(anchor));
    }

    #[test]
    fn second_click_connects_and_clears() {
        let (mut session, a, b) = session_with_pair();
        let first = AnchorId::new(a, AnchorSide::Right);
        let second = AnchorId::new(b, AnchorSide::Left);
        session.click_anchor(first).unwrap();
        let commands = session.click_anchor(second).unwrap();

        assert_eq!(session.selection(), Selection::Idle);
        assert_eq!(
            commands[0],
            RenderCommand::HighlightAnchor {
                anchor: first,
                on: false
            }
        );
        let RenderCommand::RenderLine { from, to, .. } = commands[1] else {
            panic!("expected a RenderLine, got {:?}", commands[1]);
        };
        assert_eq!(from, session.board().anchor_position(first).unwrap());
        assert_eq!(to, session.board().anchor_position(second).unwrap());
    }

    #[test]
    fn rejection_flashes_and_still_clears_selection() {
        let (mut session, a, _) = session_with_pair();
        session.click_anchor(AnchorId::new(a, AnchorSide::Top)).unwrap();
        let commands = session
            .click_anchor(AnchorId::new(a, AnchorSide::Bottom))
            .unwrap();

        assert_eq!(session.selection(), Selection::Idle);
        assert_eq!(
            commands[1],
            RenderCommand::ShowTransientError {
                message: RejectReason::SelfLoop.to_string(),
                duration_ms: ERROR_FLASH_MS,
            }
        );
        assert_eq!(session.graph().connection_count(), 0);
    }

    #[test]
    fn cycle_rejection_reports_the_loop_message() {
        let mut session = EditorSession::new();
        let a = session.drop_node("A", Point { x: 0.0, y: 0.0 });
        let b = session.drop_node("B", Point { x: 200.0, y: 0.0 });
        let c = session.drop_node("C", Point { x: 400.0, y: 0.0 });

        for (from, to) in [(a, b), (b, c)] {
            session.click_anchor(AnchorId::new(from, AnchorSide::Right)).unwrap();
            session.click_anchor(AnchorId::new(to, AnchorSide::Left)).unwrap();
        }

        session.click_anchor(AnchorId::new(c, AnchorSide::Right)).unwrap();
        let commands = session.click_anchor(AnchorId::new(a, AnchorSide::Left)).unwrap();
        assert_eq!(
            commands[1],
            RenderCommand::ShowTransientError {
                message: RejectReason::CycleDetected.to_string(),
                duration_ms: ERROR_FLASH_MS,
            }
        );
        assert_eq!(session.graph().connection_count(), 2);
    }

    #[test]
    fn stale_anchor_click_leaves_selection_untouched() {
        let (mut session, a, _) = session_with_pair();
        let armed = AnchorId::new(a, AnchorSide::Right);
        session.click_anchor(armed).unwrap();

        let stale = AnchorId::new(NodeId(99), AnchorSide::Left);
        let err = session.click_anchor(stale).unwrap_err();
        assert_eq!(err, EditorError::UnknownAnchor(stale));
        assert_eq!(session.selection(), Selection::Armed(armed));
    }

    #[test]
    fn drag_updates_incident_lines_only() {
        let mut session = EditorSession::new();
        let a = session.drop_node("A", Point { x: 0.0, y: 0.0 });
        let b = session.drop_node("B", Point { x: 300.0, y: 0.0 });
        session.drop_node("C", Point { x: 600.0, y: 0.0 });

        session.click_anchor(AnchorId::new(a, AnchorSide::Right)).unwrap();
        session.click_anchor(AnchorId::new(b, AnchorSide::Left)).unwrap();

        let commands = session
            .drag_node(a, Point { x: 50.0, y: 50.0 })
            .unwrap();
        assert_eq!(commands.len(), 1);
        let RenderCommand::UpdateLine { from, .. } = commands[0] else {
            panic!("expected an UpdateLine, got {:?}", commands[0]);
        };
        assert_eq!(
            from,
            Point {
                x: 50.0 + NODE_WIDTH,
                y: 50.0 + NODE_HEIGHT / 2.0
            }
        );

        // Dragging does not disturb an armed selection.
        let armed = AnchorId::new(b, AnchorSide::Top);
        session.click_anchor(armed).unwrap();
        session.drag_node(a, Point { x: 60.0, y: 60.0 }).unwrap();
        assert_eq!(session.selection(), Selection::Armed(armed));
    }

    #[test]
    fn snapshot_reflects_board_and_graph() {
        let (mut session, a, b) = session_with_pair();
        session.click_anchor(AnchorId::new(a, AnchorSide::Right)).unwrap();
        session.click_anchor(AnchorId::new(b, AnchorSide::Left)).unwrap();

        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.session, session.id);
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.nodes[0].anchors.len(), 4);
        assert_eq!(snapshot.connections.len(), 1);
        assert_eq!(
            snapshot.connections[0].from_point,
            session
                .board()
                .anchor_position(AnchorId::new(a, AnchorSide::Right))
                .unwrap()
        );
    }

    #[test]
    fn events_round_trip_through_json() {
        let event = InputEvent::AnchorClicked {
            node: NodeId(2),
            side: AnchorSide::Left,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"anchorClicked","node":2,"side":"left"}"#);
        let back: InputEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);

        let command = RenderCommand::ShowTransientError {
            message: "nope".to_string(),
            duration_ms: ERROR_FLASH_MS,
        };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(
            json,
            r#"{"type":"showTransientError","message":"nope","durationMs":2000}"#
        );
    }
}
