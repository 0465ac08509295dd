use std::collections::HashMap;

use crate::*;

/// A placed block: a draggable, labeled box on the canvas. `position` is
/// the top-left corner of its fixed 140x60 bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub position: Point,
}

impl Node {
    /// Midpoint of the box edge the given side names. Always derived from
    /// the current position so endpoints cannot drift from the node.
    pub fn anchor_point(&self, side: AnchorSide) -> Point {
        let Point { x, y } = self.position;
        match side {
            AnchorSide::Top => Point {
                x: x + NODE_WIDTH / 2.0,
                y,
            },
            AnchorSide::Right => Point {
                x: x + NODE_WIDTH,
                y: y + NODE_HEIGHT / 2.0,
            },
            AnchorSide::Bottom => Point {
                x: x + NODE_WIDTH / 2.0,
                y: y + NODE_HEIGHT,
            },
            AnchorSide::Left => Point {
                x,
                y: y + NODE_HEIGHT / 2.0,
            },
        }
    }
}

/// Registry of every block dropped onto the canvas during a session.
/// Nodes accumulate for the life of the session; there is no removal.
#[derive(Debug, Default)]
pub struct Board {
    nodes: HashMap<NodeId, Node>,
    order: Vec<NodeId>,
    next_id: u64,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next id and stores the block. Never fails.
    pub fn create_node(&mut self, label: &str, position: Point) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(
            id,
            Node {
                id,
                label: label.to_string(),
                position,
            },
        );
        self.order.push(id);
        id
    }

    /// Updates the block's position only. Line geometry is the
    /// synchronizer's job; callers follow up with [`refresh_lines`].
    pub fn move_node(&mut self, id: NodeId, position: Point) -> Result<(), EditorError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(EditorError::UnknownNode(id))?;
        node.position = position;
        Ok(())
    }

    pub fn anchor_position(&self, anchor: AnchorId) -> Result<Point, EditorError> {
        let node = self
            .nodes
            .get(&anchor.node)
            .ok_or(EditorError::UnknownAnchor(anchor))?;
        Ok(node.anchor_point(anchor.side))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Blocks in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_from_one() {
        let mut board = Board::new();
        let a = board.create_node("Server", Point { x: 0.0, y: 0.0 });
        let b = board.create_node("Router", Point { x: 10.0, y: 20.0 });
        assert_eq!(a, NodeId(1));
        assert_eq!(b, NodeId(2));
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn move_updates_position_only() {
        let mut board = Board::new();
        let id = board.create_node("Switch", Point { x: 5.0, y: 5.0 });
        board
            .move_node(id, Point { x: 80.0, y: 40.0 })
            .expect("node exists");
        let node = board.node(id).expect("node exists");
        assert_eq!(node.position, Point { x: 80.0, y: 40.0 });
        assert_eq!(node.label, "Switch");
    }

    #[test]
    fn move_unknown_node_fails_fast() {
        let mut board = Board::new();
        let err = board
            .move_node(NodeId(7), Point { x: 0.0, y: 0.0 })
            .unwrap_err();
        assert_eq!(err, EditorError::UnknownNode(NodeId(7)));
    }

    #[test]
    fn anchors_sit_on_edge_midpoints() {
        let mut board = Board::new();
        let id = board.create_node("Host", Point { x: 10.0, y: 20.0 });

        let anchor = |side| board.anchor_position(AnchorId::new(id, side)).unwrap();
        assert_eq!(
            anchor(AnchorSide::Top),
            Point {
                x: 10.0 + NODE_WIDTH / 2.0,
                y: 20.0
            }
        );
        assert_eq!(
            anchor(AnchorSide::Right),
            Point {
                x: 10.0 + NODE_WIDTH,
                y: 20.0 + NODE_HEIGHT / 2.0
            }
        );
        assert_eq!(
            anchor(AnchorSide::Bottom),
            Point {
                x: 10.0 + NODE_WIDTH / 2.0,
                y: 20.0 + NODE_HEIGHT
            }
        );
        assert_eq!(
            anchor(AnchorSide::Left),
            Point {
                x: 10.0,
                y: 20.0 + NODE_HEIGHT / 2.0
            }
        );
    }

    #[test]
    fn anchor_on_unknown_node_reports_the_anchor() {
        let board = Board::new();
        let anchor = AnchorId::new(NodeId(3), AnchorSide::Left);
        assert_eq!(
            board.anchor_position(anchor).unwrap_err(),
            EditorError::UnknownAnchor(anchor)
        );
    }
}
