pub mod board;
pub mod controller;
pub mod cycle;
pub mod graph;
#[cfg(feature = "server")]
pub mod serve;
pub mod sync;

pub use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use board::{Board, Node};
pub use controller::{
    AnchorSnapshot, BoardSnapshot, ConnectionSnapshot, ERROR_FLASH_MS, EditorSession, InputEvent,
    NodeSnapshot, RenderCommand, Selection,
};
pub use cycle::would_create_cycle;
pub use graph::{ConnectOutcome, Connection, ConnectionGraph, RejectReason};
pub use sync::{LineUpdate, refresh_lines};

/// Fixed bounding box for every block on the canvas. Anchor geometry and
/// the renderer both derive from these, so they live at the crate root.
pub const NODE_WIDTH: f32 = 140.0;
pub const NODE_HEIGHT: f32 = 60.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Monotonically allocated block identifier. Ids start at 1 and are never
/// reused within a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the four fixed connection points on a block's outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorSide {
    Top,
    Right,
    Bottom,
    Left,
}

impl AnchorSide {
    pub const ALL: [AnchorSide; 4] = [
        AnchorSide::Top,
        AnchorSide::Right,
        AnchorSide::Bottom,
        AnchorSide::Left,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnchorSide::Top => "top",
            AnchorSide::Right => "right",
            AnchorSide::Bottom => "bottom",
            AnchorSide::Left => "left",
        }
    }
}

impl fmt::Display for AnchorSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An anchor belongs to exactly one node for that node's lifetime; the pair
/// is the anchor's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorId {
    pub node: NodeId,
    pub side: AnchorSide,
}

impl AnchorId {
    pub fn new(node: NodeId, side: AnchorSide) -> Self {
        Self { node, side }
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.side)
    }
}

/// Caller faults: a stale or fabricated id reached the core. These fail the
/// operation outright, unlike [`RejectReason`] outcomes which are ordinary
/// results of a connect gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("unknown node id {0}")]
    UnknownNode(NodeId),
    #[error("unknown anchor {0}")]
    UnknownAnchor(AnchorId),
}
