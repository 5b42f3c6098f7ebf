//! # bloom-types
//!
//! Shared type definitions for the Bloom sequencer core.
//! This crate holds the authored document model (note sequences, keys, projects),
//! the pure reducers that edit it, and the fill algorithms. Nothing here touches
//! the playback context.

pub mod action;
pub mod dispatch;
pub mod fill;
pub mod reduce;
pub mod state;

pub use action::*;
pub use dispatch::Dispatcher;
pub use state::*;

/// Unique identifier for a node on the canvas.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a tree (a connected group of nodes sharing a scale).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct TreeId(u32);

impl TreeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TreeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
