use bloom_types::{NodeId, NodeParam};

use crate::sequencer_tick::NodeDriver;

/// Commands sent from the edit side to the playback context.
#[derive(Debug)]
pub enum PlaybackCmd {
    /// Register a node. The driver is built on the edit side so the playback
    /// side only moves it into place.
    AddNode(Box<NodeDriver>),
    RemoveNode(NodeId),
    /// Arm the node; it plays whenever the transport runs
    Start(NodeId),
    Stop(NodeId),
    StopAll,
    Param { node: NodeId, param: NodeParam },
}
