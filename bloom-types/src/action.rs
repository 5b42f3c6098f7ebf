use crate::state::music::{MusicalKey, PitchRange};
use crate::{NodeId, TreeId};
use crate::state::sequence::{
    AccumulatorConfig, ArpConfig, MutationConfig, PlaybackDirection,
};

/// Whether a continuous control is mid-drag or being released.
///
/// Dragging values only reach playback as cheap parameter pushes; the
/// structural commit happens once on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    Dragging,
    Commit,
}

/// Real-time parameter pushed to a node without recompiling its sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeParam {
    /// Consumed by the playback driver
    GlobalProbability(f32),
    /// Consumed by the playback driver
    MutationAmount(f32),
    /// Forwarded to the synthesis engine
    Volume(f32),
    /// Forwarded to the synthesis engine
    Pan(f32),
    /// Opaque per-engine parameter, forwarded to the synthesis engine
    Engine { index: u16, value: f32 },
}

impl NodeParam {
    /// Parameters the sequencer itself interprets (the rest go to the engine).
    pub fn is_sequencer_param(&self) -> bool {
        matches!(self, NodeParam::GlobalProbability(_) | NodeParam::MutationAmount(_))
    }
}

/// Edit operations on one node's sequence, as issued by the bloom panel.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceAction {
    ToggleStep { step: usize, pitch: u8 },
    SetNoteVelocity { step: usize, pitch: u8, velocity: f32 },
    SetNoteProbability { step: usize, pitch: u8, probability: f32 },
    SetNoteRatchet { step: usize, pitch: u8, count: u8 },
    SetNoteDuration { step: usize, pitch: u8, duration: f64 },
    SetLength(f64),
    SetGlobalProbability { value: f32, phase: EditPhase },
    SetDirection(Option<PlaybackDirection>),
    /// `None` range means the configured default
    ApplyEuclidean { pulses: u32, rotation: u32, pitch_range: Option<PitchRange> },
    ClearEuclidean,
    /// `None` density or range means the configured default
    RandomFill { density: Option<f32>, pitch_range: Option<PitchRange> },
    SetMutation(Option<MutationConfig>),
    SetMutationAmount { value: f32, phase: EditPhase },
    FreezeMutation,
    ResetMutation,
    SetAccumulator(Option<AccumulatorConfig>),
    SetArp(Option<ArpConfig>),
    Clear,
    Play,
    Stop,
    Param(NodeParam),
}

/// Edits to the project structure and its scale hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectAction {
    AddNode,
    RemoveNode(NodeId),
    SetGlobalKey(MusicalKey),
    /// `None` clears the override
    SetNodeScale { node: NodeId, scale: Option<MusicalKey> },
    AddTree { scale: Option<MusicalKey>, members: Vec<NodeId> },
    SetTreeScale { tree: TreeId, scale: Option<MusicalKey> },
}

/// How an edit must reach the playback context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditKind {
    /// Nothing changed
    None,
    /// Push a parameter; the event structure is unchanged
    Param(NodeParam),
    /// Recompile and hand off a new snapshot
    Structural,
}

/// Top-level action routed by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Sequence { node: NodeId, action: SequenceAction },
    Project(ProjectAction),
    None,
}

/// What a dispatched action did to the playback side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchResult {
    /// Snapshot versions published, per node
    pub committed: Vec<(NodeId, u64)>,
    /// Parameters pushed without a recompile
    pub pushed: Vec<(NodeId, NodeParam)>,
    pub added_node: Option<NodeId>,
    pub added_tree: Option<TreeId>,
    /// The action named a node or tree that does not exist
    pub not_found: bool,
}

impl DispatchResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_not_found() -> Self {
        Self { not_found: true, ..Self::default() }
    }

    pub fn push_commit(&mut self, node: NodeId, version: u64) {
        self.committed.push((node, version));
    }
}
