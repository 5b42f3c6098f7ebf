#![allow(dead_code)]
//! Test harness: an edit side and a playback host wired together, driven by a
//! hand-cranked transport.

use rand::rngs::StdRng;
use rand::SeedableRng;

use bloom_audio::testing::{ManualTransport, RecordingEngine};
use bloom_core::config::Config;
use bloom_core::dispatch::dispatch_action;
use bloom_core::{SequencerHandle, SequencerHost};
use bloom_types::{Action, DispatchResult, NodeId, NoteSequence, ProjectAction, ProjectState, SequenceAction};

/// Render block size in beats.
pub const BLOCK: f64 = 0.05;

pub struct Studio {
    pub project: ProjectState,
    pub handle: SequencerHandle,
    pub host: SequencerHost,
    pub config: Config,
    pub rng: StdRng,
    pub transport: ManualTransport,
    pub engine: RecordingEngine,
}

impl Studio {
    pub fn new() -> Self {
        let config = Config::default();
        let (handle, host) = SequencerHandle::with_host(&config);
        Self {
            project: ProjectState::new(config.default_key()),
            handle,
            host,
            config,
            rng: StdRng::seed_from_u64(7),
            transport: ManualTransport::default(),
            engine: RecordingEngine::default(),
        }
    }

    pub fn dispatch(&mut self, action: Action) -> DispatchResult {
        dispatch_action(
            &action,
            &mut self.project,
            &mut self.handle,
            &self.config,
            &mut self.rng,
        )
    }

    pub fn project(&mut self, action: ProjectAction) -> DispatchResult {
        self.dispatch(Action::Project(action))
    }

    pub fn edit(&mut self, node: NodeId, action: SequenceAction) -> DispatchResult {
        self.dispatch(Action::Sequence { node, action })
    }

    pub fn add_node(&mut self) -> NodeId {
        self.project(ProjectAction::AddNode)
            .added_node
            .expect("AddNode reports the new id")
    }

    pub fn sequence(&self, node: NodeId) -> &NoteSequence {
        &self.project.node(node).expect("node exists").sequence
    }

    /// Start the transport and render the first (empty) block.
    pub fn play(&mut self) {
        self.transport.play();
        self.host.render(&self.transport, &mut self.engine);
    }

    pub fn stop(&mut self) {
        self.transport.stop();
        self.host.render(&self.transport, &mut self.engine);
    }

    /// Advance the transport by roughly `beats`, one block at a time.
    pub fn run(&mut self, beats: f64) {
        let blocks = (beats / BLOCK).round() as usize;
        for _ in 0..blocks {
            self.transport.advance(BLOCK);
            self.host.render(&self.transport, &mut self.engine);
        }
    }

    /// Note-on pitches with `from <= beat < to`.
    pub fn pitches_between(&self, from: f64, to: f64) -> Vec<u8> {
        self.engine
            .note_ons()
            .into_iter()
            .filter(|&(_, beat)| beat >= from - 1e-9 && beat < to - 1e-9)
            .map(|(pitch, _)| pitch)
            .collect()
    }
}
