//! Edit-side handle to the playback context.
//!
//! Owns the sending ends of the host's channels and one snapshot slot per node.
//! Structural changes go through `commit` (recompile + atomic swap); real-time
//! tweaks go through `push_param`. Neither ever blocks.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use bloom_audio::roll::mix;
use bloom_audio::{
    CompiledSequence, HostLink, NodeDriver, NodeMonitor, PlaybackCmd, Retired, SequencerHost,
    SnapshotSlot,
};
use bloom_types::{MusicalKey, NodeId, NodeParam, NoteSequence};

use crate::config::Config;

struct NodeLink {
    slot: Arc<SnapshotSlot>,
    monitor: Arc<NodeMonitor>,
    version: u64,
}

pub struct SequencerHandle {
    cmd_tx: Sender<PlaybackCmd>,
    garbage_rx: Receiver<Retired>,
    /// Cloned into every driver built here
    garbage_tx: Sender<Retired>,
    nodes: HashMap<NodeId, NodeLink>,
    base_seed: u64,
}

impl SequencerHandle {
    pub fn new(link: HostLink, base_seed: u64) -> Self {
        Self {
            cmd_tx: link.cmd_tx,
            garbage_rx: link.garbage_rx,
            garbage_tx: link.garbage_tx,
            nodes: HashMap::new(),
            base_seed,
        }
    }

    /// A connected handle/host pair. The host goes to the audio callback.
    pub fn with_host(config: &Config) -> (Self, SequencerHost) {
        let (host, link) = SequencerHost::new(config.garbage_capacity());
        (Self::new(link, config.playback_seed()), host)
    }

    /// Send a command to the playback context.
    pub fn send_cmd(&self, cmd: PlaybackCmd) -> Result<(), String> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| "Playback context disconnected".to_string())
    }

    /// Fire-and-forget: send a command and log if the playback side is gone.
    fn send(&self, cmd: PlaybackCmd) {
        if let Err(e) = self.send_cmd(cmd) {
            log::warn!(target: "audio", "command dropped: {}", e);
        }
    }

    pub fn has_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Register a node with its initial sequence. Registering twice commits instead.
    /// The node's driver is built here and moved to the playback side whole.
    pub fn add_node(&mut self, node: NodeId, seq: &NoteSequence, key: MusicalKey) {
        if self.has_node(node) {
            self.commit(node, seq, key);
            return;
        }
        let slot = Arc::new(SnapshotSlot::new(CompiledSequence::compile(node, seq, key, 1)));
        let monitor = Arc::new(NodeMonitor::new());
        let driver = NodeDriver::new(
            node,
            Arc::clone(&slot),
            Arc::clone(&monitor),
            self.garbage_tx.clone(),
            mix(self.base_seed, node.get() as u64),
        );
        self.send(PlaybackCmd::AddNode(Box::new(driver)));
        self.nodes.insert(node, NodeLink { slot, monitor, version: 1 });
    }

    /// Unregister a node; the playback side stops it first.
    pub fn remove_node(&mut self, node: NodeId) {
        if self.nodes.remove(&node).is_some() {
            self.send(PlaybackCmd::RemoveNode(node));
        }
    }

    /// Compile `seq` and publish it as the node's next snapshot.
    /// Returns the published version, or `None` for an unknown node.
    pub fn commit(&mut self, node: NodeId, seq: &NoteSequence, key: MusicalKey) -> Option<u64> {
        let Some(link) = self.nodes.get_mut(&node) else {
            log::warn!(target: "audio", "commit for unknown node {}", node);
            return None;
        };
        link.version += 1;
        let compiled = CompiledSequence::compile(node, seq, key, link.version);
        // the displaced snapshot is freed here, on the edit side
        drop(link.slot.publish(compiled));
        Some(link.version)
    }

    /// Push a real-time parameter without recompiling.
    pub fn push_param(&self, node: NodeId, param: NodeParam) {
        self.send(PlaybackCmd::Param { node, param });
    }

    pub fn start(&self, node: NodeId) {
        self.send(PlaybackCmd::Start(node));
    }

    pub fn stop(&self, node: NodeId) {
        self.send(PlaybackCmd::Stop(node));
    }

    pub fn stop_all(&self) {
        self.send(PlaybackCmd::StopAll);
    }

    /// Free snapshots and drivers the playback side has retired.
    pub fn collect_garbage(&mut self) -> usize {
        self.garbage_rx.try_iter().count()
    }

    pub fn published_version(&self, node: NodeId) -> Option<u64> {
        self.nodes.get(&node).map(|l| l.slot.version())
    }

    /// Loop-relative playback position (lock-free atomic read)
    pub fn current_beat(&self, node: NodeId) -> Option<f64> {
        self.nodes.get(&node).map(|l| l.monitor.current_beat())
    }

    pub fn is_playing(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|l| l.monitor.is_playing())
    }

    /// Grid column under the playhead; arp nodes report the column too.
    pub fn current_step(&self, node: NodeId) -> Option<usize> {
        self.nodes.get(&node).and_then(|l| l.monitor.current_step())
    }

    /// Mutation seed of the cycle currently audible on `node`.
    pub fn audible_mutation_seed(&self, node: NodeId) -> Option<u64> {
        self.nodes.get(&node).and_then(|l| l.monitor.mutation_seed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloom_audio::testing::{ManualTransport, RecordingEngine};

    fn pair() -> (SequencerHandle, SequencerHost) {
        SequencerHandle::with_host(&Config::default())
    }

    #[test]
    fn commit_bumps_version() {
        let (mut handle, _host) = pair();
        let node = NodeId::new(1);
        let seq = NoteSequence::default();
        handle.add_node(node, &seq, MusicalKey::default());
        assert_eq!(handle.published_version(node), Some(1));
        assert_eq!(handle.commit(node, &seq, MusicalKey::default()), Some(2));
        assert_eq!(handle.published_version(node), Some(2));
    }

    #[test]
    fn commit_to_unknown_node_is_none() {
        let (mut handle, _host) = pair();
        assert_eq!(handle.commit(NodeId::new(9), &NoteSequence::default(), MusicalKey::default()), None);
        assert!(!handle.is_playing(NodeId::new(9)));
        assert_eq!(handle.current_step(NodeId::new(9)), None);
    }

    #[test]
    fn disconnected_host_reports_error() {
        let (handle, host) = pair();
        drop(host);
        assert!(handle.send_cmd(PlaybackCmd::StopAll).is_err());
        // fire-and-forget variants only log
        handle.stop_all();
    }

    #[test]
    fn retired_snapshots_are_collected() {
        let (mut handle, mut host) = pair();
        let node = NodeId::new(1);
        let mut seq = NoteSequence::default();
        seq.toggle_step(0, 60, 0.8);
        handle.add_node(node, &seq, MusicalKey::default());
        handle.start(node);

        let mut transport = ManualTransport::default();
        let mut engine = RecordingEngine::default();
        transport.play();
        host.render(&transport, &mut engine);
        assert!(handle.is_playing(node));

        handle.commit(node, &seq, MusicalKey::default());
        for _ in 0..10 {
            transport.advance(0.05);
            host.render(&transport, &mut engine);
        }
        assert_eq!(handle.collect_garbage(), 1);
        assert_eq!(handle.collect_garbage(), 0);
    }

    #[test]
    fn added_driver_arrives_ready_to_play() {
        let (mut handle, mut host) = pair();
        let node = NodeId::new(4);
        let mut seq = NoteSequence::default();
        seq.toggle_step(0, 60, 0.8);
        handle.add_node(node, &seq, MusicalKey::default());

        let transport = ManualTransport::default();
        let mut engine = RecordingEngine::default();
        host.render(&transport, &mut engine);
        assert_eq!(host.node_count(), 1);
        assert_eq!(host.driver(node).map(|d| d.snapshot_version()), Some(1));

        handle.remove_node(node);
        host.render(&transport, &mut engine);
        assert_eq!(host.node_count(), 0);
        assert_eq!(handle.collect_garbage(), 1);
    }
}
