//! Playback-context entry point.
//!
//! The host owns one `NodeDriver` per registered node. The embedding audio
//! callback calls `render` once per block; the host drains pending commands,
//! follows the transport, and lets every driver emit the span since the
//! previous block.

use std::collections::HashMap;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use bloom_types::NodeId;

use crate::commands::PlaybackCmd;
use crate::engine::{SynthEngine, Transport};
use crate::handoff::{retire, Retired};
use crate::sequencer_tick::{NodeDriver, PlayState};

/// Forward jumps longer than this are treated as a relocation, not catch-up.
const MAX_CATCH_UP_BEATS: f64 = 4.0;
const MAX_COMMANDS_PER_RENDER: usize = 256;
/// Node slots reserved up front so registering nodes does not grow the map.
const NODE_CAPACITY: usize = 64;

/// Edit-side ends of the host's channels.
pub struct HostLink {
    pub cmd_tx: Sender<PlaybackCmd>,
    pub garbage_rx: Receiver<Retired>,
    /// Handed to each `NodeDriver` built on the edit side
    pub garbage_tx: Sender<Retired>,
}

pub struct SequencerHost {
    cmd_rx: Receiver<PlaybackCmd>,
    garbage_tx: Sender<Retired>,
    drivers: HashMap<NodeId, Box<NodeDriver>>,
    last_beat: Option<f64>,
    transport_playing: bool,
}

impl SequencerHost {
    /// Build a host and the link the edit side talks to it through.
    /// `garbage_capacity` bounds retired snapshots awaiting collection.
    pub fn new(garbage_capacity: usize) -> (Self, HostLink) {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (garbage_tx, garbage_rx) = crossbeam_channel::bounded(garbage_capacity.max(1));
        let host = Self {
            cmd_rx,
            garbage_tx: garbage_tx.clone(),
            drivers: HashMap::with_capacity(NODE_CAPACITY),
            last_beat: None,
            transport_playing: false,
        };
        (host, HostLink { cmd_tx, garbage_rx, garbage_tx })
    }

    pub fn node_count(&self) -> usize {
        self.drivers.len()
    }

    pub fn driver(&self, node: NodeId) -> Option<&NodeDriver> {
        self.drivers.get(&node).map(Box::as_ref)
    }

    /// Process one block ending at the transport's current beat.
    pub fn render(&mut self, transport: &dyn Transport, engine: &mut dyn SynthEngine) {
        let beat = transport.current_beat();
        let playing = transport.is_playing();
        let from = self.follow_transport(beat, playing, engine);
        self.drain_commands(from, engine);
        if playing {
            for driver in self.drivers.values_mut() {
                driver.process(from, beat, engine);
            }
        }
        self.last_beat = Some(beat);
    }

    /// Handle transport start/stop and jumps. Returns where this block's span begins.
    fn follow_transport(&mut self, beat: f64, playing: bool, engine: &mut dyn SynthEngine) -> f64 {
        match (self.transport_playing, playing) {
            (false, false) => beat,
            (true, false) => {
                self.transport_playing = false;
                for driver in self.drivers.values_mut() {
                    driver.stop(beat, engine);
                }
                log::debug!(target: "audio::host", "transport stopped at beat {:.3}", beat);
                beat
            }
            (false, true) => {
                self.transport_playing = true;
                for driver in self.drivers.values_mut().filter(|d| d.is_armed()) {
                    driver.start(beat);
                }
                log::debug!(target: "audio::host", "transport started at beat {:.3}", beat);
                beat
            }
            (true, true) => match self.last_beat {
                Some(last) if beat >= last && beat - last <= MAX_CATCH_UP_BEATS => last,
                _ => {
                    log::debug!(target: "audio::host", "transport relocated to beat {:.3}", beat);
                    for driver in self.drivers.values_mut() {
                        if driver.state() == PlayState::Playing {
                            driver.stop(beat, engine);
                            driver.start(beat);
                        }
                    }
                    beat
                }
            },
        }
    }

    fn drain_commands(&mut self, at: f64, engine: &mut dyn SynthEngine) {
        for _ in 0..MAX_COMMANDS_PER_RENDER {
            match self.cmd_rx.try_recv() {
                Ok(cmd) => self.handle_cmd(cmd, at, engine),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return,
            }
        }
    }

    fn handle_cmd(&mut self, cmd: PlaybackCmd, at: f64, engine: &mut dyn SynthEngine) {
        match cmd {
            PlaybackCmd::AddNode(driver) => {
                let node = driver.node();
                if let Some(old) = self.drivers.insert(node, driver) {
                    log::warn!(target: "audio::host", "node {} registered twice; replacing", node);
                    self.release(old, at, engine);
                }
            }
            PlaybackCmd::RemoveNode(node) => match self.drivers.remove(&node) {
                Some(driver) => self.release(driver, at, engine),
                None => log::warn!(target: "audio::host", "remove for unknown node {}", node),
            },
            PlaybackCmd::Start(node) => {
                let playing = self.transport_playing;
                if let Some(driver) = self.driver_mut(node) {
                    driver.set_armed(true);
                    if playing && driver.state() == PlayState::Stopped {
                        driver.start(at);
                    }
                }
            }
            PlaybackCmd::Stop(node) => {
                if let Some(driver) = self.driver_mut(node) {
                    driver.set_armed(false);
                    driver.stop(at, engine);
                }
            }
            PlaybackCmd::StopAll => {
                for driver in self.drivers.values_mut() {
                    driver.set_armed(false);
                    driver.stop(at, engine);
                }
            }
            PlaybackCmd::Param { node, param } => {
                if param.is_sequencer_param() {
                    if let Some(driver) = self.driver_mut(node) {
                        driver.apply_param(param);
                    }
                } else {
                    engine.set_param(node, param);
                }
            }
        }
    }

    fn driver_mut(&mut self, node: NodeId) -> Option<&mut NodeDriver> {
        let driver = self.drivers.get_mut(&node).map(Box::as_mut);
        if driver.is_none() {
            log::warn!(target: "audio::host", "command for unknown node {}", node);
        }
        driver
    }

    /// Stop a driver and send it back to the edit side to be freed.
    fn release(&mut self, mut driver: Box<NodeDriver>, at: f64, engine: &mut dyn SynthEngine) {
        driver.stop(at, engine);
        let node = driver.node();
        if retire(&self.garbage_tx, Retired::Driver(driver)).is_err() {
            log::warn!(target: "audio::host", "garbage channel full; freeing node {} in playback", node);
        }
    }
}
