//! Per-node playback driver.
//!
//! The driver walks step (or arp slot) boundaries of the transport, adopts new
//! snapshots only at a boundary, resolves each event through mutation and the
//! accumulator, rolls the probability gate, and emits note-on/note-off pairs.
//! The pending queue is sized from each snapshot's bound when it is adopted,
//! so steady playback never allocates.

use std::sync::Arc;

use crossbeam_channel::Sender;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bloom_types::{MutationConfig, NodeId, NodeParam, STEP_DURATION};

use crate::accumulator::TriggerParams;
use crate::arp_state::ArpPlayState;
use crate::arpeggiator_tick::next_arp_index;
use crate::cursor::PlaybackCursor;
use crate::engine::SynthEngine;
use crate::handoff::{retire, Retired, SnapshotSlot};
use crate::monitor::NodeMonitor;
use crate::mutation::{cycle_seed, mutate_pitch};
use crate::roll::mix;
use crate::snapshot::{CompiledArp, CompiledSequence};

const EPSILON: f64 = 1e-9;
const MIN_PENDING_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

#[derive(Debug, Clone, Copy)]
enum PendingKind {
    On { velocity: f32, off_beat: f64 },
    Off,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    beat: f64,
    pitch: u8,
    kind: PendingKind,
}

impl Pending {
    fn is_off(&self) -> bool {
        matches!(self.kind, PendingKind::Off)
    }

    /// Time order; at equal beats offs go first so a retrigger is never cut.
    fn precedes(&self, other: &Pending) -> bool {
        if (self.beat - other.beat).abs() <= EPSILON {
            self.is_off() && !other.is_off()
        } else {
            self.beat < other.beat
        }
    }
}

#[derive(Debug)]
pub struct NodeDriver {
    node: NodeId,
    slot: Arc<SnapshotSlot>,
    snapshot: Arc<CompiledSequence>,
    monitor: Arc<NodeMonitor>,
    garbage_tx: Sender<Retired>,
    /// Retired snapshot waiting for room in the garbage channel
    parked: Option<Arc<CompiledSequence>>,
    state: PlayState,
    /// Play whenever the transport runs
    armed: bool,
    seed: u64,
    cursor: PlaybackCursor,
    arp: ArpPlayState,
    gate_rng: StdRng,
    global_probability: f32,
    mutation_amount: Option<f32>,
    pending: Vec<Pending>,
    last_boundary: Option<f64>,
}

impl NodeDriver {
    pub fn new(
        node: NodeId,
        slot: Arc<SnapshotSlot>,
        monitor: Arc<NodeMonitor>,
        garbage_tx: Sender<Retired>,
        seed: u64,
    ) -> Self {
        let snapshot = slot.load();
        let global_probability = snapshot.global_probability;
        let capacity = snapshot.pending_capacity().max(MIN_PENDING_CAPACITY);
        Self {
            node,
            slot,
            snapshot,
            monitor,
            garbage_tx,
            parked: None,
            state: PlayState::Stopped,
            armed: false,
            seed,
            cursor: PlaybackCursor::new(seed),
            arp: ArpPlayState::default(),
            gate_rng: StdRng::seed_from_u64(mix(seed, u64::MAX)),
            global_probability,
            mutation_amount: None,
            pending: Vec::with_capacity(capacity),
            last_boundary: None,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn set_armed(&mut self, armed: bool) {
        self.armed = armed;
    }

    pub fn snapshot_version(&self) -> u64 {
        self.snapshot.version
    }

    /// Begin playing from `beat`. The first boundary at or after it triggers.
    pub fn start(&mut self, beat: f64) {
        self.adopt_newer();
        self.state = PlayState::Playing;
        self.cursor.reset();
        self.arp.reset();
        self.gate_rng = StdRng::seed_from_u64(mix(self.seed, u64::MAX));
        self.pending.clear();
        self.last_boundary = None;
        self.monitor.set_playing(true);
        self.monitor.set_beat(self.loop_position(beat));
        log::debug!(target: "audio", "node {} playing from beat {:.3}", self.node, beat);
    }

    /// Stop at `beat`: every sounding note gets its off now, queued ons are dropped.
    pub fn stop(&mut self, beat: f64, engine: &mut dyn SynthEngine) {
        if self.state == PlayState::Stopped {
            return;
        }
        for p in self.pending.iter().filter(|p| p.is_off()) {
            engine.note_off(self.node, p.pitch, beat);
        }
        self.pending.clear();
        self.state = PlayState::Stopped;
        self.last_boundary = None;
        self.monitor.set_playing(false);
        log::debug!(target: "audio", "node {} stopped at beat {:.3}", self.node, beat);
    }

    /// Apply a real-time parameter. Returns false for parameters the sequencer
    /// does not interpret.
    pub fn apply_param(&mut self, param: NodeParam) -> bool {
        match param {
            NodeParam::GlobalProbability(value) => {
                self.global_probability = value.clamp(0.0, 1.0);
                true
            }
            NodeParam::MutationAmount(value) => {
                self.mutation_amount = Some(value.clamp(0.0, 1.0));
                true
            }
            _ => false,
        }
    }

    /// Emit everything that falls in `[from, to)`.
    pub fn process(&mut self, from: f64, to: f64, engine: &mut dyn SynthEngine) {
        if self.state != PlayState::Playing || to <= from {
            return;
        }
        loop {
            let grid = self.snapshot.grid_beats();
            let mut k = ((from / grid) - EPSILON).ceil().max(0.0) as u64;
            if let Some(last) = self.last_boundary {
                while k as f64 * grid <= last + EPSILON {
                    k += 1;
                }
            }
            let beat = k as f64 * grid;
            if beat >= to {
                break;
            }
            self.flush(beat, true, engine);
            self.last_boundary = Some(beat);
            self.boundary(k, beat);
            self.flush(beat, true, engine);
        }
        self.flush(to, false, engine);
        self.monitor.set_beat(self.loop_position(to));
    }

    fn loop_position(&self, beat: f64) -> f64 {
        let length = self.snapshot.length_in_beats;
        if length > 0.0 {
            beat.rem_euclid(length)
        } else {
            0.0
        }
    }

    fn boundary(&mut self, k: u64, beat: f64) {
        let grid = self.snapshot.grid_beats();
        let was_arp = self.snapshot.is_arp();
        if self.adopt_newer() {
            if self.snapshot.is_arp() != was_arp {
                self.arp.reset();
            }
            if (self.snapshot.grid_beats() - grid).abs() > EPSILON {
                // grid changed; the next boundary of the new grid triggers
                return;
            }
        }
        let snapshot = Arc::clone(&self.snapshot);
        match &snapshot.arp {
            Some(arp) => self.arp_boundary(&snapshot, arp, k, beat),
            None => self.step_boundary(&snapshot, k, beat),
        }
    }

    fn step_boundary(&mut self, snapshot: &CompiledSequence, k: u64, beat: f64) {
        let advance = self.cursor.advance(snapshot.direction, snapshot.columns, k);
        if advance.wrapped {
            if let Some(acc) = &snapshot.accumulator {
                self.cursor.accumulator.advance(acc);
            }
        }
        self.monitor.set_step(advance.step);
        let seed = self.publish_mutation_seed(snapshot);

        for ev in snapshot.events_at(advance.step) {
            let pitch = self.mutated(snapshot, ev.pitch, ev.index, seed);
            let params = self.accumulated(
                snapshot,
                TriggerParams {
                    pitch,
                    velocity: ev.velocity,
                    probability: ev.probability,
                    gate: ev.gate_beats(),
                },
            );
            if !self.roll_gate(params.probability) {
                continue;
            }
            let gate = params.gate.min(snapshot.length_in_beats - ev.begin_beat);
            self.schedule(beat, params.pitch, params.velocity, gate, ev.ratchet_count);
        }
    }

    fn arp_boundary(&mut self, snapshot: &CompiledSequence, arp: &CompiledArp, k: u64, beat: f64) {
        if arp.pool.is_empty() {
            return;
        }
        if self.arp.enter_pass(beat, snapshot.length_in_beats) {
            self.cursor.cycle += 1;
            if let Some(acc) = &snapshot.accumulator {
                self.cursor.accumulator.advance(acc);
            }
        }
        let index = next_arp_index(&mut self.arp, arp.config.mode, arp.pool.len(), self.seed, k);
        self.monitor.set_step(self.grid_step(snapshot, beat));
        let seed = self.publish_mutation_seed(snapshot);

        let note = arp.pool[index];
        let pitch = self.mutated(snapshot, note.pitch, index, seed);
        let params = self.accumulated(
            snapshot,
            TriggerParams {
                pitch,
                velocity: note.velocity,
                probability: 1.0,
                gate: arp.slot_beats() * arp.config.gate_length as f64,
            },
        );
        if !self.roll_gate(params.probability) || params.gate <= EPSILON {
            return;
        }
        let gate = params.gate.min(snapshot.length_in_beats);
        self.schedule(beat, params.pitch, params.velocity, gate, 1);
    }

    /// Grid column under `beat`.
    fn grid_step(&self, snapshot: &CompiledSequence, beat: f64) -> usize {
        let step = (self.loop_position(beat) / STEP_DURATION + EPSILON).floor() as usize;
        step.min(snapshot.columns.saturating_sub(1))
    }

    fn publish_mutation_seed(&self, snapshot: &CompiledSequence) -> u64 {
        let seed = cycle_seed(snapshot.mutation_seed, self.seed, self.cursor.cycle);
        self.monitor.set_mutation_seed(snapshot.mutation.map(|_| seed));
        seed
    }

    fn mutated(&self, snapshot: &CompiledSequence, pitch: u8, index: usize, seed: u64) -> u8 {
        match &snapshot.mutation {
            Some(config) => {
                let config = MutationConfig {
                    amount: self.mutation_amount.unwrap_or(config.amount),
                    ..*config
                };
                mutate_pitch(pitch, index, &snapshot.key, &config, seed)
            }
            None => pitch,
        }
    }

    fn accumulated(&self, snapshot: &CompiledSequence, params: TriggerParams) -> TriggerParams {
        match &snapshot.accumulator {
            Some(acc) => params.apply(acc.target, self.cursor.accumulator.offset),
            None => params,
        }
    }

    /// Probability gate: fires iff a uniform draw in [0, 1) is below the
    /// combined probability. A draw is consumed either way.
    fn roll_gate(&mut self, probability: f32) -> bool {
        let threshold = probability * self.global_probability;
        self.gate_rng.gen::<f32>() < threshold
    }

    fn schedule(&mut self, beat: f64, pitch: u8, velocity: f32, gate: f64, ratchets: u8) {
        if ratchets > 1 {
            let sub = STEP_DURATION / ratchets as f64;
            for i in 0..ratchets {
                let on = beat + i as f64 * sub;
                self.push(Pending {
                    beat: on,
                    pitch,
                    kind: PendingKind::On { velocity, off_beat: on + sub },
                });
            }
        } else {
            self.push(Pending {
                beat,
                pitch,
                kind: PendingKind::On { velocity, off_beat: beat + gate.max(EPSILON) },
            });
        }
    }

    fn push(&mut self, pending: Pending) {
        if self.pending.len() == self.pending.capacity() {
            log::warn!(target: "audio", "node {}: pending queue over its bound, growing", self.node);
        }
        self.pending.push(pending);
    }

    /// Emit queued events up to `limit` in time order.
    fn flush(&mut self, limit: f64, inclusive: bool, engine: &mut dyn SynthEngine) {
        loop {
            let mut next: Option<usize> = None;
            for (i, p) in self.pending.iter().enumerate() {
                let due = if inclusive {
                    p.beat <= limit + EPSILON
                } else {
                    p.beat < limit - EPSILON
                };
                if !due {
                    continue;
                }
                next = match next {
                    Some(j) if !p.precedes(&self.pending[j]) => Some(j),
                    _ => Some(i),
                };
            }
            let Some(i) = next else {
                break;
            };
            let p = self.pending.swap_remove(i);
            match p.kind {
                PendingKind::On { velocity, off_beat } => {
                    engine.note_on(self.node, p.pitch, velocity, p.beat);
                    self.pending.push(Pending { beat: off_beat, pitch: p.pitch, kind: PendingKind::Off });
                }
                PendingKind::Off => engine.note_off(self.node, p.pitch, p.beat),
            }
        }
    }

    /// Swap in a newer published snapshot, if any. Only called at boundaries.
    fn adopt_newer(&mut self) -> bool {
        let Some(fresh) = self.slot.load_if_newer(self.snapshot.version) else {
            return false;
        };
        let old = std::mem::replace(&mut self.snapshot, fresh);
        self.global_probability = self.snapshot.global_probability;
        self.mutation_amount = None;
        if old.accumulator != self.snapshot.accumulator {
            self.cursor.accumulator.reset();
        }
        // room for what is still queued plus everything the new snapshot can add
        let needed = self.snapshot.pending_capacity();
        if self.pending.capacity() - self.pending.len() < needed {
            log::debug!(target: "audio", "node {}: pending queue sized for {} more", self.node, needed);
            self.pending.reserve(needed);
        }
        self.retire_snapshot(old);
        true
    }

    fn retire_snapshot(&mut self, old: Arc<CompiledSequence>) {
        if let Some(parked) = self.parked.take() {
            if let Err(Retired::Snapshot(parked)) = retire(&self.garbage_tx, Retired::Snapshot(parked)) {
                self.parked = Some(parked);
            }
        }
        match retire(&self.garbage_tx, Retired::Snapshot(old)) {
            Ok(()) => {}
            Err(Retired::Snapshot(old)) if self.parked.is_none() => self.parked = Some(old),
            Err(_) => {
                log::warn!(target: "audio", "node {}: garbage channel full, freeing snapshot in playback", self.node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineEvent, RecordingEngine};
    use bloom_types::{
        AccumulatorConfig, AccumulatorMode, AccumulatorTarget, ArpConfig, ArpMode, ArpRate,
        MusicalKey, NoteEvent, NoteSequence, PlaybackDirection,
    };

    struct Rig {
        driver: NodeDriver,
        slot: Arc<SnapshotSlot>,
        monitor: Arc<NodeMonitor>,
        garbage: crossbeam_channel::Receiver<Retired>,
        engine: RecordingEngine,
        version: u64,
    }

    impl Rig {
        fn new(seq: &NoteSequence) -> Self {
            let node = NodeId::new(1);
            let slot = Arc::new(SnapshotSlot::new(CompiledSequence::compile(
                node,
                seq,
                MusicalKey::default(),
                1,
            )));
            let monitor = Arc::new(NodeMonitor::new());
            let (tx, rx) = crossbeam_channel::bounded(8);
            let driver = NodeDriver::new(node, Arc::clone(&slot), Arc::clone(&monitor), tx, 42);
            Self { driver, slot, monitor, garbage: rx, engine: RecordingEngine::default(), version: 1 }
        }

        fn commit(&mut self, seq: &NoteSequence) {
            self.version += 1;
            self.slot.publish(CompiledSequence::compile(
                NodeId::new(1),
                seq,
                MusicalKey::default(),
                self.version,
            ));
        }

        /// Run from `from` to `to` in small blocks.
        fn run(&mut self, from: f64, to: f64) {
            let block = 0.01;
            let mut beat = from;
            while beat < to {
                let next = (beat + block).min(to);
                self.driver.process(beat, next, &mut self.engine);
                beat = next;
            }
        }
    }

    fn one_note(step: usize) -> NoteSequence {
        let mut seq = NoteSequence::default();
        seq.toggle_step(step, 60, 0.8);
        seq
    }

    #[test]
    fn plays_a_step_with_its_off() {
        let mut rig = Rig::new(&one_note(2));
        rig.driver.start(0.0);
        rig.run(0.0, 1.0);
        assert_eq!(
            rig.engine.events,
            vec![
                EngineEvent::NoteOn { node: NodeId::new(1), pitch: 60, velocity: 0.8, beat: 0.5 },
                EngineEvent::NoteOff { node: NodeId::new(1), pitch: 60, beat: 0.75 },
            ]
        );
        assert_eq!(rig.monitor.current_step(), Some(3));
    }

    #[test]
    fn ratchets_subdivide_the_step() {
        let mut seq = NoteSequence::default();
        seq.notes.push(NoteEvent { ratchet_count: 3, ..NoteEvent::at_step(0, 60, 0.8) });
        let mut rig = Rig::new(&seq);
        rig.driver.start(0.0);
        rig.run(0.0, 0.3);

        let ons = rig.engine.note_ons();
        let offs = rig.engine.note_offs();
        assert_eq!(ons.len(), 3);
        assert_eq!(offs.len(), 3);
        let sub = STEP_DURATION / 3.0;
        for i in 0..3 {
            assert!((ons[i].1 - i as f64 * sub).abs() < 1e-6);
            assert!(offs[i].1 > ons[i].1);
            assert!(offs[i].1 <= 0.25 + 1e-6);
        }
        // every off precedes the next on
        let kinds: Vec<bool> = rig
            .engine
            .events
            .iter()
            .map(|e| matches!(e, EngineEvent::NoteOn { .. }))
            .collect();
        assert_eq!(kinds, vec![true, false, true, false, true, false]);
    }

    #[test]
    fn stop_between_ratchet_hits_releases_everything() {
        let mut seq = one_note(0);
        seq.notes[0].ratchet_count = 3;
        let mut rig = Rig::new(&seq);
        rig.driver.start(0.0);
        rig.run(0.0, 0.1);
        assert_eq!(rig.engine.note_ons().len(), 2);
        assert_eq!(rig.engine.held_notes(), vec![60]);

        rig.driver.stop(0.1, &mut rig.engine);
        assert!(rig.engine.held_notes().is_empty());
        assert_eq!(rig.engine.note_offs().last(), Some(&(60, 0.1)));
        rig.run(0.1, 0.3);
        assert_eq!(rig.engine.note_ons().len(), 2);
    }

    #[test]
    fn dense_ratchets_are_never_dropped() {
        let mut seq = NoteSequence::default();
        for pitch in 40..80 {
            seq.notes.push(NoteEvent { ratchet_count: 8, ..NoteEvent::at_step(0, pitch, 0.8) });
        }
        let mut rig = Rig::new(&seq);
        rig.driver.start(0.0);
        rig.run(0.0, 0.3);
        assert_eq!(rig.engine.note_ons().len(), 320);
        assert!(rig.engine.held_notes().is_empty());
    }

    #[test]
    fn zero_global_probability_never_fires() {
        let mut seq = one_note(0);
        seq.global_probability = 0.0;
        let mut rig = Rig::new(&seq);
        rig.driver.start(0.0);
        rig.run(0.0, 40.0);
        assert!(rig.engine.note_ons().is_empty());
    }

    #[test]
    fn full_probability_always_fires() {
        let mut rig = Rig::new(&one_note(0));
        rig.driver.start(0.0);
        rig.run(0.0, 40.0);
        assert_eq!(rig.engine.note_ons().len(), 10);
    }

    #[test]
    fn param_push_changes_live_probability() {
        let mut rig = Rig::new(&one_note(0));
        rig.driver.start(0.0);
        assert!(rig.driver.apply_param(NodeParam::GlobalProbability(0.0)));
        rig.run(0.0, 8.0);
        assert!(rig.engine.note_ons().is_empty());
        assert!(!rig.driver.apply_param(NodeParam::Volume(0.5)));
    }

    #[test]
    fn stop_releases_sounding_notes() {
        let mut seq = NoteSequence::default();
        seq.notes.push(NoteEvent { duration: 2.0, ..NoteEvent::at_step(0, 60, 0.8) });
        let mut rig = Rig::new(&seq);
        rig.driver.start(0.0);
        rig.run(0.0, 0.5);
        assert_eq!(rig.engine.held_notes(), vec![60]);

        rig.driver.stop(0.5, &mut rig.engine);
        assert!(rig.engine.held_notes().is_empty());
        assert_eq!(rig.engine.note_offs(), vec![(60, 0.5)]);
        assert!(!rig.monitor.is_playing());

        rig.run(0.5, 8.0);
        assert_eq!(rig.engine.note_ons().len(), 1);
    }

    #[test]
    fn snapshots_adopted_at_boundaries_and_retired() {
        let mut rig = Rig::new(&one_note(0));
        rig.driver.start(0.0);
        rig.run(0.0, 0.1);
        rig.commit(&one_note(1));
        assert_eq!(rig.driver.snapshot_version(), 1);
        rig.run(0.1, 0.3);
        assert_eq!(rig.driver.snapshot_version(), 2);
        match rig.garbage.try_recv() {
            Ok(Retired::Snapshot(old)) => assert_eq!(old.version, 1),
            other => panic!("expected retired snapshot, got {:?}", other),
        }
        // step 1 of the new snapshot fired at beat 0.25
        assert_eq!(rig.engine.note_ons(), vec![(60, 0.0), (60, 0.25)]);
    }

    #[test]
    fn length_change_mid_playback_stays_in_grid() {
        let mut seq = NoteSequence::default();
        for step in 0..16 {
            seq.toggle_step(step, 60 + step as u8, 0.8);
        }
        seq.playback_direction = Some(PlaybackDirection::PingPong);
        let mut rig = Rig::new(&seq);
        rig.driver.start(0.0);
        rig.run(0.0, 3.1);

        seq.set_length(1.0);
        rig.commit(&seq);
        rig.run(3.1, 12.0);
        assert!(rig.monitor.current_step().unwrap() < 4);
        let late: Vec<(u8, f64)> =
            rig.engine.note_ons().into_iter().filter(|&(_, b)| b >= 3.25).collect();
        assert!(!late.is_empty());
        assert!(late.iter().all(|&(p, _)| p < 64));
    }

    #[test]
    fn accumulator_transposes_each_cycle() {
        let mut seq = one_note(0);
        seq.accumulator = Some(AccumulatorConfig {
            target: AccumulatorTarget::Pitch,
            mode: AccumulatorMode::Wrap,
            amount: 2.0,
            limit: 12.0,
        });
        let mut rig = Rig::new(&seq);
        rig.driver.start(0.0);
        rig.run(0.0, 12.0);
        let pitches: Vec<u8> = rig.engine.note_ons().into_iter().map(|(p, _)| p).collect();
        assert_eq!(pitches, vec![60, 62, 64]);
    }

    #[test]
    fn new_accumulator_limit_restarts_the_drift() {
        let mut seq = one_note(0);
        seq.toggle_step(4, 60, 0.8);
        let clamp = |limit| AccumulatorConfig {
            target: AccumulatorTarget::Pitch,
            mode: AccumulatorMode::Clamp,
            amount: 5.0,
            limit,
        };
        seq.accumulator = Some(clamp(12.0));
        let mut rig = Rig::new(&seq);
        rig.driver.start(0.0);
        rig.run(0.0, 12.1);
        assert_eq!(rig.engine.note_ons().last(), Some(&(72, 12.0)));

        seq.accumulator = Some(clamp(2.0));
        rig.commit(&seq);
        rig.run(12.1, 16.1);
        let late: Vec<(u8, f64)> =
            rig.engine.note_ons().into_iter().filter(|&(_, b)| b > 12.1).collect();
        assert_eq!(late, vec![(60, 13.0), (62, 16.0)]);
    }

    #[test]
    fn arp_walks_pool_at_its_rate() {
        let mut seq = NoteSequence::default();
        seq.toggle_step(0, 64, 0.8);
        seq.toggle_step(4, 60, 0.8);
        seq.toggle_step(8, 67, 0.8);
        seq.arp_config = Some(ArpConfig {
            mode: ArpMode::Up,
            rate: ArpRate::Eighth,
            octave_range: 1,
            gate_length: 0.5,
        });
        let mut rig = Rig::new(&seq);
        rig.driver.start(0.0);
        rig.run(0.0, 2.0);
        assert_eq!(
            rig.engine.note_ons(),
            vec![(60, 0.0), (64, 0.5), (67, 1.0), (60, 1.5)]
        );
        let offs = rig.engine.note_offs();
        assert_eq!(offs[0], (60, 0.25));
        // the playhead follows the grid, not the pool
        assert_eq!(rig.monitor.current_step(), Some(6));
    }

    #[test]
    fn stop_during_arp_gate_releases_the_note() {
        let mut seq = NoteSequence::default();
        seq.toggle_step(0, 64, 0.8);
        seq.toggle_step(4, 60, 0.8);
        seq.arp_config = Some(ArpConfig {
            mode: ArpMode::Up,
            rate: ArpRate::Eighth,
            octave_range: 1,
            gate_length: 1.0,
        });
        let mut rig = Rig::new(&seq);
        rig.driver.start(0.0);
        rig.run(0.0, 0.3);
        assert_eq!(rig.engine.held_notes(), vec![60]);

        rig.driver.stop(0.3, &mut rig.engine);
        assert!(rig.engine.held_notes().is_empty());
        assert_eq!(rig.engine.note_offs(), vec![(60, 0.3)]);
        rig.run(0.3, 1.0);
        assert_eq!(rig.engine.note_ons().len(), 1);
    }

    #[test]
    fn frozen_mutation_repeats_every_cycle() {
        let mut seq = NoteSequence::default();
        for step in 0..16 {
            seq.toggle_step(step, 60, 0.8);
        }
        seq.mutation = Some(MutationConfig::new(0.6, 3));
        seq.mutation_seed = Some(1234);
        let mut rig = Rig::new(&seq);
        rig.driver.start(0.0);
        rig.run(0.0, 12.0);
        let pitches: Vec<u8> = rig.engine.note_ons().into_iter().map(|(p, _)| p).collect();
        assert_eq!(pitches.len(), 48);
        assert_eq!(&pitches[0..16], &pitches[16..32]);
        assert_eq!(&pitches[16..32], &pitches[32..48]);
        assert!(pitches.iter().all(|&p| MusicalKey::default().contains(p)));
        assert_eq!(rig.monitor.mutation_seed(), Some(1234));
    }

    #[test]
    fn unfrozen_mutation_publishes_cycle_seed() {
        let mut seq = one_note(0);
        seq.mutation = Some(MutationConfig::new(0.5, 2));
        let mut rig = Rig::new(&seq);
        rig.driver.start(0.0);
        rig.run(0.0, 0.5);
        let first = rig.monitor.mutation_seed();
        assert!(first.is_some());
        rig.run(0.5, 4.5);
        assert_ne!(rig.monitor.mutation_seed(), first);
    }
}
