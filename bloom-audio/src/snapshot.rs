//! Immutable, playback-ready form of a node's sequence.
//!
//! A `CompiledSequence` is built on the edit side and never changes after it is
//! handed off. Events are grouped per step (offsets into one flat vector) so the
//! driver looks up a step's events without searching or allocating.

use bloom_types::{
    columns_for, AccumulatorConfig, AccumulatorTarget, ArpConfig, ArpMode, MusicalKey, MutationConfig, NodeId,
    NoteSequence, PlaybackDirection, STEP_DURATION,
};

/// One authored note, resolved against the sequence length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerEvent {
    /// Position in the authored note list; salts per-event randomness
    pub index: usize,
    pub step: usize,
    pub pitch: u8,
    pub velocity: f32,
    /// Beats from the start of the sequence
    pub begin_beat: f64,
    /// Never past the sequence end
    pub end_beat: f64,
    pub probability: f32,
    pub ratchet_count: u8,
}

impl SequencerEvent {
    pub fn gate_beats(&self) -> f64 {
        self.end_beat - self.begin_beat
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArpPoolNote {
    pub pitch: u8,
    pub velocity: f32,
}

/// Arp configuration plus its expanded note pool, ordered for the mode.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledArp {
    pub config: ArpConfig,
    /// Ascending pitches (or start order for `AsPlayed`), repeated per octave
    pub pool: Vec<ArpPoolNote>,
}

impl CompiledArp {
    pub fn slot_beats(&self) -> f64 {
        self.config.rate.slot_beats()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSequence {
    pub node: NodeId,
    /// Monotonic per node, starting at 1
    pub version: u64,
    pub length_in_beats: f64,
    pub columns: usize,
    pub global_probability: f32,
    pub direction: PlaybackDirection,
    pub key: MusicalKey,
    pub mutation: Option<MutationConfig>,
    pub mutation_seed: Option<u64>,
    pub accumulator: Option<AccumulatorConfig>,
    pub arp: Option<CompiledArp>,
    events: Vec<SequencerEvent>,
    /// `events[step_offsets[s]..step_offsets[s + 1]]` are the events of step `s`
    step_offsets: Vec<usize>,
    pending_capacity: usize,
}

impl CompiledSequence {
    pub fn compile(node: NodeId, seq: &NoteSequence, key: MusicalKey, version: u64) -> Self {
        let length = seq.length_in_beats;
        let columns = columns_for(length);

        let mut events: Vec<SequencerEvent> = seq
            .notes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.pitch <= 127 && n.start_beat >= 0.0 && n.start_beat < length)
            .filter_map(|(index, n)| {
                let step = n.step();
                if step >= columns {
                    return None;
                }
                let begin = step as f64 * STEP_DURATION;
                let end = (begin + n.duration.max(0.0)).min(length);
                if end <= begin {
                    return None;
                }
                Some(SequencerEvent {
                    index,
                    step,
                    pitch: n.pitch,
                    velocity: n.velocity.clamp(0.0, 1.0),
                    begin_beat: begin,
                    end_beat: end,
                    probability: n.probability.clamp(0.0, 1.0),
                    ratchet_count: n.ratchet_count.max(1),
                })
            })
            .collect();
        events.sort_by(|a, b| a.step.cmp(&b.step).then(a.pitch.cmp(&b.pitch)));

        let mut step_offsets = Vec::with_capacity(columns + 1);
        let mut cursor = 0;
        for step in 0..=columns {
            while cursor < events.len() && events[cursor].step < step {
                cursor += 1;
            }
            step_offsets.push(cursor);
        }

        let arp = seq.arp_config.map(|config| {
            let config = config.clamped();
            CompiledArp { pool: arp_pool(&events, &config), config }
        });
        let pending_capacity =
            pending_bound(&events, &step_offsets, arp.as_ref(), seq.accumulator.as_ref(), length);

        Self {
            node,
            version,
            length_in_beats: length,
            columns,
            global_probability: seq.global_probability.clamp(0.0, 1.0),
            direction: seq.direction(),
            key,
            mutation: seq.mutation.map(|m| m.clamped()),
            mutation_seed: seq.mutation_seed,
            accumulator: seq.accumulator,
            arp,
            events,
            step_offsets,
            pending_capacity,
        }
    }

    /// Most notes a driver can hold queued or sounding at once while playing
    /// this snapshot.
    pub fn pending_capacity(&self) -> usize {
        self.pending_capacity
    }

    pub fn events(&self) -> &[SequencerEvent] {
        &self.events
    }

    /// Events starting on `step`; empty for steps outside the grid.
    pub fn events_at(&self, step: usize) -> &[SequencerEvent] {
        match (self.step_offsets.get(step), self.step_offsets.get(step + 1)) {
            (Some(&a), Some(&b)) => &self.events[a..b],
            _ => &[],
        }
    }

    pub fn is_arp(&self) -> bool {
        self.arp.is_some()
    }

    /// Beats between consecutive boundaries.
    pub fn grid_beats(&self) -> f64 {
        self.arp.as_ref().map_or(STEP_DURATION, |a| a.slot_beats())
    }
}

/// Triggers per boundary times the boundaries a gate can span.
fn pending_bound(
    events: &[SequencerEvent],
    step_offsets: &[usize],
    arp: Option<&CompiledArp>,
    accumulator: Option<&AccumulatorConfig>,
    length: f64,
) -> usize {
    let gate_drifts = accumulator.is_some_and(|a| a.target == AccumulatorTarget::Gate);
    let (grid, triggers, longest) = match arp {
        Some(arp) => (arp.slot_beats(), 1, arp.slot_beats() * arp.config.gate_length as f64),
        None => {
            let triggers = step_offsets
                .windows(2)
                .map(|w| events[w[0]..w[1]].iter().map(|e| e.ratchet_count as usize).sum())
                .max()
                .unwrap_or(0);
            let longest = events
                .iter()
                .map(|e| if e.ratchet_count > 1 { STEP_DURATION } else { e.gate_beats() })
                .fold(0.0, f64::max);
            (STEP_DURATION, triggers, longest)
        }
    };
    let longest = if gate_drifts { length } else { longest.min(length) };
    let spans = (longest / grid).ceil().max(0.0) as usize + 1;
    spans * triggers
}

/// Unique pitches of the sequence, expanded across the configured octaves.
fn arp_pool(events: &[SequencerEvent], config: &ArpConfig) -> Vec<ArpPoolNote> {
    let mut base: Vec<&SequencerEvent> = Vec::new();
    let mut by_start: Vec<&SequencerEvent> = events.iter().collect();
    by_start.sort_by(|a, b| {
        a.begin_beat
            .partial_cmp(&b.begin_beat)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    for ev in by_start {
        if !base.iter().any(|b| b.pitch == ev.pitch) {
            base.push(ev);
        }
    }
    if config.mode != ArpMode::AsPlayed {
        base.sort_by_key(|ev| ev.pitch);
    }

    let mut pool = Vec::with_capacity(base.len() * config.octave_range as usize);
    for octave in 0..config.octave_range.max(1) {
        for ev in &base {
            let pitched = ev.pitch as u16 + octave as u16 * 12;
            if pitched <= 127 {
                pool.push(ArpPoolNote { pitch: pitched as u8, velocity: ev.velocity });
            }
        }
    }
    pool
}
