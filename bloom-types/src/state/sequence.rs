//! Per-node step sequence model.
//!
//! A `NoteSequence` is the authored truth for one node. All positions live on a
//! fixed grid of `STEP_DURATION` beats; editing operations snap to that grid and
//! keep at most one note per (pitch, step) cell.

use serde::{Deserialize, Serialize};

/// Beats per grid step (a sixteenth note in 4/4).
pub const STEP_DURATION: f64 = 0.25;
/// Longest sequence a node can hold.
pub const MAX_LENGTH_BEATS: f64 = 64.0;
pub const DEFAULT_LENGTH_BEATS: f64 = 4.0;
/// Velocity given to notes produced by fills and manual toggles.
pub const DEFAULT_FILL_VELOCITY: f32 = 0.8;
pub const MAX_RATCHETS: u8 = 8;

fn default_probability() -> f32 {
    1.0
}

fn default_ratchets() -> u8 {
    1
}

fn is_default_probability(p: &f32) -> bool {
    *p >= 1.0
}

fn is_default_ratchets(r: &u8) -> bool {
    *r <= 1
}

/// A single authored note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: u8,         // 0-127
    pub velocity: f32,     // 0.0-1.0
    pub start_beat: f64,   // >= 0, on the step grid
    pub duration: f64,     // > 0
    #[serde(default = "default_probability", skip_serializing_if = "is_default_probability")]
    pub probability: f32,  // 0.0-1.0, default 1.0 (always play)
    #[serde(default = "default_ratchets", skip_serializing_if = "is_default_ratchets")]
    pub ratchet_count: u8, // >= 1
}

impl NoteEvent {
    /// A one-step note at `step` with default probability and no ratchets.
    pub fn at_step(step: usize, pitch: u8, velocity: f32) -> Self {
        Self {
            pitch: pitch.min(127),
            velocity: velocity.clamp(0.0, 1.0),
            start_beat: step as f64 * STEP_DURATION,
            duration: STEP_DURATION,
            probability: 1.0,
            ratchet_count: 1,
        }
    }

    /// Grid column this note starts on.
    pub fn step(&self) -> usize {
        step_of(self.start_beat)
    }

    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.duration
    }
}

/// Grid column containing `beat` after rounding to the nearest step.
pub fn step_of(beat: f64) -> usize {
    if !beat.is_finite() || beat <= 0.0 {
        return 0;
    }
    (beat / STEP_DURATION).round() as usize
}

/// Number of grid columns for a sequence length (always at least one).
pub fn columns_for(length_in_beats: f64) -> usize {
    if !length_in_beats.is_finite() {
        return 1;
    }
    ((length_in_beats / STEP_DURATION).round() as usize).max(1)
}

/// Order in which the playback driver walks the step grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackDirection {
    #[default]
    Forward,
    Reverse,
    PingPong,
    Random,
    Brownian,
}

impl PlaybackDirection {
    pub const ALL: [PlaybackDirection; 5] = [
        PlaybackDirection::Forward,
        PlaybackDirection::Reverse,
        PlaybackDirection::PingPong,
        PlaybackDirection::Random,
        PlaybackDirection::Brownian,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PlaybackDirection::Forward => "Forward",
            PlaybackDirection::Reverse => "Reverse",
            PlaybackDirection::PingPong => "Ping-Pong",
            PlaybackDirection::Random => "Random",
            PlaybackDirection::Brownian => "Brownian",
        }
    }

    pub fn next(&self) -> PlaybackDirection {
        let idx = Self::ALL.iter().position(|d| d == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Euclidean fill parameters that produced the current notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EuclideanConfig {
    pub pulses: u32,
    pub rotation: u32,
}

/// Per-step stochastic pitch drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Probability that a step is perturbed (0.0-1.0)
    pub amount: f32,
    /// Maximum drift in scale degrees (1-7)
    pub range: u8,
}

impl MutationConfig {
    pub const MAX_RANGE: u8 = 7;

    pub fn new(amount: f32, range: u8) -> Self {
        Self { amount, range }.clamped()
    }

    pub fn clamped(self) -> Self {
        let amount = if self.amount.is_finite() {
            self.amount.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            amount,
            range: self.range.clamp(1, Self::MAX_RANGE),
        }
    }
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            amount: 0.25,
            range: 2,
        }
    }
}

/// Parameter an accumulator drifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccumulatorTarget {
    Pitch,
    Velocity,
    Probability,
    Gate,
}

impl AccumulatorTarget {
    pub fn name(&self) -> &'static str {
        match self {
            AccumulatorTarget::Pitch => "Pitch",
            AccumulatorTarget::Velocity => "Velocity",
            AccumulatorTarget::Probability => "Probability",
            AccumulatorTarget::Gate => "Gate",
        }
    }
}

/// What happens when the running offset reaches its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccumulatorMode {
    Clamp,
    Wrap,
}

/// Deterministic per-cycle drift of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorConfig {
    pub target: AccumulatorTarget,
    pub mode: AccumulatorMode,
    /// Added to the running offset on every completed cycle
    pub amount: f64,
    /// Offset stays within [-limit, limit]
    pub limit: f64,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            target: AccumulatorTarget::Pitch,
            mode: AccumulatorMode::Wrap,
            amount: 1.0,
            limit: 12.0,
        }
    }
}

/// Order in which the arpeggiator walks its note pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArpMode {
    Up,
    Down,
    UpDown,
    DownUp,
    Random,
    AsPlayed,
}

impl ArpMode {
    pub fn name(&self) -> &'static str {
        match self {
            ArpMode::Up => "Up",
            ArpMode::Down => "Down",
            ArpMode::UpDown => "Up/Down",
            ArpMode::DownUp => "Down/Up",
            ArpMode::Random => "Random",
            ArpMode::AsPlayed => "As Played",
        }
    }
}

/// Arpeggiator slot length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArpRate {
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    TripletEighth,
    TripletSixteenth,
}

impl ArpRate {
    pub fn name(&self) -> &'static str {
        match self {
            ArpRate::Quarter => "1/4",
            ArpRate::Eighth => "1/8",
            ArpRate::Sixteenth => "1/16",
            ArpRate::ThirtySecond => "1/32",
            ArpRate::TripletEighth => "1/8T",
            ArpRate::TripletSixteenth => "1/16T",
        }
    }

    /// Slots per beat (quarter note)
    pub fn steps_per_beat(&self) -> f64 {
        match self {
            ArpRate::Quarter => 1.0,
            ArpRate::Eighth => 2.0,
            ArpRate::Sixteenth => 4.0,
            ArpRate::ThirtySecond => 8.0,
            ArpRate::TripletEighth => 3.0,
            ArpRate::TripletSixteenth => 6.0,
        }
    }

    pub fn slot_beats(&self) -> f64 {
        1.0 / self.steps_per_beat()
    }
}

/// Arpeggiator configuration. When present it replaces raw step playback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArpConfig {
    pub mode: ArpMode,
    pub rate: ArpRate,
    pub octave_range: u8, // 1-4
    pub gate_length: f32, // 0.0-1.0 (note length as fraction of slot)
}

impl ArpConfig {
    pub const MAX_OCTAVES: u8 = 4;

    pub fn clamped(self) -> Self {
        let gate_length = if self.gate_length.is_finite() {
            self.gate_length.clamp(0.0, 1.0)
        } else {
            0.5
        };
        Self {
            octave_range: self.octave_range.clamp(1, Self::MAX_OCTAVES),
            gate_length,
            ..self
        }
    }
}

impl Default for ArpConfig {
    fn default() -> Self {
        Self {
            mode: ArpMode::Up,
            rate: ArpRate::Eighth,
            octave_range: 1,
            gate_length: 0.5,
        }
    }
}

/// The authored step sequence of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSequence {
    pub notes: Vec<NoteEvent>,
    pub length_in_beats: f64,
    pub global_probability: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback_direction: Option<PlaybackDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub euclidean: Option<EuclideanConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<MutationConfig>,
    /// Frozen mutation seed: while set, every cycle replays the same mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulator: Option<AccumulatorConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arp_config: Option<ArpConfig>,
}

impl NoteSequence {
    pub fn new(length_in_beats: f64) -> Self {
        Self {
            notes: Vec::new(),
            length_in_beats: clamp_length(length_in_beats),
            global_probability: 1.0,
            playback_direction: None,
            euclidean: None,
            mutation: None,
            mutation_seed: None,
            accumulator: None,
            arp_config: None,
        }
    }

    pub fn columns(&self) -> usize {
        columns_for(self.length_in_beats)
    }

    pub fn direction(&self) -> PlaybackDirection {
        self.playback_direction.unwrap_or_default()
    }

    pub fn note_at(&self, step: usize, pitch: u8) -> Option<&NoteEvent> {
        self.notes
            .iter()
            .find(|n| n.pitch == pitch && n.step() == step)
    }

    pub fn note_at_mut(&mut self, step: usize, pitch: u8) -> Option<&mut NoteEvent> {
        self.notes
            .iter_mut()
            .find(|n| n.pitch == pitch && n.step() == step)
    }

    /// Toggle the cell at (step, pitch). Manual edits clear any euclidean fill.
    /// Steps outside the grid are ignored.
    pub fn toggle_step(&mut self, step: usize, pitch: u8, velocity: f32) {
        if step >= self.columns() || pitch > 127 {
            return;
        }
        self.euclidean = None;
        if let Some(pos) = self
            .notes
            .iter()
            .position(|n| n.pitch == pitch && n.step() == step)
        {
            self.notes.remove(pos);
        } else {
            self.notes.push(NoteEvent::at_step(step, pitch, velocity));
            self.sort_notes();
        }
    }

    /// Insert a note, replacing whatever occupied its (pitch, step) cell.
    /// The note is snapped to the grid and clipped to the sequence length.
    pub fn insert_note(&mut self, mut note: NoteEvent) {
        let step = step_of(note.start_beat);
        if step >= self.columns() {
            return;
        }
        note.pitch = note.pitch.min(127);
        note.start_beat = step as f64 * STEP_DURATION;
        note.velocity = clamp_unit(note.velocity);
        note.probability = clamp_unit(note.probability);
        note.ratchet_count = note.ratchet_count.clamp(1, MAX_RATCHETS);
        if !note.duration.is_finite() || note.duration <= 0.0 {
            note.duration = STEP_DURATION;
        }
        note.duration = note.duration.min(self.length_in_beats - note.start_beat);
        self.notes
            .retain(|n| !(n.pitch == note.pitch && n.step() == step));
        self.notes.push(note);
        self.sort_notes();
    }

    /// Change the length. Notes starting at or past the new end are removed.
    /// Notes running past it keep their authored duration; playback cuts them
    /// at the end, so growing the sequence again restores them.
    pub fn set_length(&mut self, length_in_beats: f64) {
        let length = clamp_length(length_in_beats);
        self.length_in_beats = length;
        let columns = self.columns();
        self.notes.retain(|n| n.start_beat < length && n.step() < columns);
    }

    /// Re-quantise every note to the grid and drop duplicate cells, keeping the
    /// last-authored note for each (pitch, step).
    pub fn normalize(&mut self) {
        let notes = std::mem::take(&mut self.notes);
        for note in notes {
            self.insert_note(note);
        }
    }

    pub fn clear(&mut self) {
        self.notes.clear();
        self.euclidean = None;
    }

    fn sort_notes(&mut self) {
        self.notes.sort_by(|a, b| {
            a.start_beat
                .total_cmp(&b.start_beat)
                .then(a.pitch.cmp(&b.pitch))
        });
    }
}

impl Default for NoteSequence {
    fn default() -> Self {
        Self::new(DEFAULT_LENGTH_BEATS)
    }
}

fn clamp_length(length: f64) -> f64 {
    if !length.is_finite() {
        return DEFAULT_LENGTH_BEATS;
    }
    length.clamp(STEP_DURATION, MAX_LENGTH_BEATS)
}

pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_from_length() {
        assert_eq!(NoteSequence::new(4.0).columns(), 16);
        assert_eq!(NoteSequence::new(1.0).columns(), 4);
        assert_eq!(columns_for(0.0), 1);
        assert_eq!(columns_for(f64::NAN), 1);
    }

    #[test]
    fn length_is_clamped() {
        assert_eq!(NoteSequence::new(0.0).length_in_beats, STEP_DURATION);
        assert_eq!(NoteSequence::new(1000.0).length_in_beats, MAX_LENGTH_BEATS);
        assert_eq!(NoteSequence::new(f64::INFINITY).length_in_beats, DEFAULT_LENGTH_BEATS);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut seq = NoteSequence::default();
        seq.toggle_step(3, 60, 0.8);
        assert_eq!(seq.notes.len(), 1);
        assert_eq!(seq.notes[0].start_beat, 0.75);
        seq.toggle_step(3, 60, 0.8);
        assert!(seq.notes.is_empty());
    }

    #[test]
    fn toggle_out_of_grid_is_ignored() {
        let mut seq = NoteSequence::default();
        seq.toggle_step(16, 60, 0.8);
        assert!(seq.notes.is_empty());
    }

    #[test]
    fn toggle_clears_euclidean() {
        let mut seq = NoteSequence::default();
        seq.euclidean = Some(EuclideanConfig { pulses: 4, rotation: 0 });
        seq.toggle_step(1, 64, 0.8);
        assert!(seq.euclidean.is_none());
    }

    #[test]
    fn insert_replaces_same_cell() {
        let mut seq = NoteSequence::default();
        seq.insert_note(NoteEvent::at_step(2, 60, 0.5));
        let mut louder = NoteEvent::at_step(2, 60, 1.0);
        louder.start_beat = 0.52; // snaps to step 2
        seq.insert_note(louder);
        assert_eq!(seq.notes.len(), 1);
        assert_eq!(seq.notes[0].velocity, 1.0);
        assert_eq!(seq.notes[0].start_beat, 0.5);
    }

    #[test]
    fn insert_clamps_fields() {
        let mut seq = NoteSequence::default();
        seq.insert_note(NoteEvent {
            pitch: 200,
            velocity: 3.0,
            start_beat: 3.75,
            duration: 10.0,
            probability: -1.0,
            ratchet_count: 0,
        });
        let note = &seq.notes[0];
        assert_eq!(note.pitch, 127);
        assert_eq!(note.velocity, 1.0);
        assert_eq!(note.probability, 0.0);
        assert_eq!(note.ratchet_count, 1);
        assert_eq!(note.duration, 0.25);
    }

    #[test]
    fn shrink_removes_late_notes_and_keeps_durations() {
        let mut seq = NoteSequence::default();
        seq.insert_note(NoteEvent::at_step(0, 60, 0.8));
        let mut long = NoteEvent::at_step(4, 62, 0.8);
        long.duration = 2.0;
        seq.insert_note(long);
        seq.insert_note(NoteEvent::at_step(12, 64, 0.8));

        seq.set_length(2.0);
        assert_eq!(seq.notes.len(), 2);
        assert_eq!(seq.note_at(4, 62).map(|n| n.duration), Some(2.0));
        assert!(seq.note_at(12, 64).is_none());
    }

    #[test]
    fn shrink_then_grow_keeps_early_notes() {
        let mut seq = NoteSequence::default();
        seq.insert_note(NoteEvent::at_step(0, 60, 0.8));
        seq.insert_note(NoteEvent::at_step(5, 62, 0.8));
        seq.insert_note(NoteEvent { duration: 2.0, ..NoteEvent::at_step(4, 67, 0.8) });
        seq.insert_note(NoteEvent::at_step(10, 64, 0.8));
        let before: Vec<NoteEvent> = seq.notes.iter().filter(|n| n.step() < 8).cloned().collect();

        seq.set_length(2.0);
        seq.set_length(4.0);

        assert_eq!(seq.notes, before);
        assert_eq!(seq.note_at(4, 67).map(|n| n.duration), Some(2.0));
        assert!(seq.note_at(10, 64).is_none());
    }

    #[test]
    fn normalize_dedups_cells() {
        let mut seq = NoteSequence::default();
        seq.notes.push(NoteEvent::at_step(1, 60, 0.2));
        seq.notes.push(NoteEvent::at_step(1, 60, 0.9));
        seq.notes.push(NoteEvent::at_step(1, 67, 0.5));
        seq.normalize();
        assert_eq!(seq.notes.len(), 2);
        assert_eq!(seq.note_at(1, 60).map(|n| n.velocity), Some(0.9));
    }

    #[test]
    fn direction_defaults_to_forward() {
        let seq = NoteSequence::default();
        assert_eq!(seq.direction(), PlaybackDirection::Forward);
        assert_eq!(PlaybackDirection::Brownian.next(), PlaybackDirection::Forward);
    }

    #[test]
    fn mutation_config_clamps() {
        let cfg = MutationConfig::new(4.0, 12);
        assert_eq!(cfg.amount, 1.0);
        assert_eq!(cfg.range, 7);
        assert_eq!(MutationConfig::new(0.5, 0).range, 1);
    }

    #[test]
    fn arp_config_clamps() {
        let cfg = ArpConfig {
            octave_range: 9,
            gate_length: 2.0,
            ..ArpConfig::default()
        }
        .clamped();
        assert_eq!(cfg.octave_range, 4);
        assert_eq!(cfg.gate_length, 1.0);
    }

    #[test]
    fn serialization_omits_unset_options() {
        let mut seq = NoteSequence::default();
        seq.toggle_step(0, 60, 0.8);
        let json = serde_json::to_string(&seq).unwrap();
        assert!(!json.contains("playback_direction"));
        assert!(!json.contains("arp_config"));
        assert!(!json.contains("ratchet_count"));
        let back: NoteSequence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, seq);
    }
}
