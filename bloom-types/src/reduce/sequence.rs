use rand::Rng;

use crate::action::{EditKind, EditPhase, NodeParam, SequenceAction};
use crate::fill::{apply_euclidean, random_fill};
use crate::state::music::{MusicalKey, PitchRange};
use crate::state::sequence::{clamp_unit, NoteSequence, MAX_RATCHETS, STEP_DURATION};

/// Everything a reducer needs beyond the sequence itself.
pub struct EditContext<'a, R: Rng + ?Sized> {
    /// Key resolved for this node right before the edit
    pub key: &'a MusicalKey,
    /// Range used when an action does not carry its own
    pub pitch_range: PitchRange,
    /// Velocity for manually toggled notes
    pub velocity: f32,
    /// Density used when a random fill does not carry its own
    pub fill_density: f32,
    /// Mutation seed currently audible on the playback side, if playing
    pub audible_mutation_seed: Option<u64>,
    pub rng: &'a mut R,
}

/// Apply `action` to `seq` and report how the change must be propagated.
///
/// Transport actions (`Play`, `Stop`) are not sequence edits and report
/// `EditKind::None`.
pub fn reduce<R: Rng + ?Sized>(
    action: &SequenceAction,
    seq: &mut NoteSequence,
    ctx: &mut EditContext<'_, R>,
) -> EditKind {
    match action {
        SequenceAction::ToggleStep { step, pitch } => {
            if *step >= seq.columns() {
                return EditKind::None;
            }
            seq.toggle_step(*step, *pitch, ctx.velocity);
            EditKind::Structural
        }
        SequenceAction::SetNoteVelocity { step, pitch, velocity } => {
            match seq.note_at_mut(*step, *pitch) {
                Some(note) => {
                    note.velocity = clamp_unit(*velocity);
                    EditKind::Structural
                }
                None => EditKind::None,
            }
        }
        SequenceAction::SetNoteProbability { step, pitch, probability } => {
            match seq.note_at_mut(*step, *pitch) {
                Some(note) => {
                    note.probability = clamp_unit(*probability);
                    EditKind::Structural
                }
                None => EditKind::None,
            }
        }
        SequenceAction::SetNoteRatchet { step, pitch, count } => {
            match seq.note_at_mut(*step, *pitch) {
                Some(note) => {
                    note.ratchet_count = (*count).clamp(1, MAX_RATCHETS);
                    EditKind::Structural
                }
                None => EditKind::None,
            }
        }
        SequenceAction::SetNoteDuration { step, pitch, duration } => {
            let length = seq.length_in_beats;
            match seq.note_at_mut(*step, *pitch) {
                Some(note) if duration.is_finite() => {
                    let max = length - note.start_beat;
                    note.duration = duration.clamp(STEP_DURATION.min(max), max);
                    EditKind::Structural
                }
                _ => EditKind::None,
            }
        }
        SequenceAction::SetLength(length) => {
            let before = seq.length_in_beats;
            seq.set_length(*length);
            if seq.length_in_beats == before {
                EditKind::None
            } else {
                EditKind::Structural
            }
        }
        SequenceAction::SetGlobalProbability { value, phase } => {
            seq.global_probability = clamp_unit(*value);
            match phase {
                EditPhase::Dragging => {
                    EditKind::Param(NodeParam::GlobalProbability(seq.global_probability))
                }
                EditPhase::Commit => EditKind::Structural,
            }
        }
        SequenceAction::SetDirection(direction) => {
            if seq.playback_direction == *direction {
                return EditKind::None;
            }
            seq.playback_direction = *direction;
            EditKind::Structural
        }
        SequenceAction::ApplyEuclidean { pulses, rotation, pitch_range } => {
            let range = pitch_range.unwrap_or(ctx.pitch_range);
            apply_euclidean(seq, *pulses, *rotation, ctx.key, range);
            EditKind::Structural
        }
        SequenceAction::ClearEuclidean => {
            if seq.euclidean.is_none() {
                return EditKind::None;
            }
            seq.clear();
            EditKind::Structural
        }
        SequenceAction::RandomFill { density, pitch_range } => {
            let range = pitch_range.unwrap_or(ctx.pitch_range);
            let density = density.unwrap_or(ctx.fill_density);
            random_fill(seq, density, ctx.key, range, &mut *ctx.rng);
            EditKind::Structural
        }
        SequenceAction::SetMutation(config) => {
            seq.mutation = config.map(|c| c.clamped());
            if seq.mutation.is_none() {
                seq.mutation_seed = None;
            }
            EditKind::Structural
        }
        SequenceAction::SetMutationAmount { value, phase } => {
            let Some(mutation) = seq.mutation.as_mut() else {
                return EditKind::None;
            };
            mutation.amount = clamp_unit(*value);
            match phase {
                EditPhase::Dragging => EditKind::Param(NodeParam::MutationAmount(mutation.amount)),
                EditPhase::Commit => EditKind::Structural,
            }
        }
        SequenceAction::FreezeMutation => {
            match (seq.mutation, ctx.audible_mutation_seed) {
                (Some(_), Some(seed)) => {
                    seq.mutation_seed = Some(seed);
                    EditKind::Structural
                }
                _ => EditKind::None,
            }
        }
        SequenceAction::ResetMutation => {
            if seq.mutation_seed.take().is_some() {
                EditKind::Structural
            } else {
                EditKind::None
            }
        }
        SequenceAction::SetAccumulator(config) => {
            seq.accumulator = *config;
            EditKind::Structural
        }
        SequenceAction::SetArp(config) => {
            seq.arp_config = config.map(|c| c.clamped());
            EditKind::Structural
        }
        SequenceAction::Clear => {
            if seq.notes.is_empty() && seq.euclidean.is_none() {
                return EditKind::None;
            }
            seq.clear();
            EditKind::Structural
        }
        SequenceAction::Param(param) => EditKind::Param(*param),
        SequenceAction::Play | SequenceAction::Stop => EditKind::None,
    }
}
