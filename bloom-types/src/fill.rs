//! Pattern fill algorithms: euclidean rhythms and scale-constrained random fill.

use rand::Rng;

use crate::state::music::{MusicalKey, PitchRange};
use crate::state::sequence::{EuclideanConfig, NoteEvent, NoteSequence, DEFAULT_FILL_VELOCITY};

/// Generate a Euclidean rhythm pattern.
///
/// Returns a `Vec<bool>` of length `steps` with `pulses` onsets spread as evenly
/// as possible. Step `i` is an onset when the running position `i * pulses / steps`
/// crosses an integer, which puts the first onset on step 0. `rotation` shifts the
/// pattern right (circularly) by that many steps.
pub fn euclidean_rhythm(pulses: usize, steps: usize, rotation: usize) -> Vec<bool> {
    if steps == 0 {
        return vec![];
    }
    let pulses = pulses.min(steps);

    let mut pattern: Vec<bool> = (0..steps).map(|i| (i * pulses) % steps < pulses).collect();

    if rotation > 0 {
        pattern.rotate_right(rotation % steps);
    }
    pattern
}

/// Pitch used for every euclidean onset: the lowest root in range, else the
/// lowest in-scale pitch in range, else the bottom of the range.
pub fn euclidean_pitch(key: &MusicalKey, range: PitchRange) -> u8 {
    (range.low..=range.high)
        .find(|&p| key.contains(p) && (p % 12) == key.root)
        .or_else(|| key.pitches_in(range).first().copied())
        .unwrap_or(range.low)
}

/// Replace the sequence's notes with a euclidean pattern over its columns.
pub fn apply_euclidean(
    seq: &mut NoteSequence,
    pulses: u32,
    rotation: u32,
    key: &MusicalKey,
    range: PitchRange,
) {
    let columns = seq.columns();
    let pulses = (pulses as usize).min(columns);
    let rotation = rotation as usize % columns;
    let pitch = euclidean_pitch(key, range);

    seq.notes = euclidean_rhythm(pulses, columns, rotation)
        .into_iter()
        .enumerate()
        .filter(|(_, onset)| *onset)
        .map(|(step, _)| NoteEvent::at_step(step, pitch, DEFAULT_FILL_VELOCITY))
        .collect();
    seq.euclidean = Some(EuclideanConfig {
        pulses: pulses as u32,
        rotation: rotation as u32,
    });
}

/// Replace the sequence's notes with random in-scale notes.
///
/// Each column receives a note with probability `density`; its pitch is drawn
/// uniformly from the key's pitches inside `range`.
pub fn random_fill<R: Rng + ?Sized>(
    seq: &mut NoteSequence,
    density: f32,
    key: &MusicalKey,
    range: PitchRange,
    rng: &mut R,
) {
    seq.clear();
    let density = if density.is_finite() {
        density.clamp(0.0, 1.0) as f64
    } else {
        0.0
    };
    let candidates = key.pitches_in(range);
    if candidates.is_empty() {
        return;
    }
    for step in 0..seq.columns() {
        if rng.gen::<f64>() < density {
            let pitch = candidates[rng.gen_range(0..candidates.len())];
            seq.notes
                .push(NoteEvent::at_step(step, pitch, DEFAULT_FILL_VELOCITY));
        }
    }
}
