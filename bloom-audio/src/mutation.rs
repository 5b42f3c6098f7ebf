//! Mutation engine: bounded, scale-relative pitch drift per step.
//!
//! Mutation never edits authored notes. At trigger time each event's pitch is
//! rolled against a per-cycle seed; a hit moves it by 1..=range scale degrees
//! (up or down) from the authored pitch's degree. The result is always a member
//! of the key.

use rand::Rng;

use bloom_types::{MusicalKey, MutationConfig};

use crate::roll::{mix, seeded};

/// Seed for one cycle. A frozen seed replays the same mutation every cycle.
pub fn cycle_seed(frozen: Option<u64>, base: u64, cycle: u64) -> u64 {
    frozen.unwrap_or_else(|| mix(base, cycle))
}

/// Resolve the audible pitch of event `index` under `config` for `seed`.
pub fn mutate_pitch(
    pitch: u8,
    index: usize,
    key: &MusicalKey,
    config: &MutationConfig,
    seed: u64,
) -> u8 {
    let config = config.clamped();
    if key.is_empty() || config.amount <= 0.0 {
        return pitch;
    }
    let mut rng = seeded(seed, index as u64);
    if rng.gen::<f32>() >= config.amount {
        return pitch;
    }
    let Some(base) = key.degree_of(pitch) else {
        return pitch;
    };
    let mut offset = rng.gen_range(1..=config.range as i32);
    if rng.gen::<bool>() {
        offset = -offset;
    }
    for degree in [base + offset, base - offset] {
        if let Some(p) = key.pitch_of_degree(degree) {
            if (0..=127).contains(&p) {
                return p as u8;
            }
        }
    }
    key.snap_down(pitch).unwrap_or(pitch)
}
