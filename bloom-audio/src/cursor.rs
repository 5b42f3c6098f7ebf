//! Runtime step cursor for one node: which column plays at each boundary.

use rand::Rng;

use bloom_types::PlaybackDirection;

use crate::accumulator::AccumulatorState;
use crate::roll::seeded;

/// Result of moving the cursor to the next boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepAdvance {
    pub step: usize,
    /// This boundary starts a new cycle
    pub wrapped: bool,
}

/// Per-node cursor state on the playback side.
#[derive(Debug, Clone)]
pub struct PlaybackCursor {
    /// Base seed for random and brownian choices
    pub seed: u64,
    /// Column played at the previous boundary
    pub step: Option<usize>,
    /// Boundaries advanced since start or the last resize
    pub boundaries: u64,
    /// Ping-pong travel direction
    pub ascending: bool,
    /// Column count the direction state was built for
    pub columns: usize,
    /// Completed cycles since start
    pub cycle: u64,
    pub accumulator: AccumulatorState,
}

impl PlaybackCursor {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            step: None,
            boundaries: 0,
            ascending: true,
            columns: 0,
            cycle: 0,
            accumulator: AccumulatorState::default(),
        }
    }

    /// Back to the state of a fresh start.
    pub fn reset(&mut self) {
        *self = Self::new(self.seed);
    }

    /// Forget direction state after a length change. Cycle count and
    /// accumulator offset carry over.
    pub fn resize(&mut self, columns: usize) {
        self.step = None;
        self.boundaries = 0;
        self.ascending = true;
        self.columns = columns;
    }

    /// Move to the column for absolute boundary `k`.
    pub fn advance(&mut self, direction: PlaybackDirection, columns: usize, k: u64) -> StepAdvance {
        let columns = columns.max(1);
        if columns != self.columns {
            self.resize(columns);
        }
        let first = self.step.is_none();
        let linear = (k % columns as u64) as usize;

        let step = match direction {
            PlaybackDirection::Forward => linear,
            PlaybackDirection::Reverse => columns - 1 - linear,
            PlaybackDirection::PingPong => self.ping_pong(linear, columns),
            PlaybackDirection::Random => random_step(self.seed, k, columns),
            PlaybackDirection::Brownian => match self.step {
                Some(from) => brownian_step(self.seed, k, from, columns),
                None => linear,
            },
        };

        let wrapped = !first
            && match direction {
                PlaybackDirection::Forward | PlaybackDirection::PingPong => step == 0,
                PlaybackDirection::Reverse => step == columns - 1,
                PlaybackDirection::Random | PlaybackDirection::Brownian => {
                    self.boundaries % columns as u64 == 0
                }
            };

        self.boundaries += 1;
        self.step = Some(step);
        if wrapped {
            self.cycle += 1;
        }
        StepAdvance { step, wrapped }
    }

    fn ping_pong(&mut self, linear: usize, columns: usize) -> usize {
        let Some(from) = self.step else {
            self.ascending = true;
            return linear;
        };
        if columns == 1 {
            return 0;
        }
        let from = from.min(columns - 1);
        if self.ascending {
            if from + 1 >= columns {
                self.ascending = false;
                from - 1
            } else {
                from + 1
            }
        } else if from == 0 {
            self.ascending = true;
            1
        } else {
            from - 1
        }
    }
}

/// Column chosen by the random direction at boundary `k`. Pure, so peeking
/// ahead and then advancing agree.
pub fn random_step(seed: u64, k: u64, columns: usize) -> usize {
    seeded(seed, k).gen_range(0..columns.max(1))
}

/// Brownian move from `from` at boundary `k`: one column left or right, wrapping.
pub fn brownian_step(seed: u64, k: u64, from: usize, columns: usize) -> usize {
    if columns <= 1 {
        return 0;
    }
    let from = from % columns;
    if seeded(seed, k).gen::<bool>() {
        (from + 1) % columns
    } else {
        (from + columns - 1) % columns
    }
}
