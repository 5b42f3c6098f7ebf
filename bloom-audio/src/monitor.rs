use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

const NO_STEP: usize = usize::MAX;

/// Per-node playback position, written by the playback context and read by the
/// edit side. Every field is a plain atomic; readers never block the writer.
#[derive(Debug)]
pub struct NodeMonitor {
    /// Position within the sequence loop, in beats (f64 bits)
    beat: AtomicU64,
    playing: AtomicBool,
    step: AtomicUsize,
    /// Mutation seed of the cycle currently audible
    mutation_seed: AtomicU64,
    has_mutation_seed: AtomicBool,
}

impl Default for NodeMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeMonitor {
    pub fn new() -> Self {
        Self {
            beat: AtomicU64::new(0.0_f64.to_bits()),
            playing: AtomicBool::new(false),
            step: AtomicUsize::new(NO_STEP),
            mutation_seed: AtomicU64::new(0),
            has_mutation_seed: AtomicBool::new(false),
        }
    }

    /// Loop-relative beat (lock-free atomic read)
    pub fn current_beat(&self) -> f64 {
        f64::from_bits(self.beat.load(Ordering::Relaxed))
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    /// Grid column of the most recent boundary. Arp slots report the column
    /// under the playhead, not their pool index.
    pub fn current_step(&self) -> Option<usize> {
        match self.step.load(Ordering::Relaxed) {
            NO_STEP => None,
            step => Some(step),
        }
    }

    pub fn mutation_seed(&self) -> Option<u64> {
        if self.has_mutation_seed.load(Ordering::Acquire) {
            Some(self.mutation_seed.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    pub(crate) fn set_beat(&self, beat: f64) {
        self.beat.store(beat.to_bits(), Ordering::Relaxed);
    }

    pub(crate) fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Relaxed);
        if !playing {
            self.step.store(NO_STEP, Ordering::Relaxed);
            self.has_mutation_seed.store(false, Ordering::Release);
        }
    }

    pub(crate) fn set_step(&self, step: usize) {
        self.step.store(step, Ordering::Relaxed);
    }

    pub(crate) fn set_mutation_seed(&self, seed: Option<u64>) {
        match seed {
            Some(seed) => {
                self.mutation_seed.store(seed, Ordering::Relaxed);
                self.has_mutation_seed.store(true, Ordering::Release);
            }
            None => self.has_mutation_seed.store(false, Ordering::Release),
        }
    }
}
