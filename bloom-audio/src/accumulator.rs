use bloom_types::{AccumulatorConfig, AccumulatorMode, AccumulatorTarget};

/// Smallest gate, as a fraction of the authored gate, an accumulator can shrink to.
const MIN_GATE_FRACTION: f64 = 0.05;

/// Running offset of a node's accumulator. Lives in the playback context only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccumulatorState {
    pub offset: f64,
}

impl AccumulatorState {
    pub fn reset(&mut self) {
        self.offset = 0.0;
    }

    /// Step the offset by one completed cycle.
    pub fn advance(&mut self, config: &AccumulatorConfig) {
        self.offset = bound(self.offset + config.amount, config);
    }
}

fn bound(value: f64, config: &AccumulatorConfig) -> f64 {
    let limit = config.limit;
    if limit.is_nan() || limit <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    match config.mode {
        AccumulatorMode::Clamp => value.clamp(-limit, limit),
        AccumulatorMode::Wrap => (value + limit).rem_euclid(2.0 * limit) - limit,
    }
}

/// Per-trigger parameters the accumulator may drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerParams {
    pub pitch: u8,
    pub velocity: f32,
    pub probability: f32,
    /// Note length in beats
    pub gate: f64,
}

impl TriggerParams {
    pub fn apply(self, target: AccumulatorTarget, offset: f64) -> Self {
        if offset == 0.0 {
            return self;
        }
        match target {
            AccumulatorTarget::Pitch => {
                let pitch = (self.pitch as f64 + offset.round()).clamp(0.0, 127.0);
                Self { pitch: pitch as u8, ..self }
            }
            AccumulatorTarget::Velocity => Self {
                velocity: (self.velocity as f64 + offset).clamp(0.0, 1.0) as f32,
                ..self
            },
            AccumulatorTarget::Probability => Self {
                probability: (self.probability as f64 + offset).clamp(0.0, 1.0) as f32,
                ..self
            },
            AccumulatorTarget::Gate => Self {
                gate: (self.gate * (1.0 + offset)).max(self.gate * MIN_GATE_FRACTION),
                ..self
            },
        }
    }
}
