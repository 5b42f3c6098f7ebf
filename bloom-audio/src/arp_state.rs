/// Arpeggiator play state, tracked on the playback side.
#[derive(Debug, Clone)]
pub struct ArpPlayState {
    pub step_index: Option<usize>, // Position in the note pool (None before the first slot)
    pub ascending: bool,           // For UpDown / DownUp direction tracking
    pub pass: Option<u64>,         // Sequence pass the previous slot fell in
}

impl Default for ArpPlayState {
    fn default() -> Self {
        Self {
            step_index: None,
            ascending: true,
            pass: None,
        }
    }
}

impl ArpPlayState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record the sequence pass of a slot at `beat`. True when it starts a new pass.
    pub fn enter_pass(&mut self, beat: f64, length_in_beats: f64) -> bool {
        let pass = if length_in_beats > 0.0 {
            (beat / length_in_beats).floor().max(0.0) as u64
        } else {
            0
        };
        let wrapped = matches!(self.pass, Some(prev) if prev != pass);
        self.pass = Some(pass);
        wrapped
    }
}
