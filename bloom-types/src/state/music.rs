use serde::{Deserialize, Serialize};

/// Musical key (pitch class)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl Key {
    pub const ALL: [Key; 12] = [
        Key::C,
        Key::Cs,
        Key::D,
        Key::Ds,
        Key::E,
        Key::F,
        Key::Fs,
        Key::G,
        Key::Gs,
        Key::A,
        Key::As,
        Key::B,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Key::C => "C",
            Key::Cs => "C#",
            Key::D => "D",
            Key::Ds => "D#",
            Key::E => "E",
            Key::F => "F",
            Key::Fs => "F#",
            Key::G => "G",
            Key::Gs => "G#",
            Key::A => "A",
            Key::As => "A#",
            Key::B => "B",
        }
    }

    /// Pitch class of this key (0 = C)
    pub fn semitone(&self) -> u8 {
        match self {
            Key::C => 0,
            Key::Cs => 1,
            Key::D => 2,
            Key::Ds => 3,
            Key::E => 4,
            Key::F => 5,
            Key::Fs => 6,
            Key::G => 7,
            Key::Gs => 8,
            Key::A => 9,
            Key::As => 10,
            Key::B => 11,
        }
    }

    pub fn from_name(s: &str) -> Option<Key> {
        match s {
            "C" => Some(Key::C),
            "C#" | "Cs" | "Db" => Some(Key::Cs),
            "D" => Some(Key::D),
            "D#" | "Ds" | "Eb" => Some(Key::Ds),
            "E" => Some(Key::E),
            "F" => Some(Key::F),
            "F#" | "Fs" | "Gb" => Some(Key::Fs),
            "G" => Some(Key::G),
            "G#" | "Gs" | "Ab" => Some(Key::Gs),
            "A" => Some(Key::A),
            "A#" | "As" | "Bb" => Some(Key::As),
            "B" => Some(Key::B),
            _ => None,
        }
    }
}

/// Scale preset as intervals from root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scale {
    Major,
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
    Pentatonic,
    Blues,
    Chromatic,
}

impl Scale {
    pub const ALL: [Scale; 11] = [
        Scale::Major,
        Scale::Minor,
        Scale::Dorian,
        Scale::Phrygian,
        Scale::Lydian,
        Scale::Mixolydian,
        Scale::Aeolian,
        Scale::Locrian,
        Scale::Pentatonic,
        Scale::Blues,
        Scale::Chromatic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scale::Major => "Major",
            Scale::Minor => "Minor",
            Scale::Dorian => "Dorian",
            Scale::Phrygian => "Phrygian",
            Scale::Lydian => "Lydian",
            Scale::Mixolydian => "Mixolydian",
            Scale::Aeolian => "Aeolian",
            Scale::Locrian => "Locrian",
            Scale::Pentatonic => "Pentatonic",
            Scale::Blues => "Blues",
            Scale::Chromatic => "Chromatic",
        }
    }

    /// Semitone intervals from root for this scale
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Scale::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Scale::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            Scale::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Scale::Aeolian => &[0, 2, 3, 5, 7, 8, 10],
            Scale::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            Scale::Pentatonic => &[0, 2, 4, 7, 9],
            Scale::Blues => &[0, 3, 5, 6, 7, 10],
            Scale::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }

    pub fn from_name(s: &str) -> Option<Scale> {
        Scale::ALL
            .iter()
            .copied()
            .find(|scale| scale.name().eq_ignore_ascii_case(s))
    }
}

/// A resolved key: root pitch class plus the interval set of its mode.
///
/// Scale degrees are counted from the root of octave 0, so degree `d` maps to
/// `root + 12 * (d / len) + intervals[d % len]`. Negative degrees lie below the
/// root of octave 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicalKey {
    pub root: u8,
    pub intervals: Vec<u8>,
}

impl MusicalKey {
    pub fn new(root: Key, scale: Scale) -> Self {
        Self {
            root: root.semitone(),
            intervals: scale.intervals().to_vec(),
        }
    }

    /// Build a key from an arbitrary interval set. Intervals are reduced mod 12,
    /// sorted and deduplicated; the root is reduced mod 12.
    pub fn custom(root: u8, intervals: impl IntoIterator<Item = i32>) -> Self {
        let mut intervals: Vec<u8> = intervals
            .into_iter()
            .map(|i| i.rem_euclid(12) as u8)
            .collect();
        intervals.sort_unstable();
        intervals.dedup();
        Self {
            root: root % 12,
            intervals,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    fn relative(&self, pitch: i32) -> i32 {
        pitch - self.root as i32
    }

    /// Whether `pitch` belongs to this key's interval set.
    pub fn contains(&self, pitch: u8) -> bool {
        let pc = self.relative(pitch as i32).rem_euclid(12) as u8;
        self.intervals.binary_search(&pc).is_ok()
    }

    /// Scale degree of the highest in-scale pitch at or below `pitch`.
    pub fn degree_of(&self, pitch: u8) -> Option<i32> {
        let len = self.intervals.len() as i32;
        if len == 0 {
            return None;
        }
        let rel = self.relative(pitch as i32);
        let octave = rel.div_euclid(12);
        let pc = rel.rem_euclid(12) as u8;
        let degree = match self.intervals.iter().rposition(|&i| i <= pc) {
            Some(idx) => octave * len + idx as i32,
            // Below the lowest interval: last degree of the previous octave.
            None => octave * len - 1,
        };
        Some(degree)
    }

    /// MIDI pitch of a scale degree. May fall outside 0-127.
    pub fn pitch_of_degree(&self, degree: i32) -> Option<i32> {
        let len = self.intervals.len() as i32;
        if len == 0 {
            return None;
        }
        let octave = degree.div_euclid(len);
        let idx = degree.rem_euclid(len) as usize;
        Some(self.root as i32 + octave * 12 + self.intervals[idx] as i32)
    }

    /// Snap `pitch` down to the nearest in-scale pitch, staying in MIDI range.
    pub fn snap_down(&self, pitch: u8) -> Option<u8> {
        let degree = self.degree_of(pitch)?;
        let mut snapped = self.pitch_of_degree(degree)?;
        if snapped < 0 {
            snapped = self.pitch_of_degree(degree + 1)?;
        }
        u8::try_from(snapped).ok().filter(|p| *p <= 127)
    }

    /// All in-scale pitches within `range`, ascending.
    pub fn pitches_in(&self, range: PitchRange) -> Vec<u8> {
        (range.low..=range.high)
            .filter(|&p| self.contains(p))
            .collect()
    }
}

impl Default for MusicalKey {
    fn default() -> Self {
        Self::new(Key::C, Scale::Major)
    }
}

/// Inclusive MIDI pitch range used by fill algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchRange {
    pub low: u8,
    pub high: u8,
}

impl PitchRange {
    /// Build a range, clamping to 0-127 and swapping reversed bounds.
    pub fn new(a: u8, b: u8) -> Self {
        let (a, b) = (a.min(127), b.min(127));
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn contains(&self, pitch: u8) -> bool {
        (self.low..=self.high).contains(&pitch)
    }
}

impl Default for PitchRange {
    fn default() -> Self {
        Self { low: 48, high: 72 }
    }
}
