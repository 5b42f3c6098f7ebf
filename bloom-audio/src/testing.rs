//! In-memory engine and transport for exercising playback without audio I/O.

use bloom_types::{NodeId, NodeParam};

use crate::engine::{SynthEngine, Transport};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    NoteOn { node: NodeId, pitch: u8, velocity: f32, beat: f64 },
    NoteOff { node: NodeId, pitch: u8, beat: f64 },
    Param { node: NodeId, param: NodeParam },
}

/// Records every call in order.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub events: Vec<EngineEvent>,
}

impl RecordingEngine {
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// (pitch, beat) of every note-on
    pub fn note_ons(&self) -> Vec<(u8, f64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::NoteOn { pitch, beat, .. } => Some((*pitch, *beat)),
                _ => None,
            })
            .collect()
    }

    /// (pitch, beat) of every note-off
    pub fn note_offs(&self) -> Vec<(u8, f64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::NoteOff { pitch, beat, .. } => Some((*pitch, *beat)),
                _ => None,
            })
            .collect()
    }

    pub fn params(&self) -> Vec<(NodeId, NodeParam)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Param { node, param } => Some((*node, *param)),
                _ => None,
            })
            .collect()
    }

    /// Pitches with more ons than offs, sorted.
    pub fn held_notes(&self) -> Vec<u8> {
        let mut balance = [0i32; 128];
        for e in &self.events {
            match e {
                EngineEvent::NoteOn { pitch, .. } => balance[*pitch as usize & 127] += 1,
                EngineEvent::NoteOff { pitch, .. } => balance[*pitch as usize & 127] -= 1,
                EngineEvent::Param { .. } => {}
            }
        }
        (0..128u8).filter(|&p| balance[p as usize] > 0).collect()
    }
}

impl SynthEngine for RecordingEngine {
    fn note_on(&mut self, node: NodeId, pitch: u8, velocity: f32, beat: f64) {
        self.events.push(EngineEvent::NoteOn { node, pitch, velocity, beat });
    }

    fn note_off(&mut self, node: NodeId, pitch: u8, beat: f64) {
        self.events.push(EngineEvent::NoteOff { node, pitch, beat });
    }

    fn set_param(&mut self, node: NodeId, param: NodeParam) {
        self.events.push(EngineEvent::Param { node, param });
    }
}

/// Transport driven by hand.
#[derive(Debug, Clone)]
pub struct ManualTransport {
    pub beat: f64,
    pub bpm: f64,
    pub playing: bool,
}

impl Default for ManualTransport {
    fn default() -> Self {
        Self { beat: 0.0, bpm: 120.0, playing: false }
    }
}

impl ManualTransport {
    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn advance(&mut self, beats: f64) {
        self.beat += beats;
    }

    pub fn seek(&mut self, beat: f64) {
        self.beat = beat;
    }
}

impl Transport for ManualTransport {
    fn bpm(&self) -> f64 {
        self.bpm
    }

    fn current_beat(&self) -> f64 {
        self.beat
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
