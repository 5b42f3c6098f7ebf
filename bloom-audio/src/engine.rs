use bloom_types::{NodeId, NodeParam};

/// Sink for the notes and parameters a node produces. The synthesis engine
/// lives outside this crate; beats are absolute transport positions.
pub trait SynthEngine {
    fn note_on(&mut self, node: NodeId, pitch: u8, velocity: f32, beat: f64);
    fn note_off(&mut self, node: NodeId, pitch: u8, beat: f64);
    fn set_param(&mut self, node: NodeId, param: NodeParam);
}

/// Read-only view of the external transport clock.
pub trait Transport {
    fn bpm(&self) -> f64;
    fn current_beat(&self) -> f64;
    fn is_playing(&self) -> bool;
}
