//! # bloom-audio
//!
//! Playback context of the Bloom sequencer: compiled snapshots, the lock-free
//! handoff from the edit side, per-node drivers, and the traits the external
//! synthesis engine and transport implement.

pub mod accumulator;
pub mod arp_state;
pub mod arpeggiator_tick;
pub mod commands;
pub mod cursor;
pub mod engine;
pub mod handoff;
pub mod host;
pub mod monitor;
pub mod mutation;
pub mod roll;
pub mod sequencer_tick;
pub mod snapshot;
pub mod testing;

pub use commands::PlaybackCmd;
pub use engine::{SynthEngine, Transport};
pub use handoff::{Retired, SnapshotSlot};
pub use host::{HostLink, SequencerHost};
pub use monitor::NodeMonitor;
pub use sequencer_tick::{NodeDriver, PlayState};
pub use snapshot::{CompiledSequence, SequencerEvent};
