//! Pure state-mutation reducers for the Bloom sequencer.
//!
//! These functions are the single source of truth for action → sequence
//! mutations. bloom-core dispatch calls into this module and decides, from the
//! returned `EditKind`, how the change reaches the playback context.
//!
//! Reducers are pure: they mutate a `NoteSequence` only. They do NOT:
//! - Compile snapshots
//! - Send playback commands
//! - Resolve keys (the caller passes a freshly resolved key in)

mod sequence;

pub use sequence::{reduce, EditContext};
