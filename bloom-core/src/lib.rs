//! # bloom-core
//!
//! Edit-side library for the Bloom sequencer. Owns configuration, routes
//! actions into the document model, and publishes compiled snapshots to the
//! playback context without ever blocking it.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bloom_core::config::Config;
//! use bloom_core::dispatch::dispatch_action;
//! use bloom_core::handle::SequencerHandle;
//! use bloom_types::{Action, ProjectAction, ProjectState};
//!
//! // 1. Load config and build the handle/host pair
//! let config = Config::load();
//! let (mut handle, mut host) = SequencerHandle::with_host(&config);
//! let mut project = ProjectState::new(config.default_key());
//!
//! // 2. Hand `host` to the audio callback; it calls
//! //    `host.render(&transport, &mut engine)` once per block
//!
//! // 3. Dispatch edits; structural ones publish a new snapshot
//! let result = dispatch_action(&action, &mut project, &mut handle, &config, &mut rng);
//!
//! // 4. Periodically free what playback has retired
//! handle.collect_garbage();
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: Embedded defaults merged with the user's `bloom/config.toml`
//! - [`dispatch`]: Action routing: sequence edits, scale hierarchy, transport
//! - [`handle`]: `SequencerHandle`, the edit side of the snapshot handoff

pub mod config;
pub mod dispatch;
pub mod handle;

pub use bloom_audio::{SequencerHost, SynthEngine, Transport};
pub use bloom_types::{Action, DispatchResult, Dispatcher, ProjectAction, SequenceAction};
pub use handle::SequencerHandle;
