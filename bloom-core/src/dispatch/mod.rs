mod local;
mod project;
mod sequence;

pub use local::LocalDispatcher;

use rand::rngs::StdRng;

use bloom_types::{Action, DispatchResult, ProjectState};

use crate::config::Config;
use crate::handle::SequencerHandle;

/// Dispatch an action against the project and the playback context.
///
/// The project is edited in place; the handle receives whatever the edit needs
/// on the playback side (a fresh snapshot, a parameter push, a start/stop).
pub fn dispatch_action(
    action: &Action,
    project: &mut ProjectState,
    handle: &mut SequencerHandle,
    config: &Config,
    rng: &mut StdRng,
) -> DispatchResult {
    match action {
        Action::Sequence { node, action } => {
            sequence::dispatch_sequence(*node, action, project, handle, config, rng)
        }
        Action::Project(a) => project::dispatch_project(a, project, handle),
        Action::None => DispatchResult::none(),
    }
}
