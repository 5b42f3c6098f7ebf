//! Dispatch abstraction.

use crate::{Action, DispatchResult};

/// Routes actions into the document model and the playback context.
///
/// The local implementation lives in bloom-core; hosts that embed the core
/// through another transport implement this themselves.
pub trait Dispatcher {
    fn dispatch(&mut self, action: &Action) -> DispatchResult;
}
