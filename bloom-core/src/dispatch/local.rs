//! LocalDispatcher: Dispatcher implementation for in-process editing.

use rand::rngs::StdRng;

use bloom_types::{Action, DispatchResult, Dispatcher, ProjectState};

use crate::config::Config;
use crate::handle::SequencerHandle;

use super::dispatch_action;

/// Borrows everything an edit touches for the duration of a dispatch.
pub struct LocalDispatcher<'a> {
    pub project: &'a mut ProjectState,
    pub handle: &'a mut SequencerHandle,
    pub config: &'a Config,
    pub rng: &'a mut StdRng,
}

impl<'a> LocalDispatcher<'a> {
    pub fn new(
        project: &'a mut ProjectState,
        handle: &'a mut SequencerHandle,
        config: &'a Config,
        rng: &'a mut StdRng,
    ) -> Self {
        Self { project, handle, config, rng }
    }
}

impl<'a> Dispatcher for LocalDispatcher<'a> {
    fn dispatch(&mut self, action: &Action) -> DispatchResult {
        dispatch_action(action, self.project, self.handle, self.config, self.rng)
    }
}
