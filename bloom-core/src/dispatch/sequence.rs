use rand::rngs::StdRng;

use bloom_types::reduce::{reduce, EditContext};
use bloom_types::{DispatchResult, EditKind, NodeId, ProjectState, SequenceAction};

use crate::config::Config;
use crate::handle::SequencerHandle;

pub(super) fn dispatch_sequence(
    node: NodeId,
    action: &SequenceAction,
    project: &mut ProjectState,
    handle: &mut SequencerHandle,
    config: &Config,
    rng: &mut StdRng,
) -> DispatchResult {
    // The key is resolved fresh for every edit so fills follow the hierarchy
    let Some(key) = project.key_for(node) else {
        log::debug!(target: "dispatch", "{:?} for unknown node {}", action, node);
        return DispatchResult::with_not_found();
    };

    match action {
        SequenceAction::Play => {
            handle.start(node);
            return DispatchResult::none();
        }
        SequenceAction::Stop => {
            handle.stop(node);
            return DispatchResult::none();
        }
        _ => {}
    }

    let audible_mutation_seed = handle.audible_mutation_seed(node);
    let Some(target) = project.node_mut(node) else {
        return DispatchResult::with_not_found();
    };
    let mut ctx = EditContext {
        key: &key,
        pitch_range: config.pitch_range(),
        velocity: config.fill_velocity(),
        fill_density: config.fill_density(),
        audible_mutation_seed,
        rng,
    };

    let mut result = DispatchResult::none();
    match reduce(action, &mut target.sequence, &mut ctx) {
        EditKind::None => {}
        EditKind::Param(param) => {
            handle.push_param(node, param);
            result.pushed.push((node, param));
        }
        EditKind::Structural => {
            if let Some(version) = handle.commit(node, &target.sequence, key) {
                result.push_commit(node, version);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloom_audio::testing::{ManualTransport, RecordingEngine};
    use bloom_audio::SequencerHost;
    use bloom_types::{EditPhase, NodeParam, PitchRange};
    use rand::SeedableRng;

    struct Fixture {
        project: ProjectState,
        handle: SequencerHandle,
        host: SequencerHost,
        config: Config,
        rng: StdRng,
        node: NodeId,
    }

    impl Fixture {
        fn new() -> Self {
            let config = Config::default();
            let (mut handle, host) = SequencerHandle::with_host(&config);
            let mut project = ProjectState::new(config.default_key());
            let node = project.add_node();
            let seq = project.node(node).unwrap().sequence.clone();
            handle.add_node(node, &seq, config.default_key());
            Self { project, handle, host, config, rng: StdRng::seed_from_u64(1), node }
        }

        fn run(&mut self, action: SequenceAction) -> DispatchResult {
            dispatch_sequence(
                self.node,
                &action,
                &mut self.project,
                &mut self.handle,
                &self.config,
                &mut self.rng,
            )
        }
    }

    #[test]
    fn unknown_node_is_reported() {
        let mut f = Fixture::new();
        f.node = NodeId::new(40);
        let result = f.run(SequenceAction::ToggleStep { step: 0, pitch: 60 });
        assert!(result.not_found);
        assert!(result.committed.is_empty());
    }

    #[test]
    fn structural_edit_commits_next_version() {
        let mut f = Fixture::new();
        let result = f.run(SequenceAction::ToggleStep { step: 0, pitch: 60 });
        assert_eq!(result.committed, vec![(f.node, 2)]);
        assert_eq!(f.handle.published_version(f.node), Some(2));

        let result = f.run(SequenceAction::ApplyEuclidean {
            pulses: 4,
            rotation: 0,
            pitch_range: Some(PitchRange::new(60, 72)),
        });
        assert_eq!(result.committed, vec![(f.node, 3)]);
        let notes = &f.project.node(f.node).unwrap().sequence.notes;
        assert_eq!(notes.len(), 4);
        assert!(notes.iter().all(|n| n.pitch == 60));
    }

    #[test]
    fn noop_edit_publishes_nothing() {
        let mut f = Fixture::new();
        let result = f.run(SequenceAction::SetNoteVelocity { step: 3, pitch: 60, velocity: 0.2 });
        assert_eq!(result, DispatchResult::none());
        assert_eq!(f.handle.published_version(f.node), Some(1));
    }

    #[test]
    fn drag_pushes_then_release_commits() {
        let mut f = Fixture::new();
        let result = f.run(SequenceAction::SetGlobalProbability {
            value: 0.25,
            phase: EditPhase::Dragging,
        });
        assert_eq!(result.pushed, vec![(f.node, NodeParam::GlobalProbability(0.25))]);
        assert!(result.committed.is_empty());
        assert_eq!(f.handle.published_version(f.node), Some(1));

        let result = f.run(SequenceAction::SetGlobalProbability {
            value: 0.25,
            phase: EditPhase::Commit,
        });
        assert!(result.pushed.is_empty());
        assert_eq!(result.committed, vec![(f.node, 2)]);
    }

    #[test]
    fn play_and_stop_reach_the_driver() {
        let mut f = Fixture::new();
        let mut transport = ManualTransport::default();
        let mut engine = RecordingEngine::default();
        transport.play();

        assert_eq!(f.run(SequenceAction::Play), DispatchResult::none());
        f.host.render(&transport, &mut engine);
        assert!(f.handle.is_playing(f.node));

        f.run(SequenceAction::Stop);
        transport.advance(0.1);
        f.host.render(&transport, &mut engine);
        assert!(!f.handle.is_playing(f.node));
    }

    #[test]
    fn freeze_without_playback_is_noop() {
        let mut f = Fixture::new();
        f.run(SequenceAction::SetMutation(Some(bloom_types::MutationConfig::new(0.5, 2))));
        let result = f.run(SequenceAction::FreezeMutation);
        assert!(result.committed.is_empty());
        assert_eq!(f.project.node(f.node).unwrap().sequence.mutation_seed, None);
    }
}
