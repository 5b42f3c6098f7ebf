use bloom_types::{DispatchResult, MusicalKey, NodeId, ProjectAction, ProjectState};

use crate::handle::SequencerHandle;

pub(super) fn dispatch_project(
    action: &ProjectAction,
    project: &mut ProjectState,
    handle: &mut SequencerHandle,
) -> DispatchResult {
    match action {
        ProjectAction::AddNode => {
            let id = project.add_node();
            if let (Some(node), Some(key)) = (project.node(id), project.key_for(id)) {
                handle.add_node(id, &node.sequence, key);
            }
            log::debug!(target: "dispatch", "added node {}", id);
            DispatchResult { added_node: Some(id), ..DispatchResult::none() }
        }
        ProjectAction::RemoveNode(id) => {
            if project.remove_node(*id).is_none() {
                return DispatchResult::with_not_found();
            }
            handle.remove_node(*id);
            DispatchResult::none()
        }
        ProjectAction::SetGlobalKey(key) => {
            let before = resolved_keys(project);
            project.global_key = key.clone();
            recommit_changed(project, handle, before)
        }
        ProjectAction::SetNodeScale { node, scale } => {
            let before = resolved_keys(project);
            let Some(target) = project.node_mut(*node) else {
                return DispatchResult::with_not_found();
            };
            target.scale_override = scale.clone();
            recommit_changed(project, handle, before)
        }
        ProjectAction::AddTree { scale, members } => {
            let before = resolved_keys(project);
            let members: Vec<NodeId> = members
                .iter()
                .copied()
                .filter(|&m| project.node(m).is_some())
                .collect();
            let tree = project.add_tree(scale.clone(), members);
            let mut result = recommit_changed(project, handle, before);
            result.added_tree = Some(tree);
            result
        }
        ProjectAction::SetTreeScale { tree, scale } => {
            let before = resolved_keys(project);
            let Some(target) = project.tree_mut(*tree) else {
                return DispatchResult::with_not_found();
            };
            target.scale = scale.clone();
            recommit_changed(project, handle, before)
        }
    }
}

fn resolved_keys(project: &ProjectState) -> Vec<(NodeId, MusicalKey)> {
    project
        .nodes
        .iter()
        .filter_map(|n| project.key_for(n.id).map(|k| (n.id, k)))
        .collect()
}

/// Recompile every node whose effective key differs from `before`.
fn recommit_changed(
    project: &ProjectState,
    handle: &mut SequencerHandle,
    before: Vec<(NodeId, MusicalKey)>,
) -> DispatchResult {
    let mut result = DispatchResult::none();
    for (id, old) in before {
        let (Some(node), Some(key)) = (project.node(id), project.key_for(id)) else {
            continue;
        };
        if key == old {
            continue;
        }
        if let Some(version) = handle.commit(id, &node.sequence, key) {
            result.push_commit(id, version);
        }
    }
    result
}
