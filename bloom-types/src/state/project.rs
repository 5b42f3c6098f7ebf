//! Minimal document model: nodes, trees and the project-wide key.

use serde::{Deserialize, Serialize};

use super::music::MusicalKey;
use super::sequence::NoteSequence;
use crate::{NodeId, TreeId};

/// A sequencer node on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub sequence: NoteSequence,
    /// Node-level key, wins over tree and project keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_override: Option<MusicalKey>,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            name: format!("Node {}", id.get()),
            sequence: NoteSequence::default(),
            scale_override: None,
        }
    }
}

/// A group of connected nodes that may share a scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub id: TreeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<MusicalKey>,
    pub members: Vec<NodeId>,
}

impl Tree {
    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }
}

/// Resolve the effective key for a node.
///
/// Precedence: node override, then the tree's scale, then the project key.
pub fn resolve_key(node: &Node, tree: Option<&Tree>, project: &ProjectState) -> MusicalKey {
    if let Some(key) = &node.scale_override {
        return key.clone();
    }
    if let Some(key) = tree.and_then(|t| t.scale.as_ref()) {
        return key.clone();
    }
    project.global_key.clone()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub global_key: MusicalKey,
    pub nodes: Vec<Node>,
    pub trees: Vec<Tree>,
    pub next_node_id: u32,
    pub next_tree_id: u32,
}

impl ProjectState {
    pub fn new(global_key: MusicalKey) -> Self {
        Self {
            global_key,
            nodes: Vec::new(),
            trees: Vec::new(),
            next_node_id: 1,
            next_tree_id: 1,
        }
    }

    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        self.nodes.push(Node::new(id));
        id
    }

    /// Remove a node and its tree memberships. Returns the removed node.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let pos = self.nodes.iter().position(|n| n.id == id)?;
        for tree in &mut self.trees {
            tree.members.retain(|&m| m != id);
        }
        Some(self.nodes.remove(pos))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn add_tree(&mut self, scale: Option<MusicalKey>, members: Vec<NodeId>) -> TreeId {
        let id = TreeId::new(self.next_tree_id);
        self.next_tree_id += 1;
        self.trees.push(Tree { id, scale, members });
        id
    }

    pub fn tree_mut(&mut self, id: TreeId) -> Option<&mut Tree> {
        self.trees.iter_mut().find(|t| t.id == id)
    }

    /// First tree (in project order) that contains `node`.
    pub fn tree_of(&self, node: NodeId) -> Option<&Tree> {
        self.trees.iter().find(|t| t.contains(node))
    }

    /// Effective key for a node, or `None` if the node does not exist.
    pub fn key_for(&self, id: NodeId) -> Option<MusicalKey> {
        let node = self.node(id)?;
        Some(resolve_key(node, self.tree_of(id), self))
    }
}

impl Default for ProjectState {
    fn default() -> Self {
        Self::new(MusicalKey::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::music::{Key, Scale};

    #[test]
    fn falls_back_to_project_key() {
        let mut project = ProjectState::new(MusicalKey::new(Key::E, Scale::Minor));
        let id = project.add_node();
        assert_eq!(project.key_for(id), Some(MusicalKey::new(Key::E, Scale::Minor)));
    }

    #[test]
    fn tree_scale_beats_project_key() {
        let mut project = ProjectState::default();
        let id = project.add_node();
        project.add_tree(Some(MusicalKey::new(Key::G, Scale::Dorian)), vec![id]);
        assert_eq!(project.key_for(id), Some(MusicalKey::new(Key::G, Scale::Dorian)));
    }

    #[test]
    fn tree_without_scale_falls_through() {
        let mut project = ProjectState::default();
        let id = project.add_node();
        project.add_tree(None, vec![id]);
        assert_eq!(project.key_for(id), Some(MusicalKey::default()));
    }

    #[test]
    fn node_override_wins() {
        let mut project = ProjectState::default();
        let id = project.add_node();
        project.add_tree(Some(MusicalKey::new(Key::G, Scale::Dorian)), vec![id]);
        project.node_mut(id).unwrap().scale_override = Some(MusicalKey::new(Key::A, Scale::Blues));
        assert_eq!(project.key_for(id), Some(MusicalKey::new(Key::A, Scale::Blues)));
    }

    #[test]
    fn first_tree_is_used() {
        let mut project = ProjectState::default();
        let id = project.add_node();
        project.add_tree(Some(MusicalKey::new(Key::D, Scale::Lydian)), vec![id]);
        project.add_tree(Some(MusicalKey::new(Key::F, Scale::Locrian)), vec![id]);
        assert_eq!(project.key_for(id), Some(MusicalKey::new(Key::D, Scale::Lydian)));
    }

    #[test]
    fn missing_node_has_no_key() {
        let project = ProjectState::default();
        assert_eq!(project.key_for(NodeId::new(42)), None);
    }

    #[test]
    fn remove_node_drops_memberships() {
        let mut project = ProjectState::default();
        let a = project.add_node();
        let b = project.add_node();
        let tree = project.add_tree(None, vec![a, b]);
        assert!(project.remove_node(a).is_some());
        assert!(project.remove_node(a).is_none());
        assert_eq!(project.tree_mut(tree).unwrap().members, vec![b]);
    }
}
