//! Expression tree snapshot and its structural edits.
//!
//! An [`ExpressionTree`] is an ordered forest of [`Node`]s. Subtrees are held in
//! `Arc`s, so cloning a tree is cheap and every edit copies only the nodes on the
//! path from the top level to the edited node. Snapshots handed out earlier keep
//! seeing their own version.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::entities::{Node, NodeId, Operator};
use crate::domain::error::{DomainError, DomainResult};

/// Index path from the top-level sequence down to a node.
///
/// `[2, 0]` is the first child of the third top-level node. The empty path
/// denotes the top-level sequence itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Nesting level, 1 for top-level nodes.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Path of the owning container, `None` for the top-level sequence.
    pub fn parent(&self) -> Option<Self> {
        self.0
            .split_last()
            .map(|(_, parent)| Self(parent.to_vec()))
    }

    /// Strict ancestor test: a path is not its own ancestor.
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Where this path points after the node at `removed` has been detached.
    ///
    /// Later siblings of the removed node (and their descendants) shift left by
    /// one. Must not be called for paths inside the removed subtree.
    fn shifted_after_removal(&self, removed: &NodePath) -> NodePath {
        let Some((&removed_index, removed_parent)) = removed.0.split_last() else {
            return self.clone();
        };
        let level = removed_parent.len();
        let mut indices = self.0.clone();
        if indices.len() > level
            && indices.starts_with(removed_parent)
            && indices[level] > removed_index
        {
            indices[level] -= 1;
        }
        NodePath(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.iter().join("/"))
    }
}

/// What `move` does when the drop target does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownTargetPolicy {
    /// Append the dragged subtree to the first top-level node
    #[default]
    FirstRoot,
    /// Leave the tree unchanged
    Reject,
}

/// Immutable snapshot of a boolean filter expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpressionTree {
    roots: Vec<Arc<Node>>,
}

impl ExpressionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree with a single empty `AND` operator at the top level.
    pub fn with_root(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            roots: vec![Arc::new(Node::operator(id, label, Operator::And, vec![]))],
        }
    }

    /// Demo expression used by the CLI and in tests.
    pub fn sample() -> Self {
        let root = Node::operator(
            "1",
            "Root",
            Operator::And,
            vec![
                Node::criteria("2", "Age > 18"),
                Node::criteria("3", "Location = US"),
                Node::operator(
                    "4",
                    "Subgroup",
                    Operator::Or,
                    vec![
                        Node::criteria("5", "Income > 50000"),
                        Node::criteria("6", "Education = College"),
                    ],
                ),
            ],
        );
        Self {
            roots: vec![Arc::new(root)],
        }
    }

    /// Build a tree from owned nodes, rejecting duplicate identifiers.
    pub fn from_roots(roots: Vec<Node>) -> DomainResult<Self> {
        let tree = Self {
            roots: roots.into_iter().map(Arc::new).collect(),
        };
        tree.validate()?;
        Ok(tree)
    }

    pub fn roots(&self) -> &[Arc<Node>] {
        &self.roots
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.roots.iter().map(|n| n.size()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots.iter().map(|n| n.depth()).max().unwrap_or(0)
    }

    /// Pre-order traversal: top-level order, then children order.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(&self.roots)
    }

    /// All identifiers in pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.iter().map(|(_, node)| node.id().clone()).collect()
    }

    /// Locate a node by id, depth-first, returning the first match.
    #[instrument(level = "trace", skip(self))]
    pub fn locate(&self, id: &NodeId) -> Option<NodePath> {
        let mut path = Vec::new();
        locate_in(&self.roots, id, &mut path).then(|| NodePath(path))
    }

    pub fn get(&self, path: &NodePath) -> Option<&Node> {
        let (first, rest) = path.0.split_first()?;
        let mut node = self.roots.get(*first)?;
        for &index in rest {
            node = node.children().get(index)?;
        }
        Some(node.as_ref())
    }

    pub fn find(&self, id: &NodeId) -> Option<&Node> {
        self.locate(id).and_then(|path| self.get(&path))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.locate(id).is_some()
    }

    /// Owning operator of `id`, `None` if unknown or top-level.
    pub fn parent_of(&self, id: &NodeId) -> Option<&Node> {
        let parent = self.locate(id)?.parent()?;
        self.get(&parent)
    }

    /// Size of the subtree rooted at `id`, including the node itself.
    pub fn subtree_size(&self, id: &NodeId) -> Option<usize> {
        self.find(id).map(|node| node.size())
    }

    /// Check that every identifier occurs exactly once.
    pub fn validate(&self) -> DomainResult<()> {
        let mut seen = HashSet::new();
        for (_, node) in self.iter() {
            if !seen.insert(node.id()) {
                return Err(DomainError::DuplicateId(node.id().clone()));
            }
        }
        Ok(())
    }

    /// Whether `dragged` may be dropped onto `target`.
    ///
    /// True only if both exist, the target is an operator, and the target is
    /// neither the dragged node nor one of its descendants.
    pub fn can_accept(&self, dragged: &NodeId, target: &NodeId) -> bool {
        self.check_drop(dragged, target).is_ok()
    }

    fn check_drop(&self, dragged: &NodeId, target: &NodeId) -> DomainResult<(NodePath, NodePath)> {
        let dragged_path = self
            .locate(dragged)
            .ok_or_else(|| DomainError::UnknownNode(dragged.clone()))?;
        if dragged == target {
            return Err(DomainError::SelfMove(dragged.clone()));
        }
        let target_path = self
            .locate(target)
            .ok_or_else(|| DomainError::UnknownNode(target.clone()))?;
        if dragged_path.is_ancestor_of(&target_path) {
            return Err(DomainError::CycleDetected {
                dragged: dragged.clone(),
                target: target.clone(),
            });
        }
        self.require_operator(&target_path, target)?;
        Ok((dragged_path, target_path))
    }

    fn require_operator(&self, path: &NodePath, id: &NodeId) -> DomainResult<()> {
        match self.get(path) {
            Some(node) if node.is_operator() => Ok(()),
            Some(_) => Err(DomainError::NotAnOperator(id.clone())),
            None => Err(DomainError::UnknownNode(id.clone())),
        }
    }

    /// Reject a new subtree whose ids clash with the tree or with each other.
    fn require_fresh(&self, node: &Arc<Node>) -> DomainResult<()> {
        let mut seen = HashSet::new();
        for (_, candidate) in TreeIterator::new(std::slice::from_ref(node)) {
            if !seen.insert(candidate.id()) || self.contains(candidate.id()) {
                return Err(DomainError::DuplicateId(candidate.id().clone()));
            }
        }
        Ok(())
    }

    /// Run `edit` on a copy and keep the copy only if it succeeds.
    fn commit<T>(&mut self, edit: impl FnOnce(&mut Self) -> DomainResult<T>) -> DomainResult<T> {
        let mut next = self.clone();
        let value = edit(&mut next)?;
        *self = next;
        Ok(value)
    }

    /// Append `node` as the last child of the operator `parent`.
    #[instrument(level = "debug", skip(self, node), fields(new_node = %node.id()))]
    pub fn insert_child(&mut self, parent: &NodeId, node: Node) -> DomainResult<()> {
        let node = Arc::new(node);
        self.require_fresh(&node)?;
        let path = self
            .locate(parent)
            .ok_or_else(|| DomainError::UnknownNode(parent.clone()))?;
        self.require_operator(&path, parent)?;
        self.commit(|tree| tree.attach(&path, node, parent))
    }

    /// Append `node` to the top-level sequence.
    #[instrument(level = "debug", skip(self, node), fields(new_node = %node.id()))]
    pub fn push_root(&mut self, node: Node) -> DomainResult<()> {
        let node = Arc::new(node);
        self.require_fresh(&node)?;
        self.roots.push(node);
        Ok(())
    }

    /// Delete `id` together with its whole subtree, returning the removed subtree.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, id: &NodeId) -> DomainResult<Arc<Node>> {
        let path = self
            .locate(id)
            .ok_or_else(|| DomainError::UnknownNode(id.clone()))?;
        self.commit(|tree| tree.detach(&path, id))
    }

    /// Set the logical operator of an operator node.
    #[instrument(level = "debug", skip(self))]
    pub fn set_operator(&mut self, id: &NodeId, operator: Operator) -> DomainResult<()> {
        let path = self
            .locate(id)
            .ok_or_else(|| DomainError::UnknownNode(id.clone()))?;
        self.require_operator(&path, id)?;
        self.commit(|tree| match node_at(&mut tree.roots, path.indices()) {
            Some(Node::Operator(node)) => {
                node.operator = operator;
                Ok(())
            }
            _ => Err(DomainError::NotAnOperator(id.clone())),
        })
    }

    /// Re-parent `dragged` (with its subtree) as the last child of `target`.
    ///
    /// Self moves, moves into the dragged subtree and drops onto criteria nodes
    /// are rejected. An unknown target is resolved through `policy`.
    #[instrument(level = "debug", skip(self))]
    pub fn move_node(
        &mut self,
        dragged: &NodeId,
        target: &NodeId,
        policy: UnknownTargetPolicy,
    ) -> DomainResult<()> {
        match self.check_drop(dragged, target) {
            Ok((dragged_path, target_path)) => self.commit(|tree| {
                let subtree = tree.detach(&dragged_path, dragged)?;
                let target_path = target_path.shifted_after_removal(&dragged_path);
                tree.attach(&target_path, subtree, target)
            }),
            Err(DomainError::UnknownNode(missing))
                if &missing == target && policy == UnknownTargetPolicy::FirstRoot =>
            {
                debug!("target {} not found, falling back to first top-level node", target);
                self.move_to_first_root(dragged)
            }
            Err(e) => Err(e),
        }
    }

    fn move_to_first_root(&mut self, dragged: &NodeId) -> DomainResult<()> {
        let dragged_path = self
            .locate(dragged)
            .ok_or_else(|| DomainError::UnknownNode(dragged.clone()))?;
        self.commit(|tree| {
            let subtree = tree.detach(&dragged_path, dragged)?;
            let first = NodePath(vec![0]);
            let first_id = match tree.get(&first) {
                Some(node) if node.is_operator() => node.id().clone(),
                _ => return Err(DomainError::NoFallbackTarget(dragged.clone())),
            };
            tree.attach(&first, subtree, &first_id)
        })
    }

    fn detach(&mut self, path: &NodePath, id: &NodeId) -> DomainResult<Arc<Node>> {
        let unknown = || DomainError::UnknownNode(id.clone());
        let (&index, parent) = path.0.split_last().ok_or_else(unknown)?;
        let siblings = children_at(&mut self.roots, parent).ok_or_else(unknown)?;
        if index >= siblings.len() {
            return Err(unknown());
        }
        Ok(siblings.remove(index))
    }

    fn attach(&mut self, parent: &NodePath, node: Arc<Node>, parent_id: &NodeId) -> DomainResult<()> {
        let children = children_at(&mut self.roots, parent.indices())
            .ok_or_else(|| DomainError::NotAnOperator(parent_id.clone()))?;
        children.push(node);
        Ok(())
    }
}

fn locate_in(nodes: &[Arc<Node>], id: &NodeId, path: &mut Vec<usize>) -> bool {
    for (index, node) in nodes.iter().enumerate() {
        path.push(index);
        if node.id() == id || locate_in(node.children(), id, path) {
            return true;
        }
        path.pop();
    }
    false
}

/// Mutable child list of the container at `path`, copying shared nodes on the way.
///
/// `None` if the path leaves the tree or ends on a criteria node.
fn children_at<'a>(children: &'a mut Vec<Arc<Node>>, path: &[usize]) -> Option<&'a mut Vec<Arc<Node>>> {
    match path.split_first() {
        None => Some(children),
        Some((&index, rest)) => match Arc::make_mut(children.get_mut(index)?) {
            Node::Operator(node) => children_at(&mut node.children, rest),
            Node::Criteria(_) => None,
        },
    }
}

fn node_at<'a>(roots: &'a mut Vec<Arc<Node>>, path: &[usize]) -> Option<&'a mut Node> {
    let (&index, parent) = path.split_last()?;
    let siblings = children_at(roots, parent)?;
    Some(Arc::make_mut(siblings.get_mut(index)?))
}

/// Pre-order iterator yielding each node with its path.
pub struct TreeIterator<'a> {
    stack: Vec<(NodePath, &'a Arc<Node>)>,
}

impl<'a> TreeIterator<'a> {
    fn new(roots: &'a [Arc<Node>]) -> Self {
        let stack = roots
            .iter()
            .enumerate()
            .rev()
            .map(|(index, node)| (NodePath(vec![index]), node))
            .collect();
        Self { stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodePath, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for (index, child) in node.children().iter().enumerate().rev() {
            self.stack.push((path.child(index), child));
        }
        Some((path, node.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn given_sample_when_locating_then_returns_index_path() {
        let tree = ExpressionTree::sample();
        assert_eq!(tree.locate(&id("1")), Some(NodePath::new(vec![0])));
        assert_eq!(tree.locate(&id("6")), Some(NodePath::new(vec![0, 2, 1])));
        assert_eq!(tree.locate(&id("missing")), None);
    }

    #[test]
    fn given_paths_when_checking_ancestry_then_strict_prefix_only() {
        let root = NodePath::new(vec![0]);
        let leaf = NodePath::new(vec![0, 2, 1]);
        assert!(root.is_ancestor_of(&leaf));
        assert!(!leaf.is_ancestor_of(&root));
        assert!(!root.is_ancestor_of(&root));
        assert!(!NodePath::new(vec![1]).is_ancestor_of(&leaf));
    }

    #[test]
    fn given_later_sibling_when_earlier_removed_then_index_shifts() {
        let removed = NodePath::new(vec![0, 0]);
        assert_eq!(
            NodePath::new(vec![0, 2, 1]).shifted_after_removal(&removed),
            NodePath::new(vec![0, 1, 1])
        );
        assert_eq!(
            NodePath::new(vec![0]).shifted_after_removal(&removed),
            NodePath::new(vec![0])
        );
        assert_eq!(
            NodePath::new(vec![1, 3]).shifted_after_removal(&removed),
            NodePath::new(vec![1, 3])
        );
    }

    #[test]
    fn given_sample_when_iterating_then_visits_in_preorder() {
        let tree = ExpressionTree::sample();
        let ids: Vec<String> = tree.ids().iter().map(|i| i.to_string()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn given_duplicate_ids_when_building_then_fails() {
        let result = ExpressionTree::from_roots(vec![Node::operator(
            "r",
            "Root",
            Operator::And,
            vec![Node::criteria("x", "A"), Node::criteria("x", "B")],
        )]);
        assert_eq!(result.unwrap_err(), DomainError::DuplicateId(id("x")));
    }

    #[test]
    fn given_edit_when_applied_then_earlier_clone_is_untouched() {
        let mut tree = ExpressionTree::sample();
        let before = tree.clone();
        tree.set_operator(&id("4"), Operator::And).unwrap();

        assert_eq!(before.find(&id("4")).unwrap().logical_operator(), Some(Operator::Or));
        assert_eq!(tree.find(&id("4")).unwrap().logical_operator(), Some(Operator::And));
        // Untouched siblings stay shared between the two snapshots
        let old_age = &before.roots()[0].children()[0];
        let new_age = &tree.roots()[0].children()[0];
        assert!(Arc::ptr_eq(old_age, new_age));
    }

    #[test]
    fn given_failed_move_then_tree_is_unchanged() {
        let mut tree = ExpressionTree::sample();
        let before = tree.clone();
        let err = tree
            .move_node(&id("1"), &id("4"), UnknownTargetPolicy::FirstRoot)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::CycleDetected {
                dragged: id("1"),
                target: id("4")
            }
        );
        assert_eq!(tree, before);
    }

    #[test]
    fn given_only_root_dragged_to_unknown_target_then_no_fallback() {
        let mut tree = ExpressionTree::with_root("r", "Root");
        let err = tree
            .move_node(&id("r"), &id("nowhere"), UnknownTargetPolicy::FirstRoot)
            .unwrap_err();
        assert_eq!(err, DomainError::NoFallbackTarget(id("r")));
        assert_eq!(tree, ExpressionTree::with_root("r", "Root"));
    }

    #[test]
    fn given_fresh_subtree_with_clashing_id_when_inserting_then_rejected() {
        let mut tree = ExpressionTree::sample();
        let err = tree
            .insert_child(&id("1"), Node::criteria("5", "clash"))
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateId(id("5")));
    }
}
