//! Expression tree store
//!
//! Owns the current snapshot, applies structural edits and notifies subscribers
//! with the resulting snapshot after every call.

use std::fmt;

use tracing::{debug, info, instrument};

use crate::application::command::EditCommand;
use crate::application::ids::{generator_for, IdGenerator};
use crate::config::{LabelSettings, Settings};
use crate::domain::{
    DomainError, DomainResult, ExpressionTree, Node, NodeId, Operator, UnknownTargetPolicy,
};

/// Result of an edit request. Rejections are no-ops, not failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The tree changed
    Applied,
    /// A node was added under the given id
    Created(NodeId),
    /// The tree is unchanged
    Rejected(DomainError),
}

impl EditOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, EditOutcome::Rejected(_))
    }

    pub fn created_id(&self) -> Option<&NodeId> {
        match self {
            EditOutcome::Created(id) => Some(id),
            _ => None,
        }
    }

    pub fn rejection(&self) -> Option<&DomainError> {
        match self {
            EditOutcome::Rejected(e) => Some(e),
            _ => None,
        }
    }

    /// Turn a rejection into an error, for callers that treat no-ops as failures.
    pub fn into_result(self) -> DomainResult<Self> {
        match self {
            EditOutcome::Rejected(e) => Err(e),
            outcome => Ok(outcome),
        }
    }

    fn from_result(result: DomainResult<()>) -> Self {
        match result {
            Ok(()) => EditOutcome::Applied,
            Err(e) => EditOutcome::Rejected(e),
        }
    }
}

impl fmt::Display for EditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditOutcome::Applied => write!(f, "applied"),
            EditOutcome::Created(id) => write!(f, "created {}", id),
            EditOutcome::Rejected(e) => write!(f, "rejected: {}", e),
        }
    }
}

/// Handle returned by [`ExpressionStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&ExpressionTree)>;

/// Single owner of the canonical expression tree.
///
/// Every edit runs to completion before returning; readers only ever see whole
/// snapshots.
pub struct ExpressionStore {
    tree: ExpressionTree,
    ids: Box<dyn IdGenerator>,
    labels: LabelSettings,
    unknown_target: UnknownTargetPolicy,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl fmt::Debug for ExpressionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionStore")
            .field("tree", &self.tree)
            .field("labels", &self.labels)
            .field("unknown_target", &self.unknown_target)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ExpressionStore {
    /// Create a store over `tree`, with the id strategy from `settings`.
    pub fn new(tree: ExpressionTree, settings: &Settings) -> Self {
        Self::with_id_generator(tree, settings, generator_for(&settings.ids))
    }

    pub fn with_id_generator(
        tree: ExpressionTree,
        settings: &Settings,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        Self {
            tree,
            ids,
            labels: settings.labels.clone(),
            unknown_target: settings.moves.unknown_target,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Store holding a single empty root operator labelled from the settings.
    pub fn with_empty_root(settings: &Settings) -> Self {
        let mut ids = generator_for(&settings.ids);
        let tree = ExpressionTree::with_root(ids.next_id(), settings.labels.root.clone());
        Self::with_id_generator(tree, settings, ids)
    }

    pub fn tree(&self) -> &ExpressionTree {
        &self.tree
    }

    /// Current snapshot; cheap, shares structure with the store.
    pub fn snapshot(&self) -> ExpressionTree {
        self.tree.clone()
    }

    /// Register a callback receiving the snapshot after every edit call.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&ExpressionTree) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        debug!("subscribe: {:?}, {} active", id, self.subscribers.len());
        id
    }

    /// Stop notifications for `id`. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        before != self.subscribers.len()
    }

    /// Drop predicate for hover highlighting; never changes the tree.
    pub fn can_accept(&self, dragged: &NodeId, target: &NodeId) -> bool {
        self.tree.can_accept(dragged, target)
    }

    /// Re-parent `dragged` under `target` (see [`ExpressionTree::move_node`]).
    #[instrument(level = "debug", skip(self))]
    pub fn move_node(&mut self, dragged: &NodeId, target: &NodeId) -> EditOutcome {
        let result = self.tree.move_node(dragged, target, self.unknown_target);
        self.publish(EditOutcome::from_result(result))
    }

    /// Append a new criteria leaf to the operator `parent`.
    #[instrument(level = "debug", skip(self))]
    pub fn add_criteria(&mut self, parent: &NodeId) -> EditOutcome {
        let outcome = match self.fresh_id() {
            Ok(id) => {
                let node = Node::criteria(id.clone(), self.labels.criteria.clone());
                match self.tree.insert_child(parent, node) {
                    Ok(()) => EditOutcome::Created(id),
                    Err(e) => EditOutcome::Rejected(e),
                }
            }
            Err(e) => EditOutcome::Rejected(e),
        };
        self.publish(outcome)
    }

    /// Append a new empty `AND` operator under `parent`, or at the top level.
    #[instrument(level = "debug", skip(self))]
    pub fn add_operator(&mut self, parent: Option<&NodeId>) -> EditOutcome {
        let outcome = match self.fresh_id() {
            Ok(id) => {
                let node = Node::operator(
                    id.clone(),
                    self.labels.operator.clone(),
                    Operator::And,
                    vec![],
                );
                let result = match parent {
                    Some(parent) => self.tree.insert_child(parent, node),
                    None => self.tree.push_root(node),
                };
                match result {
                    Ok(()) => EditOutcome::Created(id),
                    Err(e) => EditOutcome::Rejected(e),
                }
            }
            Err(e) => EditOutcome::Rejected(e),
        };
        self.publish(outcome)
    }

    /// Delete `id` and its whole subtree, operator or criteria alike.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_node(&mut self, id: &NodeId) -> EditOutcome {
        let result = self.tree.remove(id).map(|removed| {
            debug!("removed {} node(s) under {}", removed.size(), id);
        });
        self.publish(EditOutcome::from_result(result))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn change_operator(&mut self, id: &NodeId, operator: Operator) -> EditOutcome {
        let result = self.tree.set_operator(id, operator);
        self.publish(EditOutcome::from_result(result))
    }

    /// Dispatch a single edit request.
    pub fn apply(&mut self, command: &EditCommand) -> EditOutcome {
        match command {
            EditCommand::Move { dragged, target } => self.move_node(dragged, target),
            EditCommand::AddCriteria { parent } => self.add_criteria(parent),
            EditCommand::AddOperator { parent } => self.add_operator(parent.as_ref()),
            EditCommand::Remove { node } => self.remove_node(node),
            EditCommand::ChangeOperator { node, operator } => {
                self.change_operator(node, *operator)
            }
        }
    }

    /// Next generated id not already present in the tree.
    ///
    /// Seeded trees may already use ids the generator produces; a generator
    /// yielding distinct ids finds a free one within `len + 1` attempts.
    fn fresh_id(&mut self) -> DomainResult<NodeId> {
        let mut last = None;
        for _ in 0..=self.tree.len() {
            let id = self.ids.next_id();
            if !self.tree.contains(&id) {
                return Ok(id);
            }
            debug!("skipping generated id {}: already in tree", id);
            last = Some(id);
        }
        Err(DomainError::DuplicateId(
            last.unwrap_or_else(|| NodeId::new("")),
        ))
    }

    fn publish(&mut self, outcome: EditOutcome) -> EditOutcome {
        match &outcome {
            EditOutcome::Rejected(e) => debug!("edit rejected: {}", e),
            applied => info!("edit {}: {} nodes", applied, self.tree.len()),
        }
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&self.tree);
        }
        outcome
    }
}
