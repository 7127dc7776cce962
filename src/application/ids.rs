//! Identifier generation for new nodes

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::IdSettings;
use crate::domain::NodeId;

/// Source of identifiers for newly created nodes.
///
/// Implementations must not repeat an id within the process lifetime.
pub trait IdGenerator {
    fn next_id(&mut self) -> NodeId;
}

/// Monotonic counter, optionally prefixed: `n1`, `n2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Default)]
pub struct UuidIds {
    prefix: String,
}

impl UuidIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> NodeId {
        NodeId::new(format!("{}{}", self.prefix, Uuid::new_v4()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    #[default]
    Sequential,
    Uuid,
}

/// Build the generator selected in the settings.
pub fn generator_for(settings: &IdSettings) -> Box<dyn IdGenerator> {
    match settings.strategy {
        IdStrategy::Sequential => Box::new(SequentialIds::new(settings.prefix.clone())),
        IdStrategy::Uuid => Box::new(UuidIds::new(settings.prefix.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn given_sequential_ids_then_counts_up_with_prefix() {
        let mut ids = SequentialIds::new("n");
        assert_eq!(ids.next_id(), NodeId::from("n1"));
        assert_eq!(ids.next_id(), NodeId::from("n2"));
    }

    #[test]
    fn given_rapid_uuid_generation_then_never_repeats() {
        let mut ids = UuidIds::default();
        let generated: HashSet<NodeId> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(generated.len(), 1000);
    }

    #[test]
    fn given_uuid_strategy_when_building_generator_then_keeps_prefix() {
        let settings = IdSettings {
            strategy: IdStrategy::Uuid,
            prefix: "crit-".to_string(),
        };
        let id = generator_for(&settings).next_id();
        assert!(id.as_str().starts_with("crit-"));
        assert_eq!(id.as_str().len(), "crit-".len() + 36);
    }
}
