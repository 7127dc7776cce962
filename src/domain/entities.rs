//! Domain entities: core data structures

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier of a node, unique across the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Logical combinator of an operator node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    #[default]
    And,
    Or,
}

impl Operator {
    pub fn toggled(self) -> Self {
        match self {
            Operator::And => Operator::Or,
            Operator::Or => Operator::And,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::And => f.write_str("AND"),
            Operator::Or => f.write_str("OR"),
        }
    }
}

/// Error returned when parsing an operator that is neither `AND` nor `OR`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid operator '{0}', expected AND or OR")]
pub struct ParseOperatorError(pub String);

impl FromStr for Operator {
    type Err = ParseOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Operator::And),
            "OR" => Ok(Operator::Or),
            _ => Err(ParseOperatorError(s.to_string())),
        }
    }
}

/// Discriminant of [`Node`], for consumers that only need the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Operator,
    Criteria,
}

/// Inner node combining its children with a logical operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorNode {
    pub id: NodeId,
    pub label: String,
    pub operator: Operator,
    /// Children are shared between snapshots until a mutation touches them
    pub children: Vec<Arc<Node>>,
}

/// Leaf node holding a single filter condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriteriaNode {
    pub id: NodeId,
    pub label: String,
}

/// A node of the expression tree.
///
/// Only [`OperatorNode`] carries children; a criteria node is always a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Operator(OperatorNode),
    Criteria(CriteriaNode),
}

impl Node {
    pub fn operator(
        id: impl Into<NodeId>,
        label: impl Into<String>,
        operator: Operator,
        children: Vec<Node>,
    ) -> Self {
        Node::Operator(OperatorNode {
            id: id.into(),
            label: label.into(),
            operator,
            children: children.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn criteria(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Node::Criteria(CriteriaNode {
            id: id.into(),
            label: label.into(),
        })
    }

    pub fn id(&self) -> &NodeId {
        match self {
            Node::Operator(node) => &node.id,
            Node::Criteria(node) => &node.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Node::Operator(node) => &node.label,
            Node::Criteria(node) => &node.label,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Operator(_) => NodeKind::Operator,
            Node::Criteria(_) => NodeKind::Criteria,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Node::Operator(_))
    }

    /// Logical operator, `None` for criteria nodes.
    pub fn logical_operator(&self) -> Option<Operator> {
        match self {
            Node::Operator(node) => Some(node.operator),
            Node::Criteria(_) => None,
        }
    }

    /// Children in order; always empty for criteria nodes.
    pub fn children(&self) -> &[Arc<Node>] {
        match self {
            Node::Operator(node) => &node.children,
            Node::Criteria(_) => &[],
        }
    }

    /// Number of nodes in the subtree rooted here, including this node.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|c| c.size()).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|c| c.depth())
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Operator(node) => write!(f, "{} ({}) [{}]", node.operator, node.label, node.id),
            Node::Criteria(node) => write!(f, "{} [{}]", node.label, node.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("AND", Operator::And)]
    #[case("or", Operator::Or)]
    #[case(" And ", Operator::And)]
    fn given_operator_text_when_parsing_then_accepts_any_case(
        #[case] input: &str,
        #[case] expected: Operator,
    ) {
        assert_eq!(input.parse::<Operator>().unwrap(), expected);
    }

    #[test]
    fn given_unknown_operator_text_when_parsing_then_fails() {
        let err = "XOR".parse::<Operator>().unwrap_err();
        assert_eq!(err, ParseOperatorError("XOR".to_string()));
        assert_eq!(err.to_string(), "invalid operator 'XOR', expected AND or OR");
    }

    #[test]
    fn given_operator_when_toggled_then_flips() {
        assert_eq!(Operator::And.toggled(), Operator::Or);
        assert_eq!(Operator::Or.toggled(), Operator::And);
    }

    #[test]
    fn given_criteria_node_then_has_no_children_and_no_operator() {
        let node = Node::criteria("c", "Age > 18");
        assert!(node.children().is_empty());
        assert_eq!(node.logical_operator(), None);
        assert_eq!(node.kind(), NodeKind::Criteria);
        assert_eq!(node.size(), 1);
    }

    #[test]
    fn given_nested_operator_then_size_and_depth_count_subtree() {
        let node = Node::operator(
            "r",
            "Root",
            Operator::And,
            vec![
                Node::criteria("a", "A"),
                Node::operator("s", "Sub", Operator::Or, vec![Node::criteria("c", "C")]),
            ],
        );
        assert_eq!(node.size(), 4);
        assert_eq!(node.depth(), 3);
        assert_eq!(node.to_string(), "AND (Root) [r]");
    }
}
