//! Edit requests coming from the presentation layer.

use std::fmt;
use std::str::FromStr;

use crate::application::ApplicationError;
use crate::domain::{NodeId, Operator};

/// One structural edit, as triggered by a drop or a button click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Move { dragged: NodeId, target: NodeId },
    AddCriteria { parent: NodeId },
    AddOperator { parent: Option<NodeId> },
    Remove { node: NodeId },
    ChangeOperator { node: NodeId, operator: Operator },
}

impl fmt::Display for EditCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditCommand::Move { dragged, target } => write!(f, "move:{}:{}", dragged, target),
            EditCommand::AddCriteria { parent } => write!(f, "add-criteria:{}", parent),
            EditCommand::AddOperator { parent: Some(parent) } => {
                write!(f, "add-operator:{}", parent)
            }
            EditCommand::AddOperator { parent: None } => write!(f, "add-operator"),
            EditCommand::Remove { node } => write!(f, "remove:{}", node),
            EditCommand::ChangeOperator { node, operator } => {
                write!(f, "change:{}:{}", node, operator)
            }
        }
    }
}

/// Parses the compact form used on the command line:
/// `move:DRAGGED:TARGET`, `add-criteria:PARENT`, `add-operator[:PARENT]`,
/// `remove:NODE`, `change:NODE:AND|OR`.
impl FromStr for EditCommand {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ApplicationError::InvalidCommand {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.iter().skip(1).any(|p| p.is_empty()) {
            return Err(invalid("empty node id"));
        }
        match parts.as_slice() {
            ["move", dragged, target] => Ok(EditCommand::Move {
                dragged: NodeId::from(*dragged),
                target: NodeId::from(*target),
            }),
            ["add-criteria", parent] => Ok(EditCommand::AddCriteria {
                parent: NodeId::from(*parent),
            }),
            ["add-operator"] => Ok(EditCommand::AddOperator { parent: None }),
            ["add-operator", parent] => Ok(EditCommand::AddOperator {
                parent: Some(NodeId::from(*parent)),
            }),
            ["remove", node] => Ok(EditCommand::Remove {
                node: NodeId::from(*node),
            }),
            ["change", node, operator] => Ok(EditCommand::ChangeOperator {
                node: NodeId::from(*node),
                operator: operator.parse().map_err(|e| {
                    invalid(&format!("{}", e))
                })?,
            }),
            ["move" | "add-criteria" | "remove" | "change", ..] | ["add-operator", ..] => {
                Err(invalid("wrong number of arguments"))
            }
            _ => Err(invalid("unknown edit")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("move:5:1")]
    #[case("add-criteria:4")]
    #[case("add-operator")]
    #[case("add-operator:4")]
    #[case("remove:4")]
    #[case("change:4:AND")]
    fn given_compact_edit_when_parsing_then_displays_back_identically(#[case] input: &str) {
        let command: EditCommand = input.parse().unwrap();
        assert_eq!(command.to_string(), input);
    }

    #[test]
    fn given_lowercase_operator_when_parsing_change_then_accepted() {
        let command: EditCommand = "change:4:or".parse().unwrap();
        assert_eq!(
            command,
            EditCommand::ChangeOperator {
                node: NodeId::from("4"),
                operator: Operator::Or
            }
        );
    }

    #[rstest]
    #[case("move:5")]
    #[case("move::1")]
    #[case("remove")]
    #[case("change:4:XOR")]
    #[case("rename:4:x")]
    #[case("")]
    fn given_malformed_edit_when_parsing_then_rejected(#[case] input: &str) {
        let result = input.parse::<EditCommand>();
        assert!(
            matches!(result, Err(ApplicationError::InvalidCommand { .. })),
            "expected InvalidCommand for {:?}",
            input
        );
    }
}
