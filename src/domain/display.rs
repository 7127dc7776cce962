//! Rendering of expression trees as terminal trees via `termtree`.
//!
//! A separate trait keeps the domain types free of presentation code.

use termtree::Tree;
use tracing::instrument;

use crate::domain::entities::Node;
use crate::domain::tree::ExpressionTree;

pub trait TreeDisplay {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeDisplay for Node {
    #[instrument(level = "trace", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        let leaves: Vec<_> = self.children().iter().map(|c| c.to_tree_string()).collect();
        Tree::new(self.to_string()).with_leaves(leaves)
    }
}

impl TreeDisplay for ExpressionTree {
    fn to_tree_string(&self) -> Tree<String> {
        match self.roots() {
            [] => Tree::new("Empty tree".to_string()),
            [root] => root.to_tree_string(),
            roots => Tree::new(format!("{} top-level nodes", roots.len()))
                .with_leaves(roots.iter().map(|r| r.to_tree_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Operator;

    #[test]
    fn given_sample_when_rendering_then_nests_children() {
        let rendered = ExpressionTree::sample().to_tree_string().to_string();
        assert!(rendered.starts_with("AND (Root) [1]"));
        assert!(rendered.contains("OR (Subgroup) [4]"));
        assert!(rendered.contains("Education = College [6]"));
    }

    #[test]
    fn given_forest_when_rendering_then_groups_roots() {
        let mut tree = ExpressionTree::with_root("a", "Root");
        tree.push_root(Node::operator("b", "Extra", Operator::Or, vec![]))
            .unwrap();
        let rendered = tree.to_tree_string().to_string();
        assert!(rendered.starts_with("2 top-level nodes"));
    }

    #[test]
    fn given_empty_tree_when_rendering_then_says_so() {
        let rendered = ExpressionTree::new().to_tree_string().to_string();
        assert!(rendered.starts_with("Empty tree"));
    }
}
