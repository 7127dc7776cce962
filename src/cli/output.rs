//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;

use crate::application::{EditCommand, EditOutcome};
use crate::domain::{ExpressionTree, TreeDisplay};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print the tree as an indented terminal tree
pub fn tree(tree: &ExpressionTree) {
    print!("{}", tree.to_tree_string());
}

/// Print one edit with a green checkmark or a red X
pub fn edit(command: &EditCommand, outcome: &EditOutcome) {
    if outcome.changed() {
        println!("  {} {} ({})", "✓".green(), command, outcome);
    } else {
        println!("  {} {} ({})", "✗".red(), command, outcome.to_string().dimmed());
    }
}

/// Print a yes/no answer
pub fn verdict(question: &str, yes: bool) {
    let answer = if yes { "yes".green() } else { "no".red() };
    println!("{}: {}", question, answer);
}

/// Print plain output (no color, for config dumps)
pub fn plain(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}
