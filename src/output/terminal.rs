// Colored terminal output for sunburst trees.
//
// The `show` command delegates here. Nodes are printed depth-first with a
// swatch in the node's own color, so the palette cascade is visible without
// opening a chart.

use colored::Colorize;

use crate::color::Rgb;
use crate::hierarchy::tree::{Node, Tree};

/// Widest label printed before truncation.
const LABEL_WIDTH: usize = 32;

/// Display a built tree in the terminal.
pub fn display_tree(tree: &Tree) {
    if tree.is_empty() {
        println!("No rows matched. Nothing to display.");
        return;
    }

    let title = match tree.class_filter() {
        Some(filter) => format!(
            "=== Sunburst: {} ({} = {}) ===",
            tree.levels().join(" > "),
            filter.column,
            filter.value
        ),
        None => format!("=== Sunburst: {} ===", tree.levels().join(" > ")),
    };
    println!("\n{}", title.bold());
    println!();

    println!(
        "  {:<width$} {:>8}  {:>8}  {:>8}  {:>8}",
        "Label".dimmed(),
        "Count".dimmed(),
        "Local".dimmed(),
        "Class".dimmed(),
        "Value".dimmed(),
        width = LABEL_WIDTH + 8,
    );
    println!("  {}", "-".repeat(LABEL_WIDTH + 48).dimmed());

    let mut starts: Vec<usize> = match tree.root() {
        Some(r) => vec![r],
        None => tree.top_level(),
    };
    // Depth-first, children in label order
    starts.reverse();
    let mut stack: Vec<(usize, usize)> = starts.into_iter().map(|i| (i, 0)).collect();
    while let Some((idx, indent)) = stack.pop() {
        let node = &tree.nodes()[idx];
        print_node(node, indent);
        for &child in node.children.iter().rev() {
            stack.push((child, indent + 1));
        }
    }

    println!();
    let leaves = tree.nodes().iter().filter(|n| n.is_leaf()).count();
    println!(
        "  {} nodes, {} leaves, {} levels",
        tree.len(),
        leaves,
        tree.levels().len()
    );
}

fn print_node(node: &Node, indent: usize) {
    let swatch = match Rgb::from_hex(&node.color) {
        Ok(c) => "██".truecolor(c.r, c.g, c.b).to_string(),
        Err(_) => "  ".to_string(),
    };
    let label = super::truncate_chars(&node.label, LABEL_WIDTH);
    let padded = format!("{}{}", "  ".repeat(indent), label);
    let label_str = if node.is_virtual_root() || node.parent.is_none() {
        padded.bold().to_string()
    } else {
        padded
    };

    println!(
        "  {} {:<width$} {:>8}  {:>7.2}%  {:>8}  {:>8}",
        swatch,
        label_str,
        node.raw_count,
        node.local_percentage,
        format_optional(node.class_percentage, "%"),
        format_optional(node.normalized_value, ""),
        width = LABEL_WIDTH + 5,
    );
}

fn format_optional(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{v:.2}{suffix}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some(12.345), "%"), "12.35%");
        assert_eq!(format_optional(None, "%"), "-");
    }
}
