// Arena-backed hierarchy tree.
//
// Nodes live in a flat Vec in label order (level by level, first seen first)
// and refer to each other by index. Each pipeline stage fills in one group
// of fields; once the engine hands the tree out it is read-only.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::table::ClassFilter;

/// One label in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub label: String,
    /// Index of the parent node, None for top-level nodes (and the virtual root)
    pub parent: Option<usize>,
    /// Indices of direct children, in label order
    pub children: Vec<usize>,
    /// Position of the node's column in the level list, None for the virtual root
    pub level: Option<usize>,
    /// Number of rows that map to this node
    pub raw_count: u64,
    /// Share of the parent's raw count (0-100)
    pub local_percentage: f64,
    /// Share of this label's rows in the unfiltered dataset (0-100).
    /// None when no class filter is active or the filter matched nothing.
    pub class_percentage: Option<f64>,
    /// Display value after contrast normalization, None when not applicable
    pub normalized_value: Option<f64>,
    /// Hex color, `#rrggbb`
    pub color: String,
}

impl Node {
    pub(crate) fn new(label: &str, parent: Option<usize>, level: Option<usize>) -> Self {
        Self {
            label: label.to_string(),
            parent,
            children: Vec::new(),
            level,
            raw_count: 0,
            local_percentage: 0.0,
            class_percentage: None,
            normalized_value: None,
            color: String::new(),
        }
    }

    pub fn is_virtual_root(&self) -> bool {
        self.level.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A built hierarchy: nodes plus the context they were computed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) levels: Vec<String>,
    pub(crate) root: Option<usize>,
    pub(crate) class_filter: Option<ClassFilter>,
}

impl Tree {
    /// Assemble a tree from nodes whose `parent` links are already set.
    /// Children lists are derived from the parent links.
    pub(crate) fn from_nodes(mut nodes: Vec<Node>, levels: Vec<String>) -> Self {
        for i in 0..nodes.len() {
            if let Some(p) = nodes[i].parent {
                nodes[p].children.push(i);
            }
        }
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.label.clone(), i))
            .collect();
        Self {
            nodes,
            index,
            levels,
            root: None,
            class_filter: None,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// The class filter the tree was built under, if any.
    pub fn class_filter(&self) -> Option<&ClassFilter> {
        self.class_filter.as_ref()
    }

    /// Index of the virtual root, if one was injected.
    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn get(&self, label: &str) -> Option<&Node> {
        self.index.get(label).map(|&i| &self.nodes[i])
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Indices of the top-level nodes (the virtual root's children when one exists).
    pub fn top_level(&self) -> Vec<usize> {
        match self.root {
            Some(r) => self.nodes[r].children.clone(),
            None => (0..self.nodes.len())
                .filter(|&i| self.nodes[i].parent.is_none())
                .collect(),
        }
    }

    /// Number of edges between a node and its top-level ancestor.
    /// Top-level nodes and the virtual root are at depth 0.
    pub fn depth(&self, idx: usize) -> usize {
        let mut depth = 0;
        let mut current = idx;
        while let Some(p) = self.nodes[current].parent {
            if self.nodes[p].is_virtual_root() {
                break;
            }
            depth += 1;
            current = p;
        }
        depth
    }

    /// Largest deviation between an internal node's normalized value and the
    /// sum of its children's normalized values. Zero when nothing is normalized.
    /// A child without a value under a normalized parent is reported as
    /// infinite error.
    pub fn max_branch_error(&self) -> f64 {
        let mut worst: f64 = 0.0;
        for node in self.nodes.iter().filter(|n| !n.is_leaf()) {
            let Some(value) = node.normalized_value else {
                continue;
            };
            let children: Option<Vec<f64>> = node
                .children
                .iter()
                .map(|&c| self.nodes[c].normalized_value)
                .collect();
            let Some(children) = children else {
                return f64::INFINITY;
            };
            let sum: f64 = children.iter().sum();
            worst = worst.max((sum - value).abs());
        }
        worst
    }

    /// Sum of the top-level nodes' normalized values, if they have any.
    pub fn top_level_normalized_total(&self) -> Option<f64> {
        self.top_level()
            .iter()
            .map(|&i| self.nodes[i].normalized_value)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        let nodes = vec![
            Node::new("EU", None, Some(0)),
            Node::new("US", None, Some(0)),
            Node::new("France", Some(0), Some(1)),
            Node::new("Spain", Some(0), Some(1)),
            Node::new("Canada", Some(1), Some(1)),
        ];
        Tree::from_nodes(nodes, vec!["Zone".to_string(), "Country".to_string()])
    }

    #[test]
    fn test_children_derived_from_parents() {
        let tree = sample();
        assert_eq!(tree.nodes()[0].children, vec![2, 3]);
        assert_eq!(tree.nodes()[1].children, vec![4]);
        assert!(tree.nodes()[2].is_leaf());
        assert_eq!(tree.top_level(), vec![0, 1]);
    }

    #[test]
    fn test_depth() {
        let tree = sample();
        assert_eq!(tree.depth(0), 0);
        assert_eq!(tree.depth(4), 1);
    }

    #[test]
    fn test_branch_error_ignores_unnormalized_nodes() {
        let mut tree = sample();
        assert_eq!(tree.max_branch_error(), 0.0);
        tree.nodes[0].normalized_value = Some(50.0);
        tree.nodes[2].normalized_value = Some(20.0);
        tree.nodes[3].normalized_value = Some(25.0);
        assert!((tree.max_branch_error() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_branch_error_reports_missing_child_value() {
        let mut tree = sample();
        tree.nodes[0].normalized_value = Some(50.0);
        tree.nodes[2].normalized_value = Some(50.0);
        assert_eq!(tree.max_branch_error(), f64::INFINITY);
    }
}
