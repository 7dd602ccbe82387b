// RootInjector: wraps the top level under one virtual apex node.
//
// Some chart modes need a single center. The root is appended after every
// other node, adopts all parentless nodes, and carries the sum of their raw
// counts. Under a class filter it also carries the filtered subset's share of
// the whole dataset, and the normalized target total.

use crate::color::ROOT_COLOR;
use crate::error::{EngineError, Result};
use crate::hierarchy::tree::{Node, Tree};
use crate::metrics::ratio_percent;

/// Row counts needed to fill the root's class-space values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCounts {
    pub filtered_rows: usize,
    pub total_rows: usize,
}

pub struct RootInjector<'a> {
    name: &'a str,
    normalized_total: f64,
}

impl<'a> RootInjector<'a> {
    pub fn new(name: &'a str, normalized_total: f64) -> Self {
        Self {
            name,
            normalized_total,
        }
    }

    /// Append the virtual root. `counts` is None when no class filter is active.
    pub fn apply(&self, tree: &mut Tree, counts: Option<FilterCounts>) -> Result<()> {
        if tree.index.contains_key(self.name) {
            return Err(EngineError::LabelCollision {
                label: self.name.to_string(),
                levels: "virtual root".to_string(),
            });
        }

        let top = tree.top_level();
        let root_idx = tree.nodes.len();

        let mut root = Node::new(self.name, None, None);
        root.raw_count = top.iter().map(|&i| tree.nodes[i].raw_count).sum();
        root.local_percentage = 100.0;
        root.color = ROOT_COLOR.to_string();

        // A filter that matched nothing has no meaningful class-space values
        if let Some(counts) = counts.filter(|c| c.filtered_rows > 0) {
            root.class_percentage = Some(ratio_percent(
                counts.filtered_rows as f64,
                counts.total_rows as f64,
            ));
            root.normalized_value = Some(self.normalized_total);
        }

        for &i in &top {
            tree.nodes[i].parent = Some(root_idx);
        }
        root.children = top;

        tree.nodes.push(root);
        tree.index.insert(self.name.to_string(), root_idx);
        tree.root = Some(root_idx);
        Ok(())
    }
}
