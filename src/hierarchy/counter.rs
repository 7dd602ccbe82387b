// LeafCounter: raw counts for every node.
//
// Each complete row gets a Count equal to the number of complete rows sharing
// its deepest-level value. Rows are then deduplicated on the full level tuple,
// and a node's raw count is the sum of Count over the deduplicated rows where
// the node's own level column holds its label. Rows missing any level cell are
// left out, as they are in the builder.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::builder::level_columns;
use super::tree::Tree;
use crate::error::Result;
use crate::table::Table;

pub struct LeafCounter<'a> {
    levels: &'a [String],
}

impl<'a> LeafCounter<'a> {
    pub fn new(levels: &'a [String]) -> Self {
        Self { levels }
    }

    /// Fill `raw_count` on every node of `tree` from the (possibly filtered) table.
    pub fn apply(&self, tree: &mut Tree, table: &Table) -> Result<()> {
        let cols = level_columns(table, self.levels)?;
        if cols.is_empty() {
            return Ok(());
        }
        let leaf = cols.len() - 1;

        // Only rows with every level present take part, the same rows the
        // builder groups
        let complete = table.complete_tuples(&cols);
        let mut leaf_counts: HashMap<&str, u64> = HashMap::new();
        for tuple in &complete {
            *leaf_counts.entry(tuple[leaf]).or_insert(0) += 1;
        }
        let distinct: BTreeSet<Vec<&str>> = complete.into_iter().collect();

        // (level, value) -> summed Count
        let mut sums: HashMap<(usize, &str), u64> = HashMap::new();
        for tuple in &distinct {
            let count = leaf_counts.get(tuple[leaf]).copied().unwrap_or(0);
            for (level, &value) in tuple.iter().enumerate() {
                *sums.entry((level, value)).or_insert(0) += count;
            }
        }

        for node in tree.nodes.iter_mut() {
            if let Some(level) = node.level {
                node.raw_count = sums
                    .get(&(level, node.label.as_str()))
                    .copied()
                    .unwrap_or(0);
            }
        }

        debug!(
            distinct_tuples = distinct.len(),
            rows = table.len(),
            "counted leaves"
        );
        Ok(())
    }
}
