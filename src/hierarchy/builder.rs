// HierarchyBuilder: turns a flat table into (label, parent, level) nodes.
//
// Distinct level tuples are visited in sorted order, level by level. A value
// is emitted the first time it is seen; its parent is the value one level up
// in the same tuple, unless the value also occurs in the top level column, in
// which case it is parentless.
//
// That rule is only sound when labels are unique across the whole tree, so
// the builder checks uniqueness up front and refuses ambiguous input unless
// the caller opts into the first-seen fallback.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use super::tree::{Node, Tree};
use crate::error::{EngineError, Result};
use crate::table::Table;

/// Builds the node skeleton (labels, parents, levels) of a hierarchy.
pub struct HierarchyBuilder<'a> {
    levels: &'a [String],
    allow_collisions: bool,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(levels: &'a [String], allow_collisions: bool) -> Self {
        Self {
            levels,
            allow_collisions,
        }
    }

    pub fn build(&self, table: &Table) -> Result<Tree> {
        let cols = level_columns(table, self.levels)?;
        let Some(&top_col) = cols.first() else {
            return Ok(Tree::from_nodes(Vec::new(), self.levels.to_vec()));
        };

        // BTreeSet gives the sorted group-by order and drops duplicate tuples
        let combos: BTreeSet<Vec<&str>> = table.complete_tuples(&cols).into_iter().collect();
        let top_values: HashSet<&str> = table.column_values(top_col).collect();

        self.check_collisions(&combos, &top_values)?;

        let mut nodes: Vec<Node> = Vec::new();
        let mut emitted: HashMap<&str, usize> = HashMap::new();

        for level in 0..cols.len() {
            for combo in &combos {
                let value = combo[level];
                if emitted.contains_key(value) {
                    continue;
                }
                let parent = if level == 0 || top_values.contains(value) {
                    None
                } else {
                    // The level above was fully emitted in the previous pass
                    emitted.get(combo[level - 1]).copied()
                };
                emitted.insert(value, nodes.len());
                nodes.push(Node::new(value, parent, Some(level)));
            }
        }

        debug!(
            nodes = nodes.len(),
            tuples = combos.len(),
            "built hierarchy skeleton"
        );
        Ok(Tree::from_nodes(nodes, self.levels.to_vec()))
    }

    fn check_collisions(
        &self,
        combos: &BTreeSet<Vec<&str>>,
        top_values: &HashSet<&str>,
    ) -> Result<()> {
        let mut value_levels: HashMap<&str, BTreeSet<usize>> = HashMap::new();
        let mut value_parents: HashMap<(usize, &str), BTreeSet<&str>> = HashMap::new();

        for &value in top_values {
            value_levels.entry(value).or_default().insert(0);
        }
        for combo in combos {
            for (level, &value) in combo.iter().enumerate() {
                value_levels.entry(value).or_default().insert(level);
                if level > 0 {
                    value_parents
                        .entry((level, value))
                        .or_default()
                        .insert(combo[level - 1]);
                }
            }
        }

        // Sorted so the reported label is deterministic
        let mut collisions: Vec<(&str, &BTreeSet<usize>)> = value_levels
            .iter()
            .filter(|(_, levels)| levels.len() > 1)
            .map(|(value, levels)| (*value, levels))
            .collect();
        collisions.sort();

        for (label, levels) in collisions {
            let names = levels
                .iter()
                .map(|&l| self.levels[l].as_str())
                .collect::<Vec<_>>()
                .join(", ");
            if !self.allow_collisions {
                return Err(EngineError::LabelCollision {
                    label: label.to_string(),
                    levels: names,
                });
            }
            warn!(label, levels = %names, "label appears at several levels, first occurrence wins");
        }

        let mut ambiguous: Vec<(&(usize, &str), &BTreeSet<&str>)> = value_parents
            .iter()
            .filter(|(_, parents)| parents.len() > 1)
            .collect();
        ambiguous.sort();

        for ((level, label), parents) in ambiguous {
            let parents = parents.iter().copied().collect::<Vec<_>>().join(", ");
            if !self.allow_collisions {
                return Err(EngineError::AmbiguousParent {
                    label: label.to_string(),
                    level: self.levels[*level].clone(),
                    parents,
                });
            }
            warn!(label, %parents, "label has several parents, first occurrence wins");
        }

        Ok(())
    }
}

/// Resolve each level name to its column index, failing on the first missing one.
pub(crate) fn level_columns(table: &Table, levels: &[String]) -> Result<Vec<usize>> {
    levels.iter().map(|l| table.column_index(l)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_labels_in_level_then_sorted_order() {
        let table = Table::from_rows(
            &["Zone", "Country"],
            &[
                vec!["US", "Mexico"],
                vec!["EU", "Spain"],
                vec!["EU", "France"],
                vec!["US", "Canada"],
            ],
        )
        .unwrap();
        let lv = levels(&["Zone", "Country"]);
        let tree = HierarchyBuilder::new(&lv, false).build(&table).unwrap();

        let labels: Vec<&str> = tree.nodes().iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["EU", "US", "France", "Spain", "Canada", "Mexico"]);

        let parents: Vec<Option<usize>> = tree.nodes().iter().map(|n| n.parent).collect();
        assert_eq!(parents, vec![None, None, Some(0), Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn test_missing_level_column_is_an_error() {
        let table = Table::from_rows(&["Zone"], &[vec!["EU"]]).unwrap();
        let lv = levels(&["Zone", "Country"]);
        let err = HierarchyBuilder::new(&lv, false).build(&table).unwrap_err();
        assert!(matches!(err, EngineError::MissingColumn(c) if c == "Country"));
    }

    #[test]
    fn test_cross_level_collision_rejected_by_default() {
        let table = Table::from_rows(
            &["Zone", "Country"],
            &[vec!["Monaco", "Nice"], vec!["EU", "Monaco"]],
        )
        .unwrap();
        let lv = levels(&["Zone", "Country"]);
        let err = HierarchyBuilder::new(&lv, false).build(&table).unwrap_err();
        assert!(matches!(err, EngineError::LabelCollision { label, .. } if label == "Monaco"));
    }

    #[test]
    fn test_collision_fallback_treats_top_values_as_parentless() {
        let table = Table::from_rows(
            &["Zone", "Country"],
            &[vec!["Monaco", "Nice"], vec!["EU", "Monaco"]],
        )
        .unwrap();
        let lv = levels(&["Zone", "Country"]);
        let tree = HierarchyBuilder::new(&lv, true).build(&table).unwrap();

        let monaco = tree.get("Monaco").unwrap();
        assert_eq!(monaco.parent, None);
        assert_eq!(monaco.level, Some(0));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_ambiguous_parent_rejected_by_default() {
        let table = Table::from_rows(
            &["Zone", "Country"],
            &[vec!["EU", "Turkey"], vec!["Asia", "Turkey"]],
        )
        .unwrap();
        let lv = levels(&["Zone", "Country"]);
        let err = HierarchyBuilder::new(&lv, false).build(&table).unwrap_err();
        assert!(matches!(err, EngineError::AmbiguousParent { label, .. } if label == "Turkey"));

        let tree = HierarchyBuilder::new(&lv, true).build(&table).unwrap();
        // "Asia" sorts first, so it wins the parent
        assert_eq!(tree.get("Turkey").unwrap().parent, tree.index_of("Asia"));
    }

    #[test]
    fn test_rows_with_missing_cells_are_skipped() {
        let mut table = Table::new(levels(&["Zone", "Country"]));
        table
            .push_row(vec![Some("EU".into()), Some("France".into())])
            .unwrap();
        table.push_row(vec![Some("EU".into()), None]).unwrap();
        let lv = levels(&["Zone", "Country"]);
        let tree = HierarchyBuilder::new(&lv, false).build(&table).unwrap();
        assert_eq!(tree.len(), 2);
    }
}
