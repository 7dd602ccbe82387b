// PercentageCalculator: the two percentage spaces of a node.
//
// Local percentage: the node's share of its parent (top-level nodes: share of
// all top-level nodes). Class percentage: the node's rows as a share of the
// same label's rows in the unfiltered dataset, so a filtered tree shows how
// concentrated the class is in each place.

use std::collections::HashMap;

use super::ratio_percent;
use crate::error::Result;
use crate::hierarchy::builder::level_columns;
use crate::hierarchy::tree::Tree;
use crate::table::Table;

pub struct PercentageCalculator<'a> {
    /// The full, unfiltered dataset
    full: &'a Table,
    levels: &'a [String],
}

impl<'a> PercentageCalculator<'a> {
    pub fn new(full: &'a Table, levels: &'a [String]) -> Self {
        Self { full, levels }
    }

    /// Fill `local_percentage` on every node, and `class_percentage` when the
    /// tree was built under a class filter. Runs before root injection.
    pub fn apply(&self, tree: &mut Tree, class_filtered: bool) -> Result<()> {
        let top_total: u64 = tree
            .top_level()
            .iter()
            .map(|&i| tree.nodes[i].raw_count)
            .sum();

        let parent_counts: Vec<Option<u64>> = tree
            .nodes
            .iter()
            .map(|n| n.parent.map(|p| tree.nodes[p].raw_count))
            .collect();

        for (node, parent_count) in tree.nodes.iter_mut().zip(parent_counts) {
            let denominator = parent_count.unwrap_or(top_total);
            node.local_percentage = ratio_percent(node.raw_count as f64, denominator as f64);
        }

        if !class_filtered {
            return Ok(());
        }

        // Per-level occurrence counts in the unfiltered data. A label's
        // denominator comes from the highest level column that contains it.
        let cols = level_columns(self.full, self.levels)?;
        let level_counts: Vec<HashMap<&str, usize>> =
            cols.iter().map(|&c| self.full.value_counts(c)).collect();

        for node in tree.nodes.iter_mut() {
            let total = level_counts
                .iter()
                .find_map(|counts| counts.get(node.label.as_str()))
                .copied()
                .unwrap_or(0);
            node.class_percentage = Some(ratio_percent(node.raw_count as f64, total as f64));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::builder::HierarchyBuilder;
    use crate::hierarchy::counter::LeafCounter;
    use crate::table::ClassFilter;

    fn geo_table() -> Table {
        let mut rows = Vec::new();
        for (zone, country, n, emotion) in [
            ("EU", "France", 30, "joy"),
            ("EU", "Spain", 10, "anger"),
            ("US", "Mexico", 20, "anger"),
            ("US", "Canada", 40, "joy"),
        ] {
            rows.extend(std::iter::repeat(vec![zone, country, emotion]).take(n));
        }
        Table::from_rows(&["Zone", "Country", "emotion"], &rows).unwrap()
    }

    fn levels() -> Vec<String> {
        vec!["Zone".to_string(), "Country".to_string()]
    }

    #[test]
    fn test_local_percentages() {
        let table = geo_table();
        let lv = levels();
        let mut tree = HierarchyBuilder::new(&lv, false).build(&table).unwrap();
        LeafCounter::new(&lv).apply(&mut tree, &table).unwrap();
        PercentageCalculator::new(&table, &lv)
            .apply(&mut tree, false)
            .unwrap();

        assert!((tree.get("EU").unwrap().local_percentage - 40.0).abs() < 1e-9);
        assert!((tree.get("France").unwrap().local_percentage - 75.0).abs() < 1e-9);
        assert!((tree.get("Spain").unwrap().local_percentage - 25.0).abs() < 1e-9);
        assert!(tree.get("France").unwrap().class_percentage.is_none());
    }

    #[test]
    fn test_class_percentages_against_unfiltered_totals() {
        let table = geo_table();
        let filtered = table.filter(&ClassFilter::new("emotion", "joy")).unwrap();
        let lv = levels();
        let mut tree = HierarchyBuilder::new(&lv, false).build(&filtered).unwrap();
        LeafCounter::new(&lv).apply(&mut tree, &filtered).unwrap();
        PercentageCalculator::new(&table, &lv)
            .apply(&mut tree, true)
            .unwrap();

        // EU: 30 joy rows out of 40 EU rows overall
        let eu = tree.get("EU").unwrap().class_percentage.unwrap();
        assert!((eu - 75.0).abs() < 1e-9);
        // Canada: 40 of 40
        let canada = tree.get("Canada").unwrap().class_percentage.unwrap();
        assert!((canada - 100.0).abs() < 1e-9);
        // Local percentages are relative to the filtered parent
        assert!((tree.get("France").unwrap().local_percentage - 100.0).abs() < 1e-9);
    }
}
