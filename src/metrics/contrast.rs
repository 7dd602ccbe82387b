// ContrastNormalizer: sibling-wise renormalization of class percentages.
//
// Class percentages are ratios against different denominators, so they do not
// add up to anything meaningful. To draw them as a "branch = sum of children"
// chart, the top level is rescaled to the target total, and every sibling
// group below is rescaled to its parent's final value. Within each group a
// power-law contrast transform is applied:
//
//   v_i' = v_i^e / sum(v_j^e) * T
//
// e = 1 leaves the proportions alone, e > 1 widens the gap between large and
// small shares, e < 1 narrows it. Every group is transformed with its own
// values, never the whole tree's, which is what keeps the sums consistent
// below the second level.

use tracing::debug;

use crate::hierarchy::tree::Tree;

pub struct ContrastNormalizer {
    /// Exponent for the top-level sibling group
    pub top_exponent: f64,
    /// Exponent for every deeper sibling group
    pub nested_exponent: f64,
    /// Target sum of the top level
    pub total: f64,
}

impl Default for ContrastNormalizer {
    fn default() -> Self {
        Self {
            top_exponent: 1.0,
            nested_exponent: 1.0,
            total: 100.0,
        }
    }
}

impl ContrastNormalizer {
    /// Fill `normalized_value` from `class_percentage`, top-down.
    ///
    /// Nodes without a class percentage are treated as zero. Runs before root
    /// injection, so the top level is the set of parentless nodes.
    pub fn apply(&self, tree: &mut Tree) {
        let top = tree.top_level();
        self.normalize_group(tree, &top, self.total, self.top_exponent);

        // Parents are always finalized before their children are visited
        let mut stack = top;
        while let Some(idx) = stack.pop() {
            let children = tree.nodes[idx].children.clone();
            if children.is_empty() {
                continue;
            }
            let target = tree.nodes[idx].normalized_value.unwrap_or(0.0);
            self.normalize_group(tree, &children, target, self.nested_exponent);
            stack.extend(children);
        }

        debug!(
            nodes = tree.len(),
            max_branch_error = tree.max_branch_error(),
            "normalized class percentages"
        );
    }

    fn normalize_group(&self, tree: &mut Tree, group: &[usize], target: f64, exponent: f64) {
        let raw: Vec<f64> = group
            .iter()
            .map(|&i| tree.nodes[i].class_percentage.unwrap_or(0.0))
            .collect();
        let scaled = proportional(&raw, target);
        let transformed = contrast_transform(&scaled, exponent, target);
        for (&i, value) in group.iter().zip(transformed) {
            tree.nodes[i].normalized_value = Some(value);
        }
    }
}

/// Rescale `values` so they sum to `target`, keeping their proportions.
///
/// A group with no mass gets the target split evenly.
pub fn proportional(values: &[f64], target: f64) -> Vec<f64> {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        values.iter().map(|v| v / sum * target).collect()
    } else {
        even_split(values.len(), target)
    }
}

/// Sum-preserving power transform: `v^e / sum(v^e) * target`.
pub fn contrast_transform(values: &[f64], exponent: f64, target: f64) -> Vec<f64> {
    let powered: Vec<f64> = values.iter().map(|v| v.max(0.0).powf(exponent)).collect();
    proportional(&powered, target)
}

fn even_split(n: usize, target: f64) -> Vec<f64> {
    if n == 0 {
        Vec::new()
    } else {
        vec![target / n as f64; n]
    }
}
