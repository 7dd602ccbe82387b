// SunburstAssembler: flattens a finished tree into index-aligned arrays.
//
// This is the whole contract with the rendering side: any sunburst or icicle
// widget that takes labels/parents/values/colors with "total" branch values
// can draw the result directly.

use serde::{Deserialize, Serialize};

use crate::hierarchy::tree::Tree;

/// Line separator understood by the chart hover templates.
pub const HOVER_SEPARATOR: &str = "<br>";

/// Index-aligned chart data for one tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunburstData {
    pub labels: Vec<String>,
    /// Parent label per node, empty string for the apex
    pub parents: Vec<String>,
    /// Normalized values under a class filter, raw counts otherwise.
    /// None (null in JSON) means "not applicable".
    pub values: Vec<Option<f64>>,
    pub colors: Vec<String>,
    pub hover_texts: Vec<String>,
    pub raw_counts: Vec<u64>,
    pub local_percentages: Vec<f64>,
    pub class_percentages: Vec<Option<f64>>,
    /// Always "total": a branch's value is the sum of its children
    pub branch_values: String,
    /// The class value the tree was filtered on, if any
    pub class_value: Option<String>,
}

impl SunburstData {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

pub struct SunburstAssembler;

impl SunburstAssembler {
    pub fn assemble(tree: &Tree) -> SunburstData {
        let class_value = tree.class_filter().map(|f| f.value.clone());
        let nodes = tree.nodes();

        let parents = nodes
            .iter()
            .map(|n| {
                n.parent
                    .map(|p| nodes[p].label.clone())
                    .unwrap_or_default()
            })
            .collect();

        let values = nodes
            .iter()
            .map(|n| {
                if class_value.is_some() {
                    n.normalized_value
                } else {
                    Some(n.raw_count as f64)
                }
            })
            .collect();

        let hover_texts = nodes
            .iter()
            .map(|n| {
                hover_text(
                    &n.label,
                    n.raw_count,
                    n.local_percentage,
                    class_value.as_deref().map(|v| (v, n.class_percentage)),
                )
            })
            .collect();

        SunburstData {
            labels: nodes.iter().map(|n| n.label.clone()).collect(),
            parents,
            values,
            colors: nodes.iter().map(|n| n.color.clone()).collect(),
            hover_texts,
            raw_counts: nodes.iter().map(|n| n.raw_count).collect(),
            local_percentages: nodes.iter().map(|n| n.local_percentage).collect(),
            class_percentages: nodes.iter().map(|n| n.class_percentage).collect(),
            branch_values: "total".to_string(),
            class_value,
        }
    }
}

/// Hover text for one node. `class` carries the filter value and the node's
/// class percentage when a class filter is active.
pub fn hover_text(
    label: &str,
    raw_count: u64,
    local_percentage: f64,
    class: Option<(&str, Option<f64>)>,
) -> String {
    let mut text = format!(
        "{label}{HOVER_SEPARATOR}Number of verbatims: {raw_count}\
         {HOVER_SEPARATOR}Percentage: {local_percentage:.2}%"
    );
    if let Some((class_value, percentage)) = class {
        let shown = percentage
            .map(|p| format!("{p:.2}%"))
            .unwrap_or_else(|| "n/a".to_string());
        text.push_str(&format!(
            "{HOVER_SEPARATOR}Percentage of {class_value}: {shown}"
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hover_text_without_class() {
        let text = hover_text("France", 30, 75.0, None);
        assert_eq!(
            text,
            "France<br>Number of verbatims: 30<br>Percentage: 75.00%"
        );
    }

    #[test]
    fn test_hover_text_with_class() {
        let text = hover_text("France", 30, 75.0, Some(("joy", Some(100.0))));
        assert!(text.ends_with("<br>Percentage of joy: 100.00%"));

        let text = hover_text("World", 0, 100.0, Some(("joy", None)));
        assert!(text.ends_with("Percentage of joy: n/a"));
    }
}
