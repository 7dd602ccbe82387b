// SunburstEngine: runs the whole pipeline for one request.
//
// builder -> leaf counts -> percentages -> contrast normalization (class
// filter only) -> colors -> optional virtual root. The engine holds nothing
// but its validated configuration, so one engine can serve any number of
// requests, from any number of threads.

use tracing::{info, warn};

use super::assembler::{SunburstAssembler, SunburstData};
use super::root::{FilterCounts, RootInjector};
use crate::color::ColorAssigner;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::hierarchy::builder::{level_columns, HierarchyBuilder};
use crate::hierarchy::counter::LeafCounter;
use crate::hierarchy::tree::Tree;
use crate::metrics::contrast::ContrastNormalizer;
use crate::metrics::percentage::PercentageCalculator;
use crate::table::{ClassFilter, LevelSearch, Table};

/// Relative deviation allowed between a branch and the sum of its children.
const BRANCH_TOLERANCE: f64 = 1e-9;

pub struct SunburstEngine {
    config: EngineConfig,
    colors: ColorAssigner,
}

impl SunburstEngine {
    /// Validate the configuration and build an engine around it.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let colors = ColorAssigner::from_hex_palette(&config.palette, config.lighten_step)?;
        Ok(Self { config, colors })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the tree for `table`, optionally restricted to one class value.
    ///
    /// Percentages in class space are always taken against the full `table`.
    pub fn build(&self, table: &Table, filter: Option<&ClassFilter>) -> Result<Tree> {
        let levels = &self.config.levels;

        // Fail fast on bad column names before doing any work
        level_columns(table, levels)?;
        if let Some(f) = filter {
            table.column_index(&f.column)?;
        }

        let filtered;
        let work = match filter {
            Some(f) => {
                filtered = table.filter(f)?;
                &filtered
            }
            None => table,
        };

        let mut tree =
            HierarchyBuilder::new(levels, self.config.allow_label_collisions).build(work)?;
        LeafCounter::new(levels).apply(&mut tree, work)?;
        PercentageCalculator::new(table, levels).apply(&mut tree, filter.is_some())?;

        if filter.is_some() {
            let normalizer = ContrastNormalizer {
                top_exponent: self.config.top_exponent,
                nested_exponent: self.config.nested_exponent,
                total: self.config.normalized_total,
            };
            normalizer.apply(&mut tree);
        }

        self.colors.apply(&mut tree);

        if let Some(name) = &self.config.root_name {
            let counts = filter.map(|_| FilterCounts {
                filtered_rows: work.len(),
                total_rows: table.len(),
            });
            RootInjector::new(name, self.config.normalized_total).apply(&mut tree, counts)?;
        }

        tree.class_filter = filter.cloned();

        // Tolerance scales with the total so large totals are not flagged
        // for ordinary rounding
        let branch_error = tree.max_branch_error();
        if branch_error > BRANCH_TOLERANCE * self.config.normalized_total.max(1.0) {
            warn!(branch_error, "normalized branches do not sum to their parents");
        }
        info!(
            nodes = tree.len(),
            rows = work.len(),
            class = filter.map(|f| f.value.as_str()).unwrap_or("-"),
            "built sunburst tree"
        );
        Ok(tree)
    }

    /// Build and flatten in one step.
    pub fn sunburst(&self, table: &Table, filter: Option<&ClassFilter>) -> Result<SunburstData> {
        let tree = self.build(table, filter)?;
        Ok(SunburstAssembler::assemble(&tree))
    }

    /// Name of the level column that contains `label`, or "Unknown".
    pub fn level_of<'s>(&'s self, table: &Table, label: &str, search: LevelSearch) -> &'s str {
        table
            .find_level(label, &self.config.levels, search)
            .unwrap_or("Unknown")
    }
}
