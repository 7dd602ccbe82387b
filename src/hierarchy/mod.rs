// Hierarchy construction: node skeleton, raw counts, and the tree arena.

pub mod builder;
pub mod counter;
pub mod tree;
