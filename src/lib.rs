// Sunburst: hierarchical aggregation and normalization for feedback charts
//
// This is the library root. Each module corresponds to one stage of the
// pipeline that turns a flat table of classified verbatims into the
// index-aligned arrays a sunburst chart consumes.

pub mod color;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod metrics;
pub mod output;
pub mod sunburst;
pub mod table;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use sunburst::{SunburstData, SunburstEngine};
pub use table::{ClassFilter, LevelSearch, Table};
