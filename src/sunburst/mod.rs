// Sunburst assembly: the engine facade, the virtual root, and the
// flattened chart data handed to renderers.

pub mod assembler;
pub mod engine;
pub mod root;

pub use assembler::{SunburstAssembler, SunburstData};
pub use engine::SunburstEngine;
