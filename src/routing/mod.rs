//! Heuristic query routing: output mode first, then question profile and the
//! generation parameters derived from it.

pub mod mode;
pub mod profile;

pub use mode::infer_mode;
pub use profile::{classify, configure, GenerationConfig, QuestionProfile};
