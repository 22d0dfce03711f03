pub mod evaluator;
pub mod registry;

pub use evaluator::AlertEvaluator;
pub use registry::{AlertRegistry, AlertStore, MemoryStore};
