mod evaluator;
mod model;

pub use evaluator::evaluate;
pub use model::{AssertionResult, AssertionSpec};
