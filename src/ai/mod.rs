pub mod heuristics;
pub mod model;
pub mod prompt;
pub mod retry;
pub mod transform;

pub use model::{ModelClient, ModelError, ModelRequest, SharedModelClient};
pub use transform::{TransformAction, TransformError, TransformOutcome, Transformer};
