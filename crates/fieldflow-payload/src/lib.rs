mod error;
pub mod transform;

pub use error::{PayloadError, Result};
pub use transform::transform_snapshot;
