mod document;
mod result;
mod sink;

pub use document::*;
pub use result::*;
pub use sink::*;
