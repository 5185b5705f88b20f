mod catalog;
mod source;
mod sync;
mod types;

pub use source::*;
pub use sync::*;
pub use types::*;
