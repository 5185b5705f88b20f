pub mod document;
mod interpolate;
mod paths;
mod preferences;
mod store;
mod types;

pub use interpolate::*;
pub use paths::*;
pub use preferences::*;
pub use store::*;
pub use types::*;
