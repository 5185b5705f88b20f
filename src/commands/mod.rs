mod market;
mod restart;
mod server;
mod settings;
mod update;

pub use market::*;
pub use restart::*;
pub use server::*;
pub use settings::*;
pub use update::*;
