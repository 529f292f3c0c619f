pub mod config;
pub mod episode;
pub mod session;

pub use config::{BackendConfig, Config};
pub use episode::*;
pub use session::*;
