pub mod config;
pub mod error;
pub mod types;

pub use config::CampusConfig;
pub use error::{CampusError, Result};
pub use types::*;
