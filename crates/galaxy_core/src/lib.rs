pub mod config;
pub mod constants;
pub mod types;

pub use config::{GalaxyConfig, QualityTier};
pub use constants::*;
pub use types::*;
