pub mod base;
pub mod ruby;
pub mod sim;

pub use sim::config::TopologyConfig;
pub use sim::error::ConfigError;
