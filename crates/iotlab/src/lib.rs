pub mod client;
pub mod common;

pub type Error = crate::common::error::ClientError;
pub type Result<T> = std::result::Result<T, Error>;

// Reexports
pub use iotlab_core;

pub const IOTLAB_VERSION: &str = env!("CARGO_PKG_VERSION");
