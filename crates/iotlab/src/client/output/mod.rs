pub mod cli;
mod common;
pub mod json;
pub mod outputs;
pub mod quiet;
