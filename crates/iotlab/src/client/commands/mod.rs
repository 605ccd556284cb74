use std::path::PathBuf;

use crate::client::transport::{DirectoryTransport, DryRunTransport, Transport};
use crate::common::utils::fs::absolute_path;

pub mod load;
pub mod nodes;
pub mod submit;

/// Saves into `directory` when given, otherwise only hands the document back.
pub(crate) fn make_transport(directory: Option<PathBuf>) -> Box<dyn Transport> {
    match directory {
        Some(directory) => Box::new(DirectoryTransport::new(absolute_path(directory))),
        None => Box::<DryRunTransport>::default(),
    }
}
