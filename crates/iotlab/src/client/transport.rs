use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use iotlab_core::submission::to_canonical_string;

use crate::client::files::FileBundle;
use crate::common::utils::fs::write_file;

pub const EXPERIMENT_FILE_NAME: &str = "experiment.json";

/// What happened to a submitted experiment.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SubmissionReceipt {
    /// Nothing was sent, the document is handed back for display.
    Dry { document: Value, files: Vec<String> },
    Saved {
        directory: PathBuf,
        document: PathBuf,
        files: Vec<String>,
    },
}

/// Delivers an encoded experiment and its payloads to the scheduler.
pub trait Transport {
    fn submit_experiment(
        &self,
        document: &Value,
        files: &FileBundle,
    ) -> crate::Result<SubmissionReceipt>;
}

fn file_names(files: &FileBundle) -> Vec<String> {
    files.iter().map(|(name, _)| name.to_string()).collect()
}

/// Returns the document without delivering it anywhere.
#[derive(Default)]
pub struct DryRunTransport;

impl Transport for DryRunTransport {
    fn submit_experiment(
        &self,
        document: &Value,
        files: &FileBundle,
    ) -> crate::Result<SubmissionReceipt> {
        Ok(SubmissionReceipt::Dry {
            document: document.clone(),
            files: file_names(files),
        })
    }
}

/// Stores the submission in a directory: the document as `experiment.json`
/// and every payload under its own name. The directory can be submitted later
/// with the `load` command.
pub struct DirectoryTransport {
    directory: PathBuf,
}

impl DirectoryTransport {
    pub fn new(directory: PathBuf) -> Self {
        DirectoryTransport { directory }
    }
}

impl Transport for DirectoryTransport {
    fn submit_experiment(
        &self,
        document: &Value,
        files: &FileBundle,
    ) -> crate::Result<SubmissionReceipt> {
        std::fs::create_dir_all(&self.directory)?;

        let document_path = self.directory.join(EXPERIMENT_FILE_NAME);
        let mut text = to_canonical_string(document)?;
        text.push('\n');
        write_file(&document_path, text.as_bytes())?;

        for (name, content) in files.iter() {
            write_file(&self.directory.join(name), content)?;
        }
        log::debug!(
            "Saved experiment with {} file(s) into {}",
            files.len(),
            self.directory.display()
        );
        Ok(SubmissionReceipt::Saved {
            directory: self.directory.clone(),
            document: document_path,
            files: file_names(files),
        })
    }
}
