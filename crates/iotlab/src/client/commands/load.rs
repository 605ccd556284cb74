use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde_json::Value;

use iotlab_core::Experiment;
use iotlab_core::submission::{check_round_trip, decode};

use crate::client::commands::make_transport;
use crate::client::files::{FILE_SITE_CATEGORIES, FileBundle};
use crate::client::globalsettings::GlobalSettings;
use crate::common::error::ClientError;
use crate::common::utils::fs::{file_name, read_file};

#[derive(Parser)]
pub struct LoadOpts {
    /// Path to the experiment document
    #[arg(short = 'f', long, value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Files referenced by the experiment.
    /// Files that are not given are looked up next to the experiment document.
    #[arg(short = 'l', long = "list", value_hint = clap::ValueHint::FilePath)]
    pub list: Vec<PathBuf>,

    /// Save the experiment document and its files into the given directory
    /// instead of only printing the document
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub save: Option<PathBuf>,
}

/// Names of the files an experiment refers to: firmwares, scripts and script configurations.
fn referenced_files(experiment: &Experiment) -> Vec<String> {
    let mut names: Vec<String> = experiment
        .firmware_associations()
        .names()
        .map(|name| name.to_string())
        .collect();
    for category in FILE_SITE_CATEGORIES {
        if let Some(map) = experiment.site_associations().get(*category) {
            names.extend(map.names().map(|name| name.to_string()));
        }
    }
    names.sort();
    names.dedup();
    names
}

fn resolve_file(
    name: &str,
    explicit: &BTreeMap<String, &PathBuf>,
    document_dir: &Path,
) -> crate::Result<PathBuf> {
    if Path::new(name).file_name().and_then(|n| n.to_str()) != Some(name) {
        return Err(ClientError::GenericError(format!(
            "Experiment references '{name}', which is not a plain file name"
        )));
    }
    if let Some(path) = explicit.get(name) {
        return Ok(path.to_path_buf());
    }
    let path = document_dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ClientError::MissingFile(name.to_string()))
    }
}

/// Reads an experiment document and the files it references.
pub fn load_experiment(
    path: &Path,
    files: &[PathBuf],
) -> anyhow::Result<(Experiment, FileBundle)> {
    let content = read_file(path)?;
    let document: Value = serde_json::from_slice(&content)
        .with_context(|| format!("Cannot parse experiment document {}", path.display()))?;
    let experiment = decode(&document)
        .with_context(|| format!("Invalid experiment document {}", path.display()))?;

    let mut explicit = BTreeMap::new();
    for file in files {
        explicit.insert(file_name(file)?, file);
    }
    let document_dir = path.parent().unwrap_or(Path::new("."));

    let mut bundle = FileBundle::default();
    for name in referenced_files(&experiment) {
        let file = resolve_file(&name, &explicit, document_dir)?;
        bundle.insert(&name, read_file(&file)?)?;
        explicit.remove(&name);
    }
    for unused in explicit.values() {
        log::warn!(
            "File {} is not referenced by the experiment",
            unused.display()
        );
    }
    Ok((experiment, bundle))
}

pub fn load_and_submit_experiment(
    gsettings: &GlobalSettings,
    opts: LoadOpts,
) -> anyhow::Result<()> {
    let (experiment, files) = load_experiment(&opts.file, &opts.list)?;
    let document = check_round_trip(&experiment)?;

    let receipt = make_transport(opts.save).submit_experiment(&document, &files)?;
    gsettings
        .printer()
        .print_experiment_submitted(&experiment, &receipt);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::commands::submit::{SubmitOpts, build_experiment};
    use crate::client::transport::{
        DirectoryTransport, EXPERIMENT_FILE_NAME, SubmissionReceipt, Transport,
    };
    use iotlab_core::StaticSiteRegistry;
    use iotlab_core::submission::encode;
    use tempfile::TempDir;

    fn save_experiment(dir: &Path) -> (Experiment, PathBuf) {
        let sources = dir.join("sources");
        std::fs::create_dir(&sources).unwrap();
        std::fs::write(sources.join("tp.elf"), b"firmware").unwrap();
        std::fs::write(sources.join("run.sh"), b"#!/bin/sh").unwrap();

        let opts = SubmitOpts {
            duration: 60,
            name: Some("saved".to_string()),
            reservation: Some(1_900_000_000),
            list: vec![format!(
                "grenoble,m3,1-3,{},mobility=circle",
                sources.join("tp.elf").display()
            )],
            site_associations: vec![format!(
                "grenoble,script={}",
                sources.join("run.sh").display()
            )],
            save: None,
        };
        let (experiment, files) =
            build_experiment(&StaticSiteRegistry::default(), &opts).unwrap();

        let target = dir.join("saved");
        let document = check_round_trip(&experiment).unwrap();
        let receipt = DirectoryTransport::new(target.clone())
            .submit_experiment(&document, &files)
            .unwrap();
        assert!(matches!(receipt, SubmissionReceipt::Saved { .. }));
        (experiment, target)
    }

    #[test]
    fn saved_experiment_can_be_loaded() {
        let dir = TempDir::new().unwrap();
        let (experiment, target) = save_experiment(dir.path());

        let (loaded, files) = load_experiment(&target.join(EXPERIMENT_FILE_NAME), &[]).unwrap();
        assert_eq!(loaded, experiment);
        assert_eq!(encode(&loaded).unwrap(), encode(&experiment).unwrap());
        assert_eq!(files.get("tp.elf"), Some(b"firmware".as_slice()));
        assert_eq!(files.get("run.sh"), Some(b"#!/bin/sh".as_slice()));
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn explicit_files_take_precedence() {
        let dir = TempDir::new().unwrap();
        let (_, target) = save_experiment(dir.path());
        let replacement = dir.path().join("tp.elf");
        std::fs::write(&replacement, b"rebuilt").unwrap();

        let (_, files) =
            load_experiment(&target.join(EXPERIMENT_FILE_NAME), &[replacement]).unwrap();
        assert_eq!(files.get("tp.elf"), Some(b"rebuilt".as_slice()));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let (_, target) = save_experiment(dir.path());
        std::fs::remove_file(target.join("run.sh")).unwrap();

        let error = load_experiment(&target.join(EXPERIMENT_FILE_NAME), &[]).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ClientError>(),
            Some(ClientError::MissingFile(name)) if name == "run.sh"
        ));
    }

    #[test]
    fn file_names_with_directories_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(EXPERIMENT_FILE_NAME);
        let document = serde_json::json!({
            "duration": 10,
            "type": "physical",
            "nodes": ["m3-1.grenoble.iot-lab.info"],
            "firmwareassociations": [
                {"firmwarename": "../fw.elf", "nodes": ["m3-1.grenoble.iot-lab.info"]}
            ]
        });
        std::fs::write(&path, document.to_string()).unwrap();

        let error = load_experiment(&path, &[]).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ClientError>(),
            Some(ClientError::GenericError(_))
        ));
    }

    #[test]
    fn invalid_document_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(EXPERIMENT_FILE_NAME);
        std::fs::write(&path, "{\"duration\": 10}").unwrap();
        assert!(load_experiment(&path, &[]).is_err());
    }
}
