use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use iotlab_core::submission::check_round_trip;
use iotlab_core::{Experiment, SiteRegistry, parse_resource_spec, parse_site_association};

use crate::client::commands::make_transport;
use crate::client::files::{FileBundle, is_file_site_category};
use crate::client::globalsettings::GlobalSettings;
use crate::common::utils::time::parse_reservation;

#[derive(Parser)]
pub struct SubmitOpts {
    /// Duration of the experiment in minutes
    #[arg(short = 'd', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub duration: u32,

    /// Name of the experiment
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Start of the experiment, as a unix timestamp or a local "YYYY-MM-DD HH:MM" date.
    /// The experiment starts as soon as possible when not given.
    #[arg(short = 'r', long, value_parser = parse_reservation)]
    pub reservation: Option<i64>,

    /// Resource specification.
    ///
    /// Physical nodes: `site,archi,range[,firmware[,profile]][,key=value...]`,
    /// e.g. `grenoble,m3,1-4+6,tutorial.elf,battery`.
    ///
    /// Nodes chosen by the scheduler: `count,archi=<archi>+site=<site>[+mobile=<bool>][,firmware[,profile]]`.
    ///
    /// Firmwares are paths to files that are attached to the experiment.
    #[arg(short = 'l', long = "list", required = true)]
    pub list: Vec<String>,

    /// Site association, e.g. `grenoble+lille,script=run.sh,scriptconfig=config.txt`.
    /// Scripts and script configurations are paths to files that are attached to the experiment.
    #[arg(short = 's', long = "site-association")]
    pub site_associations: Vec<String>,

    /// Save the experiment document and its files into the given directory
    /// instead of only printing the document
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub save: Option<PathBuf>,
}

/// Builds the experiment described by the command line options and collects
/// the files it references.
pub fn build_experiment(
    registry: &dyn SiteRegistry,
    opts: &SubmitOpts,
) -> anyhow::Result<(Experiment, FileBundle)> {
    let mut experiment = Experiment::new(opts.name.clone(), opts.duration, opts.reservation);
    let mut files = FileBundle::default();

    for token in &opts.list {
        let mut spec = parse_resource_spec(token, registry)
            .with_context(|| format!("Invalid resource specification '{token}'"))?;
        if let Some(firmware) = spec.firmware.take() {
            spec.firmware = Some(files.add_file(Path::new(&firmware))?);
        }
        experiment
            .add_resources(spec)
            .with_context(|| format!("Cannot add '{token}' to the experiment"))?;
    }

    for token in &opts.site_associations {
        let mut spec = parse_site_association(token, registry)
            .with_context(|| format!("Invalid site association '{token}'"))?;
        for (category, value) in spec.associations.iter_mut() {
            if is_file_site_category(category) {
                *value = files.add_file(Path::new(value.as_str()))?;
            }
        }
        experiment.add_site_association(spec);
    }

    Ok((experiment, files))
}

pub fn submit_experiment(gsettings: &GlobalSettings, opts: SubmitOpts) -> anyhow::Result<()> {
    let (experiment, files) = build_experiment(gsettings.registry(), &opts)?;
    let document = check_round_trip(&experiment)?;

    let receipt = make_transport(opts.save).submit_experiment(&document, &files)?;
    gsettings
        .printer()
        .print_experiment_submitted(&experiment, &receipt);
    Ok(())
}
