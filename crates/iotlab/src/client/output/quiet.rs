use iotlab_core::submission::to_canonical_string;
use iotlab_core::{Experiment, NodeId};

use crate::client::output::outputs::Output;
use crate::client::transport::SubmissionReceipt;

#[derive(Default)]
pub struct Quiet;

impl Output for Quiet {
    fn print_experiment_submitted(&self, _experiment: &Experiment, receipt: &SubmissionReceipt) {
        match receipt {
            SubmissionReceipt::Dry { document, .. } => match to_canonical_string(document) {
                Ok(text) => println!("{text}"),
                Err(e) => log::error!("Cannot render experiment document: {e}"),
            },
            SubmissionReceipt::Saved { directory, .. } => println!("{}", directory.display()),
        }
    }

    fn print_node_list(&self, nodes: &[NodeId]) {
        for node in nodes {
            println!("{node}");
        }
    }

    fn print_error(&self, error: anyhow::Error) {
        eprintln!("{error:?}");
    }
}
