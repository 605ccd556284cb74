use iotlab_core::{Experiment, NodeId};

use crate::client::transport::SubmissionReceipt;

#[derive(clap::ValueEnum, Clone)]
pub enum Outputs {
    CLI,
    JSON,
    Quiet,
}

pub trait Output {
    // Experiments
    fn print_experiment_submitted(&self, experiment: &Experiment, receipt: &SubmissionReceipt);

    // Nodes
    fn print_node_list(&self, nodes: &[NodeId]);

    // Errors
    fn print_error(&self, error: anyhow::Error);
}
