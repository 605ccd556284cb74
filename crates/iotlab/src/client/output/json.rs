use serde_json::{Value, json};

use iotlab_core::{Experiment, NodeId};

use crate::client::output::outputs::Output;
use crate::client::transport::SubmissionReceipt;

#[derive(Default)]
pub struct JsonOutput;

impl JsonOutput {
    fn print(&self, data: Value) {
        match serde_json::to_string_pretty(&data) {
            Ok(text) => println!("{text}"),
            Err(e) => log::error!("Cannot serialize output: {e}"),
        }
    }
}

impl Output for JsonOutput {
    fn print_experiment_submitted(&self, _experiment: &Experiment, receipt: &SubmissionReceipt) {
        self.print(json!(receipt));
    }

    fn print_node_list(&self, nodes: &[NodeId]) {
        self.print(json!(nodes));
    }

    fn print_error(&self, error: anyhow::Error) {
        self.print(json!({ "error": format!("{error:?}") }));
    }
}
