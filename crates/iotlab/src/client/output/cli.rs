use cli_table::format::{Justify, Separator};
use cli_table::{Cell, CellStruct, ColorChoice, Style, Table, TableStruct, print_stdout};

use colored::Colorize;

use iotlab_core::associations::AssociationMap;
use iotlab_core::submission::to_canonical_string;
use iotlab_core::{Experiment, ExperimentNodes, NodeId, NodeRef};

use crate::client::output::common::group_nodes;
use crate::client::output::outputs::Output;
use crate::client::transport::SubmissionReceipt;
use crate::common::utils::time::format_reservation;

pub struct CliOutput {
    color_policy: ColorChoice,
}

impl CliOutput {
    pub fn new(color_policy: ColorChoice) -> CliOutput {
        CliOutput { color_policy }
    }

    fn print_vertical_table(&self, rows: Vec<Vec<CellStruct>>) {
        let table = rows.table().separator(
            Separator::builder()
                .column(Some(Default::default()))
                .build(),
        );
        self.print_table(table);
    }

    fn print_horizontal_table(&self, rows: Vec<Vec<CellStruct>>, header: Vec<CellStruct>) {
        let table = rows
            .table()
            .separator(
                Separator::builder()
                    .title(Some(Default::default()))
                    .column(Some(Default::default()))
                    .build(),
            )
            .title(header);
        self.print_table(table);
    }

    fn print_table(&self, table: TableStruct) {
        let table = table.color_choice(self.color_policy);
        if let Err(e) = print_stdout(table) {
            log::error!("Cannot print table to stdout: {e:?}");
        }
    }
}

impl Output for CliOutput {
    fn print_experiment_submitted(&self, experiment: &Experiment, receipt: &SubmissionReceipt) {
        let mut rows = vec![
            vec![
                "Name".cell().bold(true),
                experiment.name().unwrap_or("").cell(),
            ],
            vec![
                "Type".cell().bold(true),
                experiment
                    .experiment_type()
                    .map(|kind| kind.to_string())
                    .unwrap_or_default()
                    .cell(),
            ],
            vec![
                "Duration".cell().bold(true),
                format!("{} min", experiment.duration()).cell(),
            ],
            vec![
                "Reservation".cell().bold(true),
                experiment
                    .reservation()
                    .map(format_reservation)
                    .unwrap_or_else(|| "As soon as possible".to_string())
                    .cell(),
            ],
            vec![
                "Nodes".cell().bold(true),
                experiment.nodes().map(format_nodes).unwrap_or_default().cell(),
            ],
        ];
        if !experiment.firmware_associations().is_empty() {
            rows.push(vec![
                "Firmwares".cell().bold(true),
                format_association_map(experiment.firmware_associations()).cell(),
            ]);
        }
        if !experiment.profile_associations().is_empty() {
            rows.push(vec![
                "Profiles".cell().bold(true),
                format_association_map(experiment.profile_associations()).cell(),
            ]);
        }
        for (category, map) in experiment.associations() {
            rows.push(vec![
                category.as_str().cell().bold(true),
                format_association_map(map).cell(),
            ]);
        }
        for (category, map) in experiment.site_associations() {
            rows.push(vec![
                format!("{category} (sites)").cell().bold(true),
                format_association_map(map).cell(),
            ]);
        }

        match receipt {
            SubmissionReceipt::Dry { document, files } => {
                rows.push(vec!["Files".cell().bold(true), files.join("\n").cell()]);
                self.print_vertical_table(rows);
                match to_canonical_string(document) {
                    Ok(text) => println!("{text}"),
                    Err(e) => log::error!("Cannot render experiment document: {e}"),
                }
            }
            SubmissionReceipt::Saved {
                directory, files, ..
            } => {
                rows.push(vec!["Files".cell().bold(true), files.join("\n").cell()]);
                self.print_vertical_table(rows);
                println!(
                    "Experiment saved {} into {}",
                    "successfully".green(),
                    directory.display()
                );
            }
        }
    }

    fn print_node_list(&self, nodes: &[NodeId]) {
        let rows: Vec<_> = group_nodes(nodes)
            .into_iter()
            .map(|group| {
                vec![
                    group.site.cell(),
                    group.archi.cell(),
                    group.range().cell(),
                    group.numbers.len().cell().justify(Justify::Right),
                ]
            })
            .collect();
        let header = vec![
            "Site".cell().bold(true),
            "Architecture".cell().bold(true),
            "Nodes".cell().bold(true),
            "Count".cell().bold(true),
        ];
        self.print_horizontal_table(rows, header);
    }

    fn print_error(&self, error: anyhow::Error) {
        eprintln!("{error:?}");
    }
}

fn format_nodes(nodes: &ExperimentNodes) -> String {
    match nodes {
        ExperimentNodes::Physical(nodes) => group_nodes(nodes)
            .into_iter()
            .map(|group| format!("{} {} {}", group.site, group.archi, group.range()))
            .collect::<Vec<_>>()
            .join("\n"),
        ExperimentNodes::Alias(requests) => requests
            .iter()
            .map(|request| {
                let mut line = format!(
                    "#{}: {} x {} at {}",
                    request.alias,
                    request.nbnodes,
                    request.properties.archi,
                    request.properties.site
                );
                if request.properties.mobile {
                    line.push_str(" (mobile)");
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn format_association_map<T: Ord + Clone + std::fmt::Display>(map: &AssociationMap<T>) -> String {
    map.to_list()
        .into_iter()
        .map(|record| {
            let members: Vec<String> = record.members.iter().map(|m| m.to_string()).collect();
            format!("{}: {}", record.name, members.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
