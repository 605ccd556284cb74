use std::collections::BTreeSet;

use anyhow::{Context, bail};
use clap::Parser;

use iotlab_core::selection::NodeSelection;
use iotlab_core::{NodeId, SiteRegistry, parse_resource_spec};

use crate::client::globalsettings::GlobalSettings;

#[derive(Parser)]
pub struct NodesOpts {
    /// Physical resource specification `site,archi,range`, e.g. `grenoble,m3,1-4+6`.
    /// Firmwares and other associations in the specification are ignored.
    #[arg(short = 'l', long = "list", required = true)]
    pub list: Vec<String>,
}

/// Expands physical specifications into sorted, deduplicated node identifiers.
pub fn expand_nodes(registry: &dyn SiteRegistry, specs: &[String]) -> anyhow::Result<Vec<NodeId>> {
    let mut nodes = BTreeSet::new();
    for token in specs {
        let spec = parse_resource_spec(token, registry)
            .with_context(|| format!("Invalid resource specification '{token}'"))?;
        match spec.selection {
            NodeSelection::Physical(selected) => nodes.extend(selected),
            NodeSelection::Alias(_) => {
                bail!("'{token}' requests nodes by properties and does not name physical nodes")
            }
        }
    }
    Ok(nodes.into_iter().collect())
}

pub fn print_nodes(gsettings: &GlobalSettings, opts: NodesOpts) -> anyhow::Result<()> {
    let nodes = expand_nodes(gsettings.registry(), &opts.list)?;
    gsettings.printer().print_node_list(&nodes);
    Ok(())
}
