use std::io::IsTerminal;

use clap::Parser;
use cli_table::ColorChoice;

use iotlab::client::commands::load::load_and_submit_experiment;
use iotlab::client::commands::nodes::print_nodes;
use iotlab::client::commands::submit::submit_experiment;
use iotlab::client::default_config_path;
use iotlab::client::globalsettings::GlobalSettings;
use iotlab::client::output::cli::CliOutput;
use iotlab::client::output::json::JsonOutput;
use iotlab::client::output::outputs::{Output, Outputs};
use iotlab::client::output::quiet::Quiet;
use iotlab::common::cli::{ColorPolicy, CommonOpts, RootOptions, SubCommand};
use iotlab::common::config::ClientConfig;
use iotlab::common::setup::setup_logging;

fn make_printer(opts: &CommonOpts) -> Box<dyn Output> {
    let color_policy = match opts.colors {
        ColorPolicy::Always => ColorChoice::AlwaysAnsi,
        ColorPolicy::Auto => {
            if std::io::stdout().is_terminal() {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            }
        }
        ColorPolicy::Never => ColorChoice::Never,
    };

    match opts.output_mode {
        Outputs::CLI => {
            // Set colored public for CLI
            match color_policy {
                ColorChoice::Always | ColorChoice::AlwaysAnsi => {
                    colored::control::set_override(true)
                }
                ColorChoice::Never => colored::control::set_override(false),
                _ => {}
            }

            Box::new(CliOutput::new(color_policy))
        }
        Outputs::JSON => Box::<JsonOutput>::default(),
        Outputs::Quiet => Box::<Quiet>::default(),
    }
}

fn load_config(opts: &CommonOpts) -> iotlab::Result<ClientConfig> {
    match &opts.config {
        Some(path) => ClientConfig::load_or_default(path, true),
        None => ClientConfig::load_or_default(&default_config_path(), false),
    }
}

fn main() -> iotlab::Result<()> {
    let top_opts = RootOptions::parse();

    setup_logging(top_opts.common.debug);

    let printer = make_printer(&top_opts.common);
    let config = match load_config(&top_opts.common) {
        Ok(config) => config,
        Err(e) => {
            printer.print_error(e.into());
            std::process::exit(1);
        }
    };
    let gsettings = GlobalSettings::new(&config, printer);

    let result = match top_opts.subcmd {
        SubCommand::Submit(opts) => submit_experiment(&gsettings, opts),
        SubCommand::Load(opts) => load_and_submit_experiment(&gsettings, opts),
        SubCommand::Nodes(opts) => print_nodes(&gsettings, opts),
    };

    if let Err(e) = result {
        gsettings.printer().print_error(e);
        std::process::exit(1);
    }

    Ok(())
}
