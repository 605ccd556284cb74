use std::path::PathBuf;

use clap::Parser;

use crate::client::commands::load::LoadOpts;
use crate::client::commands::nodes::NodesOpts;
use crate::client::commands::submit::SubmitOpts;
use crate::client::output::outputs::Outputs;

#[derive(clap::ValueEnum, Clone)]
pub enum ColorPolicy {
    /// Use colors if the stdout is detected to be a terminal.
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

// Common CLI options
#[derive(Parser)]
pub struct CommonOpts {
    /// Path to the client configuration file
    #[arg(
        long,
        value_hint = clap::ValueHint::FilePath,
        global = true,
        env = "IOTLAB_CONFIG",
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub config: Option<PathBuf>,

    /// Sets console color policy
    #[arg(
        long,
        default_value_t = ColorPolicy::Auto,
        value_enum,
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub colors: ColorPolicy,

    /// Sets output formatting
    #[arg(
        long,
        env = "IOTLAB_OUTPUT_MODE",
        default_value_t = Outputs::CLI,
        value_enum,
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub output_mode: Outputs,

    /// Enables more detailed log output
    #[arg(
        long,
        env = "IOTLAB_DEBUG",
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub debug: bool,
}

// Root CLI options
#[derive(Parser)]
#[command(
    author,
    about,
    version(crate::IOTLAB_VERSION),
    disable_help_subcommand(true),
    help_expected(true)
)]
pub struct RootOptions {
    #[clap(flatten)]
    pub common: CommonOpts,

    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Parser)]
pub enum SubCommand {
    /// Build an experiment from resource specifications and submit it
    Submit(SubmitOpts),
    /// Submit an experiment stored as a JSON document
    Load(LoadOpts),
    /// Expand physical resource specifications into node identifiers
    Nodes(NodesOpts),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        RootOptions::command().debug_assert();
    }

    #[test]
    fn parse_submit_command() {
        let opts = RootOptions::try_parse_from([
            "iotlab-experiment",
            "--output-mode",
            "quiet",
            "submit",
            "-d",
            "20",
            "-l",
            "grenoble,m3,1-3",
            "-l",
            "lille,m3,5",
        ])
        .unwrap();
        assert!(matches!(opts.common.output_mode, Outputs::Quiet));
        let SubCommand::Submit(submit) = opts.subcmd else {
            panic!("Expected submit command");
        };
        assert_eq!(submit.duration, 20);
        assert_eq!(submit.list, vec!["grenoble,m3,1-3", "lille,m3,5"]);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let result = RootOptions::try_parse_from([
            "iotlab-experiment",
            "submit",
            "-d",
            "0",
            "-l",
            "grenoble,m3,1",
        ]);
        assert!(result.is_err());
    }
}
