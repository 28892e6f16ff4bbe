//! CLI definitions for managing a local multi-client devnet.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Default directory for generated devnet data.
pub const DEFAULT_OUTPUT_DIR: &str = ".merge-devnet";

/// Manage a local multi-client EL/CL devnet
#[derive(Parser, Debug)]
#[command(name = "merge-devnet", about = "Manage a local multi-client EL/CL devnet")]
pub struct MergeDevnetCli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Output directory shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct OutputDirArgs {
    /// Directory holding genesis data, keystores and `network.json`
    #[arg(long, env = "MERGE_DEVNET_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
}

/// Available subcommands for the devnet CLI
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate genesis and start every participant
    Start {
        /// JSON testnet parameters. Defaults apply when omitted
        #[arg(long)]
        params: Option<PathBuf>,
        #[command(flatten)]
        output: OutputDirArgs,
    },
    /// Show participants of the running devnet
    Summary {
        #[command(flatten)]
        output: OutputDirArgs,
    },
    /// Remove generated data and the devnet network
    Clean {
        #[command(flatten)]
        output: OutputDirArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start() {
        let cli = MergeDevnetCli::try_parse_from([
            "merge-devnet",
            "start",
            "--params",
            "params.json",
            "--output-dir",
            "/tmp/devnet",
        ])
        .unwrap();

        match cli.command {
            Command::Start { params, output } => {
                assert_eq!(params, Some(PathBuf::from("params.json")));
                assert_eq!(output.output_dir, PathBuf::from("/tmp/devnet"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_default_output_dir() {
        let cli = MergeDevnetCli::try_parse_from(["merge-devnet", "summary"]).unwrap();
        let Command::Summary { output } = cli.command else { panic!("expected summary") };
        assert_eq!(output.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }
}
