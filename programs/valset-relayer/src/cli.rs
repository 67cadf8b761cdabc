//! Command line interface of the valset relayer.

use clap::{Parser, Subcommand};

/// Relays validator set updates from a Peggy enabled Cosmos chain to Ethereum.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct ValsetRelayerCli {
    /// The command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// The subcommands of the valset relayer.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Start relaying valsets.
    Start(StartArgs),
}

/// The arguments of the `start` subcommand.
#[derive(Clone, Debug, clap::Args)]
pub struct StartArgs {
    /// Path to the JSON configuration file.
    #[arg(long, short = 'c', default_value = "config.json")]
    pub config: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_with_config() {
        let cli = ValsetRelayerCli::try_parse_from([
            "valset_relayer",
            "start",
            "--config",
            "relayer.json",
        ])
        .unwrap();
        let Commands::Start(args) = cli.command;
        assert_eq!(args.config, "relayer.json");
    }

    #[test]
    fn start_defaults_config_path() {
        let cli = ValsetRelayerCli::try_parse_from(["valset_relayer", "start"]).unwrap();
        let Commands::Start(args) = cli.command;
        assert_eq!(args.config, "config.json");
    }

    #[test]
    fn rejects_missing_subcommand() {
        assert!(ValsetRelayerCli::try_parse_from(["valset_relayer"]).is_err());
    }
}
