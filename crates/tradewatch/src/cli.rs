//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};
use tradewatch_core::MonitorKind;

/// tradewatch - background order-condition and stop-loss monitors
#[derive(Parser, Debug)]
#[command(name = "tradewatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "TRADEWATCH_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start all enabled monitors and run until interrupted
    Run,

    /// Show which monitors are enabled
    Status {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Enable a monitor (orderCondition, stopLoss)
    Enable {
        /// Monitor to enable
        monitor: MonitorKind,
    },

    /// Disable a monitor (orderCondition, stopLoss)
    Disable {
        /// Monitor to disable
        monitor: MonitorKind,
    },

    /// Enable only this monitor and disable every other one
    Exclusive {
        /// Monitor to keep enabled
        monitor: MonitorKind,
    },

    /// Re-enable every monitor
    Reset,

    /// Write a default config file if none exists
    Init,

    /// Show version
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_monitor_names() {
        let cli = Cli::parse_from(["tradewatch", "exclusive", "stop-loss"]);
        match cli.command {
            Commands::Exclusive { monitor } => assert_eq!(monitor, MonitorKind::StopLoss),
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["tradewatch", "enable", "trailingStop"]).is_err());
    }
}
