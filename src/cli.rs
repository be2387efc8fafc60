use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "chatcache", about = "Chat history paging and local message cache")]
pub struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Refresh a chat from a history file, then load older pages
    Sync {
        #[arg(long)]
        chat: i64,
        /// JSON history served as if it came from the chat engine
        #[arg(long)]
        history: PathBuf,
        /// Number of append loads after the refresh
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Print one page of the cached history, newest first
    Show {
        #[arg(long)]
        chat: i64,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Drop a chat's cached history and its attachments
    Clear {
        #[arg(long)]
        chat: i64,
    },
    /// List messages still waiting to be sent
    Pending {
        #[arg(long)]
        chat: i64,
    },
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn parses_sync_command_with_default_pages() {
        let cli = Cli::parse_from(["chatcache", "sync", "--chat", "7", "--history", "h.json"]);

        assert!(matches!(
            cli.command,
            Command::Sync { chat: 7, pages: 1, .. }
        ));
    }

    #[test]
    fn parses_global_config_after_subcommand() {
        let cli = Cli::parse_from(["chatcache", "show", "--chat", "3", "--config", "custom.toml"]);

        assert!(matches!(
            cli.command,
            Command::Show {
                chat: 3,
                offset: 0,
                limit: 20
            }
        ));
        assert_eq!(
            cli.config
                .as_deref()
                .map(|p| p.to_string_lossy().to_string()),
            Some("custom.toml".to_owned())
        );
    }

    #[test]
    fn requires_a_subcommand() {
        assert!(Cli::try_parse_from(["chatcache"]).is_err());
    }
}
