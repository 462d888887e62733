use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use opencode_types::Protocol;
use tracing_subscriber::EnvFilter;

mod commands;

/// Connection-health companion for an OpenCode server.
#[derive(Debug, Parser)]
#[command(name = "opencode-companion", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Probe the server once and report whether it is reachable
    Check {
        /// Print the request that would be sent, with credentials redacted
        #[arg(long)]
        dry_run: bool,
    },
    /// Monitor the server in the foreground, logging every result until Ctrl+C
    Monitor,
    /// Show the interactive status bar (default)
    Watch,
    /// Inspect or edit connection settings
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage the keychain entry a credential reference points to
    #[command(subcommand)]
    Secret(SecretCommand),
    /// Print the URL of the embedded web view
    Url,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the current settings
    Show,
    /// Print the settings file location
    Path,
    /// Change settings and test the connection
    Set(SetArgs),
}

#[derive(Debug, Args)]
#[group(required = true, multiple = true)]
struct SetArgs {
    /// Hostname or IP address of the server
    #[arg(long, value_parser = opencode_util::parse_host)]
    host: Option<String>,
    /// Port the server listens on
    #[arg(long, value_parser = opencode_util::parse_port)]
    port: Option<u16>,
    /// `http` or `https`
    #[arg(long)]
    protocol: Option<Protocol>,
    /// Name of the secret holding the server password; empty to clear
    #[arg(long)]
    credential_ref: Option<String>,
}

#[derive(Debug, Subcommand)]
enum SecretCommand {
    /// Store a secret (read from stdin when --value is omitted)
    Set {
        name: String,
        #[arg(long)]
        value: Option<String>,
    },
    /// Delete a stored secret
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Watch);
    // The status bar owns the terminal; keep logs quiet unless asked.
    let default_filter = if matches!(command, Command::Watch) { "warn" } else { "info" };
    init_tracing(default_filter);

    match command {
        Command::Check { dry_run } => commands::check(dry_run).await,
        Command::Monitor => commands::monitor().await,
        Command::Watch => commands::watch().await,
        Command::Config(ConfigCommand::Show) => commands::config_show(),
        Command::Config(ConfigCommand::Path) => commands::config_path(),
        Command::Config(ConfigCommand::Set(args)) => {
            commands::config_set(commands::SettingsEdit {
                host: args.host,
                port: args.port,
                protocol: args.protocol,
                credential_ref: args.credential_ref,
            })
            .await
        }
        Command::Secret(SecretCommand::Set { name, value }) => commands::secret_set(&name, value),
        Command::Secret(SecretCommand::Remove { name }) => commands::secret_remove(&name),
        Command::Url => commands::url(),
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_watch() {
        let cli = Cli::try_parse_from(["opencode-companion"]).expect("parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn config_set_validates_at_the_boundary() {
        let cli = Cli::try_parse_from(["opencode-companion", "config", "set", "--port", "4100", "--protocol", "HTTPS"]).expect("parse");
        let Some(Command::Config(ConfigCommand::Set(args))) = cli.command else {
            panic!("expected config set");
        };
        assert_eq!(args.port, Some(4100));
        assert_eq!(args.protocol, Some(Protocol::Https));
        assert_eq!(args.host, None);

        assert!(Cli::try_parse_from(["opencode-companion", "config", "set", "--port", "40g6"]).is_err());
        assert!(Cli::try_parse_from(["opencode-companion", "config", "set", "--port", "70000"]).is_err());
        assert!(Cli::try_parse_from(["opencode-companion", "config", "set", "--host", ""]).is_err());
        assert!(Cli::try_parse_from(["opencode-companion", "config", "set", "--protocol", "ftp"]).is_err());
    }

    #[test]
    fn config_set_requires_a_field() {
        assert!(Cli::try_parse_from(["opencode-companion", "config", "set"]).is_err());
    }

    #[test]
    fn check_accepts_dry_run() {
        let cli = Cli::try_parse_from(["opencode-companion", "check", "--dry-run"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Check { dry_run: true })));
    }

    #[test]
    fn secret_set_value_is_optional() {
        let cli = Cli::try_parse_from(["opencode-companion", "secret", "set", "opencode-password"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Secret(SecretCommand::Set { value: None, .. }))));
    }
}
