//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// One-shot private PKI - root CA plus server-auth and client-auth certificates
#[derive(Parser, Debug)]
#[command(name = "pki-issuer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "PKI_ISSUER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "PKI_ISSUER_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "PKI_ISSUER_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the issuance trigger over HTTP (default)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Issue a hierarchy once and write it to disk
    Issue {
        /// Host identity for the leaf certificates
        #[arg(long)]
        common_name: Option<String>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Verify persisted leaf certificates against the persisted root
    Verify {
        /// Directory holding ca/, server/ and client/
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Host the server certificate must be valid for
        #[arg(long)]
        common_name: Option<String>,
    },

    /// Print the effective configuration as YAML
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["pki-issuer"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn issue_accepts_common_name_and_out() {
        let cli = Cli::try_parse_from([
            "pki-issuer",
            "issue",
            "--common-name",
            "edge.local",
            "--out",
            "/tmp/pki",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Issue { common_name, out }) => {
                assert_eq!(common_name.as_deref(), Some("edge.local"));
                assert_eq!(out, Some(PathBuf::from("/tmp/pki")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli =
            Cli::try_parse_from(["pki-issuer", "serve", "--port", "4000", "--log-format", "json"])
                .unwrap();
        assert_eq!(cli.log_format.as_deref(), Some("json"));
        assert!(matches!(
            cli.command,
            Some(Command::Serve {
                port: Some(4000),
                ..
            })
        ));
    }
}
