//! PKI Issuer - one-shot private certificate hierarchy
//!
//! Serves `GET /generate` by default; `issue`, `verify` and `config` work
//! offline.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use pki_issuer::{
    cli::{Cli, Command},
    config::Config,
    http::IssuerServer,
    pki::{
        Holder, IssuedCertificate, Role, issue_hierarchy, load_certificate, persist_issuance,
        store, verify_leaf,
    },
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Command::Issue { common_name, out }) => run_issue(config, common_name, out),
        Some(Command::Verify { dir, common_name }) => run_verify(&config, dir, common_name),
        Some(Command::Config) => run_print_config(&config),
        Some(Command::Serve { port, host }) => run_server(config, port, host).await,
        None => run_server(config, None, None).await,
    }
}

/// Issue once and write to disk
fn run_issue(mut config: Config, common_name: Option<String>, out: Option<PathBuf>) -> ExitCode {
    if let Some(cn) = common_name {
        config.issuance.common_name = cn;
    }
    if let Some(dir) = out {
        config.issuance.output_dir = dir;
    }

    let issuance = match issue_hierarchy(&config.profile, &config.issuance.common_name) {
        Ok(issuance) => issuance,
        Err(e) => {
            eprintln!("❌ Issuance failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let dir = &config.issuance.output_dir;
    let failures = persist_issuance(dir, &issuance);
    for failure in &failures {
        eprintln!("❌ {failure}");
    }

    for material in issuance.iter() {
        println!(
            "✅ {:<6} serial {}",
            material.holder,
            material.certificate.serial()
        );
        println!("   {}", store::certificate_path(dir, material.holder).display());
        println!("   {}", store::key_path(dir, material.holder).display());
    }

    if failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Verify persisted leaves against the persisted root
fn run_verify(config: &Config, dir: Option<PathBuf>, common_name: Option<String>) -> ExitCode {
    let dir = dir.unwrap_or_else(|| config.issuance.output_dir.clone());
    let host = common_name.unwrap_or_else(|| config.issuance.common_name.clone());

    let root = match load_certificate(&dir, Holder::Ca) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("❌ Cannot load root certificate: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut ok = true;
    for role in Role::ALL {
        ok &= verify_one(&dir, &root, role, &host);
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn verify_one(dir: &Path, root: &IssuedCertificate, role: Role, host: &str) -> bool {
    let result = load_certificate(dir, Holder::Leaf(role))
        .and_then(|leaf| verify_leaf(root, &leaf, role, host).map(|()| leaf));
    match result {
        Ok(leaf) => {
            let summary = leaf.summary();
            println!("✅ {role} - chains to '{}'", root.label());
            println!("   Subject CN: {}", leaf.label());
            println!(
                "   OU: {}",
                summary.organizational_unit.as_deref().unwrap_or("-")
            );
            for name in &summary.alt_names {
                println!("   SAN: {name}");
            }
            true
        }
        Err(e) => {
            eprintln!("❌ {role} - {e}");
            false
        }
    }
}

/// Print the effective configuration
fn run_print_config(config: &Config) -> ExitCode {
    match config.to_yaml() {
        Ok(yaml) => {
            print!("{yaml}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run the HTTP trigger
async fn run_server(mut config: Config, port: Option<u16>, host: Option<String>) -> ExitCode {
    // Apply CLI overrides
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        common_name = %config.issuance.common_name,
        "Starting PKI issuer"
    );

    if let Err(e) = IssuerServer::new(config).run().await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}
