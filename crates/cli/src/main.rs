//! `ridgeline` -- administrative tools for the HPC management plane.
//!
//! Each subcommand is an independent, run-to-completion sequence:
//! authenticate, fetch, reconcile, report or mutate, exit. Exit codes
//! follow the reports: any FAIL-classified result exits non-zero.
//!
//! # Environment variables
//!
//! | Variable                   | Required | Default | Description                      |
//! |----------------------------|----------|---------|----------------------------------|
//! | `RIDGELINE_GATEWAY_URL`    | no       | `https://api-gw-service-nmn.local` | Management API gateway |
//! | `RIDGELINE_CLIENT_SECRET`  | no       | --      | Overrides the Kubernetes secret lookup |
//! | `RIDGELINE_K8S_API_URL`    | no       | `https://kubernetes.default.svc` | Kubernetes API server |

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "ridgeline", version, about = "Administrative tools for the HPC management plane")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lock any management nodes not already locked in HSM.
    LockNodes,
    /// Cross-check SLS layout against HSM components and Redfish endpoints.
    VerifyDiscovery,
    /// Repair river BMCs whose Redfish endpoint discovery went stale.
    EndpointFixup,
    /// Rewrite BGP configuration on the management switch pair from SLS.
    BgpUpdate(commands::bgp_update::BgpUpdateArgs),
    /// Add, delete, or print DNS reservations held in SLS networks.
    DnsRecords(commands::dns_records::DnsRecordsArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ridgeline=info,ridgeline_client=info,ridgeline_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::LockNodes => commands::lock_nodes::run().await,
        Command::VerifyDiscovery => commands::verify_discovery::run().await,
        Command::EndpointFixup => commands::endpoint_fixup::run().await,
        Command::BgpUpdate(args) => commands::bgp_update::run(args).await,
        Command::DnsRecords(args) => commands::dns_records::run(args).await,
    };

    match result {
        Ok(code) => code,
        Err(error) => {
            tracing::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}
