//! `dns-records`: add, delete, or print DNS reservations in SLS.
//!
//! Idempotent: re-running an add or delete is safe. Changing an
//! existing record requires `--force`; matching for the forced
//! replace/delete is by IP address only.

use std::process::ExitCode;

use anyhow::{bail, Context as _};
use ridgeline_client::sls::SlsClient;
use ridgeline_core::dns::{self, ApplyOutcome};

#[derive(Debug, clap::Args)]
pub struct DnsRecordsArgs {
    /// Reservation in /etc/hosts format: "IPAddress Name [Alias...]".
    #[arg(short = 'i', long = "record")]
    pub record: Option<String>,
    /// Pretty-print existing reservations and exit.
    #[arg(short = 'p', long = "print")]
    pub print: bool,
    /// Delete the record instead of adding it.
    #[arg(short = 'x', long = "delete", requires = "record")]
    pub delete: bool,
    /// Replace an existing record that matches the input.
    #[arg(short = 'f', long = "force")]
    pub force: bool,
}

pub async fn run(args: DnsRecordsArgs) -> anyhow::Result<ExitCode> {
    if !args.print && args.record.is_none() {
        bail!("nothing to do: pass --record or --print");
    }

    let (config, token) = super::authenticate().await?;
    let sls = SlsClient::new(&config, token);
    let mut networks = sls
        .networks()
        .await
        .context("fetching networks from SLS")?;

    if args.print {
        print!("{}", dns::render_reservations(&networks));
        return Ok(ExitCode::SUCCESS);
    }

    let input = args.record.as_deref().unwrap_or_default();
    let record = dns::parse_record(input)?;
    println!("New record: {input}");

    let matches = dns::find_matches(&record, &networks);
    if matches.is_empty() {
        println!("No existing record match.");
        if args.delete {
            println!("No reservation with that address to delete.");
            return Ok(ExitCode::SUCCESS);
        }

        let Some((idx, _)) = dns::apply_record(&record, &mut networks, false) else {
            bail!(
                "no network or subnet contains {}; use --print to check available data",
                record.ip
            );
        };
        sls.put_network(&networks[idx])
            .await
            .context("writing updated network to SLS")?;
        println!("Created new reservation record in SLS");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Existing record match.");
    for found in &matches {
        println!("  Existing: {}", dns::reservation_line(&found.reservation));
        println!("  New     : {input}");
    }

    if !args.force {
        println!("Cowardly refusing to update without --force");
        return Ok(ExitCode::SUCCESS);
    }

    match dns::apply_record(&record, &mut networks, args.delete) {
        Some((idx, outcome)) => {
            let network = &networks[idx];
            match outcome {
                ApplyOutcome::Deleted => {
                    println!(
                        "Deleted reservation record in network structure: {}",
                        network.name
                    );
                }
                ApplyOutcome::Added | ApplyOutcome::Replaced => {
                    println!(
                        "Updated reservation record in network structure: {}",
                        network.name
                    );
                }
            }
            sls.put_network(network)
                .await
                .context("writing updated network to SLS")?;
            println!(
                "{} reservation record in SLS",
                if args.delete { "Deleted" } else { "Replaced" }
            );
        }
        None => {
            // Matched by name or alias only; there is no reservation
            // with this IP to replace or delete.
            println!("No reservation with that exact address; nothing changed.");
        }
    }

    Ok(ExitCode::SUCCESS)
}
