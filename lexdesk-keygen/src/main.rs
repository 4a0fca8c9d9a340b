//! LexDesk license key tool.
//!
//! Run by the vendor, offline, to mint keys for machine ids customers send
//! in. Also prints the local machine id and access state for support.
//!
//! Usage:
//!   lexdesk-keygen issue 1A2B3C4D-5E6F7081-92A3B4C5-D6E7F809
//!   lexdesk-keygen verify <MACHINE_ID> <KEY>
//!   lexdesk-keygen machine-id
//!   lexdesk-keygen status --config ~/.config/lexdesk/license.toml

use std::{path::PathBuf, process::ExitCode};
use anyhow::Result;
use clap::{Parser, Subcommand};
use lexdesk_keygen::{issue, status, verify};
use lexdesk_license::{generate_fingerprint, LicenseConfig};
use serde::Serialize;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "lexdesk-keygen")]
#[command(about = "Issue and verify LexDesk license keys")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mint the license key for a customer's machine id
    Issue {
        /// Machine id as shown in the customer's activation window
        machine_id: String,
    },
    /// Check a license key against a machine id
    Verify {
        machine_id: String,
        key: String,
    },
    /// Print this machine's id
    MachineId,
    /// Print this machine's license state
    Status {
        /// License config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    debug!(command = ?args.command, "Running");

    match args.command {
        Command::Issue { machine_id } => {
            let issued = issue(&machine_id)?;
            if args.json {
                print_json(&issued)?;
            } else {
                println!("{}", issued.license_key);
            }
        }
        Command::Verify { machine_id, key } => {
            let report = verify(&machine_id, &key)?;
            if args.json {
                print_json(&report)?;
            } else if report.valid {
                println!("valid");
            } else {
                println!("invalid: {}", report.reason.as_deref().unwrap_or("unknown"));
            }
            if !report.valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::MachineId => {
            println!("{}", generate_fingerprint());
        }
        Command::Status { config } => {
            let config = config
                .map(LicenseConfig::load_from)
                .unwrap_or_default();
            let report = status(config).await?;
            if args.json {
                print_json(&report)?;
            } else {
                println!("Machine ID:  {}", report.machine_id);
                println!("State file:  {}", report.state_file);
                println!("Access:      {:?}", report.decision);
                if let Some(trial) = &report.trial {
                    println!(
                        "Trial:       started {}, ends {} ({} days left)",
                        trial.started_at.format("%Y-%m-%d"),
                        trial.ends_at.format("%Y-%m-%d"),
                        trial.days_remaining
                    );
                }
                if let Some(message) = &report.message {
                    println!("\n{message}");
                }
            }
            if !report.decision.is_granted() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
