pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "parcelo",
    about = "Parcelo operator CLI",
    long_about = "Operate Parcelo: inspect extraction, estimate costs, create parcels, and check runtime readiness.",
    after_help = "Examples:\n  parcelo extract \"from jaipur to kolkata 200kg electronics\"\n  parcelo send \"parcel for ABC from jaipur to kolkata 200kg electronics\"\n  parcelo doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Extract shipment fields from a message without touching the backend")]
    Extract {
        #[arg(help = "Free-text shipment request")]
        message: String,
    },
    #[command(about = "Estimate the cost a message would be quoted, without submitting")]
    Estimate {
        #[arg(help = "Free-text shipment request")]
        message: String,
    },
    #[command(about = "Create a parcel from a free-text request against the configured backend")]
    Send {
        #[arg(help = "Free-text shipment request")]
        message: String,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, extraction readiness, and backend connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Extract { message } => commands::extract::run(&message),
        Command::Estimate { message } => commands::estimate::run(&message),
        Command::Send { message } => commands::send::run(&message),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
