pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "storefront",
    about = "Storefront assistant operator CLI",
    long_about = "Prepare the product catalog, inspect configuration, check readiness, and try the shop assistant from a terminal.",
    after_help = "Examples:\n  storefront doctor --json\n  storefront seed\n  storefront ask \"What is the price of the Wireless Mouse?\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo product catalog (idempotent)")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, LLM client, DB connectivity, and catalog rendering")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
        #[arg(long, help = "Send one live completion request to the configured model")]
        ping: bool,
    },
    #[command(about = "Send one message through the shop assistant and print the reply")]
    Ask {
        #[arg(help = "Shopper message, e.g. \"Where is my order?\"")]
        message: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json, ping } => {
            let (output, passed) = commands::doctor::run(json, ping);
            commands::CommandResult { exit_code: if passed { 0 } else { 1 }, output }
        }
        Command::Ask { message } => commands::ask::run(&message),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
