pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "curio",
    about = "Curio operator CLI",
    long_about = "Operate the Curio catalog database and inspect recommendations.",
    after_help = "Examples:\n  curio doctor --json\n  curio seed\n  curio recommend user-alice --category home"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo catalog and verify it")]
    Seed,
    #[command(about = "Validate config, database connectivity and catalog schema")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Rank catalog items for a user and print the tagged result as JSON")]
    Recommend {
        #[arg(help = "User to recommend for")]
        user_id: String,
        #[arg(long = "category", help = "Category in the current session; repeatable")]
        categories: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Recommend { user_id, categories } => {
            commands::recommend::run(&user_id, categories)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
