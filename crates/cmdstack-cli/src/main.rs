//! cmdstack CLI
//!
//! Command-line front-end for the cmdstack command engine

use clap::{Parser, Subcommand};
use cmdstack_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cmdstack")]
#[command(about = "cmdstack - Undoable command execution engine", long_about = None)]
struct Cli {
    /// Emit engine logs to stdout
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a session script and print the resulting stacks
    Run(commands::run::RunArgs),
    /// List the registered commands
    List,
    /// Print the help text of a command
    Describe(commands::describe::DescribeArgs),
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        init(Profile::Development);
    }

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::List => commands::list::execute(),
        Commands::Describe(args) => commands::describe::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
