//! Describe command
//!
//! Usage: cmdstack describe <COMMAND>

use clap::Args;
use cmdstack_core::ManagerConfig;

#[derive(Debug, Args)]
pub struct DescribeArgs {
    /// Registered command name
    pub command: String,
}

/// Execute describe command
pub fn execute(args: DescribeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let manager = super::new_manager(ManagerConfig::default())?;
    let cmd = manager.registry().create_command(&args.command)?;

    let help = cmd.help();
    if help.is_empty() {
        println!("{}: no help available", args.command);
    } else {
        print!("{}", help);
    }
    Ok(())
}
