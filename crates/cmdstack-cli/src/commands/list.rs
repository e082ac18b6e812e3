//! List command
//!
//! Usage: cmdstack list

use cmdstack_core::ManagerConfig;

/// Execute list command
pub fn execute() -> Result<(), Box<dyn std::error::Error>> {
    let manager = super::new_manager(ManagerConfig::default())?;
    print!("{}", manager.registry().content());
    Ok(())
}
