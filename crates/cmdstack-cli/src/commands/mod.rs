pub mod describe;
pub mod list;
pub mod run;

use cmdstack_core::{register_builtin_commands, CommandManager, ManagerConfig};

/// Manager with the built-in commands registered
pub fn new_manager(config: ManagerConfig) -> Result<CommandManager, Box<dyn std::error::Error>> {
    let mut manager = CommandManager::with_config(config);
    register_builtin_commands(manager.registry_mut())?;
    Ok(manager)
}
