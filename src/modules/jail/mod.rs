pub mod checks;
pub mod commands;
pub mod duration_parser;
pub mod events;

use crate::modules::{Module, ModuleDefinition};

pub fn module() -> Module {
    Module {
        definition: ModuleDefinition { id: "jail" },
        commands: vec![commands::jail(), commands::unjail(), commands::jaillog()],
    }
}
