//! Extension-point runtime for the host's script engine and dungeon mode.
//!
//! Handler tables intercept custom opcodes, item and move effects, special
//! processes and script menus. Anything the tables do not claim falls back to
//! the host's own behaviour, so every entry point reports whether it handled
//! the event.

pub mod config;
pub mod effects;
pub mod error;
pub mod hooks;
pub mod host;
#[cfg(feature = "custom-instructions")]
pub mod instructions;
pub mod journal;
#[cfg(feature = "custom-menus")]
pub mod menus;
pub mod runtime;
pub mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RuntimeConfig;
pub use effects::{
    EffectChain, EffectContext, EffectResolver, LocalEffects, MoveEffectInput, SpecialProcessCall,
    SpecialProcessOutcome,
};
pub use error::{ConfigError, HookError};
#[cfg(feature = "custom-instructions")]
pub use hooks::OpcodeRoute;
pub use hooks::{installed_hooks, HookPoint, SpecialProcessRoute};
pub use host::{DungeonHost, Entity, Host, Item, Monster, Move, ScriptHost, ScriptRoutine, WindowHost};
pub use journal::{Category, Journal, LogEntry, Severity};
#[cfg(feature = "custom-instructions")]
pub use instructions::{CustomInstruction, InstructionContext, InstructionTable};
#[cfg(feature = "custom-menus")]
pub use menus::{MenuContext, MenuDescriptor, MenuMachine, MenuState, MenuStep, ScriptMenu};
pub use runtime::{Runtime, RuntimeBuilder};
pub use table::{HandlerTable, TableKind};
