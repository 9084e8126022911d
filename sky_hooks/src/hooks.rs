//! Routing decisions made at the host's patched call sites.
//!
//! Each patch point asks one question ("is this opcode ours?", "which
//! keyboard mode should this menu use?") and these functions answer it from
//! the runtime configuration alone.

use serde::Serialize;

use crate::config::RuntimeConfig;

/// A host function the runtime needs patched to route events into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    ApplyItemEffect,
    ApplyMoveEffect,
    SpecialProcessCall,
    #[cfg(feature = "custom-instructions")]
    OpcodeCheck,
    #[cfg(feature = "custom-instructions")]
    GetParameterCount,
    #[cfg(feature = "custom-menus")]
    ScriptMenuRequest,
    #[cfg(feature = "custom-menus")]
    ScriptMenuUpdate,
    #[cfg(feature = "custom-menus")]
    KeyboardCheck,
    #[cfg(feature = "custom-menus")]
    KeyboardPrompt,
    #[cfg(feature = "custom-menus")]
    KeyboardConfirmString,
}

impl HookPoint {
    /// Name of the host routine the hook replaces.
    pub fn symbol(self) -> &'static str {
        match self {
            HookPoint::ApplyItemEffect => "ApplyItemEffect",
            HookPoint::ApplyMoveEffect => "ApplyMoveEffect",
            HookPoint::SpecialProcessCall => "ScriptSpecialProcessCall",
            #[cfg(feature = "custom-instructions")]
            HookPoint::OpcodeCheck => "OpcodeCheck",
            #[cfg(feature = "custom-instructions")]
            HookPoint::GetParameterCount => "GetParameterCount",
            #[cfg(feature = "custom-menus")]
            HookPoint::ScriptMenuRequest => "ScriptMenuRequestCheck",
            #[cfg(feature = "custom-menus")]
            HookPoint::ScriptMenuUpdate => "ScriptMenuUpdateCheck",
            #[cfg(feature = "custom-menus")]
            HookPoint::KeyboardCheck => "KeyboardCheck",
            #[cfg(feature = "custom-menus")]
            HookPoint::KeyboardPrompt => "ShowKeyboardTypeDefaultCase",
            #[cfg(feature = "custom-menus")]
            HookPoint::KeyboardConfirmString => "PreprocessStringFromId",
        }
    }
}

/// Hook points required by the compiled feature set, in patch order.
pub fn installed_hooks() -> Vec<HookPoint> {
    #[allow(unused_mut)]
    let mut hooks = vec![
        HookPoint::ApplyItemEffect,
        HookPoint::ApplyMoveEffect,
        HookPoint::SpecialProcessCall,
    ];
    #[cfg(feature = "custom-instructions")]
    hooks.extend([HookPoint::OpcodeCheck, HookPoint::GetParameterCount]);
    #[cfg(feature = "custom-menus")]
    hooks.extend([
        HookPoint::ScriptMenuRequest,
        HookPoint::ScriptMenuUpdate,
        HookPoint::KeyboardCheck,
        HookPoint::KeyboardPrompt,
        HookPoint::KeyboardConfirmString,
    ]);
    hooks
}

#[cfg(feature = "custom-instructions")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum OpcodeRoute {
    Native,
    Custom { index: i32 },
}

/// Opcodes at or above the first custom opcode are ours. The index is not
/// checked against the instruction table; dispatch does that. It saturates
/// at `i32::MAX` when a negative base puts the distance out of range.
#[cfg(feature = "custom-instructions")]
pub fn route_opcode(config: &RuntimeConfig, opcode: i32) -> OpcodeRoute {
    if opcode >= config.first_custom_opcode {
        OpcodeRoute::Custom {
            index: opcode.saturating_sub(config.first_custom_opcode),
        }
    } else {
        OpcodeRoute::Native
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialProcessRoute {
    Native,
    Custom,
}

/// Special processes at or above the threshold never reach the host.
pub fn route_special_process(config: &RuntimeConfig, id: u32) -> SpecialProcessRoute {
    if id >= config.special_process_threshold {
        SpecialProcessRoute::Custom
    } else {
        SpecialProcessRoute::Native
    }
}

/// Keyboard mode the host should open for `menu_id`.
///
/// Custom menus all share the fallback mode, whose native menu does nothing
/// once completed.
#[cfg(feature = "custom-menus")]
pub fn keyboard_mode(config: &RuntimeConfig, menu_id: i32) -> i32 {
    if menu_id >= config.first_custom_menu {
        config.keyboard_fallback_mode
    } else {
        menu_id
    }
}
