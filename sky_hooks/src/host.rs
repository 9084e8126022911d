//! The host as seen from the hook runtime.
//!
//! World data that handlers mutate (entities, moves, items) is passed in by
//! reference as plain structs. Everything else the host can do is reached
//! through the service traits below. Every service has an inert default so a
//! host only implements what it actually provides.

use std::fmt;

use serde::{Deserialize, Serialize};

pub type ItemId = u16;
pub type MoveId = u16;
pub type MonsterId = i32;
pub type AbilityId = u8;
pub type StringId = u16;

/// Moves a monster can know at once.
pub const MAX_MOVES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub i32);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub id: MoveId,
    pub pp: u8,
    pub max_pp: u8,
}

impl Move {
    /// Raises PP by `amount` without exceeding the move's maximum. PP that is
    /// already above the maximum is left alone.
    pub fn restore_pp(&mut self, amount: u8) {
        let restored = self.pp.saturating_add(amount).min(self.max_pp);
        self.pp = self.pp.max(restored);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Monster {
    pub species: MonsterId,
    pub hp: i32,
    pub max_hp: i32,
    pub atk: i32,
    pub def: i32,
    pub sp_atk: i32,
    pub sp_def: i32,
    pub abilities: [AbilityId; 2],
    /// At most [`MAX_MOVES`] entries.
    pub moves: Vec<Move>,
}

impl Monster {
    pub fn has_ability(&self, ability: AbilityId) -> bool {
        self.abilities.contains(&ability)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entity {
    pub valid: bool,
    pub monster: Option<Monster>,
}

impl Default for Entity {
    fn default() -> Self {
        Entity {
            valid: true,
            monster: None,
        }
    }
}

impl Entity {
    pub fn monster(monster: Monster) -> Self {
        Entity {
            valid: true,
            monster: Some(monster),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub id: ItemId,
    pub quantity: u16,
}

/// The script routine that issued an opcode. Opaque to the runtime; handlers
/// hand it back to the host when they need routine-scoped services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRoutine {
    pub id: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueBoxAttributes {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// 0 = bottom screen, 1 = top screen.
    pub screen: i32,
    /// 0xFD = default frame, 0xFA = invisible.
    pub frame: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptVar {
    EventLocal,
    PartnerFirstName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatSplit {
    Physical,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Invalid,
    Male,
    Female,
    Genderless,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortraitParams {
    pub monster_id: MonsterId,
    pub layout: u8,
    pub offset: (i32, i32),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuFlags {
    pub a_accept: bool,
    pub b_cancel: bool,
    pub se_on: bool,
    pub partial_menu: bool,
    pub menu_lower_bar: bool,
    pub no_accept_button: bool,
}

/// Produces the label for one option of an advanced menu.
pub type OptionEntryFn = fn(&dyn WindowHost, usize) -> String;

#[derive(Clone)]
pub struct AdvancedMenuSpec {
    pub x_offset: i32,
    pub y_offset: i32,
    pub flags: MenuFlags,
    pub option_count: usize,
    pub options_per_page: usize,
    pub entry: OptionEntryFn,
}

impl fmt::Debug for AdvancedMenuSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvancedMenuSpec")
            .field("x_offset", &self.x_offset)
            .field("y_offset", &self.y_offset)
            .field("flags", &self.flags)
            .field("option_count", &self.option_count)
            .field("options_per_page", &self.options_per_page)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleMenuOption {
    pub string_id: StringId,
    pub result_value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleMenuSpec {
    pub x_offset: i32,
    pub y_offset: i32,
    pub width: i32,
    pub flags: MenuFlags,
    pub options: Vec<SimpleMenuOption>,
}

/// A new team member written into a free roster slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recruit {
    pub species: MonsterId,
    pub name: String,
    pub joined_at: u16,
    pub joined_at_floor: u8,
    pub level: u8,
}

/// Script engine services: operand decoding, variables, screen attributes.
pub trait ScriptHost {
    /// Decodes a raw operand word into its script value.
    fn process_script_param(&self, raw: u16) -> i32 {
        i32::from(raw)
    }

    fn set_dialogue_box_attributes(&mut self, _attributes: DialogueBoxAttributes) {}

    fn pressed_buttons(&self) -> u32 {
        0
    }

    fn held_buttons(&self) -> u32 {
        0
    }

    fn save_script_variable(&mut self, _var: ScriptVar, _value: i32) {}

    fn save_script_variable_bytes(&mut self, _var: ScriptVar, _bytes: &[u8]) {}

    fn change_global_border_color(&mut self, _color_type: i32) {}
}

/// Dungeon mode services used by effect handlers.
pub trait DungeonHost {
    /// Uniform random value in `low..high`.
    fn rand_range(&mut self, low: i32, _high: i32) -> i32 {
        low
    }

    fn log_message(&mut self, _user: &Entity, _message: &str) {}

    fn boost_offensive_stat(&mut self, _target: &mut Entity, _split: StatSplit, _stages: i32) {}

    fn boost_defensive_stat(&mut self, _target: &mut Entity, _split: StatSplit, _stages: i32) {}
}

/// Window, keyboard and roster services used by script menus.
pub trait WindowHost {
    fn create_advanced_menu(&mut self, _spec: &AdvancedMenuSpec) -> Option<WindowId> {
        None
    }

    fn is_advanced_menu_active(&self, _window: WindowId) -> bool {
        false
    }

    /// Selected option, or -1 when the menu was cancelled.
    fn advanced_menu_result(&self, _window: WindowId) -> i32 {
        -1
    }

    fn advanced_menu_current_option(&self, _window: WindowId) -> i32 {
        0
    }

    fn resume_advanced_menu(&mut self, _window: WindowId) {}

    fn close_advanced_menu(&mut self, _window: WindowId) {}

    fn create_simple_menu(&mut self, _spec: &SimpleMenuSpec) -> Option<WindowId> {
        None
    }

    fn is_simple_menu_active(&self, _window: WindowId) -> bool {
        false
    }

    /// Result value of the chosen option, 0 or less when cancelled.
    fn simple_menu_result(&self, _window: WindowId) -> i32 {
        0
    }

    fn close_simple_menu(&mut self, _window: WindowId) {}

    fn create_portrait_box(&mut self, _screen: u8, _palette: u8, _framed: bool) -> Option<WindowId> {
        None
    }

    fn show_portrait(&mut self, _window: WindowId, _params: &PortraitParams) {}

    fn close_portrait_box(&mut self, _window: WindowId) {}

    fn monster_name(&self, monster: MonsterId) -> String {
        format!("#{monster}")
    }

    fn monster_gender(&self, _monster: MonsterId) -> Gender {
        Gender::Invalid
    }

    /// First free roster slot below `limit`, if any.
    fn first_empty_member_index(&self, _limit: usize) -> Option<usize> {
        None
    }

    fn recruit(&mut self, _slot: usize, _recruit: &Recruit) {}

    fn set_pokemon_joined(&mut self, _monster: MonsterId) {}

    fn setup_keyboard(&mut self, _menu_id: i32) {}

    fn keyboard_result(&self) -> String {
        String::new()
    }

    /// Set by the host once its own keyboard menu has been dismissed.
    fn is_base_game_menu_finished(&self) -> bool {
        true
    }

    fn rename_partner(&mut self, _name: &str) {}
}

pub trait Host: ScriptHost + DungeonHost + WindowHost {}

impl<T: ScriptHost + DungeonHost + WindowHost + ?Sized> Host for T {}
