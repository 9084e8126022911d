//! A scripted host for unit tests.

use std::collections::BTreeMap;

use crate::host::{
    AdvancedMenuSpec, DialogueBoxAttributes, DungeonHost, Entity, Gender, MonsterId,
    PortraitParams, Recruit, ScriptHost, ScriptVar, SimpleMenuSpec, StatSplit, WindowHost,
    WindowId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WindowKind {
    Advanced,
    Simple,
    Portrait,
}

#[derive(Debug, Clone)]
pub(crate) struct Window {
    pub(crate) kind: WindowKind,
    pub(crate) active: bool,
    pub(crate) result: i32,
    pub(crate) current_option: i32,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingHost {
    pub(crate) calls: Vec<String>,
    pub(crate) border_color: Option<i32>,
    pub(crate) dialogue_box: Option<DialogueBoxAttributes>,
    pub(crate) pressed: u32,
    pub(crate) held: u32,
    pub(crate) variables: BTreeMap<ScriptVar, i32>,
    pub(crate) variable_bytes: BTreeMap<ScriptVar, Vec<u8>>,
    pub(crate) next_random: Option<i32>,
    pub(crate) messages: Vec<String>,
    pub(crate) windows: BTreeMap<i32, Window>,
    pub(crate) next_window: i32,
    pub(crate) portraits_shown: Vec<MonsterId>,
    pub(crate) dual_gender: Vec<MonsterId>,
    pub(crate) free_slot: Option<usize>,
    pub(crate) recruits: Vec<(usize, Recruit)>,
    pub(crate) joined: Vec<MonsterId>,
    pub(crate) keyboard_text: String,
    pub(crate) keyboard_done: bool,
    pub(crate) partner_name: Option<String>,
    /// Refuse every simple menu, like a host without one.
    pub(crate) no_simple_menus: bool,
}

impl RecordingHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn open(&mut self, kind: WindowKind) -> Option<WindowId> {
        let id = self.next_window;
        self.next_window += 1;
        self.windows.insert(
            id,
            Window {
                kind,
                active: true,
                result: 0,
                current_option: 0,
            },
        );
        Some(WindowId(id))
    }

    pub(crate) fn window_mut(&mut self, id: WindowId) -> &mut Window {
        self.windows.get_mut(&id.0).expect("window exists")
    }

    pub(crate) fn finish_window(&mut self, id: WindowId, result: i32) {
        let window = self.window_mut(id);
        window.active = false;
        window.result = result;
    }

    pub(crate) fn is_open(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id.0)
    }
}

impl ScriptHost for RecordingHost {
    fn set_dialogue_box_attributes(&mut self, attributes: DialogueBoxAttributes) {
        self.dialogue_box = Some(attributes);
    }

    fn pressed_buttons(&self) -> u32 {
        self.pressed
    }

    fn held_buttons(&self) -> u32 {
        self.held
    }

    fn save_script_variable(&mut self, var: ScriptVar, value: i32) {
        self.variables.insert(var, value);
    }

    fn save_script_variable_bytes(&mut self, var: ScriptVar, bytes: &[u8]) {
        self.variable_bytes.insert(var, bytes.to_vec());
    }

    fn change_global_border_color(&mut self, color_type: i32) {
        self.calls.push(format!("border_color {color_type}"));
        self.border_color = Some(color_type);
    }
}

impl DungeonHost for RecordingHost {
    fn rand_range(&mut self, low: i32, _high: i32) -> i32 {
        self.next_random.take().unwrap_or(low)
    }

    fn log_message(&mut self, _user: &Entity, message: &str) {
        self.messages.push(message.to_string());
    }

    fn boost_offensive_stat(&mut self, _target: &mut Entity, split: StatSplit, stages: i32) {
        self.calls.push(format!("boost_offensive {split:?} {stages}"));
    }

    fn boost_defensive_stat(&mut self, _target: &mut Entity, split: StatSplit, stages: i32) {
        self.calls.push(format!("boost_defensive {split:?} {stages}"));
    }
}

impl WindowHost for RecordingHost {
    fn create_advanced_menu(&mut self, spec: &AdvancedMenuSpec) -> Option<WindowId> {
        self.calls
            .push(format!("create_advanced_menu {}", spec.option_count));
        self.open(WindowKind::Advanced)
    }

    fn is_advanced_menu_active(&self, window: WindowId) -> bool {
        self.windows.get(&window.0).is_some_and(|w| w.active)
    }

    fn advanced_menu_result(&self, window: WindowId) -> i32 {
        self.windows.get(&window.0).map_or(-1, |w| w.result)
    }

    fn advanced_menu_current_option(&self, window: WindowId) -> i32 {
        self.windows.get(&window.0).map_or(0, |w| w.current_option)
    }

    fn resume_advanced_menu(&mut self, window: WindowId) {
        self.calls.push(format!("resume_advanced_menu {}", window.0));
        if let Some(w) = self.windows.get_mut(&window.0) {
            w.active = true;
        }
    }

    fn close_advanced_menu(&mut self, window: WindowId) {
        self.calls.push(format!("close_advanced_menu {}", window.0));
        self.windows.remove(&window.0);
    }

    fn create_simple_menu(&mut self, spec: &SimpleMenuSpec) -> Option<WindowId> {
        self.calls
            .push(format!("create_simple_menu {}", spec.options.len()));
        if self.no_simple_menus {
            return None;
        }
        self.open(WindowKind::Simple)
    }

    fn is_simple_menu_active(&self, window: WindowId) -> bool {
        self.windows.get(&window.0).is_some_and(|w| w.active)
    }

    fn simple_menu_result(&self, window: WindowId) -> i32 {
        self.windows.get(&window.0).map_or(0, |w| w.result)
    }

    fn close_simple_menu(&mut self, window: WindowId) {
        self.calls.push(format!("close_simple_menu {}", window.0));
        self.windows.remove(&window.0);
    }

    fn create_portrait_box(&mut self, _screen: u8, _palette: u8, _framed: bool) -> Option<WindowId> {
        self.open(WindowKind::Portrait)
    }

    fn show_portrait(&mut self, _window: WindowId, params: &PortraitParams) {
        self.portraits_shown.push(params.monster_id);
    }

    fn close_portrait_box(&mut self, window: WindowId) {
        self.calls.push(format!("close_portrait_box {}", window.0));
        self.windows.remove(&window.0);
    }

    fn monster_gender(&self, monster: MonsterId) -> Gender {
        if self.dual_gender.contains(&(monster - 600)) {
            Gender::Female
        } else {
            Gender::Invalid
        }
    }

    fn first_empty_member_index(&self, _limit: usize) -> Option<usize> {
        self.free_slot
    }

    fn recruit(&mut self, slot: usize, recruit: &Recruit) {
        self.recruits.push((slot, recruit.clone()));
    }

    fn set_pokemon_joined(&mut self, monster: MonsterId) {
        self.joined.push(monster);
    }

    fn setup_keyboard(&mut self, menu_id: i32) {
        self.calls.push(format!("setup_keyboard {menu_id}"));
    }

    fn keyboard_result(&self) -> String {
        self.keyboard_text.clone()
    }

    fn is_base_game_menu_finished(&self) -> bool {
        self.keyboard_done
    }

    fn rename_partner(&mut self, name: &str) {
        self.partner_name = Some(name.to_string());
    }
}
