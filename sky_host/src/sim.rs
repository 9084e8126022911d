use std::collections::{BTreeMap, VecDeque};

use serde::Deserialize;
use sky_hooks::host::{
    AdvancedMenuSpec, DialogueBoxAttributes, DungeonHost, Entity, Gender, MonsterId,
    PortraitParams, Recruit, ScriptHost, ScriptVar, SimpleMenuSpec, StatSplit, WindowHost,
    WindowId,
};
use sky_hooks::menus::SECONDARY_FORM_OFFSET;

/// One scripted pick in an advanced menu: the cursor visits each `hover`
/// option on successive frames, then the menu closes with `result`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdvancedChoice {
    pub hover: VecDeque<i32>,
    pub result: i32,
}

/// Player input fed to menus, consumed in order across the whole scenario.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MenuInput {
    pub advanced: VecDeque<AdvancedChoice>,
    pub simple: VecDeque<i32>,
    pub keyboard: VecDeque<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowKind {
    Advanced,
    Simple,
    Portrait,
}

#[derive(Debug, Clone)]
struct SimWindow {
    kind: WindowKind,
    active: bool,
    result: i32,
    current_option: i32,
}

#[derive(Debug, Clone, Default)]
struct KeyboardSession {
    menu_id: i32,
    text: String,
    done: bool,
}

/// In-memory host for scenarios. Menus are driven frame by frame from
/// scripted [`MenuInput`].
#[derive(Debug, Default)]
pub struct SimHost {
    pub border_color: Option<i32>,
    pub dialogue_box: Option<DialogueBoxAttributes>,
    pub pressed: u32,
    pub held: u32,
    pub variables: BTreeMap<ScriptVar, i32>,
    pub variable_bytes: BTreeMap<ScriptVar, Vec<u8>>,
    pub messages: Vec<String>,
    pub stat_boosts: Vec<String>,
    pub monster_names: BTreeMap<MonsterId, String>,
    pub dual_gender: Vec<MonsterId>,
    pub roster: BTreeMap<usize, Recruit>,
    pub roster_capacity: usize,
    pub joined: Vec<MonsterId>,
    pub partner_name: Option<String>,
    pub portraits_shown: Vec<MonsterId>,
    random: VecDeque<i32>,
    input: MenuInput,
    windows: BTreeMap<i32, SimWindow>,
    next_window: i32,
    keyboard: Option<KeyboardSession>,
}

impl SimHost {
    pub fn new(roster_capacity: usize) -> Self {
        SimHost {
            roster_capacity,
            ..SimHost::default()
        }
    }

    pub fn queue_random(&mut self, values: impl IntoIterator<Item = i32>) {
        self.random.extend(values);
    }

    pub fn queue_input(&mut self, input: MenuInput) {
        self.input.advanced.extend(input.advanced);
        self.input.simple.extend(input.simple);
        self.input.keyboard.extend(input.keyboard);
    }

    pub fn open_windows(&self) -> usize {
        self.windows.len()
    }

    /// Applies one frame of player input to whatever is waiting for it.
    pub fn advance_frame(&mut self) {
        for window in self.windows.values_mut().filter(|window| window.active) {
            match window.kind {
                WindowKind::Advanced => {
                    let Some(choice) = self.input.advanced.front_mut() else {
                        continue;
                    };
                    if let Some(option) = choice.hover.pop_front() {
                        window.current_option = option;
                    } else {
                        window.result = choice.result;
                        window.active = false;
                        self.input.advanced.pop_front();
                    }
                }
                WindowKind::Simple => {
                    if let Some(result) = self.input.simple.pop_front() {
                        window.result = result;
                        window.active = false;
                    }
                }
                WindowKind::Portrait => {}
            }
        }

        if let Some(session) = self.keyboard.as_mut().filter(|session| !session.done) {
            if let Some(text) = self.input.keyboard.pop_front() {
                session.text = text;
                session.done = true;
            }
        }
    }

    fn open(&mut self, kind: WindowKind) -> Option<WindowId> {
        let id = self.next_window;
        self.next_window += 1;
        self.windows.insert(
            id,
            SimWindow {
                kind,
                active: kind != WindowKind::Portrait,
                result: 0,
                current_option: 0,
            },
        );
        Some(WindowId(id))
    }

    fn window(&self, id: WindowId, kind: WindowKind) -> Option<&SimWindow> {
        self.windows.get(&id.0).filter(|window| window.kind == kind)
    }

    fn close(&mut self, id: WindowId, kind: WindowKind) {
        if self.window(id, kind).is_some() {
            self.windows.remove(&id.0);
        } else {
            log::warn!("closing unknown {kind:?} window {}", id.0);
        }
    }
}

impl ScriptHost for SimHost {
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
        self.border_color = Some(color_type);
    }
}

impl DungeonHost for SimHost {
    /// Pops the next queued value, wrapped into `low..high`.
    fn rand_range(&mut self, low: i32, high: i32) -> i32 {
        let span = high.saturating_sub(low);
        match self.random.pop_front() {
            Some(value) if span > 0 => low + value.rem_euclid(span),
            _ => low,
        }
    }

    fn log_message(&mut self, _user: &Entity, message: &str) {
        self.messages.push(message.to_string());
    }

    fn boost_offensive_stat(&mut self, _target: &mut Entity, split: StatSplit, stages: i32) {
        self.stat_boosts
            .push(format!("offensive {split:?} +{stages}").to_lowercase());
    }

    fn boost_defensive_stat(&mut self, _target: &mut Entity, split: StatSplit, stages: i32) {
        self.stat_boosts
            .push(format!("defensive {split:?} +{stages}").to_lowercase());
    }
}

impl WindowHost for SimHost {
    fn create_advanced_menu(&mut self, spec: &AdvancedMenuSpec) -> Option<WindowId> {
        log::debug!(
            "advanced menu with {} options, first entry {:?}",
            spec.option_count,
            (spec.entry)(&*self, 0)
        );
        self.open(WindowKind::Advanced)
    }

    fn is_advanced_menu_active(&self, window: WindowId) -> bool {
        self.window(window, WindowKind::Advanced)
            .is_some_and(|window| window.active)
    }

    fn advanced_menu_result(&self, window: WindowId) -> i32 {
        self.window(window, WindowKind::Advanced)
            .map_or(-1, |window| window.result)
    }

    fn advanced_menu_current_option(&self, window: WindowId) -> i32 {
        self.window(window, WindowKind::Advanced)
            .map_or(0, |window| window.current_option)
    }

    fn resume_advanced_menu(&mut self, window: WindowId) {
        if let Some(window) = self.windows.get_mut(&window.0) {
            window.active = true;
        }
    }

    fn close_advanced_menu(&mut self, window: WindowId) {
        self.close(window, WindowKind::Advanced);
    }

    fn create_simple_menu(&mut self, spec: &SimpleMenuSpec) -> Option<WindowId> {
        log::debug!("simple menu with {} options", spec.options.len());
        self.open(WindowKind::Simple)
    }

    fn is_simple_menu_active(&self, window: WindowId) -> bool {
        self.window(window, WindowKind::Simple)
            .is_some_and(|window| window.active)
    }

    fn simple_menu_result(&self, window: WindowId) -> i32 {
        self.window(window, WindowKind::Simple)
            .map_or(0, |window| window.result)
    }

    fn close_simple_menu(&mut self, window: WindowId) {
        self.close(window, WindowKind::Simple);
    }

    fn create_portrait_box(&mut self, _screen: u8, _palette: u8, _framed: bool) -> Option<WindowId> {
        self.open(WindowKind::Portrait)
    }

    fn show_portrait(&mut self, _window: WindowId, params: &PortraitParams) {
        self.portraits_shown.push(params.monster_id);
    }

    fn close_portrait_box(&mut self, window: WindowId) {
        self.close(window, WindowKind::Portrait);
    }

    fn monster_name(&self, monster: MonsterId) -> String {
        self.monster_names
            .get(&monster)
            .cloned()
            .unwrap_or_else(|| format!("Monster{monster}"))
    }

    fn monster_gender(&self, monster: MonsterId) -> Gender {
        let primary = monster - SECONDARY_FORM_OFFSET;
        if monster > SECONDARY_FORM_OFFSET && self.dual_gender.contains(&primary) {
            Gender::Female
        } else if self.dual_gender.contains(&monster) {
            Gender::Male
        } else {
            Gender::Invalid
        }
    }

    fn first_empty_member_index(&self, limit: usize) -> Option<usize> {
        (0..limit.min(self.roster_capacity)).find(|slot| !self.roster.contains_key(slot))
    }

    fn recruit(&mut self, slot: usize, recruit: &Recruit) {
        self.roster.insert(slot, recruit.clone());
    }

    fn set_pokemon_joined(&mut self, monster: MonsterId) {
        self.joined.push(monster);
    }

    fn setup_keyboard(&mut self, menu_id: i32) {
        self.keyboard = Some(KeyboardSession {
            menu_id,
            ..KeyboardSession::default()
        });
    }

    fn keyboard_result(&self) -> String {
        self.keyboard
            .as_ref()
            .map(|session| session.text.clone())
            .unwrap_or_default()
    }

    fn is_base_game_menu_finished(&self) -> bool {
        self.keyboard.as_ref().is_some_and(|session| session.done)
    }

    fn rename_partner(&mut self, name: &str) {
        if let Some(session) = &self.keyboard {
            log::debug!("partner renamed from keyboard of menu {}", session.menu_id);
        }
        self.partner_name = Some(name.to_string());
    }
}
