//! Custom script menus.
//!
//! A script asks for menu `id` once and then polls it every frame until it
//! reports finished. Only one custom menu runs at a time, so all progress
//! lives in a single [`MenuState`] that is wiped whenever a menu starts.

mod keyboard;
mod recruit;

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use crate::error::HookError;
use crate::host::{Host, PortraitParams, StringId, WindowId};
use crate::journal::{halt, Category, Journal};
use crate::table::{HandlerTable, TableKind};

pub use keyboard::{PartnerNameMenu, PasswordMenu, PASSWORD};
pub use recruit::{RecruitMenu, ROSTER_SEARCH_LIMIT, SECONDARY_FORM_OFFSET, SPECIES_COUNT};

/// Windows (and remembered results) a single menu may hold at once.
pub const MENU_SLOTS: usize = 20;

/// Bytes kept from a typed or looked-up name.
pub const NAME_LEN: usize = 10;

/// Window handles owned by the running menu. An empty slot means no window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowSlots([Option<WindowId>; MENU_SLOTS]);

impl WindowSlots {
    pub fn get(&self, slot: usize) -> Option<WindowId> {
        self.0.get(slot).copied().flatten()
    }

    /// Menus address slots by fixed constants, so `slot` past [`MENU_SLOTS`]
    /// is a bug in the menu itself.
    pub fn set(&mut self, slot: usize, window: Option<WindowId>) {
        match self.0.get_mut(slot) {
            Some(entry) => *entry = window,
            None => halt(format_args!(
                "window slot {slot} outside the {MENU_SLOTS} slots a menu owns"
            )),
        }
    }

    /// Empties the slot and returns what it held.
    pub fn take(&mut self, slot: usize) -> Option<WindowId> {
        self.0.get_mut(slot).and_then(Option::take)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

/// Progress of the running menu, carried across frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MenuState {
    /// External id of the running menu; `None` when no custom menu is open.
    pub active_menu: Option<i32>,
    /// Menu-private progress marker. Starts at 0.
    pub progress: i32,
    /// Value handed back to the script once the menu finishes.
    pub return_value: i32,
    /// Last option the cursor hovered.
    pub previous_option: i32,
    pub portrait: PortraitParams,
    pub results: [i32; MENU_SLOTS],
    pub windows: WindowSlots,
}

pub struct MenuContext<'a> {
    pub menu_id: i32,
    pub state: &'a mut MenuState,
    pub host: &'a mut dyn Host,
    pub journal: &'a mut Journal,
}

/// Behaviour of one custom menu.
///
/// `create` runs once when the menu starts, `update` once per frame until it
/// returns `true`, then `close` runs once.
pub trait ScriptMenu {
    fn create(&self, cx: &mut MenuContext<'_>);

    fn update(&self, cx: &mut MenuContext<'_>) -> bool;

    fn close(&self, cx: &mut MenuContext<'_>);
}

pub struct MenuDescriptor {
    name: Cow<'static, str>,
    keyboard_prompt: Option<StringId>,
    keyboard_confirm: Option<StringId>,
    behavior: Box<dyn ScriptMenu>,
}

impl MenuDescriptor {
    pub fn new(name: impl Into<Cow<'static, str>>, behavior: impl ScriptMenu + 'static) -> Self {
        MenuDescriptor {
            name: name.into(),
            keyboard_prompt: None,
            keyboard_confirm: None,
            behavior: Box::new(behavior),
        }
    }

    /// Strings shown by the host keyboard: the prompt, then the
    /// confirmation asked once the player is done typing.
    pub fn with_keyboard(mut self, prompt: StringId, confirm: StringId) -> Self {
        self.keyboard_prompt = Some(prompt);
        self.keyboard_confirm = Some(confirm);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keyboard_prompt(&self) -> Option<StringId> {
        self.keyboard_prompt
    }

    pub fn keyboard_confirm(&self) -> Option<StringId> {
        self.keyboard_confirm
    }
}

impl fmt::Debug for MenuDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuDescriptor")
            .field("name", &self.name)
            .field("keyboard_prompt", &self.keyboard_prompt)
            .field("keyboard_confirm", &self.keyboard_confirm)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuStep {
    pub finished: bool,
    pub return_value: i32,
}

impl MenuStep {
    pub fn pending() -> Self {
        MenuStep {
            finished: false,
            return_value: 0,
        }
    }

    pub fn finished(return_value: i32) -> Self {
        MenuStep {
            finished: true,
            return_value,
        }
    }
}

#[derive(Debug)]
pub struct MenuMachine {
    table: HandlerTable<MenuDescriptor>,
    state: MenuState,
}

impl MenuMachine {
    pub fn new(first_menu: i32, menus: Vec<MenuDescriptor>) -> Self {
        MenuMachine {
            table: HandlerTable::new(TableKind::Menus, first_menu, menus),
            state: MenuState::default(),
        }
    }

    /// Recruit (first id), password and partner rename menus.
    pub fn builtin(first_menu: i32) -> Self {
        Self::new(
            first_menu,
            vec![
                MenuDescriptor::new("RecruitAnyMonster", RecruitMenu),
                MenuDescriptor::new("Password", PasswordMenu::new(PASSWORD)).with_keyboard(263, 431),
                MenuDescriptor::new("PartnerName", PartnerNameMenu).with_keyboard(283, 292),
            ],
        )
    }

    pub fn first_menu(&self) -> i32 {
        self.table.first_id()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &MenuDescriptor)> {
        self.table.iter()
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn descriptor(&self, menu_id: i32) -> Option<&MenuDescriptor> {
        self.table.lookup(menu_id).ok()
    }

    /// Descriptor of the menu currently running, if any.
    pub fn active_descriptor(&self) -> Option<&MenuDescriptor> {
        self.state
            .active_menu
            .and_then(|menu_id| self.descriptor(menu_id))
    }

    /// Starts `menu_id` from a fully reset state and runs its `create`.
    ///
    /// An id outside the table is logged and leaves the state untouched.
    pub fn start(
        &mut self,
        menu_id: i32,
        host: &mut dyn Host,
        journal: &mut Journal,
    ) -> Result<(), HookError> {
        let descriptor = match self.table.lookup(menu_id) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                journal.error(
                    Category::Menus,
                    format!("Custom request for script menu {menu_id} out of bounds"),
                );
                return Err(err);
            }
        };

        if let Some(active) = self.state.active_menu {
            journal.warn(
                Category::Menus,
                format!("Script menu {menu_id} started while menu {active} was still open"),
            );
        }
        self.state = MenuState {
            active_menu: Some(menu_id),
            ..MenuState::default()
        };

        journal.info(
            Category::Menus,
            format!("Running custom script menu {menu_id} ({})", descriptor.name),
        );
        let mut cx = MenuContext {
            menu_id,
            state: &mut self.state,
            host,
            journal,
        };
        descriptor.behavior.create(&mut cx);
        Ok(())
    }

    /// Advances `menu_id` by one frame.
    ///
    /// Ids outside the table, and menus that are not the running session,
    /// are logged and report finished with -1 without running any callback.
    pub fn step(&mut self, menu_id: i32, host: &mut dyn Host, journal: &mut Journal) -> MenuStep {
        let Ok(descriptor) = self.table.lookup(menu_id) else {
            journal.error(
                Category::Menus,
                format!("Custom update for script menu {menu_id} out of bounds"),
            );
            return MenuStep::finished(-1);
        };
        if self.state.active_menu != Some(menu_id) {
            journal.error(
                Category::Menus,
                format!("Script menu {menu_id} polled without being started"),
            );
            return MenuStep::finished(-1);
        }

        let mut cx = MenuContext {
            menu_id,
            state: &mut self.state,
            host,
            journal,
        };
        if !descriptor.behavior.update(&mut cx) {
            return MenuStep::pending();
        }
        descriptor.behavior.close(&mut cx);

        self.state.active_menu = None;
        let return_value = self.state.return_value;
        journal.info(
            Category::Menus,
            format!("Custom script menu {menu_id} finished with {return_value}"),
        );
        MenuStep::finished(return_value)
    }
}

/// Longest prefix of `name` that fits in [`NAME_LEN`] bytes.
pub(crate) fn truncate_name(name: &str) -> &str {
    if name.len() <= NAME_LEN {
        return name;
    }
    let mut end = NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{
        truncate_name, MenuContext, MenuDescriptor, MenuMachine, MenuState, MenuStep, ScriptMenu,
        WindowSlots,
    };
    use crate::host::WindowId;
    use crate::journal::{Category, Journal, Severity};
    use crate::testing::RecordingHost;

    #[derive(Debug, Default)]
    struct Calls {
        create: usize,
        update: usize,
        close: usize,
    }

    /// Finishes after `frames` updates, returning the frame count.
    struct CountingMenu {
        frames: i32,
        calls: Rc<RefCell<Calls>>,
    }

    impl ScriptMenu for CountingMenu {
        fn create(&self, cx: &mut MenuContext<'_>) {
            self.calls.borrow_mut().create += 1;
            cx.state.windows.set(0, Some(WindowId(7)));
            cx.state.results[3] = 42;
        }

        fn update(&self, cx: &mut MenuContext<'_>) -> bool {
            assert_eq!(self.calls.borrow().close, 0, "update after close");
            self.calls.borrow_mut().update += 1;
            cx.state.progress += 1;
            cx.state.return_value = cx.state.progress;
            cx.state.progress >= self.frames
        }

        fn close(&self, cx: &mut MenuContext<'_>) {
            self.calls.borrow_mut().close += 1;
            cx.state.windows.take(0);
        }
    }

    fn counting_machine(frames: i32) -> (MenuMachine, Rc<RefCell<Calls>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let menu = CountingMenu {
            frames,
            calls: calls.clone(),
        };
        (
            MenuMachine::new(80, vec![MenuDescriptor::new("Counting", menu)]),
            calls,
        )
    }

    #[test]
    fn lifecycle_runs_create_once_and_close_after_finish() {
        let (mut machine, calls) = counting_machine(3);
        let mut host = RecordingHost::new();
        let mut journal = Journal::default();

        machine.start(80, &mut host, &mut journal).expect("in range");
        assert_eq!(machine.state().active_menu, Some(80));
        assert_eq!(machine.state().windows.get(0), Some(WindowId(7)));

        assert_eq!(machine.step(80, &mut host, &mut journal), MenuStep::pending());
        assert_eq!(machine.step(80, &mut host, &mut journal), MenuStep::pending());
        assert_eq!(
            machine.step(80, &mut host, &mut journal),
            MenuStep::finished(3)
        );

        let calls = calls.borrow();
        assert_eq!((calls.create, calls.update, calls.close), (1, 3, 1));
        assert_eq!(machine.state().active_menu, None);
        assert!(machine.state().windows.is_empty());
    }

    #[test]
    fn no_update_after_close_until_restarted() {
        let (mut machine, calls) = counting_machine(1);
        let mut host = RecordingHost::new();
        let mut journal = Journal::default();

        machine.start(80, &mut host, &mut journal).expect("in range");
        assert_eq!(
            machine.step(80, &mut host, &mut journal),
            MenuStep::finished(1)
        );
        assert_eq!(
            machine.step(80, &mut host, &mut journal),
            MenuStep::finished(-1)
        );
        assert_eq!(calls.borrow().update, 1);
        assert_eq!(journal.count(Category::Menus, Severity::Error), 1);
    }

    #[test]
    fn restart_fully_rezeroes_state() {
        let (mut machine, calls) = counting_machine(2);
        let mut host = RecordingHost::new();
        let mut journal = Journal::default();

        machine.start(80, &mut host, &mut journal).expect("in range");
        machine.step(80, &mut host, &mut journal);
        assert_eq!(machine.state().progress, 1);

        machine.start(80, &mut host, &mut journal).expect("in range");
        let expected = {
            let mut state = MenuState {
                active_menu: Some(80),
                ..MenuState::default()
            };
            state.windows.set(0, Some(WindowId(7)));
            state.results[3] = 42;
            state
        };
        assert_eq!(machine.state(), &expected);
        assert_eq!(calls.borrow().create, 2);
        assert_eq!(journal.count(Category::Menus, Severity::Warn), 1);
    }

    /// Leaves results, windows and cursor state behind when it finishes.
    struct MessyMenu;

    impl ScriptMenu for MessyMenu {
        fn create(&self, cx: &mut MenuContext<'_>) {
            cx.state.results[5] = 9;
            cx.state.windows.set(4, Some(WindowId(11)));
        }

        fn update(&self, cx: &mut MenuContext<'_>) -> bool {
            cx.state.previous_option = 6;
            cx.state.progress = 2;
            cx.state.portrait.monster_id = 25;
            cx.state.return_value = 3;
            true
        }

        fn close(&self, _cx: &mut MenuContext<'_>) {}
    }

    /// Touches nothing at all.
    struct QuietMenu;

    impl ScriptMenu for QuietMenu {
        fn create(&self, _cx: &mut MenuContext<'_>) {}

        fn update(&self, _cx: &mut MenuContext<'_>) -> bool {
            false
        }

        fn close(&self, _cx: &mut MenuContext<'_>) {}
    }

    #[test]
    fn next_menu_sees_nothing_from_previous_session() {
        let mut machine = MenuMachine::new(
            80,
            vec![
                MenuDescriptor::new("Messy", MessyMenu),
                MenuDescriptor::new("Quiet", QuietMenu),
            ],
        );
        let mut host = RecordingHost::new();
        let mut journal = Journal::default();

        machine.start(80, &mut host, &mut journal).expect("in range");
        assert_eq!(
            machine.step(80, &mut host, &mut journal),
            MenuStep::finished(3)
        );
        assert_eq!(machine.state().results[5], 9);
        assert_eq!(machine.state().windows.get(4), Some(WindowId(11)));

        machine.start(81, &mut host, &mut journal).expect("in range");
        let state = machine.state();
        assert_eq!(state.active_menu, Some(81));
        assert!(state.results.iter().all(|&result| result == 0));
        assert!(state.windows.is_empty());
        assert_eq!(state.previous_option, 0);
        assert_eq!(state.progress, 0);
        assert_eq!(state.return_value, 0);
        assert_eq!(state.portrait, Default::default());
        assert_eq!(journal.count(Category::Menus, Severity::Warn), 0);
    }

    #[test]
    fn out_of_range_step_is_logged() {
        let (mut machine, calls) = counting_machine(1);
        let mut host = RecordingHost::new();
        let mut journal = Journal::default();

        assert_eq!(
            machine.step(90, &mut host, &mut journal),
            MenuStep::finished(-1)
        );
        assert_eq!(journal.count(Category::Menus, Severity::Error), 1);
        assert!(journal.entries()[0].message.contains("script menu 90 out of bounds"));
        assert_eq!(calls.borrow().update, 0);
    }

    #[test]
    fn empty_table_rejects_start_and_finishes_step() {
        let mut machine = MenuMachine::new(80, Vec::new());
        let mut host = RecordingHost::new();
        let mut journal = Journal::default();

        assert!(machine.start(80, &mut host, &mut journal).is_err());
        assert_eq!(machine.state(), &MenuState::default());
        assert_eq!(journal.count(Category::Menus, Severity::Error), 1);
        assert_eq!(
            machine.step(80, &mut host, &mut journal),
            MenuStep::finished(-1)
        );
    }

    #[test]
    fn ids_below_first_menu_are_out_of_range() {
        let (mut machine, calls) = counting_machine(1);
        let mut host = RecordingHost::new();
        let mut journal = Journal::default();

        assert!(machine.start(79, &mut host, &mut journal).is_err());
        assert!(machine.start(81, &mut host, &mut journal).is_err());
        assert_eq!(
            machine.step(i32::MIN, &mut host, &mut journal),
            MenuStep::finished(-1)
        );
        assert_eq!(calls.borrow().create, 0);
    }

    #[test]
    fn window_slots_take_leaves_slot_empty() {
        let mut slots = WindowSlots::default();
        slots.set(2, Some(WindowId(5)));
        assert!(!slots.is_empty());
        assert_eq!(slots.take(2), Some(WindowId(5)));
        assert_eq!(slots.get(2), None);
        assert!(slots.is_empty());
        assert_eq!(slots.get(40), None);
    }

    #[test]
    #[should_panic(expected = "window slot 20 outside")]
    fn setting_slot_past_capacity_halts() {
        WindowSlots::default().set(20, Some(WindowId(1)));
    }

    #[test]
    fn builtin_menus_carry_keyboard_strings() {
        let machine = MenuMachine::builtin(80);
        let strings: Vec<_> = machine
            .iter()
            .map(|(id, menu)| (id, menu.keyboard_prompt(), menu.keyboard_confirm()))
            .collect();
        assert_eq!(
            strings,
            vec![
                (80, None, None),
                (81, Some(263), Some(431)),
                (82, Some(283), Some(292)),
            ]
        );
    }

    #[test]
    fn names_are_cut_on_char_boundaries() {
        assert_eq!(truncate_name("Bulbasaur"), "Bulbasaur");
        assert_eq!(truncate_name("Fletchinder"), "Fletchinde");
        assert_eq!(truncate_name("Pokébébé"), "Pokébéb");
    }
}
