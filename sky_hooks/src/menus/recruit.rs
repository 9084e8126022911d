//! Recruit any monster into the team roster.
//!
//! An advanced menu lists every species with a portrait that follows the
//! cursor. Species whose secondary form has a gender get a follow-up menu to
//! pick it. The chosen monster joins the first free roster slot.

use super::{truncate_name, MenuContext, ScriptMenu};
use crate::host::{
    AdvancedMenuSpec, Gender, MenuFlags, MonsterId, PortraitParams, Recruit, SimpleMenuOption,
    SimpleMenuSpec, WindowHost,
};
use crate::journal::Category;

/// Species listed by the menu; option `n` is species `n + 1`.
pub const SPECIES_COUNT: usize = 534;

/// Secondary forms (usually the female variant) live this far above the
/// primary species id.
pub const SECONDARY_FORM_OFFSET: MonsterId = 600;

/// Roster slots searched for a free member index.
pub const ROSTER_SEARCH_LIMIT: usize = 0x214;

/// Dungeon recorded as the place a recruit joined.
const TEST_DUNGEON: u16 = 0xAF;

/// First of the two "Male"/"Female" option strings.
const GENDER_STRINGS: u16 = 15531;

const ADVANCED_MENU: usize = 0;
const PORTRAIT_BOX: usize = 1;
const GENDER_MENU: usize = 2;

const SPECIES_RESULT: usize = 0;
const GENDER_RESULT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Browse,
    ChooseForm,
    AwaitGender,
    Commit,
    Done,
}

impl Stage {
    fn from_progress(progress: i32) -> Self {
        match progress {
            0 => Stage::Browse,
            1 => Stage::ChooseForm,
            2 => Stage::AwaitGender,
            3 => Stage::Commit,
            _ => Stage::Done,
        }
    }

    fn progress(self) -> i32 {
        match self {
            Stage::Browse => 0,
            Stage::ChooseForm => 1,
            Stage::AwaitGender => 2,
            Stage::Commit => 3,
            Stage::Done => -1,
        }
    }
}

fn species_entry(host: &dyn WindowHost, option: usize) -> String {
    format!("[CS:K]{}[CR]", host.monster_name(option as MonsterId + 1))
}

fn set_stage(cx: &mut MenuContext<'_>, stage: Stage) {
    cx.state.progress = stage.progress();
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RecruitMenu;

impl RecruitMenu {
    fn browse(&self, cx: &mut MenuContext<'_>) {
        let Some(menu) = cx.state.windows.get(ADVANCED_MENU) else {
            cx.journal
                .error(Category::Menus, "Recruit menu has no species list open");
            cx.state.return_value = -1;
            set_stage(cx, Stage::Done);
            return;
        };

        if !cx.host.is_advanced_menu_active(menu) {
            let choice = cx.host.advanced_menu_result(menu);
            cx.state.results[SPECIES_RESULT] = choice;
            if choice >= 0 {
                set_stage(cx, Stage::ChooseForm);
            } else {
                cx.state.return_value = -1;
                set_stage(cx, Stage::Done);
            }
            return;
        }

        let hovered = cx.host.advanced_menu_current_option(menu);
        if hovered != cx.state.previous_option {
            cx.state.previous_option = hovered;
            cx.state.portrait.monster_id = hovered + 1;
            if let Some(portrait) = cx.state.windows.get(PORTRAIT_BOX) {
                cx.host.show_portrait(portrait, &cx.state.portrait);
            }
        }
    }

    fn choose_form(&self, cx: &mut MenuContext<'_>) {
        let species = cx.state.results[SPECIES_RESULT] + 1;
        if cx.host.monster_gender(species + SECONDARY_FORM_OFFSET) == Gender::Invalid {
            set_stage(cx, Stage::Commit);
            return;
        }

        let spec = SimpleMenuSpec {
            x_offset: 16,
            y_offset: 10,
            width: 10,
            flags: MenuFlags {
                a_accept: true,
                b_cancel: true,
                se_on: true,
                ..MenuFlags::default()
            },
            options: (0..2)
                .map(|i| SimpleMenuOption {
                    string_id: GENDER_STRINGS + i,
                    result_value: i32::from(i) + 1,
                })
                .collect(),
        };
        let Some(window) = cx.host.create_simple_menu(&spec) else {
            cx.journal.error(
                Category::Menus,
                format!("Recruit menu could not open a gender menu; recruiting species {species}"),
            );
            set_stage(cx, Stage::Commit);
            return;
        };
        cx.state.windows.set(GENDER_MENU, Some(window));
        set_stage(cx, Stage::AwaitGender);
    }

    fn await_gender(&self, cx: &mut MenuContext<'_>) {
        // A missing gender menu reads as a cancel.
        let gender_menu = cx.state.windows.get(GENDER_MENU);
        if gender_menu.is_some_and(|menu| cx.host.is_simple_menu_active(menu)) {
            return;
        }

        let choice = gender_menu.map_or(0, |menu| cx.host.simple_menu_result(menu));
        cx.state.results[GENDER_RESULT] = choice;
        if choice > 0 {
            if choice == 2 {
                cx.state.results[SPECIES_RESULT] += SECONDARY_FORM_OFFSET;
            }
            set_stage(cx, Stage::Commit);
            return;
        }

        // Back out to the species list. The gender menu may never be reopened
        // if the next pick has no secondary form, so forget its handle now.
        if let Some(gender_menu) = cx.state.windows.take(GENDER_MENU) {
            cx.host.close_simple_menu(gender_menu);
        }
        if let Some(menu) = cx.state.windows.get(ADVANCED_MENU) {
            cx.host.resume_advanced_menu(menu);
        }
        set_stage(cx, Stage::Browse);
    }

    fn commit(&self, cx: &mut MenuContext<'_>) {
        let species = cx.state.results[SPECIES_RESULT] + 1;
        match cx.host.first_empty_member_index(ROSTER_SEARCH_LIMIT) {
            Some(slot) => {
                let name = cx.host.monster_name(species);
                let recruit = Recruit {
                    species,
                    name: truncate_name(&name).to_string(),
                    joined_at: TEST_DUNGEON,
                    joined_at_floor: 1,
                    level: 1,
                };
                cx.host.recruit(slot, &recruit);
                cx.host.set_pokemon_joined(species);
                cx.journal.info(
                    Category::Menus,
                    format!("Recruited {} ({species}) into roster slot {slot}", recruit.name),
                );
                cx.state.return_value = slot as i32;
            }
            None => {
                cx.journal
                    .warn(Category::Menus, format!("No roster space for monster {species}"));
                cx.state.return_value = -2;
            }
        }
        set_stage(cx, Stage::Done);
    }
}

impl ScriptMenu for RecruitMenu {
    fn create(&self, cx: &mut MenuContext<'_>) {
        cx.state.portrait = PortraitParams {
            monster_id: 1,
            layout: 4,
            offset: (2, -3),
        };
        let spec = AdvancedMenuSpec {
            x_offset: 2,
            y_offset: 2,
            flags: MenuFlags {
                a_accept: true,
                b_cancel: true,
                se_on: true,
                partial_menu: true,
                menu_lower_bar: true,
                no_accept_button: true,
            },
            option_count: SPECIES_COUNT,
            options_per_page: 8,
            entry: species_entry,
        };
        let menu = cx.host.create_advanced_menu(&spec);
        cx.state.windows.set(ADVANCED_MENU, menu);

        let portrait = cx.host.create_portrait_box(0, 3, true);
        cx.state.windows.set(PORTRAIT_BOX, portrait);
        if let Some(portrait) = portrait {
            cx.host.show_portrait(portrait, &cx.state.portrait);
        }
    }

    fn update(&self, cx: &mut MenuContext<'_>) -> bool {
        match Stage::from_progress(cx.state.progress) {
            Stage::Browse => self.browse(cx),
            Stage::ChooseForm => self.choose_form(cx),
            Stage::AwaitGender => self.await_gender(cx),
            Stage::Commit => self.commit(cx),
            Stage::Done => return true,
        }
        false
    }

    fn close(&self, cx: &mut MenuContext<'_>) {
        if let Some(menu) = cx.state.windows.take(ADVANCED_MENU) {
            cx.host.close_advanced_menu(menu);
        }
        if let Some(portrait) = cx.state.windows.take(PORTRAIT_BOX) {
            cx.host.close_portrait_box(portrait);
        }
        if let Some(gender_menu) = cx.state.windows.take(GENDER_MENU) {
            cx.host.close_simple_menu(gender_menu);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::species_entry;
    use crate::host::WindowId;
    use crate::journal::{Category, Journal, Severity};
    use crate::menus::{MenuMachine, MenuStep};
    use crate::testing::RecordingHost;

    const RECRUIT: i32 = 80;
    const SPECIES_LIST: WindowId = WindowId(0);
    const PORTRAIT: WindowId = WindowId(1);

    fn started() -> (MenuMachine, RecordingHost, Journal) {
        let mut machine = MenuMachine::builtin(80);
        let mut host = RecordingHost::new();
        let mut journal = Journal::default();
        machine
            .start(RECRUIT, &mut host, &mut journal)
            .expect("in range");
        (machine, host, journal)
    }

    fn step(machine: &mut MenuMachine, host: &mut RecordingHost, journal: &mut Journal) -> MenuStep {
        machine.step(RECRUIT, host, journal)
    }

    #[test]
    fn create_opens_species_list_and_portrait() {
        let (machine, host, _) = started();
        assert_eq!(host.calls, vec!["create_advanced_menu 534"]);
        assert_eq!(machine.state().windows.get(0), Some(SPECIES_LIST));
        assert_eq!(machine.state().windows.get(1), Some(PORTRAIT));
        assert_eq!(host.portraits_shown, vec![1]);
    }

    #[test]
    fn portrait_follows_hovered_option() {
        let (mut machine, mut host, mut journal) = started();
        host.window_mut(SPECIES_LIST).current_option = 24;
        assert_eq!(step(&mut machine, &mut host, &mut journal), MenuStep::pending());
        assert_eq!(step(&mut machine, &mut host, &mut journal), MenuStep::pending());
        assert_eq!(host.portraits_shown, vec![1, 25]);
        assert_eq!(machine.state().previous_option, 24);
    }

    #[test]
    fn single_form_species_is_recruited_into_free_slot() {
        let (mut machine, mut host, mut journal) = started();
        host.free_slot = Some(7);
        host.finish_window(SPECIES_LIST, 24);

        let mut last = MenuStep::pending();
        for _ in 0..5 {
            last = step(&mut machine, &mut host, &mut journal);
            if last.finished {
                break;
            }
        }
        assert_eq!(last, MenuStep::finished(7));
        assert_eq!(host.recruits.len(), 1);
        let (slot, recruit) = &host.recruits[0];
        assert_eq!(*slot, 7);
        assert_eq!(recruit.species, 25);
        assert_eq!(recruit.name, "#25");
        assert_eq!(host.joined, vec![25]);
        assert!(host.calls.contains(&"close_advanced_menu 0".to_string()));
        assert!(host.calls.contains(&"close_portrait_box 1".to_string()));
        assert!(machine.state().windows.is_empty());
    }

    #[test]
    fn cancelling_species_list_returns_minus_one() {
        let (mut machine, mut host, mut journal) = started();
        host.finish_window(SPECIES_LIST, -1);
        assert_eq!(step(&mut machine, &mut host, &mut journal), MenuStep::pending());
        assert_eq!(
            step(&mut machine, &mut host, &mut journal),
            MenuStep::finished(-1)
        );
        assert!(host.recruits.is_empty());
    }

    #[test]
    fn full_roster_returns_minus_two() {
        let (mut machine, mut host, mut journal) = started();
        host.finish_window(SPECIES_LIST, 0);
        for _ in 0..3 {
            step(&mut machine, &mut host, &mut journal);
        }
        assert_eq!(
            step(&mut machine, &mut host, &mut journal),
            MenuStep::finished(-2)
        );
        assert_eq!(journal.count(Category::Menus, Severity::Warn), 1);
    }

    #[test]
    fn gender_menu_cancel_resumes_species_list() {
        let (mut machine, mut host, mut journal) = started();
        host.dual_gender = vec![25];
        host.finish_window(SPECIES_LIST, 24);

        step(&mut machine, &mut host, &mut journal);
        step(&mut machine, &mut host, &mut journal);
        let gender_menu = machine.state().windows.get(2).expect("gender menu open");
        assert!(host.calls.contains(&"create_simple_menu 2".to_string()));

        host.finish_window(gender_menu, 0);
        assert_eq!(step(&mut machine, &mut host, &mut journal), MenuStep::pending());
        assert_eq!(machine.state().windows.get(2), None);
        assert!(!host.is_open(gender_menu));
        assert!(host.calls.contains(&"resume_advanced_menu 0".to_string()));
        assert_eq!(machine.state().progress, 0);
    }

    #[test]
    fn choosing_female_recruits_secondary_form() {
        let (mut machine, mut host, mut journal) = started();
        host.dual_gender = vec![25];
        host.free_slot = Some(3);
        host.finish_window(SPECIES_LIST, 24);

        step(&mut machine, &mut host, &mut journal);
        step(&mut machine, &mut host, &mut journal);
        let gender_menu = machine.state().windows.get(2).expect("gender menu open");
        host.finish_window(gender_menu, 2);

        step(&mut machine, &mut host, &mut journal);
        step(&mut machine, &mut host, &mut journal);
        assert_eq!(
            step(&mut machine, &mut host, &mut journal),
            MenuStep::finished(3)
        );
        assert_eq!(host.recruits[0].1.species, 625);
        assert!(host.calls.contains(&format!("close_simple_menu {}", gender_menu.0)));
    }

    #[test]
    fn host_without_gender_menu_recruits_primary_form() {
        let (mut machine, mut host, mut journal) = started();
        host.dual_gender = vec![25];
        host.no_simple_menus = true;
        host.free_slot = Some(3);
        host.finish_window(SPECIES_LIST, 24);

        let mut last = MenuStep::pending();
        for _ in 0..6 {
            last = step(&mut machine, &mut host, &mut journal);
            if last.finished {
                break;
            }
        }
        assert_eq!(last, MenuStep::finished(3));
        assert_eq!(host.recruits[0].1.species, 25);
        assert!(host.calls.contains(&"create_simple_menu 2".to_string()));
        assert_eq!(journal.count(Category::Menus, Severity::Error), 1);
    }

    #[test]
    fn vanished_gender_menu_reads_as_cancel() {
        let (mut machine, mut host, mut journal) = started();
        host.dual_gender = vec![25];
        host.finish_window(SPECIES_LIST, 24);

        step(&mut machine, &mut host, &mut journal);
        step(&mut machine, &mut host, &mut journal);
        let gender_menu = machine.state().windows.get(2).expect("gender menu open");
        host.windows.remove(&gender_menu.0);

        assert_eq!(step(&mut machine, &mut host, &mut journal), MenuStep::pending());
        assert_eq!(machine.state().progress, 0);
        assert_eq!(machine.state().windows.get(2), None);
        assert!(host.calls.contains(&"resume_advanced_menu 0".to_string()));
        assert!(host.recruits.is_empty());
    }

    #[test]
    fn species_entries_are_one_based() {
        let host = RecordingHost::new();
        assert_eq!(species_entry(&host, 0), "[CS:K]#1[CR]");
    }
}
