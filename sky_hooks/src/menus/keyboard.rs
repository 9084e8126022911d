//! Menus built on the host's text keyboard.
//!
//! The host draws and runs the keyboard itself; these menus only set it up,
//! wait for the host to report it dismissed, and read back the typed text.

use super::{truncate_name, MenuContext, ScriptMenu, NAME_LEN};
use crate::host::ScriptVar;
use crate::journal::Category;

/// Text that unlocks the password menu.
pub const PASSWORD: &str = "shard";

fn open_keyboard(cx: &mut MenuContext<'_>) {
    cx.host.setup_keyboard(cx.menu_id);
}

fn keyboard_dismissed(cx: &mut MenuContext<'_>) -> bool {
    cx.host.is_base_game_menu_finished()
}

/// Byte-wise comparison of at most `n` bytes that stops at the first NUL,
/// treating bytes past the end of either side as NUL.
fn compare_prefix(typed: &[u8], expected: &[u8], n: usize) -> i32 {
    for i in 0..n {
        let a = typed.get(i).copied().unwrap_or(0);
        let b = expected.get(i).copied().unwrap_or(0);
        if a != b {
            return i32::from(a) - i32::from(b);
        }
        if a == 0 {
            break;
        }
    }
    0
}

/// Returns 0 when the typed text matches the password, nonzero otherwise.
#[derive(Debug, Clone, Copy)]
pub struct PasswordMenu {
    password: &'static str,
}

impl PasswordMenu {
    pub fn new(password: &'static str) -> Self {
        PasswordMenu { password }
    }
}

impl ScriptMenu for PasswordMenu {
    fn create(&self, cx: &mut MenuContext<'_>) {
        open_keyboard(cx);
    }

    fn update(&self, cx: &mut MenuContext<'_>) -> bool {
        keyboard_dismissed(cx)
    }

    fn close(&self, cx: &mut MenuContext<'_>) {
        let typed = cx.host.keyboard_result();
        cx.state.return_value = compare_prefix(typed.as_bytes(), self.password.as_bytes(), NAME_LEN);
    }
}

/// Renames the partner to the typed text. Always returns 0.
#[derive(Debug, Clone, Copy)]
pub struct PartnerNameMenu;

impl ScriptMenu for PartnerNameMenu {
    fn create(&self, cx: &mut MenuContext<'_>) {
        open_keyboard(cx);
    }

    fn update(&self, cx: &mut MenuContext<'_>) -> bool {
        keyboard_dismissed(cx)
    }

    fn close(&self, cx: &mut MenuContext<'_>) {
        let typed = cx.host.keyboard_result();
        let name = truncate_name(&typed);
        cx.host.rename_partner(name);

        let mut bytes = [0u8; NAME_LEN];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        cx.host
            .save_script_variable_bytes(ScriptVar::PartnerFirstName, &bytes);
        cx.journal
            .info(Category::Menus, format!("Partner renamed to '{name}'"));
        cx.state.return_value = 0;
    }
}
