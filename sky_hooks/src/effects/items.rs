use crate::host::{Entity, Item, ItemId};
use crate::journal::Category;

use super::EffectContext;

/// Item id overridden with a full-party PP restore.
pub const ELIXIR: ItemId = 99;
pub const ELIXIR_PP_RESTORED: u8 = 10;

/// Restores PP on every move of the target, capped at each move's maximum.
pub fn restore_all_pp(
    cx: &mut EffectContext<'_>,
    _user: &mut Entity,
    target: &mut Entity,
    item: &mut Item,
    _is_thrown: bool,
) -> bool {
    let Some(monster) = target.monster.as_mut() else {
        // Nothing to restore, but the override still owns the item.
        return true;
    };
    for slot in &mut monster.moves {
        slot.restore_pp(ELIXIR_PP_RESTORED);
    }
    cx.journal.info(
        Category::Effects,
        format!(
            "Item {} restored up to {} PP on {} moves",
            item.id,
            ELIXIR_PP_RESTORED,
            monster.moves.len()
        ),
    );
    true
}
