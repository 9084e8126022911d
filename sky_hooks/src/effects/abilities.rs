use crate::host::{AbilityId, Entity, StatSplit};
use crate::journal::Category;

use super::EffectContext;

/// Beast Boost takes over the unused "$$$" ability slot.
pub const BEAST_BOOST: AbilityId = 0x74;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stat {
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
}

/// Runs after a move connected. When the user has Beast Boost and the target
/// did not survive, raises the user's highest stat by one stage. Ties are
/// broken by the host's RNG. Returns whether the ability activated.
pub fn check_beast_boost(cx: &mut EffectContext<'_>, user: &mut Entity, target: &Entity) -> bool {
    let Some(monster) = user.monster.as_ref() else {
        return false;
    };
    if !monster.has_ability(BEAST_BOOST) || target.is_valid() {
        return false;
    }

    let stats = [
        (Stat::Attack, monster.atk),
        (Stat::Defense, monster.def),
        (Stat::SpecialAttack, monster.sp_atk),
        (Stat::SpecialDefense, monster.sp_def),
    ];
    let highest = stats.iter().map(|(_, value)| *value).max().unwrap_or(0);
    let tied: Vec<Stat> = stats
        .iter()
        .filter(|(_, value)| *value == highest)
        .map(|(stat, _)| *stat)
        .collect();

    cx.host
        .log_message(user, "[string:0]'s [CS:G]Beast Boost[CR] activated!");

    let roll = cx.host.rand_range(0, tied.len() as i32);
    let selected = usize::try_from(roll)
        .ok()
        .and_then(|index| tied.get(index).copied())
        .unwrap_or(tied[0]);
    match selected {
        Stat::Attack => cx.host.boost_offensive_stat(user, StatSplit::Physical, 1),
        Stat::Defense => cx.host.boost_defensive_stat(user, StatSplit::Physical, 1),
        Stat::SpecialAttack => cx.host.boost_offensive_stat(user, StatSplit::Special, 1),
        Stat::SpecialDefense => cx.host.boost_defensive_stat(user, StatSplit::Special, 1),
    }
    cx.journal.info(
        Category::Effects,
        format!("Beast Boost raised {selected:?} ({} tied)", tied.len()),
    );
    true
}
