//! Item effect, move effect and special process resolution.
//!
//! Resolvers are consulted in order: the local tables first, then any
//! secondary resolver compiled into the host. The first resolver that claims
//! an event wins and nothing after it runs. Item and move effects that nobody
//! claims fall back to the host's built-in behaviour; special processes have
//! no built-in behaviour to fall back to, so an unclaimed one is reported and
//! yields 0.

mod abilities;
mod items;
mod special;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::host::{Entity, Host, Item, ItemId, Move, MoveId};
use crate::journal::{Category, Journal};

pub use abilities::{check_beast_boost, BEAST_BOOST};
pub use items::{restore_all_pp, ELIXIR, ELIXIR_PP_RESTORED};
pub use special::{change_border_color, CHANGE_BORDER_COLOR};

/// Services available to every effect handler for the duration of one call.
pub struct EffectContext<'a> {
    pub host: &'a mut dyn Host,
    pub journal: &'a mut Journal,
}

impl<'a> EffectContext<'a> {
    pub fn new(host: &'a mut dyn Host, journal: &'a mut Journal) -> Self {
        EffectContext { host, journal }
    }
}

/// Move effect parameters shared with the host. `dealt_damage` is written by
/// the handler; the host sequences later effect stages on it even when the
/// whole move was overridden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEffectInput {
    pub move_id: MoveId,
    pub item_id: ItemId,
    pub dealt_damage: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialProcessCall {
    pub id: u32,
    pub arg1: i16,
    /// Passed through untouched; it may not line up with the second argument
    /// the script engine shows.
    pub arg2: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpecialProcessOutcome {
    pub handled: bool,
    /// Surfaced to the script engine's result register either way.
    pub value: i32,
}

impl SpecialProcessOutcome {
    pub fn handled(value: i32) -> Self {
        SpecialProcessOutcome {
            handled: true,
            value,
        }
    }

    pub fn unhandled() -> Self {
        SpecialProcessOutcome {
            handled: false,
            value: 0,
        }
    }
}

/// One link of the resolver chain. Every method defaults to "not handled".
/// A resolver that declines an event must leave the world untouched: no
/// writes to the entities, move or item it was handed and no visible host
/// changes. Drawing from the host random generator is allowed.
pub trait EffectResolver {
    fn name(&self) -> &str;

    fn apply_item_effect(
        &self,
        _cx: &mut EffectContext<'_>,
        _user: &mut Entity,
        _target: &mut Entity,
        _item: &mut Item,
        _is_thrown: bool,
    ) -> bool {
        false
    }

    fn apply_move_effect(
        &self,
        _cx: &mut EffectContext<'_>,
        _input: &mut MoveEffectInput,
        _user: &mut Entity,
        _target: &mut Entity,
        _used_move: &mut Move,
    ) -> bool {
        false
    }

    /// `Some(value)` when handled.
    fn special_process(
        &self,
        _cx: &mut EffectContext<'_>,
        _call: SpecialProcessCall,
    ) -> Option<i32> {
        None
    }
}

pub type ItemEffectFn =
    fn(&mut EffectContext<'_>, &mut Entity, &mut Entity, &mut Item, bool) -> bool;
pub type MoveEffectFn = fn(
    &mut EffectContext<'_>,
    &mut MoveEffectInput,
    &mut Entity,
    &mut Entity,
    &mut Move,
) -> bool;
pub type SpecialProcessFn = fn(&mut EffectContext<'_>, SpecialProcessCall) -> i32;

/// Overrides compiled into the runtime itself, keyed by item, move and
/// special process id.
#[derive(Default)]
pub struct LocalEffects {
    items: BTreeMap<ItemId, ItemEffectFn>,
    moves: BTreeMap<MoveId, MoveEffectFn>,
    special_processes: BTreeMap<u32, SpecialProcessFn>,
}

impl LocalEffects {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self::empty()
            .with_item_effect(ELIXIR, restore_all_pp)
            .with_special_process(CHANGE_BORDER_COLOR, change_border_color)
    }

    pub fn with_item_effect(mut self, item: ItemId, handler: ItemEffectFn) -> Self {
        self.items.insert(item, handler);
        self
    }

    pub fn with_move_effect(mut self, move_id: MoveId, handler: MoveEffectFn) -> Self {
        self.moves.insert(move_id, handler);
        self
    }

    pub fn with_special_process(mut self, id: u32, handler: SpecialProcessFn) -> Self {
        self.special_processes.insert(id, handler);
        self
    }

    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.keys().copied()
    }

    pub fn move_ids(&self) -> impl Iterator<Item = MoveId> + '_ {
        self.moves.keys().copied()
    }

    pub fn special_process_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.special_processes.keys().copied()
    }
}

impl EffectResolver for LocalEffects {
    fn name(&self) -> &str {
        "local"
    }

    fn apply_item_effect(
        &self,
        cx: &mut EffectContext<'_>,
        user: &mut Entity,
        target: &mut Entity,
        item: &mut Item,
        is_thrown: bool,
    ) -> bool {
        match self.items.get(&item.id) {
            Some(handler) => handler(cx, user, target, item, is_thrown),
            None => false,
        }
    }

    fn apply_move_effect(
        &self,
        cx: &mut EffectContext<'_>,
        input: &mut MoveEffectInput,
        user: &mut Entity,
        target: &mut Entity,
        used_move: &mut Move,
    ) -> bool {
        match self.moves.get(&input.move_id) {
            Some(handler) => handler(cx, input, user, target, used_move),
            None => false,
        }
    }

    fn special_process(
        &self,
        cx: &mut EffectContext<'_>,
        call: SpecialProcessCall,
    ) -> Option<i32> {
        self.special_processes
            .get(&call.id)
            .map(|handler| handler(cx, call))
    }
}

/// Ordered list of resolvers; the local table is always first.
pub struct EffectChain {
    resolvers: Vec<Box<dyn EffectResolver>>,
}

impl EffectChain {
    pub fn new(local: LocalEffects) -> Self {
        EffectChain {
            resolvers: vec![Box::new(local)],
        }
    }

    /// Appends a resolver consulted only after every earlier one declined.
    pub fn with_secondary(mut self, resolver: Box<dyn EffectResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn resolver_names(&self) -> Vec<String> {
        self.resolvers
            .iter()
            .map(|resolver| resolver.name().to_string())
            .collect()
    }

    pub fn apply_item_effect(
        &self,
        cx: &mut EffectContext<'_>,
        user: &mut Entity,
        target: &mut Entity,
        item: &mut Item,
        is_thrown: bool,
    ) -> bool {
        cx.journal
            .info(Category::Effects, format!("Running item effect {}", item.id));
        for resolver in &self.resolvers {
            if resolver.apply_item_effect(cx, user, target, item, is_thrown) {
                cx.journal.info(
                    Category::Effects,
                    format!("Item effect {} handled by {}", item.id, resolver.name()),
                );
                return true;
            }
        }
        false
    }

    pub fn apply_move_effect(
        &self,
        cx: &mut EffectContext<'_>,
        input: &mut MoveEffectInput,
        user: &mut Entity,
        target: &mut Entity,
        used_move: &mut Move,
    ) -> bool {
        cx.journal.info(
            Category::Effects,
            format!("Running move effect {}", input.move_id),
        );
        for resolver in &self.resolvers {
            if resolver.apply_move_effect(cx, input, user, target, used_move) {
                cx.journal.info(
                    Category::Effects,
                    format!(
                        "Move effect {} handled by {} (dealt damage: {})",
                        input.move_id,
                        resolver.name(),
                        input.dealt_damage
                    ),
                );
                return true;
            }
        }
        false
    }

    pub fn special_process(
        &self,
        cx: &mut EffectContext<'_>,
        call: SpecialProcessCall,
    ) -> SpecialProcessOutcome {
        cx.journal.info(
            Category::SpecialProcess,
            format!(
                "Running special process {} (arg1={}, arg2={})",
                call.id, call.arg1, call.arg2
            ),
        );
        for resolver in &self.resolvers {
            if let Some(value) = resolver.special_process(cx, call) {
                return SpecialProcessOutcome::handled(value);
            }
        }
        cx.journal.warn(
            Category::SpecialProcess,
            format!("Unhandled special process ID {}", call.id),
        );
        SpecialProcessOutcome::unhandled()
    }
}
