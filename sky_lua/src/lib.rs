//! Lua-scripted effect overrides.
//!
//! A script registers handlers in three global tables keyed by numeric id:
//!
//! ```lua
//! item_effects[70] = function(user, target, item, is_thrown) ... return true end
//! move_effects[12] = function(user, target, move) ... return true, dealt_damage end
//! special_processes[120] = function(arg1, arg2) ... return value end
//! ```
//!
//! Entities, items and moves cross into Lua as plain tables and are copied
//! back only when the handler claims the event. While a handler runs, a
//! `host` table exposes `border_color(n)`, `rand(low, high)` and `log(msg)`.
//! Border color changes only reach the host once the handler claims.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mlua::{Function, Lua, LuaOptions, StdLib, Table, Value};
use sky_hooks::effects::{EffectContext, EffectResolver, MoveEffectInput, SpecialProcessCall};
use sky_hooks::host::{Entity, Item, Move};
use sky_hooks::journal::Category;
use thiserror::Error;

const ITEM_EFFECTS: &str = "item_effects";
const MOVE_EFFECTS: &str = "move_effects";
const SPECIAL_PROCESSES: &str = "special_processes";

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Lua(#[from] mlua::Error),
}

pub struct LuaResolver {
    name: String,
    lua: Lua,
}

impl LuaResolver {
    /// Runs `source` once so it can fill the handler tables. The tables are
    /// created empty beforehand, so scripts may assign into them directly.
    pub fn from_source(name: impl Into<String>, source: &str) -> Result<Self, ScriptError> {
        let name = name.into();
        let lua = Lua::new_with(StdLib::ALL_SAFE, LuaOptions::default())?;
        {
            let globals = lua.globals();
            for table in [ITEM_EFFECTS, MOVE_EFFECTS, SPECIAL_PROCESSES] {
                globals.set(table, lua.create_table()?)?;
            }
        }
        lua.load(source).set_name(name.as_str()).exec()?;
        log::debug!(target: "hooks.effects", "loaded effect script {name}");
        Ok(LuaResolver { name, lua })
    }

    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let source = fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(path.display().to_string(), &source)
    }

    /// Ids with a registered handler in the given global table, ascending.
    pub fn handled_ids(&self, table: &str) -> Result<Vec<i64>, ScriptError> {
        let Some(handlers) = self.lua.globals().get::<_, Option<Table>>(table)? else {
            return Ok(Vec::new());
        };
        let mut ids = Vec::new();
        for pair in handlers.pairs::<i64, Value>() {
            let (id, _) = pair?;
            ids.push(id);
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn handler(&self, table: &str, id: i64) -> mlua::Result<Option<Function<'_>>> {
        match self.lua.globals().get::<_, Option<Table>>(table)? {
            Some(handlers) => handlers.get(id),
            None => Ok(None),
        }
    }

    /// Runs `call` with the `host` table bound to the current context.
    /// Border color changes are held back until `call` claims the event with
    /// `Some`; a decline or a Lua error drops them. `rand` draws from the
    /// host generator immediately.
    fn with_host<R>(
        &self,
        cx: &mut EffectContext<'_>,
        category: Category,
        call: impl FnOnce() -> mlua::Result<Option<R>>,
    ) -> mlua::Result<Option<R>> {
        let pending_colors = RefCell::new(Vec::new());
        let outcome = {
            let host = RefCell::new(&mut *cx.host);
            let journal = RefCell::new(&mut *cx.journal);
            self.lua.scope(|scope| {
                let api = self.lua.create_table()?;
                api.set(
                    "border_color",
                    scope.create_function(|_, color: i32| {
                        pending_colors.borrow_mut().push(color);
                        Ok(())
                    })?,
                )?;
                api.set(
                    "rand",
                    scope.create_function(|_, (low, high): (i32, i32)| {
                        Ok(host.borrow_mut().rand_range(low, high))
                    })?,
                )?;
                api.set(
                    "log",
                    scope.create_function(|_, message: String| {
                        journal.borrow_mut().info(category, message);
                        Ok(())
                    })?,
                )?;

                let globals = self.lua.globals();
                globals.set("host", api)?;
                let result = call();
                globals.set("host", Value::Nil)?;
                result
            })
        };

        if matches!(outcome, Ok(Some(_))) {
            for color in pending_colors.into_inner() {
                cx.host.change_global_border_color(color);
            }
        }
        outcome
    }

    fn report(&self, cx: &mut EffectContext<'_>, category: Category, what: &str, err: &mlua::Error) {
        cx.journal.error(
            category,
            format!("Script {} failed in {what}: {err}", self.name),
        );
    }
}

impl EffectResolver for LuaResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply_item_effect(
        &self,
        cx: &mut EffectContext<'_>,
        user: &mut Entity,
        target: &mut Entity,
        item: &mut Item,
        is_thrown: bool,
    ) -> bool {
        let what = format!("item effect {}", item.id);
        let handler = match self.handler(ITEM_EFFECTS, i64::from(item.id)) {
            Ok(Some(handler)) => handler,
            Ok(None) => return false,
            Err(err) => {
                self.report(cx, Category::Effects, &what, &err);
                return false;
            }
        };

        let outcome = self.with_host(cx, Category::Effects, || {
            let user_table = entity_table(&self.lua, user)?;
            let target_table = entity_table(&self.lua, target)?;
            let item_table = item_table(&self.lua, item)?;
            let handled: bool = handler.call((
                user_table.clone(),
                target_table.clone(),
                item_table.clone(),
                is_thrown,
            ))?;
            if !handled {
                return Ok(None);
            }
            Ok(Some((
                read_entity(&user_table, user)?,
                read_entity(&target_table, target)?,
                read_item(&item_table, item)?,
            )))
        });

        match outcome {
            Ok(Some((new_user, new_target, new_item))) => {
                *user = new_user;
                *target = new_target;
                *item = new_item;
                true
            }
            Ok(None) => false,
            Err(err) => {
                self.report(cx, Category::Effects, &what, &err);
                false
            }
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
        let what = format!("move effect {}", input.move_id);
        let handler = match self.handler(MOVE_EFFECTS, i64::from(input.move_id)) {
            Ok(Some(handler)) => handler,
            Ok(None) => return false,
            Err(err) => {
                self.report(cx, Category::Effects, &what, &err);
                return false;
            }
        };

        let outcome = self.with_host(cx, Category::Effects, || {
            let user_table = entity_table(&self.lua, user)?;
            let target_table = entity_table(&self.lua, target)?;
            let move_table = move_table(&self.lua, used_move)?;
            let (handled, dealt_damage): (bool, Option<bool>) =
                handler.call((user_table.clone(), target_table.clone(), move_table.clone()))?;
            if !handled {
                return Ok(None);
            }
            Ok(Some((
                read_entity(&user_table, user)?,
                read_entity(&target_table, target)?,
                read_move(&move_table, used_move)?,
                dealt_damage,
            )))
        });

        match outcome {
            Ok(Some((new_user, new_target, new_move, dealt_damage))) => {
                *user = new_user;
                *target = new_target;
                *used_move = new_move;
                if let Some(dealt_damage) = dealt_damage {
                    input.dealt_damage = dealt_damage;
                }
                true
            }
            Ok(None) => false,
            Err(err) => {
                self.report(cx, Category::Effects, &what, &err);
                false
            }
        }
    }

    fn special_process(&self, cx: &mut EffectContext<'_>, call: SpecialProcessCall) -> Option<i32> {
        let what = format!("special process {}", call.id);
        let handler = match self.handler(SPECIAL_PROCESSES, i64::from(call.id)) {
            Ok(Some(handler)) => handler,
            Ok(None) => return None,
            Err(err) => {
                self.report(cx, Category::SpecialProcess, &what, &err);
                return None;
            }
        };

        let outcome = self.with_host(cx, Category::SpecialProcess, || {
            handler
                .call::<_, Option<i32>>((call.arg1, call.arg2))
                .map(|value| Some(value.unwrap_or(0)))
        });
        match outcome {
            Ok(value) => value,
            Err(err) => {
                self.report(cx, Category::SpecialProcess, &what, &err);
                None
            }
        }
    }
}

fn entity_table<'lua>(lua: &'lua Lua, entity: &Entity) -> mlua::Result<Table<'lua>> {
    let table = lua.create_table()?;
    table.set("valid", entity.valid)?;
    if let Some(monster) = &entity.monster {
        table.set("species", monster.species)?;
        table.set("hp", monster.hp)?;
        table.set("max_hp", monster.max_hp)?;
        table.set("atk", monster.atk)?;
        table.set("def", monster.def)?;
        table.set("sp_atk", monster.sp_atk)?;
        table.set("sp_def", monster.sp_def)?;
        let moves = lua.create_table()?;
        for (slot, known) in monster.moves.iter().enumerate() {
            moves.set(slot + 1, move_table(lua, known)?)?;
        }
        table.set("moves", moves)?;
    }
    Ok(table)
}

fn read_entity(table: &Table<'_>, entity: &Entity) -> mlua::Result<Entity> {
    let mut updated = entity.clone();
    updated.valid = table.get("valid")?;
    if let Some(monster) = updated.monster.as_mut() {
        monster.hp = table.get("hp")?;
        monster.max_hp = table.get("max_hp")?;
        monster.atk = table.get("atk")?;
        monster.def = table.get("def")?;
        monster.sp_atk = table.get("sp_atk")?;
        monster.sp_def = table.get("sp_def")?;
        if let Some(moves) = table.get::<_, Option<Table>>("moves")? {
            for (slot, known) in monster.moves.iter_mut().enumerate() {
                if let Some(move_table) = moves.get::<_, Option<Table>>(slot + 1)? {
                    *known = read_move(&move_table, known)?;
                }
            }
        }
    }
    Ok(updated)
}

fn move_table<'lua>(lua: &'lua Lua, known: &Move) -> mlua::Result<Table<'lua>> {
    let table = lua.create_table()?;
    table.set("id", known.id)?;
    table.set("pp", known.pp)?;
    table.set("max_pp", known.max_pp)?;
    Ok(table)
}

fn read_move(table: &Table<'_>, known: &Move) -> mlua::Result<Move> {
    Ok(Move {
        id: known.id,
        pp: table.get("pp")?,
        max_pp: table.get("max_pp")?,
    })
}

fn item_table<'lua>(lua: &'lua Lua, item: &Item) -> mlua::Result<Table<'lua>> {
    let table = lua.create_table()?;
    table.set("id", item.id)?;
    table.set("quantity", item.quantity)?;
    Ok(table)
}

fn read_item(table: &Table<'_>, item: &Item) -> mlua::Result<Item> {
    Ok(Item {
        id: item.id,
        quantity: table.get("quantity")?,
    })
}
