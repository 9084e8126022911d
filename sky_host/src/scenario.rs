//! Scripted sequences of host events replayed against a runtime.

use std::collections::BTreeMap;
use std::fs;
use std::iter;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sky_hooks::host::{ItemId, MonsterId, MoveId, Recruit, ScriptRoutine};
use sky_hooks::{
    Entity, HookError, Item, Move, MoveEffectInput, OpcodeRoute, Runtime, SpecialProcessCall,
};

use crate::report::{HostSnapshot, Report, StepReport};
use crate::sim::{MenuInput, SimHost};

fn default_roster_capacity() -> usize {
    8
}

fn default_frame_limit() -> usize {
    240
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldSetup {
    pub entities: BTreeMap<String, Entity>,
    pub items: BTreeMap<String, Item>,
    pub pressed: u32,
    pub held: u32,
    /// Species whose secondary form is the female one.
    pub dual_gender: Vec<MonsterId>,
    /// Values handed out by the host RNG, in order.
    pub random: Vec<i32>,
    pub monster_names: BTreeMap<MonsterId, String>,
    pub roster: BTreeMap<usize, Recruit>,
    pub roster_capacity: usize,
}

impl Default for WorldSetup {
    fn default() -> Self {
        WorldSetup {
            entities: BTreeMap::new(),
            items: BTreeMap::new(),
            pressed: 0,
            held: 0,
            dual_gender: Vec::new(),
            random: Vec::new(),
            monster_names: BTreeMap::new(),
            roster: BTreeMap::new(),
            roster_capacity: default_roster_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// A script opcode reaching the opcode check. `args` is padded with zero
    /// words up to the instruction's parameter count.
    Opcode {
        opcode: i32,
        #[serde(default)]
        args: Vec<u16>,
    },
    UseItem {
        user: String,
        target: String,
        item: String,
        #[serde(default)]
        thrown: bool,
    },
    /// A move hitting `target`. When no handler claims it, the host deals
    /// `power` damage itself.
    UseMove {
        user: String,
        target: String,
        move_id: MoveId,
        #[serde(default)]
        item_id: ItemId,
        #[serde(default)]
        power: i32,
    },
    SpecialProcess {
        id: u32,
        #[serde(default)]
        arg1: i16,
        #[serde(default)]
        arg2: i16,
    },
    /// Opens a script menu and updates it once per frame until it finishes.
    Menu {
        id: i32,
        #[serde(default)]
        input: MenuInput,
        #[serde(default = "default_frame_limit")]
        frame_limit: usize,
    },
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Opcode { .. } => "opcode",
            Step::UseItem { .. } => "use_item",
            Step::UseMove { .. } => "use_move",
            Step::SpecialProcess { .. } => "special_process",
            Step::Menu { .. } => "menu",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub world: WorldSetup,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing scenario {}", path.display()))
    }

    /// A host populated from the scenario's world.
    pub fn host(&self) -> SimHost {
        let world = &self.world;
        let mut host = SimHost::new(world.roster_capacity);
        host.pressed = world.pressed;
        host.held = world.held;
        host.dual_gender = world.dual_gender.clone();
        host.monster_names = world.monster_names.clone();
        host.roster = world.roster.clone();
        host.queue_random(world.random.iter().copied());
        host
    }

    /// Replays every step in order. Hook errors are recorded on the step and
    /// the run continues; a step naming an unknown entity or item aborts it.
    pub fn run(&self, runtime: &mut Runtime, host: &mut SimHost) -> Result<Report> {
        let mut entities = self.world.entities.clone();
        let mut items = self.world.items.clone();
        let mut routine = ScriptRoutine::default();
        let mut steps = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let mut report = StepReport::new(index, step.kind());
            match step {
                Step::Opcode { opcode, args } => {
                    run_opcode(runtime, host, &mut routine, *opcode, args, &mut report);
                }
                Step::UseItem {
                    user,
                    target,
                    item,
                    thrown,
                } => {
                    let item_state = items
                        .get_mut(item)
                        .with_context(|| format!("step {index}: unknown item '{item}'"))?;
                    let (mut user_entity, mut target_entity) =
                        take_pair(&mut entities, user, target)
                            .with_context(|| format!("step {index}"))?;
                    report.handled = runtime.apply_item_effect(
                        host,
                        &mut user_entity,
                        &mut target_entity,
                        item_state,
                        *thrown,
                    );
                    if !report.handled {
                        report.detail = Some(format!("item {} left to host", item_state.id));
                    }
                    entities.insert(user.clone(), user_entity);
                    entities.insert(target.clone(), target_entity);
                }
                Step::UseMove {
                    user,
                    target,
                    move_id,
                    item_id,
                    power,
                } => {
                    let (mut user_entity, mut target_entity) =
                        take_pair(&mut entities, user, target)
                            .with_context(|| format!("step {index}"))?;
                    run_move(
                        runtime,
                        host,
                        &mut user_entity,
                        &mut target_entity,
                        *move_id,
                        *item_id,
                        *power,
                        &mut report,
                    );
                    entities.insert(user.clone(), user_entity);
                    entities.insert(target.clone(), target_entity);
                }
                Step::SpecialProcess { id, arg1, arg2 } => {
                    let call = SpecialProcessCall {
                        id: *id,
                        arg1: *arg1,
                        arg2: *arg2,
                    };
                    match runtime.handle_special_process(host, call) {
                        Some(value) => {
                            report.handled = true;
                            report.value = Some(value);
                        }
                        None => {
                            report.value = Some(0);
                            report.detail = Some(format!("special process {id} left to host"));
                        }
                    }
                }
                Step::Menu {
                    id,
                    input,
                    frame_limit,
                } => {
                    host.queue_input(input.clone());
                    run_menu(runtime, host, *id, *frame_limit, &mut report);
                }
            }
            log::debug!("step {index} ({}) handled={}", report.kind, report.handled);
            steps.push(report);
        }

        Ok(Report {
            scenario: self.name.clone(),
            resolvers: runtime.resolver_names(),
            hooks: sky_hooks::installed_hooks(),
            steps,
            entities,
            items,
            host: HostSnapshot::capture(host),
            journal: runtime.take_journal(),
        })
    }
}

fn take_pair(
    entities: &mut BTreeMap<String, Entity>,
    user: &str,
    target: &str,
) -> Result<(Entity, Entity)> {
    if user == target {
        bail!("user and target must be different entities (both '{user}')");
    }
    if !entities.contains_key(target) {
        bail!("unknown entity '{target}'");
    }
    let user_entity = entities
        .remove(user)
        .with_context(|| format!("unknown entity '{user}'"))?;
    let target_entity = entities
        .remove(target)
        .with_context(|| format!("unknown entity '{target}'"))?;
    Ok((user_entity, target_entity))
}

fn record_error(report: &mut StepReport, error: HookError) {
    report.error = Some(error.to_string());
}

fn run_opcode(
    runtime: &mut Runtime,
    host: &mut SimHost,
    routine: &mut ScriptRoutine,
    opcode: i32,
    args: &[u16],
    report: &mut StepReport,
) {
    let count = match runtime.opcode_parameter_count(opcode) {
        Ok(Some(count)) => count,
        Ok(None) => {
            report.detail = Some(format!("opcode {opcode:#x} left to host"));
            return;
        }
        Err(error) => return record_error(report, error),
    };
    let words: Vec<u16> = args
        .iter()
        .copied()
        .chain(iter::repeat(0))
        .take(usize::from(count))
        .collect();
    match runtime.handle_opcode(opcode, routine, host, &words) {
        Ok(OpcodeRoute::Custom { index }) => {
            report.handled = true;
            report.value = Some(index);
            report.detail = Some(format!("{count} parameters"));
        }
        Ok(OpcodeRoute::Native) => {
            report.detail = Some(format!("opcode {opcode:#x} left to host"));
        }
        Err(error) => record_error(report, error),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_move(
    runtime: &mut Runtime,
    host: &mut SimHost,
    user: &mut Entity,
    target: &mut Entity,
    move_id: MoveId,
    item_id: ItemId,
    power: i32,
    report: &mut StepReport,
) {
    let known = user
        .monster
        .as_ref()
        .and_then(|monster| monster.moves.iter().position(|known| known.id == move_id));
    let mut used_move = known
        .and_then(|slot| user.monster.as_ref().map(|monster| monster.moves[slot].clone()))
        .unwrap_or(Move {
            id: move_id,
            ..Move::default()
        });
    let mut input = MoveEffectInput {
        move_id,
        item_id,
        dealt_damage: false,
    };

    report.handled = runtime.apply_move_effect(host, &mut input, user, target, &mut used_move);
    if !report.handled {
        input.dealt_damage = deal_native_damage(target, power);
        report.detail = Some(format!("native damage {power}"));
    }
    if let (Some(slot), Some(monster)) = (known, user.monster.as_mut()) {
        monster.moves[slot] = used_move;
    }

    if input.dealt_damage && runtime.check_beast_boost(host, user, target) {
        report.detail = Some(match report.detail.take() {
            Some(detail) => format!("{detail}, beast boost"),
            None => "beast boost".to_string(),
        });
    }
}

/// The host's own damage step: knocks `power` HP off and invalidates the
/// target once it faints.
fn deal_native_damage(target: &mut Entity, power: i32) -> bool {
    let Some(monster) = target.monster.as_mut() else {
        return false;
    };
    if power <= 0 {
        return false;
    }
    monster.hp = monster.hp.saturating_sub(power).max(0);
    if monster.hp == 0 {
        target.valid = false;
    }
    true
}

fn run_menu(
    runtime: &mut Runtime,
    host: &mut SimHost,
    menu_id: i32,
    frame_limit: usize,
    report: &mut StepReport,
) {
    if let Err(error) = runtime.start_menu(menu_id, host) {
        return record_error(report, error);
    }
    for frame in 0..frame_limit {
        let step = runtime.step_menu(menu_id, host);
        if step.finished {
            report.handled = true;
            report.value = Some(step.return_value);
            report.detail = Some(format!("finished after {} frames", frame + 1));
            return;
        }
        host.advance_frame();
    }
    report.error = Some(format!(
        "script menu {menu_id} still running after {frame_limit} frames"
    ));
}
