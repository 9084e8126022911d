//! The single object a host keeps around to answer every patched call site.

use crate::config::RuntimeConfig;
use crate::effects::{
    check_beast_boost, EffectChain, EffectContext, EffectResolver, LocalEffects, MoveEffectInput,
    SpecialProcessCall, SpecialProcessOutcome,
};
#[cfg(any(feature = "custom-instructions", feature = "custom-menus"))]
use crate::error::HookError;
use crate::hooks::{self, SpecialProcessRoute};
use crate::host::{Entity, Host, Item, Move};
use crate::journal::{Journal, LogEntry};

#[cfg(feature = "custom-instructions")]
use crate::hooks::OpcodeRoute;
#[cfg(feature = "custom-instructions")]
use crate::host::ScriptRoutine;
#[cfg(feature = "custom-instructions")]
use crate::instructions::{CustomInstruction, InstructionTable};

#[cfg(feature = "custom-menus")]
use crate::host::StringId;
#[cfg(feature = "custom-menus")]
use crate::menus::{MenuDescriptor, MenuMachine, MenuState, MenuStep};

pub struct RuntimeBuilder {
    config: RuntimeConfig,
    local: LocalEffects,
    secondary: Vec<Box<dyn EffectResolver>>,
    #[cfg(feature = "custom-instructions")]
    instructions: Option<Vec<CustomInstruction>>,
    #[cfg(feature = "custom-menus")]
    menus: Option<Vec<MenuDescriptor>>,
}

impl RuntimeBuilder {
    pub fn new(config: RuntimeConfig) -> Self {
        RuntimeBuilder {
            config,
            local: LocalEffects::builtin(),
            secondary: Vec::new(),
            #[cfg(feature = "custom-instructions")]
            instructions: None,
            #[cfg(feature = "custom-menus")]
            menus: None,
        }
    }

    /// Replaces the built-in local effect table.
    pub fn local_effects(mut self, local: LocalEffects) -> Self {
        self.local = local;
        self
    }

    /// Adds a resolver consulted after the local table and any resolver
    /// added before it.
    pub fn secondary(mut self, resolver: Box<dyn EffectResolver>) -> Self {
        self.secondary.push(resolver);
        self
    }

    /// Replaces the built-in instruction table.
    #[cfg(feature = "custom-instructions")]
    pub fn instructions(mut self, instructions: Vec<CustomInstruction>) -> Self {
        self.instructions = Some(instructions);
        self
    }

    /// Replaces the built-in menu table.
    #[cfg(feature = "custom-menus")]
    pub fn menus(mut self, menus: Vec<MenuDescriptor>) -> Self {
        self.menus = Some(menus);
        self
    }

    pub fn build(self) -> Runtime {
        let effects = self
            .secondary
            .into_iter()
            .fold(EffectChain::new(self.local), EffectChain::with_secondary);

        #[cfg(feature = "custom-instructions")]
        let instructions = match self.instructions {
            Some(instructions) => {
                InstructionTable::new(self.config.first_custom_opcode, instructions)
            }
            None => InstructionTable::builtin(self.config.first_custom_opcode),
        };

        #[cfg(feature = "custom-menus")]
        let menus = match self.menus {
            Some(menus) => MenuMachine::new(self.config.first_custom_menu, menus),
            None => MenuMachine::builtin(self.config.first_custom_menu),
        };

        Runtime {
            journal: Journal::new(self.config.journal),
            config: self.config,
            effects,
            #[cfg(feature = "custom-instructions")]
            instructions,
            #[cfg(feature = "custom-menus")]
            menus,
        }
    }
}

pub struct Runtime {
    config: RuntimeConfig,
    journal: Journal,
    effects: EffectChain,
    #[cfg(feature = "custom-instructions")]
    instructions: InstructionTable,
    #[cfg(feature = "custom-menus")]
    menus: MenuMachine,
}

impl Runtime {
    /// A runtime with every built-in table and no secondary resolver.
    pub fn new(config: RuntimeConfig) -> Self {
        RuntimeBuilder::new(config).build()
    }

    pub fn builder(config: RuntimeConfig) -> RuntimeBuilder {
        RuntimeBuilder::new(config)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Drains the retained log entries.
    pub fn take_journal(&mut self) -> Vec<LogEntry> {
        self.journal.take()
    }

    pub fn resolver_names(&self) -> Vec<String> {
        self.effects.resolver_names()
    }

    pub fn apply_item_effect(
        &mut self,
        host: &mut dyn Host,
        user: &mut Entity,
        target: &mut Entity,
        item: &mut Item,
        is_thrown: bool,
    ) -> bool {
        let mut cx = EffectContext::new(host, &mut self.journal);
        self.effects
            .apply_item_effect(&mut cx, user, target, item, is_thrown)
    }

    pub fn apply_move_effect(
        &mut self,
        host: &mut dyn Host,
        input: &mut MoveEffectInput,
        user: &mut Entity,
        target: &mut Entity,
        used_move: &mut Move,
    ) -> bool {
        let mut cx = EffectContext::new(host, &mut self.journal);
        self.effects
            .apply_move_effect(&mut cx, input, user, target, used_move)
    }

    /// Post-hit ability check, run by the host after every damaging move.
    pub fn check_beast_boost(
        &mut self,
        host: &mut dyn Host,
        user: &mut Entity,
        target: &Entity,
    ) -> bool {
        let mut cx = EffectContext::new(host, &mut self.journal);
        check_beast_boost(&mut cx, user, target)
    }

    pub fn route_special_process(&self, id: u32) -> SpecialProcessRoute {
        hooks::route_special_process(&self.config, id)
    }

    /// Resolves a special process through the effect chain regardless of id.
    pub fn special_process(
        &mut self,
        host: &mut dyn Host,
        call: SpecialProcessCall,
    ) -> SpecialProcessOutcome {
        let mut cx = EffectContext::new(host, &mut self.journal);
        self.effects.special_process(&mut cx, call)
    }

    /// Entry point of the special process hook. `None` means the host should
    /// run its own implementation; otherwise the value goes to the script.
    pub fn handle_special_process(
        &mut self,
        host: &mut dyn Host,
        call: SpecialProcessCall,
    ) -> Option<i32> {
        match self.route_special_process(call.id) {
            SpecialProcessRoute::Native => None,
            SpecialProcessRoute::Custom => Some(self.special_process(host, call).value),
        }
    }
}

#[cfg(feature = "custom-instructions")]
impl Runtime {
    pub fn instructions(&self) -> &InstructionTable {
        &self.instructions
    }

    pub fn route_opcode(&self, opcode: i32) -> OpcodeRoute {
        hooks::route_opcode(&self.config, opcode)
    }

    pub fn parameter_count(&mut self, index: i32) -> Result<u8, HookError> {
        self.instructions.parameter_count(index, &mut self.journal)
    }

    /// Operand words the host must read for `opcode`; `None` for native
    /// opcodes, whose counts the host knows itself.
    pub fn opcode_parameter_count(&mut self, opcode: i32) -> Result<Option<u8>, HookError> {
        match self.route_opcode(opcode) {
            OpcodeRoute::Native => Ok(None),
            OpcodeRoute::Custom { index } => self.parameter_count(index).map(Some),
        }
    }

    pub fn dispatch_instruction(
        &mut self,
        index: i32,
        routine: &mut ScriptRoutine,
        host: &mut dyn Host,
        args: &[u16],
    ) -> Result<(), HookError> {
        self.instructions
            .dispatch(index, routine, host, &mut self.journal, args)
    }

    /// Entry point of the opcode hook. Native opcodes are handed back
    /// untouched; custom ones are dispatched.
    pub fn handle_opcode(
        &mut self,
        opcode: i32,
        routine: &mut ScriptRoutine,
        host: &mut dyn Host,
        args: &[u16],
    ) -> Result<OpcodeRoute, HookError> {
        let route = self.route_opcode(opcode);
        if let OpcodeRoute::Custom { index } = route {
            self.dispatch_instruction(index, routine, host, args)?;
        }
        Ok(route)
    }
}

#[cfg(feature = "custom-menus")]
impl Runtime {
    pub fn menus(&self) -> &MenuMachine {
        &self.menus
    }

    pub fn menu_state(&self) -> &MenuState {
        self.menus.state()
    }

    pub fn start_menu(&mut self, menu_id: i32, host: &mut dyn Host) -> Result<(), HookError> {
        self.menus.start(menu_id, host, &mut self.journal)
    }

    pub fn step_menu(&mut self, menu_id: i32, host: &mut dyn Host) -> MenuStep {
        self.menus.step(menu_id, host, &mut self.journal)
    }

    pub fn keyboard_mode(&self, menu_id: i32) -> i32 {
        hooks::keyboard_mode(&self.config, menu_id)
    }

    /// Prompt string for a custom menu's keyboard; `None` keeps the host's.
    pub fn keyboard_prompt_string(&self, menu_id: i32) -> Option<StringId> {
        if menu_id < self.config.first_custom_menu {
            return None;
        }
        self.menus
            .descriptor(menu_id)
            .and_then(|menu| menu.keyboard_prompt())
    }

    /// Confirmation string to show after typing: the running custom menu's,
    /// or `default` when none is running or it defines none.
    pub fn confirm_string(&self, default: StringId) -> StringId {
        self.menus
            .active_descriptor()
            .and_then(|menu| menu.keyboard_confirm())
            .unwrap_or(default)
    }
}
