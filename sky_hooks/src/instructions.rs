//! Custom script engine instructions.
//!
//! Opcodes at or above the configured first custom opcode are routed here.
//! The host reads as many operand words as [`InstructionTable::parameter_count`]
//! reports and then calls [`InstructionTable::dispatch`] with them.

use std::borrow::Cow;
use std::fmt;

use crate::error::HookError;
use crate::host::{DialogueBoxAttributes, Host, ScriptRoutine, ScriptVar};
use crate::journal::{Category, Journal};
use crate::table::{HandlerTable, TableKind};

/// Everything an instruction handler may touch while it runs.
pub struct InstructionContext<'a> {
    pub routine: &'a mut ScriptRoutine,
    pub host: &'a mut dyn Host,
    pub journal: &'a mut Journal,
}

impl InstructionContext<'_> {
    /// Decodes operand `index` through the host. Missing operands read as 0.
    pub fn param(&self, args: &[u16], index: usize) -> i32 {
        args.get(index)
            .map_or(0, |&raw| self.host.process_script_param(raw))
    }
}

pub type InstructionFn = dyn Fn(&mut InstructionContext<'_>, &[u16]);

pub struct CustomInstruction {
    name: Cow<'static, str>,
    param_count: u8,
    handler: Box<InstructionFn>,
}

impl CustomInstruction {
    /// `param_count` must be exactly the number of operand words `handler`
    /// reads; the host relies on it to advance its operand stream.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        param_count: u8,
        handler: impl Fn(&mut InstructionContext<'_>, &[u16]) + 'static,
    ) -> Self {
        CustomInstruction {
            name: name.into(),
            param_count,
            handler: Box::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_count(&self) -> u8 {
        self.param_count
    }
}

impl fmt::Debug for CustomInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomInstruction")
            .field("name", &self.name)
            .field("param_count", &self.param_count)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct InstructionTable {
    table: HandlerTable<CustomInstruction>,
}

impl InstructionTable {
    pub fn new(first_opcode: i32, instructions: Vec<CustomInstruction>) -> Self {
        InstructionTable {
            table: HandlerTable::new(TableKind::Instructions, first_opcode, instructions),
        }
    }

    /// The instructions shipped with the runtime, starting at `first_opcode`.
    pub fn builtin(first_opcode: i32) -> Self {
        Self::new(
            first_opcode,
            vec![
                CustomInstruction::new("SetDialogueBoxAttributes", 6, set_dialogue_box_attributes),
                CustomInstruction::new("CheckInputStatus", 1, check_input_status),
            ],
        )
    }

    pub fn first_opcode(&self) -> i32 {
        self.table.first_id()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Index an opcode maps to; may fall outside the table.
    pub fn index_of(&self, opcode: i32) -> i32 {
        self.table.index_of(opcode)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &CustomInstruction)> {
        self.table.iter()
    }

    pub fn parameter_count(&self, index: i32, journal: &mut Journal) -> Result<u8, HookError> {
        match self.table.get(index) {
            Ok(instruction) => Ok(instruction.param_count),
            Err(err) => {
                journal.error(
                    Category::Instructions,
                    format!("Parameter count requested for custom opcode {index} out of bounds"),
                );
                Err(err)
            }
        }
    }

    /// Runs the instruction at `index`. Out-of-range indices are logged and
    /// nothing runs. Operand contents are not validated here.
    pub fn dispatch(
        &self,
        index: i32,
        routine: &mut ScriptRoutine,
        host: &mut dyn Host,
        journal: &mut Journal,
        args: &[u16],
    ) -> Result<(), HookError> {
        let instruction = match self.table.get(index) {
            Ok(instruction) => instruction,
            Err(err) => {
                journal.error(
                    Category::Instructions,
                    format!("Custom opcode {index} out of bounds"),
                );
                return Err(err);
            }
        };

        journal.info(
            Category::Instructions,
            format!(
                "Running custom instruction '{}' with {} arguments (opcode {}, index {})",
                instruction.name,
                instruction.param_count,
                self.table.first_id().saturating_add(index),
                index
            ),
        );
        let mut cx = InstructionContext {
            routine,
            host,
            journal,
        };
        (instruction.handler)(&mut cx, args);
        Ok(())
    }
}

/// Overwrites the default dialogue box attributes.
///
/// Operands: x, y, width, height, screen (0 = bottom, 1 = top), frame
/// (0xFD = default, 0xFA = invisible).
fn set_dialogue_box_attributes(cx: &mut InstructionContext<'_>, args: &[u16]) {
    let attributes = DialogueBoxAttributes {
        x: cx.param(args, 0),
        y: cx.param(args, 1),
        width: cx.param(args, 2),
        height: cx.param(args, 3),
        screen: cx.param(args, 4),
        frame: cx.param(args, 5),
    };
    cx.host.set_dialogue_box_attributes(attributes);
    cx.journal.info(
        Category::Instructions,
        format!(
            "Setting dialogue box attributes: x={}, y={}, width={}, height={}, screen={}, frame={}",
            attributes.x,
            attributes.y,
            attributes.width,
            attributes.height,
            attributes.screen,
            attributes.frame
        ),
    );
}

/// Saves the pressed (mode 0) or held (any other mode) buttons into
/// `$EVENT_LOCAL` as a bitfield.
fn check_input_status(cx: &mut InstructionContext<'_>, args: &[u16]) {
    let buttons = if cx.param(args, 0) == 0 {
        cx.host.pressed_buttons()
    } else {
        cx.host.held_buttons()
    };
    cx.host
        .save_script_variable(ScriptVar::EventLocal, buttons as i32);
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{CustomInstruction, InstructionTable};
    use crate::error::HookError;
    use crate::host::{DialogueBoxAttributes, ScriptRoutine, ScriptVar};
    use crate::journal::{Category, Journal, Severity};
    use crate::table::TableKind;
    use crate::testing::RecordingHost;

    type CallLog = Rc<RefCell<Vec<(usize, Vec<u16>)>>>;

    fn recording_table(counts: &[u8], log: &CallLog) -> InstructionTable {
        let instructions = counts
            .iter()
            .enumerate()
            .map(|(slot, &count)| {
                let log = log.clone();
                CustomInstruction::new(format!("Op{slot}"), count, move |_cx, args| {
                    log.borrow_mut().push((slot, args.to_vec()));
                })
            })
            .collect();
        InstructionTable::new(0x1000, instructions)
    }

    #[test]
    fn dispatch_runs_exactly_the_indexed_handler() {
        let log = CallLog::default();
        let table = recording_table(&[6, 1], &log);
        let mut host = RecordingHost::new();
        let mut journal = Journal::default();
        let mut routine = ScriptRoutine::default();

        table
            .dispatch(1, &mut routine, &mut host, &mut journal, &[3])
            .expect("in range");
        assert_eq!(*log.borrow(), vec![(1, vec![3])]);

        let entry = journal.entries().last().expect("logged");
        assert_eq!(entry.category, Category::Instructions);
        assert_eq!(
            entry.message,
            "Running custom instruction 'Op1' with 1 arguments (opcode 4097, index 1)"
        );
    }

    #[test]
    fn out_of_range_dispatch_runs_nothing() {
        let log = CallLog::default();
        let table = recording_table(&[6, 1], &log);
        let mut host = RecordingHost::new();
        let mut journal = Journal::default();
        let mut routine = ScriptRoutine::default();

        for index in [2, -1, i32::MAX] {
            let err = table
                .dispatch(index, &mut routine, &mut host, &mut journal, &[])
                .unwrap_err();
            assert_eq!(
                err,
                HookError::OutOfRange {
                    table: TableKind::Instructions,
                    index,
                    len: 2,
                }
            );
        }
        assert!(log.borrow().is_empty());
        assert_eq!(journal.count(Category::Instructions, Severity::Error), 3);
        assert_eq!(journal.count(Category::Instructions, Severity::Info), 0);
    }

    #[test]
    fn parameter_counts_agree_with_table() {
        let log = CallLog::default();
        let table = recording_table(&[6, 1], &log);
        let mut journal = Journal::default();
        assert_eq!(table.parameter_count(0, &mut journal), Ok(6));
        assert_eq!(table.parameter_count(1, &mut journal), Ok(1));
        assert!(table.parameter_count(2, &mut journal).is_err());
        assert_eq!(journal.count(Category::Instructions, Severity::Error), 1);
    }

    #[test]
    fn builtin_dialogue_box_instruction_sets_attributes() {
        let table = InstructionTable::builtin(0x1000);
        let mut host = RecordingHost::new();
        let mut journal = Journal::default();
        let mut routine = ScriptRoutine { id: 4 };

        assert_eq!(table.parameter_count(0, &mut journal), Ok(6));
        table
            .dispatch(
                0,
                &mut routine,
                &mut host,
                &mut journal,
                &[2, 3, 28, 6, 1, 0xFA],
            )
            .expect("dispatched");
        assert_eq!(
            host.dialogue_box,
            Some(DialogueBoxAttributes {
                x: 2,
                y: 3,
                width: 28,
                height: 6,
                screen: 1,
                frame: 0xFA,
            })
        );
    }

    #[test]
    fn builtin_input_status_reads_pressed_or_held() {
        let table = InstructionTable::builtin(0x1000);
        let mut host = RecordingHost::new();
        host.pressed = 0b0101;
        host.held = 0b1000;
        let mut journal = Journal::default();
        let mut routine = ScriptRoutine::default();

        table
            .dispatch(1, &mut routine, &mut host, &mut journal, &[0])
            .expect("dispatched");
        assert_eq!(host.variables.get(&ScriptVar::EventLocal), Some(&0b0101));

        table
            .dispatch(1, &mut routine, &mut host, &mut journal, &[1])
            .expect("dispatched");
        assert_eq!(host.variables.get(&ScriptVar::EventLocal), Some(&0b1000));
    }

    #[test]
    fn builtin_table_lists_names_with_opcodes() {
        let table = InstructionTable::builtin(0x1000);
        let listed: Vec<(i32, String)> = table
            .iter()
            .map(|(opcode, instruction)| (opcode, instruction.name().to_string()))
            .collect();
        assert_eq!(
            listed,
            vec![
                (0x1000, "SetDialogueBoxAttributes".to_string()),
                (0x1001, "CheckInputStatus".to_string()),
            ]
        );
    }
}
