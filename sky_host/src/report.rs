use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use sky_hooks::host::{DialogueBoxAttributes, Entity, Item, MonsterId, Recruit, ScriptVar};
use sky_hooks::{HookPoint, LogEntry};

use crate::sim::SimHost;

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub kind: &'static str,
    /// Whether the runtime (rather than the host's native code) took the event.
    pub handled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    pub fn new(index: usize, kind: &'static str) -> Self {
        StepReport {
            index,
            kind,
            handled: false,
            value: None,
            detail: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HostSnapshot {
    pub border_color: Option<i32>,
    pub dialogue_box: Option<DialogueBoxAttributes>,
    pub variables: BTreeMap<ScriptVar, i32>,
    /// Byte variables decoded up to the first NUL.
    pub text_variables: BTreeMap<ScriptVar, String>,
    pub messages: Vec<String>,
    pub stat_boosts: Vec<String>,
    pub roster: BTreeMap<usize, Recruit>,
    pub joined: Vec<MonsterId>,
    pub partner_name: Option<String>,
    pub portraits_shown: Vec<MonsterId>,
    pub open_windows: usize,
}

impl HostSnapshot {
    pub fn capture(host: &SimHost) -> Self {
        let text_variables = host
            .variable_bytes
            .iter()
            .map(|(var, bytes)| {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                (*var, String::from_utf8_lossy(&bytes[..end]).into_owned())
            })
            .collect();
        HostSnapshot {
            border_color: host.border_color,
            dialogue_box: host.dialogue_box,
            variables: host.variables.clone(),
            text_variables,
            messages: host.messages.clone(),
            stat_boosts: host.stat_boosts.clone(),
            roster: host.roster.clone(),
            joined: host.joined.clone(),
            partner_name: host.partner_name.clone(),
            portraits_shown: host.portraits_shown.clone(),
            open_windows: host.open_windows(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub scenario: String,
    pub resolvers: Vec<String>,
    pub hooks: Vec<HookPoint>,
    pub steps: Vec<StepReport>,
    pub entities: BTreeMap<String, Entity>,
    pub items: BTreeMap<String, Item>,
    pub host: HostSnapshot,
    pub journal: Vec<LogEntry>,
}

impl Report {
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing scenario report")
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = self.to_json_string()?;
        fs::write(path, json).with_context(|| format!("writing report to {}", path.display()))?;
        Ok(())
    }

    pub fn print_summary(&self) {
        println!("Scenario {}", self.scenario);
        println!("  resolvers: {}", self.resolvers.join(" -> "));
        for step in &self.steps {
            let mut line = format!("  [{}] {} handled={}", step.index, step.kind, step.handled);
            if let Some(value) = step.value {
                line.push_str(&format!(" value={value}"));
            }
            if let Some(detail) = &step.detail {
                line.push_str(&format!(" ({detail})"));
            }
            if let Some(error) = &step.error {
                line.push_str(&format!(" error: {error}"));
            }
            println!("{line}");
        }
        println!("  journal entries: {}", self.journal.len());
    }
}
