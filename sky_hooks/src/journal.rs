//! Categorised logging for every dispatch, resolve and menu transition.
//!
//! Entries are forwarded to the `log` facade with the category as the target
//! and, unless disabled, kept in memory so a host can inspect them after a
//! frame.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Default,
    SpecialProcess,
    Effects,
    Instructions,
    Menus,
}

impl Category {
    pub fn target(self) -> &'static str {
        match self {
            Category::Default => "hooks",
            Category::SpecialProcess => "hooks.special_process",
            Category::Effects => "hooks.effects",
            Category::Instructions => "hooks.ground_instructions",
            Category::Menus => "hooks.script_menus",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    fn level(self) -> log::Level {
        match self {
            Severity::Info => log::Level::Info,
            Severity::Warn => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub category: Category,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Journal {
    enabled: bool,
    entries: Vec<LogEntry>,
}

impl Default for Journal {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Journal {
    pub fn new(enabled: bool) -> Self {
        Journal {
            enabled,
            entries: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, category: Category, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        log::log!(target: category.target(), severity.level(), "{message}");
        if self.enabled {
            self.entries.push(LogEntry {
                category,
                severity,
                message,
            });
        }
    }

    pub fn info(&mut self, category: Category, message: impl Into<String>) {
        self.record(category, Severity::Info, message);
    }

    pub fn warn(&mut self, category: Category, message: impl Into<String>) {
        self.record(category, Severity::Warn, message);
    }

    pub fn error(&mut self, category: Category, message: impl Into<String>) {
        self.record(category, Severity::Error, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of retained entries matching both category and severity.
    pub fn count(&self, category: Category, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.category == category && entry.severity == severity)
            .count()
    }

    pub fn take(&mut self) -> Vec<LogEntry> {
        std::mem::take(&mut self.entries)
    }
}

/// Reports a broken internal invariant and stops the caller.
///
/// Reserved for states the runtime cannot recover from without risking the
/// host's memory; recoverable conditions go through [`Journal`] instead.
#[track_caller]
pub fn halt(message: impl fmt::Display) -> ! {
    log::error!(target: Category::Default.target(), "ASSERTION FAILED: {message}");
    panic!("ASSERTION FAILED: {message}");
}

#[cfg(test)]
mod tests {
    use super::{Category, Journal, Severity};

    #[test]
    fn journal_counts_by_category_and_severity() {
        let mut journal = Journal::default();
        journal.info(Category::Effects, "Running item effect 99");
        journal.warn(Category::SpecialProcess, "Unhandled special process ID 150");
        journal.warn(Category::Effects, "something else");

        assert_eq!(journal.entries().len(), 3);
        assert_eq!(journal.count(Category::SpecialProcess, Severity::Warn), 1);
        assert_eq!(journal.count(Category::Effects, Severity::Info), 1);
        assert_eq!(journal.count(Category::Menus, Severity::Error), 0);
    }

    #[test]
    fn disabled_journal_keeps_nothing() {
        let mut journal = Journal::new(false);
        journal.error(Category::Menus, "Custom request for script menu 99 out of bounds");
        assert!(journal.entries().is_empty());
        assert!(!journal.is_enabled());
    }

    #[test]
    fn take_drains_entries() {
        let mut journal = Journal::default();
        journal.info(Category::Default, "hello");
        let drained = journal.take();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].message, "hello");
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn categories_map_to_dotted_targets() {
        assert_eq!(Category::Instructions.target(), "hooks.ground_instructions");
        assert_eq!(Category::Menus.to_string(), "hooks.script_menus");
    }

    #[test]
    #[should_panic(expected = "ASSERTION FAILED")]
    fn halt_panics() {
        super::halt("window slot 25 outside the 20 slots a menu owns");
    }
}
