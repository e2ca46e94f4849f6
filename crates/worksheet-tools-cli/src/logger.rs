use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Metadata, Record};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub message: String,
}

/// Writes records to stderr and keeps the most recent warnings so a command
/// can summarize what was defaulted or skipped
#[derive(Clone)]
pub struct CliLogger {
    level: LevelFilter,
    warnings: Arc<Mutex<Vec<LogEntry>>>,
    max_entries: usize,
}

impl CliLogger {
    pub fn new(verbose: bool, max_entries: usize) -> Self {
        Self {
            level: if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
            warnings: Arc::new(Mutex::new(Vec::new())),
            max_entries,
        }
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }

    pub fn warnings(&self) -> Vec<LogEntry> {
        self.warnings
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl log::Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = LogEntry {
            timestamp: Local::now(),
            level: record.level(),
            message: format!("{}", record.args()),
        };
        eprintln!(
            "{} {:<5} {}",
            entry.timestamp.format("%H:%M:%S%.3f"),
            entry.level,
            entry.message
        );

        if entry.level <= Level::Warn {
            if let Ok(mut warnings) = self.warnings.lock() {
                warnings.push(entry);

                // Keep only the most recent entries
                if warnings.len() > self.max_entries {
                    let excess = warnings.len() - self.max_entries;
                    warnings.drain(0..excess);
                }
            }
        }
    }

    fn flush(&self) {}
}
