//! [`TrainingLog`] implementations.

use crate::api::sink::TrainingLog;

/// Forwards progress to the `log` facade: text at info, errors at warn.
#[derive(Debug, Clone)]
pub struct LogSink {
    enabled: bool,
}

impl LogSink {
    pub fn new() -> Self {
        Self { enabled: true }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingLog for LogSink {
    fn append_text(&mut self, line: &str) {
        if self.enabled {
            log::info!("{line}");
        }
    }

    fn append_error(&mut self, line: &str) {
        if self.enabled {
            log::warn!("{line}");
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    Text(String),
    Error(String),
}

impl LogLine {
    pub fn as_str(&self) -> &str {
        match self {
            LogLine::Text(s) | LogLine::Error(s) => s,
        }
    }
}

/// Keeps every accepted line in memory.
#[derive(Debug, Clone)]
pub struct BufferLog {
    lines: Vec<LogLine>,
    enabled: bool,
}

impl BufferLog {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            enabled: true,
        }
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|l| match l {
            LogLine::Text(s) => Some(s.as_str()),
            LogLine::Error(_) => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|l| match l {
            LogLine::Error(s) => Some(s.as_str()),
            LogLine::Text(_) => None,
        })
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Default for BufferLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingLog for BufferLog {
    fn append_text(&mut self, line: &str) {
        if self.enabled {
            self.lines.push(LogLine::Text(line.to_string()));
        }
    }

    fn append_error(&mut self, line: &str) {
        if self.enabled {
            self.lines.push(LogLine::Error(line.to_string()));
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl TrainingLog for NullLog {
    fn append_text(&mut self, _line: &str) {}
    fn append_error(&mut self, _line: &str) {}
    fn set_enabled(&mut self, _enabled: bool) {}

    fn is_enabled(&self) -> bool {
        false
    }
}
