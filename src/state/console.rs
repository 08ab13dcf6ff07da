// Console tab state.
// Holds crawl output lines, the scroll offset, and the auto-scroll flag.

use chrono::{DateTime, Utc};

/// Console message level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Info,
    Warn,
    Error,
}

/// A single line in the console.
#[derive(Debug, Clone)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ConsoleMessage {
    pub fn new(level: ConsoleLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ConsoleLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(ConsoleLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ConsoleLevel::Error, message)
    }
}

/// Scrollable output with tail-follow.
///
/// `auto_scroll` starts out `true` and is recomputed on every scroll event
/// as `offset + visible >= total`. Appending a line jumps to the bottom only
/// while the flag is set.
#[derive(Debug, Clone)]
pub struct ConsoleOutput {
    messages: Vec<ConsoleMessage>,
    offset: usize,
    visible: usize,
    auto_scroll: bool,
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            offset: 0,
            visible: 1,
            auto_scroll: true,
        }
    }
}

impl ConsoleOutput {
    const PAGE_STEP: usize = 10;
    const MAX_LINES: usize = 10_000;

    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line and follow the tail if the flag allows it.
    pub fn push(&mut self, message: ConsoleMessage) {
        self.messages.push(message);
        self.trim_old_lines_if_needed();
        if self.auto_scroll {
            self.offset = self.max_offset();
        }
    }

    /// Handle a scroll event that moves the view to `offset`.
    pub fn on_scroll(&mut self, offset: usize) {
        self.offset = offset.min(self.max_offset());
        self.auto_scroll = self.offset + self.visible >= self.messages.len();
    }

    /// Update the number of visible rows (terminal resize).
    pub fn set_viewport(&mut self, visible: usize) {
        self.visible = visible.max(1);
        if self.auto_scroll {
            self.offset = self.max_offset();
        } else {
            self.on_scroll(self.offset);
        }
    }

    pub fn scroll_up(&mut self) {
        self.on_scroll(self.offset.saturating_sub(1));
    }

    pub fn scroll_down(&mut self) {
        self.on_scroll(self.offset + 1);
    }

    pub fn page_up(&mut self) {
        self.on_scroll(self.offset.saturating_sub(Self::PAGE_STEP));
    }

    pub fn page_down(&mut self) {
        self.on_scroll(self.offset + Self::PAGE_STEP);
    }

    pub fn scroll_to_top(&mut self) {
        self.on_scroll(0);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.on_scroll(self.max_offset());
    }

    pub fn messages(&self) -> &[ConsoleMessage] {
        &self.messages
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.offset = 0;
        self.auto_scroll = true;
    }

    fn max_offset(&self) -> usize {
        self.messages.len().saturating_sub(self.visible)
    }

    fn trim_old_lines_if_needed(&mut self) {
        if self.messages.len() <= Self::MAX_LINES {
            return;
        }
        let overflow = self.messages.len() - Self::MAX_LINES;
        self.messages.drain(0..overflow);
        self.offset = self.offset.saturating_sub(overflow);
    }
}
