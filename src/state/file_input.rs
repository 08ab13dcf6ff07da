// Input file picker state.
// A styled trigger in front of a path entry field; mirrors the chosen file name.

use crossterm::event::KeyCode;

/// Which part of the control owns keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileInputFocus {
    #[default]
    Trigger,
    Picker,
}

/// Trigger + path entry pair for selecting the input CSV.
#[derive(Debug, Clone, Default)]
pub struct FileInputProxy {
    focus: FileInputFocus,
    /// Text currently typed into the picker.
    buffer: String,
    /// Last committed value of the picker.
    value: Option<String>,
    /// Sanitized name shown next to the trigger.
    display: String,
}

impl FileInputProxy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fill the picker with a value, as if it had been selected.
    pub fn with_value(value: &str) -> Self {
        let mut proxy = Self::new();
        proxy.on_change(value);
        proxy
    }

    /// Pointer activation of the trigger.
    pub fn click(&mut self) {
        self.focus_picker();
    }

    /// Keyboard activation of the trigger. Only Enter and Space do anything.
    pub fn on_trigger_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.focus_picker();
                true
            }
            _ => false,
        }
    }

    /// Keys typed while the picker has focus.
    /// Returns the committed value when Enter fires a change event.
    pub fn on_picker_key(&mut self, code: KeyCode) -> Option<String> {
        match code {
            KeyCode::Char(c) => {
                self.buffer.push(c);
                None
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                None
            }
            KeyCode::Esc => {
                self.focus = FileInputFocus::Trigger;
                None
            }
            KeyCode::Enter => {
                let value = self.buffer.trim().to_string();
                self.focus = FileInputFocus::Trigger;
                if value.is_empty() {
                    return None;
                }
                self.on_change(&value);
                Some(value)
            }
            _ => None,
        }
    }

    /// Change event of the underlying picker.
    pub fn on_change(&mut self, value: &str) {
        self.display = display_name(value).to_string();
        self.value = Some(value.to_string());
    }

    pub fn focus(&self) -> FileInputFocus {
        self.focus
    }

    pub fn picker_focused(&self) -> bool {
        self.focus == FileInputFocus::Picker
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    fn focus_picker(&mut self) {
        self.focus = FileInputFocus::Picker;
        self.buffer = self.value.clone().unwrap_or_default();
    }
}

/// Last path segment of a picker value, accepting `/` and `\` separators.
/// Values without a separator are returned unchanged.
pub fn display_name(value: &str) -> &str {
    value
        .rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(value)
}
