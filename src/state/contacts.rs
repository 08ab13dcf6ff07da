// Contacts tab state.
// Holds crawl progress, found contacts and the table selection.

use ratatui::widgets::TableState;

use crate::contacts::{Contact, ContactRow};
use crate::openai::TokenUsage;

/// Loading state for async data.
#[derive(Debug, Clone, Default)]
pub enum LoadingState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> LoadingState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadingState::Loaded(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadingState::Loaded(data) => Some(data),
            _ => None,
        }
    }
}

/// Contacts seen while a crawl runs, replaced by the final rows once it ends.
#[derive(Debug, Clone, Default)]
pub struct ContactsView {
    pub data: LoadingState<Vec<ContactRow>>,
    /// First-pass results published while the crawl is still running.
    pub preview: Vec<ContactRow>,
    pub table_state: TableState,
    pub usage: Option<TokenUsage>,
}

impl ContactsView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows currently on screen: final rows if loaded, otherwise the preview.
    pub fn rows(&self) -> &[ContactRow] {
        match &self.data {
            LoadingState::Loaded(rows) => rows,
            _ => &self.preview,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.table_state.selected()
    }

    pub fn selected_row(&self) -> Option<&ContactRow> {
        self.rows().get(self.table_state.selected()?)
    }

    pub fn select_next(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 >= len => i,
            Some(i) => i + 1,
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn select_prev(&mut self) {
        if self.rows().is_empty() {
            return;
        }
        let i = self
            .table_state
            .selected()
            .map(|i| i.saturating_sub(1))
            .unwrap_or(0);
        self.table_state.select(Some(i));
    }

    fn reset_selection(&mut self) {
        let selection = (!self.rows().is_empty()).then_some(0);
        self.table_state.select(selection);
    }

    /// A crawl started: drop previous results.
    pub fn set_loading(&mut self) {
        self.data = LoadingState::Loading;
        self.preview.clear();
        self.usage = None;
        self.table_state.select(None);
    }

    /// Append contacts found for one start URL.
    pub fn add_preview(&mut self, contacts: &[Contact]) {
        self.preview
            .extend(contacts.iter().cloned().map(ContactRow::from));
        if self.table_state.selected().is_none() {
            self.reset_selection();
        }
    }

    pub fn set_loaded(&mut self, rows: Vec<ContactRow>, usage: TokenUsage) {
        self.data = LoadingState::Loaded(rows);
        self.usage = Some(usage);
        self.reset_selection();
    }

    pub fn set_error(&mut self, error: String) {
        self.data = LoadingState::Error(error);
    }
}
