// App state and main event loop.
// Manages tabs, crawl events, and keyboard input handling.

use std::io;
use std::path::PathBuf;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use log::Level;
use ratatui::prelude::*;
use tokio::runtime::Handle;

use crate::config::Settings;
use crate::error::{Result, ScoutError};
use crate::events::{CrawlEvent, EventBus, Subscription};
use crate::state::{
    ConsoleLevel, ConsoleMessage, ConsoleOutput, ContactsView, FileInputProxy, TabSwitcher,
};
use crate::ui;

/// Tabs of the application, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Input,
    Console,
    Contacts,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Input, Tab::Console, Tab::Contacts];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Input => "Input",
            Tab::Console => "Console",
            Tab::Contacts => "Contacts",
        }
    }
}

/// Main application state.
pub struct App {
    pub tabs: TabSwitcher<Tab>,
    pub console: ConsoleOutput,
    /// Number of unread console errors (for badge).
    pub console_unread: usize,
    pub file_input: FileInputProxy,
    pub contacts: ContactsView,
    /// A crawl is in flight.
    pub running: bool,
    pub show_help: bool,
    /// Whether the app should exit.
    pub should_quit: bool,
    pub settings: Settings,
    /// Screen area of the file trigger, set while drawing the Input tab.
    pub trigger_area: Rect,
    events: EventBus,
    subscription: Subscription,
    runtime: Handle,
}

impl App {
    pub fn new(settings: Settings, runtime: Handle) -> Result<Self> {
        let tabs = TabSwitcher::new(Tab::ALL.to_vec())
            .ok_or_else(|| ScoutError::Other("no tabs to show".into()))?;
        let file_input = settings
            .input
            .as_ref()
            .map(|path| FileInputProxy::with_value(&path.to_string_lossy()))
            .unwrap_or_default();
        let events = EventBus::new();
        let subscription = events.subscribe();

        Ok(Self {
            tabs,
            console: ConsoleOutput::new(),
            console_unread: 0,
            file_input,
            contacts: ContactsView::new(),
            running: false,
            show_help: false,
            should_quit: false,
            settings,
            trigger_area: Rect::default(),
            events,
            subscription,
            runtime,
        })
    }

    /// Main event loop.
    pub fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
        while !self.should_quit {
            self.drain_events();
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_events()?;
        }
        Ok(())
    }

    /// Handle keyboard and mouse events.
    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                Event::Mouse(mouse) => self.handle_mouse(mouse),
                _ => {}
            }
        }
        Ok(())
    }

    /// A left click on the file trigger opens the path entry.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.show_help || self.tabs.active() != Tab::Input {
            return;
        }
        if mouse.kind == MouseEventKind::Down(MouseButton::Left)
            && self
                .trigger_area
                .contains(Position::new(mouse.column, mouse.row))
        {
            self.file_input.click();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }

        if self.file_input.picker_focused() {
            if let Some(value) = self.file_input.on_picker_key(key.code) {
                self.push_console(ConsoleMessage::info(format!("Input file: {}", value)));
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('s') => self.start_crawl(),
            KeyCode::Tab => {
                self.tabs.next();
                self.clear_console_badge_if_viewing();
            }
            KeyCode::BackTab => {
                self.tabs.prev();
                self.clear_console_badge_if_viewing();
            }
            KeyCode::Char(c @ '1'..='3') => {
                let index = c as usize - '1' as usize;
                self.tabs.activate_index(index);
                self.clear_console_badge_if_viewing();
            }
            code => match self.tabs.active() {
                Tab::Input => {
                    self.file_input.on_trigger_key(code);
                }
                Tab::Console => self.handle_console_key(code),
                Tab::Contacts => match code {
                    KeyCode::Up | KeyCode::Char('k') => self.contacts.select_prev(),
                    KeyCode::Down | KeyCode::Char('j') => self.contacts.select_next(),
                    _ => {}
                },
            },
        }
    }

    fn handle_console_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.console.scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => self.console.scroll_down(),
            KeyCode::PageUp => self.console.page_up(),
            KeyCode::PageDown => self.console.page_down(),
            KeyCode::Home | KeyCode::Char('g') => self.console.scroll_to_top(),
            KeyCode::End | KeyCode::Char('G') => self.console.scroll_to_bottom(),
            _ => {}
        }
    }

    /// Spawn a crawl of the chosen input file on the runtime.
    pub fn start_crawl(&mut self) {
        if self.running {
            self.push_console(ConsoleMessage::warn("A crawl is already running"));
            return;
        }
        let Some(input) = self.file_input.value().map(PathBuf::from) else {
            self.push_console(ConsoleMessage::warn(
                "Choose an input file on the Input tab first",
            ));
            return;
        };

        let pipeline = match self.settings.pipeline(self.events.clone()) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                self.push_console(ConsoleMessage::error(format!("Cannot start crawl: {}", e)));
                return;
            }
        };

        self.running = true;
        self.contacts.set_loading();
        self.push_console(ConsoleMessage::info(format!(
            "Starting crawl of {}",
            input.display()
        )));

        let output_dir = self.settings.output_dir.clone();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            if let Err(e) = pipeline.run_file(&input, &output_dir).await {
                log::error!("Crawl failed: {}", e);
                events.publish(CrawlEvent::Failed {
                    error: e.to_string(),
                });
            }
        });
    }

    /// Apply every pending crawl event.
    pub fn drain_events(&mut self) {
        while let Some(event) = self.subscription.try_next() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: CrawlEvent) {
        match event {
            CrawlEvent::Visiting { url } => {
                self.push_console(ConsoleMessage::info(format!("Visiting {}", url)));
            }
            CrawlEvent::Log { level, message } => {
                let message = match level {
                    Level::Error => ConsoleMessage::error(message),
                    Level::Warn => ConsoleMessage::warn(message),
                    _ => ConsoleMessage::info(message),
                };
                self.push_console(message);
            }
            CrawlEvent::ContactsFound { contacts, .. } => self.contacts.add_preview(&contacts),
            CrawlEvent::Finished { rows, usage } => {
                self.running = false;
                self.contacts.set_loaded(rows, usage);
            }
            CrawlEvent::Failed { error } => {
                self.running = false;
                self.push_console(ConsoleMessage::error(format!("Crawl failed: {}", error)));
                self.contacts.set_error(error);
            }
        }
    }

    fn push_console(&mut self, message: ConsoleMessage) {
        if message.level == ConsoleLevel::Error && self.tabs.active() != Tab::Console {
            self.console_unread += 1;
        }
        self.console.push(message);
    }

    /// Clear console badge when viewing console tab.
    fn clear_console_badge_if_viewing(&mut self) {
        if self.tabs.active() == Tab::Console {
            self.console_unread = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::agent::AgentOptions;
    use crate::contacts::{Contact, ContactRow};
    use crate::openai::TokenUsage;

    fn settings(input: Option<&str>) -> Settings {
        Settings {
            input: input.map(PathBuf::from),
            output_dir: PathBuf::from("."),
            base_url: "http://localhost".to_string(),
            api_key: None,
            agent: AgentOptions::default(),
            cache_ttl: Duration::ZERO,
            timeout: Duration::from_secs(1),
            verbose: false,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(input: Option<&str>) -> App {
        App::new(settings(input), Handle::current()).unwrap()
    }

    #[tokio::test]
    async fn test_tab_keys() {
        let mut app = app(None);
        assert_eq!(app.tabs.active(), Tab::Input);

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.tabs.active(), Tab::Console);
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.tabs.active(), Tab::Input);
        app.handle_key(key(KeyCode::Char('3')));
        assert_eq!(app.tabs.active(), Tab::Contacts);
        app.handle_key(key(KeyCode::BackTab));
        app.handle_key(key(KeyCode::BackTab));
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.tabs.active(), Tab::Contacts);
    }

    #[tokio::test]
    async fn test_q_is_typed_into_picker() {
        let mut app = app(None);
        app.handle_key(key(KeyCode::Enter));
        assert!(app.file_input.picker_focused());

        for c in "q.csv".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert!(!app.should_quit);

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.file_input.value(), Some("q.csv"));
        assert!(!app.file_input.picker_focused());

        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_help_swallows_keys() {
        let mut app = app(None);
        app.handle_key(key(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        app.handle_key(key(KeyCode::Esc));
        assert!(!app.show_help);
    }

    #[tokio::test]
    async fn test_start_without_input_or_key() {
        let mut app = app(None);
        app.handle_key(key(KeyCode::Char('s')));
        assert!(!app.running);
        assert!(app.console.messages()[0].message.contains("Choose an input file"));

        let mut app = self::app(Some("/tmp/in.csv"));
        app.handle_key(key(KeyCode::Char('s')));
        assert!(!app.running);
        assert_eq!(app.console_unread, 1);
        assert!(app.console.messages()[0].message.contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_events_feed_console_and_contacts() {
        let mut app = app(None);
        app.events.warn("slow page");
        app.events.error("bad page");
        app.events.publish(CrawlEvent::ContactsFound {
            start_url: "https://a.de/".to_string(),
            contacts: vec![Contact::new("Anna")],
        });
        app.drain_events();

        assert_eq!(app.console.len(), 2);
        assert_eq!(app.console_unread, 1);
        assert_eq!(app.contacts.rows().len(), 1);

        app.events.publish(CrawlEvent::Finished {
            rows: vec![ContactRow::from(Contact::new("Ben"))],
            usage: TokenUsage::default(),
        });
        app.drain_events();
        assert!(app.contacts.data.is_loaded());
        assert_eq!(app.contacts.rows()[0].name, "Ben");

        app.handle_key(key(KeyCode::Char('2')));
        assert_eq!(app.console_unread, 0);
    }

    fn left_click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[tokio::test]
    async fn test_click_on_trigger_opens_picker() {
        let mut app = app(None);
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| ui::draw(frame, &mut app)).unwrap();

        let trigger = app.trigger_area;
        assert!(trigger.height > 0);

        app.handle_mouse(left_click(trigger.x, trigger.bottom()));
        assert!(!app.file_input.picker_focused());

        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Right),
            ..left_click(trigger.x + 2, trigger.y + 1)
        });
        assert!(!app.file_input.picker_focused());

        app.handle_mouse(left_click(trigger.x + 2, trigger.y + 1));
        assert!(app.file_input.picker_focused());
    }

    #[tokio::test]
    async fn test_click_ignored_on_other_tabs() {
        let mut app = app(None);
        app.trigger_area = Rect::new(0, 2, 80, 3);
        app.handle_key(key(KeyCode::Char('2')));

        app.handle_mouse(left_click(2, 3));
        assert!(!app.file_input.picker_focused());
    }
}
