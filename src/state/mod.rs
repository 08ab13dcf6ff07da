// State management module.
// Tab switching, console scrolling, input file selection and contacts table state.

pub mod console;
pub mod contacts;
pub mod file_input;
pub mod tabs;

pub use console::{ConsoleLevel, ConsoleMessage, ConsoleOutput};
pub use contacts::{ContactsView, LoadingState};
pub use file_input::{FileInputFocus, FileInputProxy};
pub use tabs::TabSwitcher;
