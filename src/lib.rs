// contact-scout library.
// LLM-driven contact crawler with a ratatui front end.

pub mod agent;
pub mod app;
pub mod cache;
pub mod config;
pub mod contacts;
pub mod error;
pub mod events;
pub mod openai;
pub mod pipeline;
pub mod state;
pub mod ui;
pub mod web;

pub use error::{Result, ScoutError};
