//! Terminal front panel for the generator.
//!
//! Provides an interactive terminal view with:
//! - Serial console (typed commands, echo, help, debug trace)
//! - Generator state and the number being entered
//! - Simulated AD9833 register file and output
//! - Recent words on the link

mod app;
mod ui;

pub use app::{PanelApp, run_panel};
