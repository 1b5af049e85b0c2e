//! # TinyAD9833
//!
//! Serial command interpreter for an AD9833 DDS waveform generator.
//!
//! Commands arrive one byte at a time (`1.5kS` = 1.5 kHz sine). The
//! interpreter collects the number, dispatches the command letter, encodes
//! the frequency into AD9833 register words and shifts them out over a
//! bit-banged three-wire link.

pub mod chip;
pub mod command;
pub mod config;
pub mod generator;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use chip::{BitLink, ChipWord, Encoder, HalPins, Pins, SimulatedChip, TracePins, Waveform};
pub use command::{Command, GeneratorState, Interpreter, Reaction, HELP_TEXT};
pub use config::{ConfigError, GeneratorConfig};
pub use generator::{Duplex, Generator, GeneratorError, Poll};

#[cfg(feature = "tui")]
pub use tui::run_panel;
