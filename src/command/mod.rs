//! The serial command line.
//!
//! Grammar: `digit* ('.' digit*)? [k|M]? command`, one byte at a time.

pub mod accumulator;
pub mod dispatch;

pub use accumulator::{Accumulator, DigitBuffer, EntryPhase, UnitSuffix, DIGIT_SLOTS};
pub use dispatch::{Command, GeneratorState, Input, Interpreter, Reaction, HELP_TEXT};
