//! The AD9833 side of the generator.
//!
//! - [`register`] turns frequencies into the 16-bit words the chip expects
//! - [`link`] shifts those words out over three bit-banged lines
//! - [`sim`] models the chip on the receiving end of the link

pub mod register;
pub mod link;
pub mod sim;

pub use register::{ChipWord, Conversion, Encoder, FrequencyLoad, Register, Waveform};
pub use link::{BitLink, HalPins, Line, PinEvent, Pins, TracePins};
pub use sim::{ChipOutput, SimulatedChip};
