//! Bit-banged three-wire link to the chip.
//!
//! Protocol per word: FSYNC low, then for each of the 16 bits (MSB first)
//! drive DATA and pulse CLOCK low then high, then FSYNC high again. CLOCK
//! idles high between words.

use crate::chip::register::ChipWord;
use embedded_hal::digital::{OutputPin, PinState};
use std::convert::Infallible;
use std::fmt;

/// The three output lines of the link.
pub trait Pins {
    type Error: fmt::Debug;

    fn set_data(&mut self, high: bool) -> Result<(), Self::Error>;
    fn set_clock(&mut self, high: bool) -> Result<(), Self::Error>;
    fn set_frame_sync(&mut self, high: bool) -> Result<(), Self::Error>;
}

impl<P: Pins + ?Sized> Pins for &mut P {
    type Error = P::Error;

    fn set_data(&mut self, high: bool) -> Result<(), Self::Error> {
        (**self).set_data(high)
    }

    fn set_clock(&mut self, high: bool) -> Result<(), Self::Error> {
        (**self).set_clock(high)
    }

    fn set_frame_sync(&mut self, high: bool) -> Result<(), Self::Error> {
        (**self).set_frame_sync(high)
    }
}

/// Serial writer on top of a set of [`Pins`].
#[derive(Debug)]
pub struct BitLink<P> {
    pins: P,
    words_sent: u64,
}

impl<P: Pins> BitLink<P> {
    /// Wrap the pins. Nothing is driven until [`idle`](Self::idle) or the
    /// first [`transmit`](Self::transmit).
    pub fn new(pins: P) -> Self {
        Self { pins, words_sent: 0 }
    }

    /// Put the bus into its idle state: CLOCK high, FSYNC high.
    pub fn idle(&mut self) -> Result<(), P::Error> {
        self.pins.set_clock(true)?;
        self.pins.set_frame_sync(true)
    }

    /// Shift one 16-bit word out to the chip.
    pub fn transmit(&mut self, word: ChipWord) -> Result<(), P::Error> {
        tracing::trace!(word = %word, "transmit");

        self.pins.set_frame_sync(false)?;
        for bit in (0..16).rev() {
            self.pins.set_data(word.bit(bit))?;
            self.pins.set_clock(false)?;
            self.pins.set_clock(true)?;
        }
        self.pins.set_frame_sync(true)?;

        self.words_sent += 1;
        Ok(())
    }

    /// Number of completed transmissions.
    pub fn words_sent(&self) -> u64 {
        self.words_sent
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }
}

/// [`Pins`] backed by three `embedded-hal` output pins.
///
/// | Line  | AD9833 pin |
/// |-------|------------|
/// | data  | SDATA      |
/// | clock | SCLK       |
/// | fsync | FSYNC      |
pub struct HalPins<Data, Clock, Fsync> {
    data: Data,
    clock: Clock,
    fsync: Fsync,
}

impl<Data, Clock, Fsync, E> HalPins<Data, Clock, Fsync>
where
    Data: OutputPin<Error = E>,
    Clock: OutputPin<Error = E>,
    Fsync: OutputPin<Error = E>,
{
    pub fn new(data: Data, clock: Clock, fsync: Fsync) -> Self {
        Self { data, clock, fsync }
    }
}

impl<Data, Clock, Fsync, E> Pins for HalPins<Data, Clock, Fsync>
where
    Data: OutputPin<Error = E>,
    Clock: OutputPin<Error = E>,
    Fsync: OutputPin<Error = E>,
    E: fmt::Debug,
{
    type Error = E;

    fn set_data(&mut self, high: bool) -> Result<(), E> {
        self.data.set_state(PinState::from(high))
    }

    fn set_clock(&mut self, high: bool) -> Result<(), E> {
        self.clock.set_state(PinState::from(high))
    }

    fn set_frame_sync(&mut self, high: bool) -> Result<(), E> {
        self.fsync.set_state(PinState::from(high))
    }
}

/// One of the three link lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    Data,
    Clock,
    FrameSync,
}

/// A single level change request on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    pub line: Line,
    pub high: bool,
}

/// Records every pin operation, for assertions in tests and traces.
#[derive(Debug, Clone, Default)]
pub struct TracePins {
    pub events: Vec<PinEvent>,
}

impl TracePins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Rebuild the words from the recorded trace.
    ///
    /// DATA is sampled on every falling CLOCK edge while FSYNC is low;
    /// a frame contributes a word when FSYNC rises after exactly 16 edges.
    pub fn words(&self) -> Vec<ChipWord> {
        let mut words = Vec::new();
        let mut data = false;
        let mut clock = true;
        let mut framed = false;
        let mut shift: u16 = 0;
        let mut bits = 0;

        for event in &self.events {
            match event.line {
                Line::Data => data = event.high,
                Line::Clock => {
                    if framed && clock && !event.high {
                        shift = (shift << 1) | data as u16;
                        bits += 1;
                    }
                    clock = event.high;
                }
                Line::FrameSync => {
                    if !event.high {
                        framed = true;
                        shift = 0;
                        bits = 0;
                    } else {
                        if framed && bits == 16 {
                            words.push(ChipWord(shift));
                        }
                        framed = false;
                    }
                }
            }
        }

        words
    }
}

impl Pins for TracePins {
    type Error = Infallible;

    fn set_data(&mut self, high: bool) -> Result<(), Infallible> {
        self.events.push(PinEvent { line: Line::Data, high });
        Ok(())
    }

    fn set_clock(&mut self, high: bool) -> Result<(), Infallible> {
        self.events.push(PinEvent { line: Line::Clock, high });
        Ok(())
    }

    fn set_frame_sync(&mut self, high: bool) -> Result<(), Infallible> {
        self.events.push(PinEvent { line: Line::FrameSync, high });
        Ok(())
    }
}
