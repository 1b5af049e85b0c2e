//! The generator: interpreter, link and transport wired together.
//!
//! One call to [`Generator::poll`] reads at most one byte from the transport
//! and runs it to completion, chip writes included. [`Generator::run`]
//! repeats that until the transport reports end of input.

use crate::chip::link::{BitLink, Pins};
use crate::chip::register::reset_word;
use crate::chip::sim::SimulatedChip;
use crate::command::dispatch::{Interpreter, Reaction, HELP_TEXT};
use crate::config::GeneratorConfig;
use std::fmt;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Outcome of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A byte was read and handled.
    Handled(u8),
    /// Nothing available yet.
    Idle,
    /// The transport is closed.
    Closed,
}

/// The full command processor driving one chip.
pub struct Generator<P: Pins> {
    pub interpreter: Interpreter,
    link: BitLink<P>,
    /// Bytes handled so far.
    pub bytes_handled: u64,
}

impl<P: Pins> Generator<P> {
    pub fn new(config: &GeneratorConfig, pins: P) -> Self {
        Self {
            interpreter: Interpreter::new(config),
            link: BitLink::new(pins),
            bytes_handled: 0,
        }
    }

    /// Idle the bus and park the chip at midscale with B28 set.
    ///
    /// Must run once before the first byte is handled; frequency loads
    /// assume the chip is already in B28 mode.
    pub fn power_up(&mut self) -> Result<(), P::Error> {
        self.link.idle()?;
        self.link.transmit(reset_word())?;
        tracing::info!(word = %reset_word(), "power-up reset");
        Ok(())
    }

    /// Handle one byte, writing echo, help and debug trace to `out`.
    pub fn handle_byte<W: Write>(
        &mut self,
        byte: u8,
        out: &mut W,
    ) -> Result<Reaction, GeneratorError<P::Error>> {
        let reaction = self.interpreter.handle_byte(byte);
        self.bytes_handled += 1;

        if let Some(echo) = reaction.echo {
            out.write_all(&[echo])?;
        }
        if reaction.help {
            out.write_all(HELP_TEXT.as_bytes())?;
        }
        for &word in &reaction.writes {
            if self.interpreter.state.debug {
                write!(out, "{}\r\n", word)?;
            }
            self.link.transmit(word).map_err(GeneratorError::Pin)?;
        }
        out.flush()?;

        Ok(reaction)
    }

    /// Read at most one byte from `transport` and handle it.
    pub fn poll<T: Read + Write>(
        &mut self,
        transport: &mut T,
    ) -> Result<Poll, GeneratorError<P::Error>> {
        let mut buf = [0u8; 1];
        match transport.read(&mut buf) {
            Ok(0) => Ok(Poll::Closed),
            Ok(_) => {
                self.handle_byte(buf[0], transport)?;
                Ok(Poll::Handled(buf[0]))
            }
            Err(e) if matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
            ) => Ok(Poll::Idle),
            Err(e) => Err(GeneratorError::Transport(e)),
        }
    }

    /// Poll until the transport closes. Returns the number of bytes handled.
    pub fn run<T: Read + Write>(
        &mut self,
        transport: &mut T,
    ) -> Result<u64, GeneratorError<P::Error>> {
        let start = self.bytes_handled;
        loop {
            if self.poll(transport)? == Poll::Closed {
                tracing::info!(bytes = self.bytes_handled - start, "transport closed");
                return Ok(self.bytes_handled - start);
            }
        }
    }

    /// Words shifted out so far.
    pub fn words_sent(&self) -> u64 {
        self.link.words_sent()
    }

    pub fn pins(&self) -> &P {
        self.link.pins()
    }

}

impl Generator<SimulatedChip> {
    /// A powered-up generator driving a simulated chip clocked per `config`.
    pub fn simulated(config: &GeneratorConfig) -> Self {
        let mut generator = Self::new(config, SimulatedChip::with_clock(config.reference_clock_hz));
        match generator.power_up() {
            Ok(()) => generator,
            Err(never) => match never {},
        }
    }
}

impl<P: Pins + fmt::Debug> fmt::Debug for Generator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("state", &self.interpreter.state)
            .field("bytes_handled", &self.bytes_handled)
            .field("words_sent", &self.link.words_sent())
            .field("pins", self.link.pins())
            .finish()
    }
}

/// A reader and a writer used together as one transport,
/// e.g. stdin and stdout.
#[derive(Debug)]
pub struct Duplex<R, W> {
    pub reader: R,
    pub writer: W,
}

impl<R: Read, W: Write> Duplex<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: Read, W> Read for Duplex<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<R, W: Write> Write for Duplex<R, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Errors that can stop the generator loop.
#[derive(Debug, Error)]
pub enum GeneratorError<E: fmt::Debug> {
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("pin error: {0:?}")]
    Pin(E),
}
