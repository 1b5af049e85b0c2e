//! Command dispatcher.
//!
//! Input is consumed one byte at a time. Bytes fall into three classes:
//! - digits and `.` feed the accumulator
//! - `k` / `M` set the unit multiplier
//! - command letters finalize the number and act on it
//!
//! Everything else is ignored without touching any state. Command letters
//! are case-insensitive.

use crate::chip::register::{ChipWord, Conversion, Encoder, FrequencyLoad, Waveform};
use crate::command::accumulator::{Accumulator, UnitSuffix};
use crate::config::GeneratorConfig;
use serde::{Serialize, Deserialize};

/// Printed in response to `?`.
pub const HELP_TEXT: &str = "TinyAD9833 Frequency Generator\r\n\
usage: <number>[STONED]\r\n\
<number>: 1..8 digits, opt. dot, k, M\r\n\
S:Sin, T:Tri, O:Off\r\n\
N: to reg, n*0.093 Hz Sin\r\n\
E: echo\r\n\
Z: debug\r\n";

/// Commands reachable from the serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// `?`: print usage.
    Help,
    /// `E`: echo on when the last digit is non-zero.
    Echo,
    /// `N`: load the number as a raw frequency word, sine output.
    Raw,
    /// `O`: reset the chip, output parked at midscale.
    Off,
    /// `S`: sine at the given frequency.
    Sine,
    /// `T`: triangle at the given frequency.
    Triangle,
    /// `Z`: debug trace on when the last digit is non-zero.
    Debug,
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte.to_ascii_uppercase() {
            b'?' => Some(Command::Help),
            b'E' => Some(Command::Echo),
            b'N' => Some(Command::Raw),
            b'O' => Some(Command::Off),
            b'S' => Some(Command::Sine),
            b'T' => Some(Command::Triangle),
            b'Z' => Some(Command::Debug),
            _ => None,
        }
    }

    /// The letter that selects this command.
    pub fn letter(self) -> char {
        match self {
            Command::Help => '?',
            Command::Echo => 'E',
            Command::Raw => 'N',
            Command::Off => 'O',
            Command::Sine => 'S',
            Command::Triangle => 'T',
            Command::Debug => 'Z',
        }
    }
}

/// What a single input byte means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Digit(u8),
    DecimalPoint,
    Suffix(UnitSuffix),
    Command(Command),
    Ignored,
}

impl Input {
    pub fn classify(byte: u8) -> Self {
        match byte {
            b'0'..=b'9' => Input::Digit(byte - b'0'),
            b'.' => Input::DecimalPoint,
            _ => match byte.to_ascii_uppercase() {
                b'K' => Input::Suffix(UnitSuffix::Kilo),
                b'M' => Input::Suffix(UnitSuffix::Mega),
                upper => Command::from_byte(upper).map_or(Input::Ignored, Input::Command),
            },
        }
    }
}

/// Process-wide generator settings, written only by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorState {
    pub waveform: Waveform,
    pub echo: bool,
    pub debug: bool,
}

impl Default for GeneratorState {
    fn default() -> Self {
        Self {
            waveform: Waveform::Midscale,
            echo: true,
            debug: false,
        }
    }
}

/// Everything the outside world has to do after one byte.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reaction {
    /// Byte to echo back to the terminal.
    pub echo: Option<u8>,
    /// Print [`HELP_TEXT`].
    pub help: bool,
    /// Words to send to the chip, in order.
    pub writes: Vec<ChipWord>,
    /// The command that ran, if any.
    pub command: Option<Command>,
    /// The finalized number the command saw.
    pub value: Option<f64>,
}

/// Command line interpreter: accumulator plus generator state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpreter {
    pub state: GeneratorState,
    accumulator: Accumulator,
    encoder: Encoder,
}

impl Interpreter {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            state: GeneratorState {
                echo: config.echo,
                debug: config.debug,
                ..GeneratorState::default()
            },
            accumulator: Accumulator::new(),
            encoder: config.encoder(),
        }
    }

    /// Process one input byte.
    pub fn handle_byte(&mut self, byte: u8) -> Reaction {
        let mut reaction = Reaction::default();

        if self.state.echo && byte >= 0x20 {
            reaction.echo = Some(byte);
        }

        match Input::classify(byte) {
            Input::Digit(d) => self.accumulator.on_digit(d),
            Input::DecimalPoint => self.accumulator.on_decimal_point(),
            Input::Suffix(suffix) => self.accumulator.on_unit_suffix(suffix),
            Input::Command(command) => {
                let value = self.accumulator.finalize();
                tracing::debug!(command = ?command, value, "dispatch");
                self.dispatch(command, value, &mut reaction);
                reaction.command = Some(command);
                reaction.value = Some(value);
            }
            Input::Ignored => {}
        }

        reaction
    }

    /// Convenience for feeding a whole string.
    pub fn handle_str(&mut self, input: &str) -> Vec<Reaction> {
        input.bytes().map(|b| self.handle_byte(b)).collect()
    }

    fn dispatch(&mut self, command: Command, value: f64, reaction: &mut Reaction) {
        match command {
            Command::Help => reaction.help = true,
            Command::Echo => self.state.echo = self.accumulator.buffer().lowest() != 0,
            Command::Debug => self.state.debug = self.accumulator.buffer().lowest() != 0,
            Command::Off => reaction.writes.push(self.encoder.reset()),
            Command::Raw => {
                let load = self.load_frequency(value, Waveform::Sine, Conversion::Raw);
                reaction.writes.extend(load.words);
            }
            Command::Sine => {
                let load = self.load_frequency(value, Waveform::Sine, Conversion::Hertz);
                reaction.writes.extend(load.words);
            }
            Command::Triangle => {
                let load = self.load_frequency(value, Waveform::Triangle, Conversion::Hertz);
                reaction.writes.extend(load.words);
            }
        }
    }

    /// Encode a frequency load for `waveform` and record the waveform the
    /// chip will actually produce. A rectangle below the threshold is
    /// stored as [`Waveform::RectangleHalf`].
    pub fn load_frequency(
        &mut self,
        value: f64,
        waveform: Waveform,
        conversion: Conversion,
    ) -> FrequencyLoad {
        let load = self.encoder.load(value, waveform, conversion);
        self.state.waveform = load.waveform;
        tracing::debug!(
            value,
            register = load.register_value,
            waveform = %load.waveform,
            "frequency load"
        );
        load
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(&GeneratorConfig::default())
    }
}
