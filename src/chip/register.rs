//! AD9833 register words and the frequency encoder.
//!
//! Every write to the chip is a single 16-bit word. The two most significant
//! bits select the target register:
//!
//! | D15 D14 | Register            |
//! |---------|---------------------|
//! | 0 0     | Control             |
//! | 0 1     | FREQ0               |
//! | 1 0     | FREQ1               |
//! | 1 1     | PHASE0 / PHASE1     |
//!
//! Frequencies are loaded in B28 mode: two consecutive 14-bit writes to the
//! same frequency register, low half first.

use serde::{Serialize, Deserialize};
use std::fmt;

/// Master clock of the reference board.
pub const REFERENCE_CLOCK_HZ: f64 = 25_000_000.0;

/// The phase accumulator is 28 bits wide.
pub const PHASE_ACCUMULATOR_STEPS: f64 = (1u32 << 28) as f64;

/// Largest frequency word we ever load. Values above clamp here.
pub const MAX_FREQUENCY_WORD: u32 = 0x7FF_FFFF;

/// Below this output frequency a rectangle is generated at half rate.
pub const RECTANGLE_HALF_RATE_THRESHOLD_HZ: f64 = 12_000_000.0;

/// Control register bits.
pub mod control {
    /// Load frequency registers as two consecutive 14-bit writes.
    pub const B28: u16 = 0x2000;
    /// With B28 clear: the write targets the upper 14 bits.
    pub const HLB: u16 = 0x1000;
    pub const FSELECT: u16 = 0x0800;
    pub const PSELECT: u16 = 0x0400;
    /// Hold the phase accumulator at midscale.
    pub const RESET: u16 = 0x0100;
    /// Disable the internal MCLK.
    pub const SLEEP1: u16 = 0x0080;
    /// Power down the DAC.
    pub const SLEEP12: u16 = 0x0040;
    /// Route the comparator / MSB to VOUT.
    pub const OPBITEN: u16 = 0x0020;
    /// With OPBITEN: output the MSB directly instead of MSB/2.
    pub const DIV2: u16 = 0x0008;
    /// Triangle instead of sine.
    pub const MODE: u16 = 0x0002;
}

const FREQ_PAYLOAD_MASK: u32 = 0x3FFF;
const FREQ_MSB_MASK: u32 = 0xFFF_C000;
const PHASE_PAYLOAD_MASK: u16 = 0x0FFF;

/// Output waveform selected through the control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Waveform {
    /// Reset asserted, output parked at midscale.
    Midscale,
    Sine,
    Triangle,
    /// Square wave from the accumulator MSB.
    Rectangle,
    /// Square wave from MSB/2; needs a doubled frequency word.
    RectangleHalf,
}

impl Waveform {
    /// The waveform bits ORed into the control word.
    pub const fn control_bits(self) -> u16 {
        match self {
            Waveform::Midscale => control::RESET,
            Waveform::Sine => 0,
            Waveform::Triangle => control::MODE,
            Waveform::Rectangle => control::OPBITEN | control::DIV2,
            Waveform::RectangleHalf => control::OPBITEN,
        }
    }

    /// Full control word for this waveform (B28 always set).
    pub const fn control_word(self) -> ChipWord {
        ChipWord(control::B28 | self.control_bits())
    }

    /// Recover the waveform from control register contents.
    pub fn from_control(bits: u16) -> Self {
        if bits & control::RESET != 0 {
            Waveform::Midscale
        } else if bits & control::OPBITEN != 0 {
            if bits & control::DIV2 != 0 {
                Waveform::Rectangle
            } else {
                Waveform::RectangleHalf
            }
        } else if bits & control::MODE != 0 {
            Waveform::Triangle
        } else {
            Waveform::Sine
        }
    }

    /// Short human readable name.
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Midscale => "off (midscale)",
            Waveform::Sine => "sine",
            Waveform::Triangle => "triangle",
            Waveform::Rectangle => "rectangle",
            Waveform::RectangleHalf => "rectangle/2",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Register addressed by the top bits of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Register {
    Control,
    Freq0,
    Freq1,
    /// PHASE0 or PHASE1, chosen by D13.
    Phase(u8),
}

impl Register {
    /// Address bits occupying D15..D14 (and D13 for phase).
    pub const fn address(self) -> u16 {
        match self {
            Register::Control => 0x0000,
            Register::Freq0 => 0x4000,
            Register::Freq1 => 0x8000,
            Register::Phase(0) => 0xC000,
            Register::Phase(_) => 0xE000,
        }
    }

    /// Index of a frequency register, `None` for the others.
    pub const fn frequency_index(self) -> Option<usize> {
        match self {
            Register::Freq0 => Some(0),
            Register::Freq1 => Some(1),
            _ => None,
        }
    }
}

/// One 16-bit word as shifted out to the chip.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChipWord(pub u16);

impl ChipWord {
    /// The register this word is addressed to.
    pub const fn register(self) -> Register {
        match self.0 >> 14 {
            0 => Register::Control,
            1 => Register::Freq0,
            2 => Register::Freq1,
            _ => Register::Phase(((self.0 >> 13) & 1) as u8),
        }
    }

    /// Payload without the address bits.
    pub const fn payload(self) -> u16 {
        match self.register() {
            Register::Control => self.0 & 0x3FFF,
            Register::Freq0 | Register::Freq1 => self.0 & FREQ_PAYLOAD_MASK as u16,
            Register::Phase(_) => self.0 & PHASE_PAYLOAD_MASK,
        }
    }

    /// Compose a word from register address and payload.
    pub const fn new(register: Register, payload: u16) -> Self {
        let mask = match register {
            Register::Control => 0x3FFF,
            Register::Freq0 | Register::Freq1 => FREQ_PAYLOAD_MASK as u16,
            Register::Phase(_) => PHASE_PAYLOAD_MASK,
        };
        ChipWord(register.address() | (payload & mask))
    }

    /// The bit at position `bit` (15 = MSB).
    #[inline]
    pub const fn bit(self, bit: u8) -> bool {
        (self.0 >> bit) & 1 != 0
    }
}

impl fmt::Debug for ChipWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChipWord(0x{:04X} {:?})", self.0, self.register())
    }
}

impl fmt::Display for ChipWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// How a finalized number is turned into register content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conversion {
    /// The number is a frequency in Hz.
    Hertz,
    /// The number is already a frequency word.
    Raw,
}

/// Result of encoding one frequency load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyLoad {
    /// Clamped frequency word.
    pub register_value: u32,
    /// Waveform actually programmed (may differ for rectangles).
    pub waveform: Waveform,
    /// LSB word, MSB word, control word. Must be sent in this order.
    pub words: [ChipWord; 3],
}

/// Converts frequencies into the register writes for one load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Encoder {
    pub reference_clock_hz: f64,
    pub rectangle_threshold_hz: f64,
}

impl Encoder {
    pub fn new(reference_clock_hz: f64, rectangle_threshold_hz: f64) -> Self {
        Self { reference_clock_hz, rectangle_threshold_hz }
    }

    /// Unrounded frequency word for `hz`.
    pub fn scale(&self, hz: f64) -> f64 {
        hz * (PHASE_ACCUMULATOR_STEPS / self.reference_clock_hz)
    }

    /// Output frequency produced by a frequency word.
    pub fn frequency_of(&self, register_value: u32) -> f64 {
        register_value as f64 * self.reference_clock_hz / PHASE_ACCUMULATOR_STEPS
    }

    /// Encode a frequency load for `waveform`.
    pub fn load(&self, value: f64, waveform: Waveform, conversion: Conversion) -> FrequencyLoad {
        let mut waveform = waveform;
        let scaled = match conversion {
            Conversion::Hertz => {
                let mut scaled = self.scale(value);
                if waveform == Waveform::Rectangle && value < self.rectangle_threshold_hz {
                    waveform = Waveform::RectangleHalf;
                    scaled *= 2.0;
                }
                scaled
            }
            Conversion::Raw => value,
        };

        let register_value = clamp_frequency_word(scaled);
        let [lsb, msb] = split_frequency_word(register_value);

        FrequencyLoad {
            register_value,
            waveform,
            words: [lsb, msb, waveform.control_word()],
        }
    }

    /// The lone control word that parks the output at midscale.
    pub const fn reset(&self) -> ChipWord {
        reset_word()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(REFERENCE_CLOCK_HZ, RECTANGLE_HALF_RATE_THRESHOLD_HZ)
    }
}

/// Control word with B28 and RESET set.
pub const fn reset_word() -> ChipWord {
    ChipWord(control::B28 | control::RESET)
}

/// Round to the nearest integer and clamp into `[0, MAX_FREQUENCY_WORD]`.
pub fn clamp_frequency_word(value: f64) -> u32 {
    let rounded = value.round();
    // NaN and negatives land on zero
    if !(rounded > 0.0) {
        0
    } else if rounded >= MAX_FREQUENCY_WORD as f64 {
        MAX_FREQUENCY_WORD
    } else {
        rounded as u32
    }
}

/// Split a frequency word into the FREQ0 LSB and MSB writes.
pub fn split_frequency_word(register_value: u32) -> [ChipWord; 2] {
    let lsb = (register_value & FREQ_PAYLOAD_MASK) as u16;
    let msb = ((register_value & FREQ_MSB_MASK) >> 14) as u16;
    [
        ChipWord::new(Register::Freq0, lsb),
        ChipWord::new(Register::Freq0, msb),
    ]
}

/// Recombine the two 14-bit halves of a frequency load.
pub fn join_frequency_words(lsb: ChipWord, msb: ChipWord) -> u32 {
    ((msb.0 as u32 & FREQ_PAYLOAD_MASK) << 14) | (lsb.0 as u32 & FREQ_PAYLOAD_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_words() {
        assert_eq!(reset_word().0, 0x2100);
        assert_eq!(Waveform::Midscale.control_word().0, 0x2100);
        assert_eq!(Waveform::Sine.control_word().0, 0x2000);
        assert_eq!(Waveform::Triangle.control_word().0, 0x2002);
        assert_eq!(Waveform::Rectangle.control_word().0, 0x2028);
        assert_eq!(Waveform::RectangleHalf.control_word().0, 0x2020);
    }

    #[test]
    fn test_waveform_from_control() {
        for w in [
            Waveform::Midscale,
            Waveform::Sine,
            Waveform::Triangle,
            Waveform::Rectangle,
            Waveform::RectangleHalf,
        ] {
            assert_eq!(Waveform::from_control(w.control_word().0), w);
        }
    }

    #[test]
    fn test_register_addressing() {
        assert_eq!(ChipWord(0x2100).register(), Register::Control);
        assert_eq!(ChipWord(0x4123).register(), Register::Freq0);
        assert_eq!(ChipWord(0x8123).register(), Register::Freq1);
        assert_eq!(ChipWord(0xC123).register(), Register::Phase(0));
        assert_eq!(ChipWord(0xE123).register(), Register::Phase(1));
        assert_eq!(ChipWord(0x4123).payload(), 0x0123);
        assert_eq!(ChipWord::new(Register::Phase(1), 0xFFFF).0, 0xEFFF);
    }

    #[test]
    fn test_1khz_sine() {
        let load = Encoder::default().load(1000.0, Waveform::Sine, Conversion::Hertz);

        // 1000 * 2^28 / 25e6 = 10737.4182...
        assert_eq!(load.register_value, 10737);
        assert_eq!(load.words[0].0, 0x4000 | 10737);
        assert_eq!(load.words[1].0, 0x4000);
        assert_eq!(load.words[2].0, 0x2000);
        assert_eq!(load.waveform, Waveform::Sine);
    }

    #[test]
    fn test_msb_split() {
        let load = Encoder::default().load(1_000_000.0, Waveform::Triangle, Conversion::Hertz);

        // 1e6 * 2^28 / 25e6 = 10737418.24
        assert_eq!(load.register_value, 10_737_418);
        assert_eq!(load.words[0].0, 0x4000 | (10_737_418 & 0x3FFF) as u16);
        assert_eq!(load.words[1].0, 0x4000 | (10_737_418 >> 14) as u16);
        assert_eq!(join_frequency_words(load.words[0], load.words[1]), 10_737_418);
        assert_eq!(load.words[2].0, 0x2002);
    }

    #[test]
    fn test_rectangle_below_threshold_halves_rate() {
        let encoder = Encoder::default();
        let load = encoder.load(5_000_000.0, Waveform::Rectangle, Conversion::Hertz);

        let expected = (encoder.scale(5_000_000.0) * 2.0).round() as u32;
        assert_eq!(load.waveform, Waveform::RectangleHalf);
        assert_eq!(load.register_value, expected);
        assert_eq!(load.words[2].0, 0x2020);
    }

    #[test]
    fn test_rectangle_above_threshold_keeps_rate() {
        let encoder = Encoder::default();
        let load = encoder.load(12_000_000.0, Waveform::Rectangle, Conversion::Hertz);

        // 12e6 * 2^28 / 25e6 = 128849018.88
        assert_eq!(load.waveform, Waveform::Rectangle);
        assert_eq!(load.register_value, 128_849_019);
        assert_eq!(load.words[2].0, 0x2028);
    }

    #[test]
    fn test_raw_load_skips_conversion() {
        let load = Encoder::default().load(12345.0, Waveform::Sine, Conversion::Raw);
        assert_eq!(load.register_value, 12345);

        // no rectangle adjustment on the raw path
        let load = Encoder::default().load(100.0, Waveform::Rectangle, Conversion::Raw);
        assert_eq!(load.register_value, 100);
        assert_eq!(load.waveform, Waveform::Rectangle);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp_frequency_word(-3.0), 0);
        assert_eq!(clamp_frequency_word(f64::NAN), 0);
        assert_eq!(clamp_frequency_word(0.4), 0);
        assert_eq!(clamp_frequency_word(0.5), 1);
        assert_eq!(clamp_frequency_word(0x7FF_FFFE as f64), 0x7FF_FFFE);
        assert_eq!(clamp_frequency_word(0x800_0000 as f64), MAX_FREQUENCY_WORD);
        assert_eq!(clamp_frequency_word(1e15), MAX_FREQUENCY_WORD);
    }

    #[test]
    fn test_clamped_load_does_not_wrap() {
        let load = Encoder::default().load(99_999_999.0, Waveform::Sine, Conversion::Hertz);
        assert_eq!(load.register_value, MAX_FREQUENCY_WORD);
        assert_eq!(load.words[0].0, 0x7FFF);
        assert_eq!(load.words[1].0, 0x4000 | 0x1FFF);
    }
}
