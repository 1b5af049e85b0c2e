//! Software model of the AD9833 serial interface and register file.
//!
//! The model sits on the far end of the link: it implements [`Pins`], clocks
//! DATA in on each falling SCLK edge while FSYNC is low and latches the word
//! into the register file after the 16th edge. Anything clocked beyond that
//! is ignored until FSYNC rises again; frames shorter than 16 edges are
//! dropped.

use crate::chip::link::Pins;
use crate::chip::register::{
    control, ChipWord, Register, Waveform, PHASE_ACCUMULATOR_STEPS, REFERENCE_CLOCK_HZ,
};
use serde::{Serialize, Deserialize};
use std::collections::VecDeque;
use std::convert::Infallible;

/// How many received words are kept for inspection.
pub const WORD_LOG_DEPTH: usize = 64;

/// Snapshot of what the chip is currently producing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChipOutput {
    pub waveform: Waveform,
    /// Active frequency register (0 or 1).
    pub frequency_register: usize,
    /// Raw contents of the active frequency register.
    pub frequency_word: u32,
    /// Output frequency in Hz (0 while reset or asleep).
    pub frequency_hz: f64,
    /// Active phase offset, 12 bits.
    pub phase: u16,
    pub sleeping: bool,
}

/// Register-level AD9833 model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedChip {
    // line levels
    data: bool,
    clock: bool,
    fsync: bool,
    // serial shift register
    shift: u16,
    edges: u8,

    /// Control register (D13..D0).
    pub control: u16,
    /// FREQ0 and FREQ1, 28 bits each.
    pub frequency: [u32; 2],
    /// PHASE0 and PHASE1, 12 bits each.
    pub phase: [u16; 2],
    /// Pending low half of a B28 load, per frequency register.
    pending_lsb: [Option<u16>; 2],

    /// Most recent words, oldest first.
    received: VecDeque<ChipWord>,
    /// Total number of latched words.
    pub words_latched: u64,
    /// Frames discarded because FSYNC rose early.
    pub frames_dropped: u64,

    reference_clock_hz: f64,
}

impl SimulatedChip {
    /// Power-on state: reset asserted, all registers cleared, bus idle.
    pub fn new() -> Self {
        Self::with_clock(REFERENCE_CLOCK_HZ)
    }

    /// Same as [`new`](Self::new) with a different master clock.
    pub fn with_clock(reference_clock_hz: f64) -> Self {
        Self {
            data: false,
            clock: true,
            fsync: true,
            shift: 0,
            edges: 0,
            control: control::RESET,
            frequency: [0; 2],
            phase: [0; 2],
            pending_lsb: [None; 2],
            received: VecDeque::with_capacity(WORD_LOG_DEPTH),
            words_latched: 0,
            frames_dropped: 0,
            reference_clock_hz,
        }
    }

    /// Feed a complete word, bypassing the serial interface.
    pub fn latch(&mut self, word: ChipWord) {
        tracing::trace!(word = %word, register = ?word.register(), "chip latched word");

        match word.register() {
            Register::Control => {
                self.control = word.payload();
            }
            Register::Phase(sel) => {
                self.phase[sel as usize & 1] = word.payload();
            }
            register => {
                if let Some(idx) = register.frequency_index() {
                    self.write_frequency(idx, word.payload());
                }
            }
        }

        if self.received.len() == WORD_LOG_DEPTH {
            self.received.pop_front();
        }
        self.received.push_back(word);
        self.words_latched += 1;
    }

    fn write_frequency(&mut self, idx: usize, payload: u16) {
        let payload = payload as u32;

        if self.control & control::B28 != 0 {
            match self.pending_lsb[idx].take() {
                Some(lsb) => self.frequency[idx] = (payload << 14) | lsb as u32,
                None => self.pending_lsb[idx] = Some(payload as u16),
            }
        } else if self.control & control::HLB != 0 {
            self.frequency[idx] = (self.frequency[idx] & 0x3FFF) | (payload << 14);
        } else {
            self.frequency[idx] = (self.frequency[idx] & !0x3FFF) | payload;
        }
    }

    /// The words latched so far (bounded by [`WORD_LOG_DEPTH`]).
    pub fn received(&self) -> &VecDeque<ChipWord> {
        &self.received
    }

    /// Is the phase accumulator held in reset?
    pub fn is_reset(&self) -> bool {
        self.control & control::RESET != 0
    }

    /// Is a B28 load half done?
    pub fn load_pending(&self) -> bool {
        self.pending_lsb.iter().any(Option::is_some)
    }

    /// Current output as configured by the register file.
    pub fn output(&self) -> ChipOutput {
        let waveform = Waveform::from_control(self.control);
        let frequency_register = usize::from(self.control & control::FSELECT != 0);
        let phase_register = usize::from(self.control & control::PSELECT != 0);
        let frequency_word = self.frequency[frequency_register];
        let sleeping = self.control & control::SLEEP1 != 0;

        let mut frequency_hz = if waveform == Waveform::Midscale || sleeping {
            0.0
        } else {
            frequency_word as f64 * self.reference_clock_hz / PHASE_ACCUMULATOR_STEPS
        };
        if waveform == Waveform::RectangleHalf {
            frequency_hz /= 2.0;
        }

        ChipOutput {
            waveform,
            frequency_register,
            frequency_word,
            frequency_hz,
            phase: self.phase[phase_register],
            sleeping,
        }
    }
}

impl Default for SimulatedChip {
    fn default() -> Self {
        Self::new()
    }
}

impl Pins for SimulatedChip {
    type Error = Infallible;

    fn set_data(&mut self, high: bool) -> Result<(), Infallible> {
        self.data = high;
        Ok(())
    }

    fn set_clock(&mut self, high: bool) -> Result<(), Infallible> {
        let falling = self.clock && !high;
        self.clock = high;

        if falling && !self.fsync && self.edges < 16 {
            self.shift = (self.shift << 1) | self.data as u16;
            self.edges += 1;
            if self.edges == 16 {
                self.latch(ChipWord(self.shift));
            }
        }
        Ok(())
    }

    fn set_frame_sync(&mut self, high: bool) -> Result<(), Infallible> {
        if high && !self.fsync && self.edges > 0 && self.edges < 16 {
            tracing::debug!(edges = self.edges, "chip dropped short frame");
            self.frames_dropped += 1;
        }
        if !high {
            self.shift = 0;
            self.edges = 0;
        }
        self.fsync = high;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::link::BitLink;
    use crate::chip::register::{reset_word, Conversion, Encoder};

    #[test]
    fn test_power_on_state() {
        let chip = SimulatedChip::new();
        assert!(chip.is_reset());
        assert_eq!(chip.output().waveform, Waveform::Midscale);
        assert_eq!(chip.output().frequency_hz, 0.0);
    }

    #[test]
    fn test_power_on_control_lacks_b28() {
        // LSB then MSB without B28: both land in the low half
        let mut chip = SimulatedChip::new();
        chip.latch(ChipWord(0x4000 | 10737));
        chip.latch(ChipWord(0x4000));
        assert_eq!(chip.frequency[0], 0);

        chip.latch(reset_word());
        chip.latch(ChipWord(0x4000 | 10737));
        chip.latch(ChipWord(0x4000));
        assert_eq!(chip.frequency[0], 10737);
    }

    #[test]
    fn test_b28_load_over_link() {
        let mut link = BitLink::new(SimulatedChip::new());
        link.transmit(reset_word()).unwrap();
        let load = Encoder::default().load(1000.0, Waveform::Sine, Conversion::Hertz);
        for word in load.words {
            link.transmit(word).unwrap();
        }

        let chip = link.pins();
        assert_eq!(chip.frequency[0], 10737);
        assert!(!chip.load_pending());
        let out = chip.output();
        assert_eq!(out.waveform, Waveform::Sine);
        assert!((out.frequency_hz - 1000.0).abs() < 0.1);
        assert!(chip.received().iter().skip(1).eq(load.words.iter()));
    }

    #[test]
    fn test_reset_parks_output() {
        let mut chip = SimulatedChip::new();
        chip.latch(ChipWord(0x2000));
        chip.latch(ChipWord(0x4001));
        chip.latch(ChipWord(0x4000));
        chip.latch(ChipWord(0x2002));
        assert_eq!(chip.output().waveform, Waveform::Triangle);

        chip.latch(ChipWord(0x2100));
        assert!(chip.is_reset());
        assert_eq!(chip.output().frequency_hz, 0.0);
        // frequency register survives reset
        assert_eq!(chip.frequency[0], 1);
    }

    #[test]
    fn test_hlb_single_half_writes() {
        let mut chip = SimulatedChip::new();
        chip.latch(ChipWord(0x0000)); // B28 off, HLB off
        chip.latch(ChipWord(0x8123)); // FREQ1 low half
        chip.latch(ChipWord(0x1000)); // HLB on
        chip.latch(ChipWord(0x8002)); // FREQ1 high half
        assert_eq!(chip.frequency[1], (2 << 14) | 0x123);
    }

    #[test]
    fn test_phase_and_select() {
        let mut chip = SimulatedChip::new();
        chip.latch(ChipWord(0xE123));
        chip.latch(ChipWord(0x2000 | control::PSELECT | control::FSELECT));
        let out = chip.output();
        assert_eq!(out.phase, 0x123);
        assert_eq!(out.frequency_register, 1);
    }

    #[test]
    fn test_half_rate_rectangle_frequency() {
        let mut link = BitLink::new(SimulatedChip::new());
        link.transmit(reset_word()).unwrap();
        let load = Encoder::default().load(5_000_000.0, Waveform::Rectangle, Conversion::Hertz);
        for word in load.words {
            link.transmit(word).unwrap();
        }

        let out = link.pins().output();
        assert_eq!(out.waveform, Waveform::RectangleHalf);
        assert!((out.frequency_hz - 5_000_000.0).abs() < 1.0);
    }

    #[test]
    fn test_short_frame_dropped() {
        let mut chip = SimulatedChip::new();
        chip.set_frame_sync(false).unwrap();
        for _ in 0..5 {
            chip.set_data(true).unwrap();
            chip.set_clock(false).unwrap();
            chip.set_clock(true).unwrap();
        }
        chip.set_frame_sync(true).unwrap();

        assert_eq!(chip.frames_dropped, 1);
        assert_eq!(chip.words_latched, 0);
    }

    #[test]
    fn test_word_log_is_bounded() {
        let mut chip = SimulatedChip::new();
        for i in 0..(WORD_LOG_DEPTH as u16 + 10) {
            chip.latch(ChipWord(0xC000 | i));
        }
        assert_eq!(chip.received().len(), WORD_LOG_DEPTH);
        assert_eq!(chip.received()[0], ChipWord(0xC000 | 10));
    }
}
