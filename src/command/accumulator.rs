//! Numeric entry for the command line.
//!
//! Digits are collected one at a time into an eight slot shift register.
//! A decimal point marks where the fraction starts and a `k`/`M` suffix
//! scales the result. The number is only read out when a command letter
//! arrives.

use serde::{Serialize, Deserialize};

/// Number of digit slots; older digits fall off the top.
pub const DIGIT_SLOTS: usize = 8;

/// Fixed shift register of decimal digits, slot 0 least significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DigitBuffer {
    digits: [u8; DIGIT_SLOTS],
}

impl DigitBuffer {
    pub const fn new() -> Self {
        Self { digits: [0; DIGIT_SLOTS] }
    }

    pub fn clear(&mut self) {
        self.digits = [0; DIGIT_SLOTS];
    }

    /// Shift everything one slot up and put `digit` in slot 0.
    /// The most significant digit is lost.
    pub fn push(&mut self, digit: u8) {
        debug_assert!(digit <= 9, "not a decimal digit: {}", digit);
        for i in (1..DIGIT_SLOTS).rev() {
            self.digits[i] = self.digits[i - 1];
        }
        self.digits[0] = digit;
    }

    /// Digit in slot `i` (0 = least significant).
    #[inline]
    pub fn slot(&self, i: usize) -> u8 {
        self.digits[i]
    }

    /// Slot 0, the last digit typed.
    #[inline]
    pub fn lowest(&self) -> u8 {
        self.digits[0]
    }

    /// The integer formed by all eight slots.
    pub fn value(&self) -> u32 {
        self.digits
            .iter()
            .rev()
            .fold(0u32, |acc, &d| acc * 10 + d as u32)
    }

    pub fn digits(&self) -> &[u8; DIGIT_SLOTS] {
        &self.digits
    }
}

/// Unit suffix letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitSuffix {
    /// `k`: ×1000
    Kilo,
    /// `M`: ×1 000 000
    Mega,
}

impl UnitSuffix {
    pub const fn multiplier(self) -> u32 {
        match self {
            UnitSuffix::Kilo => 1_000,
            UnitSuffix::Mega => 1_000_000,
        }
    }
}

/// Where the accumulator is in the entry of a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryPhase {
    /// Nothing typed since the last command.
    Idle,
    /// Collecting the integer part.
    Integer,
    /// A decimal point has been seen.
    Fraction,
}

/// The numeric accumulator state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accumulator {
    buffer: DigitBuffer,
    /// Digits typed since the last finalize (saturating).
    digits_entered: u8,
    /// 0 = no decimal point, otherwise digits at the point + 1.
    decimal_marker: u8,
    multiplier: u32,
    divider: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            buffer: DigitBuffer::new(),
            digits_entered: 0,
            decimal_marker: 0,
            multiplier: 1,
            divider: 1.0,
        }
    }

    /// A decimal digit arrived.
    ///
    /// The first digit of an entry clears the buffer. Every digit cancels a
    /// pending unit suffix, so `5k0` means 50.
    pub fn on_digit(&mut self, digit: u8) {
        if self.digits_entered == 0 {
            self.buffer.clear();
        }
        self.buffer.push(digit);
        self.digits_entered = self.digits_entered.saturating_add(1);
        self.multiplier = 1;
        self.divider = 1.0;
    }

    /// A decimal point arrived. A later point replaces an earlier one.
    pub fn on_decimal_point(&mut self) {
        self.decimal_marker = self.digits_entered.saturating_add(1);
    }

    /// A `k` or `M` arrived.
    pub fn on_unit_suffix(&mut self, suffix: UnitSuffix) {
        self.multiplier = suffix.multiplier();
    }

    /// Read the number out and end the entry.
    ///
    /// Scale factors are kept, so finalizing again without new digits gives
    /// the same value as before.
    pub fn finalize(&mut self) -> f64 {
        if self.decimal_marker != 0 && self.digits_entered != 0 {
            let exponent =
                (self.digits_entered as i32 - self.decimal_marker as i32 + 1).max(0);
            self.divider = 10f64.powi(exponent);
        }

        let value = self.buffer.value() as f64 * self.multiplier as f64 / self.divider;

        self.digits_entered = 0;
        self.decimal_marker = 0;
        value
    }

    pub fn buffer(&self) -> &DigitBuffer {
        &self.buffer
    }

    pub fn digits_entered(&self) -> u8 {
        self.digits_entered
    }

    pub fn decimal_marker(&self) -> u8 {
        self.decimal_marker
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    pub fn divider(&self) -> f64 {
        self.divider
    }

    pub fn phase(&self) -> EntryPhase {
        if self.decimal_marker != 0 {
            EntryPhase::Fraction
        } else if self.digits_entered != 0 {
            EntryPhase::Integer
        } else {
            EntryPhase::Idle
        }
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enter(acc: &mut Accumulator, text: &str) {
        for c in text.chars() {
            match c {
                '0'..='9' => acc.on_digit(c as u8 - b'0'),
                '.' => acc.on_decimal_point(),
                'k' => acc.on_unit_suffix(UnitSuffix::Kilo),
                'M' => acc.on_unit_suffix(UnitSuffix::Mega),
                _ => panic!("unexpected {}", c),
            }
        }
    }

    #[test]
    fn test_buffer_shift() {
        let mut buf = DigitBuffer::new();
        buf.push(1);
        buf.push(2);
        buf.push(3);
        assert_eq!(buf.value(), 123);
        assert_eq!(buf.lowest(), 3);
        assert_eq!(buf.slot(2), 1);
    }

    #[test]
    fn test_buffer_overflow_drops_oldest() {
        let mut buf = DigitBuffer::new();
        for d in [1, 2, 3, 4, 5, 6, 7, 8, 9] {
            buf.push(d);
        }
        assert_eq!(buf.value(), 23_456_789);
    }

    #[test]
    fn test_integer() {
        let mut acc = Accumulator::new();
        enter(&mut acc, "1000");
        assert_eq!(acc.finalize(), 1000.0);
        assert_eq!(acc.phase(), EntryPhase::Idle);
    }

    #[test]
    fn test_decimal() {
        let mut acc = Accumulator::new();
        enter(&mut acc, "1.5");
        assert_eq!(acc.decimal_marker(), 2);
        assert_eq!(acc.digits_entered(), 2);
        assert_eq!(acc.finalize(), 1.5);
        assert_eq!(acc.divider(), 10.0);
    }

    #[test]
    fn test_leading_decimal_point() {
        let mut acc = Accumulator::new();
        enter(&mut acc, ".25");
        assert_eq!(acc.finalize(), 0.25);
    }

    #[test]
    fn test_trailing_decimal_point() {
        let mut acc = Accumulator::new();
        enter(&mut acc, "15.");
        assert_eq!(acc.finalize(), 15.0);
    }

    #[test]
    fn test_suffix() {
        let mut acc = Accumulator::new();
        enter(&mut acc, "2.5k");
        assert_eq!(acc.finalize(), 2500.0);

        enter(&mut acc, "3M");
        assert_eq!(acc.finalize(), 3_000_000.0);
    }

    #[test]
    fn test_digit_cancels_suffix() {
        let mut acc = Accumulator::new();
        enter(&mut acc, "5k0");
        assert_eq!(acc.finalize(), 50.0);
    }

    #[test]
    fn test_finalize_again_reuses_scale() {
        let mut acc = Accumulator::new();
        enter(&mut acc, "1.5k");
        assert_eq!(acc.finalize(), 1500.0);
        assert_eq!(acc.finalize(), 1500.0);
    }

    #[test]
    fn test_new_entry_clears_buffer() {
        let mut acc = Accumulator::new();
        enter(&mut acc, "987");
        acc.finalize();
        enter(&mut acc, "4");
        assert_eq!(acc.finalize(), 4.0);
    }

    #[test]
    fn test_second_decimal_point_wins() {
        let mut acc = Accumulator::new();
        enter(&mut acc, "1.2.34");
        // digits 1234, point after the second digit
        assert_eq!(acc.finalize(), 12.34);
    }

    #[test]
    fn test_phases() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.phase(), EntryPhase::Idle);
        acc.on_digit(4);
        assert_eq!(acc.phase(), EntryPhase::Integer);
        acc.on_decimal_point();
        assert_eq!(acc.phase(), EntryPhase::Fraction);
    }
}
