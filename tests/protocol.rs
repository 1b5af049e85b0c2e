//! End-to-end checks of the serial protocol against the simulated chip.

use proptest::prelude::*;
use std::io::Cursor;
use tinyad9833::chip::register::{join_frequency_words, reset_word, Conversion, MAX_FREQUENCY_WORD};
use tinyad9833::command::Input;
use tinyad9833::{Duplex, Encoder, Generator, GeneratorConfig, Interpreter, SimulatedChip, Waveform};

fn last_value(interp: &mut Interpreter, input: &str) -> Option<f64> {
    interp.handle_str(input).iter().rev().find_map(|r| r.value)
}

fn session(input: &[u8]) -> (Generator<SimulatedChip>, Vec<u8>) {
    let mut generator = Generator::simulated(&GeneratorConfig::default());
    let mut transport = Duplex::new(Cursor::new(input.to_vec()), Vec::new());
    generator.run(&mut transport).unwrap();
    (generator, transport.writer)
}

#[test]
fn test_off_is_a_single_reset_write() {
    let (generator, _) = session(b"1kS O");
    let chip = generator.pins();

    // power-up reset, one frequency load, then the off word
    assert_eq!(generator.words_sent(), 5);
    assert_eq!(chip.received().iter().last().map(|w| w.0), Some(0x2100));
    assert!(chip.is_reset());
    assert_eq!(chip.output().frequency_hz, 0.0);
}

#[test]
fn test_rectangle_below_threshold_reaches_chip_at_half_rate() {
    let mut interp = Interpreter::default();
    let load = interp.load_frequency(5_000_000.0, Waveform::Rectangle, Conversion::Hertz);
    let mut chip = SimulatedChip::new();
    chip.latch(reset_word());
    for word in load.words {
        chip.latch(word);
    }

    assert_eq!(interp.state.waveform, Waveform::RectangleHalf);
    assert_eq!(load.words[2].0, 0x2020);
    let out = chip.output();
    assert_eq!(out.waveform, Waveform::RectangleHalf);
    assert!((out.frequency_hz - 5_000_000.0).abs() < 1.0);
}

#[test]
fn test_debug_trace_precedes_each_word() {
    let (_, output) = session(b"1Z2S");
    let text = String::from_utf8(output).unwrap();

    // 2 Hz is frequency word 21
    assert_eq!(text, "1Z2S0x4015\r\n0x4000\r\n0x2000\r\n");
}

#[test]
fn test_echo_off_then_on() {
    let (_, output) = session(b"0Eabc1Exyz");
    // echo is decided before the E itself is processed
    assert_eq!(output, b"0Exyz");
}

#[test]
fn test_first_command_after_power_up() {
    let (generator, _) = session(b"1000S");
    let chip = generator.pins();

    assert_eq!(chip.received()[0].0, 0x2100);
    assert_eq!(chip.frequency[0], 10737);
    assert!((chip.output().frequency_hz - 1000.0).abs() < 0.1);
}

#[test]
fn test_bare_suffix_scales_previous_number() {
    let mut interp = Interpreter::default();
    interp.handle_str("5S");

    for suffix in [b'K', b'M'] {
        let reaction = interp.handle_byte(suffix);
        assert!(reaction.writes.is_empty());
        assert!(reaction.command.is_none());
        assert!(reaction.value.is_none());
    }
    // the later suffix wins
    assert_eq!(last_value(&mut interp, "S"), Some(5_000_000.0));
}

#[test]
fn test_raw_word_load() {
    let (generator, _) = session(b"123456N");
    let chip = generator.pins();

    assert_eq!(chip.frequency[0], 123_456);
    assert_eq!(chip.output().waveform, Waveform::Sine);
}

proptest! {
    #[test]
    fn prop_integer_entry_reads_back(n in 0u32..100_000_000) {
        let mut interp = Interpreter::default();
        let value = last_value(&mut interp, &format!("{}S", n));
        prop_assert_eq!(value, Some(n as f64));
    }

    #[test]
    fn prop_only_last_eight_digits_count(digits in "[0-9]{9,16}") {
        let mut interp = Interpreter::default();
        let value = last_value(&mut interp, &format!("{}S", digits));
        let tail: u32 = digits[digits.len() - 8..].parse().unwrap();
        prop_assert_eq!(value, Some(tail as f64));
    }

    #[test]
    fn prop_suffix_scales(n in 0u32..10_000, mega in any::<bool>()) {
        let mut interp = Interpreter::default();
        let (suffix, scale) = if mega { ('M', 1e6) } else { ('k', 1e3) };
        let value = last_value(&mut interp, &format!("{}{}T", n, suffix));
        prop_assert_eq!(value, Some(n as f64 * scale));
    }

    #[test]
    fn prop_fraction_divides(int in 0u32..1000, frac in "[0-9]{1,4}") {
        let mut interp = Interpreter::default();
        let value = last_value(&mut interp, &format!("{}.{}S", int, frac)).unwrap();
        let expected: f64 = format!("{}.{}", int, frac).parse().unwrap();
        prop_assert!((value - expected).abs() < 1e-9 * expected.max(1.0));
    }

    #[test]
    fn prop_load_halves_recombine(hz in 0.0f64..20_000_000.0) {
        let load = Encoder::default().load(hz, Waveform::Sine, Conversion::Hertz);
        prop_assert!(load.register_value <= MAX_FREQUENCY_WORD);
        prop_assert_eq!(join_frequency_words(load.words[0], load.words[1]), load.register_value);
        prop_assert_eq!(load.words[0].0 >> 14, 1);
        prop_assert_eq!(load.words[1].0 >> 14, 1);
    }

    #[test]
    fn prop_chip_matches_requested_frequency(hz in 1.0f64..5_000_000.0) {
        let (generator, _) = session(format!("{}S", hz as u32).as_bytes());
        let out = generator.pins().output();
        // one frequency step is about 0.093 Hz
        prop_assert!((out.frequency_hz - (hz as u32) as f64).abs() < 0.1);
    }

    #[test]
    fn prop_unknown_bytes_change_nothing(prefix in "[0-9]{0,5}", junk in prop::collection::vec(any::<u8>(), 1..16)) {
        let junk: Vec<u8> = junk
            .into_iter()
            .filter(|&b| Input::classify(b) == Input::Ignored)
            .collect();

        let mut interp = Interpreter::default();
        interp.handle_str(&prefix);
        let before = interp.clone();
        for b in junk {
            let reaction = interp.handle_byte(b);
            prop_assert!(reaction.writes.is_empty());
            prop_assert!(reaction.command.is_none());
        }
        prop_assert_eq!(interp, before);
    }
}
