//! WebAssembly bindings for the generator.
//!
//! The browser plays the serial terminal; the chip on the other end of the
//! link is the simulated AD9833.

use wasm_bindgen::prelude::*;
use crate::{Generator, GeneratorConfig, SimulatedChip};
use crate::chip::register::{Conversion, Encoder, Waveform};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly generator wrapper.
#[wasm_bindgen]
pub struct WasmGenerator {
    generator: Generator<SimulatedChip>,
    config: GeneratorConfig,
}

#[wasm_bindgen]
impl WasmGenerator {
    /// Create a generator in its power-up state.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let config = GeneratorConfig::default();
        Self {
            generator: Generator::simulated(&config),
            config,
        }
    }

    /// Feed typed text. Returns what the device sends back (echo, help,
    /// debug trace).
    #[wasm_bindgen]
    pub fn feed(&mut self, text: &str) -> Result<String, JsError> {
        let mut out = Vec::new();
        for byte in text.bytes() {
            self.generator
                .handle_byte(byte, &mut out)
                .map_err(|e| JsError::new(&format!("{}", e)))?;
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Power-cycle the generator and the chip.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.generator = Generator::simulated(&self.config);
    }

    /// Output frequency of the simulated chip in Hz.
    #[wasm_bindgen]
    pub fn frequency(&self) -> f64 {
        self.generator.pins().output().frequency_hz
    }

    /// Output waveform of the simulated chip.
    #[wasm_bindgen]
    pub fn waveform(&self) -> String {
        self.generator.pins().output().waveform.to_string()
    }

    #[wasm_bindgen]
    pub fn echo(&self) -> bool {
        self.generator.interpreter.state.echo
    }

    #[wasm_bindgen]
    pub fn debug(&self) -> bool {
        self.generator.interpreter.state.debug
    }

    /// Most recent words received by the chip, oldest first.
    #[wasm_bindgen]
    pub fn words(&self) -> js_sys::Uint16Array {
        let words: Vec<u16> = self.generator.pins().received().iter().map(|w| w.0).collect();
        js_sys::Uint16Array::from(&words[..])
    }

    /// Generator state and chip output as JSON.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        let snapshot = serde_json::json!({
            "state": self.generator.interpreter.state,
            "accumulator": self.generator.interpreter.accumulator(),
            "chip": self.generator.pins().output(),
            "bytes": self.generator.bytes_handled,
        });
        serde_json::to_string(&snapshot).map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Register words for a sine at `hz`, without touching any generator.
#[wasm_bindgen]
pub fn wasm_encode_sine(hz: f64) -> Vec<u16> {
    Encoder::default()
        .load(hz, Waveform::Sine, Conversion::Hertz)
        .words
        .iter()
        .map(|w| w.0)
        .collect()
}
