//! TinyAD9833 - CLI Entry Point
//!
//! Commands:
//! - `tinyad9833 run` - Serial session on stdin/stdout against a simulated chip
//! - `tinyad9833 serial <port>` - Act as the device on a real serial port
//! - `tinyad9833 encode <freq>` - Print the register words for one frequency
//! - `tinyad9833 panel` - Interactive front panel
//! - `tinyad9833 test` - Built-in self-test

use clap::{Parser, Subcommand, ValueEnum};
use tinyad9833::{GeneratorConfig, Waveform};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tinyad9833")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "Serial command interpreter for an AD9833 DDS waveform generator")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,
    /// Start with echo disabled
    #[arg(long, global = true)]
    no_echo: bool,
    /// Start with the hex debug trace enabled
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a serial session on stdin/stdout until end of input
    Run {
        /// Feed bytes from a file instead of stdin
        #[arg(short, long)]
        script: Option<String>,
    },
    /// Act as the generator on a serial port
    Serial {
        /// Serial port name, e.g. /dev/ttyUSB0 or COM3
        port: String,
        /// Baud rate
        #[arg(short, long, default_value = "9600")]
        baud: u32,
    },
    /// Print the register words for a frequency load
    Encode {
        /// Frequency in Hz (or the raw word with --raw)
        frequency: f64,
        /// Output waveform
        #[arg(short, long, value_enum, default_value = "sine")]
        waveform: WaveformArg,
        /// Treat the value as a raw frequency word
        #[arg(short, long)]
        raw: bool,
        /// Print JSON instead of text
        #[arg(short, long)]
        json: bool,
    },
    /// Interactive front panel
    Panel,
    /// Run the built-in self-test
    Test,
}

#[derive(Clone, Copy, ValueEnum)]
enum WaveformArg {
    Sine,
    Triangle,
    Rectangle,
}

impl From<WaveformArg> for Waveform {
    fn from(arg: WaveformArg) -> Self {
        match arg {
            WaveformArg::Sine => Waveform::Sine,
            WaveformArg::Triangle => Waveform::Triangle,
            WaveformArg::Rectangle => Waveform::Rectangle,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli);

    match cli.command {
        Some(Commands::Run { script }) => {
            run_session(config, script.as_deref());
        }
        Some(Commands::Serial { port, baud }) => {
            serve_port(config, &port, baud);
        }
        Some(Commands::Encode { frequency, waveform, raw, json }) => {
            encode_frequency(config, frequency, waveform.into(), raw, json);
        }
        Some(Commands::Panel) => {
            open_panel(config);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("TinyAD9833 v0.1.0");
            println!("AD9833 DDS generator command interpreter");
            println!();
            println!("Use --help for available commands");
            println!();
            print!("{}", tinyad9833::HELP_TEXT.replace("\r\n", "\n"));
        }
    }
}

fn load_config(cli: &Cli) -> GeneratorConfig {
    let mut config = match &cli.config {
        Some(path) => match GeneratorConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => GeneratorConfig::default(),
    };

    if cli.no_echo {
        config.echo = false;
    }
    if cli.debug {
        config.debug = true;
    }

    tracing::debug!(?config, "configuration");
    config
}

fn run_session(config: GeneratorConfig, script: Option<&str>) {
    use tinyad9833::{Duplex, Generator};
    use std::io::{self, Read};

    let mut generator = Generator::simulated(&config);

    let input: Box<dyn Read> = match script {
        Some(path) => match std::fs::File::open(path) {
            Ok(f) => Box::new(f),
            Err(e) => {
                eprintln!("❌ Failed to open script {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Box::new(io::stdin().lock()),
    };

    tracing::info!(script = script.unwrap_or("<stdin>"), "session started");
    let mut transport = Duplex::new(input, io::stdout().lock());
    let bytes = match generator.run(&mut transport) {
        Ok(n) => n,
        Err(e) => {
            eprintln!();
            eprintln!("❌ Session error: {}", e);
            std::process::exit(1);
        }
    };
    drop(transport);

    let chip = generator.pins();
    let out = chip.output();
    let state = &generator.interpreter.state;

    println!();
    println!("━━━ Result ━━━");
    println!("Bytes handled:  {}", bytes);
    println!("Words sent:     {}", generator.words_sent());
    println!("Waveform:       {}", state.waveform);
    println!("Echo / debug:   {} / {}", state.echo, state.debug);
    println!("Chip output:    {} @ {:.3} Hz", out.waveform, out.frequency_hz);
    println!("Control:        0x{:04X}", chip.control);
    println!("FREQ0:          0x{:07X}", chip.frequency[0]);
}

fn serve_port(config: GeneratorConfig, port_name: &str, baud: u32) {
    use tinyad9833::{Generator, Poll};
    use std::time::Duration;

    let mut port = match serialport::new(port_name, baud)
        .timeout(Duration::from_millis(10))
        .open()
    {
        Ok(port) => port,
        Err(e) => {
            eprintln!("❌ Failed to open port '{}': {}", port_name, e);
            std::process::exit(1);
        }
    };

    let mut generator = Generator::simulated(&config);
    println!("📡 Listening on {} at {} baud. Press Ctrl+C to exit.", port_name, baud);
    tracing::info!(port = port_name, baud, "serial session started");

    let mut last = generator.pins().output();
    loop {
        match generator.poll(&mut port) {
            Ok(Poll::Handled(_)) => {
                let out = generator.pins().output();
                if out != last {
                    println!("⚡ {} @ {:.3} Hz", out.waveform, out.frequency_hz);
                    last = out;
                }
            }
            Ok(Poll::Idle) => {}
            Ok(Poll::Closed) => {
                println!("Port closed.");
                break;
            }
            Err(e) => {
                eprintln!("❌ Serial port error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn encode_frequency(config: GeneratorConfig, value: f64, waveform: Waveform, raw: bool, json: bool) {
    use tinyad9833::chip::Conversion;

    let conversion = if raw { Conversion::Raw } else { Conversion::Hertz };
    let encoder = config.encoder();
    let load = encoder.load(value, waveform, conversion);

    if json {
        match serde_json::to_string_pretty(&load) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to serialize: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!("Frequency word: {} (0x{:07X})", load.register_value, load.register_value);
    println!("Waveform:       {}", load.waveform);
    let mut hz = encoder.frequency_of(load.register_value);
    if load.waveform == Waveform::RectangleHalf {
        hz /= 2.0;
    }
    println!("Output:         {:.4} Hz", hz);
    println!();
    for (word, label) in load.words.iter().zip(["FREQ0 LSB", "FREQ0 MSB", "CONTROL"]) {
        println!("  {}  {}", word, label);
    }
}

#[cfg(feature = "tui")]
fn open_panel(config: GeneratorConfig) {
    if let Err(e) = tinyad9833::run_panel(config) {
        eprintln!("❌ Panel error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn open_panel(_config: GeneratorConfig) {
    eprintln!("❌ Built without the `tui` feature");
    std::process::exit(1);
}

fn run_self_test() {
    use tinyad9833::{Generator, Interpreter};
    use tinyad9833::chip::register::join_frequency_words;

    println!("━━━ TinyAD9833 Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    // Test 1: integer entry
    print!("Integer entry (1000S)... ");
    let mut interp = Interpreter::default();
    let value = interp.handle_str("1000S").iter().find_map(|r| r.value);
    if value == Some(1000.0) { println!("✓"); passed += 1; }
    else { println!("✗ (got {:?})", value); failed += 1; }

    // Test 2: decimal entry with suffix
    print!("Decimal entry (1.5kS)... ");
    let value = interp.handle_str("1.5kS").iter().find_map(|r| r.value);
    if value == Some(1500.0) { println!("✓"); passed += 1; }
    else { println!("✗ (got {:?})", value); failed += 1; }

    // Test 3: frequency word split
    print!("Frequency word round trip... ");
    let load = interp.encoder().load(123_456.0, Waveform::Sine, tinyad9833::chip::Conversion::Hertz);
    if join_frequency_words(load.words[0], load.words[1]) == load.register_value {
        println!("✓");
        passed += 1;
    } else {
        println!("✗");
        failed += 1;
    }

    // Test 4: reset word
    print!("Off command writes 0x2100... ");
    let writes: Vec<u16> = interp.handle_str("O").iter()
        .flat_map(|r| r.writes.iter().map(|w| w.0))
        .collect();
    if writes == [0x2100] { println!("✓"); passed += 1; }
    else { println!("✗ (got {:04X?})", writes); failed += 1; }

    // Test 5: chip programmed over the link
    print!("Simulated chip output (10kT)... ");
    let mut generator = Generator::simulated(&GeneratorConfig::default());
    let mut sink = Vec::new();
    let ok = b"10kT".iter().all(|&b| generator.handle_byte(b, &mut sink).is_ok());
    let out = generator.pins().output();
    if ok && out.waveform == Waveform::Triangle && (out.frequency_hz - 10_000.0).abs() < 0.1 {
        println!("✓");
        passed += 1;
    } else {
        println!("✗ (got {} @ {} Hz)", out.waveform, out.frequency_hz);
        failed += 1;
    }

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
