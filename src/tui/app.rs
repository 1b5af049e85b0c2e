//! Front panel state and event loop.

use crate::{Generator, GeneratorConfig, SimulatedChip};
use crate::command::HELP_TEXT;

/// Console lines kept on screen.
const CONSOLE_LINES: usize = 200;

/// Front panel application state.
pub struct PanelApp {
    /// The generator with a simulated chip on its link.
    pub generator: Generator<SimulatedChip>,
    /// Configuration used for power cycles.
    pub config: GeneratorConfig,
    /// Terminal output (echo, help, debug trace), split into lines.
    pub console: Vec<String>,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
}

impl PanelApp {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            generator: Generator::simulated(&config),
            config,
            console: vec![String::new()],
            should_quit: false,
            status: "Ready. Type commands, '?' for help, Esc to quit.".into(),
        }
    }

    /// Send one byte to the generator as if typed on the serial line.
    pub fn send(&mut self, byte: u8) {
        let mut out = Vec::new();
        match self.generator.handle_byte(byte, &mut out) {
            Ok(reaction) => {
                self.append(&String::from_utf8_lossy(&out));
                if let Some(command) = reaction.command {
                    let value = reaction.value.unwrap_or(0.0);
                    self.status = format!(
                        "{} value={} words={}",
                        command.letter(),
                        value,
                        reaction.writes.len()
                    );
                }
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
            }
        }
    }

    /// Terminate the current console line, as Enter does on a terminal.
    pub fn newline(&mut self) {
        self.send(b'\r');
        self.console.push(String::new());
        self.trim_console();
    }

    /// Power-cycle the generator and the chip.
    pub fn power_cycle(&mut self) {
        self.generator = Generator::simulated(&self.config);
        self.console = vec![String::new()];
        self.status = "Power cycled.".into();
    }

    fn append(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\r' => {}
                '\n' => self.console.push(String::new()),
                c => {
                    if let Some(line) = self.console.last_mut() {
                        line.push(c);
                    }
                }
            }
        }
        self.trim_console();
    }

    fn trim_console(&mut self) {
        if self.console.len() > CONSOLE_LINES {
            let excess = self.console.len() - CONSOLE_LINES;
            self.console.drain(..excess);
        }
    }

    /// Number of lines in the help text, for layout.
    pub fn help_lines() -> usize {
        HELP_TEXT.lines().count()
    }
}

/// Run the front panel.
pub fn run_panel(config: GeneratorConfig) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = PanelApp::new(config);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc => app.should_quit = true,
                        KeyCode::F(5) => app.power_cycle(),
                        KeyCode::Enter => app.newline(),
                        KeyCode::Char(c) if c.is_ascii() => app.send(c as u8),
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
