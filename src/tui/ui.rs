//! UI rendering for the front panel.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::chip::{Register, Waveform};
use crate::command::EntryPhase;
use super::app::PanelApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &PanelApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(frame.area());

    // Left side: console and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_console(frame, left_chunks[0], app);
    draw_status(frame, left_chunks[1], app);

    // Right side: generator, chip, bus, keys
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(chunks[1]);

    draw_generator(frame, right_chunks[0], app);
    draw_chip(frame, right_chunks[1], app);
    draw_bus(frame, right_chunks[2], app);
    draw_keys(frame, right_chunks[3]);
}

/// Terminal view: what the device sent back.
fn draw_console(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let visible = (area.height as usize).saturating_sub(2);
    let start = app.console.len().saturating_sub(visible);

    let lines: Vec<Line> = app.console[start..]
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();

    let console = Paragraph::new(lines)
        .block(Block::default()
            .title(" Serial ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(console, area);
}

/// Generator state and the pending number.
fn draw_generator(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let state = &app.generator.interpreter.state;
    let acc = app.generator.interpreter.accumulator();

    let digits: String = acc.buffer().digits().iter().rev().map(|d| char::from(b'0' + d)).collect();
    let phase = match acc.phase() {
        EntryPhase::Idle => "idle",
        EntryPhase::Integer => "integer",
        EntryPhase::Fraction => "fraction",
    };

    let content = vec![
        Line::from(vec![
            Span::raw("Waveform: "),
            Span::styled(state.waveform.to_string(), waveform_style(state.waveform)),
        ]),
        Line::from(vec![
            Span::raw("Echo: "),
            Span::styled(on_off(state.echo), flag_style(state.echo)),
            Span::raw("   Debug: "),
            Span::styled(on_off(state.debug), flag_style(state.debug)),
        ]),
        Line::from(vec![
            Span::raw("Digits: "),
            Span::styled(digits, Style::default().fg(Color::White)),
            Span::raw(format!("  ({} typed, {})", acc.digits_entered(), phase)),
        ]),
        Line::from(vec![
            Span::raw("Scale: "),
            Span::styled(format!("×{} ÷{}", acc.multiplier(), acc.divider()), Style::default().fg(Color::Yellow)),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Generator ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Simulated chip register file.
fn draw_chip(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let chip = app.generator.pins();
    let out = chip.output();

    let content = vec![
        Line::from(vec![
            Span::raw("Output: "),
            Span::styled(format!("{:.3} Hz", out.frequency_hz), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            Span::raw(" "),
            Span::styled(out.waveform.to_string(), waveform_style(out.waveform)),
        ]),
        Line::from(format!("Control: 0x{:04X}", chip.control)),
        Line::from(format!("FREQ0: 0x{:07X}  FREQ1: 0x{:07X}", chip.frequency[0], chip.frequency[1])),
        Line::from(format!("PHASE0: 0x{:03X}  PHASE1: 0x{:03X}", chip.phase[0], chip.phase[1])),
        Line::from(vec![
            Span::raw("Words: "),
            Span::styled(format!("{}", chip.words_latched), Style::default().fg(Color::Cyan)),
            Span::raw("   Dropped: "),
            Span::styled(format!("{}", chip.frames_dropped),
                if chip.frames_dropped == 0 {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                }),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" AD9833 ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(paragraph, area);
}

/// Most recent words on the link, newest at the bottom.
fn draw_bus(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let visible = (area.height as usize).saturating_sub(2);
    let words = app.generator.pins().received();
    let start = words.len().saturating_sub(visible);

    let items: Vec<ListItem> = words
        .iter()
        .skip(start)
        .map(|w| {
            let (name, style) = match w.register() {
                Register::Control => ("CTRL", Style::default().fg(Color::Yellow)),
                Register::Freq0 => ("FREQ0", Style::default().fg(Color::White)),
                Register::Freq1 => ("FREQ1", Style::default().fg(Color::White)),
                Register::Phase(_) => ("PHASE", Style::default().fg(Color::DarkGray)),
            };
            ListItem::new(format!("{}  {:<5} {:04X}", w, name, w.payload())).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Bus ")
            .borders(Borders::ALL));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw key legend.
fn draw_keys(frame: &mut Frame, area: Rect) {
    let keys = Paragraph::new(Line::from("Esc: Quit  F5: Power cycle  ?: Help"))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default()
            .borders(Borders::ALL));

    frame.render_widget(keys, area);
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn flag_style(flag: bool) -> Style {
    if flag {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// Get color style for a waveform.
fn waveform_style(w: Waveform) -> Style {
    match w {
        Waveform::Midscale => Style::default().fg(Color::Red),
        Waveform::Sine => Style::default().fg(Color::Green),
        Waveform::Triangle => Style::default().fg(Color::Cyan),
        Waveform::Rectangle | Waveform::RectangleHalf => Style::default().fg(Color::Yellow),
    }
}
