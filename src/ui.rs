use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::presenter;
use crate::screen::ScreenId;
use crate::shape::Shape;
use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;

/// Glyph block for one stimulus shape. All shapes share one style so the
/// rendering itself gives no counting cue.
fn shape_art(shape: Shape) -> &'static [&'static str] {
    match shape {
        Shape::Circle => &[
            "   ▄▄███▄▄   ",
            " ▄█████████▄ ",
            "█████████████",
            "█████████████",
            "█████████████",
            " ▀█████████▀ ",
            "   ▀▀███▀▀   ",
        ],
        Shape::Square => &[
            "█████████████",
            "█████████████",
            "█████████████",
            "█████████████",
            "█████████████",
            "█████████████",
            "█████████████",
        ],
        Shape::Triangle => &[
            "      ▄      ",
            "     ▄█▄     ",
            "    ▄███▄    ",
            "   ▄█████▄   ",
            "  ▄███████▄  ",
            " ▄█████████▄ ",
            "▄███████████▄",
        ],
    }
}

pub fn draw(app: &App, f: &mut Frame) {
    match app.screens.current() {
        Some(ScreenId::Presenting) => draw_presentation(app, f),
        Some(ScreenId::Answer) => draw_answer(app, f),
        Some(id) => draw_static(app, f, id),
        None => {}
    }
}

/// Instruction-style screens: registered title + lines, plus any dynamic
/// lines for the current phase, centered in the terminal.
fn draw_static(app: &App, f: &mut Frame, id: ScreenId) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(def) = app.screens.current_def() {
        lines.push(Line::from(Span::styled(def.title, bold)));
        lines.push(Line::default());
        for instruction in &def.instructions {
            lines.push(Line::from(Span::styled(*instruction, dim)));
        }
    }

    for extra in dynamic_lines(app, id) {
        lines.push(Line::default());
        lines.push(Line::from(extra));
    }

    if let Some(msg) = &app.flash {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            msg.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, centered_vertical(f.area(), 14));
}

fn dynamic_lines(app: &App, id: ScreenId) -> Vec<String> {
    match id {
        ScreenId::ParticipantId => {
            let shown = if app.id_input.is_empty() {
                "_".to_string()
            } else {
                app.id_input.clone()
            };
            vec![format!("participant id: {shown}")]
        }
        ScreenId::NextRound => {
            let done = app.controller.current_round();
            let total = app
                .timing
                .real
                .rounds
                .map_or_else(|| "?".to_string(), |r| r.to_string());
            vec![format!("round {done} of {total} complete")]
        }
        ScreenId::PracticeComplete => {
            vec![format!(
                "you completed {} practice round(s)",
                app.controller
                    .session()
                    .map_or(0, |s| s.completed_rounds())
            )]
        }
        ScreenId::SessionComplete => match &app.last_export {
            Some(path) => vec![format!("results written to {}", path.display())],
            None => vec![],
        },
        _ => vec![],
    }
}

/// The stimulus screen: one large glyph during a display interval, nothing
/// at all during a blank interval.
fn draw_presentation(app: &App, f: &mut Frame) {
    let frame = match app.controller.frame() {
        Some(presenter::Frame::Shape(shape)) => shape,
        // Blank interval, or the run just ended; the screen stays empty.
        _ => return,
    };

    let art = shape_art(frame);
    let lines: Vec<Line> = art
        .iter()
        .map(|row| {
            Line::from(Span::styled(
                *row,
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ))
        })
        .collect();

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(paragraph, centered_vertical(f.area(), art.len() as u16));
}

/// Three count fields, one per shape, with the selected field highlighted.
fn draw_answer(app: &App, f: &mut Frame) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);
    let selected_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let form = app.answer.borrow();
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled("How many of each shape did you see?", bold)),
        Line::default(),
    ];

    for (idx, shape) in crate::answer_fields().iter().enumerate() {
        let value = form
            .draft
            .get(*shape)
            .map_or_else(|| "_".to_string(), |v| v.to_string());
        let text = format!("{shape:>9}: [ {value:>3} ]");
        let style = if idx == form.selected {
            selected_style
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(text, style)));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "type digits · backspace to erase · tab/arrows to switch · enter to submit",
        dim,
    )));

    if let Some(msg) = &app.flash {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            msg.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let block = Block::default().borders(Borders::NONE);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, centered_vertical(f.area(), 10));
}

/// Middle band of the terminal, `height` rows tall.
fn centered_vertical(area: Rect, height: u16) -> Rect {
    let pad = area.height.saturating_sub(height) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(pad),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    chunks[1]
}
