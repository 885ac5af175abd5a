//! API-key gate view.
//!
//! Shown instead of the main views until the key gate reports ready.
//! Collects a pasted key, which is the terminal equivalent of the hosted
//! key-selection picker.

use crossterm::event::{Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::core::keygate::{KeyGate, KeyStatus};
use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateInputMode {
    Normal,
    Insert,
}

/// Commands the view hands back to the app loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateCommand {
    /// Submit the pasted key to the gate.
    SubmitKey(String),
    /// Re-probe key availability.
    Recheck,
    Quit,
}

pub struct GateViewState {
    pub input: InputBuffer,
    pub mode: GateInputMode,
}

impl Default for GateViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl GateViewState {
    pub fn new() -> Self {
        Self {
            input: InputBuffer::new(),
            mode: GateInputMode::Normal,
        }
    }

    /// Map terminal input to a gate command. Returns `None` when the input
    /// only mutated local view state.
    pub fn handle_input(&mut self, event: &Event) -> Option<GateCommand> {
        let Event::Key(key) = event else { return None };
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match self.mode {
            GateInputMode::Insert => match key.code {
                KeyCode::Esc => {
                    self.mode = GateInputMode::Normal;
                    None
                }
                KeyCode::Enter => {
                    if self.input.is_empty() {
                        return None;
                    }
                    self.mode = GateInputMode::Normal;
                    Some(GateCommand::SubmitKey(self.input.take().trim().to_string()))
                }
                KeyCode::Backspace => {
                    self.input.backspace();
                    None
                }
                KeyCode::Delete => {
                    self.input.delete();
                    None
                }
                KeyCode::Left => {
                    self.input.move_left();
                    None
                }
                KeyCode::Right => {
                    self.input.move_right();
                    None
                }
                KeyCode::Home => {
                    self.input.move_home();
                    None
                }
                KeyCode::End => {
                    self.input.move_end();
                    None
                }
                KeyCode::Char(c) => {
                    self.input.insert_char(c);
                    None
                }
                _ => None,
            },
            GateInputMode::Normal => match key.code {
                KeyCode::Char('i') => {
                    self.mode = GateInputMode::Insert;
                    None
                }
                KeyCode::Char('r') => Some(GateCommand::Recheck),
                KeyCode::Char('q') => Some(GateCommand::Quit),
                KeyCode::Enter if !self.input.is_empty() => {
                    Some(GateCommand::SubmitKey(self.input.take().trim().to_string()))
                }
                _ => None,
            },
        }
    }
}

pub fn render(frame: &mut Frame, area: Rect, gate: &KeyGate, state: &GateViewState) {
    // Center a card in the available area
    let vertical = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(14),
        Constraint::Min(1),
    ])
    .split(area);
    let horizontal = Layout::horizontal([
        Constraint::Min(1),
        Constraint::Length(64),
        Constraint::Min(1),
    ])
    .split(vertical[1]);
    let card = horizontal[1];

    let mut lines: Vec<Line> = vec![
        Line::styled("API Key Required", theme::title()).alignment(Alignment::Center),
        Line::raw(""),
        Line::styled(
            "To use the Gemini 3 Pro models for text and image generation,",
            theme::muted(),
        ),
        Line::styled(
            "select a valid API key with billing enabled.",
            theme::muted(),
        ),
        Line::styled(
            "See ai.google.dev/gemini-api/docs/billing for details.",
            theme::dim(),
        ),
        Line::raw(""),
    ];

    if gate.status() == KeyStatus::Unresolved {
        lines.push(Line::styled("Checking key status...", theme::muted()));
    }

    if let Some(error) = gate.last_error() {
        lines.push(Line::styled(error.to_string(), theme::heading().fg(theme::ERROR)));
        lines.push(Line::raw(""));
    }

    // Key input (masked)
    let masked: String = "•".repeat(state.input.text().chars().count());
    let input_line = if state.input.text().is_empty() {
        match state.mode {
            GateInputMode::Insert => Line::styled("Paste your API key...", theme::dim()),
            GateInputMode::Normal => {
                Line::styled("Press i, then paste your API key", theme::dim())
            }
        }
    } else {
        Line::from(vec![
            Span::styled(masked, theme::highlight()),
            Span::styled(
                if state.mode == GateInputMode::Insert {
                    "▍"
                } else {
                    ""
                },
                theme::muted(),
            ),
        ])
    };
    lines.push(input_line);
    lines.push(Line::raw(""));
    lines.push(
        Line::styled(
            "[i] enter key  [Enter] select  [r] re-check  [q] quit",
            theme::key_hint(),
        )
        .alignment(Alignment::Center),
    );

    let block = match state.mode {
        GateInputMode::Insert => theme::block_focused("Select API Key"),
        GateInputMode::Normal => theme::block_default("Select API Key"),
    };

    frame.render_widget(Paragraph::new(lines).block(block), card);
}
