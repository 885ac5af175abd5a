//! Assistant chat view.
//!
//! Renders the transcript with the streaming placeholder growing in place,
//! plus an insert-mode input line. Send is disabled while a reply is in
//! flight.

use crossterm::event::{Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::core::chat::{ChatDesk, ChatRole};
use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;
use crate::tui::widgets::markdown::markdown_to_lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatInputMode {
    Normal,
    Insert,
}

/// Commands the view hands back to the app loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Send(String),
    NewSession,
}

pub struct ChatViewState {
    pub input: InputBuffer,
    pub mode: ChatInputMode,
    pub scroll: u16,
}

impl Default for ChatViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatViewState {
    pub fn new() -> Self {
        Self {
            input: InputBuffer::new(),
            mode: ChatInputMode::Normal,
            scroll: 0,
        }
    }

    /// Map terminal input to a chat command. Returns `None` when the input
    /// only mutated local view state or was not handled.
    pub fn handle_input(&mut self, event: &Event, desk: &ChatDesk) -> Option<ChatCommand> {
        let Event::Key(key) = event else { return None };
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match self.mode {
            ChatInputMode::Insert => match key.code {
                KeyCode::Esc => {
                    self.mode = ChatInputMode::Normal;
                    None
                }
                KeyCode::Enter => {
                    // Send affordance is disabled while a reply streams
                    if desk.busy() || self.input.is_empty() {
                        return None;
                    }
                    Some(ChatCommand::Send(self.input.take()))
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
            ChatInputMode::Normal => match key.code {
                KeyCode::Char('i') => {
                    self.mode = ChatInputMode::Insert;
                    None
                }
                KeyCode::Char('n') if !desk.busy() => Some(ChatCommand::NewSession),
                KeyCode::Down | KeyCode::Char('j') => {
                    self.scroll = self.scroll.saturating_add(1);
                    None
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.scroll = self.scroll.saturating_sub(1);
                    None
                }
                KeyCode::PageDown => {
                    self.scroll = self.scroll.saturating_add(10);
                    None
                }
                KeyCode::PageUp => {
                    self.scroll = self.scroll.saturating_sub(10);
                    None
                }
                _ => None,
            },
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn role_header(role: ChatRole, created_at: &str) -> Line<'static> {
    let (label, color) = match role {
        ChatRole::User => ("You", theme::SUCCESS),
        ChatRole::Model => ("Assistant", theme::PRIMARY_LIGHT),
        ChatRole::Error => ("Error", theme::ERROR),
    };
    Line::from(vec![
        Span::styled(
            format!("── {label} "),
            ratatui::style::Style::default()
                .fg(color)
                .add_modifier(ratatui::style::Modifier::BOLD),
        ),
        Span::styled(format!("{created_at} ──"), theme::dim()),
    ])
}

pub fn render(frame: &mut Frame, area: Rect, state: &ChatViewState, desk: &ChatDesk) {
    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(3)]).split(area);

    // Transcript
    let mut lines: Vec<Line> = Vec::new();
    for entry in desk.transcript() {
        lines.push(role_header(entry.role, &entry.created_at));
        match entry.role {
            ChatRole::Model if entry.text.is_empty() => {
                lines.push(Line::styled("▍", theme::muted()));
            }
            ChatRole::Model => lines.extend(markdown_to_lines(&entry.text)),
            _ => {
                for text_line in entry.text.lines() {
                    lines.push(Line::raw(text_line.to_string()));
                }
            }
        }
        lines.push(Line::raw(""));
    }

    // Pin the scroll to the bottom unless the user scrolled up
    let viewport = chunks[0].height.saturating_sub(2);
    let overflow = (lines.len() as u16).saturating_sub(viewport);
    let scroll = overflow.saturating_sub(state.scroll);

    frame.render_widget(
        Paragraph::new(lines)
            .block(theme::block_default("Marketing Assistant"))
            .scroll((scroll, 0)),
        chunks[0],
    );

    // Input line
    let block = match state.mode {
        ChatInputMode::Insert => theme::block_focused("Message (Esc to exit)"),
        ChatInputMode::Normal => theme::block_default("Message"),
    };

    let input_line = if desk.busy() {
        Line::styled("Assistant is replying...", theme::dim())
    } else if state.input.text().is_empty() {
        Line::styled(
            "Ask your AI marketing assistant... (i to type, n for new session)",
            theme::dim(),
        )
    } else {
        Line::from(vec![
            Span::styled(
                state.input.text().to_string(),
                ratatui::style::Style::default().fg(theme::TEXT),
            ),
            Span::styled(
                if state.mode == ChatInputMode::Insert {
                    "▍"
                } else {
                    ""
                },
                theme::muted(),
            ),
        ])
    };

    frame.render_widget(Paragraph::new(vec![input_line]).block(block), chunks[1]);
}
