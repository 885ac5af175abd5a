//! Campaign builder view.
//!
//! Left pane: the request form (topic, audience, tone, image size).
//! Right pane: the generated campaign preview — subject lines, body copy
//! rendered as markdown, and the visual panel with its regenerate and
//! save affordances.

use crossterm::event::{Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::core::campaign::CampaignStudio;
use crate::core::gemini::{CampaignRequest, ImageSize, Tone};
use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;
use crate::tui::widgets::markdown::markdown_to_lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignInputMode {
    Normal,
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Topic,
    Audience,
    Tone,
    Size,
}

impl FormField {
    const ALL: [FormField; 4] = [
        FormField::Topic,
        FormField::Audience,
        FormField::Tone,
        FormField::Size,
    ];

    fn next(self) -> FormField {
        let idx = Self::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn prev(self) -> FormField {
        let idx = Self::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn is_text(self) -> bool {
        matches!(self, FormField::Topic | FormField::Audience)
    }
}

/// Commands the view hands back to the app loop.
#[derive(Debug)]
pub enum CampaignCommand {
    Generate(CampaignRequest),
    RegenerateImage(ImageSize),
    SaveImage,
    ExportCopy,
}

pub struct CampaignViewState {
    pub topic: InputBuffer,
    pub audience: InputBuffer,
    pub tone: Tone,
    pub image_size: ImageSize,
    pub field: FormField,
    pub mode: CampaignInputMode,
    pub preview_scroll: u16,
}

impl Default for CampaignViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl CampaignViewState {
    pub fn new() -> Self {
        Self {
            topic: InputBuffer::new(),
            audience: InputBuffer::new(),
            tone: Tone::Professional,
            image_size: ImageSize::OneK,
            field: FormField::Topic,
            mode: CampaignInputMode::Normal,
            preview_scroll: 0,
        }
    }

    fn request(&self) -> CampaignRequest {
        CampaignRequest::new(
            self.topic.text().trim(),
            self.audience.text().trim(),
            self.tone,
        )
        .with_image_size(self.image_size)
    }

    fn active_buffer(&mut self) -> Option<&mut InputBuffer> {
        match self.field {
            FormField::Topic => Some(&mut self.topic),
            FormField::Audience => Some(&mut self.audience),
            _ => None,
        }
    }

    fn cycle_field_value(&mut self, forward: bool) {
        match self.field {
            FormField::Tone => {
                self.tone = if forward {
                    self.tone.next()
                } else {
                    self.tone.prev()
                };
            }
            FormField::Size => {
                self.image_size = if forward {
                    self.image_size.next()
                } else {
                    self.image_size.prev()
                };
            }
            _ => {}
        }
    }

    /// Map terminal input to a campaign command. Returns `None` when the
    /// input only mutated local view state or was not handled.
    pub fn handle_input(
        &mut self,
        event: &Event,
        studio: &CampaignStudio,
    ) -> Option<CampaignCommand> {
        let Event::Key(key) = event else { return None };
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match self.mode {
            CampaignInputMode::Insert => {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => self.mode = CampaignInputMode::Normal,
                    KeyCode::Backspace => {
                        if let Some(buf) = self.active_buffer() {
                            buf.backspace();
                        }
                    }
                    KeyCode::Delete => {
                        if let Some(buf) = self.active_buffer() {
                            buf.delete();
                        }
                    }
                    KeyCode::Left => {
                        if let Some(buf) = self.active_buffer() {
                            buf.move_left();
                        }
                    }
                    KeyCode::Right => {
                        if let Some(buf) = self.active_buffer() {
                            buf.move_right();
                        }
                    }
                    KeyCode::Home => {
                        if let Some(buf) = self.active_buffer() {
                            buf.move_home();
                        }
                    }
                    KeyCode::End => {
                        if let Some(buf) = self.active_buffer() {
                            buf.move_end();
                        }
                    }
                    KeyCode::Char(c) => {
                        if let Some(buf) = self.active_buffer() {
                            buf.insert_char(c);
                        }
                    }
                    _ => {}
                }
                None
            }
            CampaignInputMode::Normal => match key.code {
                KeyCode::Down | KeyCode::Char('j') => {
                    self.field = self.field.next();
                    None
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.field = self.field.prev();
                    None
                }
                KeyCode::Char('i') if self.field.is_text() => {
                    self.mode = CampaignInputMode::Insert;
                    None
                }
                KeyCode::Left | KeyCode::Char('h') => {
                    self.cycle_field_value(false);
                    None
                }
                KeyCode::Right | KeyCode::Char('l') => {
                    self.cycle_field_value(true);
                    None
                }
                KeyCode::Enter => {
                    if studio.text_busy() || self.topic.is_empty() {
                        // Submit is a no-op without a topic
                        return None;
                    }
                    Some(CampaignCommand::Generate(self.request()))
                }
                KeyCode::Char('r') if studio.can_regenerate_image() => {
                    Some(CampaignCommand::RegenerateImage(self.image_size))
                }
                KeyCode::Char('s') if studio.image().is_some() => {
                    Some(CampaignCommand::SaveImage)
                }
                KeyCode::Char('e') if studio.copy().is_some() => {
                    Some(CampaignCommand::ExportCopy)
                }
                KeyCode::PageDown => {
                    self.preview_scroll = self.preview_scroll.saturating_add(5);
                    None
                }
                KeyCode::PageUp => {
                    self.preview_scroll = self.preview_scroll.saturating_sub(5);
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

pub fn render(frame: &mut Frame, area: Rect, state: &CampaignViewState, studio: &CampaignStudio) {
    let panes = Layout::horizontal([Constraint::Percentage(36), Constraint::Percentage(64)])
        .split(area);

    render_form(frame, panes[0], state, studio);
    render_preview(frame, panes[1], state, studio);
}

fn field_line<'a>(
    label: &'a str,
    value: String,
    selected: bool,
    inserting: bool,
) -> Vec<Line<'a>> {
    let marker = if selected { "▸ " } else { "  " };
    let label_style = if selected {
        theme::highlight()
    } else {
        theme::muted()
    };
    let value_line = if value.is_empty() {
        Line::styled(format!("    (empty){}", if inserting { "▍" } else { "" }), theme::dim())
    } else {
        Line::from(vec![
            Span::raw("    "),
            Span::styled(value, ratatui::style::Style::default().fg(theme::TEXT)),
            Span::styled(if inserting { "▍" } else { "" }, theme::muted()),
        ])
    };
    vec![
        Line::from(vec![
            Span::styled(marker, theme::highlight()),
            Span::styled(label, label_style),
        ]),
        value_line,
        Line::raw(""),
    ]
}

fn render_form(frame: &mut Frame, area: Rect, state: &CampaignViewState, studio: &CampaignStudio) {
    let inserting = state.mode == CampaignInputMode::Insert;
    let mut lines: Vec<Line> = Vec::new();

    lines.extend(field_line(
        "Campaign Topic / Product",
        state.topic.text().to_string(),
        state.field == FormField::Topic,
        inserting && state.field == FormField::Topic,
    ));
    lines.extend(field_line(
        "Target Audience",
        state.audience.text().to_string(),
        state.field == FormField::Audience,
        inserting && state.field == FormField::Audience,
    ));
    lines.extend(field_line(
        "Tone",
        format!("◂ {} ▸", state.tone),
        state.field == FormField::Tone,
        false,
    ));
    lines.extend(field_line(
        "Image Size",
        format!("◂ {} ▸", state.image_size),
        state.field == FormField::Size,
        false,
    ));

    if let Some(error) = studio.text_error() {
        lines.push(Line::styled(error.to_string(), theme::heading().fg(theme::ERROR)));
        lines.push(Line::raw(""));
    }

    if studio.text_busy() {
        lines.push(Line::styled("Generating campaign...", theme::highlight()));
    } else if state.topic.is_empty() {
        lines.push(Line::styled("Enter a topic to generate", theme::dim()));
    } else {
        lines.push(Line::styled("[Enter] Generate Campaign", theme::highlight()));
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "[j/k] field  [i] edit  [h/l] cycle  [e] export",
        theme::key_hint(),
    ));

    let block = if inserting {
        theme::block_focused("Campaign Builder")
    } else {
        theme::block_default("Campaign Builder")
    };
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_preview(
    frame: &mut Frame,
    area: Rect,
    state: &CampaignViewState,
    studio: &CampaignStudio,
) {
    let Some(copy) = studio.copy() else {
        let placeholder = if studio.text_busy() {
            "Writing copy with Gemini 3 Pro..."
        } else {
            "Enter details and press Enter to see the magic."
        };
        let lines = vec![Line::raw(""), Line::styled(placeholder, theme::muted())];
        frame.render_widget(
            Paragraph::new(lines).block(theme::block_default("Preview")),
            area,
        );
        return;
    };

    let mut lines: Vec<Line> = Vec::new();

    // Subject lines
    lines.push(Line::styled("SUBJECT LINE OPTIONS", theme::heading()));
    for (idx, subject) in copy.subject_lines.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", idx + 1), theme::brand_badge()),
            Span::raw(" "),
            Span::styled(
                subject.clone(),
                ratatui::style::Style::default().fg(theme::TEXT),
            ),
        ]));
    }
    lines.push(Line::raw(""));

    // Visual panel
    lines.push(Line::styled("VISUAL", theme::heading()));
    if studio.image_busy() {
        lines.push(Line::styled(
            format!(
                "Creating visuals with Gemini 3 Pro ({})...",
                studio.image_size()
            ),
            theme::highlight(),
        ));
    } else if let Some(image) = studio.image() {
        let kib = image
            .decode()
            .map(|bytes| bytes.len() / 1024)
            .unwrap_or(0);
        lines.push(Line::styled(
            format!(
                "{} PNG ready ({} KiB) — [s] save  [r] regenerate ({})",
                image.size, kib, state.image_size
            ),
            ratatui::style::Style::default().fg(theme::SUCCESS),
        ));
    } else if let Some(error) = studio.image_error() {
        lines.push(Line::styled(error.to_string(), theme::heading().fg(theme::ERROR)));
        if studio.can_regenerate_image() {
            lines.push(Line::styled("[r] try again", theme::key_hint()));
        }
    } else {
        lines.push(Line::styled("Image generation skipped", theme::dim()));
    }
    lines.push(Line::styled(
        format!("Promoted image: {}", copy.image_prompt),
        theme::dim(),
    ));
    lines.push(Line::raw(""));

    // Body copy
    lines.push(Line::styled("EMAIL BODY", theme::heading()));
    lines.extend(markdown_to_lines(&copy.body_copy));

    frame.render_widget(
        Paragraph::new(lines)
            .block(theme::block_default("Preview"))
            .scroll((state.preview_scroll, 0)),
        area,
    );
}
