//! Markdown → ratatui Lines renderer.
//!
//! Converts markdown text (campaign body copy, chat replies) to
//! `Vec<Line<'static>>` for display in ratatui paragraphs.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::tui::theme;

/// Convert markdown text to styled ratatui lines.
pub fn markdown_to_lines(md: &str) -> Vec<Line<'static>> {
    let parser = Parser::new(md);
    let mut lines: Vec<Line<'static>> = Vec::new();

    let mut current_spans: Vec<Span<'static>> = Vec::new();
    // Style stack for nested formatting
    let mut style_stack: Vec<Style> = vec![Style::default().fg(theme::TEXT)];

    let mut in_code_block = false;
    let mut list_depth: usize = 0;

    for event in parser {
        match event {
            // ── Headings ─────────────────────────────────────────
            Event::Start(Tag::Heading { level, .. }) => {
                flush_line(&mut current_spans, &mut lines);
                let style = match level {
                    HeadingLevel::H1 => Style::default()
                        .fg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                    HeadingLevel::H2 => Style::default()
                        .fg(theme::PRIMARY_LIGHT)
                        .add_modifier(Modifier::BOLD),
                    HeadingLevel::H3 => Style::default().fg(theme::SUCCESS),
                    _ => Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
                };
                style_stack.push(style);
            }
            Event::End(TagEnd::Heading(_)) => {
                style_stack.pop();
                flush_line(&mut current_spans, &mut lines);
                lines.push(Line::raw(""));
            }

            // ── Bold / Italic ────────────────────────────────────
            Event::Start(Tag::Strong) => {
                let base = current_style(&style_stack);
                style_stack.push(base.add_modifier(Modifier::BOLD));
            }
            Event::End(TagEnd::Strong) => {
                style_stack.pop();
            }
            Event::Start(Tag::Emphasis) => {
                let base = current_style(&style_stack);
                style_stack.push(base.add_modifier(Modifier::ITALIC));
            }
            Event::End(TagEnd::Emphasis) => {
                style_stack.pop();
            }

            // ── Inline code ──────────────────────────────────────
            Event::Code(code) => {
                current_spans.push(Span::styled(
                    format!(" {} ", code),
                    Style::default().fg(theme::ACCENT_SOFT).bg(theme::BG_SURFACE),
                ));
            }

            // ── Fenced code blocks ───────────────────────────────
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_)))
            | Event::Start(Tag::CodeBlock(CodeBlockKind::Indented)) => {
                flush_line(&mut current_spans, &mut lines);
                in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                lines.push(Line::raw(""));
            }

            // ── Lists ────────────────────────────────────────────
            Event::Start(Tag::List(_)) => {
                list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
                if list_depth == 0 {
                    lines.push(Line::raw(""));
                }
            }
            Event::Start(Tag::Item) => {
                flush_line(&mut current_spans, &mut lines);
                let indent = "  ".repeat(list_depth.saturating_sub(1));
                current_spans.push(Span::styled(
                    format!("{indent}• "),
                    Style::default().fg(theme::PRIMARY_LIGHT),
                ));
            }
            Event::End(TagEnd::Item) => {
                flush_line(&mut current_spans, &mut lines);
            }

            // ── Paragraphs ───────────────────────────────────────
            Event::Start(Tag::Paragraph) => {
                flush_line(&mut current_spans, &mut lines);
            }
            Event::End(TagEnd::Paragraph) => {
                flush_line(&mut current_spans, &mut lines);
                if list_depth == 0 {
                    lines.push(Line::raw(""));
                }
            }

            // ── Text ─────────────────────────────────────────────
            Event::Text(text) => {
                if in_code_block {
                    for code_line in text.lines() {
                        lines.push(Line::styled(
                            format!("  {code_line}"),
                            Style::default().fg(theme::TEXT_MUTED).bg(theme::BG_SURFACE),
                        ));
                    }
                } else {
                    current_spans.push(Span::styled(
                        text.to_string(),
                        current_style(&style_stack),
                    ));
                }
            }
            Event::SoftBreak => {
                current_spans.push(Span::raw(" "));
            }
            Event::HardBreak => {
                flush_line(&mut current_spans, &mut lines);
            }
            Event::Rule => {
                flush_line(&mut current_spans, &mut lines);
                lines.push(Line::styled("─".repeat(40), theme::dim()));
            }

            _ => {}
        }
    }

    flush_line(&mut current_spans, &mut lines);

    // Trim trailing blank lines
    while lines.last().is_some_and(|l| l.width() == 0) {
        lines.pop();
    }

    lines
}

fn current_style(stack: &[Style]) -> Style {
    stack.last().copied().unwrap_or_default()
}

fn flush_line(spans: &mut Vec<Span<'static>>, lines: &mut Vec<Line<'static>>) {
    if !spans.is_empty() {
        lines.push(Line::from(std::mem::take(spans)));
    }
}
