use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, InputMode, Screen};
use crate::creativity::Creativity;
use crate::state::Speaker;

const SPINNER: [&str; 4] = ["⠋", "⠙", "⠹", "⠸"];

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let [sidebar_area, main_area] = Layout::horizontal([
        Constraint::Length(34),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_header(app, frame, header_area);
    render_sidebar(app, frame, sidebar_area);

    match app.screen {
        Screen::Chat => render_chat_screen(app, frame, main_area),
        Screen::Image => render_image_screen(app, frame, main_area),
    }

    render_footer(app, frame, footer_area);

    if app.show_name_input {
        render_name_input(app, frame, area);
    }
}

fn spinner(app: &App) -> &'static str {
    SPINNER[app.animation_frame as usize % SPINNER.len()]
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let tab_style = |screen: Screen| {
        if app.screen == screen {
            Style::default().fg(Color::Black).bg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::White)
        }
    };

    let mut spans = vec![
        Span::styled(" ✨ Re-Gen AI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(" Chat ", tab_style(Screen::Chat)),
        Span::raw(" "),
        Span::styled(" Image ", tab_style(Screen::Image)),
    ];

    if app.session.is_pending() || app.images.is_pending() {
        spans.push(Span::styled(
            format!("  {} working", spinner(app)),
            Style::default().fg(Color::Yellow),
        ));
    }

    spans.push(Span::styled(
        format!("  v{}", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::Gray),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_sidebar(app: &App, frame: &mut Frame, area: Rect) {
    let [profile_area, creativity_area, note_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(5),
        Constraint::Min(0),
    ])
    .areas(area);

    let name = if app.username.trim().is_empty() {
        Span::styled("Enter your name... (n)", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(app.username.as_str(), Style::default().fg(Color::Cyan))
    };
    let profile = Paragraph::new(Line::from(name)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Your Name (Optional) "),
    );
    frame.render_widget(profile, profile_area);

    let current = app.creativity();
    let levels: Vec<ListItem> = Creativity::all()
        .into_iter()
        .map(|level| {
            if level == current {
                ListItem::new(format!("> {}", level.display_name()))
                    .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            } else {
                ListItem::new(format!("  {}", level.display_name()))
            }
        })
        .collect();
    let creativity = List::new(levels).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Creativity Level (c) "),
    );
    frame.render_widget(creativity, creativity_area);

    let note = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Note: ", Style::default().bold()),
            Span::raw("Now powered by IntelliChat AI for enhanced conversations."),
        ]),
        Line::default(),
        Line::from(Span::styled(
            "u  Quick Inspiration",
            Style::default().fg(Color::Magenta),
        )),
        Line::from(Span::styled(
            "x  Clear Conversation",
            Style::default().fg(Color::Red),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(note, note_area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [transcript_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Inner size (minus borders) drives scroll calculations
    app.chat_height = transcript_area.height.saturating_sub(2);
    app.chat_width = transcript_area.width.saturating_sub(2);

    if app.stick_to_bottom {
        app.scroll_to_bottom();
        app.stick_to_bottom = false;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" AI Chat Assistant · Powered by IntelliChat AI ");

    let pending = app.session.is_pending();
    let transcript = transcript_paragraph(app)
        .block(block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(transcript, transcript_area);

    let title = if pending { " Waiting for reply... " } else { " Type your message (i) " };
    let editing = app.input_mode == InputMode::Editing;
    render_input_line(
        frame,
        input_area,
        title,
        app.session.input(),
        app.chat_cursor,
        editing && !app.show_name_input,
    );
}

/// The transcript as it is drawn, without the surrounding block
fn transcript_paragraph(app: &App) -> Paragraph<'static> {
    let pending = app.session.is_pending();
    let text = if app.session.turns().is_empty() && !pending {
        Text::from(Span::styled(
            "Start a conversation with the AI assistant",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let user_label = app.user_label().to_string();
        let mut lines: Vec<Line<'static>> = Vec::new();

        for turn in app.session.turns() {
            let (label, color) = match turn.speaker {
                Speaker::User => (user_label.as_str(), Color::Cyan),
                Speaker::Assistant => ("AI", Color::Yellow),
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{}:", label),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {}", turn.time_label()), Style::default().fg(Color::DarkGray)),
            ]));
            for line in turn.text.lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::default());
        }

        if pending {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            let dots = ".".repeat(app.animation_frame as usize % 3 + 1);
            lines.push(Line::from(Span::styled(
                format!("{} Thinking{}", spinner(app), dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    Paragraph::new(text).wrap(Wrap { trim: false })
}

/// Rows the transcript occupies when wrapped to `width` columns, measured
/// with the same wrapping the renderer uses (display width, word breaks)
pub fn transcript_height(app: &App, width: u16) -> u16 {
    let rows = transcript_paragraph(app).line_count(width.max(1));
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn render_image_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [prompt_area, image_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    let editing = app.input_mode == InputMode::Editing;
    let title = if app.images.is_pending() {
        " Generating... "
    } else {
        " Describe the image you want to generate (i) "
    };
    render_input_line(
        frame,
        prompt_area,
        title,
        app.images.prompt(),
        app.image_cursor,
        editing && !app.show_name_input,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" AI Image Generator · Flux Demo ");

    let body = if app.images.is_pending() {
        Text::from(Span::styled(
            format!("{} Generating image...", spinner(app)),
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(reference) = app.images.reference() {
        Text::from(vec![
            Line::from(Span::styled("Generated Image", Style::default().fg(Color::Green).bold())),
            Line::default(),
            Line::from(reference.to_string()),
            Line::default(),
            Line::from(Span::styled(
                "s  Download   d  Clear",
                Style::default().fg(Color::DarkGray),
            )),
        ])
    } else {
        Text::from(Span::styled(
            "Generated images will appear here",
            Style::default().fg(Color::DarkGray),
        ))
    };

    let image = Paragraph::new(body).block(block).wrap(Wrap { trim: false });
    frame.render_widget(image, image_area);
}

/// Single-line input box that scrolls horizontally to keep the cursor visible
fn render_input_line(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    value: &str,
    cursor: usize,
    show_cursor: bool,
) {
    let border_color = if show_cursor { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width > 0 && cursor >= inner_width {
        cursor - inner_width + 1
    } else {
        0
    };

    let visible: String = value.chars().skip(scroll_offset).take(inner_width).collect();
    let input = Paragraph::new(visible)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if show_cursor {
        let cursor_x = u16::try_from(cursor - scroll_offset).unwrap_or(0);
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    if let Some(status) = &app.status {
        let footer = Paragraph::new(Span::styled(format!(" {} ", status), label_style));
        frame.render_widget(footer, area);
        return;
    }

    let mode = match app.input_mode {
        InputMode::Normal => Span::styled(" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => Span::styled(" EDIT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let pairs: &[(&str, &str)] = match (app.screen, app.input_mode) {
        (_, InputMode::Editing) => &[("Enter", "send"), ("Esc", "done")],
        (Screen::Chat, InputMode::Normal) => &[
            ("i", "type"),
            ("j/k", "scroll"),
            ("Tab", "image"),
            ("c", "creativity"),
            ("n", "name"),
            ("q", "quit"),
        ],
        (Screen::Image, InputMode::Normal) => &[
            ("i", "prompt"),
            ("s", "download"),
            ("d", "clear"),
            ("Tab", "chat"),
            ("q", "quit"),
        ],
    };

    let mut spans = vec![mode, Span::raw(" ")];
    for (key, label) in pairs {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_name_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup_width = 44.min(area.width.saturating_sub(4));
    let popup_height = 5;
    // Tiny terminals get whatever part of the popup fits
    let popup_area = Rect::new(
        area.x + area.width.saturating_sub(popup_width) / 2,
        area.y + area.height.saturating_sub(popup_height) / 2,
        popup_width,
        popup_height,
    )
    .intersection(area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Your Name (Enter to save, Esc to cancel) ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    if inner.is_empty() {
        return;
    }

    // Hint, blank row, then the field; the field wins when rows run out
    let field_y = if inner.height >= 3 {
        let hint = Paragraph::new("Leave empty to appear as \"You\"")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, Rect::new(inner.x, inner.y, inner.width, 1));
        inner.y + 2
    } else {
        inner.bottom() - 1
    };

    let field = Rect::new(inner.x, field_y, inner.width, 1);
    frame.render_widget(
        Paragraph::new(app.name_input.as_str()).style(Style::default().fg(Color::Cyan)),
        field,
    );

    let cursor_x = u16::try_from(app.name_cursor)
        .unwrap_or(0)
        .min(field.width.saturating_sub(1));
    frame.set_cursor_position((field.x + cursor_x, field.y));
}
