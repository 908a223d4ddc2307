use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use deepdive_core::{Connectivity, Dialog, OutputKind};
use crate::app::{App, DialogChoice};

/// Parse a line of text and convert **bold** markdown to styled spans
pub(crate) fn parse_markdown_line(text: &str, base: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c != '*' || chars.peek() != Some(&'*') {
            current_text.push(c);
            continue;
        }

        // Consume the second *
        chars.next();

        if !current_text.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut current_text), base));
        }

        // Find closing **
        let mut bold_text = String::new();
        let mut found_close = false;
        while let Some(c) = chars.next() {
            if c == '*' && chars.peek() == Some(&'*') {
                chars.next();
                found_close = true;
                break;
            }
            bold_text.push(c);
        }

        if found_close && !bold_text.is_empty() {
            spans.push(Span::styled(bold_text, base.add_modifier(Modifier::BOLD)));
        } else {
            // No closing **, treat as literal
            current_text.push_str("**");
            current_text.push_str(&bold_text);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::styled(current_text, base));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, output, mode selector, input, footer
    let [header_area, output_area, mode_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_output(app, frame, output_area);
    render_modes(app, frame, mode_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if let Dialog::Shown { prompt } = app.session.dialog() {
        let prompt = prompt.clone();
        render_dialog(app, frame, area, &prompt);
    }
}

fn connectivity_style(state: Connectivity) -> Style {
    match state {
        Connectivity::Checking => Style::default().bg(Color::Yellow).fg(Color::Black),
        Connectivity::Online => Style::default().bg(Color::Green).fg(Color::Black),
        Connectivity::Offline => Style::default().bg(Color::Red).fg(Color::White),
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let state = app.session.connectivity();

    let title = Line::from(vec![
        Span::styled(" deepdive ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(format!(" {} ", state.label()), connectivity_style(state).bold()),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_output(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and scroll calculations
    app.output_area = Some(area);
    app.output_height = area.height.saturating_sub(2);
    app.output_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Answer ");

    let output = app.session.output();
    let text = match output.kind {
        OutputKind::Idle => Text::from(Span::styled(
            "Ask a question below and press Enter...",
            Style::default().fg(Color::DarkGray),
        )),
        OutputKind::Thinking => {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            Text::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))
        }
        kind => {
            let base = match kind {
                OutputKind::Error => Style::default().fg(Color::Red),
                OutputKind::Offline => Style::default().fg(Color::Yellow),
                OutputKind::Clarify => Style::default().fg(Color::Magenta),
                OutputKind::Notice => Style::default().fg(Color::Gray),
                _ => Style::default(),
            };
            Text::from(
                output
                    .text
                    .lines()
                    .map(|line| parse_markdown_line(line, base))
                    .collect::<Vec<_>>(),
            )
        }
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.output_scroll, 0));

    frame.render_widget(paragraph, area);
}

fn render_modes(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(" Mode: ", Style::default().fg(Color::DarkGray))];

    for (i, mode) in app.modes.iter().enumerate() {
        let style = if i == app.mode_idx {
            Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", mode), style));
        spans.push(Span::raw(" "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.session.is_busy();
    let (border_color, title) = if busy {
        (Color::DarkGray, " Ask (waiting for answer) ")
    } else {
        (Color::Yellow, " Ask ")
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    // Cursor stays in the input unless the dialog has the keyboard
    if !app.session.dialog().is_shown() {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: &[(&str, &str)] = if app.session.dialog().is_shown() {
        &[(" y ", " yes "), (" n ", " no "), (" ←/→ ", " choose "), (" Enter ", " confirm ")]
    } else {
        &[
            (" Enter ", " send "),
            (" Tab ", " mode "),
            (" ↑/↓ ", " scroll "),
            (" ^R ", " recheck "),
            (" Esc ", " quit "),
        ]
    };

    let spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, label)| {
            [Span::styled(*key, key_style), Span::styled(*label, label_style)]
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_dialog(app: &App, frame: &mut Frame, area: Rect, prompt: &str) {
    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let text = Paragraph::new(prompt.to_string()).wrap(Wrap { trim: true });
    // Word-wrapped height inside the borders; spacer and buttons add two rows
    let prompt_lines = text.line_count(popup_width.saturating_sub(2)).max(1) as u16;
    let popup_height = (prompt_lines + 4).min(area.height.saturating_sub(2));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Dive deeper? ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [text_area, _, buttons_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(text, text_area);

    let selected = Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD);
    let unselected = Style::default().fg(Color::Gray);
    let (yes_style, no_style) = match app.dialog_choice {
        DialogChoice::Yes => (selected, unselected),
        DialogChoice::No => (unselected, selected),
    };

    let buttons = Paragraph::new(Line::from(vec![
        Span::styled(" Yes ", yes_style),
        Span::raw("   "),
        Span::styled(" No ", no_style),
    ]))
    .centered();
    frame.render_widget(buttons, buttons_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepdive_core::{Config, MockBackend, Response};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[test]
    fn test_markdown_bold() {
        let line = parse_markdown_line("the **capital** is Austin", Style::default());
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "capital");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_markdown_unclosed_is_literal() {
        let line = parse_markdown_line("2 ** 3", Style::default());
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "2 ** 3");
    }

    #[test]
    fn test_markdown_empty_line() {
        assert_eq!(parse_markdown_line("", Style::default()), Line::default());
    }

    fn rendered(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_long_dialog_prompt_is_fully_visible() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(&Config::new(), Arc::new(MockBackend::new()), tx);

        // Each word takes a row of its own, more rows than the length suggests
        let prompt = format!("{}closingwordclosing", "background-detail ".repeat(5));
        let dispatch = app.session.send_query("Why?").unwrap();
        app.apply_reply(dispatch, Ok(Response::needs_deeper(&prompt)));
        assert!(app.session.dialog().is_shown());

        let screen = rendered(&mut app, 40, 24);
        assert!(screen.contains("closingwordclosing"));
        assert!(screen.contains(" Yes "));
    }
}
