use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, InputMode, Popup};
use crate::backend::BackendMode;
use crate::state::ChatRole;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    match app.popup {
        Popup::ModePicker => render_mode_picker(app, frame, area),
        Popup::ModelPicker => render_model_picker(app, frame, area),
        Popup::ServerAddress => render_address_editor(app, frame, area),
        Popup::None => {}
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" 💨 ProutGPT ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            "Le chat bot le plus con du monde! ",
            Style::default().fg(Color::Gray),
        ),
    ];

    if let Some(count) = app.controller.visitor_display() {
        spans.push(Span::styled(
            format!("[{count} visites] "),
            Style::default().fg(Color::DarkGray),
        ));
    }

    spans.push(Span::styled(
        format!("v{}", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::DarkGray),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area for mouse hit-testing and scroll math (inner size minus borders)
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let backend = app.controller.backend();
    let title = match backend.mode() {
        BackendMode::Hosted => format!(" Hébergé : {} ", backend.model_id()),
        BackendMode::Local => format!(" {} : {} ", backend.server_address(), backend.model_id()),
    };

    let border_color = if app.input_mode == InputMode::Normal && app.popup == Popup::None {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let mut lines: Vec<Line> = Vec::new();

    for msg in app.controller.conversation().turns() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "Toi:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "💨 ProutGPT:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
            }
        }
        // Content is shown verbatim, line by line
        for line in msg.content.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::default());
    }

    if app.controller.is_busy() {
        lines.push(Line::from(Span::styled(
            "💨 ProutGPT:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("ProutGPT réfléchit{dots}"),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // Count rows with the same wrapping the view uses, then settle the offset
    let text = Text::from(lines);
    let total = Paragraph::new(text.clone())
        .wrap(Wrap { trim: false })
        .line_count(app.chat_width);
    let total = u16::try_from(total).unwrap_or(u16::MAX);
    app.clamp_chat_scroll(total.saturating_sub(app.chat_height));

    let chat = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing && app.popup == Popup::None;
    let border_color = if app.controller.is_busy() {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };

    let send_hint = if app.controller.can_submit() {
        Span::styled(" Entrée pour envoyer ", Style::default().fg(Color::Green))
    } else {
        Span::styled(" Entrée pour envoyer ", Style::default().fg(Color::DarkGray))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ")
        .title_bottom(Line::from(send_hint).right_aligned());

    // Horizontal scrolling keeps the cursor visible (inner width = width - borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = app.controller.input();
    let paragraph = if input.is_empty() {
        Paragraph::new(Span::styled(
            "Écris ton message... 💬",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let visible_text: String = input.chars().skip(scroll_offset).take(inner_width).collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(paragraph.block(block), area);

    if editing && !app.controller.is_busy() {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" SAISIE ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let hints = match (&app.status, app.input_mode) {
        (Some(status), _) => Span::styled(format!(" {status}"), Style::default().fg(Color::Magenta)),
        (None, InputMode::Editing) => Span::styled(
            " Esc: commandes  Entrée: envoyer  Ctrl-C: quitter",
            Style::default().fg(Color::DarkGray),
        ),
        (None, InputMode::Normal) => Span::styled(
            " i: écrire  b: backend  m: modèle  s: serveur  r: rafraîchir  j/k: défiler  q: quitter",
            Style::default().fg(Color::DarkGray),
        ),
    };

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(mode_text, mode_style.add_modifier(Modifier::BOLD)),
        hints,
    ]));
    frame.render_widget(footer, area);
}

/// Centered rectangle for popups, clamped to the frame
fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn picker_list<'a>(items: Vec<ListItem<'a>>, title: &'a str) -> List<'a> {
    List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ")
}

fn render_mode_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let modes = BackendMode::all();
    let popup = popup_area(area, 40, modes.len() as u16 + 2);
    frame.render_widget(Clear, popup);

    let current = app.controller.backend().mode();
    let items: Vec<ListItem> = modes
        .iter()
        .map(|mode| {
            let is_current = *mode == current;
            let prefix = if is_current { "* " } else { "  " };
            let style = if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{}", prefix, mode.display_name())).style(style)
        })
        .collect();

    let list = picker_list(items, " Backend ");
    frame.render_stateful_widget(list, popup, &mut app.mode_picker_state);
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let backend = app.controller.backend();
    let models = backend.active_models();
    let popup = popup_area(area, 50, models.len() as u16 + 2);
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = models
        .iter()
        .map(|model| {
            let style = if model == backend.model_id() {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {model} ")).style(style)
        })
        .collect();

    let list = picker_list(items, " Modèle (Entrée pour choisir, Esc pour annuler) ");
    frame.render_stateful_widget(list, popup, &mut app.model_picker_state);
}

fn render_address_editor(app: &App, frame: &mut Frame, area: Rect) {
    let popup = popup_area(area, 60, 5);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Adresse du serveur Ollama ");

    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let help = Paragraph::new("Entrée pour valider, Esc pour annuler")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let width = input_area.width as usize;
    let offset = app.address_cursor.saturating_sub(width.saturating_sub(1));
    let visible: String = app.address_input.chars().skip(offset).take(width).collect();
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan)),
        input_area,
    );

    let cursor_x = (app.address_cursor - offset) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
}
