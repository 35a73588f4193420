use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppMode};
use crate::email::{Email, Folder, FolderFilter};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(size);

    render_title_bar(f, app, chunks[0]);

    if app.is_loading() {
        render_loading(f, chunks[1]);
    } else {
        render_main_content(f, app, chunks[1]);
    }

    render_status_bar(f, app, chunks[2]);

    if app.mode == AppMode::Help {
        render_help(f, size);
    }

    if let Some(email) = app.selection.email() {
        render_email_detail(f, app, email, size);
    }
}

fn render_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            "SecureMail UI Simulator",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled("View as: ", Style::default().fg(Color::Gray)),
        Span::styled(app.role.as_str(), Style::default().fg(Color::Yellow)),
        Span::styled("  (u to switch)", Style::default().fg(Color::DarkGray)),
    ]);

    let header = Paragraph::new(title).block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, area);
}

fn render_loading(f: &mut Frame, area: Rect) {
    let loading = Paragraph::new("Loading emails...")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let centered = centered_rect(50, 20, area);
    f.render_widget(loading, centered);
}

fn render_main_content(f: &mut Frame, app: &App, area: Rect) {
    let horizontal_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20), // Folder list
            Constraint::Percentage(80), // Search + email list
        ])
        .split(area);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(horizontal_chunks[1]);

    render_folder_list(f, app, horizontal_chunks[0]);
    render_search_bar(f, app, right_chunks[0]);
    render_email_list(f, app, right_chunks[1]);
}

fn render_folder_list(f: &mut Frame, app: &App, area: Rect) {
    let unread = app.unread_count();

    let items: Vec<ListItem> = FolderFilter::CHOICES
        .iter()
        .enumerate()
        .map(|(i, choice)| {
            let active = *choice == app.filter;
            let style = if active {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let mut spans = vec![
                Span::styled(format!("{} {}", i + 1, choice), style),
                Span::styled(
                    format!(" {}", app.folder_count(*choice)),
                    Style::default().fg(Color::DarkGray),
                ),
            ];
            if *choice == FolderFilter::Only(Folder::Inbox) && unread > 0 {
                spans.push(Span::styled(
                    format!(" ({})", unread),
                    Style::default().fg(Color::White).bg(Color::Red),
                ));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let folders = List::new(items).block(Block::default().title("Folders").borders(Borders::ALL));
    f.render_widget(folders, area);
}

fn render_search_bar(f: &mut Frame, app: &App, area: Rect) {
    let editing = app.mode == AppMode::Search;

    let text = if app.search.is_empty() && !editing {
        Span::styled("Search emails... (/)", Style::default().fg(Color::DarkGray))
    } else if editing {
        Span::raw(format!("{}_", app.search))
    } else {
        Span::raw(app.search.as_str())
    };

    let border_style = if editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let search = Paragraph::new(Line::from(text)).block(
        Block::default()
            .title("Search")
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    f.render_widget(search, area);
}

fn render_email_list(f: &mut Frame, app: &App, area: Rect) {
    let emails = app.visible_emails();
    let block = Block::default()
        .title(format!("Emails ({})", app.filter))
        .borders(Borders::ALL);

    if emails.is_empty() {
        let empty = Paragraph::new("No emails match your criteria.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = emails
        .iter()
        .map(|email| email_card(email, app))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.selected_email_idx);
    f.render_stateful_widget(list, area, &mut state);
}

fn email_card<'a>(email: &'a Email, app: &App) -> ListItem<'a> {
    let subject_style = if email.read {
        Style::default()
    } else {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    };

    let header = Line::from(vec![
        Span::styled(email.subject.as_str(), subject_style),
        Span::raw("  "),
        Span::styled(
            format_timestamp(&email.timestamp, &app.ui_config.date_format),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        folder_label(email.folder),
    ]);
    let sender = Line::from(Span::styled(
        email.sender.as_str(),
        Style::default().fg(Color::Gray),
    ));
    let preview = Line::from(Span::styled(
        format!("{}...", email.preview(app.ui_config.preview_length)),
        Style::default().fg(Color::DarkGray),
    ));

    ListItem::new(vec![header, sender, preview, Line::from("")])
}

fn folder_label(folder: Folder) -> Span<'static> {
    let color = match folder {
        Folder::Inbox => Color::Blue,
        Folder::Spam => Color::Red,
        Folder::Archived => Color::Gray,
    };
    Span::styled(
        format!("[{}]", folder.as_str().to_uppercase()),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

fn render_email_detail(f: &mut Frame, app: &App, email: &Email, area: Rect) {
    let area = centered_rect(80, 70, area);

    let spam_action = if email.folder == Folder::Spam {
        "[s] Not Spam"
    } else {
        "[s] Mark as Spam"
    };

    let mut text = vec![
        Line::from(Span::styled(
            email.subject.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("From: ", Style::default().fg(Color::Gray)),
            Span::raw(email.sender.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Date: ", Style::default().fg(Color::Gray)),
            Span::raw(format_timestamp(
                &email.timestamp,
                &app.ui_config.detail_date_format,
            )),
        ]),
        Line::from(vec![
            Span::styled("Folder: ", Style::default().fg(Color::Gray)),
            Span::raw(email.folder.as_str()),
        ]),
        Line::from(""),
    ];
    text.extend(email.content.lines().map(Line::from));
    text.push(Line::from(""));
    text.push(Line::from(vec![
        Span::styled("[a] Archive", Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(spam_action, Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled("[Esc] Close", Style::default().fg(Color::DarkGray)),
    ]));

    let detail = Paragraph::new(text)
        .block(Block::default().title("Email").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));

    f.render_widget(Clear, area);
    f.render_widget(detail, area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from("SecureMail Help"),
        Line::from(""),
        Line::from("List:"),
        Line::from("  1-4 / Tab - All, Inbox, Spam, Archived"),
        Line::from("  / - Search (Enter keeps, Esc clears)"),
        Line::from("  u - Switch role"),
        Line::from("  ↑/↓ j/k - Navigate emails"),
        Line::from("  Home/g End/G - First / last email"),
        Line::from("  Enter - Open email"),
        Line::from("  ? - Show/hide help"),
        Line::from("  q / Ctrl-c - Quit"),
        Line::from(""),
        Line::from("Email:"),
        Line::from("  a - Archive"),
        Line::from("  s - Mark as Spam / Not Spam"),
        Line::from("  ↑/↓ - Scroll"),
        Line::from("  Esc/q - Close"),
    ];

    let help = Paragraph::new(help_text).block(Block::default().title("Help").borders(Borders::ALL));

    let centered_area = centered_rect(60, 80, area);
    f.render_widget(Clear, centered_area);
    f.render_widget(help, centered_area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let text = if let Some(error) = &app.error_message {
        format!("ERROR: {}", error)
    } else if let Some(info) = &app.info_message {
        format!("INFO: {}", info)
    } else {
        format!(
            "Folder: {} | Emails: {} | Unread: {} | Mode: {:?}",
            app.filter,
            app.visible_emails().len(),
            app.unread_count(),
            app.mode
        )
    };

    let status = Paragraph::new(text).style(Style::default().bg(Color::Blue).fg(Color::White));
    f.render_widget(status, area);
}

/// Formats with `format`, falling back to a fixed layout when the configured
/// pattern is not a valid strftime string.
pub fn format_timestamp(ts: &NaiveDateTime, format: &str) -> String {
    let valid = !StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    let format = if valid { format } else { DEFAULT_DATE_FORMAT };
    ts.format(format).to_string()
}

// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
