use crate::app::{App, CurrentView};
use crate::audio::AudioBackend;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

pub fn render_header<B: AudioBackend>(f: &mut Frame, app: &App<B>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(20),
            Constraint::Min(0),
            Constraint::Length(24),
        ])
        .split(area);

    // Left: Title
    let title = Span::styled(
        "♫ murmur ",
        Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD),
    );
    let p_title = Paragraph::new(title).alignment(Alignment::Left);
    f.render_widget(p_title, chunks[0]);

    // Center: Tabs, or the name prompt while composing
    if let Some(input) = &app.name_input {
        let p = Paragraph::new(format!("New playlist name: {}_", input))
            .style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::NONE));
        f.render_widget(p, chunks[1]);
    } else if let Some(composer) = &app.composer {
        let p = Paragraph::new(format!(
            "Composing \"{}\": {} selected  (w save, Esc cancel)",
            composer.name(),
            composer.count()
        ))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
        f.render_widget(p, chunks[1]);
    } else {
        let selected_tab = match app.view {
            CurrentView::Sounds | CurrentView::Picker | CurrentView::Help => 0,
            CurrentView::Playlists => 1,
        };

        let tabs = Tabs::new(vec![" Sounds ", " Playlists "])
            .block(Block::default().borders(Borders::NONE))
            .select(selected_tab)
            .style(Style::default().fg(Color::DarkGray))
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )
            .divider(Span::raw("|"));

        f.render_widget(tabs, chunks[1]);
    }

    // Right: Status
    let active_count = app.playing_count();
    let mut right_spans = vec![];

    if active_count > 0 {
        right_spans.push(Span::styled(
            format!(" ▶ {} ", active_count),
            Style::default().bg(Color::Green).fg(Color::White),
        ));
        right_spans.push(Span::raw("  "));
    }
    if !app.config.logged_in() {
        right_spans.push(Span::styled("guest ", Style::default().fg(Color::Yellow)));
    }
    right_spans.push(Span::styled("? help", Style::default().fg(Color::DarkGray)));

    let p_right = Paragraph::new(Line::from(right_spans)).alignment(Alignment::Right);
    f.render_widget(p_right, chunks[2]);
}
