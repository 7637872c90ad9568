use crate::app::{App, PlaylistRow};
use crate::audio::AudioBackend;
use crate::playlists::icon_label;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render_playlists<B: AudioBackend>(f: &mut Frame, app: &App<B>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let status = match app.active_selection() {
        Some(selection) => format!(
            "Now playing: {} ({} sounds)",
            app.selection_label(selection),
            app.playing_count()
        ),
        None if app.config.logged_in() => {
            "Press Enter to play a mix, 'n' to create a playlist".to_string()
        }
        None => "Playing as guest: set session_cookie in config.toml for playlists".to_string(),
    };
    let p_status = Paragraph::new(status)
        .block(Block::default().borders(Borders::ALL).title("Mixes"))
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(p_status, chunks[0]);

    let rows = app.playlist_rows();
    let list_height = chunks[1].height.saturating_sub(2) as usize; // Subtract borders
    let offset = super::list_offset(app.playlist_cursor, list_height);
    let active = app.active_selection();

    let mut list_items = Vec::new();
    for (i, row) in rows.iter().enumerate().skip(offset).take(list_height) {
        let is_selected = i == app.playlist_cursor;
        let is_active = active == Some(row.selection());
        let style = if is_selected {
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else if is_active {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        };

        let prefix = if is_selected { "> " } else { "  " };
        let marker = if is_active { "▶ " } else { "  " };

        let detail = match row {
            PlaylistRow::Random => "3-5 random sounds".to_string(),
            PlaylistRow::Group(_) => "group".to_string(),
            PlaylistRow::User(id) => app
                .user_playlists
                .iter()
                .find(|p| p.id == *id)
                .map(|p| format!("{} sounds · {}", p.sound_count, icon_label(p.icon.as_deref())))
                .unwrap_or_default(),
        };
        let pending_delete = matches!(row, PlaylistRow::User(id) if app.confirm_delete == Some(*id));

        let mut line = vec![
            Span::styled(prefix, style),
            Span::styled(marker, Style::default().fg(Color::Cyan)),
            Span::styled(format!("{} ", app.selection_label(row.selection())), style),
            Span::styled(format!("({})", detail), Style::default().fg(Color::DarkGray)),
        ];
        if pending_delete {
            line.push(Span::styled(
                "  press d to delete",
                Style::default().fg(Color::Red),
            ));
        }
        list_items.push(Line::from(line));
    }

    let p_list = Paragraph::new(list_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Groups & Playlists"),
    );
    f.render_widget(p_list, chunks[1]);
}
