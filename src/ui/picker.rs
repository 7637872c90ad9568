use crate::app::App;
use crate::audio::AudioBackend;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render_picker<B: AudioBackend>(f: &mut Frame, app: &App<B>, area: Rect) {
    let sound = app
        .picker_sound
        .and_then(|id| app.catalog.by_id(id))
        .map(|s| s.display_name.as_str())
        .unwrap_or("sound");

    let mut lines = vec![Line::from(Span::styled(
        format!("Add or remove {}", sound),
        Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD),
    ))];
    lines.push(Line::from(""));

    let width = 50.min(area.width);
    let height = (app.user_playlists.len() as u16 + 4).min(area.height);
    // Borders plus the title and blank lines
    let visible = height.saturating_sub(4) as usize;
    let offset = super::list_offset(app.picker_cursor, visible);

    for (i, playlist) in app
        .user_playlists
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
    {
        let is_selected = i == app.picker_cursor;
        let style = if is_selected {
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(if is_selected { "> " } else { "  " }, style),
            Span::styled(playlist.name.as_str(), style),
            Span::styled(
                format!(" ({} sounds)", playlist.sound_count),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    let area = Rect::new(
        (area.width - width) / 2,
        (area.height - height) / 2,
        width,
        height,
    );

    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Playlists")
        .style(Style::default().bg(Color::Black));
    f.render_widget(Paragraph::new(lines).block(block), area);
}
