use crate::app::{App, CurrentView, NoticeKind};
use crate::audio::AudioBackend;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render_footer<B: AudioBackend>(f: &mut Frame, app: &App<B>, area: Rect) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(block, area);

    let inner_area = Rect::new(area.x, area.y + 1, area.width, 1);

    let mute_status = if app.muted {
        Span::styled(
            "🔇 MUTED",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw("🔊")
    };

    let global = app.global_volume();
    let mut left_content = vec![
        Span::raw(" "),
        mute_status,
        Span::raw("  Master "),
        Span::styled(super::volume_slider(global, 12), Style::default().fg(Color::Blue)),
        Span::raw(format!(" {:>3}%", (global * 100.0).round() as u32)),
    ];

    if let Some(selection) = app.active_selection() {
        left_content.push(Span::raw("  │  "));
        left_content.push(Span::styled(
            app.selection_label(selection),
            Style::default().fg(Color::Cyan),
        ));
        if let Some(controller) = &app.controller {
            let batch = controller.batch();
            if batch.pending() > 0 {
                left_content.push(Span::styled(
                    format!(" (starting {}/{})", batch.started, batch.requested),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
    }

    // A live notice replaces the key hints
    let right = match &app.notice {
        Some(notice) => {
            let color = match notice.kind {
                NoticeKind::Info => Color::Cyan,
                NoticeKind::Success => Color::Green,
                NoticeKind::Error => Color::Red,
            };
            Span::styled(notice.text.as_str(), Style::default().fg(color))
        }
        None => Span::styled(help_text(app), Style::default().fg(Color::DarkGray)),
    };

    let p_left = Paragraph::new(Line::from(left_content)).alignment(Alignment::Left);
    let p_right = Paragraph::new(right).alignment(Alignment::Right);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner_area);

    f.render_widget(p_left, chunks[0]);
    f.render_widget(p_right, chunks[1]);
}

fn help_text<B: AudioBackend>(app: &App<B>) -> &'static str {
    if app.name_input.is_some() {
        return "Enter: Confirm  Esc: Cancel";
    }
    if app.composer.is_some() {
        return "SPACE: Select  w: Save  Esc: Cancel";
    }
    match app.view {
        CurrentView::Playlists => "Enter: Play/Stop  x: Stop  n: New  d: Delete  Tab: Sounds",
        CurrentView::Picker => "Enter: Add  r: Remove  Esc: Back",
        _ => "Tab: Playlists  SPACE: Toggle  p: Add to playlist  ?: Help  q: Quit",
    }
}
