use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render_help(f: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(Span::styled(
            "⌨  Keyboard Shortcuts",
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Sounds View",
            Style::default().fg(Color::Green),
        )),
        Line::from("  j k / h l       Move / Jump category"),
        Line::from("  Enter / Space   Toggle sound"),
        Line::from("  + / -  0-9      Sound volume"),
        Line::from("  s               Stop all"),
        Line::from("  p               Add or remove from a playlist"),
        Line::from("  n               New playlist (then Space, w)"),
        Line::from(""),
        Line::from(Span::styled(
            "Playlists View",
            Style::default().fg(Color::Green),
        )),
        Line::from("  Enter           Play / stop group or playlist"),
        Line::from("  x               Stop its sounds only"),
        Line::from("  d d             Delete playlist"),
        Line::from("  r               Reload playlists"),
        Line::from(""),
        Line::from(Span::styled("General", Style::default().fg(Color::Green))),
        Line::from("  Tab             Switch Views"),
        Line::from("  < / >           Master Volume"),
        Line::from("  m               Mute Master"),
        Line::from("  ?               Toggle Help"),
        Line::from("  q               Quit"),
    ];

    let width = 60.min(area.width);
    let height = (help_text.len() as u16 + 2).min(area.height);

    let area = Rect::new(
        (area.width - width) / 2,
        (area.height - height) / 2,
        width,
        height,
    );

    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .style(Style::default().bg(Color::Black));
    let p = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left);

    f.render_widget(p, area);
}
