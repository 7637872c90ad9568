use crate::app::{App, ListLine};
use crate::audio::AudioBackend;
use crate::catalog::SoundDescriptor;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const NAME_WIDTH: usize = 22;
const SLIDER_WIDTH: usize = 16;

pub fn render_list<B: AudioBackend>(f: &mut Frame, app: &App<B>, area: Rect) {
    if app.order.is_empty() {
        let p = Paragraph::new("No sounds available.\nCheck the server URL in config.toml.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::NONE));

        // Center vertically in the area
        let center_y = area.height / 2;
        let msg_area = Rect::new(area.x, area.y + center_y.saturating_sub(1), area.width, 2);

        f.render_widget(p, msg_area);
        return;
    }

    let lines: Vec<Line> = app
        .list_lines()
        .into_iter()
        .skip(app.list_scroll)
        .take(area.height as usize)
        .map(|line| match line {
            ListLine::Header(category) => Line::from(Span::styled(
                format!("─── {} ───", category),
                Style::default().fg(Color::DarkGray),
            )),
            ListLine::Blank => Line::from(""),
            ListLine::Sound(pos) => {
                match app.order.get(pos).and_then(|&i| app.catalog.get(i)) {
                    Some(sound) => sound_line(app, pos, sound),
                    None => Line::from(""),
                }
            }
        })
        .collect();

    let inner = Rect::new(
        area.x + 2,
        area.y,
        area.width.saturating_sub(4),
        area.height,
    );
    f.render_widget(Paragraph::new(lines), inner);
}

fn sound_line<'a, B: AudioBackend>(
    app: &'a App<B>,
    pos: usize,
    sound: &'a SoundDescriptor,
) -> Line<'a> {
    let selected = pos == app.cursor_pos;
    let playing = app.is_playing(&sound.name);
    let starting = app.is_starting(&sound.name);
    let failed = app.failed_sounds.contains(&sound.name);
    let locked = !sound.user_can_access;
    let unavailable = !locked
        && app
            .controller
            .as_ref()
            .is_some_and(|c| !c.has_handle(&sound.name));

    let (marker, marker_style) = if locked {
        ("🔒", Style::default().fg(Color::DarkGray))
    } else if failed || unavailable {
        ("✗ ", Style::default().fg(Color::Red))
    } else if playing {
        ("▶ ", Style::default().fg(Color::Green))
    } else if starting {
        ("… ", Style::default().fg(Color::Yellow))
    } else {
        ("  ", Style::default())
    };

    let picked = app
        .composer
        .as_ref()
        .map(|c| if c.is_selected(sound.id) { "[x] " } else { "[ ] " });

    let mut name_style = if locked {
        Style::default().fg(Color::DarkGray)
    } else if playing {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    if selected {
        name_style = name_style.fg(Color::Blue).add_modifier(Modifier::REVERSED);
    }

    let name: String = sound.display_name.chars().take(NAME_WIDTH).collect();
    let mut spans = vec![
        Span::raw(if selected { "> " } else { "  " }),
        Span::styled(marker, marker_style),
    ];
    if let Some(picked) = picked {
        spans.push(Span::styled(picked, Style::default().fg(Color::Yellow)));
    }
    spans.push(Span::styled(format!("{:<width$}", name, width = NAME_WIDTH), name_style));

    if locked {
        spans.push(Span::styled(" premium", Style::default().fg(Color::DarkGray)));
    } else if unavailable {
        spans.push(Span::styled(" unavailable", Style::default().fg(Color::Red)));
    } else {
        let volume = app
            .controller
            .as_ref()
            .and_then(|c| c.individual_volume(&sound.name))
            .unwrap_or_else(|| sound.default_volume());
        let slider_color = if failed {
            Color::Red
        } else if playing {
            Color::Green
        } else {
            Color::Blue
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            super::volume_slider(volume, SLIDER_WIDTH),
            Style::default().fg(slider_color),
        ));
        spans.push(Span::raw(format!(" {:>3}%", (volume * 100.0).round() as u32)));

        let effective = app
            .controller
            .as_ref()
            .filter(|_| playing)
            .and_then(|c| c.effective_volume(&sound.name));
        if let Some(effective) = effective {
            spans.push(Span::styled(
                format!("  → {:>3}%", (effective * 100.0).round() as u32),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    Line::from(spans)
}
