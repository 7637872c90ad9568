pub mod footer;
pub mod header;
pub mod help;
pub mod main_view;
pub mod picker;
pub mod playlists;

use crate::app::{App, CurrentView};
use crate::audio::AudioBackend;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn ui<B: AudioBackend>(f: &mut Frame, app: &App<B>) {
    let size = f.area();

    if size.width < 60 || size.height < 16 {
        let p = Paragraph::new("Terminal Too Small")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(p, size);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Main Content
                Constraint::Length(3), // Footer
            ]
            .as_ref(),
        )
        .split(size);

    header::render_header(f, app, chunks[0]);

    match app.view {
        CurrentView::Sounds => main_view::render_list(f, app, chunks[1]),
        CurrentView::Playlists => playlists::render_playlists(f, app, chunks[1]),
        CurrentView::Picker => {
            main_view::render_list(f, app, chunks[1]);
            picker::render_picker(f, app, size);
        }
        CurrentView::Help => {
            main_view::render_list(f, app, chunks[1]);
            help::render_help(f, size);
        }
    }

    footer::render_footer(f, app, chunks[2]);
}

/// First row to draw so that `cursor` stays inside `visible` rows.
pub fn list_offset(cursor: usize, visible: usize) -> usize {
    if visible == 0 {
        return cursor;
    }
    (cursor + 1).saturating_sub(visible)
}

/// A `━━━●───` style slider for a volume in [0, 1].
pub fn volume_slider(volume: f32, width: usize) -> String {
    let knob_pos = if width > 0 {
        (volume.clamp(0.0, 1.0) * (width - 1) as f32).round() as usize
    } else {
        0
    };
    let mut slider = String::new();
    for i in 0..width {
        if i == knob_pos {
            slider.push('●');
        } else if i < knob_pos {
            slider.push('━');
        } else {
            slider.push('─');
        }
    }
    slider
}
