mod api;
mod app;
mod audio;
mod catalog;
mod config;
mod controller;
mod playlists;
mod session;
mod ui;

use anyhow::Result;
use app::{App, CurrentView};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::LevelFilter;
use ratatui::{backend::CrosstermBackend, Terminal};
use simplelog::WriteLogger;
use std::fs::File;
use std::io;
use std::time::Duration;

use std::panic;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging to murmur.log
    #[arg(short, long)]
    debug: bool,

    /// Server to fetch sounds and playlists from (overrides config.toml)
    #[arg(short, long)]
    server: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        let _ = WriteLogger::init(
            LevelFilter::Debug,
            simplelog::Config::default(),
            File::create("murmur.log")?,
        );
        log::info!("Starting murmur in debug mode");
    }

    let mut config = config::Config::load()?;
    if let Some(server) = args.server {
        config.general.server_url = server;
    }

    // Register panic hook to restore terminal and log panic
    panic::set_hook(Box::new(|info| {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, crossterm::cursor::Show);

        let msg = match info.payload().downcast_ref::<&str>() {
            Some(s) => *s,
            None => match info.payload().downcast_ref::<String>() {
                Some(s) => &s[..],
                None => "Box<Any>",
            },
        };

        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let log_msg = format!("PANIC: '{}' at {}", msg, location);
        log::error!("{}", log_msg);
        eprintln!("{}", log_msg);
    }));

    // Loading the catalog hits the network, do it before taking over the terminal
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{:?}", err);
    }

    app.save_session();

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(30);

    loop {
        let now = std::time::Instant::now();
        app.update();

        let size = terminal.size()?;
        app.height = size.height;

        terminal.draw(|f| ui::ui(f, app))?;

        let timeout = tick_rate.saturating_sub(now.elapsed());
        if event::poll(timeout)? {
            loop {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        handle_key(app, key);
                    }
                }

                if app.quitting {
                    return Ok(());
                }

                // Check if there are more events to process immediately
                if !event::poll(Duration::from_millis(0))? {
                    break;
                }
            }
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quitting = true;
        return;
    }

    if app.view == CurrentView::Help {
        if key.code == KeyCode::Char('q') {
            app.quitting = true;
        }
        app.view = CurrentView::Sounds;
        return;
    }

    if let Some(input) = app.name_input.as_mut() {
        match key.code {
            KeyCode::Enter => app.confirm_name(),
            KeyCode::Esc => app.cancel_compose(),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) => input.push(c),
            _ => {}
        }
        return;
    }

    if app.view == CurrentView::Picker {
        handle_picker_keys(app, key.code);
        return;
    }

    if key.code != KeyCode::Char('d') {
        app.confirm_delete = None;
    }

    match key.code {
        KeyCode::Char('q') => app.quitting = true,
        KeyCode::Esc => {
            if app.composer.is_some() {
                app.cancel_compose();
            } else {
                app.quitting = true;
            }
        }
        KeyCode::Tab => {
            app.view = match app.view {
                CurrentView::Sounds => CurrentView::Playlists,
                _ => CurrentView::Sounds,
            };
        }
        KeyCode::Char('?') => app.view = CurrentView::Help,
        KeyCode::Char('m') => app.toggle_mute(),
        KeyCode::Char('<') | KeyCode::Char(',') => app.adjust_master_volume(-0.1),
        KeyCode::Char('>') | KeyCode::Char('.') => app.adjust_master_volume(0.1),
        KeyCode::Char('n') => app.start_compose(),
        KeyCode::Char('w') if app.composer.is_some() => app.commit_compose(),
        _ => match app.view {
            CurrentView::Sounds => handle_sounds_keys(app, key.code),
            CurrentView::Playlists => handle_playlists_keys(app, key.code),
            _ => {}
        },
    }
}

fn handle_sounds_keys(app: &mut App, code: KeyCode) {
    match code {
        // Navigation
        KeyCode::Up | KeyCode::Char('k') => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_down(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_category(),
        KeyCode::Right | KeyCode::Char('l') => app.next_category(),

        // Sound Control
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_current_sound(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_current_volume(0.1),
        KeyCode::Char('-') | KeyCode::Char('_') => app.adjust_current_volume(-0.1),

        // Quick Volume
        KeyCode::Char(c) if c.is_ascii_digit() => {
            if let Some(d) = c.to_digit(10) {
                let vol = if d == 0 { 1.0 } else { d as f32 / 10.0 };
                app.set_current_volume(vol);
            }
        }

        KeyCode::Char('s') => app.stop_all(),
        KeyCode::Char('p') => app.open_picker(),

        _ => {}
    }
}

fn handle_playlists_keys(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => app.move_playlist_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_playlist_cursor(1),
        KeyCode::Enter | KeyCode::Char(' ') => app.activate_selected(),
        KeyCode::Char('x') => app.stop_selected(),
        KeyCode::Char('s') => app.stop_all(),
        KeyCode::Char('d') => app.delete_selected(),
        KeyCode::Char('r') => app.reload_playlists(),
        _ => {}
    }
}

fn handle_picker_keys(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => app.move_picker_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_picker_cursor(1),
        KeyCode::Enter | KeyCode::Char('a') => app.picker_add(),
        KeyCode::Char('r') => app.picker_remove(),
        KeyCode::Esc | KeyCode::Char('q') => app.close_picker(),
        _ => {}
    }
}
