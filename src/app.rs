pub mod audio;
pub mod navigation;
pub mod playlists;

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::api::{ApiClient, ApiError, PlaylistDetail, PlaylistId, PlaylistSummary};
use crate::audio::{AudioBackend, RodioBackend};
use crate::catalog::{SoundCatalog, SoundDescriptor, SoundId};
use crate::config::Config;
use crate::controller::{PlaybackController, PlaybackEvent, Selection};
use crate::playlists::{PlaylistComposer, PlaylistStore};
use crate::session::Session;

pub use navigation::ListLine;
pub use playlists::PlaylistRow;

const NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentView {
    Sounds,
    Playlists,
    Picker,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A transient message shown in the footer.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    pub expires: Instant,
}

pub struct App<B: AudioBackend = RodioBackend> {
    pub config: Config,
    pub session: Session,
    pub catalog: SoundCatalog,
    /// Catalog indices in the order the sound list shows them.
    pub order: Vec<usize>,
    pub store: Box<dyn PlaylistStore>,
    pub controller: Option<PlaybackController<B>>,
    pub user_playlists: Vec<PlaylistSummary>,
    pub view: CurrentView,
    pub quitting: bool,
    pub height: u16,

    // Sound list state
    pub cursor_pos: usize,
    pub list_scroll: usize,
    pub failed_sounds: HashSet<String>,
    pub muted: bool,
    pub previous_volume: Option<f32>,

    // Playlist view state
    pub playlist_cursor: usize,
    pub confirm_delete: Option<PlaylistId>,
    pub playlist_details: HashMap<PlaylistId, PlaylistDetail>,

    // Compose and picker state
    pub name_input: Option<String>,
    pub composer: Option<PlaylistComposer>,
    pub picker_sound: Option<SoundId>,
    pub picker_cursor: usize,

    pub notice: Option<Notice>,
}

impl App<RodioBackend> {
    pub fn new(config: Config) -> Result<Self> {
        let session = Session::load()?;
        let client = ApiClient::new(
            &config.general.server_url,
            config.general.session_cookie.clone(),
        )
        .with_context(|| format!("Invalid server URL '{}'", config.general.server_url))?;

        log::info!("Fetching sounds from {}", client.base_url());
        let (catalog, mut startup_error) = load_catalog(client.fetch_sounds());

        let controller = match RodioBackend::new(client.clone(), &config.audio) {
            Ok(backend) => Some(PlaybackController::new(
                backend,
                config.logged_in(),
                session.global_volume,
            )),
            Err(e) => {
                log::error!("Audio output unavailable: {:#}", e);
                if startup_error.is_none() {
                    startup_error = Some("No audio output device".to_string());
                }
                None
            }
        };

        if catalog.is_empty() {
            log::warn!("Starting with an empty sound catalog");
        }
        let mut app = Self::with_parts(config, session, catalog, Box::new(client), controller);
        app.reload_playlists();
        if let Some(text) = startup_error {
            app.notify(NoticeKind::Error, text);
        }
        Ok(app)
    }
}

/// Falls back to an empty catalog and an error notice when the fetch failed.
fn load_catalog(
    fetched: Result<Vec<SoundDescriptor>, ApiError>,
) -> (SoundCatalog, Option<String>) {
    match fetched {
        Ok(sounds) => {
            log::info!("Fetched {} sounds", sounds.len());
            (SoundCatalog::new(sounds), None)
        }
        Err(e) => {
            log::error!("Failed to load sounds: {}", e);
            (
                SoundCatalog::default(),
                Some(format!("Could not load sounds: {e}")),
            )
        }
    }
}

impl<B: AudioBackend> App<B> {
    pub fn with_parts(
        config: Config,
        session: Session,
        catalog: SoundCatalog,
        store: Box<dyn PlaylistStore>,
        mut controller: Option<PlaybackController<B>>,
    ) -> Self {
        if let Some(controller) = controller.as_mut() {
            controller.initialize(&catalog);
            for (name, &volume) in &session.sounds {
                controller.set_individual_volume(name, volume);
            }
        }

        Self {
            order: catalog.display_order(),
            muted: session.muted,
            previous_volume: session.previous_volume,
            config,
            session,
            catalog,
            store,
            controller,
            user_playlists: Vec::new(),
            view: CurrentView::Sounds,
            quitting: false,
            height: 24,
            cursor_pos: 0,
            list_scroll: 0,
            failed_sounds: HashSet::new(),
            playlist_cursor: 0,
            confirm_delete: None,
            playlist_details: HashMap::new(),
            name_input: None,
            composer: None,
            picker_sound: None,
            picker_cursor: 0,
            notice: None,
        }
    }

    /// Called every tick: applies finished starts and expires the notice.
    pub fn update(&mut self) {
        let events = match self.controller.as_mut() {
            Some(controller) => controller.poll(),
            None => Vec::new(),
        };

        for event in events {
            match event {
                PlaybackEvent::Started { sound } => {
                    self.failed_sounds.remove(&sound);
                }
                PlaybackEvent::Failed { sound, error } => {
                    log::error!("Failed to play sound '{}': {}", sound, error);
                    let label = self
                        .catalog
                        .by_name(&sound)
                        .map(|s| s.display_name.clone())
                        .unwrap_or_else(|| sound.clone());
                    self.failed_sounds.insert(sound);
                    self.notify(NoticeKind::Error, format!("Could not play {label}: {error}"));
                }
            }
        }

        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.expires <= Instant::now())
        {
            self.notice = None;
        }
    }

    pub fn notify(&mut self, kind: NoticeKind, text: impl Into<String>) {
        let text = text.into();
        match kind {
            NoticeKind::Error => log::warn!("{}", text),
            _ => log::debug!("{}", text),
        }
        self.notice = Some(Notice {
            text,
            kind,
            expires: Instant::now() + NOTICE_TTL,
        });
    }

    pub fn current_sound(&self) -> Option<&SoundDescriptor> {
        self.order
            .get(self.cursor_pos)
            .and_then(|&index| self.catalog.get(index))
    }

    pub fn global_volume(&self) -> f32 {
        self.controller
            .as_ref()
            .map(|c| c.global_volume())
            .unwrap_or(self.session.global_volume)
    }

    pub fn active_selection(&self) -> Option<Selection> {
        self.controller.as_ref().and_then(|c| c.active_selection())
    }

    pub fn is_playing(&self, name: &str) -> bool {
        self.controller.as_ref().is_some_and(|c| c.is_playing(name))
    }

    pub fn is_starting(&self, name: &str) -> bool {
        self.controller.as_ref().is_some_and(|c| c.is_starting(name))
    }

    pub fn playing_count(&self) -> usize {
        self.controller.as_ref().map_or(0, |c| c.playing_count())
    }

    pub fn selection_label(&self, selection: Selection) -> String {
        match selection {
            Selection::Random => "Random mix".to_string(),
            Selection::Group(id) => self
                .config
                .group_name(id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Group {id}")),
            Selection::UserPlaylist(id) => self
                .user_playlists
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| format!("Playlist {id}")),
        }
    }

    pub fn save_session(&mut self) {
        if let Some(controller) = &self.controller {
            log::info!("Saving session, playing: {:?}", controller.playing_sounds());
        }
        self.session.global_volume = self.global_volume();
        self.session.muted = self.muted;
        self.session.previous_volume = self.previous_volume;
        if let Some(controller) = &self.controller {
            for sound in self.catalog.accessible() {
                if let Some(volume) = controller.individual_volume(&sound.name) {
                    self.session.sounds.insert(sound.name.clone(), volume);
                }
            }
        }
        if let Err(e) = self.session.save() {
            log::error!("Failed to save session: {:#}", e);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::api::PlaylistDetail;
    use crate::audio::fake::FakeBackend;
    use crate::catalog::descriptor;
    use crate::playlists::memory::MemoryStore;

    pub fn catalog() -> SoundCatalog {
        let mut rain = descriptor(1, "rain", false, &[1]);
        rain.category = Some("nature".into());
        let mut fire = descriptor(2, "fire", false, &[1, 2]);
        fire.category = Some("nature".into());
        let mut cafe = descriptor(3, "cafe", false, &[5]);
        cafe.category = Some("city".into());
        let mut wind = descriptor(4, "wind", false, &[1]);
        wind.category = Some("nature".into());
        let mut train = descriptor(5, "train", true, &[5]);
        train.category = Some("city".into());
        SoundCatalog::new(vec![rain, fire, cafe, wind, train])
    }

    pub fn logged_in_config() -> Config {
        let mut config = Config::default();
        config.general.session_cookie = Some("session=abc".to_string());
        config
    }

    pub fn app_with(store: MemoryStore) -> (App<FakeBackend>, FakeBackend) {
        let backend = FakeBackend::default();
        let config = logged_in_config();
        let controller = PlaybackController::new(backend.clone(), config.logged_in(), 1.0);
        let session = Session {
            global_volume: 1.0,
            ..Session::default()
        };
        let app = App::with_parts(config, session, catalog(), Box::new(store), Some(controller));
        (app, backend)
    }

    pub fn store_with(playlists: Vec<PlaylistDetail>) -> MemoryStore {
        let store = MemoryStore::default();
        *store.playlists.borrow_mut() = playlists;
        store
    }
}
