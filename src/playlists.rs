use std::collections::BTreeSet;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::api::{ApiClient, ApiError, CreatedPlaylist, PlaylistDetail, PlaylistId, PlaylistSummary};
use crate::catalog::SoundId;

const PLAYLIST_ICONS: [&str; 6] = ["rain", "forest", "wave", "fire", "wind", "random"];
const DEFAULT_ICON: &str = "static/icons/add.png";

/// Server-side storage of user playlists.
pub trait PlaylistStore {
    fn list(&self) -> Result<Vec<PlaylistSummary>, ApiError>;
    fn detail(&self, id: PlaylistId) -> Result<PlaylistDetail, ApiError>;
    fn create(&self, name: &str, icon: &str) -> Result<CreatedPlaylist, ApiError>;
    fn add_sound(&self, id: PlaylistId, sound: SoundId) -> Result<String, ApiError>;
    fn remove_sound(&self, id: PlaylistId, sound: SoundId) -> Result<String, ApiError>;
    fn delete(&self, id: PlaylistId) -> Result<String, ApiError>;
}

impl PlaylistStore for ApiClient {
    fn list(&self) -> Result<Vec<PlaylistSummary>, ApiError> {
        self.fetch_playlists()
    }

    fn detail(&self, id: PlaylistId) -> Result<PlaylistDetail, ApiError> {
        self.fetch_playlist(id)
    }

    fn create(&self, name: &str, icon: &str) -> Result<CreatedPlaylist, ApiError> {
        self.create_playlist(name, icon)
    }

    fn add_sound(&self, id: PlaylistId, sound: SoundId) -> Result<String, ApiError> {
        ApiClient::add_sound(self, id, sound)
    }

    fn remove_sound(&self, id: PlaylistId, sound: SoundId) -> Result<String, ApiError> {
        ApiClient::remove_sound(self, id, sound)
    }

    fn delete(&self, id: PlaylistId) -> Result<String, ApiError> {
        self.delete_playlist(id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    #[error("Please enter a playlist name")]
    EmptyName,
    #[error("Select at least one sound before saving")]
    NoSounds,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Fetches the user's playlists, newest first. Anonymous users simply have
/// none.
pub fn load_user_playlists<S: PlaylistStore + ?Sized>(
    store: &S,
) -> Result<Vec<PlaylistSummary>, ApiError> {
    match store.list() {
        Ok(mut playlists) => {
            playlists.sort_by(|a, b| b.id.cmp(&a.id));
            log::info!("Loaded {} user playlists", playlists.len());
            Ok(playlists)
        }
        Err(e) if e.is_unauthorized() => {
            log::info!("User not authenticated for playlists");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

pub fn random_icon<R: Rng>(rng: &mut R) -> String {
    let icon = PLAYLIST_ICONS.choose(rng).copied().unwrap_or("random");
    format!("static/icons/{icon}.png")
}

/// Icon path relative to the server's static root, e.g. `icons/rain.png`.
pub fn icon_label(icon: Option<&str>) -> &str {
    let icon = icon.unwrap_or(DEFAULT_ICON);
    match icon.split_once("static/") {
        Some((_, rest)) => rest,
        None => icon,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeReport {
    pub playlist_id: PlaylistId,
    pub added: usize,
    pub failed: usize,
}

impl ComposeReport {
    pub fn summary(&self, name: &str) -> String {
        if self.failed == 0 {
            format!("Created \"{}\" with {} sounds", name, self.added)
        } else {
            format!(
                "Created \"{}\": added {}, failed {}",
                name, self.added, self.failed
            )
        }
    }
}

/// A new playlist being put together: a name and a set of selected sounds.
/// Nothing reaches the server until [`PlaylistComposer::commit`].
#[derive(Debug, Clone, Default)]
pub struct PlaylistComposer {
    name: String,
    selected: BTreeSet<SoundId>,
}

impl PlaylistComposer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            selected: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the sound is selected after the toggle.
    pub fn toggle(&mut self, sound: SoundId) -> bool {
        if self.selected.remove(&sound) {
            false
        } else {
            self.selected.insert(sound);
            true
        }
    }

    pub fn is_selected(&self, sound: SoundId) -> bool {
        self.selected.contains(&sound)
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn validate(&self) -> Result<(), PlaylistError> {
        if self.name.is_empty() {
            return Err(PlaylistError::EmptyName);
        }
        if self.selected.is_empty() {
            return Err(PlaylistError::NoSounds);
        }
        Ok(())
    }

    /// Creates the playlist and adds every selected sound. A sound that is
    /// already in the playlist is neither added nor a failure.
    pub fn commit<S: PlaylistStore + ?Sized, R: Rng>(
        &self,
        store: &S,
        rng: &mut R,
    ) -> Result<ComposeReport, PlaylistError> {
        self.validate()?;

        let icon = random_icon(rng);
        let created = store.create(&self.name, &icon)?;
        log::info!(
            "Created playlist '{}' ({}) with icon {}",
            created.name,
            created.id,
            icon
        );

        let mut report = ComposeReport {
            playlist_id: created.id,
            added: 0,
            failed: 0,
        };
        for &sound in &self.selected {
            match store.add_sound(created.id, sound) {
                Ok(_) => report.added += 1,
                Err(e) if e.message_contains("already in playlist") => {}
                Err(e) => {
                    log::error!("Error adding sound {} to playlist {}: {}", sound, created.id, e);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}
