use super::{App, CurrentView, NoticeKind};
use crate::api::{PlaylistDetail, PlaylistId};
use crate::audio::AudioBackend;
use crate::catalog::GroupId;
use crate::controller::{Activation, Selection};
use crate::playlists::{load_user_playlists, PlaylistComposer};

/// A row of the playlists view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistRow {
    Random,
    Group(GroupId),
    User(PlaylistId),
}

impl PlaylistRow {
    pub fn selection(self) -> Selection {
        match self {
            PlaylistRow::Random => Selection::Random,
            PlaylistRow::Group(id) => Selection::Group(id),
            PlaylistRow::User(id) => Selection::UserPlaylist(id),
        }
    }
}

impl<B: AudioBackend> App<B> {
    pub fn playlist_rows(&self) -> Vec<PlaylistRow> {
        let mut rows = vec![PlaylistRow::Random];
        rows.extend(self.config.groups.iter().map(|g| PlaylistRow::Group(g.id)));
        rows.extend(self.user_playlists.iter().map(|p| PlaylistRow::User(p.id)));
        rows
    }

    pub fn selected_row(&self) -> Option<PlaylistRow> {
        self.playlist_rows().get(self.playlist_cursor).copied()
    }

    pub fn reload_playlists(&mut self) {
        match load_user_playlists(self.store.as_ref()) {
            Ok(playlists) => {
                self.user_playlists = playlists;
                self.playlist_details.clear();
            }
            Err(e) => {
                log::error!("Error loading playlists: {}", e);
                self.notify(NoticeKind::Error, format!("Could not load playlists: {e}"));
            }
        }
        let rows = self.playlist_rows().len();
        self.playlist_cursor = self.playlist_cursor.min(rows.saturating_sub(1));
        self.picker_cursor = self
            .picker_cursor
            .min(self.user_playlists.len().saturating_sub(1));
    }

    fn playlist_detail(&mut self, id: PlaylistId) -> Option<PlaylistDetail> {
        if let Some(detail) = self.playlist_details.get(&id) {
            return Some(detail.clone());
        }
        match self.store.detail(id) {
            Ok(detail) => {
                self.playlist_details.insert(id, detail.clone());
                Some(detail)
            }
            Err(e) => {
                log::error!("Error loading playlist {}: {}", id, e);
                self.notify(NoticeKind::Error, e.to_string());
                None
            }
        }
    }

    fn report_activation(&mut self, selection: Selection, activation: Activation) {
        let label = self.selection_label(selection);
        match activation {
            Activation::Deactivated => {
                self.notify(NoticeKind::Info, format!("Stopped {label}"));
            }
            Activation::Started { requested: 0 } => {
                self.notify(NoticeKind::Info, format!("No sounds available in {label}"));
            }
            Activation::Started { requested } => {
                self.notify(
                    NoticeKind::Success,
                    format!("Playing {label} ({requested} sounds)"),
                );
            }
        }
    }

    /// Enter on a playlist row: switches to that selection, or off when it is
    /// already the active one.
    pub fn activate_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        if self.controller.is_none() {
            self.notify(NoticeKind::Error, "No audio output device");
            return;
        }
        let selection = row.selection();

        let activation = match row {
            PlaylistRow::Random => self
                .controller
                .as_mut()
                .map(|c| c.activate_random(&mut rand::rng())),
            PlaylistRow::Group(id) => self.controller.as_mut().map(|c| c.activate_group(id)),
            PlaylistRow::User(id) => {
                if self.active_selection() == Some(selection) {
                    self.controller.as_mut().map(|c| {
                        c.stop_all();
                        Activation::Deactivated
                    })
                } else {
                    let Some(detail) = self.playlist_detail(id) else {
                        return;
                    };
                    match self.controller.as_mut().map(|c| c.activate_user_playlist(&detail)) {
                        Some(Ok(activation)) => Some(activation),
                        Some(Err(e)) => {
                            self.notify(NoticeKind::Error, e.to_string());
                            return;
                        }
                        None => None,
                    }
                }
            }
        };

        if let Some(activation) = activation {
            self.report_activation(selection, activation);
        }
    }

    /// Stops only the sounds belonging to the highlighted row.
    pub fn stop_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let stopped = match row {
            PlaylistRow::Random => {
                if self.active_selection() == Some(Selection::Random) {
                    self.controller.as_mut().map_or(0, |c| c.stop_all())
                } else {
                    0
                }
            }
            PlaylistRow::Group(id) => self.controller.as_mut().map_or(0, |c| c.stop_group(id)),
            PlaylistRow::User(id) => {
                let Some(detail) = self.playlist_detail(id) else {
                    return;
                };
                self.controller
                    .as_mut()
                    .map_or(0, |c| c.stop_user_playlist(&detail))
            }
        };
        let label = self.selection_label(row.selection());
        self.notify(NoticeKind::Info, format!("Stopped {stopped} sounds from {label}"));
    }

    /// Deleting takes two presses of the same key on the same playlist.
    pub fn delete_selected(&mut self) {
        let Some(PlaylistRow::User(id)) = self.selected_row() else {
            self.confirm_delete = None;
            self.notify(NoticeKind::Info, "Only your own playlists can be deleted");
            return;
        };
        let name = self.selection_label(Selection::UserPlaylist(id));

        if self.confirm_delete != Some(id) {
            self.confirm_delete = Some(id);
            self.notify(
                NoticeKind::Info,
                format!("Press d again to delete \"{name}\""),
            );
            return;
        }
        self.confirm_delete = None;

        match self.store.delete(id) {
            Ok(message) => {
                log::info!("Deleted playlist {} ({})", id, name);
                if self.active_selection() == Some(Selection::UserPlaylist(id)) {
                    if let Some(controller) = self.controller.as_mut() {
                        controller.stop_all();
                    }
                }
                self.reload_playlists();
                self.notify(NoticeKind::Success, message);
            }
            Err(e) => {
                log::error!("Error deleting playlist {}: {}", id, e);
                self.notify(NoticeKind::Error, e.to_string());
            }
        }
    }

    pub fn start_compose(&mut self) {
        if !self.config.logged_in() {
            self.notify(NoticeKind::Error, "Log in to create playlists");
            return;
        }
        self.view = CurrentView::Sounds;
        self.composer = None;
        self.name_input = Some(String::new());
    }

    pub fn confirm_name(&mut self) {
        let Some(name) = self.name_input.take() else {
            return;
        };
        let composer = PlaylistComposer::new(&name);
        if composer.name().is_empty() {
            self.name_input = Some(name);
            self.notify(NoticeKind::Error, "Please enter a playlist name");
            return;
        }
        self.notify(
            NoticeKind::Info,
            format!(
                "Select sounds for \"{}\" with space, then press w to save",
                composer.name()
            ),
        );
        self.composer = Some(composer);
    }

    pub fn cancel_compose(&mut self) {
        self.name_input = None;
        if self.composer.take().is_some() {
            self.notify(NoticeKind::Info, "Playlist creation cancelled");
        }
    }

    pub fn commit_compose(&mut self) {
        let Some(composer) = self.composer.as_ref() else {
            return;
        };
        match composer.commit(self.store.as_ref(), &mut rand::rng()) {
            Ok(report) => {
                let summary = report.summary(composer.name());
                self.composer = None;
                self.reload_playlists();
                self.notify(NoticeKind::Success, summary);
            }
            Err(e) => {
                log::error!("Error creating playlist: {}", e);
                self.notify(NoticeKind::Error, e.to_string());
            }
        }
    }

    pub fn open_picker(&mut self) {
        let Some(sound) = self.current_sound().map(|s| s.id) else {
            return;
        };
        if !self.config.logged_in() {
            self.notify(NoticeKind::Error, "Log in to manage playlists");
            return;
        }
        if self.user_playlists.is_empty() {
            self.notify(NoticeKind::Info, "Create a playlist first (press n)");
            return;
        }
        self.picker_sound = Some(sound);
        self.picker_cursor = 0;
        self.view = CurrentView::Picker;
    }

    pub fn close_picker(&mut self) {
        self.picker_sound = None;
        self.view = CurrentView::Sounds;
    }

    pub fn picker_add(&mut self) {
        self.picker_apply(true);
    }

    pub fn picker_remove(&mut self) {
        self.picker_apply(false);
    }

    fn picker_apply(&mut self, add: bool) {
        let (Some(sound), Some(playlist)) = (
            self.picker_sound,
            self.user_playlists.get(self.picker_cursor).map(|p| p.id),
        ) else {
            return;
        };

        let result = if add {
            self.store.add_sound(playlist, sound)
        } else {
            self.store.remove_sound(playlist, sound)
        };
        match result {
            Ok(message) => {
                self.reload_playlists();
                self.notify(NoticeKind::Success, message);
                self.close_picker();
            }
            Err(e) => {
                log::error!("Error updating playlist {}: {}", playlist, e);
                self.notify(NoticeKind::Error, e.to_string());
            }
        }
    }
}
