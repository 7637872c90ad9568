use super::{App, NoticeKind};
use crate::audio::AudioBackend;
use crate::controller::Toggle;

const DEFAULT_UNMUTE_VOLUME: f32 = 0.5;

impl<B: AudioBackend> App<B> {
    /// Space on a sound: picks it for the playlist being composed, otherwise
    /// starts or stops it.
    pub fn toggle_current_sound(&mut self) {
        let Some(sound) = self.current_sound() else {
            return;
        };
        let (id, name, label, locked) = (
            sound.id,
            sound.name.clone(),
            sound.display_name.clone(),
            !sound.user_can_access,
        );

        if let Some(composer) = self.composer.as_mut() {
            composer.toggle(id);
            return;
        }

        let Some(controller) = self.controller.as_mut() else {
            self.notify(NoticeKind::Error, "No audio output device");
            return;
        };

        match controller.toggle_sound(&name) {
            Some(Toggle::Starting) => {
                self.failed_sounds.remove(&name);
            }
            Some(Toggle::Stopped) => {}
            None if locked => {
                self.notify(NoticeKind::Info, format!("{label} is a premium sound"));
            }
            None => {
                self.notify(NoticeKind::Error, format!("{label} is unavailable"));
            }
        }
    }

    pub fn current_volume(&self) -> Option<f32> {
        let sound = self.current_sound()?;
        let individual = self
            .controller
            .as_ref()
            .and_then(|c| c.individual_volume(&sound.name));
        Some(individual.unwrap_or_else(|| sound.default_volume()))
    }

    pub fn set_current_volume(&mut self, volume: f32) {
        let Some(name) = self.current_sound().map(|s| s.name.clone()) else {
            return;
        };
        if let Some(controller) = self.controller.as_mut() {
            controller.set_individual_volume(&name, volume);
        }
    }

    pub fn adjust_current_volume(&mut self, delta: f32) {
        if let Some(volume) = self.current_volume() {
            self.set_current_volume(volume + delta);
        }
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.session.global_volume = volume.clamp(0.0, 1.0);
        if let Some(controller) = self.controller.as_mut() {
            controller.set_global_volume(self.session.global_volume);
        }
    }

    pub fn adjust_master_volume(&mut self, delta: f32) {
        if self.muted {
            self.muted = false;
        }
        self.set_master_volume(self.global_volume() + delta);
    }

    pub fn toggle_mute(&mut self) {
        if self.muted {
            self.muted = false;
            self.set_master_volume(self.previous_volume.unwrap_or(DEFAULT_UNMUTE_VOLUME));
        } else {
            self.muted = true;
            self.previous_volume = Some(self.global_volume());
            self.set_master_volume(0.0);
        }
    }

    pub fn stop_all(&mut self) {
        let stopped = self.controller.as_mut().map_or(0, |c| c.stop_all());
        if stopped > 0 {
            self.notify(NoticeKind::Info, format!("Stopped {stopped} sounds"));
        }
    }
}
