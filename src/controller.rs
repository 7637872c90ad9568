//! Playback state for every accessible sound, the global volume and the
//! single active selection (group, user playlist or random mix).
//!
//! Starts are asynchronous: a resource resolves its [`StartTicket`] whenever
//! playback actually begins, possibly after the user has already stopped the
//! sound again. [`PlaybackController::poll`] only applies a completion when
//! the handle is still waiting on that exact ticket.

use std::collections::{BTreeMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::api::{PlaylistDetail, PlaylistId};
use crate::audio::{AudioBackend, AudioResource, PlaybackError, StartCompletion, StartTicket};
use crate::catalog::{GroupId, SoundCatalog, SoundDescriptor};

const RANDOM_MIN: usize = 3;
const RANDOM_MAX: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    Group(GroupId),
    UserPlaylist(PlaylistId),
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Stopped,
    Starting { ticket: u64 },
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Stopped,
    Starting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The selection was already active and has been switched off.
    Deactivated,
    Started { requested: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActivationError {
    #[error("This playlist is empty. Add some sounds first!")]
    EmptyPlaylist,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Started { sound: String },
    Failed { sound: String, error: PlaybackError },
}

/// Progress of the most recent group/playlist/random activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStatus {
    pub requested: usize,
    pub started: usize,
    pub failed: usize,
    /// Members stopped before their start resolved.
    pub cancelled: usize,
}

impl BatchStatus {
    pub fn pending(&self) -> usize {
        self.requested
            .saturating_sub(self.started)
            .saturating_sub(self.failed)
            .saturating_sub(self.cancelled)
    }
}

struct PlaybackHandle<R> {
    descriptor: SoundDescriptor,
    resource: R,
    state: HandleState,
    individual_volume: f32,
}

impl<R: AudioResource> PlaybackHandle<R> {
    fn stop(&mut self) -> bool {
        if self.state == HandleState::Stopped {
            return false;
        }
        self.resource.pause();
        self.resource.rewind();
        self.state = HandleState::Stopped;
        true
    }
}

pub struct PlaybackController<B: AudioBackend> {
    backend: B,
    handles: BTreeMap<String, PlaybackHandle<B::Resource>>,
    global_volume: f32,
    active: Option<Selection>,
    logged_in: bool,
    initialized: bool,
    next_ticket: u64,
    batch: BatchStatus,
    batch_tickets: HashSet<u64>,
    tx: Sender<StartCompletion>,
    rx: Receiver<StartCompletion>,
}

impl<B: AudioBackend> PlaybackController<B> {
    pub fn new(backend: B, logged_in: bool, global_volume: f32) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            handles: BTreeMap::new(),
            global_volume: clamp_volume(global_volume),
            active: None,
            logged_in,
            initialized: false,
            next_ticket: 0,
            batch: BatchStatus::default(),
            batch_tickets: HashSet::new(),
            tx,
            rx,
        }
    }

    /// Creates one paused handle per accessible sound. A second call tears
    /// everything down first. Returns the number of handles created.
    pub fn initialize(&mut self, catalog: &SoundCatalog) -> usize {
        if self.initialized {
            log::warn!("Re-initializing playback, dropping {} handles", self.handles.len());
            self.stop_all();
            self.handles.clear();
            self.batch = BatchStatus::default();
            self.batch_tickets.clear();
        }
        self.initialized = true;

        for sound in catalog.accessible() {
            if self.handles.contains_key(&sound.name) {
                log::warn!("Duplicate sound name '{}' in catalog, skipping", sound.name);
                continue;
            }
            match self.backend.open(sound) {
                Ok(resource) => {
                    self.handles.insert(
                        sound.name.clone(),
                        PlaybackHandle {
                            descriptor: sound.clone(),
                            resource,
                            state: HandleState::Stopped,
                            individual_volume: sound.default_volume(),
                        },
                    );
                }
                Err(e) => log::error!("Failed to open sound '{}': {}", sound.name, e),
            }
        }

        log::info!(
            "Initialized {} of {} sounds",
            self.handles.len(),
            catalog.len()
        );
        self.handles.len()
    }

    pub fn toggle_sound(&mut self, name: &str) -> Option<Toggle> {
        let global = self.global_volume;
        let handle = self.handles.get_mut(name)?;

        if handle.state == HandleState::Stopped {
            let ticket = self.next_ticket;
            self.next_ticket += 1;
            handle.state = HandleState::Starting { ticket };
            let volume = handle.individual_volume * global;
            log::info!("Starting sound '{}' at {:.2}", name, volume);
            handle
                .resource
                .play(volume, StartTicket::new(name, ticket, self.tx.clone()));
            Some(Toggle::Starting)
        } else {
            log::info!("Stopping sound '{}'", name);
            handle.stop();
            Some(Toggle::Stopped)
        }
    }

    pub fn set_individual_volume(&mut self, name: &str, volume: f32) {
        let global = self.global_volume;
        if let Some(handle) = self.handles.get_mut(name) {
            handle.individual_volume = clamp_volume(volume);
            if handle.state == HandleState::Playing {
                handle.resource.set_volume(handle.individual_volume * global);
            }
        }
    }

    pub fn set_global_volume(&mut self, volume: f32) {
        self.global_volume = clamp_volume(volume);
        for handle in self.handles.values_mut() {
            if handle.state == HandleState::Playing {
                handle
                    .resource
                    .set_volume(handle.individual_volume * self.global_volume);
            }
        }
    }

    pub fn activate_group(&mut self, group_id: GroupId) -> Activation {
        let selection = Selection::Group(group_id);
        if self.toggle_off(selection) {
            return Activation::Deactivated;
        }
        self.stop_all();

        let logged_in = self.logged_in;
        let members: Vec<String> = self
            .handles
            .values()
            .filter(|h| h.descriptor.in_group(group_id) && h.descriptor.is_eligible(logged_in))
            .map(|h| h.descriptor.name.clone())
            .collect();

        log::info!("Activating group {} with {} sounds", group_id, members.len());
        self.start_batch(selection, &members)
    }

    pub fn activate_user_playlist(
        &mut self,
        playlist: &PlaylistDetail,
    ) -> Result<Activation, ActivationError> {
        let selection = Selection::UserPlaylist(playlist.id);
        if self.toggle_off(selection) {
            return Ok(Activation::Deactivated);
        }
        if playlist.sounds.is_empty() {
            return Err(ActivationError::EmptyPlaylist);
        }
        self.stop_all();

        let logged_in = self.logged_in;
        let members: Vec<String> = playlist
            .sounds
            .iter()
            .filter(|s| s.is_eligible(logged_in) && self.handles.contains_key(&s.name))
            .map(|s| s.name.clone())
            .collect();

        log::info!(
            "Activating playlist '{}' with {} of {} sounds",
            playlist.name,
            members.len(),
            playlist.sounds.len()
        );
        Ok(self.start_batch(selection, &members))
    }

    pub fn activate_random<R: Rng>(&mut self, rng: &mut R) -> Activation {
        if self.toggle_off(Selection::Random) {
            return Activation::Deactivated;
        }
        self.stop_all();

        let logged_in = self.logged_in;
        let mut pool: Vec<String> = self
            .handles
            .values()
            .filter(|h| h.descriptor.is_eligible(logged_in))
            .map(|h| h.descriptor.name.clone())
            .collect();

        let count = rng.random_range(RANDOM_MIN..=RANDOM_MAX).min(pool.len());
        pool.shuffle(rng);
        pool.truncate(count);

        log::info!("Activating random mix: {:?}", pool);
        self.start_batch(Selection::Random, &pool)
    }

    /// Stops every sound that is playing or starting and clears the selection.
    pub fn stop_all(&mut self) -> usize {
        let stopped = self
            .handles
            .values_mut()
            .map(|h| h.stop())
            .filter(|&stopped| stopped)
            .count();
        if stopped > 0 {
            log::info!("Stopped {} sounds", stopped);
        }
        self.active = None;
        stopped
    }

    pub fn stop_group(&mut self, group_id: GroupId) -> usize {
        let stopped = self
            .handles
            .values_mut()
            .filter(|h| h.descriptor.in_group(group_id))
            .map(|h| h.stop())
            .filter(|&stopped| stopped)
            .count();
        if self.active == Some(Selection::Group(group_id)) {
            self.active = None;
        }
        stopped
    }

    pub fn stop_user_playlist(&mut self, playlist: &PlaylistDetail) -> usize {
        let mut stopped = 0;
        for sound in &playlist.sounds {
            if let Some(handle) = self.handles.get_mut(&sound.name) {
                if handle.stop() {
                    stopped += 1;
                }
            }
        }
        if self.active == Some(Selection::UserPlaylist(playlist.id)) {
            self.active = None;
        }
        stopped
    }

    /// Applies start completions that arrived since the last call.
    pub fn poll(&mut self) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            if let Some(event) = self.apply_completion(completion) {
                events.push(event);
            }
        }
        events
    }

    fn apply_completion(&mut self, completion: StartCompletion) -> Option<PlaybackEvent> {
        let StartCompletion {
            sound,
            ticket,
            result,
        } = completion;
        let in_batch = self.batch_tickets.remove(&ticket);
        let global = self.global_volume;
        let Some(handle) = self.handles.get_mut(&sound) else {
            if in_batch {
                self.batch.cancelled += 1;
            }
            return None;
        };

        if handle.state != (HandleState::Starting { ticket }) {
            log::debug!("Ignoring stale start of '{}' (ticket {})", sound, ticket);
            if in_batch {
                self.batch.cancelled += 1;
            }
            if result.is_ok() && handle.state == HandleState::Stopped {
                handle.resource.pause();
                handle.resource.rewind();
            }
            return None;
        }

        match result {
            Ok(()) => {
                handle.state = HandleState::Playing;
                // Volume may have moved while the start was pending.
                handle
                    .resource
                    .set_volume(handle.individual_volume * global);
                if in_batch {
                    self.batch.started += 1;
                }
                Some(PlaybackEvent::Started { sound })
            }
            Err(error) => {
                log::error!("Failed to play sound '{}': {}", sound, error);
                handle.state = HandleState::Stopped;
                handle.resource.pause();
                if in_batch {
                    self.batch.failed += 1;
                }
                Some(PlaybackEvent::Failed { sound, error })
            }
        }
    }

    fn toggle_off(&mut self, selection: Selection) -> bool {
        if self.active == Some(selection) {
            log::info!("Deactivating {:?}", selection);
            self.stop_all();
            true
        } else {
            false
        }
    }

    fn start_batch(&mut self, selection: Selection, names: &[String]) -> Activation {
        let mut seen = HashSet::new();
        let names: Vec<&String> = names.iter().filter(|n| seen.insert(*n)).collect();
        self.batch = BatchStatus {
            requested: names.len(),
            ..BatchStatus::default()
        };
        self.batch_tickets.clear();

        for name in names.iter().copied() {
            let Some(handle) = self.handles.get_mut(name) else {
                continue;
            };
            handle.individual_volume = handle.descriptor.default_volume();
            let ticket = self.next_ticket;
            if self.toggle_sound(name) == Some(Toggle::Starting) {
                self.batch_tickets.insert(ticket);
            }
        }

        self.active = if names.is_empty() {
            None
        } else {
            Some(selection)
        };
        Activation::Started {
            requested: names.len(),
        }
    }

    pub fn active_selection(&self) -> Option<Selection> {
        self.active
    }

    pub fn global_volume(&self) -> f32 {
        self.global_volume
    }

    pub fn batch(&self) -> BatchStatus {
        self.batch
    }

    pub fn has_handle(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    pub fn state(&self, name: &str) -> Option<HandleState> {
        self.handles.get(name).map(|h| h.state)
    }

    pub fn is_playing(&self, name: &str) -> bool {
        self.state(name) == Some(HandleState::Playing)
    }

    pub fn is_starting(&self, name: &str) -> bool {
        matches!(self.state(name), Some(HandleState::Starting { .. }))
    }

    pub fn individual_volume(&self, name: &str) -> Option<f32> {
        self.handles.get(name).map(|h| h.individual_volume)
    }

    /// The volume a playing sound is heard at, or `None` when it is silent.
    pub fn effective_volume(&self, name: &str) -> Option<f32> {
        self.handles
            .get(name)
            .filter(|h| h.state == HandleState::Playing)
            .map(|h| h.individual_volume * self.global_volume)
    }

    pub fn playing_count(&self) -> usize {
        self.handles
            .values()
            .filter(|h| h.state == HandleState::Playing)
            .count()
    }

    pub fn playing_sounds(&self) -> Vec<&str> {
        self.handles
            .iter()
            .filter(|(_, h)| h.state == HandleState::Playing)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::fake::FakeBackend;
    use crate::catalog::descriptor;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn logged_in_catalog() -> SoundCatalog {
        let mut sounds = vec![
            descriptor(1, "rain", false, &[1, 2]),
            descriptor(2, "fire", false, &[1]),
            descriptor(3, "cafe", false, &[5]),
            descriptor(4, "train", false, &[5]),
            descriptor(5, "bird", true, &[1]),
            descriptor(6, "wind", false, &[1, 2]),
        ];
        for sound in &mut sounds {
            sound.user_can_access = true;
        }
        SoundCatalog::new(sounds)
    }

    fn controller(
        catalog: &SoundCatalog,
        logged_in: bool,
    ) -> (PlaybackController<FakeBackend>, FakeBackend) {
        let backend = FakeBackend::default();
        let mut controller = PlaybackController::new(backend.clone(), logged_in, 1.0);
        controller.initialize(catalog);
        (controller, backend)
    }

    fn playlist(id: PlaylistId, sounds: Vec<SoundDescriptor>) -> PlaylistDetail {
        PlaylistDetail {
            id,
            name: format!("playlist {id}"),
            icon: None,
            sounds,
        }
    }

    fn assert_close(actual: Option<f32>, expected: f32) {
        let actual = actual.expect("volume should be set");
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn only_accessible_sounds_get_handles() {
        let catalog = SoundCatalog::new(vec![
            descriptor(1, "rain", false, &[1]),
            descriptor(2, "fire", true, &[1]),
        ]);
        let (controller, backend) = controller(&catalog, false);

        assert!(controller.has_handle("rain"));
        assert!(!controller.has_handle("fire"));
        assert_eq!(backend.state.borrow().opened, vec!["rain"]);
        assert_eq!(controller.individual_volume("rain"), Some(0.5));
    }

    #[test]
    fn initialize_twice_does_not_duplicate_handles() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);
        controller.toggle_sound("rain");
        controller.poll();

        let count = controller.initialize(&catalog);

        assert_eq!(count, 6);
        assert!(!backend.is_unpaused("rain"));
        assert_eq!(controller.playing_count(), 0);
        assert_eq!(controller.active_selection(), None);
    }

    #[test]
    fn failing_open_skips_the_sound() {
        let catalog = logged_in_catalog();
        let backend = FakeBackend::default();
        backend
            .state
            .borrow_mut()
            .fail_open
            .insert("cafe".to_string());
        let mut controller = PlaybackController::new(backend, true, 1.0);

        assert_eq!(controller.initialize(&catalog), 5);
        assert_eq!(controller.toggle_sound("cafe"), None);
    }

    #[test]
    fn toggle_alternates_and_uses_effective_volume() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);
        controller.set_global_volume(0.5);
        controller.set_individual_volume("rain", 0.8);

        assert!(!controller.is_playing("rain"));
        assert_eq!(controller.toggle_sound("rain"), Some(Toggle::Starting));
        assert!(controller.is_starting("rain"));
        let events = controller.poll();
        assert_eq!(
            events,
            vec![PlaybackEvent::Started {
                sound: "rain".into()
            }]
        );
        assert!(controller.is_playing("rain"));
        assert_close(backend.volume("rain"), 0.4);
        assert_close(controller.effective_volume("rain"), 0.4);

        assert_eq!(controller.toggle_sound("rain"), Some(Toggle::Stopped));
        assert!(!controller.is_playing("rain"));
        assert!(!backend.is_unpaused("rain"));
        assert_eq!(backend.rewinds("rain"), 1);
        assert_eq!(controller.effective_volume("rain"), None);

        controller.toggle_sound("rain");
        controller.poll();
        assert!(controller.is_playing("rain"));
    }

    #[test]
    fn toggle_unknown_sound_is_noop() {
        let catalog = logged_in_catalog();
        let (mut controller, _) = controller(&catalog, true);
        assert_eq!(controller.toggle_sound("thunder"), None);
        assert!(controller.poll().is_empty());
    }

    #[test]
    fn failed_start_leaves_sound_stopped() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);
        backend.fail("fire");

        controller.toggle_sound("fire");
        let events = controller.poll();

        assert!(matches!(
            events.as_slice(),
            [PlaybackEvent::Failed { sound, .. }] if sound == "fire"
        ));
        assert!(!controller.is_playing("fire"));
        assert_eq!(controller.state("fire"), Some(HandleState::Stopped));
    }

    #[test]
    fn individual_volume_applies_live_only_when_playing() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);

        controller.set_individual_volume("rain", 0.3);
        assert_eq!(backend.volume("rain"), None);

        controller.toggle_sound("rain");
        controller.poll();
        controller.set_global_volume(0.5);
        assert_close(backend.volume("rain"), 0.15);

        controller.set_individual_volume("rain", 2.0);
        assert_eq!(controller.individual_volume("rain"), Some(1.0));
        assert_close(backend.volume("rain"), 0.5);
    }

    #[test]
    fn global_volume_rescales_playing_sounds_only() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);
        controller.set_individual_volume("rain", 0.4);
        controller.set_individual_volume("fire", 0.8);
        controller.set_individual_volume("cafe", 0.6);
        controller.toggle_sound("rain");
        controller.toggle_sound("fire");
        controller.poll();

        controller.set_global_volume(0.25);

        assert_close(backend.volume("rain"), 0.1);
        assert_close(backend.volume("fire"), 0.2);
        assert_eq!(backend.volume("cafe"), None);
        assert_eq!(controller.individual_volume("cafe"), Some(0.6));

        controller.set_global_volume(-3.0);
        assert_eq!(controller.global_volume(), 0.0);
    }

    #[test]
    fn group_excludes_premium_when_logged_out() {
        let mut fire = descriptor(2, "fire", true, &[1]);
        fire.user_can_access = true;
        let catalog = SoundCatalog::new(vec![descriptor(1, "rain", false, &[1]), fire]);
        let (mut controller, _) = controller(&catalog, false);

        let activation = controller.activate_group(1);
        controller.poll();

        assert_eq!(activation, Activation::Started { requested: 1 });
        assert_eq!(controller.playing_sounds(), vec!["rain"]);
        assert_eq!(controller.active_selection(), Some(Selection::Group(1)));
    }

    #[test]
    fn activating_active_group_turns_it_off() {
        let catalog = logged_in_catalog();
        let (mut controller, _) = controller(&catalog, true);
        controller.activate_group(1);
        controller.poll();
        assert_eq!(controller.playing_count(), 4);

        assert_eq!(controller.activate_group(1), Activation::Deactivated);
        assert_eq!(controller.playing_count(), 0);
        assert_eq!(controller.active_selection(), None);
    }

    #[test]
    fn switching_groups_stops_the_previous_one() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);
        controller.activate_group(1);
        controller.poll();

        controller.activate_group(5);
        controller.poll();

        assert_eq!(controller.playing_sounds(), vec!["cafe", "train"]);
        assert!(!backend.is_unpaused("fire"));
        assert_eq!(controller.active_selection(), Some(Selection::Group(5)));
    }

    #[test]
    fn group_starts_at_default_volume() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);
        controller.set_global_volume(0.5);
        controller.set_individual_volume("fire", 0.9);

        controller.activate_group(1);
        controller.poll();

        assert_close(backend.volume("fire"), 0.25);
        assert_eq!(controller.individual_volume("fire"), Some(0.5));
    }

    #[test]
    fn batch_failures_do_not_abort_the_rest() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);
        backend.fail("fire");

        controller.activate_group(1);
        let events = controller.poll();

        assert_eq!(events.len(), 4);
        assert_eq!(
            controller.batch(),
            BatchStatus {
                requested: 4,
                started: 3,
                failed: 1,
                cancelled: 0,
            }
        );
        assert!(!controller.is_playing("fire"));
        assert!(controller.is_playing("wind"));
    }

    #[test]
    fn random_picks_three_to_five_distinct_eligible_sounds() {
        let catalog = logged_in_catalog();
        for seed in 0..50 {
            let (mut controller, _) = controller(&catalog, false);
            let mut rng = StdRng::seed_from_u64(seed);

            let activation = controller.activate_random(&mut rng);
            controller.poll();

            let playing = controller.playing_sounds();
            assert!((3..=5).contains(&playing.len()), "seed {seed}: {playing:?}");
            assert_eq!(activation, Activation::Started { requested: playing.len() });
            assert!(!playing.contains(&"bird"));
            let unique: HashSet<&str> = playing.iter().copied().collect();
            assert_eq!(unique.len(), playing.len());
            assert_eq!(controller.active_selection(), Some(Selection::Random));
        }
    }

    #[test]
    fn random_is_capped_by_pool_size() {
        let catalog = SoundCatalog::new(vec![
            descriptor(1, "rain", false, &[]),
            descriptor(2, "fire", false, &[]),
        ]);
        let (mut controller, _) = controller(&catalog, false);
        let mut rng = StdRng::seed_from_u64(7);

        controller.activate_random(&mut rng);
        controller.poll();
        assert_eq!(controller.playing_count(), 2);

        assert_eq!(controller.activate_random(&mut rng), Activation::Deactivated);
        assert_eq!(controller.playing_count(), 0);
    }

    #[test]
    fn user_playlist_toggles_and_rejects_empty() {
        let catalog = logged_in_catalog();
        let (mut controller, _) = controller(&catalog, true);
        let evening = playlist(
            9,
            vec![
                descriptor(1, "rain", false, &[]),
                descriptor(3, "cafe", false, &[]),
                descriptor(99, "unknown", false, &[]),
            ],
        );

        assert_eq!(
            controller.activate_user_playlist(&playlist(4, vec![])),
            Err(ActivationError::EmptyPlaylist)
        );

        let activation = controller.activate_user_playlist(&evening).unwrap();
        controller.poll();
        assert_eq!(activation, Activation::Started { requested: 2 });
        assert_eq!(controller.playing_sounds(), vec!["cafe", "rain"]);
        assert_eq!(
            controller.active_selection(),
            Some(Selection::UserPlaylist(9))
        );

        assert_eq!(
            controller.activate_user_playlist(&evening),
            Ok(Activation::Deactivated)
        );
        assert_eq!(controller.playing_count(), 0);
    }

    #[test]
    fn stop_all_with_nothing_playing_is_safe() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);

        assert_eq!(controller.stop_all(), 0);
        assert_eq!(controller.active_selection(), None);
        assert_eq!(backend.rewinds("rain"), 0);
    }

    #[test]
    fn stop_group_leaves_other_sounds_alone() {
        let catalog = logged_in_catalog();
        let (mut controller, _) = controller(&catalog, true);
        controller.activate_group(5);
        controller.toggle_sound("fire");
        controller.poll();

        assert_eq!(controller.stop_group(5), 2);
        assert_eq!(controller.playing_sounds(), vec!["fire"]);
        assert_eq!(controller.active_selection(), None);
    }

    #[test]
    fn stop_user_playlist_only_stops_members() {
        let catalog = logged_in_catalog();
        let (mut controller, _) = controller(&catalog, true);
        let mix = playlist(2, vec![descriptor(3, "cafe", false, &[])]);
        controller.activate_user_playlist(&mix).unwrap();
        controller.toggle_sound("rain");
        controller.poll();

        assert_eq!(controller.stop_user_playlist(&mix), 1);
        assert_eq!(controller.playing_sounds(), vec!["rain"]);
        assert_eq!(controller.active_selection(), None);
    }

    #[test]
    fn late_start_never_revives_a_stopped_sound() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);
        backend.defer();

        controller.toggle_sound("rain");
        assert!(controller.is_starting("rain"));
        assert_eq!(controller.toggle_sound("rain"), Some(Toggle::Stopped));

        backend.release();
        assert!(backend.is_unpaused("rain"));
        assert!(controller.poll().is_empty());

        assert!(!controller.is_playing("rain"));
        assert!(!backend.is_unpaused("rain"));
    }

    #[test]
    fn late_start_of_superseded_ticket_is_ignored() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);
        backend.defer();

        controller.activate_group(2);
        controller.activate_group(1);
        backend.release();
        controller.poll();

        assert_eq!(controller.active_selection(), Some(Selection::Group(1)));
        assert_eq!(
            controller.batch(),
            BatchStatus {
                requested: 4,
                started: 4,
                failed: 0,
                cancelled: 0,
            }
        );
        assert!(controller.is_playing("rain"));
        assert!(controller.is_playing("fire"));
    }

    #[test]
    fn volume_change_while_starting_is_applied_on_start() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);
        backend.defer();

        controller.toggle_sound("rain");
        controller.set_global_volume(0.5);
        controller.set_individual_volume("rain", 0.3);
        backend.release();
        controller.poll();

        assert_close(backend.volume("rain"), 0.15);
    }

    #[test]
    fn stopping_a_batch_member_before_it_starts_settles_the_batch() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);
        backend.defer();

        controller.activate_group(5);
        assert_eq!(controller.batch().pending(), 2);
        controller.toggle_sound("cafe");
        backend.release();
        controller.poll();

        assert_eq!(controller.batch().pending(), 0);
        assert_eq!(controller.batch().cancelled, 1);
        assert_eq!(controller.active_selection(), Some(Selection::Group(5)));
        assert!(controller.is_playing("train"));
        assert!(!controller.is_playing("cafe"));
    }

    #[test]
    fn empty_group_stops_everything_and_clears_selection() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);
        controller.activate_group(5);
        controller.poll();
        assert_eq!(controller.playing_count(), 2);

        assert_eq!(
            controller.activate_group(99),
            Activation::Started { requested: 0 }
        );
        controller.poll();

        assert_eq!(controller.playing_count(), 0);
        assert_eq!(controller.active_selection(), None);
        assert!(!backend.is_unpaused("cafe"));
        assert!(!backend.is_unpaused("train"));
    }

    #[test]
    fn empty_random_pool_stops_everything_and_clears_selection() {
        let mut bird = descriptor(1, "bird", true, &[1]);
        bird.user_can_access = true;
        let mut owl = descriptor(2, "owl", true, &[1]);
        owl.user_can_access = true;
        let premium_only = SoundCatalog::new(vec![bird, owl]);
        let empty = SoundCatalog::default();
        let mut rng = StdRng::seed_from_u64(3);

        for (catalog, logged_in) in [(&premium_only, false), (&empty, true)] {
            let (mut controller, _) = controller(catalog, logged_in);
            assert_eq!(
                controller.activate_random(&mut rng),
                Activation::Started { requested: 0 }
            );
            assert_eq!(controller.playing_count(), 0);
            assert_eq!(controller.active_selection(), None);
        }
    }

    #[test]
    fn duplicate_playlist_entries_start_once() {
        let catalog = logged_in_catalog();
        let (mut controller, backend) = controller(&catalog, true);
        let rain = catalog.by_name("rain").cloned().unwrap();
        let detail = playlist(7, vec![rain.clone(), rain]);

        assert_eq!(
            controller.activate_user_playlist(&detail),
            Ok(Activation::Started { requested: 1 })
        );
        controller.poll();

        assert!(controller.is_playing("rain"));
        assert!(backend.is_unpaused("rain"));
        assert_eq!(controller.batch().requested, 1);
        assert_eq!(controller.batch().pending(), 0);
    }
}
