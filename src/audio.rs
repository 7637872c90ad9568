use crate::api::ApiClient;
use crate::catalog::SoundDescriptor;
use crate::config::AudioConfig;
use anyhow::{Context, Result};
use magnum::container::ogg::OpusSourceOgg;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    #[error("could not load audio asset: {0}")]
    Asset(String),
    #[error("could not decode audio: {0}")]
    Decode(String),
    #[error("audio output unavailable: {0}")]
    Output(String),
    #[error("start was cancelled")]
    Cancelled,
}

/// Outcome of one start request, delivered back to the controller.
#[derive(Debug)]
pub struct StartCompletion {
    pub sound: String,
    pub ticket: u64,
    pub result: Result<(), PlaybackError>,
}

/// Handed to a resource when it is asked to play. The resource resolves it
/// once playback has actually begun or failed, from any thread.
#[derive(Debug)]
pub struct StartTicket {
    sound: String,
    id: u64,
    tx: Sender<StartCompletion>,
}

impl StartTicket {
    pub(crate) fn new(sound: &str, id: u64, tx: Sender<StartCompletion>) -> Self {
        Self {
            sound: sound.to_string(),
            id,
            tx,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn sound(&self) -> &str {
        &self.sound
    }

    pub fn resolve(self, result: Result<(), PlaybackError>) {
        let completion = StartCompletion {
            sound: self.sound,
            ticket: self.id,
            result,
        };
        if self.tx.send(completion).is_err() {
            log::debug!("Start completion dropped, controller is gone");
        }
    }
}

pub trait AudioBackend {
    type Resource: AudioResource;

    /// Creates a paused, looping resource bound to the sound's asset.
    fn open(&mut self, sound: &SoundDescriptor) -> Result<Self::Resource, PlaybackError>;
}

pub trait AudioResource {
    fn play(&mut self, volume: f32, ticket: StartTicket);
    fn pause(&mut self);
    /// Moves the playback position back to the start.
    fn rewind(&mut self);
    fn set_volume(&mut self, volume: f32);
}

struct MagnumOggWrapper<R: std::io::Read + std::io::Seek>(OpusSourceOgg<R>);

impl<R: std::io::Read + std::io::Seek> Iterator for MagnumOggWrapper<R> {
    type Item = f32;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl<R: std::io::Read + std::io::Seek> Source for MagnumOggWrapper<R> {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        48000
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

type BoxedSource = Box<dyn Source<Item = f32> + Send>;

#[derive(Debug, Clone)]
enum AssetLocation {
    File(PathBuf),
    Remote(Url),
}

impl AssetLocation {
    fn resolve(client: &ApiClient, file_path: &str) -> Result<Self, PlaybackError> {
        // Server paths are absolute ("/sounds/rain.mp3"), only relative ones
        // may point at a local copy.
        let path = Path::new(file_path);
        if path.is_relative() && path.is_file() {
            return Ok(Self::File(path.to_path_buf()));
        }
        client
            .asset_url(file_path)
            .map(Self::Remote)
            .map_err(|e| PlaybackError::Asset(e.to_string()))
    }

    fn is_opus(&self) -> bool {
        let name = match self {
            Self::File(path) => path.to_string_lossy().to_lowercase(),
            Self::Remote(url) => url.path().to_lowercase(),
        };
        name.ends_with(".opus") || name.ends_with(".webm")
    }
}

#[derive(Default)]
struct LoadState {
    // Bumped by pause/rewind so a load that finishes afterwards is dropped.
    generation: u64,
    bytes: Option<Arc<[u8]>>,
}

impl LoadState {
    fn invalidate(&mut self) {
        self.generation += 1;
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

fn lock(state: &Mutex<LoadState>) -> MutexGuard<'_, LoadState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub struct RodioBackend {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    client: ApiClient,
    fade_in: Duration,
    max_asset_bytes: usize,
}

impl RodioBackend {
    pub fn new(client: ApiClient, config: &AudioConfig) -> Result<Self> {
        let (_stream, stream_handle) =
            OutputStream::try_default().context("No audio output device available")?;
        Ok(Self {
            _stream,
            stream_handle,
            client,
            fade_in: Duration::from_millis(config.fade_in_ms),
            max_asset_bytes: config.max_asset_bytes,
        })
    }
}

impl AudioBackend for RodioBackend {
    type Resource = RodioResource;

    fn open(&mut self, sound: &SoundDescriptor) -> Result<RodioResource, PlaybackError> {
        let sink =
            Sink::try_new(&self.stream_handle).map_err(|e| PlaybackError::Output(e.to_string()))?;
        sink.pause();
        let asset = AssetLocation::resolve(&self.client, &sound.file_path)?;
        log::debug!("Opened sink for '{}' bound to {:?}", sound.name, asset);
        Ok(RodioResource {
            name: sound.name.clone(),
            sink: Arc::new(sink),
            asset,
            state: Arc::new(Mutex::new(LoadState::default())),
            client: self.client.clone(),
            fade_in: self.fade_in,
            max_bytes: self.max_asset_bytes,
        })
    }
}

/// One rodio sink per sound. The asset bytes are fetched on first start and
/// kept, so later starts only decode again.
pub struct RodioResource {
    name: String,
    sink: Arc<Sink>,
    asset: AssetLocation,
    state: Arc<Mutex<LoadState>>,
    client: ApiClient,
    fade_in: Duration,
    max_bytes: usize,
}

impl AudioResource for RodioResource {
    fn play(&mut self, volume: f32, ticket: StartTicket) {
        self.sink.set_volume(volume);

        // Every stop rewinds, so each start decodes a fresh source.
        let generation = lock(&self.state).generation;

        log::debug!("Loading '{}' for start #{}", self.name, ticket.id());
        let name = self.name.clone();
        let sink = Arc::clone(&self.sink);
        let state = Arc::clone(&self.state);
        let asset = self.asset.clone();
        let client = self.client.clone();
        let fade_in = self.fade_in;
        let max_bytes = self.max_bytes;

        thread::spawn(move || {
            let source = asset_bytes(&state, &asset, &client, max_bytes)
                .and_then(|bytes| decode(&name, &asset, bytes));

            let source = match source {
                Ok(source) => source,
                Err(e) => {
                    log::error!("Failed to load '{}': {}", ticket.sound(), e);
                    ticket.resolve(Err(e));
                    return;
                }
            };

            let guard = lock(&state);
            if !guard.is_current(generation) {
                log::debug!("Dropping stale load for '{}'", name);
                drop(guard);
                ticket.resolve(Err(PlaybackError::Cancelled));
                return;
            }
            sink.append(source.repeat_infinite().fade_in(fade_in));
            sink.play();
            drop(guard);
            log::info!("Started playing '{}'", name);
            ticket.resolve(Ok(()));
        });
    }

    fn pause(&mut self) {
        lock(&self.state).invalidate();
        self.sink.pause();
    }

    fn rewind(&mut self) {
        // Dropping the queued source is the only rewind every decoder supports;
        // the cached bytes make the next start cheap.
        lock(&self.state).invalidate();
        self.sink.clear();
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }
}

fn asset_bytes(
    state: &Mutex<LoadState>,
    asset: &AssetLocation,
    client: &ApiClient,
    max_bytes: usize,
) -> Result<Arc<[u8]>, PlaybackError> {
    if let Some(bytes) = lock(state).bytes.clone() {
        return Ok(bytes);
    }

    let bytes: Arc<[u8]> = match asset {
        AssetLocation::File(path) => std::fs::read(path)
            .map_err(|e| PlaybackError::Asset(format!("{}: {}", path.display(), e)))?
            .into(),
        AssetLocation::Remote(url) => {
            log::debug!("Fetching asset {}", url);
            client
                .fetch_asset(url, max_bytes)
                .map_err(|e| PlaybackError::Asset(format!("{}: {}", url, e)))?
                .into()
        }
    };

    lock(state).bytes = Some(Arc::clone(&bytes));
    Ok(bytes)
}

fn decode(name: &str, asset: &AssetLocation, bytes: Arc<[u8]>) -> Result<BoxedSource, PlaybackError> {
    if asset.is_opus() {
        log::info!("Attempting to use Magnum (Opus) decoder for '{}'", name);
        match OpusSourceOgg::new(Cursor::new(Arc::clone(&bytes))) {
            Ok(decoder) => return Ok(Box::new(MagnumOggWrapper(decoder))),
            Err(e) => {
                log::error!("Magnum decoder failed: {:?}. Falling back to Rodio.", e);
            }
        }
    }

    let decoder_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
        Decoder::new(Cursor::new(bytes))
    }));

    match decoder_result {
        Ok(Ok(d)) => Ok(Box::new(d.convert_samples())),
        Ok(Err(e)) => {
            log::error!("Failed to create decoder for '{}': {}", name, e);
            Err(PlaybackError::Decode(e.to_string()))
        }
        Err(_) => {
            log::error!("Decoder PANICKED for '{}'.", name);
            Err(PlaybackError::Decode("decoder panicked".to_string()))
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory backend that records what the controller asked for.

    use super::*;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::rc::Rc;

    #[derive(Default)]
    pub struct FakeState {
        pub opened: Vec<String>,
        pub unpaused: HashSet<String>,
        pub volumes: HashMap<String, f32>,
        pub rewinds: HashMap<String, usize>,
        pub failing: HashSet<String>,
        pub fail_open: HashSet<String>,
        /// When set, successful starts are held until `release` is called.
        pub deferred: bool,
        pub held: Vec<StartTicket>,
    }

    #[derive(Clone, Default)]
    pub struct FakeBackend {
        pub state: Rc<RefCell<FakeState>>,
    }

    impl FakeBackend {
        pub fn is_unpaused(&self, name: &str) -> bool {
            self.state.borrow().unpaused.contains(name)
        }

        pub fn volume(&self, name: &str) -> Option<f32> {
            self.state.borrow().volumes.get(name).copied()
        }

        pub fn rewinds(&self, name: &str) -> usize {
            self.state.borrow().rewinds.get(name).copied().unwrap_or(0)
        }

        pub fn fail(&self, name: &str) {
            self.state.borrow_mut().failing.insert(name.to_string());
        }

        pub fn defer(&self) {
            self.state.borrow_mut().deferred = true;
        }

        /// Resolves every held start as a success, unpausing the resource the
        /// way a late-finishing load would.
        pub fn release(&self) {
            let held: Vec<StartTicket> = std::mem::take(&mut self.state.borrow_mut().held);
            for ticket in held {
                self.state
                    .borrow_mut()
                    .unpaused
                    .insert(ticket.sound().to_string());
                ticket.resolve(Ok(()));
            }
        }
    }

    pub struct FakeResource {
        name: String,
        state: Rc<RefCell<FakeState>>,
    }

    impl AudioBackend for FakeBackend {
        type Resource = FakeResource;

        fn open(&mut self, sound: &SoundDescriptor) -> Result<FakeResource, PlaybackError> {
            let mut state = self.state.borrow_mut();
            if state.fail_open.contains(&sound.name) {
                return Err(PlaybackError::Output("no sink".to_string()));
            }
            state.opened.push(sound.name.clone());
            Ok(FakeResource {
                name: sound.name.clone(),
                state: Rc::clone(&self.state),
            })
        }
    }

    impl AudioResource for FakeResource {
        fn play(&mut self, volume: f32, ticket: StartTicket) {
            let mut state = self.state.borrow_mut();
            state.volumes.insert(self.name.clone(), volume);
            if state.failing.contains(&self.name) {
                drop(state);
                ticket.resolve(Err(PlaybackError::Asset("404".to_string())));
            } else if state.deferred {
                state.held.push(ticket);
            } else {
                state.unpaused.insert(self.name.clone());
                drop(state);
                ticket.resolve(Ok(()));
            }
        }

        fn pause(&mut self) {
            self.state.borrow_mut().unpaused.remove(&self.name);
        }

        fn rewind(&mut self) {
            *self
                .state
                .borrow_mut()
                .rewinds
                .entry(self.name.clone())
                .or_default() += 1;
        }

        fn set_volume(&mut self, volume: f32) {
            self.state
                .borrow_mut()
                .volumes
                .insert(self.name.clone(), volume);
        }
    }
}
