//! Blocking JSON client for the mixer server.
//!
//! Every non-2xx response carries `{ "error": "..." }`; that text becomes the
//! `ApiError` message so it can be shown to the user as-is.

use std::io::Read;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::catalog::{SoundDescriptor, SoundId};

pub type PlaylistId = u32;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Could not reach the server: {0}")]
    Transport(String),
    #[error("Unexpected response from the server: {0}")]
    Decode(String),
    #[error("Response too large ({0} bytes max)")]
    TooLarge(usize),
    #[error("Invalid server URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }

    pub fn message_contains(&self, needle: &str) -> bool {
        match self {
            ApiError::Status { message, .. } => message.contains(needle),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaylistSummary {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sound_count: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaylistDetail {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sounds: Vec<SoundDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedPlaylist {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Deserialize)]
struct PlaylistList {
    #[serde(default)]
    playlists: Vec<PlaylistSummary>,
}

#[derive(Deserialize)]
struct CreateResponse {
    playlist: CreatedPlaylist,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    agent: ureq::Agent,
    base: Url,
    cookie: Option<String>,
}

impl ApiClient {
    pub fn new(server_url: &str, cookie: Option<String>) -> Result<Self, ApiError> {
        let mut base = Url::parse(server_url)?;
        // Url::join replaces the last segment unless the base ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .timeout_write(WRITE_TIMEOUT)
            .build();
        Ok(Self {
            agent,
            base,
            cookie: cookie.filter(|c| !c.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolves a sound `file_path` against the server. Absolute URLs are
    /// returned unchanged.
    pub fn asset_url(&self, file_path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(file_path)?)
    }

    pub fn fetch_sounds(&self) -> Result<Vec<SoundDescriptor>, ApiError> {
        let url = self.endpoint("api/sounds")?;
        self.call_json(self.request("GET", &url).call())
    }

    pub fn fetch_playlists(&self) -> Result<Vec<PlaylistSummary>, ApiError> {
        let url = self.endpoint("api/playlists")?;
        let list: PlaylistList = self.call_json(self.request("GET", &url).call())?;
        Ok(list.playlists)
    }

    pub fn fetch_playlist(&self, id: PlaylistId) -> Result<PlaylistDetail, ApiError> {
        let url = self.endpoint(&format!("api/playlists/{id}"))?;
        self.call_json(self.request("GET", &url).call())
    }

    pub fn create_playlist(&self, name: &str, icon: &str) -> Result<CreatedPlaylist, ApiError> {
        let url = self.endpoint("api/playlists/create")?;
        let body = json!({ "name": name, "icon": icon });
        let created: CreateResponse =
            self.call_json(self.request("POST", &url).send_json(body))?;
        Ok(created.playlist)
    }

    pub fn add_sound(&self, playlist: PlaylistId, sound: SoundId) -> Result<String, ApiError> {
        let url = self.endpoint(&format!("api/playlists/{playlist}/add-sound"))?;
        let body = json!({ "sound_id": sound });
        let response: MessageResponse =
            self.call_json(self.request("POST", &url).send_json(body))?;
        Ok(response
            .message
            .unwrap_or_else(|| "Sound added to playlist".to_string()))
    }

    pub fn remove_sound(&self, playlist: PlaylistId, sound: SoundId) -> Result<String, ApiError> {
        let url = self.endpoint(&format!("api/playlists/{playlist}/remove-sound"))?;
        let body = json!({ "sound_id": sound });
        let response: MessageResponse =
            self.call_json(self.request("POST", &url).send_json(body))?;
        Ok(response
            .message
            .unwrap_or_else(|| "Sound removed from playlist".to_string()))
    }

    pub fn delete_playlist(&self, id: PlaylistId) -> Result<String, ApiError> {
        let url = self.endpoint(&format!("api/playlists/{id}/delete"))?;
        let response: MessageResponse = self.call_json(self.request("DELETE", &url).call())?;
        Ok(response
            .message
            .unwrap_or_else(|| "Playlist deleted".to_string()))
    }

    /// Downloads an audio asset into memory, refusing bodies over `max_bytes`.
    pub fn fetch_asset(&self, url: &Url, max_bytes: usize) -> Result<Vec<u8>, ApiError> {
        let response = self
            .request("GET", url)
            .call()
            .map_err(into_api_error)?;
        if let Some(length) = response
            .header("Content-Length")
            .and_then(|l| l.parse::<u64>().ok())
        {
            if length > max_bytes as u64 {
                return Err(ApiError::TooLarge(max_bytes));
            }
        }
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(max_bytes as u64 + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if bytes.len() > max_bytes {
            return Err(ApiError::TooLarge(max_bytes));
        }
        Ok(bytes)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        let request = self
            .agent
            .request_url(method, url)
            .set("Accept", "application/json");
        match &self.cookie {
            Some(cookie) => request.set("Cookie", cookie),
            None => request,
        }
    }

    fn call_json<T: DeserializeOwned>(
        &self,
        result: Result<ureq::Response, ureq::Error>,
    ) -> Result<T, ApiError> {
        let response = result.map_err(into_api_error)?;
        response
            .into_json::<T>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn into_api_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(status, response) => {
            let message = response
                .into_json::<ErrorResponse>()
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("Request failed with status {status}"));
            ApiError::Status { status, message }
        }
        ureq::Error::Transport(transport) => ApiError::Transport(transport.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serves one canned response and hands back the raw request it received.
    pub fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let read = stream.read(&mut buf).unwrap_or(0);
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
                if request_complete(&request) {
                    break;
                }
            }
            let _ = stream.write_all(response.as_bytes());
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    pub fn json_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }
}
