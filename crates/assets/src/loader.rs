//! Fire-once background loading.
//!
//! Each request runs on its own worker thread and reports back over a
//! channel. Completions only become visible through [`AssetLoader::poll`],
//! so the owner decides when results are applied (start of frame).

use crate::image_data::{ImageData, load_image_file};
use crate::obj_mesh::load_mesh_file;
use crate::record::GeometryRecord;
use crate::AssetError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// Identifies one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    Failed,
}

/// A decoded asset.
#[derive(Debug, Clone)]
pub enum LoadedAsset {
    Mesh(GeometryRecord),
    Image(ImageData),
}

/// Completion of one request.
#[derive(Debug)]
pub struct LoadEvent {
    pub ticket: LoadTicket,
    pub path: PathBuf,
    pub result: Result<LoadedAsset, AssetError>,
}

#[derive(Debug, Clone, Copy)]
enum RequestKind {
    Mesh,
    Image,
}

impl RequestKind {
    fn run(self, path: &Path) -> Result<LoadedAsset, AssetError> {
        match self {
            Self::Mesh => load_mesh_file(path).map(LoadedAsset::Mesh),
            Self::Image => load_image_file(path).map(LoadedAsset::Image),
        }
    }
}

/// Background asset loader with per-ticket state.
pub struct AssetLoader {
    sender: Sender<LoadEvent>,
    receiver: Receiver<LoadEvent>,
    states: HashMap<LoadTicket, LoadState>,
    next_ticket: u64,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            states: HashMap::new(),
            next_ticket: 0,
        }
    }

    /// Start decoding a mesh file in the background.
    pub fn load_mesh(&mut self, path: impl Into<PathBuf>) -> LoadTicket {
        self.spawn(RequestKind::Mesh, path.into())
    }

    /// Start decoding an image file in the background.
    pub fn load_image(&mut self, path: impl Into<PathBuf>) -> LoadTicket {
        self.spawn(RequestKind::Image, path.into())
    }

    pub fn state(&self, ticket: LoadTicket) -> Option<LoadState> {
        self.states.get(&ticket).copied()
    }

    pub fn pending_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s == LoadState::Pending)
            .count()
    }

    /// Drain every completion that has arrived, without blocking.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let events: Vec<LoadEvent> = self.receiver.try_iter().collect();
        for event in &events {
            self.record(event);
        }
        events
    }

    /// Block until nothing is pending or `timeout` elapses.
    pub fn wait_idle(&mut self, timeout: Duration) -> Vec<LoadEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        while self.pending_count() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(event) => {
                    self.record(&event);
                    events.push(event);
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        events
    }

    fn record(&mut self, event: &LoadEvent) {
        let state = match &event.result {
            Ok(_) => LoadState::Ready,
            Err(e) => {
                tracing::warn!(path = %event.path.display(), "asset load failed: {e}");
                LoadState::Failed
            }
        };
        self.states.insert(event.ticket, state);
    }

    fn spawn(&mut self, kind: RequestKind, path: PathBuf) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        self.states.insert(ticket, LoadState::Pending);

        let sender = self.sender.clone();
        let worker_path = path.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("asset-load-{}", ticket.0))
            .spawn(move || {
                let result = kind.run(&worker_path);
                // Receiver gone means the session ended; nothing to report to.
                let _ = sender.send(LoadEvent {
                    ticket,
                    path: worker_path,
                    result,
                });
            });

        if let Err(e) = spawned {
            let _ = self.sender.send(LoadEvent {
                ticket,
                path: path.clone(),
                result: Err(AssetError::Worker(e.to_string())),
            });
        }
        tracing::debug!(ticket = ticket.0, ?kind, path = %path.display(), "load requested");
        ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TRIANGLE: &str = "v 0 1 0\nv -1 -1 0\nv 1 -1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";

    fn obj_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn mesh_load_becomes_ready() {
        let file = obj_file(TRIANGLE);
        let mut loader = AssetLoader::new();
        let ticket = loader.load_mesh(file.path());
        assert_eq!(loader.state(ticket), Some(LoadState::Pending));

        let events = loader.wait_idle(Duration::from_secs(10));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].ticket, ticket);
        assert!(matches!(events[0].result, Ok(LoadedAsset::Mesh(_))));
        assert_eq!(loader.state(ticket), Some(LoadState::Ready));
        assert_eq!(loader.pending_count(), 0);
    }

    #[test]
    fn missing_file_becomes_failed() {
        let mut loader = AssetLoader::new();
        let ticket = loader.load_mesh("definitely/not/here.obj");
        let events = loader.wait_idle(Duration::from_secs(10));
        assert!(matches!(events[0].result, Err(AssetError::Io(_))));
        assert_eq!(loader.state(ticket), Some(LoadState::Failed));
    }

    #[test]
    fn image_failure_does_not_affect_mesh_load() {
        let file = obj_file(TRIANGLE);
        let mut loader = AssetLoader::new();
        let image = loader.load_image("missing.png");
        let mesh = loader.load_mesh(file.path());
        loader.wait_idle(Duration::from_secs(10));
        assert_eq!(loader.state(image), Some(LoadState::Failed));
        assert_eq!(loader.state(mesh), Some(LoadState::Ready));
    }

    #[test]
    fn poll_without_requests_is_empty() {
        let mut loader = AssetLoader::new();
        assert!(loader.poll().is_empty());
        assert_eq!(loader.state(LoadTicket(99)), None);
    }
}
