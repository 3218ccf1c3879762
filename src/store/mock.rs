// src/store/mock.rs

//! In-memory remote zone for tests.
//!
//! Objects "downloaded" from it are written to the real local filesystem,
//! exactly where a real backend would put them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::errors::{ClustersideError, Result};
use crate::store::RemoteCredentials;
use crate::store::session::{CollectionSession, EntryKind, Listing, SessionConnector};

#[derive(Debug, Clone)]
enum MockRemote {
    Object(Vec<u8>),
    Collection,
}

#[derive(Debug, Default)]
struct MockState {
    entries: BTreeMap<String, MockRemote>,
    opened: usize,
    closed: usize,
    open_error: Option<String>,
    transfer_error: Option<String>,
    fetched: Vec<String>,
    uploads: Vec<(PathBuf, String, bool)>,
}

/// Shared handle to an in-memory zone; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct MockCollection {
    state: Arc<Mutex<MockState>>,
}

impl MockCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&self, path: &str, content: impl Into<Vec<u8>>) {
        let mut state = self.state.lock().unwrap();
        add_parents(&mut state.entries, path);
        state
            .entries
            .insert(path.to_string(), MockRemote::Object(content.into()));
    }

    pub fn add_collection(&self, path: &str) {
        let mut state = self.state.lock().unwrap();
        add_parents(&mut state.entries, path);
        state
            .entries
            .insert(path.to_string(), MockRemote::Collection);
    }

    /// Make every subsequent `open` fail with a backend error.
    pub fn fail_open(&self, message: &str) {
        self.state.lock().unwrap().open_error = Some(message.to_string());
    }

    /// Make every subsequent `get`/`put` fail with a backend error.
    pub fn fail_transfers(&self, message: &str) {
        self.state.lock().unwrap().transfer_error = Some(message.to_string());
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    /// Remote objects downloaded so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.state.lock().unwrap().fetched.clone()
    }

    /// `(local, remote, recursive)` for every upload, in order.
    pub fn uploads(&self) -> Vec<(PathBuf, String, bool)> {
        self.state.lock().unwrap().uploads.clone()
    }
}

fn parent_of(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some(("", _)) if trimmed.len() > 1 => Some("/"),
        Some((parent, _)) if !parent.is_empty() => Some(parent),
        _ => None,
    }
}

fn add_parents(entries: &mut BTreeMap<String, MockRemote>, path: &str) {
    let mut current = parent_of(path);
    while let Some(parent) = current {
        entries
            .entry(parent.to_string())
            .or_insert(MockRemote::Collection);
        current = parent_of(parent);
    }
}

impl SessionConnector for MockCollection {
    type Session = MockSession;

    async fn open(&self, _credentials: &RemoteCredentials) -> Result<MockSession> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.open_error {
            return Err(ClustersideError::BackendError(message.clone()));
        }
        state.opened += 1;
        Ok(MockSession {
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Debug)]
pub struct MockSession {
    state: Arc<Mutex<MockState>>,
}

impl CollectionSession for MockSession {
    async fn stat(&mut self, path: &str) -> Result<Option<EntryKind>> {
        let state = self.state.lock().unwrap();
        Ok(state.entries.get(path).map(|entry| match entry {
            MockRemote::Object(_) => EntryKind::Object,
            MockRemote::Collection => EntryKind::Collection,
        }))
    }

    async fn list(&mut self, collection: &str) -> Result<Listing> {
        let state = self.state.lock().unwrap();
        if !matches!(state.entries.get(collection), Some(MockRemote::Collection)) {
            return Err(ClustersideError::NotFound(format!(
                "{collection} is not a collection"
            )));
        }

        let mut listing = Listing::default();
        for (path, entry) in &state.entries {
            if parent_of(path) != Some(collection) || path == collection {
                continue;
            }
            match entry {
                MockRemote::Object(_) => listing.objects.push(path.clone()),
                MockRemote::Collection => listing.collections.push(path.clone()),
            }
        }
        Ok(listing)
    }

    async fn get(&mut self, remote: &str, local: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.transfer_error {
            return Err(ClustersideError::BackendError(message.clone()));
        }
        let Some(MockRemote::Object(content)) = state.entries.get(remote).cloned() else {
            return Err(ClustersideError::NotFound(format!("{remote} does not exist")));
        };
        if let Some(parent) = local.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(local, content)?;
        state.fetched.push(remote.to_string());
        Ok(())
    }

    async fn put(&mut self, local: &Path, remote: &str, recursive: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.transfer_error {
            return Err(ClustersideError::BackendError(message.clone()));
        }
        let entry = if recursive {
            MockRemote::Collection
        } else {
            MockRemote::Object(std::fs::read(local)?)
        };
        add_parents(&mut state.entries, remote);
        state.entries.insert(remote.to_string(), entry);
        state
            .uploads
            .push((local.to_path_buf(), remote.to_string(), recursive));
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.state.lock().unwrap().closed += 1;
        Ok(())
    }
}
