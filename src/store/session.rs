// src/store/session.rs

//! Backend session seam for remote collection stores.

use std::future::Future;
use std::path::Path;

use crate::errors::Result;
use crate::store::RemoteCredentials;

/// What sits at a logical remote path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Object,
    Collection,
}

/// Direct children of a collection, as full logical paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub objects: Vec<String>,
    pub collections: Vec<String>,
}

/// A live, authenticated connection to the backend.
///
/// Dropping a session without calling [`close`](CollectionSession::close)
/// may leave server-side state behind; stores always close explicitly.
pub trait CollectionSession: Send {
    fn stat(&mut self, path: &str) -> impl Future<Output = Result<Option<EntryKind>>> + Send;

    fn list(&mut self, collection: &str) -> impl Future<Output = Result<Listing>> + Send;

    /// Download one object to a local file path.
    fn get(&mut self, remote: &str, local: &Path) -> impl Future<Output = Result<()>> + Send;

    /// Upload a local file, or a directory when `recursive`.
    fn put(
        &mut self,
        local: &Path,
        remote: &str,
        recursive: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens sessions against a backend.
pub trait SessionConnector: Send + Sync {
    type Session: CollectionSession;

    fn open(
        &self,
        credentials: &RemoteCredentials,
    ) -> impl Future<Output = Result<Self::Session>> + Send;
}
