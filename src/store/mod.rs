// src/store/mod.rs

//! Staging data between a backend and the local working directory.
//!
//! A [`Store`] is built per staging operation from a binding's
//! [`StoreDescriptor`] and dropped right after:
//!
//! - [`Store::Local`] copies within the local filesystem.
//! - [`Store::RemoteSingle`] stages a `file` binding from a remote zone.
//! - [`Store::RemoteCollection`] stages a `directory` binding, mirroring
//!   the collection tree depth-first.
//!
//! Remote variants reach the backend through a [`SessionConnector`]; a
//! session is opened for exactly one `exists`/`fetch`/`put` and closed
//! before the call returns, on success and failure alike.
//!
//! Collections are only staged when the binding sets `recursive`. Without
//! it a collection is skipped with `NotFound`, never fetched shallowly.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Binding;
use crate::errors::{ClustersideError, Result};
use crate::fs::FileSystem;
use crate::types::{InputKind, StorageKind};

pub mod icommands;
pub mod local;
pub mod mock;
pub mod remote;
pub mod session;

pub use icommands::IcommandsConnector;
pub use local::LocalStore;
pub use remote::RemoteStore;
pub use session::{CollectionSession, EntryKind, Listing, SessionConnector};

/// Default iRODS catalog port.
pub const DEFAULT_IRODS_PORT: u16 = 1247;

/// Where a binding lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDescriptor {
    pub storage: StorageKind,
    /// Local path or logical remote path, depending on `storage`.
    pub path: String,
    /// Present for remote storage only.
    pub credentials: Option<RemoteCredentials>,
    /// Opt into recursive staging of collections.
    pub recursive: bool,
}

/// Connection settings for a remote zone.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub zone: String,
}

impl fmt::Debug for RemoteCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("zone", &self.zone)
            .finish()
    }
}

/// How a fetch should proceed once we know what sits at the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchPlan {
    Object,
    Tree,
}

/// Fetch rules shared by every variant.
///
/// A `directory` binding pointing at a plain object, or any binding pointing
/// at a collection, needs `recursive`; otherwise the path is reported as
/// `NotFound` so the caller treats it as a skipped staging step.
pub(crate) fn plan_fetch(
    kind: InputKind,
    entry: Option<EntryKind>,
    recursive: bool,
    path: &str,
) -> Result<FetchPlan> {
    match (kind, entry, recursive) {
        (_, None, _) => Err(ClustersideError::NotFound(format!("{path} does not exist"))),
        (InputKind::File, Some(EntryKind::Object), _) => Ok(FetchPlan::Object),
        (InputKind::Directory, Some(EntryKind::Object), true) => Ok(FetchPlan::Object),
        (InputKind::Directory, Some(EntryKind::Object), false) => Err(
            ClustersideError::NotFound(format!("{path} is not a collection")),
        ),
        (_, Some(EntryKind::Collection), true) => Ok(FetchPlan::Tree),
        (_, Some(EntryKind::Collection), false) => Err(ClustersideError::NotFound(format!(
            "skipping directory {path} (recursive staging not requested)"
        ))),
    }
}

/// Last path component of a local or logical remote path.
pub(crate) fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Capability object over one backend, selected from a binding.
#[derive(Debug)]
pub enum Store<C> {
    Local(LocalStore),
    RemoteSingle(RemoteStore<C>),
    RemoteCollection(RemoteStore<C>),
}

impl<C> Store<C>
where
    C: SessionConnector + Clone,
{
    /// Select the variant from the binding's `storage` and `kind`.
    pub fn for_binding(binding: &Binding, connector: C, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let descriptor = &binding.descriptor;

        match descriptor.storage {
            StorageKind::Local => Ok(Store::Local(LocalStore::new(
                fs,
                binding.kind,
                descriptor.recursive,
            ))),
            StorageKind::Irods => {
                let credentials = descriptor.credentials.clone().ok_or_else(|| {
                    ClustersideError::ConfigError(format!(
                        "remote binding for {} has no connection details",
                        descriptor.path
                    ))
                })?;
                let store = RemoteStore::new(
                    connector,
                    credentials,
                    binding.kind,
                    descriptor.recursive,
                    fs,
                );
                Ok(match binding.kind {
                    InputKind::File => Store::RemoteSingle(store),
                    InputKind::Directory => Store::RemoteCollection(store),
                })
            }
        }
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        match self {
            Store::Local(store) => Ok(store.exists(path)),
            Store::RemoteSingle(store) | Store::RemoteCollection(store) => {
                store.exists(path).await
            }
        }
    }

    /// Stage `path` into `local_dir`, returning the local path of the copy.
    pub async fn fetch(&self, path: &str, local_dir: &Path) -> Result<PathBuf> {
        match self {
            Store::Local(store) => store.fetch(path, local_dir),
            Store::RemoteSingle(store) | Store::RemoteCollection(store) => {
                store.fetch(path, local_dir).await
            }
        }
    }

    pub async fn put(&self, local: &Path, path: &str) -> Result<()> {
        match self {
            Store::Local(store) => store.put(local, path),
            Store::RemoteSingle(store) | Store::RemoteCollection(store) => {
                store.put(local, path).await
            }
        }
    }
}
