// src/store/remote.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{ClustersideError, Result};
use crate::fs::FileSystem;
use crate::store::session::{CollectionSession, SessionConnector};
use crate::store::{FetchPlan, RemoteCredentials, base_name, plan_fetch};
use crate::types::InputKind;

/// Store backed by a remote zone reached through `C`.
#[derive(Debug)]
pub struct RemoteStore<C> {
    connector: C,
    credentials: RemoteCredentials,
    kind: InputKind,
    recursive: bool,
    fs: Arc<dyn FileSystem>,
}

impl<C: SessionConnector> RemoteStore<C> {
    pub fn new(
        connector: C,
        credentials: RemoteCredentials,
        kind: InputKind,
        recursive: bool,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            connector,
            credentials,
            kind,
            recursive,
            fs,
        }
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        let mut session = self.connector.open(&self.credentials).await?;
        let result = session.stat(path).await;
        close_session(session).await;
        Ok(result?.is_some())
    }

    pub async fn fetch(&self, path: &str, local_dir: &Path) -> Result<PathBuf> {
        let mut session = self.connector.open(&self.credentials).await?;
        let result = self.fetch_with(&mut session, path, local_dir).await;
        close_session(session).await;
        result
    }

    pub async fn put(&self, local: &Path, path: &str) -> Result<()> {
        let recursive = self.fs.is_dir(local);
        let mut session = self.connector.open(&self.credentials).await?;
        info!(local = %local.display(), remote = %path, recursive, "uploading to remote store");
        let result = session.put(local, path, recursive).await;
        close_session(session).await;
        result
    }

    async fn fetch_with(
        &self,
        session: &mut C::Session,
        path: &str,
        local_dir: &Path,
    ) -> Result<PathBuf> {
        let entry = session.stat(path).await?;
        let plan = plan_fetch(self.kind, entry, self.recursive, path)?;
        let local_path = local_dir.join(base_name(path));

        self.fs.create_dir_all(local_dir).map_err(backend)?;

        match plan {
            FetchPlan::Object => {
                info!(remote = %path, local = %local_path.display(), "fetching object");
                session.get(path, &local_path).await?;
            }
            FetchPlan::Tree => {
                info!(remote = %path, local = %local_path.display(), "fetching collection");
                self.mirror(session, path, &local_path).await?;
            }
        }

        Ok(local_path)
    }

    /// Depth-first: a collection's objects, then each subcollection in turn.
    async fn mirror(&self, session: &mut C::Session, root: &str, local_root: &Path) -> Result<()> {
        let mut pending = vec![(root.to_string(), local_root.to_path_buf())];

        while let Some((collection, local_dir)) = pending.pop() {
            self.fs.create_dir_all(&local_dir).map_err(backend)?;
            let listing = session.list(&collection).await?;

            for object in &listing.objects {
                let target = local_dir.join(base_name(object));
                debug!(remote = %object, local = %target.display(), "fetching object");
                session.get(object, &target).await?;
            }

            for sub in listing.collections.iter().rev() {
                pending.push((sub.clone(), local_dir.join(base_name(sub))));
            }
        }

        Ok(())
    }
}

/// Release a session; a failure here never replaces the operation's result.
async fn close_session<S: CollectionSession>(session: S) {
    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to close remote store session");
    }
}

fn backend(e: anyhow::Error) -> ClustersideError {
    ClustersideError::BackendError(format!("{e:#}"))
}
