// src/store/icommands.rs

//! iRODS backend driven through the icommands client tools.
//!
//! Connection settings are passed per command as `IRODS_*` environment
//! variables; when a password is configured the session authenticates with
//! `iinit` on open and removes the cached credentials with `iexit full` on
//! close.

use std::path::Path;

use tracing::debug;

use crate::errors::{ClustersideError, Result};
use crate::exec::backend::{ProcessBackend, ProcessOutput, ProcessRequest};
use crate::store::RemoteCredentials;
use crate::store::session::{CollectionSession, EntryKind, Listing, SessionConnector};

#[derive(Debug, Clone, Default)]
pub struct IcommandsConnector<P> {
    backend: P,
}

impl<P: ProcessBackend + Clone> IcommandsConnector<P> {
    pub fn new(backend: P) -> Self {
        Self { backend }
    }
}

impl<P: ProcessBackend + Clone> SessionConnector for IcommandsConnector<P> {
    type Session = IcommandsSession<P>;

    async fn open(&self, credentials: &RemoteCredentials) -> Result<IcommandsSession<P>> {
        let session = IcommandsSession {
            backend: self.backend.clone(),
            env: vec![
                ("IRODS_HOST".to_string(), credentials.host.clone()),
                ("IRODS_PORT".to_string(), credentials.port.to_string()),
                ("IRODS_USER_NAME".to_string(), credentials.user.clone()),
                ("IRODS_ZONE_NAME".to_string(), credentials.zone.clone()),
            ],
            authenticated: credentials.password.is_some(),
        };

        debug!(host = %credentials.host, zone = %credentials.zone, user = %credentials.user, "opening iRODS session");

        if let Some(password) = &credentials.password {
            let request = session.request("iinit").stdin(format!("{password}\n"));
            session.call(request).await?;
        }

        Ok(session)
    }
}

#[derive(Debug)]
pub struct IcommandsSession<P> {
    backend: P,
    env: Vec<(String, String)>,
    authenticated: bool,
}

impl<P: ProcessBackend> IcommandsSession<P> {
    fn request(&self, program: &str) -> ProcessRequest {
        self.env
            .iter()
            .fold(ProcessRequest::new(program), |req, (k, v)| req.env(k, v))
    }

    /// Run an icommand; anything but a clean exit is a backend error.
    async fn call(&self, request: ProcessRequest) -> Result<ProcessOutput> {
        let program = request.program.clone();
        let output = self.run(request).await?;
        if !output.success() {
            return Err(ClustersideError::BackendError(format!(
                "{program} exited with code {:?}: {}",
                output.code,
                output.stderr.trim()
            )));
        }
        Ok(output)
    }

    async fn run(&self, request: ProcessRequest) -> Result<ProcessOutput> {
        self.backend.run(request).await.map_err(|e| match e {
            ClustersideError::ProcessInvocation { program, source } => {
                ClustersideError::BackendError(format!("cannot run {program}: {source}"))
            }
            other => other,
        })
    }
}

impl<P: ProcessBackend> CollectionSession for IcommandsSession<P> {
    async fn stat(&mut self, path: &str) -> Result<Option<EntryKind>> {
        let output = self.run(self.request("ils").arg(path)).await?;

        if !output.success() {
            if output.stderr.contains("does not exist") {
                return Ok(None);
            }
            return Err(ClustersideError::BackendError(format!(
                "ils {path} exited with code {:?}: {}",
                output.code,
                output.stderr.trim()
            )));
        }

        Ok(Some(parse_stat(&output.stdout)))
    }

    async fn list(&mut self, collection: &str) -> Result<Listing> {
        let output = self.call(self.request("ils").arg(collection)).await?;
        Ok(parse_listing(collection, &output.stdout))
    }

    async fn get(&mut self, remote: &str, local: &Path) -> Result<()> {
        let request = self
            .request("iget")
            .arg("-f")
            .arg(remote)
            .arg(local.to_string_lossy());
        self.call(request).await?;
        Ok(())
    }

    async fn put(&mut self, local: &Path, remote: &str, recursive: bool) -> Result<()> {
        let mut request = self.request("iput").arg("-f");
        if recursive {
            request = request.arg("-r");
        }
        self.call(request.arg(local.to_string_lossy()).arg(remote))
            .await?;
        Ok(())
    }

    async fn close(self) -> Result<()> {
        if self.authenticated {
            self.call(self.request("iexit").arg("full")).await?;
        }
        Ok(())
    }
}

/// `ils <collection>` prints `<collection>:` first; a data object prints
/// just its own path.
fn parse_stat(stdout: &str) -> EntryKind {
    match stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
        Some(first) if first.ends_with(':') => EntryKind::Collection,
        _ => EntryKind::Object,
    }
}

/// Children lines of `ils`: `  name` for objects, `  C- /full/path` for
/// subcollections.
fn parse_listing(collection: &str, stdout: &str) -> Listing {
    let base = collection.trim_end_matches('/');
    let mut listing = Listing::default();

    for line in stdout.lines().skip_while(|l| !l.trim_end().ends_with(':')).skip(1) {
        let entry = line.trim();
        if entry.is_empty() {
            continue;
        }
        match entry.strip_prefix("C- ") {
            Some(sub) => listing.collections.push(sub.trim().to_string()),
            None => listing.objects.push(format!("{base}/{entry}")),
        }
    }

    listing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_distinguishes_collections_from_objects() {
        assert_eq!(parse_stat("/tempZone/home/rods:\n  a.txt\n"), EntryKind::Collection);
        assert_eq!(parse_stat("  /tempZone/home/rods/a.txt\n"), EntryKind::Object);
    }

    #[test]
    fn listing_splits_objects_and_subcollections() {
        let stdout = "/tempZone/coll:\n  a.txt\n  b.txt\n  C- /tempZone/coll/sub\n";
        let listing = parse_listing("/tempZone/coll/", stdout);

        assert_eq!(listing.objects, ["/tempZone/coll/a.txt", "/tempZone/coll/b.txt"]);
        assert_eq!(listing.collections, ["/tempZone/coll/sub"]);
    }
}
