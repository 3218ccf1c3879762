// src/store/local.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{ClustersideError, Result};
use crate::fs::FileSystem;
use crate::store::session::EntryKind;
use crate::store::{FetchPlan, base_name, plan_fetch};
use crate::types::InputKind;

/// Store over the local filesystem: staging is a copy, or nothing at all
/// when the source already sits where it is requested.
#[derive(Debug)]
pub struct LocalStore {
    fs: Arc<dyn FileSystem>,
    kind: InputKind,
    recursive: bool,
}

impl LocalStore {
    pub fn new(fs: Arc<dyn FileSystem>, kind: InputKind, recursive: bool) -> Self {
        Self { fs, kind, recursive }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.fs.exists(Path::new(path))
    }

    pub fn fetch(&self, path: &str, local_dir: &Path) -> Result<PathBuf> {
        let source = Path::new(path);
        let plan = plan_fetch(self.kind, self.entry(source), self.recursive, path)?;
        let target = local_dir.join(base_name(path));

        self.fs.create_dir_all(local_dir).map_err(backend)?;
        if self.resolve(source)? == self.resolve(&target)? {
            debug!(path = %source.display(), "input already in place");
            return Ok(target);
        }

        info!(source = %source.display(), target = %target.display(), "copying local input");
        match plan {
            FetchPlan::Object => self.fs.copy_file(source, &target).map_err(backend)?,
            FetchPlan::Tree => self.copy_tree(source, &target)?,
        }

        Ok(target)
    }

    /// Copy `local` to `path`. An existing directory at `path` receives the
    /// copy under `local`'s base name.
    pub fn put(&self, local: &Path, path: &str) -> Result<()> {
        if !self.fs.exists(local) {
            return Err(ClustersideError::NotFound(format!(
                "{} does not exist",
                local.display()
            )));
        }

        let mut target = PathBuf::from(path);
        if self.fs.is_dir(&target) {
            target = target.join(base_name(&local.to_string_lossy()));
        }
        if self.resolve(local)? == self.resolve(&target)? {
            debug!(path = %local.display(), "output already in place");
            return Ok(());
        }

        info!(source = %local.display(), target = %target.display(), "copying local output");
        if self.fs.is_dir(local) {
            self.copy_tree(local, &target)
        } else {
            self.fs.copy_file(local, &target).map_err(backend)
        }
    }

    fn entry(&self, path: &Path) -> Option<EntryKind> {
        if self.fs.is_dir(path) {
            Some(EntryKind::Collection)
        } else if self.fs.is_file(path) {
            Some(EntryKind::Object)
        } else {
            None
        }
    }

    /// Canonical form of `path`, which need not exist yet: the deepest
    /// existing ancestor is resolved and the missing tail appended.
    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let mut existing = path;
        let mut missing = Vec::new();
        while !existing.as_os_str().is_empty() && !self.fs.exists(existing) {
            let Some(name) = existing.file_name() else {
                break;
            };
            missing.push(name.to_os_string());
            existing = existing.parent().unwrap_or(Path::new(""));
        }

        let base = if existing.as_os_str().is_empty() {
            Path::new(".")
        } else {
            existing
        };
        let mut resolved = self.fs.canonicalize(base).map_err(backend)?;
        if resolved == Path::new(".") {
            resolved = PathBuf::new();
        }
        for name in missing.iter().rev() {
            resolved.push(name);
        }
        Ok(resolved)
    }

    fn copy_tree(&self, source: &Path, target: &Path) -> Result<()> {
        if self.resolve(target)?.starts_with(self.resolve(source)?) {
            return Err(ClustersideError::BackendError(format!(
                "cannot copy {} into itself ({})",
                source.display(),
                target.display()
            )));
        }

        let mut pending = vec![(source.to_path_buf(), target.to_path_buf())];

        while let Some((from, to)) = pending.pop() {
            self.fs.create_dir_all(&to).map_err(backend)?;
            for child in self.fs.read_dir(&from).map_err(backend)? {
                let Some(name) = child.file_name() else {
                    continue;
                };
                let dest = to.join(name);
                if self.fs.is_dir(&child) {
                    pending.push((child, dest));
                } else {
                    self.fs.copy_file(&child, &dest).map_err(backend)?;
                }
            }
        }

        Ok(())
    }
}

fn backend(e: anyhow::Error) -> ClustersideError {
    ClustersideError::BackendError(format!("{e:#}"))
}
