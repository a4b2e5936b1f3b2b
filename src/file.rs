use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::dir::Dir;
use crate::error::{FileboxError, FileboxResult};
use crate::meta::{self, MetaDecision};
use crate::paths::clean_segments;
use crate::permission::{Permission, PermissionMode};

/// Access handle for one file under the base dir, bound to a caller's roles.
///
/// The file's own `<name>.meta` sidecar wins when present. Without one, every
/// decision is delegated to the parent directory handle.
#[derive(Debug, Clone)]
pub struct File {
    file_path: PathBuf,
    roles: Vec<String>,
    dir: Dir,
}

impl File {
    pub fn resolve<I, S>(base_dir: impl AsRef<Path>, logical_path: &str, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let base_dir = base_dir.as_ref();
        let roles: Vec<String> = roles.into_iter().map(Into::into).collect();
        let segments = clean_segments(logical_path);
        let parent = &segments[..segments.len().saturating_sub(1)];
        let dir = Dir::from_segments(base_dir, parent, roles.clone());
        let file_path = match segments.last() {
            Some(name) => dir.path().join(name),
            None => base_dir.to_path_buf(),
        };
        Self { file_path, roles, dir }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn dir(&self) -> &Dir {
        &self.dir
    }

    pub fn meta_path(&self) -> PathBuf {
        meta::file_meta_path(&self.file_path)
    }

    pub fn check_permission(&self, mode: PermissionMode) -> bool {
        match meta::decide(&self.meta_path(), mode, self.roles.as_slice()) {
            MetaDecision::Absent => self.dir.check_permission(mode),
            decision => {
                let allowed = decision == MetaDecision::Allow;
                debug!(file = %self.file_path.display(), %mode, roles = ?self.roles, allowed, "file permission check");
                allowed
            }
        }
    }

    /// Open the file for reading. Denial is reported as `PermissionDenied`, never as `NotFound`.
    /// Sidecars are not file content and read as `NotFound`.
    pub fn read(&self) -> FileboxResult<fs::File> {
        self.reject_sidecar()?;
        if !self.check_permission(PermissionMode::Read) {
            return Err(FileboxError::denied(PermissionMode::Read, &self.file_path));
        }
        fs::File::open(&self.file_path).map_err(|e| FileboxError::io(&self.file_path, e))
    }

    /// Replace the file's content with everything from `reader`.
    /// Not atomic: a copy that fails midway leaves a truncated file behind.
    pub fn write<R: Read>(&self, mut reader: R) -> FileboxResult<()> {
        self.reject_sidecar()?;
        if !self.check_permission(PermissionMode::Update) {
            return Err(FileboxError::denied(PermissionMode::Update, &self.file_path));
        }
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).map_err(|e| FileboxError::io(parent, e))?;
        }
        let mut dst = fs::File::create(&self.file_path).map_err(|e| FileboxError::io(&self.file_path, e))?;
        let written = io::copy(&mut reader, &mut dst).map_err(|e| FileboxError::io(&self.file_path, e))?;
        info!(file = %self.file_path.display(), bytes = written, "file written");
        Ok(())
    }

    pub fn set_permission(&self, permission: &Permission) -> FileboxResult<()> {
        self.reject_sidecar()?;
        meta::write(&self.meta_path(), permission)?;
        info!(file = %self.file_path.display(), "file permission set");
        Ok(())
    }

    fn reject_sidecar(&self) -> FileboxResult<()> {
        if meta::is_sidecar(&self.file_path) {
            debug!(file = %self.file_path.display(), "refusing sidecar as file content");
            return Err(FileboxError::NotFound { path: self.file_path.clone() });
        }
        Ok(())
    }
}
