use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{FileboxError, FileboxResult};
use crate::file::File;
use crate::meta::{self, MetaDecision};
use crate::paths::{clean_segments, logical_string};
use crate::permission::{Permission, PermissionMode};

/// Access handle for one directory under the base dir, bound to a caller's roles.
/// A directory without a `.meta` sidecar is unrestricted; it is the end of the fallback chain.
#[derive(Debug, Clone)]
pub struct Dir {
    dir_path: PathBuf,
    logical: String,
    roles: Vec<String>,
    base_dir: PathBuf,
}

impl Dir {
    pub fn resolve<I, S>(base_dir: impl AsRef<Path>, logical_dir: &str, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments = clean_segments(logical_dir);
        Self::from_segments(base_dir.as_ref(), &segments, roles.into_iter().map(Into::into).collect())
    }

    pub(crate) fn from_segments(base_dir: &Path, segments: &[String], roles: Vec<String>) -> Self {
        let mut dir_path = base_dir.to_path_buf();
        for seg in segments {
            dir_path.push(seg);
        }
        Self { dir_path, logical: logical_string(segments), roles, base_dir: base_dir.to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.dir_path
    }

    /// Path relative to the base dir, '/'-separated; "" for the base dir itself.
    pub fn logical_path(&self) -> &str {
        &self.logical
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn meta_path(&self) -> PathBuf {
        meta::dir_meta_path(&self.dir_path)
    }

    pub fn check_permission(&self, mode: PermissionMode) -> bool {
        let decision = meta::decide(&self.meta_path(), mode, self.roles.as_slice());
        let allowed = decision != MetaDecision::Deny;
        debug!(dir = %self.dir_path.display(), %mode, roles = ?self.roles, ?decision, allowed, "dir permission check");
        allowed
    }

    /// Write `reader` to `name` inside this directory, creating the directory first.
    /// The new file is checked with this directory's roles; its errors propagate unchanged.
    pub fn write_file<R: Read>(&self, name: &str, reader: R) -> FileboxResult<File> {
        self.create_if_not_exist()?;
        let logical = if self.logical.is_empty() { name.to_string() } else { format!("{}/{}", self.logical, name) };
        let file = File::resolve(&self.base_dir, &logical, self.roles.iter().cloned());
        file.write(reader)?;
        Ok(file)
    }

    pub fn set_permission(&self, permission: &Permission) -> FileboxResult<()> {
        self.create_if_not_exist()?;
        meta::write(&self.meta_path(), permission)?;
        info!(dir = %self.dir_path.display(), "directory permission set");
        Ok(())
    }

    fn create_if_not_exist(&self) -> FileboxResult<()> {
        fs::create_dir_all(&self.dir_path).map_err(|e| FileboxError::io(&self.dir_path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolve_cleans_logical_path() {
        let d = Dir::resolve("/srv/box", "/public/../private/", ["admin"]);
        assert_eq!(d.path(), Path::new("/srv/box/private"));
        assert_eq!(d.logical_path(), "private");
        assert_eq!(d.roles(), ["admin".to_string()]);
        assert_eq!(Dir::resolve("/srv/box", ".", Vec::<String>::new()).logical_path(), "");
    }

    #[test]
    fn no_sidecar_is_unrestricted_even_for_nobody() {
        let tmp = tempdir().unwrap();
        let d = Dir::resolve(tmp.path(), "public", Vec::<String>::new());
        assert!(d.check_permission(PermissionMode::Read));
        assert!(d.check_permission(PermissionMode::Update));
    }

    #[test]
    fn set_permission_creates_directory_and_applies_immediately() {
        let tmp = tempdir().unwrap();
        let d = Dir::resolve(tmp.path(), "private", ["admin"]);
        d.set_permission(&Permission::allow(PermissionMode::Update, ["admin"])).unwrap();
        assert!(d.path().is_dir());
        assert!(d.meta_path().is_file());
        assert!(d.check_permission(PermissionMode::Update));
        // read is not listed, so nobody may read
        assert!(!d.check_permission(PermissionMode::Read));
        let anon = Dir::resolve(tmp.path(), "private", Vec::<String>::new());
        assert!(!anon.check_permission(PermissionMode::Update));
    }

    #[test]
    fn write_file_creates_directory_and_file() {
        let tmp = tempdir().unwrap();
        let d = Dir::resolve(tmp.path(), "public/reports", Vec::<String>::new());
        let f = d.write_file("a.csv", &b"Hello"[..]).unwrap();
        assert_eq!(f.path(), tmp.path().join("public/reports/a.csv"));
        assert_eq!(fs::read(f.path()).unwrap(), b"Hello");
    }

    #[test]
    fn write_file_propagates_denial() {
        let tmp = tempdir().unwrap();
        let admin = Dir::resolve(tmp.path(), "private", ["admin"]);
        admin.set_permission(&Permission::allow(PermissionMode::Update, ["admin"])).unwrap();
        let anon = Dir::resolve(tmp.path(), "private", Vec::<String>::new());
        let err = anon.write_file("a.csv", &b"nope"[..]).unwrap_err();
        assert!(err.is_permission_denied());
        assert!(!tmp.path().join("private/a.csv").exists());
    }
}
