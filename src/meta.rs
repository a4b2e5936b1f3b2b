//! Sidecar metadata store.
//!
//! A file's permission record lives next to it as `<name>.meta`; a directory's
//! lives inside it as `.meta`. Records are re-read on every decision.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{FileboxError, FileboxResult};
use crate::permission::{Permission, PermissionMode};

pub const META_EXT: &str = ".meta";
pub const DIR_META_NAME: &str = ".meta";

pub fn file_meta_path(file_path: &Path) -> PathBuf {
    let mut name = file_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(META_EXT);
    file_path.with_file_name(name)
}

pub fn dir_meta_path(dir_path: &Path) -> PathBuf {
    dir_path.join(DIR_META_NAME)
}

/// True when `path` names a sidecar (`<name>.meta` or a directory's `.meta`).
/// Sidecars are only reachable through `set_permission`, never as file content.
pub fn is_sidecar(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with(META_EXT))
        .unwrap_or(false)
}

/// Serialize `permission` and persist it at `meta_path`, creating the owning directory first.
pub fn write(meta_path: &Path, permission: &Permission) -> FileboxResult<()> {
    if let Some(parent) = meta_path.parent() {
        fs::create_dir_all(parent).map_err(|e| FileboxError::io(parent, e))?;
    }
    let json = serde_json::to_vec_pretty(permission).map_err(|e| FileboxError::Io {
        path: meta_path.to_path_buf(),
        source: std::io::Error::new(ErrorKind::InvalidData, e),
    })?;
    fs::write(meta_path, json).map_err(|e| FileboxError::Io { path: meta_path.to_path_buf(), source: e })?;
    debug!(meta = %meta_path.display(), "permission sidecar written");
    Ok(())
}

/// `Ok(None)` means no sidecar. A sidecar that exists but can't be read or decoded is an error.
pub fn read(meta_path: &Path) -> FileboxResult<Option<Permission>> {
    let bytes = match fs::read(meta_path) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(FileboxError::Io { path: meta_path.to_path_buf(), source: e }),
    };
    serde_json::from_slice::<Permission>(&bytes)
        .map(Some)
        .map_err(|e| FileboxError::Decode { path: meta_path.to_path_buf(), source: e })
}

/// Outcome of consulting one sidecar for one access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaDecision {
    /// No sidecar: the caller decides the default (fall back or allow).
    Absent,
    Allow,
    Deny,
}

/// Decide `mode` for `roles` from the sidecar at `meta_path`.
/// Unreadable or malformed sidecars deny everyone.
pub fn decide<S: AsRef<str>>(meta_path: &Path, mode: PermissionMode, roles: &[S]) -> MetaDecision {
    match read(meta_path) {
        Ok(None) => MetaDecision::Absent,
        Ok(Some(p)) => {
            if p.allows_any(mode, roles) { MetaDecision::Allow } else { MetaDecision::Deny }
        }
        Err(e) => {
            warn!(meta = %meta_path.display(), error = %e, "failing closed on unusable sidecar");
            MetaDecision::Deny
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sidecar_paths() {
        assert_eq!(file_meta_path(Path::new("/d/translations/en.csv")), PathBuf::from("/d/translations/en.csv.meta"));
        assert_eq!(dir_meta_path(Path::new("/d/translations")), PathBuf::from("/d/translations/.meta"));
    }

    #[test]
    fn sidecar_names_are_recognised() {
        assert!(is_sidecar(Path::new("/d/b.csv.meta")));
        assert!(is_sidecar(Path::new("/d/translations/.meta")));
        assert!(!is_sidecar(Path::new("/d/b.csv")));
        assert!(!is_sidecar(Path::new("/d/metadata.csv")));
    }

    #[test]
    fn missing_sidecar_reads_as_none() {
        let tmp = tempdir().unwrap();
        assert!(read(&tmp.path().join("a.csv.meta")).unwrap().is_none());
        assert_eq!(decide::<&str>(&tmp.path().join("a.csv.meta"), PermissionMode::Read, &[]), MetaDecision::Absent);
    }

    #[test]
    fn write_creates_parent_and_reads_back() {
        let tmp = tempdir().unwrap();
        let meta = tmp.path().join("nested/dir/.meta");
        let p = Permission::allow(PermissionMode::Update, ["admin"]);
        write(&meta, &p).unwrap();
        assert_eq!(read(&meta).unwrap(), Some(p));
    }

    #[test]
    fn malformed_sidecar_is_decode_error_and_denies() {
        let tmp = tempdir().unwrap();
        let meta = tmp.path().join("b.csv.meta");
        fs::write(&meta, b"{not json").unwrap();
        assert!(matches!(read(&meta), Err(FileboxError::Decode { .. })));
        assert_eq!(decide(&meta, PermissionMode::Read, &["admin"]), MetaDecision::Deny);
    }

    #[test]
    fn decide_matches_any_role() {
        let tmp = tempdir().unwrap();
        let meta = tmp.path().join("c.csv.meta");
        write(&meta, &Permission::allow(PermissionMode::Read, ["manager", "admin"])).unwrap();
        assert_eq!(decide(&meta, PermissionMode::Read, &["guest", "manager"]), MetaDecision::Allow);
        assert_eq!(decide(&meta, PermissionMode::Read, &["guest"]), MetaDecision::Deny);
        assert_eq!(decide::<&str>(&meta, PermissionMode::Read, &[]), MetaDecision::Deny);
    }
}
