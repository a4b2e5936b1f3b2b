//! Unified filebox error model and mapping helpers.
//! Library operations return `FileboxResult`; only the HTTP gateway turns these
//! into terminal responses, and it folds most of them into 404.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::permission::PermissionMode;

#[derive(Debug, Error)]
pub enum FileboxError {
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Kept distinct from `NotFound` so the gateway can pick redirect vs 404.
    #[error("doesn't have permission to {mode} {}", path.display())]
    PermissionDenied { mode: PermissionMode, path: PathBuf },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed permission sidecar {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type FileboxResult<T> = Result<T, FileboxError>;

impl FileboxError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == std::io::ErrorKind::NotFound {
            return FileboxError::NotFound { path };
        }
        FileboxError::Io { path, source }
    }

    pub fn denied(mode: PermissionMode, path: impl AsRef<Path>) -> Self {
        FileboxError::PermissionDenied { mode, path: path.as_ref().to_path_buf() }
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            FileboxError::NotFound { .. } => "not_found",
            FileboxError::PermissionDenied { .. } => "permission_denied",
            FileboxError::Io { .. } => "io_error",
            FileboxError::Decode { .. } => "decode_error",
            FileboxError::Config(_) => "config_error",
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, FileboxError::PermissionDenied { .. })
    }
}
