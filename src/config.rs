//! Server configuration.
//!
//! Layers, lowest to highest precedence: built-in defaults, an optional JSON file,
//! environment variables, command-line flags.

use std::path::{Path, PathBuf};

use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};

use crate::error::{FileboxError, FileboxResult};

pub const ENV_CONFIG: &str = "FILEBOX_CONFIG";
pub const ENV_BASE_DIR: &str = "FILEBOX_BASE_DIR";
pub const ENV_MOUNT: &str = "FILEBOX_MOUNT";
pub const ENV_HTTP_PORT: &str = "FILEBOX_HTTP_PORT";
pub const ENV_LOGIN_URL: &str = "FILEBOX_LOGIN_URL";

/// Trusted-header identity settings. When absent the gateway runs without an auth
/// provider: denied downloads answer 404 instead of redirecting to a login page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeaderAuthConfig {
    pub user_header: String,
    pub roles_header: String,
    pub login_url: String,
}

impl Default for HeaderAuthConfig {
    fn default() -> Self {
        Self {
            user_header: "x-remote-user".to_string(),
            roles_header: "x-remote-roles".to_string(),
            login_url: "/auth/login".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileboxConfig {
    pub base_dir: String,
    pub mount_to: String,
    pub http_port: u16,
    /// Role names registered as "principal carries this role" predicates.
    pub roles: Vec<String>,
    pub auth: Option<HeaderAuthConfig>,
}

impl Default for FileboxConfig {
    fn default() -> Self {
        Self {
            base_dir: "filebox".to_string(),
            mount_to: "/downloads".to_string(),
            http_port: 7878,
            roles: Vec::new(),
            auth: None,
        }
    }
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn arg_values(args: &[String], flag: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            out.push(args[i + 1].clone());
            i += 1;
        }
        i += 1;
    }
    out
}

fn parse_port(source: &str, val: &str) -> FileboxResult<u16> {
    val.trim()
        .parse::<u16>()
        .map_err(|_| FileboxError::Config(format!("{} is not a valid port: '{}'", source, val)))
}

impl FileboxConfig {
    pub fn from_json_file(path: &Path) -> FileboxResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| FileboxError::io(path, e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| FileboxError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Overlay environment values. `lookup` is `std::env::var(..).ok()` in the binary.
    pub fn apply_env<F>(&mut self, lookup: F) -> FileboxResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_BASE_DIR) {
            self.base_dir = v;
        }
        if let Some(v) = lookup(ENV_MOUNT) {
            self.mount_to = v;
        }
        if let Some(v) = lookup(ENV_HTTP_PORT) {
            self.http_port = parse_port(ENV_HTTP_PORT, &v)?;
        }
        if let Some(v) = lookup(ENV_LOGIN_URL) {
            self.auth.get_or_insert_with(HeaderAuthConfig::default).login_url = v;
        }
        Ok(())
    }

    /// Overlay command-line flags: `--base-dir`, `--mount`, `--http-port`, `--login-url`,
    /// and `--role NAME` (repeatable, appended to configured roles).
    pub fn apply_args(&mut self, args: &[String]) -> FileboxResult<()> {
        if let Some(v) = arg_value(args, "--base-dir") {
            self.base_dir = v;
        }
        if let Some(v) = arg_value(args, "--mount") {
            self.mount_to = v;
        }
        if let Some(v) = arg_value(args, "--http-port") {
            self.http_port = parse_port("--http-port", &v)?;
        }
        if let Some(v) = arg_value(args, "--login-url") {
            self.auth.get_or_insert_with(HeaderAuthConfig::default).login_url = v;
        }
        for role in arg_values(args, "--role") {
            if !self.roles.contains(&role) {
                self.roles.push(role);
            }
        }
        Ok(())
    }

    /// Defaults -> `--config`/`FILEBOX_CONFIG` JSON file -> environment -> flags.
    pub fn load<F>(args: &[String], lookup: F) -> FileboxResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = arg_value(args, "--config").or_else(|| lookup(ENV_CONFIG));
        let mut cfg = match file {
            Some(p) => Self::from_json_file(Path::new(&p))?,
            None => Self::default(),
        };
        cfg.apply_env(&lookup)?;
        cfg.apply_args(args)?;
        Ok(cfg)
    }

    /// Absolute base directory, normalized without touching the filesystem.
    pub fn resolved_base_dir(&self) -> FileboxResult<PathBuf> {
        if self.base_dir.trim().is_empty() {
            return Err(FileboxError::Config("base_dir cannot be empty".to_string()));
        }
        let p = PathBuf::from(&self.base_dir);
        let abs = p.absolutize().map_err(|e| FileboxError::io(&p, e))?;
        Ok(abs.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults() {
        let cfg = FileboxConfig::default();
        assert_eq!(cfg.mount_to, "/downloads");
        assert_eq!(cfg.http_port, 7878);
        assert!(cfg.auth.is_none());
    }

    #[test]
    fn args_override_env() {
        let env: HashMap<&str, &str> = [(ENV_HTTP_PORT, "9000"), (ENV_BASE_DIR, "/env/box")].into_iter().collect();
        let cfg = FileboxConfig::load(
            &args(&["filebox_server", "--http-port", "9100", "--role", "admin", "--role", "manager"]),
            |k| env.get(k).map(|v| v.to_string()),
        )
        .unwrap();
        assert_eq!(cfg.http_port, 9100);
        assert_eq!(cfg.base_dir, "/env/box");
        assert_eq!(cfg.roles, vec!["admin", "manager"]);
        assert!(cfg.auth.is_none());
    }

    #[test]
    fn login_url_enables_header_auth() {
        let mut cfg = FileboxConfig::default();
        cfg.apply_args(&args(&["--login-url", "/sso/login"])).unwrap();
        let auth = cfg.auth.unwrap();
        assert_eq!(auth.login_url, "/sso/login");
        assert_eq!(auth.user_header, "x-remote-user");
    }

    #[test]
    fn bad_port_is_config_error() {
        let mut cfg = FileboxConfig::default();
        let err = cfg.apply_env(|k| (k == ENV_HTTP_PORT).then(|| "http".to_string())).unwrap_err();
        assert_eq!(err.code_str(), "config_error");
    }

    #[test]
    fn json_file_layer_with_partial_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("filebox.json");
        std::fs::write(&path, r#"{"base_dir":"/data/box","roles":["admin"],"auth":{"login_url":"/login"}}"#).unwrap();
        let cfg = FileboxConfig::load(&args(&["--config", path.to_str().unwrap()]), |_| None).unwrap();
        assert_eq!(cfg.base_dir, "/data/box");
        assert_eq!(cfg.mount_to, "/downloads");
        assert_eq!(cfg.roles, vec!["admin"]);
        let auth = cfg.auth.unwrap();
        assert_eq!(auth.login_url, "/login");
        assert_eq!(auth.roles_header, "x-remote-roles");
    }

    #[test]
    fn base_dir_is_absolutized() {
        let cfg = FileboxConfig { base_dir: "data/../box".to_string(), ..Default::default() };
        let p = cfg.resolved_base_dir().unwrap();
        assert!(p.is_absolute());
        assert!(p.ends_with("box"));
        let empty = FileboxConfig { base_dir: " ".to_string(), ..Default::default() };
        assert!(empty.resolved_base_dir().is_err());
    }
}
