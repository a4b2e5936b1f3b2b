//! filebox: a permission-gated file store.
//!
//! Files live under a base directory; access rules live next to them in `.meta`
//! sidecars (`<file>.meta` for a file, `<dir>/.meta` for a directory). A file
//! without its own sidecar inherits its directory's rule, and a directory without
//! one is open to everyone. The `server` module exposes the store over HTTP.

pub mod config;
pub mod dir;
pub mod error;
pub mod file;
pub mod filebox;
pub mod identity;
pub mod meta;
pub mod paths;
pub mod permission;
pub mod server;

pub use dir::Dir;
pub use error::{FileboxError, FileboxResult};
pub use file::File;
pub use filebox::Filebox;
pub use permission::{Permission, PermissionMode};
