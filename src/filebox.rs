use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;

use crate::dir::Dir;
use crate::file::File;
use crate::identity::{AuthProvider, Principal, RequestContext, RoleRegistry};

/// Handle on a base directory. Mints per-request `File`/`Dir` accessors and carries the
/// collaborators the download gateway needs: an optional auth provider and the role registry.
pub struct Filebox {
    base_dir: PathBuf,
    auth: Option<Arc<dyn AuthProvider>>,
    roles: Arc<RoleRegistry>,
}

impl std::fmt::Debug for Filebox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filebox")
            .field("base_dir", &self.base_dir)
            .field("auth", &self.auth.is_some())
            .field("roles", &self.roles)
            .finish()
    }
}

impl Filebox {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into(), auth: None, roles: Arc::new(RoleRegistry::new()) }
    }

    pub fn with_roles(mut self, roles: Arc<RoleRegistry>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn set_auth(&mut self, auth: Arc<dyn AuthProvider>) {
        self.auth = Some(auth);
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn auth(&self) -> Option<&Arc<dyn AuthProvider>> {
        self.auth.as_ref()
    }

    pub fn access_file<I, S>(&self, logical_path: &str, roles: I) -> File
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        File::resolve(&self.base_dir, logical_path, roles)
    }

    pub fn access_dir<I, S>(&self, logical_dir: &str, roles: I) -> Dir
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Dir::resolve(&self.base_dir, logical_dir, roles)
    }

    /// Current user (None without an auth provider) and the roles that match them.
    pub fn resolve_roles(&self, ctx: &RequestContext) -> (Option<Principal>, Vec<String>) {
        let user = self.auth.as_ref().and_then(|a| a.current_user(ctx));
        let roles = self.roles.matched_roles(ctx, user.as_ref());
        (user, roles)
    }

    /// Register `GET <mount>/{*path}` on `router`, serving this filebox.
    pub fn mount_to(self: &Arc<Self>, mount: &str, router: Router) -> Router {
        router.merge(crate::server::download_router(self.clone(), mount))
    }
}
