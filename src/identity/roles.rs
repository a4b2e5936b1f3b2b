use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::principal::Principal;
use super::request_context::RequestContext;

/// A named role test. Predicates must be pure: same request and user, same answer.
pub type RolePredicate = Arc<dyn Fn(&RequestContext, Option<&Principal>) -> bool + Send + Sync>;

/// Role name -> predicate table. Owned by the host and handed to the `Filebox`;
/// predicates can be (re)registered at any time and take effect on the next request.
#[derive(Default)]
pub struct RoleRegistry {
    checkers: RwLock<BTreeMap<String, RolePredicate>>,
}

impl fmt::Debug for RoleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleRegistry").field("roles", &self.names()).finish()
    }
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry where each name tests whether the current principal carries that role.
    pub fn with_principal_roles<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let reg = Self::new();
        for name in names {
            let name: String = name.into();
            let wanted = name.clone();
            reg.register(name, move |_ctx, user| user.map(|u| u.has_role(&wanted)).unwrap_or(false));
        }
        reg
    }

    pub fn register<F>(&self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&RequestContext, Option<&Principal>) -> bool + Send + Sync + 'static,
    {
        self.checkers.write().insert(name.into(), Arc::new(predicate));
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.checkers.write().remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<RolePredicate> {
        self.checkers.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.checkers.read().keys().cloned().collect()
    }

    /// Names of every registered role whose predicate passes, in name order.
    /// Predicates run on a snapshot, so they may themselves touch the registry.
    pub fn matched_roles(&self, ctx: &RequestContext, user: Option<&Principal>) -> Vec<String> {
        let snapshot: Vec<(String, RolePredicate)> =
            self.checkers.read().iter().map(|(name, check)| (name.clone(), check.clone())).collect();
        snapshot
            .into_iter()
            .filter(|(_, check)| check(ctx, user))
            .map(|(name, _)| name)
            .collect()
    }
}
