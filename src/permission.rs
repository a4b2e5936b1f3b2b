//! Permission records: allow/deny role lists keyed by access mode.
//!
//! A record is what a `.meta` sidecar holds. Its JSON form is a small,
//! human-editable object:
//!
//! ```json
//! { "allow": { "read": ["admin", "manager"] }, "deny": {} }
//! ```
//!
//! Sidecars written by older deployments used `AllowedRoles` / `DeniedRoles`
//! (with `null` for an empty side); both spellings decode.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PermissionMode {
    Create,
    Read,
    #[serde(alias = "write")]
    Update,
    Delete,
    /// Matches every mode when present in a record.
    Crud,
}

impl PermissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionMode::Create => "create",
            PermissionMode::Read => "read",
            PermissionMode::Update => "update",
            PermissionMode::Delete => "delete",
            PermissionMode::Crud => "crud",
        }
    }
}

impl Display for PermissionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type RoleTable = BTreeMap<PermissionMode, Vec<String>>;

fn nullable_table<'de, D>(d: D) -> Result<RoleTable, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RoleTable>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    #[serde(default, alias = "AllowedRoles", deserialize_with = "nullable_table")]
    pub allow: RoleTable,
    #[serde(default, alias = "DeniedRoles", deserialize_with = "nullable_table")]
    pub deny: RoleTable,
}

fn role_list<I, S>(roles: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    roles.into_iter().map(Into::into).collect()
}

impl Permission {
    /// Build a record granting `mode` to exactly `roles`.
    pub fn allow<I, S>(mode: PermissionMode, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut allow = RoleTable::new();
        allow.insert(mode, role_list(roles));
        Self { allow, deny: RoleTable::new() }
    }

    pub fn and_allow<I, S>(mut self, mode: PermissionMode, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow.entry(mode).or_default().extend(role_list(roles));
        self
    }

    pub fn and_deny<I, S>(mut self, mode: PermissionMode, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deny.entry(mode).or_default().extend(role_list(roles));
        self
    }

    fn listed(table: &RoleTable, mode: PermissionMode, role: &str) -> bool {
        [mode, PermissionMode::Crud]
            .iter()
            .filter_map(|m| table.get(m))
            .any(|roles| roles.iter().any(|r| r == role))
    }

    /// True iff `role` is allowed `mode` and not explicitly denied it.
    pub fn has_permission(&self, mode: PermissionMode, role: &str) -> bool {
        if Self::listed(&self.deny, mode, role) {
            return false;
        }
        Self::listed(&self.allow, mode, role)
    }

    /// One matching caller role is enough. An empty caller set never matches.
    pub fn allows_any<S: AsRef<str>>(&self, mode: PermissionMode, roles: &[S]) -> bool {
        roles.iter().any(|r| self.has_permission(mode, r.as_ref()))
    }
}
