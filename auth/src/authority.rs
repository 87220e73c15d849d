use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Prefix marking a role-level authority (`ROLE_ADMIN`).
pub const ROLE_PREFIX: &str = "ROLE_";

/// Authority that grants the administrative ownership override.
pub const ADMIN_AUTHORITY: &str = "ROLE_ADMIN";

/// A single capability, unique per `(resource, action)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub resource: String,
    pub action: String,
}

impl Permission {
    /// Create a permission for `action` on `resource`.
    ///
    /// # Arguments
    /// * `resource` - Resource name (e.g. `USER`)
    /// * `action` - Action name (e.g. `READ`)
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// Authority string form, `RESOURCE:ACTION`.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.resource, self.action)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

/// Named role carrying a fully materialized permission set.
///
/// Names are normalized on construction: upper-cased, with a leading
/// `ROLE_` removed so the prefix is never duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RoleRecord")]
pub struct Role {
    name: String,
    permissions: BTreeSet<Permission>,
}

/// Wire shape of a role; `permissions` may be absent or null.
#[derive(Deserialize)]
struct RoleRecord {
    name: String,
    #[serde(default)]
    permissions: Option<BTreeSet<Permission>>,
}

impl From<RoleRecord> for Role {
    fn from(record: RoleRecord) -> Self {
        Role::new(record.name).with_permissions(record.permissions.unwrap_or_default())
    }
}

impl Role {
    /// Create a role without permissions.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: normalize_role_name(name.as_ref()),
            permissions: BTreeSet::new(),
        }
    }

    /// Attach permissions to the role.
    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    /// Role-level authority, `ROLE_<NAME>`.
    pub fn authority(&self) -> String {
        format!("{}{}", ROLE_PREFIX, self.name)
    }
}

/// Normalize a role name: upper-case, strip one leading `ROLE_`.
pub fn normalize_role_name(name: &str) -> String {
    let upper = name.trim().to_uppercase();
    match upper.strip_prefix(ROLE_PREFIX) {
        Some(stripped) => stripped.to_string(),
        None => upper,
    }
}

/// Flatten a role graph into its authority set.
///
/// Yields `ROLE_<name>` for every role plus `RESOURCE:ACTION` for every
/// permission of every role. Total over any input, including an empty one.
pub fn resolve_authorities<'a, I>(roles: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a Role>,
{
    roles
        .into_iter()
        .flat_map(|role| {
            std::iter::once(role.authority())
                .chain(role.permissions.iter().map(Permission::authority))
        })
        .collect()
}

/// Distinct role names (without prefix) of a role graph.
pub fn role_names<'a, I>(roles: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Role>,
{
    roles
        .into_iter()
        .map(|role| role.name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct `RESOURCE:ACTION` strings of a role graph.
pub fn permission_authorities<'a, I>(roles: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Role>,
{
    roles
        .into_iter()
        .flat_map(|role| role.permissions.iter().map(Permission::authority))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// True for role-level authorities (`ROLE_X`), false for `RESOURCE:ACTION`.
pub fn is_role_authority(authority: &str) -> bool {
    authority.starts_with(ROLE_PREFIX) && !authority.contains(':')
}
