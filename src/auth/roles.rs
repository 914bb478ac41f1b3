//! Role-based permission matrix.
//!
//! Every gated route asks one question: may `role` perform `action` on
//! `resource`, and if so over which rows (`Scope`)? Updates additionally
//! consult the writable-field allowlist for the role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "customer" | "user" => Ok(Role::Customer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Orders,
    Tasks,
    Invoices,
    Notifications,
    Attachments,
    Users,
    ActivityLogs,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Orders => "orders",
            Resource::Tasks => "tasks",
            Resource::Invoices => "invoices",
            Resource::Notifications => "notifications",
            Resource::Attachments => "attachments",
            Resource::Users => "users",
            Resource::ActivityLogs => "activity_logs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// Which rows a granted action covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every row
    All,
    /// Rows owned by the caller
    Own,
    /// Rows assigned to the caller
    Assigned,
}

use Action::*;
use Resource::*;

const ADMIN: &[(Resource, &[Action], Scope)] = &[
    (Orders, &[List, Read, Create, Update, Delete], Scope::All),
    (Tasks, &[List, Read, Create, Update, Delete], Scope::All),
    (Invoices, &[List, Read, Create, Update, Delete], Scope::All),
    (Notifications, &[List, Update, Delete], Scope::Own),
    (Notifications, &[Create], Scope::All),
    (Attachments, &[List, Read, Create, Delete], Scope::All),
    (Users, &[List, Read, Update], Scope::All),
    (ActivityLogs, &[List], Scope::All),
];

const STAFF: &[(Resource, &[Action], Scope)] = &[
    (Orders, &[List, Read, Update], Scope::All),
    (Tasks, &[List, Read, Update], Scope::Assigned),
    (Notifications, &[List, Update, Delete], Scope::Own),
    (Attachments, &[List, Read, Create], Scope::All),
    (Users, &[Read], Scope::Own),
];

const CUSTOMER: &[(Resource, &[Action], Scope)] = &[
    (Orders, &[List, Read, Create, Update], Scope::Own),
    (Tasks, &[List, Read], Scope::Own),
    (Invoices, &[List, Read], Scope::Own),
    (Notifications, &[List, Update, Delete], Scope::Own),
    (Attachments, &[List, Read, Create, Delete], Scope::Own),
    (Users, &[Read], Scope::Own),
];

fn grants(role: Role) -> &'static [(Resource, &'static [Action], Scope)] {
    match role {
        Role::Admin => ADMIN,
        Role::Staff => STAFF,
        Role::Customer => CUSTOMER,
    }
}

/// Scope granted to `role` for `action` on `resource`, or `None` when denied
pub fn permission(role: Role, resource: Resource, action: Action) -> Option<Scope> {
    grants(role)
        .iter()
        .find(|(r, actions, _)| *r == resource && actions.contains(&action))
        .map(|(_, _, scope)| *scope)
}

/// Fields `role` may write through an update on `resource`
pub fn writable_fields(role: Role, resource: Resource) -> &'static [&'static str] {
    match (role, resource) {
        (Role::Admin, Orders) => &[
            "title",
            "description",
            "project_type",
            "requirements",
            "deadline",
            "amount",
            "status",
            "payment_status",
            "delivery_status",
            "progress",
            "admin_notes",
        ],
        (Role::Staff, Orders) => &["status", "delivery_status", "progress", "admin_notes"],
        (Role::Customer, Orders) => &[
            "title",
            "description",
            "project_type",
            "requirements",
            "deadline",
        ],
        (Role::Admin, Tasks) => &[
            "title",
            "description",
            "assigned_to",
            "status",
            "priority",
            "due_date",
        ],
        (Role::Staff, Tasks) => &["status"],
        (Role::Admin, Invoices) => &["line_items", "discount", "due_date", "notes", "status"],
        (Role::Admin, Users) => &["role", "full_name"],
        _ => &[],
    }
}

/// Field names in `patch` that `role` is not allowed to write
pub fn forbidden_fields<'a>(
    role: Role,
    resource: Resource,
    patch: &'a serde_json::Map<String, serde_json::Value>,
) -> Vec<&'a str> {
    let allowed = writable_fields(role, resource);
    patch
        .keys()
        .map(String::as_str)
        .filter(|key| !allowed.contains(key))
        .collect()
}
