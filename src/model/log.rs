//! Audit log entries.

use std::fmt;
use std::str::FromStr;

/// Administrative action recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// A domain was added.
    CreateDomain,
    /// A domain was edited.
    EditDomain,
    /// A domain and everything it owned was removed.
    DeleteDomain,
    /// An admin was added.
    CreateAdmin,
    /// An admin was edited.
    EditAdmin,
    /// An admin was removed.
    DeleteAdmin,
    /// A mailbox was added.
    CreateMailbox,
    /// A mailbox was edited.
    EditMailbox,
    /// A mailbox was removed.
    DeleteMailbox,
    /// A mailbox's forwarding changed.
    EditForward,
    /// An alias was added.
    CreateAlias,
    /// An alias was edited.
    EditAlias,
    /// An alias was removed.
    DeleteAlias,
}

impl Action {
    /// Name stored in the `action` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateDomain => "create_domain",
            Action::EditDomain => "edit_domain",
            Action::DeleteDomain => "delete_domain",
            Action::CreateAdmin => "create_admin",
            Action::EditAdmin => "edit_admin",
            Action::DeleteAdmin => "delete_admin",
            Action::CreateMailbox => "create_mailbox",
            Action::EditMailbox => "edit_mailbox",
            Action::DeleteMailbox => "delete_mailbox",
            Action::EditForward => "edit_forward",
            Action::CreateAlias => "create_alias",
            Action::EditAlias => "edit_alias",
            Action::DeleteAlias => "delete_alias",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s {
            "create_domain" => Action::CreateDomain,
            "edit_domain" => Action::EditDomain,
            "delete_domain" => Action::DeleteDomain,
            "create_admin" => Action::CreateAdmin,
            "edit_admin" => Action::EditAdmin,
            "delete_admin" => Action::DeleteAdmin,
            "create_mailbox" => Action::CreateMailbox,
            "edit_mailbox" => Action::EditMailbox,
            "delete_mailbox" => Action::DeleteMailbox,
            "edit_forward" => Action::EditForward,
            "create_alias" => Action::CreateAlias,
            "edit_alias" => Action::EditAlias,
            "delete_alias" => Action::DeleteAlias,
            _ => return Err(format!("unknown action: {s}")),
        };
        Ok(action)
    }
}

/// Stored audit log row.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LogEntry {
    /// Row id, increasing with insertion order.
    pub id: i64,
    /// UTC timestamp with millisecond precision.
    pub timestamp: String,
    /// Acting user.
    pub username: String,
    /// Affected domain.
    pub domain: String,
    /// Action name.
    pub action: String,
    /// Free-form payload.
    pub data: String,
}

impl LogEntry {
    /// Parsed action, if the name is known.
    pub fn action(&self) -> Option<Action> {
        self.action.parse().ok()
    }
}

/// Data for appending an audit entry.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    /// Acting user.
    pub username: String,
    /// Affected domain.
    pub domain: String,
    /// Action.
    pub action: Action,
    /// Free-form payload.
    pub data: String,
}
