//! Quota usage snapshot reported by the delivery agent.

/// Usage row from the `quota2` table. Read-only for postadm.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct QuotaUsage {
    /// Mailbox address.
    pub username: String,
    /// Bytes stored.
    pub bytes: i64,
    /// Messages stored.
    pub messages: i64,
}

impl QuotaUsage {
    /// Zero usage for a mailbox the agent has not reported yet.
    pub fn empty(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            bytes: 0,
            messages: 0,
        }
    }

    /// Percentage of `quota_bytes` in use, or None when the quota is not a ceiling.
    pub fn percent_of(&self, quota_bytes: i64) -> Option<f64> {
        if quota_bytes <= 0 {
            return None;
        }
        Some(self.bytes as f64 / quota_bytes as f64 * 100.0)
    }
}
