//! Limit values shared by domain ceilings and mailbox quotas.
//!
//! All limits use the same integer convention in storage:
//! `0` means unlimited, `-1` means disabled and a positive value is a
//! hard ceiling.

use std::fmt;

/// Storage units per MB of mailbox quota.
pub const QUOTA_MULTIPLIER: i64 = 1024;

/// A configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Limit {
    /// No new entities of this kind are permitted.
    Disabled,
    /// No ceiling.
    #[default]
    Unlimited,
    /// Hard ceiling.
    Max(i64),
}

impl Limit {
    /// Convert a stored value to a limit.
    ///
    /// Any negative value reads as disabled.
    pub fn from_raw(value: i64) -> Self {
        match value {
            v if v < 0 => Limit::Disabled,
            0 => Limit::Unlimited,
            v => Limit::Max(v),
        }
    }

    /// Stored integer representation.
    pub fn as_raw(&self) -> i64 {
        match self {
            Limit::Disabled => -1,
            Limit::Unlimited => 0,
            Limit::Max(v) => *v,
        }
    }

    /// Check that a raw value is in the canonical range {-1, 0, 1, 2, ...}.
    pub fn is_valid_raw(value: i64) -> bool {
        value >= -1
    }

    /// Whether `count` existing entities leave room for one more.
    pub fn admits_another(&self, count: i64) -> bool {
        match self {
            Limit::Disabled => false,
            Limit::Unlimited => true,
            Limit::Max(max) => count < *max,
        }
    }
}

impl From<i64> for Limit {
    fn from(value: i64) -> Self {
        Limit::from_raw(value)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Disabled => f.write_str("Disabled"),
            Limit::Unlimited => f.write_str("Unlimited"),
            Limit::Max(v) => write!(f, "{v}"),
        }
    }
}

/// Largest whole-MB quota whose storage value fits in an `i64`.
pub const MAX_QUOTA_MB: i64 = i64::MAX / QUOTA_MULTIPLIER;

/// A mailbox quota in MB, exact to one storage unit.
///
/// Holds whole megabytes plus the leftover storage units, so converting a
/// stored value to MB and back never loses precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaMb {
    whole: i64,
    remainder: i64,
}

impl QuotaMb {
    /// The disabled quota (`-1`).
    pub const DISABLED: QuotaMb = QuotaMb {
        whole: -1,
        remainder: 0,
    };

    /// A whole number of MB, or None when it does not fit in storage units.
    pub fn from_whole_mb(mb: i64) -> Option<Self> {
        if mb < 0 {
            return Some(Self::DISABLED);
        }
        if mb > MAX_QUOTA_MB {
            return None;
        }
        Some(Self {
            whole: mb,
            remainder: 0,
        })
    }

    /// Whole megabytes, `-1` when disabled.
    pub fn whole_mb(&self) -> i64 {
        self.whole
    }

    /// Storage units beyond the whole megabytes.
    pub fn remainder_units(&self) -> i64 {
        self.remainder
    }

    /// Approximate value for display.
    pub fn as_f64(&self) -> f64 {
        self.whole as f64 + self.remainder as f64 / QUOTA_MULTIPLIER as f64
    }
}

impl fmt::Display for QuotaMb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.remainder == 0 {
            write!(f, "{}", self.whole)
        } else {
            write!(f, "{:.3}", self.as_f64())
        }
    }
}

/// Convert a quota in MB to the stored unit.
///
/// The `0` and `-1` sentinels are stored unscaled.
pub fn quota_mb_to_storage_units(quota: QuotaMb) -> i64 {
    if quota.whole < 0 {
        return -1;
    }
    // whole and remainder always come from a value that fit in an i64
    quota.whole * QUOTA_MULTIPLIER + quota.remainder
}

/// Convert a stored quota to MB.
pub fn storage_units_to_quota_mb(units: i64) -> QuotaMb {
    if units < 0 {
        return QuotaMb::DISABLED;
    }
    QuotaMb {
        whole: units / QUOTA_MULTIPLIER,
        remainder: units % QUOTA_MULTIPLIER,
    }
}

/// Stored units for a whole-MB quota limit.
///
/// None when the quota is larger than [`MAX_QUOTA_MB`].
pub fn limit_to_storage_units(quota: Limit) -> Option<i64> {
    match quota {
        Limit::Max(mb) => mb.checked_mul(QUOTA_MULTIPLIER),
        other => Some(other.as_raw()),
    }
}

/// Quota limit in whole MB for a stored value, rounding partial MB up.
pub fn storage_units_to_limit(units: i64) -> Limit {
    if units <= 0 {
        return Limit::from_raw(units);
    }
    let whole = units / QUOTA_MULTIPLIER;
    if units % QUOTA_MULTIPLIER == 0 {
        Limit::Max(whole)
    } else {
        Limit::Max(whole + 1)
    }
}
