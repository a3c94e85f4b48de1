//! Alias model.
//!
//! Aliases share the address space with mailboxes: every mailbox owns a
//! self-alias whose goto includes its own address, and a pure alias is an
//! alias row with no mailbox behind it.

use validator::Validate;

use super::address::{
    alias_domain, join_goto, normalize, parse_goto, validate_alias_address, validate_domain_name,
    validate_goto,
};
use crate::error::{Entity, PostadmError};
use crate::Result;

/// Alias entity.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Alias {
    /// Address (unique).
    pub address: String,
    /// Comma-separated destinations.
    pub goto: String,
    /// Owning domain.
    pub domain: String,
    /// Creation timestamp.
    pub created: String,
    /// Last modification timestamp.
    pub modified: String,
    /// Whether the alias is active.
    pub active: bool,
}

impl Alias {
    /// Destinations as a list.
    pub fn destinations(&self) -> Vec<String> {
        parse_goto(&self.goto)
    }

    /// True if the goto differs from the alias's own address.
    ///
    /// For a mailbox's self-alias this means the mailbox also forwards.
    pub fn is_forward(&self) -> bool {
        self.goto != self.address
    }

    /// True if the destinations include the alias's own address.
    pub fn delivers_locally(&self) -> bool {
        self.destinations().iter().any(|d| d == &self.address)
    }
}

/// Data for creating a new alias.
#[derive(Debug, Clone, Validate)]
pub struct NewAlias {
    /// Address or catch-all (`@domain`).
    #[validate(custom(function = "validate_alias_address"))]
    pub address: String,
    /// Comma-separated destinations.
    #[validate(custom(function = "validate_goto"))]
    pub goto: String,
    /// Owning domain.
    #[validate(custom(function = "validate_domain_name"))]
    pub domain: String,
    /// Active flag.
    pub active: bool,
}

impl NewAlias {
    /// Create a draft from an address and a comma-separated goto list.
    pub fn new(address: impl Into<String>, goto: &str) -> Self {
        let address = normalize(&address.into());
        let domain = alias_domain(&address).unwrap_or_default().to_string();
        Self {
            goto: join_goto(&parse_goto(goto)),
            address,
            domain,
            active: true,
        }
    }

    /// Create the self-alias paired with a mailbox.
    pub fn self_alias(address: &str, domain: &str) -> Self {
        Self {
            address: address.to_string(),
            goto: address.to_string(),
            domain: domain.to_string(),
            active: true,
        }
    }

    /// Set the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Validate every field.
    pub fn normalized(self) -> Result<Self> {
        self.validate()
            .map_err(|e| PostadmError::from_validation(Entity::Alias, e))?;
        Ok(self)
    }
}

/// Build a normalised goto string, failing on empty or malformed lists.
pub fn normalized_goto<S: AsRef<str>>(destinations: &[S]) -> Result<String> {
    let list: Vec<String> = destinations
        .iter()
        .flat_map(|d| parse_goto(d.as_ref()))
        .collect();
    let mut unique: Vec<String> = Vec::with_capacity(list.len());
    for dest in list {
        if !unique.contains(&dest) {
            unique.push(dest);
        }
    }
    let goto = join_goto(&unique);
    validate_goto(&goto).map_err(|_| PostadmError::invalid(Entity::Alias, "goto"))?;
    Ok(goto)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_alias_derives_domain() {
        let draft = NewAlias::new("Info@Example.com", "a@example.org, B@example.net");
        assert_eq!(draft.address, "info@example.com");
        assert_eq!(draft.domain, "example.com");
        assert_eq!(draft.goto, "a@example.org,b@example.net");
        assert!(draft.normalized().is_ok());
    }

    #[test]
    fn test_catch_all_alias() {
        let draft = NewAlias::new("@example.com", "postmaster@example.org");
        assert_eq!(draft.domain, "example.com");
        assert!(draft.normalized().is_ok());
    }

    #[test]
    fn test_empty_goto_rejected() {
        let err = NewAlias::new("info@example.com", " , ").normalized().unwrap_err();
        assert!(matches!(err, PostadmError::InvalidFormat { fields, .. } if fields == vec!["goto"]));
    }

    #[test]
    fn test_malformed_address_rejected() {
        let err = NewAlias::new("info", "a@example.org").normalized().unwrap_err();
        match err {
            PostadmError::InvalidFormat { fields, .. } => {
                assert_eq!(fields, vec!["address", "domain"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_self_alias() {
        let draft = NewAlias::self_alias("alice@example.com", "example.com");
        assert_eq!(draft.goto, "alice@example.com");
        assert_eq!(draft.address, draft.goto);
    }

    #[test]
    fn test_forward_detection() {
        let mut alias = Alias {
            address: "alice@example.com".to_string(),
            goto: "alice@example.com".to_string(),
            domain: "example.com".to_string(),
            created: String::new(),
            modified: String::new(),
            active: true,
        };
        assert!(!alias.is_forward());
        assert!(alias.delivers_locally());

        alias.goto = "alice@example.com,alice@gmail.com".to_string();
        assert!(alias.is_forward());
        assert!(alias.delivers_locally());

        alias.goto = "alice@gmail.com".to_string();
        assert!(alias.is_forward());
        assert!(!alias.delivers_locally());
    }

    #[test]
    fn test_normalized_goto_dedups() {
        let goto = normalized_goto(&["a@example.com", "A@example.com,b@example.com"]).unwrap();
        assert_eq!(goto, "a@example.com,b@example.com");
        assert!(normalized_goto::<&str>(&[]).is_err());
        assert!(normalized_goto(&["nope"]).is_err());
    }
}
