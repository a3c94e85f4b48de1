//! Address and domain name validation.
//!
//! Every key in the directory is stored lower-case; these helpers normalise
//! input and check the shapes the mail agents expect.

use validator::{ValidateEmail, ValidationError};

/// Name of the sentinel domain whose grant means "every domain".
pub const ALL_DOMAINS: &str = "ALL";

/// Maximum length of a domain name.
pub const MAX_DOMAIN_LENGTH: usize = 253;

/// Maximum length of a single domain label.
pub const MAX_LABEL_LENGTH: usize = 63;

/// Maximum length of an email address.
pub const MAX_ADDRESS_LENGTH: usize = 254;

/// Normalise a key: trim surrounding whitespace and lower-case.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Normalise a domain key, keeping the `ALL` sentinel upper-case.
pub fn normalize_domain(value: &str) -> String {
    if value.trim().eq_ignore_ascii_case(ALL_DOMAINS) {
        return ALL_DOMAINS.to_string();
    }
    normalize(value)
}

/// Check whether `name` is a DNS-like domain name.
///
/// At least two labels, each 1-63 characters of `[a-z0-9-]` that neither
/// starts nor ends with a hyphen, and an alphabetic top-level label.
///
/// ```
/// use postadm::model::address::is_domain_name;
///
/// assert!(is_domain_name("example.com"));
/// assert!(!is_domain_name("ALL"));
/// assert!(!is_domain_name("-bad.com"));
/// ```
pub fn is_domain_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_DOMAIN_LENGTH {
        return false;
    }
    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LENGTH
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    });
    let tld_ok = labels
        .last()
        .map(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_lowercase()))
        .unwrap_or(false);
    labels_ok && tld_ok
}

/// Split an address into `(local_part, domain)` at the last `@`.
pub fn split_address(address: &str) -> Option<(&str, &str)> {
    let (local, domain) = address.rsplit_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some((local, domain))
}

/// Check whether `address` is a lower-case email address on a valid domain.
pub fn is_email(address: &str) -> bool {
    if address.len() > MAX_ADDRESS_LENGTH || address.chars().any(char::is_whitespace) {
        return false;
    }
    if address != address.to_lowercase() {
        return false;
    }
    match split_address(address) {
        Some((_, domain)) => address.to_string().validate_email() && is_domain_name(domain),
        None => false,
    }
}

/// Check whether `address` is a catch-all alias address (`@domain`).
pub fn is_catch_all(address: &str) -> bool {
    address
        .strip_prefix('@')
        .map(is_domain_name)
        .unwrap_or(false)
}

/// Domain part of an alias address, including catch-all addresses.
pub fn alias_domain(address: &str) -> Option<&str> {
    if is_catch_all(address) {
        return address.strip_prefix('@');
    }
    split_address(address).map(|(_, domain)| domain)
}

/// Split a comma-separated goto list into normalised destinations.
pub fn parse_goto(goto: &str) -> Vec<String> {
    goto.split(',')
        .map(normalize)
        .filter(|dest| !dest.is_empty())
        .collect()
}

/// Join destinations into the stored comma-separated form.
pub fn join_goto<S: AsRef<str>>(destinations: &[S]) -> String {
    destinations
        .iter()
        .map(|d| d.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}

// ----- validator custom functions -----

pub(crate) fn validate_domain_name(value: &str) -> Result<(), ValidationError> {
    if is_domain_name(value) {
        Ok(())
    } else {
        Err(ValidationError::new("domain_name"))
    }
}

pub(crate) fn validate_email_address(value: &str) -> Result<(), ValidationError> {
    if is_email(value) {
        Ok(())
    } else {
        Err(ValidationError::new("email_address"))
    }
}

pub(crate) fn validate_alias_address(value: &str) -> Result<(), ValidationError> {
    if is_email(value) || is_catch_all(value) {
        Ok(())
    } else {
        Err(ValidationError::new("alias_address"))
    }
}

pub(crate) fn validate_goto(value: &str) -> Result<(), ValidationError> {
    let destinations: Vec<&str> = value.split(',').collect();
    if destinations.iter().all(|dest| is_email(dest)) {
        Ok(())
    } else {
        Err(ValidationError::new("goto"))
    }
}

pub(crate) fn validate_local_part(value: &str) -> Result<(), ValidationError> {
    let ok = !value.is_empty()
        && !value.contains('@')
        && !value.chars().any(|c| c.is_whitespace() || c == ',');
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("local_part"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Example.COM "), "example.com");
    }

    #[test]
    fn test_normalize_domain_keeps_sentinel() {
        assert_eq!(normalize_domain(" all "), "ALL");
        assert_eq!(normalize_domain("ALL"), "ALL");
        assert_eq!(normalize_domain("Example.COM"), "example.com");
    }

    #[test]
    fn test_domain_names() {
        assert!(is_domain_name("example.com"));
        assert!(is_domain_name("mail.example.co.uk"));
        assert!(is_domain_name("xn--bcher-kva.de"));
        assert!(is_domain_name("a1-b2.example.org"));

        assert!(!is_domain_name(""));
        assert!(!is_domain_name("localhost"));
        assert!(!is_domain_name("ALL"));
        assert!(!is_domain_name("Example.com"));
        assert!(!is_domain_name("exa mple.com"));
        assert!(!is_domain_name("example..com"));
        assert!(!is_domain_name("-example.com"));
        assert!(!is_domain_name("example-.com"));
        assert!(!is_domain_name("example.c"));
        assert!(!is_domain_name("example.123"));
        assert!(!is_domain_name(&format!("{}.com", "a".repeat(64))));
    }

    #[test]
    fn test_split_address() {
        assert_eq!(
            split_address("alice@example.com"),
            Some(("alice", "example.com"))
        );
        assert_eq!(split_address("alice"), None);
        assert_eq!(split_address("@example.com"), None);
        assert_eq!(split_address("alice@"), None);
    }

    #[test]
    fn test_is_email() {
        assert!(is_email("alice@example.com"));
        assert!(is_email("first.last+tag@mail.example.org"));

        assert!(!is_email("alice"));
        assert!(!is_email("alice@localhost"));
        assert!(!is_email("Alice@example.com"));
        assert!(!is_email("al ice@example.com"));
        assert!(!is_email("@example.com"));
    }

    #[test]
    fn test_catch_all() {
        assert!(is_catch_all("@example.com"));
        assert!(!is_catch_all("alice@example.com"));
        assert!(!is_catch_all("@nodot"));
        assert_eq!(alias_domain("@example.com"), Some("example.com"));
        assert_eq!(alias_domain("bob@example.com"), Some("example.com"));
        assert_eq!(alias_domain("garbage"), None);
    }

    #[test]
    fn test_goto_parsing() {
        assert_eq!(
            parse_goto("A@example.com, b@example.org,,"),
            vec!["a@example.com".to_string(), "b@example.org".to_string()]
        );
        assert_eq!(
            join_goto(&["a@example.com", "b@example.org"]),
            "a@example.com,b@example.org"
        );
        assert!(parse_goto(" , ").is_empty());
    }

    #[test]
    fn test_validate_goto() {
        assert!(validate_goto("a@example.com").is_ok());
        assert!(validate_goto("a@example.com,b@example.org").is_ok());
        assert!(validate_goto("").is_err());
        assert!(validate_goto("a@example.com,").is_err());
        assert!(validate_goto("not-an-address").is_err());
    }

    #[test]
    fn test_validate_local_part() {
        assert!(validate_local_part("alice").is_ok());
        assert!(validate_local_part("").is_err());
        assert!(validate_local_part("a@b").is_err());
        assert!(validate_local_part("a b").is_err());
    }
}
