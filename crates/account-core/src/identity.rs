//! Account identity and dial target qualification
//!
//! An [`AccountIdentity`] is the equality key of an account: two accounts are
//! the same logical account if and only if their identities are equal. It also
//! knows how to turn a bare number or user part into a dialable SIP URI using
//! the account's realm.
//!
//! # Examples
//!
//! ```rust
//! use rvoip_account_core::AccountIdentity;
//!
//! let identity = AccountIdentity::new("sip:alice@example.com", "example.com");
//! assert_eq!(identity.qualify_destination("555"), "sip:555@example.com");
//! assert_eq!(identity.qualify_destination("sip:bob@other.com"), "sip:bob@other.com");
//!
//! let wildcard = AccountIdentity::new("sip:alice@example.com", "*");
//! assert_eq!(wildcard.qualify_destination("555"), "sip:555");
//! ```

use serde::{Deserialize, Serialize};

/// Realm value that accepts any domain
///
/// Bare dial targets on a wildcard-realm account are not qualified with a
/// domain at all.
pub const WILDCARD_REALM: &str = "*";

const SIP_SCHEME: &str = "sip:";

/// Immutable identity of a SIP account
///
/// Combines the account's id URI, its realm and whether push-based
/// registration refresh is disabled. All three participate in equality and
/// hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountIdentity {
    /// Account id URI (e.g., "sip:alice@example.com")
    id_uri: String,
    /// Realm/domain used to qualify bare dial targets, or `*`
    realm: String,
    /// Registration refresh relies on local timers instead of push wake-ups
    #[serde(default)]
    push_disabled: bool,
}

impl AccountIdentity {
    /// Create an identity with push-based registration refresh enabled
    pub fn new(id_uri: impl Into<String>, realm: impl Into<String>) -> Self {
        Self {
            id_uri: id_uri.into(),
            realm: realm.into(),
            push_disabled: false,
        }
    }

    /// Set whether push-based registration refresh is disabled
    pub fn with_push_disabled(mut self, push_disabled: bool) -> Self {
        self.push_disabled = push_disabled;
        self
    }

    /// Account id URI
    pub fn id_uri(&self) -> &str {
        &self.id_uri
    }

    /// Account realm
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Whether push-based registration refresh is disabled
    pub fn is_push_disabled(&self) -> bool {
        self.push_disabled
    }

    /// Whether the realm is the wildcard `*`
    pub fn has_wildcard_realm(&self) -> bool {
        self.realm == WILDCARD_REALM
    }

    /// Turn a dial target into a SIP URI
    ///
    /// Surrounding whitespace is dropped first. Then:
    ///
    /// - Targets already starting with `sip:` are returned verbatim.
    /// - With a wildcard realm the target becomes `sip:<target>`.
    /// - Otherwise it becomes `sip:<target>@<realm>`.
    pub fn qualify_destination(&self, target: &str) -> String {
        let target = target.trim();
        if target.starts_with(SIP_SCHEME) {
            target.to_string()
        } else if self.has_wildcard_realm() {
            format!("{}{}", SIP_SCHEME, target)
        } else {
            format!("{}{}@{}", SIP_SCHEME, target, self.realm)
        }
    }
}

impl std::fmt::Display for AccountIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id_uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(identity: &AccountIdentity) -> u64 {
        let mut hasher = DefaultHasher::new();
        identity.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_qualify_with_wildcard_realm() {
        let identity = AccountIdentity::new("sip:alice@example.com", "*");
        assert_eq!(identity.qualify_destination("555"), "sip:555");
    }

    #[test]
    fn test_qualify_with_concrete_realm() {
        let identity = AccountIdentity::new("sip:alice@example.com", "example.com");
        assert_eq!(identity.qualify_destination("555"), "sip:555@example.com");
    }

    #[test]
    fn test_sip_uri_used_verbatim() {
        let identity = AccountIdentity::new("sip:alice@example.com", "example.com");
        assert_eq!(
            identity.qualify_destination("sip:bob@other.com"),
            "sip:bob@other.com"
        );

        let wildcard = AccountIdentity::new("sip:alice@example.com", "*");
        assert_eq!(
            wildcard.qualify_destination("sip:bob@other.com"),
            "sip:bob@other.com"
        );
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let identity = AccountIdentity::new("sip:alice@example.com", "example.com");
        assert_eq!(
            identity.qualify_destination(" sip:bob@other.com\t"),
            "sip:bob@other.com"
        );
        assert_eq!(identity.qualify_destination(" 555 "), "sip:555@example.com");
    }

    #[test]
    fn test_equality_covers_every_field() {
        let a = AccountIdentity::new("sip:alice@example.com", "example.com");
        let b = AccountIdentity::new("sip:alice@example.com", "example.com");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        assert_ne!(a, AccountIdentity::new("sip:bob@example.com", "example.com"));
        assert_ne!(a, AccountIdentity::new("sip:alice@example.com", "*"));
        assert_ne!(a, b.clone().with_push_disabled(true));
    }

    #[test]
    fn test_push_disabled_defaults_to_false_when_deserializing() {
        let identity: AccountIdentity =
            serde_json::from_str(r#"{"id_uri":"sip:alice@example.com","realm":"*"}"#).unwrap();
        assert!(!identity.is_push_disabled());
        assert!(identity.has_wildcard_realm());
    }
}
