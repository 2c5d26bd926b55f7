//! Account configuration
//!
//! [`AccountConfig`] carries everything the protocol engine needs to set up a
//! registration for one account: the [`AccountIdentity`], registrar location,
//! digest credentials and timing parameters. Loading and storing it is left to
//! the application; the type is `serde` (de)serializable so any format works.
//!
//! # Examples
//!
//! ```rust
//! use rvoip_account_core::{AccountConfig, AccountIdentity, TransportKind};
//!
//! let config = AccountConfig::new(
//!     AccountIdentity::new("sip:alice@example.com", "example.com"),
//!     "sip:registrar.example.com",
//! )
//! .with_credentials("alice", "secret123")
//! .with_transport(TransportKind::Tcp)
//! .with_expires(1800);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.expires, 1800);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{AccountError, AccountResult};
use crate::identity::AccountIdentity;

/// Default registration expiration in seconds
pub const DEFAULT_REGISTRATION_EXPIRES: u32 = 300;

/// Transport used for SIP signaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// UDP (default)
    #[default]
    Udp,
    /// TCP
    Tcp,
    /// TLS over TCP
    Tls,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Udp => write!(f, "UDP"),
            TransportKind::Tcp => write!(f, "TCP"),
            TransportKind::Tls => write!(f, "TLS"),
        }
    }
}

/// Configuration for one SIP account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Identity of the account (equality key)
    pub identity: AccountIdentity,

    /// SIP registrar URI (e.g., "sip:registrar.example.com")
    pub registrar_uri: String,

    /// Digest authentication username
    #[serde(default)]
    pub username: Option<String>,

    /// Digest authentication password
    ///
    /// Never logged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Registration expiration time in seconds
    #[serde(default = "default_expires")]
    pub expires: u32,

    /// Signaling transport
    #[serde(default)]
    pub transport: TransportKind,

    /// Extra parameters appended to the Contact URI (e.g., push tokens)
    #[serde(default)]
    pub contact_params: Option<String>,
}

fn default_expires() -> u32 {
    DEFAULT_REGISTRATION_EXPIRES
}

impl AccountConfig {
    /// Create a configuration with default timing and no credentials
    pub fn new(identity: AccountIdentity, registrar_uri: impl Into<String>) -> Self {
        Self {
            identity,
            registrar_uri: registrar_uri.into(),
            username: None,
            password: None,
            expires: DEFAULT_REGISTRATION_EXPIRES,
            transport: TransportKind::default(),
            contact_params: None,
        }
    }

    /// Set digest authentication credentials
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the registration expiration time in seconds
    pub fn with_expires(mut self, expires: u32) -> Self {
        self.expires = expires;
        self
    }

    /// Set the signaling transport
    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    /// Set extra Contact URI parameters
    pub fn with_contact_params(mut self, params: impl Into<String>) -> Self {
        self.contact_params = Some(params.into());
        self
    }

    /// Check the configuration before handing it to the engine
    ///
    /// Returns [`AccountError::RegistrationSetup`] describing the first
    /// problem found.
    pub fn validate(&self) -> AccountResult<()> {
        validate_sip_uri("account id URI", self.identity.id_uri(), true)?;
        validate_sip_uri("registrar URI", &self.registrar_uri, false)?;

        if self.identity.realm().trim().is_empty() {
            return Err(AccountError::registration_setup("realm must not be empty"));
        }
        if self.expires == 0 {
            return Err(AccountError::registration_setup(
                "registration expiration must be greater than zero",
            ));
        }
        if self.password.is_some() && self.username.as_deref().map_or(true, str::is_empty) {
            return Err(AccountError::registration_setup(
                "password given without a username",
            ));
        }
        Ok(())
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> AccountResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AccountError::registration_setup(format!("invalid account configuration: {}", e)))
    }

    /// Serialize the configuration to JSON
    pub fn to_json(&self) -> AccountResult<String> {
        serde_json::to_string(self)
            .map_err(|e| AccountError::registration_setup(format!("cannot serialize account configuration: {}", e)))
    }
}

fn validate_sip_uri(what: &str, uri: &str, require_user: bool) -> AccountResult<()> {
    let rest = uri
        .strip_prefix("sips:")
        .or_else(|| uri.strip_prefix("sip:"))
        .ok_or_else(|| AccountError::registration_setup(format!("{} must start with sip: or sips: ({})", what, uri)))?;

    if rest.is_empty() || rest.chars().any(char::is_whitespace) {
        return Err(AccountError::registration_setup(format!("malformed {}: {}", what, uri)));
    }

    if require_user {
        match rest.split_once('@') {
            Some((user, host)) if !user.is_empty() && !host.is_empty() => {}
            _ => {
                return Err(AccountError::registration_setup(format!(
                    "{} must be of the form sip:user@host ({})",
                    what, uri
                )))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AccountConfig {
        AccountConfig::new(
            AccountIdentity::new("sip:alice@example.com", "example.com"),
            "sip:registrar.example.com",
        )
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.expires, DEFAULT_REGISTRATION_EXPIRES);
        assert_eq!(config.transport, TransportKind::Udp);
        assert_eq!(config.username, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed_uris() {
        let bad_scheme = AccountConfig::new(
            AccountIdentity::new("alice@example.com", "example.com"),
            "sip:registrar.example.com",
        );
        assert!(matches!(bad_scheme.validate(), Err(AccountError::RegistrationSetup { .. })));

        let no_user = AccountConfig::new(
            AccountIdentity::new("sip:example.com", "example.com"),
            "sip:registrar.example.com",
        );
        assert!(no_user.validate().is_err());

        let bad_registrar = AccountConfig::new(
            AccountIdentity::new("sip:alice@example.com", "example.com"),
            "registrar example com",
        );
        assert!(bad_registrar.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert!(config().with_expires(0).validate().is_err());

        let mut orphan_password = config();
        orphan_password.password = Some("secret".to_string());
        assert!(orphan_password.validate().is_err());

        let empty_realm = AccountConfig::new(
            AccountIdentity::new("sip:alice@example.com", " "),
            "sip:registrar.example.com",
        );
        assert!(empty_realm.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_identity() {
        let original = config()
            .with_credentials("alice", "secret")
            .with_transport(TransportKind::Tls)
            .with_contact_params("pn-tok=abc");
        let json = original.to_json().unwrap();
        assert!(json.contains("\"tls\""));

        let parsed = AccountConfig::from_json(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let parsed = AccountConfig::from_json(
            r#"{
                "identity": {"id_uri": "sip:alice@example.com", "realm": "*", "push_disabled": true},
                "registrar_uri": "sip:registrar.example.com"
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.expires, DEFAULT_REGISTRATION_EXPIRES);
        assert!(parsed.identity.is_push_disabled());
        assert!(AccountConfig::from_json("{").is_err());
    }
}
