//! Registration status model
//!
//! The protocol engine reports registration transitions as raw SIP status
//! codes. [`RegistrationStatus`] classifies those codes so the account can keep
//! track of where its registration stands without interpreting SIP itself.
//!
//! # Examples
//!
//! ```rust
//! use rvoip_account_core::RegistrationStatus;
//!
//! assert_eq!(RegistrationStatus::from_status_code(200), RegistrationStatus::Active);
//! assert_eq!(RegistrationStatus::from_status_code(401), RegistrationStatus::Challenged);
//! assert_eq!(RegistrationStatus::from_status_code(503), RegistrationStatus::Failed);
//! ```

use serde::{Deserialize, Serialize};

/// Current status of an account's SIP registration
///
/// Typical flow: `Unregistered` → `Pending` → `Active` →
/// `Expired`/`Failed`/`Cancelled`, with `Challenged` in between when the
/// registrar asks for credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationStatus {
    /// No registration has been created yet
    Unregistered,
    /// REGISTER sent, or a provisional response received
    Pending,
    /// The registrar accepted the registration
    Active,
    /// The registrar asked for authentication (401/407)
    Challenged,
    /// The registration timed out or was not refreshed in time (408)
    Expired,
    /// The registrar rejected the registration
    Failed,
    /// The account removed its registration
    Cancelled,
}

impl RegistrationStatus {
    /// Classify a SIP status code reported by the engine
    pub fn from_status_code(code: u16) -> Self {
        match code {
            100..=199 => RegistrationStatus::Pending,
            200..=299 => RegistrationStatus::Active,
            401 | 407 => RegistrationStatus::Challenged,
            408 => RegistrationStatus::Expired,
            _ => RegistrationStatus::Failed,
        }
    }

    /// Whether the account can currently receive calls
    pub fn is_registered(&self) -> bool {
        matches!(self, RegistrationStatus::Active)
    }
}

impl Default for RegistrationStatus {
    fn default() -> Self {
        RegistrationStatus::Unregistered
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Unregistered => write!(f, "Unregistered"),
            RegistrationStatus::Pending => write!(f, "Pending"),
            RegistrationStatus::Active => write!(f, "Active"),
            RegistrationStatus::Challenged => write!(f, "Challenged"),
            RegistrationStatus::Expired => write!(f, "Expired"),
            RegistrationStatus::Failed => write!(f, "Failed"),
            RegistrationStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}
