//! Error types for the account-core library
//!
//! Two layers of errors exist here:
//!
//! - [`EngineError`] - failures reported by the SIP protocol engine binding
//!   (malformed URI, transport trouble, missing registration, ...)
//! - [`AccountError`] - failures surfaced by the account layer itself
//!
//! Only [`AccountError::RegistrationSetup`] is fatal to an account. Everything
//! that can go wrong with an individual call is converted into logging and
//! graceful degradation by the [`AccountController`](crate::AccountController),
//! so one failing call never compromises the account's other calls.

use thiserror::Error;

use crate::call::CallId;

/// Result type for account operations
pub type AccountResult<T> = Result<T, AccountError>;

/// Result type for protocol engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by the SIP protocol engine binding
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The engine could not parse a SIP URI
    #[error("Invalid SIP URI: {uri}")]
    InvalidUri { uri: String },

    /// Transport level failure (socket, DNS, TLS handshake, ...)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The account has no usable registration
    #[error("Account is not registered")]
    NotRegistered,

    /// The engine does not know the call
    #[error("Call not found: {call_id}")]
    CallNotFound { call_id: CallId },

    /// The engine refused the request
    #[error("Request rejected: {reason}")]
    Rejected { reason: String },

    /// Internal engine error
    #[error("Internal engine error: {message}")]
    Internal { message: String },
}

impl EngineError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a rejection error
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Errors that can occur in the account layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountError {
    /// The registration could not be set up from the account configuration
    #[error("Registration setup failed: {reason}")]
    RegistrationSetup { reason: String },

    /// An outgoing call could not be established
    #[error("Dial to {target} failed: {reason}")]
    DialFailed { target: String, reason: String },

    /// Caller display name / URI lookup failed
    #[error("Caller info unavailable for call {call_id}: {reason}")]
    CallerInfoUnavailable { call_id: CallId, reason: String },

    /// Call control command failed in the engine
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

impl AccountError {
    /// Create a registration setup error
    pub fn registration_setup(reason: impl Into<String>) -> Self {
        Self::RegistrationSetup {
            reason: reason.into(),
        }
    }

    /// Create a dial failure
    pub fn dial_failed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DialFailed {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is fatal to the account
    ///
    /// Only setup errors are fatal; per-call failures leave the account and
    /// its other calls untouched.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AccountError::RegistrationSetup { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_setup_errors_are_fatal() {
        assert!(AccountError::registration_setup("bad uri").is_fatal());
        assert!(!AccountError::dial_failed("sip:555", "timeout").is_fatal());
        assert!(!AccountError::Engine(EngineError::NotRegistered).is_fatal());
    }

    #[test]
    fn test_engine_error_converts_into_account_error() {
        let err: AccountError = EngineError::transport("connection refused").into();
        assert_eq!(
            err.to_string(),
            "Engine error: Transport error: connection refused"
        );
    }
}
