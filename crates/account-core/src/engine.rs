//! Protocol engine contract
//!
//! The SIP/RTP stack is a black box to this crate. It is reached through two
//! narrow traits:
//!
//! - [`ProtocolEngine`] - commands the account layer issues to the engine
//!   (create a registration, dial, answer, decline, hang up, describe the
//!   remote party of a call)
//! - [`AccountCallbacks`] - notifications the engine delivers to an account
//!   (registration state changes, incoming INVITEs, dialog teardown)
//!
//! The engine binding keeps one `Arc<dyn AccountCallbacks>` per account and
//! invokes it from its own event-processing task.
//!
//! ```text
//! ┌──────────────────────┐   AccountCallbacks    ┌────────────────────┐
//! │   Protocol engine    │ ────────────────────► │ AccountController  │
//! │  (registration,      │                       │  admission policy  │
//! │   INVITE/BYE, media) │ ◄──────────────────── │  call registry     │
//! └──────────────────────┘    ProtocolEngine     └────────────────────┘
//! ```

use async_trait::async_trait;

use crate::call::CallId;
use crate::config::AccountConfig;
use crate::error::EngineResult;

/// 180 Ringing
pub const SIP_RINGING: u16 = 180;

/// 200 OK
pub const SIP_OK: u16 = 200;

/// Options for an outgoing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialOptions {
    /// Id URI of the account placing the call
    pub from_uri: String,
    /// Optional Subject header value
    pub subject: Option<String>,
}

impl DialOptions {
    /// Options for a call placed from `from_uri`
    pub fn new(from_uri: impl Into<String>) -> Self {
        Self {
            from_uri: from_uri.into(),
            subject: None,
        }
    }

    /// Set the Subject header
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// Remote party description of a call, as reported by the engine
///
/// `remote_uri` is the raw name-addr of the remote party, e.g.
/// `"Alice Smith" <sip:alice@example.com>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteParty {
    /// Raw remote name-addr
    pub remote_uri: String,
    /// Local URI the dialog was established with
    pub local_uri: String,
}

/// Commands the account layer sends to the SIP protocol engine
///
/// All commands are fire-and-forget: they return once the engine accepted the
/// request, not when the remote party answered.
#[async_trait]
pub trait ProtocolEngine: Send + Sync {
    /// Create (and start refreshing) the registration for an account
    async fn create_registration(&self, config: &AccountConfig) -> EngineResult<()>;

    /// Remove the registration of the account identified by `account_uri`
    async fn remove_registration(&self, account_uri: &str) -> EngineResult<()>;

    /// Send an INVITE to `target`, returning the engine-assigned call id
    async fn dial(&self, target: &str, options: &DialOptions) -> EngineResult<CallId>;

    /// Respond to an incoming INVITE with `status_code` (e.g. 180, 200)
    async fn answer(&self, call_id: CallId, status_code: u16) -> EngineResult<()>;

    /// Reject an incoming INVITE as busy / temporarily unavailable
    async fn decline(&self, call_id: CallId) -> EngineResult<()>;

    /// Terminate an established or early dialog
    async fn hangup(&self, call_id: CallId) -> EngineResult<()>;

    /// Describe the remote party of a call
    async fn remote_party(&self, call_id: CallId) -> EngineResult<RemoteParty>;
}

/// Notifications the protocol engine delivers to one account
#[async_trait]
pub trait AccountCallbacks: Send + Sync {
    /// Registration state changed; `raw_message` is the whole SIP response
    async fn on_registration_state_changed(&self, status_code: u16, raw_message: &str);

    /// A new INVITE arrived for this account
    async fn on_incoming_call(&self, call_id: CallId);

    /// The dialog identified by `call_id` has ended
    async fn on_call_terminated(&self, call_id: CallId);
}
