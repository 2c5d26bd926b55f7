//! Application-facing account events
//!
//! An account reports three things to the application:
//!
//! - **Registration state** - every registration transition reported by the engine
//! - **Incoming call** - a call was admitted and is ringing
//! - **Missed call** - a call was auto-declined (busy or do-not-disturb)
//!
//! Events are delivered at most once per occurrence; nothing is persisted or
//! replayed. Implement [`AccountEventHandler`] to receive them directly, or use
//! [`BroadcastEmitter`] to fan them out to any number of subscribers over a
//! tokio broadcast channel.
//!
//! # Usage Examples
//!
//! ```rust
//! use rvoip_account_core::events::BroadcastEmitter;
//!
//! let emitter = BroadcastEmitter::new(16);
//! let events = emitter.subscribe();
//! assert_eq!(emitter.subscriber_count(), 1);
//! # drop(events);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::call::CallId;
use crate::registration::RegistrationStatus;

/// Why an incoming call was auto-declined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclineReason {
    /// Another call was already active on the account
    Busy,
    /// Do-not-disturb was on
    DoNotDisturb,
}

impl std::fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclineReason::Busy => write!(f, "busy"),
            DeclineReason::DoNotDisturb => write!(f, "do-not-disturb"),
        }
    }
}

/// Registration state change of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationStateInfo {
    /// Id URI of the account
    pub account_uri: String,
    /// Raw SIP status code reported by the engine
    pub status_code: u16,
    /// Classified status
    pub status: RegistrationStatus,
    /// When the change was observed
    pub timestamp: DateTime<Utc>,
}

/// A call that was admitted and is now ringing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingCallInfo {
    /// Id URI of the called account
    pub account_uri: String,
    /// Engine-assigned call id
    pub call_id: CallId,
    /// Caller display name (empty if unknown)
    pub display_name: String,
    /// Caller URI (empty if unknown)
    pub remote_uri: String,
    /// When the call was received
    pub received_at: DateTime<Utc>,
}

/// A call that was auto-declined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedCallInfo {
    /// Caller display name (empty if unknown)
    pub display_name: String,
    /// Caller URI (empty if unknown)
    pub remote_uri: String,
    /// Why the call was declined
    pub reason: DeclineReason,
    /// When the call was received
    pub received_at: DateTime<Utc>,
}

/// Unified account event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountEvent {
    /// Registration state changed
    RegistrationState(RegistrationStateInfo),
    /// Incoming call is ringing
    IncomingCall(IncomingCallInfo),
    /// Incoming call was auto-declined
    MissedCall(MissedCallInfo),
}

/// Receiver of account events
///
/// Handlers are invoked from the protocol engine's callback context and
/// should return quickly.
#[async_trait]
pub trait AccountEventHandler: Send + Sync {
    /// Registration state changed
    async fn on_registration_state(&self, info: RegistrationStateInfo);

    /// An admitted call started ringing
    async fn on_incoming_call(&self, info: IncomingCallInfo);

    /// An incoming call was auto-declined
    async fn on_missed_call(&self, info: MissedCallInfo);

    /// Dispatch a unified event to the specific handler methods
    async fn on_account_event(&self, event: AccountEvent) {
        match event {
            AccountEvent::RegistrationState(info) => self.on_registration_state(info).await,
            AccountEvent::IncomingCall(info) => self.on_incoming_call(info).await,
            AccountEvent::MissedCall(info) => self.on_missed_call(info).await,
        }
    }
}

/// Event handler that publishes every event on a broadcast channel
///
/// Events sent while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastEmitter {
    tx: broadcast::Sender<AccountEvent>,
}

impl BroadcastEmitter {
    /// Create an emitter buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<AccountEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn publish(&self, event: AccountEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No subscribers for account event");
        }
    }
}

#[async_trait]
impl AccountEventHandler for BroadcastEmitter {
    async fn on_registration_state(&self, info: RegistrationStateInfo) {
        self.publish(AccountEvent::RegistrationState(info));
    }

    async fn on_incoming_call(&self, info: IncomingCallInfo) {
        self.publish(AccountEvent::IncomingCall(info));
    }

    async fn on_missed_call(&self, info: MissedCallInfo) {
        self.publish(AccountEvent::MissedCall(info));
    }
}
