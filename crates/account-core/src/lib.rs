//! # Account Core - SIP account coordination layer
//!
//! This crate manages a single SIP registration identity ("account") and the
//! calls concurrently associated with it. It sits between a SIP protocol
//! engine, which does the actual signaling, and an application that wants
//! simple lifecycle events.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────┐
//! │      Application        │  AccountEventHandler / BroadcastEmitter
//! └───────────▲─────────────┘
//!             │ registration state, incoming call, missed call
//! ┌───────────┴─────────────┐
//! │   AccountController     │  admission policy, DND, ring indication
//! │ ┌─────────────────────┐ │
//! │ │    CallRegistry     │ │  CallId -> Call
//! │ └─────────────────────┘ │
//! └───────────▲─────────────┘
//!             │ AccountCallbacks / ProtocolEngine
//! ┌───────────┴─────────────┐
//! │    SIP protocol engine  │
//! └─────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rvoip_account_core::{
//!     AccountConfig, AccountController, AccountIdentity, AccountService, BroadcastEmitter,
//!     DndFlag, ProtocolEngine,
//! };
//!
//! # async fn example(
//! #     engine: Arc<dyn ProtocolEngine>,
//! #     service: Arc<dyn AccountService>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let config = AccountConfig::new(
//!     AccountIdentity::new("sip:alice@example.com", "example.com"),
//!     "sip:registrar.example.com",
//! )
//! .with_credentials("alice", "secret");
//!
//! let emitter = Arc::new(BroadcastEmitter::new(64));
//! let mut events = emitter.subscribe();
//!
//! let account = Arc::new(AccountController::new(
//!     config,
//!     engine,
//!     emitter,
//!     service,
//!     Arc::new(DndFlag::new(false)),
//! ));
//! account.create().await?;
//!
//! if let Some(call) = account.add_outgoing_call("555").await {
//!     println!("dialing, call id {}", call.id());
//! }
//!
//! while let Ok(event) = events.recv().await {
//!     println!("account event: {:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod call;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod identity;
pub mod registration;
pub mod registry;
pub mod service;

// Re-export main types
pub use account::{AccountController, AdmissionDecision};
pub use call::{Call, CallDirection, CallId, CallerInfo};
pub use config::{AccountConfig, TransportKind};
pub use engine::{AccountCallbacks, DialOptions, ProtocolEngine, RemoteParty};
pub use error::{AccountError, AccountResult, EngineError, EngineResult};
pub use events::{
    AccountEvent, AccountEventHandler, BroadcastEmitter, DeclineReason, IncomingCallInfo,
    MissedCallInfo, RegistrationStateInfo,
};
pub use identity::AccountIdentity;
pub use registration::RegistrationStatus;
pub use registry::CallRegistry;
pub use service::{AccountService, DndFlag, DndProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
