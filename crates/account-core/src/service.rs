//! Service-wide collaborators of an account
//!
//! These are the pieces of the surrounding application an account needs but
//! does not own:
//!
//! - [`DndProvider`] - the service-wide do-not-disturb switch
//! - [`AccountService`] - local ring indication and registration-expiry
//!   tracking for push-based accounts
//!
//! [`DndFlag`] is a ready-made [`DndProvider`] backed by an atomic boolean
//! that the application can toggle from any thread.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

/// Source of the service-wide do-not-disturb state
///
/// Read once per incoming-call decision.
pub trait DndProvider: Send + Sync {
    /// Whether incoming calls should be auto-declined
    fn is_do_not_disturb(&self) -> bool;
}

/// Atomically readable do-not-disturb switch
///
/// # Examples
///
/// ```rust
/// use rvoip_account_core::{DndFlag, DndProvider};
///
/// let dnd = DndFlag::new(false);
/// dnd.set(true);
/// assert!(dnd.is_do_not_disturb());
/// ```
#[derive(Debug, Default)]
pub struct DndFlag {
    enabled: AtomicBool,
}

impl DndFlag {
    /// Create a switch in the given state
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Turn do-not-disturb on or off
    pub fn set(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

impl DndProvider for DndFlag {
    fn is_do_not_disturb(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Application services an account delegates to
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Start local ring indication (ringtone, vibration, ...)
    async fn start_ring_indication(&self);

    /// Feed a registration response to the expiry tracker
    ///
    /// Only called for accounts relying on push-based registration refresh,
    /// which otherwise get no timely notice of a silently expired
    /// registration.
    async fn check_registration_timeout(&self, raw_message: &str, account_uri: &str);
}
