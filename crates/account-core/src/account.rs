//! Account controller
//!
//! [`AccountController`] owns one SIP account: its configuration, its
//! [`CallRegistry`] and the incoming-call admission policy. The protocol
//! engine drives it through [`AccountCallbacks`]; the application drives it
//! through [`AccountController::add_outgoing_call`] and the read-only call
//! accessors.
//!
//! # Admission Policy
//!
//! Every incoming INVITE is registered first, then evaluated:
//!
//! ```text
//! NEW --(registered in registry)--> EVALUATING
//! EVALUATING --(active calls > 1 OR DND)--> DECLINED  busy sent, missed call emitted
//! EVALUATING --(otherwise)---------------> RINGING   180 sent, incoming call emitted
//! ```
//!
//! The threshold is evaluated after insertion, so the first call always rings
//! and any call arriving while another one is active is declined.
//!
//! # Failure Handling
//!
//! Only [`AccountController::create`] returns a fatal error. Dial failures,
//! caller-info lookup failures and failing call-control commands are logged
//! and degrade gracefully so the account's other calls and its registration
//! are never affected.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::call::{Call, CallDirection, CallId, CallerInfo};
use crate::config::AccountConfig;
use crate::engine::{AccountCallbacks, DialOptions, ProtocolEngine};
use crate::error::{AccountError, AccountResult};
use crate::events::{
    AccountEventHandler, DeclineReason, IncomingCallInfo, MissedCallInfo, RegistrationStateInfo,
};
use crate::identity::AccountIdentity;
use crate::registration::RegistrationStatus;
use crate::registry::CallRegistry;
use crate::service::{AccountService, DndProvider};

/// Outcome of evaluating an incoming call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// 180 Ringing was sent and the application was notified
    Ringing,
    /// The call was declined and reported as missed
    Declined {
        /// Why the call was declined
        reason: DeclineReason,
    },
    /// The call was admitted but the ringing response could not be sent
    Aborted {
        /// Engine error text
        reason: String,
    },
}

/// State guarded by the admission lock
#[derive(Debug, Default)]
struct AdmissionState {
    /// Outgoing dials whose call id is not known yet
    dials_in_flight: usize,
    /// Teardowns reported for unknown ids while a dial was in flight
    ended_while_dialing: HashSet<CallId>,
}

/// Controller for a single SIP account and its concurrent calls
pub struct AccountController {
    config: AccountConfig,
    calls: CallRegistry,
    /// Serializes admission decisions with outgoing-call registration
    admission: Mutex<AdmissionState>,
    registration: RwLock<RegistrationStatus>,
    engine: Arc<dyn ProtocolEngine>,
    events: Arc<dyn AccountEventHandler>,
    service: Arc<dyn AccountService>,
    dnd: Arc<dyn DndProvider>,
}

impl std::fmt::Debug for AccountController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountController")
            .field("identity", self.identity())
            .field("calls", &self.calls.ids())
            .field("registration", &*self.registration.read())
            .finish()
    }
}

impl AccountController {
    /// Create a controller for `config`
    ///
    /// Nothing is sent to the engine until [`create`](Self::create) is called.
    pub fn new(
        config: AccountConfig,
        engine: Arc<dyn ProtocolEngine>,
        events: Arc<dyn AccountEventHandler>,
        service: Arc<dyn AccountService>,
        dnd: Arc<dyn DndProvider>,
    ) -> Self {
        Self {
            config,
            calls: CallRegistry::new(),
            admission: Mutex::new(AdmissionState::default()),
            registration: RwLock::new(RegistrationStatus::Unregistered),
            engine,
            events,
            service,
            dnd,
        }
    }

    /// Account configuration
    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Account identity
    pub fn identity(&self) -> &AccountIdentity {
        &self.config.identity
    }

    /// Account id URI
    pub fn uri(&self) -> &str {
        self.config.identity.id_uri()
    }

    /// Last registration status reported by the engine
    pub fn registration_status(&self) -> RegistrationStatus {
        *self.registration.read()
    }

    /// Set up the registration with the protocol engine
    ///
    /// Fails with [`AccountError::RegistrationSetup`] if the configuration is
    /// invalid or the engine rejects it. No retry is attempted.
    ///
    /// The status becomes `Pending` before the engine is asked, so a state
    /// change the engine reports while registration is being set up is kept.
    pub async fn create(&self) -> AccountResult<()> {
        if let Err(e) = self.config.validate() {
            error!(account = %self.uri(), "Invalid account configuration: {}", e);
            return Err(e);
        }

        let previous = std::mem::replace(
            &mut *self.registration.write(),
            RegistrationStatus::Pending,
        );

        if let Err(e) = self.engine.create_registration(&self.config).await {
            error!(account = %self.uri(), "Engine rejected registration: {}", e);
            let mut status = self.registration.write();
            if *status == RegistrationStatus::Pending {
                *status = previous;
            }
            return Err(AccountError::registration_setup(e.to_string()));
        }

        info!(
            account = %self.uri(),
            registrar = %self.config.registrar_uri,
            transport = %self.config.transport,
            "Registration created"
        );
        Ok(())
    }

    /// Remove the registration and forget every active call
    pub async fn shutdown(&self) -> AccountResult<()> {
        let result = self.engine.remove_registration(self.uri()).await;
        let dropped = self.calls.clear();
        *self.registration.write() = RegistrationStatus::Cancelled;

        match result {
            Ok(()) => {
                info!(account = %self.uri(), dropped_calls = dropped, "Account shut down");
                Ok(())
            }
            Err(e) => {
                warn!(account = %self.uri(), "Failed to remove registration: {}", e);
                Err(e.into())
            }
        }
    }

    // ===== CALL BOOKKEEPING =====

    fn new_call(&self, call_id: CallId, direction: CallDirection) -> Call {
        Call::new(call_id, direction, self.identity().clone(), self.engine.clone())
    }

    /// Register a call received from the engine
    pub fn add_incoming_call(&self, call_id: CallId) -> Call {
        let call = self.new_call(call_id, CallDirection::Incoming);
        self.calls.insert(call_id, call.clone());
        debug!(account = %self.uri(), call_id = %call_id, "Added incoming call");
        call
    }

    /// Place an outgoing call
    ///
    /// Returns `None` if the engine could not dial; the reason is logged and
    /// the registry is left untouched. Use [`dial`](Self::dial) to get the
    /// error instead.
    pub async fn add_outgoing_call(&self, destination: &str) -> Option<Call> {
        match self.dial(destination).await {
            Ok(call) => Some(call),
            Err(e) => {
                error!(account = %self.uri(), "Error while making outgoing call: {}", e);
                None
            }
        }
    }

    /// Place an outgoing call, reporting why it failed
    ///
    /// Bare numbers are qualified against the account realm, see
    /// [`AccountIdentity::qualify_destination`].
    pub async fn dial(&self, destination: &str) -> AccountResult<Call> {
        self.dial_with_options(destination, DialOptions::new(self.uri()))
            .await
    }

    /// Place an outgoing call with explicit dial options
    ///
    /// An empty `from_uri` is replaced with the account URI. The destination
    /// is handed to [`AccountIdentity::qualify_destination`] as given; a
    /// blank one is rejected without contacting the engine.
    ///
    /// If the engine reports the dialog ended before `dial` returned, the
    /// call handle is still returned but the call is not registered.
    pub async fn dial_with_options(
        &self,
        destination: &str,
        mut options: DialOptions,
    ) -> AccountResult<Call> {
        if destination.trim().is_empty() {
            return Err(AccountError::dial_failed(destination, "empty destination"));
        }
        if options.from_uri.is_empty() {
            options.from_uri = self.uri().to_string();
        }

        let target = self.identity().qualify_destination(destination);
        let dialing = DialInFlight::start(&self.admission);
        let call_id = self
            .engine
            .dial(&target, &options)
            .await
            .map_err(|e| AccountError::dial_failed(target.as_str(), e.to_string()))?;

        let call = self.new_call(call_id, CallDirection::Outgoing);
        let already_ended = {
            let mut admission = self.admission.lock();
            let ended = admission.ended_while_dialing.remove(&call_id);
            if !ended {
                self.calls.insert(call_id, call.clone());
            }
            ended
        };
        drop(dialing);

        if already_ended {
            debug!(account = %self.uri(), call_id = %call_id, target = %target, "Outgoing call ended while dialing");
        } else {
            debug!(account = %self.uri(), call_id = %call_id, target = %target, "New outgoing call");
        }
        Ok(call)
    }

    /// Forget a call; unknown ids are ignored
    ///
    /// While an outgoing dial is pending, an unknown id may belong to that
    /// dial, so it is remembered until the dial completes.
    pub fn remove_call(&self, call_id: CallId) {
        let mut admission = self.admission.lock();
        if self.calls.remove(call_id).is_some() {
            debug!(account = %self.uri(), call_id = %call_id, "Removed call");
        } else if admission.dials_in_flight > 0 {
            admission.ended_while_dialing.insert(call_id);
        }
    }

    /// Look up an active call
    pub fn get_call(&self, call_id: CallId) -> Option<Call> {
        self.calls.get(call_id)
    }

    /// Snapshot of the active call ids
    pub fn call_ids(&self) -> HashSet<CallId> {
        self.calls.ids()
    }

    /// Snapshot of the active calls
    pub fn calls(&self) -> Vec<Call> {
        self.calls.calls()
    }

    /// Number of active calls
    pub fn call_count(&self) -> usize {
        self.calls.count()
    }

    // ===== ENGINE NOTIFICATIONS =====

    /// Handle a registration state transition
    ///
    /// The application is always notified. Push-based accounts additionally
    /// hand the raw response to the registration-timeout tracker.
    pub async fn handle_registration_state(&self, status_code: u16, raw_message: &str) {
        let status = RegistrationStatus::from_status_code(status_code);
        *self.registration.write() = status;
        info!(account = %self.uri(), status_code, %status, "Registration state changed");

        self.events
            .on_registration_state(RegistrationStateInfo {
                account_uri: self.uri().to_string(),
                status_code,
                status,
                timestamp: Utc::now(),
            })
            .await;

        if !self.identity().is_push_disabled() {
            self.service
                .check_registration_timeout(raw_message, self.uri())
                .await;
        }
    }

    /// Register an incoming call and decide whether it rings
    pub async fn admit_incoming_call(&self, call_id: CallId) -> AdmissionDecision {
        let received_at = Utc::now();
        let (call, decline) = {
            let _admission = self.admission.lock();
            let call = self.add_incoming_call(call_id);
            let decline = decline_reason(self.calls.count(), self.dnd.is_do_not_disturb());
            (call, decline)
        };

        match decline {
            Some(reason) => {
                self.decline_incoming(&call, reason, received_at).await;
                AdmissionDecision::Declined { reason }
            }
            None => self.ring_incoming(&call, received_at).await,
        }
    }

    async fn decline_incoming(&self, call: &Call, reason: DeclineReason, received_at: DateTime<Utc>) {
        let caller = self.caller_info_or_default(call).await;
        self.events
            .on_missed_call(MissedCallInfo {
                display_name: caller.display_name,
                remote_uri: caller.remote_uri,
                reason,
                received_at,
            })
            .await;

        match call.decline().await {
            Ok(()) => debug!(account = %self.uri(), call_id = %call.id(), %reason, "Sending busy"),
            Err(e) => error!(account = %self.uri(), call_id = %call.id(), "Failed to decline call: {}", e),
        }
    }

    async fn ring_incoming(&self, call: &Call, received_at: DateTime<Utc>) -> AdmissionDecision {
        if let Err(e) = call.ring().await {
            error!(account = %self.uri(), call_id = %call.id(), "Failed to send 180 Ringing: {}", e);
            return AdmissionDecision::Aborted {
                reason: e.to_string(),
            };
        }
        debug!(account = %self.uri(), call_id = %call.id(), "Sending 180 Ringing");

        self.service.start_ring_indication().await;

        let caller = self.caller_info_or_default(call).await;
        self.events
            .on_incoming_call(IncomingCallInfo {
                account_uri: self.uri().to_string(),
                call_id: call.id(),
                display_name: caller.display_name,
                remote_uri: caller.remote_uri,
                received_at,
            })
            .await;
        AdmissionDecision::Ringing
    }

    async fn caller_info_or_default(&self, call: &Call) -> CallerInfo {
        match call.caller_info().await {
            Ok(info) => info,
            Err(e) => {
                error!(account = %self.uri(), call_id = %call.id(), "Error while getting caller info: {}", e);
                CallerInfo::default()
            }
        }
    }
}

/// Counts an outgoing dial as pending until dropped
///
/// Dropping the last pending dial forgets any teardowns remembered for it,
/// including when the dialing future is cancelled.
struct DialInFlight<'a> {
    admission: &'a Mutex<AdmissionState>,
}

impl<'a> DialInFlight<'a> {
    fn start(admission: &'a Mutex<AdmissionState>) -> Self {
        admission.lock().dials_in_flight += 1;
        Self { admission }
    }
}

impl Drop for DialInFlight<'_> {
    fn drop(&mut self) {
        let mut admission = self.admission.lock();
        admission.dials_in_flight = admission.dials_in_flight.saturating_sub(1);
        if admission.dials_in_flight == 0 {
            admission.ended_while_dialing.clear();
        }
    }
}

/// Admission rule, evaluated after the new call was registered
fn decline_reason(active_calls: usize, do_not_disturb: bool) -> Option<DeclineReason> {
    if active_calls > 1 {
        Some(DeclineReason::Busy)
    } else if do_not_disturb {
        Some(DeclineReason::DoNotDisturb)
    } else {
        None
    }
}

#[async_trait]
impl AccountCallbacks for AccountController {
    async fn on_registration_state_changed(&self, status_code: u16, raw_message: &str) {
        self.handle_registration_state(status_code, raw_message).await;
    }

    async fn on_incoming_call(&self, call_id: CallId) {
        self.admit_incoming_call(call_id).await;
    }

    async fn on_call_terminated(&self, call_id: CallId) {
        self.remove_call(call_id);
    }
}

impl PartialEq for AccountController {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for AccountController {}

impl Hash for AccountController {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}
