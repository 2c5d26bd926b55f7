//! End-to-end flow: engine callbacks delivered from an engine task, events
//! observed by an application subscriber over the broadcast emitter.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rvoip_account_core::{
    AccountCallbacks, AccountConfig, AccountController, AccountEvent, AccountIdentity,
    AccountService, BroadcastEmitter, CallId, DeclineReason, DialOptions, DndFlag, EngineError,
    EngineResult, ProtocolEngine, RegistrationStatus, RemoteParty,
};
use tokio::sync::broadcast::error::TryRecvError;

struct ScriptedEngine {
    next_call_id: AtomicU32,
    declined: std::sync::Mutex<Vec<CallId>>,
}

impl ScriptedEngine {
    fn new() -> Self {
        Self {
            next_call_id: AtomicU32::new(10),
            declined: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ProtocolEngine for ScriptedEngine {
    async fn create_registration(&self, _config: &AccountConfig) -> EngineResult<()> {
        Ok(())
    }

    async fn remove_registration(&self, _account_uri: &str) -> EngineResult<()> {
        Ok(())
    }

    async fn dial(&self, target: &str, _options: &DialOptions) -> EngineResult<CallId> {
        if target.contains("unreachable") {
            return Err(EngineError::transport("no route to host"));
        }
        Ok(CallId(self.next_call_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn answer(&self, _call_id: CallId, _status_code: u16) -> EngineResult<()> {
        Ok(())
    }

    async fn decline(&self, call_id: CallId) -> EngineResult<()> {
        self.declined.lock().unwrap().push(call_id);
        Ok(())
    }

    async fn hangup(&self, _call_id: CallId) -> EngineResult<()> {
        Ok(())
    }

    async fn remote_party(&self, call_id: CallId) -> EngineResult<RemoteParty> {
        Ok(RemoteParty {
            remote_uri: format!("Bob <sip:bob{}@example.org>", call_id),
            local_uri: "sip:alice@example.com".to_string(),
        })
    }
}

struct QuietService;

#[async_trait]
impl AccountService for QuietService {
    async fn start_ring_indication(&self) {}

    async fn check_registration_timeout(&self, _raw_message: &str, _account_uri: &str) {}
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("rvoip_account_core=debug")
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn test_engine_callbacks_reach_application_subscriber() {
    init_tracing();

    let engine = Arc::new(ScriptedEngine::new());
    let emitter = Arc::new(BroadcastEmitter::new(32));
    let mut events = emitter.subscribe();
    let dnd = Arc::new(DndFlag::new(false));

    let config = AccountConfig::new(
        AccountIdentity::new("sip:alice@example.com", "example.com").with_push_disabled(true),
        "sip:registrar.example.com",
    );
    let account = Arc::new(AccountController::new(
        config,
        engine.clone(),
        emitter.clone(),
        Arc::new(QuietService),
        dnd.clone(),
    ));
    account.create().await.expect("registration created");

    // The engine binding only sees the callback capability
    let callbacks: Arc<dyn AccountCallbacks> = account.clone();
    tokio::spawn(async move {
        callbacks
            .on_registration_state_changed(200, "SIP/2.0 200 OK\r\n\r\n")
            .await;
        callbacks.on_incoming_call(CallId(1)).await;
        callbacks.on_incoming_call(CallId(2)).await;
    })
    .await
    .unwrap();

    match events.recv().await.unwrap() {
        AccountEvent::RegistrationState(info) => {
            assert_eq!(info.status_code, 200);
            assert_eq!(info.status, RegistrationStatus::Active);
        }
        other => panic!("unexpected event {:?}", other),
    }
    match events.recv().await.unwrap() {
        AccountEvent::IncomingCall(info) => {
            assert_eq!(info.call_id, CallId(1));
            assert_eq!(info.display_name, "Bob");
            assert_eq!(info.remote_uri, "sip:bob1@example.org");
        }
        other => panic!("unexpected event {:?}", other),
    }
    match events.recv().await.unwrap() {
        AccountEvent::MissedCall(info) => {
            assert_eq!(info.reason, DeclineReason::Busy);
            assert_eq!(info.remote_uri, "sip:bob2@example.org");
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(*engine.declined.lock().unwrap(), vec![CallId(2)]);

    // Both dialogs end; the account is idle again and DND now applies
    account.on_call_terminated(CallId(1)).await;
    account.on_call_terminated(CallId(2)).await;
    assert_eq!(account.call_count(), 0);

    dnd.set(true);
    account.on_incoming_call(CallId(3)).await;
    match events.recv().await.unwrap() {
        AccountEvent::MissedCall(info) => assert_eq!(info.reason, DeclineReason::DoNotDisturb),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_outgoing_calls_fail_soft() {
    init_tracing();

    let engine = Arc::new(ScriptedEngine::new());
    let account = AccountController::new(
        AccountConfig::new(
            AccountIdentity::new("sip:alice@example.com", "*"),
            "sip:registrar.example.com",
        ),
        engine,
        Arc::new(BroadcastEmitter::new(4)),
        Arc::new(QuietService),
        Arc::new(DndFlag::default()),
    );

    let call = account.add_outgoing_call("555").await.expect("dialed");
    assert_eq!(call.id(), CallId(10));
    assert_eq!(call.account(), account.identity());

    assert!(account.add_outgoing_call("unreachable").await.is_none());
    assert_eq!(account.call_ids().len(), 1);
}
