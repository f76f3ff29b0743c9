//! Push receiver callbacks against an in-memory session.

use trellis_app::{BackgroundSyncMode, PushConfig, PushReceiver};
use trellis_core::SdkError;
use trellis_harness::{
    MemorySession, RecordingPushHandler, SessionOp,
    fixtures::{DEVICE_ID, USER_ID},
};

const ENDPOINT: &str = "https://push.example.org/up/abc";

type Receiver = PushReceiver<MemorySession, RecordingPushHandler>;

fn setup(config: PushConfig) -> (Receiver, MemorySession, RecordingPushHandler) {
    let session = MemorySession::new(USER_ID, DEVICE_ID);
    let handler = RecordingPushHandler::default();
    (PushReceiver::new(session.clone(), handler.clone(), config), session, handler)
}

#[test]
fn valid_messages_reach_handler() {
    let (receiver, _, handler) = setup(PushConfig::default());

    receiver.on_message(
        br#"{"notification":{"event_id":"$e","room_id":"!r:x","counts":{"unread":2}}}"#,
    );

    let received = handler.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].room_id, "!r:x");
    assert_eq!(received[0].unread, Some(2));
}

#[test]
fn malformed_messages_are_dropped() {
    let (receiver, _, handler) = setup(PushConfig::default());

    receiver.on_message(b"");
    receiver.on_message(b"{\"notification\":{}}");
    receiver.on_message(br#"{"notification":{"event_id":"e","room_id":"!r:x"}}"#);
    receiver.on_message(br#"{"notification":{"event_id":"$e","room_id":"r"}}"#);

    assert!(handler.received().is_empty());
}

#[tokio::test]
async fn new_endpoint_registers_pusher_once() {
    let config = PushConfig::default();
    let gateway = config.gateway_url.clone();
    let (receiver, session, _) = setup(config);

    receiver.on_new_endpoint(ENDPOINT).await;
    receiver.on_new_endpoint(ENDPOINT).await;

    assert_eq!(session.pushers(), vec![(ENDPOINT.to_string(), gateway)]);
    assert_eq!(receiver.sync_mode().await, BackgroundSyncMode::Push);
    assert_eq!(receiver.endpoint().await.as_deref(), Some(ENDPOINT));
}

#[tokio::test]
async fn disabled_notifications_skip_registration() {
    let config = PushConfig { notifications_enabled: false, ..PushConfig::default() };
    let (receiver, session, _) = setup(config);

    receiver.on_new_endpoint(ENDPOINT).await;

    assert!(session.pushers().is_empty());
    assert_eq!(receiver.sync_mode().await, BackgroundSyncMode::Polling);
}

#[tokio::test]
async fn registration_error_is_not_fatal() {
    let (receiver, session, _) = setup(PushConfig::default());
    session.fail(SessionOp::RegisterPusher, SdkError::Network("offline".into()));

    receiver.on_new_endpoint(ENDPOINT).await;

    assert!(session.pushers().is_empty());
    assert_eq!(receiver.endpoint().await, None);
    assert_eq!(receiver.sync_mode().await, BackgroundSyncMode::Push);
}

#[tokio::test]
async fn same_endpoint_retries_after_failed_registration() {
    let config = PushConfig::default();
    let gateway = config.gateway_url.clone();
    let (receiver, session, _) = setup(config);
    session.fail(SessionOp::RegisterPusher, SdkError::Network("offline".into()));
    receiver.on_new_endpoint(ENDPOINT).await;

    session.heal(SessionOp::RegisterPusher);
    receiver.on_new_endpoint(ENDPOINT).await;

    assert_eq!(session.pushers(), vec![(ENDPOINT.to_string(), gateway)]);
    assert_eq!(receiver.endpoint().await.as_deref(), Some(ENDPOINT));
}

#[tokio::test]
async fn registration_failure_falls_back_to_polling() {
    let (receiver, _, _) = setup(PushConfig::default());
    receiver.on_new_endpoint(ENDPOINT).await;

    receiver.on_registration_failed().await;

    assert_eq!(receiver.sync_mode().await, BackgroundSyncMode::Polling);
}

#[tokio::test]
async fn unregister_removes_pusher() {
    let (receiver, session, _) = setup(PushConfig::default());
    receiver.on_new_endpoint(ENDPOINT).await;

    receiver.on_unregistered().await;

    assert!(session.pushers().is_empty());
    assert_eq!(receiver.endpoint().await, None);
    assert_eq!(receiver.sync_mode().await, BackgroundSyncMode::Polling);
}

#[tokio::test]
async fn unregistering_unknown_pusher_is_benign() {
    let (receiver, session, _) = setup(PushConfig::default());
    receiver.on_new_endpoint(ENDPOINT).await;
    session.fail(SessionOp::UnregisterPusher, SdkError::NotFound("pusher".into()));

    receiver.on_unregistered().await;
    receiver.on_unregistered().await;

    assert_eq!(receiver.sync_mode().await, BackgroundSyncMode::Polling);
}
