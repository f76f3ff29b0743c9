//! Session overview sign-out flows against a scripted session.

use std::time::Duration;

use trellis_app::{
    Loadable, Runtime, ScreenHandle, SessionOverviewAction, SessionOverviewBridge,
    SessionOverviewScreen, SessionOverviewViewEvent,
};
use trellis_core::{DeviceInfo, SdkError};
use trellis_harness::{
    MemorySession, SessionOp,
    fixtures::{DEVICE_ID, USER_ID},
};

const TIMEOUT: Duration = Duration::from_secs(5);
const OTHER_DEVICE: &str = "LAPTOP";

type Handle = ScreenHandle<SessionOverviewScreen>;

fn device(id: &str) -> DeviceInfo {
    DeviceInfo {
        device_id: id.to_string(),
        display_name: Some(format!("{id} device")),
        last_seen_ip: Some("10.0.0.1".to_string()),
        last_seen_ts: Some(1_700_000_000_000),
    }
}

fn session() -> MemorySession {
    MemorySession::new(USER_ID, DEVICE_ID)
        .with_device(device(DEVICE_ID))
        .with_device(device(OTHER_DEVICE))
}

fn start(session: &MemorySession, device_id: &str) -> Handle {
    let screen = SessionOverviewScreen::new(device_id, DEVICE_ID, USER_ID);
    let (runtime, handle) = Runtime::new(screen, SessionOverviewBridge::new(session.clone()));
    tokio::spawn(runtime.run());
    handle
}

async fn next_event(handle: &mut Handle) -> SessionOverviewViewEvent {
    tokio::time::timeout(TIMEOUT, handle.next_view_event())
        .await
        .expect("timed out waiting for view event")
        .expect("runtime stopped")
}

#[tokio::test]
async fn loads_device_details() {
    let session = session();
    let handle = start(&session, OTHER_DEVICE);

    let mut receiver = handle.state();
    let loaded = receiver.wait_for(|s| matches!(s.device, Loadable::Success(_)));
    let state = tokio::time::timeout(TIMEOUT, loaded)
        .await
        .expect("timed out")
        .expect("runtime stopped")
        .clone();

    assert!(!state.is_current_session);
    assert_eq!(state.device, Loadable::Success(device(OTHER_DEVICE)));
}

#[tokio::test]
async fn current_session_is_delegated() {
    let session = session();
    let mut handle = start(&session, DEVICE_ID);

    handle.dispatch(SessionOverviewAction::SignoutSession);

    assert_eq!(next_event(&mut handle).await, SessionOverviewViewEvent::SignoutCurrentSession);
    assert!(session.has_device(DEVICE_ID));
}

#[tokio::test]
async fn sign_out_without_auth() {
    let session = session();
    let mut handle = start(&session, OTHER_DEVICE);

    handle.dispatch(SessionOverviewAction::SignoutSession);

    assert_eq!(next_event(&mut handle).await, SessionOverviewViewEvent::SignoutSuccess);
    assert!(!session.has_device(OTHER_DEVICE));
    assert!(!handle.snapshot().is_loading);
}

#[tokio::test]
async fn password_reauth_retries_after_wrong_password() {
    let session = session().requiring_password("correct horse");
    let mut handle = start(&session, OTHER_DEVICE);

    handle.dispatch(SessionOverviewAction::SignoutSession);
    let SessionOverviewViewEvent::RequestReAuth { flows, error_code } = next_event(&mut handle).await
    else {
        panic!("expected re-auth request");
    };
    assert_eq!(flows[0].stages, vec!["m.login.password".to_string()]);
    assert_eq!(error_code, None);
    assert!(handle.snapshot().is_loading);

    handle.dispatch(SessionOverviewAction::PasswordAuthDone("battery staple".into()));
    let SessionOverviewViewEvent::RequestReAuth { error_code, .. } = next_event(&mut handle).await
    else {
        panic!("expected another re-auth request");
    };
    assert_eq!(error_code.as_deref(), Some("M_FORBIDDEN"));

    handle.dispatch(SessionOverviewAction::PasswordAuthDone("correct horse".into()));
    assert_eq!(next_event(&mut handle).await, SessionOverviewViewEvent::SignoutSuccess);
    assert!(!session.has_device(OTHER_DEVICE));
}

#[tokio::test]
async fn sso_reauth_completes() {
    let session = session().requiring_sso();
    let mut handle = start(&session, OTHER_DEVICE);

    handle.dispatch(SessionOverviewAction::SignoutSession);
    assert!(matches!(
        next_event(&mut handle).await,
        SessionOverviewViewEvent::RequestReAuth { .. }
    ));

    handle.dispatch(SessionOverviewAction::SsoAuthDone);
    assert_eq!(next_event(&mut handle).await, SessionOverviewViewEvent::SignoutSuccess);
}

#[tokio::test]
async fn cancelled_reauth_leaves_device() {
    let session = session().requiring_sso();
    let mut handle = start(&session, OTHER_DEVICE);

    handle.dispatch(SessionOverviewAction::SignoutSession);
    next_event(&mut handle).await;
    handle.dispatch(SessionOverviewAction::ReAuthCancelled);

    let mut state = handle.state();
    tokio::time::timeout(TIMEOUT, state.wait_for(|s| !s.is_loading))
        .await
        .expect("timed out")
        .expect("runtime stopped");
    assert!(session.has_device(OTHER_DEVICE));
}

#[tokio::test]
async fn server_error_is_reported() {
    let session = session();
    session.fail(SessionOp::SignOut, SdkError::Server {
        errcode: "M_UNKNOWN".into(),
        message: "boom".into(),
    });
    let mut handle = start(&session, OTHER_DEVICE);

    handle.dispatch(SessionOverviewAction::SignoutSession);

    let SessionOverviewViewEvent::SignoutError { message } = next_event(&mut handle).await else {
        panic!("expected sign-out error");
    };
    assert!(message.contains("M_UNKNOWN"));
    assert!(session.has_device(OTHER_DEVICE));
}
