//! Scripted screen sessions.
//!
//! Each command opens one screen (or use case) against the configured
//! in-memory session, replays the requested user actions through the runtime,
//! and returns what the UI would have observed.

use std::time::Duration;

use clap::Args;
use trellis_app::{
    JoinRulesAction, JoinRulesBridge, JoinRulesScreen, JoinRulesViewEvent, JoinRulesViewState,
    PauseOutcome, PushData, PushReceiver, Runtime, Screen, SessionOverviewAction,
    SessionOverviewBridge, SessionOverviewScreen, SessionOverviewViewEvent,
    SessionOverviewViewState, pause_voice_broadcast,
};
use trellis_core::{JoinRule, MatrixItem, RoomId};
use trellis_harness::RecordingPushHandler;
use tokio::time::timeout;

use crate::{AppConfig, CliError};

/// How long to wait for the runtime to settle.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Edits applied to a room's join rules.
#[derive(Args, Debug, Clone, Default)]
pub struct JoinRulesScript {
    /// Room to configure
    #[arg(long)]
    pub room: RoomId,

    /// Add or remove an allow-list entry (repeatable)
    #[arg(long = "toggle")]
    pub toggles: Vec<RoomId>,

    /// Select a join rule (invite, restricted, public)
    #[arg(long, value_parser = parse_join_rule)]
    pub select: Option<JoinRule>,

    /// Filter the candidate list
    #[arg(long)]
    pub filter: Option<String>,

    /// Save the result
    #[arg(long)]
    pub save: bool,
}

/// Outcome of [`run_join_rules`].
#[derive(Debug, Clone)]
pub struct JoinRulesReport {
    /// Final published state.
    pub state: JoinRulesViewState,
    /// One-shot events shown to the user.
    pub events: Vec<JoinRulesViewEvent>,
}

/// Sign-out attempt of one device.
#[derive(Args, Debug, Clone, Default)]
pub struct SignoutScript {
    /// Device to sign out
    #[arg(long)]
    pub device: String,

    /// Password to answer a re-auth request with
    #[arg(long)]
    pub password: Option<String>,

    /// Answer a re-auth request as if single sign-on completed
    #[arg(long)]
    pub sso: bool,
}

/// Outcome of [`run_session_overview`].
#[derive(Debug, Clone)]
pub struct SignoutReport {
    /// Final published state.
    pub state: SessionOverviewViewState,
    /// One-shot events shown to the user.
    pub events: Vec<SessionOverviewViewEvent>,
}

fn parse_join_rule(value: &str) -> Result<JoinRule, String> {
    JoinRule::parse(value).ok_or_else(|| format!("unknown join rule {value:?}"))
}

/// Open the join-rule screen, apply `script`, and wait for it to settle.
pub async fn run_join_rules(
    config: &AppConfig,
    script: &JoinRulesScript,
) -> Result<JoinRulesReport, CliError> {
    config.room(&script.room)?;
    let session = config.session();

    let screen = JoinRulesScreen::new(script.room.clone(), config.preferences);
    let (runtime, handle) = Runtime::new(screen, JoinRulesBridge::new(session));
    let task = tokio::spawn(runtime.run());

    let mut state = handle.state();
    let loaded = timeout(SETTLE_TIMEOUT, state.wait_for(|s| s.initialized)).await;
    let loaded = match loaded {
        Ok(Ok(state)) => state.clone(),
        Ok(Err(_)) | Err(_) => return Err(CliError::NotInitialized(script.room.clone())),
    };
    tracing::info!(
        room_id = %script.room,
        rule = %loaded.current_join_rule,
        allowed = loaded.updated_allow_list.len(),
        "join rules loaded"
    );

    for id in &script.toggles {
        handle.dispatch(JoinRulesAction::ToggleSelection(find_item(&loaded, id)));
    }
    if let Some(rule) = script.select {
        handle.dispatch(JoinRulesAction::SelectJoinRules(rule));
    }
    if let Some(filter) = &script.filter {
        handle.dispatch(JoinRulesAction::FilterWith(filter.clone()));
    }
    if script.save {
        handle.dispatch(JoinRulesAction::SaveChanges);
    }

    let mut view_events = handle.into_view_events();
    let screen = timeout(SETTLE_TIMEOUT, task)
        .await
        .map_err(|_| CliError::Timeout("join rules screen"))?
        .map_err(|_| CliError::Timeout("join rules screen"))?;

    let mut events = Vec::new();
    while let Some(event) = view_events.recv().await {
        events.push(event);
    }

    Ok(JoinRulesReport { state: screen.state().clone(), events })
}

/// An item for `id` from what the screen already shows, or a placeholder.
fn find_item(state: &JoinRulesViewState, id: &str) -> MatrixItem {
    state
        .possible_space_candidates
        .iter()
        .chain(&state.updated_allow_list)
        .chain(&state.unknown_restricted)
        .find(|item| item.id == id)
        .cloned()
        .unwrap_or_else(|| MatrixItem::unknown_room(id))
}

/// Open the session overview for a device and try to sign it out.
///
/// A re-auth request is answered once with the scripted credentials; a second
/// request, or one without credentials, cancels.
pub async fn run_session_overview(
    config: &AppConfig,
    script: &SignoutScript,
) -> Result<SignoutReport, CliError> {
    let screen = SessionOverviewScreen::new(
        script.device.clone(),
        &config.session.device_id,
        config.session.user_id.clone(),
    );
    let (runtime, mut handle) = Runtime::new(screen, SessionOverviewBridge::new(config.session()));
    let task = tokio::spawn(runtime.run());

    handle.dispatch(SessionOverviewAction::SignoutSession);

    let mut events = Vec::new();
    let mut answered = false;
    loop {
        let event = timeout(SETTLE_TIMEOUT, handle.next_view_event())
            .await
            .map_err(|_| CliError::Timeout("sign-out"))?;
        let Some(event) = event else {
            break;
        };

        let done = match &event {
            SessionOverviewViewEvent::RequestReAuth { flows, error_code } => {
                tracing::info!(?flows, ?error_code, "re-authentication requested");
                let answer = match (&script.password, script.sso) {
                    _ if answered => SessionOverviewAction::ReAuthCancelled,
                    (Some(password), _) => SessionOverviewAction::PasswordAuthDone(password.clone()),
                    (None, true) => SessionOverviewAction::SsoAuthDone,
                    (None, false) => SessionOverviewAction::ReAuthCancelled,
                };
                let cancelled = answer == SessionOverviewAction::ReAuthCancelled;
                answered = true;
                handle.dispatch(answer);
                cancelled
            },
            SessionOverviewViewEvent::SignoutCurrentSession
            | SessionOverviewViewEvent::SignoutSuccess
            | SessionOverviewViewEvent::SignoutError { .. } => true,
        };
        events.push(event);
        if done {
            break;
        }
    }

    drop(handle);
    let screen = timeout(SETTLE_TIMEOUT, task)
        .await
        .map_err(|_| CliError::Timeout("session overview"))?
        .map_err(|_| CliError::Timeout("session overview"))?;

    Ok(SignoutReport { state: screen.state().clone(), events })
}

/// Pause the configured user's voice broadcast in `room_id`.
pub async fn run_pause_broadcast(
    config: &AppConfig,
    room_id: &str,
) -> Result<PauseOutcome, CliError> {
    let session = config.session();
    Ok(pause_voice_broadcast(&session, room_id, None).await?)
}

/// Deliver push messages after (optionally) registering `endpoint`.
///
/// Returns the notifications that passed validation.
pub async fn run_push(
    config: &AppConfig,
    endpoint: Option<&str>,
    payloads: &[String],
) -> Vec<PushData> {
    let handler = RecordingPushHandler::default();
    let receiver = PushReceiver::new(config.session(), handler.clone(), config.push.clone());

    if let Some(endpoint) = endpoint {
        receiver.on_new_endpoint(endpoint).await;
    }
    for payload in payloads {
        receiver.on_message(payload.as_bytes());
    }

    handler.received()
}
