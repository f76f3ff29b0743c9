//! Session overview state machine.

use trellis_core::{DeviceId, DeviceInfo, UserId, UserInteractiveAuth};

use super::{
    SessionOverviewAction, SessionOverviewEvent, SessionOverviewRequest, SessionOverviewViewEvent,
};
use crate::{Effect, Loadable, Screen};

type SessionOverviewEffect = Effect<SessionOverviewRequest, SessionOverviewViewEvent>;

/// View state of the session overview screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOverviewViewState {
    /// Displayed device.
    pub device_id: DeviceId,
    /// The displayed device is the one running this client.
    pub is_current_session: bool,
    /// Device details.
    pub device: Loadable<DeviceInfo>,
    /// A sign-out is in progress (including while waiting for re-auth).
    pub is_loading: bool,
}

/// Session overview state machine.
#[derive(Debug, Clone)]
pub struct SessionOverviewScreen {
    state: SessionOverviewViewState,
    /// Signed-in user, needed for password auth.
    user_id: UserId,
    /// UIA session awaiting credentials.
    pending_auth: Option<String>,
}

impl SessionOverviewScreen {
    /// Create a screen for `device_id`, as seen from `current_device_id`.
    pub fn new(
        device_id: impl Into<DeviceId>,
        current_device_id: &str,
        user_id: impl Into<UserId>,
    ) -> Self {
        let device_id = device_id.into();
        Self {
            state: SessionOverviewViewState {
                is_current_session: device_id == current_device_id,
                device_id,
                device: Loadable::Uninitialized,
                is_loading: false,
            },
            user_id: user_id.into(),
            pending_auth: None,
        }
    }

    /// Process a user intent.
    pub fn dispatch(&mut self, action: SessionOverviewAction) -> Vec<SessionOverviewEffect> {
        match action {
            SessionOverviewAction::SignoutSession => self.sign_out(),
            SessionOverviewAction::SsoAuthDone => {
                self.resume_auth(|session, _| UserInteractiveAuth::Sso { session })
            },
            SessionOverviewAction::PasswordAuthDone(password) => {
                self.resume_auth(|session, user_id| UserInteractiveAuth::Password {
                    session,
                    user_id,
                    password,
                })
            },
            SessionOverviewAction::ReAuthCancelled => self.cancel_auth(),
        }
    }

    /// True while waiting for the user to re-authenticate.
    pub fn awaiting_auth(&self) -> bool {
        self.pending_auth.is_some()
    }

    fn sign_out(&mut self) -> Vec<SessionOverviewEffect> {
        if self.state.is_current_session {
            return vec![Effect::Emit(SessionOverviewViewEvent::SignoutCurrentSession)];
        }
        if self.state.is_loading {
            tracing::debug!(device_id = %self.state.device_id, "sign-out already in progress");
            return vec![];
        }

        self.state.is_loading = true;
        vec![Effect::Render, self.sign_out_request(None)]
    }

    fn resume_auth<F>(&mut self, credentials: F) -> Vec<SessionOverviewEffect>
    where
        F: FnOnce(String, UserId) -> UserInteractiveAuth,
    {
        let Some(session) = self.pending_auth.take() else {
            tracing::warn!("auth completed without a pending sign-out");
            return vec![];
        };

        let auth = credentials(session, self.user_id.clone());
        vec![self.sign_out_request(Some(auth))]
    }

    fn cancel_auth(&mut self) -> Vec<SessionOverviewEffect> {
        self.pending_auth = None;
        self.state.is_loading = false;
        vec![Effect::Render]
    }

    fn sign_out_request(&self, auth: Option<UserInteractiveAuth>) -> SessionOverviewEffect {
        Effect::Run(SessionOverviewRequest::SignOut { device_id: self.state.device_id.clone(), auth })
    }
}

impl Screen for SessionOverviewScreen {
    type Action = SessionOverviewAction;
    type Event = SessionOverviewEvent;
    type Request = SessionOverviewRequest;
    type ViewEvent = SessionOverviewViewEvent;
    type State = SessionOverviewViewState;

    fn initialize(&mut self) -> Vec<SessionOverviewEffect> {
        self.state.device = Loadable::Loading;
        vec![
            Effect::Render,
            Effect::Run(SessionOverviewRequest::LoadDevice {
                device_id: self.state.device_id.clone(),
            }),
        ]
    }

    fn handle(&mut self, event: SessionOverviewEvent) -> Vec<SessionOverviewEffect> {
        match event {
            SessionOverviewEvent::Action(action) => self.dispatch(action),
            SessionOverviewEvent::DeviceLoaded(Some(device)) => {
                self.state.device = Loadable::Success(device);
                vec![Effect::Render]
            },
            SessionOverviewEvent::DeviceLoaded(None) => {
                tracing::warn!(device_id = %self.state.device_id, "device not found");
                vec![]
            },
            SessionOverviewEvent::ReAuthRequired { session, flows, error_code } => {
                self.pending_auth = Some(session);
                vec![Effect::Emit(SessionOverviewViewEvent::RequestReAuth { flows, error_code })]
            },
            SessionOverviewEvent::SignoutCompleted => {
                self.pending_auth = None;
                self.state.is_loading = false;
                vec![Effect::Render, Effect::Emit(SessionOverviewViewEvent::SignoutSuccess)]
            },
            SessionOverviewEvent::SignoutFailed { message } => {
                self.pending_auth = None;
                self.state.is_loading = false;
                vec![Effect::Render, Effect::Emit(SessionOverviewViewEvent::SignoutError { message })]
            },
        }
    }

    fn state(&self) -> &SessionOverviewViewState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::AuthFlow;

    use super::*;

    fn other_device() -> SessionOverviewScreen {
        SessionOverviewScreen::new("OTHER", "CURRENT", "@alice:x")
    }

    fn password_flow() -> Vec<AuthFlow> {
        vec![AuthFlow { stages: vec!["m.login.password".into()] }]
    }

    #[test]
    fn initialize_loads_device() {
        let mut screen = other_device();
        let effects = screen.initialize();

        assert!(screen.state().device.is_loading());
        assert!(matches!(effects.as_slice(), [
            Effect::Render,
            Effect::Run(SessionOverviewRequest::LoadDevice { .. })
        ]));
    }

    #[test]
    fn current_session_delegates_to_host() {
        let mut screen = SessionOverviewScreen::new("CURRENT", "CURRENT", "@alice:x");
        let effects = screen.dispatch(SessionOverviewAction::SignoutSession);

        assert_eq!(effects, [Effect::Emit(SessionOverviewViewEvent::SignoutCurrentSession)]);
        assert!(!screen.state().is_loading);
    }

    #[test]
    fn signout_without_auth_first() {
        let mut screen = other_device();
        let effects = screen.dispatch(SessionOverviewAction::SignoutSession);

        assert!(screen.state().is_loading);
        assert_eq!(effects, [
            Effect::Render,
            Effect::Run(SessionOverviewRequest::SignOut { device_id: "OTHER".into(), auth: None }),
        ]);

        // Double tap while loading
        assert!(screen.dispatch(SessionOverviewAction::SignoutSession).is_empty());
    }

    #[test]
    fn reauth_then_password() {
        let mut screen = other_device();
        let _ = screen.dispatch(SessionOverviewAction::SignoutSession);

        let effects = screen.handle(SessionOverviewEvent::ReAuthRequired {
            session: "uia-1".into(),
            flows: password_flow(),
            error_code: None,
        });
        assert_eq!(effects, [Effect::Emit(SessionOverviewViewEvent::RequestReAuth {
            flows: password_flow(),
            error_code: None,
        })]);
        assert!(screen.awaiting_auth());
        assert!(screen.state().is_loading);

        let effects = screen.dispatch(SessionOverviewAction::PasswordAuthDone("hunter2".into()));
        assert_eq!(effects, [Effect::Run(SessionOverviewRequest::SignOut {
            device_id: "OTHER".into(),
            auth: Some(UserInteractiveAuth::Password {
                session: "uia-1".into(),
                user_id: "@alice:x".into(),
                password: "hunter2".into(),
            }),
        })]);
        assert!(!screen.awaiting_auth());
    }

    #[test]
    fn reauth_then_sso() {
        let mut screen = other_device();
        let _ = screen.dispatch(SessionOverviewAction::SignoutSession);
        let _ = screen.handle(SessionOverviewEvent::ReAuthRequired {
            session: "uia-2".into(),
            flows: vec![],
            error_code: None,
        });

        let effects = screen.dispatch(SessionOverviewAction::SsoAuthDone);
        assert_eq!(effects, [Effect::Run(SessionOverviewRequest::SignOut {
            device_id: "OTHER".into(),
            auth: Some(UserInteractiveAuth::Sso { session: "uia-2".into() }),
        })]);
    }

    #[test]
    fn cancel_clears_loading() {
        let mut screen = other_device();
        let _ = screen.dispatch(SessionOverviewAction::SignoutSession);
        let _ = screen.handle(SessionOverviewEvent::ReAuthRequired {
            session: "uia-3".into(),
            flows: password_flow(),
            error_code: None,
        });

        let effects = screen.dispatch(SessionOverviewAction::ReAuthCancelled);
        assert_eq!(effects, [Effect::Render]);
        assert!(!screen.state().is_loading);
        assert!(!screen.awaiting_auth());

        // Late auth completion is ignored
        assert!(screen.dispatch(SessionOverviewAction::SsoAuthDone).is_empty());
    }

    #[test]
    fn completion_and_failure() {
        let mut screen = other_device();
        let _ = screen.dispatch(SessionOverviewAction::SignoutSession);
        let effects = screen.handle(SessionOverviewEvent::SignoutCompleted);
        assert_eq!(effects, [Effect::Render, Effect::Emit(SessionOverviewViewEvent::SignoutSuccess)]);
        assert!(!screen.state().is_loading);

        let _ = screen.dispatch(SessionOverviewAction::SignoutSession);
        let effects = screen.handle(SessionOverviewEvent::SignoutFailed { message: "offline".into() });
        assert!(matches!(effects.as_slice(), [
            Effect::Render,
            Effect::Emit(SessionOverviewViewEvent::SignoutError { message })
        ] if message == "offline"));
    }

    #[test]
    fn password_never_printed() {
        let action = SessionOverviewAction::PasswordAuthDone("hunter2".into());
        assert!(!format!("{action:?}").contains("hunter2"));

        let event = SessionOverviewEvent::from(action);
        assert!(!format!("{event:?}").contains("hunter2"));
    }
}
