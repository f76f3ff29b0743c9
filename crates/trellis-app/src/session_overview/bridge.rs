//! Session overview bridge.

use trellis_core::{Session, SignoutOutcome};

use super::{SessionOverviewEvent, SessionOverviewRequest, SessionOverviewScreen};
use crate::Bridge;

/// Bridge between [`SessionOverviewScreen`] and the SDK.
#[derive(Debug, Clone)]
pub struct SessionOverviewBridge<S: Session> {
    session: S,
}

impl<S: Session> SessionOverviewBridge<S> {
    /// Create a bridge over `session`.
    pub fn new(session: S) -> Self {
        Self { session }
    }
}

impl<S: Session> Bridge<SessionOverviewScreen> for SessionOverviewBridge<S> {
    async fn execute(&self, request: SessionOverviewRequest) -> Vec<SessionOverviewEvent> {
        match request {
            SessionOverviewRequest::LoadDevice { device_id } => {
                match self.session.device_info(&device_id).await {
                    Ok(device) => vec![SessionOverviewEvent::DeviceLoaded(device)],
                    Err(e) => {
                        tracing::warn!(%device_id, error = %e, "failed to load device");
                        vec![]
                    },
                }
            },
            SessionOverviewRequest::SignOut { device_id, auth } => {
                match self.session.sign_out_device(&device_id, auth).await {
                    Ok(SignoutOutcome::Done) => {
                        tracing::info!(%device_id, "device signed out");
                        vec![SessionOverviewEvent::SignoutCompleted]
                    },
                    Ok(SignoutOutcome::ReAuthRequired { session, flows, error_code }) => {
                        tracing::debug!(%device_id, ?error_code, "sign-out needs re-auth");
                        vec![SessionOverviewEvent::ReAuthRequired { session, flows, error_code }]
                    },
                    Err(e) => {
                        tracing::warn!(%device_id, error = %e, "sign-out failed");
                        vec![SessionOverviewEvent::SignoutFailed { message: e.to_string() }]
                    },
                }
            },
        }
    }
}
