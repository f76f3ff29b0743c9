//! Generic runtime for screen orchestration.
//!
//! The Runtime drives one screen's event loop, coordinating between:
//! - [`Screen`]: Pure state machine
//! - [`Bridge`]: SDK request execution
//! - [`ScreenHandle`]: UI-facing action intake and state observation
//!
//! Every event, whether a user action or an SDK completion, is applied on the
//! runtime's single task in arrival order. Bridge calls run on spawned tasks
//! and re-enter through the same inbox, so observers keep seeing the previous
//! state while a request is pending. In-flight requests are not cancelled when
//! the handle is dropped; the loop exits once they have all completed.

use tokio::sync::{mpsc, watch};

use crate::{Bridge, Effect, Screen};

/// Serialized event loop for one screen instance.
///
/// # Type Parameters
///
/// - `S`: Screen state machine
/// - `B`: Bridge executing the screen's requests
pub struct Runtime<S, B>
where
    S: Screen,
    B: Bridge<S>,
{
    screen: S,
    bridge: B,
    inbox: mpsc::UnboundedReceiver<S::Event>,
    /// Weak so that the loop ends once every handle and task is gone.
    inbox_tx: mpsc::WeakUnboundedSender<S::Event>,
    state_tx: watch::Sender<S::State>,
    view_tx: mpsc::UnboundedSender<S::ViewEvent>,
}

/// UI-facing side of a [`Runtime`].
pub struct ScreenHandle<S: Screen> {
    events: mpsc::UnboundedSender<S::Event>,
    state: watch::Receiver<S::State>,
    view_events: mpsc::UnboundedReceiver<S::ViewEvent>,
}

impl<S, B> Runtime<S, B>
where
    S: Screen,
    B: Bridge<S>,
{
    /// Create a runtime and the handle used to drive it.
    pub fn new(screen: S, bridge: B) -> (Self, ScreenHandle<S>) {
        let (events_tx, inbox) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(screen.state().clone());
        let (view_tx, view_rx) = mpsc::unbounded_channel();

        let runtime = Self {
            screen,
            bridge,
            inbox,
            inbox_tx: events_tx.downgrade(),
            state_tx,
            view_tx,
        };
        let handle = ScreenHandle { events: events_tx, state: state_rx, view_events: view_rx };
        (runtime, handle)
    }

    /// Run the event loop until every sender is gone.
    ///
    /// Returns the screen so callers can inspect its final state.
    pub async fn run(mut self) -> S {
        let effects = self.screen.initialize();
        self.apply(effects);

        while let Some(event) = self.inbox.recv().await {
            let effects = self.screen.handle(event);
            self.apply(effects);
        }

        tracing::debug!("screen runtime stopped");
        self.screen
    }

    /// Execute effects in order.
    fn apply(&mut self, effects: Vec<Effect<S::Request, S::ViewEvent>>) {
        for effect in effects {
            match effect {
                Effect::Render => {
                    self.state_tx.send_replace(self.screen.state().clone());
                },
                Effect::Emit(event) => {
                    if self.view_tx.send(event).is_err() {
                        tracing::debug!("view event dropped, no listener");
                    }
                },
                Effect::Run(request) => self.spawn(request),
            }
        }
    }

    /// Execute a request off the loop and feed completions back in.
    fn spawn(&self, request: S::Request) {
        let Some(events) = self.inbox_tx.upgrade() else {
            tracing::debug!("screen closed, request dropped");
            return;
        };

        let bridge = self.bridge.clone();
        tokio::spawn(async move {
            for event in bridge.execute(request).await {
                if events.send(event).is_err() {
                    break;
                }
            }
        });
    }

    /// Get a reference to the screen
    pub fn screen(&self) -> &S {
        &self.screen
    }
}

impl<S: Screen> ScreenHandle<S> {
    /// Submit a user action. Returns `false` if the runtime has stopped.
    pub fn dispatch(&self, action: S::Action) -> bool {
        self.events.send(action.into()).is_ok()
    }

    /// Inject an arbitrary event, e.g. a completion replayed by a test.
    pub fn inject(&self, event: S::Event) -> bool {
        self.events.send(event).is_ok()
    }

    /// Observe published state.
    pub fn state(&self) -> watch::Receiver<S::State> {
        self.state.clone()
    }

    /// Latest published state.
    pub fn snapshot(&self) -> S::State {
        self.state.borrow().clone()
    }

    /// Next one-shot view event. `None` once the runtime has stopped.
    pub async fn next_view_event(&mut self) -> Option<S::ViewEvent> {
        self.view_events.recv().await
    }

    /// Stop submitting events and keep only the view events.
    ///
    /// The runtime finishes the work already queued, then stops; the returned
    /// receiver yields every view event emitted until then.
    pub fn into_view_events(self) -> mpsc::UnboundedReceiver<S::ViewEvent> {
        self.view_events
    }
}
