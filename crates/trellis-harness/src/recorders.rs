//! Recording collaborators for push and voice broadcast tests.

#![allow(clippy::disallowed_types, reason = "Synchronous recording only")]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use trellis_app::{PushData, PushHandler, VoiceBroadcastRecorder};

/// [`PushHandler`] remembering every notification it received.
#[derive(Debug, Clone, Default)]
pub struct RecordingPushHandler {
    received: Arc<Mutex<Vec<PushData>>>,
}

impl RecordingPushHandler {
    /// Notifications received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn received(&self) -> Vec<PushData> {
        self.received.lock().expect("Mutex poisoned").clone()
    }
}

impl PushHandler for RecordingPushHandler {
    #[allow(clippy::expect_used)]
    fn handle(&self, data: PushData) {
        self.received.lock().expect("Mutex poisoned").push(data);
    }
}

/// [`VoiceBroadcastRecorder`] counting pause requests.
#[derive(Debug, Clone, Default)]
pub struct RecordingRecorder {
    pauses: Arc<AtomicUsize>,
}

impl RecordingRecorder {
    /// Number of times recording was paused.
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }
}

impl VoiceBroadcastRecorder for RecordingRecorder {
    fn pause_record(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}
