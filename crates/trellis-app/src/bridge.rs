//! Screen-to-SDK translation.
//!
//! A [`Bridge`] executes the [`crate::Screen::Request`]s a screen produces and
//! converts results back into [`crate::Screen::Event`]s. Failures the screen
//! does not model are logged inside the bridge and produce no events, which
//! leaves the screen's state untouched.

use std::future::Future;

use crate::Screen;

/// Executes screen requests.
///
/// Must be Clone + Send + Sync + `'static`: the runtime moves a clone into a
/// spawned task per request.
pub trait Bridge<S: Screen>: Clone + Send + Sync + 'static {
    /// Execute `request`, returning completion events in order.
    fn execute(&self, request: S::Request) -> impl Future<Output = Vec<S::Event>> + Send;
}
