//! Asynchronously loaded values.

/// A value that is fetched asynchronously.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Loadable<T> {
    /// Nothing requested yet.
    #[default]
    Uninitialized,
    /// Request in flight.
    Loading,
    /// Request completed.
    Success(T),
}

impl<T> Loadable<T> {
    /// The loaded value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Uninitialized | Self::Loading => None,
        }
    }

    /// True while a request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}
