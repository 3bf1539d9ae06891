//! Horde error types

use thiserror::Error;

/// Errors that can occur while a horde is running
#[derive(Debug, Error)]
pub enum HordeError {
    /// A callback or strategy ran before a required service was injected.
    ///
    /// Raised lazily, the first time the service is actually needed,
    /// never at registration time.
    #[error("{callback} requires a {service} but none was injected")]
    MissingService {
        /// Name of the missing service slot (`logger` or `randomizer`)
        service: &'static str,
        /// Name of the callback or strategy that needed it
        callback: String,
    },

    /// Failure raised by a user-supplied gremlin, mogwai, or strategy.
    ///
    /// Carried unmodified: the core never wraps or translates errors from
    /// user callbacks, it lets them propagate to the caller of `unleash`.
    #[error(transparent)]
    Callback(#[from] anyhow::Error),
}

impl HordeError {
    /// Missing-service error for the named callback
    pub fn missing_service(service: &'static str, callback: impl Into<String>) -> Self {
        Self::MissingService {
            service,
            callback: callback.into(),
        }
    }
}
