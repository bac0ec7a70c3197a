//! Interop error types.

use crate::identity::IdentityKey;

/// Errors that can occur while wrapping native resources.
///
/// All variants are local and recoverable: a failed call never leaves the
/// registry in a state that affects later calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InteropError {
    /// An argument was missing or out of range (null resource, missing device
    /// or DPI for a bound wrapper type, non-positive DPI).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No registered type probe recognized the resource.
    #[error("no type probe recognizes native resource `{type_name}`")]
    UnrecognizedResource {
        /// Concrete type name of the native resource.
        type_name: &'static str,
    },

    /// A cached wrapper is bound to a different device than the one requested.
    #[error("existing wrapper for {key} is bound to a different device")]
    CrossDevice {
        /// Identity of the wrapped resource.
        key: IdentityKey,
    },

    /// A cached wrapper was created with a different DPI than the one requested.
    #[error("existing wrapper for {key} has dpi {existing}, requested {requested}")]
    CrossDpi {
        /// Identity of the wrapped resource.
        key: IdentityKey,
        /// DPI the wrapper is bound to.
        existing: f32,
        /// DPI the caller asked for.
        requested: f32,
    },

    /// The wrapper (or handle) has been closed.
    #[error("object has been closed")]
    Closed,

    /// Gave up waiting for another thread to finish constructing a wrapper.
    #[error("timed out waiting for wrapper construction of {0}")]
    RegistrationTimeout(IdentityKey),

    /// A different live wrapper is already registered for the resource.
    #[error("native resource {0} is already wrapped")]
    AlreadyWrapped(IdentityKey),

    /// A wrapper factory asked for a wrapper of the resource it is building.
    #[error("recursive wrapper construction for {0}")]
    ReentrantCreation(IdentityKey),

    /// The wrapper for the resource is not of the requested type.
    #[error("wrapper for {key} is not a `{expected}`")]
    WrapperTypeMismatch {
        /// Identity of the wrapped resource.
        key: IdentityKey,
        /// Requested wrapper type name.
        expected: &'static str,
    },
}

impl InteropError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
