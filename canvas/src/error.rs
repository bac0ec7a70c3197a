//! Canvas error types.

use redlilium_interop::InteropError;

/// Errors returned by canvas wrappers and the dummy native backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CanvasError {
    /// Failure in the wrapper cache (closed object, cross-device use, ...).
    #[error(transparent)]
    Interop(#[from] InteropError),

    /// The native backend rejected a parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl CanvasError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CanvasError::from(InteropError::Closed);
        assert_eq!(err.to_string(), "object has been closed");

        let err = CanvasError::invalid("bitmap size cannot be zero");
        assert_eq!(err.to_string(), "invalid parameter: bitmap size cannot be zero");
    }

    #[test]
    fn test_interop_conversion() {
        fn fails() -> Result<(), CanvasError> {
            let result: Result<(), InteropError> = Err(InteropError::Closed);
            result?;
            Ok(())
        }
        assert_eq!(fails(), Err(CanvasError::Interop(InteropError::Closed)));
    }
}
