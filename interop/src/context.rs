//! Context hints passed alongside a native resource.
//!
//! Hints never take part in the cache key: two callers that wrap the same
//! resource with different hints converge on one wrapper, and the hints are
//! only used to validate a cached wrapper or to feed a wrapper constructor.

use std::sync::Arc;

use crate::error::InteropError;
use crate::identity::IdentityKey;
use crate::wrapper::{same_instance, ResourceWrapper};

/// Optional device and DPI supplied with a wrap request.
#[derive(Clone, Default)]
pub struct ContextHints {
    /// Device the wrapper should belong to.
    pub device: Option<Arc<dyn ResourceWrapper>>,
    /// Dots per inch the wrapper should use.
    pub dpi: Option<f32>,
}

impl ContextHints {
    /// Hints with neither device nor DPI.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the device hint.
    pub fn with_device(mut self, device: Arc<dyn ResourceWrapper>) -> Self {
        self.device = Some(device);
        self
    }

    /// Set the DPI hint.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    /// Check that the hints themselves are well formed.
    ///
    /// # Errors
    ///
    /// Returns [`InteropError::InvalidArgument`] for a DPI that is not a
    /// finite positive number.
    pub fn validate(&self) -> Result<(), InteropError> {
        match self.dpi {
            Some(dpi) => validate_dpi(dpi),
            None => Ok(()),
        }
    }

    /// The device hint, required by device-bound wrapper types.
    pub fn require_device(&self) -> Result<&Arc<dyn ResourceWrapper>, InteropError> {
        self.device
            .as_ref()
            .ok_or_else(|| InteropError::invalid("a device is required to wrap this resource"))
    }

    /// The DPI hint, required by DPI-bound wrapper types.
    pub fn require_dpi(&self) -> Result<f32, InteropError> {
        let dpi = self
            .dpi
            .ok_or_else(|| InteropError::invalid("a dpi is required to wrap this resource"))?;
        validate_dpi(dpi)?;
        Ok(dpi)
    }

    /// Check a cached wrapper against these hints.
    ///
    /// A hint that is absent, or a binding the wrapper does not have, is not
    /// checked. When both sides are present they must agree.
    ///
    /// # Errors
    ///
    /// Returns [`InteropError::CrossDevice`] or [`InteropError::CrossDpi`].
    pub fn check_compatible(&self, wrapper: &dyn ResourceWrapper) -> Result<(), InteropError> {
        let key = wrapper.identity();
        if let Some(requested) = &self.device {
            validate_same_device(key, wrapper.bound_device().as_deref(), &**requested)?;
        }
        if let (Some(requested), Some(existing)) = (self.dpi, wrapper.bound_dpi()) {
            if requested != existing {
                return Err(InteropError::CrossDpi {
                    key,
                    existing,
                    requested,
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ContextHints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextHints")
            .field("device", &self.device.as_ref().map(|d| d.identity()))
            .field("dpi", &self.dpi)
            .finish()
    }
}

/// Reject DPI values that are not finite and positive.
pub fn validate_dpi(dpi: f32) -> Result<(), InteropError> {
    if dpi.is_finite() && dpi > 0.0 {
        Ok(())
    } else {
        Err(InteropError::invalid(format!(
            "dpi must be a positive number, got {dpi}"
        )))
    }
}

/// Fail with [`InteropError::CrossDevice`] if `bound` is a device other than
/// `requested`. An unbound wrapper accepts any device.
pub fn validate_same_device(
    key: IdentityKey,
    bound: Option<&dyn ResourceWrapper>,
    requested: &dyn ResourceWrapper,
) -> Result<(), InteropError> {
    match bound {
        Some(bound) if !same_instance(bound, requested) => Err(InteropError::CrossDevice { key }),
        _ => Ok(()),
    }
}
