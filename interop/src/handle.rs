//! Closable strong handle to a native resource.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::InteropError;

/// A strong reference that can be explicitly invalidated.
///
/// While open, [`access`](Self::access) hands out clones of the held `Arc`.
/// [`close`](Self::close) takes the reference out under the same lock, so a
/// concurrent accessor either got its clone before the detach or observes
/// [`InteropError::Closed`]; it never sees a half-released reference.
///
/// The handle itself is not `Clone`: exactly one owner decides when it closes.
pub struct ClosableHandle<T: ?Sized> {
    inner: Mutex<Option<Arc<T>>>,
}

impl<T: ?Sized> ClosableHandle<T> {
    /// Create an open handle.
    pub fn new(resource: Arc<T>) -> Self {
        Self {
            inner: Mutex::new(Some(resource)),
        }
    }

    /// Create an open handle from a possibly missing resource.
    ///
    /// # Errors
    ///
    /// Returns [`InteropError::InvalidArgument`] if `resource` is `None`.
    pub fn from_option(resource: Option<Arc<T>>) -> Result<Self, InteropError> {
        resource
            .map(Self::new)
            .ok_or_else(|| InteropError::invalid("resource must not be null"))
    }

    /// Get a strong reference to the resource.
    ///
    /// # Errors
    ///
    /// Returns [`InteropError::Closed`] once the handle has been closed.
    pub fn access(&self) -> Result<Arc<T>, InteropError> {
        self.inner.lock().clone().ok_or(InteropError::Closed)
    }

    /// Detach the held reference and return it for further teardown.
    ///
    /// Returns `None` if the handle was already closed, so calling this
    /// twice has the effect of calling it once.
    pub fn close(&self) -> Option<Arc<T>> {
        self.inner.lock().take()
    }

    /// Whether the handle has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_none()
    }
}

impl<T: ?Sized> std::fmt::Debug for ClosableHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosableHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}

static_assertions::assert_impl_all!(ClosableHandle<String>: Send, Sync);
static_assertions::assert_not_impl_any!(ClosableHandle<String>: Clone);
