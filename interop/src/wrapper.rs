//! Wrapper base behavior.
//!
//! Every wrapper type embeds a [`WrapperBase`] and implements
//! [`HasWrapperBase`]; that is enough to make it a [`ResourceWrapper`] that
//! the registry can cache, validate, and hand out.
//!
//! # Example
//!
//! ```ignore
//! struct CanvasBrush {
//!     base: WrapperBase<NativeBrush>,
//! }
//!
//! impl HasWrapperBase for CanvasBrush {
//!     type Resource = NativeBrush;
//!     fn wrapper_base(&self) -> &WrapperBase<NativeBrush> {
//!         &self.base
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::error::InteropError;
use crate::handle::ClosableHandle;
use crate::identity::IdentityKey;
use crate::native::{AsAny, NativeResource};
use crate::registry::ResourceRegistry;

/// Process-unique id of a wrapper instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WrapperId(u64);

impl WrapperId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Object-safe view of a wrapper, as stored and returned by the registry.
pub trait ResourceWrapper: AsAny {
    /// Identity of the wrapped native resource.
    fn identity(&self) -> IdentityKey;

    /// Unique id of this wrapper instance.
    fn wrapper_id(&self) -> WrapperId;

    /// Whether the wrapper has been closed.
    fn is_closed(&self) -> bool;

    /// Release the native resource and deregister. Idempotent.
    fn close(&self);

    /// Device the wrapper is bound to, if any.
    fn bound_device(&self) -> Option<Arc<dyn ResourceWrapper>>;

    /// DPI the wrapper is bound to, if any.
    fn bound_dpi(&self) -> Option<f32>;
}

/// Implemented by wrapper types that embed a [`WrapperBase`].
pub trait HasWrapperBase: Send + Sync + 'static {
    /// Native resource type owned by the wrapper.
    type Resource: NativeResource;

    /// The embedded base.
    fn wrapper_base(&self) -> &WrapperBase<Self::Resource>;

    /// Teardown run after the wrapper deregistered, with the detached resource.
    fn on_close(&self, _resource: &Arc<Self::Resource>) {}
}

impl<T: HasWrapperBase> ResourceWrapper for T {
    fn identity(&self) -> IdentityKey {
        self.wrapper_base().identity()
    }

    fn wrapper_id(&self) -> WrapperId {
        self.wrapper_base().id()
    }

    fn is_closed(&self) -> bool {
        self.wrapper_base().is_closed()
    }

    fn close(&self) {
        if let Some(resource) = self.wrapper_base().close() {
            self.on_close(&resource);
        }
    }

    fn bound_device(&self) -> Option<Arc<dyn ResourceWrapper>> {
        self.wrapper_base().device().cloned()
    }

    fn bound_dpi(&self) -> Option<f32> {
        self.wrapper_base().dpi()
    }
}

/// State shared by every wrapper: the closable resource handle, its identity,
/// the registry it deregisters from, and optional device/DPI bindings.
pub struct WrapperBase<R: NativeResource> {
    id: WrapperId,
    key: IdentityKey,
    handle: ClosableHandle<R>,
    registry: Weak<ResourceRegistry>,
    device: Option<Arc<dyn ResourceWrapper>>,
    dpi: Option<f32>,
}

impl<R: NativeResource> WrapperBase<R> {
    /// Create a base owning `resource`.
    ///
    /// The base is not registered yet; whoever constructs the wrapper publishes
    /// it (the registry does so for wrappers built by type probes).
    pub fn new(registry: &Arc<ResourceRegistry>, resource: Arc<R>) -> Self {
        Self {
            id: WrapperId::next(),
            key: IdentityKey::of(&resource),
            handle: ClosableHandle::new(resource),
            registry: Arc::downgrade(registry),
            device: None,
            dpi: None,
        }
    }

    /// Bind the wrapper to a device.
    pub fn with_device(mut self, device: Arc<dyn ResourceWrapper>) -> Self {
        self.device = Some(device);
        self
    }

    /// Bind the wrapper to a DPI.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    /// Unique id of this wrapper instance.
    pub fn id(&self) -> WrapperId {
        self.id
    }

    /// Identity of the wrapped resource. Stays valid after close.
    pub fn identity(&self) -> IdentityKey {
        self.key
    }

    /// Bound device, if any.
    pub fn device(&self) -> Option<&Arc<dyn ResourceWrapper>> {
        self.device.as_ref()
    }

    /// Bound DPI, if any.
    pub fn dpi(&self) -> Option<f32> {
        self.dpi
    }

    /// Registry this wrapper deregisters from, if it still exists.
    pub fn registry(&self) -> Option<Arc<ResourceRegistry>> {
        self.registry.upgrade()
    }

    /// Get the native resource.
    ///
    /// # Errors
    ///
    /// Returns [`InteropError::Closed`] after the wrapper was closed.
    pub fn access_resource(&self) -> Result<Arc<R>, InteropError> {
        self.handle.access()
    }

    /// Whether the wrapper has been closed.
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    /// Close the handle and deregister.
    ///
    /// The registry entry is removed before the detached reference is handed
    /// back, so the native resource cannot be released (and its address
    /// reused) while an entry still points at this wrapper. Returns `None` if
    /// the wrapper was already closed.
    pub fn close(&self) -> Option<Arc<R>> {
        let resource = self.handle.close()?;
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.key, self.id);
        }
        log::trace!("WrapperBase: closed wrapper {:?} for {}", self.id, self.key);
        Some(resource)
    }
}

impl<R: NativeResource> Drop for WrapperBase<R> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<R: NativeResource> std::fmt::Debug for WrapperBase<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrapperBase")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("closed", &self.is_closed())
            .field("dpi", &self.dpi)
            .finish_non_exhaustive()
    }
}

/// Whether two wrapper references denote the same wrapper instance.
pub fn same_instance(a: &dyn ResourceWrapper, b: &dyn ResourceWrapper) -> bool {
    a.wrapper_id() == b.wrapper_id()
}

/// Downcast an erased wrapper to its concrete type.
///
/// # Errors
///
/// Returns [`InteropError::WrapperTypeMismatch`] if the wrapper is of another type.
pub fn downcast_wrapper<W: ResourceWrapper>(
    wrapper: Arc<dyn ResourceWrapper>,
) -> Result<Arc<W>, InteropError> {
    let key = wrapper.identity();
    wrapper
        .into_any()
        .downcast::<W>()
        .map_err(|_| InteropError::WrapperTypeMismatch {
            key,
            expected: std::any::type_name::<W>(),
        })
}
