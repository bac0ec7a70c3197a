//! Canvas device wrapper.

use std::sync::Arc;

use redlilium_interop::{
    downcast_wrapper, ContextHints, HasWrapperBase, InteropError, NativeHandle, NativeResource,
    ResourceRegistry, WrapperBase,
};

use crate::bitmap::{CanvasBitmap, CanvasRenderTarget};
use crate::error::CanvasError;
use crate::native::NativeDevice;
use crate::types::{BitmapDescriptor, BitmapOptions, DeviceDescriptor};

/// A device: the root that bitmaps, render targets and drawing sessions
/// belong to.
///
/// Devices are reference-counted and registered with a
/// [`ResourceRegistry`]; wrapping the same [`NativeDevice`] twice yields the
/// same `CanvasDevice`.
///
/// # Example
///
/// ```ignore
/// let device = CanvasDevice::new(shared_registry(), &DeviceDescriptor::new())?;
/// let target = device.create_render_target(&BitmapDescriptor::new(256, 256))?;
/// ```
pub struct CanvasDevice {
    base: WrapperBase<NativeDevice>,
}

impl HasWrapperBase for CanvasDevice {
    type Resource = NativeDevice;

    fn wrapper_base(&self) -> &WrapperBase<NativeDevice> {
        &self.base
    }
}

impl CanvasDevice {
    /// Create a native device and its wrapper.
    pub fn new(
        registry: &Arc<ResourceRegistry>,
        descriptor: &DeviceDescriptor,
    ) -> Result<Arc<Self>, CanvasError> {
        let native = NativeDevice::new(descriptor)?;
        let pending = registry.begin_registration(&native)?;
        let device = Arc::new(Self::wrap(registry, native));
        pending.publish(&device)?;
        log::debug!("CanvasDevice: created {:?}", descriptor.label);
        Ok(device)
    }

    /// Wrap an existing native device, returning its current wrapper if it has one.
    pub fn from_native(
        registry: &Arc<ResourceRegistry>,
        native: &Arc<NativeDevice>,
    ) -> Result<Arc<Self>, CanvasError> {
        let handle: NativeHandle = native.clone();
        Ok(registry.get_or_create_as::<Self>(&ContextHints::new(), &handle)?)
    }

    pub(crate) fn wrap(registry: &Arc<ResourceRegistry>, native: Arc<NativeDevice>) -> Self {
        Self {
            base: WrapperBase::new(registry, native),
        }
    }

    /// The native device.
    pub fn native(&self) -> Result<Arc<NativeDevice>, CanvasError> {
        Ok(self.base.access_resource()?)
    }

    /// Get the device name.
    pub fn name(&self) -> Result<String, CanvasError> {
        Ok(self.native()?.name().to_string())
    }

    /// Largest bitmap width or height this device accepts.
    pub fn max_bitmap_size(&self) -> Result<u32, CanvasError> {
        Ok(self.native()?.max_bitmap_size())
    }

    /// Registry this device and its resources are registered with.
    pub fn registry(&self) -> Option<Arc<ResourceRegistry>> {
        self.base.registry()
    }

    pub(crate) fn require_registry(&self) -> Result<Arc<ResourceRegistry>, InteropError> {
        self.base.registry().ok_or_else(|| {
            InteropError::InvalidArgument("the device's registry no longer exists".to_string())
        })
    }

    /// Create a bitmap on this device.
    ///
    /// Use [`create_render_target`](Self::create_render_target) for bitmaps
    /// that are drawn into.
    pub fn create_bitmap(
        self: &Arc<Self>,
        descriptor: &BitmapDescriptor,
    ) -> Result<Arc<CanvasBitmap>, CanvasError> {
        if descriptor.options.contains(BitmapOptions::TARGET) {
            return Err(CanvasError::invalid(
                "use create_render_target for bitmaps with the TARGET option",
            ));
        }
        let registry = self.require_registry()?;
        let native = self.native()?.create_bitmap(descriptor)?;
        let pending = registry.begin_registration(&native)?;
        let bitmap = Arc::new(CanvasBitmap::wrap(
            &registry,
            Arc::clone(self),
            native,
            descriptor.dpi,
        )?);
        pending.publish(&bitmap)?;
        Ok(bitmap)
    }

    /// Create a render target on this device.
    pub fn create_render_target(
        self: &Arc<Self>,
        descriptor: &BitmapDescriptor,
    ) -> Result<Arc<CanvasRenderTarget>, CanvasError> {
        let descriptor = descriptor
            .clone()
            .with_options(descriptor.options | BitmapOptions::TARGET);
        let registry = self.require_registry()?;
        let native = self.native()?.create_bitmap(&descriptor)?;
        let pending = registry.begin_registration(&native)?;
        let target = Arc::new(CanvasRenderTarget::wrap(
            &registry,
            Arc::clone(self),
            native,
            descriptor.dpi,
        )?);
        pending.publish(&target)?;
        Ok(target)
    }
}

/// Get the canvas device `base` is bound to.
pub(crate) fn bound_device<R: NativeResource>(
    base: &WrapperBase<R>,
) -> Result<Arc<CanvasDevice>, InteropError> {
    let device = base.device().ok_or_else(|| {
        InteropError::InvalidArgument(format!(
            "wrapper for {} is not bound to a device",
            base.identity()
        ))
    })?;
    downcast_wrapper::<CanvasDevice>(Arc::clone(device))
}

impl std::fmt::Debug for CanvasDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasDevice")
            .field("base", &self.base)
            .finish()
    }
}

static_assertions::assert_impl_all!(CanvasDevice: Send, Sync);
