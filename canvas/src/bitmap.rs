//! Bitmap and render target wrappers.

use std::sync::Arc;

use redlilium_interop::{
    ContextHints, HasWrapperBase, IdentityKey, InteropError, NativeHandle, ResourceRegistry,
    WrapperBase,
};

use crate::device::{bound_device, CanvasDevice};
use crate::drawing_session::CanvasDrawingSession;
use crate::error::CanvasError;
use crate::native::NativeBitmap;
use crate::types::{BitmapOptions, PixelFormat, Size, SizeU, DEFAULT_DPI};

/// A bitmap bound to a device and a DPI.
///
/// The DPI is the one the native bitmap was created with. It only affects the
/// size reported in device-independent pixels ([`size`](Self::size)); the
/// pixel storage is unchanged.
pub struct CanvasBitmap {
    base: WrapperBase<NativeBitmap>,
}

impl HasWrapperBase for CanvasBitmap {
    type Resource = NativeBitmap;

    fn wrapper_base(&self) -> &WrapperBase<NativeBitmap> {
        &self.base
    }
}

impl CanvasBitmap {
    /// Wrap a native bitmap of `device` at `dpi`.
    ///
    /// Returns the existing wrapper if the bitmap is already wrapped; that
    /// wrapper must be bound to the same device and DPI. Render-target
    /// bitmaps are wrapped with [`CanvasRenderTarget::from_native`] and viewed
    /// as bitmaps through [`CanvasRenderTarget::as_bitmap`].
    pub fn from_native(
        device: &Arc<CanvasDevice>,
        native: &Arc<NativeBitmap>,
        dpi: f32,
    ) -> Result<Arc<Self>, CanvasError> {
        if native.is_target() {
            return Err(CanvasError::Interop(InteropError::InvalidArgument(
                "bitmap is a render target, use CanvasRenderTarget::from_native".to_string(),
            )));
        }
        Ok(wrap_existing::<Self>(device, native, dpi)?)
    }

    pub(crate) fn wrap(
        registry: &Arc<ResourceRegistry>,
        device: Arc<CanvasDevice>,
        native: Arc<NativeBitmap>,
        dpi: f32,
    ) -> Result<Self, InteropError> {
        check_owner(&device, &native)?;
        if dpi != native.dpi() {
            return Err(InteropError::CrossDpi {
                key: IdentityKey::of(&native),
                existing: native.dpi(),
                requested: dpi,
            });
        }
        Ok(Self {
            base: WrapperBase::new(registry, native)
                .with_device(device)
                .with_dpi(dpi),
        })
    }

    /// Get the native bitmap.
    pub fn native(&self) -> Result<Arc<NativeBitmap>, CanvasError> {
        Ok(self.base.access_resource()?)
    }

    /// Get the device the bitmap belongs to.
    pub fn device(&self) -> Result<Arc<CanvasDevice>, CanvasError> {
        Ok(bound_device(&self.base)?)
    }

    /// Get the DPI the bitmap is bound to. Stays valid after close.
    pub fn dpi(&self) -> f32 {
        self.base.dpi().unwrap_or(DEFAULT_DPI)
    }

    /// Get the size in pixels.
    pub fn size_in_pixels(&self) -> Result<SizeU, CanvasError> {
        Ok(self.native()?.size())
    }

    /// Get the size in device-independent pixels at this bitmap's DPI.
    pub fn size(&self) -> Result<Size, CanvasError> {
        Ok(Size::from_pixels(self.size_in_pixels()?, self.dpi()))
    }

    /// Get the pixel format.
    pub fn format(&self) -> Result<PixelFormat, CanvasError> {
        Ok(self.native()?.format())
    }

    /// Get the creation options.
    pub fn options(&self) -> Result<BitmapOptions, CanvasError> {
        Ok(self.native()?.options())
    }
}

impl std::fmt::Debug for CanvasBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasBitmap")
            .field("base", &self.base)
            .finish()
    }
}

/// A bitmap that can be drawn into.
///
/// Use [`as_bitmap`](Self::as_bitmap) wherever a plain [`CanvasBitmap`] is
/// expected.
pub struct CanvasRenderTarget {
    bitmap: CanvasBitmap,
}

impl HasWrapperBase for CanvasRenderTarget {
    type Resource = NativeBitmap;

    fn wrapper_base(&self) -> &WrapperBase<NativeBitmap> {
        &self.bitmap.base
    }
}

impl CanvasRenderTarget {
    /// Wrap a native render-target bitmap of `device` at `dpi`.
    pub fn from_native(
        device: &Arc<CanvasDevice>,
        native: &Arc<NativeBitmap>,
        dpi: f32,
    ) -> Result<Arc<Self>, CanvasError> {
        if !native.is_target() {
            return Err(CanvasError::Interop(InteropError::InvalidArgument(
                "bitmap is not a render target, use CanvasBitmap::from_native".to_string(),
            )));
        }
        Ok(wrap_existing::<Self>(device, native, dpi)?)
    }

    pub(crate) fn wrap(
        registry: &Arc<ResourceRegistry>,
        device: Arc<CanvasDevice>,
        native: Arc<NativeBitmap>,
        dpi: f32,
    ) -> Result<Self, InteropError> {
        if !native.is_target() {
            return Err(InteropError::InvalidArgument(
                "bitmap was not created as a render target".to_string(),
            ));
        }
        Ok(Self {
            bitmap: CanvasBitmap::wrap(registry, device, native, dpi)?,
        })
    }

    /// View as a plain bitmap, e.g. to draw it into another target.
    pub fn as_bitmap(&self) -> &CanvasBitmap {
        &self.bitmap
    }

    /// Get the native bitmap.
    pub fn native(&self) -> Result<Arc<NativeBitmap>, CanvasError> {
        self.bitmap.native()
    }

    /// Get the device the target belongs to.
    pub fn device(&self) -> Result<Arc<CanvasDevice>, CanvasError> {
        self.bitmap.device()
    }

    /// Get the DPI the target is bound to.
    pub fn dpi(&self) -> f32 {
        self.bitmap.dpi()
    }

    /// Get the size in pixels.
    pub fn size_in_pixels(&self) -> Result<SizeU, CanvasError> {
        self.bitmap.size_in_pixels()
    }

    /// Get the size in device-independent pixels.
    pub fn size(&self) -> Result<Size, CanvasError> {
        self.bitmap.size()
    }

    /// Get the pixel format.
    pub fn format(&self) -> Result<PixelFormat, CanvasError> {
        self.bitmap.format()
    }

    /// Get the creation options.
    pub fn options(&self) -> Result<BitmapOptions, CanvasError> {
        self.bitmap.options()
    }

    /// Begin drawing into this target.
    ///
    /// The session ends its native draw when it is closed or dropped.
    pub fn create_drawing_session(&self) -> Result<Arc<CanvasDrawingSession>, CanvasError> {
        let native = self.native()?;
        let device = self.device()?;
        let context = device.native()?.create_device_context(&native)?;
        CanvasDrawingSession::register(&device, context)
    }
}

impl std::fmt::Debug for CanvasRenderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasRenderTarget")
            .field("base", &self.bitmap.base)
            .finish()
    }
}

static_assertions::assert_impl_all!(CanvasBitmap: Send, Sync);
static_assertions::assert_impl_all!(CanvasRenderTarget: Send, Sync);

/// Fail with `CrossDevice` unless `native` was created by `device`.
fn check_owner(device: &CanvasDevice, native: &Arc<NativeBitmap>) -> Result<(), InteropError> {
    let owner = device.wrapper_base().access_resource()?;
    if Arc::ptr_eq(native.device(), &owner) {
        Ok(())
    } else {
        Err(InteropError::CrossDevice {
            key: IdentityKey::of(native),
        })
    }
}

fn wrap_existing<W: HasWrapperBase<Resource = NativeBitmap>>(
    device: &Arc<CanvasDevice>,
    native: &Arc<NativeBitmap>,
    dpi: f32,
) -> Result<Arc<W>, InteropError> {
    let registry = device.require_registry()?;
    let hints = ContextHints::new()
        .with_device(device.clone())
        .with_dpi(dpi);
    let handle: NativeHandle = native.clone();
    registry.get_or_create_as::<W>(&hints, &handle)
}
