//! Drawing session wrapper.

use std::sync::Arc;

use redlilium_interop::{
    validate_same_device, ContextHints, HasWrapperBase, IdentityKey, InteropError, NativeHandle,
    ResourceRegistry, ResourceWrapper, WrapperBase,
};

use crate::bitmap::CanvasBitmap;
use crate::device::{bound_device, CanvasDevice};
use crate::error::CanvasError;
use crate::native::{DrawCommand, NativeDeviceContext};
use crate::types::{Color, Point, Rect};

/// Records drawing commands into a render target.
///
/// Closing the session, or dropping its last reference, ends the native draw;
/// every drawing call after that fails with `Closed`.
///
/// # Example
///
/// ```ignore
/// let session = target.create_drawing_session()?;
/// session.clear(Color::CORNFLOWER_BLUE)?;
/// session.draw_bitmap(&sprite, Point::new(10.0, 10.0))?;
/// session.close();
/// ```
pub struct CanvasDrawingSession {
    base: WrapperBase<NativeDeviceContext>,
}

impl HasWrapperBase for CanvasDrawingSession {
    type Resource = NativeDeviceContext;

    fn wrapper_base(&self) -> &WrapperBase<NativeDeviceContext> {
        &self.base
    }

    fn on_close(&self, context: &Arc<NativeDeviceContext>) {
        if context.end_draw() {
            log::trace!("CanvasDrawingSession: ended draw for {}", self.base.identity());
        }
    }
}

impl CanvasDrawingSession {
    /// Wrap a native device context of `device`.
    pub fn from_native(
        device: &Arc<CanvasDevice>,
        native: &Arc<NativeDeviceContext>,
    ) -> Result<Arc<Self>, CanvasError> {
        let registry = device.require_registry()?;
        let hints = ContextHints::new().with_device(device.clone());
        let handle: NativeHandle = native.clone();
        Ok(registry.get_or_create_as::<Self>(&hints, &handle)?)
    }

    /// Wrap and register a context that was just created.
    pub(crate) fn register(
        device: &Arc<CanvasDevice>,
        context: Arc<NativeDeviceContext>,
    ) -> Result<Arc<Self>, CanvasError> {
        let registry = device.require_registry()?;
        let pending = registry.begin_registration(&context)?;
        let session = Arc::new(Self::wrap(&registry, Arc::clone(device), context)?);
        pending.publish(&session)?;
        Ok(session)
    }

    pub(crate) fn wrap(
        registry: &Arc<ResourceRegistry>,
        device: Arc<CanvasDevice>,
        context: Arc<NativeDeviceContext>,
    ) -> Result<Self, InteropError> {
        let owner = device.wrapper_base().access_resource()?;
        if !Arc::ptr_eq(context.device(), &owner) {
            return Err(InteropError::CrossDevice {
                key: IdentityKey::of(&context),
            });
        }
        Ok(Self {
            base: WrapperBase::new(registry, context).with_device(device),
        })
    }

    /// Get the native device context.
    pub fn native(&self) -> Result<Arc<NativeDeviceContext>, CanvasError> {
        Ok(self.base.access_resource()?)
    }

    /// Get the device the session draws with.
    pub fn device(&self) -> Result<Arc<CanvasDevice>, CanvasError> {
        Ok(bound_device(&self.base)?)
    }

    /// Fill the whole target with `color`.
    pub fn clear(&self, color: Color) -> Result<(), CanvasError> {
        self.native()?.clear(color)
    }

    /// Draw `bitmap` with its top-left corner at `at`.
    ///
    /// The bitmap must belong to the session's device.
    pub fn draw_bitmap(&self, bitmap: &CanvasBitmap, at: Point) -> Result<(), CanvasError> {
        let context = self.native()?;
        let device = self.device()?;
        validate_same_device(bitmap.identity(), bitmap.bound_device().as_deref(), &*device)?;
        context.draw_bitmap(&bitmap.native()?, at)
    }

    /// Fill `rect` with a solid color.
    pub fn fill_rectangle(&self, rect: Rect, color: Color) -> Result<(), CanvasError> {
        self.native()?.fill_rectangle(rect, color)
    }

    /// Number of commands recorded so far.
    pub fn command_count(&self) -> Result<usize, CanvasError> {
        Ok(self.native()?.command_count())
    }

    /// Commands recorded so far, oldest first.
    pub fn commands(&self) -> Result<Vec<DrawCommand>, CanvasError> {
        Ok(self.native()?.commands())
    }
}

impl Drop for CanvasDrawingSession {
    fn drop(&mut self) {
        ResourceWrapper::close(self);
    }
}

impl std::fmt::Debug for CanvasDrawingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasDrawingSession")
            .field("base", &self.base)
            .finish()
    }
}

static_assertions::assert_impl_all!(CanvasDrawingSession: Send, Sync);
