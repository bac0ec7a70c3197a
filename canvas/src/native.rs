//! Dummy native 2D backend.
//!
//! In-process stand-ins for the objects a native 2D library hands out:
//! devices, bitmaps, device contexts, and stroke styles. They perform no
//! rasterization; a device context only records the commands issued on it,
//! which is enough to exercise the wrapper layer without a GPU.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use redlilium_interop::{IdentityKey, NativeResource};

use crate::error::CanvasError;
use crate::types::{
    BitmapDescriptor, BitmapOptions, Color, DashStyle, DeviceDescriptor, PixelFormat, Point, Rect,
    SizeU,
};

// ============================================================================
// Device
// ============================================================================

/// Native device: owns the limits resources are validated against.
pub struct NativeDevice {
    name: String,
    max_bitmap_size: u32,
}

impl NativeDevice {
    /// Create a native device.
    pub fn new(descriptor: &DeviceDescriptor) -> Result<Arc<Self>, CanvasError> {
        if descriptor.max_bitmap_size == 0 {
            return Err(CanvasError::invalid("max bitmap size cannot be zero"));
        }
        let name = descriptor
            .label
            .clone()
            .unwrap_or_else(|| "Dummy Device".to_string());
        log::trace!(
            "NativeDevice: creating {name} (max bitmap size: {})",
            descriptor.max_bitmap_size
        );
        Ok(Arc::new(Self {
            name,
            max_bitmap_size: descriptor.max_bitmap_size,
        }))
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Largest accepted bitmap width or height.
    pub fn max_bitmap_size(&self) -> u32 {
        self.max_bitmap_size
    }

    /// Create a bitmap owned by this device.
    pub fn create_bitmap(
        self: &Arc<Self>,
        descriptor: &BitmapDescriptor,
    ) -> Result<Arc<NativeBitmap>, CanvasError> {
        let size = descriptor.size();
        if size.is_empty() {
            return Err(CanvasError::invalid("bitmap dimensions cannot be zero"));
        }
        if size.width > self.max_bitmap_size || size.height > self.max_bitmap_size {
            return Err(CanvasError::invalid(format!(
                "bitmap dimension exceeds maximum {}",
                self.max_bitmap_size
            )));
        }
        if descriptor
            .options
            .contains(BitmapOptions::CPU_READ | BitmapOptions::TARGET)
        {
            return Err(CanvasError::invalid(
                "a CPU readable bitmap cannot be a render target",
            ));
        }
        if !(descriptor.dpi.is_finite() && descriptor.dpi > 0.0) {
            return Err(CanvasError::invalid(format!(
                "dpi must be a positive number, got {}",
                descriptor.dpi
            )));
        }

        log::trace!(
            "NativeDevice: creating bitmap {:?}, size={}x{}, options={:?}",
            descriptor.label,
            size.width,
            size.height,
            descriptor.options
        );
        Ok(Arc::new(NativeBitmap {
            device: Arc::clone(self),
            size,
            format: descriptor.format,
            options: descriptor.options,
            dpi: descriptor.dpi,
            label: descriptor.label.clone(),
        }))
    }

    /// Begin drawing into `target`.
    pub fn create_device_context(
        self: &Arc<Self>,
        target: &Arc<NativeBitmap>,
    ) -> Result<Arc<NativeDeviceContext>, CanvasError> {
        if !Arc::ptr_eq(&target.device, self) {
            return Err(CanvasError::invalid(
                "target bitmap belongs to a different device",
            ));
        }
        if !target.options.contains(BitmapOptions::TARGET) {
            return Err(CanvasError::invalid(
                "bitmap was not created as a render target",
            ));
        }
        Ok(Arc::new(NativeDeviceContext {
            device: Arc::clone(self),
            target: Arc::clone(target),
            commands: Mutex::new(Vec::new()),
            drawing: AtomicBool::new(true),
        }))
    }
}

impl NativeResource for NativeDevice {
    fn label(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl std::fmt::Debug for NativeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeDevice")
            .field("name", &self.name)
            .field("max_bitmap_size", &self.max_bitmap_size)
            .finish()
    }
}

// ============================================================================
// Bitmap
// ============================================================================

/// Native bitmap. Holds a strong reference to the device that created it.
pub struct NativeBitmap {
    device: Arc<NativeDevice>,
    size: SizeU,
    format: PixelFormat,
    options: BitmapOptions,
    dpi: f32,
    label: Option<String>,
}

impl NativeBitmap {
    /// Device that created the bitmap.
    pub fn device(&self) -> &Arc<NativeDevice> {
        &self.device
    }

    /// Size in pixels.
    pub fn size(&self) -> SizeU {
        self.size
    }

    /// Pixel format.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Creation options.
    pub fn options(&self) -> BitmapOptions {
        self.options
    }

    /// DPI the bitmap was created with.
    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    /// Whether the bitmap can be drawn into.
    pub fn is_target(&self) -> bool {
        self.options.contains(BitmapOptions::TARGET)
    }
}

impl NativeResource for NativeBitmap {
    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl std::fmt::Debug for NativeBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBitmap")
            .field("size", &self.size)
            .field("format", &self.format)
            .field("options", &self.options)
            .field("dpi", &self.dpi)
            .field("label", &self.label)
            .finish()
    }
}

// ============================================================================
// Device context
// ============================================================================

/// A command recorded by a [`NativeDeviceContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole target with a color.
    Clear(Color),
    /// Draw the bitmap with the given identity at a position.
    DrawBitmap { bitmap: IdentityKey, at: Point },
    /// Fill a rectangle with a solid color.
    FillRectangle { rect: Rect, color: Color },
}

/// Native device context drawing into a target bitmap.
///
/// Created in the drawing state; [`end_draw`](Self::end_draw) leaves it, after
/// which further commands are rejected.
pub struct NativeDeviceContext {
    device: Arc<NativeDevice>,
    target: Arc<NativeBitmap>,
    commands: Mutex<Vec<DrawCommand>>,
    drawing: AtomicBool,
}

impl NativeDeviceContext {
    /// Device that created the context.
    pub fn device(&self) -> &Arc<NativeDevice> {
        &self.device
    }

    /// Bitmap being drawn into.
    pub fn target(&self) -> &Arc<NativeBitmap> {
        &self.target
    }

    /// Whether commands are still accepted.
    pub fn is_drawing(&self) -> bool {
        self.drawing.load(Ordering::Acquire)
    }

    /// Stop accepting commands. Returns false if drawing had already ended.
    pub fn end_draw(&self) -> bool {
        let was_drawing = self.drawing.swap(false, Ordering::AcqRel);
        if was_drawing {
            log::trace!(
                "NativeDeviceContext: end draw after {} commands",
                self.commands.lock().len()
            );
        }
        was_drawing
    }

    pub fn clear(&self, color: Color) -> Result<(), CanvasError> {
        self.record(DrawCommand::Clear(color))
    }

    /// Draw `bitmap` with its top-left corner at `at`.
    pub fn draw_bitmap(&self, bitmap: &Arc<NativeBitmap>, at: Point) -> Result<(), CanvasError> {
        if !Arc::ptr_eq(&bitmap.device, &self.device) {
            return Err(CanvasError::invalid(
                "bitmap belongs to a different device",
            ));
        }
        if Arc::ptr_eq(bitmap, &self.target) {
            return Err(CanvasError::invalid(
                "a bitmap cannot be drawn onto itself",
            ));
        }
        if bitmap.options.contains(BitmapOptions::CANNOT_DRAW) {
            return Err(CanvasError::invalid(
                "bitmap was created with CANNOT_DRAW",
            ));
        }
        self.record(DrawCommand::DrawBitmap {
            bitmap: IdentityKey::of(bitmap),
            at,
        })
    }

    pub fn fill_rectangle(&self, rect: Rect, color: Color) -> Result<(), CanvasError> {
        self.record(DrawCommand::FillRectangle { rect, color })
    }

    /// Recorded commands, oldest first.
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.commands.lock().clone()
    }

    pub fn command_count(&self) -> usize {
        self.commands.lock().len()
    }

    fn record(&self, command: DrawCommand) -> Result<(), CanvasError> {
        if !self.is_drawing() {
            return Err(CanvasError::invalid("drawing has already ended"));
        }
        self.commands.lock().push(command);
        Ok(())
    }
}

impl NativeResource for NativeDeviceContext {}

impl std::fmt::Debug for NativeDeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeDeviceContext")
            .field("target", &IdentityKey::of(&self.target))
            .field("commands", &self.command_count())
            .field("drawing", &self.is_drawing())
            .finish()
    }
}

// ============================================================================
// Stroke style
// ============================================================================

/// Native stroke style. Device independent.
#[derive(Debug)]
pub struct NativeStrokeStyle {
    width: f32,
    dash: DashStyle,
}

impl NativeStrokeStyle {
    /// Create a stroke style.
    pub fn new(width: f32, dash: DashStyle) -> Result<Arc<Self>, CanvasError> {
        if !(width.is_finite() && width >= 0.0) {
            return Err(CanvasError::invalid(format!(
                "stroke width must be a non-negative number, got {width}"
            )));
        }
        Ok(Arc::new(Self { width, dash }))
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn dash_style(&self) -> DashStyle {
        self.dash
    }
}

impl NativeResource for NativeStrokeStyle {}

static_assertions::assert_impl_all!(NativeDevice: Send, Sync);
static_assertions::assert_impl_all!(NativeBitmap: Send, Sync);
static_assertions::assert_impl_all!(NativeDeviceContext: Send, Sync);
static_assertions::assert_impl_all!(NativeStrokeStyle: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> Arc<NativeDevice> {
        NativeDevice::new(&DeviceDescriptor::new().with_max_bitmap_size(1024)).unwrap()
    }

    fn target(device: &Arc<NativeDevice>) -> Arc<NativeBitmap> {
        device
            .create_bitmap(&BitmapDescriptor::new(64, 64).with_options(BitmapOptions::TARGET))
            .unwrap()
    }

    #[test]
    fn test_device_name() {
        assert_eq!(device().name(), "Dummy Device");
        let named = NativeDevice::new(&DeviceDescriptor::new().with_label("gpu0")).unwrap();
        assert_eq!(named.name(), "gpu0");
        assert_eq!(NativeResource::label(&*named), Some("gpu0"));
    }

    #[test]
    fn test_device_rejects_zero_limit() {
        let result = NativeDevice::new(&DeviceDescriptor::new().with_max_bitmap_size(0));
        assert!(matches!(result, Err(CanvasError::InvalidParameter(_))));
    }

    #[test]
    fn test_bitmap_validation() {
        let device = device();
        assert!(device.create_bitmap(&BitmapDescriptor::new(0, 10)).is_err());
        assert!(device.create_bitmap(&BitmapDescriptor::new(2048, 10)).is_err());
        assert!(device
            .create_bitmap(
                &BitmapDescriptor::new(8, 8)
                    .with_options(BitmapOptions::CPU_READ | BitmapOptions::TARGET)
            )
            .is_err());
        assert!(device
            .create_bitmap(&BitmapDescriptor::new(8, 8).with_dpi(0.0))
            .is_err());

        let bitmap = device.create_bitmap(&BitmapDescriptor::new(1024, 1)).unwrap();
        assert_eq!(bitmap.size(), SizeU::new(1024, 1));
        assert!(Arc::ptr_eq(bitmap.device(), &device));
        assert!(!bitmap.is_target());
    }

    #[test]
    fn test_context_records_until_end_draw() {
        let device = device();
        let target = target(&device);
        let source = device.create_bitmap(&BitmapDescriptor::new(8, 8)).unwrap();
        let context = device.create_device_context(&target).unwrap();

        context.clear(Color::BLACK).unwrap();
        context.draw_bitmap(&source, Point::new(1.0, 2.0)).unwrap();
        context
            .fill_rectangle(Rect::new(0.0, 0.0, 4.0, 4.0), Color::WHITE)
            .unwrap();
        assert_eq!(context.command_count(), 3);
        assert_eq!(
            context.commands()[1],
            DrawCommand::DrawBitmap {
                bitmap: IdentityKey::of(&source),
                at: Point::new(1.0, 2.0),
            }
        );

        assert!(context.end_draw());
        assert!(!context.end_draw());
        assert!(context.clear(Color::WHITE).is_err());
        assert_eq!(context.command_count(), 3);
    }

    #[test]
    fn test_context_requires_target_bitmap() {
        let device = device();
        let plain = device.create_bitmap(&BitmapDescriptor::new(8, 8)).unwrap();
        assert!(device.create_device_context(&plain).is_err());

        let other = NativeDevice::new(&DeviceDescriptor::new()).unwrap();
        assert!(other.create_device_context(&target(&device)).is_err());
    }

    #[test]
    fn test_draw_bitmap_rejections() {
        let device = device();
        let target = target(&device);
        let context = device.create_device_context(&target).unwrap();

        let foreign = NativeDevice::new(&DeviceDescriptor::new())
            .unwrap()
            .create_bitmap(&BitmapDescriptor::new(8, 8))
            .unwrap();
        let hidden = device
            .create_bitmap(&BitmapDescriptor::new(8, 8).with_options(BitmapOptions::CANNOT_DRAW))
            .unwrap();

        assert!(context.draw_bitmap(&foreign, Point::default()).is_err());
        assert!(context.draw_bitmap(&target, Point::default()).is_err());
        assert!(context.draw_bitmap(&hidden, Point::default()).is_err());
        assert_eq!(context.command_count(), 0);
    }

    #[test]
    fn test_stroke_style_validation() {
        let style = NativeStrokeStyle::new(2.5, DashStyle::Dot).unwrap();
        assert_eq!(style.width(), 2.5);
        assert_eq!(style.dash_style(), DashStyle::Dot);
        assert!(NativeStrokeStyle::new(-1.0, DashStyle::Solid).is_err());
        assert!(NativeStrokeStyle::new(f32::NAN, DashStyle::Solid).is_err());
    }
}
