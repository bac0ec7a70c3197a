//! Geometry, color, format types and descriptors.

use bitflags::bitflags;

/// Dots per inch at which one device-independent pixel equals one pixel.
pub const DEFAULT_DPI: f32 = 96.0;

// ============================================================================
// Geometry
// ============================================================================

/// Integer size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SizeU {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl SizeU {
    /// Create a new pixel size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Size in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Convert a pixel size to DIPs at `dpi`.
    pub fn from_pixels(pixels: SizeU, dpi: f32) -> Self {
        Self {
            width: pixels.width as f32 * DEFAULT_DPI / dpi,
            height: pixels.height as f32 * DEFAULT_DPI / dpi,
        }
    }
}

/// A point in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Linear RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const CORNFLOWER_BLUE: Self = Self::rgba(0.392, 0.584, 0.929, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

// ============================================================================
// Formats and options
// ============================================================================

/// Pixel format of a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum PixelFormat {
    /// 8-bit BGRA channels, unsigned normalized, premultiplied alpha.
    #[default]
    B8G8R8A8Unorm,
    /// 8-bit RGBA channels, unsigned normalized, premultiplied alpha.
    R8G8B8A8Unorm,
    /// 16-bit RGBA channels, float.
    R16G16B16A16Float,
    /// 8-bit alpha only.
    A8Unorm,
}

impl PixelFormat {
    /// Size of one pixel in bytes.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::A8Unorm => 1,
            Self::B8G8R8A8Unorm | Self::R8G8B8A8Unorm => 4,
            Self::R16G16B16A16Float => 8,
        }
    }
}

bitflags! {
    /// How a bitmap may be used.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BitmapOptions: u32 {
        /// Bitmap can be drawn into.
        const TARGET = 1 << 0;
        /// Bitmap contents can be read back by the CPU.
        const CPU_READ = 1 << 1;
        /// Bitmap cannot be used as a drawing source.
        const CANNOT_DRAW = 1 << 2;
    }
}

impl Default for BitmapOptions {
    fn default() -> Self {
        Self::empty()
    }
}

/// Dash pattern of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DashStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
}

// ============================================================================
// Descriptors
// ============================================================================

/// Descriptor for creating a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceDescriptor {
    /// Debug label, also reported as the device name.
    pub label: Option<String>,
    /// Largest bitmap width or height the device accepts.
    pub max_bitmap_size: u32,
}

impl DeviceDescriptor {
    /// Default limit on bitmap dimensions.
    pub const DEFAULT_MAX_BITMAP_SIZE: u32 = 16384;

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the bitmap dimension limit.
    pub fn with_max_bitmap_size(mut self, size: u32) -> Self {
        self.max_bitmap_size = size;
        self
    }
}

impl Default for DeviceDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            max_bitmap_size: Self::DEFAULT_MAX_BITMAP_SIZE,
        }
    }
}

/// Descriptor for creating a bitmap or render target.
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapDescriptor {
    /// Debug label for the bitmap.
    pub label: Option<String>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: PixelFormat,
    /// Usage options.
    pub options: BitmapOptions,
    /// Dots per inch the bitmap is created for.
    pub dpi: f32,
}

impl BitmapDescriptor {
    /// Create a descriptor for a `width` x `height` pixel bitmap at the default DPI.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the pixel format.
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the usage options.
    pub fn with_options(mut self, options: BitmapOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the DPI.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Size in pixels.
    pub fn size(&self) -> SizeU {
        SizeU::new(self.width, self.height)
    }
}

impl Default for BitmapDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            width: 0,
            height: 0,
            format: PixelFormat::default(),
            options: BitmapOptions::empty(),
            dpi: DEFAULT_DPI,
        }
    }
}
