//! # RedLilium Canvas
//!
//! 2D drawing wrappers over a native backend, built on the
//! [`redlilium_interop`] identity cache.
//!
//! ## Overview
//!
//! - [`CanvasDevice`] - Root object that creates bitmaps and render targets
//! - [`CanvasBitmap`] / [`CanvasRenderTarget`] - Device and DPI bound bitmaps
//! - [`CanvasDrawingSession`] - Records drawing commands into a render target
//! - [`CanvasStrokeStyle`] - Device independent stroke parameters
//! - [`get_or_create_wrapper`] - Wrap any native canvas resource
//!
//! Every wrapper is registered with a [`ResourceRegistry`], so a native
//! resource handed back from the backend resolves to the wrapper that already
//! exists for it.
//!
//! ## Example
//!
//! ```ignore
//! use redlilium_canvas::{shared_registry, BitmapDescriptor, CanvasDevice, Color, DeviceDescriptor};
//!
//! redlilium_canvas::init();
//! let device = CanvasDevice::new(shared_registry(), &DeviceDescriptor::new())?;
//! let target = device.create_render_target(&BitmapDescriptor::new(512, 512))?;
//! let session = target.create_drawing_session()?;
//! session.clear(Color::CORNFLOWER_BLUE)?;
//! ```

use std::sync::{Arc, OnceLock};

pub mod bitmap;
pub mod device;
pub mod drawing_session;
pub mod error;
pub mod interop;
pub mod native;
pub mod stroke_style;
pub mod types;

pub use bitmap::{CanvasBitmap, CanvasRenderTarget};
pub use device::CanvasDevice;
pub use drawing_session::CanvasDrawingSession;
pub use error::CanvasError;
pub use interop::{get_or_create_wrapper, install_standard_probes, standard_probes};
pub use native::{DrawCommand, NativeBitmap, NativeDevice, NativeDeviceContext, NativeStrokeStyle};
pub use stroke_style::CanvasStrokeStyle;
pub use types::{
    BitmapDescriptor, BitmapOptions, Color, DashStyle, DeviceDescriptor, PixelFormat, Point, Rect,
    Size, SizeU, DEFAULT_DPI,
};

use redlilium_interop::{RegistryConfig, ResourceRegistry};

/// Canvas library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the canvas subsystem.
pub fn init() {
    log::info!("RedLilium Canvas v{} initialized", VERSION);
}

/// Process-wide registry with the standard canvas probes installed.
///
/// Created on first use. Code that wants isolation (tests, embedders with
/// their own lifetime rules) can build its own registry and call
/// [`install_standard_probes`] instead.
pub fn shared_registry() -> &'static Arc<ResourceRegistry> {
    static REGISTRY: OnceLock<Arc<ResourceRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let registry = ResourceRegistry::new(RegistryConfig::new().with_label("canvas"));
        install_standard_probes(&registry);
        registry
    })
}
