//! Probes for the canvas wrapper types and the generic interop entry point.
//!
//! Probe order matters: a render-target bitmap is also a bitmap, so the
//! render-target probe is registered before the bitmap probe.

use std::sync::Arc;

use redlilium_interop::{
    downcast_wrapper, ContextHints, InteropError, NativeHandle, ProbeId, ResourceRegistry,
    ResourceWrapper, TypeProbe,
};

use crate::bitmap::{CanvasBitmap, CanvasRenderTarget};
use crate::device::CanvasDevice;
use crate::drawing_session::CanvasDrawingSession;
use crate::error::CanvasError;
use crate::native::{NativeBitmap, NativeDevice, NativeDeviceContext, NativeStrokeStyle};
use crate::stroke_style::CanvasStrokeStyle;

/// Probes for every canvas wrapper type, most specific first.
pub fn standard_probes() -> Vec<TypeProbe> {
    vec![
        TypeProbe::device_and_dpi_bound(
            "CanvasRenderTarget",
            |bitmap: &NativeBitmap| bitmap.is_target(),
            |ctx, device, dpi, bitmap| {
                let device = downcast_wrapper::<CanvasDevice>(device)?;
                Ok(Arc::new(CanvasRenderTarget::wrap(
                    ctx.registry,
                    device,
                    bitmap,
                    dpi,
                )?))
            },
        ),
        TypeProbe::device_and_dpi_bound(
            "CanvasBitmap",
            |_: &NativeBitmap| true,
            |ctx, device, dpi, bitmap| {
                let device = downcast_wrapper::<CanvasDevice>(device)?;
                Ok(Arc::new(CanvasBitmap::wrap(ctx.registry, device, bitmap, dpi)?))
            },
        ),
        TypeProbe::plain("CanvasDevice", |_: &NativeDevice| true, |ctx, device| {
            Ok(Arc::new(CanvasDevice::wrap(ctx.registry, device)))
        }),
        TypeProbe::device_bound(
            "CanvasDrawingSession",
            |_: &NativeDeviceContext| true,
            |ctx, device, context| {
                let device = downcast_wrapper::<CanvasDevice>(device)?;
                Ok(Arc::new(CanvasDrawingSession::wrap(
                    ctx.registry,
                    device,
                    context,
                )?))
            },
        ),
        TypeProbe::plain(
            "CanvasStrokeStyle",
            |_: &NativeStrokeStyle| true,
            |ctx, style| Ok(Arc::new(CanvasStrokeStyle::wrap(ctx.registry, style))),
        ),
    ]
}

/// Register [`standard_probes`] with `registry`.
pub fn install_standard_probes(registry: &ResourceRegistry) -> Vec<ProbeId> {
    standard_probes()
        .into_iter()
        .map(|probe| registry.register_probe(probe))
        .collect()
}

/// Return the wrapper for a native resource, creating it if needed.
///
/// `device` and `dpi` are required for device or DPI bound wrapper types,
/// and are checked against the wrapper's bindings when it already exists.
///
/// # Errors
///
/// - [`InteropError::InvalidArgument`] if `resource` is `None` or a required
///   hint is missing.
/// - [`InteropError::UnrecognizedResource`] if the resource is not a canvas
///   native type.
/// - [`InteropError::CrossDevice`] / [`InteropError::CrossDpi`] on a
///   mismatch with an existing wrapper, or when `dpi` differs from the DPI a
///   native bitmap was created with.
pub fn get_or_create_wrapper(
    registry: &Arc<ResourceRegistry>,
    device: Option<&Arc<CanvasDevice>>,
    resource: Option<&NativeHandle>,
    dpi: Option<f32>,
) -> Result<Arc<dyn ResourceWrapper>, CanvasError> {
    let resource = resource.ok_or_else(|| {
        InteropError::InvalidArgument("resource must not be null".to_string())
    })?;
    let hints = ContextHints {
        device: device.map(|device| -> Arc<dyn ResourceWrapper> { device.clone() }),
        dpi,
    };
    Ok(registry.get_or_create(&hints, resource)?)
}
