//! Stroke style wrapper.

use std::sync::Arc;

use redlilium_interop::{ContextHints, HasWrapperBase, NativeHandle, ResourceRegistry, WrapperBase};

use crate::error::CanvasError;
use crate::native::NativeStrokeStyle;
use crate::types::DashStyle;

/// Line width and dash pattern used when stroking geometry.
///
/// Stroke styles are device independent.
pub struct CanvasStrokeStyle {
    base: WrapperBase<NativeStrokeStyle>,
}

impl HasWrapperBase for CanvasStrokeStyle {
    type Resource = NativeStrokeStyle;

    fn wrapper_base(&self) -> &WrapperBase<NativeStrokeStyle> {
        &self.base
    }
}

impl CanvasStrokeStyle {
    /// Create a stroke style.
    pub fn new(
        registry: &Arc<ResourceRegistry>,
        width: f32,
        dash: DashStyle,
    ) -> Result<Arc<Self>, CanvasError> {
        let native = NativeStrokeStyle::new(width, dash)?;
        let pending = registry.begin_registration(&native)?;
        let style = Arc::new(Self::wrap(registry, native));
        pending.publish(&style)?;
        Ok(style)
    }

    /// Wrap an existing native stroke style, returning its current wrapper if it has one.
    pub fn from_native(
        registry: &Arc<ResourceRegistry>,
        native: &Arc<NativeStrokeStyle>,
    ) -> Result<Arc<Self>, CanvasError> {
        let handle: NativeHandle = native.clone();
        Ok(registry.get_or_create_as::<Self>(&ContextHints::new(), &handle)?)
    }

    pub(crate) fn wrap(registry: &Arc<ResourceRegistry>, native: Arc<NativeStrokeStyle>) -> Self {
        Self {
            base: WrapperBase::new(registry, native),
        }
    }

    /// Get the line width.
    pub fn width(&self) -> Result<f32, CanvasError> {
        Ok(self.base.access_resource()?.width())
    }

    /// Get the dash pattern.
    pub fn dash_style(&self) -> Result<DashStyle, CanvasError> {
        Ok(self.base.access_resource()?.dash_style())
    }
}

impl std::fmt::Debug for CanvasStrokeStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasStrokeStyle")
            .field("base", &self.base)
            .finish()
    }
}

static_assertions::assert_impl_all!(CanvasStrokeStyle: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use redlilium_interop::{same_instance, InteropError, RegistryConfig, ResourceWrapper};

    use crate::interop::install_standard_probes;

    #[test]
    fn test_stroke_style_accessors() {
        let registry = ResourceRegistry::new(RegistryConfig::default());
        let style = CanvasStrokeStyle::new(&registry, 3.0, DashStyle::DashDot).unwrap();
        assert_eq!(style.width().unwrap(), 3.0);
        assert_eq!(style.dash_style().unwrap(), DashStyle::DashDot);

        style.close();
        assert_eq!(style.width(), Err(CanvasError::Interop(InteropError::Closed)));
    }

    #[test]
    fn test_from_native_round_trip() {
        let registry = ResourceRegistry::new(RegistryConfig::default());
        install_standard_probes(&registry);
        let native = NativeStrokeStyle::new(1.0, DashStyle::Solid).unwrap();

        let first = CanvasStrokeStyle::from_native(&registry, &native).unwrap();
        let second = CanvasStrokeStyle::from_native(&registry, &native).unwrap();
        assert!(same_instance(&*first, &*second));
    }

    #[test]
    fn test_invalid_width() {
        let registry = ResourceRegistry::new(RegistryConfig::default());
        let result = CanvasStrokeStyle::new(&registry, -2.0, DashStyle::Solid);
        assert!(matches!(result, Err(CanvasError::InvalidParameter(_))));
        assert!(registry.is_empty());
    }
}
