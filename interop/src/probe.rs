//! Type probes: pluggable recognizers for native resources.
//!
//! A [`TypeProbe`] pairs a cheap tester ("is this resource of native type `R`
//! and does it pass this predicate?") with a factory that builds the wrapper
//! once the tester accepted. The registry runs probes in registration order
//! and uses the first one that accepts, so when a resource can satisfy more
//! than one probe (a render-target bitmap is also a bitmap) the more specific
//! probe has to be registered first.

use std::sync::Arc;

use crate::context::ContextHints;
use crate::error::InteropError;
use crate::native::{downcast_native, NativeHandle, NativeResource};
use crate::registry::ResourceRegistry;
use crate::wrapper::ResourceWrapper;

/// What a probe's factory needs from the caller's hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactoryPolicy {
    /// Built from the resource alone.
    Plain,
    /// Requires a device hint.
    DeviceBound,
    /// Requires a device hint and a positive DPI hint.
    DeviceAndDpiBound,
}

/// Everything a factory gets besides the resource.
#[derive(Debug, Clone, Copy)]
pub struct WrapContext<'a> {
    /// Registry the new wrapper belongs to.
    pub registry: &'a Arc<ResourceRegistry>,
    /// Hints supplied by the caller.
    pub hints: &'a ContextHints,
}

/// Handle to a probe registered with a [`ResourceRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbeId(pub(crate) u64);

type Tester = dyn Fn(&dyn NativeResource) -> bool + Send + Sync;
type Factory = dyn Fn(&WrapContext<'_>, NativeHandle) -> Result<Arc<dyn ResourceWrapper>, InteropError>
    + Send
    + Sync;

/// A tester + factory pair recognizing one kind of native resource.
pub struct TypeProbe {
    name: &'static str,
    policy: FactoryPolicy,
    tester: Box<Tester>,
    factory: Box<Factory>,
}

impl TypeProbe {
    /// Probe whose wrapper is built from the resource alone.
    pub fn plain<R, W, T, F>(name: &'static str, tester: T, maker: F) -> Self
    where
        R: NativeResource,
        W: ResourceWrapper,
        T: Fn(&R) -> bool + Send + Sync + 'static,
        F: Fn(&WrapContext<'_>, Arc<R>) -> Result<Arc<W>, InteropError> + Send + Sync + 'static,
    {
        Self::typed(name, FactoryPolicy::Plain, tester, maker)
    }

    /// Probe whose wrapper needs the device hint.
    pub fn device_bound<R, W, T, F>(name: &'static str, tester: T, maker: F) -> Self
    where
        R: NativeResource,
        W: ResourceWrapper,
        T: Fn(&R) -> bool + Send + Sync + 'static,
        F: Fn(&WrapContext<'_>, Arc<dyn ResourceWrapper>, Arc<R>) -> Result<Arc<W>, InteropError>
            + Send
            + Sync
            + 'static,
    {
        Self::typed(
            name,
            FactoryPolicy::DeviceBound,
            tester,
            move |ctx: &WrapContext<'_>, resource: Arc<R>| {
                let device = Arc::clone(ctx.hints.require_device()?);
                maker(ctx, device, resource)
            },
        )
    }

    /// Probe whose wrapper needs both the device and DPI hints.
    pub fn device_and_dpi_bound<R, W, T, F>(name: &'static str, tester: T, maker: F) -> Self
    where
        R: NativeResource,
        W: ResourceWrapper,
        T: Fn(&R) -> bool + Send + Sync + 'static,
        F: Fn(&WrapContext<'_>, Arc<dyn ResourceWrapper>, f32, Arc<R>) -> Result<Arc<W>, InteropError>
            + Send
            + Sync
            + 'static,
    {
        Self::typed(
            name,
            FactoryPolicy::DeviceAndDpiBound,
            tester,
            move |ctx: &WrapContext<'_>, resource: Arc<R>| {
                let device = Arc::clone(ctx.hints.require_device()?);
                let dpi = ctx.hints.require_dpi()?;
                maker(ctx, device, dpi, resource)
            },
        )
    }

    fn typed<R, W, T, F>(name: &'static str, policy: FactoryPolicy, tester: T, make: F) -> Self
    where
        R: NativeResource,
        W: ResourceWrapper,
        T: Fn(&R) -> bool + Send + Sync + 'static,
        F: Fn(&WrapContext<'_>, Arc<R>) -> Result<Arc<W>, InteropError> + Send + Sync + 'static,
    {
        let tester = move |resource: &dyn NativeResource| {
            resource.as_any().downcast_ref::<R>().is_some_and(&tester)
        };
        let factory = move |ctx: &WrapContext<'_>,
                            resource: NativeHandle|
              -> Result<Arc<dyn ResourceWrapper>, InteropError> {
            let resource = downcast_native::<R>(&resource).ok_or_else(|| {
                InteropError::invalid(format!(
                    "probe `{name}` cannot wrap `{}`",
                    (*resource).type_name()
                ))
            })?;
            let wrapper: Arc<dyn ResourceWrapper> = make(ctx, resource)?;
            Ok(wrapper)
        };

        Self {
            name,
            policy,
            tester: Box::new(tester),
            factory: Box::new(factory),
        }
    }

    /// Probe name, for logging.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Factory policy of this probe.
    pub fn policy(&self) -> FactoryPolicy {
        self.policy
    }

    /// Whether the probe recognizes `resource`.
    pub fn accepts(&self, resource: &dyn NativeResource) -> bool {
        (self.tester)(resource)
    }

    /// Build a wrapper for a resource this probe accepted.
    ///
    /// # Errors
    ///
    /// Returns [`InteropError::InvalidArgument`] when the hints lack what the
    /// policy requires, or whatever the factory itself fails with.
    pub fn create(
        &self,
        ctx: &WrapContext<'_>,
        resource: NativeHandle,
    ) -> Result<Arc<dyn ResourceWrapper>, InteropError> {
        (self.factory)(ctx, resource)
    }
}

impl std::fmt::Debug for TypeProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeProbe")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(TypeProbe: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::wrapper::{HasWrapperBase, WrapperBase};

    struct Layer {
        opaque: bool,
    }
    impl NativeResource for Layer {}

    struct Gradient;
    impl NativeResource for Gradient {}

    struct LayerWrapper {
        base: WrapperBase<Layer>,
    }

    impl HasWrapperBase for LayerWrapper {
        type Resource = Layer;
        fn wrapper_base(&self) -> &WrapperBase<Layer> {
            &self.base
        }
    }

    fn opaque_layer_probe() -> TypeProbe {
        TypeProbe::plain(
            "opaque-layer",
            |layer: &Layer| layer.opaque,
            |ctx, layer| {
                Ok(Arc::new(LayerWrapper {
                    base: WrapperBase::new(ctx.registry, layer),
                }))
            },
        )
    }

    #[test]
    fn test_tester_checks_type_and_predicate() {
        let probe = opaque_layer_probe();
        assert!(probe.accepts(&Layer { opaque: true }));
        assert!(!probe.accepts(&Layer { opaque: false }));
        assert!(!probe.accepts(&Gradient));
        assert_eq!(probe.policy(), FactoryPolicy::Plain);
    }

    #[test]
    fn test_plain_factory_builds_wrapper() {
        let registry = ResourceRegistry::new(RegistryConfig::default());
        let hints = ContextHints::new();
        let ctx = WrapContext {
            registry: &registry,
            hints: &hints,
        };
        let layer: NativeHandle = Arc::new(Layer { opaque: true });
        let wrapper = opaque_layer_probe().create(&ctx, Arc::clone(&layer)).unwrap();
        assert_eq!(wrapper.identity(), crate::IdentityKey::of(&layer));
    }

    #[test]
    fn test_device_bound_requires_device() {
        let probe = TypeProbe::device_bound(
            "layer",
            |_: &Layer| true,
            |ctx, device, layer| {
                Ok(Arc::new(LayerWrapper {
                    base: WrapperBase::new(ctx.registry, layer).with_device(device),
                }))
            },
        );
        assert_eq!(probe.policy(), FactoryPolicy::DeviceBound);

        let registry = ResourceRegistry::new(RegistryConfig::default());
        let hints = ContextHints::new();
        let ctx = WrapContext {
            registry: &registry,
            hints: &hints,
        };
        let result = probe.create(&ctx, Arc::new(Layer { opaque: false }));
        assert!(matches!(result, Err(InteropError::InvalidArgument(_))));
    }

    #[test]
    fn test_factory_rejects_foreign_resource() {
        let registry = ResourceRegistry::new(RegistryConfig::default());
        let hints = ContextHints::new();
        let ctx = WrapContext {
            registry: &registry,
            hints: &hints,
        };
        let result = opaque_layer_probe().create(&ctx, Arc::new(Gradient));
        assert!(matches!(result, Err(InteropError::InvalidArgument(_))));
    }
}
