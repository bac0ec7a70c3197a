//! # RedLilium Interop
//!
//! Identity-preserving cache between native resources and the wrapper objects
//! that project them into the engine's object model.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`ResourceRegistry`] - Maps each native resource to at most one live wrapper
//! - [`WrapperBase`] / [`ResourceWrapper`] - Base behavior every wrapper composes
//! - [`ClosableHandle`] - Strong resource reference with explicit, idempotent close
//! - [`TypeProbe`] - Pluggable recognizers that build the right wrapper type
//! - [`ContextHints`] - Optional device/DPI context validated on cache hits
//!
//! ## Example
//!
//! ```ignore
//! use redlilium_interop::{ContextHints, RegistryConfig, ResourceRegistry, TypeProbe};
//!
//! let registry = ResourceRegistry::new(RegistryConfig::default());
//! registry.register_probe(TypeProbe::plain("layer", |_: &NativeLayer| true, LayerWrapper::wrap));
//!
//! let wrapper = registry.get_or_create(&ContextHints::new(), &native_layer)?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod handle;
pub mod identity;
pub mod native;
pub mod probe;
pub mod registry;
pub mod wrapper;

pub use config::RegistryConfig;
pub use context::{validate_dpi, validate_same_device, ContextHints};
pub use error::InteropError;
pub use handle::ClosableHandle;
pub use identity::IdentityKey;
pub use native::{downcast_native, AsAny, NativeHandle, NativeResource};
pub use probe::{FactoryPolicy, ProbeId, TypeProbe, WrapContext};
pub use registry::{PendingRegistration, RegistryStats, ResourceRegistry};
pub use wrapper::{
    downcast_wrapper, same_instance, HasWrapperBase, ResourceWrapper, WrapperBase, WrapperId,
};

/// Interop library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
