//! Native resource abstraction.
//!
//! Anything a wrapper can be built around implements [`NativeResource`].
//! Resources travel through the registry as [`NativeHandle`]s; type probes
//! recover the concrete type through the [`AsAny`] supertrait, which plays
//! the role of an interface query.

use std::any::Any;
use std::sync::Arc;

/// Erased access to the concrete type behind a trait object.
///
/// Implemented automatically for every `Any + Send + Sync` type. Call these
/// through a `&dyn Trait` (e.g. `(*handle).as_any()`): on an `Arc` receiver
/// method resolution picks the impl for the `Arc` itself.
pub trait AsAny: Any + Send + Sync {
    /// Borrow as `dyn Any`.
    fn as_any(&self) -> &(dyn Any + Send + Sync);

    /// Convert a shared handle into an `Arc<dyn Any>` for downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Name of the concrete type.
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A resource owned by the native library.
pub trait NativeResource: AsAny {
    /// Debug label, if the native object carries one.
    fn label(&self) -> Option<&str> {
        None
    }
}

/// Shared, type-erased handle to a native resource.
pub type NativeHandle = Arc<dyn NativeResource>;

/// Downcast an erased handle to a concrete native type.
///
/// Returns `None` (and drops nothing but the clone) when the type differs.
pub fn downcast_native<R: NativeResource>(resource: &NativeHandle) -> Option<Arc<R>> {
    Arc::clone(resource).into_any().downcast::<R>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Surface;
    impl NativeResource for Surface {}

    struct Brush;
    impl NativeResource for Brush {
        fn label(&self) -> Option<&str> {
            Some("brush")
        }
    }

    #[test]
    fn test_downcast_native() {
        let handle: NativeHandle = Arc::new(Surface);
        assert!(downcast_native::<Surface>(&handle).is_some());
        assert!(downcast_native::<Brush>(&handle).is_none());
    }

    #[test]
    fn test_type_name_is_concrete() {
        let handle: NativeHandle = Arc::new(Brush);
        assert!((*handle).type_name().ends_with("Brush"));
        assert_eq!(handle.label(), Some("brush"));
    }

    #[test]
    fn test_as_any_is_interface_query() {
        let handle: NativeHandle = Arc::new(Surface);
        let resource: &dyn NativeResource = &*handle;
        assert!(resource.as_any().is::<Surface>());
        assert!(!resource.as_any().is::<Brush>());
    }
}
