//! Identity keys for native resources.

use std::fmt;
use std::sync::Arc;

/// Pointer identity of a native resource.
///
/// Two keys are equal exactly when they were taken from the same allocation,
/// regardless of whether the handle was a concrete `Arc<T>` or an erased
/// `Arc<dyn NativeResource>`. A key never keeps the resource alive and is only
/// meaningful while some strong reference to the resource exists.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(usize);

impl IdentityKey {
    /// Key of the resource behind `resource`.
    pub fn of<T: ?Sized>(resource: &Arc<T>) -> Self {
        Self(Arc::as_ptr(resource).cast::<()>() as usize)
    }

    pub(crate) fn from_raw(addr: usize) -> Self {
        Self(addr)
    }

    /// Raw address value, for logging.
    pub fn addr(self) -> usize {
        self.0
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityKey({:#x})", self.0)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    #[test]
    fn test_same_allocation_same_key() {
        let a = Arc::new(7u32);
        let b = Arc::clone(&a);
        assert_eq!(IdentityKey::of(&a), IdentityKey::of(&b));
    }

    #[test]
    fn test_equal_values_different_keys() {
        let a = Arc::new(7u32);
        let b = Arc::new(7u32);
        assert_ne!(IdentityKey::of(&a), IdentityKey::of(&b));
    }

    #[test]
    fn test_erased_handle_keeps_identity() {
        let concrete = Arc::new(String::from("bitmap"));
        let erased: Arc<dyn Any + Send + Sync> = concrete.clone();
        assert_eq!(IdentityKey::of(&concrete), IdentityKey::of(&erased));
    }
}
