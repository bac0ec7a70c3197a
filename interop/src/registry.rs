//! Native resource to wrapper identity cache.
//!
//! The [`ResourceRegistry`] guarantees that one native resource is always
//! projected through one wrapper instance, no matter which code path presents
//! it: first-time creation, interop hand-off, or lookup from inside another
//! wrapper.
//!
//! # Structure
//!
//! - An identity map from [`IdentityKey`] to a *weak* wrapper reference. The
//!   registry never keeps wrappers (or resources) alive.
//! - An in-flight set: keys a `get_or_create` call is currently constructing
//!   (`creating`) and keys reserved by explicit constructions that have not
//!   published yet (`wrapping`, a multiset). Callers that miss on a key in
//!   flight wait on a condition variable instead of building a duplicate.
//! - The ordered list of [`TypeProbe`]s used to recognize unseen resources.
//!
//! The map and the in-flight set share one mutex. Wrapper construction runs
//! with that mutex released, since factories may call back into the registry
//! or the native library.
//!
//! # Thread Safety
//!
//! `ResourceRegistry` is `Send + Sync`. For one key, concurrent
//! `get_or_create` calls observe one winning construction; distinct keys are
//! independent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use std::time::Instant;

use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};

use crate::config::RegistryConfig;
use crate::context::ContextHints;
use crate::error::InteropError;
use crate::identity::IdentityKey;
use crate::native::{NativeHandle, NativeResource};
use crate::probe::{ProbeId, TypeProbe, WrapContext};
use crate::wrapper::{downcast_wrapper, ResourceWrapper, WrapperId};

/// Weak reference to the wrapper registered for a key.
struct RegistryEntry {
    wrapper_id: WrapperId,
    wrapper: Weak<dyn ResourceWrapper>,
}

/// Result of looking a key up in the identity map.
enum Lookup {
    Hit(Arc<dyn ResourceWrapper>),
    Miss,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<IdentityKey, RegistryEntry>,
    creating: HashMap<IdentityKey, ThreadId>,
    wrapping: HashMap<IdentityKey, usize>,
}

impl RegistryState {
    /// Look up `key`, purging the entry if its wrapper expired or was closed.
    ///
    /// A closed wrapper that was upgraded here is pushed to `graveyard` so
    /// the caller releases it after unlocking: dropping the last reference
    /// runs the wrapper's `Drop`, which calls back into the registry.
    fn lookup(
        &mut self,
        key: IdentityKey,
        graveyard: &mut Vec<Arc<dyn ResourceWrapper>>,
    ) -> Lookup {
        let Some(entry) = self.entries.get(&key) else {
            return Lookup::Miss;
        };
        match entry.wrapper.upgrade() {
            Some(wrapper) if !wrapper.is_closed() => Lookup::Hit(wrapper),
            upgraded => {
                log::warn!(
                    "ResourceRegistry: purging stale entry for {key} (wrapper {:?})",
                    entry.wrapper_id
                );
                self.entries.remove(&key);
                graveyard.extend(upgraded);
                Lookup::Miss
            }
        }
    }

    fn wrapping_count(&self, key: IdentityKey) -> usize {
        self.wrapping.get(&key).copied().unwrap_or(0)
    }

    fn release_wrapping(&mut self, key: IdentityKey) {
        if let Some(count) = self.wrapping.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.wrapping.remove(&key);
            }
        }
    }
}

/// Snapshot of registry bookkeeping, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
    /// Entries whose wrapper is still alive.
    pub live: usize,
    /// Entries whose wrapper has been dropped but not yet purged.
    pub stale: usize,
    /// Keys being constructed by `get_or_create`.
    pub creating: usize,
    /// Keys reserved by explicit constructions.
    pub wrapping: usize,
    /// Registered type probes.
    pub probes: usize,
}

/// Process-wide cache mapping native resources to their wrappers.
///
/// Create one with [`ResourceRegistry::new`]; it is an ordinary service
/// object, so tests can build as many isolated registries as they like.
///
/// # Example
///
/// ```ignore
/// let registry = ResourceRegistry::new(RegistryConfig::default());
/// registry.register_probe(TypeProbe::plain("device", |_: &NativeDevice| true, CanvasDevice::wrap));
///
/// let a = registry.get_or_create(&ContextHints::new(), &native)?;
/// let b = registry.get_or_create(&ContextHints::new(), &native)?;
/// assert!(same_instance(&*a, &*b));
/// ```
pub struct ResourceRegistry {
    config: RegistryConfig,
    state: Mutex<RegistryState>,
    in_flight_done: Condvar,
    probes: RwLock<Vec<(ProbeId, Arc<TypeProbe>)>>,
    next_probe_id: AtomicU64,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new(config: RegistryConfig) -> Arc<Self> {
        log::debug!("Creating ResourceRegistry {:?}", config.label);
        Arc::new(Self {
            config,
            state: Mutex::new(RegistryState::default()),
            in_flight_done: Condvar::new(),
            probes: RwLock::new(Vec::new()),
            next_probe_id: AtomicU64::new(1),
        })
    }

    /// Registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Probes
    // ------------------------------------------------------------------

    /// Append a probe. Probes are tried in registration order.
    pub fn register_probe(&self, probe: TypeProbe) -> ProbeId {
        let id = ProbeId(self.next_probe_id.fetch_add(1, Ordering::Relaxed));
        log::debug!(
            "ResourceRegistry: registered probe `{}` ({:?})",
            probe.name(),
            probe.policy()
        );
        self.probes.write().push((id, Arc::new(probe)));
        id
    }

    /// Remove a previously registered probe. Returns whether it was present.
    pub fn unregister_probe(&self, id: ProbeId) -> bool {
        let removed = {
            let mut probes = self.probes.write();
            probes
                .iter()
                .position(|(probe_id, _)| *probe_id == id)
                .map(|index| probes.remove(index))
        };
        match removed {
            Some((_, probe)) => {
                log::debug!("ResourceRegistry: unregistered probe `{}`", probe.name());
                true
            }
            None => false,
        }
    }

    /// Number of registered probes.
    pub fn probe_count(&self) -> usize {
        self.probes.read().len()
    }

    fn probe_snapshot(&self) -> Vec<Arc<TypeProbe>> {
        self.probes
            .read()
            .iter()
            .map(|(_, probe)| Arc::clone(probe))
            .collect()
    }

    // ------------------------------------------------------------------
    // Lookup and creation
    // ------------------------------------------------------------------

    /// Return the wrapper for `resource`, constructing it with the registered
    /// probes if none exists.
    ///
    /// # Errors
    ///
    /// - [`InteropError::InvalidArgument`] for malformed hints or when the
    ///   matching probe needs a hint that is missing.
    /// - [`InteropError::CrossDevice`] / [`InteropError::CrossDpi`] when the
    ///   cached wrapper is bound to another device or DPI.
    /// - [`InteropError::UnrecognizedResource`] when no probe matches.
    /// - [`InteropError::RegistrationTimeout`] when another thread's
    ///   construction of the same resource did not finish in time.
    /// - [`InteropError::ReentrantCreation`] when called from inside the
    ///   factory building this very resource.
    pub fn get_or_create(
        self: &Arc<Self>,
        hints: &ContextHints,
        resource: &NativeHandle,
    ) -> Result<Arc<dyn ResourceWrapper>, InteropError> {
        let probes = self.probe_snapshot();
        self.get_or_create_with(hints, resource, &probes)
    }

    /// Like [`get_or_create`](Self::get_or_create), but constructs misses
    /// with the caller's probe list instead of the registered one.
    pub fn get_or_create_with(
        self: &Arc<Self>,
        hints: &ContextHints,
        resource: &NativeHandle,
        probes: &[Arc<TypeProbe>],
    ) -> Result<Arc<dyn ResourceWrapper>, InteropError> {
        hints.validate()?;
        let key = IdentityKey::of(resource);
        let mut graveyard = Vec::new();

        let mut state = self.state.lock();
        let deadline = self.config.wait_timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if let Lookup::Hit(existing) = state.lookup(key, &mut graveyard) {
                drop(state);
                log::trace!("ResourceRegistry: cache hit for {key}");
                hints.check_compatible(&*existing)?;
                return Ok(existing);
            }

            match state.creating.get(&key) {
                Some(owner) if *owner == thread::current().id() => {
                    return Err(InteropError::ReentrantCreation(key));
                }
                Some(_) => {}
                None if state.wrapping_count(key) == 0 => break,
                None => {}
            }

            self.wait_in_flight(&mut state, key, deadline)?;
        }

        state.creating.insert(key, thread::current().id());
        drop(state);

        let mut in_flight = InFlight {
            registry: self,
            key,
            finished: false,
        };
        let wrapper = self.construct(key, hints, resource, probes)?;
        in_flight.publish(&wrapper);
        Ok(wrapper)
    }

    /// Typed [`get_or_create`](Self::get_or_create).
    ///
    /// # Errors
    ///
    /// In addition to the errors of `get_or_create`, returns
    /// [`InteropError::WrapperTypeMismatch`] if the resource is wrapped by a
    /// type other than `W`.
    pub fn get_or_create_as<W: ResourceWrapper>(
        self: &Arc<Self>,
        hints: &ContextHints,
        resource: &NativeHandle,
    ) -> Result<Arc<W>, InteropError> {
        downcast_wrapper(self.get_or_create(hints, resource)?)
    }

    /// Return the wrapper registered for `resource` without creating one.
    ///
    /// Never waits for in-flight constructions.
    pub fn try_get<T: ?Sized>(&self, resource: &Arc<T>) -> Option<Arc<dyn ResourceWrapper>> {
        let key = IdentityKey::of(resource);
        let mut graveyard = Vec::new();
        let mut state = self.state.lock();
        match state.lookup(key, &mut graveyard) {
            Lookup::Hit(wrapper) => Some(wrapper),
            Lookup::Miss => None,
        }
    }

    fn wait_in_flight(
        &self,
        state: &mut MutexGuard<'_, RegistryState>,
        key: IdentityKey,
        deadline: Option<Instant>,
    ) -> Result<(), InteropError> {
        log::trace!("ResourceRegistry: waiting for in-flight construction of {key}");
        match deadline {
            None => {
                self.in_flight_done.wait(state);
                Ok(())
            }
            Some(deadline) => {
                let timed_out = self.in_flight_done.wait_until(state, deadline).timed_out();
                let still_pending = state.creating.contains_key(&key) || state.wrapping_count(key) > 0;
                if timed_out && still_pending {
                    log::warn!("ResourceRegistry: timed out waiting for {key}");
                    Err(InteropError::RegistrationTimeout(key))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn construct(
        self: &Arc<Self>,
        key: IdentityKey,
        hints: &ContextHints,
        resource: &NativeHandle,
        probes: &[Arc<TypeProbe>],
    ) -> Result<Arc<dyn ResourceWrapper>, InteropError> {
        let ctx = WrapContext {
            registry: self,
            hints,
        };
        let native: &dyn NativeResource = &**resource;
        let Some(probe) = probes.iter().find(|probe| probe.accepts(native)) else {
            return Err(InteropError::UnrecognizedResource {
                type_name: native.type_name(),
            });
        };

        log::trace!(
            "ResourceRegistry: probe `{}` wrapping {key} ({})",
            probe.name(),
            native.type_name()
        );
        let wrapper = probe.create(&ctx, Arc::clone(resource))?;
        if wrapper.identity() != key {
            return Err(InteropError::invalid(format!(
                "probe `{}` produced a wrapper for {} instead of {key}",
                probe.name(),
                wrapper.identity()
            )));
        }
        Ok(wrapper)
    }

    // ------------------------------------------------------------------
    // Explicit registration
    // ------------------------------------------------------------------

    /// Reserve `resource` for a wrapper the caller is about to construct.
    ///
    /// While the reservation is held, `get_or_create` calls for the same
    /// resource wait for it to be published instead of building their own
    /// wrapper. Waits if `get_or_create` is itself constructing the resource.
    ///
    /// # Errors
    ///
    /// Returns [`InteropError::RegistrationTimeout`] or
    /// [`InteropError::ReentrantCreation`] under the same conditions as
    /// `get_or_create`.
    pub fn begin_registration<T: ?Sized>(
        &self,
        resource: &Arc<T>,
    ) -> Result<PendingRegistration<'_>, InteropError> {
        self.reserve(IdentityKey::of(resource))
    }

    /// Register a wrapper constructed outside the probe path.
    ///
    /// # Errors
    ///
    /// Returns [`InteropError::AlreadyWrapped`] if a different live wrapper
    /// is registered for the same resource.
    pub fn register<W: ResourceWrapper>(&self, wrapper: &Arc<W>) -> Result<(), InteropError> {
        self.reserve(wrapper.identity())?.publish(wrapper)
    }

    fn reserve(&self, key: IdentityKey) -> Result<PendingRegistration<'_>, InteropError> {
        let mut state = self.state.lock();
        let deadline = self.config.wait_timeout.map(|timeout| Instant::now() + timeout);
        loop {
            match state.creating.get(&key) {
                None => break,
                Some(owner) if *owner == thread::current().id() => {
                    return Err(InteropError::ReentrantCreation(key));
                }
                Some(_) => self.wait_in_flight(&mut state, key, deadline)?,
            }
        }
        *state.wrapping.entry(key).or_insert(0) += 1;
        Ok(PendingRegistration {
            registry: self,
            key,
            finished: false,
        })
    }

    /// Remove the entry for `key` if it was registered by `wrapper_id`.
    ///
    /// Called by wrappers when they close. The id comparison keeps a late
    /// call from a superseded wrapper from erasing a newer registration for
    /// the same key. Returns whether an entry was removed.
    pub fn remove(&self, key: IdentityKey, wrapper_id: WrapperId) -> bool {
        let mut state = self.state.lock();
        let matches = state
            .entries
            .get(&key)
            .is_some_and(|entry| entry.wrapper_id == wrapper_id);
        if matches {
            state.entries.remove(&key);
            log::debug!("ResourceRegistry: removed {key} ({wrapper_id:?})");
        }
        matches
    }

    fn insert_entry(
        state: &mut RegistryState,
        key: IdentityKey,
        wrapper: &Arc<dyn ResourceWrapper>,
    ) {
        state.entries.insert(
            key,
            RegistryEntry {
                wrapper_id: wrapper.wrapper_id(),
                wrapper: Arc::downgrade(wrapper),
            },
        );
        log::debug!(
            "ResourceRegistry: registered {key} ({:?})",
            wrapper.wrapper_id()
        );
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Number of entries whose wrapper is alive.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .entries
            .values()
            .filter(|entry| entry.wrapper.strong_count() > 0)
            .count()
    }

    /// Whether no live wrapper is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bookkeeping snapshot.
    pub fn stats(&self) -> RegistryStats {
        let probes = self.probe_count();
        let state = self.state.lock();
        let live = state
            .entries
            .values()
            .filter(|entry| entry.wrapper.strong_count() > 0)
            .count();
        RegistryStats {
            live,
            stale: state.entries.len() - live,
            creating: state.creating.len(),
            wrapping: state.wrapping.len(),
            probes,
        }
    }

    /// Drop entries whose wrapper no longer exists. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut state = self.state.lock();
        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| entry.wrapper.strong_count() > 0);
        before - state.entries.len()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("label", &self.config.label)
            .field("stats", &self.stats())
            .finish()
    }
}

static_assertions::assert_impl_all!(ResourceRegistry: Send, Sync);

/// In-flight marker of a `get_or_create` construction.
///
/// Clears the `creating` mark and wakes waiters on every exit path,
/// including an error or a panicking factory.
struct InFlight<'a> {
    registry: &'a ResourceRegistry,
    key: IdentityKey,
    finished: bool,
}

impl InFlight<'_> {
    fn publish(&mut self, wrapper: &Arc<dyn ResourceWrapper>) {
        let mut state = self.registry.state.lock();
        ResourceRegistry::insert_entry(&mut state, self.key, wrapper);
        state.creating.remove(&self.key);
        self.finished = true;
        drop(state);
        self.registry.in_flight_done.notify_all();
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.registry.state.lock().creating.remove(&self.key);
        self.registry.in_flight_done.notify_all();
        log::trace!("ResourceRegistry: construction of {} abandoned", self.key);
    }
}

/// Reservation returned by [`ResourceRegistry::begin_registration`].
///
/// Publish the finished wrapper with [`publish`](Self::publish); dropping the
/// reservation unpublished releases it.
#[must_use = "a reservation blocks other wrappers for the resource until published or dropped"]
pub struct PendingRegistration<'a> {
    registry: &'a ResourceRegistry,
    key: IdentityKey,
    finished: bool,
}

impl PendingRegistration<'_> {
    /// Identity of the reserved resource.
    pub fn key(&self) -> IdentityKey {
        self.key
    }

    /// Register `wrapper` for the reserved resource.
    ///
    /// # Errors
    ///
    /// - [`InteropError::InvalidArgument`] if `wrapper` wraps another resource.
    /// - [`InteropError::AlreadyWrapped`] if a different live wrapper is
    ///   already registered for the resource.
    pub fn publish<W: ResourceWrapper>(mut self, wrapper: &Arc<W>) -> Result<(), InteropError> {
        let wrapper: Arc<dyn ResourceWrapper> = wrapper.clone();
        if wrapper.identity() != self.key {
            return Err(InteropError::invalid(format!(
                "wrapper for {} published for reservation {}",
                wrapper.identity(),
                self.key
            )));
        }

        let mut graveyard = Vec::new();
        let mut state = self.registry.state.lock();
        let result = match state.lookup(self.key, &mut graveyard) {
            Lookup::Hit(existing) if existing.wrapper_id() != wrapper.wrapper_id() => {
                graveyard.push(existing);
                Err(InteropError::AlreadyWrapped(self.key))
            }
            Lookup::Hit(existing) => {
                graveyard.push(existing);
                Ok(())
            }
            Lookup::Miss => {
                ResourceRegistry::insert_entry(&mut state, self.key, &wrapper);
                Ok(())
            }
        };
        state.release_wrapping(self.key);
        self.finished = true;
        drop(state);
        self.registry.in_flight_done.notify_all();
        result
    }
}

impl Drop for PendingRegistration<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.registry.state.lock().release_wrapping(self.key);
        self.registry.in_flight_done.notify_all();
    }
}

impl std::fmt::Debug for PendingRegistration<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRegistration")
            .field("key", &self.key)
            .finish()
    }
}
