//! Shared fixtures for registry integration tests.
//!
//! Provides a tiny fake native layer (devices and bitmaps), wrapper types for
//! it, and probes that count how many wrappers they construct.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use redlilium_interop::{
    ContextHints, HasWrapperBase, NativeHandle, NativeResource, RegistryConfig, ResourceRegistry,
    ResourceWrapper, TypeProbe, WrapperBase,
};

/// Install a test logger once per process.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Fake native resources
// ============================================================================

pub struct TestDevice {
    pub name: &'static str,
}
impl NativeResource for TestDevice {}

pub struct TestBitmap {
    pub target: bool,
}
impl NativeResource for TestBitmap {}

/// A resource no standard probe recognizes.
pub struct TestOpaque;
impl NativeResource for TestOpaque {}

pub fn native_device(name: &'static str) -> NativeHandle {
    Arc::new(TestDevice { name })
}

pub fn native_bitmap() -> NativeHandle {
    Arc::new(TestBitmap { target: false })
}

pub fn native_target() -> NativeHandle {
    Arc::new(TestBitmap { target: true })
}

// ============================================================================
// Wrappers
// ============================================================================

pub struct DeviceWrapper {
    base: WrapperBase<TestDevice>,
}

impl HasWrapperBase for DeviceWrapper {
    type Resource = TestDevice;
    fn wrapper_base(&self) -> &WrapperBase<TestDevice> {
        &self.base
    }
}

impl DeviceWrapper {
    pub fn name(&self) -> Result<&'static str, redlilium_interop::InteropError> {
        Ok(self.base.access_resource()?.name)
    }
}

pub struct BitmapWrapper {
    pub base: WrapperBase<TestBitmap>,
}

impl HasWrapperBase for BitmapWrapper {
    type Resource = TestBitmap;
    fn wrapper_base(&self) -> &WrapperBase<TestBitmap> {
        &self.base
    }
}

pub struct TargetWrapper {
    base: WrapperBase<TestBitmap>,
}

impl HasWrapperBase for TargetWrapper {
    type Resource = TestBitmap;
    fn wrapper_base(&self) -> &WrapperBase<TestBitmap> {
        &self.base
    }
}

// ============================================================================
// Probes
// ============================================================================

pub fn device_probe(counter: Arc<AtomicUsize>) -> TypeProbe {
    TypeProbe::plain("test-device", |_: &TestDevice| true, move |ctx, device| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(DeviceWrapper {
            base: WrapperBase::new(ctx.registry, device),
        }))
    })
}

pub fn bitmap_probe(counter: Arc<AtomicUsize>, delay: Duration) -> TypeProbe {
    TypeProbe::device_and_dpi_bound(
        "test-bitmap",
        |_: &TestBitmap| true,
        move |ctx, device, dpi, bitmap| {
            counter.fetch_add(1, Ordering::SeqCst);
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            Ok(Arc::new(BitmapWrapper {
                base: WrapperBase::new(ctx.registry, bitmap)
                    .with_device(device)
                    .with_dpi(dpi),
            }))
        },
    )
}

pub fn target_probe(counter: Arc<AtomicUsize>) -> TypeProbe {
    TypeProbe::device_and_dpi_bound(
        "test-target",
        |bitmap: &TestBitmap| bitmap.target,
        move |ctx, device, dpi, bitmap| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(TargetWrapper {
                base: WrapperBase::new(ctx.registry, bitmap)
                    .with_device(device)
                    .with_dpi(dpi),
            }))
        },
    )
}

// ============================================================================
// Fixture
// ============================================================================

/// A registry with target, bitmap, and device probes installed (in that order).
pub struct Fixture {
    pub registry: Arc<ResourceRegistry>,
    pub devices: Arc<AtomicUsize>,
    pub bitmaps: Arc<AtomicUsize>,
    pub targets: Arc<AtomicUsize>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::build(RegistryConfig::default(), Duration::ZERO)
    }

    pub fn with_bitmap_delay(delay: Duration) -> Self {
        Self::build(RegistryConfig::default(), delay)
    }

    pub fn build(config: RegistryConfig, bitmap_delay: Duration) -> Self {
        init_logging();
        let registry = ResourceRegistry::new(config);
        let devices = Arc::new(AtomicUsize::new(0));
        let bitmaps = Arc::new(AtomicUsize::new(0));
        let targets = Arc::new(AtomicUsize::new(0));
        registry.register_probe(target_probe(Arc::clone(&targets)));
        registry.register_probe(bitmap_probe(Arc::clone(&bitmaps), bitmap_delay));
        registry.register_probe(device_probe(Arc::clone(&devices)));
        Self {
            registry,
            devices,
            bitmaps,
            targets,
        }
    }

    /// Wrap a fresh native device.
    pub fn device(&self, name: &'static str) -> Arc<dyn ResourceWrapper> {
        self.registry
            .get_or_create(&ContextHints::new(), &native_device(name))
            .expect("device probe is installed")
    }

    pub fn bitmap_constructions(&self) -> usize {
        self.bitmaps.load(Ordering::SeqCst)
    }
}

/// Hints binding a bitmap to `device` at 96 DPI.
pub fn bitmap_hints(device: &Arc<dyn ResourceWrapper>) -> ContextHints {
    ContextHints::new()
        .with_device(Arc::clone(device))
        .with_dpi(96.0)
}
