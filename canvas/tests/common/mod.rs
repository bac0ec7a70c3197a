//! Shared helpers for canvas integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use redlilium_canvas::{install_standard_probes, CanvasDevice, DeviceDescriptor};
use redlilium_interop::{RegistryConfig, ResourceRegistry};

/// Install a test logger once per process.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// An isolated registry with the standard probes and one device on it.
pub struct TestCanvas {
    pub registry: Arc<ResourceRegistry>,
    pub device: Arc<CanvasDevice>,
}

impl TestCanvas {
    pub fn new() -> Self {
        init_logging();
        let registry = ResourceRegistry::new(RegistryConfig::new().with_label("test"));
        install_standard_probes(&registry);
        let device = CanvasDevice::new(&registry, &DeviceDescriptor::new().with_label("primary"))
            .expect("device creation succeeds");
        Self { registry, device }
    }

    /// Another device on the same registry.
    pub fn second_device(&self) -> Arc<CanvasDevice> {
        CanvasDevice::new(
            &self.registry,
            &DeviceDescriptor::new().with_label("secondary"),
        )
        .expect("device creation succeeds")
    }
}
