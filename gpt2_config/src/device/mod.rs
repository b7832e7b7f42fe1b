//! Accelerator discovery and the `CUDA_VISIBLE_DEVICES` export.

mod nvidia_smi;
mod vulkan;

pub use nvidia_smi::NvidiaSmiProbe;
pub use vulkan::VulkanProbe;

/// Variable read by CUDA runtimes to pick devices.
pub const VISIBLE_DEVICES_ENV: &str = "CUDA_VISIBLE_DEVICES";

/// Source of the accelerator count. Probes are best effort: a failed probe reports 0.
pub trait DeviceProbe {
    fn name(&self) -> &str;
    fn device_count(&self) -> usize;
}

/// Reports a fixed count. `FixedProbe(0)` forces a CPU-only run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedProbe(pub usize);

impl DeviceProbe for FixedProbe {
    fn name(&self) -> &str {
        "fixed"
    }

    fn device_count(&self) -> usize {
        self.0
    }
}

/// Tries each probe in order; the first non-zero answer wins.
pub struct AutoProbe {
    probes: Vec<Box<dyn DeviceProbe>>,
}

impl AutoProbe {
    /// `nvidia-smi` first, Vulkan as a fallback.
    pub fn new() -> Self {
        Self::with_probes(vec![Box::new(NvidiaSmiProbe), Box::new(VulkanProbe)])
    }

    pub fn with_probes(probes: Vec<Box<dyn DeviceProbe>>) -> Self {
        Self { probes }
    }
}

impl Default for AutoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceProbe for AutoProbe {
    fn name(&self) -> &str {
        "auto"
    }

    fn device_count(&self) -> usize {
        for probe in &self.probes {
            let count = probe.device_count();
            if count > 0 {
                tracing::debug!("{} probe found {} device(s)", probe.name(), count);
                return count;
            }
        }
        0
    }
}

/// `"0,1,...,count-1"`; empty when `count` is 0.
pub fn visible_devices(count: usize) -> String {
    (0..count)
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Writes `value` to [`VISIBLE_DEVICES_ENV`].
///
/// # Safety
///
/// Mutates the process environment. Call it before any other thread is spawned, as
/// [`std::env::set_var`] requires.
pub unsafe fn export_visible_devices(value: &str) {
    unsafe { std::env::set_var(VISIBLE_DEVICES_ENV, value) }
}
