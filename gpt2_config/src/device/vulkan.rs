use std::error::Error;
use std::ffi::CString;

use ash::vk;

use super::DeviceProbe;

/// Counts GPUs visible to the Vulkan loader. CPU rasterizers (llvmpipe, SwiftShader)
/// are not counted.
#[derive(Clone, Copy, Debug, Default)]
pub struct VulkanProbe;

impl VulkanProbe {
    fn count_gpus() -> Result<usize, Box<dyn Error>> {
        let entry = unsafe { ash::Entry::load()? };

        let app_name = CString::new("gpt2-config")?;
        let engine_name = CString::new("No Engine")?;

        let app_info = vk::ApplicationInfo {
            s_type: vk::StructureType::APPLICATION_INFO,
            p_next: std::ptr::null(),
            p_application_name: app_name.as_ptr(),
            application_version: vk::make_api_version(0, 0, 1, 0),
            p_engine_name: engine_name.as_ptr(),
            engine_version: vk::make_api_version(0, 1, 0, 0),
            api_version: vk::API_VERSION_1_0,
            _marker: std::marker::PhantomData,
        };

        let instance = unsafe {
            entry.create_instance(
                &vk::InstanceCreateInfo {
                    s_type: vk::StructureType::INSTANCE_CREATE_INFO,
                    p_next: std::ptr::null(),
                    flags: vk::InstanceCreateFlags::empty(),
                    p_application_info: &app_info,
                    enabled_layer_count: 0,
                    pp_enabled_layer_names: std::ptr::null(),
                    enabled_extension_count: 0,
                    pp_enabled_extension_names: std::ptr::null(),
                    _marker: std::marker::PhantomData,
                },
                None,
            )?
        };

        // Enumerate before bailing so the instance is destroyed on both paths.
        let counted = unsafe { instance.enumerate_physical_devices() }.map(|devices| {
            devices
                .iter()
                .filter(|&&device| {
                    let props = unsafe { instance.get_physical_device_properties(device) };
                    is_gpu(props.device_type)
                })
                .count()
        });

        unsafe { instance.destroy_instance(None) };

        Ok(counted?)
    }
}

fn is_gpu(device_type: vk::PhysicalDeviceType) -> bool {
    matches!(
        device_type,
        vk::PhysicalDeviceType::DISCRETE_GPU
            | vk::PhysicalDeviceType::INTEGRATED_GPU
            | vk::PhysicalDeviceType::VIRTUAL_GPU
    )
}

impl DeviceProbe for VulkanProbe {
    fn name(&self) -> &str {
        "vulkan"
    }

    fn device_count(&self) -> usize {
        match Self::count_gpus() {
            Ok(count) => count,
            Err(e) => {
                tracing::debug!("Vulkan probe unavailable: {}", e);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_devices_are_not_accelerators() {
        assert!(is_gpu(vk::PhysicalDeviceType::DISCRETE_GPU));
        assert!(is_gpu(vk::PhysicalDeviceType::INTEGRATED_GPU));
        assert!(!is_gpu(vk::PhysicalDeviceType::CPU));
        assert!(!is_gpu(vk::PhysicalDeviceType::OTHER));
    }
}
