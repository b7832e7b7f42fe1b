use std::process::Command;

use super::DeviceProbe;

/// Counts CUDA GPUs through `nvidia-smi`. Zero when the tool is missing or fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct NvidiaSmiProbe;

impl NvidiaSmiProbe {
    fn query() -> Option<String> {
        let output = Command::new("nvidia-smi")
            .args(["--query-gpu=index", "--format=csv,noheader"])
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// One GPU per non-empty line of `--query-gpu=index` output.
pub(crate) fn count_index_lines(stdout: &str) -> usize {
    stdout
        .lines()
        .filter(|line| line.trim().parse::<u32>().is_ok())
        .count()
}

impl DeviceProbe for NvidiaSmiProbe {
    fn name(&self) -> &str {
        "nvidia-smi"
    }

    fn device_count(&self) -> usize {
        match Self::query() {
            Some(stdout) => count_index_lines(&stdout),
            None => {
                tracing::debug!("nvidia-smi not available");
                0
            }
        }
    }
}
