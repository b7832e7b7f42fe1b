//! One-time run initialization.
//!
//! The entry point builds a [`Config`], then calls [`initialize`] exactly once before
//! spawning anything. The returned [`RunContext`] owns everything the model, optimizer and
//! data loader constructors need.

use std::path::PathBuf;

use rand::rngs::StdRng;
use serde::Serialize;
use thiserror::Error;

use crate::config::{BatchPlan, Config, ConfigError, ModelDims, OptimizerParams};
use crate::device::{self, DeviceProbe};
use crate::paths::Paths;
use crate::seed::seeded_rng;

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Validated configuration plus everything resolved from it at start-up.
#[derive(Debug)]
pub struct RunContext {
    pub config: Config,
    pub paths: Paths,
    pub device_count: usize,
    /// Value exported as `CUDA_VISIBLE_DEVICES`.
    pub visible_devices: String,
    pub rng: StdRng,
}

/// Serializable snapshot of a [`RunContext`], printed by the launcher.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub config: &'a Config,
    pub paths: &'a Paths,
    pub visible_devices: &'a str,
    pub model: ModelDims,
    pub parameter_count: usize,
    pub optimizer: OptimizerParams,
    pub batch: BatchPlan,
    pub effective_batch_size: usize,
}

impl RunContext {
    pub fn summary(&self) -> RunSummary<'_> {
        let model = self.config.model_dims();
        let batch = self.config.batch_plan();
        RunSummary {
            config: &self.config,
            paths: &self.paths,
            visible_devices: &self.visible_devices,
            model,
            parameter_count: model.parameter_count(),
            optimizer: self.config.optimizer_params(),
            batch,
            effective_batch_size: batch.effective_batch_size(),
        }
    }
}

/// Validates `config`, probes accelerators, seeds the generator and resolves paths.
/// Touches neither the environment nor the filesystem.
pub fn prepare(
    config: Config,
    base_dir: impl Into<PathBuf>,
    probe: &dyn DeviceProbe,
) -> Result<RunContext, InitError> {
    config.validate()?;

    let device_count = probe.device_count();
    let visible_devices = device::visible_devices(device_count);
    let paths = Paths::new(base_dir);
    let rng = seeded_rng(config.seed);

    tracing::info!(
        "GPT-2 run: {} layers, {} heads, hidden {}, effective batch {}, seed {}",
        config.num_hidden_layers,
        config.num_attention_heads,
        config.hidden_size,
        config.batch_plan().effective_batch_size(),
        config.seed
    );
    if device_count == 0 {
        tracing::warn!("No accelerator detected via {} probe; running on CPU", probe.name());
    } else {
        tracing::info!("{} accelerator(s) visible: {}", device_count, visible_devices);
    }
    tracing::debug!("Base directory: {}", paths.base_dir.display());

    Ok(RunContext {
        config,
        paths,
        device_count,
        visible_devices,
        rng,
    })
}

/// [`prepare`], then export [`device::VISIBLE_DEVICES_ENV`].
///
/// # Safety
///
/// Writes the process environment: call it once, from the entry point, before any other
/// thread exists.
pub unsafe fn initialize(
    config: Config,
    base_dir: impl Into<PathBuf>,
    probe: &dyn DeviceProbe,
) -> Result<RunContext, InitError> {
    let ctx = prepare(config, base_dir, probe)?;
    unsafe { device::export_visible_devices(&ctx.visible_devices) };
    Ok(ctx)
}
