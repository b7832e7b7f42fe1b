//! Hyperparameters for a GPT-2 small training run.
//!
//! [`Config::gpt2`] returns the shipped values. [`from_env`] and [`apply_env`] layer
//! `GPT2_*` overrides on top, and [`Config::load`] reads a JSON file. Every source goes
//! through [`Config::validate`] before a run is initialized.

mod builder;
mod constants;
mod error;
mod views;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use constants::{
    DEFAULT_ACCUMULATE_GRAD_BATCHES, DEFAULT_BATCH_SIZE, DEFAULT_BETAS, DEFAULT_CLIP,
    DEFAULT_DROPOUT, DEFAULT_HIDDEN_SIZE, DEFAULT_LR, DEFAULT_MAX_LEN, DEFAULT_MIN_LR,
    DEFAULT_NUM_ATTENTION_HEADS, DEFAULT_NUM_HIDDEN_LAYERS, DEFAULT_N_EPOCH, DEFAULT_SEED,
    DEFAULT_VOCAB_SIZE, DEFAULT_WEIGHT_DECAY, FF_MULTIPLIER,
};

pub use builder::{apply_env, env_key, env_parsed, env_string, from_env, override_keys};
pub use error::ConfigError;
pub use views::{BatchPlan, ModelDims, OptimizerParams};

/// Training configuration record.
///
/// Plain data: build it once, validate it, then hand it to consumers by reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Seed for the run's random generator.
    pub seed: u64,

    /// Micro-batch size per step.
    pub batch_size: usize,
    /// Micro-batches accumulated per optimizer step.
    pub accumulate_grad_batches: usize,

    /// Context window in tokens.
    pub max_len: usize,
    pub vocab_size: usize,
    /// Embedding dimension (must be divisible by `num_attention_heads`).
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub dropout: f64,

    /// Peak learning rate.
    pub lr: f64,
    /// Floor of the learning-rate decay.
    pub min_lr: f64,
    pub n_epoch: usize,
    pub weight_decay: f64,
    /// AdamW (beta1, beta2).
    pub betas: (f64, f64),
    /// Gradient-norm clip threshold; 0 disables clipping.
    pub clip: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self::gpt2()
    }
}

impl Config {
    /// GPT-2 small (124M) with nanoGPT-style optimization settings.
    #[must_use]
    pub fn gpt2() -> Self {
        Self {
            seed: DEFAULT_SEED,
            batch_size: DEFAULT_BATCH_SIZE,
            accumulate_grad_batches: DEFAULT_ACCUMULATE_GRAD_BATCHES,
            max_len: DEFAULT_MAX_LEN,
            vocab_size: DEFAULT_VOCAB_SIZE,
            hidden_size: DEFAULT_HIDDEN_SIZE,
            num_hidden_layers: DEFAULT_NUM_HIDDEN_LAYERS,
            num_attention_heads: DEFAULT_NUM_ATTENTION_HEADS,
            dropout: DEFAULT_DROPOUT,
            lr: DEFAULT_LR,
            min_lr: DEFAULT_MIN_LR,
            n_epoch: DEFAULT_N_EPOCH,
            weight_decay: DEFAULT_WEIGHT_DECAY,
            betas: DEFAULT_BETAS,
            clip: DEFAULT_CLIP,
        }
    }

    /// Checks every range and consistency rule, reporting the first one that fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("batch_size", self.batch_size),
            ("accumulate_grad_batches", self.accumulate_grad_batches),
            ("max_len", self.max_len),
            ("vocab_size", self.vocab_size),
            ("hidden_size", self.hidden_size),
            ("num_hidden_layers", self.num_hidden_layers),
            ("num_attention_heads", self.num_attention_heads),
            ("n_epoch", self.n_epoch),
        ] {
            if value == 0 {
                return Err(ConfigError::validation(format!(
                    "{name} must be greater than 0"
                )));
            }
        }
        if !self.hidden_size.is_multiple_of(self.num_attention_heads) {
            return Err(ConfigError::validation(format!(
                "hidden_size ({}) must be divisible by num_attention_heads ({})",
                self.hidden_size, self.num_attention_heads
            )));
        }
        if self.hidden_size.checked_mul(FF_MULTIPLIER).is_none()
            || self.model_dims().checked_parameter_count().is_none()
        {
            return Err(ConfigError::validation(format!(
                "model with hidden_size {}, {} layers and vocab_size {} is too large to size",
                self.hidden_size, self.num_hidden_layers, self.vocab_size
            )));
        }
        if self.batch_plan().checked_tokens_per_step().is_none() {
            return Err(ConfigError::validation(format!(
                "batch_size ({}) x accumulate_grad_batches ({}) x max_len ({}) overflows",
                self.batch_size, self.accumulate_grad_batches, self.max_len
            )));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ConfigError::validation(format!(
                "dropout ({}) must be in [0, 1)",
                self.dropout
            )));
        }
        if !self.lr.is_finite() || self.lr <= 0.0 {
            return Err(ConfigError::validation(format!(
                "lr ({}) must be a positive number",
                self.lr
            )));
        }
        if !self.min_lr.is_finite() || self.min_lr <= 0.0 {
            return Err(ConfigError::validation(format!(
                "min_lr ({}) must be a positive number",
                self.min_lr
            )));
        }
        if self.min_lr > self.lr {
            return Err(ConfigError::validation(format!(
                "min_lr ({}) must not exceed lr ({})",
                self.min_lr, self.lr
            )));
        }
        if !self.weight_decay.is_finite() || self.weight_decay < 0.0 {
            return Err(ConfigError::validation(format!(
                "weight_decay ({}) must be non-negative",
                self.weight_decay
            )));
        }
        let (beta1, beta2) = self.betas;
        if !in_open_unit(beta1) || !in_open_unit(beta2) {
            return Err(ConfigError::validation(format!(
                "betas ({beta1}, {beta2}) must both be in (0, 1)"
            )));
        }
        if !self.clip.is_finite() || self.clip < 0.0 {
            return Err(ConfigError::validation(format!(
                "clip ({}) must be non-negative",
                self.clip
            )));
        }
        Ok(())
    }

    /// Reads a JSON config. Fields missing from the file keep their shipped values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Width of a single attention head.
    #[must_use]
    pub fn head_dim(&self) -> usize {
        self.hidden_size / self.num_attention_heads
    }

    #[must_use]
    pub fn model_dims(&self) -> ModelDims {
        ModelDims {
            vocab_size: self.vocab_size,
            max_len: self.max_len,
            hidden_size: self.hidden_size,
            num_layers: self.num_hidden_layers,
            num_heads: self.num_attention_heads,
            head_dim: self.head_dim(),
            ff_dim: self.hidden_size.saturating_mul(FF_MULTIPLIER),
            dropout: self.dropout,
        }
    }

    #[must_use]
    pub fn optimizer_params(&self) -> OptimizerParams {
        OptimizerParams {
            lr: self.lr,
            min_lr: self.min_lr,
            beta1: self.betas.0,
            beta2: self.betas.1,
            weight_decay: self.weight_decay,
            clip: self.clip,
        }
    }

    #[must_use]
    pub fn batch_plan(&self) -> BatchPlan {
        BatchPlan {
            batch_size: self.batch_size,
            accumulate_grad_batches: self.accumulate_grad_batches,
            max_len: self.max_len,
        }
    }
}

fn in_open_unit(x: f64) -> bool {
    x > 0.0 && x < 1.0
}
