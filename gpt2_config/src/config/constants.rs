//! Shipped hyperparameters and the environment keys that override them.

/// Prefix for override variables (e.g. `GPT2_BATCH_SIZE`).
pub(crate) const ENV_PREFIX: &str = "GPT2_";

pub(crate) const ENV_SEED: &str = "SEED";
pub(crate) const ENV_BATCH_SIZE: &str = "BATCH_SIZE";
pub(crate) const ENV_ACCUMULATE_GRAD_BATCHES: &str = "ACCUMULATE_GRAD_BATCHES";
pub(crate) const ENV_MAX_LEN: &str = "MAX_LEN";
pub(crate) const ENV_VOCAB_SIZE: &str = "VOCAB_SIZE";
pub(crate) const ENV_HIDDEN_SIZE: &str = "HIDDEN_SIZE";
pub(crate) const ENV_NUM_HIDDEN_LAYERS: &str = "NUM_HIDDEN_LAYERS";
pub(crate) const ENV_NUM_ATTENTION_HEADS: &str = "NUM_ATTENTION_HEADS";
pub(crate) const ENV_DROPOUT: &str = "DROPOUT";
pub(crate) const ENV_LR: &str = "LR";
pub(crate) const ENV_MIN_LR: &str = "MIN_LR";
pub(crate) const ENV_N_EPOCH: &str = "N_EPOCH";
pub(crate) const ENV_WEIGHT_DECAY: &str = "WEIGHT_DECAY";
pub(crate) const ENV_BETA1: &str = "BETA1";
pub(crate) const ENV_BETA2: &str = "BETA2";
pub(crate) const ENV_CLIP: &str = "CLIP";

pub(crate) const ENV_SUFFIXES: [&str; 16] = [
    ENV_SEED,
    ENV_BATCH_SIZE,
    ENV_ACCUMULATE_GRAD_BATCHES,
    ENV_MAX_LEN,
    ENV_VOCAB_SIZE,
    ENV_HIDDEN_SIZE,
    ENV_NUM_HIDDEN_LAYERS,
    ENV_NUM_ATTENTION_HEADS,
    ENV_DROPOUT,
    ENV_LR,
    ENV_MIN_LR,
    ENV_N_EPOCH,
    ENV_WEIGHT_DECAY,
    ENV_BETA1,
    ENV_BETA2,
    ENV_CLIP,
];

pub(crate) const DEFAULT_SEED: u64 = 3407;

pub(crate) const DEFAULT_BATCH_SIZE: usize = 8;
pub(crate) const DEFAULT_ACCUMULATE_GRAD_BATCHES: usize = 64;

// gpt-2 small
pub(crate) const DEFAULT_MAX_LEN: usize = 1024;
pub(crate) const DEFAULT_VOCAB_SIZE: usize = 50257;
pub(crate) const DEFAULT_HIDDEN_SIZE: usize = 768;
pub(crate) const DEFAULT_NUM_HIDDEN_LAYERS: usize = 12;
pub(crate) const DEFAULT_NUM_ATTENTION_HEADS: usize = 12;
pub(crate) const DEFAULT_DROPOUT: f64 = 0.1;

// GPT-2 never published its training hyperparameters; these follow nanoGPT.
pub(crate) const DEFAULT_LR: f64 = 6e-4;
pub(crate) const DEFAULT_MIN_LR: f64 = 6e-5;
pub(crate) const DEFAULT_N_EPOCH: usize = 10;
pub(crate) const DEFAULT_WEIGHT_DECAY: f64 = 1e-1;
pub(crate) const DEFAULT_BETAS: (f64, f64) = (0.9, 0.95);
pub(crate) const DEFAULT_CLIP: f64 = 1.0;

/// Feed-forward width as a multiple of the hidden size.
pub(crate) const FF_MULTIPLIER: usize = 4;
