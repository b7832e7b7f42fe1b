//! Per-consumer slices of [`super::Config`]: what the model builder, the optimizer
//! factory and the data loader each need.

use serde::Serialize;

/// Shape of the transformer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ModelDims {
    pub vocab_size: usize,
    pub max_len: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub num_heads: usize,
    pub head_dim: usize,
    pub ff_dim: usize,
    pub dropout: f64,
}

impl ModelDims {
    /// Trainable parameters of a GPT-2 layout: token and position embeddings
    /// (output head tied to the token embedding), pre-norm blocks with biased
    /// projections, and a final layer norm.
    ///
    /// Saturates at `usize::MAX`; a validated config never gets there.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.checked_parameter_count().unwrap_or(usize::MAX)
    }

    /// [`Self::parameter_count`], or `None` if it does not fit in a `usize`.
    #[must_use]
    pub fn checked_parameter_count(&self) -> Option<usize> {
        let h = self.hidden_size;
        let ff = self.ff_dim;
        let layer_norm = h.checked_mul(2)?;
        let qkv = h.checked_mul(3)?.checked_mul(h)?.checked_add(h.checked_mul(3)?)?;
        let proj = h.checked_mul(h)?.checked_add(h)?;
        let fc = h.checked_mul(ff)?.checked_add(ff)?;
        let fc_proj = ff.checked_mul(h)?.checked_add(h)?;
        let block = layer_norm
            .checked_mul(2)?
            .checked_add(qkv)?
            .checked_add(proj)?
            .checked_add(fc)?
            .checked_add(fc_proj)?;

        let embeddings = self
            .vocab_size
            .checked_mul(h)?
            .checked_add(self.max_len.checked_mul(h)?)?;
        embeddings
            .checked_add(self.num_layers.checked_mul(block)?)?
            .checked_add(layer_norm)
    }
}

/// AdamW settings plus the learning-rate bounds of the decay schedule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OptimizerParams {
    pub lr: f64,
    pub min_lr: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub weight_decay: f64,
    pub clip: f64,
}

impl OptimizerParams {
    #[must_use]
    pub fn clipping_enabled(&self) -> bool {
        self.clip > 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BatchPlan {
    pub batch_size: usize,
    pub accumulate_grad_batches: usize,
    pub max_len: usize,
}

impl BatchPlan {
    /// Sequences per optimizer step. Saturates at `usize::MAX`.
    #[must_use]
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.saturating_mul(self.accumulate_grad_batches)
    }

    /// Tokens per optimizer step when every sequence fills the context window.
    /// Saturates at `usize::MAX`.
    #[must_use]
    pub fn tokens_per_step(&self) -> usize {
        self.checked_tokens_per_step().unwrap_or(usize::MAX)
    }

    /// [`Self::tokens_per_step`], or `None` if it (or the effective batch) overflows.
    #[must_use]
    pub fn checked_tokens_per_step(&self) -> Option<usize> {
        self.batch_size
            .checked_mul(self.accumulate_grad_batches)?
            .checked_mul(self.max_len)
    }
}
