//! `GPT2_*` environment overrides.
//!
//! Key names live in the `constants` submodule. An unset variable keeps the existing
//! value; a set variable that fails to parse is an error, never silently ignored.

use std::env::{self, VarError};
use std::str::FromStr;

use super::constants::{
    ENV_ACCUMULATE_GRAD_BATCHES, ENV_BATCH_SIZE, ENV_BETA1, ENV_BETA2, ENV_CLIP, ENV_DROPOUT,
    ENV_HIDDEN_SIZE, ENV_LR, ENV_MAX_LEN, ENV_MIN_LR, ENV_NUM_ATTENTION_HEADS,
    ENV_NUM_HIDDEN_LAYERS, ENV_N_EPOCH, ENV_PREFIX, ENV_SEED, ENV_SUFFIXES, ENV_VOCAB_SIZE,
    ENV_WEIGHT_DECAY,
};
use super::{Config, ConfigError};

/// Full variable name for a key suffix (`SEED` → `GPT2_SEED`).
#[must_use]
pub fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}{suffix}")
}

/// Every variable [`apply_env`] reads, in field order.
#[must_use]
pub fn override_keys() -> Vec<String> {
    ENV_SUFFIXES.iter().map(|suffix| env_key(suffix)).collect()
}

/// `Ok(None)` when unset, `Err` when set but not valid Unicode.
pub fn env_string(key: &str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(s) => Ok(Some(s)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::EnvVar {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Reads and parses a variable; `Ok(None)` when unset.
pub fn env_parsed<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = env_string(key)? else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::Parse {
            key: key.to_string(),
            message: e.to_string(),
            value: raw,
        })
}

fn override_with<T>(slot: &mut T, suffix: &str) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = env_parsed(&env_key(suffix))? {
        *slot = value;
    }
    Ok(())
}

/// Shipped defaults with `GPT2_*` overrides applied.
pub fn from_env() -> Result<Config, ConfigError> {
    apply_env(Config::default())
}

/// Applies `GPT2_*` overrides on top of `config` (e.g. one loaded from a file).
pub fn apply_env(mut config: Config) -> Result<Config, ConfigError> {
    override_with(&mut config.seed, ENV_SEED)?;
    override_with(&mut config.batch_size, ENV_BATCH_SIZE)?;
    override_with(
        &mut config.accumulate_grad_batches,
        ENV_ACCUMULATE_GRAD_BATCHES,
    )?;
    override_with(&mut config.max_len, ENV_MAX_LEN)?;
    override_with(&mut config.vocab_size, ENV_VOCAB_SIZE)?;
    override_with(&mut config.hidden_size, ENV_HIDDEN_SIZE)?;
    override_with(&mut config.num_hidden_layers, ENV_NUM_HIDDEN_LAYERS)?;
    override_with(&mut config.num_attention_heads, ENV_NUM_ATTENTION_HEADS)?;
    override_with(&mut config.dropout, ENV_DROPOUT)?;
    override_with(&mut config.lr, ENV_LR)?;
    override_with(&mut config.min_lr, ENV_MIN_LR)?;
    override_with(&mut config.n_epoch, ENV_N_EPOCH)?;
    override_with(&mut config.weight_decay, ENV_WEIGHT_DECAY)?;
    override_with(&mut config.betas.0, ENV_BETA1)?;
    override_with(&mut config.betas.1, ENV_BETA2)?;
    override_with(&mut config.clip, ENV_CLIP)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ENV_LOCK;

    fn set(key: &str, value: &str) {
        // SAFETY: env tests hold ENV_LOCK, so no other test thread touches the environment.
        unsafe { env::set_var(key, value) }
    }

    fn unset(key: &str) {
        // SAFETY: as above.
        unsafe { env::remove_var(key) }
    }

    #[test]
    fn env_key_prefixes_suffix() {
        assert_eq!(env_key(ENV_SEED), "GPT2_SEED");
        assert_eq!(env_key(ENV_BETA2), "GPT2_BETA2");
    }

    #[test]
    fn override_keys_cover_every_field() {
        let keys = override_keys();
        assert_eq!(keys.len(), 16);
        assert!(keys.iter().all(|key| key.starts_with("GPT2_")));
        assert!(keys.contains(&"GPT2_LR".to_string()));
        assert!(keys.contains(&"GPT2_CLIP".to_string()));
    }

    #[test]
    fn unset_keys_read_as_none() {
        assert_eq!(env_string("GPT2_UNLIKELY_KEY_31337").unwrap(), None);
        assert_eq!(env_parsed::<u64>("GPT2_UNLIKELY_KEY_31338").unwrap(), None);
    }

    #[test]
    fn from_env_without_overrides_is_shipped_config() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for key in override_keys() {
            unset(&key);
        }
        assert_eq!(from_env().unwrap(), Config::gpt2());
    }

    #[test]
    fn overrides_apply_per_field() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let batch = env_key(ENV_BATCH_SIZE);
        let beta1 = env_key(ENV_BETA1);
        set(&batch, "16");
        set(&beta1, " 0.8 ");
        let cfg = from_env();
        unset(&batch);
        unset(&beta1);

        let cfg = cfg.unwrap();
        assert_eq!(cfg.batch_size, 16);
        assert_eq!(cfg.betas, (0.8, 0.95));
        assert_eq!(cfg.hidden_size, 768);
    }

    #[test]
    fn apply_env_layers_on_existing_record() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let key = env_key(ENV_N_EPOCH);
        set(&key, "2");
        let base = Config {
            batch_size: 2,
            ..Config::gpt2()
        };
        let cfg = apply_env(base);
        unset(&key);

        let cfg = cfg.unwrap();
        assert_eq!(cfg.n_epoch, 2);
        assert_eq!(cfg.batch_size, 2);
    }

    #[test]
    fn unparsable_override_names_key_and_value() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let key = env_key(ENV_SEED);
        set(&key, "not_a_number");
        let res = from_env();
        unset(&key);

        match res {
            Err(ConfigError::Parse { key, value, .. }) => {
                assert_eq!(key, "GPT2_SEED");
                assert_eq!(value, "not_a_number");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
