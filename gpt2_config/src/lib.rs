//! Configuration for a GPT-2 small training run: hyperparameters, directory layout,
//! accelerator visibility and seeding.

pub mod config;
pub mod device;
pub mod paths;
pub mod run;
pub mod seed;

pub use config::{Config, ConfigError};
pub use paths::Paths;
pub use run::{InitError, RunContext, initialize, prepare};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    /// Serializes tests that read or write process environment variables.
    pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());
}

#[cfg(test)]
mod tests {
    use super::device::FixedProbe;
    use super::*;

    #[test]
    fn config_is_deterministic_across_constructions() {
        let first = prepare(Config::gpt2(), "/base", &FixedProbe(1)).unwrap();
        let second = prepare(Config::gpt2(), "/base", &FixedProbe(1)).unwrap();
        assert_eq!(first.config, second.config);
        assert_eq!(first.paths, second.paths);
        assert_eq!(first.visible_devices, second.visible_devices);
    }

    #[test]
    fn saved_config_drives_an_identical_run() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("run.json");
        Config::gpt2().save(&file).unwrap();

        let loaded = Config::load(&file).unwrap();
        let ctx = prepare(loaded, dir.path(), &FixedProbe(2)).unwrap();
        assert_eq!(ctx.config, Config::gpt2());
        assert_eq!(ctx.paths.checkpoint_dir, dir.path().join("checkpoints"));
        assert!(!ctx.paths.checkpoint_dir.exists());
    }
}
