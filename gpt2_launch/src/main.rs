use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use gpt2_config::config::apply_env;
use gpt2_config::device::{AutoProbe, DeviceProbe, FixedProbe};
use gpt2_config::{Config, initialize};
use tracing_subscriber::EnvFilter;

/// Resolve and initialize a GPT-2 training run, then print its summary as JSON.
#[derive(Parser, Debug)]
#[command(name = "gpt2_launch")]
struct Args {
    /// Root of the checkpoints/ and datasets/ tree [default: directory of --config, else cwd]
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// JSON config to start from instead of the shipped GPT-2 values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save the resolved config as JSON and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Hide every accelerator
    #[arg(long, action)]
    cpu: bool,
}

fn resolve_base_dir(args: &Args) -> io::Result<PathBuf> {
    if let Some(dir) = &args.base_dir {
        return std::path::absolute(dir);
    }
    match args
        .config
        .as_deref()
        .and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        Some(parent) => std::path::absolute(parent),
        None => std::env::current_dir(),
    }
}

fn load_config(args: &Args) -> Result<Config, Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::gpt2(),
    };
    Ok(apply_env(config)?)
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(args)?;

    if let Some(path) = &args.write_config {
        config.validate()?;
        config.save(path)?;
        tracing::info!("Wrote config to {}", path.display());
        return Ok(());
    }

    let base_dir = resolve_base_dir(args)?;
    let probe: Box<dyn DeviceProbe> = if args.cpu {
        Box::new(FixedProbe(0))
    } else {
        Box::new(AutoProbe::new())
    };

    // SAFETY: still single-threaded; nothing has been spawned yet.
    let ctx = unsafe { initialize(config, base_dir, probe.as_ref())? };

    for dir in ctx.paths.missing() {
        tracing::warn!("Directory does not exist yet: {}", dir.display());
    }

    println!("{}", serde_json::to_string_pretty(&ctx.summary())?);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Initialization failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpt2_config::ConfigError;
    use gpt2_config::config::override_keys;
    use std::fs;
    use std::sync::Mutex;

    /// Serializes tests that read or write `GPT2_*` variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_overrides() {
        for key in override_keys() {
            // SAFETY: callers hold ENV_LOCK.
            unsafe { std::env::remove_var(key) }
        }
    }

    fn set(key: &str, value: &str) {
        // SAFETY: callers hold ENV_LOCK.
        unsafe { std::env::set_var(key, value) }
    }

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("gpt2_launch").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn explicit_base_dir_wins() {
        let args = parse(&["--base-dir", "/srv/gpt2", "--config", "/etc/gpt2/run.json"]);
        assert_eq!(resolve_base_dir(&args).unwrap(), Path::new("/srv/gpt2"));
    }

    #[test]
    fn base_dir_defaults_to_config_directory() {
        let args = parse(&["--config", "/etc/gpt2/run.json"]);
        assert_eq!(resolve_base_dir(&args).unwrap(), Path::new("/etc/gpt2"));
    }

    #[test]
    fn base_dir_falls_back_to_cwd() {
        let args = parse(&["--config", "run.json"]);
        assert_eq!(
            resolve_base_dir(&args).unwrap(),
            std::env::current_dir().unwrap()
        );
        assert_eq!(
            resolve_base_dir(&parse(&[])).unwrap(),
            std::env::current_dir().unwrap()
        );
    }

    #[test]
    fn write_config_layers_env_over_file() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("base.json");
        let output = dir.path().join("resolved.json");
        fs::write(&input, r#"{ "n_epoch": 3, "batch_size": 2 }"#).unwrap();

        set("GPT2_BATCH_SIZE", "4");
        let res = run(&parse(&[
            "--config",
            input.to_str().unwrap(),
            "--write-config",
            output.to_str().unwrap(),
        ]));
        clear_overrides();
        res.unwrap();

        let expected = Config {
            n_epoch: 3,
            batch_size: 4,
            ..Config::gpt2()
        };
        assert_eq!(Config::load(&output).unwrap(), expected);
    }

    #[test]
    fn load_config_without_file_is_shipped_config() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();
        assert_eq!(load_config(&parse(&[])).unwrap(), Config::gpt2());
    }

    #[test]
    fn invalid_override_writes_nothing() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("resolved.json");

        set("GPT2_NUM_ATTENTION_HEADS", "7");
        let res = run(&parse(&["--write-config", output.to_str().unwrap()]));
        clear_overrides();

        let err = res.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Validation(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn unparsable_override_writes_nothing() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("resolved.json");

        set("GPT2_LR", "fast");
        let res = run(&parse(&["--write-config", output.to_str().unwrap()]));
        clear_overrides();

        let err = res.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Parse { .. })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn cpu_flag_parses() {
        assert!(parse(&["--cpu"]).cpu);
        assert!(!parse(&[]).cpu);
    }
}
