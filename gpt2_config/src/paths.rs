//! Directory layout shared with the checkpointing and data-loading code.
//!
//! ```text
//! <base>/checkpoints/           checkpoint_dir
//! <base>/checkpoints/gpt2/      pretrained_dir
//! <base>/datasets/              dataset_dir
//! <base>/datasets/openwebtext/  openwebtext_dir
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

const CHECKPOINTS: &str = "checkpoints";
const PRETRAINED: &str = "gpt2";
const DATASETS: &str = "datasets";
const OPENWEBTEXT: &str = "openwebtext";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Paths {
    pub base_dir: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub pretrained_dir: PathBuf,
    pub dataset_dir: PathBuf,
    pub openwebtext_dir: PathBuf,
}

impl Paths {
    /// Resolves the layout under `base_dir`. Pure path arithmetic; nothing is created
    /// or checked on disk.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let checkpoint_dir = base_dir.join(CHECKPOINTS);
        let pretrained_dir = checkpoint_dir.join(PRETRAINED);
        let dataset_dir = base_dir.join(DATASETS);
        let openwebtext_dir = dataset_dir.join(OPENWEBTEXT);
        Self {
            base_dir,
            checkpoint_dir,
            pretrained_dir,
            dataset_dir,
            openwebtext_dir,
        }
    }

    /// Creates every directory of the layout. Only for callers that own the tree.
    pub fn create_all(&self) -> io::Result<()> {
        fs::create_dir_all(&self.pretrained_dir)?;
        fs::create_dir_all(&self.openwebtext_dir)?;
        Ok(())
    }

    /// Directories of the layout that do not exist yet.
    pub fn missing(&self) -> Vec<&Path> {
        [
            self.checkpoint_dir.as_path(),
            self.pretrained_dir.as_path(),
            self.dataset_dir.as_path(),
            self.openwebtext_dir.as_path(),
        ]
        .into_iter()
        .filter(|dir| !dir.is_dir())
        .collect()
    }
}
