use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use xtap_index::Database;
use xtap_runtime::{CONFIG_FILE, Config};

use crate::types::OutputFormat;

pub struct ExecutionContext {
    data_dir: PathBuf,
    pub config: Config,
    pub format: OutputFormat,
}

impl ExecutionContext {
    pub fn new(data_dir: PathBuf, format: OutputFormat) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);
        let config = Config::load_from(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;

        Ok(Self {
            data_dir,
            config,
            format,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    pub fn db_path(&self) -> PathBuf {
        self.config.database_path(&self.data_dir)
    }

    pub fn db(&self) -> Result<Database> {
        let db_path = self.db_path();
        Database::open(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
