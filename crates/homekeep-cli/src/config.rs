// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use homekeep_app::{HouseId, UserId};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_USER_ID: i64 = 1;
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub household: Household,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            household: Household::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Household {
    pub house_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            filter: Some(DEFAULT_LOG_FILTER.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("HOMEKEEP_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set HOMEKEEP_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(homekeep_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and keep values under [storage], [household], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.version != CONFIG_VERSION {
            bail!(
                "config {} has version {}; expected 1",
                path.display(),
                self.version
            );
        }

        if let Some(db_path) = &self.storage.db_path {
            homekeep_db::validate_db_path(db_path)?;
        }

        if let Some(house_id) = self.household.house_id
            && house_id <= 0
        {
            bail!(
                "household.house_id in {} must be positive, got {}",
                path.display(),
                house_id
            );
        }

        if let Some(user_id) = self.household.user_id
            && user_id <= 0
        {
            bail!(
                "household.user_id in {} must be positive, got {}",
                path.display(),
                user_id
            );
        }

        if let Some(filter) = &self.log.filter {
            EnvFilter::builder().parse(filter).with_context(|| {
                format!(
                    "log.filter in {} is not a valid filter directive; try \"info\" or \"homekeep_app=debug\"",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => homekeep_db::default_db_path(),
        }
    }

    pub fn house_id(&self) -> Option<HouseId> {
        self.household.house_id.map(HouseId::new)
    }

    pub fn user_id(&self) -> UserId {
        UserId::new(self.household.user_id.unwrap_or(DEFAULT_USER_ID))
    }

    pub fn log_filter(&self) -> &str {
        self.log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# homekeep config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/homekeep/homekeep.db)\n# db_path = \"/absolute/path/to/homekeep.db\"\n\n[household]\n# House used when --house is not given. Run `homekeep houses` to list ids.\n# house_id = 1\nuser_id = {}\n\n[log]\n# tracing filter directive; RUST_LOG refines it\nfilter = \"{}\"\n",
            path.display(),
            DEFAULT_USER_ID,
            DEFAULT_LOG_FILTER,
        )
    }
}
