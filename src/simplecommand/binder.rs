//! # Binder
//!
//! Fills a command's flags from environment variables and a config file.
//!
//! ## Precedence
//!
//! 1. **Command line**: a flag the user typed is never overwritten.
//! 2. **Environment**: `PREFIX_FLAG` (see [`Binder::env_key`]).
//! 3. **Config file**: a key with the flag's name.
//! 4. **Default**: whatever the flag declared.
//!
//! ## Environment Keys
//!
//! The key for a flag is `<prefix>_<flag name>`, or just the flag name when no prefix is set.
//! The [`KeyReplacer`] (if any) is applied to the whole key, which is then upper-cased. With
//! prefix `cmd` and a `-` → `_` replacer, `--log-level` is read from `CMD_LOG_LEVEL`.
//!
//! List flags (`ArgAction::Append`) split environment values on `,`. An empty variable is treated
//! as unset.

use commander::{FlagKind, FlagSet, FlagSource};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{self, ConfigValues};
use crate::error::{BindError, Result};
use crate::replacer::KeyReplacer;

/// Where environment variables are read from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    #[default]
    Process,
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    /// The variable's value. Set-but-empty variables count as unset.
    fn get(&self, key: &str) -> Option<String> {
        let value = match self {
            EnvSource::Process => std::env::var(key).ok(),
            EnvSource::Fixed(vars) => vars.get(key).cloned(),
        };
        value.filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone)]
struct ConfigFile {
    path: PathBuf,
    optional: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Binder {
    env_prefix: String,
    key_replacer: Option<KeyReplacer>,
    config: Option<ConfigFile>,
    env: EnvSource,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    pub fn key_replacer(mut self, replacer: Option<KeyReplacer>) -> Self {
        self.key_replacer = replacer;
        self
    }

    /// A config file that must exist.
    pub fn config<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config = Some(ConfigFile {
            path: path.into(),
            optional: false,
        });
        self
    }

    /// A config file that is skipped when missing.
    pub fn optional_config<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config = Some(ConfigFile {
            path: path.into(),
            optional: true,
        });
        self
    }

    pub fn env_source(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config.as_ref().map(|c| c.path.as_path())
    }

    /// The environment variable consulted for `flag`.
    pub fn env_key(&self, flag: &str) -> String {
        let key = if self.env_prefix.is_empty() {
            flag.to_string()
        } else {
            format!("{}_{}", self.env_prefix, flag)
        };
        let key = match &self.key_replacer {
            Some(replacer) => replacer.replace(&key),
            None => key,
        };
        key.to_uppercase()
    }

    /// Applies environment variables and the config file to every flag not set on the command line.
    pub fn bind(&self, flags: &mut FlagSet) -> Result<()> {
        let file_values = match &self.config {
            Some(cfg) => config::load(&cfg.path, cfg.optional)?,
            None => None,
        };

        let pending: Vec<(String, FlagKind)> = flags
            .iter()
            .filter(|f| f.source() != FlagSource::CommandLine)
            .map(|f| (f.name().to_string(), f.kind()))
            .collect();

        for (name, kind) in pending {
            let key = self.env_key(&name);
            if let Some(raw) = self.env.get(&key) {
                let values = split_env(&raw, kind);
                tracing::debug!(flag = %name, env = %key, "flag bound from environment");
                flags
                    .set(&name, values, FlagSource::Environment)
                    .map_err(|source| BindError::Flag {
                        flag: name.clone(),
                        origin: format!("environment variable {key}"),
                        source,
                    })?;
                continue;
            }

            if let (Some(values), Some(cfg)) = (
                file_values.as_ref().and_then(|v| lookup(v, &name)),
                &self.config,
            ) {
                tracing::debug!(flag = %name, "flag bound from config file");
                flags
                    .set(&name, values.iter().cloned(), FlagSource::ConfigFile)
                    .map_err(|source| BindError::Flag {
                        flag: name.clone(),
                        origin: format!("config file {}", cfg.path.display()),
                        source,
                    })?;
            }
        }

        Ok(())
    }
}

fn split_env(raw: &str, kind: FlagKind) -> Vec<String> {
    match kind {
        FlagKind::List => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => vec![raw.to_string()],
    }
}

fn lookup<'a>(values: &'a ConfigValues, flag: &str) -> Option<&'a Vec<String>> {
    values.get(&flag.to_lowercase())
}
