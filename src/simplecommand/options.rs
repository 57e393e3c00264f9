use std::fmt;
use std::path::PathBuf;

use crate::binder::EnvSource;
use crate::replacer::KeyReplacer;

/// The configurable parts of a [`crate::CommandBase`], written by [`CommandOption`]s.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub(crate) long: String,
    pub(crate) deprecated: String,
    pub(crate) binding: bool,
    pub(crate) env_prefix: String,
    pub(crate) key_replacer: Option<KeyReplacer>,
    pub(crate) config: Option<PathBuf>,
    pub(crate) config_optional: bool,
    pub(crate) env_source: EnvSource,
}

/// Changes one default of a [`crate::CommandBase`] when passed to [`crate::CommandBase::new`].
pub struct CommandOption(Box<dyn FnOnce(&mut Settings)>);

impl CommandOption {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut Settings) + 'static,
    {
        Self(Box::new(f))
    }

    pub(crate) fn apply(self, settings: &mut Settings) {
        (self.0)(settings)
    }
}

impl fmt::Debug for CommandOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CommandOption")
    }
}

/// Sets the long description shown by `--help`.
pub fn long(description: &str) -> CommandOption {
    let description = description.to_string();
    CommandOption::new(move |s| s.long = description)
}

/// Marks the command as deprecated: it is hidden from help and prints `reason` when run.
pub fn deprecated(reason: &str) -> CommandOption {
    let reason = reason.to_string();
    CommandOption::new(move |s| s.deprecated = reason)
}

/// Lets every flag of the command be set from `<PREFIX>_<FLAG>` environment variables, and from
/// the config file if one is configured.
pub fn with_env(prefix: &str, replacer: Option<KeyReplacer>) -> CommandOption {
    let prefix = prefix.to_string();
    CommandOption::new(move |s| {
        s.binding = true;
        s.env_prefix = prefix;
        s.key_replacer = replacer;
    })
}

/// A config file that must exist. Only read when [`with_env`] is also given.
pub fn with_config<P: Into<PathBuf>>(path: P) -> CommandOption {
    let path = path.into();
    CommandOption::new(move |s| {
        s.config = Some(path);
        s.config_optional = false;
    })
}

/// A config file that may be missing. Only read when [`with_env`] is also given.
pub fn with_optional_config<P: Into<PathBuf>>(path: P) -> CommandOption {
    let path = path.into();
    CommandOption::new(move |s| {
        s.config = Some(path);
        s.config_optional = true;
    })
}

/// Where [`with_env`] reads variables from. Defaults to the process environment.
pub fn with_env_source(env: EnvSource) -> CommandOption {
    CommandOption::new(move |s| s.env_source = env)
}
