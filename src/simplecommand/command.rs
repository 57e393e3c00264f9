use commander::{Commandeer, Commander, Invocation};
use std::fmt;
use std::path::Path;

use crate::binder::Binder;
use crate::options::{CommandOption, Settings};
use crate::replacer::KeyReplacer;

/// The behavior a [`CommandBase`] delegates to after doing its own part of each step.
///
/// Every method defaults to doing nothing, so an implementation only overrides the steps it
/// cares about. See [`CommandBase`] for exactly when each one is called.
pub trait Handler {
    /// Register flags and anything else the command needs before parsing.
    fn init(&mut self, _cd: &mut Commandeer) -> commander::Result<()> {
        Ok(())
    }

    /// Read parsed (and bound) flag values and set up state for `run`.
    fn pre_run(&mut self, _this: &mut Commandeer, _runner: &Invocation) -> commander::Result<()> {
        Ok(())
    }

    fn run(&mut self, _cd: &Commandeer, _args: &[String]) -> commander::Result<()> {
        Ok(())
    }
}

/// A handler that does nothing, for commands that only group sub-commands or are deprecated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

impl Handler for Noop {}

/// A ready-made [`Commander`].
///
/// - `init` copies the short/long descriptions and deprecation reason onto the command, then
///   calls [`Handler::init`].
/// - `pre_run` binds environment variables and the config file to the command's flags when
///   [`crate::with_env`] was given, then calls [`Handler::pre_run`]. A binding failure stops
///   there and is returned as is.
/// - `run` calls [`Handler::run`].
pub struct CommandBase<H = Noop> {
    name: String,
    short: String,
    settings: Settings,
    sub_commands: Vec<Box<dyn Commander>>,
    handler: H,
}

impl CommandBase<Noop> {
    /// Creates a command with a name, a short description and any number of options.
    pub fn new<I>(name: &str, short: &str, opts: I) -> Self
    where
        I: IntoIterator<Item = CommandOption>,
    {
        let mut settings = Settings::default();
        for o in opts {
            o.apply(&mut settings);
        }

        Self {
            name: name.to_string(),
            short: short.to_string(),
            settings,
            sub_commands: Vec::new(),
            handler: Noop,
        }
    }
}

impl<H> CommandBase<H> {
    /// Replaces the handler, keeping everything else.
    pub fn with_handler<T: Handler>(self, handler: T) -> CommandBase<T> {
        CommandBase {
            name: self.name,
            short: self.short,
            settings: self.settings,
            sub_commands: self.sub_commands,
            handler,
        }
    }

    pub fn sub_command<C: Commander + 'static>(mut self, command: C) -> Self {
        self.sub_commands.push(Box::new(command));
        self
    }

    pub fn push_command(&mut self, command: Box<dyn Commander>) {
        self.sub_commands.push(command);
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn short(&self) -> &str {
        &self.short
    }

    pub fn long(&self) -> &str {
        &self.settings.long
    }

    pub fn deprecated(&self) -> &str {
        &self.settings.deprecated
    }

    pub fn binding_enabled(&self) -> bool {
        self.settings.binding
    }

    pub fn env_prefix(&self) -> &str {
        &self.settings.env_prefix
    }

    pub fn key_replacer(&self) -> Option<&KeyReplacer> {
        self.settings.key_replacer.as_ref()
    }

    pub fn config(&self) -> Option<&Path> {
        self.settings.config.as_deref()
    }

    pub fn config_optional(&self) -> bool {
        self.settings.config_optional
    }

    /// The binder `pre_run` will use, or `None` when binding is off.
    pub fn binder(&self) -> Option<Binder> {
        if !self.settings.binding {
            return None;
        }

        let binder = Binder::new()
            .env_prefix(&self.settings.env_prefix)
            .key_replacer(self.settings.key_replacer.clone())
            .env_source(self.settings.env_source.clone());
        Some(match &self.settings.config {
            Some(path) if self.settings.config_optional => binder.optional_config(path),
            Some(path) => binder.config(path),
            None => binder,
        })
    }
}

impl<H: Handler> Commander for CommandBase<H> {
    fn name(&self) -> &str {
        &self.name
    }

    fn commands(&self) -> &[Box<dyn Commander>] {
        &self.sub_commands
    }

    fn commands_mut(&mut self) -> &mut [Box<dyn Commander>] {
        &mut self.sub_commands
    }

    fn init(&mut self, cd: &mut Commandeer) -> commander::Result<()> {
        cd.set_short(&self.short);
        cd.set_long(&self.settings.long);
        cd.set_deprecated(&self.settings.deprecated);

        if self.settings.config.is_some() && !self.settings.binding {
            tracing::warn!(
                command = %self.name,
                "config file is ignored unless environment binding is enabled"
            );
        }

        self.handler.init(cd)
    }

    fn pre_run(&mut self, this: &mut Commandeer, runner: &Invocation) -> commander::Result<()> {
        if let Some(binder) = self.binder() {
            binder
                .bind(this.flags_mut())
                .map_err(commander::Error::other)?;
        }

        self.handler.pre_run(this, runner)
    }

    fn run(&mut self, cd: &Commandeer, args: &[String]) -> commander::Result<()> {
        self.handler.run(cd, args)
    }
}

impl<H: fmt::Debug> fmt::Debug for CommandBase<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sub_commands: Vec<&str> = self.sub_commands.iter().map(|c| c.name()).collect();
        f.debug_struct("CommandBase")
            .field("name", &self.name)
            .field("short", &self.short)
            .field("settings", &self.settings)
            .field("sub_commands", &sub_commands)
            .field("handler", &self.handler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::EnvSource;
    use crate::options::{
        deprecated, long, with_config, with_env, with_env_source, with_optional_config,
    };
    use clap::Arg;
    use commander::Exec;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[test]
    fn test_name_is_returned_verbatim() {
        let c = CommandBase::new("example-command", "short", []);
        assert_eq!(c.name(), "example-command");
    }

    #[test]
    fn test_commands_keep_order_without_copying() {
        let c = CommandBase::new("root", "root", [])
            .sub_command(CommandBase::new("b", "b", []))
            .sub_command(CommandBase::new("a", "a", []))
            .sub_command(CommandBase::new("c", "c", []));

        let first = c.commands().as_ptr();
        let names: Vec<&str> = c.commands().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(c.commands().as_ptr(), first);
        assert!(CommandBase::new("leaf", "leaf", []).commands().is_empty());
    }

    #[test]
    fn test_init_copies_display_fields() {
        let mut exec = Exec::new(Box::new(CommandBase::new(
            "old-command",
            "This is an old-command",
            [long("A longer story"), deprecated("this should no longer be used")],
        )))
        .unwrap();
        let cd = exec.tree();
        assert_eq!(cd.short(), "This is an old-command");
        assert_eq!(cd.long(), "A longer story");
        assert_eq!(cd.deprecated(), "this should no longer be used");
        assert!(cd.is_deprecated());
        assert!(exec.execute(Vec::<String>::new()).is_ok());
    }

    #[test]
    fn test_not_deprecated_by_default() {
        let exec = Exec::new(Box::new(CommandBase::new("cmd", "short", []))).unwrap();
        assert_eq!(exec.tree().deprecated(), "");
        assert!(!exec.tree().is_deprecated());
    }

    #[test]
    fn test_binder_reflects_settings() {
        assert!(CommandBase::new("c", "c", []).binder().is_none());
        assert!(CommandBase::new("c", "c", [with_config("x.toml")])
            .binder()
            .is_none());

        let c = CommandBase::new(
            "c",
            "c",
            [
                with_env("cmd", Some(KeyReplacer::new([("-", "_")]))),
                with_optional_config("x.toml"),
            ],
        );
        let binder = c.binder().unwrap();
        assert_eq!(binder.env_key("my-flag"), "CMD_MY_FLAG");
        assert_eq!(binder.config_path(), Some(Path::new("x.toml")));
        assert!(c.config_optional());
    }

    #[test]
    fn test_pre_run_without_binding_ignores_config() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        let mut exec = Exec::new(Box::new(CommandBase::new(
            "cmd",
            "short",
            [with_config(missing)],
        )))
        .unwrap();
        assert!(exec.execute(Vec::<String>::new()).is_ok());
    }

    #[test]
    fn test_pre_run_without_binding_ignores_env() {
        let vars = [("EXAMPLE", "from env"), ("CMD_EXAMPLE", "from env")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let command = CommandBase::new("cmd", "short", [with_env_source(EnvSource::Fixed(vars))])
            .with_handler(Defaulted);
        let mut exec = Exec::new(Box::new(command)).unwrap();

        let cd = exec.execute(Vec::<String>::new()).unwrap().unwrap();
        assert_eq!(cd.flags().value("example"), Some("dflt"));
        assert_eq!(cd.flags().source("example"), Some(commander::FlagSource::Default));
    }

    #[test]
    fn test_pre_run_with_binding_reads_injected_env() {
        let vars = [("CMD_EXAMPLE".to_string(), "from env".to_string())]
            .into_iter()
            .collect();
        let command = CommandBase::new(
            "cmd",
            "short",
            [with_env("cmd", None), with_env_source(EnvSource::Fixed(vars))],
        )
        .with_handler(Defaulted);
        let mut exec = Exec::new(Box::new(command)).unwrap();

        let cd = exec.execute(Vec::<String>::new()).unwrap().unwrap();
        assert_eq!(cd.flags().value("example"), Some("from env"));
        assert_eq!(
            cd.flags().source("example"),
            Some(commander::FlagSource::Environment)
        );
    }

    /// Registers `--example` with a default and nothing else.
    struct Defaulted;

    impl Handler for Defaulted {
        fn init(&mut self, cd: &mut Commandeer) -> commander::Result<()> {
            cd.update(|cmd| cmd.arg(Arg::new("example").long("example").default_value("dflt")));
            Ok(())
        }
    }

    #[test]
    fn test_pre_run_required_config_missing_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        let mut exec = Exec::new(Box::new(CommandBase::new(
            "cmd",
            "short",
            [with_env("simplecommand_test_required", None), with_config(&missing)],
        )))
        .unwrap();

        let err = exec.execute(Vec::<String>::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::BindError>(),
            Some(crate::BindError::ConfigNotFound(p)) if *p == missing
        ));
    }

    #[test]
    fn test_pre_run_optional_config_missing_succeeds() {
        let dir = TempDir::new().unwrap();
        let mut exec = Exec::new(Box::new(CommandBase::new(
            "cmd",
            "short",
            [
                with_env("simplecommand_test_optional", None),
                with_optional_config(dir.path().join("missing.toml")),
            ],
        )))
        .unwrap();
        assert!(exec.execute(Vec::<String>::new()).is_ok());
    }

    type Seen = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        seen: Seen,
    }

    impl Handler for Recorder {
        fn init(&mut self, cd: &mut Commandeer) -> commander::Result<()> {
            self.seen
                .borrow_mut()
                .push(format!("init short={}", cd.short()));
            cd.update(|cmd| cmd.arg(Arg::new("example").long("example")));
            Ok(())
        }

        fn pre_run(&mut self, this: &mut Commandeer, _runner: &Invocation) -> commander::Result<()> {
            self.seen.borrow_mut().push(format!(
                "pre_run example={}",
                this.flags().value("example").unwrap_or("-")
            ));
            Ok(())
        }

        fn run(&mut self, _cd: &Commandeer, args: &[String]) -> commander::Result<()> {
            self.seen
                .borrow_mut()
                .push(format!("run args={}", args.join(" ")));
            Ok(())
        }
    }

    #[test]
    fn test_default_step_runs_before_handler() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"example": "from file"}"#).unwrap();

        let seen = Seen::default();
        let command = CommandBase::new(
            "cmd",
            "short text",
            [with_env("simplecommand_test_order", None), with_config(&path)],
        )
        .with_handler(Recorder { seen: seen.clone() });

        let mut exec = Exec::new(Box::new(command)).unwrap();
        exec.execute(["one", "two"]).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                "init short=short text",
                "pre_run example=from file",
                "run args=one two",
            ]
        );
    }

    struct Failing;

    impl Handler for Failing {
        fn run(&mut self, _cd: &Commandeer, _args: &[String]) -> commander::Result<()> {
            Err(commander::Error::other("handler said no"))
        }
    }

    #[test]
    fn test_handler_error_is_unchanged() {
        let command = CommandBase::new("cmd", "short", []).with_handler(Failing);
        let mut exec = Exec::new(Box::new(command)).unwrap();
        let err = exec.execute(Vec::<String>::new()).unwrap_err();
        assert_eq!(err.to_string(), "handler said no");
    }

    #[test]
    fn test_debug_lists_sub_command_names() {
        let c = CommandBase::new("root", "root", []).sub_command(CommandBase::new("child", "c", []));
        let text = format!("{c:?}");
        assert!(text.contains("\"child\""));
    }
}
