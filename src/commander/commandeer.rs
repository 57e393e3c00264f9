use clap::ArgMatches;

use crate::flags::FlagSet;

/// The per-node state the runner hands to a [`crate::Commander`].
///
/// During `init` the node describes itself by editing its `clap::Command`. Once arguments have
/// been parsed, every node on the invoked path also carries its `ArgMatches` and [`FlagSet`].
#[derive(Debug, Clone)]
pub struct Commandeer {
    path: Vec<String>,
    command: clap::Command,
    deprecated: String,
    pub(crate) children: Vec<Commandeer>,
    matches: Option<ArgMatches>,
    flags: FlagSet,
}

impl Commandeer {
    pub(crate) fn new(path: Vec<String>) -> Self {
        let name = path.last().cloned().unwrap_or_default();
        Self {
            path,
            command: clap::Command::new(name),
            deprecated: String::new(),
            children: Vec::new(),
            matches: None,
            flags: FlagSet::default(),
        }
    }

    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    /// Names from the root command down to this one.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn command(&self) -> &clap::Command {
        &self.command
    }

    /// Edits the underlying clap command, typically to register flags.
    ///
    /// ```rust,ignore
    /// cd.update(|cmd| cmd.arg(Arg::new("example").long("example")));
    /// ```
    pub fn update<F>(&mut self, f: F)
    where
        F: FnOnce(clap::Command) -> clap::Command,
    {
        let command = std::mem::take(&mut self.command);
        self.command = f(command);
    }

    /// An empty description clears the field.
    pub fn set_short(&mut self, short: &str) {
        let short = short.to_string();
        self.update(|cmd| {
            if short.is_empty() {
                cmd.about(None::<&'static str>)
            } else {
                cmd.about(short)
            }
        });
    }

    /// An empty description clears the field, so `--help` falls back to the short one.
    pub fn set_long(&mut self, long: &str) {
        let long = long.to_string();
        self.update(|cmd| {
            if long.is_empty() {
                cmd.long_about(None::<&'static str>)
            } else {
                cmd.long_about(long)
            }
        });
    }

    /// An empty reason clears the deprecation.
    pub fn set_deprecated(&mut self, reason: &str) {
        self.deprecated = reason.to_string();
    }

    pub fn short(&self) -> String {
        self.command
            .get_about()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn long(&self) -> String {
        self.command
            .get_long_about()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn deprecated(&self) -> &str {
        &self.deprecated
    }

    pub fn is_deprecated(&self) -> bool {
        !self.deprecated.is_empty()
    }

    pub fn children(&self) -> &[Commandeer] {
        &self.children
    }

    /// Present only while this node is on the path of the last execution.
    pub fn matches(&self) -> Option<&ArgMatches> {
        self.matches.as_ref()
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut FlagSet {
        &mut self.flags
    }

    pub(crate) fn attach(&mut self, matches: ArgMatches) {
        self.flags = FlagSet::from_matches(&self.command, &matches);
        self.matches = Some(matches);
    }

    pub(crate) fn detach(&mut self) {
        self.matches = None;
        self.flags = FlagSet::default();
        for child in &mut self.children {
            child.detach();
        }
    }
}

/// Describes the command that is about to run, handed to every `pre_run` on its path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    path: Vec<String>,
    args: Vec<String>,
}

impl Invocation {
    pub fn new(path: Vec<String>, args: Vec<String>) -> Self {
        Self { path, args }
    }

    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Positional arguments left over for the command's `run`.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// True when `cd` is the command that will run.
    pub fn is(&self, cd: &Commandeer) -> bool {
        self.path == cd.path
    }
}
