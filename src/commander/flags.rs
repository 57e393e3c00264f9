//! # Flags
//!
//! A [`FlagSet`] is the parsed view of one node's named arguments. It is built from the node's
//! `clap::Command` and the `ArgMatches` clap produced for it, and remembers where every value came
//! from so later layers (environment, config files) only fill in what the user did not type.
//!
//! Values are kept as strings, exactly as they would appear on the command line. Reading a typed
//! value goes through [`FlagSet::get`], and writing one goes through [`FlagSet::set`], which runs
//! the flag's own clap value parser so a value that would be rejected on the command line is
//! rejected from any other source too.

use clap::builder::{BoolishValueParser, ValueParser};
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Where a flag's current value came from, in increasing order of precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlagSource {
    Unset,
    Default,
    ConfigFile,
    Environment,
    CommandLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// `ArgAction::SetTrue` / `ArgAction::SetFalse`
    Switch,
    /// `ArgAction::Count`
    Count,
    /// A flag holding a single value
    Value,
    /// `ArgAction::Append`
    List,
}

#[derive(Debug, Clone)]
pub struct Flag {
    name: String,
    kind: FlagKind,
    values: Vec<String>,
    source: FlagSource,
}

impl Flag {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FlagKind {
        self.kind
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn source(&self) -> FlagSource {
        self.source
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    command: clap::Command,
    flags: Vec<Flag>,
}

impl FlagSet {
    /// Collects every named argument of `command` from `matches`.
    ///
    /// Positional arguments and the help/version switches clap generates are skipped.
    pub fn from_matches(command: &clap::Command, matches: &ArgMatches) -> Self {
        let flags = command
            .get_arguments()
            .filter(|arg| !arg.is_positional())
            .filter_map(|arg| {
                let kind = kind_of(arg)?;
                let name = arg.get_id().as_str().to_string();
                let values = read_values(matches, &name, kind);
                let source = match matches.value_source(&name) {
                    Some(ValueSource::CommandLine) => FlagSource::CommandLine,
                    Some(ValueSource::EnvVariable) => FlagSource::Environment,
                    Some(ValueSource::DefaultValue) => FlagSource::Default,
                    _ if values.is_empty() => FlagSource::Unset,
                    _ => FlagSource::Default,
                };
                Some(Flag {
                    name,
                    kind,
                    values,
                    source,
                })
            })
            .collect();

        Self {
            command: command.clone(),
            flags,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flag(name).is_some()
    }

    pub fn flag(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.name == name)
    }

    /// The last value of the flag, if it has any.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.flag(name)
            .and_then(|f| f.values.last())
            .map(String::as_str)
    }

    pub fn values(&self, name: &str) -> &[String] {
        self.flag(name).map(|f| f.values.as_slice()).unwrap_or(&[])
    }

    /// Parses the last value of the flag.
    pub fn get<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        if !self.contains(name) {
            return Err(Error::UnknownFlag(name.to_string()));
        }
        self.value(name)
            .map(|v| v.parse::<T>().map_err(Error::other))
            .transpose()
    }

    /// True when a switch is on. Anything that is not a switch set to "true" is off.
    pub fn is_true(&self, name: &str) -> bool {
        self.flag(name)
            .map(|f| f.kind == FlagKind::Switch && f.values.last().is_some_and(|v| v == "true"))
            .unwrap_or(false)
    }

    pub fn source(&self, name: &str) -> Option<FlagSource> {
        self.flag(name).map(|f| f.source)
    }

    /// True when the flag was given on the command line.
    pub fn changed(&self, name: &str) -> bool {
        self.source(name) == Some(FlagSource::CommandLine)
    }

    /// Replaces the flag's values after checking each against the flag's value parser.
    pub fn set<I, S>(&mut self, name: &str, values: I, source: FlagSource) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kind = self
            .flag(name)
            .map(Flag::kind)
            .ok_or_else(|| Error::UnknownFlag(name.to_string()))?;
        let arg = self
            .command
            .get_arguments()
            .find(|a| a.get_id().as_str() == name)
            .ok_or_else(|| Error::UnknownFlag(name.to_string()))?;

        let mut checked = Vec::new();
        for value in values {
            let value = value.into();
            checked.push(validate(arg, kind, &value)?);
        }
        if kind != FlagKind::List && checked.len() > 1 {
            checked.drain(..checked.len() - 1);
        }

        let flag = self
            .flags
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::UnknownFlag(name.to_string()))?;
        tracing::trace!(flag = name, ?source, values = ?checked, "flag set");
        flag.values = checked;
        flag.source = source;
        Ok(())
    }
}

fn kind_of(arg: &Arg) -> Option<FlagKind> {
    match arg.get_action() {
        ArgAction::SetTrue | ArgAction::SetFalse => Some(FlagKind::Switch),
        ArgAction::Count => Some(FlagKind::Count),
        ArgAction::Append => Some(FlagKind::List),
        ArgAction::Set => Some(FlagKind::Value),
        _ => None,
    }
}

fn read_values(matches: &ArgMatches, name: &str, kind: FlagKind) -> Vec<String> {
    match kind {
        FlagKind::Switch => match matches.try_get_one::<bool>(name) {
            Ok(Some(on)) => vec![on.to_string()],
            _ => raw_values(matches, name),
        },
        FlagKind::Count => match matches.try_get_one::<u8>(name) {
            Ok(Some(n)) => vec![n.to_string()],
            _ => Vec::new(),
        },
        FlagKind::Value | FlagKind::List => raw_values(matches, name),
    }
}

fn raw_values(matches: &ArgMatches, name: &str) -> Vec<String> {
    matches
        .try_get_raw(name)
        .ok()
        .flatten()
        .map(|vals| vals.map(|v| v.to_string_lossy().into_owned()).collect())
        .unwrap_or_default()
}

/// Checks `value` the way clap would if it had been typed for `arg`, returning the value to store.
///
/// Switches and counters are normalized to the text clap itself produces ("true", "3").
fn validate(arg: &Arg, kind: FlagKind, value: &str) -> Result<String> {
    let id = arg.get_id().to_string();
    let invalid = |source: clap::Error| Error::InvalidValue {
        flag: id.clone(),
        value: value.to_string(),
        source,
    };

    match kind {
        FlagKind::Switch => parse_alone(&id, BoolishValueParser::new(), value)
            .map(|m| m.get_one::<bool>(&id).copied().unwrap_or_default().to_string())
            .map_err(invalid),
        FlagKind::Count => parse_alone(&id, clap::value_parser!(u8), value)
            .map(|m| m.get_one::<u8>(&id).copied().unwrap_or_default().to_string())
            .map_err(invalid),
        FlagKind::Value | FlagKind::List => {
            parse_alone(&id, arg.get_value_parser().clone(), value)
                .map(|_| value.to_string())
                .map_err(invalid)
        }
    }
}

/// Parses `--id=value` against a one-argument command, so clap builds and owns everything it
/// needs for error messages.
fn parse_alone(
    id: &str,
    parser: impl Into<ValueParser>,
    value: &str,
) -> std::result::Result<ArgMatches, clap::Error> {
    clap::Command::new(id.to_string())
        .no_binary_name(true)
        .arg(
            Arg::new(id.to_string())
                .long(id.to_string())
                .num_args(1)
                .allow_hyphen_values(true)
                .value_parser(parser.into()),
        )
        .try_get_matches_from([format!("--{id}={value}")])
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;

    fn command() -> Command {
        Command::new("test")
            .no_binary_name(true)
            .arg(Arg::new("name").long("name"))
            .arg(
                Arg::new("port")
                    .long("port")
                    .value_parser(clap::value_parser!(u16))
                    .default_value("8080"),
            )
            .arg(Arg::new("verbose").long("verbose").action(ArgAction::SetTrue))
            .arg(Arg::new("tag").long("tag").action(ArgAction::Append))
            .arg(
                Arg::new("level")
                    .long("level")
                    .value_parser(["low", "high"]),
            )
            .arg(Arg::new("v").short('v').action(ArgAction::Count))
            .arg(Arg::new("file"))
    }

    fn parse(args: &[&str]) -> FlagSet {
        let cmd = command();
        let matches = cmd.clone().try_get_matches_from(args).unwrap();
        FlagSet::from_matches(&cmd, &matches)
    }

    #[test]
    fn test_collects_named_args_only() {
        let flags = parse(&[]);
        let names: Vec<_> = flags.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["name", "port", "verbose", "tag", "level", "v"]);
    }

    #[test]
    fn test_sources() {
        let flags = parse(&["--name", "x"]);
        assert_eq!(flags.source("name"), Some(FlagSource::CommandLine));
        assert_eq!(flags.source("port"), Some(FlagSource::Default));
        assert_eq!(flags.source("tag"), Some(FlagSource::Unset));
        assert_eq!(flags.source("missing"), None);
        assert!(flags.changed("name"));
        assert!(!flags.changed("port"));
    }

    #[test]
    fn test_values() {
        let flags = parse(&["--tag", "a", "--tag", "b", "--verbose"]);
        assert_eq!(flags.values("tag"), ["a", "b"]);
        assert_eq!(flags.value("tag"), Some("b"));
        assert_eq!(flags.value("port"), Some("8080"));
        assert_eq!(flags.value("name"), None);
        assert!(flags.is_true("verbose"));
    }

    #[test]
    fn test_switch_defaults_to_false() {
        let flags = parse(&[]);
        assert!(!flags.is_true("verbose"));
        assert_eq!(flags.value("verbose"), Some("false"));
    }

    #[test]
    fn test_get_typed() {
        let flags = parse(&["--port", "9000"]);
        assert_eq!(flags.get::<u16>("port").unwrap(), Some(9000));
        assert_eq!(flags.get::<String>("name").unwrap(), None);
        assert!(matches!(
            flags.get::<u16>("nope"),
            Err(Error::UnknownFlag(_))
        ));
    }

    #[test]
    fn test_set_validates_with_value_parser() {
        let mut flags = parse(&[]);
        flags
            .set("port", ["9090"], FlagSource::Environment)
            .unwrap();
        assert_eq!(flags.value("port"), Some("9090"));
        assert_eq!(flags.source("port"), Some(FlagSource::Environment));

        let err = flags
            .set("port", ["not-a-port"], FlagSource::Environment)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref flag, .. } if flag == "port"));
        assert_eq!(flags.value("port"), Some("9090"));
    }

    #[test]
    fn test_set_possible_values() {
        let mut flags = parse(&[]);
        assert!(flags.set("level", ["high"], FlagSource::ConfigFile).is_ok());
        assert!(flags.set("level", ["medium"], FlagSource::ConfigFile).is_err());
    }

    #[test]
    fn test_set_switch_accepts_boolish() {
        let mut flags = parse(&[]);
        flags.set("verbose", ["yes"], FlagSource::Environment).unwrap();
        assert!(flags.is_true("verbose"));
        assert_eq!(flags.value("verbose"), Some("true"));
        flags.set("verbose", ["0"], FlagSource::Environment).unwrap();
        assert!(!flags.is_true("verbose"));
        assert!(flags
            .set("verbose", ["maybe"], FlagSource::Environment)
            .is_err());
    }

    #[test]
    fn test_set_rejected_switch_is_an_error() {
        let mut flags = parse(&["--verbose"]);
        let err = flags
            .set("verbose", ["maybe"], FlagSource::ConfigFile)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidValue { ref flag, ref value, .. } if flag == "verbose" && value == "maybe"
        ));
        assert!(flags.is_true("verbose"));
    }

    #[test]
    fn test_set_count() {
        let mut flags = parse(&["-vv"]);
        assert_eq!(flags.value("v"), Some("2"));
        flags.set("v", ["3"], FlagSource::Environment).unwrap();
        assert_eq!(flags.get::<u8>("v").unwrap(), Some(3));
        assert!(matches!(
            flags.set("v", ["lots"], FlagSource::Environment),
            Err(Error::InvalidValue { .. })
        ));
        assert_eq!(flags.value("v"), Some("3"));
    }

    #[test]
    fn test_set_single_value_keeps_last() {
        let mut flags = parse(&[]);
        flags
            .set("name", ["a", "b"], FlagSource::ConfigFile)
            .unwrap();
        assert_eq!(flags.values("name"), ["b"]);
    }

    #[test]
    fn test_set_list_keeps_all() {
        let mut flags = parse(&[]);
        flags
            .set("tag", ["a", "b"], FlagSource::ConfigFile)
            .unwrap();
        assert_eq!(flags.values("tag"), ["a", "b"]);
    }

    #[test]
    fn test_set_hyphen_value() {
        let mut flags = parse(&[]);
        flags.set("name", ["-x"], FlagSource::ConfigFile).unwrap();
        assert_eq!(flags.value("name"), Some("-x"));
    }

    #[test]
    fn test_set_unknown_flag() {
        let mut flags = parse(&[]);
        assert!(matches!(
            flags.set("file", ["x"], FlagSource::ConfigFile),
            Err(Error::UnknownFlag(_))
        ));
    }
}
