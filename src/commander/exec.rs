use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches};
use std::collections::HashSet;
use std::ffi::OsString;
use std::io::Write;

use crate::commandeer::{Commandeer, Invocation};
use crate::error::{Error, Result};
use crate::Commander;

/// Id of the hidden positional that collects a leaf command's leftover arguments.
const ARGS_ID: &str = "__args";

/// Owns a command tree and runs it against argument lists.
pub struct Exec {
    root: Box<dyn Commander>,
    tree: Commandeer,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl Exec {
    /// Calls `init` on every command in the tree, parents before their sub-commands.
    pub fn new(mut root: Box<dyn Commander>) -> Result<Self> {
        let tree = build(root.as_mut(), &[])?;
        Ok(Self {
            root,
            tree,
            out: Box::new(std::io::stdout()),
            err: Box::new(std::io::stderr()),
        })
    }

    /// Sends help/version text to `out` and deprecation notices to `err`.
    pub fn with_output<O, E>(mut self, out: O, err: E) -> Self
    where
        O: Write + 'static,
        E: Write + 'static,
    {
        self.out = Box::new(out);
        self.err = Box::new(err);
        self
    }

    pub fn root(&self) -> &dyn Commander {
        self.root.as_ref()
    }

    pub fn tree(&self) -> &Commandeer {
        &self.tree
    }

    /// The complete clap command, including every sub-command.
    pub fn command(&self) -> clap::Command {
        assemble(&self.tree)
            .no_binary_name(true)
            .bin_name(self.tree.name().to_string())
    }

    /// Parses `args` (without the program name) and runs the selected command.
    ///
    /// Returns the invoked command's [`Commandeer`], or `None` when clap displayed help or
    /// version text instead of running anything.
    pub fn execute<I, T>(&mut self, args: I) -> Result<Option<&Commandeer>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.tree.detach();

        let matches = match self.command().try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::DisplayHelp
                        | ErrorKind::DisplayVersion
                        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) =>
            {
                write!(self.out, "{}", e.render())?;
                self.out.flush()?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let (indexes, chain) = resolve(&self.tree, matches);
        let leaf_matches = chain.last().cloned().unwrap_or_default();
        for (depth, matches) in chain.into_iter().enumerate() {
            node_at(&mut self.tree, &indexes[..depth]).attach(matches);
        }

        let leaf = node_at(&mut self.tree, &indexes);
        let args = leftover_args(leaf, &leaf_matches);
        let invocation = Invocation::new(leaf.path().to_vec(), args);

        if leaf.is_deprecated() {
            writeln!(
                self.err,
                "Command {:?} is deprecated, {}",
                leaf.name(),
                leaf.deprecated()
            )?;
        }

        for depth in 0..=indexes.len() {
            let path = &indexes[..depth];
            let cd = node_at(&mut self.tree, path);
            tracing::debug!(command = %cd.path().join(" "), "pre-run");
            commander_at(&mut self.root, path).pre_run(cd, &invocation)?;
        }

        let missing = missing_required(&self.tree, &indexes);
        if !missing.is_empty() {
            let mut command = self.command();
            return Err(clap::Error::raw(
                ErrorKind::MissingRequiredArgument,
                format!(
                    "the following required arguments were not provided: {}\n",
                    missing.join(", ")
                ),
            )
            .format(&mut command)
            .into());
        }

        tracing::debug!(command = %invocation.path().join(" "), args = ?invocation.args(), "run");
        let leaf = node_at(&mut self.tree, &indexes);
        commander_at(&mut self.root, &indexes).run(leaf, invocation.args())?;

        Ok(Some(&*leaf))
    }
}

fn build(commander: &mut dyn Commander, parent: &[String]) -> Result<Commandeer> {
    let name = commander.name().to_string();
    if name.is_empty() {
        return Err(Error::EmptyName {
            parent: parent.join(" "),
        });
    }

    let mut path = parent.to_vec();
    path.push(name);
    let mut cd = Commandeer::new(path);
    tracing::debug!(command = %cd.path().join(" "), "init");
    commander.init(&mut cd)?;

    let mut seen = HashSet::new();
    for child in commander.commands_mut() {
        let child = build(child.as_mut(), cd.path())?;
        if !seen.insert(child.name().to_string()) {
            return Err(Error::DuplicateCommand {
                parent: cd.path().join(" "),
                name: child.name().to_string(),
            });
        }
        cd.children.push(child);
    }

    Ok(cd)
}

/// Turns a node and its children into one clap command.
///
/// Named flags lose `required` here; they may still be filled in by a `pre_run` and are checked
/// by [`missing_required`] afterwards. A leaf without positionals of its own gets a hidden
/// catch-all positional for its leftover arguments.
fn assemble(cd: &Commandeer) -> clap::Command {
    let mut command = cd
        .command()
        .clone()
        .mut_args(|arg| if arg.is_positional() { arg } else { arg.required(false) });
    let has_positionals = cd.command().get_positionals().next().is_some();
    if cd.children().is_empty() && !has_positionals {
        command = command.arg(
            Arg::new(ARGS_ID)
                .num_args(0..)
                .action(ArgAction::Append)
                .trailing_var_arg(true)
                .hide(true),
        );
    }
    for child in cd.children() {
        command = command.subcommand(assemble(child));
    }
    if cd.is_deprecated() {
        command = command.hide(true);
    }
    command
}

/// The leaf's positional values in declaration order, or the catch-all's when it has none.
fn leftover_args(leaf: &Commandeer, matches: &ArgMatches) -> Vec<String> {
    let mut ids: Vec<String> = leaf
        .command()
        .get_positionals()
        .map(|arg| arg.get_id().to_string())
        .collect();
    if ids.is_empty() {
        ids.push(ARGS_ID.to_string());
    }

    let mut args = Vec::new();
    for id in &ids {
        if let Ok(Some(values)) = matches.try_get_raw(id) {
            args.extend(values.map(|v| v.to_string_lossy().into_owned()));
        }
    }
    args
}

/// Required named flags on the invoked path that still have no value, as `--long` (or id).
fn missing_required(tree: &Commandeer, indexes: &[usize]) -> Vec<String> {
    let mut missing = Vec::new();
    let mut node = tree;
    for depth in 0..=indexes.len() {
        if depth > 0 {
            node = &node.children()[indexes[depth - 1]];
        }
        for arg in node.command().get_arguments() {
            if arg.is_positional() || !arg.is_required_set() {
                continue;
            }
            let id = arg.get_id().as_str();
            if node.flags().values(id).is_empty() {
                missing.push(match arg.get_long() {
                    Some(long) => format!("--{long}"),
                    None => id.to_string(),
                });
            }
        }
    }
    missing
}

/// Follows the parsed sub-commands down the tree, returning child indexes and each level's matches.
fn resolve(tree: &Commandeer, matches: ArgMatches) -> (Vec<usize>, Vec<ArgMatches>) {
    let mut indexes = Vec::new();
    let mut chain = vec![matches];
    let mut node = tree;

    loop {
        let next = chain.last().and_then(|m| m.subcommand()).and_then(|(name, sub)| {
            node.children()
                .iter()
                .position(|c| c.name() == name)
                .map(|i| (i, sub.clone()))
        });
        match next {
            Some((i, sub)) => {
                indexes.push(i);
                chain.push(sub);
                node = &node.children()[i];
            }
            None => break,
        }
    }

    (indexes, chain)
}

fn node_at<'a>(root: &'a mut Commandeer, indexes: &[usize]) -> &'a mut Commandeer {
    let mut node = root;
    for &i in indexes {
        node = &mut node.children[i];
    }
    node
}

fn commander_at<'a>(
    root: &'a mut Box<dyn Commander>,
    indexes: &[usize],
) -> &'a mut Box<dyn Commander> {
    let mut node = root;
    for &i in indexes {
        node = &mut node.commands_mut()[i];
    }
    node
}
