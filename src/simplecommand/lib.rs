//! # Simplecommand
//!
//! A ready-made building block for [`commander`] command trees. Instead of implementing all of
//! [`Commander`] by hand, a command is a [`CommandBase`] built from a name, a short description
//! and a list of options, plus an optional [`Handler`] that supplies the behavior.
//!
//! ## Building a Command
//!
//! ```text
//! CommandBase::new(name, short, [options...])
//!     .with_handler(handler)            init / pre_run / run, each optional
//!     .sub_command(child)               any number, kept in order
//! ```
//!
//! | Option | Effect |
//! |--------|--------|
//! | [`long`] | Long description shown by `--help` |
//! | [`deprecated`] | Hide the command and print a notice when it runs |
//! | [`with_env`] | Bind `PREFIX_FLAG` environment variables to the command's flags |
//! | [`with_config`] | Also bind keys from a config file that must exist |
//! | [`with_optional_config`] | Same, but a missing file is fine |
//! | [`with_env_source`] | Read variables from a fixed map instead of the process |
//!
//! ## What CommandBase Does For You
//!
//! - `init` copies the short/long/deprecated text onto the clap command, then calls the handler.
//! - `pre_run` binds environment variables and the config file (when [`with_env`] was given),
//!   then calls the handler. Flags typed on the command line always win.
//! - `run` calls the handler.
//!
//! Binding precedence and key naming are described in [`binder`]; supported file formats in
//! [`config`].
//!
//! ## Example
//!
//! ```rust
//! use clap::Arg;
//! use simplecommand::{with_env, CommandBase, Commandeer, Exec, Handler, KeyReplacer};
//!
//! struct Greet;
//!
//! impl Handler for Greet {
//!     fn init(&mut self, cd: &mut Commandeer) -> commander::Result<()> {
//!         cd.update(|cmd| cmd.arg(Arg::new("name").long("name").default_value("world")));
//!         Ok(())
//!     }
//!
//!     fn run(&mut self, cd: &Commandeer, _args: &[String]) -> commander::Result<()> {
//!         println!("hello {}", cd.flags().value("name").unwrap_or_default());
//!         Ok(())
//!     }
//! }
//!
//! let root = CommandBase::new(
//!     "greet",
//!     "Say hello",
//!     [with_env("greet", Some(KeyReplacer::new([("-", "_")])))],
//! )
//! .with_handler(Greet);
//!
//! let mut exec = Exec::new(Box::new(root)).unwrap();
//! exec.execute(["--name", "rust"]).unwrap();
//! ```

pub mod binder;
mod command;
pub mod config;
pub mod error;
pub mod options;
mod replacer;

pub use binder::{Binder, EnvSource};
pub use command::{CommandBase, Handler, Noop};
pub use error::BindError;
pub use options::{
    deprecated, long, with_config, with_env, with_env_source, with_optional_config, CommandOption,
    Settings,
};
pub use replacer::KeyReplacer;

pub use commander::{Commandeer, Commander, Exec, FlagSource, Invocation};
