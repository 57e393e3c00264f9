//! # Commander - Command Trees on clap
//!
//! A small runner that lets every node of a CLI be its own value implementing one trait,
//! instead of one big derive enum matched in `main`.
//!
//! ## The Contract
//!
//! Each node implements [`Commander`]:
//!
//! - `name`: the word that selects the node on the command line
//! - `commands`: the node's sub-commands, in display order
//! - `init`: describe the node and register its flags on the [`Commandeer`]
//! - `pre_run`: called after parsing, for every node from the root down to the invoked one
//! - `run`: called only on the invoked node, with the leftover positional arguments
//!
//! ## Lifecycle
//!
//! ```text
//! Exec::new(root)         init(root), init(child), init(grandchild) ...   (once)
//! Exec::execute(args)     clap parse
//!                         pre_run(root), pre_run(child) ...               (path only)
//!                         run(invoked)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use commander::{Commandeer, Commander, Exec, Invocation, Result};
//! use clap::Arg;
//!
//! struct Hello {
//!     greeting: String,
//! }
//!
//! impl Commander for Hello {
//!     fn name(&self) -> &str {
//!         "hello"
//!     }
//!
//!     fn init(&mut self, cd: &mut Commandeer) -> Result<()> {
//!         cd.set_short("Say hello");
//!         cd.update(|cmd| cmd.arg(Arg::new("to").long("to").default_value("world")));
//!         Ok(())
//!     }
//!
//!     fn pre_run(&mut self, this: &mut Commandeer, _runner: &Invocation) -> Result<()> {
//!         self.greeting = format!("hello {}", this.flags().value("to").unwrap_or_default());
//!         Ok(())
//!     }
//!
//!     fn run(&mut self, _cd: &Commandeer, _args: &[String]) -> Result<()> {
//!         assert_eq!(self.greeting, "hello rust");
//!         Ok(())
//!     }
//! }
//!
//! let mut exec = Exec::new(Box::new(Hello { greeting: String::new() })).unwrap();
//! exec.execute(["--to", "rust"]).unwrap();
//! ```

mod commandeer;
mod error;
mod exec;
mod flags;

pub use commandeer::{Commandeer, Invocation};
pub use error::{Error, Result};
pub use exec::Exec;
pub use flags::{Flag, FlagKind, FlagSet, FlagSource};

/// A node in a command tree.
pub trait Commander {
    /// The name used to select this command. Must not be empty.
    fn name(&self) -> &str;

    fn commands(&self) -> &[Box<dyn Commander>] {
        &[]
    }

    fn commands_mut(&mut self) -> &mut [Box<dyn Commander>] {
        &mut []
    }

    /// Describes the command and registers its flags. Called once, before any parsing.
    fn init(&mut self, cd: &mut Commandeer) -> Result<()>;

    /// Called after parsing on every command between the root and `runner`, root first.
    fn pre_run(&mut self, this: &mut Commandeer, runner: &Invocation) -> Result<()>;

    /// Does the command's work. Only the invoked command runs.
    fn run(&mut self, cd: &Commandeer, args: &[String]) -> Result<()>;
}
