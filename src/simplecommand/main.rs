use clap::Arg;
use colored::*;
use simplecommand::config::user_config_file;
use simplecommand::{
    deprecated, with_env, with_optional_config, CommandBase, CommandOption, Commandeer, Exec,
    Handler, Invocation, KeyReplacer,
};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

const APP_NAME: &str = "example-command";

static VERSION: OnceLock<String> = OnceLock::new();

/// `x.y.z` for tagged release builds, `x.y.z@hash date` for everything else built from git.
fn version() -> &'static str {
    VERSION.get_or_init(|| {
        let pkg = env!("CARGO_PKG_VERSION");
        match (env!("IS_RELEASE"), env!("GIT_HASH")) {
            ("true", _) | (_, "") => pkg.to_string(),
            (_, hash) => format!("{pkg}@{hash} {}", env!("GIT_COMMIT_DATE")),
        }
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        if let commander::Error::Parse(clap_err) = &e {
            clap_err.exit();
        }
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn run() -> commander::Result<()> {
    let mut exec = Exec::new(Box::new(root_command()))?;
    exec.execute(std::env::args_os().skip(1))?;
    Ok(())
}

fn binding() -> Vec<CommandOption> {
    let mut opts = vec![with_env("cmd", Some(KeyReplacer::new([("-", "_")])))];
    if let Some(path) = user_config_file(APP_NAME, "config.toml") {
        opts.push(with_optional_config(path));
    }
    opts
}

fn root_command() -> CommandBase<ExampleHandler> {
    CommandBase::new(APP_NAME, "This is an example command", binding())
        .with_handler(ExampleHandler::root())
        .sub_command(
            CommandBase::new("sub-command", "This is an example sub-command", binding())
                .with_handler(ExampleHandler::default()),
        )
        .sub_command(CommandBase::new(
            "old-command",
            "This is an old command",
            [deprecated("this should no longer be used")],
        ))
}

/// Registers `--example` and reports which command ran with which value.
#[derive(Debug, Default)]
struct ExampleHandler {
    version: Option<&'static str>,
    example: String,
}

impl ExampleHandler {
    fn root() -> Self {
        Self {
            version: Some(version()),
            ..Self::default()
        }
    }
}

impl Handler for ExampleHandler {
    fn init(&mut self, cd: &mut Commandeer) -> commander::Result<()> {
        let version = self.version;
        cd.update(|cmd| {
            let cmd = cmd.arg(
                Arg::new("example")
                    .long("example")
                    .value_name("VALUE")
                    .help("An example flag")
                    .default_value(""),
            );
            match version {
                Some(v) => cmd.version(v),
                None => cmd,
            }
        });
        Ok(())
    }

    fn pre_run(&mut self, this: &mut Commandeer, _runner: &Invocation) -> commander::Result<()> {
        self.example = this.flags().value("example").unwrap_or_default().to_string();
        Ok(())
    }

    fn run(&mut self, cd: &Commandeer, _args: &[String]) -> commander::Result<()> {
        println!(
            "Ran \"{}\" with the example flag set to \"{}\"",
            cd.name(),
            self.example
        );
        Ok(())
    }
}
