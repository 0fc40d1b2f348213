use super::args::*;

pub(crate) mod build;
pub(crate) mod check;
pub(crate) mod inspect;
pub(crate) mod list;
pub(crate) mod plan;

use crate::exit_codes::EXIT_SUCCESS;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let config = cli.config.as_deref();
    match cli.cmd {
        Command::Build(args) => build::run(config, args),
        Command::Check(args) => check::run(config, args),
        Command::List(args) => list::run(config, args),
        Command::Inspect(args) => inspect::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(EXIT_SUCCESS)
        }
    }
}
