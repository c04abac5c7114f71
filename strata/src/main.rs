mod cli;
mod commands;
mod error;
mod util;

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use cli::{CliOpts, Commands};

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let opts = CliOpts::from_iter(wild::args_os());
    init_logging(opts.verbose);

    let verbose = opts.verbose;
    match opts.cmd {
        Commands::List(args) => commands::list(args, verbose)?,
        Commands::Log(args) => commands::log(args)?,
        Commands::Cat(args) => commands::cat(args)?,
        Commands::Add(args) => commands::add(args, verbose)?,
        Commands::Remove(args) => commands::remove(args, verbose)?,
        Commands::Extract(args) => commands::extract(args, verbose)?,
        Commands::Check(args) => commands::check(args, verbose)?,
    };

    Ok(())
}
