use self::args::{ToolArgs, ToolSubcommand};
use clap::Parser;
use miette::{IntoDiagnostic, WrapErr};
use std::{env, io};
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    layer::SubscriberExt,
    Layer, Registry,
};

mod args;
mod parse_input;
mod verdict;
mod verify;

fn initialise_logging() -> miette::Result<()> {
    let targets = env::var("RUST_LOG")
        .ok()
        .and_then(|targets| targets.parse().ok())
        .unwrap_or_else(|| Targets::default().with_default(LevelFilter::WARN));

    let subscriber = Registry::default().with(
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_filter(targets),
    );

    tracing::subscriber::set_global_default(subscriber)
        .into_diagnostic()
        .wrap_err("Couldn't install the global tracing subscriber")
}

fn main() -> miette::Result<()> {
    initialise_logging()?;

    let args = ToolArgs::parse();
    match args.subcommand {
        ToolSubcommand::ParseInput(args) => parse_input::do_it(&args.header),
        ToolSubcommand::Verify(args) => verify::do_it(&args),
    }
}
