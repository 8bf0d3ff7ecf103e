#![allow(clippy::missing_errors_doc)]
#![allow(missing_docs)]

mod fit;
mod helpers;
mod inspect;
mod simulate;

use anyhow::Result;
use clap::Parser;
use enum_dispatch::enum_dispatch;
use std::process::ExitCode;

/// Flags shared by every subcommand.
#[derive(Parser)]
pub struct GlobalConfiguration {
    /// Number of threads to use where the operation can be parallelized.
    #[arg(default_value = "1", long, value_name = "N")]
    pub threads: usize,
}

#[enum_dispatch]
pub trait Subcommand {
    fn run(&self, cfg: &GlobalConfiguration) -> Result<ExitCode>;
}

#[enum_dispatch(Subcommand)]
#[derive(Parser)]
pub enum SubcommandEnum {
    Fit(fit::Opts),
    Inspect(inspect::Opts),
    Simulate(simulate::Opts),
}

#[derive(Parser)]
#[command(
    arg_required_else_help = true,
    author,
    about,
    disable_help_subcommand = true,
    name = "vinecop",
    version
)]
pub struct Opts {
    #[command(flatten)]
    pub configuration: GlobalConfiguration,
    #[command(subcommand)]
    pub subcommand: SubcommandEnum,
}
