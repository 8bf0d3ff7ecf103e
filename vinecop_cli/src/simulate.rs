use crate::helpers;
use crate::{GlobalConfiguration, Subcommand};
use anyhow::Result;
use clap::{Parser, ValueHint};
use std::path::PathBuf;
use std::process::ExitCode;

/// Draws pseudo-random or quasi-random observations from a fitted vine
/// copula via the inverse Rosenblatt transform.
#[derive(Parser)]
pub struct Opts {
    /// Path to a fitted model, as written by `vinecop fit`.
    #[arg(value_hint = ValueHint::FilePath)]
    model: PathBuf,
    /// Number of rows to simulate.
    #[arg(short = 'n', long, default_value = "1000")]
    n: usize,
    /// Seed for the pseudo-random generator (ignored with `--qrng`).
    #[arg(long, value_name = "S")]
    seed: Option<u64>,
    /// Draw from a scrambled Halton sequence instead of pseudo-random
    /// uniforms.
    #[arg(long)]
    qrng: bool,
    /// Path of the simulated data, written as CSV.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

impl Subcommand for Opts {
    fn run(&self, cfg: &GlobalConfiguration) -> Result<ExitCode> {
        let vine = helpers::read_model(&self.model)?;
        let data = vine.simulate(self.n, self.qrng, cfg.threads, self.seed, None)?;
        helpers::write_matrix(&self.output, &data)?;

        Ok(ExitCode::SUCCESS)
    }
}
