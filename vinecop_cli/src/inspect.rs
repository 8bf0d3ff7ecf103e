use crate::helpers;
use crate::{GlobalConfiguration, Subcommand};
use anyhow::Result;
use clap::{Parser, ValueHint};
use prettytable::{cell, row};
use std::path::PathBuf;
use std::process::ExitCode;

/// Prints a table of every pair-copula in a fitted vine (tree, edge, family,
/// rotation, parameters, Kendall's tau).
#[derive(Parser)]
pub struct Opts {
    /// Path to a fitted model, as written by `vinecop fit`.
    #[arg(value_hint = ValueHint::FilePath)]
    model: PathBuf,
}

impl Subcommand for Opts {
    fn run(&self, _cfg: &GlobalConfiguration) -> Result<ExitCode> {
        let vine = helpers::read_model(&self.model)?;

        let mut table = helpers::create_table();
        table.set_titles(row![c => "tree", "edge", "family", "rotation", "parameters", "tau"]);

        for (tree, row) in vine.get_all_pair_copulas().iter().enumerate() {
            for (edge, bicop) in row.iter().enumerate() {
                table.add_row(row![r =>
                    &format!("{tree}"),
                    &format!("{edge}"),
                    &bicop.family().to_string(),
                    &format!("{}", bicop.rotation()),
                    &format!("{:?}", bicop.parameters()),
                    &format!("{:.4}", bicop.parameters_to_tau()),
                ]);
            }
        }

        table.printstd();

        Ok(ExitCode::SUCCESS)
    }
}
