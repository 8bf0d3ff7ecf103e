use crate::helpers;
use crate::{GlobalConfiguration, Subcommand};
use anyhow::{Context, Result};
use clap::{Parser, ValueHint};
use std::path::PathBuf;
use std::process::ExitCode;
use vinecop::bicop::{FitControlsBicop, ParametricMethod, SelectionCriterion};
use vinecop::stats::TreeCriterion;
use vinecop::vinecop::FitControlsVinecop;
use vinecop::{BicopFamily, Vinecop};

/// Fits a regular vine copula to pseudo-observations via automatic structure
/// and family selection.
#[derive(Parser)]
pub struct Opts {
    /// Path to a CSV/whitespace-separated file of pseudo-observations (one
    /// row per observation, one column per variable).
    #[arg(value_hint = ValueHint::FilePath)]
    data: PathBuf,
    /// Candidate bivariate copula families, by name (default: all).
    #[arg(long = "family-set", value_delimiter = ',', value_name = "NAME")]
    family_set: Vec<String>,
    /// Family-selection criterion.
    #[arg(long, default_value = "bic", value_parser = ["loglik", "aic", "bic", "mbic"])]
    criterion: String,
    /// Maximum tree depth (default: untruncated).
    #[arg(long, value_name = "N")]
    truncation: Option<usize>,
    /// Path of the fitted model, written as JSON.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

impl Subcommand for Opts {
    fn run(&self, cfg: &GlobalConfiguration) -> Result<ExitCode> {
        let data = helpers::read_matrix(&self.data)?;

        let family_set = if self.family_set.is_empty() {
            BicopFamily::all().to_vec()
        } else {
            self.family_set
                .iter()
                .map(|name| name.parse::<BicopFamily>())
                .collect::<Result<Vec<_>, _>>()
                .context("unknown family in --family-set")?
        };
        let selection_criterion = match self.criterion.as_str() {
            "loglik" => SelectionCriterion::Loglik,
            "aic" => SelectionCriterion::Aic,
            "mbic" => SelectionCriterion::Mbic,
            _ => SelectionCriterion::Bic,
        };
        let bicop_controls =
            FitControlsBicop::new(family_set, ParametricMethod::Mle, 1.0, selection_criterion, true, 0.9, None, cfg.threads)?;
        let controls = FitControlsVinecop::new(
            bicop_controls,
            self.truncation.unwrap_or(usize::MAX),
            TreeCriterion::Tau,
            0.0,
            false,
            false,
            false,
            cfg.threads,
            0.9,
        )?;

        let vine = Vinecop::select_all(data.view(), &controls)?;
        helpers::write_model(&self.output, &vine)?;

        Ok(ExitCode::SUCCESS)
    }
}
