#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for reconciled density rankings.
//!
//! Loads the joined census file once (behind a spinner routed through
//! [`estat_density_cli_utils::init_logger`]) and answers one subcommand:
//! ranked tables, scope summaries, national plausibility checks, code
//! classification listings, and the selector catalogs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use estat_density_config::Settings;
use estat_density_models::{Metric, Scope};

mod commands;

/// Rank Japanese municipalities by business density.
#[derive(Debug, Parser)]
#[command(name = "estat_density_cli")]
#[command(about = "Rank Japanese municipalities by establishments and employees per 10,000 residents")]
struct Cli {
    /// Settings file. Defaults to `$ESTAT_DENSITY_CONFIG`, then
    /// `estat_density.toml` in the working directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Joined census file (`.parquet` or `.csv`), overriding the
    /// configured path.
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Scope, industry, and period shared by the report subcommands.
#[derive(Debug, Args)]
struct SelectionArgs {
    /// `00` for the whole nation, or a prefecture code or name.
    #[arg(long, default_value = Scope::NATION_CODE)]
    scope: Scope,

    /// Industry code. All industries combined when omitted.
    #[arg(long)]
    industry: Option<String>,

    /// Survey period. The latest period when omitted.
    #[arg(long)]
    period: Option<String>,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Rank atomic units by density.
    Rank {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Hide units with fewer residents (ranks are unaffected).
        #[arg(long)]
        population_floor: Option<u64>,

        /// Maximum number of rows shown.
        #[arg(long)]
        limit: Option<usize>,

        /// `est` (establishments) or `emp` (employees).
        #[arg(long, value_parser = parse_metric)]
        sort_by: Option<Metric>,

        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Population-weighted densities of a scope's units at or above the
    /// configured population floor.
    Summary {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check reconciled national totals against plausibility ceilings.
    Verify {
        /// Survey period. The latest period when omitted.
        #[arg(long)]
        period: Option<String>,

        /// Print totals and breaches as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show how every area code under a prefix is classified.
    Inspect {
        /// One to five leading digits of the area code.
        prefix: String,

        /// Survey period. The latest period when omitted.
        #[arg(long)]
        period: Option<String>,

        /// Print the listing as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List selectable industries.
    Industries {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List selectable prefectures.
    Prefectures {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List survey periods in the dataset.
    Periods {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn parse_metric(raw: &str) -> Result<Metric, String> {
    raw.parse()
        .map_err(|_| format!("unknown metric '{raw}': expected est or emp"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let multi = estat_density_cli_utils::init_logger();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(path) = cli.dataset {
        settings.dataset.path = path;
    }

    let path = settings.dataset.path.clone();
    let spinner = estat_density_cli_utils::spinner(&multi, &format!("Loading {}", path.display()));
    let dataset = match estat_density_dataset::load(&path) {
        Ok(dataset) => dataset,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    spinner.finish_and_clear();

    log::debug!("Running {:?}", cli.command);
    commands::run(&cli.command, &dataset, &settings)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_rank_with_globals() {
        let cli = Cli::try_parse_from([
            "estat_density_cli",
            "rank",
            "--scope",
            "14",
            "--industry",
            "E",
            "--population-floor",
            "0",
            "--limit",
            "10",
            "--sort-by",
            "emp",
            "--dataset",
            "data/sample.csv",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.dataset, Some(PathBuf::from("data/sample.csv")));
        let Commands::Rank {
            selection,
            population_floor,
            limit,
            sort_by,
            json,
        } = cli.command
        else {
            panic!("expected rank");
        };
        assert_eq!(selection.scope, Scope::Prefecture("14".to_string()));
        assert_eq!(selection.industry.as_deref(), Some("E"));
        assert_eq!(selection.period, None);
        assert_eq!(population_floor, Some(0));
        assert_eq!(limit, Some(10));
        assert_eq!(sort_by, Some(Metric::EmploymentDensity));
        assert!(json);
    }

    #[test]
    fn scope_defaults_to_nation() {
        let cli = Cli::try_parse_from(["estat_density_cli", "summary"]).unwrap();
        let Commands::Summary { selection, json } = cli.command else {
            panic!("expected summary");
        };
        assert_eq!(selection.scope, Scope::Nation);
        assert!(!json);
    }

    #[test]
    fn rejects_unknown_scope_and_metric() {
        assert!(Cli::try_parse_from(["estat_density_cli", "rank", "--scope", "99"]).is_err());
        assert!(Cli::try_parse_from(["estat_density_cli", "rank", "--sort-by", "sales"]).is_err());
    }

    #[test]
    fn inspect_requires_prefix() {
        assert!(Cli::try_parse_from(["estat_density_cli", "inspect"]).is_err());
        let cli = Cli::try_parse_from(["estat_density_cli", "--config", "x.toml", "inspect", "141"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::Inspect { ref prefix, .. } if prefix == "141"));
    }
}
