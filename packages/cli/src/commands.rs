//! Subcommand implementations and their plain-text renderings.

use std::fmt::Write as _;

use estat_density::{catalog, verify};
use estat_density_config::{DisplaySettings, Settings};
use estat_density_dataset::Dataset;
use estat_density_models::{
    BenchmarkBreach, DensityQuery, DensityReport, IndustrySelection, InspectionReport,
    NationalTotals, RegionSummary,
};
use serde::Serialize;

use crate::{Commands, SelectionArgs};

type CliResult = Result<(), Box<dyn std::error::Error>>;

impl SelectionArgs {
    fn query(&self, display: &DisplaySettings) -> DensityQuery {
        DensityQuery {
            scope: self.scope.clone(),
            industry: self
                .industry
                .as_deref()
                .map_or(IndustrySelection::All, IndustrySelection::from),
            population_floor: display.population_floor,
            limit: display.limit,
            sort_by: display.metric,
            time_period: self.period.clone(),
        }
    }
}

/// Runs `command` against `dataset` and prints its output.
///
/// # Errors
///
/// Returns an error if the query is invalid, output cannot be rendered, or
/// `verify` finds a national total above its ceiling.
pub fn run(command: &Commands, dataset: &Dataset, settings: &Settings) -> CliResult {
    match command {
        Commands::Rank {
            selection,
            population_floor,
            limit,
            sort_by,
            json,
        } => {
            let mut query = selection.query(&settings.display);
            if let Some(floor) = *population_floor {
                query.population_floor = floor;
            }
            if let Some(limit) = *limit {
                query.limit = limit;
            }
            if let Some(metric) = *sort_by {
                query.sort_by = metric;
            }

            let report = estat_density::run(dataset, &query)?;
            if *json {
                print_json(&report)?;
            } else {
                print!("{}", render_report(&report)?);
            }
        }
        Commands::Summary { selection, json } => {
            let report = estat_density::run(dataset, &selection.query(&settings.display))?;
            if *json {
                print_json(&report.summary)?;
            } else {
                print!("{}", render_summary(&report.summary)?);
            }
        }
        Commands::Verify { period, json } => {
            let totals = verify::national_totals(dataset, period.as_deref());
            let breaches = verify::check(&totals, &settings.benchmarks);
            if *json {
                print_json(&serde_json::json!({ "totals": totals, "breaches": breaches }))?;
            } else {
                print!("{}", render_verification(&totals, &breaches)?);
            }
            if !breaches.is_empty() {
                return Err(format!(
                    "{} national total(s) exceed their ceilings",
                    breaches.len()
                )
                .into());
            }
        }
        Commands::Inspect {
            prefix,
            period,
            json,
        } => {
            let report = verify::inspect(dataset, prefix, period.as_deref())?;
            if *json {
                print_json(&report)?;
            } else {
                print!("{}", render_inspection(&report)?);
            }
        }
        Commands::Industries { json } => {
            let industries = catalog::industries(dataset);
            if *json {
                print_json(&industries)?;
            } else {
                for industry in industries {
                    println!("{:<12} {}", industry.code, industry.name);
                }
            }
        }
        Commands::Prefectures { json } => {
            let prefectures = catalog::prefectures(dataset);
            if *json {
                print_json(&prefectures)?;
            } else {
                for prefecture in prefectures {
                    println!("{}  {}", prefecture.code, prefecture.name);
                }
            }
        }
        Commands::Periods { json } => {
            let periods = catalog::periods(dataset);
            if *json {
                print_json(&periods)?;
            } else {
                for period in periods {
                    println!("{period}");
                }
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fmt_density(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

fn fmt_deviation(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:+.1}"))
}

fn fmt_rank(value: Option<u32>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn render_report(report: &DensityReport) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    let query = &report.query;

    writeln!(
        out,
        "Scope {} / industry {} / period {} / sorted by {}",
        query.scope,
        query.industry,
        report.time_period.as_deref().unwrap_or("-"),
        query.sort_by
    )?;
    writeln!(
        out,
        "{:>5} {:>5}  {:<6} {:<20} {:>10} {:>9} {:>10} {:>8} {:>8} {:>8} {:>8}",
        "#est", "#emp", "code", "name", "population", "estab", "employees", "est/10k", "emp/10k",
        "Δest", "Δemp"
    )?;
    for row in &report.rows {
        writeln!(
            out,
            "{:>5} {:>5}  {:<6} {:<20} {:>10} {:>9} {:>10} {:>8} {:>8} {:>8} {:>8}",
            fmt_rank(row.est_rank),
            fmt_rank(row.emp_rank),
            row.area_code,
            row.area_name,
            row.population,
            row.establishments,
            row.employees,
            fmt_density(row.est_density),
            fmt_density(row.emp_density),
            fmt_deviation(row.est_deviation),
            fmt_deviation(row.emp_deviation),
        )?;
    }
    writeln!(
        out,
        "Showing {} of {} units at or above {} residents",
        report.rows.len(),
        report.matching_rows,
        query.population_floor
    )?;
    if !report.warnings.is_empty() {
        writeln!(out, "{} data warning(s); rerun with --json for details", report.warnings.len())?;
    }
    out.push_str(&render_summary(&report.summary)?);

    Ok(out)
}

fn render_summary(summary: &RegionSummary) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "Units:          {}", summary.area_count)?;
    writeln!(out, "Population:     {}", summary.total_population)?;
    writeln!(out, "Establishments: {}", summary.total_establishments)?;
    writeln!(out, "Employees:      {}", summary.total_employees)?;
    writeln!(
        out,
        "Weighted establishments per 10k residents: {}",
        fmt_density(summary.weighted_est_density)
    )?;
    writeln!(
        out,
        "Weighted employees per 10k residents:      {}",
        fmt_density(summary.weighted_emp_density)
    )?;
    Ok(out)
}

fn render_verification(
    totals: &NationalTotals,
    breaches: &[BenchmarkBreach],
) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "National totals for period {}",
        totals.time_period.as_deref().unwrap_or("-")
    )?;
    writeln!(out, "  units:          {}", totals.area_count)?;
    writeln!(out, "  establishments: {}", totals.establishments)?;
    writeln!(out, "  employees:      {}", totals.employees)?;
    writeln!(out, "  population:     {}", totals.population)?;
    if breaches.is_empty() {
        writeln!(out, "All totals within ceilings")?;
    }
    for breach in breaches {
        writeln!(
            out,
            "EXCEEDED {}: {} > {}",
            breach.measure, breach.value, breach.ceiling
        )?;
    }
    Ok(out)
}

fn render_inspection(report: &InspectionReport) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "Codes under '{}' in period {}",
        report.prefix,
        report.time_period.as_deref().unwrap_or("-")
    )?;
    for area in &report.areas {
        writeln!(
            out,
            "  {} {:<24} {:<24} {:>10} {}",
            area.area_code,
            area.area_name,
            area.classification,
            area.population,
            area.owning_city
                .as_ref()
                .map_or_else(String::new, |city| format!("(ward of {city})")),
        )?;
    }
    for city in &report.city_totals {
        writeln!(
            out,
            "City {} {}: {} residents, {} ward(s) summing to {}",
            city.city_code, city.city_name, city.city_population, city.ward_count, city.ward_population
        )?;
    }
    Ok(out)
}
