use std::io;
use std::io::IsTerminal;
use std::io::Write;
use std::path::Path;

use anyhow::{Result, bail};

use cablecalc_catalog::{
    CalculationInputs, CatalogSources, Conversion, Session, TargetStatus, Tolerance, WriteOutcome,
    calculate,
};
use cablecalc_config::AppConfig;

use crate::CliConversion;

pub(crate) fn run_calc(
    session: &Session,
    first: &str,
    second: &str,
    length: f64,
    tolerance: Tolerance,
) -> Result<()> {
    let inputs = CalculationInputs {
        first: first.to_string(),
        second: second.to_string(),
        cable_length: length,
        tolerance,
    };
    let result = calculate(session.catalog(), &inputs)?;

    println!("connector 1: {first} ({} mm)", result.first_size);
    println!("connector 2: {second} ({} mm)", result.second_size);
    match tolerance {
        Tolerance::Millimeters(mm) => println!("tolerance:   {mm} mm"),
        Tolerance::Percent(percent) => {
            println!("tolerance:   {percent}% ({:.2} mm)", result.tolerance_mm)
        }
    }
    println!("final cable length: {:.2} mm", result.final_length);
    Ok(())
}

pub(crate) fn run_list(session: &Session) {
    let catalog = session.catalog();
    println!(
        "── connectors ({} from {}) ─────────────────────────",
        catalog.len(),
        session.origin()
    );
    let width = catalog.names().iter().map(|n| n.chars().count()).max().unwrap_or(0);
    for (name, size) in catalog.iter() {
        println!("  {name:<width$}  {size:>8.2} mm");
    }

    if let Some(stats) = catalog.stats() {
        println!();
        println!("  total:    {}", stats.count);
        println!("  average:  {:.1} mm", stats.mean_size);
        println!("  largest:  {:.1} mm", stats.max_size);
    }
}

pub(crate) fn run_add(
    session: &mut Session,
    sources: &CatalogSources,
    name: &str,
    size: f64,
) -> Result<()> {
    let outcome = session.insert(sources, name, size)?;
    print_outcome(&format!("added '{}'", cablecalc_catalog::normalize_name(name)), &outcome);
    Ok(())
}

pub(crate) fn run_edit(
    session: &mut Session,
    sources: &CatalogSources,
    name: &str,
    rename: Option<&str>,
    size: Option<f64>,
) -> Result<()> {
    match (rename, size) {
        (None, None) => bail!("nothing to change: pass --rename and/or --size"),
        (Some(new_name), size) => {
            let Some(current) = session.catalog().size_of(name) else {
                bail!("connector '{}' not found", name.trim());
            };
            let outcome = session.rename(sources, name, new_name, size.unwrap_or(current))?;
            print_outcome(
                &format!(
                    "renamed '{}' to '{}'",
                    name.trim(),
                    cablecalc_catalog::normalize_name(new_name)
                ),
                &outcome,
            );
        }
        (None, Some(size)) => {
            let outcome = session.update_size(sources, name, size)?;
            print_outcome(&format!("updated '{}' to {size} mm", name.trim()), &outcome);
        }
    }
    Ok(())
}

pub(crate) fn run_delete(
    session: &mut Session,
    sources: &CatalogSources,
    name: &str,
    yes: bool,
) -> Result<()> {
    let Some(key) = session.catalog().find(name).map(str::to_string) else {
        bail!("connector '{}' not found", name.trim());
    };

    if !yes {
        if !io::stdin().is_terminal() {
            bail!("refusing to delete in non-interactive mode without --yes");
        }

        print!("Delete connector '{key}' from every catalog store? Type 'DELETE' to continue: ");
        io::stdout().flush()?;
        let mut confirmation = String::new();
        io::stdin().read_line(&mut confirmation)?;
        if confirmation.trim() != "DELETE" {
            println!("delete cancelled");
            return Ok(());
        }
    }

    let outcome = session.delete(sources, &key)?;
    print_outcome(&format!("deleted '{key}'"), &outcome);
    Ok(())
}

pub(crate) fn run_sync(session: &mut Session, sources: &CatalogSources) -> Result<()> {
    let outcome = session.sync(sources)?;
    println!("sync complete: {} connectors", outcome.merged);
    println!("- added from local file: {}", outcome.added_from_local);
    println!("- local values replaced by remote: {}", outcome.overridden_local);
    print_targets(&outcome.write);
    Ok(())
}

pub(crate) fn run_status(config: &AppConfig, config_path: &Path, sources: &CatalogSources) {
    println!("cablecalc status");
    println!(
        "- config: {}{}",
        config_path.display(),
        if config_path.exists() { "" } else { " (not found, using defaults)" }
    );

    let local = &sources.local;
    if local.exists() {
        println!(
            "- local file: {} ({} connectors)",
            local.path().display(),
            local.load().len()
        );
    } else {
        println!("- local file: {} (missing)", local.path().display());
    }

    match sources.remote() {
        None if !config.remote.enabled => println!("- remote: disabled for this deployment"),
        None => println!("- remote: not configured (set remote.spreadsheet_id)"),
        Some(remote) => {
            println!("- remote: {}", remote.describe());
            println!(
                "- remote writes: {}",
                if config.remote_writable() { "enabled" } else { "read-only (no access token)" }
            );
            match remote.probe() {
                Ok(catalog) if catalog.is_empty() => println!("- remote catalog: reachable but empty"),
                Ok(catalog) => println!("- remote catalog: {} connectors", catalog.len()),
                Err(err) => println!("- remote catalog: unavailable ({err})"),
            }
        }
    }

    let resolved = sources.resolve();
    println!(
        "- active catalog: {} ({} connectors)",
        resolved.origin,
        resolved.catalog.len()
    );
}

pub(crate) fn run_convert(kind: CliConversion, value: f64) {
    let conversion = match kind {
        CliConversion::MToMm => Conversion::MetersToMillimeters,
        CliConversion::MToCm => Conversion::MetersToCentimeters,
        CliConversion::CmToMm => Conversion::CentimetersToMillimeters,
    };
    println!("{:.1} {}", conversion.apply(value), conversion.target_unit());
}

fn print_outcome(action: &str, outcome: &WriteOutcome) {
    if outcome.persisted_anywhere() {
        println!("{action}");
    } else {
        println!("{action} (session only, no store accepted the change)");
    }
    print_targets(outcome);
}

fn print_targets(outcome: &WriteOutcome) {
    println!("- remote: {}", target_label(&outcome.remote));
    println!("- local:  {}", target_label(&outcome.local));
}

fn target_label(status: &TargetStatus) -> String {
    match status {
        TargetStatus::Written => "saved".to_string(),
        TargetStatus::Disabled => "disabled".to_string(),
        TargetStatus::Denied(reason) => format!("denied ({reason})"),
        TargetStatus::Failed(reason) => format!("failed ({reason})"),
    }
}
