mod cli;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use reclaim::categories::all_category_names;
use reclaim::utils::display_path;
use reclaim::{
    default_scanners, summarize, Category, CleanupItem, Language, Locations, RiskLevel,
    SafetyManager, ScanEngine, ScanResult,
};

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            output::print_warning(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, filtered by RUST_LOG (default: warnings only).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn parse_categories(names: &[String]) -> Option<Option<Vec<Category>>> {
    if names.is_empty() {
        return Some(None);
    }
    let mut categories = Vec::new();
    for name in names {
        match Category::from_name(name) {
            Some(c) => categories.push(c),
            None => {
                output::print_warning(&format!(
                    "Unknown category '{name}'. Valid: {}",
                    all_category_names().join(", ")
                ));
                return None;
            }
        }
    }
    Some(Some(categories))
}

fn run(cli: Cli) -> reclaim::Result<ExitCode> {
    let lang = if cli.zh { Language::Chinese } else { Language::English };
    let locations = Locations::detect()?;
    let engine = ScanEngine::new();
    engine.register_all(default_scanners(&locations));

    match cli.command {
        Command::Scan { category, json } => {
            let Some(categories) = parse_categories(&category) else {
                return Ok(ExitCode::FAILURE);
            };
            let result = engine.scan(categories.as_deref())?;
            if json {
                println!("{}", result.to_json()?);
            } else {
                output::print_banner();
                print_report(&result, &locations, lang);
                output::print_dry_run_footer();
            }
        }
        Command::Clean {
            confirm,
            category,
            include_caution,
            snapshot,
        } => {
            let Some(categories) = parse_categories(&category) else {
                return Ok(ExitCode::FAILURE);
            };
            output::print_banner();
            let result = engine.scan(categories.as_deref())?;

            if !confirm {
                output::print_no_confirm_warning();
                print_report(&result, &locations, lang);
                output::print_dry_run_footer();
                return Ok(ExitCode::SUCCESS);
            }

            let selected: Vec<CleanupItem> = result
                .items
                .iter()
                .filter(|i| match i.risk_level {
                    RiskLevel::Safe => true,
                    RiskLevel::Caution => include_caution,
                    RiskLevel::Risky => false,
                })
                .cloned()
                .collect();
            if selected.is_empty() {
                output::print_info("Nothing selected for cleanup.");
                return Ok(ExitCode::SUCCESS);
            }

            let manager = SafetyManager::for_trash_dir(locations.trash.clone());
            if snapshot {
                match manager.create_snapshot() {
                    Ok(out) => output::print_info(&out),
                    Err(e) => {
                        output::print_warning(&format!("{e}. Continuing without a snapshot."))
                    }
                }
            }

            let (in_trash, elsewhere): (Vec<CleanupItem>, Vec<CleanupItem>) = selected
                .into_iter()
                .partition(|i| i.category == Category::Trash);
            let mut results = manager.move_to_trash(&elsewhere);
            results.extend(manager.delete_permanently(&in_trash));

            for r in &results {
                let path = display_path(&r.item.path, &locations.home);
                match &r.error {
                    None => output::print_deleted(
                        &path,
                        r.item.size,
                        r.item.category != Category::Trash,
                    ),
                    Some(err) => output::print_delete_error(&path, err),
                }
            }
            println!();

            let summary = summarize(&results);
            output::print_clean_complete(summary.freed_bytes);
            let remaining: ScanResult = result.without_removed(&results);
            output::print_info(&format!(
                "{} items left ({}), {} failed.",
                remaining.items.len(),
                reclaim::utils::format_size(remaining.total_size()),
                summary.failed,
            ));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_report(result: &ScanResult, locations: &Locations, lang: Language) {
    for (category, items) in result.by_category() {
        output::print_scan_header(category.label(lang));
        for item in &items {
            output::print_scan_entry(
                &display_path(&item.path, &locations.home),
                item.size,
                item.risk_level,
                item.risk_level.label(lang),
                item.reason.text(lang),
            );
        }
        output::print_category_total(category.label(lang), items.iter().map(|i| i.size).sum());
    }

    output::print_summary_header();
    for (risk, items) in result.by_risk() {
        output::print_summary_row(risk.label(lang), items.iter().map(|i| i.size).sum());
    }
    output::print_separator();
    output::print_summary_row("Safe to delete:", result.safe_size());
    output::print_grand_total("Total reclaimable:", result.total_size());
    output::print_info(&format!(
        "Scanned {} categories in {:.2}s.",
        result.scanned_categories.len(),
        result.duration.as_secs_f64()
    ));
}
