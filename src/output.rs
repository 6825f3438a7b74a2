use colored::Colorize;

use reclaim::utils::format_size;
use reclaim::RiskLevel;

pub fn print_banner() {
    println!(
        "{}",
        format!("reclaim - macOS Cleanup Tool v{}", env!("CARGO_PKG_VERSION"))
            .bold()
            .cyan()
    );
    println!();
}

pub fn print_scan_header(label: &str) {
    println!("{}", format!("=== {label} ===").bold().white());
}

pub fn print_scan_entry(path: &str, bytes: u64, risk: RiskLevel, risk_label: &str, reason: &str) {
    let tag = format!("[{risk_label}]");
    let tag = match risk {
        RiskLevel::Safe => tag.green(),
        RiskLevel::Caution => tag.yellow(),
        RiskLevel::Risky => tag.red().bold(),
    };
    println!("  {} {}  {}", tag, path.dimmed(), format_size(bytes).yellow());
    println!("      {}", reason.dimmed());
}

pub fn print_category_total(label: &str, bytes: u64) {
    println!(
        "  {} {}",
        format!("{label} total:").bold(),
        format_size(bytes).green()
    );
    println!();
}

pub fn print_summary_header() {
    println!("{}", "=== Summary ===".bold().white());
}

pub fn print_summary_row(label: &str, bytes: u64) {
    println!("  {:<30} {}", label, format_size(bytes).green());
}

pub fn print_separator() {
    println!("  {}", "─".repeat(45).dimmed());
}

pub fn print_grand_total(label: &str, bytes: u64) {
    println!("  {:<30} {}", label.bold(), format_size(bytes).green().bold());
    println!();
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "Warning:".red().bold(), msg.red());
}

pub fn print_info(msg: &str) {
    println!("{} {}", "Info:".cyan().bold(), msg);
}

pub fn print_dry_run_footer() {
    println!(
        "{}",
        "This was a dry run. Run `reclaim clean --confirm` to delete."
            .yellow()
            .bold()
    );
}

pub fn print_clean_complete(bytes: u64) {
    println!(
        "{} {}",
        "Cleaned!".green().bold(),
        format!("{} freed.", format_size(bytes)).green()
    );
}

pub fn print_deleted(path: &str, bytes: u64, trashed: bool) {
    let verb = if trashed { "Trashed" } else { "Deleted" };
    println!("  {} {}  {}", verb.red(), path.dimmed(), format_size(bytes).yellow());
}

pub fn print_delete_error(path: &str, err: &str) {
    println!("  {} {}: {}", "Failed".red().bold(), path.dimmed(), err.red());
}

pub fn print_no_confirm_warning() {
    println!(
        "{}",
        "No --confirm flag provided. Running as dry-run scan."
            .yellow()
            .bold()
    );
    println!();
}
