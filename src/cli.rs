use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "reclaim",
    about = "A macOS cleanup tool: find junk, judge how safe it is to delete, remove it",
    version
)]
pub struct Cli {
    /// Print reasons in Chinese
    #[arg(long, global = true)]
    pub zh: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan for junk files (dry-run, no deletion)
    Scan {
        /// Only scan these categories (repeatable, e.g. --category logs)
        #[arg(long)]
        category: Vec<String>,

        /// Print the scan result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clean junk files (requires --confirm to actually delete)
    Clean {
        /// Actually delete files. Without this flag, behaves like scan.
        #[arg(long)]
        confirm: bool,

        /// Only clean these categories
        #[arg(long)]
        category: Vec<String>,

        /// Also select items classified as caution (risky items are never selected)
        #[arg(long)]
        include_caution: bool,

        /// Take a local Time Machine snapshot before deleting
        #[arg(long)]
        snapshot: bool,
    },
}
