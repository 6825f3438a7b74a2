use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::cleaner::{Category, CleanupItem, CleanupResult};
use crate::error::{Error, Result};
use crate::utils;

pub const WHITELIST_MESSAGE: &str = "Item is protected by whitelist";
const TRASH_ROOT_MESSAGE: &str = "Refusing to remove the Trash folder itself";
const NOT_IN_TRASH_MESSAGE: &str = "Permanent deletion is only allowed for items in the Trash";

/// Security tools and critical directories that must never be removed.
const DEFAULT_WHITELIST: &[&str] = &[
    "com.objective-see",
    "com.malwarebytes",
    "com.bitdefender",
    "com.avast",
    "com.avg",
    "com.eset",
    "com.sophos",
    "com.kaspersky",
    "com.mcafee",
    "com.symantec",
    "com.norton",
    "com.intego",
    "com.crowdstrike",
    "com.sentinelone",
    "Keychains",
    "Security",
];

/// The OS "move to trash" primitive.
pub trait TrashBin: Send + Sync {
    /// Move `path` into the trash. Returns where it ended up, when known.
    fn trash(&self, path: &Path) -> io::Result<Option<PathBuf>>;

    /// The trash folder, which is never itself a valid target.
    fn root(&self) -> &Path;
}

/// Platform trash operation, used when an item cannot be renamed into the
/// trash folder directly.
pub type TrashFallback = Box<dyn Fn(&Path) -> io::Result<()> + Send + Sync>;

/// Moves items into the user's trash folder by renaming, Finder-style.
///
/// When the rename fails for any reason other than the item being gone
/// (another volume, a trash folder the process may not write to), the item
/// goes through the platform trash instead, which does not report where the
/// item ended up.
pub struct SystemTrash {
    dir: PathBuf,
    fallback: TrashFallback,
}

impl SystemTrash {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            fallback: Box::new(platform_trash),
        }
    }

    pub fn with_fallback(mut self, fallback: TrashFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// First free name in the trash: `report.pdf`, `report 2.pdf`, ...
    fn destination_for(&self, path: &Path) -> io::Result<PathBuf> {
        let name = path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
        let candidate = self.dir.join(name);
        if candidate.symlink_metadata().is_err() {
            return Ok(candidate);
        }

        let as_path = Path::new(name);
        let stem = as_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = as_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut n = 2u32;
        loop {
            let candidate = self.dir.join(format!("{stem} {n}{ext}"));
            if candidate.symlink_metadata().is_err() {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    fn rename_into_trash(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let dest = self.destination_for(path)?;
        std::fs::rename(path, &dest)?;
        Ok(dest)
    }
}

impl TrashBin for SystemTrash {
    fn trash(&self, path: &Path) -> io::Result<Option<PathBuf>> {
        path.symlink_metadata()?;
        match self.rename_into_trash(path) {
            Ok(dest) => Ok(Some(dest)),
            Err(e) => {
                debug!(
                    "Cannot move {} into {} ({e}), using the platform trash",
                    path.display(),
                    self.dir.display()
                );
                (self.fallback)(path)?;
                Ok(None)
            }
        }
    }

    fn root(&self) -> &Path {
        &self.dir
    }
}

fn platform_trash(path: &Path) -> io::Result<()> {
    ::trash::delete(path).map_err(|e| io::Error::other(e.to_string()))
}

/// Runs the external point-in-time snapshot utility.
#[derive(Debug, Clone)]
pub struct Snapshotter {
    program: String,
    args: Vec<String>,
}

impl Default for Snapshotter {
    fn default() -> Self {
        Self::new("tmutil", &["localsnapshot"])
    }
}

impl Snapshotter {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Run the utility and return its combined stdout and stderr.
    pub fn run(&self) -> Result<String> {
        let output = Command::new(&self.program).args(&self.args).output()?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        let text = text.trim().to_string();

        if !output.status.success() {
            return Err(Error::Snapshot {
                status: output.status.to_string(),
                output: text,
            });
        }
        Ok(text)
    }
}

/// Whitelist-gated deletion. Every item in a batch is handled on its own:
/// one failure never stops the rest, and each item yields exactly one result.
pub struct SafetyManager {
    whitelist: BTreeSet<String>,
    trash: Box<dyn TrashBin>,
    snapshotter: Snapshotter,
}

impl SafetyManager {
    pub fn new(trash: Box<dyn TrashBin>) -> Self {
        Self {
            whitelist: DEFAULT_WHITELIST.iter().map(|s| s.to_string()).collect(),
            trash,
            snapshotter: Snapshotter::default(),
        }
    }

    /// Manager for the given trash folder.
    pub fn for_trash_dir(dir: PathBuf) -> Self {
        Self::new(Box::new(SystemTrash::new(dir)))
    }

    pub fn with_snapshotter(mut self, snapshotter: Snapshotter) -> Self {
        self.snapshotter = snapshotter;
        self
    }

    pub fn whitelist(&self) -> impl Iterator<Item = &str> {
        self.whitelist.iter().map(String::as_str)
    }

    pub fn add_to_whitelist(&mut self, pattern: impl Into<String>) {
        self.whitelist.insert(pattern.into());
    }

    pub fn remove_from_whitelist(&mut self, pattern: &str) -> bool {
        self.whitelist.remove(pattern)
    }

    /// Plain substring match against the whole path, not per path segment:
    /// a folder named "Security Notes" is protected too.
    pub fn is_whitelisted(&self, item: &CleanupItem) -> bool {
        let path = item.path.to_string_lossy();
        self.whitelist.iter().any(|w| path.contains(w.as_str()))
    }

    /// Reason an item may not be touched at all, if any.
    fn refusal(&self, item: &CleanupItem) -> Option<&'static str> {
        if self.is_whitelisted(item) {
            Some(WHITELIST_MESSAGE)
        } else if item.path == self.trash.root() {
            Some(TRASH_ROOT_MESSAGE)
        } else {
            None
        }
    }

    pub fn move_to_trash(&self, items: &[CleanupItem]) -> Vec<CleanupResult> {
        let results: Vec<CleanupResult> = items
            .iter()
            .map(|item| {
                if let Some(msg) = self.refusal(item) {
                    return CleanupResult::failed(item.clone(), msg);
                }
                match self.trash.trash(&item.path) {
                    Ok(dest) => CleanupResult::succeeded(item.clone(), dest),
                    Err(e) => {
                        warn!("Failed to trash {}: {e}", item.path.display());
                        CleanupResult::failed(item.clone(), e.to_string())
                    }
                }
            })
            .collect();
        log_batch("Moved to trash", &results);
        results
    }

    /// Irreversible. Only accepts items from the trash category.
    pub fn delete_permanently(&self, items: &[CleanupItem]) -> Vec<CleanupResult> {
        let results: Vec<CleanupResult> = items
            .iter()
            .map(|item| {
                if let Some(msg) = self.refusal(item) {
                    return CleanupResult::failed(item.clone(), msg);
                }
                if item.category != Category::Trash {
                    return CleanupResult::failed(item.clone(), NOT_IN_TRASH_MESSAGE);
                }
                match utils::safe_remove(&item.path) {
                    Ok(_) => CleanupResult::succeeded(item.clone(), None),
                    Err(e) => {
                        warn!("Failed to delete {}: {e}", item.path.display());
                        CleanupResult::failed(item.clone(), e.to_string())
                    }
                }
            })
            .collect();
        log_batch("Deleted", &results);
        results
    }

    /// Take a local snapshot before a destructive batch. Optional.
    pub fn create_snapshot(&self) -> Result<String> {
        let output = self.snapshotter.run()?;
        info!("Local snapshot created: {output}");
        Ok(output)
    }
}

fn log_batch(action: &str, results: &[CleanupResult]) {
    let summary = crate::cleaner::summarize(results);
    info!(
        "{action} {} items ({} freed), {} failed",
        summary.succeeded,
        utils::format_size(summary.freed_bytes),
        summary.failed,
    );
}
