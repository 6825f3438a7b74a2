use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;
use walkdir::WalkDir;

use super::{app_name_for, looks_like_bundle_id};
use crate::cleaner::{Category, CleanupItem, Reason, RiskLevel, Scanner};
use crate::locations::Locations;
use crate::utils;

const LOG_EXTENSIONS: &[&str] = &["log", "txt", "crash", "diag"];

/// Crash reports and diagnostics are never needed once read.
const REPORT_EXTENSIONS: &[&str] = &["crash", "diag"];

/// Files at or below this size are not worth listing.
const MIN_LOG_SIZE: u64 = 1024;

const STALE_DAYS: i64 = 7;

pub struct Logs {
    root: PathBuf,
}

impl Logs {
    pub fn new(locations: &Locations) -> Self {
        Self::with_root(locations.logs())
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// First bundle-id-like folder between the root and the file, else the
    /// file's parent folder. Files directly under the root have no owner.
    fn attribute(&self, path: &Path) -> Option<String> {
        let parent = path.parent()?;
        let relative = parent.strip_prefix(&self.root).ok()?;
        let folders: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        if let Some(id) = folders.iter().find(|f| looks_like_bundle_id(f)) {
            return Some(app_name_for(id));
        }
        folders.last().cloned()
    }
}

pub(crate) fn classify(
    extension: &str,
    modified: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (RiskLevel, Reason) {
    if REPORT_EXTENSIONS.contains(&extension) {
        return (
            RiskLevel::Safe,
            Reason::new(
                "Crash or diagnostic report, only useful for debugging",
                "崩溃或诊断报告，仅用于调试",
            ),
        );
    }

    match modified {
        Some(t) if utils::older_than(t, now, STALE_DAYS) => {
            let days = utils::days_between(t, now);
            (
                RiskLevel::Safe,
                Reason::new(
                    format!("Log not written for {days} days"),
                    format!("日志已 {days} 天未写入"),
                ),
            )
        }
        _ => (
            RiskLevel::Caution,
            Reason::new(
                "Recent log, may still be in use",
                "近期日志，可能仍在使用",
            ),
        ),
    }
}

impl Scanner for Logs {
    fn category(&self) -> Category {
        Category::Logs
    }

    fn scan(&self) -> std::io::Result<Vec<CleanupItem>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let mut items = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let ext = match utils::extension_lower(entry.path()) {
                Some(ext) if LOG_EXTENSIONS.contains(&ext.as_str()) => ext,
                _ => continue,
            };
            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };
            if meta.len() <= MIN_LOG_SIZE {
                continue;
            }

            let modified = meta.modified().ok().map(utils::to_utc);
            let accessed = meta.accessed().ok().map(utils::to_utc);
            let (risk, reason) = classify(&ext, modified, now);

            items.push(
                CleanupItem::new(
                    entry.path().to_path_buf(),
                    meta.len(),
                    Category::Logs,
                    risk,
                    reason,
                )
                .with_times(accessed, modified)
                .with_parent_app(self.attribute(entry.path())),
            );
        }

        debug!("Found {} log files in {}", items.len(), self.root.display());
        Ok(items)
    }
}
