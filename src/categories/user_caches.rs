use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;
use walkdir::WalkDir;

use super::app_name_for;
use crate::cleaner::{Category, CleanupItem, Reason, RiskLevel, Scanner};
use crate::locations::Locations;
use crate::utils;

/// Cache folders that the system, iCloud or Safari recreate on demand.
const SAFE_PATTERNS: &[&str] = &[
    "com.apple.",
    "cloudkit",
    "icloud",
    "safari",
    "webkit",
    "geoservices",
];

/// A cache untouched for longer than this is considered abandoned.
const STALE_DAYS: i64 = 30;

/// Each top-level folder under `~/Library/Caches` is one app's cache.
pub struct UserCaches {
    root: PathBuf,
}

#[derive(Default)]
struct GroupStats {
    size: u64,
    last_accessed: Option<DateTime<Utc>>,
    last_modified: Option<DateTime<Utc>>,
}

impl UserCaches {
    pub fn new(locations: &Locations) -> Self {
        Self::with_root(locations.caches())
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }
}

pub(crate) fn matches_safe_pattern(name: &str) -> bool {
    let lower = name.to_lowercase();
    SAFE_PATTERNS.iter().any(|p| lower.contains(p))
}

pub(crate) fn classify(
    name: &str,
    last_accessed: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (RiskLevel, Reason) {
    if matches_safe_pattern(name) {
        return (
            RiskLevel::Safe,
            Reason::new(
                "System or cloud cache, rebuilt automatically when needed",
                "系统或云服务缓存，需要时会自动重建",
            ),
        );
    }

    match last_accessed {
        Some(t) if utils::older_than(t, now, STALE_DAYS) => {
            let days = utils::days_between(t, now);
            (
                RiskLevel::Safe,
                Reason::new(
                    format!("Not accessed for {days} days"),
                    format!("已 {days} 天未访问"),
                ),
            )
        }
        _ => (
            RiskLevel::Caution,
            Reason::new(
                "Cache in recent use, the app will need to rebuild it",
                "缓存近期仍在使用，删除后应用需要重新生成",
            ),
        ),
    }
}

/// Recursive size and newest timestamps of the non-hidden files in a group.
fn group_stats(path: &Path) -> GroupStats {
    let mut stats = GroupStats::default();
    let walker = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !utils::is_hidden(&e.file_name().to_string_lossy()));

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        stats.size += meta.len();
        if let Ok(t) = meta.accessed() {
            let t = utils::to_utc(t);
            stats.last_accessed = Some(stats.last_accessed.map_or(t, |cur| cur.max(t)));
        }
        if let Ok(t) = meta.modified() {
            let t = utils::to_utc(t);
            stats.last_modified = Some(stats.last_modified.map_or(t, |cur| cur.max(t)));
        }
    }
    stats
}

impl Scanner for UserCaches {
    fn category(&self) -> Category {
        Category::UserCache
    }

    fn scan(&self) -> std::io::Result<Vec<CleanupItem>> {
        let read_dir = match std::fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) => {
                debug!("Cannot read {}: {e}", self.root.display());
                return Ok(Vec::new());
            }
        };

        let now = Utc::now();
        let mut items = Vec::new();

        for entry in read_dir.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if utils::is_hidden(&name) || !entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }

            let stats = group_stats(&entry.path());
            if stats.size == 0 {
                continue;
            }

            // Access time may be unavailable (noatime mounts); fall back to mtime.
            let signal = stats.last_accessed.or(stats.last_modified);
            let (risk, reason) = classify(&name, signal, now);
            items.push(
                CleanupItem::new(entry.path(), stats.size, Category::UserCache, risk, reason)
                    .with_times(stats.last_accessed, stats.last_modified)
                    .with_parent_app(Some(app_name_for(&name))),
            );
        }

        debug!("Found {} cache groups in {}", items.len(), self.root.display());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::fs::{self, File, FileTimes};
    use std::time::SystemTime;
    use tempfile::tempdir;

    fn write_aged(path: &Path, len: usize, age_days: u64) {
        fs::write(path, vec![0u8; len]).unwrap();
        let when = SystemTime::now() - std::time::Duration::from_secs(age_days * 86_400);
        let file = File::options().write(true).open(path).unwrap();
        file.set_times(FileTimes::new().set_accessed(when).set_modified(when))
            .unwrap();
    }

    #[test]
    fn test_safe_pattern_wins_regardless_of_age() {
        let now = Utc::now();
        let (risk, _) = classify("com.apple.Safari", Some(now), now);
        assert_eq!(risk, RiskLevel::Safe);
        let (risk, _) = classify("CloudKit", None, now);
        assert_eq!(risk, RiskLevel::Safe);
    }

    #[test]
    fn test_age_threshold() {
        let now = Utc::now();
        let (risk, reason) = classify("com.vendor.Tool", Some(now - Duration::days(31)), now);
        assert_eq!(risk, RiskLevel::Safe);
        assert!(reason.en.contains("31 days"));

        let (risk, _) = classify("com.vendor.Tool", Some(now - Duration::days(29)), now);
        assert_eq!(risk, RiskLevel::Caution);

        let (risk, _) = classify("com.vendor.Tool", Some(now - Duration::days(30)), now);
        assert_eq!(risk, RiskLevel::Caution);

        let (risk, _) = classify("com.vendor.Tool", None, now);
        assert_eq!(risk, RiskLevel::Caution);
    }

    #[test]
    fn test_scan_groups_by_top_level_folder() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        let stale = root.join("com.vendor.Stale");
        fs::create_dir_all(stale.join("nested")).unwrap();
        write_aged(&stale.join("a.db"), 100, 45);
        write_aged(&stale.join("nested/b.db"), 50, 40);
        write_aged(&stale.join(".hidden"), 1000, 40);

        let fresh = root.join("com.vendor.Fresh");
        fs::create_dir_all(&fresh).unwrap();
        write_aged(&fresh.join("c.db"), 10, 1);

        fs::create_dir_all(root.join("Empty")).unwrap();
        // loose files are not cache groups
        write_aged(&root.join("stray.db"), 500, 60);
        fs::create_dir_all(root.join(".Hidden")).unwrap();
        write_aged(&root.join(".Hidden/x"), 10, 100);

        let mut items = UserCaches::with_root(root.to_path_buf()).scan().unwrap();
        items.sort_by(|a, b| b.size.cmp(&a.size));

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].path, stale);
        assert_eq!(items[0].size, 150);
        assert_eq!(items[0].risk_level, RiskLevel::Safe);
        assert_eq!(items[0].parent_app.as_deref(), Some("Stale"));
        assert_eq!(items[1].risk_level, RiskLevel::Caution);
        assert!(items.iter().all(|i| i.category == Category::UserCache));
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let dir = tempdir().unwrap();
        let items = UserCaches::with_root(dir.path().join("nope")).scan().unwrap();
        assert!(items.is_empty());
    }
}
