use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Language selector for the bilingual texts carried by items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Chinese,
}

/// What kind of junk an item is. Each scanner declares one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    UserCache,
    Logs,
    OrphanedAppData,
    BrokenPrefs,
    Trash,
    LargeFiles,
    Applications,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::UserCache,
        Category::Logs,
        Category::OrphanedAppData,
        Category::BrokenPrefs,
        Category::Trash,
        Category::LargeFiles,
        Category::Applications,
    ];

    /// Machine-readable name used in the --category flag (e.g. "user-cache").
    pub fn name(self) -> &'static str {
        match self {
            Category::UserCache => "user-cache",
            Category::Logs => "logs",
            Category::OrphanedAppData => "orphaned-app-data",
            Category::BrokenPrefs => "broken-prefs",
            Category::Trash => "trash",
            Category::LargeFiles => "large-files",
            Category::Applications => "applications",
        }
    }

    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (Category::UserCache, Language::English) => "User Caches",
            (Category::UserCache, Language::Chinese) => "用户缓存",
            (Category::Logs, Language::English) => "Logs",
            (Category::Logs, Language::Chinese) => "日志文件",
            (Category::OrphanedAppData, Language::English) => "Orphaned App Data",
            (Category::OrphanedAppData, Language::Chinese) => "残留应用数据",
            (Category::BrokenPrefs, Language::English) => "Orphaned Preferences",
            (Category::BrokenPrefs, Language::Chinese) => "残留偏好设置",
            (Category::Trash, Language::English) => "Trash",
            (Category::Trash, Language::Chinese) => "废纸篓",
            (Category::LargeFiles, Language::English) => "Large Files",
            (Category::LargeFiles, Language::Chinese) => "大文件",
            (Category::Applications, Language::English) => "Applications",
            (Category::Applications, Language::Chinese) => "应用程序",
        }
    }
}

/// Deletion-safety classification, ordered from least to most attention needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskLevel {
    Safe,
    Caution,
    Risky,
}

impl RiskLevel {
    pub fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (RiskLevel::Safe, Language::English) => "Safe",
            (RiskLevel::Safe, Language::Chinese) => "安全",
            (RiskLevel::Caution, Language::English) => "Caution",
            (RiskLevel::Caution, Language::Chinese) => "谨慎",
            (RiskLevel::Risky, Language::English) => "Risky",
            (RiskLevel::Risky, Language::Chinese) => "危险",
        }
    }
}

/// Why an item was flagged, in both supported languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub en: String,
    pub zh: String,
}

impl Reason {
    pub fn new(en: impl Into<String>, zh: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            zh: zh.into(),
        }
    }

    pub fn text(&self, lang: Language) -> &str {
        match lang {
            Language::English => &self.en,
            Language::Chinese => &self.zh,
        }
    }
}

/// One discovered, deletable filesystem object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupItem {
    pub id: Uuid,
    pub path: PathBuf,
    pub size: u64,
    pub category: Category,
    pub risk_level: RiskLevel,
    pub reason: Reason,
    pub last_accessed: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub parent_app: Option<String>,
}

impl CleanupItem {
    /// A fresh item with a new id and no timestamps or attribution.
    pub fn new(
        path: PathBuf,
        size: u64,
        category: Category,
        risk_level: RiskLevel,
        reason: Reason,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            size,
            category,
            risk_level,
            reason,
            last_accessed: None,
            last_modified: None,
            parent_app: None,
        }
    }

    pub fn with_times(
        mut self,
        last_accessed: Option<DateTime<Utc>>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        self.last_accessed = last_accessed;
        self.last_modified = last_modified;
        self
    }

    pub fn with_parent_app(mut self, parent_app: Option<String>) -> Self {
        self.parent_app = parent_app;
        self
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Snapshot of one completed scan. Items are ordered by descending size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub items: Vec<CleanupItem>,
    pub scan_date: DateTime<Utc>,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    pub scanned_categories: Vec<Category>,
}

impl ScanResult {
    pub fn total_size(&self) -> u64 {
        self.items.iter().map(|i| i.size).sum()
    }

    pub fn by_category(&self) -> BTreeMap<Category, Vec<&CleanupItem>> {
        let mut groups: BTreeMap<Category, Vec<&CleanupItem>> = BTreeMap::new();
        for item in &self.items {
            groups.entry(item.category).or_default().push(item);
        }
        groups
    }

    pub fn by_risk(&self) -> BTreeMap<RiskLevel, Vec<&CleanupItem>> {
        let mut groups: BTreeMap<RiskLevel, Vec<&CleanupItem>> = BTreeMap::new();
        for item in &self.items {
            groups.entry(item.risk_level).or_default().push(item);
        }
        groups
    }

    pub fn safe_items(&self) -> Vec<&CleanupItem> {
        self.items
            .iter()
            .filter(|i| i.risk_level == RiskLevel::Safe)
            .collect()
    }

    pub fn safe_size(&self) -> u64 {
        self.safe_items().iter().map(|i| i.size).sum()
    }

    /// Items the caller picked, in scan order.
    pub fn items_with_ids(&self, ids: &HashSet<Uuid>) -> Vec<CleanupItem> {
        self.items
            .iter()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect()
    }

    /// Build the result that supersedes this one after a cleanup run:
    /// every successfully removed item is dropped, failures stay.
    pub fn without_removed(&self, results: &[CleanupResult]) -> ScanResult {
        let removed: HashSet<Uuid> = results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.item.id)
            .collect();

        ScanResult {
            items: self
                .items
                .iter()
                .filter(|i| !removed.contains(&i.id))
                .cloned()
                .collect(),
            scan_date: self.scan_date,
            duration: self.duration,
            scanned_categories: self.scanned_categories.clone(),
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Outcome of one deletion attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResult {
    pub item: CleanupItem,
    pub success: bool,
    pub trashed_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl CleanupResult {
    pub fn succeeded(item: CleanupItem, trashed_path: Option<PathBuf>) -> Self {
        Self {
            item,
            success: true,
            trashed_path,
            error: None,
        }
    }

    pub fn failed(item: CleanupItem, error: impl Into<String>) -> Self {
        Self {
            item,
            success: false,
            trashed_path: None,
            error: Some(error.into()),
        }
    }

    pub fn freed_bytes(&self) -> u64 {
        if self.success {
            self.item.size
        } else {
            0
        }
    }
}

/// Totals over a cleanup batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub freed_bytes: u64,
}

pub fn summarize(results: &[CleanupResult]) -> CleanupSummary {
    results
        .iter()
        .fold(CleanupSummary::default(), |mut acc, r| {
            if r.success {
                acc.succeeded += 1;
            } else {
                acc.failed += 1;
            }
            acc.freed_bytes += r.freed_bytes();
            acc
        })
}

/// The trait every scanning strategy implements.
pub trait Scanner: Send + Sync {
    /// The category this scanner is registered under.
    fn category(&self) -> Category;

    /// Every category this scanner's items may carry. Defaults to the
    /// declared category alone.
    fn categories(&self) -> Vec<Category> {
        vec![self.category()]
    }

    /// Enumerate candidates. Never deletes anything. Unreadable subtrees are
    /// skipped; only a catastrophic enumeration failure is an error.
    fn scan(&self) -> std::io::Result<Vec<CleanupItem>>;
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
