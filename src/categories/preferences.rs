use std::path::PathBuf;

use tracing::debug;

use crate::cleaner::{Category, CleanupItem, Reason, RiskLevel, Scanner};
use crate::installed_apps::InstalledApps;
use crate::locations::Locations;
use crate::utils;

/// Identifier prefixes we trust enough to derive a bundle id from.
const DOTTED_PREFIXES: &[&str] = &["com.", "org.", "net."];

/// `.plist` files in `~/Library/Preferences` (top level only) whose owning
/// app is no longer installed.
pub struct OrphanedPreferences {
    root: PathBuf,
    app_dirs: Vec<PathBuf>,
}

impl OrphanedPreferences {
    pub fn new(locations: &Locations) -> Self {
        Self::with_roots(locations.preferences(), locations.applications.clone())
    }

    pub fn with_roots(root: PathBuf, app_dirs: Vec<PathBuf>) -> Self {
        Self { root, app_dirs }
    }
}

/// `com.vendor.app.extra` -> `com.vendor.app`. Names without a recognizable
/// dotted prefix yield nothing and are never flagged.
pub(crate) fn derive_bundle_id(stem: &str) -> Option<String> {
    if !DOTTED_PREFIXES.iter().any(|p| stem.starts_with(p)) {
        return None;
    }
    let parts: Vec<&str> = stem.split('.').take(3).collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts.join("."))
}

pub(crate) fn is_candidate(file_name: &str) -> bool {
    file_name.ends_with(".plist")
        && !file_name.starts_with("com.apple.")
        && !file_name.contains(".ByHost.")
}

impl Scanner for OrphanedPreferences {
    fn category(&self) -> Category {
        Category::BrokenPrefs
    }

    fn scan(&self) -> std::io::Result<Vec<CleanupItem>> {
        let read_dir = match std::fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) => {
                debug!("Cannot read {}: {e}", self.root.display());
                return Ok(Vec::new());
            }
        };

        let installed = InstalledApps::load(&self.app_dirs);
        let mut items = Vec::new();

        for entry in read_dir.flatten() {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !is_candidate(&file_name) {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let stem = file_name.trim_end_matches(".plist");
            let bundle_id = match derive_bundle_id(stem) {
                Some(id) => id,
                None => continue,
            };
            if installed.recognizes(&bundle_id) {
                continue;
            }

            items.push(
                CleanupItem::new(
                    entry.path(),
                    meta.len(),
                    Category::BrokenPrefs,
                    RiskLevel::Caution,
                    Reason::new(
                        format!("No installed app matches {bundle_id}"),
                        format!("未找到与 {bundle_id} 对应的已安装应用"),
                    ),
                )
                .with_times(
                    meta.accessed().ok().map(utils::to_utc),
                    meta.modified().ok().map(utils::to_utc),
                )
                .with_parent_app(Some(bundle_id)),
            );
        }

        debug!("Found {} orphaned preference files", items.len());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installed_apps::tests::make_app;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_derive_bundle_id() {
        assert_eq!(derive_bundle_id("com.vendor.App.extra").as_deref(), Some("com.vendor.App"));
        assert_eq!(derive_bundle_id("org.vendor.App").as_deref(), Some("org.vendor.App"));
        assert_eq!(derive_bundle_id("net.vendor").as_deref(), Some("net.vendor"));
        assert_eq!(derive_bundle_id("io.vendor.App"), None);
        assert_eq!(derive_bundle_id("loginwindow"), None);
    }

    #[test]
    fn test_is_candidate() {
        assert!(is_candidate("com.vendor.App.plist"));
        assert!(!is_candidate("com.apple.finder.plist"));
        assert!(!is_candidate("com.vendor.App.ByHost.1234.plist"));
        assert!(!is_candidate("com.vendor.App.lockfile"));
    }

    #[test]
    fn test_scan_flags_only_uninstalled_dotted_prefs() {
        let dir = tempdir().unwrap();
        let prefs = dir.path().join("Preferences");
        let apps = dir.path().join("Applications");
        fs::create_dir_all(prefs.join("ByHost")).unwrap();
        fs::create_dir_all(&apps).unwrap();
        make_app(&apps, "Editor", "com.installed.Editor", None);

        for name in [
            "com.installed.Editor.plist",
            "com.gone.Widget.plist",
            "com.gone.Widget.sidebar.plist",
            "com.apple.dock.plist",
            "com.gone.Other.ByHost.abc.plist",
            "loginwindow.plist",
            "io.gone.Thing.plist",
        ] {
            fs::write(prefs.join(name), b"<plist/>").unwrap();
        }
        fs::write(prefs.join("ByHost/com.gone.Nested.plist"), b"<plist/>").unwrap();

        let scanner = OrphanedPreferences::with_roots(prefs.clone(), vec![apps]);
        let mut items = scanner.scan().unwrap();
        items.sort_by(|a, b| a.path.cmp(&b.path));

        let names: Vec<String> = items.iter().map(|i| i.file_name()).collect();
        assert_eq!(names, vec!["com.gone.Widget.plist", "com.gone.Widget.sidebar.plist"]);
        assert!(items
            .iter()
            .all(|i| i.risk_level == RiskLevel::Caution && i.category == Category::BrokenPrefs));
        assert_eq!(items[1].parent_app.as_deref(), Some("com.gone.Widget"));
    }
}
