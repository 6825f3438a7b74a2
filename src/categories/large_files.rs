use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::cleaner::{Category, CleanupItem, Reason, RiskLevel, Scanner};
use crate::locations::Locations;
use crate::utils;

/// Items must be strictly larger than this: 100 MB.
pub const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Directory packages sized and reported as a single item.
const PACKAGE_EXTENSIONS: &[&str] = &["app", "bundle"];

/// Top-level folders of the home directory that are never searched.
const HOME_SKIP_DIRS: &[&str] = &["Library", "Public", "Desktop"];

/// A directory to search and the top-level children to leave out.
#[derive(Debug, Clone)]
pub struct SearchRoot {
    pub path: PathBuf,
    pub skip_top_level: Vec<String>,
}

impl SearchRoot {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            skip_top_level: Vec::new(),
        }
    }

    pub fn skipping(mut self, names: &[&str]) -> Self {
        self.skip_top_level = names.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Files and application bundles over the size threshold in the home
/// directory and the applications folders.
pub struct LargeFiles {
    roots: Vec<SearchRoot>,
}

impl LargeFiles {
    pub fn new(locations: &Locations) -> Self {
        let mut roots = vec![SearchRoot::new(locations.home.clone()).skipping(HOME_SKIP_DIRS)];
        // Applications folders inside home are already covered by the home walk.
        for dir in &locations.applications {
            if !dir.starts_with(&locations.home) {
                roots.push(SearchRoot::new(dir.clone()));
            }
        }
        Self::with_roots(roots)
    }

    pub fn with_roots(roots: Vec<SearchRoot>) -> Self {
        Self { roots }
    }

    fn scan_root(&self, root: &SearchRoot, items: &mut Vec<CleanupItem>) {
        if !root.path.exists() {
            return;
        }

        let mut walker = WalkDir::new(&root.path).follow_links(false).into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    debug!("Skipping unreadable entry: {err}");
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            let is_dir = entry.file_type().is_dir();

            if utils::is_hidden(&name)
                || (is_dir && entry.depth() == 1 && root.skip_top_level.iter().any(|s| *s == name))
            {
                if is_dir {
                    walker.skip_current_dir();
                }
                continue;
            }

            if is_dir {
                if is_package(entry.path()) {
                    walker.skip_current_dir();
                    let size = utils::dir_size(entry.path());
                    if size > LARGE_FILE_THRESHOLD {
                        items.push(large_item(entry.path(), size, entry.metadata().ok()));
                    }
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(meta) = entry.metadata() {
                if meta.len() > LARGE_FILE_THRESHOLD {
                    items.push(large_item(entry.path(), meta.len(), Some(meta)));
                }
            }
        }
    }
}

fn is_package(path: &Path) -> bool {
    utils::extension_lower(path).is_some_and(|ext| PACKAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn large_item(path: &Path, size: u64, meta: Option<std::fs::Metadata>) -> CleanupItem {
    let pretty = utils::format_size(size);
    let is_app = utils::extension_lower(path).as_deref() == Some("app");

    let (category, reason, parent_app) = if is_app {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned());
        (
            Category::Applications,
            Reason::new(
                format!("Application taking {pretty}, remove it only if you no longer use it"),
                format!("应用占用 {pretty}，确认不再使用后再删除"),
            ),
            name,
        )
    } else {
        (
            Category::LargeFiles,
            Reason::new(
                format!("Large file of {pretty}, review before deleting"),
                format!("大文件（{pretty}），删除前请确认"),
            ),
            None,
        )
    };

    CleanupItem::new(path.to_path_buf(), size, category, RiskLevel::Caution, reason)
        .with_times(
            meta.as_ref().and_then(|m| m.accessed().ok()).map(utils::to_utc),
            meta.as_ref().and_then(|m| m.modified().ok()).map(utils::to_utc),
        )
        .with_parent_app(parent_app)
}

impl Scanner for LargeFiles {
    fn category(&self) -> Category {
        Category::LargeFiles
    }

    fn categories(&self) -> Vec<Category> {
        vec![Category::LargeFiles, Category::Applications]
    }

    fn scan(&self) -> std::io::Result<Vec<CleanupItem>> {
        let mut items = Vec::new();
        for root in &self.roots {
            self.scan_root(root, &mut items);
        }
        debug!("Found {} large items", items.len());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    /// Sparse file of the given logical length.
    fn sized_file(path: &Path, len: u64) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap().set_len(len).unwrap();
    }

    #[test]
    fn test_threshold_is_strict() {
        let dir = tempdir().unwrap();
        let home = dir.path();
        sized_file(&home.join("Movies/exact.mov"), LARGE_FILE_THRESHOLD);
        sized_file(&home.join("Movies/over.mov"), LARGE_FILE_THRESHOLD + 1);

        let items = LargeFiles::with_roots(vec![SearchRoot::new(home.to_path_buf())])
            .scan()
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].file_name(), "over.mov");
        assert_eq!(items[0].category, Category::LargeFiles);
        assert_eq!(items[0].risk_level, RiskLevel::Caution);
    }

    #[test]
    fn test_skips_excluded_and_hidden_dirs() {
        let dir = tempdir().unwrap();
        let home = dir.path();
        let big = LARGE_FILE_THRESHOLD + 10;
        sized_file(&home.join("Library/huge.bin"), big);
        sized_file(&home.join("Desktop/huge.bin"), big);
        sized_file(&home.join("Public/huge.bin"), big);
        sized_file(&home.join(".cache/huge.bin"), big);
        sized_file(&home.join("Documents/Library/kept.bin"), big);

        let items = LargeFiles::new(&Locations::from_home(home)).scan().unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path, home.join("Documents/Library/kept.bin"));
    }

    #[test]
    fn test_app_bundles_are_atomic() {
        let dir = tempdir().unwrap();
        let apps = dir.path().join("Applications");
        let half = LARGE_FILE_THRESHOLD / 2 + 1;
        sized_file(&apps.join("Big.app/Contents/MacOS/Big"), half);
        sized_file(&apps.join("Big.app/Contents/Resources/data.pak"), half);
        // huge inner file is counted in its bundle, never reported on its own
        sized_file(&apps.join("Huge.app/Contents/Resources/huge.pak"), LARGE_FILE_THRESHOLD + 1);
        sized_file(&apps.join("Small.app/Contents/MacOS/Small"), 10);

        let scanner = LargeFiles::with_roots(vec![SearchRoot::new(apps.clone())]);
        let mut items = scanner.scan().unwrap();
        items.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].path, apps.join("Big.app"));
        assert_eq!(items[0].size, half * 2);
        assert_eq!(items[0].category, Category::Applications);
        assert_eq!(items[0].parent_app.as_deref(), Some("Big"));
        assert_eq!(items[1].path, apps.join("Huge.app"));
        assert!(scanner.categories().contains(&items[0].category));
    }

    #[test]
    fn test_home_applications_not_walked_twice() {
        let dir = tempdir().unwrap();
        let loc = Locations::from_home(dir.path());
        sized_file(
            &loc.applications[0].join("Huge.app/Contents/MacOS/Huge"),
            LARGE_FILE_THRESHOLD + 1,
        );

        let items = LargeFiles::new(&loc).scan().unwrap();
        assert_eq!(items.len(), 1);
    }
}
