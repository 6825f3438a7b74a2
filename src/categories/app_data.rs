use std::path::PathBuf;

use tracing::debug;

use crate::cleaner::{Category, CleanupItem, Reason, RiskLevel, Scanner};
use crate::installed_apps::InstalledApps;
use crate::locations::Locations;
use crate::utils;

/// Containers smaller than this are not worth reporting: 1 MB.
const MIN_CONTAINER_SIZE: u64 = 1_048_576;

/// Sandbox containers in `~/Library/Containers` whose bundle id belongs to
/// no installed app.
///
/// `~/Library/Application Support` is deliberately not scanned: its folder
/// names are free-form app names, and matching them against installed apps
/// produced too many false orphans to be safe.
pub struct OrphanedAppData {
    root: PathBuf,
    app_dirs: Vec<PathBuf>,
}

impl OrphanedAppData {
    pub fn new(locations: &Locations) -> Self {
        Self::with_roots(locations.containers(), locations.applications.clone())
    }

    pub fn with_roots(root: PathBuf, app_dirs: Vec<PathBuf>) -> Self {
        Self { root, app_dirs }
    }
}

impl Scanner for OrphanedAppData {
    fn category(&self) -> Category {
        Category::OrphanedAppData
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
            let bundle_id = entry.file_name().to_string_lossy().into_owned();
            if utils::is_hidden(&bundle_id) || bundle_id.starts_with("com.apple.") {
                continue;
            }
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            if installed.recognizes(&bundle_id) {
                continue;
            }

            let path = entry.path();
            let size = utils::dir_size(&path);
            if size <= MIN_CONTAINER_SIZE {
                continue;
            }

            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(utils::to_utc);

            items.push(
                CleanupItem::new(
                    path,
                    size,
                    Category::OrphanedAppData,
                    RiskLevel::Caution,
                    Reason::new(
                        format!("Container of {bundle_id}, which is no longer installed"),
                        format!("{bundle_id} 的容器数据，该应用已不再安装"),
                    ),
                )
                .with_times(None, modified)
                .with_parent_app(Some(bundle_id)),
            );
        }

        debug!("Found {} orphaned containers", items.len());
        Ok(items)
    }
}
