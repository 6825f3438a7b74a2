use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::warn;

use crate::cleaner::{Category, CleanupItem, Reason, RiskLevel, Scanner};
use crate::locations::Locations;
use crate::utils;

pub struct Trash {
    root: PathBuf,
}

impl Trash {
    pub fn new(locations: &Locations) -> Self {
        Self::with_root(locations.trash.clone())
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Stand-in reported when the trash cannot be listed, so the user learns
    /// that something is wrong instead of seeing an empty trash.
    fn placeholder(&self, err: &std::io::Error) -> CleanupItem {
        CleanupItem::new(
            self.root.clone(),
            0,
            Category::Trash,
            RiskLevel::Risky,
            placeholder_reason(err),
        )
    }
}

fn placeholder_reason(err: &std::io::Error) -> Reason {
    match err.kind() {
        ErrorKind::PermissionDenied => Reason::new(
            "Trash access denied. Grant Full Disk Access: System Settings → Privacy & Security → Full Disk Access.",
            "无法访问废纸篓。需要授予“完全磁盘访问权限”：系统设置 → 隐私与安全性 → 完全磁盘访问权限。",
        ),
        ErrorKind::NotFound => Reason::new(
            "Trash folder not found, nothing to scan",
            "未找到废纸篓文件夹，无可扫描内容",
        ),
        _ => Reason::new(
            format!("Cannot read the Trash ({err}). Full Disk Access may be required."),
            format!("无法读取废纸篓（{err}），可能需要授予“完全磁盘访问权限”。"),
        ),
    }
}

impl Scanner for Trash {
    fn category(&self) -> Category {
        Category::Trash
    }

    /// Never fails: an unreadable trash becomes a single risky placeholder.
    fn scan(&self) -> std::io::Result<Vec<CleanupItem>> {
        let read_dir = match std::fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) => {
                warn!("Cannot read {}: {e}", self.root.display());
                return Ok(vec![self.placeholder(&e)]);
            }
        };

        let mut items = Vec::new();
        for entry in read_dir.flatten() {
            if entry.file_name() == ".DS_Store" {
                continue;
            }
            let path = entry.path();
            let size = utils::entry_size(&path);
            let meta = entry.metadata().ok();

            items.push(
                CleanupItem::new(
                    path,
                    size,
                    Category::Trash,
                    RiskLevel::Caution,
                    Reason::new(
                        "Already in the Trash, emptying it cannot be undone",
                        "已在废纸篓中，清空后无法恢复",
                    ),
                )
                .with_times(
                    meta.as_ref().and_then(|m| m.accessed().ok()).map(utils::to_utc),
                    meta.as_ref().and_then(|m| m.modified().ok()).map(utils::to_utc),
                ),
            );
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_scan_lists_top_level_entries() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(".DS_Store"), vec![0u8; 10]).unwrap();
        fs::write(root.join("old.zip"), vec![0u8; 300]).unwrap();
        fs::create_dir_all(root.join("Folder/inner")).unwrap();
        fs::write(root.join("Folder/a"), vec![0u8; 100]).unwrap();
        fs::write(root.join("Folder/inner/b"), vec![0u8; 100]).unwrap();

        let mut items = Trash::with_root(root.to_path_buf()).scan().unwrap();
        items.sort_by(|a, b| b.size.cmp(&a.size));

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].file_name(), "old.zip");
        assert_eq!(items[1].file_name(), "Folder");
        assert_eq!(items[1].size, 200);
        assert!(items
            .iter()
            .all(|i| i.category == Category::Trash && i.risk_level == RiskLevel::Caution));
    }

    #[test]
    fn test_unreadable_trash_yields_single_placeholder() {
        let dir = tempdir().unwrap();
        // a regular file cannot be listed as a directory
        let not_a_dir = dir.path().join(".Trash");
        fs::write(&not_a_dir, b"x").unwrap();

        let items = Trash::with_root(not_a_dir.clone()).scan().unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].size, 0);
        assert_eq!(items[0].risk_level, RiskLevel::Risky);
        assert_eq!(items[0].category, Category::Trash);
        assert_eq!(items[0].path, not_a_dir);
        assert!(items[0].reason.en.contains("Full Disk Access"));
    }

    #[test]
    fn test_placeholder_reason_follows_error_kind() {
        let denied = placeholder_reason(&std::io::Error::from(ErrorKind::PermissionDenied));
        assert!(denied.en.contains("Grant Full Disk Access"));

        let dir = tempdir().unwrap();
        let missing = dir.path().join(".Trash");
        let items = Trash::with_root(missing.clone()).scan().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path, missing);
        assert_eq!(items[0].risk_level, RiskLevel::Risky);
        assert!(items[0].reason.en.contains("not found"));
        assert!(!items[0].reason.en.contains("Full Disk Access"));
    }
}
