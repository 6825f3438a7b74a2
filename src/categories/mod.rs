mod app_data;
mod large_files;
mod logs;
mod preferences;
mod trash;
mod user_caches;

pub use app_data::OrphanedAppData;
pub use large_files::{LargeFiles, SearchRoot, LARGE_FILE_THRESHOLD};
pub use logs::Logs;
pub use preferences::OrphanedPreferences;
pub use trash::Trash;
pub use user_caches::UserCaches;

use crate::cleaner::{Category, Scanner};
use crate::locations::Locations;

/// The six scanning strategies, in display order.
pub fn default_scanners(locations: &Locations) -> Vec<Box<dyn Scanner>> {
    vec![
        Box::new(UserCaches::new(locations)),
        Box::new(Logs::new(locations)),
        Box::new(OrphanedPreferences::new(locations)),
        Box::new(OrphanedAppData::new(locations)),
        Box::new(Trash::new(locations)),
        Box::new(LargeFiles::new(locations)),
    ]
}

pub fn all_category_names() -> Vec<&'static str> {
    Category::ALL.iter().map(|c| c.name()).collect()
}

/// Reverse-DNS looking name such as `com.vendor.App`.
pub(crate) fn looks_like_bundle_id(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() >= 3
        && parts.iter().all(|p| !p.is_empty() && !p.contains(char::is_whitespace))
        && parts[0].chars().all(|c| c.is_ascii_lowercase())
}

/// Best-effort app name for a folder: last component of a bundle id,
/// otherwise the folder name itself.
pub(crate) fn app_name_for(name: &str) -> String {
    if looks_like_bundle_id(name) {
        name.rsplit('.').next().unwrap_or(name).to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_bundle_id() {
        assert!(looks_like_bundle_id("com.vendor.App"));
        assert!(looks_like_bundle_id("org.mozilla.firefox.helper"));
        assert!(!looks_like_bundle_id("Google"));
        assert!(!looks_like_bundle_id("com.vendor"));
        assert!(!looks_like_bundle_id("My App.v2.old"));
        assert!(!looks_like_bundle_id("com..App"));
    }

    #[test]
    fn test_app_name_for() {
        assert_eq!(app_name_for("com.spotify.client"), "client");
        assert_eq!(app_name_for("Homebrew"), "Homebrew");
    }

    #[test]
    fn test_default_scanners_cover_every_category() {
        let loc = Locations::from_home("/nonexistent-home");
        let mut covered: Vec<Category> = default_scanners(&loc)
            .iter()
            .flat_map(|s| s.categories())
            .collect();
        covered.sort();
        covered.dedup();
        assert_eq!(covered, Category::ALL.to_vec());
        assert_eq!(all_category_names().len(), 7);
    }
}
