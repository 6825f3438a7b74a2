//! Find reclaimable disk space on a Mac and remove it safely.
//!
//! Scanners enumerate well-known locations and classify each item by how
//! safe it is to delete; the [`ScanEngine`] runs them concurrently and the
//! [`SafetyManager`] performs whitelist-gated removal.

pub mod categories;
pub mod cleaner;
pub mod engine;
pub mod error;
pub mod installed_apps;
pub mod locations;
pub mod safety;
pub mod utils;

pub use categories::default_scanners;
pub use cleaner::{
    summarize, Category, CleanupItem, CleanupResult, CleanupSummary, Language, Reason, RiskLevel,
    ScanResult, Scanner,
};
pub use engine::ScanEngine;
pub use error::{Error, Result};
pub use installed_apps::InstalledApps;
pub use locations::Locations;
pub use safety::{
    SafetyManager, Snapshotter, SystemTrash, TrashBin, TrashFallback, WHITELIST_MESSAGE,
};
