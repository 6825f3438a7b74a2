use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::cleaner::{Category, CleanupItem, ScanResult, Scanner};
use crate::error::{Error, Result};

/// Owns the registered scanners and runs them concurrently, one scan at a time.
#[derive(Default)]
pub struct ScanEngine {
    scanners: Mutex<Vec<Arc<dyn Scanner>>>,
    scanning: AtomicBool,
}

/// Clears the in-progress flag when the scan ends, however it ends.
struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ScanEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, scanner: impl Scanner + 'static) {
        self.lock_scanners().push(Arc::new(scanner));
    }

    pub fn register_all(&self, scanners: Vec<Box<dyn Scanner>>) {
        let mut registered = self.lock_scanners();
        registered.extend(scanners.into_iter().map(Arc::from));
    }

    pub fn scanner_count(&self) -> usize {
        self.lock_scanners().len()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// Run every registered scanner (or only those producing one of
    /// `categories`) concurrently and merge their items, largest first.
    ///
    /// Fails with [`Error::AlreadyScanning`] instead of waiting if another
    /// scan is running. Any scanner error fails the whole scan.
    pub fn scan(&self, categories: Option<&[Category]>) -> Result<ScanResult> {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::AlreadyScanning);
        }
        let _guard = ScanGuard(&self.scanning);

        let wanted = |c: &Category| categories.map_or(true, |cats| cats.contains(c));

        let selected: Vec<Arc<dyn Scanner>> = self
            .lock_scanners()
            .iter()
            .filter(|s| s.categories().iter().any(wanted))
            .cloned()
            .collect();

        let mut scanned_categories: Vec<Category> = Vec::new();
        for scanner in &selected {
            for c in scanner.categories() {
                if wanted(&c) && !scanned_categories.contains(&c) {
                    scanned_categories.push(c);
                }
            }
        }

        info!("Scanning {} categories with {} scanners", scanned_categories.len(), selected.len());
        let start = Instant::now();

        let batches: Vec<Vec<CleanupItem>> = selected
            .par_iter()
            .map(|scanner| {
                let items = scanner.scan()?;
                debug!("{} produced {} items", scanner.category().name(), items.len());
                Ok::<_, std::io::Error>(items)
            })
            .collect::<std::io::Result<_>>()?;

        let mut items: Vec<CleanupItem> = batches
            .into_iter()
            .flatten()
            .filter(|i| wanted(&i.category))
            .collect();
        items.sort_by(|a, b| b.size.cmp(&a.size));

        let result = ScanResult {
            items,
            scan_date: Utc::now(),
            duration: start.elapsed(),
            scanned_categories,
        };
        info!(
            "Scan completed in {:.2}s: {} items, {} bytes",
            result.duration.as_secs_f64(),
            result.items.len(),
            result.total_size(),
        );
        Ok(result)
    }

    fn lock_scanners(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn Scanner>>> {
        self.scanners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::{Reason, RiskLevel};
    use std::path::PathBuf;

    struct Fixed {
        category: Category,
        sizes: Vec<u64>,
    }

    impl Scanner for Fixed {
        fn category(&self) -> Category {
            self.category
        }

        fn scan(&self) -> std::io::Result<Vec<CleanupItem>> {
            Ok(self
                .sizes
                .iter()
                .map(|&size| {
                    CleanupItem::new(
                        PathBuf::from(format!("/fixed/{size}")),
                        size,
                        self.category,
                        RiskLevel::Safe,
                        Reason::new("fixed", "固定"),
                    )
                })
                .collect())
        }
    }

    struct Failing;

    impl Scanner for Failing {
        fn category(&self) -> Category {
            Category::Logs
        }

        fn scan(&self) -> std::io::Result<Vec<CleanupItem>> {
            Err(std::io::Error::other("disk vanished"))
        }
    }

    #[test]
    fn test_scan_merges_and_sorts() {
        let engine = ScanEngine::new();
        engine.register(Fixed { category: Category::UserCache, sizes: vec![100, 5] });
        engine.register(Fixed { category: Category::Logs, sizes: vec![200] });

        let result = engine.scan(None).unwrap();

        assert_eq!(result.total_size(), 305);
        let sizes: Vec<u64> = result.items.iter().map(|i| i.size).collect();
        assert_eq!(sizes, vec![200, 100, 5]);
        assert_eq!(result.scanned_categories, vec![Category::UserCache, Category::Logs]);
        assert!(!engine.is_scanning());
    }

    #[test]
    fn test_category_filter_selects_scanners() {
        let engine = ScanEngine::new();
        engine.register(Fixed { category: Category::UserCache, sizes: vec![1] });
        engine.register(Fixed { category: Category::Trash, sizes: vec![2] });

        let result = engine.scan(Some(&[Category::Trash])).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].category, Category::Trash);
        assert_eq!(result.scanned_categories, vec![Category::Trash]);
    }

    #[test]
    fn test_empty_engine_yields_empty_result() {
        let result = ScanEngine::new().scan(None).unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total_size(), 0);
        assert!(result.scanned_categories.is_empty());
    }

    #[test]
    fn test_one_failing_scanner_fails_the_scan() {
        let engine = ScanEngine::new();
        engine.register(Fixed { category: Category::UserCache, sizes: vec![1] });
        engine.register(Failing);

        let err = engine.scan(None).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        // the flag is released so the engine stays usable
        assert!(!engine.is_scanning());
        assert!(engine.scan(Some(&[Category::UserCache])).is_ok());
    }

    #[test]
    fn test_register_does_not_deduplicate() {
        let engine = ScanEngine::new();
        engine.register(Fixed { category: Category::Logs, sizes: vec![1] });
        engine.register_all(vec![Box::new(Fixed { category: Category::Logs, sizes: vec![1] })]);
        assert_eq!(engine.scanner_count(), 2);
        assert_eq!(engine.scan(None).unwrap().items.len(), 2);
    }
}
