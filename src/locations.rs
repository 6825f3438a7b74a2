use std::path::PathBuf;

use crate::error::{Error, Result};

/// Where the scanners look. Passed explicitly so nothing reads global state
/// and tests can point every scanner at a scratch directory.
#[derive(Debug, Clone)]
pub struct Locations {
    pub home: PathBuf,
    /// Directories holding installed `.app` bundles.
    pub applications: Vec<PathBuf>,
    pub trash: PathBuf,
}

impl Locations {
    /// The current user's layout: `/Applications`, `~/Applications`, `~/.Trash`.
    pub fn detect() -> Result<Self> {
        let home = dirs::home_dir().ok_or(Error::HomeDirUnavailable)?;
        Ok(Self {
            applications: vec![PathBuf::from("/Applications"), home.join("Applications")],
            trash: home.join(".Trash"),
            home,
        })
    }

    /// Same layout rooted at an arbitrary home, with `<home>/Applications`
    /// as the only applications directory.
    pub fn from_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            applications: vec![home.join("Applications")],
            trash: home.join(".Trash"),
            home,
        }
    }

    pub fn library(&self) -> PathBuf {
        self.home.join("Library")
    }

    pub fn caches(&self) -> PathBuf {
        self.library().join("Caches")
    }

    pub fn logs(&self) -> PathBuf {
        self.library().join("Logs")
    }

    pub fn preferences(&self) -> PathBuf {
        self.library().join("Preferences")
    }

    pub fn containers(&self) -> PathBuf {
        self.library().join("Containers")
    }

    pub fn application_support(&self) -> PathBuf {
        self.library().join("Application Support")
    }
}
