use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tokens too generic to count as evidence that an app is installed.
const STOP_TOKENS: &[&str] = &["com", "org", "net", "app", "mac", "macos", "helper", "the"];

const MIN_TOKEN_LEN: usize = 3;

/// Identifiers and name variants of every installed application.
///
/// Everything is stored lowercased. Besides the bundle identifiers the set
/// holds loose variants (vendor token, last identifier component, camel-case
/// and space-separated words of the app name, `CFBundleName`) so data left by
/// an app with an unconventional identifier is still recognized. Broader
/// matching means fewer false orphans and some real orphans missed.
#[derive(Debug, Clone, Default)]
pub struct InstalledApps {
    known: HashSet<String>,
}

struct BundleInfo {
    identifier: Option<String>,
    bundle_name: Option<String>,
    file_stem: String,
}

impl InstalledApps {
    /// Read every `.app` bundle's `Info.plist` in the given directories.
    /// Unreadable directories and bundles are skipped.
    pub fn load(app_dirs: &[PathBuf]) -> Self {
        let app_paths: Vec<PathBuf> = app_dirs
            .iter()
            .filter_map(|dir| std::fs::read_dir(dir).ok())
            .flat_map(|rd| rd.filter_map(|e| e.ok()).map(|e| e.path()))
            .filter(|p| p.is_dir() && p.extension().is_some_and(|e| e == "app"))
            .collect();

        let bundles: Vec<BundleInfo> = app_paths.par_iter().map(|p| read_bundle(p)).collect();

        let mut apps = Self::default();
        for bundle in &bundles {
            apps.insert_variants(
                bundle.identifier.as_deref(),
                bundle.bundle_name.as_deref(),
                &bundle.file_stem,
            );
        }
        debug!(
            "Loaded {} installed apps ({} known identifiers and names)",
            bundles.len(),
            apps.known.len()
        );
        apps
    }

    /// Build the set directly from bundle identifiers.
    pub fn from_identifiers<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut apps = Self::default();
        for id in ids {
            apps.insert_variants(Some(id.as_ref()), None, "");
        }
        apps
    }

    pub fn contains(&self, token: &str) -> bool {
        self.known.contains(&token.to_lowercase())
    }

    /// True if the identifier, or any of its components past the top-level
    /// domain, belongs to an installed app.
    pub fn recognizes(&self, identifier: &str) -> bool {
        let id = identifier.to_lowercase();
        if self.known.contains(&id) {
            return true;
        }
        id.split('.')
            .skip(1)
            .any(|part| is_token(part) && self.known.contains(part))
    }

    fn insert_variants(
        &mut self,
        identifier: Option<&str>,
        bundle_name: Option<&str>,
        file_stem: &str,
    ) {
        if let Some(id) = identifier {
            self.known.insert(id.to_lowercase());
            let parts: Vec<&str> = id.split('.').collect();
            if parts.len() >= 2 {
                self.insert_token(parts[1]);
            }
            if let Some(last) = parts.last() {
                self.insert_name(last);
            }
        }
        if let Some(name) = bundle_name {
            self.insert_name(name);
        }
        if !file_stem.is_empty() {
            self.insert_name(file_stem);
        }
    }

    /// A display name, its spaceless form, and its words.
    fn insert_name(&mut self, name: &str) {
        self.insert_token(name);
        self.insert_token(&name.replace(' ', ""));
        for word in name.split_whitespace() {
            self.insert_token(word);
        }
        for word in split_camel_case(name) {
            self.insert_token(&word);
        }
    }

    fn insert_token(&mut self, token: &str) {
        let token = token.trim().to_lowercase();
        if is_token(&token) {
            self.known.insert(token);
        }
    }
}

fn is_token(s: &str) -> bool {
    s.chars().count() >= MIN_TOKEN_LEN && !STOP_TOKENS.contains(&s)
}

/// "VisualStudioCode" -> ["Visual", "Studio", "Code"]. Acronym runs stay whole.
fn split_camel_case(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in s.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_numeric();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn read_bundle(app_path: &Path) -> BundleInfo {
    let file_stem = app_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let plist_path = app_path.join("Contents/Info.plist");
    let value = match plist::Value::from_file(&plist_path) {
        Ok(v) => v,
        Err(e) => {
            debug!("Cannot read {}: {e}", plist_path.display());
            return BundleInfo {
                identifier: None,
                bundle_name: None,
                file_stem,
            };
        }
    };

    let dict = value.as_dictionary();
    let string_key = |key: &str| {
        dict.and_then(|d| d.get(key))
            .and_then(|v| v.as_string())
            .map(str::to_string)
    };

    BundleInfo {
        identifier: string_key("CFBundleIdentifier"),
        bundle_name: string_key("CFBundleName"),
        file_stem,
    }
}
