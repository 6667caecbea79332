//! Recognized file extensions
//!
//! An [`ExtensionSet`] is an ordered, de-duplicated list of lower-case
//! suffixes, each carrying its leading dot. Matching is case-insensitive.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Extensions recognized when the user supplies none
pub const DEFAULT_EXTENSIONS: &[&str] = &[".gif", ".png", ".jpg", ".jpeg", ".mov", ".mp4"];

/// Ordered collection of recognized suffixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    extensions: Vec<String>,
}

impl ExtensionSet {
    /// Build a set from arbitrary user entries (`"jpg"`, `".PNG"`, ...)
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions: Vec<String> = Vec::new();
        for entry in entries {
            if let Some(ext) = normalize(entry.as_ref()) {
                if !extensions.contains(&ext) {
                    extensions.push(ext);
                }
            }
        }
        Self { extensions }
    }

    /// Parse a comma-separated list such as `"jpg, PNG"`
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Whether `name` ends in one of the recognized extensions
    pub fn matches(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .map(|ext| {
                let dotted = format!(".{}", ext.to_string_lossy().to_lowercase());
                self.extensions.contains(&dotted)
            })
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter())
    }
}

impl FromStr for ExtensionSet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extensions.join(", "))
    }
}

/// Strip all whitespace, lower-case and ensure a single leading dot
fn normalize(entry: &str) -> Option<String> {
    let cleaned: String = entry
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let bare = cleaned.trim_start_matches('.');
    if bare.is_empty() {
        None
    } else {
        Some(format!(".{}", bare))
    }
}

/// Lower-cased extension of `name` with its dot, or `""` when there is none
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
