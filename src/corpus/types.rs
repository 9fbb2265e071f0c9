//! Type definitions for the corpus module.

use std::path::{Path, PathBuf};

/// One normalized excerpt taken from a single scraped post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSample {
    pub title: String,
    pub text: String,
    pub origin: PathBuf,
}

impl PostSample {
    /// Origin relative to `root`, falling back to the full path when the
    /// sample does not live under it.
    pub fn relative_origin(&self, root: &Path) -> String {
        self.origin
            .strip_prefix(root)
            .unwrap_or(&self.origin)
            .to_string_lossy()
            .into_owned()
    }
}
