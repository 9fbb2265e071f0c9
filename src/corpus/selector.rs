//! Picks the most recent readable posts for a publication.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::normalize::{normalize, title_case};
use super::types::PostSample;
use crate::TARGET_CORPUS;

/// Whether `key` can name a directory directly below the corpus root.
///
/// The key must be a single normal path component (no separators, `.` or
/// `..`) and must not contain empty dot-separated labels.
pub fn is_publication_key(key: &str) -> bool {
    let mut components = Path::new(key).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    single_normal && !key.contains(['/', '\\']) && key.split('.').all(|label| !label.is_empty())
}

/// Select up to `max_posts` normalized samples from `corpus_root/publication_key`,
/// newest first.
///
/// # Arguments
/// * `corpus_root` - Directory holding one subdirectory per publication host.
/// * `publication_key` - Host label naming the subdirectory to read.
/// * `max_posts` - Upper bound on the number of samples returned.
/// * `max_chars` - Character budget applied to each sample's text.
///
/// # Returns
/// * `Vec<PostSample>` - Possibly empty; a missing directory or a key that is
///   not a plain host label yields nothing.
pub fn select(
    corpus_root: &Path,
    publication_key: &str,
    max_posts: usize,
    max_chars: usize,
) -> Vec<PostSample> {
    if !is_publication_key(publication_key) {
        warn!(target: TARGET_CORPUS, "Refusing publication key {:?}", publication_key);
        return Vec::new();
    }
    let blog_dir = corpus_root.join(publication_key);
    if !blog_dir.is_dir() {
        info!(target: TARGET_CORPUS, "No corpus directory at {}", blog_dir.display());
        return Vec::new();
    }

    let candidates = candidates_by_recency(&blog_dir);
    debug!(target: TARGET_CORPUS, "Found {} candidate files under {}", candidates.len(), blog_dir.display());

    let mut samples = Vec::new();
    for path in candidates {
        if samples.len() >= max_posts {
            break;
        }

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(target: TARGET_CORPUS, "Skipping unreadable file {}: {}", path.display(), e);
                continue;
            }
        };
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => {
                debug!(target: TARGET_CORPUS, "Skipping non-UTF-8 file {}", path.display());
                continue;
            }
        };

        let text = normalize(&content, max_chars);
        if text.is_empty() {
            debug!(target: TARGET_CORPUS, "Skipping empty file {}", path.display());
            continue;
        }

        let title = path
            .file_name()
            .map(|name| title_from_file_name(&name.to_string_lossy()))
            .unwrap_or_default();
        samples.push(PostSample {
            title,
            text,
            origin: path,
        });
    }

    info!(target: TARGET_CORPUS, "Selected {} samples for {}", samples.len(), publication_key);
    samples
}

/// Turn a scraped file name such as `my-first-post.txt` into `My First Post.Txt`.
pub fn title_from_file_name(file_name: &str) -> String {
    title_case(&file_name.replace('-', " "))
}

/// Every regular file below `dir`, newest modification first. Equal times
/// fall back to ascending path order so runs are reproducible.
fn candidates_by_recency(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<(SystemTime, PathBuf)> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(target: TARGET_CORPUS, "Failed to read corpus entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let modified = entry
                .metadata()
                .ok()
                .and_then(|meta| meta.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.into_path())
        })
        .collect();

    files.sort_by(|(a_time, a_path), (b_time, b_path)| {
        b_time.cmp(a_time).then_with(|| a_path.cmp(b_path))
    });
    files.into_iter().map(|(_, path)| path).collect()
}
