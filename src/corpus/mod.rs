//! Corpus sampling for Stylegen.
//!
//! This module turns a directory of scraped posts into a bounded, ordered set
//! of normalized samples.

mod normalize;
mod selector;
mod types;

pub use self::normalize::{normalize, title_case, ELLIPSIS};
pub use self::selector::{is_publication_key, select, title_from_file_name};
pub use self::types::PostSample;
