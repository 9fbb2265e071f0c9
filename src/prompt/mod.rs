// Declare submodules
mod common;
mod style;

pub use common::*;
pub use style::{metrics_summary, sample_payload, style_messages, StyleMessages};
