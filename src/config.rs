use serde::Deserialize;
use std::ops::RangeInclusive;

use crate::error::{Result, StyleGenError};
use crate::LLMParams;

pub const MAX_POSTS_RANGE: RangeInclusive<usize> = 1..=15;
pub const MAX_CHARS_RANGE: RangeInclusive<usize> = 500..=8000;
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=1.5;

pub const DEFAULT_MAX_POSTS: usize = 5;
pub const DEFAULT_MAX_CHARS_PER_POST: usize = 2000;
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Caller-supplied limits and model choice for one profiling run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyleRequestConfig {
    pub max_posts: usize,
    pub max_chars_per_post: usize,
    pub model: String,
    pub temperature: f32,
}

impl Default for StyleRequestConfig {
    fn default() -> Self {
        Self {
            max_posts: DEFAULT_MAX_POSTS,
            max_chars_per_post: DEFAULT_MAX_CHARS_PER_POST,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl StyleRequestConfig {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !MAX_POSTS_RANGE.contains(&self.max_posts) {
            return Err(StyleGenError::InvalidRequest(format!(
                "max_posts must be between {} and {}, got {}",
                MAX_POSTS_RANGE.start(),
                MAX_POSTS_RANGE.end(),
                self.max_posts
            )));
        }
        if !MAX_CHARS_RANGE.contains(&self.max_chars_per_post) {
            return Err(StyleGenError::InvalidRequest(format!(
                "max_chars_per_post must be between {} and {}, got {}",
                MAX_CHARS_RANGE.start(),
                MAX_CHARS_RANGE.end(),
                self.max_chars_per_post
            )));
        }
        if !TEMPERATURE_RANGE.contains(&self.temperature) {
            return Err(StyleGenError::InvalidRequest(format!(
                "temperature must be between {} and {}, got {}",
                TEMPERATURE_RANGE.start(),
                TEMPERATURE_RANGE.end(),
                self.temperature
            )));
        }
        if self.model.trim().is_empty() {
            return Err(StyleGenError::InvalidRequest(
                "model must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn llm_params(&self) -> LLMParams {
        LLMParams {
            model: self.model.clone(),
            temperature: self.temperature,
        }
    }
}
