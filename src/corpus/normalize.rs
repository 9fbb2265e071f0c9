//! Whitespace cleanup and length clamping for post text.

/// Marker appended to text that was cut to fit the character budget.
pub const ELLIPSIS: &str = "...";

/// Collapse every whitespace run to a single space and clamp the result to
/// `max_chars` characters, ending truncated text with [`ELLIPSIS`].
///
/// Lengths are counted in characters, not bytes.
pub fn normalize(raw: &str, max_chars: usize) -> String {
    let condensed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if condensed.chars().count() <= max_chars {
        return condensed;
    }

    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut clipped: String = condensed.chars().take(keep).collect();
    clipped.truncate(clipped.trim_end().len());
    clipped.push_str(ELLIPSIS);
    clipped
}

/// Capitalize every letter that does not follow another letter and lowercase
/// the rest, e.g. `"don't STOP"` becomes `"Don'T Stop"`.
pub fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if previous_is_letter {
            titled.extend(c.to_lowercase());
        } else {
            titled.extend(c.to_uppercase());
        }
        previous_is_letter = c.is_alphabetic();
    }
    titled
}
