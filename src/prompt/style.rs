use crate::corpus::{title_case, PostSample};
use crate::metrics::CorpusMetrics;
use crate::prompt::common::{STYLE_ANALYST_SYSTEM, STYLE_TASK};

/// The system/user message pair sent to the generative service.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleMessages {
    pub system: String,
    pub user: String,
}

/// Render samples as numbered blocks separated by a blank line.
pub fn sample_payload(samples: &[PostSample]) -> String {
    samples
        .iter()
        .enumerate()
        .map(|(idx, sample)| format!("### Sample {}: {}\n{}", idx + 1, sample.title, sample.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render metrics one per line, e.g. `- Avg Sentence Length: 14.20`.
pub fn metrics_summary(metrics: &CorpusMetrics) -> String {
    metrics
        .entries()
        .into_iter()
        .map(|(key, value)| format!("- {}: {}", title_case(&key.replace('_', " ")), value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the analyst instruction and the user request for a publication.
pub fn style_messages(host: &str, samples: &[PostSample], metrics: &CorpusMetrics) -> StyleMessages {
    let user = format!(
        r#"Source publication: {host}

Here are lightly cleaned excerpts from recent posts:
{samples}

Observational metrics:
{metrics}

{task}"#,
        host = host,
        samples = sample_payload(samples),
        metrics = metrics_summary(metrics),
        task = STYLE_TASK,
    );

    StyleMessages {
        system: STYLE_ANALYST_SYSTEM.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn samples() -> Vec<PostSample> {
        vec![
            PostSample {
                title: "Why I Write".to_string(),
                text: "Short sentences. Strong verbs.".to_string(),
                origin: PathBuf::from("blogs/example.substack.com/why-i-write"),
            },
            PostSample {
                title: "On Editing".to_string(),
                text: "Cut the adverbs.".to_string(),
                origin: PathBuf::from("blogs/example.substack.com/on-editing"),
            },
        ]
    }

    fn metrics() -> CorpusMetrics {
        CorpusMetrics {
            average_sentence_length: 2.33,
            top_keywords: vec!["sentences".to_string(), "verbs".to_string()],
            sample_count: 2,
            total_tokens: 7,
        }
    }

    #[test]
    fn test_sample_payload_blocks() {
        assert_eq!(
            sample_payload(&samples()),
            "### Sample 1: Why I Write\nShort sentences. Strong verbs.\n\n\
             ### Sample 2: On Editing\nCut the adverbs."
        );
        assert_eq!(sample_payload(&[]), "");
    }

    #[test]
    fn test_metrics_summary_labels() {
        assert_eq!(
            metrics_summary(&metrics()),
            "- Avg Sentence Length: 2.33\n\
             - Top Keywords: sentences, verbs\n\
             - Sample Count: 2\n\
             - Total Tokens: 7"
        );
    }

    #[test]
    fn test_style_messages() {
        let messages = style_messages("example.substack.com", &samples(), &metrics());
        assert_eq!(messages.system, STYLE_ANALYST_SYSTEM);
        assert!(messages.system.contains("editorial analyst"));

        let user = &messages.user;
        assert!(user.starts_with("Source publication: example.substack.com\n\n"));
        let first = user.find("### Sample 1: Why I Write").unwrap();
        let second = user.find("### Sample 2: On Editing").unwrap();
        let metrics_at = user.find("Observational metrics:\n- Avg Sentence Length").unwrap();
        let task_at = user.find("Task:").unwrap();
        assert!(first < second && second < metrics_at && metrics_at < task_at);
        assert!(user.ends_with("demonstrates the style."));
    }

    #[test]
    fn test_task_names_every_section() {
        let sections = [
            "voice",
            "tone",
            "pacing",
            "structure",
            "rhetorical patterns",
            "vocabulary",
            "editorial rules",
            "dos and don'ts",
            "checklist",
        ];
        for section in sections {
            assert!(STYLE_TASK.contains(section), "missing {}", section);
        }
        assert!(STYLE_TASK.contains("sample paragraph"));
    }
}
