//! Post generator stage: a summary to a fixed number of social posts.

use std::sync::Arc;

use tracing::{info, warn};

use rp_core::{CompletionRequest, Credentials, Error, Message, Provider};

use crate::config::LlmSettings;
use crate::summarizer::strip_references;

pub struct PostGenerator {
    provider: Arc<dyn Provider>,
    llm: LlmSettings,
}

impl PostGenerator {
    pub fn new(provider: Arc<dyn Provider>, llm: LlmSettings) -> Self {
        Self { provider, llm }
    }

    fn system_prompt(tone: &str, count: usize) -> String {
        format!(
            "You write social media posts about research. Write exactly {count} distinct posts \
in a {tone} tone. Number each post on its own line starting with \"1.\", \"2.\" and so on up \
to \"{count}.\", and do not add any text before the first post or after the last one.\n\
Each post must:\n\
- Stand on its own, readable without the others\n\
- Be 3-5 paragraphs long\n\
- Be insightful and informative, and avoid jargon\n\
- End with 3-5 relevant hashtags"
        )
    }

    /// Ask the LLM for `count` posts and split the answer.
    ///
    /// Returns at most `count` posts. A count of zero makes no call.
    pub async fn generate_posts(
        &self,
        summary: &str,
        tone: &str,
        count: usize,
        credentials: &Credentials,
    ) -> Result<Vec<String>, Error> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let api_key = credentials.require_llm("posts")?;
        let tone = if tone.trim().is_empty() {
            "professional"
        } else {
            tone.trim()
        };

        info!(count, tone, "Generating posts");
        let request = CompletionRequest::new(vec![
            Message::system(Self::system_prompt(tone, count)),
            Message::user(format!(
                "Create {} posts based on this summary:\n\n{}",
                count,
                strip_references(summary)
            )),
        ])
        .with_model(&self.llm.model)
        .with_temperature(self.llm.temperature);

        let response = self.provider.complete(api_key, request).await?;
        let posts = parse_posts(response.text(), count);
        if posts.len() < count {
            warn!(requested = count, received = posts.len(), "Fewer posts than requested");
        }
        Ok(posts)
    }
}

/// Split a numbered list into posts.
///
/// Markers must appear in sequence (`1.`, `2.`, ...) at the start of a line.
/// A marker out of sequence or beyond `count` stays inside the current post.
/// Text before the first marker is dropped. Without any marker the whole
/// trimmed text is one post.
pub fn parse_posts(text: &str, count: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() || count == 0 {
        return Vec::new();
    }

    let mut posts: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let next = posts.len() + usize::from(current.is_some()) + 1;
        let marker = if next <= count {
            strip_marker(line, next)
        } else {
            None
        };

        match marker {
            Some(rest) => {
                if let Some(done) = current.take() {
                    posts.push(done);
                }
                current = Some(rest.to_string());
            }
            None => {
                if let Some(post) = current.as_mut() {
                    post.push('\n');
                    post.push_str(line);
                }
            }
        }
    }
    if let Some(done) = current {
        posts.push(done);
    }

    if posts.is_empty() {
        return vec![text.to_string()];
    }

    posts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// The text after a leading `N.` marker, if `line` starts with one.
fn strip_marker(line: &str, number: usize) -> Option<&str> {
    let trimmed = line.trim_start();
    let trimmed = trimmed.strip_prefix("**").unwrap_or(trimmed);
    let rest = trimmed.strip_prefix(&number.to_string())?;
    let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
    let rest = rest.strip_prefix("**").unwrap_or(rest);
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_core::testing::{test_credentials, MockProvider};
    use rp_core::Role;

    #[test]
    fn test_parse_three_numbered_posts() {
        let text = "1. Quantum leaps! #quantum\n2. Qubits are weird. #physics\n3. The future is superposed. #tech";
        let posts = parse_posts(text, 3);
        assert_eq!(
            posts,
            vec![
                "Quantum leaps! #quantum",
                "Qubits are weird. #physics",
                "The future is superposed. #tech",
            ]
        );
    }

    #[test]
    fn test_parse_without_markers_is_one_post() {
        let text = "  A single post with no numbering.\nSecond line.  ";
        assert_eq!(
            parse_posts(text, 3),
            vec!["A single post with no numbering.\nSecond line."]
        );
    }

    #[test]
    fn test_parse_drops_preamble() {
        let text = "Here are your posts:\n\n1. First\n2. Second";
        assert_eq!(parse_posts(text, 2), vec!["First", "Second"]);
    }

    #[test]
    fn test_parse_multiline_posts() {
        let text = "1. Headline\nMore detail.\n\n2. Another";
        assert_eq!(parse_posts(text, 2), vec!["Headline\nMore detail.", "Another"]);
    }

    #[test]
    fn test_parse_markers_beyond_count_stay_in_last_post() {
        let text = "1. One\n2. Two\n3. Three";
        assert_eq!(parse_posts(text, 2), vec!["One", "Two\n3. Three"]);
    }

    #[test]
    fn test_parse_out_of_sequence_marker_is_text() {
        let text = "1. Costs fell by\n2025. Experts agree.\n2. Next";
        assert_eq!(
            parse_posts(text, 3),
            vec!["Costs fell by\n2025. Experts agree.", "Next"]
        );
    }

    #[test]
    fn test_parse_bold_and_paren_markers() {
        let text = "**1.** Bold one\n2) Paren two";
        assert_eq!(parse_posts(text, 2), vec!["Bold one", "Paren two"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_posts("", 3).is_empty());
        assert!(parse_posts("  \n ", 3).is_empty());
        assert!(parse_posts("1. x", 0).is_empty());
    }

    #[tokio::test]
    async fn test_generate_posts() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_response("1. Alpha\n2. Beta\n3. Gamma");
        let generator = PostGenerator::new(provider.clone(), LlmSettings::default());

        let summary = "Prose.\n\n**References:**\n1. [a](https://a.test)";
        let posts = generator
            .generate_posts(summary, "witty", 3, &test_credentials())
            .await
            .unwrap();
        assert_eq!(posts, vec!["Alpha", "Beta", "Gamma"]);

        let request = provider.last_request().unwrap();
        let system = request.content_for(Role::System).unwrap();
        assert!(system.contains("exactly 3"));
        assert!(system.contains("witty"));
        assert!(system.contains("3-5 relevant hashtags"));
        assert!(system.contains("3-5 paragraphs"));
        assert!(system.contains("\"3.\""));
        assert!(!system.contains("280 characters"));
        let user = request.content_for(Role::User).unwrap();
        assert!(user.contains("Prose."));
        assert!(!user.contains("References"));
    }

    #[tokio::test]
    async fn test_generate_zero_posts_makes_no_call() {
        let provider = Arc::new(MockProvider::new());
        let generator = PostGenerator::new(provider.clone(), LlmSettings::default());
        let posts = generator
            .generate_posts("summary", "professional", 0, &test_credentials())
            .await
            .unwrap();
        assert!(posts.is_empty());
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_posts_provider_error() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_error(Error::rate_limit("slow down"));
        let generator = PostGenerator::new(provider, LlmSettings::default());
        let err = generator
            .generate_posts("summary", "professional", 3, &test_credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateLimit(_)));
    }
}
