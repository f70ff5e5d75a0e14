//! Outline requests: prompt construction, fence stripping and schema repair.

use regex::Regex;
use serde_json::{Map, Value};
use slide_common::{Outline, SlideDraft};
use slide_provider::{ProviderError, SlideRequest, TextGenerator};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{FormatError, Result, SlideError};

/// Bullets kept per slide; extra bullets from the provider are dropped.
pub const MAX_BULLETS: usize = 6;

#[allow(clippy::unwrap_used)]
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A\s*```[ \t]*(?i:json)?[ \t]*\r?\n?(.*?)\s*```\s*\z").unwrap()
});

/// Instruction sent to the text-generation provider.
pub fn build_prompt(topic: &str, slide_count: usize) -> String {
    format!(
        r#"Create a professional presentation about "{topic}" with exactly {slide_count} slides.
Structure each slide with:
1. A clear, concise title
2. 4-6 bullet points of relevant content, each at most 20 words
3. A prompt describing an image that would work well with the slide content

Include data points that could be visualized in charts (every 4th slide should have numerical data that could be shown in a chart).

Format your response as a JSON object with this structure:
{{
  "title": "Main Presentation Title",
  "slides": [
    {{
      "title": "Slide 1 Title",
      "content": ["Bullet point 1", "Bullet point 2", "Bullet point 3", "Bullet point 4"],
      "imagePrompt": "Description for image generation"
    }}
  ]
}}

Return strict JSON only, without explanations or markdown formatting."#
    )
}

/// Image prompt used when the provider did not supply one.
pub fn default_image_prompt(slide_title: &str, topic: &str) -> String {
    format!("High quality professional presentation image about {slide_title} related to {topic}")
}

/// Unwrap a response enclosed in a ``` fence (optionally tagged `json`).
///
/// Text that is not wrapped in a fence is returned unchanged.
pub fn strip_code_fence(raw: &str) -> &str {
    FENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or(raw, |m| m.as_str())
}

/// Check a provider response against the outline schema and repair what can be repaired.
pub fn parse_outline(raw: &str, topic: &str) -> std::result::Result<Outline, FormatError> {
    let body = strip_code_fence(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|e| FormatError::InvalidJson(e.to_string()))?;
    let root = value.as_object().ok_or(FormatError::NotAnObject)?;

    let title = root
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(FormatError::MissingTitle)?;

    let raw_slides = root
        .get("slides")
        .and_then(Value::as_array)
        .ok_or(FormatError::MissingSlides)?;

    let slides = raw_slides
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let entry = entry
                .as_object()
                .ok_or(FormatError::SlideNotAnObject { index })?;
            parse_slide(index, entry, topic)
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Outline {
        title: title.to_string(),
        slides,
    })
}

fn parse_slide(
    index: usize,
    entry: &Map<String, Value>,
    topic: &str,
) -> std::result::Result<SlideDraft, FormatError> {
    let title = match entry.get("title") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(FormatError::SlideMissingTitle { index }),
    };

    let content = match entry.get("content") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(bullet_text)
            .take(MAX_BULLETS)
            .collect(),
        _ => Vec::new(),
    };

    let image_prompt = entry
        .get("imagePrompt")
        .or_else(|| entry.get("image_prompt"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_image_prompt(&title, topic));

    Ok(SlideDraft {
        title,
        content,
        image_prompt,
    })
}

fn bullet_text(item: &Value) -> Option<String> {
    match item {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Asks the provider for an outline and validates the answer.
pub struct OutlineRequester {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl OutlineRequester {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn provider_name(&self) -> &str {
        self.generator.name()
    }

    /// Request an outline with exactly `slide_count` slides.
    ///
    /// No retry happens here; the caller decides whether to ask again.
    pub async fn request(&self, topic: &str, slide_count: usize) -> Result<Outline> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SlideError::Validation(
                "topic is empty; describe what the presentation is about".to_string(),
            ));
        }

        let request = SlideRequest {
            prompt: build_prompt(topic, slide_count),
            topic: topic.to_string(),
            num_slides: slide_count,
        };
        info!(provider = self.generator.name(), %topic, slide_count, "requesting outline");

        let raw = match tokio::time::timeout(self.timeout, self.generator.generate(&request)).await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                error!(provider = self.generator.name(), "outline request failed: {e}");
                return Err(e.into());
            }
            Err(_) => {
                error!(provider = self.generator.name(), timeout = ?self.timeout, "outline request timed out");
                return Err(ProviderError::Timeout(self.timeout).into());
            }
        };
        debug!(bytes = raw.len(), "provider responded");

        let outline = parse_outline(&raw, topic).inspect_err(|e| {
            warn!(bytes = strip_code_fence(&raw).len(), reason = %e, "provider response rejected");
        })?;

        if outline.slides.len() != slide_count {
            let err = FormatError::SlideCountMismatch {
                expected: slide_count,
                actual: outline.slides.len(),
            };
            warn!(reason = %err, "provider response rejected");
            return Err(err.into());
        }

        Ok(outline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    const PAYLOAD: &str = r#"{
        "title": "Solar Power",
        "slides": [
            {"title": "Intro", "content": ["a", "b", "c"], "imagePrompt": "solar panels on a roof"},
            {"title": "Costs", "content": ["x"]}
        ]
    }"#;

    #[test]
    fn fenced_and_plain_payloads_parse_identically() {
        let plain = parse_outline(PAYLOAD, "energy").unwrap();
        for wrapped in [
            format!("```json\n{PAYLOAD}\n```"),
            format!("```\n{PAYLOAD}\n```"),
            format!("  ```JSON\r\n{PAYLOAD}\r\n```  \n"),
        ] {
            assert_eq!(parse_outline(&wrapped, "energy").unwrap(), plain);
        }
    }

    #[test]
    fn unfenced_text_is_left_alone() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
    }

    #[test]
    fn missing_image_prompt_is_synthesized_from_title_and_topic() {
        let outline = parse_outline(PAYLOAD, "Renewable Energy").unwrap();
        let prompt = &outline.slides[1].image_prompt;
        assert!(prompt.contains("Costs"));
        assert!(prompt.contains("Renewable Energy"));
        assert_eq!(outline.slides[0].image_prompt, "solar panels on a roof");
    }

    #[test]
    fn content_is_truncated_to_six_in_order() {
        let raw = r#"{"title": "T", "slides": [
            {"title": "s", "content": ["1","2","3","4","5","6","7","8","9"], "imagePrompt": ""}
        ]}"#;
        let outline = parse_outline(raw, "t").unwrap();
        assert_eq!(outline.slides[0].content, vec!["1", "2", "3", "4", "5", "6"]);
        assert!(outline.slides[0].image_prompt.starts_with("High quality"));
    }

    #[test]
    fn non_array_content_becomes_empty() {
        let raw = r#"{"title": "T", "slides": [{"title": "s", "content": "just text"}]}"#;
        let outline = parse_outline(raw, "t").unwrap();
        assert!(outline.slides[0].content.is_empty());
    }

    #[test]
    fn schema_violations_are_format_errors() {
        assert!(matches!(
            parse_outline("Sure! Here is your deck.", "t"),
            Err(FormatError::InvalidJson(_))
        ));
        assert_eq!(parse_outline("[]", "t"), Err(FormatError::NotAnObject));
        assert_eq!(
            parse_outline(r#"{"title": "  ", "slides": []}"#, "t"),
            Err(FormatError::MissingTitle)
        );
        assert_eq!(
            parse_outline(r#"{"title": "T", "slides": {}}"#, "t"),
            Err(FormatError::MissingSlides)
        );
        assert_eq!(
            parse_outline(r#"{"title": "T", "slides": ["oops"]}"#, "t"),
            Err(FormatError::SlideNotAnObject { index: 0 })
        );
    }

    #[test]
    fn prompt_mentions_topic_count_and_json() {
        let prompt = build_prompt("Renewable Energy", 5);
        assert!(prompt.contains("\"Renewable Energy\""));
        assert!(prompt.contains("exactly 5 slides"));
        assert!(prompt.contains("imagePrompt"));
        assert!(prompt.contains("20 words"));
    }

    struct Canned(std::result::Result<String, ()>);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _request: &SlideRequest) -> std::result::Result<String, ProviderError> {
            self.0
                .clone()
                .map_err(|_| ProviderError::Network("connection reset".into()))
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    struct Hanging;

    #[async_trait]
    impl TextGenerator for Hanging {
        async fn generate(&self, _request: &SlideRequest) -> std::result::Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }

        fn name(&self) -> &str {
            "hanging"
        }
    }

    fn requester(generator: impl TextGenerator + 'static) -> OutlineRequester {
        OutlineRequester::new(Arc::new(generator), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn empty_topic_is_rejected_before_any_call() {
        let err = requester(Canned(Err(()))).request("   ", 5).await.unwrap_err();
        assert!(matches!(err, SlideError::Validation(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_generation_error() {
        let err = requester(Canned(Err(()))).request("Topic", 2).await.unwrap_err();
        assert!(matches!(err, SlideError::Generation(ProviderError::Network(_))));
    }

    #[tokio::test]
    async fn slide_count_mismatch_is_format_error() {
        let err = requester(Canned(Ok(PAYLOAD.to_string())))
            .request("Topic", 4)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SlideError::Format(FormatError::SlideCountMismatch { expected: 4, actual: 2 })
        ));
    }

    #[tokio::test]
    async fn matching_count_succeeds() {
        let outline = requester(Canned(Ok(format!("```json\n{PAYLOAD}\n```"))))
            .request("Topic", 2)
            .await
            .unwrap();
        assert_eq!(outline.slides.len(), 2);
        assert_eq!(outline.title, "Solar Power");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let requester = OutlineRequester::new(Arc::new(Hanging), Duration::from_secs(30));
        let err = requester.request("Topic", 4).await.unwrap_err();
        assert!(matches!(err, SlideError::Generation(ProviderError::Timeout(_))));
    }
}
