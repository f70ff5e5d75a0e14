use async_trait::async_trait;
use tracing::debug;

use crate::{ProviderError, SlideRequest, TextGenerator};

const SECTIONS: [&str; 10] = [
    "Introduction",
    "Background",
    "Key Concepts",
    "Current Landscape",
    "Market and Growth",
    "Challenges",
    "Case Studies",
    "Best Practices",
    "Global Influence",
    "Future Prospects",
];

/// Canned outlines for demos and tests; never touches the network.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGenerator;

impl OfflineGenerator {
    pub fn new() -> Self {
        Self
    }

    fn outline_json(topic: &str, num_slides: usize) -> serde_json::Value {
        let topic = topic.trim();
        let slides: Vec<serde_json::Value> = (0..num_slides)
            .map(|i| {
                let section = SECTIONS[i % SECTIONS.len()];
                let title = if i < SECTIONS.len() {
                    format!("{section}: {topic}")
                } else {
                    format!("Aspect of {topic} {}", i + 1)
                };
                serde_json::json!({
                    "title": title,
                    "content": [
                        format!("What {section} means for {topic}"),
                        format!("{topic} point 1"),
                        format!("{topic} point 2"),
                        format!("{topic} point 3"),
                    ],
                    "imagePrompt": format!("Image related to {topic} - {section}"),
                })
            })
            .collect();

        serde_json::json!({
            "title": format!("Presentation on {topic}"),
            "slides": slides,
        })
    }
}

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn generate(&self, request: &SlideRequest) -> Result<String, ProviderError> {
        debug!(topic = %request.topic, slides = request.num_slides, "offline outline");
        serde_json::to_string_pretty(&Self::outline_json(&request.topic, request.num_slides))
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }

    fn name(&self) -> &str {
        "offline"
    }
}
