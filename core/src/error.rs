use slide_protocol::ErrorKind;
use slide_provider::ProviderError;
use thiserror::Error;

/// Errors surfaced while turning a topic into a deck.
#[derive(Error, Debug)]
pub enum SlideError {
    /// Bad user input (empty topic, slide count out of range); nothing was sent to the provider.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The provider call itself failed (transport, HTTP status, timeout).
    #[error("Generation failed: {0}")]
    Generation(#[from] ProviderError),

    /// The provider answered, but not with a usable outline.
    #[error("Malformed outline: {0}")]
    Format(#[from] FormatError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a provider response could not be coerced into an outline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON object at the top level")]
    NotAnObject,

    #[error("missing or empty presentation title")]
    MissingTitle,

    #[error("`slides` is missing or not an array")]
    MissingSlides,

    #[error("slide {index} is not an object")]
    SlideNotAnObject { index: usize },

    #[error("slide {index} has no title")]
    SlideMissingTitle { index: usize },

    #[error("expected {expected} slides, got {actual}")]
    SlideCountMismatch { expected: usize, actual: usize },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SlideError>;

impl SlideError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SlideError::Validation(_) => ErrorKind::Validation,
            SlideError::Format(_) | SlideError::Json(_) => ErrorKind::Format,
            SlideError::Generation(_) | SlideError::Io(_) => ErrorKind::Generation,
        }
    }
}

/// Error reporting utilities
pub struct ErrorReporter;

impl ErrorReporter {
    /// Format error for user display.
    ///
    /// Provider and format failures read the same to the user; logs keep them apart.
    pub fn format_user_error(error: &SlideError) -> String {
        match error {
            SlideError::Validation(reason) => format!("Cannot generate: {reason}."),
            SlideError::Generation(ProviderError::MissingApiKey(var)) => {
                format!("Generation failed: no API key configured. Set {var} and try again.")
            }
            _ => "Generation failed: could not generate presentation content. Please try again."
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_and_format_read_the_same() {
        let generation = SlideError::Generation(ProviderError::RateLimited);
        let format = SlideError::Format(FormatError::MissingTitle);
        assert_eq!(
            ErrorReporter::format_user_error(&generation),
            ErrorReporter::format_user_error(&format)
        );
        assert_eq!(generation.kind(), ErrorKind::Generation);
        assert_eq!(format.kind(), ErrorKind::Format);
    }

    #[test]
    fn validation_message_mentions_topic() {
        let err = SlideError::Validation("topic is empty".into());
        assert!(ErrorReporter::format_user_error(&err).contains("topic"));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn slide_count_message_names_the_count() {
        let err = SlideError::Validation("slide count must be between 4 and 10, got 11".into());
        let msg = ErrorReporter::format_user_error(&err);
        assert!(msg.contains("between 4 and 10, got 11"));
        assert!(!msg.contains("topic"));
    }
}
