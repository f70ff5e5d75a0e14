use serde::{Deserialize, Serialize};
use slide_common::{Deck, ThemeId};

/// Monotonically increasing id assigned to each generation request.
pub type Seq = u64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    SessionConfigured { provider: String },
    GenerationStarted { seq: Seq, topic: String },
    /// Outline accepted; the deck has every slide but no images yet.
    OutlineReady { seq: Seq, deck: Deck },
    SlideImageResolved {
        seq: Seq,
        slide: usize,
        deck: Deck,
        progress: u8,
    },
    DeckComplete { seq: Seq, deck: Deck },
    Error {
        seq: Seq,
        kind: ErrorKind,
        message: String,
    },
    ShutdownComplete,
}

impl Event {
    /// Request this event belongs to, if any.
    pub fn seq(&self) -> Option<Seq> {
        match self {
            Event::GenerationStarted { seq, .. }
            | Event::OutlineReady { seq, .. }
            | Event::SlideImageResolved { seq, .. }
            | Event::DeckComplete { seq, .. }
            | Event::Error { seq, .. } => Some(*seq),
            Event::SessionConfigured { .. } | Event::ShutdownComplete => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    Generation,
    Format,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Op {
    Generate {
        topic: String,
        slide_count: usize,
        theme: ThemeId,
    },
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub op: Op,
}

impl Submission {
    pub fn new(op: Op) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            op,
        }
    }
}
