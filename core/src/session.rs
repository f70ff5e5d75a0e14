use anyhow::{anyhow, Result};
use slide_common::{Deck, ThemeId, MAX_SLIDES, MIN_SLIDES};
use slide_protocol::{Event, Op, Seq, Submission};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::assembler::DeckAssembler;
use crate::error::{ErrorReporter, SlideError};
use crate::images::ImageSource;
use crate::outline::OutlineRequester;

/// Background generation session.
///
/// Every [`Op::Generate`] gets the next sequence number. Once a newer request
/// has been submitted, older work stops at its next checkpoint and none of its
/// events are returned from [`Session::next_event`].
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    tx_submit: mpsc::Sender<(Seq, Submission)>,
    rx_event: Mutex<mpsc::Receiver<Event>>,
    latest: Arc<AtomicU64>,
}

struct Generation {
    seq: Seq,
    latest: Arc<AtomicU64>,
    tx_event: mpsc::Sender<Event>,
}

impl Generation {
    fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.seq
    }

    /// Send unless superseded; `false` means stop working.
    async fn emit(&self, event: Event) -> bool {
        if !self.is_current() {
            debug!(seq = self.seq, "superseded, dropping work");
            return false;
        }
        self.tx_event.send(event).await.is_ok()
    }
}

impl Session {
    pub async fn spawn(requester: OutlineRequester, images: Arc<dyn ImageSource>) -> Result<Self> {
        let (tx_submit, mut rx_submit) = mpsc::channel::<(Seq, Submission)>(64);
        let (tx_event, rx_event) = mpsc::channel::<Event>(256);
        let latest = Arc::new(AtomicU64::new(0));
        let requester = Arc::new(requester);

        tx_event
            .send(Event::SessionConfigured {
                provider: requester.provider_name().to_string(),
            })
            .await
            .map_err(|_| anyhow!("event channel closed before session start"))?;

        let worker_latest = Arc::clone(&latest);
        tokio::spawn(async move {
            while let Some((seq, sub)) = rx_submit.recv().await {
                match sub.op {
                    Op::Generate {
                        topic,
                        slide_count,
                        theme,
                    } => {
                        info!(id = %sub.id, seq, %topic, slide_count, %theme, "generation submitted");
                        let generation = Generation {
                            seq,
                            latest: Arc::clone(&worker_latest),
                            tx_event: tx_event.clone(),
                        };
                        tokio::spawn(run_generation(
                            generation,
                            Arc::clone(&requester),
                            Arc::clone(&images),
                            topic,
                            slide_count,
                            theme,
                        ));
                    }
                    Op::Shutdown => {
                        info!(id = %sub.id, "session shutting down");
                        if tx_event.send(Event::ShutdownComplete).await.is_err() {
                            debug!("event receiver dropped before shutdown completed");
                        }
                        break;
                    }
                }
            }
        });

        Ok(Self {
            inner: Arc::new(Inner {
                tx_submit,
                rx_event: Mutex::new(rx_event),
                latest,
            }),
        })
    }

    /// Queue an operation and return the sequence number it was given.
    pub async fn submit(&self, op: Op) -> Result<Seq> {
        let seq = self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner
            .tx_submit
            .send((seq, Submission::new(op)))
            .await
            .map_err(|_| anyhow!("session is closed"))?;
        Ok(seq)
    }

    /// Next event for the most recent request. Events of superseded requests are skipped.
    pub async fn next_event(&self) -> Result<Event> {
        let mut rx = self.inner.rx_event.lock().await;
        loop {
            let event = rx.recv().await.ok_or_else(|| anyhow!("session is closed"))?;
            match event.seq() {
                Some(seq) if seq != self.inner.latest.load(Ordering::SeqCst) => {
                    debug!(seq, "discarding stale event");
                }
                _ => return Ok(event),
            }
        }
    }

    pub fn latest_seq(&self) -> Seq {
        self.inner.latest.load(Ordering::SeqCst)
    }
}

async fn run_generation(
    generation: Generation,
    requester: Arc<OutlineRequester>,
    images: Arc<dyn ImageSource>,
    topic: String,
    slide_count: usize,
    theme: ThemeId,
) {
    let seq = generation.seq;
    if !generation
        .emit(Event::GenerationStarted {
            seq,
            topic: topic.clone(),
        })
        .await
    {
        return;
    }

    let outline = if (MIN_SLIDES..=MAX_SLIDES).contains(&slide_count) {
        requester.request(&topic, slide_count).await
    } else {
        Err(SlideError::Validation(format!(
            "slide count must be between {MIN_SLIDES} and {MAX_SLIDES}, got {slide_count}"
        )))
    };

    let outline = match outline {
        Ok(outline) => outline,
        Err(e) => {
            warn!(seq, "generation failed: {e}");
            generation
                .emit(Event::Error {
                    seq,
                    kind: e.kind(),
                    message: ErrorReporter::format_user_error(&e),
                })
                .await;
            return;
        }
    };

    let ready = Deck::from_outline(outline.clone(), theme);
    if !generation.emit(Event::OutlineReady { seq, deck: ready }).await {
        return;
    }

    let assembler = DeckAssembler::new(images.as_ref());
    let mut assembly = assembler.progressive(outline, theme);
    for step in assembly.by_ref() {
        let event = Event::SlideImageResolved {
            seq,
            slide: step.completed - 1,
            deck: step.deck,
            progress: step.progress,
        };
        if !generation.emit(event).await {
            return;
        }
        tokio::task::yield_now().await;
    }

    let deck = assembly.into_deck();
    info!(seq, slides = deck.slide_count(), images = deck.images_attached(), "deck complete");
    generation.emit(Event::DeckComplete { seq, deck }).await;
}
