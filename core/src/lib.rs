//! Topic-to-deck pipeline: outline request, image resolution, layout rules and
//! the background session that drives them.

pub mod assembler;
pub mod error;
pub mod images;
pub mod layout;
pub mod outline;
pub mod session;
pub mod theme;

pub use assembler::{AssemblyStep, DeckAssembler, DeckAssembly};
pub use error::{ErrorReporter, FormatError, Result, SlideError};
pub use images::{ImageError, ImageSource, SharedUsedImages, TopicImageResolver, UsedImages};
pub use layout::{layout_for, is_chart_slide, LayoutKind, SlideLayout, CHART_SERIES};
pub use outline::OutlineRequester;
pub use session::Session;
pub use theme::{colors_for, Palette};
