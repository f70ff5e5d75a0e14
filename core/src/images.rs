//! Picks an illustrative image for each slide.
//!
//! There is no image-generation backend: a prompt is matched by keyword
//! against a fixed table of topic buckets, and one of the bucket's curated
//! URLs is chosen, avoiding repeats within one deck while supply lasts.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, trace};

/// A named group of topically related image URLs and the keywords that select it.
#[derive(Debug)]
pub struct Bucket {
    pub name: &'static str,
    /// Lowercase. Phrases containing a space weigh 2, single words 1.
    pub keywords: &'static [&'static str],
    pub urls: &'static [&'static str],
}

impl Bucket {
    /// Sum of keyword weights found as substrings of an already-lowercased prompt.
    pub fn score(&self, normalized: &str) -> u32 {
        self.keywords
            .iter()
            .filter(|kw| normalized.contains(*kw))
            .map(|kw| if kw.contains(' ') { 2 } else { 1 })
            .sum()
    }
}

macro_rules! placeholder {
    ($color:literal, $label:literal) => {
        concat!("https://placehold.co/800x450/", $color, "/ffffff?text=", $label)
    };
}

/// Declaration order breaks score ties.
pub static BUCKETS: &[Bucket] = &[
    Bucket {
        name: "technology",
        keywords: &[
            "technology", "software", "computer", "digital", "innovation", "robot", "internet",
            "coding", "programming", "cyber", "artificial intelligence", "machine learning",
            "cloud computing", "data center",
        ],
        urls: &[
            placeholder!("1e3a8a", "Circuit+Board"),
            placeholder!("1d4ed8", "Data+Center"),
            placeholder!("2563eb", "Robotics+Lab"),
            placeholder!("3b82f6", "Code+on+Screen"),
            placeholder!("0ea5e9", "Network+Nodes"),
            placeholder!("0284c7", "Smart+Devices"),
        ],
    },
    Bucket {
        name: "business",
        keywords: &[
            "business", "corporate", "office", "meeting", "strategy", "marketing", "market",
            "growth", "teamwork", "leadership", "startup", "entrepreneur", "management", "sales",
            "customer", "business plan", "team meeting",
        ],
        urls: &[
            placeholder!("334155", "Boardroom"),
            placeholder!("475569", "Team+Meeting"),
            placeholder!("1f2937", "Strategy+Whiteboard"),
            placeholder!("374151", "Handshake"),
            placeholder!("4b5563", "Modern+Office"),
            placeholder!("64748b", "Growth+Chart"),
        ],
    },
    Bucket {
        name: "education",
        keywords: &[
            "education", "school", "student", "learning", "classroom", "teacher", "university",
            "study", "knowledge", "training", "online learning", "higher education",
        ],
        urls: &[
            placeholder!("7c2d12", "Classroom"),
            placeholder!("9a3412", "Library+Shelves"),
            placeholder!("c2410c", "Graduation"),
            placeholder!("ea580c", "Students+Studying"),
            placeholder!("b45309", "Lecture+Hall"),
        ],
    },
    Bucket {
        name: "nature",
        keywords: &[
            "nature", "forest", "woodland", "mountain", "landscape", "river", "ocean", "wildlife",
            "flower", "environment", "outdoor", "natural world", "green space",
        ],
        urls: &[
            placeholder!("14532d", "Forest+Path"),
            placeholder!("166534", "Mountain+Lake"),
            placeholder!("15803d", "Wildflower+Meadow"),
            placeholder!("0f766e", "Ocean+Waves"),
            placeholder!("047857", "Misty+Valley"),
            placeholder!("065f46", "Wildlife"),
        ],
    },
    Bucket {
        name: "health",
        keywords: &[
            "health", "medical", "doctor", "hospital", "wellness", "fitness", "nutrition",
            "medicine", "patient", "exercise", "mental health", "public health",
        ],
        urls: &[
            placeholder!("be123c", "Hospital+Corridor"),
            placeholder!("e11d48", "Stethoscope"),
            placeholder!("db2777", "Healthy+Lifestyle"),
            placeholder!("f43f5e", "Care+Team"),
            placeholder!("9f1239", "Fitness+Training"),
        ],
    },
    Bucket {
        name: "science",
        keywords: &[
            "science", "research", "laboratory", "experiment", "chemistry", "physics", "biology",
            "scientist", "microscope", "scientific method", "data analysis",
        ],
        urls: &[
            placeholder!("4c1d95", "Laboratory"),
            placeholder!("5b21b6", "Microscope"),
            placeholder!("6d28d9", "Molecules"),
            placeholder!("7c3aed", "Research+Notes"),
            placeholder!("8b5cf6", "Test+Tubes"),
        ],
    },
    Bucket {
        name: "energy",
        keywords: &[
            "energy", "renewable", "solar", "electricity", "battery", "hydro", "sustainable",
            "wind turbine", "wind power", "power grid", "clean energy", "renewable energy",
            "green energy",
        ],
        urls: &[
            placeholder!("ca8a04", "Solar+Panels"),
            placeholder!("eab308", "Wind+Turbines"),
            placeholder!("a16207", "Hydro+Dam"),
            placeholder!("854d0e", "Power+Grid"),
            placeholder!("facc15", "Battery+Storage"),
            placeholder!("713f12", "Clean+Energy+Farm"),
        ],
    },
    Bucket {
        name: "finance",
        keywords: &[
            "finance", "money", "investment", "bank", "stock", "economy", "financial", "budget",
            "revenue", "profit", "cryptocurrency", "stock market", "interest rate",
        ],
        urls: &[
            placeholder!("065f46", "Trading+Floor"),
            placeholder!("10b981", "Coins+and+Notes"),
            placeholder!("059669", "Stock+Ticker"),
            placeholder!("34d399", "Piggy+Bank"),
            placeholder!("047857", "Financial+Report"),
        ],
    },
    Bucket {
        name: "travel",
        keywords: &[
            "travel", "tourism", "vacation", "destination", "journey", "adventure", "airport",
            "hotel", "beach", "city skyline", "road trip",
        ],
        urls: &[
            placeholder!("0369a1", "Tropical+Beach"),
            placeholder!("075985", "City+Skyline"),
            placeholder!("0c4a6e", "Airport+Terminal"),
            placeholder!("0891b2", "Road+Trip"),
            placeholder!("06b6d4", "Old+Town+Streets"),
        ],
    },
    Bucket {
        name: "food",
        keywords: &[
            "food", "cuisine", "cooking", "restaurant", "recipe", "meal", "chef", "kitchen",
            "agriculture", "farming", "healthy eating", "street food",
        ],
        urls: &[
            placeholder!("c2410c", "Fresh+Ingredients"),
            placeholder!("ea580c", "Chef+at+Work"),
            placeholder!("f97316", "Market+Stall"),
            placeholder!("fb923c", "Family+Meal"),
            placeholder!("9a3412", "Harvest+Field"),
        ],
    },
    Bucket {
        name: "history",
        keywords: &[
            "history", "historical", "ancient", "heritage", "culture", "cultural", "museum",
            "monument", "tradition", "civilization", "world war", "cultural heritage",
        ],
        urls: &[
            placeholder!("78350f", "Ancient+Ruins"),
            placeholder!("92400e", "Museum+Hall"),
            placeholder!("b45309", "Historic+Monument"),
            placeholder!("57534e", "Old+Manuscript"),
            placeholder!("44403c", "Festival+Tradition"),
        ],
    },
    Bucket {
        name: "space",
        keywords: &[
            "astronomy", "planet", "galaxy", "rocket", "astronaut", "universe", "satellite",
            "nasa", "cosmos", "space exploration", "solar system", "outer space",
        ],
        urls: &[
            placeholder!("0f172a", "Milky+Way"),
            placeholder!("1e1b4b", "Rocket+Launch"),
            placeholder!("312e81", "Planet+Orbit"),
            placeholder!("020617", "Astronaut"),
            placeholder!("172554", "Space+Station"),
        ],
    },
    Bucket {
        name: "art",
        keywords: &[
            "artwork", "painting", "artist", "sculpture", "gallery", "creative", "design",
            "music", "photography", "theater", "digital art", "street art",
        ],
        urls: &[
            placeholder!("a21caf", "Paint+Palette"),
            placeholder!("c026d3", "Gallery+Wall"),
            placeholder!("d946ef", "Design+Studio"),
            placeholder!("86198f", "Concert+Stage"),
            placeholder!("701a75", "Sculpture"),
        ],
    },
    Bucket {
        name: "sports",
        keywords: &[
            "sports", "football", "soccer", "basketball", "athlete", "olympic", "tennis",
            "stadium", "competition", "team sports",
        ],
        urls: &[
            placeholder!("15803d", "Stadium+Lights"),
            placeholder!("16a34a", "Running+Track"),
            placeholder!("22c55e", "Team+Huddle"),
            placeholder!("4ade80", "Finish+Line"),
            placeholder!("166534", "Tennis+Court"),
        ],
    },
];

/// Used when a prompt mentions operating systems and nothing else matched.
pub const OPERATING_SYSTEM_IMAGE: &str = placeholder!("111827", "Operating+System");

/// Neutral images for prompts no bucket matches.
pub static GENERIC: &[&str] = &[
    "https://placehold.co/600x400/4f46e5/ffffff?text=AI+Generated+Image",
    "https://placehold.co/600x400/6366f1/ffffff?text=Presentation+Visual",
    "https://placehold.co/600x400/8b5cf6/ffffff?text=Slide+Image",
    "https://placehold.co/600x400/7c3aed/ffffff?text=Generated+Graphic",
    "https://placehold.co/600x400/4338ca/ffffff?text=Abstract+Shapes",
    "https://placehold.co/600x400/6d28d9/ffffff?text=Key+Idea",
];

/// Image URLs already handed out within one deck.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UsedImages(HashSet<String>);

impl UsedImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.0.contains(url)
    }

    /// Returns `false` if the URL was already recorded.
    pub fn insert(&mut self, url: &str) -> bool {
        self.0.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A `UsedImages` set shared by resolvers running in parallel.
///
/// The whole check-then-add of one resolution runs under a single lock.
#[derive(Debug, Default, Clone)]
pub struct SharedUsedImages(Arc<Mutex<UsedImages>>);

impl SharedUsedImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, source: &dyn ImageSource, prompt: &str) -> Result<String, ImageError> {
        let mut used = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        source.resolve(prompt, &mut used)
    }

    pub fn snapshot(&self) -> UsedImages {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image backend unavailable: {0}")]
    Unavailable(String),
    #[error("image generation rejected prompt: {0}")]
    Rejected(String),
}

/// Something that can supply an image URL for a slide prompt.
pub trait ImageSource: Send + Sync {
    /// Return a URL for `prompt`, recording it in `used`.
    fn resolve(&self, prompt: &str, used: &mut UsedImages) -> Result<String, ImageError>;
}

/// Keyword-bucket resolver over static tables. Never fails.
#[derive(Debug)]
pub struct TopicImageResolver {
    buckets: &'static [Bucket],
    generic: &'static [&'static str],
    rng: Mutex<StdRng>,
}

impl Default for TopicImageResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicImageResolver {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible choices, for tests and demos.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            buckets: BUCKETS,
            generic: GENERIC,
            rng: Mutex::new(rng),
        }
    }

    pub fn with_tables(mut self, buckets: &'static [Bucket], generic: &'static [&'static str]) -> Self {
        self.buckets = buckets;
        self.generic = generic;
        self
    }

    /// Candidate buckets (score > 0) by descending score, ties in table order.
    pub fn rank(&self, prompt: &str) -> Vec<(&'static Bucket, u32)> {
        let normalized = prompt.to_lowercase();
        let mut ranked: Vec<_> = self
            .buckets
            .iter()
            .map(|bucket| (bucket, bucket.score(&normalized)))
            .filter(|(_, score)| *score > 0)
            .collect();
        // sort_by is stable, which keeps declaration order for equal scores
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn resolve_with<R: Rng + ?Sized>(
        &self,
        prompt: &str,
        used: &mut UsedImages,
        rng: &mut R,
    ) -> String {
        let ranked = self.rank(prompt);

        let picked = if let Some((top, _)) = ranked.first() {
            match ranked
                .iter()
                .find_map(|(bucket, _)| pick_unused(bucket.urls, used, rng).map(|u| (bucket, u)))
            {
                Some((bucket, url)) => {
                    debug!(bucket = bucket.name, "image bucket matched");
                    Some(url)
                }
                None => {
                    debug!(bucket = top.name, "candidate buckets exhausted, reusing");
                    top.urls.choose(rng).copied()
                }
            }
        } else if mentions_operating_system(&prompt.to_lowercase()) {
            debug!("operating system override");
            Some(OPERATING_SYSTEM_IMAGE)
        } else {
            debug!("no bucket matched, using generic images");
            pick_unused(self.generic, used, rng).or_else(|| self.generic.choose(rng).copied())
        };
        let url = picked.unwrap_or(GENERIC_FALLBACK);

        trace!(%url, "image resolved");
        used.insert(url);
        url.to_string()
    }
}

impl ImageSource for TopicImageResolver {
    fn resolve(&self, prompt: &str, used: &mut UsedImages) -> Result<String, ImageError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.resolve_with(prompt, used, &mut *rng))
    }
}

/// Only reached if a custom table is configured with no generic images.
const GENERIC_FALLBACK: &str = "https://placehold.co/600x400/4f46e5/ffffff?text=Slide+Image";

fn pick_unused<R: Rng + ?Sized>(
    urls: &'static [&'static str],
    used: &UsedImages,
    rng: &mut R,
) -> Option<&'static str> {
    let unused: Vec<&'static str> = urls.iter().copied().filter(|u| !used.contains(u)).collect();
    unused.choose(rng).copied()
}

fn mentions_operating_system(normalized: &str) -> bool {
    normalized.contains("operating system")
        || normalized
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == "os")
}
