//! Curated meme concepts
//!
//! Fixed lists of social observations used for the "surprise me" picker and
//! the quick-pick examples.

use rand::seq::SliceRandom;
use rand::Rng;

/// Population sampled by [`pick_random_concept`].
pub const RANDOM_CONCEPTS: [&str; 20] = [
    "Adults addicted to social media validation, neglecting real-life interactions",
    "The irony of 'save the environment' messages on disposable plastic cups",
    "People taking photos of their food instead of eating it",
    "Everyone being 'busy' but scrolling social media for hours",
    "Complaining about privacy while sharing everything online",
    "Buying organic food but driving gas-guzzling cars",
    "Preaching minimalism while having rooms full of stuff",
    "Working from home but never leaving the desk",
    "Digital detox retreats advertised on social media",
    "Fast fashion promoting sustainability",
    "Influencers selling authenticity",
    "Online activism without real-world action",
    "Subscription services we forgot we have",
    "Smart homes that make us dumber",
    "Mindfulness apps causing stress notifications",
    "Eco-friendly packaging for unnecessary products",
    "Virtual meetings that could have been emails",
    "Self-help books gathering dust",
    "Fitness apps while sitting all day",
    "Instant everything in a world that needs patience",
];

/// Quick-pick examples offered next to the concept input.
pub const EXAMPLE_CONCEPTS: [&str; 6] = [
    "Adults addicted to social media validation, neglecting real-life interactions",
    "The irony of 'save the environment' messages on disposable plastic cups",
    "People taking photos of their food instead of eating it",
    "Everyone being 'busy' but scrolling social media for hours",
    "Complaining about privacy while sharing everything online",
    "Buying organic food but driving gas-guzzling cars",
];

const PREVIEW_CHARS: usize = 30;

/// Sample one concept uniformly, with replacement.
pub fn pick_random_concept(rng: &mut impl Rng) -> &'static str {
    // Non-empty const array, so `choose` always yields.
    RANDOM_CONCEPTS.choose(rng).copied().unwrap_or(RANDOM_CONCEPTS[0])
}

/// Short label for an example: the first 30 characters followed by `...`.
pub fn concept_preview(concept: &str) -> String {
    let head: String = concept.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head)
}
