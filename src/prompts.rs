use rand::seq::SliceRandom;
use rand::Rng;

pub const CARTOON: &str = include_str!("../data/prompts/cartoon.txt");
pub const ENHANCEMENTS: &str = include_str!("../data/prompts/enhancements.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Wrap a concept into the editorial-cartoon instruction sent to the image model.
///
/// Accepts any string, including an empty one; rejecting blank concepts is the
/// caller's job.
pub fn build_stylized_prompt(concept: &str) -> String {
    render(CARTOON, &[("concept", concept)]).trim_end().to_string()
}

/// One rhetorical template per non-empty line of [`ENHANCEMENTS`].
pub fn enhancement_templates() -> Vec<&'static str> {
    ENHANCEMENTS
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Rephrase a concept through a randomly chosen rhetorical template.
///
/// The concept is lower-cased before substitution. Blank input still yields a
/// template with an empty slot, so callers should guard against it.
pub fn enhance_concept(concept: &str, rng: &mut impl Rng) -> String {
    let lowered = concept.to_lowercase();
    enhancement_templates()
        .choose(rng)
        .map(|template| render(template, &[("concept", &lowered)]))
        .unwrap_or(lowered)
}
