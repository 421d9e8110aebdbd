//! Free-text name resolution strategies
//!
//! The catalogue performs exact lookups itself and only consults a
//! [`NameResolver`] when the exact lookup misses. Resolvers return the
//! matching *name*; the catalogue maps it back to an id.

/// Default similarity cutoff for fuzzy matching (0.0-1.0)
pub const DEFAULT_FUZZY_CUTOFF: f64 = 0.6;

/// Pluggable strategy mapping user text onto one of the candidate names
pub trait NameResolver: Send + Sync {
    /// Pick the candidate name `text` most plausibly refers to, if any
    fn resolve<'a>(&self, text: &str, candidates: &[&'a str]) -> Option<&'a str>;
}

/// Accepts only exact (trimmed) matches
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactResolver;

impl NameResolver for ExactResolver {
    fn resolve<'a>(&self, text: &str, candidates: &[&'a str]) -> Option<&'a str> {
        let text = text.trim();
        candidates.iter().copied().find(|c| *c == text)
    }
}

/// Normalized Levenshtein similarity over lowercased, trimmed names
///
/// Returns the best-scoring candidate at or above `cutoff`. Ties keep the
/// earliest candidate.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyResolver {
    cutoff: f64,
}

impl Default for FuzzyResolver {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_FUZZY_CUTOFF,
        }
    }
}

impl FuzzyResolver {
    pub fn new(cutoff: f64) -> Self {
        Self {
            cutoff: cutoff.clamp(0.0, 1.0),
        }
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn similarity(a: &str, b: &str) -> f64 {
        let a = a.trim().to_lowercase();
        let b = b.trim().to_lowercase();
        strsim::normalized_levenshtein(&a, &b)
    }
}

impl NameResolver for FuzzyResolver {
    fn resolve<'a>(&self, text: &str, candidates: &[&'a str]) -> Option<&'a str> {
        let mut best: Option<(&'a str, f64)> = None;
        for &candidate in candidates {
            let score = Self::similarity(text, candidate);
            if score < self.cutoff {
                continue;
            }
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((candidate, score)),
            }
        }
        best.map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: &[&str] = &["Snow halation", "START:DASH!!", "Bokura wa Ima no Naka de"];

    #[test]
    fn test_exact_resolver() {
        assert_eq!(ExactResolver.resolve("START:DASH!!", NAMES), Some("START:DASH!!"));
        assert_eq!(ExactResolver.resolve(" Snow halation ", NAMES), Some("Snow halation"));
        assert_eq!(ExactResolver.resolve("snow halation", NAMES), None);
    }

    #[test]
    fn test_fuzzy_resolver_tolerates_case_and_typos() {
        let fuzzy = FuzzyResolver::default();
        assert_eq!(fuzzy.resolve("snow halation", NAMES), Some("Snow halation"));
        assert_eq!(fuzzy.resolve("Snow halaton", NAMES), Some("Snow halation"));
        assert_eq!(fuzzy.resolve("start dash", NAMES), Some("START:DASH!!"));
    }

    #[test]
    fn test_fuzzy_resolver_respects_cutoff() {
        let fuzzy = FuzzyResolver::default();
        assert_eq!(fuzzy.resolve("xyz", NAMES), None);

        let strict = FuzzyResolver::new(1.0);
        assert_eq!(strict.resolve("Snow halaton", NAMES), None);
        assert_eq!(strict.resolve("snow halation", NAMES), Some("Snow halation"));
    }

    #[test]
    fn test_fuzzy_cutoff_clamped() {
        assert_eq!(FuzzyResolver::new(7.0).cutoff(), 1.0);
        assert_eq!(FuzzyResolver::new(-1.0).cutoff(), 0.0);
    }

    #[test]
    fn test_empty_candidates() {
        assert_eq!(FuzzyResolver::default().resolve("anything", &[]), None);
    }
}
