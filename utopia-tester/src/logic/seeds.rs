use anyhow::{Result, bail};
use std::collections::HashSet;
use utopia_game::generate_seed_text;
use utopia_game::seed::seed_text_from_entropy;

/// Where a seed text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSource {
    Literal,
    Numeric(u64),
    Generated,
}

/// Seed metadata used for logic runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub text: String,
    pub source: SeedSource,
}

impl SeedInfo {
    #[must_use]
    pub fn literal(text: &str) -> Self {
        Self {
            text: text.to_string(),
            source: SeedSource::Literal,
        }
    }

    #[must_use]
    pub fn from_numeric(value: u64) -> Self {
        Self {
            text: seed_text_from_entropy(value),
            source: SeedSource::Numeric(value),
        }
    }

    #[must_use]
    pub fn generated() -> Self {
        Self {
            text: generate_seed_text(),
            source: SeedSource::Generated,
        }
    }

    /// Seed text for the `iteration`-th run of this seed.
    #[must_use]
    pub fn for_iteration(&self, iteration: usize) -> String {
        if iteration == 0 {
            self.text.clone()
        } else {
            format!("{}#{iteration}", self.text)
        }
    }
}

/// Resolve CLI seed tokens into seed texts.
///
/// Integers map to base64 seed texts, `random` or `random:N` draws fresh
/// seeds, anything else is used verbatim.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Some(count) = token.strip_prefix("random:") {
            let Ok(count) = count.parse::<usize>() else {
                bail!("Unrecognized seed token: {token}");
            };
            pending.extend((0..count).map(|_| SeedInfo::generated()));
            continue;
        }

        if token.eq_ignore_ascii_case("random") {
            pending.push(SeedInfo::generated());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if token.chars().any(char::is_whitespace) {
            bail!("Unrecognized seed token: {token}");
        }
        pending.push(SeedInfo::literal(token));
    }

    let mut seen = HashSet::new();
    pending.retain(|info| seen.insert(info.text.clone()));

    if pending.is_empty() {
        pending.push(SeedInfo::literal("testing"));
    }

    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_numeric_literal_and_generated() {
        let raw = vec![
            "0".to_string(),
            "testing".to_string(),
            "random:2".to_string(),
            "testing".to_string(),
        ];
        let seeds = resolve_seed_inputs(&raw).unwrap();
        assert_eq!(seeds[0].text, "AAAAAAAAAA");
        assert_eq!(seeds[0].source, SeedSource::Numeric(0));
        assert_eq!(seeds[1], SeedInfo::literal("testing"));
        assert_eq!(
            seeds
                .iter()
                .filter(|s| s.source == SeedSource::Generated)
                .count(),
            2
        );
        assert_eq!(seeds.len(), 4);
    }

    #[test]
    fn empty_input_defaults_to_testing() {
        let seeds = resolve_seed_inputs(&[]).unwrap();
        assert_eq!(seeds, vec![SeedInfo::literal("testing")]);
    }

    #[test]
    fn rejects_bad_tokens() {
        assert!(resolve_seed_inputs(&["random:x".to_string()]).is_err());
        assert!(resolve_seed_inputs(&["two words".to_string()]).is_err());
    }

    #[test]
    fn iterations_vary_the_text() {
        let info = SeedInfo::literal("abc");
        assert_eq!(info.for_iteration(0), "abc");
        assert_eq!(info.for_iteration(2), "abc#2");
    }
}
