//! Model exclusion by substring

use tracing::info;

/// Drops inventory models whose name contains any of the patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeFilter {
    patterns: Vec<String>,
}

impl ExcludeFilter {
    /// Patterns are trimmed; empty ones are ignored
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Parse a comma separated list
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| name.contains(p.as_str()))
    }

    /// Keep the names that are not excluded, in order
    pub fn apply(&self, names: Vec<String>) -> Vec<String> {
        names
            .into_iter()
            .filter(|name| {
                let excluded = self.is_excluded(name);
                if excluded {
                    info!("exclude model: {}", name);
                }
                !excluded
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_skips_empty() {
        let filter = ExcludeFilter::parse(" embed, ,vision ,,");
        assert_eq!(filter.patterns(), ["embed", "vision"]);
        assert!(ExcludeFilter::parse("").is_empty());
        assert!(ExcludeFilter::parse(" , ").is_empty());
    }

    #[test]
    fn test_apply() {
        let filter = ExcludeFilter::parse("mistral");
        let names = vec!["llama2".to_string(), "mistral-7b".to_string()];
        assert_eq!(filter.apply(names), ["llama2"]);
        assert!(!ExcludeFilter::default().is_excluded("anything"));
    }
}
