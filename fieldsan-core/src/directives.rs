//! Lexical parsing of field directives.
//!
//! A directive string such as `"trim,max=10,def=n/a"` is split on commas into
//! bare verbs (`trim`) and `key=value` pairs (`max=10`). No value is interpreted
//! here: a bad number only surfaces when a sanitizer asks for it.
//!
//! License: MIT OR APACHE 2.0

/// One parsed directive. Bare verbs have no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub key: String,
    pub value: Option<String>,
}

/// Ordered set of directives for a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveSet {
    directives: Vec<Directive>,
}

impl DirectiveSet {
    /// Splits a raw directive string. Empty segments are skipped, the key and
    /// value are trimmed, and the value is split on the first `=` only so that
    /// defaults may themselves contain `=`.
    pub fn parse(raw: &str) -> Self {
        let directives = raw
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment.split_once('=') {
                Some((key, value)) => Directive {
                    key: key.trim().to_string(),
                    value: Some(value.trim().to_string()),
                },
                None => Directive {
                    key: segment.to_string(),
                    value: None,
                },
            })
            .collect();
        Self { directives }
    }

    /// Returns the value of the first directive named `key`. A bare verb yields
    /// an empty string.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.directives
            .iter()
            .find(|d| d.key == key)
            .map(|d| d.value.as_deref().unwrap_or(""))
    }

    pub fn has(&self, key: &str) -> bool {
        self.directives.iter().any(|d| d.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verbs_and_pairs() {
        let set = DirectiveSet::parse("trim, max=10 ,def=a=b,,upper");
        let keys: Vec<&str> = set.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["trim", "max", "def", "upper"]);
        assert_eq!(set.get("max"), Some("10"));
        assert_eq!(set.get("def"), Some("a=b"));
        assert_eq!(set.get("trim"), Some(""));
        assert!(set.has("upper"));
        assert!(!set.has("lower"));
    }

    #[test]
    fn test_parse_empty() {
        assert!(DirectiveSet::parse("").is_empty());
        assert!(DirectiveSet::parse(" , ,").is_empty());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let set = DirectiveSet::parse("min=1,min=2");
        assert_eq!(set.get("min"), Some("1"));
    }

    #[test]
    fn test_malformed_values_are_kept_verbatim() {
        let set = DirectiveSet::parse("min=abc");
        assert_eq!(set.get("min"), Some("abc"));
    }
}
