//! Pattern matching for attribute filters
//!
//! Device type and OS filters accept exact values or glob patterns,
//! auto-detected from the pattern characters. Both forms compare ASCII
//! case-insensitively because the same value arrives differently cased
//! from different sources ("Windows 11 Pro" vs "WINDOWS 11 PRO").

use anyhow::{anyhow, Result};
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Check if a filter string contains glob pattern characters
pub fn is_glob_pattern(filter: &str) -> bool {
    filter.contains('*') || filter.contains('?') || filter.contains('[')
}

/// Match an attribute value against a filter using either exact or glob matching
pub fn matches_value_filter(value: &str, filter: &str) -> bool {
    if is_glob_pattern(filter) {
        match Pattern::new(filter) {
            Ok(pattern) => pattern.matches_with(value, MATCH_OPTIONS),
            // Invalid patterns are rejected by validate_value_filters; treat as literal here
            Err(_) => value.eq_ignore_ascii_case(filter),
        }
    } else {
        value.eq_ignore_ascii_case(filter)
    }
}

/// Check an optional attribute value against a filter list (logical OR)
///
/// An empty filter list matches everything, including devices where the
/// attribute could not be resolved. A non-empty list never matches a
/// missing value.
pub fn value_matches_filters(value: Option<&str>, filters: &[String]) -> bool {
    if filters.is_empty() {
        return true;
    }

    match value {
        Some(value) => filters
            .iter()
            .any(|filter| matches_value_filter(value, filter)),
        None => false,
    }
}

/// Validate that all glob filters are syntactically correct
pub fn validate_value_filters(filters: &[String]) -> Result<()> {
    for filter in filters {
        if is_glob_pattern(filter) {
            Pattern::new(filter)
                .map_err(|e| anyhow!("Invalid glob pattern '{}': {}", filter, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_glob_pattern() {
        assert!(!is_glob_pattern("Windows 11 Pro"));
        assert!(is_glob_pattern("Windows*"));
        assert!(is_glob_pattern("Windows 1?"));
        assert!(is_glob_pattern("[Ll]aptop"));
    }

    #[test]
    fn test_exact_matching() {
        assert!(matches_value_filter("Laptop", "Laptop"));
        assert!(matches_value_filter("LAPTOP", "laptop"));
        assert!(!matches_value_filter("Laptop", "Lap"));
        assert!(!matches_value_filter("Windows 11 Pro", "Windows"));
    }

    #[test]
    fn test_glob_pattern_matching() {
        assert!(matches_value_filter("Windows 11 Pro", "Windows*"));
        assert!(matches_value_filter("Windows 11 Pro", "*11*"));
        assert!(matches_value_filter("windows server 2019", "Windows Server*"));
        assert!(!matches_value_filter("macOS 14.2", "Windows*"));

        assert!(matches_value_filter("Windows 10", "Windows 1?"));
        assert!(!matches_value_filter("Windows 100", "Windows 1?"));
    }

    #[test]
    fn test_value_matches_filters() {
        assert!(value_matches_filters(None, &[]));
        assert!(value_matches_filters(Some("Desktop"), &[]));

        let filters = vec!["Laptop".to_string(), "Desk*".to_string()];
        assert!(value_matches_filters(Some("Desktop"), &filters));
        assert!(value_matches_filters(Some("laptop"), &filters));
        assert!(!value_matches_filters(Some("Server"), &filters));
        assert!(!value_matches_filters(None, &filters));
    }

    #[test]
    fn test_validate_value_filters() {
        let filters = vec!["Windows 11 Pro".to_string()];
        assert!(validate_value_filters(&filters).is_ok());

        let filters = vec!["Windows*".to_string(), "*Server*".to_string()];
        assert!(validate_value_filters(&filters).is_ok());

        let filters = vec!["Windows [".to_string()];
        assert!(validate_value_filters(&filters).is_err());
    }
}
