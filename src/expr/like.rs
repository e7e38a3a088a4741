// Copyright 2025 StrataDB Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! SQL LIKE pattern matching
//!
//! A SQL pattern is translated once into an anchored, case-insensitive
//! regular expression and matched with full-string semantics:
//! - `%` matches any sequence of characters (including empty)
//! - `_` matches any single character
//! - every other regex metacharacter is escaped

use regex::Regex;

use crate::core::{Error, Result};

/// A compiled SQL LIKE pattern
#[derive(Debug, Clone)]
pub struct LikePattern {
    pattern: String,
    regex: Regex,
}

impl LikePattern {
    /// Compile a SQL pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let mut regex_pattern = String::with_capacity(pattern.len() * 2 + 8);
        regex_pattern.push_str("(?i)^");

        for c in pattern.chars() {
            match c {
                '%' => regex_pattern.push_str(".*"),
                '_' => regex_pattern.push('.'),
                '.' | '+' | '*' | '?' | '^' | '$' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
                | '\\' => {
                    regex_pattern.push('\\');
                    regex_pattern.push(c);
                }
                _ => regex_pattern.push(c),
            }
        }

        regex_pattern.push('$');

        let regex = Regex::new(&regex_pattern)
            .map_err(|e| Error::invalid_input(format!("bad LIKE pattern '{}': {}", pattern, e)))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The original SQL pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Full-string match against the compiled pattern
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_suffix_contains() {
        let starts = LikePattern::new("John%").unwrap();
        assert!(starts.matches("John"));
        assert!(starts.matches("Johnny"));
        assert!(!starts.matches("Jane"));

        let ends = LikePattern::new("%son").unwrap();
        assert!(ends.matches("Johnson"));
        assert!(!ends.matches("John"));

        let contains = LikePattern::new("%oh%").unwrap();
        assert!(contains.matches("John"));
        assert!(!contains.matches("Jane"));
    }

    #[test]
    fn test_underscore_single_char() {
        let p = LikePattern::new("J_n").unwrap();
        assert!(p.matches("Jon"));
        assert!(p.matches("Jan"));
        assert!(!p.matches("John"));
    }

    #[test]
    fn test_case_insensitive() {
        let p = LikePattern::new("JOHN%").unwrap();
        assert!(p.matches("john"));
        assert!(p.matches("JoHnny"));
    }

    #[test]
    fn test_metacharacters_escaped() {
        let p = LikePattern::new("a.b%").unwrap();
        assert!(p.matches("a.b123"));
        assert!(!p.matches("aXb123"));

        let p = LikePattern::new("10+2").unwrap();
        assert!(p.matches("10+2"));
        assert!(!p.matches("102"));
    }

    #[test]
    fn test_full_string_semantics() {
        let p = LikePattern::new("oh").unwrap();
        assert!(!p.matches("John"));
        assert!(p.matches("oh"));
    }
}
