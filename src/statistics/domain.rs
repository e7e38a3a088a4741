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

//! Value domains for histogram estimation
//!
//! Histograms convert inclusive ranges to half-open ones through per-type
//! successor/predecessor functions. The convention is fixed per type:
//! integers step by exactly 1, floats step to the IEEE-754
//! next-representable value at their own width, and strings step through a
//! finite ordered alphabet bounded by a prefix length.

use crate::core::{DataType, Error, Result, Value};

/// Default bounded prefix length for string successor/predecessor
pub const DEFAULT_STRING_PREFIX_LENGTH: usize = 9;

/// IEEE-754 successor at f64 width
fn f64_next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

/// IEEE-754 predecessor at f64 width
fn f64_next_down(x: f64) -> f64 {
    if x.is_nan() || x == f64::NEG_INFINITY {
        return x;
    }
    if x == 0.0 {
        return -f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f64::from_bits(bits - 1)
    } else {
        f64::from_bits(bits + 1)
    }
}

/// IEEE-754 successor at f32 width
fn f32_next_up(x: f32) -> f32 {
    if x.is_nan() || x == f32::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f32::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f32::from_bits(bits + 1)
    } else {
        f32::from_bits(bits - 1)
    }
}

/// IEEE-754 predecessor at f32 width
fn f32_next_down(x: f32) -> f32 {
    if x.is_nan() || x == f32::NEG_INFINITY {
        return x;
    }
    if x == 0.0 {
        return -f32::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f32::from_bits(bits - 1)
    } else {
        f32::from_bits(bits + 1)
    }
}

/// A finite ordered alphabet with successor/predecessor over bounded
/// prefixes of its strings
#[derive(Debug, Clone)]
pub struct StringDomain {
    /// Sorted, distinct characters of the supported alphabet
    characters: Vec<char>,
    /// Strings are compared and stepped over at most this many characters
    prefix_length: usize,
}

impl StringDomain {
    /// Create a domain from its alphabet; characters are sorted and
    /// deduplicated
    pub fn new(alphabet: &str, prefix_length: usize) -> Result<Self> {
        let mut characters: Vec<char> = alphabet.chars().collect();
        characters.sort_unstable();
        characters.dedup();
        if characters.is_empty() {
            return Err(Error::invalid_input("string domain requires an alphabet"));
        }
        if prefix_length == 0 {
            return Err(Error::invalid_input(
                "string domain requires a positive prefix length",
            ));
        }
        Ok(Self {
            characters,
            prefix_length,
        })
    }

    /// Lowercase letters with the default prefix length
    pub fn lowercase() -> Self {
        Self::new("abcdefghijklmnopqrstuvwxyz", DEFAULT_STRING_PREFIX_LENGTH)
            .expect("static alphabet is valid")
    }

    /// The smallest character of the alphabet
    fn min_char(&self) -> char {
        self.characters[0]
    }

    /// The largest character of the alphabet
    fn max_char(&self) -> char {
        *self.characters.last().expect("alphabet is non-empty")
    }

    fn char_index(&self, c: char) -> Option<usize> {
        self.characters.binary_search(&c).ok()
    }

    /// Fail with a recoverable error when `value` leaves the alphabet
    pub fn validate(&self, value: &str) -> Result<()> {
        if value.chars().all(|c| self.char_index(c).is_some()) {
            Ok(())
        } else {
            Err(Error::UnsupportedCharacters {
                value: value.to_string(),
            })
        }
    }

    /// Lexicographic successor within the bounded-prefix domain.
    ///
    /// Saturates at the domain maximum (the all-max-character prefix).
    pub fn next_value(&self, value: &str) -> Result<String> {
        self.validate(value)?;
        let mut chars: Vec<char> = value.chars().take(self.prefix_length).collect();

        if chars.len() < self.prefix_length {
            chars.push(self.min_char());
            return Ok(chars.into_iter().collect());
        }

        // At full prefix length: increment the rightmost incrementable
        // character and drop everything after it
        while let Some(&last) = chars.last() {
            if last == self.max_char() {
                chars.pop();
                continue;
            }
            let index = self.char_index(last).expect("validated above");
            *chars.last_mut().expect("non-empty") = self.characters[index + 1];
            return Ok(chars.into_iter().collect());
        }

        // Every character was the maximum: saturate
        Ok(value.chars().take(self.prefix_length).collect())
    }

    /// Lexicographic predecessor within the bounded-prefix domain.
    ///
    /// The empty string is the domain minimum and has no predecessor.
    pub fn previous_value(&self, value: &str) -> Result<String> {
        self.validate(value)?;
        let mut chars: Vec<char> = value.chars().take(self.prefix_length).collect();

        let Some(&last) = chars.last() else {
            return Err(Error::unsupported(
                "the empty string has no predecessor",
            ));
        };

        if last == self.min_char() {
            chars.pop();
            return Ok(chars.into_iter().collect());
        }

        let index = self.char_index(last).expect("validated above");
        *chars.last_mut().expect("non-empty") = self.characters[index - 1];
        while chars.len() < self.prefix_length {
            chars.push(self.max_char());
        }
        Ok(chars.into_iter().collect())
    }

    /// Positional base-(n+1) embedding of the bounded prefix, monotone in
    /// lexicographic order; used for interpolation within a bucket
    pub fn to_number(&self, value: &str) -> Result<f64> {
        self.validate(value)?;
        let base = (self.characters.len() + 1) as f64;
        let mut number = 0.0;
        for position in 0..self.prefix_length {
            let digit = value
                .chars()
                .nth(position)
                .and_then(|c| self.char_index(c))
                .map(|index| (index + 1) as f64)
                .unwrap_or(0.0);
            number += digit * base.powi((self.prefix_length - 1 - position) as i32);
        }
        Ok(number)
    }
}

/// Per-type successor/predecessor and numeric embedding
#[derive(Debug, Clone)]
pub enum HistogramDomain {
    Int32,
    Int64,
    Float32,
    Float64,
    String(StringDomain),
}

impl HistogramDomain {
    /// The domain for a column type; text columns require a string domain
    pub fn for_data_type(
        data_type: DataType,
        string_domain: Option<StringDomain>,
    ) -> Result<Self> {
        match data_type {
            DataType::Int32 => Ok(HistogramDomain::Int32),
            DataType::Int64 => Ok(HistogramDomain::Int64),
            DataType::Float32 => Ok(HistogramDomain::Float32),
            DataType::Float64 => Ok(HistogramDomain::Float64),
            DataType::Text => string_domain.map(HistogramDomain::String).ok_or_else(|| {
                Error::unsupported("text histograms require a supported alphabet")
            }),
            DataType::Boolean => Err(Error::unsupported("histograms over boolean columns")),
        }
    }

    /// The value immediately after `value` in this domain
    pub fn next_value(&self, value: &Value) -> Result<Value> {
        match (self, value) {
            (HistogramDomain::Int32, Value::Int32(v)) => {
                Ok(Value::Int32(v.saturating_add(1)))
            }
            (HistogramDomain::Int64, Value::Int64(v)) => {
                Ok(Value::Int64(v.saturating_add(1)))
            }
            (HistogramDomain::Float32, Value::Float32(v)) => {
                Ok(Value::Float32(f32_next_up(*v)))
            }
            (HistogramDomain::Float64, Value::Float64(v)) => {
                Ok(Value::Float64(f64_next_up(*v)))
            }
            (HistogramDomain::String(domain), Value::Text(s)) => {
                Ok(Value::text(domain.next_value(s)?))
            }
            _ => Err(Error::unsupported(format!(
                "value {} outside the histogram domain",
                value
            ))),
        }
    }

    /// The value immediately before `value` in this domain
    pub fn previous_value(&self, value: &Value) -> Result<Value> {
        match (self, value) {
            (HistogramDomain::Int32, Value::Int32(v)) => {
                Ok(Value::Int32(v.saturating_sub(1)))
            }
            (HistogramDomain::Int64, Value::Int64(v)) => {
                Ok(Value::Int64(v.saturating_sub(1)))
            }
            (HistogramDomain::Float32, Value::Float32(v)) => {
                Ok(Value::Float32(f32_next_down(*v)))
            }
            (HistogramDomain::Float64, Value::Float64(v)) => {
                Ok(Value::Float64(f64_next_down(*v)))
            }
            (HistogramDomain::String(domain), Value::Text(s)) => {
                Ok(Value::text(domain.previous_value(s)?))
            }
            _ => Err(Error::unsupported(format!(
                "value {} outside the histogram domain",
                value
            ))),
        }
    }

    /// Monotone numeric embedding used for linear interpolation
    pub fn to_number(&self, value: &Value) -> Result<f64> {
        match (self, value) {
            (HistogramDomain::String(domain), Value::Text(s)) => domain.to_number(s),
            (HistogramDomain::String(_), _) => Err(Error::unsupported(
                "non-text value in a string histogram",
            )),
            (_, value) => value.as_float64().ok_or_else(|| {
                Error::unsupported(format!("value {} outside the histogram domain", value))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_successor_convention() {
        let domain = HistogramDomain::Int32;
        assert_eq!(
            domain.next_value(&Value::Int32(41)).unwrap(),
            Value::Int32(42)
        );
        assert_eq!(
            domain.previous_value(&Value::Int32(0)).unwrap(),
            Value::Int32(-1)
        );
    }

    #[test]
    fn test_float_successor_is_next_representable() {
        let domain = HistogramDomain::Float64;
        let next = domain.next_value(&Value::Float64(1.0)).unwrap();
        let Value::Float64(next) = next else {
            panic!("expected f64");
        };
        assert!(next > 1.0);
        assert_eq!(next, f64::from_bits(1.0f64.to_bits() + 1));

        let f32_domain = HistogramDomain::Float32;
        let next = f32_domain.next_value(&Value::Float32(2.2)).unwrap();
        let Value::Float32(next) = next else {
            panic!("expected f32");
        };
        assert_eq!(next, f32::from_bits(2.2f32.to_bits() + 1));
    }

    #[test]
    fn test_string_next_previous_roundtrip() {
        let domain = StringDomain::lowercase();
        // previous(next(s)) == s for any in-alphabet, non-minimal s
        for s in ["a", "abc", "zzz", "hello"] {
            let next = domain.next_value(s).unwrap();
            assert_eq!(domain.previous_value(&next).unwrap(), s);
        }
    }

    #[test]
    fn test_string_successor_shapes() {
        let domain = StringDomain::new("abc", 3).unwrap();
        // Below the prefix length the successor appends the minimum char
        assert_eq!(domain.next_value("ab").unwrap(), "aba");
        // At the prefix length the last incrementable char steps
        assert_eq!(domain.next_value("abc").unwrap(), "ac");
        assert_eq!(domain.next_value("acc").unwrap(), "b");
        // The all-max prefix saturates
        assert_eq!(domain.next_value("ccc").unwrap(), "ccc");
    }

    #[test]
    fn test_string_predecessor_shapes() {
        let domain = StringDomain::new("abc", 3).unwrap();
        assert_eq!(domain.previous_value("aba").unwrap(), "ab");
        assert_eq!(domain.previous_value("b").unwrap(), "acc");
        assert!(domain.previous_value("").is_err());
    }

    #[test]
    fn test_alphabet_violation_is_recoverable() {
        let domain = StringDomain::lowercase();
        let err = domain.next_value("Hello!").unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::Unsupported);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_to_number_is_monotone() {
        let domain = StringDomain::lowercase();
        let values = ["", "a", "ab", "b", "ba", "zz"];
        let numbers: Vec<f64> = values
            .iter()
            .map(|s| domain.to_number(s).unwrap())
            .collect();
        for pair in numbers.windows(2) {
            assert!(pair[0] < pair[1], "expected strictly increasing numbers");
        }
    }
}
