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

//! Per-column histograms
//!
//! One bucket representation, three partitioning strategies:
//!
//! - **EqualNumElements**: every bucket holds `⌊D/B⌋` distinct values, the
//!   first `D mod B` buckets one extra
//! - **EqualWidth**: the value range is cut into `B` equal-width intervals,
//!   the leading intervals absorbing the division remainder
//! - **EqualHeight**: buckets target equal row counts; ties can force
//!   fewer realized buckets
//!
//! All strategies answer `estimate_cardinality` and `can_prune` through
//! the same bucket arithmetic: equality spreads a bucket's count over its
//! distinct values, ranges sum full buckets and linearly interpolate
//! within the partially covered one, with the half-open upper edge taken
//! from the domain's successor function.

use crate::core::{ChunkId, ColumnId, Error, PredicateCondition, Result, Value};
use crate::storage::Table;

use super::domain::{HistogramDomain, StringDomain};

/// Bucket partitioning strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistogramType {
    EqualNumElements,
    EqualWidth,
    EqualHeight,
}

/// A histogram over one column
#[derive(Debug, Clone)]
pub struct Histogram {
    histogram_type: HistogramType,
    domain: HistogramDomain,
    mins: Vec<Value>,
    maxs: Vec<Value>,
    counts: Vec<u64>,
    distinct_counts: Vec<u64>,
    total_count: u64,
    total_distinct: u64,
}

/// Sorted (value, row count) pairs of one column, nulls excluded
pub fn value_distribution(table: &Table, column_id: ColumnId) -> Vec<(Value, u64)> {
    let mut values: Vec<Value> = Vec::new();
    for chunk_id in 0..table.chunk_count() as ChunkId {
        let chunk = table.get_chunk(chunk_id).expect("chunk id in range");
        chunk
            .get_segment(column_id)
            .for_each_position(&mut |value, is_null, _| {
                if !is_null {
                    values.push(value);
                }
            });
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let mut distribution: Vec<(Value, u64)> = Vec::new();
    for value in values {
        match distribution.last_mut() {
            Some((last, count)) if last.total_cmp(&value).is_eq() => *count += 1,
            _ => distribution.push((value, 1)),
        }
    }
    distribution
}

impl Histogram {
    /// Build a histogram over `table[column_id]` with at most
    /// `max_bucket_count` buckets.
    ///
    /// Text columns require a [`StringDomain`]; values outside its alphabet
    /// surface a recoverable error.
    pub fn generate(
        table: &Table,
        column_id: ColumnId,
        histogram_type: HistogramType,
        max_bucket_count: usize,
        string_domain: Option<StringDomain>,
    ) -> Result<Histogram> {
        if max_bucket_count == 0 {
            return Err(Error::invalid_input("histogram needs at least one bucket"));
        }
        let domain =
            HistogramDomain::for_data_type(table.column_data_type(column_id), string_domain)?;
        let distribution = value_distribution(table, column_id);
        if distribution.is_empty() {
            return Err(Error::invalid_input(
                "histogram over an empty or all-NULL column",
            ));
        }
        if let HistogramDomain::String(string_domain) = &domain {
            for (value, _) in &distribution {
                string_domain.validate(value.as_str().expect("text column"))?;
            }
        }

        match histogram_type {
            HistogramType::EqualNumElements => {
                Self::build_equal_num_elements(domain, &distribution, max_bucket_count)
            }
            HistogramType::EqualWidth => {
                Self::build_equal_width(domain, &distribution, max_bucket_count)
            }
            HistogramType::EqualHeight => {
                Self::build_equal_height(domain, &distribution, max_bucket_count)
            }
        }
    }

    /// Distinct values split evenly: `D mod B` leading buckets get one
    /// extra value
    fn build_equal_num_elements(
        domain: HistogramDomain,
        distribution: &[(Value, u64)],
        max_bucket_count: usize,
    ) -> Result<Histogram> {
        let distinct_count = distribution.len();
        let bucket_count = distinct_count.min(max_bucket_count);
        let distinct_per_bucket = distinct_count / bucket_count;
        let buckets_with_extra = distinct_count % bucket_count;

        let mut histogram = Histogram::empty(HistogramType::EqualNumElements, domain);
        let mut begin = 0usize;
        for bucket_index in 0..bucket_count {
            let mut end = begin + distinct_per_bucket - 1;
            if bucket_index < buckets_with_extra {
                end += 1;
            }
            histogram.push_bucket(
                distribution[begin].0.clone(),
                distribution[end].0.clone(),
                distribution[begin..=end].iter().map(|(_, c)| c).sum(),
                (end - begin + 1) as u64,
            );
            begin = end + 1;
        }
        Ok(histogram)
    }

    /// The numeric range cut into equal-width intervals; the leading
    /// intervals absorb the integer-division remainder
    fn build_equal_width(
        domain: HistogramDomain,
        distribution: &[(Value, u64)],
        max_bucket_count: usize,
    ) -> Result<Histogram> {
        if matches!(domain, HistogramDomain::String(_)) {
            return Err(Error::unsupported(
                "equal-width histograms over text columns",
            ));
        }

        let min = &distribution[0].0;
        let max = &distribution[distribution.len() - 1].0;

        let is_integral = matches!(domain, HistogramDomain::Int32 | HistogramDomain::Int64);
        let (bucket_count, boundaries) = if is_integral {
            let min_int = min.as_int64().expect("integral domain");
            let max_int = max.as_int64().expect("integral domain");
            let span = (max_int - min_int + 1) as u64;
            let bucket_count = (max_bucket_count as u64).min(span) as usize;
            let base_width = span / bucket_count as u64;
            let wider_buckets = (span % bucket_count as u64) as usize;

            let mut boundaries = Vec::with_capacity(bucket_count + 1);
            let mut bound = min_int;
            boundaries.push(bound);
            for bucket_index in 0..bucket_count {
                bound += base_width as i64 + i64::from(bucket_index < wider_buckets);
                boundaries.push(bound);
            }
            (
                bucket_count,
                boundaries
                    .iter()
                    .map(|b| Self::int_value(&domain, *b))
                    .collect::<Vec<_>>(),
            )
        } else {
            let min_f = min.as_float64().expect("numeric domain");
            let max_f = max.as_float64().expect("numeric domain");
            // A zero-width range collapses to one bucket
            let bucket_count = if max_f > min_f { max_bucket_count } else { 1 };
            let width = (max_f - min_f) / bucket_count as f64;
            let mut boundaries = Vec::with_capacity(bucket_count + 1);
            for bucket_index in 0..bucket_count {
                boundaries.push(Self::float_value(
                    &domain,
                    min_f + width * bucket_index as f64,
                ));
            }
            boundaries.push(max.clone());
            (bucket_count, boundaries)
        };

        let mut histogram = Histogram::empty(HistogramType::EqualWidth, domain);
        let mut position = 0usize;
        for bucket_index in 0..bucket_count {
            let lower = boundaries[bucket_index].clone();
            // Integral buckets span [lower, next_lower - 1]; float buckets
            // close exactly at the next boundary
            let upper = if is_integral {
                let next = boundaries[bucket_index + 1].as_int64().expect("integral");
                Self::int_value(&histogram.domain, next - 1)
            } else {
                boundaries[bucket_index + 1].clone()
            };

            let mut count = 0u64;
            let mut distinct = 0u64;
            while position < distribution.len() {
                let (value, value_count) = &distribution[position];
                let in_bucket = if bucket_index + 1 == bucket_count {
                    value.total_cmp(&upper).is_le()
                } else if is_integral {
                    value.total_cmp(&upper).is_le()
                } else {
                    value.total_cmp(&boundaries[bucket_index + 1]).is_lt()
                };
                if !in_bucket {
                    break;
                }
                count += value_count;
                distinct += 1;
                position += 1;
            }
            histogram.push_bucket(lower, upper, count, distinct);
        }
        Ok(histogram)
    }

    /// Buckets close once they reach `⌈total/B⌉` rows; a value's whole row
    /// count stays in one bucket, so ties can leave fewer buckets
    fn build_equal_height(
        domain: HistogramDomain,
        distribution: &[(Value, u64)],
        max_bucket_count: usize,
    ) -> Result<Histogram> {
        let total: u64 = distribution.iter().map(|(_, c)| c).sum();
        let target = total.div_ceil(max_bucket_count as u64);

        let mut histogram = Histogram::empty(HistogramType::EqualHeight, domain);
        let mut begin = 0usize;
        let mut count = 0u64;
        for (index, (_, value_count)) in distribution.iter().enumerate() {
            count += value_count;
            let is_last = index + 1 == distribution.len();
            if count >= target || is_last {
                histogram.push_bucket(
                    distribution[begin].0.clone(),
                    distribution[index].0.clone(),
                    count,
                    (index - begin + 1) as u64,
                );
                begin = index + 1;
                count = 0;
            }
        }
        Ok(histogram)
    }

    fn int_value(domain: &HistogramDomain, value: i64) -> Value {
        match domain {
            HistogramDomain::Int32 => Value::Int32(value as i32),
            _ => Value::Int64(value),
        }
    }

    fn float_value(domain: &HistogramDomain, value: f64) -> Value {
        match domain {
            HistogramDomain::Float32 => Value::Float32(value as f32),
            _ => Value::Float64(value),
        }
    }

    fn empty(histogram_type: HistogramType, domain: HistogramDomain) -> Histogram {
        Histogram {
            histogram_type,
            domain,
            mins: Vec::new(),
            maxs: Vec::new(),
            counts: Vec::new(),
            distinct_counts: Vec::new(),
            total_count: 0,
            total_distinct: 0,
        }
    }

    fn push_bucket(&mut self, min: Value, max: Value, count: u64, distinct: u64) {
        self.mins.push(min);
        self.maxs.push(max);
        self.counts.push(count);
        self.distinct_counts.push(distinct);
        self.total_count += count;
        self.total_distinct += distinct;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The partitioning strategy
    pub fn histogram_type(&self) -> HistogramType {
        self.histogram_type
    }

    /// Number of realized buckets
    pub fn bucket_count(&self) -> usize {
        self.mins.len()
    }

    /// Rows across all buckets
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Distinct values across all buckets
    pub fn total_distinct(&self) -> u64 {
        self.total_distinct
    }

    /// Inclusive bounds of one bucket
    pub fn bucket_bounds(&self, index: usize) -> (&Value, &Value) {
        (&self.mins[index], &self.maxs[index])
    }

    /// Row count of one bucket
    pub fn bucket_row_count(&self, index: usize) -> u64 {
        self.counts[index]
    }

    /// Distinct count of one bucket
    pub fn bucket_distinct_count(&self, index: usize) -> u64 {
        self.distinct_counts[index]
    }

    /// The bucket whose range contains `value`, if any
    fn bucket_for_value(&self, value: &Value) -> Option<usize> {
        let index = self
            .maxs
            .partition_point(|max| max.total_cmp(value).is_lt());
        if index >= self.mins.len() {
            return None;
        }
        if value.total_cmp(&self.mins[index]).is_lt() {
            return None;
        }
        Some(index)
    }

    // =========================================================================
    // Estimation
    // =========================================================================

    /// Estimated number of rows satisfying `column <condition> value`
    pub fn estimate_cardinality(
        &self,
        condition: PredicateCondition,
        value: &Value,
    ) -> Result<f64> {
        self.estimate_with_upper(condition, value, None)
    }

    /// As [`estimate_cardinality`](Self::estimate_cardinality), with the
    /// closed upper bound for BETWEEN
    pub fn estimate_with_upper(
        &self,
        condition: PredicateCondition,
        value: &Value,
        upper: Option<&Value>,
    ) -> Result<f64> {
        match condition {
            PredicateCondition::Equals => Ok(self.estimate_equals(value)),
            PredicateCondition::NotEquals => {
                Ok(self.total_count as f64 - self.estimate_equals(value))
            }
            PredicateCondition::LessThan => self.estimate_less_than(value),
            PredicateCondition::LessThanEquals => {
                self.estimate_less_than(&self.domain.next_value(value)?)
            }
            PredicateCondition::GreaterThanEquals => {
                Ok(self.total_count as f64 - self.estimate_less_than(value)?)
            }
            PredicateCondition::GreaterThan => Ok(self.total_count as f64
                - self.estimate_less_than(&self.domain.next_value(value)?)?),
            PredicateCondition::Between => {
                let upper = upper.ok_or_else(|| {
                    Error::invalid_input("BETWEEN estimation requires an upper bound")
                })?;
                let below_upper =
                    self.estimate_less_than(&self.domain.next_value(upper)?)?;
                let below_lower = self.estimate_less_than(value)?;
                Ok((below_upper - below_lower).max(0.0))
            }
            PredicateCondition::Like | PredicateCondition::NotLike => Err(Error::unsupported(
                "pattern conditions are not estimable from a histogram",
            )),
        }
    }

    /// True when the predicate provably selects nothing
    pub fn can_prune(&self, condition: PredicateCondition, value: &Value) -> Result<bool> {
        Ok(self.estimate_with_upper(condition, value, None)? == 0.0)
    }

    /// As [`can_prune`](Self::can_prune) for BETWEEN
    pub fn can_prune_between(&self, lower: &Value, upper: &Value) -> Result<bool> {
        Ok(self.estimate_with_upper(PredicateCondition::Between, lower, Some(upper))? == 0.0)
    }

    fn estimate_equals(&self, value: &Value) -> f64 {
        match self.bucket_for_value(value) {
            Some(bucket) if self.distinct_counts[bucket] > 0 => {
                self.counts[bucket] as f64 / self.distinct_counts[bucket] as f64
            }
            _ => 0.0,
        }
    }

    fn estimate_less_than(&self, value: &Value) -> Result<f64> {
        if self.bucket_count() == 0 {
            return Ok(0.0);
        }
        if value.total_cmp(&self.mins[0]).is_le() {
            return Ok(0.0);
        }
        let last = self.bucket_count() - 1;
        if value.total_cmp(&self.maxs[last]).is_gt() {
            return Ok(self.total_count as f64);
        }

        match self.bucket_for_value(value) {
            Some(bucket) => {
                let below: u64 = self.counts[..bucket].iter().sum();
                let bucket_min = self.domain.to_number(&self.mins[bucket])?;
                let bucket_end = self
                    .domain
                    .to_number(&self.domain.next_value(&self.maxs[bucket])?)?;
                let position = self.domain.to_number(value)?;
                let fraction = if bucket_end > bucket_min {
                    (position - bucket_min) / (bucket_end - bucket_min)
                } else {
                    0.0
                };
                Ok(below as f64 + fraction * self.counts[bucket] as f64)
            }
            None => {
                // In a gap between buckets: everything below is selected
                let index = self
                    .maxs
                    .partition_point(|max| max.total_cmp(value).is_lt());
                Ok(self.counts[..index].iter().sum::<u64>() as f64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;
    use crate::storage::{ColumnDefinition, TableType, UseMvcc, DEFAULT_CHUNK_SIZE};

    fn int_column(values: &[i32]) -> Table {
        let table = Table::new(
            vec![ColumnDefinition::new("a", DataType::Int32, false)],
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        );
        for &v in values {
            table.append(&[Value::Int32(v)]).unwrap();
        }
        table
    }

    fn float_column(values: &[f32]) -> Table {
        let table = Table::new(
            vec![ColumnDefinition::new("a", DataType::Float32, false)],
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        );
        for &v in values {
            table.append(&[Value::Float32(v)]).unwrap();
        }
        table
    }

    // =========================================================================
    // EqualNumElements
    // =========================================================================

    #[test]
    fn test_equal_num_elements_buckets() {
        // Distinct values 12, 123, 12346, 123456 in two buckets of two
        let table = int_column(&[12, 123, 12346, 123456, 123456]);
        let hist = Histogram::generate(
            &table,
            0,
            HistogramType::EqualNumElements,
            2,
            None,
        )
        .unwrap();

        assert_eq!(hist.bucket_count(), 2);
        assert_eq!(
            hist.bucket_bounds(0),
            (&Value::Int32(12), &Value::Int32(123))
        );
        assert_eq!(hist.bucket_row_count(0), 2);
        assert_eq!(hist.bucket_distinct_count(0), 2);
        assert_eq!(
            hist.bucket_bounds(1),
            (&Value::Int32(12346), &Value::Int32(123456))
        );
        assert_eq!(hist.bucket_row_count(1), 3);
        assert_eq!(hist.bucket_distinct_count(1), 2);

        assert_eq!(
            hist.estimate_cardinality(PredicateCondition::Equals, &Value::Int32(123456))
                .unwrap(),
            1.5
        );
        assert!(hist
            .can_prune(PredicateCondition::Equals, &Value::Int32(1_000_000))
            .unwrap());
        assert!(hist
            .can_prune(PredicateCondition::Equals, &Value::Int32(1_234))
            .unwrap());
        assert!(!hist
            .can_prune(PredicateCondition::Equals, &Value::Int32(12))
            .unwrap());
    }

    #[test]
    fn test_equal_num_elements_uneven_split() {
        // Five distinct values in three buckets: 2 + 2 + 1
        let table = int_column(&[1, 2, 3, 4, 5]);
        let hist =
            Histogram::generate(&table, 0, HistogramType::EqualNumElements, 3, None).unwrap();
        assert_eq!(hist.bucket_count(), 3);
        assert_eq!(hist.bucket_distinct_count(0), 2);
        assert_eq!(hist.bucket_distinct_count(1), 2);
        assert_eq!(hist.bucket_distinct_count(2), 1);
    }

    #[test]
    fn test_less_than_interpolation_int() {
        // Bucket [12, 123] with 2 rows: the divisor is max + 1 - min
        let table = int_column(&[12, 123, 12346, 123456, 123456]);
        let hist =
            Histogram::generate(&table, 0, HistogramType::EqualNumElements, 2, None).unwrap();

        assert_eq!(
            hist.estimate_cardinality(PredicateCondition::LessThan, &Value::Int32(12))
                .unwrap(),
            0.0
        );
        let expected = (70.0 - 12.0) / (123.0 - 12.0 + 1.0) * 2.0;
        assert!(
            (hist
                .estimate_cardinality(PredicateCondition::LessThan, &Value::Int32(70))
                .unwrap()
                - expected)
                .abs()
                < 1e-9
        );
        // In the gap between buckets: the whole first bucket
        assert_eq!(
            hist.estimate_cardinality(PredicateCondition::LessThan, &Value::Int32(1_234))
                .unwrap(),
            2.0
        );
        assert_eq!(
            hist.estimate_cardinality(PredicateCondition::LessThan, &Value::Int32(1_000_000))
                .unwrap(),
            5.0
        );
    }

    #[test]
    fn test_less_than_interpolation_float() {
        let table = float_column(&[0.5, 1.1, 1.3, 2.2]);
        let hist =
            Histogram::generate(&table, 0, HistogramType::EqualNumElements, 1, None).unwrap();

        // Divisor is next_after(2.2) - 0.5 at f32 precision, widened
        let next = f32::from_bits(2.2f32.to_bits() + 1);
        let expected = (1.0 - 0.5) / (next as f64 - 0.5f32 as f64) * 4.0;
        let estimate = hist
            .estimate_cardinality(PredicateCondition::LessThan, &Value::Float32(1.0))
            .unwrap();
        assert!((estimate - expected).abs() < 1e-6);
    }

    #[test]
    fn test_greater_and_between() {
        let table = int_column(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let hist =
            Histogram::generate(&table, 0, HistogramType::EqualNumElements, 5, None).unwrap();

        let greater = hist
            .estimate_cardinality(PredicateCondition::GreaterThan, &Value::Int32(8))
            .unwrap();
        assert!((greater - 2.0).abs() < 1e-9);

        let between = hist
            .estimate_with_upper(
                PredicateCondition::Between,
                &Value::Int32(3),
                Some(&Value::Int32(6)),
            )
            .unwrap();
        assert!((between - 4.0).abs() < 1e-9);
    }

    // =========================================================================
    // EqualWidth
    // =========================================================================

    #[test]
    fn test_equal_width_remainder_in_leading_buckets() {
        // Range [1, 10] in 3 buckets: widths 4, 3, 3
        let table = int_column(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let hist =
            Histogram::generate(&table, 0, HistogramType::EqualWidth, 3, None).unwrap();

        assert_eq!(hist.bucket_count(), 3);
        assert_eq!(hist.bucket_bounds(0), (&Value::Int32(1), &Value::Int32(4)));
        assert_eq!(hist.bucket_bounds(1), (&Value::Int32(5), &Value::Int32(7)));
        assert_eq!(hist.bucket_bounds(2), (&Value::Int32(8), &Value::Int32(10)));
        assert_eq!(hist.bucket_row_count(0), 4);
        assert_eq!(hist.bucket_row_count(1), 3);
    }

    #[test]
    fn test_equal_width_empty_bucket_prunes() {
        let table = int_column(&[1, 2, 9, 10]);
        let hist =
            Histogram::generate(&table, 0, HistogramType::EqualWidth, 5, None).unwrap();
        // The middle of the range holds no values
        assert!(hist
            .can_prune(PredicateCondition::Equals, &Value::Int32(5))
            .unwrap());
        assert!(!hist
            .can_prune(PredicateCondition::Equals, &Value::Int32(2))
            .unwrap());
    }

    #[test]
    fn test_equal_width_rejects_text() {
        let table = Table::new(
            vec![ColumnDefinition::new("s", DataType::Text, false)],
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        );
        table.append(&[Value::text("abc")]).unwrap();
        let err = Histogram::generate(
            &table,
            0,
            HistogramType::EqualWidth,
            2,
            Some(StringDomain::lowercase()),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::Unsupported);
    }

    // =========================================================================
    // EqualHeight
    // =========================================================================

    #[test]
    fn test_equal_height_targets_row_counts() {
        let table = int_column(&[1, 1, 1, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let hist =
            Histogram::generate(&table, 0, HistogramType::EqualHeight, 3, None).unwrap();

        // Target is ceil(12/3) = 4 rows per bucket
        assert!(hist.bucket_count() <= 3);
        assert_eq!(hist.bucket_row_count(0), 4);
        assert_eq!(hist.bucket_bounds(0), (&Value::Int32(1), &Value::Int32(1)));
        assert_eq!(hist.total_count(), 12);
    }

    #[test]
    fn test_equal_height_ties_reduce_buckets() {
        // One value dominating: everything lands in fewer buckets
        let table = int_column(&[5, 5, 5, 5, 5, 5, 5, 5, 6]);
        let hist =
            Histogram::generate(&table, 0, HistogramType::EqualHeight, 4, None).unwrap();
        assert!(hist.bucket_count() < 4);
    }

    // =========================================================================
    // Strings
    // =========================================================================

    #[test]
    fn test_string_histogram_equality() {
        let table = Table::new(
            vec![ColumnDefinition::new("s", DataType::Text, false)],
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        );
        for s in ["apple", "banana", "banana", "cherry", "fig", "grape", "kiwi"] {
            table.append(&[Value::text(s)]).unwrap();
        }
        let hist = Histogram::generate(
            &table,
            0,
            HistogramType::EqualNumElements,
            3,
            Some(StringDomain::lowercase()),
        )
        .unwrap();

        assert_eq!(hist.bucket_count(), 3);
        let banana = hist
            .estimate_cardinality(PredicateCondition::Equals, &Value::text("banana"))
            .unwrap();
        assert!(banana > 0.0);
        assert!(hist
            .can_prune(PredicateCondition::Equals, &Value::text("zzz"))
            .unwrap());

        // Range estimates stay within the total
        let below = hist
            .estimate_cardinality(PredicateCondition::LessThan, &Value::text("dates"))
            .unwrap();
        assert!(below >= 3.0 && below <= hist.total_count() as f64);
    }

    #[test]
    fn test_string_outside_alphabet_is_recoverable() {
        let table = Table::new(
            vec![ColumnDefinition::new("s", DataType::Text, false)],
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        );
        table.append(&[Value::text("abc")]).unwrap();
        let hist = Histogram::generate(
            &table,
            0,
            HistogramType::EqualNumElements,
            2,
            Some(StringDomain::lowercase()),
        )
        .unwrap();

        let err = hist
            .estimate_cardinality(PredicateCondition::LessThanEquals, &Value::text("AB!"))
            .unwrap_err();
        assert!(err.is_recoverable());
    }

    // =========================================================================
    // Shared properties
    // =========================================================================

    #[test]
    fn test_prune_iff_estimate_zero() {
        let table = int_column(&[12, 123, 12346, 123456, 123456]);
        for histogram_type in [
            HistogramType::EqualNumElements,
            HistogramType::EqualWidth,
            HistogramType::EqualHeight,
        ] {
            let hist = Histogram::generate(&table, 0, histogram_type, 3, None).unwrap();
            for probe in [0, 12, 123, 5_000, 123456, 1_000_000] {
                let value = Value::Int32(probe);
                let estimate = hist
                    .estimate_cardinality(PredicateCondition::Equals, &value)
                    .unwrap();
                let prunable = hist.can_prune(PredicateCondition::Equals, &value).unwrap();
                assert_eq!(estimate > 0.0, !prunable, "probe {}", probe);
            }
        }
    }

    #[test]
    fn test_equality_estimates_sum_to_total() {
        let table = int_column(&[1, 1, 2, 3, 3, 3, 8, 9]);
        let hist =
            Histogram::generate(&table, 0, HistogramType::EqualNumElements, 3, None).unwrap();
        let sum: f64 = [1, 2, 3, 8, 9]
            .iter()
            .map(|&v| {
                hist.estimate_cardinality(PredicateCondition::Equals, &Value::Int32(v))
                    .unwrap()
            })
            .sum();
        assert!(sum <= hist.total_count() as f64 + 1e-9);
    }
}
