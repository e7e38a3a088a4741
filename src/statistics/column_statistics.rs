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

//! Table and column statistics
//!
//! Per-column distinct counts, null fractions, and histograms, generated
//! by scanning a table once. Selectivity helpers turn predicates into
//! multiplicative fractions, preferring histogram estimates and falling
//! back to the usual heuristics when a histogram cannot answer.

use rustc_hash::FxHashMap;

use crate::core::{ColumnId, DataType, PredicateCondition, Result, Value};
use crate::storage::Table;

use super::domain::StringDomain;
use super::histogram::{value_distribution, Histogram, HistogramType};

/// Fallback selectivity for range predicates without histogram support
pub const DEFAULT_RANGE_SELECTIVITY: f64 = 1.0 / 3.0;

/// Fallback selectivity for LIKE predicates
pub const DEFAULT_LIKE_SELECTIVITY: f64 = 0.25;

/// Default bucket budget for generated histograms
pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 32;

/// Statistics of one column
#[derive(Debug, Clone)]
pub struct ColumnStatistics {
    pub distinct_count: u64,
    pub null_fraction: f64,
    pub histogram: Option<Histogram>,
}

impl ColumnStatistics {
    /// Selectivity of `column <condition> value` against this column
    pub fn predicate_selectivity(
        &self,
        condition: PredicateCondition,
        value: &Value,
        upper: Option<&Value>,
        row_count: u64,
    ) -> f64 {
        if row_count == 0 {
            return 0.0;
        }
        if let Some(histogram) = &self.histogram {
            if let Ok(estimate) = histogram.estimate_with_upper(condition, value, upper) {
                return (estimate / row_count as f64).clamp(0.0, 1.0);
            }
        }
        match condition {
            PredicateCondition::Equals => 1.0 / self.distinct_count.max(1) as f64,
            PredicateCondition::NotEquals => {
                1.0 - 1.0 / self.distinct_count.max(1) as f64
            }
            PredicateCondition::Like => DEFAULT_LIKE_SELECTIVITY,
            PredicateCondition::NotLike => 1.0 - DEFAULT_LIKE_SELECTIVITY,
            _ => DEFAULT_RANGE_SELECTIVITY,
        }
    }
}

/// Statistics of one table, keyed by column id
#[derive(Debug, Clone)]
pub struct TableStatistics {
    pub row_count: u64,
    columns: FxHashMap<ColumnId, ColumnStatistics>,
}

impl TableStatistics {
    /// Scan a table and generate statistics for every supported column.
    ///
    /// Boolean columns and text columns outside the given alphabet get
    /// distinct counts but no histogram.
    pub fn generate(table: &Table, string_domain: Option<StringDomain>) -> Result<Self> {
        let row_count = table.row_count();
        let mut columns = FxHashMap::default();

        for column_id in 0..table.column_count() {
            let distribution = value_distribution(table, column_id);
            let non_null: u64 = distribution.iter().map(|(_, c)| c).sum();
            let distinct_count = distribution.len() as u64;
            let null_fraction = if row_count == 0 {
                0.0
            } else {
                (row_count - non_null) as f64 / row_count as f64
            };

            let wants_histogram = distinct_count > 0
                && match table.column_data_type(column_id) {
                    DataType::Boolean => false,
                    DataType::Text => string_domain.is_some(),
                    _ => true,
                };
            let histogram = if wants_histogram {
                Histogram::generate(
                    table,
                    column_id,
                    HistogramType::EqualNumElements,
                    DEFAULT_HISTOGRAM_BUCKETS,
                    string_domain.clone(),
                )
                .ok()
            } else {
                None
            };

            columns.insert(
                column_id,
                ColumnStatistics {
                    distinct_count,
                    null_fraction,
                    histogram,
                },
            );
        }

        Ok(Self { row_count, columns })
    }

    /// Statistics of one column, if generated
    pub fn column(&self, column_id: ColumnId) -> Option<&ColumnStatistics> {
        self.columns.get(&column_id)
    }

    /// Distinct count of one column, defaulting to the row count
    pub fn distinct_count(&self, column_id: ColumnId) -> u64 {
        self.columns
            .get(&column_id)
            .map(|c| c.distinct_count)
            .unwrap_or(self.row_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ColumnDefinition, TableType, UseMvcc, DEFAULT_CHUNK_SIZE};

    fn sample_table() -> Table {
        let table = Table::new(
            vec![
                ColumnDefinition::new("a", DataType::Int32, true),
                ColumnDefinition::new("s", DataType::Text, false),
            ],
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        );
        for (a, s) in [
            (Some(1), "x"),
            (Some(1), "y"),
            (Some(2), "y"),
            (None, "z"),
        ] {
            let a = a.map(Value::Int32).unwrap_or(Value::Null);
            table.append(&[a, Value::text(s)]).unwrap();
        }
        table
    }

    #[test]
    fn test_generate_counts() {
        let stats = TableStatistics::generate(&sample_table(), None).unwrap();
        assert_eq!(stats.row_count, 4);
        let a = stats.column(0).unwrap();
        assert_eq!(a.distinct_count, 2);
        assert!((a.null_fraction - 0.25).abs() < 1e-9);
        assert!(a.histogram.is_some());

        // No alphabet given: text column gets no histogram
        let s = stats.column(1).unwrap();
        assert_eq!(s.distinct_count, 3);
        assert!(s.histogram.is_none());
    }

    #[test]
    fn test_histogram_backed_selectivity() {
        let stats = TableStatistics::generate(&sample_table(), None).unwrap();
        let a = stats.column(0).unwrap();
        let selectivity =
            a.predicate_selectivity(PredicateCondition::Equals, &Value::Int32(1), None, 4);
        assert!((selectivity - 0.5).abs() < 1e-9);

        let none =
            a.predicate_selectivity(PredicateCondition::Equals, &Value::Int32(99), None, 4);
        assert_eq!(none, 0.0);
    }

    #[test]
    fn test_fallback_selectivities() {
        let stats = TableStatistics::generate(&sample_table(), None).unwrap();
        let s = stats.column(1).unwrap();
        assert!(
            (s.predicate_selectivity(PredicateCondition::Equals, &Value::text("y"), None, 4)
                - 1.0 / 3.0)
                .abs()
                < 1e-9
        );
        assert_eq!(
            s.predicate_selectivity(PredicateCondition::Like, &Value::text("%y%"), None, 4),
            DEFAULT_LIKE_SELECTIVITY
        );
    }
}
