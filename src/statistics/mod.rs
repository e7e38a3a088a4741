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

//! Statistics and cardinality estimation
//!
//! Per-column histograms over three bucket layouts, table statistics with
//! selectivity helpers, and the estimator stack the optimizer consults
//! during plan enumeration.

pub mod cardinality;
pub mod column_statistics;
pub mod domain;
pub mod histogram;

pub use cardinality::{
    cardinality_fingerprint, CachedEstimator, CardinalityCacheMode, CardinalityEstimator,
    ColumnStatisticsEstimator, ExecutedEstimator, DEFAULT_NON_EQUI_SELECTIVITY,
};
pub use column_statistics::{
    ColumnStatistics, TableStatistics, DEFAULT_HISTOGRAM_BUCKETS, DEFAULT_LIKE_SELECTIVITY,
    DEFAULT_RANGE_SELECTIVITY,
};
pub use domain::{HistogramDomain, StringDomain, DEFAULT_STRING_PREFIX_LENGTH};
pub use histogram::{value_distribution, Histogram, HistogramType};
