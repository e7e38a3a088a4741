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

//! Logical query plans
//!
//! The LQP is the relational tree the optimizer reorders: stored-table
//! leaves, single-predicate filters, and joins. Nodes are immutable and
//! shared through `Arc`, so the dynamic-programming search can assemble
//! thousands of candidate trees over the same leaves without copying them.

use std::fmt;
use std::sync::Arc;

use crate::core::JoinMode;
use crate::expr::Predicate;
use crate::storage::Table;

/// Shared handle to a logical plan node
pub type LogicalPlanRef = Arc<LogicalPlan>;

/// A node of the logical query plan
#[derive(Debug)]
pub enum LogicalPlan {
    /// A stored base relation under a query-unique alias
    StoredTable {
        name: String,
        alias: String,
        table: Arc<Table>,
    },

    /// A single-predicate filter
    Predicate {
        input: LogicalPlanRef,
        predicate: Predicate,
    },

    /// A join carrying all predicates that connect its sides
    Join {
        left: LogicalPlanRef,
        right: LogicalPlanRef,
        mode: JoinMode,
        predicates: Vec<Predicate>,
    },
}

impl LogicalPlan {
    /// Stored-table leaf
    pub fn stored_table(
        name: impl Into<String>,
        alias: impl Into<String>,
        table: Arc<Table>,
    ) -> LogicalPlanRef {
        Arc::new(LogicalPlan::StoredTable {
            name: name.into(),
            alias: alias.into(),
            table,
        })
    }

    /// Filter node
    pub fn predicate(input: LogicalPlanRef, predicate: Predicate) -> LogicalPlanRef {
        Arc::new(LogicalPlan::Predicate { input, predicate })
    }

    /// Join node
    pub fn join(
        left: LogicalPlanRef,
        right: LogicalPlanRef,
        mode: JoinMode,
        predicates: Vec<Predicate>,
    ) -> LogicalPlanRef {
        Arc::new(LogicalPlan::Join {
            left,
            right,
            mode,
            predicates,
        })
    }

    /// Aliases of every base relation in this subtree, leftmost first
    pub fn relations(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_relations(&mut out);
        out
    }

    fn collect_relations<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            LogicalPlan::StoredTable { alias, .. } => out.push(alias),
            LogicalPlan::Predicate { input, .. } => input.collect_relations(out),
            LogicalPlan::Join { left, right, .. } => {
                left.collect_relations(out);
                right.collect_relations(out);
            }
        }
    }

    /// Resolve a relation alias to its stored table, if the alias names a
    /// base relation of this subtree
    pub fn stored_table_for_alias(&self, alias: &str) -> Option<(&str, &Arc<Table>)> {
        match self {
            LogicalPlan::StoredTable {
                name,
                alias: own_alias,
                table,
            } => (own_alias == alias).then_some((name.as_str(), table)),
            LogicalPlan::Predicate { input, .. } => input.stored_table_for_alias(alias),
            LogicalPlan::Join { left, right, .. } => left
                .stored_table_for_alias(alias)
                .or_else(|| right.stored_table_for_alias(alias)),
        }
    }

    /// Every predicate in this subtree, in depth-first order
    pub fn predicates(&self) -> Vec<&Predicate> {
        let mut out = Vec::new();
        self.collect_predicates(&mut out);
        out
    }

    fn collect_predicates<'a>(&'a self, out: &mut Vec<&'a Predicate>) {
        match self {
            LogicalPlan::StoredTable { .. } => {}
            LogicalPlan::Predicate { input, predicate } => {
                input.collect_predicates(out);
                out.push(predicate);
            }
            LogicalPlan::Join {
                left,
                right,
                predicates,
                ..
            } => {
                left.collect_predicates(out);
                right.collect_predicates(out);
                out.extend(predicates.iter());
            }
        }
    }

    /// Canonical structural signature, stable across executions.
    ///
    /// Used by the plan blacklist and the plan cache to identify a tree.
    pub fn signature(&self) -> String {
        let mut out = String::new();
        self.write_signature(&mut out);
        out
    }

    fn write_signature(&self, out: &mut String) {
        match self {
            LogicalPlan::StoredTable { name, alias, .. } => {
                out.push_str("table:");
                out.push_str(name);
                out.push('@');
                out.push_str(alias);
            }
            LogicalPlan::Predicate { input, predicate } => {
                out.push_str("select[");
                out.push_str(&predicate.to_string());
                out.push_str("](");
                input.write_signature(out);
                out.push(')');
            }
            LogicalPlan::Join {
                left,
                right,
                mode,
                predicates,
            } => {
                out.push_str("join:");
                out.push_str(&mode.to_string());
                out.push('[');
                for (i, predicate) in predicates.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&predicate.to_string());
                }
                out.push_str("](");
                left.write_signature(out);
                out.push_str(", ");
                right.write_signature(out);
                out.push(')');
            }
        }
    }
}

impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature())
    }
}
