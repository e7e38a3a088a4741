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

//! Bound predicate expressions
//!
//! The fragment the core executes is comparison-shaped: a column against a
//! literal, a column against a column, with one of the nine
//! [`PredicateCondition`]s. Predicates are bound — every column reference
//! names its relation (by alias) and carries the resolved column id and
//! type — so the optimizer can reason about which relations a predicate
//! touches without a catalog in hand.

pub mod like;

use std::fmt;

use smallvec::SmallVec;

use crate::core::{DataType, Error, PredicateCondition, Result, Value};

pub use like::LikePattern;

/// A bound reference to a column of a named relation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Alias of the relation (unique within a query)
    pub relation: String,
    /// Column name within the relation
    pub column: String,
    /// Resolved column id within the relation's table
    pub column_id: crate::core::ColumnId,
    /// Resolved column type
    pub data_type: DataType,
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.relation, self.column)
    }
}

/// One side of a predicate: a bound column or a literal
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(ColumnRef),
    Literal(Value),
}

impl Operand {
    /// The column reference, if this operand is one
    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Operand::Column(column) => Some(column),
            Operand::Literal(_) => None,
        }
    }

    /// The literal value, if this operand is one
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Operand::Literal(value) => Some(value),
            Operand::Column(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Column(column) => write!(f, "{}", column),
            Operand::Literal(Value::Text(s)) => write!(f, "'{}'", s),
            Operand::Literal(value) => write!(f, "{}", value),
        }
    }
}

/// A bound comparison predicate.
///
/// `BETWEEN` carries its upper bound in `upper`; all other conditions leave
/// it empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub lhs: Operand,
    pub condition: PredicateCondition,
    pub rhs: Operand,
    pub upper: Option<Operand>,
}

impl Predicate {
    /// Create a binary predicate
    pub fn new(lhs: Operand, condition: PredicateCondition, rhs: Operand) -> Self {
        debug_assert!(condition != PredicateCondition::Between);
        Self {
            lhs,
            condition,
            rhs,
            upper: None,
        }
    }

    /// Create a BETWEEN predicate
    pub fn between(lhs: Operand, lower: Operand, upper: Operand) -> Self {
        Self {
            lhs,
            condition: PredicateCondition::Between,
            rhs: lower,
            upper: Some(upper),
        }
    }

    /// All column operands, in lhs/rhs/upper order
    pub fn columns(&self) -> SmallVec<[&ColumnRef; 2]> {
        let mut columns = SmallVec::new();
        for operand in [Some(&self.lhs), Some(&self.rhs), self.upper.as_ref()]
            .into_iter()
            .flatten()
        {
            if let Operand::Column(column) = operand {
                columns.push(column);
            }
        }
        columns
    }

    /// Distinct relation aliases this predicate touches
    pub fn referenced_relations(&self) -> SmallVec<[&str; 2]> {
        let mut relations: SmallVec<[&str; 2]> = SmallVec::new();
        for column in self.columns() {
            if !relations.contains(&column.relation.as_str()) {
                relations.push(&column.relation);
            }
        }
        relations
    }

    /// Returns true for a column-equals-column predicate across two relations
    pub fn is_equi_join(&self) -> bool {
        self.condition == PredicateCondition::Equals && self.join_columns().is_some()
    }

    /// The (left, right) column pair for a column-vs-column predicate
    /// spanning two relations
    pub fn join_columns(&self) -> Option<(&ColumnRef, &ColumnRef)> {
        match (&self.lhs, &self.rhs) {
            (Operand::Column(l), Operand::Column(r)) if l.relation != r.relation => {
                Some((l, r))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.condition, &self.upper) {
            (PredicateCondition::Between, Some(upper)) => {
                write!(f, "{} BETWEEN {} AND {}", self.lhs, self.rhs, upper)
            }
            _ => write!(f, "{} {} {}", self.lhs, self.condition, self.rhs),
        }
    }
}

/// Evaluate a non-pattern comparison between two boundary values.
///
/// NULL on either side yields false (SQL three-valued logic collapsed to
/// the filtering interpretation). Pattern conditions must go through a
/// precompiled [`LikePattern`]; calling them here is an internal error.
pub fn satisfies(lhs: &Value, rhs: &Value, condition: PredicateCondition) -> Result<bool> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(false);
    }
    let ordering = lhs.total_cmp(rhs);
    match condition {
        PredicateCondition::Equals => Ok(ordering.is_eq()),
        PredicateCondition::NotEquals => Ok(ordering.is_ne()),
        PredicateCondition::LessThan => Ok(ordering.is_lt()),
        PredicateCondition::LessThanEquals => Ok(ordering.is_le()),
        PredicateCondition::GreaterThan => Ok(ordering.is_gt()),
        PredicateCondition::GreaterThanEquals => Ok(ordering.is_ge()),
        PredicateCondition::Like | PredicateCondition::NotLike => Err(Error::unsupported(
            "pattern conditions require a compiled LIKE pattern",
        )),
        PredicateCondition::Between => Err(Error::unsupported(
            "BETWEEN must be evaluated as two range comparisons",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(relation: &str, column: &str) -> Operand {
        Operand::Column(ColumnRef {
            relation: relation.into(),
            column: column.into(),
            column_id: 0,
            data_type: DataType::Int32,
        })
    }

    #[test]
    fn test_referenced_relations() {
        let p = Predicate::new(col("r1", "a"), PredicateCondition::Equals, col("r2", "b"));
        assert_eq!(p.referenced_relations().as_slice(), ["r1", "r2"]);

        let local = Predicate::new(
            col("r1", "a"),
            PredicateCondition::GreaterThan,
            Operand::Literal(Value::Int32(5)),
        );
        assert_eq!(local.referenced_relations().as_slice(), ["r1"]);
    }

    #[test]
    fn test_equi_join_detection() {
        let join = Predicate::new(col("r1", "a"), PredicateCondition::Equals, col("r2", "b"));
        assert!(join.is_equi_join());

        let theta = Predicate::new(col("r1", "a"), PredicateCondition::LessThan, col("r2", "b"));
        assert!(!theta.is_equi_join());
        assert!(theta.join_columns().is_some());

        let local = Predicate::new(col("r1", "a"), PredicateCondition::Equals, col("r1", "b"));
        assert!(!local.is_equi_join());
    }

    #[test]
    fn test_satisfies() {
        assert!(satisfies(
            &Value::Int32(3),
            &Value::Int32(3),
            PredicateCondition::Equals
        )
        .unwrap());
        assert!(satisfies(
            &Value::Int32(2),
            &Value::Int32(3),
            PredicateCondition::LessThan
        )
        .unwrap());
        assert!(!satisfies(
            &Value::Null,
            &Value::Int32(3),
            PredicateCondition::Equals
        )
        .unwrap());
        assert!(satisfies(
            &Value::text("b"),
            &Value::text("a"),
            PredicateCondition::GreaterThan
        )
        .unwrap());
        assert!(satisfies(
            &Value::Int32(1),
            &Value::Int32(1),
            PredicateCondition::Like
        )
        .is_err());
    }

    #[test]
    fn test_between_display() {
        let p = Predicate::between(
            col("r1", "a"),
            Operand::Literal(Value::Int32(1)),
            Operand::Literal(Value::Int32(9)),
        );
        assert_eq!(p.to_string(), "r1.a BETWEEN 1 AND 9");
    }
}
