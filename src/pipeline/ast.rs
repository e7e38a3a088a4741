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

//! Parsed-statement input types
//!
//! The SQL front-end is an external collaborator; the pipeline consumes an
//! already-parsed statement covering the fragment the core executes:
//! aliased table references, inner/outer/cross joins with ON conjunctions,
//! and WHERE conjunctions of comparison, LIKE, and BETWEEN predicates.

use crate::core::{JoinMode, PredicateCondition, Value};

/// A table reference with an optional alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    /// Reference a table under its own name
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
        }
    }

    /// Reference a table under an alias
    pub fn aliased(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: Some(alias.into()),
        }
    }

    /// The name this reference binds under
    pub fn binding_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

/// An unbound operand: a possibly-qualified column or a literal
#[derive(Debug, Clone, PartialEq)]
pub enum AstOperand {
    Column {
        qualifier: Option<String>,
        name: String,
    },
    Literal(Value),
}

impl AstOperand {
    /// Unqualified column
    pub fn column(name: impl Into<String>) -> Self {
        AstOperand::Column {
            qualifier: None,
            name: name.into(),
        }
    }

    /// Qualified column (`alias.column`)
    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        AstOperand::Column {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    /// Literal value
    pub fn literal(value: impl Into<Value>) -> Self {
        AstOperand::Literal(value.into())
    }
}

/// An unbound boolean expression (conjunctions of comparisons)
#[derive(Debug, Clone, PartialEq)]
pub enum AstExpr {
    /// Conjunction
    And(Box<AstExpr>, Box<AstExpr>),

    /// `lhs <condition> rhs`
    Comparison {
        lhs: AstOperand,
        condition: PredicateCondition,
        rhs: AstOperand,
    },

    /// `lhs BETWEEN lower AND upper`
    Between {
        lhs: AstOperand,
        lower: AstOperand,
        upper: AstOperand,
    },
}

impl AstExpr {
    /// Build a comparison expression
    pub fn compare(lhs: AstOperand, condition: PredicateCondition, rhs: AstOperand) -> Self {
        AstExpr::Comparison {
            lhs,
            condition,
            rhs,
        }
    }

    /// Conjoin two expressions
    pub fn and(self, other: AstExpr) -> Self {
        AstExpr::And(Box::new(self), Box::new(other))
    }

    /// Flatten the conjunction tree into its leaves
    pub fn conjuncts(&self) -> Vec<&AstExpr> {
        match self {
            AstExpr::And(left, right) => {
                let mut out = left.conjuncts();
                out.extend(right.conjuncts());
                out
            }
            leaf => vec![leaf],
        }
    }
}

/// One JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table: TableRef,
    pub mode: JoinMode,
    pub on: Option<AstExpr>,
}

/// A parsed SELECT over the supported fragment
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub from: TableRef,
    pub joins: Vec<JoinClause>,
    pub selection: Option<AstExpr>,
}

impl SelectStatement {
    /// `SELECT * FROM table`
    pub fn from_table(table: TableRef) -> Self {
        Self {
            from: table,
            joins: Vec::new(),
            selection: None,
        }
    }

    /// Add a join clause
    pub fn join(mut self, table: TableRef, mode: JoinMode, on: AstExpr) -> Self {
        self.joins.push(JoinClause {
            table,
            mode,
            on: Some(on),
        });
        self
    }

    /// Add a cross join
    pub fn cross_join(mut self, table: TableRef) -> Self {
        self.joins.push(JoinClause {
            table,
            mode: JoinMode::Cross,
            on: None,
        });
        self
    }

    /// Set or extend the WHERE conjunction
    pub fn filter(mut self, expr: AstExpr) -> Self {
        self.selection = Some(match self.selection {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }
}
