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

//! Name resolution and type checking
//!
//! Binds a parsed statement against the catalog: table references resolve
//! to stored tables, column references to (relation, column id, type), and
//! every comparison is type-checked. The result is the LQP the optimizer
//! consumes.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::{DataType, Error, PredicateCondition, Result};
use crate::expr::{ColumnRef, Operand, Predicate};
use crate::optimizer::{LogicalPlan, LogicalPlanRef};
use crate::storage::{Catalog, Table};

use super::ast::{AstExpr, AstOperand, SelectStatement};

/// Relations visible while binding one statement
struct BindScope {
    /// Binding name -> resolved table, in FROM order
    relations: Vec<(String, Arc<Table>)>,
}

impl BindScope {
    fn table(&self, binding: &str) -> Option<&Arc<Table>> {
        self.relations
            .iter()
            .find(|(name, _)| name == binding)
            .map(|(_, table)| table)
    }

    /// Resolve a possibly-qualified column to its relation
    fn resolve_column(
        &self,
        qualifier: Option<&str>,
        column: &str,
    ) -> Result<ColumnRef> {
        match qualifier {
            Some(qualifier) => {
                let table = self.table(qualifier).ok_or_else(|| {
                    Error::invalid_input(format!("unknown relation '{}'", qualifier))
                })?;
                let column_id = table.column_id_by_name(column)?;
                Ok(ColumnRef {
                    relation: qualifier.to_string(),
                    column: column.to_string(),
                    column_id,
                    data_type: table.column_data_type(column_id),
                })
            }
            None => {
                let mut matches = self.relations.iter().filter_map(|(binding, table)| {
                    table
                        .column_id_by_name(column)
                        .ok()
                        .map(|column_id| (binding, table, column_id))
                });
                let Some((binding, table, column_id)) = matches.next() else {
                    return Err(Error::ColumnNotFound(column.to_string()));
                };
                if matches.next().is_some() {
                    return Err(Error::invalid_input(format!(
                        "column '{}' is ambiguous",
                        column
                    )));
                }
                Ok(ColumnRef {
                    relation: binding.clone(),
                    column: column.to_string(),
                    column_id,
                    data_type: table.column_data_type(column_id),
                })
            }
        }
    }
}

/// Bind a parsed statement to a logical plan
pub fn bind(catalog: &Catalog, statement: &SelectStatement) -> Result<LogicalPlanRef> {
    // Resolve every relation up front so columns bind against all of them
    let mut scope = BindScope {
        relations: Vec::new(),
    };
    let mut seen: FxHashMap<String, ()> = FxHashMap::default();
    let mut add_relation = |scope: &mut BindScope, table_ref: &super::ast::TableRef| {
        let binding = table_ref.binding_name().to_string();
        if seen.insert(binding.clone(), ()).is_some() {
            return Err(Error::invalid_input(format!(
                "duplicate relation name '{}'",
                binding
            )));
        }
        let table = catalog.get_table(&table_ref.table)?;
        scope.relations.push((binding, table));
        Ok(())
    };
    add_relation(&mut scope, &statement.from)?;
    for join in &statement.joins {
        add_relation(&mut scope, &join.table)?;
    }

    // FROM base
    let (base_binding, base_table) = &scope.relations[0];
    let mut plan = LogicalPlan::stored_table(
        statement.from.table.clone(),
        base_binding.clone(),
        Arc::clone(base_table),
    );

    // JOIN clauses fold left-to-right
    for (index, join) in statement.joins.iter().enumerate() {
        let (binding, table) = &scope.relations[index + 1];
        let right =
            LogicalPlan::stored_table(join.table.table.clone(), binding.clone(), Arc::clone(table));
        let predicates = match &join.on {
            Some(on) => bind_conjunction(&scope, on)?,
            None => Vec::new(),
        };
        if predicates.is_empty() && join.mode != crate::core::JoinMode::Cross {
            return Err(Error::invalid_input(format!(
                "{} join requires an ON condition",
                join.mode
            )));
        }
        plan = LogicalPlan::join(plan, right, join.mode, predicates);
    }

    // WHERE conjunction
    if let Some(selection) = &statement.selection {
        for predicate in bind_conjunction(&scope, selection)? {
            plan = LogicalPlan::predicate(plan, predicate);
        }
    }

    Ok(plan)
}

fn bind_conjunction(scope: &BindScope, expr: &AstExpr) -> Result<Vec<Predicate>> {
    expr.conjuncts()
        .into_iter()
        .map(|leaf| bind_leaf(scope, leaf))
        .collect()
}

fn bind_leaf(scope: &BindScope, expr: &AstExpr) -> Result<Predicate> {
    match expr {
        AstExpr::And(..) => Err(Error::Internal("conjunction leaf expected".into())),
        AstExpr::Comparison {
            lhs,
            condition,
            rhs,
        } => {
            let lhs = bind_operand(scope, lhs)?;
            let rhs = bind_operand(scope, rhs)?;
            check_comparison(&lhs, *condition, &rhs)?;
            Ok(Predicate::new(lhs, *condition, rhs))
        }
        AstExpr::Between { lhs, lower, upper } => {
            let lhs = bind_operand(scope, lhs)?;
            let lower = bind_operand(scope, lower)?;
            let upper = bind_operand(scope, upper)?;
            check_comparison(&lhs, PredicateCondition::LessThanEquals, &lower)?;
            check_comparison(&lhs, PredicateCondition::LessThanEquals, &upper)?;
            Ok(Predicate::between(lhs, lower, upper))
        }
    }
}

fn bind_operand(scope: &BindScope, operand: &AstOperand) -> Result<Operand> {
    match operand {
        AstOperand::Column { qualifier, name } => Ok(Operand::Column(
            scope.resolve_column(qualifier.as_deref(), name)?,
        )),
        AstOperand::Literal(value) => Ok(Operand::Literal(value.clone())),
    }
}

fn operand_type(operand: &Operand) -> Option<DataType> {
    match operand {
        Operand::Column(column) => Some(column.data_type),
        Operand::Literal(value) => value.data_type(),
    }
}

/// Reject comparisons the engine cannot evaluate
fn check_comparison(
    lhs: &Operand,
    condition: PredicateCondition,
    rhs: &Operand,
) -> Result<()> {
    let lhs_type = operand_type(lhs);
    let rhs_type = operand_type(rhs);

    if condition.is_pattern() {
        if lhs_type != Some(DataType::Text) || rhs_type != Some(DataType::Text) {
            return Err(Error::unsupported(format!(
                "{} requires text operands",
                condition
            )));
        }
        return Ok(());
    }

    let compatible = match (lhs_type, rhs_type) {
        // NULL literals compare with anything (and match nothing)
        (None, _) | (_, None) => true,
        (Some(a), Some(b)) => a == b || (a.is_numeric() && b.is_numeric()),
    };
    if compatible {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            column: lhs.to_string(),
            expected: lhs_type.map(|t| t.to_string()).unwrap_or_default(),
            got: rhs_type.map(|t| t.to_string()).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{JoinMode, Value};
    use crate::pipeline::ast::TableRef;
    use crate::storage::{ColumnDefinition, TableType, UseMvcc, DEFAULT_CHUNK_SIZE};

    fn catalog() -> Catalog {
        let catalog = Catalog::new();
        let orders = Table::new(
            vec![
                ColumnDefinition::new("id", DataType::Int32, false),
                ColumnDefinition::new("total", DataType::Int64, false),
            ],
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        );
        let items = Table::new(
            vec![
                ColumnDefinition::new("order_id", DataType::Int32, false),
                ColumnDefinition::new("name", DataType::Text, false),
            ],
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        );
        catalog.add_table("orders", Arc::new(orders)).unwrap();
        catalog.add_table("items", Arc::new(items)).unwrap();
        catalog
    }

    fn join_statement() -> SelectStatement {
        SelectStatement::from_table(TableRef::aliased("orders", "o")).join(
            TableRef::new("items"),
            JoinMode::Inner,
            AstExpr::compare(
                AstOperand::qualified("o", "id"),
                PredicateCondition::Equals,
                AstOperand::qualified("items", "order_id"),
            ),
        )
    }

    #[test]
    fn test_bind_join_statement() {
        let plan = bind(&catalog(), &join_statement()).unwrap();
        assert_eq!(plan.relations(), vec!["o", "items"]);
        assert_eq!(plan.predicates().len(), 1);
    }

    #[test]
    fn test_unqualified_column_resolution() {
        let statement = join_statement().filter(AstExpr::compare(
            AstOperand::column("total"),
            PredicateCondition::GreaterThan,
            AstOperand::literal(100i64),
        ));
        let plan = bind(&catalog(), &statement).unwrap();
        let predicates = plan.predicates();
        let filter = predicates.last().unwrap();
        assert_eq!(filter.columns()[0].relation, "o");
    }

    #[test]
    fn test_unknown_names_rejected() {
        let statement = SelectStatement::from_table(TableRef::new("missing"));
        assert!(matches!(
            bind(&catalog(), &statement),
            Err(Error::TableNotFound(_))
        ));

        let statement = join_statement().filter(AstExpr::compare(
            AstOperand::column("nope"),
            PredicateCondition::Equals,
            AstOperand::literal(1),
        ));
        assert!(matches!(
            bind(&catalog(), &statement),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_type_checking() {
        // TEXT = INT32 is rejected
        let statement = join_statement().filter(AstExpr::compare(
            AstOperand::qualified("items", "name"),
            PredicateCondition::Equals,
            AstOperand::literal(1),
        ));
        assert!(matches!(
            bind(&catalog(), &statement),
            Err(Error::TypeMismatch { .. })
        ));

        // LIKE on a non-text column is unsupported
        let statement = join_statement().filter(AstExpr::compare(
            AstOperand::qualified("o", "total"),
            PredicateCondition::Like,
            AstOperand::literal("%x%"),
        ));
        assert_eq!(
            bind(&catalog(), &statement).unwrap_err().kind(),
            crate::core::ErrorKind::Unsupported
        );
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let statement = SelectStatement::from_table(TableRef::new("orders")).cross_join(
            TableRef::aliased("items", "orders"),
        );
        assert!(bind(&catalog(), &statement).is_err());
    }

    #[test]
    fn test_numeric_widths_compare() {
        // INT64 column vs INT32 literal binds fine
        let statement = join_statement().filter(AstExpr::compare(
            AstOperand::qualified("o", "total"),
            PredicateCondition::Equals,
            AstOperand::Literal(Value::Int32(5)),
        ));
        assert!(bind(&catalog(), &statement).is_ok());
    }
}
