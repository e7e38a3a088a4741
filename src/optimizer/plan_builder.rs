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

//! Logical-to-physical plan translation
//!
//! Materializes the optimizer's chosen LQP into an executable operator
//! tree: stored tables become `GetTable` leaves (wrapped in `Validate`
//! inside a transaction), filters become `TableScan`s, joins become
//! `JoinNestedLoop` with the first spanning equi-predicate as the primary
//! join predicate and the remaining predicates as post-filter scans.
//! Duplicate post-filters are collapsed before emission.

use std::sync::Arc;

use crate::core::{ColumnId, Error, JoinMode, PredicateCondition, Result};
use crate::executor::{
    BoxedOperator, GetTable, JoinNestedLoop, TableScan, Validate,
};
use crate::expr::{ColumnRef, Operand, Predicate};

use super::logical_plan::{LogicalPlan, LogicalPlanRef};

/// Options controlling physical plan construction
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanBuilderOptions {
    /// Wrap stored-table leaves in MVCC `Validate` operators
    pub validate: bool,
}

/// One column of an operator's output: which relation and column it came
/// from
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnSlot {
    alias: String,
    column_id: ColumnId,
}

/// The output column layout of an LQP subtree
fn output_columns(lqp: &LogicalPlan) -> Vec<ColumnSlot> {
    match lqp {
        LogicalPlan::StoredTable { alias, table, .. } => (0..table.column_count())
            .map(|column_id| ColumnSlot {
                alias: alias.clone(),
                column_id,
            })
            .collect(),
        LogicalPlan::Predicate { input, .. } => output_columns(input),
        LogicalPlan::Join {
            left, right, mode, ..
        } => {
            let mut columns = output_columns(left);
            if !mode.emits_left_only() {
                columns.extend(output_columns(right));
            }
            columns
        }
    }
}

/// Position of a bound column within an output layout
fn resolve_column(columns: &[ColumnSlot], column: &ColumnRef) -> Result<ColumnId> {
    columns
        .iter()
        .position(|slot| slot.alias == column.relation && slot.column_id == column.column_id)
        .map(|position| position as ColumnId)
        .ok_or_else(|| Error::ColumnNotFound(format!("{}", column)))
}

/// Build the physical tree for an optimized LQP
pub fn build_physical_plan(
    lqp: &LogicalPlanRef,
    options: Option<&PlanBuilderOptions>,
) -> Result<BoxedOperator> {
    let options = options.copied().unwrap_or_default();
    build_node(lqp, &options)
}

fn build_node(lqp: &LogicalPlanRef, options: &PlanBuilderOptions) -> Result<BoxedOperator> {
    match lqp.as_ref() {
        LogicalPlan::StoredTable { table, .. } => {
            let leaf: BoxedOperator = Box::new(GetTable::new(Arc::clone(table)));
            if options.validate && table.uses_mvcc() {
                Ok(Box::new(Validate::new(leaf)))
            } else {
                Ok(leaf)
            }
        }
        LogicalPlan::Predicate { input, predicate } => {
            let child = build_node(input, options)?;
            let columns = output_columns(input);
            build_scan(child, &columns, predicate)
        }
        LogicalPlan::Join {
            left,
            right,
            mode,
            predicates,
        } => build_join(lqp, left, right, *mode, predicates, options),
    }
}

/// Translate one predicate into a scan over `child`
fn build_scan(
    child: BoxedOperator,
    columns: &[ColumnSlot],
    predicate: &Predicate,
) -> Result<BoxedOperator> {
    match (&predicate.lhs, &predicate.rhs) {
        (Operand::Column(lhs), Operand::Literal(value)) => {
            let position = resolve_column(columns, lhs)?;
            match &predicate.upper {
                Some(Operand::Literal(upper)) => Ok(Box::new(TableScan::between(
                    child,
                    position,
                    value.clone(),
                    upper.clone(),
                ))),
                Some(Operand::Column(_)) => Err(Error::unsupported(
                    "BETWEEN with a column upper bound",
                )),
                None => Ok(Box::new(TableScan::new(
                    child,
                    position,
                    predicate.condition,
                    value.clone(),
                ))),
            }
        }
        (Operand::Literal(value), Operand::Column(rhs)) => {
            let position = resolve_column(columns, rhs)?;
            let condition = predicate.condition.flip().ok_or_else(|| {
                Error::unsupported(format!(
                    "literal-first {} predicates",
                    predicate.condition
                ))
            })?;
            Ok(Box::new(TableScan::new(
                child,
                position,
                condition,
                value.clone(),
            )))
        }
        (Operand::Column(lhs), Operand::Column(rhs)) => {
            let lhs_position = resolve_column(columns, lhs)?;
            let rhs_position = resolve_column(columns, rhs)?;
            Ok(Box::new(TableScan::column_vs_column(
                child,
                lhs_position,
                predicate.condition,
                rhs_position,
            )))
        }
        (Operand::Literal(_), Operand::Literal(_)) => Err(Error::unsupported(
            "predicates without a column operand",
        )),
    }
}

fn build_join(
    lqp: &LogicalPlanRef,
    left: &LogicalPlanRef,
    right: &LogicalPlanRef,
    mode: JoinMode,
    predicates: &[Predicate],
    options: &PlanBuilderOptions,
) -> Result<BoxedOperator> {
    let left_op = build_node(left, options)?;
    let right_op = build_node(right, options)?;
    let left_columns = output_columns(left);
    let right_columns = output_columns(right);

    if mode == JoinMode::Cross || predicates.is_empty() {
        if !predicates.is_empty() {
            return Err(Error::unsupported("cross join with predicates"));
        }
        if mode != JoinMode::Cross && mode != JoinMode::Inner {
            return Err(Error::unsupported(format!(
                "{} join without a predicate",
                mode
            )));
        }
        return Ok(Box::new(JoinNestedLoop::cross(left_op, right_op)));
    }

    // Primary join predicate: the first spanning equi-predicate, falling
    // back to the first spanning predicate of any condition
    let spans_sides = |predicate: &Predicate| -> Option<(ColumnId, ColumnId, PredicateCondition)> {
        let (a, b) = predicate.join_columns()?;
        if let (Ok(left_pos), Ok(right_pos)) = (
            resolve_column(&left_columns, a),
            resolve_column(&right_columns, b),
        ) {
            return Some((left_pos, right_pos, predicate.condition));
        }
        if let (Ok(left_pos), Ok(right_pos)) = (
            resolve_column(&left_columns, b),
            resolve_column(&right_columns, a),
        ) {
            // Operand sides swap, so the condition flips
            if let Some(flipped) = predicate.condition.flip() {
                return Some((left_pos, right_pos, flipped));
            }
        }
        None
    };

    let primary_index = predicates
        .iter()
        .position(|predicate| predicate.is_equi_join() && spans_sides(predicate).is_some())
        .or_else(|| {
            predicates
                .iter()
                .position(|predicate| spans_sides(predicate).is_some())
        })
        .ok_or_else(|| {
            Error::unsupported("join without a two-sided column predicate")
        })?;
    let (left_column, right_column, condition) =
        spans_sides(&predicates[primary_index]).expect("position found above");

    let mut plan: BoxedOperator = Box::new(JoinNestedLoop::new(
        left_op,
        right_op,
        mode,
        (left_column, right_column),
        condition,
    ));

    // Remaining predicates become post-filters over the joined columns;
    // duplicates collapse into one scan
    let joined_columns = output_columns(lqp);
    let mut applied: Vec<&Predicate> = Vec::new();
    for (index, predicate) in predicates.iter().enumerate() {
        if index == primary_index || applied.iter().any(|existing| *existing == predicate) {
            continue;
        }
        if mode.emits_left_only() {
            return Err(Error::unsupported(
                "secondary predicates on semi/anti joins",
            ));
        }
        plan = build_scan(plan, &joined_columns, predicate)?;
        applied.push(predicate);
    }

    Ok(plan)
}
