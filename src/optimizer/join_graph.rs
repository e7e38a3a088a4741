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

//! Join hypergraph
//!
//! Vertices are the reorderable base relations of an LQP region; edges
//! carry predicates keyed by the exact vertex set their columns touch. A
//! one-vertex edge holds local filters, a two-vertex edge binary join
//! predicates, larger edges hyper-predicates. Construction walks inner-join
//! and filter nodes, so the result is invariant under the input's join
//! commutativity; predicate placement is deferred to the plan builder.

use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::{Error, JoinMode, Result};
use crate::expr::Predicate;

use super::logical_plan::{LogicalPlan, LogicalPlanRef};

/// A subset of a join graph's vertices, packed into a u64 bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct VertexSet(u64);

/// DPccp operates on bitmask vertex sets; more relations than bits is far
/// outside this engine's envelope.
pub const MAX_VERTICES: usize = 64;

impl VertexSet {
    /// The empty set
    pub fn empty() -> Self {
        VertexSet(0)
    }

    /// A one-vertex set
    pub fn single(vertex: usize) -> Self {
        debug_assert!(vertex < MAX_VERTICES);
        VertexSet(1 << vertex)
    }

    /// The full set over `count` vertices
    pub fn full(count: usize) -> Self {
        debug_assert!(count <= MAX_VERTICES);
        if count == MAX_VERTICES {
            VertexSet(u64::MAX)
        } else {
            VertexSet((1u64 << count) - 1)
        }
    }

    /// The raw bitmask
    pub fn bits(&self) -> u64 {
        self.0
    }

    /// Build from a raw bitmask
    pub fn from_bits(bits: u64) -> Self {
        VertexSet(bits)
    }

    /// Insert a vertex
    pub fn insert(&mut self, vertex: usize) {
        self.0 |= 1 << vertex;
    }

    /// Membership test
    pub fn contains(&self, vertex: usize) -> bool {
        self.0 & (1 << vertex) != 0
    }

    /// Number of vertices in the set
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Returns true for the empty set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Set difference
    pub fn minus(&self, other: VertexSet) -> VertexSet {
        VertexSet(self.0 & !other.0)
    }

    /// Returns true if every vertex of `self` is in `other`
    pub fn is_subset_of(&self, other: VertexSet) -> bool {
        self.0 & !other.0 == 0
    }

    /// Returns true if the sets share at least one vertex
    pub fn intersects(&self, other: VertexSet) -> bool {
        self.0 & other.0 != 0
    }

    /// The lowest vertex index, if any
    pub fn lowest(&self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }

    /// Iterate vertex indices in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                None
            } else {
                let vertex = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(vertex)
            }
        })
    }
}

impl BitOr for VertexSet {
    type Output = VertexSet;

    fn bitor(self, rhs: VertexSet) -> VertexSet {
        VertexSet(self.0 | rhs.0)
    }
}

impl BitAnd for VertexSet {
    type Output = VertexSet;

    fn bitand(self, rhs: VertexSet) -> VertexSet {
        VertexSet(self.0 & rhs.0)
    }
}

impl fmt::Display for VertexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, vertex) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", vertex)?;
        }
        write!(f, "}}")
    }
}

/// A (hyper)edge: predicates over exactly the vertices in `vertex_set`
#[derive(Debug, Clone)]
pub struct JoinGraphEdge {
    pub vertex_set: VertexSet,
    pub predicates: Vec<Predicate>,
}

/// The join hypergraph of one reorderable LQP region
#[derive(Debug)]
pub struct JoinGraph {
    pub vertices: Vec<LogicalPlanRef>,
    pub edges: Vec<JoinGraphEdge>,
}

impl JoinGraph {
    /// Build the join graph of an LQP.
    ///
    /// Inner and cross joins and filter nodes are traversed; every other
    /// node becomes an opaque vertex. Returns `None` when the plan has
    /// fewer than two vertices to reorder.
    pub fn from_lqp(lqp: &LogicalPlanRef) -> Result<Option<JoinGraph>> {
        let mut vertices: Vec<LogicalPlanRef> = Vec::new();
        let mut predicates: Vec<Predicate> = Vec::new();
        Self::traverse(lqp, &mut vertices, &mut predicates);

        if vertices.len() < 2 {
            return Ok(None);
        }
        if vertices.len() > MAX_VERTICES {
            return Err(Error::unsupported(format!(
                "join graphs beyond {} vertices",
                MAX_VERTICES
            )));
        }

        // Relation alias -> vertex index, over each vertex's own relations
        let mut alias_to_vertex: FxHashMap<&str, usize> = FxHashMap::default();
        for (index, vertex) in vertices.iter().enumerate() {
            for alias in vertex.relations() {
                alias_to_vertex.insert(alias, index);
            }
        }

        let mut edges: Vec<JoinGraphEdge> = Vec::new();
        for predicate in predicates {
            let mut vertex_set = VertexSet::empty();
            for relation in predicate.referenced_relations() {
                let index = alias_to_vertex.get(relation).ok_or_else(|| {
                    Error::invalid_input(format!("predicate references unknown relation '{}'", relation))
                })?;
                vertex_set.insert(*index);
            }
            if vertex_set.is_empty() {
                return Err(Error::invalid_input(format!(
                    "predicate '{}' references no relation",
                    predicate
                )));
            }
            match edges.iter_mut().find(|edge| edge.vertex_set == vertex_set) {
                Some(edge) => edge.predicates.push(predicate),
                None => edges.push(JoinGraphEdge {
                    vertex_set,
                    predicates: vec![predicate],
                }),
            }
        }

        Ok(Some(JoinGraph { vertices, edges }))
    }

    fn traverse(
        lqp: &LogicalPlanRef,
        vertices: &mut Vec<LogicalPlanRef>,
        predicates: &mut Vec<Predicate>,
    ) {
        match lqp.as_ref() {
            LogicalPlan::Join {
                left,
                right,
                mode,
                predicates: join_predicates,
            } if matches!(mode, JoinMode::Inner | JoinMode::Cross) => {
                Self::traverse(left, vertices, predicates);
                Self::traverse(right, vertices, predicates);
                predicates.extend(join_predicates.iter().cloned());
            }
            LogicalPlan::Predicate { input, predicate } => {
                Self::traverse(input, vertices, predicates);
                predicates.push(predicate.clone());
            }
            _ => vertices.push(Arc::clone(lqp)),
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Predicates that span `side_a` and `side_b`: on edges inside the
    /// union but wholly within neither side
    pub fn find_predicates(&self, side_a: VertexSet, side_b: VertexSet) -> Vec<Predicate> {
        let union = side_a | side_b;
        let mut out = Vec::new();
        for edge in &self.edges {
            if edge.vertex_set.is_subset_of(union)
                && !edge.vertex_set.is_subset_of(side_a)
                && !edge.vertex_set.is_subset_of(side_b)
            {
                out.extend(edge.predicates.iter().cloned());
            }
        }
        out
    }

    /// Local predicates of a single vertex
    pub fn find_local_predicates(&self, vertex: usize) -> Vec<Predicate> {
        let single = VertexSet::single(vertex);
        self.edges
            .iter()
            .filter(|edge| edge.vertex_set == single)
            .flat_map(|edge| edge.predicates.iter().cloned())
            .collect()
    }

    /// Vertex pairs of all binary edges, each pair ordered ascending
    pub fn binary_edges(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for edge in &self.edges {
            if edge.vertex_set.count() == 2 {
                let mut iter = edge.vertex_set.iter();
                let first = iter.next().expect("two vertices");
                let second = iter.next().expect("two vertices");
                if !out.contains(&(first, second)) {
                    out.push((first, second));
                }
            }
        }
        out
    }

    /// Returns true if the induced subgraph on `set` is connected under
    /// the binary edges
    pub fn is_connected(&self, set: VertexSet) -> bool {
        let Some(start) = set.lowest() else {
            return false;
        };
        let edges = self.binary_edges();
        let mut reached = VertexSet::single(start);
        loop {
            let mut grew = false;
            for &(a, b) in &edges {
                if !set.contains(a) || !set.contains(b) {
                    continue;
                }
                if reached.contains(a) != reached.contains(b) {
                    reached.insert(a);
                    reached.insert(b);
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }
        set.is_subset_of(reached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, JoinMode, PredicateCondition, Value};
    use crate::expr::{ColumnRef, Operand};
    use crate::storage::{ColumnDefinition, Table, TableType, UseMvcc, DEFAULT_CHUNK_SIZE};

    fn table() -> Arc<Table> {
        Arc::new(Table::new(
            vec![ColumnDefinition::new("a", DataType::Int32, false)],
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        ))
    }

    fn col(relation: &str) -> Operand {
        Operand::Column(ColumnRef {
            relation: relation.into(),
            column: "a".into(),
            column_id: 0,
            data_type: DataType::Int32,
        })
    }

    fn join_pred(a: &str, b: &str) -> Predicate {
        Predicate::new(col(a), PredicateCondition::Equals, col(b))
    }

    /// r1 - r2 - r3 chain with a local filter on r1
    fn chain_lqp() -> LogicalPlanRef {
        let r1 = LogicalPlan::stored_table("t1", "r1", table());
        let r1 = LogicalPlan::predicate(
            r1,
            Predicate::new(
                col("r1"),
                PredicateCondition::GreaterThan,
                Operand::Literal(Value::Int32(0)),
            ),
        );
        let r2 = LogicalPlan::stored_table("t2", "r2", table());
        let r3 = LogicalPlan::stored_table("t3", "r3", table());
        let j12 = LogicalPlan::join(r1, r2, JoinMode::Inner, vec![join_pred("r1", "r2")]);
        LogicalPlan::join(j12, r3, JoinMode::Inner, vec![join_pred("r2", "r3")])
    }

    #[test]
    fn test_vertex_set_ops() {
        let mut set = VertexSet::single(0);
        set.insert(2);
        assert!(set.contains(0));
        assert!(!set.contains(1));
        assert_eq!(set.count(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(set.lowest(), Some(0));
        assert!(VertexSet::single(0).is_subset_of(set));
        assert!(set.intersects(VertexSet::single(2)));
        assert_eq!(set.minus(VertexSet::single(0)), VertexSet::single(2));
        assert_eq!(VertexSet::full(3).bits(), 0b111);
        assert_eq!(set.to_string(), "{0,2}");
    }

    #[test]
    fn test_graph_construction() {
        let graph = JoinGraph::from_lqp(&chain_lqp()).unwrap().unwrap();
        assert_eq!(graph.vertex_count(), 3);

        // One local edge on r1, two binary edges
        let local: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.vertex_set.count() == 1)
            .collect();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].vertex_set, VertexSet::single(0));
        assert_eq!(graph.binary_edges(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_graph_invariant_under_commutativity() {
        // r2 join r1 produces the same edge sets as r1 join r2
        let r1 = LogicalPlan::stored_table("t1", "r1", table());
        let r2 = LogicalPlan::stored_table("t2", "r2", table());
        let swapped =
            LogicalPlan::join(r2, r1, JoinMode::Inner, vec![join_pred("r1", "r2")]);
        let graph = JoinGraph::from_lqp(&swapped).unwrap().unwrap();
        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.binary_edges(), vec![(0, 1)]);
    }

    #[test]
    fn test_find_predicates() {
        let graph = JoinGraph::from_lqp(&chain_lqp()).unwrap().unwrap();
        let s1 = VertexSet::single(0);
        let s2 = VertexSet::single(1);
        let between = graph.find_predicates(s1, s2);
        assert_eq!(between.len(), 1);
        assert_eq!(between[0].referenced_relations().as_slice(), ["r1", "r2"]);

        // Predicates within one side are not returned
        let mut s12 = VertexSet::single(0);
        s12.insert(1);
        let spanning = graph.find_predicates(s12, VertexSet::single(2));
        assert_eq!(spanning.len(), 1);
        assert_eq!(spanning[0].referenced_relations().as_slice(), ["r2", "r3"]);
    }

    #[test]
    fn test_local_predicates() {
        let graph = JoinGraph::from_lqp(&chain_lqp()).unwrap().unwrap();
        assert_eq!(graph.find_local_predicates(0).len(), 1);
        assert_eq!(graph.find_local_predicates(1).len(), 0);
    }

    #[test]
    fn test_connectivity() {
        let graph = JoinGraph::from_lqp(&chain_lqp()).unwrap().unwrap();
        assert!(graph.is_connected(VertexSet::full(3)));
        let mut r1_r3 = VertexSet::single(0);
        r1_r3.insert(2);
        // r1 and r3 share no edge
        assert!(!graph.is_connected(r1_r3));
    }

    #[test]
    fn test_single_vertex_is_no_graph() {
        let lqp = LogicalPlan::stored_table("t1", "r1", table());
        assert!(JoinGraph::from_lqp(&lqp).unwrap().is_none());
    }
}
