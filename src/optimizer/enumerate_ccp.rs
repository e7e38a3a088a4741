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

//! Connected-subgraph / complement-pair enumeration
//!
//! The csg-cmp-pair enumeration from Moerkotte and Neumann's "Analysis of
//! Two Existing and One New Dynamic Programming Algorithm" underlying
//! DPccp. Every emitted pair `(S1, S2)` satisfies: the sets are disjoint,
//! both induce connected subgraphs, and at least one edge connects them.
//! Pairs are emitted bottom-up: any pair's components were themselves
//! emitted (or are single vertices) before the pair, which makes the
//! subplan cache of the DP well-defined.

use super::join_graph::VertexSet;

/// Enumerates csg-cmp-pairs over a vertex count and binary edge list
pub struct EnumerateCcp {
    num_vertices: usize,
    neighborhoods: Vec<VertexSet>,
}

impl EnumerateCcp {
    /// Prepare the per-vertex neighborhoods
    pub fn new(num_vertices: usize, edges: &[(usize, usize)]) -> Self {
        let mut neighborhoods = vec![VertexSet::empty(); num_vertices];
        for &(a, b) in edges {
            debug_assert!(a < num_vertices && b < num_vertices && a != b);
            neighborhoods[a].insert(b);
            neighborhoods[b].insert(a);
        }
        Self {
            num_vertices,
            neighborhoods,
        }
    }

    /// All csg-cmp-pairs in DP-compatible order
    pub fn enumerate(&self) -> Vec<(VertexSet, VertexSet)> {
        let mut pairs = Vec::new();

        // Connected subgraphs, seeded from the highest vertex downwards
        let mut csgs: Vec<VertexSet> = Vec::new();
        for vertex in (0..self.num_vertices).rev() {
            let seed = VertexSet::single(vertex);
            csgs.push(seed);
            self.enumerate_csg_recursive(&mut csgs, seed, self.exclusion_set(vertex));
        }

        for &csg in &csgs {
            self.enumerate_cmp(&mut pairs, csg);
        }

        pairs
    }

    /// Vertices `0..=vertex`, excluded when growing subgraphs seeded above
    fn exclusion_set(&self, vertex: usize) -> VertexSet {
        bits_through(vertex)
    }

    /// Union of neighborhoods of `vertex_set`, minus itself and `exclusion`
    fn neighborhood(&self, vertex_set: VertexSet, exclusion: VertexSet) -> VertexSet {
        let mut neighbors = VertexSet::empty();
        for vertex in vertex_set.iter() {
            neighbors = neighbors | self.neighborhoods[vertex];
        }
        neighbors.minus(vertex_set).minus(exclusion)
    }

    /// Grow `vertex_set` by non-empty subsets of its neighborhood,
    /// collecting every grown set
    fn enumerate_csg_recursive(
        &self,
        csgs: &mut Vec<VertexSet>,
        vertex_set: VertexSet,
        exclusion: VertexSet,
    ) {
        let neighbors = self.neighborhood(vertex_set, exclusion);
        if neighbors.is_empty() {
            return;
        }
        for subset in subsets_ascending(neighbors) {
            csgs.push(vertex_set | subset);
        }
        for subset in subsets_ascending(neighbors) {
            self.enumerate_csg_recursive(csgs, vertex_set | subset, exclusion | neighbors);
        }
    }

    /// Emit all complements of one connected subgraph
    fn enumerate_cmp(&self, pairs: &mut Vec<(VertexSet, VertexSet)>, csg: VertexSet) {
        let lowest = csg.lowest().expect("csg is non-empty");
        let exclusion = self.exclusion_set(lowest) | csg;
        let neighbors = self.neighborhood(csg, exclusion.minus(csg));

        for vertex in neighbors.iter().collect::<Vec<_>>().into_iter().rev() {
            let seed = VertexSet::single(vertex);
            pairs.push((csg, seed));

            // Grow the complement within the neighborhood's lower part
            let lower_neighbors = neighbors & bits_through(vertex);
            let mut cmps: Vec<VertexSet> = Vec::new();
            self.enumerate_csg_recursive(&mut cmps, seed, exclusion | lower_neighbors);
            for cmp in cmps {
                pairs.push((csg, cmp));
            }
        }
    }
}

/// The set of all vertices with index at or below `vertex`
fn bits_through(vertex: usize) -> VertexSet {
    if vertex + 1 >= 64 {
        VertexSet::from_bits(u64::MAX)
    } else {
        VertexSet::from_bits((1u64 << (vertex + 1)) - 1)
    }
}

/// Non-empty subsets of `set` in ascending bitmask order
fn subsets_ascending(set: VertexSet) -> Vec<VertexSet> {
    let bits = set.bits();
    let mut subsets = Vec::new();
    let mut sub: u64 = 0;
    loop {
        sub = sub.wrapping_sub(bits) & bits;
        if sub == 0 {
            break;
        }
        subsets.push(VertexSet::from_bits(sub));
    }
    subsets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid_pairs(
        pairs: &[(VertexSet, VertexSet)],
        num_vertices: usize,
        edges: &[(usize, usize)],
    ) {
        let is_connected = |set: VertexSet| {
            let Some(start) = set.lowest() else {
                return false;
            };
            let mut reached = VertexSet::single(start);
            loop {
                let mut grew = false;
                for &(a, b) in edges {
                    if set.contains(a)
                        && set.contains(b)
                        && reached.contains(a) != reached.contains(b)
                    {
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
        };

        for &(s1, s2) in pairs {
            assert!(!s1.intersects(s2), "pair sets must be disjoint");
            assert!(is_connected(s1), "csg {} must be connected", s1);
            assert!(is_connected(s2), "cmp {} must be connected", s2);
            assert!(
                edges.iter().any(|&(a, b)| {
                    (s1.contains(a) && s2.contains(b)) || (s1.contains(b) && s2.contains(a))
                }),
                "pair ({}, {}) must be edge-connected",
                s1,
                s2
            );
            assert!((s1 | s2).count() as usize <= num_vertices);
        }
    }

    fn assert_dp_order(pairs: &[(VertexSet, VertexSet)]) {
        // Bottom-up: every component is a singleton or was completed
        // (appeared as a union) earlier in the sequence
        let mut completed: Vec<VertexSet> = Vec::new();
        for &(s1, s2) in pairs {
            for component in [s1, s2] {
                assert!(
                    component.count() == 1 || completed.contains(&component),
                    "component {} used before it was completed",
                    component
                );
            }
            completed.push(s1 | s2);
        }
    }

    #[test]
    fn test_chain_of_three() {
        // 0 - 1 - 2
        let edges = [(0, 1), (1, 2)];
        let pairs = EnumerateCcp::new(3, &edges).enumerate();

        assert_valid_pairs(&pairs, 3, &edges);
        assert_dp_order(&pairs);

        // Chain of 3: {0}|{1}, {1}|{2}, {0,1}|{2}, {1,2}|{0} in some order
        assert_eq!(pairs.len(), 4);
        // {0} x {2} must not appear: no connecting edge
        assert!(!pairs
            .iter()
            .any(|&(a, b)| (a | b) == (VertexSet::single(0) | VertexSet::single(2))));
    }

    #[test]
    fn test_clique_of_three() {
        let edges = [(0, 1), (0, 2), (1, 2)];
        let pairs = EnumerateCcp::new(3, &edges).enumerate();
        assert_valid_pairs(&pairs, 3, &edges);
        assert_dp_order(&pairs);
        // Clique of 3 has 3 singleton pairs x unordered = 3*2/2... each
        // unordered split appears once: {i}|{j} (3), {i,j}|{k} (3)
        assert_eq!(pairs.len(), 6);
    }

    #[test]
    fn test_chain_of_four_count() {
        // Chain 0-1-2-3: the paper's #ccp for a chain of n is (n^3 - n)/6
        let edges = [(0, 1), (1, 2), (2, 3)];
        let pairs = EnumerateCcp::new(4, &edges).enumerate();
        assert_valid_pairs(&pairs, 4, &edges);
        assert_dp_order(&pairs);
        assert_eq!(pairs.len(), (4usize.pow(3) - 4) / 6);
    }

    #[test]
    fn test_star_of_four() {
        // 0 is the hub: 0-1, 0-2, 0-3
        let edges = [(0, 1), (0, 2), (0, 3)];
        let pairs = EnumerateCcp::new(4, &edges).enumerate();
        assert_valid_pairs(&pairs, 4, &edges);
        assert_dp_order(&pairs);
    }

    #[test]
    fn test_subsets_ascending() {
        let set = VertexSet::from_bits(0b101);
        let subsets: Vec<u64> = subsets_ascending(set).iter().map(|s| s.bits()).collect();
        assert_eq!(subsets, vec![0b001, 0b100, 0b101]);
    }
}
