//! Seed reachability: which nodes label mass can ever arrive at.
//!
//! Under the spreading update, mass only moves along edges, so a node that no seed can reach
//! keeps a `(0, 0)` row forever. Road extracts often contain such fragments.

use std::collections::VecDeque;

use crate::graph::GraphRef;

/// `mask[i]` is true when node `i` shares a connected component with at least one seed.
///
/// The search starts from every in-range seed at once; out-of-range seeds and out-of-range
/// neighbors are skipped.
pub fn reachable_from<G: GraphRef>(graph: &G, seeds: &[usize]) -> Vec<bool> {
    let n = graph.node_count();
    let mut reached = vec![false; n];
    let mut frontier: VecDeque<usize> = VecDeque::with_capacity(seeds.len());
    for &s in seeds {
        if s < n && !reached[s] {
            reached[s] = true;
            frontier.push_back(s);
        }
    }
    while let Some(u) = frontier.pop_front() {
        for &v in graph.neighbors_ref(u) {
            if v < n && !reached[v] {
                reached[v] = true;
                frontier.push_back(v);
            }
        }
    }
    reached
}

/// Nodes no seed can reach, ascending.
pub fn unreachable_from<G: GraphRef>(graph: &G, seeds: &[usize]) -> Vec<usize> {
    reachable_from(graph, seeds)
        .into_iter()
        .enumerate()
        .filter_map(|(i, hit)| (!hit).then_some(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecGraph {
        adj: Vec<Vec<usize>>,
    }

    impl GraphRef for VecGraph {
        fn node_count(&self) -> usize {
            self.adj.len()
        }
        fn neighbors_ref(&self, node: usize) -> &[usize] {
            &self.adj[node]
        }
    }

    #[test]
    fn reachability_follows_edges_from_each_seed() {
        // 0-1-2 and 3-4
        let g = VecGraph {
            adj: vec![vec![1], vec![0, 2], vec![1], vec![4], vec![3]],
        };
        assert_eq!(reachable_from(&g, &[2]), vec![true, true, true, false, false]);
        assert_eq!(reachable_from(&g, &[0, 4]), vec![true; 5]);
        assert_eq!(reachable_from(&g, &[]), vec![false; 5]);
    }

    #[test]
    fn out_of_range_seeds_and_neighbors_are_skipped() {
        let g = VecGraph {
            adj: vec![vec![1, 9], vec![0], vec![]],
        };
        assert_eq!(reachable_from(&g, &[0, 7]), vec![true, true, false]);
        assert_eq!(unreachable_from(&g, &[42]), vec![0, 1, 2]);
    }

    #[test]
    fn unreachable_lists_unseeded_components() {
        // 0-1, 2-3, 4 alone; seeds in the first two components.
        let g = VecGraph {
            adj: vec![vec![1], vec![0], vec![3], vec![2], vec![]],
        };
        assert_eq!(unreachable_from(&g, &[1, 2]), vec![4]);
        assert_eq!(unreachable_from(&g, &[0, 1]), vec![2, 3, 4]);
        assert!(unreachable_from(&g, &[0, 2, 4]).is_empty());
    }
}
