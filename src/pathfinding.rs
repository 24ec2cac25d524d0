//! Single-source shortest paths over a [`WeightedGraph`].
//!
//! [`dijkstra`] is parameterized over any heap backend through a
//! [`HeapFactory`]: the heap key orders vertices by tentative distance, and
//! relaxation always prefers `decrease_key` over reinsertion, so the
//! asymptotics are whatever the injected backend provides. The
//! label-correcting [`bfs_shortest_paths`] walk is the slow oracle the test
//! suite cross-checks every backend against.

use crate::graph::{VertexId, WeightedGraph};
use crate::traits::HeapFactory;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::ops::Add;

/// Bounds for edge-weight and distance types: totally ordered, copyable,
/// addable, with a zero provided by `Default`.
pub trait Cost: Ord + Copy + Add<Output = Self> + Default {}

impl<T> Cost for T where T: Ord + Copy + Add<Output = Self> + Default {}

/// Heap key used by Dijkstra: tentative distance to a vertex, ordered by
/// distance first and vertex id second so equal distances still compare
/// deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceKey<T> {
    pub distance: T,
    pub vertex: VertexId,
}

impl<T: Ord> Ord for DistanceKey<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.vertex.cmp(&other.vertex))
    }
}

impl<T: Ord> PartialOrd for DistanceKey<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A shortest path: the total distance and the vertex sequence from the
/// start vertex to the destination, inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path<T> {
    pub distance: T,
    pub vertices: Vec<VertexId>,
}

/// Dijkstra's single-source shortest paths, using a heap built by
/// `factory` for the ordering decisions.
///
/// Returns a path for every vertex reachable from `start`. Edge weights
/// must be non-negative.
pub fn dijkstra<T: Cost>(
    graph: &WeightedGraph<T>,
    start: VertexId,
    factory: &HeapFactory<DistanceKey<T>>,
) -> FxHashMap<VertexId, Path<T>> {
    // Maps a settled vertex to the previous vertex on its shortest path.
    let mut prev_vertex: FxHashMap<VertexId, VertexId> = FxHashMap::default();
    let mut results: FxHashMap<VertexId, Path<T>> = FxHashMap::default();

    // The frontier, ordered by tentative distance; one entry per vertex,
    // addressed by vertex id.
    let mut heap = factory.make();
    heap.push(
        DistanceKey {
            distance: T::default(),
            vertex: start,
        },
        start,
    );

    while let Some((key, _)) = heap.pop() {
        let from = key.vertex;

        // Skip if the shortest path was already finalized; backends are
        // free to have produced duplicate entries.
        if results.contains_key(&from) {
            continue;
        }
        results.insert(
            from,
            Path {
                distance: key.distance,
                vertices: Vec::new(),
            },
        );

        for edge in graph.graph.vertex(from).edges() {
            let to = edge.to();
            // A settled vertex already has a shorter path.
            if results.contains_key(&to) {
                continue;
            }

            let total = key.distance + graph.edge_weights.get(edge.id());
            assert!(
                total >= T::default(),
                "negative tentative distance via edge {}",
                edge.id()
            );

            match heap.get(to).copied() {
                None => {
                    heap.push(
                        DistanceKey {
                            distance: total,
                            vertex: to,
                        },
                        to,
                    );
                    prev_vertex.insert(to, from);
                }
                Some(entry) if total < entry.distance => {
                    let _ = heap.decrease_key(
                        to,
                        DistanceKey {
                            distance: total,
                            vertex: to,
                        },
                    );
                    prev_vertex.insert(to, from);
                }
                Some(_) => {}
            }
        }
    }

    // Trace each path backwards through the predecessor map.
    for (&vertex, path) in results.iter_mut() {
        let mut current = vertex;
        while current != start {
            path.vertices.push(current);
            current = prev_vertex[&current];
        }
        path.vertices.push(start);
        path.vertices.reverse();
    }

    results
}

/// A simple (not efficient) shortest-path oracle: label-correcting
/// traversal with a FIFO queue, re-relaxing whenever a shorter path
/// appears. Used by tests to cross-check the Dijkstra backends.
pub fn bfs_shortest_paths<T: Cost>(
    graph: &WeightedGraph<T>,
    start: VertexId,
) -> FxHashMap<VertexId, Path<T>> {
    let mut results: FxHashMap<VertexId, Path<T>> = FxHashMap::default();
    results.insert(
        start,
        Path {
            distance: T::default(),
            vertices: vec![start],
        },
    );

    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(vertex) = queue.pop_front() {
        let current_distance = results[&vertex].distance;

        for edge in graph.graph.vertex(vertex).edges() {
            let to = edge.to();
            let total = current_distance + graph.edge_weights.get(edge.id());

            // Keep only strict improvements.
            if let Some(existing) = results.get(&to) {
                if total >= existing.distance {
                    continue;
                }
            }

            let mut vertices = results[&vertex].vertices.clone();
            vertices.push(to);
            results.insert(
                to,
                Path {
                    distance: total,
                    vertices,
                },
            );
            queue.push_back(to);
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, Properties};
    use crate::traits::standard_factories;

    fn diamond() -> WeightedGraph<i64> {
        // 0 -> 1 (5), 0 -> 2 (3), 1 -> 3 (10), 2 -> 3 (20)
        let mut builder = GraphBuilder::new("diamond");
        for _ in 0..4 {
            builder.add_vertex();
        }
        let e0 = builder.add_edge(0, 1);
        let e1 = builder.add_edge(0, 2);
        let e2 = builder.add_edge(1, 3);
        let e3 = builder.add_edge(2, 3);

        let mut weights = Properties::new(0);
        weights.set(e0, 5);
        weights.set(e1, 3);
        weights.set(e2, 10);
        weights.set(e3, 20);
        WeightedGraph::new(builder.build(), weights)
    }

    #[test]
    fn diamond_paths_for_every_backend() {
        let graph = diamond();
        for factory in standard_factories() {
            let paths = dijkstra(&graph, 0, &factory);
            assert_eq!(paths.len(), 4, "{}", factory.name());
            assert_eq!(paths[&0].distance, 0);
            assert_eq!(paths[&0].vertices, vec![0]);
            assert_eq!(paths[&1].distance, 5);
            assert_eq!(paths[&1].vertices, vec![0, 1]);
            assert_eq!(paths[&2].distance, 3);
            assert_eq!(paths[&2].vertices, vec![0, 2]);
            assert_eq!(paths[&3].distance, 15);
            assert_eq!(paths[&3].vertices, vec![0, 1, 3]);
        }
    }

    #[test]
    fn unreachable_vertices_are_absent() {
        let mut builder = GraphBuilder::new("split");
        for _ in 0..3 {
            builder.add_vertex();
        }
        let e = builder.add_edge(0, 1);
        let mut weights = Properties::new(0);
        weights.set(e, 1);
        let graph = WeightedGraph::new(builder.build(), weights);

        for factory in standard_factories() {
            let paths = dijkstra(&graph, 0, &factory);
            assert_eq!(paths.len(), 2, "{}", factory.name());
            assert!(!paths.contains_key(&2));
        }
    }

    #[test]
    fn oracle_agrees_on_diamond() {
        let graph = diamond();
        let oracle = bfs_shortest_paths(&graph, 0);
        assert_eq!(oracle.len(), 4);
        assert_eq!(oracle[&3].distance, 15);
        assert_eq!(oracle[&3].vertices, vec![0, 1, 3]);
    }

    #[test]
    fn distance_key_orders_by_distance_then_vertex() {
        let a = DistanceKey {
            distance: 3,
            vertex: 9,
        };
        let b = DistanceKey {
            distance: 5,
            vertex: 1,
        };
        let c = DistanceKey {
            distance: 3,
            vertex: 10,
        };
        assert!(a < b);
        assert!(a < c);
        assert!(c < b);
    }
}
