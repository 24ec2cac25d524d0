//! Dijkstra over every heap backend, cross-checked against the
//! label-correcting oracle and against path arithmetic.

use addressable_heaps::graph::{GraphBuilder, Properties, VertexId, WeightedGraph};
use addressable_heaps::pathfinding::{bfs_shortest_paths, dijkstra, Path};
use addressable_heaps::standard_factories;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

/// Builds a random digraph with `out_degree` edges per vertex and weights
/// uniform in `[0, max_weight)`.
fn random_graph(
    seed: u64,
    num_vertices: usize,
    out_degree: usize,
    max_weight: i64,
) -> WeightedGraph<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = GraphBuilder::new(format!("random-{num_vertices}x{out_degree}"));
    for _ in 0..num_vertices {
        builder.add_vertex();
    }
    let mut weights = Properties::new(0i64);
    for from in 0..num_vertices {
        for _ in 0..out_degree {
            let to = rng.gen_range(0..num_vertices);
            let edge = builder.add_edge(from, to);
            weights.set(edge, rng.gen_range(0..max_weight));
        }
    }
    let graph = builder.build();
    graph.validate();
    WeightedGraph::new(graph, weights)
}

/// Checks that every returned path starts at `start`, walks real edges,
/// and sums edge weights to its claimed distance. Parallel edges are
/// resolved to the cheapest one, which is what a shortest path uses.
fn check_path_arithmetic(
    graph: &WeightedGraph<i64>,
    start: VertexId,
    paths: &FxHashMap<VertexId, Path<i64>>,
) {
    let mut cheapest: FxHashMap<(VertexId, VertexId), i64> = FxHashMap::default();
    for vertex in graph.graph.vertices() {
        for edge in vertex.edges() {
            let weight = graph.edge_weights.get(edge.id());
            cheapest
                .entry((vertex.id(), edge.to()))
                .and_modify(|w| *w = (*w).min(weight))
                .or_insert(weight);
        }
    }

    for (&vertex, path) in paths {
        assert_eq!(path.vertices.first(), Some(&start));
        assert_eq!(path.vertices.last(), Some(&vertex));

        let mut total = 0;
        for hop in path.vertices.windows(2) {
            let weight = cheapest
                .get(&(hop[0], hop[1]))
                .unwrap_or_else(|| panic!("path uses non-existent edge {} -> {}", hop[0], hop[1]));
            total += weight;
        }
        assert_eq!(
            total, path.distance,
            "path to {vertex} does not sum to its distance"
        );
    }
}

#[test]
fn fixed_diamond_graph() {
    // 0 -> 1 (5), 0 -> 2 (3), 1 -> 3 (10), 2 -> 3 (20)
    let mut builder = GraphBuilder::new("diamond");
    for _ in 0..4 {
        builder.add_vertex();
    }
    let e0 = builder.add_edge(0, 1);
    let e1 = builder.add_edge(0, 2);
    let e2 = builder.add_edge(1, 3);
    let e3 = builder.add_edge(2, 3);
    let mut weights = Properties::new(0i64);
    weights.set(e0, 5);
    weights.set(e1, 3);
    weights.set(e2, 10);
    weights.set(e3, 20);
    let graph = WeightedGraph::new(builder.build(), weights);

    let oracle = bfs_shortest_paths(&graph, 0);

    for factory in standard_factories() {
        let paths = dijkstra(&graph, 0, &factory);
        assert_eq!(paths.len(), 4, "{}", factory.name());
        assert_eq!(paths[&0], Path { distance: 0, vertices: vec![0] });
        assert_eq!(paths[&1], Path { distance: 5, vertices: vec![0, 1] });
        assert_eq!(paths[&2], Path { distance: 3, vertices: vec![0, 2] });
        assert_eq!(paths[&3], Path { distance: 15, vertices: vec![0, 1, 3] });

        for (vertex, path) in &paths {
            assert_eq!(oracle[vertex].distance, path.distance);
        }
    }
}

#[test]
fn oracle_agreement_on_random_graphs() {
    for seed in [1u64, 2, 3] {
        let graph = random_graph(seed, 50, 4, 1000);
        let oracle = bfs_shortest_paths(&graph, 0);

        for factory in standard_factories() {
            let paths = dijkstra(&graph, 0, &factory);
            assert_eq!(
                paths.len(),
                oracle.len(),
                "{}: reachable sets differ from the oracle",
                factory.name()
            );
            for (vertex, path) in &paths {
                assert_eq!(
                    oracle[vertex].distance,
                    path.distance,
                    "{}: distance to {vertex} differs from the oracle",
                    factory.name()
                );
            }
            check_path_arithmetic(&graph, 0, &paths);
        }
    }
}

#[test]
fn large_random_graph_all_backends_agree() {
    let graph = random_graph(0xd1a6, 1000, 20, 100_000);

    let factories = standard_factories();
    let mut reference: Option<(&'static str, FxHashMap<VertexId, i64>)> = None;

    for factory in &factories {
        let paths = dijkstra(&graph, 0, &factory);
        check_path_arithmetic(&graph, 0, &paths);

        let distances: FxHashMap<VertexId, i64> =
            paths.iter().map(|(&v, p)| (v, p.distance)).collect();

        match &reference {
            None => reference = Some((factory.name(), distances)),
            Some((reference_name, reference_distances)) => {
                assert_eq!(
                    reference_distances,
                    &distances,
                    "distance maps diverge between {} and {}",
                    reference_name,
                    factory.name()
                );
            }
        }
    }
}

#[test]
fn start_vertex_with_no_edges() {
    let mut builder = GraphBuilder::new("isolated");
    builder.add_vertex();
    builder.add_vertex();
    let graph = WeightedGraph::new(builder.build(), Properties::new(0i64));

    for factory in standard_factories() {
        let paths = dijkstra(&graph, 0, &factory);
        assert_eq!(paths.len(), 1, "{}", factory.name());
        assert_eq!(paths[&0], Path { distance: 0, vertices: vec![0] });
    }
}

#[test]
fn decrease_key_is_needed_for_optimality() {
    // 0 -> 1 (10), 0 -> 2 (1), 2 -> 1 (5), 1 -> 3 (1):
    // vertex 1 first enters the frontier at distance 10 and must be
    // decreased to 6 when 2 settles.
    let mut builder = GraphBuilder::new("decrease");
    for _ in 0..4 {
        builder.add_vertex();
    }
    let e0 = builder.add_edge(0, 1);
    let e1 = builder.add_edge(0, 2);
    let e2 = builder.add_edge(2, 1);
    let e3 = builder.add_edge(1, 3);
    let mut weights = Properties::new(0i64);
    weights.set(e0, 10);
    weights.set(e1, 1);
    weights.set(e2, 5);
    weights.set(e3, 1);
    let graph = WeightedGraph::new(builder.build(), weights);

    for factory in standard_factories() {
        let paths = dijkstra(&graph, 0, &factory);
        assert_eq!(paths[&1].distance, 6, "{}", factory.name());
        assert_eq!(paths[&1].vertices, vec![0, 2, 1], "{}", factory.name());
        assert_eq!(paths[&3].distance, 7, "{}", factory.name());
        assert_eq!(paths[&3].vertices, vec![0, 2, 1, 3], "{}", factory.name());
    }
}

#[test]
fn zero_weight_edges() {
    let mut builder = GraphBuilder::new("zero");
    for _ in 0..3 {
        builder.add_vertex();
    }
    builder.add_edge(0, 1);
    builder.add_edge(1, 2);
    let graph = WeightedGraph::new(builder.build(), Properties::new(0i64));

    for factory in standard_factories() {
        let paths = dijkstra(&graph, 0, &factory);
        assert_eq!(paths.len(), 3, "{}", factory.name());
        assert_eq!(paths[&2].distance, 0);
        assert_eq!(paths[&2].vertices, vec![0, 1, 2]);
    }
}
