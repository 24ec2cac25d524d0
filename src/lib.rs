//! Addressable min-priority queues with `decrease_key`, and a Dijkstra
//! shortest-path engine generic over them.
//!
//! Every heap in this crate stores `(key, id)` elements where the id is a
//! caller-supplied handle, and implements the same [`Heap`] contract:
//! `push`, `peek`, `pop`, `decrease_key`, `get`, `len`, `validate`.
//!
//! # Backends
//!
//! - **Binary heap**: array-backed; O(log n) push, pop and decrease_key
//! - **Weak heap**: array + orientation bits; O(log n) push, pop and decrease_key
//! - **Binomial heap**: O(log n) push, pop and decrease_key
//! - **Pairing heap**: O(1) amortized push; O(log n) amortized pop; o(log n) decrease_key
//! - **Fibonacci heap**: O(1) amortized push and decrease_key; O(log n) amortized pop
//! - **Thin heap**: O(1) amortized push and decrease_key; O(log n) amortized pop
//! - **2-3 heap**: O(1) amortized push and decrease_key; O(log n) amortized pop
//!
//! # Example
//!
//! ```rust
//! use addressable_heaps::fibonacci::FibonacciHeap;
//! use addressable_heaps::Heap;
//!
//! let mut heap = FibonacciHeap::new();
//! heap.push(5, 0);
//! heap.push(3, 1);
//! heap.decrease_key(0, 1).unwrap();
//! assert_eq!(heap.peek(), Some((&1, 0)));
//! ```
//!
//! The [`pathfinding`] module runs Dijkstra's algorithm over a
//! [`graph::WeightedGraph`] with any backend injected through a
//! [`HeapFactory`]:
//!
//! ```rust
//! use addressable_heaps::graph::{GraphBuilder, Properties, WeightedGraph};
//! use addressable_heaps::pairing::PairingHeap;
//! use addressable_heaps::pathfinding::dijkstra;
//!
//! let mut builder = GraphBuilder::new("example");
//! let a = builder.add_vertex();
//! let b = builder.add_vertex();
//! let e = builder.add_edge(a, b);
//!
//! let mut weights = Properties::new(0u64);
//! weights.set(e, 7);
//! let graph = WeightedGraph::new(builder.build(), weights);
//!
//! let paths = dijkstra(&graph, a, &PairingHeap::factory());
//! assert_eq!(paths[&b].distance, 7);
//! ```

pub mod binary;
pub mod binomial;
pub mod fibonacci;
pub mod graph;
pub mod pairing;
pub mod pathfinding;
pub mod thin;
pub mod traits;
pub mod twothree;
pub mod weak;

pub use traits::{
    factory_by_name, standard_factories, ElementId, Heap, HeapError, HeapFactory,
};
