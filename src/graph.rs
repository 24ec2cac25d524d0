//! Directed graphs with dense integer ids and per-edge side tables.
//!
//! A [`Graph`] is built once through [`GraphBuilder`] and is immutable
//! afterwards. Vertex and edge ids are dense and assigned in insertion
//! order, which lets [`Properties`] store per-edge (or per-vertex) values
//! in a plain vector with a default for unset slots.

use std::fmt;

/// Dense vertex identifier in `[0, num_vertices)`.
pub type VertexId = usize;

/// Dense edge identifier in `[0, num_edges)`.
pub type EdgeId = usize;

/// A directed edge, stored relative to its source vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    id: EdgeId,
    to: VertexId,
}

impl Edge {
    /// Graph-unique id of this edge.
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Destination vertex.
    pub fn to(&self) -> VertexId {
        self.to
    }
}

/// A vertex with its ordered list of outgoing edges.
#[derive(Debug)]
pub struct Vertex {
    id: VertexId,
    edges: Vec<Edge>,
}

impl Vertex {
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// All directed edges leaving this vertex, in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

/// An immutable directed graph. Use [`GraphBuilder`] to construct one.
#[derive(Debug)]
pub struct Graph {
    name: String,
    vertices: Vec<Vertex>,
    num_edges: usize,
}

impl Graph {
    /// Diagnostic name labeling the graph.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// The vertex with the given id.
    ///
    /// # Panics
    /// Panics if `vertex_id` is out of range.
    pub fn vertex(&self, vertex_id: VertexId) -> &Vertex {
        &self.vertices[vertex_id]
    }

    /// Checks that every stored id is dense and in range.
    pub fn validate(&self) {
        for (position, vertex) in self.vertices.iter().enumerate() {
            assert_eq!(vertex.id(), position);
            for edge in vertex.edges() {
                assert!(edge.id() < self.num_edges);
                assert!(edge.to() < self.num_vertices());
            }
        }
    }
}

/// One-shot builder for [`Graph`]. Vertices and edges receive dense ids in
/// insertion order; [`GraphBuilder::build`] consumes the builder, after
/// which the graph can no longer change.
pub struct GraphBuilder {
    name: String,
    edges_by_vertex: Vec<Vec<Edge>>,
    num_edges: usize,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        GraphBuilder {
            name: name.into(),
            edges_by_vertex: Vec::new(),
            num_edges: 0,
        }
    }

    /// Adds a vertex, returning its id.
    pub fn add_vertex(&mut self) -> VertexId {
        let id = self.edges_by_vertex.len();
        self.edges_by_vertex.push(Vec::new());
        id
    }

    /// Adds a directed edge, returning its id.
    ///
    /// # Panics
    /// Panics if either endpoint has not been added.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId) -> EdgeId {
        assert!(
            from < self.edges_by_vertex.len() && to < self.edges_by_vertex.len(),
            "edge endpoints must be existing vertices"
        );
        let id = self.num_edges;
        self.num_edges += 1;
        self.edges_by_vertex[from].push(Edge { id, to });
        id
    }

    /// Builds the immutable graph.
    pub fn build(self) -> Graph {
        let vertices = self
            .edges_by_vertex
            .into_iter()
            .enumerate()
            .map(|(id, edges)| Vertex { id, edges })
            .collect();
        Graph {
            name: self.name,
            vertices,
            num_edges: self.num_edges,
        }
    }
}

/// A dense side table of `T` values keyed by an integer id, with a default
/// value returned for any unset key. Used for edge weights.
#[derive(Clone)]
pub struct Properties<T> {
    values: Vec<T>,
    default_value: T,
}

impl<T: Clone> Properties<T> {
    pub fn new(default_value: T) -> Self {
        Properties {
            values: Vec::new(),
            default_value,
        }
    }

    /// Sets the value at `index`, growing the table as needed.
    pub fn set(&mut self, index: usize, value: T) {
        if index >= self.values.len() {
            self.values.resize(index + 1, self.default_value.clone());
        }
        self.values[index] = value;
    }

    /// The value at `index`, or the default when unset.
    pub fn get(&self, index: usize) -> T {
        match self.values.get(index) {
            Some(value) => value.clone(),
            None => self.default_value.clone(),
        }
    }
}

/// A graph bundled with weights of type `T` on its edges.
pub struct WeightedGraph<T> {
    pub graph: Graph,
    pub edge_weights: Properties<T>,
}

impl<T> WeightedGraph<T> {
    pub fn new(graph: Graph, edge_weights: Properties<T>) -> Self {
        WeightedGraph {
            graph,
            edge_weights,
        }
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for WeightedGraph<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph({})", self.graph.name())?;
        for vertex in self.graph.vertices() {
            writeln!(f, "Vertex {}", vertex.id())?;
            for edge in vertex.edges() {
                writeln!(
                    f,
                    " {} -> {} ({:?})",
                    vertex.id(),
                    edge.to(),
                    self.edge_weights.get(edge.id())
                )?;
            }
        }
        Ok(())
    }
}
