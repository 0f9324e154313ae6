//! Geographic graph model for the city: vertices are locations, edges are
//! weighted connections between them.
//!
//! Adjacency is stored per source vertex in insertion order. Undirected graphs
//! materialize the mirror edge on the destination at insertion time, and every
//! mutation keeps both copies in step.

use crate::config::CityConfig;
use crate::error::{CoreError, Result};
use crate::geo::Coordinate;
use crate::keyed_index::KeyedIndex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// A graph shared by several collaborators on one thread.
pub type SharedGraph<P> = Rc<RefCell<CityGraph<P>>>;

/// Classification of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexKind {
    /// A transit stop; the target of nearest-stop queries.
    Stop,
    /// Any other location: school, hospital, mall, residence.
    #[default]
    Place,
}

impl VertexKind {
    /// Classify an id by the reserved stop prefix.
    pub fn from_id_prefix(id: &str, stop_prefix: &str) -> Self {
        if !stop_prefix.is_empty() && id.starts_with(stop_prefix) {
            Self::Stop
        } else {
            Self::Place
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Place => "place",
        }
    }
}

/// A weighted edge pointing at a vertex position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub destination: usize,
    pub weight: f64,
}

/// A named, coordinate-tagged location.
#[derive(Debug, Clone)]
pub struct Vertex<P> {
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
    pub kind: VertexKind,
    pub payload: P,
    edges: Vec<Edge>,
}

impl<P> Vertex<P> {
    /// Outgoing edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn degree(&self) -> usize {
        self.edges.len()
    }

    pub fn is_stop(&self) -> bool {
        self.kind == VertexKind::Stop
    }
}

/// Outcome of [`CityGraph::add_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeChange {
    Added,
    Updated,
}

/// Weighted graph over named vertices with an optional vertex capacity.
#[derive(Debug, Clone)]
pub struct CityGraph<P> {
    vertices: Vec<Vertex<P>>,
    index: KeyedIndex<usize>,
    directed: bool,
    capacity: Option<usize>,
}

impl<P> CityGraph<P> {
    /// Create an empty, unbounded graph.
    pub fn new(directed: bool) -> Self {
        Self {
            vertices: Vec::new(),
            index: KeyedIndex::new(),
            directed,
            capacity: None,
        }
    }

    /// Create an empty graph that holds at most `max_vertices` vertices.
    pub fn with_capacity(directed: bool, max_vertices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(max_vertices),
            index: KeyedIndex::new(),
            directed,
            capacity: Some(max_vertices),
        }
    }

    /// Create an empty graph from the `[graph]` and `[index]` config sections.
    pub fn from_config(config: &CityConfig) -> Self {
        Self {
            vertices: Vec::new(),
            index: KeyedIndex::with_buckets(config.index.initial_buckets),
            directed: config.graph.directed,
            capacity: config.graph.max_vertices,
        }
    }

    /// Wrap the graph in a shared handle.
    pub fn into_shared(self) -> SharedGraph<P> {
        Rc::new(RefCell::new(self))
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of edges; mirrored pairs in an undirected graph count once.
    pub fn edge_count(&self) -> usize {
        let directed: usize = self.vertices.iter().map(|v| v.edges.len()).sum();
        if self.directed { directed } else { directed / 2 }
    }

    /// All vertices in insertion order; positions match vertex indices.
    pub fn vertices(&self) -> &[Vertex<P>] {
        &self.vertices
    }

    /// Add a `Place` vertex. Returns its index.
    pub fn add_vertex(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        coordinate: Coordinate,
        payload: P,
    ) -> Result<usize> {
        self.add_vertex_of_kind(VertexKind::Place, id, name, coordinate, payload)
    }

    /// Add a `Stop` vertex. Returns its index.
    pub fn add_stop(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        coordinate: Coordinate,
        payload: P,
    ) -> Result<usize> {
        self.add_vertex_of_kind(VertexKind::Stop, id, name, coordinate, payload)
    }

    pub fn add_vertex_of_kind(
        &mut self,
        kind: VertexKind,
        id: impl Into<String>,
        name: impl Into<String>,
        coordinate: Coordinate,
        payload: P,
    ) -> Result<usize> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::InvalidArgument(
                "vertex id must not be empty".to_string(),
            ));
        }
        coordinate.validate(&id)?;
        if self.index.contains_key(&id) {
            return Err(CoreError::AlreadyExists { id });
        }
        if let Some(capacity) = self.capacity
            && self.vertices.len() >= capacity
        {
            return Err(CoreError::CapacityExceeded { capacity });
        }

        let position = self.vertices.len();
        self.index.insert(id.clone(), position)?;
        self.vertices.push(Vertex {
            id,
            name: name.into(),
            coordinate,
            kind,
            payload,
            edges: Vec::new(),
        });
        Ok(position)
    }

    /// Insert or re-weight the edge `from -> to`.
    ///
    /// In an undirected graph the mirror edge `to -> from` is written with the
    /// same weight.
    pub fn add_edge(&mut self, from: &str, to: &str, weight: f64) -> Result<EdgeChange> {
        let (u, v) = self.endpoints(from, to)?;
        if u == v {
            return Err(CoreError::InvalidArgument(format!(
                "self-loop on {from} is not allowed"
            )));
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "edge weight {weight} for {from}->{to} must be finite and non-negative"
            )));
        }

        let change = upsert_edge(&mut self.vertices[u].edges, v, weight);
        if !self.directed {
            upsert_edge(&mut self.vertices[v].edges, u, weight);
        }
        Ok(change)
    }

    /// Insert or re-weight `from -> to` using the great-circle distance between
    /// the two vertices. Returns the weight used.
    pub fn add_edge_with_distance(&mut self, from: &str, to: &str) -> Result<f64> {
        let (u, v) = self.endpoints(from, to)?;
        let weight = self.vertices[u]
            .coordinate
            .distance_to(&self.vertices[v].coordinate);
        self.add_edge(from, to, weight)?;
        Ok(weight)
    }

    /// Remove `from -> to` (and its mirror in an undirected graph), returning
    /// the removed weight.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> Result<f64> {
        let (u, v) = self.endpoints(from, to)?;
        let pos = self.vertices[u]
            .edges
            .iter()
            .position(|e| e.destination == v)
            .ok_or_else(|| CoreError::NotFound {
                what: "edge",
                id: format!("{from}->{to}"),
            })?;
        let removed = self.vertices[u].edges.remove(pos);
        if !self.directed {
            self.vertices[v].edges.retain(|e| e.destination != u);
        }
        Ok(removed.weight)
    }

    /// Remove a vertex and every edge that references it.
    ///
    /// Later vertices shift down one position and every edge destination is
    /// renumbered to match. The returned vertex has an empty adjacency list,
    /// since its edges pointed at positions that no longer exist.
    pub fn remove_vertex(&mut self, id: &str) -> Result<Vertex<P>> {
        let removed_at = self
            .index_of(id)
            .ok_or_else(|| CoreError::vertex_not_found(id))?;

        let mut removed = self.vertices.remove(removed_at);
        removed.edges.clear();

        let mut dropped_edges = 0;
        for vertex in &mut self.vertices {
            let before = vertex.edges.len();
            vertex.edges.retain(|e| e.destination != removed_at);
            dropped_edges += before - vertex.edges.len();
            for edge in &mut vertex.edges {
                if edge.destination > removed_at {
                    edge.destination -= 1;
                }
            }
        }

        self.index.remove(id);
        for (position, vertex) in self.vertices.iter().enumerate().skip(removed_at) {
            self.index.insert(vertex.id.clone(), position)?;
        }

        tracing::debug!(
            vertex = id,
            position = removed_at,
            dropped_edges,
            "removed vertex"
        );
        Ok(removed)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.search(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn vertex(&self, id: &str) -> Option<&Vertex<P>> {
        self.index_of(id).map(|i| &self.vertices[i])
    }

    pub fn vertex_at(&self, index: usize) -> Option<&Vertex<P>> {
        self.vertices.get(index)
    }

    pub fn coordinates(&self, id: &str) -> Option<Coordinate> {
        self.vertex(id).map(|v| v.coordinate)
    }

    pub fn payload(&self, id: &str) -> Option<&P> {
        self.vertex(id).map(|v| &v.payload)
    }

    pub fn payload_mut(&mut self, id: &str) -> Option<&mut P> {
        let i = self.index_of(id)?;
        Some(&mut self.vertices[i].payload)
    }

    pub fn edges_for(&self, id: &str) -> Option<&[Edge]> {
        self.vertex(id).map(Vertex::edges)
    }

    pub fn degree(&self, id: &str) -> Option<usize> {
        self.vertex(id).map(Vertex::degree)
    }

    /// Neighbors of `id` with the connecting edge weight, in edge order.
    pub fn neighbors(&self, id: &str) -> Option<Vec<(&Vertex<P>, f64)>> {
        let vertex = self.vertex(id)?;
        Some(
            vertex
                .edges
                .iter()
                .map(|e| (&self.vertices[e.destination], e.weight))
                .collect(),
        )
    }

    /// Whether an edge `a -> b` exists.
    pub fn are_adjacent(&self, a: &str, b: &str) -> bool {
        self.edge_weight(a, b).is_some()
    }

    pub fn edge_weight(&self, a: &str, b: &str) -> Option<f64> {
        let u = self.index_of(a)?;
        let v = self.index_of(b)?;
        self.vertices[u]
            .edges
            .iter()
            .find(|e| e.destination == v)
            .map(|e| e.weight)
    }

    /// Stop vertices directly reachable from `id`.
    pub fn connected_stops(&self, id: &str) -> Option<Vec<&Vertex<P>>> {
        let vertex = self.vertex(id)?;
        Some(
            vertex
                .edges
                .iter()
                .map(|e| &self.vertices[e.destination])
                .filter(|v| v.is_stop())
                .collect(),
        )
    }

    fn endpoints(&self, from: &str, to: &str) -> Result<(usize, usize)> {
        let u = self
            .index_of(from)
            .ok_or_else(|| CoreError::vertex_not_found(from))?;
        let v = self
            .index_of(to)
            .ok_or_else(|| CoreError::vertex_not_found(to))?;
        Ok((u, v))
    }
}

fn upsert_edge(edges: &mut Vec<Edge>, destination: usize, weight: f64) -> EdgeChange {
    if let Some(edge) = edges.iter_mut().find(|e| e.destination == destination) {
        edge.weight = weight;
        EdgeChange::Updated
    } else {
        edges.push(Edge {
            destination,
            weight,
        });
        EdgeChange::Added
    }
}
