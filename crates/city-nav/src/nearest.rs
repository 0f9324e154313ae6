//! Nearest-location queries by great-circle distance or edge weight.

use city_core::geo::Coordinate;
use city_core::graph::{CityGraph, Vertex, VertexKind};
use city_core::priority_queue::PriorityQueue;
use city_core::{CoreError, Result};
use serde::Serialize;

/// A vertex selected by a nearest query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Nearest {
    pub index: usize,
    pub id: String,
    /// Kilometres for coordinate queries, edge weight for adjacency queries.
    pub distance: f64,
}

/// Closest vertex to `at`. Ties go to the earliest inserted vertex.
///
/// Fails with `InvalidArgument` when `at` is not a valid coordinate.
pub fn find_nearest_location<P>(graph: &CityGraph<P>, at: Coordinate) -> Result<Option<Nearest>> {
    nearest_matching(graph, at, |_| true)
}

/// Closest stop vertex to `at`.
pub fn find_nearest_stop<P>(graph: &CityGraph<P>, at: Coordinate) -> Result<Option<Nearest>> {
    find_nearest_of_kind(graph, at, VertexKind::Stop, None)
}

/// Closest vertex of `kind` to `at`, optionally skipping one vertex ID.
pub fn find_nearest_of_kind<P>(
    graph: &CityGraph<P>,
    at: Coordinate,
    kind: VertexKind,
    exclude: Option<&str>,
) -> Result<Option<Nearest>> {
    nearest_matching(graph, at, |v| {
        v.kind == kind && exclude.is_none_or(|id| v.id != id)
    })
}

/// Neighbor of `from` reached by the lightest edge. Ties go to the edge
/// inserted first; `None` when the vertex has no edges.
pub fn find_nearest_neighbor<P>(graph: &CityGraph<P>, from: &str) -> Result<Option<Nearest>> {
    let vertex = graph
        .vertex(from)
        .ok_or_else(|| CoreError::vertex_not_found(from))?;

    let mut best: Option<Nearest> = None;
    for edge in vertex.edges() {
        if best.as_ref().is_none_or(|b| edge.weight < b.distance) {
            best = Some(Nearest {
                index: edge.destination,
                id: graph.vertices()[edge.destination].id.clone(),
                distance: edge.weight,
            });
        }
    }
    Ok(best)
}

/// Link `id` to its closest stop with a distance-weighted edge in both
/// directions. Returns the stop that was linked.
///
/// The vertex is never considered its own nearest stop. Fails with
/// `NotFound` when `id` is unknown or no other stop exists.
pub fn connect_to_nearest_stop<P>(graph: &mut CityGraph<P>, id: &str) -> Result<Nearest> {
    let at = graph
        .coordinates(id)
        .ok_or_else(|| CoreError::vertex_not_found(id))?;
    let stop = find_nearest_of_kind(graph, at, VertexKind::Stop, Some(id))?.ok_or_else(|| {
        CoreError::NotFound {
            what: "stop",
            id: format!("near {id}"),
        }
    })?;

    graph.add_edge(id, &stop.id, stop.distance)?;
    if graph.is_directed() {
        graph.add_edge(&stop.id, id, stop.distance)?;
    }
    tracing::debug!(vertex = id, stop = %stop.id, distance_km = stop.distance, "connected to nearest stop");
    Ok(stop)
}

/// Up to `k` vertices closest to `at`, ascending by distance, optionally
/// restricted to one kind. Equidistant vertices come out in insertion order,
/// so the first hit agrees with [`find_nearest_location`].
pub fn k_nearest<P>(
    graph: &CityGraph<P>,
    at: Coordinate,
    k: usize,
    kind: Option<VertexKind>,
) -> Result<Vec<Nearest>> {
    at.validate("query")?;
    if k == 0 {
        return Ok(Vec::new());
    }
    let mut queue = PriorityQueue::with_capacity(graph.vertex_count());
    for (index, vertex) in graph.vertices().iter().enumerate() {
        if kind.is_some_and(|wanted| vertex.kind != wanted) {
            continue;
        }
        queue.insert(vertex.id.as_str(), at.distance_to(&vertex.coordinate), index);
    }

    Ok(std::iter::from_fn(|| queue.extract_min())
        .take(k)
        .map(|entry| Nearest {
            index: entry.payload,
            id: entry.id,
            distance: entry.priority,
        })
        .collect())
}

fn nearest_matching<P>(
    graph: &CityGraph<P>,
    at: Coordinate,
    mut accept: impl FnMut(&Vertex<P>) -> bool,
) -> Result<Option<Nearest>> {
    at.validate("query")?;
    let mut best: Option<Nearest> = None;
    for (index, vertex) in graph.vertices().iter().enumerate() {
        if !accept(vertex) {
            continue;
        }
        let distance = at.distance_to(&vertex.coordinate);
        if best.as_ref().is_none_or(|b| distance < b.distance) {
            best = Some(Nearest {
                index,
                id: vertex.id.clone(),
                distance,
            });
        }
    }
    Ok(best)
}
