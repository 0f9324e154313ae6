//! Shortest-path search over the city graph.

use city_core::config::PathStrategy;
use city_core::graph::CityGraph;
use city_core::priority_queue::PriorityQueue;
use city_core::{CoreError, Result};
use serde::Serialize;

/// A path through the graph with its total weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Vertex IDs from start to end, inclusive.
    pub vertices: Vec<String>,
    pub distance: f64,
}

impl Route {
    /// Number of edges traversed.
    pub fn hops(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }
}

/// Find the shortest path with the given selection strategy.
pub fn shortest_path_with<P>(
    graph: &CityGraph<P>,
    start: &str,
    end: &str,
    strategy: PathStrategy,
) -> Result<Route> {
    let result = match strategy {
        PathStrategy::Dense => find_shortest_path(graph, start, end),
        PathStrategy::Heap => find_shortest_path_heap(graph, start, end),
    };
    match &result {
        Ok(route) => tracing::debug!(
            start,
            end,
            ?strategy,
            hops = route.hops(),
            distance = route.distance,
            "shortest path found"
        ),
        Err(e) => tracing::debug!(start, end, ?strategy, error = %e, "shortest path failed"),
    }
    result
}

/// Dijkstra's algorithm with a linear scan for the next vertex, O(V²).
///
/// Among equally distant unvisited vertices the lowest index is settled
/// first. The search stops as soon as `end` is settled.
pub fn find_shortest_path<P>(graph: &CityGraph<P>, start: &str, end: &str) -> Result<Route> {
    let (s, t) = resolve(graph, start, end)?;
    if s == t {
        return Ok(Route {
            vertices: vec![start.to_string()],
            distance: 0.0,
        });
    }

    let n = graph.vertex_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut visited = vec![false; n];
    dist[s] = 0.0;

    for _ in 0..n {
        let Some(u) = (0..n)
            .filter(|&i| !visited[i] && dist[i].is_finite())
            .min_by(|&a, &b| dist[a].total_cmp(&dist[b]))
        else {
            break;
        };
        visited[u] = true;
        if u == t {
            break;
        }
        for edge in graph.vertices()[u].edges() {
            let v = edge.destination;
            if visited[v] {
                continue;
            }
            let alt = dist[u] + edge.weight;
            if alt < dist[v] {
                dist[v] = alt;
                prev[v] = Some(u);
            }
        }
    }

    build_route(graph, &prev, &dist, s, t)
}

/// Dijkstra's algorithm driven by a [`PriorityQueue`] frontier,
/// O((V+E) log V).
///
/// Improved distances are pushed as new entries; stale entries are skipped
/// when they surface.
pub fn find_shortest_path_heap<P>(graph: &CityGraph<P>, start: &str, end: &str) -> Result<Route> {
    let (s, t) = resolve(graph, start, end)?;
    if s == t {
        return Ok(Route {
            vertices: vec![start.to_string()],
            distance: 0.0,
        });
    }

    let n = graph.vertex_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut frontier = PriorityQueue::with_capacity(n);
    dist[s] = 0.0;
    frontier.insert(start, 0.0, s);

    while let Some(entry) = frontier.extract_min() {
        let u = entry.payload;
        if visited[u] {
            continue;
        }
        visited[u] = true;
        if u == t {
            break;
        }
        for edge in graph.vertices()[u].edges() {
            let v = edge.destination;
            if visited[v] {
                continue;
            }
            let alt = dist[u] + edge.weight;
            if alt < dist[v] {
                dist[v] = alt;
                prev[v] = Some(u);
                frontier.insert(graph.vertices()[v].id.as_str(), alt, v);
            }
        }
    }

    build_route(graph, &prev, &dist, s, t)
}

/// Sum the edge weights along a sequence of vertex IDs.
///
/// Fails with `NoPathExists` when two consecutive IDs are not adjacent.
pub fn route_length<P, S: AsRef<str>>(graph: &CityGraph<P>, ids: &[S]) -> Result<f64> {
    for id in ids {
        if !graph.contains(id.as_ref()) {
            return Err(CoreError::vertex_not_found(id.as_ref()));
        }
    }
    let mut total = 0.0;
    for pair in ids.windows(2) {
        let (a, b) = (pair[0].as_ref(), pair[1].as_ref());
        total += graph
            .edge_weight(a, b)
            .ok_or_else(|| CoreError::NoPathExists {
                from: a.to_string(),
                to: b.to_string(),
            })?;
    }
    Ok(total)
}

fn resolve<P>(graph: &CityGraph<P>, start: &str, end: &str) -> Result<(usize, usize)> {
    let s = graph
        .index_of(start)
        .ok_or_else(|| CoreError::vertex_not_found(start))?;
    let t = graph
        .index_of(end)
        .ok_or_else(|| CoreError::vertex_not_found(end))?;
    Ok((s, t))
}

fn build_route<P>(
    graph: &CityGraph<P>,
    prev: &[Option<usize>],
    dist: &[f64],
    s: usize,
    t: usize,
) -> Result<Route> {
    let vertices = graph.vertices();
    if dist[t].is_infinite() {
        return Err(CoreError::NoPathExists {
            from: vertices[s].id.clone(),
            to: vertices[t].id.clone(),
        });
    }

    let mut path = vec![vertices[t].id.clone()];
    let mut current = t;
    while let Some(p) = prev[current] {
        path.push(vertices[p].id.clone());
        current = p;
    }
    path.reverse();

    Ok(Route {
        vertices: path,
        distance: dist[t],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use city_core::geo::Coordinate;

    fn abc() -> CityGraph<()> {
        let mut g = CityGraph::new(false);
        g.add_vertex("A", "A", Coordinate::new(0.0, 0.0), ()).unwrap();
        g.add_vertex("B", "B", Coordinate::new(0.0, 1.0), ()).unwrap();
        g.add_vertex("C", "C", Coordinate::new(1.0, 1.0), ()).unwrap();
        g.add_edge("A", "B", 1.0).unwrap();
        g.add_edge("B", "C", 2.0).unwrap();
        g
    }

    #[test]
    fn test_scenario_a_b_c() {
        let g = abc();
        for strategy in [PathStrategy::Dense, PathStrategy::Heap] {
            let route = shortest_path_with(&g, "A", "C", strategy).unwrap();
            assert_eq!(route.vertices, vec!["A", "B", "C"]);
            assert_eq!(route.distance, 3.0);
            assert_eq!(route.hops(), 2);
        }
    }

    #[test]
    fn test_same_start_and_end() {
        let g = abc();
        let route = find_shortest_path(&g, "B", "B").unwrap();
        assert_eq!(route.vertices, vec!["B"]);
        assert_eq!(route.distance, 0.0);
        assert_eq!(find_shortest_path_heap(&g, "B", "B").unwrap(), route);
    }

    #[test]
    fn test_prefers_cheaper_detour() {
        let mut g = abc();
        g.add_edge("A", "C", 10.0).unwrap();
        let route = find_shortest_path(&g, "A", "C").unwrap();
        assert_eq!(route.vertices, vec!["A", "B", "C"]);

        g.add_edge("A", "C", 2.5).unwrap();
        let route = find_shortest_path(&g, "A", "C").unwrap();
        assert_eq!(route.vertices, vec!["A", "C"]);
        assert_eq!(route.distance, 2.5);
    }

    #[test]
    fn test_no_path() {
        let mut g = abc();
        g.add_vertex("D", "D", Coordinate::new(5.0, 5.0), ()).unwrap();
        for strategy in [PathStrategy::Dense, PathStrategy::Heap] {
            assert_eq!(
                shortest_path_with(&g, "A", "D", strategy),
                Err(CoreError::NoPathExists {
                    from: "A".into(),
                    to: "D".into()
                })
            );
        }
    }

    #[test]
    fn test_unknown_vertex() {
        let g = abc();
        assert!(matches!(
            find_shortest_path(&g, "A", "Z"),
            Err(CoreError::NotFound { .. })
        ));
        assert!(matches!(
            find_shortest_path_heap(&g, "Z", "A"),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_directed_respects_orientation() {
        let mut g: CityGraph<()> = CityGraph::new(true);
        for id in ["a", "b", "c"] {
            g.add_vertex(id, id, Coordinate::default(), ()).unwrap();
        }
        g.add_edge("a", "b", 1.0).unwrap();
        g.add_edge("b", "c", 1.0).unwrap();
        assert_eq!(find_shortest_path(&g, "a", "c").unwrap().distance, 2.0);
        assert!(matches!(
            find_shortest_path(&g, "c", "a"),
            Err(CoreError::NoPathExists { .. })
        ));
    }

    #[test]
    fn test_zero_weight_edges() {
        let mut g = abc();
        g.add_edge("A", "B", 0.0).unwrap();
        let route = find_shortest_path(&g, "A", "C").unwrap();
        assert_eq!(route.distance, 2.0);
    }

    #[test]
    fn test_route_length() {
        let g = abc();
        assert_eq!(route_length(&g, &["A", "B", "C"]).unwrap(), 3.0);
        assert_eq!(route_length(&g, &["A"]).unwrap(), 0.0);
        assert!(matches!(
            route_length(&g, &["A", "C"]),
            Err(CoreError::NoPathExists { .. })
        ));
        assert!(matches!(
            route_length(&g, &["A", "Q"]),
            Err(CoreError::NotFound { .. })
        ));
    }
}
