//! Read a TOML network description into a city graph.

use anyhow::{Context, Result};
use city_core::config::CityConfig;
use city_core::geo::Coordinate;
use city_core::graph::{CityGraph, VertexKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk network layout: `[[vertex]]` and `[[edge]]` tables.
#[derive(Debug, Default, Deserialize)]
pub struct NetworkFile {
    /// Overrides `graph.directed` from the config when present.
    pub directed: Option<bool>,
    #[serde(default, rename = "vertex")]
    pub vertices: Vec<VertexRecord>,
    #[serde(default, rename = "edge")]
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Deserialize)]
pub struct VertexRecord {
    pub id: String,
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// Inferred from the configured stop prefix when absent.
    pub kind: Option<VertexKind>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
    /// Great-circle distance between the endpoints when absent.
    pub weight: Option<f64>,
}

/// Payload attached to every loaded vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Site {
    pub category: Option<String>,
}

/// Load and build the network at `path`.
pub fn load(path: &Path, config: &CityConfig) -> Result<CityGraph<Site>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read network from {}", path.display()))?;
    let file: NetworkFile = toml::from_str(&content)
        .with_context(|| format!("failed to parse network {}", path.display()))?;
    build(file, config)
}

/// Build a graph from an already-parsed network description.
pub fn build(file: NetworkFile, config: &CityConfig) -> Result<CityGraph<Site>> {
    let mut config = config.clone();
    if let Some(directed) = file.directed {
        config.graph.directed = directed;
    }
    let mut graph = CityGraph::from_config(&config);

    for record in file.vertices {
        let kind = record
            .kind
            .unwrap_or_else(|| VertexKind::from_id_prefix(&record.id, &config.graph.stop_prefix));
        let name = record.name.unwrap_or_else(|| record.id.clone());
        graph
            .add_vertex_of_kind(
                kind,
                record.id.clone(),
                name,
                Coordinate::new(record.lat, record.lon),
                Site {
                    category: record.category,
                },
            )
            .with_context(|| format!("invalid vertex {}", record.id))?;
    }

    for record in file.edges {
        let added = match record.weight {
            Some(weight) => graph.add_edge(&record.from, &record.to, weight).map(|_| ()),
            None => graph
                .add_edge_with_distance(&record.from, &record.to)
                .map(|_| ()),
        };
        added.with_context(|| format!("invalid edge {} -> {}", record.from, record.to))?;
    }

    tracing::info!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        directed = graph.is_directed(),
        "network loaded"
    );
    Ok(graph)
}
