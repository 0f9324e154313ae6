//! CLI binary for querying a city infrastructure network: paths, nearest
//! locations and stops, neighbors, and connectivity ranking.

mod network;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use city_core::config::{CityConfig, PathStrategy};
use city_core::geo::Coordinate;
use city_core::graph::{CityGraph, VertexKind};
use city_nav::{nearest, paths, ranking};
use network::Site;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "city", about = "City infrastructure network queries")]
struct Cli {
    /// Project root holding .city/config.toml (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Network description file, relative to the project root
    #[arg(short, long, global = true, default_value = "network.toml")]
    network: PathBuf,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show vertex, stop and edge counts
    Info,

    /// Shortest path between two vertices
    Path {
        from: String,
        to: String,

        /// Vertex selection strategy: dense or heap (defaults to config)
        #[arg(short, long)]
        strategy: Option<PathStrategy>,
    },

    /// Closest vertices to a coordinate
    Nearest {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Only consider stop vertices
        #[arg(long)]
        stops: bool,

        /// Number of results (defaults to config)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Direct neighbors of a vertex, lightest edge first
    Neighbors { id: String },

    /// Link a vertex to its closest stop and show the resulting edge
    Connect { id: String },

    /// Most connected vertices
    Rank {
        #[arg(short, long, default_value_t = 5)]
        limit: usize,

        /// Only rank vertices with this category
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Serialize)]
struct NetworkInfo {
    vertices: usize,
    stops: usize,
    edges: usize,
    directed: bool,
}

#[derive(Serialize)]
struct NeighborLine {
    id: String,
    name: String,
    kind: VertexKind,
    weight: f64,
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;
    let config = CityConfig::load(&project_root)?;
    let network_path = resolve_network(&project_root, &cli.network);
    let mut graph = network::load(&network_path, &config)?;
    let json = cli.json;

    match cli.command {
        Commands::Info => cmd_info(&graph, json),
        Commands::Path { from, to, strategy } => cmd_path(
            &graph,
            &from,
            &to,
            strategy.unwrap_or(config.routing.strategy),
            json,
        ),
        Commands::Nearest {
            lat,
            lon,
            stops,
            limit,
        } => cmd_nearest(
            &graph,
            Coordinate::new(lat, lon),
            stops,
            limit.unwrap_or(config.routing.nearest_limit),
            json,
        ),
        Commands::Neighbors { id } => cmd_neighbors(&graph, &id, json),
        Commands::Connect { id } => cmd_connect(&mut graph, &id, json),
        Commands::Rank { limit, category } => cmd_rank(&graph, limit, category.as_deref(), json),
    }
}

fn resolve_network(project_root: &Path, network: &Path) -> PathBuf {
    if network.is_absolute() {
        network.to_path_buf()
    } else {
        project_root.join(network)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_info(graph: &CityGraph<Site>, json: bool) -> Result<()> {
    let info = NetworkInfo {
        vertices: graph.vertex_count(),
        stops: graph.vertices().iter().filter(|v| v.is_stop()).count(),
        edges: graph.edge_count(),
        directed: graph.is_directed(),
    };
    if json {
        return print_json(&info);
    }
    println!("Vertices: {}", info.vertices);
    println!("  Stops: {}", info.stops);
    println!("Edges: {}", info.edges);
    println!(
        "Orientation: {}",
        if info.directed { "directed" } else { "undirected" }
    );
    Ok(())
}

fn cmd_path(
    graph: &CityGraph<Site>,
    from: &str,
    to: &str,
    strategy: PathStrategy,
    json: bool,
) -> Result<()> {
    let route = paths::shortest_path_with(graph, from, to, strategy)?;
    if json {
        return print_json(&route);
    }
    println!("{} hops, {:.3}", route.hops(), route.distance);
    for id in &route.vertices {
        let name = graph.vertex(id).map_or("", |v| v.name.as_str());
        println!("  {id}  {name}");
    }
    Ok(())
}

fn cmd_nearest(
    graph: &CityGraph<Site>,
    at: Coordinate,
    stops: bool,
    limit: usize,
    json: bool,
) -> Result<()> {
    let kind = stops.then_some(VertexKind::Stop);
    let hits = nearest::k_nearest(graph, at, limit, kind)?;
    if json {
        return print_json(&hits);
    }
    if hits.is_empty() {
        println!("No matching vertices.");
    }
    for hit in &hits {
        println!("{:>9.3} km  {}", hit.distance, hit.id);
    }
    Ok(())
}

fn cmd_neighbors(graph: &CityGraph<Site>, id: &str, json: bool) -> Result<()> {
    let neighbors = graph
        .neighbors(id)
        .ok_or_else(|| anyhow::anyhow!("unknown vertex: {id}"))?;
    let mut lines: Vec<NeighborLine> = neighbors
        .into_iter()
        .map(|(v, weight)| NeighborLine {
            id: v.id.clone(),
            name: v.name.clone(),
            kind: v.kind,
            weight,
        })
        .collect();
    lines.sort_by(|a, b| a.weight.total_cmp(&b.weight));

    if json {
        return print_json(&lines);
    }
    for line in &lines {
        println!(
            "{:>9.3}  {} ({}, {})",
            line.weight,
            line.id,
            line.name,
            line.kind.as_str()
        );
    }
    Ok(())
}

fn cmd_connect(graph: &mut CityGraph<Site>, id: &str, json: bool) -> Result<()> {
    let stop = nearest::connect_to_nearest_stop(graph, id)?;
    if json {
        return print_json(&stop);
    }
    println!("{id} -> {} ({:.3} km)", stop.id, stop.distance);
    if let Some(stops) = graph.connected_stops(id) {
        let ids: Vec<&str> = stops.iter().map(|v| v.id.as_str()).collect();
        println!("  connected stops: {}", ids.join(", "));
    }
    Ok(())
}

fn cmd_rank(
    graph: &CityGraph<Site>,
    limit: usize,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let candidates = graph
        .vertices()
        .iter()
        .filter(|v| category.is_none_or(|c| v.payload.category.as_deref() == Some(c)))
        .map(|v| (v.id.clone(), v.degree() as f64, v.name.clone()));
    let ranked = ranking::top_n(candidates, limit);

    if json {
        return print_json(&ranked);
    }
    for (position, entry) in ranked.iter().enumerate() {
        println!(
            "{:>3}. {} ({}) degree {}",
            position + 1,
            entry.id,
            entry.item,
            entry.score
        );
    }
    Ok(())
}
