//! Query layer over the city graph.
//!
//! Provides shortest paths (dense and heap-driven Dijkstra), nearest
//! location/stop/neighbor search, stop linking, and priority-based ranking
//! and dispatch ordering.

pub mod nearest;
pub mod paths;
pub mod ranking;
