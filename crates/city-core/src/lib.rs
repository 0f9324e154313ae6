//! Core data structures for the city infrastructure model.
//!
//! Provides the geographic graph ([`graph::CityGraph`]), the chained hash
//! table used for every ID→entity index ([`keyed_index::KeyedIndex`]), the
//! min-heap used for ranking and dispatch ([`priority_queue::PriorityQueue`]),
//! and the auxiliary list, stack and queue containers.

pub mod config;
pub mod error;
pub mod geo;
pub mod graph;
pub mod keyed_index;
pub mod priority_queue;
pub mod sequence;

pub use error::{CoreError, Result};
